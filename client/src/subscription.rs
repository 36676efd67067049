use contracts::{Event, EventFilter, Identity};
use futures::StreamExt;
use tokio::{sync::mpsc, task::JoinHandle};
use tokio_tungstenite::{connect_async, tungstenite::Message};
use tracing::{debug, warn};

use crate::rest_client::NodeApiHttpClient;

#[derive(Debug, Clone, PartialEq)]
pub enum SubscriptionMessage {
    Event(Event),
    /// A stream ended. `error` is set when it did not end cleanly.
    Closed {
        filter: EventFilter,
        error: Option<String>,
    },
}

/// Event streams held on behalf of one account.
///
/// Streams are attached together and detached together, either explicitly or
/// when the subscription is dropped. The owner replaces the whole value when
/// the connected account changes.
#[derive(Debug)]
pub struct Subscription {
    account: Identity,
    tasks: Vec<JoinHandle<()>>,
}

impl Subscription {
    pub fn attach(
        node: &NodeApiHttpClient,
        account: Identity,
        filters: Vec<EventFilter>,
        sink: mpsc::Sender<SubscriptionMessage>,
    ) -> Self {
        let tasks = filters
            .into_iter()
            .map(|filter| {
                let url = node.events_url(filter.contract.as_ref(), filter.account.as_ref());
                tokio::spawn(forward_events(url, filter, sink.clone()))
            })
            .collect();
        debug!("Attached event subscription for {account}");
        Self { account, tasks }
    }

    pub fn account(&self) -> &Identity {
        &self.account
    }

    /// True while at least one stream is still running.
    pub fn is_active(&self) -> bool {
        self.tasks.iter().any(|task| !task.is_finished())
    }

    pub fn detach(self) {
        drop(self)
    }
}

impl Drop for Subscription {
    fn drop(&mut self) {
        for task in &self.tasks {
            task.abort();
        }
        debug!("Detached event subscription for {}", self.account);
    }
}

/// Holds at most one [`Subscription`]. Swapping accounts always tears the
/// previous streams down before the next ones are attached.
#[derive(Debug, Default)]
pub struct SubscriptionSlot {
    current: Option<Subscription>,
}

impl SubscriptionSlot {
    pub fn account(&self) -> Option<&Identity> {
        self.current.as_ref().map(Subscription::account)
    }

    pub fn is_active(&self) -> bool {
        self.current.as_ref().is_some_and(Subscription::is_active)
    }

    /// Detaches the held subscription, then stores whatever `attach` builds.
    /// On error the slot stays empty.
    pub fn replace<E>(
        &mut self,
        attach: impl FnOnce() -> Result<Subscription, E>,
    ) -> Result<(), E> {
        self.clear();
        self.current = Some(attach()?);
        Ok(())
    }

    pub fn clear(&mut self) {
        if let Some(subscription) = self.current.take() {
            subscription.detach();
        }
    }
}

async fn forward_events(url: String, filter: EventFilter, sink: mpsc::Sender<SubscriptionMessage>) {
    let error = match stream_into(&url, &sink).await {
        Ok(()) => None,
        Err(e) => {
            warn!("Event stream {url} failed: {e}");
            Some(e)
        }
    };
    let _ = sink.send(SubscriptionMessage::Closed { filter, error }).await;
}

async fn stream_into(url: &str, sink: &mpsc::Sender<SubscriptionMessage>) -> Result<(), String> {
    let (mut stream, _) = connect_async(url).await.map_err(|e| e.to_string())?;
    while let Some(message) = stream.next().await {
        match message.map_err(|e| e.to_string())? {
            Message::Text(text) => match serde_json::from_str::<Event>(&text) {
                Ok(event) => {
                    if sink.send(SubscriptionMessage::Event(event)).await.is_err() {
                        // Receiver gone, nobody is listening anymore.
                        return Ok(());
                    }
                }
                Err(e) => warn!("Skipping undecodable event: {e}"),
            },
            Message::Close(_) => return Ok(()),
            _ => {}
        }
    }
    Ok(())
}
