use std::sync::Arc;

use contracts::{api::Receipt, ContractEvent, Event, Transaction};
use tokio::sync::{broadcast, RwLock};
use tracing::{debug, error, info};

use crate::{
    chain::{ChainState, TxFailure},
    clock::Clock,
    metrics::NodeMetrics,
    store::StateStore,
};

const EVENT_CHANNEL_CAPACITY: usize = 1024;

/// Owns the chain state. Writes are serialized by the state lock, so every
/// transaction executes alone.
pub struct Node {
    pub id: String,
    pub chain_id: u64,
    state: RwLock<ChainState>,
    clock: Clock,
    events: broadcast::Sender<Event>,
    store: Option<StateStore>,
    metrics: NodeMetrics,
}

impl Node {
    pub fn new(
        id: String,
        chain_id: u64,
        state: ChainState,
        clock: Clock,
        store: Option<StateStore>,
        metrics: NodeMetrics,
    ) -> Arc<Self> {
        let (events, _) = broadcast::channel(EVENT_CHANNEL_CAPACITY);
        metrics.set_block_height(state.block_height());
        Arc::new(Self {
            id,
            chain_id,
            state: RwLock::new(state),
            clock,
            events,
            store,
            metrics,
        })
    }

    pub fn clock(&self) -> &Clock {
        &self.clock
    }

    pub fn metrics(&self) -> &NodeMetrics {
        &self.metrics
    }

    pub fn subscribe(&self) -> broadcast::Receiver<Event> {
        self.events.subscribe()
    }

    /// Runs `f` against a consistent view of the state together with the
    /// time the next block would carry.
    pub async fn read<R>(&self, f: impl FnOnce(&ChainState, u64) -> R) -> R {
        let state = self.state.read().await;
        let now = self.clock.now().max(state.timestamp());
        f(&state, now)
    }

    pub async fn submit(&self, tx: Transaction) -> Result<Receipt, TxFailure> {
        let mut state = self.state.write().await;
        let result = state.apply(&tx, self.chain_id, self.clock.now());

        match &result {
            Ok(receipt) => {
                self.metrics.record_tx("committed");
                self.metrics.set_block_height(receipt.block_height);
                let claims = receipt
                    .events
                    .iter()
                    .filter(|e| matches!(e.event, ContractEvent::TokensClaimed { .. }))
                    .count();
                self.metrics.record_claims(claims as u64);
                info!(
                    "📦 Block {} tx {} from {}",
                    receipt.block_height, receipt.tx_hash, tx.tx.identity
                );

                if let Some(store) = &self.store {
                    if let Err(e) = store.save_on_disk(&state).await {
                        error!("Failed to persist chain state: {e:#}");
                    }
                }
                for event in &receipt.events {
                    // No subscribers is fine.
                    let _ = self.events.send(event.clone());
                }
            }
            Err(TxFailure::Rejected(revert)) => {
                self.metrics.record_tx("rejected");
                debug!(code = %revert.code, "tx from {} rejected: {}", tx.tx.identity, revert.reason);
            }
            Err(TxFailure::Reverted(revert)) => {
                self.metrics.record_tx("reverted");
                debug!(code = %revert.code, "tx from {} reverted: {}", tx.tx.identity, revert.reason);
            }
        }
        result
    }
}
