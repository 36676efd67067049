use std::{
    io::Write,
    path::{Path, PathBuf},
    time::Duration,
};

use anyhow::{Context, Result};
use clap::Parser;
use client::{
    BridgeConfig, ClientError, FaucetBridge, SubscriptionMessage, SubscriptionSlot, Wallet,
    WalletError,
};
use tokio::{
    io::{AsyncBufReadExt, BufReader},
    sync::mpsc,
};
use tracing::{debug, info, warn};
use tracing_subscriber::EnvFilter;

use command::{Command, HELP};
use session::Session;

mod command;
mod session;

#[derive(Parser, Debug)]
#[command(version, about = "Terminal shell for the token faucet")]
struct Args {
    #[arg(long, default_value = "ui.toml", env = "FAUCET_UI_CONFIG_FILE")]
    config_file: PathBuf,

    /// Wallet key used by `connect` when no path is given
    #[arg(long, env = "FAUCET_UI_KEY_FILE")]
    key_file: Option<PathBuf>,

    /// Submit claims without asking for confirmation
    #[arg(long, short = 'y')]
    yes: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
        )
        .init();

    let config = BridgeConfig::load(Some(&args.config_file)).context("loading ui config")?;
    let config_error = config
        .token_contract()
        .and(config.faucet_contract())
        .err()
        .map(|e| e.to_string());
    if let Some(error) = &config_error {
        warn!("{error}");
    }
    info!("Using node {} (chain id {})", config.node_url, config.chain_id);

    let (events_tx, mut events_rx) = mpsc::channel(64);
    let mut shell = Shell {
        session: Session::new(config.chain_id, config_error),
        bridge: FaucetBridge::new(config).context("building node client")?,
        wallet: None,
        subscription: SubscriptionSlot::default(),
        key_file: args.key_file,
        auto_confirm: args.yes,
        events: events_tx,
    };

    let mut network = tokio::time::interval(Duration::from_secs(2));
    let mut countdown = tokio::time::interval(Duration::from_secs(1));
    let mut lines = BufReader::new(tokio::io::stdin()).lines();

    shell.render();
    loop {
        tokio::select! {
            _ = network.tick() => shell.poll_network().await,
            _ = countdown.tick() => {
                if shell.session.tick() {
                    shell.render();
                }
            }
            Some(message) = events_rx.recv() => shell.on_subscription(message).await,
            line = lines.next_line() => match line {
                Ok(Some(line)) => {
                    if !shell.handle_line(&line).await {
                        break;
                    }
                }
                Ok(None) => break,
                Err(e) => {
                    warn!("Could not read stdin: {e}");
                    break;
                }
            },
        }
    }

    shell.disconnect();
    Ok(())
}

struct Shell {
    session: Session,
    bridge: FaucetBridge,
    wallet: Option<Wallet>,
    subscription: SubscriptionSlot,
    key_file: Option<PathBuf>,
    auto_confirm: bool,
    events: mpsc::Sender<SubscriptionMessage>,
}

impl Shell {
    fn render(&self) {
        let mut stdout = std::io::stdout().lock();
        let _ = write!(stdout, "\x1b[2J\x1b[H{}", self.session.render());
        let _ = stdout.flush();
    }

    /// Returns false when the shell should exit.
    async fn handle_line(&mut self, line: &str) -> bool {
        let Some(command) = Command::parse(line, self.session.awaiting_confirmation) else {
            return true;
        };
        debug!(?command, "Command");
        match command {
            Command::Connect(path) => self.connect(path).await,
            Command::Claim => self.claim().await,
            Command::Answer(true) => self.submit_claim().await,
            Command::Answer(false) => {
                self.session.awaiting_confirmation = false;
                self.session
                    .claim_finished(Err(&ClientError::from(WalletError::Rejected)));
            }
            Command::Refresh => self.refresh().await,
            Command::Disconnect => self.disconnect(),
            Command::Help => {
                println!("{HELP}");
                return true;
            }
            Command::Quit => return false,
            Command::Unknown(word) => {
                self.session.error = Some(format!("Unknown command `{word}`, try `help`"));
            }
        }
        self.render();
        true
    }

    async fn poll_network(&mut self) {
        let before = self.session.clone();
        let result = self.bridge.check_network().await;
        if self.session.apply_network(result.as_ref()) {
            info!("Chain changed under the session, dropping the account");
            self.wallet = None;
            self.subscription.clear();
        }
        if self.session != before {
            self.render();
        }
    }

    async fn connect(&mut self, path: Option<PathBuf>) {
        let Some(path) = path.or_else(|| self.key_file.clone()) else {
            self.session.error = Some(format!(
                "{}, pass --key-file or `connect <key-file>`",
                WalletError::NoProvider
            ));
            return;
        };
        self.session.loading = true;
        self.render();
        let result = self.attach_wallet(&path).await;
        self.session.loading = false;
        if let Err(e) = result {
            warn!("Connecting {} failed: {e}", path.display());
            self.session.error = Some("Failed to connect wallet".to_string());
        }
    }

    async fn attach_wallet(&mut self, path: &Path) -> Result<(), ClientError> {
        let wallet = Wallet::load(path)?;
        let account = wallet.identity().clone();

        self.subscription.clear();
        self.session.connected(account.clone());
        self.wallet = Some(wallet);

        if let Ok(token) = self.bridge.token_info().await {
            self.session.set_token(token.symbol, token.decimals);
        }
        if let Ok(status) = self.bridge.faucet_status().await {
            self.session.set_claim_amount(status.claim_amount);
        }
        let (bridge, events) = (&self.bridge, &self.events);
        if let Err(e) = self
            .subscription
            .replace(|| bridge.subscribe(account.clone(), events.clone()))
        {
            self.session.error = Some(e.to_string());
        }
        info!("Connected {account}");
        self.refresh().await;
        Ok(())
    }

    fn disconnect(&mut self) {
        self.subscription.clear();
        self.wallet = None;
        self.session.disconnected();
    }

    async fn refresh(&mut self) {
        let Some(account) = self.session.account.clone() else {
            return;
        };
        match self.bridge.snapshot(&account).await {
            Ok(snapshot) => self.session.apply_snapshot(&snapshot),
            Err(e) => {
                warn!("Failed to update data: {e}");
                self.session.refresh_failed(&e);
            }
        }
    }

    async fn claim(&mut self) {
        if self.wallet.is_none() {
            self.session.error = Some("Connect your wallet first".to_string());
            return;
        }
        if !self.session.claim_enabled() {
            self.session.error = Some("Claim not available yet".to_string());
            return;
        }
        if self.auto_confirm {
            self.submit_claim().await;
        } else {
            self.session.awaiting_confirmation = true;
        }
    }

    async fn submit_claim(&mut self) {
        let Some(wallet) = self.wallet.clone() else {
            self.session.awaiting_confirmation = false;
            return;
        };
        self.session.claim_started();
        self.render();
        match self.bridge.request_tokens(&wallet).await {
            Ok(receipt) => {
                info!("Claim settled in tx {}", receipt.tx_hash);
                self.session.claim_finished(Ok(receipt.tx_hash.0.as_str()));
                self.refresh().await;
            }
            Err(e) => {
                warn!("Claim failed: {e}");
                self.session.claim_finished(Err(&e));
            }
        }
    }

    async fn on_subscription(&mut self, message: SubscriptionMessage) {
        match message {
            SubscriptionMessage::Event(event) => {
                debug!(?event, "Event");
                self.refresh().await;
            }
            SubscriptionMessage::Closed { filter, error } => {
                debug!(?filter, "Event stream closed");
                if let Some(error) = error {
                    self.session.error = Some(ClientError::WebSocket(error).to_string());
                }
            }
        }
        self.render();
    }
}
