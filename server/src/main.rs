use std::{net::SocketAddr, path::PathBuf};

use anyhow::{Context, Result};
use clap::Parser;
use server::{
    build_router,
    clock::{unix_now, Clock},
    logger::setup_tracing,
    metrics::NodeMetrics,
    store::StateStore,
    AppModuleCtx, ChainState, Conf, Node,
};
use tracing::{info, warn};

#[derive(Parser, Debug)]
#[command(version, about = "Faucet node: token ledger, faucet controller and REST API")]
struct Args {
    /// Extra configuration file layered over the built-in defaults
    #[arg(long, env = "FAUCET_CONFIG_FILE")]
    config_file: Option<PathBuf>,
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();
    let config = Conf::new(args.config_file.as_deref())?;

    setup_tracing(&config.log_format, config.id.clone()).context("setting up tracing")?;

    info!("Starting app with config: {:?}", &config);

    let store = if config.persist {
        Some(StateStore::new(&config.data_directory)?)
    } else {
        None
    };
    let state = store
        .as_ref()
        .map(StateStore::load_from_disk_or_default)
        .unwrap_or_else(ChainState::default);

    let clock = if config.dev_mode {
        warn!("Dev mode: node time only moves through /v1/dev/advance_time");
        Clock::manual(unix_now().max(state.timestamp()))
    } else {
        Clock::System
    };

    let metrics = NodeMetrics::new(&config.id).context("registering metrics")?;
    let node = Node::new(
        config.id.clone(),
        config.chain_id,
        state,
        clock,
        store,
        metrics,
    );

    let router = build_router(AppModuleCtx {
        node,
        dev_mode: config.dev_mode,
        max_body_size: config.rest_server_max_body_size,
    });

    let addr = SocketAddr::from(([0, 0, 0, 0], config.rest_server_port));
    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .with_context(|| format!("binding {addr}"))?;
    info!("📡 Listening on {addr}, chain id {}", config.chain_id);

    axum::serve(listener, router)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("serving REST API")?;

    info!("Node stopped");
    Ok(())
}

async fn shutdown_signal() {
    #[cfg(unix)]
    {
        use tokio::signal::unix;
        let mut terminate = match unix::signal(unix::SignalKind::terminate()) {
            Ok(signal) => signal,
            Err(e) => {
                warn!("Could not install SIGTERM handler: {e}");
                let _ = tokio::signal::ctrl_c().await;
                return;
            }
        };
        tokio::select! {
            _ = tokio::signal::ctrl_c() => {
                info!("Ctrl-C received, shutting down");
            }
            _ = terminate.recv() => {
                info!("SIGTERM received, shutting down");
            }
        }
    }
    #[cfg(not(unix))]
    {
        let _ = tokio::signal::ctrl_c().await;
        info!("Ctrl-C received, shutting down");
    }
}
