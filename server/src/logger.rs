use anyhow::{Context, Result};
use tracing::info;
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

/// `log_format` is `json` for structured output, anything else for the
/// human readable formatter.
pub fn setup_tracing(log_format: &str, node_name: String) -> Result<()> {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("info,tower_http=info"));

    let registry = tracing_subscriber::registry().with(filter);
    match log_format {
        "json" => registry.with(fmt::layer().json()).try_init(),
        _ => registry.with(fmt::layer()).try_init(),
    }
    .context("setting up tracing")?;

    info!(node = %node_name, "Tracing initialized");
    Ok(())
}
