use std::path::PathBuf;

use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand};
use client::{units::parse_units, Wallet};
use faucet::FaucetParams;
use init::{deploy_contracts, set_paused, DeployOptions};
use tracing::info;

#[derive(Parser, Debug)]
#[command(version, about = "Deploys and administers the token faucet")]
struct Cli {
    #[arg(long, env = "NODE_URL", default_value = "http://localhost:4321")]
    node_url: String,

    #[arg(long, env = "CHAIN_ID", default_value_t = 1337)]
    chain_id: u64,

    #[command(subcommand)]
    command: Cmd,
}

#[derive(Subcommand, Debug)]
enum Cmd {
    /// Writes a fresh wallet key
    Keygen {
        #[arg(long, default_value = "wallet.key")]
        out: PathBuf,
        /// Overwrite an existing key file
        #[arg(long)]
        force: bool,
    },
    /// Deploys the token and the faucet, then makes the faucet the minter
    Deploy {
        #[arg(long, env = "KEY_FILE", default_value = "wallet.key")]
        key_file: PathBuf,
        #[arg(long, default_value = "jan")]
        token_contract: String,
        #[arg(long, default_value = "faucet")]
        faucet_contract: String,
        /// Tokens per claim
        #[arg(long)]
        claim_amount: Option<String>,
        #[arg(long)]
        cooldown_secs: Option<u64>,
        /// Tokens one account may claim in total
        #[arg(long)]
        lifetime_cap: Option<String>,
        /// Where to write the UI configuration
        #[arg(long)]
        write_config: Option<PathBuf>,
    },
    /// Pauses or unpauses claims (admin only)
    SetPaused {
        #[arg(long, env = "KEY_FILE", default_value = "wallet.key")]
        key_file: PathBuf,
        #[arg(long, default_value = "faucet")]
        faucet_contract: String,
        #[arg(action = clap::ArgAction::Set)]
        paused: bool,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    tracing_subscriber::fmt().init();

    match cli.command {
        Cmd::Keygen { out, force } => {
            if out.exists() && !force {
                bail!("{} already exists, pass --force to overwrite", out.display());
            }
            let wallet = Wallet::generate();
            wallet
                .save(&out)
                .with_context(|| format!("writing {}", out.display()))?;
            info!("🔑 Wrote key for {} to {}", wallet.identity(), out.display());
        }
        Cmd::Deploy {
            key_file,
            token_contract,
            faucet_contract,
            claim_amount,
            cooldown_secs,
            lifetime_cap,
            write_config,
        } => {
            let wallet = Wallet::load(&key_file).context("loading wallet")?;
            let mut options = DeployOptions {
                token_contract: token_contract.into(),
                faucet_contract: faucet_contract.into(),
                ..Default::default()
            };
            options.params = faucet_params(
                options.token.decimals,
                claim_amount.as_deref(),
                cooldown_secs,
                lifetime_cap.as_deref(),
            )?;

            let deployment = deploy_contracts(&cli.node_url, cli.chain_id, &wallet, options).await?;

            println!("Deployment complete.");
            println!("------------------");
            println!("Token contract: {}", deployment.token_contract);
            println!("Faucet contract: {}", deployment.faucet_contract);
            println!("Admin: {}", deployment.admin);
            println!("------------------");

            if let Some(path) = write_config {
                let content = deployment
                    .config
                    .to_toml()
                    .context("encoding UI configuration")?;
                std::fs::write(&path, content)
                    .with_context(|| format!("writing {}", path.display()))?;
                info!("Wrote UI configuration to {}", path.display());
            }
        }
        Cmd::SetPaused {
            key_file,
            faucet_contract,
            paused,
        } => {
            let wallet = Wallet::load(&key_file).context("loading wallet")?;
            set_paused(
                &cli.node_url,
                cli.chain_id,
                &wallet,
                faucet_contract.into(),
                paused,
            )
            .await?;
        }
    }
    Ok(())
}

fn faucet_params(
    decimals: u8,
    claim_amount: Option<&str>,
    cooldown_secs: Option<u64>,
    lifetime_cap: Option<&str>,
) -> Result<FaucetParams> {
    let mut params = FaucetParams::default();
    if let Some(amount) = claim_amount {
        params.claim_amount =
            parse_units(amount, decimals).with_context(|| format!("invalid amount {amount}"))?;
    }
    if let Some(cooldown) = cooldown_secs {
        params.cooldown_secs = cooldown;
    }
    if let Some(cap) = lifetime_cap {
        params.lifetime_cap =
            parse_units(cap, decimals).with_context(|| format!("invalid amount {cap}"))?;
    }
    params.validate()?;
    Ok(params)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn params_default_to_faucet_constants() {
        let params = faucet_params(18, None, None, None).unwrap();
        assert_eq!(params, FaucetParams::default());
    }

    #[test]
    fn params_parse_token_amounts() {
        let params = faucet_params(18, Some("1.5"), Some(60), Some("3")).unwrap();
        assert_eq!(params.claim_amount, 1_500_000_000_000_000_000);
        assert_eq!(params.cooldown_secs, 60);
        assert_eq!(params.lifetime_cap, 3_000_000_000_000_000_000);

        assert!(faucet_params(18, Some("ten"), None, None).is_err());
        assert!(faucet_params(18, Some("5"), None, Some("1")).is_err());
    }
}
