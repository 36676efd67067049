use anyhow::{Context, Result};
use client::{BridgeConfig, FaucetBridge, Wallet};
use contracts::{ContractName, Identity};
use faucet::FaucetParams;
use token::TokenInit;
use tracing::info;

#[derive(Debug, Clone)]
pub struct DeployOptions {
    pub token_contract: ContractName,
    pub faucet_contract: ContractName,
    pub token: TokenInit,
    pub params: FaucetParams,
}

impl Default for DeployOptions {
    fn default() -> Self {
        Self {
            token_contract: "jan".into(),
            faucet_contract: "faucet".into(),
            token: TokenInit::default(),
            params: FaucetParams::default(),
        }
    }
}

#[derive(Debug, Clone)]
pub struct Deployment {
    pub admin: Identity,
    pub token_contract: ContractName,
    pub faucet_contract: ContractName,
    /// Ready to be written out for the UI.
    pub config: BridgeConfig,
}

/// Deploys the token, then the faucet pointing at it, then hands the
/// minter role to the faucet.
pub async fn deploy_contracts(
    node_url: &str,
    chain_id: u64,
    wallet: &Wallet,
    options: DeployOptions,
) -> Result<Deployment> {
    let config = BridgeConfig {
        node_url: node_url.to_string(),
        chain_id,
        token_contract: Some(options.token_contract.0.clone()),
        faucet_contract: Some(options.faucet_contract.0.clone()),
    };
    let bridge = FaucetBridge::new(config.clone()).context("build node client")?;
    bridge.check_network().await.context("checking node")?;

    info!("Deploying contracts with the account: {}", wallet.identity());

    bridge
        .deploy_token(wallet, options.token_contract.clone(), options.token)
        .await
        .context("deploying token")?;
    info!("✅ Token deployed as {}", options.token_contract);

    bridge
        .deploy_faucet(
            wallet,
            options.faucet_contract.clone(),
            options.token_contract.clone(),
            options.params,
        )
        .await
        .context("deploying faucet")?;
    info!("✅ Faucet deployed as {}", options.faucet_contract);

    info!("⏳ Setting minter to faucet");
    bridge
        .set_minter(wallet, Identity::from(&options.faucet_contract))
        .await
        .context("setting minter")?;
    info!("✅ Minter updated");

    Ok(Deployment {
        admin: wallet.identity().clone(),
        token_contract: options.token_contract,
        faucet_contract: options.faucet_contract,
        config,
    })
}

pub async fn set_paused(
    node_url: &str,
    chain_id: u64,
    wallet: &Wallet,
    faucet_contract: ContractName,
    paused: bool,
) -> Result<()> {
    let bridge = FaucetBridge::new(BridgeConfig {
        node_url: node_url.to_string(),
        chain_id,
        token_contract: None,
        faucet_contract: Some(faucet_contract.0),
    })
    .context("build node client")?;
    let receipt = bridge
        .set_paused(wallet, paused)
        .await
        .context("sending setPaused")?;
    info!(
        "✅ Faucet {} in block {}",
        if paused { "paused" } else { "unpaused" },
        receipt.block_height
    );
    Ok(())
}
