use contracts::{
    api::{NodeInfo, Receipt},
    BlobData, ContractName, EventFilter, Identity, ProgramKind, TxPayload, UnsignedTransaction,
};
use faucet::{ClaimantStatus, FaucetAction, FaucetInit, FaucetParams, FaucetStatus};
use token::{TokenAction, TokenInfo, TokenInit};
use tokio::sync::mpsc;
use tracing::{debug, info};

use crate::{
    config::BridgeConfig,
    error::{ClientError, WalletError},
    rest_client::NodeApiHttpClient,
    subscription::{Subscription, SubscriptionMessage},
    wallet::Wallet,
};

/// Everything the UI shows for one account, read in one go.
#[derive(Debug, Clone, PartialEq)]
pub struct AccountSnapshot {
    pub account: Identity,
    pub balance: u128,
    pub claimant: ClaimantStatus,
    pub paused: bool,
}

/// Typed access to the token and faucet contracts through a node.
#[derive(Clone, Debug)]
pub struct FaucetBridge {
    node: NodeApiHttpClient,
    config: BridgeConfig,
}

impl FaucetBridge {
    pub fn new(config: BridgeConfig) -> Result<Self, ClientError> {
        let node = NodeApiHttpClient::new(&config.node_url)?;
        Ok(Self { node, config })
    }

    pub fn node(&self) -> &NodeApiHttpClient {
        &self.node
    }

    pub fn config(&self) -> &BridgeConfig {
        &self.config
    }

    /// Node info, failing if the node serves another chain.
    pub async fn check_network(&self) -> Result<NodeInfo, ClientError> {
        let info = self.node.get_info().await?;
        if info.chain_id != self.config.chain_id {
            return Err(WalletError::NetworkMismatch {
                expected: self.config.chain_id,
                actual: info.chain_id,
            }
            .into());
        }
        Ok(info)
    }

    // --------------------------------------------------------
    //     Reads
    // --------------------------------------------------------

    pub async fn balance_of(&self, account: &Identity) -> Result<u128, ClientError> {
        let token = self.config.token_contract()?;
        self.node.get_balance(&token, account).await
    }

    pub async fn token_info(&self) -> Result<TokenInfo, ClientError> {
        let token = self.config.token_contract()?;
        self.node.get_token(&token).await
    }

    pub async fn faucet_status(&self) -> Result<FaucetStatus, ClientError> {
        let faucet = self.config.faucet_contract()?;
        self.node.get_faucet(&faucet).await
    }

    pub async fn claimant(&self, account: &Identity) -> Result<ClaimantStatus, ClientError> {
        let faucet = self.config.faucet_contract()?;
        self.node.get_claimant(&faucet, account).await
    }

    pub async fn can_claim(&self, account: &Identity) -> Result<bool, ClientError> {
        Ok(self.claimant(account).await?.can_claim)
    }

    pub async fn remaining_allowance(&self, account: &Identity) -> Result<u128, ClientError> {
        Ok(self.claimant(account).await?.remaining_allowance)
    }

    pub async fn last_claim_at(&self, account: &Identity) -> Result<u64, ClientError> {
        Ok(self.claimant(account).await?.last_claim_at)
    }

    pub async fn total_claimed(&self, account: &Identity) -> Result<u128, ClientError> {
        Ok(self.claimant(account).await?.total_claimed)
    }

    pub async fn is_paused(&self) -> Result<bool, ClientError> {
        Ok(self.faucet_status().await?.paused)
    }

    pub async fn snapshot(&self, account: &Identity) -> Result<AccountSnapshot, ClientError> {
        let (balance, claimant, status) = tokio::try_join!(
            self.balance_of(account),
            self.claimant(account),
            self.faucet_status()
        )?;
        Ok(AccountSnapshot {
            account: account.clone(),
            balance,
            claimant,
            paused: status.paused,
        })
    }

    // --------------------------------------------------------
    //     Writes
    // --------------------------------------------------------

    pub async fn request_tokens(&self, wallet: &Wallet) -> Result<Receipt, ClientError> {
        let faucet = self.config.faucet_contract()?;
        let blob = FaucetAction::RequestTokens.as_blob(faucet)?;
        self.send(wallet, TxPayload::Call(blob)).await
    }

    pub async fn set_paused(&self, wallet: &Wallet, paused: bool) -> Result<Receipt, ClientError> {
        let faucet = self.config.faucet_contract()?;
        let blob = FaucetAction::SetPaused { paused }.as_blob(faucet)?;
        self.send(wallet, TxPayload::Call(blob)).await
    }

    pub async fn set_minter(
        &self,
        wallet: &Wallet,
        minter: Identity,
    ) -> Result<Receipt, ClientError> {
        let token = self.config.token_contract()?;
        let blob = TokenAction::SetMinter { minter }.as_blob(token)?;
        self.send(wallet, TxPayload::Call(blob)).await
    }

    pub async fn transfer(
        &self,
        wallet: &Wallet,
        to: Identity,
        amount: u128,
    ) -> Result<Receipt, ClientError> {
        let token = self.config.token_contract()?;
        let blob = TokenAction::Transfer { to, amount }.as_blob(token)?;
        self.send(wallet, TxPayload::Call(blob)).await
    }

    pub async fn deploy_token(
        &self,
        wallet: &Wallet,
        name: ContractName,
        init: TokenInit,
    ) -> Result<Receipt, ClientError> {
        let init = BlobData(borsh::to_vec(&init)?);
        self.deploy(wallet, name, ProgramKind::Token, init).await
    }

    pub async fn deploy_faucet(
        &self,
        wallet: &Wallet,
        name: ContractName,
        token: ContractName,
        params: FaucetParams,
    ) -> Result<Receipt, ClientError> {
        let init = BlobData(borsh::to_vec(&FaucetInit { token, params })?);
        self.deploy(wallet, name, ProgramKind::Faucet, init).await
    }

    async fn deploy(
        &self,
        wallet: &Wallet,
        contract_name: ContractName,
        program: ProgramKind,
        init: BlobData,
    ) -> Result<Receipt, ClientError> {
        info!("🚀 Deploying {program} contract {contract_name}");
        self.send(
            wallet,
            TxPayload::Deploy {
                contract_name,
                program,
                init,
            },
        )
        .await
    }

    /// Signs `payload` with the wallet's next nonce and submits it.
    pub async fn send(&self, wallet: &Wallet, payload: TxPayload) -> Result<Receipt, ClientError> {
        let identity = wallet.identity().clone();
        let nonce = self.node.get_nonce(&identity).await?;
        let tx = wallet.sign(UnsignedTransaction {
            chain_id: self.config.chain_id,
            identity,
            nonce,
            payload,
        })?;
        let receipt = self.node.send_tx(&tx).await?;
        debug!(
            "Tx {} settled in block {}",
            receipt.tx_hash, receipt.block_height
        );
        Ok(receipt)
    }

    // --------------------------------------------------------
    //     Events
    // --------------------------------------------------------

    /// Streams transfers on the token and claims on the faucet that concern
    /// `account`.
    pub fn subscribe(
        &self,
        account: Identity,
        sink: mpsc::Sender<SubscriptionMessage>,
    ) -> Result<Subscription, ClientError> {
        let filters = vec![
            EventFilter {
                contract: Some(self.config.token_contract()?),
                account: Some(account.clone()),
            },
            EventFilter {
                contract: Some(self.config.faucet_contract()?),
                account: Some(account.clone()),
            },
        ];
        Ok(Subscription::attach(&self.node, account, filters, sink))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn unconfigured_contracts_fail_before_any_request() {
        // Nothing listens here; configuration errors must come first.
        let bridge = FaucetBridge::new(BridgeConfig {
            node_url: "http://127.0.0.1:9".into(),
            ..Default::default()
        })
        .unwrap();
        let wallet = Wallet::generate();

        let err = bridge.request_tokens(&wallet).await.unwrap_err();
        assert_eq!(err.to_string(), "Faucet address not configured");

        let err = bridge.balance_of(wallet.identity()).await.unwrap_err();
        assert_eq!(err.to_string(), "Token address not configured");

        let (tx, _rx) = mpsc::channel(1);
        assert!(matches!(
            bridge.subscribe(wallet.identity().clone(), tx),
            Err(ClientError::Configuration(_))
        ));
    }
}
