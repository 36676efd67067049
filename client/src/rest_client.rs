use std::time::Duration;

use contracts::{
    api::{AdvanceTime, BalanceResponse, ContractInfo, NodeInfo, NonceResponse, Receipt},
    ContractName, Identity, Revert, Transaction,
};
use faucet::{ClaimantStatus, FaucetStatus};
use reqwest::{Response, Url};
use serde::{de::DeserializeOwned, Deserialize};
use token::TokenInfo;

use crate::error::ClientError;

/// Typed HTTP client for the node REST API.
#[derive(Clone, Debug)]
pub struct NodeApiHttpClient {
    url: Url,
    client: reqwest::Client,
}

/// Upper bound on a single request, connect included.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(10);

/// Error body returned by the node.
#[derive(Deserialize)]
struct ErrorBody {
    code: String,
    reason: String,
}

impl NodeApiHttpClient {
    pub fn new(url: impl AsRef<str>) -> Result<Self, ClientError> {
        Self::with_timeout(url, DEFAULT_TIMEOUT)
    }

    pub fn with_timeout(url: impl AsRef<str>, timeout: Duration) -> Result<Self, ClientError> {
        let url = Url::parse(url.as_ref())
            .map_err(|e| ClientError::Configuration(format!("Invalid node url: {e}")))?;
        let client = reqwest::Client::builder().timeout(timeout).build()?;
        Ok(Self { url, client })
    }

    pub fn url(&self) -> &Url {
        &self.url
    }

    /// Websocket endpoint streaming committed events.
    pub fn events_url(&self, contract: Option<&ContractName>, account: Option<&Identity>) -> String {
        let mut url = self.url.clone();
        let scheme = match url.scheme() {
            "https" => "wss",
            "http" => "ws",
            other => other,
        }
        .to_string();
        // http and ws are both special schemes, so the swap cannot fail.
        let _ = url.set_scheme(&scheme);
        let path = format!("{}/v1/events/ws", url.path().trim_end_matches('/'));
        url.set_path(&path);
        url.set_query(None);
        url.set_fragment(None);
        if contract.is_some() || account.is_some() {
            let mut query = url.query_pairs_mut();
            if let Some(contract) = contract {
                query.append_pair("contract", &contract.to_string());
            }
            if let Some(account) = account {
                query.append_pair("account", &account.to_string());
            }
        }
        url.into()
    }

    fn endpoint(&self, path: &str) -> String {
        format!("{}{path}", self.url.as_str().trim_end_matches('/'))
    }

    async fn get<T: DeserializeOwned>(&self, path: &str) -> Result<T, ClientError> {
        let response = self.client.get(self.endpoint(path)).send().await?;
        decode(response).await
    }

    async fn post<B: serde::Serialize, T: DeserializeOwned>(
        &self,
        path: &str,
        body: &B,
    ) -> Result<T, ClientError> {
        let response = self
            .client
            .post(self.endpoint(path))
            .json(body)
            .send()
            .await?;
        decode(response).await
    }

    pub async fn get_info(&self) -> Result<NodeInfo, ClientError> {
        self.get("/v1/info").await
    }

    pub async fn get_nonce(&self, account: &Identity) -> Result<u64, ClientError> {
        let response: NonceResponse = self.get(&format!("/v1/account/{account}/nonce")).await?;
        Ok(response.nonce)
    }

    pub async fn send_tx(&self, tx: &Transaction) -> Result<Receipt, ClientError> {
        self.post("/v1/tx", tx).await
    }

    pub async fn get_contract(&self, name: &ContractName) -> Result<ContractInfo, ClientError> {
        self.get(&format!("/v1/contract/{name}")).await
    }

    pub async fn get_token(&self, name: &ContractName) -> Result<TokenInfo, ClientError> {
        self.get(&format!("/v1/contract/{name}/token")).await
    }

    pub async fn get_balance(
        &self,
        name: &ContractName,
        account: &Identity,
    ) -> Result<u128, ClientError> {
        let response: BalanceResponse = self
            .get(&format!("/v1/contract/{name}/balance/{account}"))
            .await?;
        Ok(response.balance)
    }

    pub async fn get_faucet(&self, name: &ContractName) -> Result<FaucetStatus, ClientError> {
        self.get(&format!("/v1/contract/{name}/faucet")).await
    }

    pub async fn get_claimant(
        &self,
        name: &ContractName,
        account: &Identity,
    ) -> Result<ClaimantStatus, ClientError> {
        self.get(&format!("/v1/contract/{name}/claimant/{account}"))
            .await
    }

    /// Dev mode only.
    pub async fn advance_time(&self, seconds: u64) -> Result<NodeInfo, ClientError> {
        self.post("/v1/dev/advance_time", &AdvanceTime { seconds })
            .await
    }
}

async fn decode<T: DeserializeOwned>(response: Response) -> Result<T, ClientError> {
    let status = response.status();
    if status.is_success() {
        return Ok(response.json().await?);
    }
    let body = response.text().await?;
    Err(error_from_body(status.as_u16(), &body))
}

fn error_from_body(status: u16, body: &str) -> ClientError {
    match serde_json::from_str::<ErrorBody>(body) {
        Ok(error) => ClientError::Reverted(Revert::new(error.code, error.reason)),
        Err(_) => ClientError::UnexpectedResponse {
            status,
            body: body.to_string(),
        },
    }
}
