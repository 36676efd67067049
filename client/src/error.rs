use contracts::{Revert, TxError};
use faucet::FaucetError;

#[derive(Debug, thiserror::Error)]
pub enum WalletError {
    #[error("No wallet configured")]
    NoProvider,

    #[error("Transaction rejected by user")]
    Rejected,

    #[error("Wrong network: expected chain id {expected}, node reports {actual}")]
    NetworkMismatch { expected: u64, actual: u64 },

    #[error("Invalid wallet key: {0}")]
    InvalidKey(String),
}

#[derive(Debug, thiserror::Error)]
pub enum ClientError {
    #[error("{0}")]
    Configuration(String),

    #[error(transparent)]
    Wallet(#[from] WalletError),

    /// The node refused the transaction or a contract aborted it.
    #[error("{0}")]
    Reverted(Revert),

    #[error("Node request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Unexpected response {status}: {body}")]
    UnexpectedResponse { status: u16, body: String },

    #[error("Event stream failed: {0}")]
    WebSocket(String),

    #[error(transparent)]
    Transaction(#[from] TxError),

    #[error("Could not encode action: {0}")]
    Encoding(#[from] std::io::Error),
}

impl ClientError {
    /// Typed faucet error behind a revert, if any.
    pub fn faucet_error(&self) -> Option<FaucetError> {
        match self {
            ClientError::Reverted(revert) => FaucetError::try_from(revert).ok(),
            _ => None,
        }
    }

    /// The node did not answer within the client timeout.
    pub fn is_timeout(&self) -> bool {
        matches!(self, ClientError::Http(e) if e.is_timeout())
    }

    pub fn revert(&self) -> Option<&Revert> {
        match self {
            ClientError::Reverted(revert) => Some(revert),
            _ => None,
        }
    }
}
