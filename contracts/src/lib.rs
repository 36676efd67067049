//! Contract runtime shared by the token ledger, the faucet, the node and the
//! client: identities, blobs, execution context, events and signed
//! transactions.

pub mod api;
mod context;
mod event;
mod identity;
mod transaction;

pub use context::{
    utils, Blob, BlobData, Calldata, Contract, ExecutionContext, Revert, RunResult,
    StateCommitment,
};
pub use event::{ContractEvent, Event, EventFilter};
pub use identity::{ContractName, Identity};
pub use transaction::{ProgramKind, Transaction, TxError, TxHash, TxPayload, UnsignedTransaction};

/// Upper bound on blobs executed for one transaction, callees included.
pub const MAX_BLOBS_PER_TX: usize = 16;
