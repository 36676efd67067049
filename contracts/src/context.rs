use borsh::{BorshDeserialize, BorshSerialize};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

use crate::{ContractEvent, ContractName, Identity, TxHash};

#[derive(Serialize, Deserialize, BorshSerialize, BorshDeserialize, Debug, Clone, Default, PartialEq, Eq)]
pub struct BlobData(pub Vec<u8>);

/// An encoded action addressed to one contract.
#[derive(Serialize, Deserialize, BorshSerialize, BorshDeserialize, Debug, Clone, PartialEq, Eq)]
pub struct Blob {
    pub contract_name: ContractName,
    pub data: BlobData,
}

/// Everything a contract sees about the call it is executing.
#[derive(Debug, Clone)]
pub struct Calldata {
    pub identity: Identity,
    pub contract_name: ContractName,
    pub data: BlobData,
    pub timestamp: u64,
    pub block_height: u64,
    pub tx_hash: TxHash,
}

#[derive(Debug, Clone)]
pub struct ExecutionContext {
    pub caller: Identity,
    pub contract_name: ContractName,
    pub timestamp: u64,
    pub block_height: u64,
    pub events: Vec<ContractEvent>,
    pub callees: Vec<Blob>,
}

impl ExecutionContext {
    pub fn new(calldata: &Calldata) -> Self {
        Self {
            caller: calldata.identity.clone(),
            contract_name: calldata.contract_name.clone(),
            timestamp: calldata.timestamp,
            block_height: calldata.block_height,
            events: vec![],
            callees: vec![],
        }
    }

    pub fn emit(&mut self, event: ContractEvent) {
        self.events.push(event);
    }

    /// Queues a call to another contract. It runs after the current blob, in
    /// the same transaction, with this contract as caller.
    pub fn call(&mut self, blob: Blob) {
        self.callees.push(blob);
    }
}

/// Abort reason. `code` is stable and machine readable, `reason` is shown to
/// users as is.
#[derive(
    Serialize,
    Deserialize,
    BorshSerialize,
    BorshDeserialize,
    Debug,
    Clone,
    PartialEq,
    Eq,
    thiserror::Error,
)]
#[error("{reason}")]
pub struct Revert {
    pub code: String,
    pub reason: String,
}

impl Revert {
    pub fn new(code: impl Into<String>, reason: impl Into<String>) -> Self {
        Self {
            code: code.into(),
            reason: reason.into(),
        }
    }
}

pub type RunResult = Result<(String, ExecutionContext), Revert>;

#[derive(Serialize, Deserialize, BorshSerialize, BorshDeserialize, Debug, Clone, Default, PartialEq, Eq)]
pub struct StateCommitment(pub Vec<u8>);

impl StateCommitment {
    /// sha-256 over the borsh encoding of `state`.
    pub fn of<T: BorshSerialize>(state: &T) -> Self {
        let mut hasher = Sha256::new();
        // Writing into a hasher cannot fail.
        let _ = state.serialize(&mut hasher);
        StateCommitment(hasher.finalize().to_vec())
    }
}

pub trait Contract {
    /// Entry point of the contract's logic
    fn execute(&mut self, calldata: &Calldata) -> RunResult;

    fn commit(&self) -> StateCommitment;
}

pub mod utils {
    use super::*;

    pub fn parse_calldata<T: BorshDeserialize>(
        calldata: &Calldata,
    ) -> Result<(T, ExecutionContext), Revert> {
        let action = borsh::from_slice::<T>(&calldata.data.0).map_err(|e| {
            Revert::new(
                "INVALID_CALLDATA",
                format!("Could not decode action for {}: {e}", calldata.contract_name),
            )
        })?;
        Ok((action, ExecutionContext::new(calldata)))
    }

    pub fn as_blob<T: BorshSerialize>(
        action: &T,
        contract_name: ContractName,
    ) -> Result<Blob, borsh::io::Error> {
        Ok(Blob {
            contract_name,
            data: BlobData(borsh::to_vec(action)?),
        })
    }
}
