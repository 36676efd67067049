//! Shapes of the node's REST surface, shared by the server and its clients.

use serde::{Deserialize, Serialize};

use crate::{ContractName, Event, Identity, ProgramKind, TxHash};

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct NodeInfo {
    pub id: String,
    pub chain_id: u64,
    pub block_height: u64,
    /// Time the next block would carry.
    pub timestamp: u64,
    pub dev_mode: bool,
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct NonceResponse {
    pub account: Identity,
    pub nonce: u64,
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct BalanceResponse {
    pub account: Identity,
    pub balance: u128,
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct ContractInfo {
    pub name: ContractName,
    pub program: ProgramKind,
    /// Hex encoded
    pub state_commitment: String,
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct Receipt {
    pub tx_hash: TxHash,
    pub block_height: u64,
    pub timestamp: u64,
    /// One entry per executed blob, callees included.
    pub outputs: Vec<String>,
    pub events: Vec<Event>,
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct AdvanceTime {
    pub seconds: u64,
}
