use std::collections::BTreeMap;

use borsh::{BorshDeserialize, BorshSerialize};
use serde::{Deserialize, Serialize};
use tracing::debug;

use contracts::{
    utils, Blob, Calldata, Contract, ContractEvent, ContractName, ExecutionContext, Identity,
    RunResult, StateCommitment,
};
use token::TokenAction;

mod error;

pub use error::FaucetError;

const UNIT: u128 = 1_000_000_000_000_000_000;

/// 10 tokens at 18 decimals.
pub const CLAIM_AMOUNT: u128 = 10 * UNIT;
/// 24 hours.
pub const COOLDOWN_SECS: u64 = 24 * 60 * 60;
/// 100 tokens at 18 decimals.
pub const LIFETIME_CAP: u128 = 100 * UNIT;

impl Contract for Faucet {
    /// Entry point of the contract's logic
    fn execute(&mut self, calldata: &Calldata) -> RunResult {
        // Parse contract inputs
        let (action, mut ctx) = utils::parse_calldata::<FaucetAction>(calldata)?;
        let identity = calldata.identity.clone();

        // Execute the given action
        let res = match action {
            FaucetAction::RequestTokens => self.request_tokens(identity, &mut ctx)?,
            FaucetAction::SetPaused { paused } => self.set_paused(&identity, paused, &mut ctx)?,
        };

        Ok((res, ctx))
    }

    fn commit(&self) -> StateCommitment {
        StateCommitment::of(self)
    }
}

impl Faucet {
    pub fn new(init: FaucetInit, admin: Identity) -> Result<Self, FaucetError> {
        init.params.validate()?;
        Ok(Self {
            config: FaucetConfig {
                admin,
                token: init.token,
                paused: false,
                params: init.params,
            },
            claimants: BTreeMap::new(),
        })
    }

    /// First failing gate for a claim by `user` at `now`, checked in the
    /// order pause, cooldown, lifetime cap.
    pub fn check_claim(&self, user: &Identity, now: u64) -> Result<(), FaucetError> {
        if self.config.paused {
            return Err(FaucetError::Paused);
        }
        let params = &self.config.params;
        let record = self.claimants.get(user).cloned().unwrap_or_default();
        if let Some(last) = record.last_claim_at {
            if now.saturating_sub(last) < params.cooldown_secs {
                return Err(FaucetError::CooldownNotElapsed);
            }
        }
        match record.total_claimed.checked_add(params.claim_amount) {
            Some(total) if total <= params.lifetime_cap => Ok(()),
            _ => Err(FaucetError::LifetimeCapExceeded),
        }
    }

    pub fn request_tokens(
        &mut self,
        user: Identity,
        ctx: &mut ExecutionContext,
    ) -> Result<String, FaucetError> {
        let now = ctx.timestamp;
        self.check_claim(&user, now)?;

        let amount = self.config.params.claim_amount;
        let mint = TokenAction::Mint {
            to: user.clone(),
            amount,
        }
        .as_blob(self.config.token.clone())
        .map_err(|e| FaucetError::Encoding(e.to_string()))?;

        let record = self.claimants.entry(user.clone()).or_default();
        record.last_claim_at = Some(now);
        record.total_claimed += amount;
        let total = record.total_claimed;

        ctx.call(mint);
        ctx.emit(ContractEvent::TokensClaimed {
            user: user.clone(),
            amount,
            timestamp: now,
        });
        debug!(%user, amount, total, "tokens claimed");

        Ok(format!("Claimed {amount} for {user}, total claimed {total}"))
    }

    pub fn set_paused(
        &mut self,
        caller: &Identity,
        paused: bool,
        ctx: &mut ExecutionContext,
    ) -> Result<String, FaucetError> {
        if caller != &self.config.admin {
            return Err(FaucetError::Unauthorized);
        }
        self.config.paused = paused;
        ctx.emit(ContractEvent::PauseChanged { paused });
        Ok(if paused {
            "Faucet paused".to_string()
        } else {
            "Faucet resumed".to_string()
        })
    }

    pub fn can_claim(&self, user: &Identity, now: u64) -> bool {
        self.check_claim(user, now).is_ok()
    }

    pub fn remaining_allowance(&self, user: &Identity) -> u128 {
        self.config
            .params
            .lifetime_cap
            .saturating_sub(self.total_claimed(user))
    }

    /// Zero when `user` never claimed.
    pub fn last_claim_at(&self, user: &Identity) -> u64 {
        self.claimants
            .get(user)
            .and_then(|r| r.last_claim_at)
            .unwrap_or(0)
    }

    pub fn total_claimed(&self, user: &Identity) -> u128 {
        self.claimants
            .get(user)
            .map(|r| r.total_claimed)
            .unwrap_or(0)
    }

    pub fn next_claim_at(&self, user: &Identity) -> Option<u64> {
        self.claimants
            .get(user)
            .and_then(|r| r.last_claim_at)
            .map(|last| last.saturating_add(self.config.params.cooldown_secs))
    }

    pub fn is_paused(&self) -> bool {
        self.config.paused
    }

    pub fn admin(&self) -> &Identity {
        &self.config.admin
    }

    pub fn token(&self) -> &ContractName {
        &self.config.token
    }

    pub fn params(&self) -> &FaucetParams {
        &self.config.params
    }

    pub fn status(&self) -> FaucetStatus {
        FaucetStatus {
            admin: self.config.admin.clone(),
            token: self.config.token.clone(),
            paused: self.config.paused,
            claim_amount: self.config.params.claim_amount,
            cooldown_secs: self.config.params.cooldown_secs,
            lifetime_cap: self.config.params.lifetime_cap,
            claimants: self.claimants.len(),
        }
    }

    pub fn claimant(&self, user: &Identity, now: u64) -> ClaimantStatus {
        ClaimantStatus {
            account: user.clone(),
            can_claim: self.can_claim(user, now),
            remaining_allowance: self.remaining_allowance(user),
            last_claim_at: self.last_claim_at(user),
            total_claimed: self.total_claimed(user),
            next_claim_at: self.next_claim_at(user),
            now,
        }
    }
}

#[derive(BorshSerialize, BorshDeserialize, Serialize, Deserialize, Debug, Clone, Default, PartialEq)]
pub struct ClaimantRecord {
    last_claim_at: Option<u64>,
    total_claimed: u128,
}

#[derive(BorshSerialize, BorshDeserialize, Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct FaucetParams {
    pub claim_amount: u128,
    pub cooldown_secs: u64,
    pub lifetime_cap: u128,
}

impl Default for FaucetParams {
    fn default() -> Self {
        Self {
            claim_amount: CLAIM_AMOUNT,
            cooldown_secs: COOLDOWN_SECS,
            lifetime_cap: LIFETIME_CAP,
        }
    }
}

impl FaucetParams {
    pub fn validate(&self) -> Result<(), FaucetError> {
        if self.claim_amount == 0 {
            return Err(FaucetError::InvalidParams("claim amount is zero".to_string()));
        }
        if self.claim_amount > self.lifetime_cap {
            return Err(FaucetError::InvalidParams(
                "claim amount exceeds lifetime cap".to_string(),
            ));
        }
        Ok(())
    }
}

/// Admin owned configuration. `paused` only changes through `set_paused`.
#[derive(BorshSerialize, BorshDeserialize, Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct FaucetConfig {
    admin: Identity,
    token: ContractName,
    paused: bool,
    params: FaucetParams,
}

#[derive(BorshSerialize, BorshDeserialize, Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct Faucet {
    config: FaucetConfig,
    claimants: BTreeMap<Identity, ClaimantRecord>,
}

#[derive(BorshSerialize, BorshDeserialize, Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct FaucetInit {
    pub token: ContractName,
    pub params: FaucetParams,
}

/// Enum representing possible calls to the contract functions.
#[derive(Serialize, Deserialize, BorshSerialize, BorshDeserialize, Debug, Clone, PartialEq)]
pub enum FaucetAction {
    RequestTokens,
    SetPaused { paused: bool },
}

impl FaucetAction {
    pub fn as_blob(&self, contract_name: ContractName) -> Result<Blob, borsh::io::Error> {
        utils::as_blob(self, contract_name)
    }
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct FaucetStatus {
    pub admin: Identity,
    pub token: ContractName,
    pub paused: bool,
    pub claim_amount: u128,
    pub cooldown_secs: u64,
    pub lifetime_cap: u128,
    pub claimants: usize,
}

/// Eligibility of one account, evaluated at node time `now`.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct ClaimantStatus {
    pub account: Identity,
    pub can_claim: bool,
    pub remaining_allowance: u128,
    pub last_claim_at: u64,
    pub total_claimed: u128,
    pub next_claim_at: Option<u64>,
    pub now: u64,
}

impl ClaimantStatus {
    /// Seconds until the cooldown elapses, zero when ready.
    pub fn cooldown_remaining(&self) -> u64 {
        self.next_claim_at
            .map(|next| next.saturating_sub(self.now))
            .unwrap_or(0)
    }
}
