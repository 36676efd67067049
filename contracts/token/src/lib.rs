use std::collections::BTreeMap;

use borsh::{BorshDeserialize, BorshSerialize};
use contracts::{
    utils, Blob, Calldata, Contract, ContractEvent, ContractName, ExecutionContext, Identity,
    RunResult, StateCommitment,
};
use serde::{Deserialize, Serialize};
use tracing::debug;

mod error;

pub use error::TokenError;

impl Contract for Token {
    fn execute(&mut self, calldata: &Calldata) -> RunResult {
        let (action, mut ctx) = utils::parse_calldata::<TokenAction>(calldata)?;
        let caller = calldata.identity.clone();

        let res = match action {
            TokenAction::Mint { to, amount } => self.mint(&caller, to, amount, &mut ctx)?,
            TokenAction::SetMinter { minter } => self.set_minter(&caller, minter, &mut ctx)?,
            TokenAction::Transfer { to, amount } => {
                self.transfer(caller, to, amount, &mut ctx)?
            }
        };

        Ok((res, ctx))
    }

    fn commit(&self) -> StateCommitment {
        StateCommitment::of(self)
    }
}

/// Fungible token ledger with a single minter.
#[derive(BorshSerialize, BorshDeserialize, Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct Token {
    name: String,
    symbol: String,
    decimals: u8,
    owner: Identity,
    minter: Identity,
    total_supply: u128,
    balances: BTreeMap<Identity, u128>,
}

/// Deployment parameters. The minter defaults to the deployer until the
/// faucet is wired in.
#[derive(BorshSerialize, BorshDeserialize, Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct TokenInit {
    pub name: String,
    pub symbol: String,
    pub decimals: u8,
    pub minter: Option<Identity>,
}

impl Default for TokenInit {
    fn default() -> Self {
        Self {
            name: "Jan Token".to_string(),
            symbol: "JAN".to_string(),
            decimals: 18,
            minter: None,
        }
    }
}

#[derive(Serialize, Deserialize, BorshSerialize, BorshDeserialize, Debug, Clone, PartialEq)]
pub enum TokenAction {
    Mint { to: Identity, amount: u128 },
    SetMinter { minter: Identity },
    Transfer { to: Identity, amount: u128 },
}

impl TokenAction {
    pub fn as_blob(&self, contract_name: ContractName) -> Result<Blob, borsh::io::Error> {
        utils::as_blob(self, contract_name)
    }
}

/// Read-only view served by the node.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct TokenInfo {
    pub name: String,
    pub symbol: String,
    pub decimals: u8,
    pub owner: Identity,
    pub minter: Identity,
    pub total_supply: u128,
}

impl Token {
    pub fn new(init: TokenInit, owner: Identity) -> Self {
        Self {
            name: init.name,
            symbol: init.symbol,
            decimals: init.decimals,
            minter: init.minter.unwrap_or_else(|| owner.clone()),
            owner,
            total_supply: 0,
            balances: BTreeMap::new(),
        }
    }

    pub fn balance_of(&self, account: &Identity) -> u128 {
        self.balances.get(account).copied().unwrap_or(0)
    }

    pub fn total_supply(&self) -> u128 {
        self.total_supply
    }

    pub fn minter(&self) -> &Identity {
        &self.minter
    }

    pub fn owner(&self) -> &Identity {
        &self.owner
    }

    pub fn info(&self) -> TokenInfo {
        TokenInfo {
            name: self.name.clone(),
            symbol: self.symbol.clone(),
            decimals: self.decimals,
            owner: self.owner.clone(),
            minter: self.minter.clone(),
            total_supply: self.total_supply,
        }
    }

    pub fn mint(
        &mut self,
        caller: &Identity,
        to: Identity,
        amount: u128,
        ctx: &mut ExecutionContext,
    ) -> Result<String, TokenError> {
        if caller != &self.minter {
            return Err(TokenError::NotMinter);
        }
        let total_supply = self
            .total_supply
            .checked_add(amount)
            .ok_or(TokenError::Overflow)?;
        let balance = self
            .balance_of(&to)
            .checked_add(amount)
            .ok_or(TokenError::Overflow)?;

        self.total_supply = total_supply;
        self.balances.insert(to.clone(), balance);
        debug!(%to, amount, "minted");
        ctx.emit(ContractEvent::Transfer {
            from: None,
            to: to.clone(),
            amount,
        });
        Ok(format!("Minted {amount} {} to {to}", self.symbol))
    }

    pub fn set_minter(
        &mut self,
        caller: &Identity,
        minter: Identity,
        ctx: &mut ExecutionContext,
    ) -> Result<String, TokenError> {
        if caller != &self.owner {
            return Err(TokenError::NotOwner);
        }
        self.minter = minter.clone();
        ctx.emit(ContractEvent::MinterChanged {
            minter: minter.clone(),
        });
        Ok(format!("Minter set to {minter}"))
    }

    pub fn transfer(
        &mut self,
        from: Identity,
        to: Identity,
        amount: u128,
        ctx: &mut ExecutionContext,
    ) -> Result<String, TokenError> {
        let from_balance = self.balance_of(&from);
        if from_balance < amount {
            return Err(TokenError::InsufficientBalance);
        }
        self.balances.insert(from.clone(), from_balance - amount);
        let to_balance = self
            .balance_of(&to)
            .checked_add(amount)
            .ok_or(TokenError::Overflow)?;
        self.balances.insert(to.clone(), to_balance);

        ctx.emit(ContractEvent::Transfer {
            from: Some(from),
            to: to.clone(),
            amount,
        });
        Ok(format!("Transferred {amount} {} to {to}", self.symbol))
    }
}
