use borsh::{BorshDeserialize, BorshSerialize};
use serde::{Deserialize, Serialize};

use crate::{ContractName, Identity, TxHash};

/// Events emitted by contracts.
#[derive(Serialize, Deserialize, BorshSerialize, BorshDeserialize, Debug, Clone, PartialEq, Eq)]
pub enum ContractEvent {
    /// `from` is empty for mints.
    Transfer {
        from: Option<Identity>,
        to: Identity,
        amount: u128,
    },
    MinterChanged {
        minter: Identity,
    },
    TokensClaimed {
        user: Identity,
        amount: u128,
        timestamp: u64,
    },
    PauseChanged {
        paused: bool,
    },
}

impl ContractEvent {
    /// Whether the event is about `account`. Contract wide events concern
    /// every account.
    pub fn concerns(&self, account: &Identity) -> bool {
        match self {
            ContractEvent::Transfer { from, to, .. } => {
                to == account || from.as_ref() == Some(account)
            }
            ContractEvent::TokensClaimed { user, .. } => user == account,
            ContractEvent::MinterChanged { .. } | ContractEvent::PauseChanged { .. } => true,
        }
    }
}

/// A committed event together with where it came from.
#[derive(Serialize, Deserialize, BorshSerialize, BorshDeserialize, Debug, Clone, PartialEq, Eq)]
pub struct Event {
    pub contract: ContractName,
    pub block_height: u64,
    pub tx_hash: TxHash,
    pub event: ContractEvent,
}

#[derive(Serialize, Deserialize, Debug, Clone, Default, PartialEq, Eq)]
pub struct EventFilter {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub contract: Option<ContractName>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub account: Option<Identity>,
}

impl EventFilter {
    pub fn matches(&self, event: &Event) -> bool {
        if let Some(contract) = &self.contract {
            if contract != &event.contract {
                return false;
            }
        }
        match &self.account {
            Some(account) => event.event.concerns(account),
            None => true,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn event(contract: &str, event: ContractEvent) -> Event {
        Event {
            contract: contract.into(),
            block_height: 1,
            tx_hash: TxHash::default(),
            event,
        }
    }

    #[test]
    fn filter_by_contract_and_account() {
        let alice: Identity = "0xa".into();
        let bob: Identity = "0xb".into();
        let mint = event(
            "token",
            ContractEvent::Transfer {
                from: None,
                to: alice.clone(),
                amount: 10,
            },
        );
        let claim = event(
            "faucet",
            ContractEvent::TokensClaimed {
                user: bob.clone(),
                amount: 10,
                timestamp: 3,
            },
        );
        let pause = event("faucet", ContractEvent::PauseChanged { paused: true });

        let alice_on_token = EventFilter {
            contract: Some("token".into()),
            account: Some(alice.clone()),
        };
        assert!(alice_on_token.matches(&mint));
        assert!(!alice_on_token.matches(&claim));

        let bob_anywhere = EventFilter {
            contract: None,
            account: Some(bob),
        };
        assert!(!bob_anywhere.matches(&mint));
        assert!(bob_anywhere.matches(&claim));
        assert!(bob_anywhere.matches(&pause));

        assert!(EventFilter::default().matches(&mint));
    }

    #[test]
    fn large_amounts_survive_json() {
        let ev = ContractEvent::Transfer {
            from: None,
            to: "0xa".into(),
            amount: 100_000_000_000_000_000_000,
        };
        let json = serde_json::to_string(&ev).unwrap();
        let back: ContractEvent = serde_json::from_str(&json).unwrap();
        assert_eq!(back, ev);
    }
}
