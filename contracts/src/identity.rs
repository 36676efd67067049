use std::fmt;

use borsh::{BorshDeserialize, BorshSerialize};
use k256::ecdsa::VerifyingKey;
use serde::{Deserialize, Serialize};

/// Caller of a contract: an externally owned `0x` address, or the name of the
/// contract that issued a callee blob.
#[derive(
    Serialize,
    Deserialize,
    BorshSerialize,
    BorshDeserialize,
    Debug,
    Clone,
    Default,
    PartialEq,
    Eq,
    PartialOrd,
    Ord,
    Hash,
)]
pub struct Identity(pub String);

impl Identity {
    /// Ethereum style address: last 20 bytes of keccak-256 over the
    /// uncompressed public key without its 0x04 prefix.
    pub fn from_public_key(key: &VerifyingKey) -> Self {
        let point = key.to_encoded_point(false);
        let hash = keccak_hash::keccak(&point.as_bytes()[1..]);
        Identity(format!("0x{}", hex::encode(&hash.0[12..])))
    }

    pub fn is_address(&self) -> bool {
        self.0.len() == 42
            && self.0.starts_with("0x")
            && self.0[2..].chars().all(|c| c.is_ascii_hexdigit())
    }

    /// Lowercases hex addresses so lookups do not depend on input casing.
    pub fn normalized(self) -> Self {
        if self.is_address() {
            Identity(self.0.to_ascii_lowercase())
        } else {
            self
        }
    }

    /// `0x1234...abcd`
    pub fn short(&self) -> String {
        if self.is_address() {
            format!("{}...{}", &self.0[..6], &self.0[38..])
        } else {
            self.0.clone()
        }
    }
}

impl fmt::Display for Identity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for Identity {
    fn from(s: &str) -> Self {
        Identity(s.to_string())
    }
}

impl From<String> for Identity {
    fn from(s: String) -> Self {
        Identity(s)
    }
}

impl From<&ContractName> for Identity {
    fn from(name: &ContractName) -> Self {
        Identity(name.0.clone())
    }
}

#[derive(
    Serialize,
    Deserialize,
    BorshSerialize,
    BorshDeserialize,
    Debug,
    Clone,
    Default,
    PartialEq,
    Eq,
    PartialOrd,
    Ord,
    Hash,
)]
pub struct ContractName(pub String);

impl ContractName {
    /// Names share the identity namespace with addresses, so they must never
    /// look like one.
    pub fn is_valid(&self) -> bool {
        !self.0.is_empty()
            && self.0.len() <= 64
            && !self.0.starts_with("0x")
            && self
                .0
                .chars()
                .all(|c| c.is_ascii_lowercase() || c.is_ascii_digit() || c == '-' || c == '_')
    }
}

impl fmt::Display for ContractName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for ContractName {
    fn from(s: &str) -> Self {
        ContractName(s.to_string())
    }
}

impl From<String> for ContractName {
    fn from(s: String) -> Self {
        ContractName(s)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use k256::ecdsa::SigningKey;

    #[test]
    fn address_from_known_key() {
        // Private key 1 maps to the well known generator address.
        let mut bytes = [0u8; 32];
        bytes[31] = 1;
        let key = SigningKey::from_slice(&bytes).unwrap();
        let identity = Identity::from_public_key(key.verifying_key());
        assert_eq!(
            identity.0,
            "0x7e5f4552091a69125d5dfcb7b8c2659029395bdf"
        );
        assert!(identity.is_address());
        assert_eq!(identity.short(), "0x7e5f...5bdf");
    }

    #[test]
    fn normalizes_hex_case() {
        let id = Identity::from("0x7E5F4552091A69125d5DfCb7b8C2659029395Bdf").normalized();
        assert_eq!(id.0, "0x7e5f4552091a69125d5dfcb7b8c2659029395bdf");
        let name = Identity::from("Faucet").normalized();
        assert_eq!(name.0, "Faucet");
    }

    #[test]
    fn contract_names() {
        assert!(ContractName::from("faucet").is_valid());
        assert!(ContractName::from("jan_token-2").is_valid());
        assert!(!ContractName::from("").is_valid());
        assert!(!ContractName::from("0xfaucet").is_valid());
        assert!(!ContractName::from("Faucet").is_valid());
        assert!(!ContractName::from("a/b").is_valid());
    }
}
