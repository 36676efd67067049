use std::path::Path;

use contracts::{Identity, Transaction, TxError, UnsignedTransaction};
use k256::ecdsa::SigningKey;
use rand_core::OsRng;

use crate::error::WalletError;

/// A local signing key and the address derived from it.
#[derive(Clone)]
pub struct Wallet {
    key: SigningKey,
    identity: Identity,
}

impl std::fmt::Debug for Wallet {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Wallet")
            .field("identity", &self.identity)
            .finish_non_exhaustive()
    }
}

impl Wallet {
    pub fn generate() -> Self {
        Self::from_key(SigningKey::random(&mut OsRng))
    }

    pub fn from_key(key: SigningKey) -> Self {
        let identity = Identity::from_public_key(key.verifying_key());
        Self { key, identity }
    }

    /// Hex private key, with or without a `0x` prefix.
    pub fn from_hex(hex_key: &str) -> Result<Self, WalletError> {
        let trimmed = hex_key.trim();
        let trimmed = trimmed.strip_prefix("0x").unwrap_or(trimmed);
        let bytes = hex::decode(trimmed).map_err(|e| WalletError::InvalidKey(e.to_string()))?;
        let key =
            SigningKey::from_slice(&bytes).map_err(|e| WalletError::InvalidKey(e.to_string()))?;
        Ok(Self::from_key(key))
    }

    pub fn load(path: &Path) -> Result<Self, WalletError> {
        let content = std::fs::read_to_string(path).map_err(|e| {
            WalletError::InvalidKey(format!("reading {}: {e}", path.display()))
        })?;
        Self::from_hex(&content)
    }

    pub fn save(&self, path: &Path) -> std::io::Result<()> {
        std::fs::write(path, format!("0x{}\n", self.secret_hex()))
    }

    pub fn identity(&self) -> &Identity {
        &self.identity
    }

    pub fn secret_hex(&self) -> String {
        hex::encode(self.key.to_bytes())
    }

    pub fn sign(&self, tx: UnsignedTransaction) -> Result<Transaction, TxError> {
        tx.sign(&self.key)
    }
}

#[cfg(test)]
mod tests {
    use contracts::{Blob, BlobData, TxPayload};

    use super::*;

    const KEY_ONE: &str = "0000000000000000000000000000000000000000000000000000000000000001";

    #[test]
    fn derives_known_address() {
        let wallet = Wallet::from_hex(&format!("0x{KEY_ONE}")).unwrap();
        assert_eq!(
            wallet.identity().0,
            "0x7e5f4552091a69125d5dfcb7b8c2659029395bdf"
        );
        assert_eq!(wallet.secret_hex(), KEY_ONE);
    }

    #[test]
    fn rejects_garbage() {
        assert!(matches!(
            Wallet::from_hex("not hex"),
            Err(WalletError::InvalidKey(_))
        ));
        assert!(matches!(
            Wallet::from_hex(&"00".repeat(32)),
            Err(WalletError::InvalidKey(_))
        ));
    }

    #[test]
    fn save_then_load() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("wallet.key");
        let wallet = Wallet::generate();
        wallet.save(&path).unwrap();
        let loaded = Wallet::load(&path).unwrap();
        assert_eq!(loaded.identity(), wallet.identity());
    }

    #[test]
    fn signed_tx_verifies() {
        let wallet = Wallet::generate();
        let tx = wallet
            .sign(UnsignedTransaction {
                chain_id: 1337,
                identity: wallet.identity().clone(),
                nonce: 3,
                payload: TxPayload::Call(Blob {
                    contract_name: "faucet".into(),
                    data: BlobData(vec![0]),
                }),
            })
            .unwrap();
        tx.verify().unwrap();
    }
}
