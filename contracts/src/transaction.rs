use std::fmt;

use borsh::{BorshDeserialize, BorshSerialize};
use k256::ecdsa::{
    signature::{Signer, Verifier},
    Signature, SigningKey, VerifyingKey,
};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

use crate::{Blob, BlobData, ContractName, Identity, Revert};

#[derive(
    Serialize, Deserialize, BorshSerialize, BorshDeserialize, Debug, Clone, Default, PartialEq, Eq, Hash,
)]
pub struct TxHash(pub String);

impl fmt::Display for TxHash {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Programs the node knows how to instantiate.
#[derive(Serialize, Deserialize, BorshSerialize, BorshDeserialize, Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProgramKind {
    Token,
    Faucet,
}

impl fmt::Display for ProgramKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ProgramKind::Token => f.write_str("token"),
            ProgramKind::Faucet => f.write_str("faucet"),
        }
    }
}

#[derive(Serialize, Deserialize, BorshSerialize, BorshDeserialize, Debug, Clone, PartialEq, Eq)]
pub enum TxPayload {
    /// `init` is the borsh encoded init record of `program`.
    Deploy {
        contract_name: ContractName,
        program: ProgramKind,
        init: BlobData,
    },
    Call(Blob),
}

#[derive(Serialize, Deserialize, BorshSerialize, BorshDeserialize, Debug, Clone, PartialEq, Eq)]
pub struct UnsignedTransaction {
    pub chain_id: u64,
    pub identity: Identity,
    pub nonce: u64,
    pub payload: TxPayload,
}

#[derive(Serialize, Deserialize, BorshSerialize, BorshDeserialize, Debug, Clone, PartialEq, Eq)]
pub struct Transaction {
    pub tx: UnsignedTransaction,
    /// Uncompressed SEC1 public key
    pub public_key: Vec<u8>,
    pub signature: Vec<u8>,
}

#[derive(Debug, thiserror::Error)]
pub enum TxError {
    #[error("Could not encode transaction: {0}")]
    Encoding(#[from] borsh::io::Error),
    #[error("Invalid public key")]
    InvalidPublicKey,
    #[error("Invalid signature")]
    InvalidSignature,
    #[error("Signer {signer} does not match transaction identity {identity}")]
    IdentityMismatch { signer: Identity, identity: Identity },
}

impl From<TxError> for Revert {
    fn from(err: TxError) -> Self {
        Revert::new("INVALID_SIGNATURE", err.to_string())
    }
}

impl UnsignedTransaction {
    pub fn signing_bytes(&self) -> Result<Vec<u8>, TxError> {
        Ok(borsh::to_vec(self)?)
    }

    pub fn sign(self, key: &SigningKey) -> Result<Transaction, TxError> {
        let signature: Signature = key.sign(&self.signing_bytes()?);
        Ok(Transaction {
            public_key: key
                .verifying_key()
                .to_encoded_point(false)
                .as_bytes()
                .to_vec(),
            signature: signature.to_bytes().to_vec(),
            tx: self,
        })
    }
}

impl Transaction {
    pub fn verify(&self) -> Result<(), TxError> {
        let key =
            VerifyingKey::from_sec1_bytes(&self.public_key).map_err(|_| TxError::InvalidPublicKey)?;
        let signer = Identity::from_public_key(&key);
        if signer != self.tx.identity {
            return Err(TxError::IdentityMismatch {
                signer,
                identity: self.tx.identity.clone(),
            });
        }
        let signature =
            Signature::from_slice(&self.signature).map_err(|_| TxError::InvalidSignature)?;
        key.verify(&self.tx.signing_bytes()?, &signature)
            .map_err(|_| TxError::InvalidSignature)
    }

    pub fn hash(&self) -> Result<TxHash, TxError> {
        let mut hasher = Sha256::new();
        hasher.update(borsh::to_vec(self)?);
        Ok(TxHash(hex::encode(hasher.finalize())))
    }
}
