//! Signing capability.
//!
//! The protocol layer only sees the [`Signer`] trait. [`Ed25519Signer`] is the
//! one scheme shipped here; wallets with other key types plug in through the
//! same trait.

use std::path::Path;

use async_trait::async_trait;
use ed25519_dalek::{Signer as _, SigningKey, VerifyingKey};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

use crate::data_item::UnsignedDataItem;
use crate::encoding::{b64url, b64url_decode};
use crate::error::SignerError;

/// ANS-104 signature schemes and their fixed field sizes.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum SignatureType {
    Arweave,
    Ed25519,
    Ethereum,
    Solana,
}

impl SignatureType {
    pub fn code(self) -> u16 {
        match self {
            SignatureType::Arweave => 1,
            SignatureType::Ed25519 => 2,
            SignatureType::Ethereum => 3,
            SignatureType::Solana => 4,
        }
    }

    pub fn from_code(code: u16) -> Option<Self> {
        match code {
            1 => Some(SignatureType::Arweave),
            2 => Some(SignatureType::Ed25519),
            3 => Some(SignatureType::Ethereum),
            4 => Some(SignatureType::Solana),
            _ => None,
        }
    }

    pub fn signature_len(self) -> usize {
        match self {
            SignatureType::Arweave => 512,
            SignatureType::Ed25519 | SignatureType::Solana => 64,
            SignatureType::Ethereum => 65,
        }
    }

    pub fn owner_len(self) -> usize {
        match self {
            SignatureType::Arweave => 512,
            SignatureType::Ed25519 | SignatureType::Solana => 32,
            SignatureType::Ethereum => 65,
        }
    }
}

/// What a signer hands back for an item.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SignedPayload {
    pub signature_type: SignatureType,
    pub signature: Vec<u8>,
    /// Raw public key of the signer.
    pub owner: Vec<u8>,
}

impl SignedPayload {
    /// Reject output whose sizes don't match the declared scheme.
    pub(crate) fn check_lengths(&self) -> Result<(), SignerError> {
        let expected = self.signature_type.signature_len();
        if self.signature.len() != expected {
            return Err(SignerError::BadLength {
                field: "signature",
                expected,
                actual: self.signature.len(),
            });
        }
        let expected = self.signature_type.owner_len();
        if self.owner.len() != expected {
            return Err(SignerError::BadLength {
                field: "owner",
                expected,
                actual: self.owner.len(),
            });
        }
        Ok(())
    }
}

/// Signs unsigned data items.
///
/// Implementations compute the message with
/// [`UnsignedDataItem::signing_hash`] using their own scheme and owner key.
#[async_trait]
pub trait Signer: Send + Sync {
    async fn sign(&self, item: &UnsignedDataItem) -> Result<SignedPayload, SignerError>;
}

/// On-disk key format: a JWK-style OKP key.
#[derive(Debug, Serialize, Deserialize)]
struct KeyFile {
    kty: String,
    crv: String,
    /// base64url secret key
    d: String,
    /// base64url public key
    x: String,
}

/// Ed25519 signer (ANS-104 signature type 2).
#[derive(Clone)]
pub struct Ed25519Signer {
    key: SigningKey,
}

impl Ed25519Signer {
    pub fn from_secret_bytes(secret: [u8; 32]) -> Self {
        Self {
            key: SigningKey::from_bytes(&secret),
        }
    }

    pub fn generate() -> Self {
        Self {
            key: SigningKey::generate(&mut rand::rngs::OsRng),
        }
    }

    /// Load a key written by [`Ed25519Signer::save_key_file`].
    pub fn from_key_file(path: impl AsRef<Path>) -> Result<Self, SignerError> {
        let path = path.as_ref();
        let raw = std::fs::read_to_string(path)
            .map_err(|e| SignerError::Key(format!("{}: {}", path.display(), e)))?;
        let file: KeyFile =
            serde_json::from_str(&raw).map_err(|e| SignerError::Key(e.to_string()))?;
        if file.kty != "OKP" || file.crv != "Ed25519" {
            return Err(SignerError::Key(format!(
                "unsupported key type {}/{}",
                file.kty, file.crv
            )));
        }
        let secret: [u8; 32] = b64url_decode(&file.d)
            .map_err(|e| SignerError::Key(e.to_string()))?
            .try_into()
            .map_err(|_| SignerError::Key("secret key must be 32 bytes".into()))?;
        let signer = Self::from_secret_bytes(secret);
        if b64url(signer.public_key().as_bytes()) != file.x {
            return Err(SignerError::Key(
                "public key does not match secret key".into(),
            ));
        }
        Ok(signer)
    }

    pub fn save_key_file(&self, path: impl AsRef<Path>) -> Result<(), SignerError> {
        let file = KeyFile {
            kty: "OKP".into(),
            crv: "Ed25519".into(),
            d: b64url(self.key.as_bytes()),
            x: b64url(self.public_key().as_bytes()),
        };
        let json =
            serde_json::to_string_pretty(&file).map_err(|e| SignerError::Key(e.to_string()))?;
        std::fs::write(path.as_ref(), json)
            .map_err(|e| SignerError::Key(format!("{}: {}", path.as_ref().display(), e)))
    }

    pub fn public_key(&self) -> VerifyingKey {
        self.key.verifying_key()
    }

    /// Wallet address: base64url SHA-256 of the public key.
    pub fn address(&self) -> String {
        b64url(&Sha256::digest(self.public_key().as_bytes()))
    }
}

impl std::fmt::Debug for Ed25519Signer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Ed25519Signer")
            .field("address", &self.address())
            .finish_non_exhaustive()
    }
}

#[async_trait]
impl Signer for Ed25519Signer {
    async fn sign(&self, item: &UnsignedDataItem) -> Result<SignedPayload, SignerError> {
        let owner = self.public_key().to_bytes().to_vec();
        let message = item.signing_hash(SignatureType::Ed25519, &owner);
        let signature = self.key.sign(&message);
        Ok(SignedPayload {
            signature_type: SignatureType::Ed25519,
            signature: signature.to_bytes().to_vec(),
            owner,
        })
    }
}
