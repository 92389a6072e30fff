//! Signer identities and the signing capability
//!
//! A signer authorizes individual instructions inside a bundle. The trait is
//! the injection point: production code uses [`Ed25519Signer`], tests and
//! hardware-backed setups provide their own implementations.

use ed25519_dalek::{Signer as DalekSigner, SigningKey, VerifyingKey};
use rand::rngs::OsRng;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::Path;
use thiserror::Error;
use zeroize::Zeroize;

/// Public identity of a signer: an ed25519 verifying key.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SignerIdentity {
    public_key: [u8; 32],
}

impl SignerIdentity {
    pub fn new(public_key: [u8; 32]) -> Self {
        Self { public_key }
    }

    pub fn as_bytes(&self) -> &[u8; 32] {
        &self.public_key
    }

    /// The dalek verifying key, if the bytes are a valid curve point.
    pub fn verifying_key(&self) -> Result<VerifyingKey, SignerError> {
        VerifyingKey::from_bytes(&self.public_key)
            .map_err(|e| SignerError::InvalidKey(e.to_string()))
    }
}

impl fmt::Display for SignerIdentity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&hex::encode(self.public_key))
    }
}

#[derive(Error, Debug)]
pub enum SignerError {
    #[error("failed to read keyfile {path}: {source}")]
    Keyfile {
        path: String,
        source: std::io::Error,
    },

    #[error("invalid keypair: {0}")]
    InvalidKey(String),

    /// A signer could not produce a signature for its assigned instruction,
    /// e.g. a hardware wallet went away mid-call.
    #[error("signer unavailable: {0}")]
    Unavailable(String),
}

/// Signing capability consumed by the transaction layer.
pub trait Signer: Send + Sync {
    /// The identity whose counter and signature slots this signer fills.
    fn identity(&self) -> SignerIdentity;

    /// Sign an instruction digest.
    fn sign(&self, message: &[u8]) -> Result<Vec<u8>, SignerError>;
}

/// In-process ed25519 signer.
pub struct Ed25519Signer {
    signing_key: SigningKey,
}

impl Ed25519Signer {
    /// Generate a fresh random signer.
    pub fn generate() -> Self {
        Self {
            signing_key: SigningKey::generate(&mut OsRng),
        }
    }

    pub fn from_seed(seed: [u8; 32]) -> Self {
        Self {
            signing_key: SigningKey::from_bytes(&seed),
        }
    }

    /// Load a signer from a keyfile.
    ///
    /// Accepts a JSON array of bytes holding either the 32-byte seed or the
    /// 64-byte seed-plus-public form. All-zero keys are rejected outright.
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, SignerError> {
        let path = path.as_ref();
        let raw = std::fs::read(path).map_err(|source| SignerError::Keyfile {
            path: path.display().to_string(),
            source,
        })?;

        let mut bytes: Vec<u8> = serde_json::from_slice(&raw)
            .map_err(|e| SignerError::InvalidKey(format!("keyfile is not a JSON byte array: {e}")))?;

        if bytes.len() != 32 && bytes.len() != 64 {
            bytes.zeroize();
            return Err(SignerError::InvalidKey(format!(
                "expected 32 or 64 bytes, got {}",
                bytes.len()
            )));
        }
        if bytes.iter().all(|&b| b == 0) {
            return Err(SignerError::InvalidKey("all-zero key rejected".to_string()));
        }

        let mut seed = [0u8; 32];
        seed.copy_from_slice(&bytes[..32]);
        bytes.zeroize();

        let signer = Self::from_seed(seed);
        seed.zeroize();
        Ok(signer)
    }
}

impl Signer for Ed25519Signer {
    fn identity(&self) -> SignerIdentity {
        SignerIdentity::new(self.signing_key.verifying_key().to_bytes())
    }

    fn sign(&self, message: &[u8]) -> Result<Vec<u8>, SignerError> {
        Ok(self.signing_key.sign(message).to_bytes().to_vec())
    }
}

impl fmt::Debug for Ed25519Signer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Ed25519Signer")
            .field("identity", &self.identity().to_string())
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ed25519_dalek::{Signature, Verifier};
    use std::io::Write;

    #[test]
    fn signature_verifies_under_identity() {
        let signer = Ed25519Signer::generate();
        let msg = b"instruction digest";
        let sig = signer.sign(msg).unwrap();

        let key = signer.identity().verifying_key().unwrap();
        let sig = Signature::from_slice(&sig).unwrap();
        assert!(key.verify(msg, &sig).is_ok());
    }

    #[test]
    fn keyfile_round_trip() {
        let signer = Ed25519Signer::generate();
        let seed = signer.signing_key.to_bytes();

        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(serde_json::to_string(&seed.to_vec()).unwrap().as_bytes())
            .unwrap();

        let loaded = Ed25519Signer::from_file(file.path()).unwrap();
        assert_eq!(loaded.identity(), signer.identity());
    }

    #[test]
    fn all_zero_keyfile_is_rejected() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(serde_json::to_string(&vec![0u8; 32]).unwrap().as_bytes())
            .unwrap();

        let err = Ed25519Signer::from_file(file.path()).unwrap_err();
        assert!(matches!(err, SignerError::InvalidKey(_)));
    }

    #[test]
    fn wrong_length_keyfile_is_rejected() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(serde_json::to_string(&vec![1u8; 17]).unwrap().as_bytes())
            .unwrap();

        assert!(Ed25519Signer::from_file(file.path()).is_err());
    }
}
