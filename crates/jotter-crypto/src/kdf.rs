//! Derivation of the sealing key from the server secret.
//!
//! The configured `ENCRYPTION_KEY` is arbitrary text; it is never used as a
//! cipher key directly. HKDF-SHA256 expands it into a 256-bit key bound to a
//! fixed context string.

use hkdf::Hkdf;
use sha2::Sha256;
use zeroize::{Zeroize, ZeroizeOnDrop};

use crate::error::{CryptoError, CryptoResult};

/// Minimum server secret length in characters.
pub const MIN_SECRET_LENGTH: usize = 32;

const HKDF_SALT: &[u8] = b"jotter-provider-keys";
const HKDF_INFO: &[u8] = b"jotter sealed secret v1";

/// Key wrapper with automatic zeroization on drop.
#[derive(Zeroize, ZeroizeOnDrop)]
pub struct MasterKey {
    key: [u8; 32],
}

impl MasterKey {
    /// Derive the sealing key from a server secret.
    pub fn derive(secret: &str) -> CryptoResult<Self> {
        validate_secret(secret)?;

        let hkdf = Hkdf::<Sha256>::new(Some(HKDF_SALT), secret.as_bytes());
        let mut key = [0u8; 32];
        hkdf.expand(HKDF_INFO, &mut key)
            .map_err(|e| CryptoError::KeyDerivation(e.to_string()))?;
        Ok(Self { key })
    }

    /// Get the key bytes.
    pub fn as_bytes(&self) -> &[u8; 32] {
        &self.key
    }
}

impl std::fmt::Debug for MasterKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MasterKey")
            .field("key", &"[REDACTED]")
            .finish()
    }
}

/// Reject secrets that are too short to be used as key material.
pub fn validate_secret(secret: &str) -> CryptoResult<()> {
    if secret.chars().count() < MIN_SECRET_LENGTH {
        return Err(CryptoError::SecretTooShort(MIN_SECRET_LENGTH));
    }
    Ok(())
}
