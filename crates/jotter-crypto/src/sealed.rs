//! Sealing of third-party API keys at rest.

use std::sync::Arc;

use crate::cipher::{aes_gcm_decrypt, aes_gcm_encrypt, generate_nonce};
use crate::error::{CryptoError, CryptoResult};
use crate::format::{decode_sealed, encode_sealed};
use crate::kdf::MasterKey;

/// Encrypts and decrypts short secrets with a key derived from the server
/// secret. Cheap to clone; the key is shared.
#[derive(Clone, Debug)]
pub struct SecretBox {
    key: Arc<MasterKey>,
}

impl SecretBox {
    pub fn new(server_secret: &str) -> CryptoResult<Self> {
        Ok(Self {
            key: Arc::new(MasterKey::derive(server_secret)?),
        })
    }

    /// Seal a plaintext secret. Every call uses a fresh nonce.
    pub fn seal(&self, plaintext: &str) -> CryptoResult<String> {
        let nonce = generate_nonce();
        let ciphertext = aes_gcm_encrypt(self.key.as_bytes(), &nonce, plaintext.as_bytes())?;
        Ok(encode_sealed(&nonce, &ciphertext))
    }

    /// Open a value produced by [`SecretBox::seal`].
    pub fn open(&self, sealed: &str) -> CryptoResult<String> {
        let (nonce, ciphertext) = decode_sealed(sealed)?;
        let plaintext = aes_gcm_decrypt(self.key.as_bytes(), &nonce, &ciphertext)?;
        String::from_utf8(plaintext)
            .map_err(|_| CryptoError::Decryption("plaintext is not UTF-8".into()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::format::{base64_decode, base64_encode, SEALED_V1_PREFIX};

    const SECRET: &str = "an-encryption-key-of-enough-length!!";

    #[test]
    fn test_seal_open() {
        let sb = SecretBox::new(SECRET).unwrap();
        let sealed = sb.seal("sk-proj-abc123").unwrap();
        assert!(!sealed.contains("sk-proj"));
        assert_eq!(sb.open(&sealed).unwrap(), "sk-proj-abc123");
    }

    #[test]
    fn test_seal_is_randomized() {
        let sb = SecretBox::new(SECRET).unwrap();
        assert_ne!(sb.seal("same").unwrap(), sb.seal("same").unwrap());
    }

    #[test]
    fn test_open_with_other_secret_fails() {
        let sealed = SecretBox::new(SECRET).unwrap().seal("sk-1").unwrap();
        let other = SecretBox::new("a-completely-different-secret-value").unwrap();
        assert!(matches!(
            other.open(&sealed),
            Err(CryptoError::Decryption(_))
        ));
    }

    #[test]
    fn test_open_tampered_fails() {
        let sb = SecretBox::new(SECRET).unwrap();
        let sealed = sb.seal("sk-1").unwrap();
        let mut raw = base64_decode(&sealed[SEALED_V1_PREFIX.len()..]).unwrap();
        let last = raw.len() - 1;
        raw[last] ^= 0x80;
        let tampered = format!("{}{}", SEALED_V1_PREFIX, base64_encode(&raw));
        assert!(sb.open(&tampered).is_err());
    }

    #[test]
    fn test_short_server_secret_rejected() {
        assert!(SecretBox::new("short").is_err());
    }

    #[test]
    fn test_unicode_round_trip() {
        let sb = SecretBox::new(SECRET).unwrap();
        let sealed = sb.seal("密钥-🔑").unwrap();
        assert_eq!(sb.open(&sealed).unwrap(), "密钥-🔑");
    }
}
