//! AES-256-GCM cipher operations.

use aes_gcm::{
    aead::{Aead, KeyInit},
    Aes256Gcm, Nonce,
};
use rand::RngCore;

use crate::error::{CryptoError, CryptoResult};

/// Nonce length for AES-256-GCM.
pub const NONCE_LEN: usize = 12;

/// Authentication tag length appended to every ciphertext.
pub const TAG_LEN: usize = 16;

/// Generate cryptographically secure random bytes.
pub fn generate_random<const N: usize>() -> [u8; N] {
    let mut bytes = [0u8; N];
    rand::thread_rng().fill_bytes(&mut bytes);
    bytes
}

/// Generate a random nonce.
pub fn generate_nonce() -> [u8; NONCE_LEN] {
    generate_random()
}

/// Encrypt plaintext with AES-256-GCM.
///
/// Returns ciphertext with the authentication tag appended.
pub fn aes_gcm_encrypt(
    key: &[u8; 32],
    nonce: &[u8; NONCE_LEN],
    plaintext: &[u8],
) -> CryptoResult<Vec<u8>> {
    let cipher =
        Aes256Gcm::new_from_slice(key).map_err(|e| CryptoError::Encryption(e.to_string()))?;

    cipher
        .encrypt(Nonce::from_slice(nonce), plaintext)
        .map_err(|_| CryptoError::Encryption("AES-GCM encryption failed".into()))
}

/// Decrypt AES-256-GCM ciphertext (tag included).
pub fn aes_gcm_decrypt(
    key: &[u8; 32],
    nonce: &[u8; NONCE_LEN],
    ciphertext: &[u8],
) -> CryptoResult<Vec<u8>> {
    let cipher = Aes256Gcm::new_from_slice(key)
        .map_err(|_| CryptoError::Decryption("invalid key".to_string()))?;

    cipher
        .decrypt(Nonce::from_slice(nonce), ciphertext)
        .map_err(|_| CryptoError::Decryption("authentication tag mismatch".to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_generate_nonce_is_random() {
        assert_ne!(generate_nonce(), generate_nonce());
    }

    #[test]
    fn test_ciphertext_carries_tag() {
        let ciphertext = aes_gcm_encrypt(&[7u8; 32], &[1u8; NONCE_LEN], b"sk-test").unwrap();
        assert_eq!(ciphertext.len(), "sk-test".len() + TAG_LEN);
    }

    #[test]
    fn test_decrypt_wrong_key_fails() {
        let nonce = [1u8; NONCE_LEN];
        let ciphertext = aes_gcm_encrypt(&[7u8; 32], &nonce, b"sk-test").unwrap();
        let result = aes_gcm_decrypt(&[8u8; 32], &nonce, &ciphertext);
        assert!(matches!(result, Err(CryptoError::Decryption(_))));
    }

    #[test]
    fn test_decrypt_tampered_fails() {
        let key = [7u8; 32];
        let nonce = [1u8; NONCE_LEN];
        let mut ciphertext = aes_gcm_encrypt(&key, &nonce, b"sk-test").unwrap();
        ciphertext[0] ^= 0x01;
        assert!(aes_gcm_decrypt(&key, &nonce, &ciphertext).is_err());
    }
}
