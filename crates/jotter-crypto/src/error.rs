//! Error types for cryptographic operations.

use thiserror::Error;

/// Cryptographic operation errors.
#[derive(Error, Debug)]
pub enum CryptoError {
    /// Server secret shorter than the accepted minimum.
    #[error("Secret too short (minimum {0} characters required)")]
    SecretTooShort(usize),

    /// Key derivation failed.
    #[error("Key derivation failed: {0}")]
    KeyDerivation(String),

    /// Encryption failed.
    #[error("Encryption failed: {0}")]
    Encryption(String),

    /// Decryption failed - wrong key, tampered or corrupted data.
    #[error("Decryption failed: {0}")]
    Decryption(String),

    /// Sealed value carries a version prefix this build does not know.
    #[error("Unsupported sealed format: {0}")]
    UnsupportedVersion(String),

    /// Password hashing or hash parsing failed.
    #[error("Password hash error: {0}")]
    PasswordHash(String),

    /// Token could not be issued, or failed signature/claim validation.
    #[error("Invalid token: {0}")]
    Token(String),

    /// Token signature is valid but `exp` has passed.
    #[error("Token expired")]
    TokenExpired,
}

/// Result type for cryptographic operations.
pub type CryptoResult<T> = Result<T, CryptoError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_secret_too_short_display() {
        let err = CryptoError::SecretTooShort(32);
        assert!(err.to_string().contains("32"));
    }

    #[test]
    fn test_unsupported_version_display() {
        let err = CryptoError::UnsupportedVersion("v9".into());
        assert_eq!(err.to_string(), "Unsupported sealed format: v9");
    }

    #[test]
    fn test_token_expired_display() {
        assert_eq!(CryptoError::TokenExpired.to_string(), "Token expired");
    }
}
