//! HS256 bearer tokens.

use std::sync::Arc;

use chrono::Utc;
use jsonwebtoken::{
    decode, encode, errors::ErrorKind, Algorithm, DecodingKey, EncodingKey, Header, Validation,
};
use serde::{Deserialize, Serialize};

use crate::error::{CryptoError, CryptoResult};
use crate::kdf::validate_secret;

/// Claims carried by a bearer token.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Claims {
    /// Subject: the user id.
    pub sub: String,
    /// Issued at (unix seconds).
    pub iat: i64,
    /// Expiry (unix seconds).
    pub exp: i64,
}

struct SignerKeys {
    encoding: EncodingKey,
    decoding: DecodingKey,
}

/// Issues and verifies bearer tokens for one server secret.
#[derive(Clone)]
pub struct TokenSigner {
    keys: Arc<SignerKeys>,
    ttl_secs: i64,
}

impl std::fmt::Debug for TokenSigner {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TokenSigner")
            .field("ttl_secs", &self.ttl_secs)
            .finish_non_exhaustive()
    }
}

impl TokenSigner {
    pub fn new(secret: &str, ttl_secs: i64) -> CryptoResult<Self> {
        validate_secret(secret)?;
        Ok(Self {
            keys: Arc::new(SignerKeys {
                encoding: EncodingKey::from_secret(secret.as_bytes()),
                decoding: DecodingKey::from_secret(secret.as_bytes()),
            }),
            ttl_secs,
        })
    }

    /// Token lifetime in seconds.
    pub fn ttl_secs(&self) -> i64 {
        self.ttl_secs
    }

    /// Issue a token for `subject` valid for the configured lifetime.
    pub fn issue(&self, subject: &str) -> CryptoResult<String> {
        let now = Utc::now().timestamp();
        let claims = Claims {
            sub: subject.to_string(),
            iat: now,
            exp: now + self.ttl_secs,
        };
        encode(&Header::new(Algorithm::HS256), &claims, &self.keys.encoding)
            .map_err(|e| CryptoError::Token(e.to_string()))
    }

    /// Verify signature and expiry, returning the claims.
    pub fn verify(&self, token: &str) -> CryptoResult<Claims> {
        let mut validation = Validation::new(Algorithm::HS256);
        validation.leeway = 0;
        validation.set_required_spec_claims(&["exp", "sub"]);

        decode::<Claims>(token, &self.keys.decoding, &validation)
            .map(|data| data.claims)
            .map_err(|e| match e.kind() {
                ErrorKind::ExpiredSignature => CryptoError::TokenExpired,
                _ => CryptoError::Token(e.to_string()),
            })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SECRET: &str = "jwt-secret-for-tests-0123456789abcdef";

    #[test]
    fn test_issue_verify() {
        let signer = TokenSigner::new(SECRET, 3600).unwrap();
        let token = signer.issue("0191b6f0-0000-7000-8000-000000000001").unwrap();
        let claims = signer.verify(&token).unwrap();
        assert_eq!(claims.sub, "0191b6f0-0000-7000-8000-000000000001");
        assert_eq!(claims.exp - claims.iat, 3600);
    }

    #[test]
    fn test_expired_token_rejected() {
        let signer = TokenSigner::new(SECRET, -10).unwrap();
        let token = signer.issue("user").unwrap();
        assert!(matches!(
            signer.verify(&token),
            Err(CryptoError::TokenExpired)
        ));
    }

    #[test]
    fn test_foreign_signature_rejected() {
        let a = TokenSigner::new(SECRET, 3600).unwrap();
        let b = TokenSigner::new("another-jwt-secret-0123456789abcdef", 3600).unwrap();
        let token = b.issue("user").unwrap();
        assert!(matches!(a.verify(&token), Err(CryptoError::Token(_))));
    }

    #[test]
    fn test_garbage_token_rejected() {
        let signer = TokenSigner::new(SECRET, 3600).unwrap();
        assert!(signer.verify("not.a.jwt").is_err());
        assert!(signer.verify("").is_err());
    }

    #[test]
    fn test_short_secret_rejected() {
        assert!(TokenSigner::new("short", 3600).is_err());
    }
}
