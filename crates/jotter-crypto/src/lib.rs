//! # jotter-crypto
//!
//! Cryptographic primitives for jotter.
//!
//! ## Primitives
//!
//! - **Secret sealing**: AES-256-GCM with a key derived by HKDF-SHA256 from
//!   the server secret; used for provider API keys at rest
//! - **Passwords**: Argon2id PHC strings
//! - **Bearer tokens**: HS256 JWTs carrying the user id
//!
//! ## Examples
//!
//! ```rust
//! use jotter_crypto::SecretBox;
//!
//! let sb = SecretBox::new("server-secret-of-at-least-32-chars!").unwrap();
//! let sealed = sb.seal("sk-live-123").unwrap();
//! assert!(sealed.starts_with("v1:"));
//! assert_eq!(sb.open(&sealed).unwrap(), "sk-live-123");
//! ```
//!
//! ```rust
//! use jotter_crypto::TokenSigner;
//!
//! let signer = TokenSigner::new("jwt-secret-of-at-least-32-chars!!", 3600).unwrap();
//! let token = signer.issue("user-id").unwrap();
//! assert_eq!(signer.verify(&token).unwrap().sub, "user-id");
//! ```

pub mod cipher;
pub mod error;
pub mod format;
pub mod kdf;
pub mod password;
pub mod sealed;
pub mod token;

// Re-export commonly used types
pub use cipher::generate_random;
pub use error::{CryptoError, CryptoResult};
pub use format::{base64_decode, base64_encode};
pub use kdf::{validate_secret, MasterKey, MIN_SECRET_LENGTH};
pub use password::{hash_password, verify_password};
pub use sealed::SecretBox;
pub use token::{Claims, TokenSigner};
