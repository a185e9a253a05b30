//! Text encoding of sealed values.
//!
//! ```text
//! v1:<base64(nonce(12) || ciphertext || tag(16))>
//! ```

use base64::Engine;

use crate::cipher::{NONCE_LEN, TAG_LEN};
use crate::error::{CryptoError, CryptoResult};

/// Version prefix of the current sealed format.
pub const SEALED_V1_PREFIX: &str = "v1:";

/// Encode bytes to standard base64.
pub fn base64_encode(data: &[u8]) -> String {
    base64::engine::general_purpose::STANDARD.encode(data)
}

/// Decode standard base64.
pub fn base64_decode(data: &str) -> CryptoResult<Vec<u8>> {
    base64::engine::general_purpose::STANDARD
        .decode(data)
        .map_err(|e| CryptoError::Decryption(format!("invalid base64: {}", e)))
}

/// Render a nonce and ciphertext as a versioned sealed string.
pub fn encode_sealed(nonce: &[u8; NONCE_LEN], ciphertext: &[u8]) -> String {
    let mut raw = Vec::with_capacity(NONCE_LEN + ciphertext.len());
    raw.extend_from_slice(nonce);
    raw.extend_from_slice(ciphertext);
    format!("{}{}", SEALED_V1_PREFIX, base64_encode(&raw))
}

/// Split a sealed string into its nonce and ciphertext.
pub fn decode_sealed(sealed: &str) -> CryptoResult<([u8; NONCE_LEN], Vec<u8>)> {
    let body = match sealed.strip_prefix(SEALED_V1_PREFIX) {
        Some(body) => body,
        None => {
            let version = sealed.split(':').next().unwrap_or_default();
            return Err(CryptoError::UnsupportedVersion(version.to_string()));
        }
    };

    let raw = base64_decode(body)?;
    if raw.len() < NONCE_LEN + TAG_LEN {
        return Err(CryptoError::Decryption(format!(
            "sealed value too short: {} bytes",
            raw.len()
        )));
    }

    let mut nonce = [0u8; NONCE_LEN];
    nonce.copy_from_slice(&raw[..NONCE_LEN]);
    Ok((nonce, raw[NONCE_LEN..].to_vec()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_encode_has_prefix() {
        let sealed = encode_sealed(&[0u8; NONCE_LEN], &[1u8; TAG_LEN]);
        assert!(sealed.starts_with("v1:"));
    }

    #[test]
    fn test_decode_splits_nonce() {
        let nonce = [9u8; NONCE_LEN];
        let body = vec![3u8; TAG_LEN + 4];
        let (n, c) = decode_sealed(&encode_sealed(&nonce, &body)).unwrap();
        assert_eq!(n, nonce);
        assert_eq!(c, body);
    }

    #[test]
    fn test_decode_unknown_version() {
        let err = decode_sealed("v2:AAAA").unwrap_err();
        assert!(matches!(err, CryptoError::UnsupportedVersion(v) if v == "v2"));
    }

    #[test]
    fn test_decode_legacy_iv_hex_rejected() {
        // iv:hex values from older deployments are not readable
        let err = decode_sealed("00112233445566778899aabbccddeeff:abcdef").unwrap_err();
        assert!(matches!(err, CryptoError::UnsupportedVersion(_)));
    }

    #[test]
    fn test_decode_too_short() {
        let sealed = format!("v1:{}", base64_encode(&[0u8; 10]));
        assert!(matches!(
            decode_sealed(&sealed),
            Err(CryptoError::Decryption(_))
        ));
    }

    #[test]
    fn test_decode_bad_base64() {
        assert!(decode_sealed("v1:not base64!!").is_err());
    }
}
