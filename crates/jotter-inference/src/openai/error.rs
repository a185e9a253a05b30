//! Provider error mapping.

use jotter_core::{defaults::ERROR_BODY_PREVIEW_CHARS, Error};

use super::types::OpenAIErrorResponse;

/// Build the error for a non-2xx response from its status and raw body.
///
/// The provider's `error.message` is used when the body is JSON. Otherwise
/// the message is `"API request failed: <status>: <body preview>..."`.
pub fn error_from_response(status: u16, body: &str) -> Error {
    let default_message = format!("API request failed: {}", status);

    let (message, error_type) = match serde_json::from_str::<OpenAIErrorResponse>(body) {
        Ok(parsed) => (
            parsed.error.message.unwrap_or(default_message),
            parsed.error.error_type.unwrap_or_default(),
        ),
        Err(_) if body.trim().is_empty() => (default_message, String::new()),
        Err(_) => {
            let preview: String = body.chars().take(ERROR_BODY_PREVIEW_CHARS).collect();
            (format!("{}: {}...", default_message, preview), String::new())
        }
    };

    tracing::debug!(
        subsystem = "inference",
        component = "openai",
        status,
        error_type = %error_type,
        "Provider returned an error response"
    );

    Error::Provider { status, message }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_json_body_uses_provider_message() {
        let err = error_from_response(
            401,
            r#"{"error":{"message":"Incorrect API key provided","type":"invalid_request_error"}}"#,
        );
        match err {
            Error::Provider { status, message } => {
                assert_eq!(status, 401);
                assert_eq!(message, "Incorrect API key provided");
            }
            other => panic!("unexpected {other:?}"),
        }
    }

    #[test]
    fn test_json_body_without_message_uses_status() {
        let err = error_from_response(500, r#"{"error":{}}"#);
        assert_eq!(err.to_string(), "Provider error (500): API request failed: 500");
    }

    #[test]
    fn test_text_body_is_truncated() {
        let body = "x".repeat(500);
        match error_from_response(502, &body) {
            Error::Provider { message, .. } => {
                assert_eq!(
                    message,
                    format!("API request failed: 502: {}...", "x".repeat(100))
                );
            }
            other => panic!("unexpected {other:?}"),
        }
    }

    #[test]
    fn test_empty_body() {
        match error_from_response(503, "") {
            Error::Provider { message, .. } => assert_eq!(message, "API request failed: 503"),
            other => panic!("unexpected {other:?}"),
        }
    }
}
