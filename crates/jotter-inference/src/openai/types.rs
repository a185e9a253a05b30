//! OpenAI-compatible chat completion wire types.

use serde::{Deserialize, Deserializer, Serialize};

// =============================================================================
// REQUEST TYPES
// =============================================================================

/// Request body for the chat completions endpoint.
#[derive(Debug, Clone, Serialize)]
pub struct ChatCompletionRequest {
    pub model: String,
    pub messages: Vec<ChatMessage>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub temperature: Option<f32>,
    pub stream: bool,
}

impl ChatCompletionRequest {
    /// Streaming request with one system and one user message.
    pub fn streaming(model: &str, system: &str, user: &str) -> Self {
        Self {
            model: model.to_string(),
            messages: vec![ChatMessage::system(system), ChatMessage::user(user)],
            temperature: None,
            stream: true,
        }
    }
}

/// A single chat message.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChatMessage {
    pub role: String,
    pub content: String,
}

impl ChatMessage {
    pub fn system(content: &str) -> Self {
        Self {
            role: "system".to_string(),
            content: content.to_string(),
        }
    }

    pub fn user(content: &str) -> Self {
        Self {
            role: "user".to_string(),
            content: content.to_string(),
        }
    }
}

// =============================================================================
// STREAMING TYPES
// =============================================================================

/// One `data:` record of a streaming response.
///
/// Only the fields the decoder reads are required; providers add others.
#[derive(Debug, Deserialize)]
pub struct ChatCompletionChunk {
    #[serde(default)]
    pub id: Option<String>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub choices: Vec<ChatChunkChoice>,
}

/// Single choice in a streaming chunk.
#[derive(Debug, Deserialize)]
pub struct ChatChunkChoice {
    #[serde(default)]
    pub index: usize,
    #[serde(default, deserialize_with = "null_as_default")]
    pub delta: ChatDelta,
    #[serde(default)]
    pub finish_reason: Option<String>,
}

/// Delta content in a streaming response.
#[derive(Debug, Default, Deserialize)]
pub struct ChatDelta {
    #[serde(default)]
    pub role: Option<String>,
    #[serde(default)]
    pub content: Option<String>,
}

/// Treat an explicit `null` like a missing field.
fn null_as_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Default + Deserialize<'de>,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}

impl ChatCompletionChunk {
    /// Concatenated delta content of every choice, in order.
    pub fn delta_text(&self) -> Option<String> {
        let mut text = String::new();
        for choice in &self.choices {
            if let Some(content) = &choice.delta.content {
                text.push_str(content);
            }
        }
        (!text.is_empty()).then_some(text)
    }
}

// =============================================================================
// ERROR TYPES
// =============================================================================

/// Error response body from an OpenAI-compatible API.
#[derive(Debug, Deserialize)]
pub struct OpenAIErrorResponse {
    pub error: OpenAIError,
}

/// Detailed error information.
#[derive(Debug, Deserialize)]
pub struct OpenAIError {
    #[serde(default)]
    pub message: Option<String>,
    #[serde(rename = "type", default)]
    pub error_type: Option<String>,
    #[serde(default)]
    pub code: Option<serde_json::Value>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_streaming_request_serialization() {
        let req = ChatCompletionRequest::streaming("qwen-turbo", "be brief", "hello");
        let json = serde_json::to_value(&req).unwrap();
        assert_eq!(json["model"], "qwen-turbo");
        assert_eq!(json["stream"], true);
        assert_eq!(json["messages"][0]["role"], "system");
        assert_eq!(json["messages"][1]["content"], "hello");
        assert!(json.get("temperature").is_none());
    }

    #[test]
    fn test_chunk_delta_text() {
        let chunk: ChatCompletionChunk = serde_json::from_str(
            r#"{"id":"c1","choices":[{"index":0,"delta":{"content":"Hel"}},{"index":1,"delta":{"content":"lo"}}]}"#,
        )
        .unwrap();
        assert_eq!(chunk.delta_text().as_deref(), Some("Hello"));
    }

    #[test]
    fn test_chunk_role_only_has_no_text() {
        let chunk: ChatCompletionChunk = serde_json::from_str(
            r#"{"choices":[{"index":0,"delta":{"role":"assistant"},"finish_reason":null}]}"#,
        )
        .unwrap();
        assert!(chunk.delta_text().is_none());
    }

    #[test]
    fn test_chunk_tolerates_missing_fields() {
        let chunk: ChatCompletionChunk = serde_json::from_str(r#"{"usage":{"total_tokens":5}}"#).unwrap();
        assert!(chunk.choices.is_empty());
        assert!(chunk.delta_text().is_none());
    }

    #[test]
    fn test_chunk_tolerates_null_delta_and_choices() {
        let chunk: ChatCompletionChunk = serde_json::from_str(
            r#"{"choices":[{"index":0,"delta":null,"finish_reason":"stop"}]}"#,
        )
        .unwrap();
        assert_eq!(chunk.choices.len(), 1);
        assert_eq!(chunk.choices[0].finish_reason.as_deref(), Some("stop"));
        assert!(chunk.delta_text().is_none());

        let chunk: ChatCompletionChunk =
            serde_json::from_str(r#"{"id":"c1","choices":null}"#).unwrap();
        assert!(chunk.choices.is_empty());
    }

    #[test]
    fn test_error_response_numeric_code() {
        let body: OpenAIErrorResponse = serde_json::from_str(
            r#"{"error":{"message":"Invalid API-key provided.","type":"invalid_request_error","code":401}}"#,
        )
        .unwrap();
        assert_eq!(body.error.message.as_deref(), Some("Invalid API-key provided."));
    }
}
