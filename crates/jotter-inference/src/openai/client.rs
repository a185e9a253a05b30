//! HTTP client for OpenAI-compatible streaming chat completions.

use std::pin::Pin;
use std::time::Duration;

use async_trait::async_trait;
use bytes::Bytes;
use futures::{Stream, StreamExt};
use reqwest::Client;
use tracing::debug;

use jotter_core::{defaults::GEN_TIMEOUT_SECS, Error, Result};

use super::error::error_from_response;
use super::types::ChatCompletionRequest;
use crate::provider::Credential;

/// Raw response body of an established completion stream.
pub type ByteStream = Pin<Box<dyn Stream<Item = Result<Bytes>> + Send>>;

/// Opens completion streams. Implemented over HTTP by [`OpenAICompatClient`].
#[async_trait]
pub trait CompletionBackend: Send + Sync {
    /// Send the request and return the response body once a 2xx status has
    /// been received. Connection failures and non-2xx statuses are errors.
    async fn open_stream(
        &self,
        credential: &Credential,
        request: &ChatCompletionRequest,
    ) -> Result<ByteStream>;
}

/// reqwest-based [`CompletionBackend`].
#[derive(Debug, Clone)]
pub struct OpenAICompatClient {
    client: Client,
}

impl OpenAICompatClient {
    /// Create a client with an overall request timeout.
    pub fn new(timeout: Duration) -> Result<Self> {
        let client = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| Error::Config(format!("Failed to create HTTP client: {}", e)))?;
        Ok(Self { client })
    }

    fn build_request(&self, credential: &Credential) -> reqwest::RequestBuilder {
        self.client
            .post(credential.endpoint())
            .header("Authorization", format!("Bearer {}", credential.api_key))
            .header("Content-Type", "application/json")
            .header("Accept", "text/event-stream")
    }
}

impl Default for OpenAICompatClient {
    fn default() -> Self {
        Self {
            client: Client::builder()
                .timeout(Duration::from_secs(GEN_TIMEOUT_SECS))
                .build()
                .unwrap_or_default(),
        }
    }
}

#[async_trait]
impl CompletionBackend for OpenAICompatClient {
    async fn open_stream(
        &self,
        credential: &Credential,
        request: &ChatCompletionRequest,
    ) -> Result<ByteStream> {
        debug!(
            subsystem = "inference",
            component = "openai",
            op = "open_stream",
            provider = %credential.provider,
            model = %request.model,
            "Opening completion stream"
        );

        let response = self
            .build_request(credential)
            .json(request)
            .send()
            .await
            .map_err(|e| Error::Request(format!("Request failed: {}", e)))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(error_from_response(status.as_u16(), &body));
        }

        let body = response
            .bytes_stream()
            .map(|chunk| chunk.map_err(|e| Error::Inference(format!("Stream error: {}", e))));
        Ok(Box::pin(body))
    }
}
