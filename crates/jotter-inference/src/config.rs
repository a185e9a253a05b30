//! Environment configuration for text processing.

use std::sync::Arc;
use std::time::Duration;

use tracing::{info, warn};

use jotter_core::{defaults::GEN_TIMEOUT_SECS, Result};

use crate::coalesce::CoalesceConfig;
use crate::openai::OpenAICompatClient;
use crate::orchestrator::TextProcessor;
use crate::provider::{Credential, Provider};

/// Settings read from `DEFAULT_AI_*`, `AI_TIMEOUT_SECS` and `AI_CHUNK_*`.
#[derive(Debug, Clone)]
pub struct InferenceConfig {
    /// Server-wide credential used when a user has none or theirs fails.
    pub default_credential: Option<Credential>,
    pub timeout: Duration,
    pub coalesce: CoalesceConfig,
}

impl Default for InferenceConfig {
    fn default() -> Self {
        Self {
            default_credential: None,
            timeout: Duration::from_secs(GEN_TIMEOUT_SECS),
            coalesce: CoalesceConfig::default(),
        }
    }
}

impl InferenceConfig {
    pub fn from_env() -> Self {
        let timeout = std::env::var("AI_TIMEOUT_SECS")
            .ok()
            .and_then(|v| v.parse::<u64>().ok())
            .map(Duration::from_secs)
            .unwrap_or_else(|| Duration::from_secs(GEN_TIMEOUT_SECS));

        Self {
            default_credential: Self::default_credential_from_env(),
            timeout,
            coalesce: CoalesceConfig::from_env(),
        }
    }

    fn default_credential_from_env() -> Option<Credential> {
        let api_key = std::env::var("DEFAULT_AI_API_KEY")
            .ok()
            .filter(|k| !k.trim().is_empty())?;

        let provider = match std::env::var("DEFAULT_AI_PROVIDER") {
            Ok(name) => name.parse::<Provider>().unwrap_or_else(|_| {
                warn!(
                    subsystem = "inference",
                    component = "config",
                    provider = %name,
                    "Unknown DEFAULT_AI_PROVIDER, using aliyun"
                );
                Provider::default()
            }),
            Err(_) => Provider::default(),
        };

        let model = std::env::var("DEFAULT_AI_MODEL")
            .ok()
            .filter(|m| !m.trim().is_empty())
            .unwrap_or_else(|| provider.default_model().to_string());

        let mut credential = Credential::new(provider, model, api_key);
        if let Ok(base_url) = std::env::var("DEFAULT_AI_BASE_URL") {
            if !base_url.trim().is_empty() {
                credential = credential.with_base_url(base_url);
            }
        }
        Some(credential)
    }

    /// Build the processor backed by the HTTP client.
    pub fn build_processor(&self) -> Result<TextProcessor> {
        let client = OpenAICompatClient::new(self.timeout)?;
        match &self.default_credential {
            Some(credential) => info!(
                subsystem = "inference",
                component = "config",
                provider = %credential.provider,
                model = %credential.model,
                "Default AI credential configured"
            ),
            None => info!(
                subsystem = "inference",
                component = "config",
                "No default AI credential configured"
            ),
        }
        Ok(TextProcessor::new(
            Arc::new(client),
            self.coalesce,
            self.default_credential.clone(),
        ))
    }
}
