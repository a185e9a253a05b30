//! Completion providers and the credentials used to call them.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use jotter_core::{mask_secret, Error};

/// OpenAI public API.
pub const OPENAI_BASE_URL: &str = "https://api.openai.com/v1";

/// Alibaba Cloud DashScope, OpenAI-compatible mode.
pub const ALIYUN_BASE_URL: &str = "https://dashscope.aliyuncs.com/compatible-mode/v1";

pub const OPENAI_DEFAULT_MODEL: &str = "gpt-3.5-turbo";

pub const ALIYUN_DEFAULT_MODEL: &str = "qwen-turbo";

/// Endpoint appended to a provider base URL.
pub const CHAT_COMPLETIONS_PATH: &str = "/chat/completions";

/// A supported OpenAI-compatible completion provider.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Provider {
    OpenAi,
    #[default]
    Aliyun,
}

impl Provider {
    pub fn as_str(&self) -> &'static str {
        match self {
            Provider::OpenAi => "openai",
            Provider::Aliyun => "aliyun",
        }
    }

    pub fn default_base_url(&self) -> &'static str {
        match self {
            Provider::OpenAi => OPENAI_BASE_URL,
            Provider::Aliyun => ALIYUN_BASE_URL,
        }
    }

    pub fn default_model(&self) -> &'static str {
        match self {
            Provider::OpenAi => OPENAI_DEFAULT_MODEL,
            Provider::Aliyun => ALIYUN_DEFAULT_MODEL,
        }
    }
}

impl fmt::Display for Provider {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Provider {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "openai" => Ok(Provider::OpenAi),
            "aliyun" | "dashscope" => Ok(Provider::Aliyun),
            other => Err(Error::InvalidInput(format!("unsupported provider: {other}"))),
        }
    }
}

/// Everything needed to authenticate one completion request.
#[derive(Clone, PartialEq, Eq)]
pub struct Credential {
    pub provider: Provider,
    pub model: String,
    pub api_key: String,
    pub base_url: String,
}

impl Credential {
    /// Credential against the provider's public endpoint.
    pub fn new(provider: Provider, model: impl Into<String>, api_key: impl Into<String>) -> Self {
        Self {
            provider,
            model: model.into(),
            api_key: api_key.into(),
            base_url: provider.default_base_url().to_string(),
        }
    }

    /// Override the endpoint (self-hosted gateways, tests).
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }

    /// Full chat-completions URL.
    pub fn endpoint(&self) -> String {
        format!(
            "{}{}",
            self.base_url.trim_end_matches('/'),
            CHAT_COMPLETIONS_PATH
        )
    }
}

impl fmt::Debug for Credential {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credential")
            .field("provider", &self.provider)
            .field("model", &self.model)
            .field("api_key", &mask_secret(&self.api_key))
            .field("base_url", &self.base_url)
            .finish()
    }
}
