//! Credential selection and the one-shot default-credential fallback.

use std::fmt;
use std::sync::Arc;
use std::time::Instant;

use tracing::{debug, info, warn};

use jotter_core::{Error, Result};

use crate::coalesce::CoalesceConfig;
use crate::intent::Intent;
use crate::openai::{ChatCompletionRequest, CompletionBackend};
use crate::provider::Credential;
use crate::stream::{decode_stream, EventStream};

/// Which credential served a request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CredentialSource {
    User,
    Default,
}

impl CredentialSource {
    pub fn as_str(&self) -> &'static str {
        match self {
            CredentialSource::User => "user",
            CredentialSource::Default => "default",
        }
    }
}

impl fmt::Display for CredentialSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// An established completion stream and the credential it runs on.
pub struct ProcessStream {
    pub credential: Credential,
    pub source: CredentialSource,
    pub events: EventStream,
}

impl fmt::Debug for ProcessStream {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ProcessStream")
            .field("credential", &self.credential)
            .field("source", &self.source)
            .finish_non_exhaustive()
    }
}

/// Runs text through a completion provider.
///
/// The user's credential is tried first. If that attempt fails before a
/// stream is established and a server default is configured, the default
/// is tried exactly once.
#[derive(Clone)]
pub struct TextProcessor {
    backend: Arc<dyn CompletionBackend>,
    coalesce: CoalesceConfig,
    default_credential: Option<Credential>,
}

impl TextProcessor {
    pub fn new(
        backend: Arc<dyn CompletionBackend>,
        coalesce: CoalesceConfig,
        default_credential: Option<Credential>,
    ) -> Self {
        Self {
            backend,
            coalesce,
            default_credential,
        }
    }

    pub fn default_credential(&self) -> Option<&Credential> {
        self.default_credential.as_ref()
    }

    /// Start processing `text`. Returns once a stream is established.
    pub async fn process(
        &self,
        text: &str,
        intent: Intent,
        primary: Option<Credential>,
    ) -> Result<ProcessStream> {
        if text.trim().is_empty() {
            return Err(Error::InvalidInput("text must not be empty".to_string()));
        }

        let (first, first_source) = match (primary, &self.default_credential) {
            (Some(credential), _) => (credential, CredentialSource::User),
            (None, Some(default)) => (default.clone(), CredentialSource::Default),
            (None, None) => return Err(Error::MissingCredentials),
        };

        let first_error = match self.attempt(&first, first_source, text, intent).await {
            Ok(stream) => return Ok(stream),
            Err(e) => e,
        };

        let fallback = match (first_source, &self.default_credential) {
            (CredentialSource::User, Some(default)) if first_error.is_connect_failure() => {
                default.clone()
            }
            _ => return Err(first_error),
        };

        warn!(
            subsystem = "inference",
            component = "orchestrator",
            op = "process",
            error = %first_error,
            "User credential failed, retrying with default credential"
        );

        self.attempt(&fallback, CredentialSource::Default, text, intent)
            .await
            .map_err(|e| {
                Error::Inference(format!(
                    "AI processing failed: both user and default credentials failed ({})",
                    e
                ))
            })
    }

    async fn attempt(
        &self,
        credential: &Credential,
        source: CredentialSource,
        text: &str,
        intent: Intent,
    ) -> Result<ProcessStream> {
        let start = Instant::now();
        let request =
            ChatCompletionRequest::streaming(&credential.model, intent.system_prompt(), text);

        debug!(
            subsystem = "inference",
            component = "orchestrator",
            op = "attempt",
            provider = %credential.provider,
            model = %credential.model,
            intent = %intent,
            credential = %source,
            prompt_len = text.len(),
            "Opening completion stream"
        );

        match self.backend.open_stream(credential, &request).await {
            Ok(body) => {
                info!(
                    subsystem = "inference",
                    component = "orchestrator",
                    op = "attempt",
                    provider = %credential.provider,
                    model = %credential.model,
                    credential = %source,
                    duration_ms = start.elapsed().as_millis() as u64,
                    "Completion stream established"
                );
                Ok(ProcessStream {
                    credential: credential.clone(),
                    source,
                    events: decode_stream(body, self.coalesce),
                })
            }
            Err(e) => {
                warn!(
                    subsystem = "inference",
                    component = "orchestrator",
                    op = "attempt",
                    provider = %credential.provider,
                    model = %credential.model,
                    credential = %source,
                    error = %e,
                    duration_ms = start.elapsed().as_millis() as u64,
                    "Completion attempt failed"
                );
                Err(e)
            }
        }
    }
}

impl fmt::Debug for TextProcessor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TextProcessor")
            .field("coalesce", &self.coalesce)
            .field("default_credential", &self.default_credential)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Mutex;

    use async_trait::async_trait;
    use bytes::Bytes;
    use futures::StreamExt;

    use super::*;
    use crate::openai::ByteStream;
    use crate::provider::Provider;
    use crate::stream::StreamEvent;

    /// Backend that fails for listed API keys and streams "ok" otherwise.
    struct ScriptedBackend {
        failing_keys: Vec<&'static str>,
        calls: AtomicUsize,
        seen_keys: Mutex<Vec<String>>,
    }

    impl ScriptedBackend {
        fn new(failing_keys: Vec<&'static str>) -> Arc<Self> {
            Arc::new(Self {
                failing_keys,
                calls: AtomicUsize::new(0),
                seen_keys: Mutex::new(Vec::new()),
            })
        }
    }

    #[async_trait]
    impl CompletionBackend for ScriptedBackend {
        async fn open_stream(
            &self,
            credential: &Credential,
            _request: &ChatCompletionRequest,
        ) -> Result<ByteStream> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            self.seen_keys.lock().unwrap().push(credential.api_key.clone());
            if self.failing_keys.contains(&credential.api_key.as_str()) {
                return Err(Error::Provider {
                    status: 401,
                    message: format!("bad key {}", credential.api_key),
                });
            }
            let body = "data: {\"choices\":[{\"delta\":{\"content\":\"ok\"}}]}\n\ndata: [DONE]\n\n";
            Ok(Box::pin(futures::stream::iter(vec![Ok::<_, Error>(Bytes::from(body))])))
        }
    }

    fn cred(key: &str) -> Credential {
        Credential::new(Provider::Aliyun, "qwen-turbo", key)
    }

    fn processor(backend: Arc<ScriptedBackend>, default: Option<Credential>) -> TextProcessor {
        TextProcessor::new(backend, CoalesceConfig::default(), default)
    }

    #[tokio::test]
    async fn test_missing_credentials_makes_no_call() {
        let backend = ScriptedBackend::new(vec![]);
        let err = processor(backend.clone(), None)
            .process("hi", Intent::Rewrite, None)
            .await
            .unwrap_err();
        assert!(matches!(err, Error::MissingCredentials));
        assert_eq!(backend.calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_empty_text_is_rejected() {
        let backend = ScriptedBackend::new(vec![]);
        let err = processor(backend.clone(), Some(cred("default")))
            .process("   ", Intent::Rewrite, None)
            .await
            .unwrap_err();
        assert!(matches!(err, Error::InvalidInput(_)));
        assert_eq!(backend.calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_primary_success_uses_user_credential() {
        let backend = ScriptedBackend::new(vec![]);
        let stream = processor(backend.clone(), Some(cred("default")))
            .process("hi", Intent::Expand, Some(cred("user")))
            .await
            .unwrap();
        assert_eq!(stream.source, CredentialSource::User);
        assert_eq!(backend.calls.load(Ordering::SeqCst), 1);

        let events: Vec<StreamEvent> = stream.events.collect().await;
        assert!(matches!(events.last(), Some(StreamEvent::Completed { full_text }) if full_text == "ok"));
    }

    #[tokio::test]
    async fn test_primary_failure_falls_back_once() {
        let backend = ScriptedBackend::new(vec!["user"]);
        let stream = processor(backend.clone(), Some(cred("default")))
            .process("hi", Intent::Rewrite, Some(cred("user")))
            .await
            .unwrap();
        assert_eq!(stream.source, CredentialSource::Default);
        assert_eq!(
            *backend.seen_keys.lock().unwrap(),
            vec!["user".to_string(), "default".to_string()]
        );
    }

    #[tokio::test]
    async fn test_primary_failure_without_default_surfaces_primary_error() {
        let backend = ScriptedBackend::new(vec!["user"]);
        let err = processor(backend.clone(), None)
            .process("hi", Intent::Rewrite, Some(cred("user")))
            .await
            .unwrap_err();
        assert!(err.to_string().contains("bad key user"));
        assert_eq!(backend.calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_both_failing_reports_last_error() {
        let backend = ScriptedBackend::new(vec!["user", "default"]);
        let err = processor(backend.clone(), Some(cred("default")))
            .process("hi", Intent::Rewrite, Some(cred("user")))
            .await
            .unwrap_err();
        let message = err.to_string();
        assert!(message.contains("both user and default credentials failed"));
        assert!(message.contains("bad key default"));
        assert_eq!(backend.calls.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn test_default_only_is_not_retried() {
        let backend = ScriptedBackend::new(vec!["default"]);
        let err = processor(backend.clone(), Some(cred("default")))
            .process("hi", Intent::Summarize, None)
            .await
            .unwrap_err();
        assert!(matches!(err, Error::Provider { status: 401, .. }));
        assert_eq!(backend.calls.load(Ordering::SeqCst), 1);
    }
}
