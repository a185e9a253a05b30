//! AI text processing over server-sent events.
//!
//! The handler validates the request, resolves the caller's credential and
//! hands off to a relay task. The relay drives the completion stream,
//! forwards events to the client over a bounded channel and writes the audit
//! record once the stream ends.

use std::convert::Infallible;
use std::time::{Duration, Instant};

use axum::{
    extract::State,
    response::sse::{Event, KeepAlive, Sse},
    Json,
};
use futures::{Stream, StreamExt};
use serde::Deserialize;
use serde_json::json;
use tokio::sync::mpsc;
use tokio_stream::wrappers::ReceiverStream;
use uuid::Uuid;

use jotter_core::{
    defaults::{AI_TEXT_MAX_CHARS, SSE_CHANNEL_CAPACITY},
    AiLogLevel, AiLogRepository, AiLogRequest, AiLogResponse, CreateAiLogRequest, ProviderKey,
    ProviderKeyRepository,
};
use jotter_inference::{Credential, EventStream, Intent, Provider, StreamEvent};

use crate::{ApiError, AppState, RequireUser};

#[derive(Debug, Deserialize)]
pub struct ProcessRequest {
    pub text: String,
    #[serde(default)]
    pub intent: Intent,
}

/// How a relayed stream ended.
#[derive(Debug, PartialEq, Eq)]
pub enum RelayOutcome {
    Completed { full_text: String },
    Failed { message: String, partial_text: String },
    /// The client went away; nothing more is sent.
    Disconnected { partial_text: String },
}

impl RelayOutcome {
    pub fn as_str(&self) -> &'static str {
        match self {
            RelayOutcome::Completed { .. } => "completed",
            RelayOutcome::Failed { .. } => "failed",
            RelayOutcome::Disconnected { .. } => "disconnected",
        }
    }
}

fn sse_event(name: &str, payload: serde_json::Value) -> Event {
    Event::default().event(name).data(payload.to_string())
}

/// Credential for a stored key, or `None` if the key could not be unsealed
/// or its provider is not supported. Either way the default credential
/// takes over.
pub fn credential_from_key(key: &ProviderKey) -> Option<Credential> {
    if !key.readable {
        tracing::warn!(
            subsystem = "api",
            component = "ai_relay",
            key_id = %key.id,
            "Ignoring stored key that cannot be unsealed"
        );
        return None;
    }
    match key.provider.parse::<Provider>() {
        Ok(provider) => Some(Credential::new(provider, &key.model, &key.api_key)),
        Err(e) => {
            tracing::warn!(
                subsystem = "api",
                component = "ai_relay",
                key_id = %key.id,
                error = %e,
                "Ignoring stored key with unsupported provider"
            );
            None
        }
    }
}

/// Process text with the caller's credential (falling back to the server
/// default) and stream the result.
///
/// Emits `chunk` events `{"text": ...}` followed by exactly one `complete`
/// `{"duration_ms": ...}` or `error` `{"message": ...}`.
pub async fn process_text(
    State(state): State<AppState>,
    RequireUser(user): RequireUser,
    Json(body): Json<ProcessRequest>,
) -> Result<Sse<impl Stream<Item = Result<Event, Infallible>>>, ApiError> {
    if body.text.trim().is_empty() {
        return Err(ApiError::BadRequest("text must not be empty".to_string()));
    }
    if body.text.chars().count() > AI_TEXT_MAX_CHARS {
        return Err(ApiError::BadRequest(format!(
            "text must be at most {} characters",
            AI_TEXT_MAX_CHARS
        )));
    }

    let primary = state
        .db
        .provider_keys
        .primary(user.id)
        .await?
        .as_ref()
        .and_then(credential_from_key);

    let (tx, rx) = mpsc::channel(SSE_CHANNEL_CAPACITY);
    tokio::spawn(run_relay(state, user.id, body, primary, tx));

    let stream = ReceiverStream::new(rx).map(Ok::<_, Infallible>);
    Ok(Sse::new(stream).keep_alive(
        KeepAlive::new()
            .interval(Duration::from_secs(15))
            .text("keepalive"),
    ))
}

async fn run_relay(
    state: AppState,
    user_id: Uuid,
    body: ProcessRequest,
    primary: Option<Credential>,
    tx: mpsc::Sender<Event>,
) {
    let start = Instant::now();
    let attempted = primary
        .clone()
        .or_else(|| state.processor.default_credential().cloned());

    let (credential, outcome) = match state.processor.process(&body.text, body.intent, primary).await {
        Ok(stream) => {
            let credential = Some(stream.credential.clone());
            (credential, relay_events(stream.events, &tx).await)
        }
        Err(e) => (
            attempted,
            RelayOutcome::Failed {
                message: e.to_string(),
                partial_text: String::new(),
            },
        ),
    };
    let duration_ms = start.elapsed().as_millis() as u64;

    match &outcome {
        RelayOutcome::Completed { .. } => {
            let _ = tx
                .send(sse_event("complete", json!({ "duration_ms": duration_ms })))
                .await;
        }
        RelayOutcome::Failed { message, .. } => {
            let _ = tx.send(sse_event("error", json!({ "message": message }))).await;
        }
        RelayOutcome::Disconnected { .. } => {}
    }

    tracing::info!(
        subsystem = "api",
        component = "ai_relay",
        op = "process",
        user_id = %user_id,
        intent = %body.intent,
        provider = credential.as_ref().map(|c| c.provider.as_str()).unwrap_or("none"),
        duration_ms,
        result = outcome.as_str(),
        "AI processing finished"
    );

    let record = audit_record(&body, credential.as_ref(), &outcome, duration_ms);
    if let Err(e) = state.db.ai_logs.create(user_id, record).await {
        tracing::warn!(
            subsystem = "api",
            component = "ai_relay",
            user_id = %user_id,
            error = %e,
            "Failed to write AI audit record"
        );
    }
}

/// Forward chunks to the client until the stream reaches a terminal event.
pub async fn relay_events(mut events: EventStream, tx: &mpsc::Sender<Event>) -> RelayOutcome {
    let mut sent = String::new();
    while let Some(event) = events.next().await {
        match event {
            StreamEvent::Chunk(text) => {
                let chunk = sse_event("chunk", json!({ "text": &text }));
                if tx.send(chunk).await.is_err() {
                    return RelayOutcome::Disconnected { partial_text: sent };
                }
                sent.push_str(&text);
            }
            StreamEvent::Completed { full_text } => return RelayOutcome::Completed { full_text },
            StreamEvent::Failed {
                error,
                partial_text,
            } => {
                return RelayOutcome::Failed {
                    message: error.to_string(),
                    partial_text,
                }
            }
        }
    }
    RelayOutcome::Completed { full_text: sent }
}

/// Audit record for one processed request.
pub fn audit_record(
    body: &ProcessRequest,
    credential: Option<&Credential>,
    outcome: &RelayOutcome,
    duration_ms: u64,
) -> CreateAiLogRequest {
    let request = AiLogRequest {
        text: body.text.clone(),
        model: credential.map(|c| c.model.clone()).unwrap_or_default(),
        provider: credential
            .map(|c| c.provider.as_str().to_string())
            .unwrap_or_default(),
        intent: Some(body.intent.as_str().to_string()),
    };

    match outcome {
        RelayOutcome::Completed { full_text } => CreateAiLogRequest {
            level: AiLogLevel::Success,
            request: Some(request),
            response: Some(AiLogResponse {
                content: full_text.clone(),
                duration_ms,
            }),
            error: None,
        },
        RelayOutcome::Failed {
            message,
            partial_text,
        } => CreateAiLogRequest {
            level: AiLogLevel::Error,
            request: Some(request),
            response: Some(AiLogResponse {
                content: partial_text.clone(),
                duration_ms,
            }),
            error: Some(message.clone()),
        },
        RelayOutcome::Disconnected { partial_text } => CreateAiLogRequest {
            level: AiLogLevel::Error,
            request: Some(request),
            response: Some(AiLogResponse {
                content: partial_text.clone(),
                duration_ms,
            }),
            error: Some("client disconnected".to_string()),
        },
    }
}

#[cfg(test)]
mod tests {
    use chrono::Utc;
    use jotter_core::Error;

    use super::*;

    fn events(chunks: &[&str], fail: Option<&str>) -> EventStream {
        let mut items: Vec<StreamEvent> =
            chunks.iter().map(|c| StreamEvent::Chunk(c.to_string())).collect();
        let text = chunks.concat();
        items.push(match fail {
            Some(message) => StreamEvent::Failed {
                error: Error::Inference(message.to_string()),
                partial_text: text,
            },
            None => StreamEvent::Completed { full_text: text },
        });
        Box::pin(futures::stream::iter(items))
    }

    fn body() -> ProcessRequest {
        ProcessRequest {
            text: "draft".to_string(),
            intent: Intent::Summarize,
        }
    }

    #[tokio::test]
    async fn test_relay_forwards_chunks_then_completes() {
        let (tx, mut rx) = mpsc::channel(8);
        let outcome = relay_events(events(&["Hel", "lo"], None), &tx).await;
        assert_eq!(
            outcome,
            RelayOutcome::Completed {
                full_text: "Hello".to_string()
            }
        );
        drop(tx);

        let mut forwarded = 0;
        while rx.recv().await.is_some() {
            forwarded += 1;
        }
        assert_eq!(forwarded, 2);
    }

    #[tokio::test]
    async fn test_relay_reports_failure_with_partial_text() {
        let (tx, _rx) = mpsc::channel(8);
        let outcome = relay_events(events(&["par"], Some("connection reset")), &tx).await;
        match outcome {
            RelayOutcome::Failed {
                message,
                partial_text,
            } => {
                assert!(message.contains("connection reset"));
                assert_eq!(partial_text, "par");
            }
            other => panic!("unexpected {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_relay_stops_when_client_disconnects() {
        let (tx, rx) = mpsc::channel(8);
        drop(rx);
        let outcome = relay_events(events(&["a", "b"], None), &tx).await;
        assert_eq!(
            outcome,
            RelayOutcome::Disconnected {
                partial_text: String::new()
            }
        );
    }

    #[test]
    fn test_audit_record_success() {
        let credential = Credential::new(Provider::Aliyun, "qwen-turbo", "sk-x");
        let record = audit_record(
            &body(),
            Some(&credential),
            &RelayOutcome::Completed {
                full_text: "short".to_string(),
            },
            42,
        );
        assert_eq!(record.level, AiLogLevel::Success);
        let request = record.request.unwrap();
        assert_eq!(request.provider, "aliyun");
        assert_eq!(request.model, "qwen-turbo");
        assert_eq!(request.intent.as_deref(), Some("summarize"));
        assert_eq!(
            record.response,
            Some(AiLogResponse {
                content: "short".to_string(),
                duration_ms: 42
            })
        );
        assert!(record.error.is_none());
    }

    #[test]
    fn test_audit_record_failure_without_credential() {
        let record = audit_record(
            &body(),
            None,
            &RelayOutcome::Failed {
                message: "No AI credentials configured".to_string(),
                partial_text: String::new(),
            },
            3,
        );
        assert_eq!(record.level, AiLogLevel::Error);
        assert_eq!(record.error.as_deref(), Some("No AI credentials configured"));
        assert_eq!(record.request.unwrap().provider, "");
    }

    #[test]
    fn test_credential_from_key() {
        let now = Utc::now();
        let mut key = ProviderKey {
            id: Uuid::nil(),
            provider: "openai".to_string(),
            model: "gpt-4o-mini".to_string(),
            api_key: "sk-live".to_string(),
            readable: true,
            created_at: now,
            updated_at: now,
        };
        let credential = credential_from_key(&key).unwrap();
        assert_eq!(credential.provider, Provider::OpenAi);
        assert_eq!(credential.model, "gpt-4o-mini");

        key.provider = "unknown".to_string();
        assert!(credential_from_key(&key).is_none());
    }

    #[test]
    fn test_unreadable_key_yields_no_credential() {
        let now = Utc::now();
        let key = ProviderKey {
            id: Uuid::nil(),
            provider: "openai".to_string(),
            model: "gpt-4o-mini".to_string(),
            api_key: String::new(),
            readable: false,
            created_at: now,
            updated_at: now,
        };
        assert!(credential_from_key(&key).is_none());
    }

    #[test]
    fn test_process_request_default_intent() {
        let req: ProcessRequest = serde_json::from_str(r#"{"text":"hi"}"#).unwrap();
        assert_eq!(req.intent, Intent::Rewrite);
    }
}
