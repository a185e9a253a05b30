//! # jotter-inference
//!
//! Streaming text processing for jotter.
//!
//! This crate provides:
//! - An OpenAI-compatible streaming chat-completions client
//! - A sans-IO SSE record decoder with size and time based coalescing
//! - [`TextProcessor`], which picks a credential, opens the stream and
//!   falls back once to a server default credential
//!
//! ## Example
//!
//! ```ignore
//! use jotter_inference::{InferenceConfig, Intent, StreamEvent};
//! use futures::StreamExt;
//!
//! let processor = InferenceConfig::from_env().build_processor()?;
//! let mut stream = processor.process("some notes", Intent::Summarize, None).await?;
//! while let Some(event) = stream.events.next().await {
//!     if let StreamEvent::Chunk(text) = event {
//!         print!("{text}");
//!     }
//! }
//! ```

pub mod coalesce;
pub mod config;
pub mod decoder;
pub mod intent;
pub mod openai;
pub mod orchestrator;
pub mod provider;
pub mod stream;

pub use coalesce::{ChunkCoalescer, CoalesceConfig};
pub use config::InferenceConfig;
pub use decoder::{LineDecoder, DONE_SENTINEL};
pub use intent::Intent;
pub use openai::{ByteStream, CompletionBackend, OpenAICompatClient};
pub use orchestrator::{CredentialSource, ProcessStream, TextProcessor};
pub use provider::{Credential, Provider};
pub use stream::{decode_stream, EventStream, StreamEvent};
