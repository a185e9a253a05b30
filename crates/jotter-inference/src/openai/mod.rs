//! OpenAI-compatible chat completions.
//!
//! Works with any endpoint that speaks the OpenAI streaming protocol,
//! including OpenAI itself and Alibaba DashScope in compatible mode.

mod client;
mod error;
mod types;

pub use client::{ByteStream, CompletionBackend, OpenAICompatClient};
pub use error::error_from_response;
pub use types::*;
