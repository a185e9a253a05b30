//! # jotter-core
//!
//! Core types, traits, and abstractions for jotter.
//!
//! This crate provides the data structures and repository traits that the
//! other jotter crates depend on.
//!
//! ## Logging
//!
//! Crates log through `tracing` with the structured keys `subsystem`,
//! `component` and `op`, plus `duration_ms` for timed operations.
//!
//! | Level | Usage |
//! |-------|-------|
//! | ERROR | Degraded service, requires operator attention |
//! | WARN  | Recoverable issue, automatic fallback applied |
//! | INFO  | Lifecycle events (startup, shutdown), operation completions |
//! | DEBUG | Decision points, intermediate values, config choices |
//! | TRACE | Per-item iteration, high-volume data (stream records, chunks) |

pub mod defaults;
pub mod error;
pub mod models;
pub mod traits;
pub mod uuid_utils;

// Re-export commonly used types at crate root
pub use error::{Error, Result};
pub use models::*;
pub use traits::*;
pub use uuid_utils::{is_v7, new_v7};
