//! Centralized default constants for jotter.
//!
//! Crates reference these constants instead of defining their own magic
//! numbers. Organized by domain area.

// =============================================================================
// SERVER
// =============================================================================

/// Default HTTP server port.
pub const SERVER_PORT: u16 = 3001;

/// Default rate limit: max requests per period.
pub const RATE_LIMIT_REQUESTS: u64 = 100;

/// Default rate limit: period in seconds.
pub const RATE_LIMIT_PERIOD_SECS: u64 = 60;

/// Default CORS max-age in seconds (1 hour).
pub const CORS_MAX_AGE_SECS: u64 = 3600;

/// Maximum request body size in bytes (1 MB).
pub const MAX_BODY_SIZE_BYTES: usize = 1024 * 1024;

/// Capacity of the channel between the AI relay task and the SSE response.
pub const SSE_CHANNEL_CAPACITY: usize = 32;

// =============================================================================
// AUTH
// =============================================================================

/// Bearer token lifetime in seconds (7 days).
pub const JWT_EXPIRES_IN_SECS: i64 = 7 * 24 * 60 * 60;

/// Minimum accepted length of the server secrets (`JWT_SECRET`, `ENCRYPTION_KEY`).
pub const MIN_SECRET_LEN: usize = 32;

/// Minimum password length on registration.
pub const PASSWORD_MIN_LEN: usize = 6;

// =============================================================================
// NAMES
// =============================================================================

/// Maximum length of a tag or category name in characters.
pub const NAME_MAX_LEN: usize = 50;

/// Maximum length of a note title in characters.
pub const TITLE_MAX_LEN: usize = 200;

// =============================================================================
// INFERENCE
// =============================================================================

/// Coalescing size threshold in characters.
pub const COALESCE_SIZE_THRESHOLD: usize = 100;

/// Coalescing time threshold in milliseconds.
pub const COALESCE_INTERVAL_MS: u64 = 50;

/// Timeout for a whole completion request in seconds.
pub const GEN_TIMEOUT_SECS: u64 = 120;

/// Characters of a non-JSON error body kept in the error message.
pub const ERROR_BODY_PREVIEW_CHARS: usize = 100;

/// Maximum length of text accepted for AI processing, in characters.
pub const AI_TEXT_MAX_CHARS: usize = 20_000;
