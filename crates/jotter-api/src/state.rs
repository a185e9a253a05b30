//! Shared application state.

use std::num::NonZeroU32;
use std::sync::Arc;

use governor::{Quota, RateLimiter};

use jotter_crypto::TokenSigner;
use jotter_db::Database;
use jotter_inference::TextProcessor;

use crate::config::RateLimitConfig;

/// Global rate limiter type (direct quota, no keyed bucketing).
pub type GlobalRateLimiter = RateLimiter<
    governor::state::NotKeyed,
    governor::state::InMemoryState,
    governor::clock::DefaultClock,
>;

/// Application state shared across handlers.
#[derive(Clone)]
pub struct AppState {
    pub db: Database,
    pub processor: TextProcessor,
    pub tokens: TokenSigner,
    /// Global rate limiter (None if rate limiting is disabled).
    pub rate_limiter: Option<Arc<GlobalRateLimiter>>,
}

impl AppState {
    pub fn new(
        db: Database,
        processor: TextProcessor,
        tokens: TokenSigner,
        rate_limit: RateLimitConfig,
    ) -> Self {
        Self {
            db,
            processor,
            tokens,
            rate_limiter: build_rate_limiter(rate_limit),
        }
    }
}

/// `None` when disabled or when the settings cannot form a quota.
pub fn build_rate_limiter(config: RateLimitConfig) -> Option<Arc<GlobalRateLimiter>> {
    if !config.enabled {
        return None;
    }
    let burst = NonZeroU32::new(u32::try_from(config.requests).unwrap_or(u32::MAX))?;
    let quota = Quota::with_period(config.period)?.allow_burst(burst);
    Some(Arc::new(RateLimiter::direct(quota)))
}
