//! Size and time based coalescing of stream deltas.

use std::time::Duration;

use tokio::time::Instant;

use jotter_core::defaults::{COALESCE_INTERVAL_MS, COALESCE_SIZE_THRESHOLD};

/// Thresholds at which pending deltas are released as one chunk.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CoalesceConfig {
    /// Release once this many characters are pending.
    pub size_threshold: usize,
    /// Release once this long has passed since the previous release.
    pub interval: Duration,
}

impl Default for CoalesceConfig {
    fn default() -> Self {
        Self {
            size_threshold: COALESCE_SIZE_THRESHOLD,
            interval: Duration::from_millis(COALESCE_INTERVAL_MS),
        }
    }
}

impl CoalesceConfig {
    /// Read `AI_CHUNK_SIZE` and `AI_CHUNK_INTERVAL_MS`, falling back to the
    /// defaults for missing or unparsable values.
    pub fn from_env() -> Self {
        let defaults = Self::default();
        let size_threshold = std::env::var("AI_CHUNK_SIZE")
            .ok()
            .and_then(|v| v.parse::<usize>().ok())
            .filter(|v| *v > 0)
            .unwrap_or(defaults.size_threshold);
        let interval = std::env::var("AI_CHUNK_INTERVAL_MS")
            .ok()
            .and_then(|v| v.parse::<u64>().ok())
            .map(Duration::from_millis)
            .unwrap_or(defaults.interval);
        Self {
            size_threshold,
            interval,
        }
    }

    /// Release every delta as soon as it arrives.
    pub fn immediate() -> Self {
        Self {
            size_threshold: 1,
            interval: Duration::ZERO,
        }
    }
}

/// Accumulates deltas and decides when to release them.
///
/// Also keeps the full text seen so far, which is what a completed or failed
/// stream reports.
#[derive(Debug)]
pub struct ChunkCoalescer {
    config: CoalesceConfig,
    pending: String,
    pending_chars: usize,
    full_text: String,
    last_emit: Instant,
}

impl ChunkCoalescer {
    pub fn new(config: CoalesceConfig) -> Self {
        Self {
            config,
            pending: String::new(),
            pending_chars: 0,
            full_text: String::new(),
            last_emit: Instant::now(),
        }
    }

    pub fn push(&mut self, delta: &str) {
        self.pending.push_str(delta);
        self.pending_chars += delta.chars().count();
        self.full_text.push_str(delta);
    }

    /// Release the pending text if either threshold has been reached.
    pub fn poll(&mut self, now: Instant) -> Option<String> {
        if self.pending.is_empty() {
            return None;
        }
        let size_reached = self.pending_chars >= self.config.size_threshold;
        let time_reached = now.saturating_duration_since(self.last_emit) >= self.config.interval;
        if !(size_reached || time_reached) {
            return None;
        }
        self.last_emit = now;
        self.take()
    }

    /// Release whatever is pending regardless of thresholds.
    pub fn flush(&mut self) -> Option<String> {
        self.take()
    }

    pub fn full_text(&self) -> &str {
        &self.full_text
    }

    pub fn into_full_text(self) -> String {
        self.full_text
    }

    fn take(&mut self) -> Option<String> {
        if self.pending.is_empty() {
            return None;
        }
        self.pending_chars = 0;
        Some(std::mem::take(&mut self.pending))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn size_only(threshold: usize) -> CoalesceConfig {
        CoalesceConfig {
            size_threshold: threshold,
            interval: Duration::from_secs(3600),
        }
    }

    #[test]
    fn test_defaults() {
        let config = CoalesceConfig::default();
        assert_eq!(config.size_threshold, 100);
        assert_eq!(config.interval, Duration::from_millis(50));
    }

    #[tokio::test(start_paused = true)]
    async fn test_holds_until_size_threshold() {
        let mut c = ChunkCoalescer::new(size_only(5));
        c.push("ab");
        assert!(c.poll(Instant::now()).is_none());
        c.push("cde");
        assert_eq!(c.poll(Instant::now()).as_deref(), Some("abcde"));
        assert!(c.poll(Instant::now()).is_none());
    }

    #[tokio::test(start_paused = true)]
    async fn test_size_counts_characters_not_bytes() {
        let mut c = ChunkCoalescer::new(size_only(3));
        c.push("你好");
        assert!(c.poll(Instant::now()).is_none());
        c.push("吗");
        assert_eq!(c.poll(Instant::now()).as_deref(), Some("你好吗"));
    }

    #[tokio::test(start_paused = true)]
    async fn test_releases_after_interval() {
        let mut c = ChunkCoalescer::new(CoalesceConfig {
            size_threshold: 1000,
            interval: Duration::from_millis(50),
        });
        c.push("a");
        assert!(c.poll(Instant::now()).is_none());
        tokio::time::advance(Duration::from_millis(50)).await;
        assert_eq!(c.poll(Instant::now()).as_deref(), Some("a"));

        c.push("b");
        assert!(c.poll(Instant::now()).is_none());
    }

    #[tokio::test(start_paused = true)]
    async fn test_flush_and_full_text() {
        let mut c = ChunkCoalescer::new(size_only(100));
        c.push("Hel");
        c.push("lo");
        assert_eq!(c.flush().as_deref(), Some("Hello"));
        assert!(c.flush().is_none());
        assert_eq!(c.full_text(), "Hello");
    }
}
