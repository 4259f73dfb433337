//! Retrying extraction with a settle delay and exponential backoff.
//!
//! Very large objects may not read back consistently right after they are
//! written, so inputs at or above the size threshold wait before the first
//! attempt. Each failed attempt multiplies the delay by the backoff factor
//! and sleeps again; small inputs keep a zero delay and retry immediately.

use std::time::Duration;

use tracing::{debug, info, warn};

use crate::config::RetryConfig;
use crate::content::{DocumentExtractor, ExtractedDocument};

/// Blocking sleep used between attempts.
type Sleeper = Box<dyn Fn(Duration) + Send + Sync>;

/// Runs a [`DocumentExtractor`] with a bounded retry budget.
pub struct RetryScheduler {
    config: RetryConfig,
    sleeper: Sleeper,
}

impl std::fmt::Debug for RetryScheduler {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RetryScheduler")
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}

impl RetryScheduler {
    /// Creates a scheduler that sleeps the current thread between attempts.
    pub fn new(config: RetryConfig) -> Self {
        Self::with_sleeper(config, std::thread::sleep)
    }

    /// Creates a scheduler with a custom sleep function.
    pub fn with_sleeper(config: RetryConfig, sleeper: impl Fn(Duration) + Send + Sync + 'static) -> Self {
        Self {
            config,
            sleeper: Box::new(sleeper),
        }
    }

    /// Returns the retry configuration.
    pub fn config(&self) -> &RetryConfig {
        &self.config
    }

    /// Extracts `raw` with up to `max_retries + 1` attempts.
    ///
    /// An attempt fails when the extractor returns an absent or empty
    /// document. The first successful document is returned immediately;
    /// when every attempt fails the result is absent.
    pub fn extract_with_retry(
        &self,
        extractor: &dyn DocumentExtractor,
        raw: &[u8],
        declared_name: &str,
        size_hint: usize,
    ) -> ExtractedDocument {
        let attempts = self.config.max_retries.saturating_add(1);
        let mut delay_ms = if size_hint as u64 >= self.config.size_threshold_bytes {
            self.config.initial_delay_ms
        } else {
            0
        };

        if delay_ms > 0 {
            debug!(
                path = %declared_name,
                bytes = size_hint,
                delay_ms,
                "Large input, waiting before first extraction attempt"
            );
            (self.sleeper)(Duration::from_millis(delay_ms));
        }

        for attempt in 1..=attempts {
            let document = extractor.extract(raw, declared_name);
            if document.has_content() {
                if attempt > 1 {
                    info!(path = %declared_name, attempt, "Extraction succeeded after retry");
                }
                return document;
            }

            debug!(path = %declared_name, attempt, attempts, "Extraction attempt produced no content");

            if attempt < attempts && delay_ms > 0 {
                delay_ms = (delay_ms as f64 * self.config.backoff_factor).round() as u64;
                (self.sleeper)(Duration::from_millis(delay_ms));
            }
        }

        warn!(path = %declared_name, attempts, "Giving up on extraction after all retries");
        ExtractedDocument::absent()
    }
}
