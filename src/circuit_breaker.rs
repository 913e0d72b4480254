//! # Circuit Breaker Module
//!
//! Failure-counting breaker for the generative extraction model. After
//! repeated failures the breaker opens and `ExtractorBreaker::is_open`
//! reports it, letting the fallback chain skip a dead model quickly
//! instead of waiting out another timeout. No retries happen here; the
//! breaker only tracks availability.

use std::sync::Mutex;
use std::time::{Duration, Instant};

use log::info;

use crate::recognition_config::BreakerConfig;

/// Circuit breaker for extraction-model calls.
///
/// # State Machine
///
/// - **Closed**: calls pass through
/// - **Open**: failure threshold exceeded, callers fail fast
/// - The breaker closes again once the reset window elapses
#[derive(Debug)]
pub struct ExtractorBreaker {
    failure_count: Mutex<u32>,
    last_failure_time: Mutex<Option<Instant>>,
    config: BreakerConfig,
}

impl ExtractorBreaker {
    pub fn new(config: BreakerConfig) -> Self {
        Self {
            failure_count: Mutex::new(0),
            last_failure_time: Mutex::new(None),
            config,
        }
    }

    /// Whether calls should currently be blocked.
    ///
    /// Opens when the failure count reaches the threshold; automatically
    /// resets to closed after the configured window.
    pub fn is_open(&self) -> bool {
        let failure_count = *self.failure_count.lock().unwrap();
        let last_failure = *self.last_failure_time.lock().unwrap();

        if failure_count >= self.config.failure_threshold {
            if let Some(last_time) = last_failure {
                if last_time.elapsed() < Duration::from_secs(self.config.reset_secs) {
                    return true;
                }
                info!("Extractor breaker reset after {}s window", self.config.reset_secs);
                *self.failure_count.lock().unwrap() = 0;
                *self.last_failure_time.lock().unwrap() = None;
            }
        }
        false
    }

    /// Record a failed model call.
    pub fn record_failure(&self) {
        let mut count = self.failure_count.lock().unwrap();
        *count += 1;
        if *count == self.config.failure_threshold {
            info!(
                "Extractor breaker opened after {} consecutive failures",
                count
            );
        }
        drop(count);
        *self.last_failure_time.lock().unwrap() = Some(Instant::now());
    }

    /// Record a successful model call, closing the breaker.
    pub fn record_success(&self) {
        *self.failure_count.lock().unwrap() = 0;
        *self.last_failure_time.lock().unwrap() = None;
    }
}
