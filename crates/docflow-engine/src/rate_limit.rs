//! Sliding-window token rate limiting with exponential backoff
//!
//! All token admission goes through one mutex-guarded window, making the
//! limiter the single serialization point of the pipeline. The window
//! tracks actual spend; admission checks spend-plus-estimate against an
//! effective limit kept below the provider's hard quota by a safety
//! fraction.

use crate::config::EngineConfig;
use crate::error::EngineError;
use serde::Serialize;
use std::collections::VecDeque;
use std::time::Duration;
use tokio::sync::Mutex;
use tokio::time::Instant;

struct TokenUsageEntry {
    tokens: usize,
    at: Instant,
}

struct WindowState {
    entries: VecDeque<TokenUsageEntry>,
    backoff_attempts: u32,
}

/// Point-in-time snapshot of the limiter, surfaced by the status query
#[derive(Debug, Clone, Serialize)]
pub struct RateLimitStats {
    /// Tokens spent inside the current window
    pub current_usage: usize,

    /// Provider's hard quota per window
    pub hard_limit: usize,

    /// Budget actually spent against (hard quota times safety fraction)
    pub effective_limit: usize,

    /// Current usage as a percentage of the effective limit
    pub percentage_used: f64,

    /// Seconds until the oldest window entry expires (0 when idle)
    pub seconds_until_reset: u64,
}

/// Token-bucket-over-sliding-window rate limiter
pub struct RateLimitManager {
    state: Mutex<WindowState>,
    window: Duration,
    hard_limit: usize,
    effective_limit: usize,
    max_backoff_attempts: u32,
}

impl RateLimitManager {
    /// Create a limiter from engine configuration
    pub fn new(config: &EngineConfig) -> Self {
        Self {
            state: Mutex::new(WindowState {
                entries: VecDeque::new(),
                backoff_attempts: 0,
            }),
            window: config.window(),
            hard_limit: config.tokens_per_minute,
            effective_limit: config.effective_limit(),
            max_backoff_attempts: config.max_backoff_attempts,
        }
    }

    /// Record actual token spend at the current instant
    pub async fn track_usage(&self, tokens: usize) {
        let mut state = self.state.lock().await;
        prune(&mut state.entries, self.window);
        state.entries.push_back(TokenUsageEntry {
            tokens,
            at: Instant::now(),
        });
    }

    /// Tokens spent inside the current window
    pub async fn current_usage(&self) -> usize {
        let mut state = self.state.lock().await;
        prune(&mut state.entries, self.window);
        state.entries.iter().map(|e| e.tokens).sum()
    }

    /// Block until the estimated spend fits the effective limit
    ///
    /// Never refuses: sleeps until enough window entries expire and
    /// re-checks. An empty window always admits, even when the estimate
    /// alone exceeds the limit, so oversized single chunks cannot stall
    /// forever. Returns the total time waited.
    pub async fn can_proceed(&self, estimated: usize) -> Duration {
        let started = Instant::now();

        loop {
            let wait = {
                let mut state = self.state.lock().await;
                prune(&mut state.entries, self.window);
                let usage: usize = state.entries.iter().map(|e| e.tokens).sum();

                if usage + estimated <= self.effective_limit || state.entries.is_empty() {
                    return started.elapsed();
                }

                // Sleep until the oldest entry leaves the window
                let oldest = state.entries.front().map(|e| e.at).unwrap_or(started);
                (oldest + self.window).saturating_duration_since(Instant::now())
            };

            tracing::debug!(
                "Rate limit window full, waiting {:?} for {} estimated tokens",
                wait,
                estimated
            );
            tokio::time::sleep(wait.max(Duration::from_millis(10))).await;
        }
    }

    /// React to a provider rate-limit error with exponential backoff
    ///
    /// Sleeps 1, 2, 4, 8, 16 seconds across successive attempts; one
    /// attempt past the maximum fails instead of sleeping.
    pub async fn handle_rate_limit_error(&self) -> Result<Duration, EngineError> {
        let attempt = {
            let mut state = self.state.lock().await;
            state.backoff_attempts += 1;
            state.backoff_attempts
        };

        if attempt > self.max_backoff_attempts {
            tracing::error!(
                "Provider still rate limiting after {} attempts, giving up",
                self.max_backoff_attempts
            );
            return Err(EngineError::RateLimitExceeded);
        }

        let delay = Duration::from_secs(1u64 << (attempt - 1));
        tracing::warn!(
            "Provider rate limited, backing off {:?} (attempt {}/{})",
            delay,
            attempt,
            self.max_backoff_attempts
        );
        tokio::time::sleep(delay).await;
        Ok(delay)
    }

    /// Reset the backoff counter after a successful provider call
    pub async fn reset_backoff(&self) {
        self.state.lock().await.backoff_attempts = 0;
    }

    /// Snapshot limiter state for the status query
    pub async fn stats(&self) -> RateLimitStats {
        let mut state = self.state.lock().await;
        prune(&mut state.entries, self.window);

        let current_usage: usize = state.entries.iter().map(|e| e.tokens).sum();
        let seconds_until_reset = state
            .entries
            .front()
            .map(|e| {
                (e.at + self.window)
                    .saturating_duration_since(Instant::now())
                    .as_secs()
            })
            .unwrap_or(0);

        RateLimitStats {
            current_usage,
            hard_limit: self.hard_limit,
            effective_limit: self.effective_limit,
            percentage_used: if self.effective_limit > 0 {
                current_usage as f64 / self.effective_limit as f64 * 100.0
            } else {
                0.0
            },
            seconds_until_reset,
        }
    }
}

fn prune(entries: &mut VecDeque<TokenUsageEntry>, window: Duration) {
    let now = Instant::now();
    while let Some(front) = entries.front() {
        if now.duration_since(front.at) > window {
            entries.pop_front();
        } else {
            break;
        }
    }
}
