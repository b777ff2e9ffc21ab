//! Configuration for rate limiting and retry policy

use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Configuration for the orchestration engine
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EngineConfig {
    /// Hard provider quota, tokens per sliding window
    pub tokens_per_minute: usize,

    /// Fraction of the hard quota the scheduler actually spends
    pub safety_fraction: f64,

    /// Sliding-window length (seconds)
    pub window_secs: u64,

    /// Backoff attempts before a rate-limited chunk becomes fatal
    pub max_backoff_attempts: u32,
}

impl EngineConfig {
    /// Effective token budget after applying the safety fraction
    pub fn effective_limit(&self) -> usize {
        (self.tokens_per_minute as f64 * self.safety_fraction) as usize
    }

    /// Get the sliding window as a Duration
    pub fn window(&self) -> Duration {
        Duration::from_secs(self.window_secs)
    }

    /// Validate the configuration
    pub fn validate(&self) -> Result<(), String> {
        if self.tokens_per_minute == 0 {
            return Err("tokens_per_minute must be greater than 0".to_string());
        }
        if !(0.0..=1.0).contains(&self.safety_fraction) || self.safety_fraction == 0.0 {
            return Err("safety_fraction must be in (0.0, 1.0]".to_string());
        }
        if self.window_secs == 0 {
            return Err("window_secs must be greater than 0".to_string());
        }
        if self.max_backoff_attempts == 0 {
            return Err("max_backoff_attempts must be at least 1".to_string());
        }
        Ok(())
    }

    /// Aggressive preset: small margin for quota-constrained keys
    pub fn aggressive() -> Self {
        Self {
            tokens_per_minute: 50_000,
            safety_fraction: 0.75,
            window_secs: 60,
            max_backoff_attempts: 5,
        }
    }

    /// Lenient preset: generous quota, fewer retries
    pub fn lenient() -> Self {
        Self {
            tokens_per_minute: 400_000,
            safety_fraction: 0.9,
            window_secs: 60,
            max_backoff_attempts: 3,
        }
    }

    /// Load configuration from TOML string
    pub fn from_toml(toml_str: &str) -> Result<Self, String> {
        toml::from_str(toml_str).map_err(|e| format!("Failed to parse TOML: {}", e))
    }

    /// Serialize configuration to TOML string
    pub fn to_toml(&self) -> Result<String, String> {
        toml::to_string_pretty(self).map_err(|e| format!("Failed to serialize to TOML: {}", e))
    }
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            tokens_per_minute: 100_000,
            safety_fraction: 0.85,
            window_secs: 60,
            max_backoff_attempts: 5,
        }
    }
}
