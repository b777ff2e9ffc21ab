//! Configuration for session retention and the event bus

use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Configuration for the session store, sweeper, and event emitter
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionConfig {
    /// Idle TTL before a terminal session becomes eligible for sweeping (seconds)
    pub session_ttl_secs: u64,

    /// Interval between sweeper cycles (seconds)
    pub sweep_interval_secs: u64,

    /// Events retained per session for late-subscriber replay
    pub replay_buffer_size: usize,
}

impl SessionConfig {
    /// Get the session TTL as a Duration
    pub fn session_ttl(&self) -> Duration {
        Duration::from_secs(self.session_ttl_secs)
    }

    /// Get the sweep interval as a Duration
    pub fn sweep_interval(&self) -> Duration {
        Duration::from_secs(self.sweep_interval_secs)
    }

    /// Validate the configuration
    pub fn validate(&self) -> Result<(), String> {
        if self.session_ttl_secs == 0 {
            return Err("session_ttl_secs must be greater than 0".to_string());
        }
        if self.sweep_interval_secs == 0 {
            return Err("sweep_interval_secs must be greater than 0".to_string());
        }
        if self.replay_buffer_size == 0 {
            return Err("replay_buffer_size must be greater than 0".to_string());
        }
        Ok(())
    }

    /// Aggressive preset: short retention for memory-constrained hosts
    pub fn aggressive() -> Self {
        Self {
            session_ttl_secs: 120,
            sweep_interval_secs: 30,
            replay_buffer_size: 50,
        }
    }

    /// Lenient preset: long retention for slow-polling clients
    pub fn lenient() -> Self {
        Self {
            session_ttl_secs: 1_800,
            sweep_interval_secs: 120,
            replay_buffer_size: 250,
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

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            session_ttl_secs: 300,
            sweep_interval_secs: 60,
            replay_buffer_size: 100,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config_is_valid() {
        assert!(SessionConfig::default().validate().is_ok());
    }

    #[test]
    fn test_presets_are_valid() {
        assert!(SessionConfig::aggressive().validate().is_ok());
        assert!(SessionConfig::lenient().validate().is_ok());
    }

    #[test]
    fn test_zero_ttl_rejected() {
        let mut config = SessionConfig::default();
        config.session_ttl_secs = 0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_toml_round_trip() {
        let config = SessionConfig::lenient();
        let parsed = SessionConfig::from_toml(&config.to_toml().unwrap()).unwrap();
        assert_eq!(parsed.session_ttl_secs, 1_800);
        assert_eq!(parsed.replay_buffer_size, 250);
    }
}
