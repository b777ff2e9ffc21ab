//! Configuration for the extraction stages

use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Configuration for detection, token estimation, and chunking
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExtractorConfig {
    /// Token total below which a file becomes a single chunk
    pub whole_tier_tokens: usize,

    /// Token total below which the document-boundary tier is attempted
    pub document_tier_tokens: usize,

    /// Per-chunk token ceiling every tier must respect
    pub chunk_token_ceiling: usize,

    /// Pages per window in the page-split tier
    pub page_window: usize,

    /// TTL for cached token counts (seconds)
    pub token_cache_ttl_secs: u64,

    /// Page score at or above which a new document starts
    pub split_threshold: f64,
}

impl ExtractorConfig {
    /// Get the token-cache TTL as a Duration
    pub fn token_cache_ttl(&self) -> Duration {
        Duration::from_secs(self.token_cache_ttl_secs)
    }

    /// Validate the configuration
    pub fn validate(&self) -> Result<(), String> {
        if self.whole_tier_tokens == 0 {
            return Err("whole_tier_tokens must be greater than 0".to_string());
        }
        if self.chunk_token_ceiling == 0 {
            return Err("chunk_token_ceiling must be greater than 0".to_string());
        }
        if self.whole_tier_tokens > self.document_tier_tokens {
            return Err("whole_tier_tokens cannot exceed document_tier_tokens".to_string());
        }
        if self.whole_tier_tokens > self.chunk_token_ceiling {
            return Err("whole_tier_tokens cannot exceed chunk_token_ceiling".to_string());
        }
        if self.page_window == 0 {
            return Err("page_window must be at least 1".to_string());
        }
        if self.token_cache_ttl_secs == 0 {
            return Err("token_cache_ttl_secs must be greater than 0".to_string());
        }
        if !(0.0..=1.0).contains(&self.split_threshold) || self.split_threshold == 0.0 {
            return Err("split_threshold must be in (0.0, 1.0]".to_string());
        }
        Ok(())
    }
}

impl Default for ExtractorConfig {
    /// Default configuration with balanced thresholds
    fn default() -> Self {
        Self {
            whole_tier_tokens: 25_000,
            document_tier_tokens: 100_000,
            chunk_token_ceiling: 30_000,
            page_window: 12,
            token_cache_ttl_secs: 3_600,
            split_threshold: 0.3,
        }
    }
}

impl ExtractorConfig {
    /// Aggressive preset: smaller chunks and windows for tight quotas
    pub fn aggressive() -> Self {
        Self {
            whole_tier_tokens: 15_000,
            document_tier_tokens: 60_000,
            chunk_token_ceiling: 20_000,
            page_window: 10,
            token_cache_ttl_secs: 1_800,
            split_threshold: 0.3,
        }
    }

    /// Lenient preset: larger chunks for fewer, bigger provider calls
    pub fn lenient() -> Self {
        Self {
            whole_tier_tokens: 40_000,
            document_tier_tokens: 150_000,
            chunk_token_ceiling: 50_000,
            page_window: 15,
            token_cache_ttl_secs: 7_200,
            split_threshold: 0.5,
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

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config_is_valid() {
        assert!(ExtractorConfig::default().validate().is_ok());
    }

    #[test]
    fn test_presets_are_valid() {
        assert!(ExtractorConfig::aggressive().validate().is_ok());
        assert!(ExtractorConfig::lenient().validate().is_ok());
    }

    #[test]
    fn test_invalid_page_window() {
        let mut config = ExtractorConfig::default();
        config.page_window = 0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_whole_tier_must_fit_ceiling() {
        let mut config = ExtractorConfig::default();
        config.whole_tier_tokens = config.chunk_token_ceiling + 1;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_threshold_bounds() {
        let mut config = ExtractorConfig::default();
        config.split_threshold = 0.0;
        assert!(config.validate().is_err());
        config.split_threshold = 1.1;
        assert!(config.validate().is_err());
        config.split_threshold = 1.0;
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_toml_round_trip() {
        let config = ExtractorConfig::default();
        let toml_str = config.to_toml().unwrap();
        let parsed = ExtractorConfig::from_toml(&toml_str).unwrap();

        assert_eq!(config.whole_tier_tokens, parsed.whole_tier_tokens);
        assert_eq!(config.page_window, parsed.page_window);
        assert_eq!(config.token_cache_ttl_secs, parsed.token_cache_ttl_secs);
    }
}
