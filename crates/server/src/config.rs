//! Recommender configuration.
//!
//! Every field can be set by flag or environment variable; unset fields
//! fall back to the defaults below.

use clap::Args;
use pipeline::MergeWeights;
use serde::Serialize;
use std::time::Duration;
use thiserror::Error;

pub const DEFAULT_COLLABORATIVE_WEIGHT: f32 = 0.6;
pub const DEFAULT_CONTENT_WEIGHT: f32 = 0.4;
pub const DEFAULT_CACHE_TTL_SECONDS: u64 = 3600;
pub const DEFAULT_MODEL_REBUILD_INTERVAL: u64 = 3600;
pub const DEFAULT_MAX_INTERACTIONS: usize = 10_000;

#[derive(Error, Debug, PartialEq)]
pub enum ConfigError {
    #[error("{name} must be a finite, non-negative number, got {value}")]
    InvalidWeight { name: &'static str, value: f32 },

    #[error("At least one of the collaborative and content weights must be positive")]
    ZeroWeights,

    #[error("Model rebuild interval must be at least one second")]
    ZeroRebuildInterval,
}

/// Tuning knobs for the hybrid recommender
#[derive(Debug, Clone, Args, Serialize)]
pub struct RecommenderConfig {
    /// Weight of the collaborative score in the merged ranking
    #[arg(long, env = "COLLABORATIVE_WEIGHT", default_value_t = DEFAULT_COLLABORATIVE_WEIGHT)]
    pub collaborative_weight: f32,

    /// Weight of the content-based score in the merged ranking
    #[arg(long, env = "CONTENT_WEIGHT", default_value_t = DEFAULT_CONTENT_WEIGHT)]
    pub content_weight: f32,

    /// Lifetime of cached recommendation lists, in seconds
    #[arg(long, env = "CACHE_TTL_SECONDS", default_value_t = DEFAULT_CACHE_TTL_SECONDS)]
    pub cache_ttl_seconds: u64,

    /// Seconds between periodic model rebuilds
    #[arg(long, env = "MODEL_REBUILD_INTERVAL", default_value_t = DEFAULT_MODEL_REBUILD_INTERVAL)]
    pub model_rebuild_interval: u64,

    /// Most recent interactions loaded per rebuild
    #[arg(long, env = "MAX_INTERACTIONS", default_value_t = DEFAULT_MAX_INTERACTIONS)]
    pub max_interactions: usize,
}

impl Default for RecommenderConfig {
    fn default() -> Self {
        Self {
            collaborative_weight: DEFAULT_COLLABORATIVE_WEIGHT,
            content_weight: DEFAULT_CONTENT_WEIGHT,
            cache_ttl_seconds: DEFAULT_CACHE_TTL_SECONDS,
            model_rebuild_interval: DEFAULT_MODEL_REBUILD_INTERVAL,
            max_interactions: DEFAULT_MAX_INTERACTIONS,
        }
    }
}

impl RecommenderConfig {
    pub fn with_weights(mut self, collaborative: f32, content: f32) -> Self {
        self.collaborative_weight = collaborative;
        self.content_weight = content;
        self
    }

    pub fn with_cache_ttl_seconds(mut self, seconds: u64) -> Self {
        self.cache_ttl_seconds = seconds;
        self
    }

    pub fn with_rebuild_interval(mut self, seconds: u64) -> Self {
        self.model_rebuild_interval = seconds;
        self
    }

    pub fn with_max_interactions(mut self, max: usize) -> Self {
        self.max_interactions = max;
        self
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        for (name, value) in [
            ("collaborative_weight", self.collaborative_weight),
            ("content_weight", self.content_weight),
        ] {
            if !value.is_finite() || value < 0.0 {
                return Err(ConfigError::InvalidWeight { name, value });
            }
        }
        if self.collaborative_weight == 0.0 && self.content_weight == 0.0 {
            return Err(ConfigError::ZeroWeights);
        }
        if self.model_rebuild_interval == 0 {
            return Err(ConfigError::ZeroRebuildInterval);
        }
        Ok(())
    }

    pub fn weights(&self) -> MergeWeights {
        MergeWeights::new(self.collaborative_weight, self.content_weight)
    }

    pub fn cache_ttl(&self) -> Duration {
        Duration::from_secs(self.cache_ttl_seconds)
    }

    pub fn rebuild_interval(&self) -> Duration {
        Duration::from_secs(self.model_rebuild_interval)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::Parser;

    #[derive(Parser)]
    struct TestCli {
        #[command(flatten)]
        config: RecommenderConfig,
    }

    #[test]
    fn test_defaults() {
        let config = RecommenderConfig::default();
        assert_eq!(config.weights(), MergeWeights::new(0.6, 0.4));
        assert_eq!(config.cache_ttl(), Duration::from_secs(3600));
        assert_eq!(config.rebuild_interval(), Duration::from_secs(3600));
        assert_eq!(config.max_interactions, 10_000);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_flags_override_defaults() {
        let cli = TestCli::parse_from([
            "test",
            "--collaborative-weight",
            "0.8",
            "--max-interactions",
            "500",
        ]);
        assert_eq!(cli.config.collaborative_weight, 0.8);
        assert_eq!(cli.config.content_weight, 0.4);
        assert_eq!(cli.config.max_interactions, 500);
    }

    #[test]
    fn test_validate_rejects_bad_weights() {
        let negative = RecommenderConfig::default().with_weights(-0.1, 0.4);
        assert!(matches!(
            negative.validate(),
            Err(ConfigError::InvalidWeight { name: "collaborative_weight", .. })
        ));

        let nan = RecommenderConfig::default().with_weights(0.6, f32::NAN);
        assert!(matches!(nan.validate(), Err(ConfigError::InvalidWeight { .. })));

        let zero = RecommenderConfig::default().with_weights(0.0, 0.0);
        assert_eq!(zero.validate(), Err(ConfigError::ZeroWeights));

        // One side switched off is fine
        assert!(RecommenderConfig::default().with_weights(0.0, 1.0).validate().is_ok());
    }

    #[test]
    fn test_validate_rejects_zero_interval() {
        let config = RecommenderConfig::default().with_rebuild_interval(0);
        assert_eq!(config.validate(), Err(ConfigError::ZeroRebuildInterval));
    }
}
