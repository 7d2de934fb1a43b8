//! Engine configuration parsing and validation

use serde::{Deserialize, Serialize};

use crate::error::{Result, WakeError};

/// Configuration shared by every engine
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EngineConfig {
    /// Engine name: `single`, `pool` or `cluster`
    #[serde(default = "default_engine")]
    pub engine: String,
    /// States per chunk; defaults to `ceil(n_states / n_workers)`
    #[serde(default)]
    pub chunk_size_states: Option<usize>,
    /// Target points per chunk
    #[serde(default = "default_chunk_size_points")]
    pub chunk_size_points: usize,
    /// Number of workers of the pool or cluster
    #[serde(default = "default_n_workers")]
    pub n_workers: usize,
    /// Cluster only: longest wait for the next chunk result
    #[serde(default)]
    pub result_timeout_ms: Option<u64>,
}

// Default values
fn default_engine() -> String {
    "single".to_string()
}

fn default_chunk_size_points() -> usize {
    10_000
}

fn default_n_workers() -> usize {
    std::thread::available_parallelism().map_or(1, std::num::NonZeroUsize::get)
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            engine: default_engine(),
            chunk_size_states: None,
            chunk_size_points: default_chunk_size_points(),
            n_workers: default_n_workers(),
            result_timeout_ms: None,
        }
    }
}

impl EngineConfig {
    /// Configuration for a named engine with defaults elsewhere
    #[must_use]
    pub fn named(engine: &str) -> Self {
        Self {
            engine: engine.to_string(),
            ..Self::default()
        }
    }

    /// Builder-style worker count
    pub fn with_workers(mut self, n_workers: usize) -> Self {
        self.n_workers = n_workers;
        self
    }

    /// Builder-style state chunk size
    pub fn with_chunk_size_states(mut self, size: usize) -> Self {
        self.chunk_size_states = Some(size);
        self
    }

    /// Builder-style point chunk size
    pub fn with_chunk_size_points(mut self, size: usize) -> Self {
        self.chunk_size_points = size;
        self
    }

    /// Parse from a JSON string and validate
    pub fn from_json(json: &str) -> Result<Self> {
        let config: Self =
            serde_json::from_str(json).map_err(|e| WakeError::InvalidConfig(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    /// Validate the configuration
    pub fn validate(&self) -> Result<()> {
        if self.n_workers == 0 {
            return Err(WakeError::InvalidConfig(
                "n_workers must be positive".to_string(),
            ));
        }
        if self.chunk_size_states == Some(0) {
            return Err(WakeError::InvalidConfig(
                "chunk_size_states must be positive".to_string(),
            ));
        }
        if self.chunk_size_points == 0 {
            return Err(WakeError::InvalidConfig(
                "chunk_size_points must be positive".to_string(),
            ));
        }
        if self.result_timeout_ms == Some(0) {
            return Err(WakeError::InvalidConfig(
                "result_timeout_ms must be positive".to_string(),
            ));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_from_empty_json() {
        let config = EngineConfig::from_json("{}").unwrap();
        assert_eq!(config.engine, "single");
        assert_eq!(config.chunk_size_states, None);
        assert_eq!(config.chunk_size_points, 10_000);
        assert!(config.n_workers >= 1);
        assert_eq!(config.result_timeout_ms, None);
    }

    #[test]
    fn test_parse_overrides() {
        let config = EngineConfig::from_json(
            r#"{"engine": "pool", "n_workers": 3, "chunk_size_states": 7}"#,
        )
        .unwrap();
        assert_eq!(config.engine, "pool");
        assert_eq!(config.n_workers, 3);
        assert_eq!(config.chunk_size_states, Some(7));
    }

    #[test]
    fn test_validation_rejects_zero_workers() {
        let err = EngineConfig::from_json(r#"{"n_workers": 0}"#).unwrap_err();
        assert!(matches!(err, WakeError::InvalidConfig(_)));
        assert!(EngineConfig::from_json("{not json").is_err());
    }
}
