//! Engine configuration.
//!
//! [`EngineConfig`] groups the per-component settings. Every section has
//! defaults, so a partial JSON document (or an empty `{}`) is valid input.

use std::path::Path;

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::emission::EmissionConfig;
use crate::error::ConfigError;
use crate::feature_log::LoggerConfig;
use crate::risk_scorer::ScorerConfig;

/// Complete engine configuration.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    /// Risk scorer strategy and model lookup.
    pub scorer: ScorerConfig,
    /// Adaptive sampling-interval policy.
    pub emission: EmissionConfig,
    /// Feature-vector history retention.
    pub logger: LoggerConfig,
}

impl EngineConfig {
    /// Parse and validate a JSON document.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Parse`] on malformed JSON and
    /// [`ConfigError::InvalidValue`] if validation fails.
    pub fn from_json_str(json: &str) -> Result<Self, ConfigError> {
        let cfg: EngineConfig = serde_json::from_str(json).map_err(ConfigError::Parse)?;
        cfg.validate()?;
        Ok(cfg)
    }

    /// Load and validate a JSON file.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::FileRead`] if the file cannot be read, otherwise
    /// as [`EngineConfig::from_json_str`].
    pub fn from_json(path: &Path) -> Result<Self, ConfigError> {
        let contents = std::fs::read_to_string(path).map_err(|source| ConfigError::FileRead {
            path: path.to_path_buf(),
            source,
        })?;
        let cfg = Self::from_json_str(&contents)?;
        debug!(path = %path.display(), "loaded engine config");
        Ok(cfg)
    }

    /// Pretty-printed JSON form.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Parse`] if serialization fails.
    pub fn to_json_string(&self) -> Result<String, ConfigError> {
        serde_json::to_string_pretty(self).map_err(ConfigError::Parse)
    }

    /// Validate every section, reporting the first problem found.
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.emission.validate()?;
        self.logger.validate()?;
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use crate::risk_scorer::ScorerStrategy;
    use std::io::Write;
    use tempfile::NamedTempFile;

    #[test]
    fn test_default_config_is_valid() {
        EngineConfig::default()
            .validate()
            .expect("default config should be valid");
    }

    #[test]
    fn test_empty_document_uses_defaults() {
        let cfg = EngineConfig::from_json_str("{}").unwrap();
        assert_eq!(cfg, EngineConfig::default());
        assert_eq!(cfg.logger.capacity, 250);
        assert_eq!(cfg.scorer.strategy, ScorerStrategy::Augmented);
    }

    #[test]
    fn test_partial_document_overrides() {
        let cfg = EngineConfig::from_json_str(
            r#"{
                "scorer": { "strategy": "heuristic" },
                "emission": { "max_interval_secs": 5.0 },
                "logger": { "capacity": 32 }
            }"#,
        )
        .unwrap();
        assert_eq!(cfg.scorer.strategy, ScorerStrategy::Heuristic);
        assert_eq!(cfg.emission.max_interval_secs, 5.0);
        assert_eq!(cfg.emission.min_interval_secs, 0.5);
        assert_eq!(cfg.logger.capacity, 32);
    }

    #[test]
    fn test_zero_capacity_rejected() {
        let err = EngineConfig::from_json_str(r#"{ "logger": { "capacity": 0 } }"#).unwrap_err();
        assert!(matches!(err, ConfigError::InvalidValue { field: "capacity", .. }));
    }

    #[test]
    fn test_malformed_json_rejected() {
        let err = EngineConfig::from_json_str("{ not json").unwrap_err();
        assert!(matches!(err, ConfigError::Parse(_)));
    }

    #[test]
    fn test_file_round_trip() {
        let mut original = EngineConfig::default();
        original.logger.capacity = 64;
        original.scorer.enhanced_model_available = Some(false);

        let mut file = NamedTempFile::new().unwrap();
        file.write_all(original.to_json_string().unwrap().as_bytes()).unwrap();

        let loaded = EngineConfig::from_json(file.path()).unwrap();
        assert_eq!(loaded, original);
    }

    #[test]
    fn test_missing_file_reports_path() {
        let err = EngineConfig::from_json(Path::new("/nonexistent/gait.json")).unwrap_err();
        match err {
            ConfigError::FileRead { path, .. } => assert!(path.ends_with("gait.json")),
            other => panic!("unexpected error: {other}"),
        }
    }
}
