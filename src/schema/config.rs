use serde::{Deserialize, Serialize};
use std::path::Path;

/// Default limit on nested variable expansion.
pub const DEFAULT_MAX_RECURSION_DEPTH: usize = 5;
/// Default cap on variations per generation request.
pub const DEFAULT_MAX_VARIATIONS: usize = 100;
/// Default cap on nested value expansions within one variation.
pub const DEFAULT_MAX_EXPANSIONS: usize = 1024;

/// Tunables for the template engine, loadable from RON:
///
/// ```ron
/// (max_recursion_depth: 3, max_variations: 20)
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    /// How many levels of `{{var}}` inside a candidate value are expanded
    /// before the text is emitted unexpanded.
    pub max_recursion_depth: usize,
    pub max_variations: usize,
    /// Nested value expansions allowed per variation, across all chains.
    /// Once spent, further values with template syntax are emitted raw.
    pub max_expansions: usize,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            max_recursion_depth: DEFAULT_MAX_RECURSION_DEPTH,
            max_variations: DEFAULT_MAX_VARIATIONS,
            max_expansions: DEFAULT_MAX_EXPANSIONS,
        }
    }
}

impl EngineConfig {
    pub fn load_from_ron(path: &Path) -> Result<EngineConfig, ConfigError> {
        let contents = std::fs::read_to_string(path)?;
        Self::parse_ron(&contents)
    }

    pub fn parse_ron(input: &str) -> Result<EngineConfig, ConfigError> {
        let config: EngineConfig = ron::from_str(input)?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.max_variations == 0 {
            return Err(ConfigError::Invalid(
                "max_variations must be at least 1".to_string(),
            ));
        }
        Ok(())
    }
}

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("RON deserialization error: {0}")]
    Ron(#[from] ron::error::SpannedError),
    #[error("invalid engine config: {0}")]
    Invalid(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults() {
        let config = EngineConfig::default();
        assert_eq!(config.max_recursion_depth, 5);
        assert_eq!(config.max_variations, 100);
        assert_eq!(config.max_expansions, 1024);
    }

    #[test]
    fn partial_ron_keeps_defaults() {
        let config = EngineConfig::parse_ron("(max_recursion_depth: 2)").unwrap();
        assert_eq!(config.max_recursion_depth, 2);
        assert_eq!(config.max_variations, DEFAULT_MAX_VARIATIONS);
        assert_eq!(config.max_expansions, DEFAULT_MAX_EXPANSIONS);
    }

    #[test]
    fn zero_variations_rejected() {
        assert!(matches!(
            EngineConfig::parse_ron("(max_variations: 0)"),
            Err(ConfigError::Invalid(_))
        ));
    }

    #[test]
    fn load_test_config_from_ron() {
        let path = std::path::PathBuf::from("tests/fixtures/engine_config.ron");
        let config = EngineConfig::load_from_ron(&path).unwrap();
        assert_eq!(config.max_recursion_depth, 3);
        assert_eq!(config.max_variations, 20);
    }
}
