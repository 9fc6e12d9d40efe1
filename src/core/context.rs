/// Generation context: the runtime facts conditions are evaluated against.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::Path;

use crate::schema::value::ContextValue;

/// Read-only key/value facts for one generation call, e.g.
/// `time_of_day = "night"`, `player_level = 5`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct GenerationContext {
    values: HashMap<String, ContextValue>,
}

impl GenerationContext {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder-style insert.
    pub fn with(mut self, key: impl Into<String>, value: impl Into<ContextValue>) -> Self {
        self.insert(key, value);
        self
    }

    pub fn insert(&mut self, key: impl Into<String>, value: impl Into<ContextValue>) {
        self.values.insert(key.into(), value.into());
    }

    pub fn get(&self, key: &str) -> Option<&ContextValue> {
        self.values.get(key)
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// Load a context from a RON map, e.g. `{"level": Number(5.0)}`.
    pub fn load_from_ron(path: &Path) -> Result<GenerationContext, ContextError> {
        let contents = std::fs::read_to_string(path)?;
        Self::parse_ron(&contents)
    }

    pub fn parse_ron(input: &str) -> Result<GenerationContext, ContextError> {
        Ok(ron::from_str(input)?)
    }
}

impl<K, V> FromIterator<(K, V)> for GenerationContext
where
    K: Into<String>,
    V: Into<ContextValue>,
{
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        let mut ctx = Self::new();
        for (key, value) in iter {
            ctx.insert(key, value);
        }
        ctx
    }
}

#[derive(Debug, thiserror::Error)]
pub enum ContextError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("RON deserialization error: {0}")]
    Ron(#[from] ron::error::SpannedError),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn context_default() {
        let ctx = GenerationContext::default();
        assert!(ctx.is_empty());
        assert!(ctx.get("anything").is_none());
    }

    #[test]
    fn builder_insert() {
        let ctx = GenerationContext::new()
            .with("time_of_day", "night")
            .with("player_level", 5)
            .with("has_torch", true);
        assert_eq!(ctx.len(), 3);
        assert_eq!(ctx.get("time_of_day"), Some(&ContextValue::from("night")));
        assert_eq!(ctx.get("player_level"), Some(&ContextValue::Number(5.0)));
        assert_eq!(ctx.get("has_torch"), Some(&ContextValue::Bool(true)));
    }

    #[test]
    fn collect_from_pairs() {
        let ctx: GenerationContext = [("a", "x"), ("b", "y")].into_iter().collect();
        assert_eq!(ctx.get("b"), Some(&ContextValue::from("y")));
    }

    #[test]
    fn parse_ron_map() {
        let ctx = GenerationContext::parse_ron(
            r#"{"time_of_day": String("dusk"), "level": Number(7.0), "cursed": Bool(false)}"#,
        )
        .unwrap();
        assert_eq!(ctx.get("level").and_then(ContextValue::as_number), Some(7.0));
        assert_eq!(ctx.get("cursed"), Some(&ContextValue::Bool(false)));
    }
}
