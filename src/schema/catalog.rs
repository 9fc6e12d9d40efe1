/// Variable catalogs: named slots and their weighted, conditional candidates.

use rustc_hash::FxHashMap;
use serde::{Deserialize, Serialize};
use std::path::Path;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum CatalogError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("RON deserialization error: {0}")]
    Ron(#[from] ron::error::SpannedError),
    #[error("JSON deserialization error: {0}")]
    Json(#[from] serde_json::Error),
    #[error("variable '{0}' is defined more than once")]
    DuplicateVariable(String),
    #[error("variable name must not be empty")]
    EmptyName,
    #[error("variable '{name}' value #{index} has invalid weight {weight} (must be finite and > 0)")]
    InvalidWeight {
        name: String,
        index: usize,
        weight: f64,
    },
}

fn default_weight() -> f64 {
    1.0
}

/// One candidate expansion for a variable.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VariableValue {
    pub text: String,
    #[serde(default = "default_weight")]
    pub weight: f64,
    /// Eligibility gate, evaluated against the generation context.
    #[serde(default)]
    pub condition: Option<String>,
}

impl VariableValue {
    /// An unconditional value with weight 1.0.
    pub fn new(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            weight: default_weight(),
            condition: None,
        }
    }

    pub fn weighted(mut self, weight: f64) -> Self {
        self.weight = weight;
        self
    }

    pub fn when(mut self, condition: impl Into<String>) -> Self {
        self.condition = Some(condition.into());
        self
    }
}

/// A named variable and its candidate values, in authored order.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VariableEntry {
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
    pub values: Vec<VariableValue>,
}

impl VariableEntry {
    pub fn new(name: impl Into<String>, values: Vec<VariableValue>) -> Self {
        Self {
            name: name.into(),
            description: None,
            values,
        }
    }

    fn validate(&self) -> Result<(), CatalogError> {
        if self.name.trim().is_empty() {
            return Err(CatalogError::EmptyName);
        }
        for (index, value) in self.values.iter().enumerate() {
            if !(value.weight.is_finite() && value.weight > 0.0) {
                return Err(CatalogError::InvalidWeight {
                    name: self.name.clone(),
                    index,
                    weight: value.weight,
                });
            }
        }
        Ok(())
    }
}

/// The set of variables available to one generation call.
///
/// Names are unique and every weight is finite and positive; both are
/// checked whenever entries enter the catalog.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "Vec<VariableEntry>", into = "Vec<VariableEntry>")]
pub struct VariableCatalog {
    entries: FxHashMap<String, VariableEntry>,
}

impl VariableCatalog {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a catalog, rejecting duplicate names and invalid weights.
    pub fn from_entries(entries: Vec<VariableEntry>) -> Result<Self, CatalogError> {
        let mut catalog = Self::new();
        for entry in entries {
            if catalog.entries.contains_key(&entry.name) {
                return Err(CatalogError::DuplicateVariable(entry.name));
            }
            catalog.insert(entry)?;
        }
        Ok(catalog)
    }

    /// Insert an entry, replacing any existing entry with the same name.
    pub fn insert(&mut self, entry: VariableEntry) -> Result<(), CatalogError> {
        entry.validate()?;
        self.entries.insert(entry.name.clone(), entry);
        Ok(())
    }

    pub fn get(&self, name: &str) -> Option<&VariableEntry> {
        self.entries.get(name)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.entries.contains_key(name)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn entries(&self) -> impl Iterator<Item = &VariableEntry> {
        self.entries.values()
    }

    /// Variable names in sorted order.
    pub fn names(&self) -> Vec<&str> {
        let mut names: Vec<&str> = self.entries.keys().map(String::as_str).collect();
        names.sort_unstable();
        names
    }

    /// Merge another catalog into this one. Entries from `other`
    /// override entries in `self` with the same name.
    pub fn merge(&mut self, other: VariableCatalog) {
        for (name, entry) in other.entries {
            self.entries.insert(name, entry);
        }
    }

    /// Load a catalog from a RON file holding a list of entries.
    pub fn load_from_ron(path: &Path) -> Result<VariableCatalog, CatalogError> {
        let contents = std::fs::read_to_string(path)?;
        Self::parse_ron(&contents)
    }

    /// Parse a catalog from a RON string.
    pub fn parse_ron(input: &str) -> Result<VariableCatalog, CatalogError> {
        let entries: Vec<VariableEntry> = ron::from_str(input)?;
        Self::from_entries(entries)
    }

    /// Parse a catalog from the variable-library store's JSON shape:
    /// `[{"name": .., "description": .., "values": [{"text", "weight", "condition"}]}]`.
    pub fn from_json(input: &str) -> Result<VariableCatalog, CatalogError> {
        let entries: Vec<VariableEntry> = serde_json::from_str(input)?;
        Self::from_entries(entries)
    }
}

impl TryFrom<Vec<VariableEntry>> for VariableCatalog {
    type Error = CatalogError;

    fn try_from(entries: Vec<VariableEntry>) -> Result<Self, Self::Error> {
        Self::from_entries(entries)
    }
}

impl From<VariableCatalog> for Vec<VariableEntry> {
    fn from(catalog: VariableCatalog) -> Self {
        let mut entries: Vec<VariableEntry> = catalog.entries.into_values().collect();
        entries.sort_by(|a, b| a.name.cmp(&b.name));
        entries
    }
}
