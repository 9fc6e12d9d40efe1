/// Variable resolution: condition filtering and weighted selection.

use thiserror::Error;

use crate::core::condition::{self, EvalError};
use crate::core::context::GenerationContext;
use crate::core::rng;
use crate::core::template::ParseError;
use crate::schema::catalog::{VariableCatalog, VariableValue};

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ResolveError {
    #[error("unknown variable '{0}'")]
    UnknownVariable(String),
    #[error("variable '{0}' has no value eligible in this context")]
    NoEligibleValue(String),
    #[error("expanding variable '{name}' exceeded the nesting limit of {limit}")]
    MaxRecursionExceeded { name: String, limit: usize },
    #[error("no option of option group #{0} is eligible in this context")]
    NoEligibleOption(usize),
    #[error("value of variable '{name}' is not a valid template: {source}")]
    InvalidValueTemplate { name: String, source: ParseError },
}

/// Picks candidate values for variable references.
///
/// Holds only shared references, so one resolver can serve any number of
/// variations or threads.
#[derive(Debug, Clone, Copy)]
pub struct VariableResolver<'a> {
    catalog: &'a VariableCatalog,
    context: &'a GenerationContext,
}

impl<'a> VariableResolver<'a> {
    pub fn new(catalog: &'a VariableCatalog, context: &'a GenerationContext) -> Self {
        Self { catalog, context }
    }

    /// Values of `name` whose condition is absent or holds, in catalog order.
    ///
    /// Malformed conditions count as unsatisfied and are pushed to `eval_errors`.
    pub fn eligible_values(
        &self,
        name: &str,
        eval_errors: &mut Vec<EvalError>,
    ) -> Result<Vec<&'a VariableValue>, ResolveError> {
        let entry = self
            .catalog
            .get(name)
            .ok_or_else(|| ResolveError::UnknownVariable(name.to_string()))?;

        let mut eligible = Vec::with_capacity(entry.values.len());
        for value in &entry.values {
            match value.condition.as_deref() {
                None => eligible.push(value),
                Some(expr) => match condition::evaluate(expr, self.context) {
                    Ok(true) => eligible.push(value),
                    Ok(false) => {}
                    Err(e) => eval_errors.push(e),
                },
            }
        }

        if eligible.is_empty() {
            return Err(ResolveError::NoEligibleValue(name.to_string()));
        }
        Ok(eligible)
    }

    /// Resolve one occurrence of `name`, drawing with the seed material `key`.
    ///
    /// The returned text is not expanded further.
    pub fn resolve(
        &self,
        name: &str,
        key: &str,
        eval_errors: &mut Vec<EvalError>,
    ) -> Result<&'a str, ResolveError> {
        let eligible = self.eligible_values(name, eval_errors)?;
        let draw = rng::derive_unit(key);
        let index = weighted_index(eligible.iter().map(|v| v.weight), draw)
            .ok_or_else(|| ResolveError::NoEligibleValue(name.to_string()))?;
        Ok(eligible[index].text.as_str())
    }
}

/// Cumulative-weight selection: the first index whose running total exceeds
/// `draw * total`. `draw` must lie in `[0, 1)`.
///
/// Returns `None` for an empty list or a non-positive total.
pub fn weighted_index<I>(weights: I, draw: f64) -> Option<usize>
where
    I: IntoIterator<Item = f64>,
{
    let weights: Vec<f64> = weights.into_iter().collect();
    let total: f64 = weights.iter().sum();
    if weights.is_empty() || !(total > 0.0) {
        return None;
    }

    let target = draw * total;
    let mut cumulative = 0.0;
    for (i, weight) in weights.iter().enumerate() {
        cumulative += weight;
        if cumulative > target {
            return Some(i);
        }
    }
    // Rounding can leave the final sum a hair under `target`.
    Some(weights.len() - 1)
}
