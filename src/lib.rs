//! Encounter Forge: procedural text variations from authored templates.
//!
//! Authors write templates with variable references (`{{name}}`),
//! conditional blocks (`{{#if expr}}…{{else}}…{{/if}}`) and option groups
//! (`[[options]]…[[/options]]`). The engine expands a template against a
//! catalog of weighted, optionally conditional candidate values and a
//! context of game state, producing N variations that are reproducible
//! whenever a seed is given.
//!
//! ```
//! use encounter_forge::core::context::GenerationContext;
//! use encounter_forge::schema::catalog::VariableCatalog;
//!
//! let catalog = VariableCatalog::parse_ron(
//!     r#"[(name: "color", values: [(text: "red"), (text: "blue")])]"#,
//! ).unwrap();
//! let template = encounter_forge::parse_template("You see a {{color}} door.").unwrap();
//! let result = encounter_forge::generate_variations(
//!     &template, &catalog, &GenerationContext::new(), Some("abc"), 2,
//! ).unwrap();
//! assert_eq!(result.variations.len(), 2);
//! ```

pub mod core;
pub mod schema;

use crate::core::context::GenerationContext;
use crate::core::generator::{GenerationResult, RequestError, TemplateEngine};
use crate::core::template::{ParseError, Template};
use crate::schema::catalog::VariableCatalog;

/// Parse a raw template string into its AST.
pub fn parse_template(raw: &str) -> Result<Template, ParseError> {
    Template::parse(raw)
}

/// Generate `count` variations with the default engine configuration.
///
/// With `seed: None` a fresh seed is drawn; it is reported in the result.
pub fn generate_variations(
    template: &Template,
    catalog: &VariableCatalog,
    context: &GenerationContext,
    seed: Option<&str>,
    count: usize,
) -> Result<GenerationResult, RequestError> {
    TemplateEngine::default().generate(template, catalog, context, seed, count)
}
