//! WASM bindings for encounter-forge: powers the browser template preview.

use std::collections::HashMap;
use wasm_bindgen::prelude::*;

use encounter_forge::core::context::GenerationContext;
use encounter_forge::core::generator::TemplateEngine;
use encounter_forge::core::lint::lint;
use encounter_forge::core::template::Template;
use encounter_forge::schema::catalog::VariableCatalog;
use encounter_forge::schema::value::ContextValue;

// ---------------------------------------------------------------------------
// JSON helper types for communication across the WASM boundary
// ---------------------------------------------------------------------------
#[derive(serde::Serialize)]
struct DiagnosticOutput {
    variation: usize,
    message: String,
}

#[derive(serde::Serialize)]
struct GenerationOutput {
    seed: String,
    variations: Vec<String>,
    diagnostics: Vec<DiagnosticOutput>,
}

// ---------------------------------------------------------------------------
// Conversion helpers
// ---------------------------------------------------------------------------

/// Context arrives as a flat JSON object of plain scalars:
/// `{"time_of_day": "night", "level": 5, "has_torch": true}`.
fn parse_context(context_json: &str) -> Result<GenerationContext, JsError> {
    if context_json.trim().is_empty() {
        return Ok(GenerationContext::new());
    }
    let raw: HashMap<String, serde_json::Value> = serde_json::from_str(context_json)
        .map_err(|e| JsError::new(&format!("Invalid context JSON: {e}")))?;

    let mut context = GenerationContext::new();
    for (key, value) in raw {
        let value = match value {
            serde_json::Value::String(s) => ContextValue::String(s),
            serde_json::Value::Bool(b) => ContextValue::Bool(b),
            serde_json::Value::Number(n) => match n.as_f64() {
                Some(n) => ContextValue::Number(n),
                None => return Err(JsError::new(&format!("Context value '{key}' is out of range"))),
            },
            other => {
                return Err(JsError::new(&format!(
                    "Context value '{key}' must be a string, number or boolean, got {other}"
                )))
            }
        };
        context.insert(key, value);
    }
    Ok(context)
}

fn to_json<T: serde::Serialize>(value: &T) -> Result<String, JsError> {
    serde_json::to_string(value).map_err(|e| JsError::new(&format!("Serialization error: {e}")))
}

// ---------------------------------------------------------------------------
// Exports
// ---------------------------------------------------------------------------

/// Parse a template and return its AST as JSON.
#[wasm_bindgen]
pub fn parse_template(raw: &str) -> Result<String, JsError> {
    let template = Template::parse(raw).map_err(|e| JsError::new(&e.to_string()))?;
    to_json(&template)
}

#[wasm_bindgen]
pub struct TemplatePreview {
    engine: TemplateEngine,
    catalog: VariableCatalog,
}

#[wasm_bindgen]
impl TemplatePreview {
    /// `catalog_json` uses the variable-library store shape:
    /// `[{"name": .., "description": .., "values": [{"text": .., "weight": .., "condition": ..}]}]`.
    #[wasm_bindgen(constructor)]
    pub fn new(catalog_json: &str) -> Result<TemplatePreview, JsError> {
        let catalog = VariableCatalog::from_json(catalog_json)
            .map_err(|e| JsError::new(&format!("Catalog error: {e}")))?;
        Ok(TemplatePreview {
            engine: TemplateEngine::default(),
            catalog,
        })
    }

    /// Generate `count` variations. Returns `{seed, variations, diagnostics}`.
    pub fn generate(
        &self,
        template: &str,
        context_json: &str,
        seed: Option<String>,
        count: usize,
    ) -> Result<String, JsError> {
        let template = Template::parse(template).map_err(|e| JsError::new(&e.to_string()))?;
        let context = parse_context(context_json)?;
        let result = self
            .engine
            .generate(&template, &self.catalog, &context, seed.as_deref(), count)
            .map_err(|e| JsError::new(&e.to_string()))?;

        let output = GenerationOutput {
            seed: result.seed,
            variations: result.variations,
            diagnostics: result
                .diagnostics
                .into_iter()
                .map(|d| DiagnosticOutput {
                    variation: d.variation,
                    message: d.error.to_string(),
                })
                .collect(),
        };
        to_json(&output)
    }

    /// Lint a template against the loaded catalog. Returns `{errors, warnings}`.
    pub fn lint(&self, template: &str) -> Result<String, JsError> {
        let template = Template::parse(template).map_err(|e| JsError::new(&e.to_string()))?;
        to_json(&lint(&template, &self.catalog))
    }

    /// Names of the loaded variables, sorted.
    pub fn variable_names(&self) -> String {
        serde_json::to_string(&self.catalog.names()).unwrap_or_else(|_| "[]".to_string())
    }
}
