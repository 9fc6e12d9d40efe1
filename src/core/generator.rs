/// The variation orchestrator: Template → N variation strings.
///
/// Walks the template once per variation, resolving variables, evaluating
/// conditionals, and choosing option branches with draws keyed off the
/// variation seed. Run-time problems never abort a run; they are collected
/// as diagnostics alongside best-effort output.

use rustc_hash::{FxHashMap, FxHashSet};
use std::path::{Path, PathBuf};
use thiserror::Error;

use crate::core::condition::{self, EvalError};
use crate::core::context::GenerationContext;
use crate::core::resolver::{ResolveError, VariableResolver};
use crate::core::rng::{self, VariationSeed};
use crate::core::template::{Node, ParseError, Template, TemplateOption};
use crate::schema::catalog::VariableCatalog;
use crate::schema::config::{ConfigError, EngineConfig};

/// A non-fatal problem met while generating one variation.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum GenerationError {
    #[error(transparent)]
    Eval(#[from] EvalError),
    #[error(transparent)]
    Resolve(#[from] ResolveError),
}

/// A generation error tagged with the variation it occurred in.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Diagnostic {
    pub variation: usize,
    pub error: GenerationError,
}

/// Rejected generation requests.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RequestError {
    #[error("variation count must be at least 1")]
    ZeroCount,
    #[error("requested {requested} variations, but the limit is {limit}")]
    TooManyVariations { requested: usize, limit: usize },
}

/// Everything one `generate` call needs.
#[derive(Debug, Clone, Copy)]
pub struct GenerationRequest<'a> {
    pub template: &'a Template,
    pub catalog: &'a VariableCatalog,
    pub context: &'a GenerationContext,
    /// `None` draws a fresh seed from OS entropy.
    pub seed: Option<&'a str>,
    pub count: usize,
}

/// Output of one `generate` call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GenerationResult {
    /// The seed actually used. When the caller gave none this is the
    /// entropy-drawn seed, which reproduces the run if passed back in.
    pub seed: String,
    /// Whether `seed` came from the caller.
    pub seeded: bool,
    pub variations: Vec<String>,
    pub diagnostics: Vec<Diagnostic>,
}

impl GenerationResult {
    pub fn is_clean(&self) -> bool {
        self.diagnostics.is_empty()
    }

    /// Diagnostics recorded while generating variation `index`.
    pub fn diagnostics_for(&self, index: usize) -> impl Iterator<Item = &GenerationError> {
        self.diagnostics
            .iter()
            .filter(move |d| d.variation == index)
            .map(|d| &d.error)
    }
}

/// The template engine. Built via `TemplateEngine::builder()`.
///
/// Holds only configuration; every call works on shared references, so one
/// engine can serve concurrent callers.
#[derive(Debug, Clone, Default)]
pub struct TemplateEngine {
    config: EngineConfig,
}

/// Builder for constructing a `TemplateEngine`.
#[derive(Debug, Clone, Default)]
pub struct TemplateEngineBuilder {
    config: Option<EngineConfig>,
    config_path: Option<PathBuf>,
    max_recursion_depth: Option<usize>,
    max_variations: Option<usize>,
    max_expansions: Option<usize>,
}

impl TemplateEngine {
    pub fn builder() -> TemplateEngineBuilder {
        TemplateEngineBuilder::default()
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    /// Parse a raw template. Structural errors are fatal for the template.
    pub fn parse(&self, raw: &str) -> Result<Template, ParseError> {
        Template::parse(raw)
    }

    /// Generate `count` variations of `template`.
    pub fn generate(
        &self,
        template: &Template,
        catalog: &VariableCatalog,
        context: &GenerationContext,
        seed: Option<&str>,
        count: usize,
    ) -> Result<GenerationResult, RequestError> {
        self.run(&GenerationRequest {
            template,
            catalog,
            context,
            seed,
            count,
        })
    }

    pub fn run(&self, request: &GenerationRequest<'_>) -> Result<GenerationResult, RequestError> {
        if request.count == 0 {
            return Err(RequestError::ZeroCount);
        }
        if request.count > self.config.max_variations {
            return Err(RequestError::TooManyVariations {
                requested: request.count,
                limit: self.config.max_variations,
            });
        }

        let (seed, seeded) = match request.seed {
            Some(seed) => (seed.to_string(), true),
            None => (rng::entropy_seed(), false),
        };
        tracing::debug!(seed = %seed, seeded, count = request.count, "generating variations");

        let mut variations = Vec::with_capacity(request.count);
        let mut diagnostics = Vec::new();
        for index in 0..request.count {
            let (text, errors) = self.generate_variation(
                request.template,
                request.catalog,
                request.context,
                &seed,
                index,
            );
            variations.push(text);
            diagnostics.extend(errors.into_iter().map(|error| Diagnostic {
                variation: index,
                error,
            }));
        }

        Ok(GenerationResult {
            seed,
            seeded,
            variations,
            diagnostics,
        })
    }

    /// Generate the single variation `index` under `seed`.
    ///
    /// Equal to element `index` of a seeded `generate` call with the same
    /// inputs, whatever the count.
    pub fn generate_variation(
        &self,
        template: &Template,
        catalog: &VariableCatalog,
        context: &GenerationContext,
        seed: &str,
        index: usize,
    ) -> (String, Vec<GenerationError>) {
        let mut expansion = Expansion {
            resolver: VariableResolver::new(catalog, context),
            context,
            seed: VariationSeed::new(seed, index),
            variation: index,
            max_depth: self.config.max_recursion_depth,
            expansions_left: self.config.max_expansions,
            runaway: FxHashSet::default(),
            occurrences: FxHashMap::default(),
            diagnostics: Vec::new(),
        };
        tracing::debug!(variation = index, seed = expansion.seed.as_str(), "expanding variation");

        let mut out = String::new();
        expansion.walk(&template.nodes, 0, &mut out);
        (out, expansion.diagnostics)
    }
}

impl TemplateEngineBuilder {
    /// Start from an explicit config instead of the defaults.
    pub fn config(mut self, config: EngineConfig) -> Self {
        self.config = Some(config);
        self
    }

    /// Load the config from a RON file; skipped if the file does not exist.
    pub fn config_path(mut self, path: impl AsRef<Path>) -> Self {
        self.config_path = Some(path.as_ref().to_path_buf());
        self
    }

    pub fn max_recursion_depth(mut self, depth: usize) -> Self {
        self.max_recursion_depth = Some(depth);
        self
    }

    pub fn max_variations(mut self, limit: usize) -> Self {
        self.max_variations = Some(limit);
        self
    }

    pub fn max_expansions(mut self, limit: usize) -> Self {
        self.max_expansions = Some(limit);
        self
    }

    /// Explicit setters override the loaded file, which overrides `config`.
    pub fn build(self) -> Result<TemplateEngine, ConfigError> {
        let mut config = self.config.unwrap_or_default();

        if let Some(ref path) = self.config_path {
            if path.exists() {
                config = EngineConfig::load_from_ron(path)?;
            } else {
                tracing::warn!(path = %path.display(), "engine config not found, using defaults");
            }
        }

        if let Some(depth) = self.max_recursion_depth {
            config.max_recursion_depth = depth;
        }
        if let Some(limit) = self.max_variations {
            config.max_variations = limit;
        }
        if let Some(limit) = self.max_expansions {
            config.max_expansions = limit;
        }
        config.validate()?;

        Ok(TemplateEngine { config })
    }
}

/// Per-variation occurrence counter key.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
enum Occurrence {
    Variable(String),
    OptionGroup(usize),
}

/// State for expanding one variation. Dropped when the variation is done.
struct Expansion<'a> {
    resolver: VariableResolver<'a>,
    context: &'a GenerationContext,
    seed: VariationSeed,
    variation: usize,
    max_depth: usize,
    /// Nested expansions still allowed in this variation.
    expansions_left: usize,
    /// Variables already reported as runaway in this variation.
    runaway: FxHashSet<String>,
    occurrences: FxHashMap<Occurrence, usize>,
    diagnostics: Vec<GenerationError>,
}

impl Expansion<'_> {
    fn walk(&mut self, nodes: &[Node], depth: usize, out: &mut String) {
        for node in nodes {
            match node {
                Node::Literal(text) => out.push_str(text),
                Node::Variable(name) => self.expand_variable(name, depth, out),
                Node::Conditional {
                    expr,
                    then_branch,
                    else_branch,
                } => {
                    if self.condition_holds(expr) {
                        self.walk(then_branch, depth, out);
                    } else if let Some(else_branch) = else_branch {
                        self.walk(else_branch, depth, out);
                    }
                }
                Node::OptionGroup { index, options } => {
                    self.choose_option(*index, options, depth, out)
                }
            }
        }
    }

    fn expand_variable(&mut self, name: &str, depth: usize, out: &mut String) {
        let occurrence = self.next_occurrence(Occurrence::Variable(name.to_string()));
        let key = self.seed.variable_key(name, occurrence);

        let mut eval_errors = Vec::new();
        let resolved = self.resolver.resolve(name, &key, &mut eval_errors);
        for error in eval_errors {
            self.record(error.into());
        }

        match resolved {
            Ok(text) if text.contains("{{") || text.contains("[[") => {
                self.expand_nested(name, text, depth + 1, out)
            }
            Ok(text) => out.push_str(text),
            // The placeholder is the canonical `{{name}}` form, whatever
            // whitespace the author put inside the braces.
            Err(error) => {
                self.record(error.into());
                out.push_str("{{");
                out.push_str(name);
                out.push_str("}}");
            }
        }
    }

    /// Expand a candidate value that carries template syntax itself.
    ///
    /// Past the depth limit, or once the variation's expansion budget is
    /// spent, the value is emitted raw.
    fn expand_nested(&mut self, name: &str, text: &str, depth: usize, out: &mut String) {
        if depth > self.max_depth || self.expansions_left == 0 {
            if self.runaway.insert(name.to_string()) {
                self.record(
                    ResolveError::MaxRecursionExceeded {
                        name: name.to_string(),
                        limit: self.max_depth,
                    }
                    .into(),
                );
            }
            out.push_str(text);
            return;
        }
        self.expansions_left -= 1;

        match Template::parse(text) {
            Ok(fragment) => self.walk(&fragment.nodes, depth, out),
            Err(source) => {
                self.record(
                    ResolveError::InvalidValueTemplate {
                        name: name.to_string(),
                        source,
                    }
                    .into(),
                );
                out.push_str(text);
            }
        }
    }

    fn choose_option(
        &mut self,
        index: usize,
        options: &[TemplateOption],
        depth: usize,
        out: &mut String,
    ) {
        let occurrence = self.next_occurrence(Occurrence::OptionGroup(index));

        let mut eligible = Vec::with_capacity(options.len());
        for option in options {
            let allowed = match option.condition.as_deref() {
                None => true,
                Some(expr) => self.condition_holds(expr),
            };
            if allowed {
                eligible.push(option);
            }
        }

        let key = self.seed.option_key(index, occurrence);
        match rng::derive_index(&key, eligible.len()) {
            Some(choice) => self.walk(&eligible[choice].body, depth, out),
            None => self.record(ResolveError::NoEligibleOption(index).into()),
        }
    }

    /// Evaluate a condition; malformed expressions are recorded and fail.
    fn condition_holds(&mut self, expr: &str) -> bool {
        match condition::evaluate(expr, self.context) {
            Ok(holds) => holds,
            Err(error) => {
                self.record(error.into());
                false
            }
        }
    }

    fn next_occurrence(&mut self, key: Occurrence) -> usize {
        let count = self.occurrences.entry(key).or_insert(0);
        let current = *count;
        *count += 1;
        current
    }

    fn record(&mut self, error: GenerationError) {
        tracing::warn!(variation = self.variation, seed = self.seed.as_str(), "{}", error);
        self.diagnostics.push(error);
    }
}
