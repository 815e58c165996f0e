//! The cruise driver: cache lookup, graph construction, validation,
//! collapse and cache write, in that order.
//!
//! ## Flow
//!
//! ```text
//! CruiseOptions ─► compile rules ─► cache verdict ──Serve──► cached result
//!                                        │
//!                                        └─miss─► ModuleSource ─► ModuleGraph
//!                                                 ─► validate ─► annotate ─► collapse
//!                                                 ─► stamp options ─► write cache
//! ```
//!
//! Rules are compiled before the cache is consulted, so a malformed rule
//! set fails even when a cached result exists.

use std::convert::Infallible;
use tracing::info;

use crate::cache::{evaluate, write_cache, CacheVerdict, CacheWriteError};
use crate::collapse::collapse;
use crate::config::ValidationConfig;
use crate::graph::{GraphError, ModuleGraph};
use crate::matcher::PathMatcher;
use crate::rules::{annotate, validate, CompiledRuleSet, CustomRuleRegistry, LoadError};
use crate::types::{CacheDocument, CruiseOptions, RawModule, RevisionData, ValidationResult};

/// Supplier of resolved module records.
///
/// Only consulted on a cache miss.
pub trait ModuleSource {
    /// Error type of the source.
    type Error: std::error::Error;

    /// All modules of the scanned tree.
    fn modules(&self) -> Result<Vec<RawModule>, Self::Error>;
}

impl ModuleSource for Vec<RawModule> {
    type Error = Infallible;

    fn modules(&self) -> Result<Vec<RawModule>, Self::Error> {
        Ok(self.clone())
    }
}

/// Error type for cruise operations.
#[derive(Debug, thiserror::Error)]
pub enum CruiseError {
    /// The rule set is malformed.
    #[error("Rule set error: {0}")]
    Load(#[from] LoadError),
    /// The module records are inconsistent.
    #[error("Module graph error: {0}")]
    Graph(#[from] GraphError),
    /// The result could not be persisted.
    #[error("Cache write error: {0}")]
    CacheWrite(#[from] CacheWriteError),
    /// The collapse pattern does not compile.
    #[error("Invalid collapse pattern '{pattern}': {source}")]
    Collapse {
        /// The pattern as given.
        pattern: String,
        /// Compiler error.
        source: regex_lite::Error,
    },
    /// The module source failed.
    #[error("Module source error: {0}")]
    Source(String),
}

impl CruiseError {
    /// Create a source error from any error type.
    pub fn from_source<E: std::error::Error>(e: E) -> Self {
        Self::Source(e.to_string())
    }
}

/// Result of one cruise.
#[derive(Debug, Clone)]
pub struct CruiseOutcome {
    /// The validation result, fresh or cached.
    pub result: ValidationResult,
    /// Whether `result` came from the cache.
    pub served_from_cache: bool,
    /// Cache verdict, when the cache was consulted.
    pub cache_verdict: Option<CacheVerdict>,
    /// Fingerprint of the rule set in effect.
    pub rule_set_fingerprint: String,
}

/// Runs cruises with a fixed engine configuration and custom-rule registry.
#[derive(Debug, Clone, Default)]
pub struct Cruiser {
    config: ValidationConfig,
    registry: CustomRuleRegistry,
}

impl Cruiser {
    /// A driver with the given engine configuration and no custom checks.
    pub fn new(config: ValidationConfig) -> Self {
        Self {
            config,
            registry: CustomRuleRegistry::new(),
        }
    }

    /// Builder: use `registry` to resolve custom rules.
    pub fn with_registry(mut self, registry: CustomRuleRegistry) -> Self {
        self.registry = registry;
        self
    }

    /// Engine configuration.
    pub fn config(&self) -> &ValidationConfig {
        &self.config
    }

    /// Validate the modules of `source` under `options`.
    ///
    /// With a cache folder and `revision` given, a compatible cached result
    /// is served unless `bust_the_cache` is set, and a fresh result is
    /// written back. Without `revision` the cache is neither read nor
    /// written.
    pub fn cruise<S: ModuleSource + ?Sized>(
        &self,
        source: &S,
        options: &CruiseOptions,
        revision: Option<&RevisionData>,
    ) -> Result<CruiseOutcome, CruiseError> {
        let rule_set = match &options.rule_set {
            Some(raw) => CompiledRuleSet::compile(raw, &self.registry)?,
            None => CompiledRuleSet::empty(),
        };
        let collapse_pattern = options
            .collapse
            .as_deref()
            .map(|pattern| {
                PathMatcher::compile(pattern).map_err(|source| CruiseError::Collapse {
                    pattern: pattern.to_string(),
                    source,
                })
            })
            .transpose()?;

        let mut cache_verdict = None;
        if let (Some(revision), false) = (revision, options.bust_the_cache) {
            let (verdict, cached) = evaluate(options, revision);
            cache_verdict = Some(verdict);
            if let Some(doc) = cached {
                info!(
                    args = %options.args,
                    sha1 = %revision.sha1,
                    "serving cached result"
                );
                return Ok(CruiseOutcome {
                    result: doc.into_result(),
                    served_from_cache: true,
                    cache_verdict,
                    rule_set_fingerprint: rule_set.fingerprint().to_string(),
                });
            }
        }

        let modules = source.modules().map_err(CruiseError::from_source)?;
        let graph = ModuleGraph::from_raw(modules)?;
        let report = validate(&graph, &rule_set, &self.config);
        let mut result = annotate(&graph, &report);

        if let Some(pattern) = &collapse_pattern {
            result = collapse(result, pattern);
        }
        result.summary.options_used = Some(options.options_used());
        result.summary.rule_set_used = options.rule_set.clone();

        if let (Some(folder), Some(revision)) = (options.cache.as_deref(), revision) {
            write_cache(folder, &CacheDocument::from_result(result.clone(), revision.clone()))?;
        }

        Ok(CruiseOutcome {
            result,
            served_from_cache: false,
            cache_verdict,
            rule_set_fingerprint: rule_set.fingerprint().to_string(),
        })
    }
}
