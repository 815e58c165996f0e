//! Validation result and the cache document wrapping it.
//!
//! Both serialize to camelCase JSON and are consumed as-is by report
//! renderers. Every field has a default so that partial documents (an old
//! cache, or `{}`) still parse.

use serde::{Deserialize, Serialize};

use super::{
    DependencyType, OptionsUsed, RawRuleSet, RevisionData, RuleRef, Severity, SeverityCounts,
    Violation,
};

fn is_false(value: &bool) -> bool {
    !*value
}

/// A dependency edge annotated with derived flags and violated rules.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct DependencyResult {
    /// Target path, or the raw specifier when unresolved.
    pub resolved: String,
    /// Dependency type tags.
    pub dependency_types: Vec<DependencyType>,
    /// Target could not be resolved.
    pub could_not_resolve: bool,
    /// Target is a core module.
    pub core_module: bool,
    /// Edge lies inside a strongly connected component.
    pub circular: bool,
    /// Cycle members rotated to start at the edge's source.
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub cycle: Vec<String>,
    /// No rule is violated by this edge.
    pub valid: bool,
    /// Rules violated by this edge.
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub rules: Vec<RuleRef>,
}

/// A module annotated with derived flags, violated rules and its edges.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ModuleResult {
    /// Module path.
    pub source: String,
    /// No incoming and no outgoing edges.
    pub orphan: bool,
    /// Runtime built-in.
    pub core_module: bool,
    /// Module could not be resolved.
    pub could_not_resolve: bool,
    /// Produced by folding several modules together.
    #[serde(skip_serializing_if = "is_false")]
    pub consolidated: bool,
    /// No module-level rule is violated.
    pub valid: bool,
    /// Module-level rules violated.
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub rules: Vec<RuleRef>,
    /// Outgoing dependencies in target order.
    pub dependencies: Vec<DependencyResult>,
}

/// Result-wide summary.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Summary {
    /// All violations, sorted by (rule name, from, to).
    pub violations: Vec<Violation>,
    /// Violation counts per severity.
    pub severity_counts: SeverityCounts,
    /// Worst observed severity, for exit-status decisions by the caller.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub worst_severity: Option<Severity>,
    /// Number of modules validated.
    pub total_cruised: usize,
    /// Number of dependency edges validated.
    pub total_dependencies_cruised: usize,
    /// Options that shaped this result.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub options_used: Option<OptionsUsed>,
    /// Rule set this result was validated against.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub rule_set_used: Option<RawRuleSet>,
}

/// Annotated modules plus summary.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ValidationResult {
    /// Modules in path order.
    pub modules: Vec<ModuleResult>,
    /// Summary.
    pub summary: Summary,
}

impl ValidationResult {
    /// True when no violation of severity `error` was found.
    pub fn passes(&self) -> bool {
        self.summary.severity_counts.error == 0
    }

    /// Look up a module by path.
    pub fn module(&self, source: &str) -> Option<&ModuleResult> {
        self.modules
            .binary_search_by(|m| m.source.as_str().cmp(source))
            .ok()
            .map(|i| &self.modules[i])
    }
}

/// The persisted cache: a validation result plus the revision it was made at.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CacheDocument {
    /// Annotated modules.
    #[serde(default)]
    pub modules: Vec<ModuleResult>,
    /// Summary.
    #[serde(default)]
    pub summary: Summary,
    /// Revision fingerprint at run time; absent in an empty cache.
    #[serde(rename = "revisionData", default, skip_serializing_if = "Option::is_none")]
    pub revision_data: Option<RevisionData>,
}

impl CacheDocument {
    /// The document that stands in for a missing or unreadable cache:
    /// `{modules: [], summary: {}}`.
    pub fn empty() -> Self {
        Self::default()
    }

    /// Wrap a result together with the revision it was produced at.
    pub fn from_result(result: ValidationResult, revision: RevisionData) -> Self {
        Self {
            modules: result.modules,
            summary: result.summary,
            revision_data: Some(revision),
        }
    }

    /// Unwrap into the validation result.
    pub fn into_result(self) -> ValidationResult {
        ValidationResult {
            modules: self.modules,
            summary: self.summary,
        }
    }
}
