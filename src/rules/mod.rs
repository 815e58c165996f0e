//! Rule model and evaluation.
//!
//! ## Pipeline
//!
//! ```text
//! RawRuleSet ──load──► CompiledRuleSet ──engine──► ValidationReport ──annotate──► ValidationResult
//! ```
//!
//! Loading compiles every pattern once and rejects malformed rules before
//! any module is examined. Evaluation is a pure function of the graph and
//! the compiled rules; only the order in which independent rules run may
//! vary, and the report is canonically sorted afterwards.

pub mod annotate;
pub mod custom;
pub mod engine;
pub mod load;

pub use annotate::annotate;
pub use custom::{CustomCheck, CustomRule, CustomRuleRegistry, Finding, GraphView};
pub use engine::{validate, ValidationReport};
pub use load::LoadError;

use crate::canonical::canonical_hash_hex;
use crate::graph::{DependencyEdge, ModuleGraph, Target, ViaConstraint};
use crate::matcher::{CaptureContext, PathSelector};
use crate::types::{DependencyType, RawRuleSet, RuleRef, Severity};

/// Dependency-level constraints of a link rule's "to" side.
#[derive(Debug, Clone, Default)]
pub struct LinkTarget {
    /// Path patterns; may refer to "from" captures.
    pub path: PathSelector,
    /// Require the dependency to be (un)resolvable.
    pub could_not_resolve: Option<bool>,
    /// Require the target to be (or not be) a core module.
    pub core_module: Option<bool>,
    /// Require at least one of these dependency types (empty: any).
    pub dependency_types: Vec<DependencyType>,
}

impl LinkTarget {
    /// Whether `edge` satisfies every constraint, with `captures` from the
    /// matching "from" selector.
    pub fn admits(&self, graph: &ModuleGraph, edge: &DependencyEdge, captures: &CaptureContext) -> bool {
        if let Some(expected) = self.could_not_resolve {
            if matches!(edge.target, Target::Unresolved(_)) != expected {
                return false;
            }
        }
        if let Some(expected) = self.core_module {
            let core = edge.target.module().map_or(false, |id| graph.module(id).core);
            if core != expected {
                return false;
            }
        }
        if !self.dependency_types.is_empty()
            && !edge
                .dependency_types
                .iter()
                .any(|t| self.dependency_types.contains(t))
        {
            return false;
        }
        self.path.matches(graph.target_path(edge), Some(captures))
    }
}

/// What a rule checks.
#[derive(Debug, Clone)]
pub enum RuleKind {
    /// Every matching edge is a violation.
    ForbiddenLink {
        /// Source selector.
        from: PathSelector,
        /// Target constraints.
        to: LinkTarget,
    },
    /// Edges from a matching source must be admitted by some allowed rule.
    AllowedLinkOnly {
        /// Source selector.
        from: PathSelector,
        /// Target constraints.
        to: LinkTarget,
    },
    /// Every matching source needs at least one matching edge.
    RequiredLink {
        /// Source selector.
        from: PathSelector,
        /// Target constraints.
        to: LinkTarget,
    },
    /// Circular edges between matching modules.
    NoCircular {
        /// Source selector.
        from: PathSelector,
        /// Target selector.
        to: PathSelector,
    },
    /// Matching modules without edges in either direction.
    NoOrphans {
        /// Module selector.
        from: PathSelector,
    },
    /// Transitive (un)reachability between matching modules.
    Reachability {
        /// Source selector.
        from: PathSelector,
        /// Target selector.
        to: PathSelector,
        /// `true`: a target must be reachable. `false`: none may be.
        reachable: bool,
        /// Constraints on intermediate modules.
        via: ViaConstraint,
    },
    /// A host-supplied check.
    Custom(CustomCheck),
}

impl RuleKind {
    /// Canonical kind name.
    pub fn label(&self) -> &'static str {
        match self {
            RuleKind::ForbiddenLink { .. } => "forbidden-link",
            RuleKind::AllowedLinkOnly { .. } => "allowed-link-only",
            RuleKind::RequiredLink { .. } => "required-link",
            RuleKind::NoCircular { .. } => "no-circular",
            RuleKind::NoOrphans { .. } => "no-orphans",
            RuleKind::Reachability { .. } => "reachability",
            RuleKind::Custom(_) => "custom",
        }
    }
}

/// A compiled rule.
#[derive(Debug, Clone)]
pub struct Rule {
    /// Unique name within the rule set.
    pub name: String,
    /// Severity of its violations.
    pub severity: Severity,
    /// Free text copied onto violations.
    pub comment: Option<String>,
    /// The check itself.
    pub kind: RuleKind,
}

impl Rule {
    /// Reference carried by violations and annotations.
    pub fn rule_ref(&self) -> RuleRef {
        RuleRef {
            name: self.name.clone(),
            severity: self.severity,
        }
    }

    /// Rules with severity `ignore` are loaded but never evaluated.
    pub fn is_active(&self) -> bool {
        self.severity != Severity::Ignore
    }
}

/// A validated, immutable rule set.
#[derive(Debug, Clone)]
pub struct CompiledRuleSet {
    rules: Vec<Rule>,
    fingerprint: String,
}

impl CompiledRuleSet {
    /// Compile a raw rule set, resolving custom checks in `registry`.
    pub fn compile(raw: &RawRuleSet, registry: &CustomRuleRegistry) -> Result<Self, LoadError> {
        let rules = load::compile_rules(raw, registry)?;
        Ok(Self {
            rules,
            fingerprint: canonical_hash_hex(raw),
        })
    }

    /// Parse and compile a JSON rule-set document.
    pub fn from_json(json: &str, registry: &CustomRuleRegistry) -> Result<Self, LoadError> {
        let raw = RawRuleSet::from_json(json)?;
        Self::compile(&raw, registry)
    }

    /// An empty rule set.
    pub fn empty() -> Self {
        Self {
            rules: Vec::new(),
            fingerprint: canonical_hash_hex(&RawRuleSet::default()),
        }
    }

    /// Rules in declaration order.
    pub fn rules(&self) -> &[Rule] {
        &self.rules
    }

    /// Rules that are evaluated.
    pub fn active(&self) -> impl Iterator<Item = &Rule> {
        self.rules.iter().filter(|r| r.is_active())
    }

    /// Look up a rule by name.
    pub fn get(&self, name: &str) -> Option<&Rule> {
        self.rules.iter().find(|r| r.name == name)
    }

    /// Hex xxh64 of the raw rule set.
    pub fn fingerprint(&self) -> &str {
        &self.fingerprint
    }

    /// Number of rules.
    pub fn len(&self) -> usize {
        self.rules.len()
    }

    /// True if there are no rules.
    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }
}
