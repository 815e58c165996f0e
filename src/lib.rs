//! # cruise-kernel
//!
//! Deterministic dependency-rule validation for module graphs.
//!
//! The kernel answers one question:
//!
//! > Given a resolved module graph and a rule set, which modules and
//! > dependencies break which rules?
//!
//! ## Core Contract
//!
//! 1. Derive structural properties of the graph (orphans, cycle membership,
//!    reachability under via constraints)
//! 2. Evaluate every rule against every module and dependency, producing a
//!    canonically ordered violation set
//! 3. Serve a previous result verbatim when the revision and options allow
//!    it, and persist fresh results atomically
//!
//! ## Architecture
//!
//! ```text
//! RawRuleSet ─► CompiledRuleSet ─┐
//!                                ├─► validate ─► annotate ─► ValidationResult
//! Vec<RawModule> ─► ModuleGraph ─┘        ▲
//!                        ├─► GraphProperties
//!                        └─► ReachabilityOracle
//!
//! Cruiser: cache verdict ─► (hit) cached result | (miss) pipeline above ─► write cache
//! ```
//!
//! ## Determinism Guarantees
//!
//! - Same graph + same rule set → identical violation list
//! - Module ids follow path order; edges follow (target, unresolved) order
//! - Violations are sorted by (rule name, from, to) and unique on that key
//! - Witness paths are shortest paths, ties broken by module id

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod cache;
pub mod canonical;
pub mod collapse;
pub mod config;
pub mod cruise;
pub mod granularity;
pub mod graph;
pub mod matcher;
pub mod rules;
pub mod telemetry;
pub mod types;

// Re-exports
pub use types::{
    CacheDocument, Change, ChangeType, CruiseOptions, DependencyResult, DependencyType,
    ModuleResult, OptionsUsed, RawDependency, RawFrom, RawModule, RawRule, RawRuleSet, RawTo,
    RawVia, ReporterOptions, RevisionData, RuleRef, Severity, SeverityCounts, Summary,
    ValidationResult, Violation, ViolationType,
};
pub use graph::{
    DependencyEdge, GraphError, GraphProperties, ModuleGraph, ModuleId, ReachabilityOracle, Target,
    ViaConstraint,
};
pub use matcher::{CaptureContext, PathMatcher, PathSelector};
pub use rules::{
    annotate, validate, CompiledRuleSet, CustomRule, CustomRuleRegistry, Finding, GraphView,
    LoadError, Rule, RuleKind, ValidationReport,
};
pub use cache::{can_serve, normalize_args, read_cache, write_cache, CacheVerdict, CacheWriteError};
pub use config::{MemoConfig, ValidationConfig};
pub use cruise::{CruiseError, CruiseOutcome, Cruiser, ModuleSource};
pub use granularity::{resolve_reporter_options, Granularity};
pub use collapse::collapse;
pub use canonical::{canonical_hash, canonical_hash_hex, to_canonical_bytes};
pub use telemetry::init_tracing;
