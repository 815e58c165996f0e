//! Data model shared by the graph, rule and cache layers.

pub mod module;
pub mod rule;
pub mod violation;
pub mod revision;
pub mod options;
pub mod result;

pub use module::{DependencyType, RawDependency, RawModule};
pub use rule::{RawFrom, RawRule, RawRuleSet, RawTo, RawVia, Severity};
pub use violation::{canonical_order, RuleRef, SeverityCounts, Violation, ViolationType};
pub use revision::{Change, ChangeType, RevisionData};
pub use options::{CruiseOptions, OptionsUsed, ReporterOptions};
pub use result::{CacheDocument, DependencyResult, ModuleResult, Summary, ValidationResult};
