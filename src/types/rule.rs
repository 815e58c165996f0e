//! Rule-set records as delivered by the configuration collaborator.
//!
//! The raw shapes are kept verbatim in `summary.ruleSetUsed`, so they must
//! round-trip through JSON unchanged. Validation of their contents happens
//! in [`crate::rules::load`].

use serde::{Deserialize, Serialize};
use std::fmt;

/// Severity of a rule and of the violations it produces.
///
/// Ordered from least to most severe so `max()` yields the worst one.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    /// Rule is loaded but never evaluated.
    Ignore,
    /// Informational.
    Info,
    /// Warning.
    Warn,
    /// Error; callers typically fail the build on it.
    Error,
}

impl Severity {
    /// Parse severity from its wire name.
    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "ignore" => Some(Self::Ignore),
            "info" => Some(Self::Info),
            "warn" => Some(Self::Warn),
            "error" => Some(Self::Error),
            _ => None,
        }
    }
}

impl Default for Severity {
    fn default() -> Self {
        Self::Warn
    }
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Ignore => write!(f, "ignore"),
            Self::Info => write!(f, "info"),
            Self::Warn => write!(f, "warn"),
            Self::Error => write!(f, "error"),
        }
    }
}

/// Path constraints on the "from" side of a rule.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RawFrom {
    /// Pattern the module path must match.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub path: Option<String>,
    /// Pattern the module path must not match.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub path_not: Option<String>,
}

/// Via constraints for reachability rules.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RawVia {
    /// Intermediate modules must match at least one of these (if any).
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub include: Vec<String>,
    /// Intermediate modules matching any of these are dead ends.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub exclude: Vec<String>,
}

/// Constraints on the "to" side of a rule.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RawTo {
    /// Pattern the target path must match. May reference "from" groups as `$1`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub path: Option<String>,
    /// Pattern the target path must not match.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub path_not: Option<String>,
    /// Only match unresolved (true) or resolved (false) targets.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub could_not_resolve: Option<bool>,
    /// Only match core (true) or non-core (false) targets.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub core_module: Option<bool>,
    /// Only match edges carrying one of these dependency types.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub dependency_types: Vec<super::DependencyType>,
    /// Expected reachability polarity (reachability rules only).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reachable: Option<bool>,
    /// Path constraints for reachability (reachability rules only).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub via: Option<RawVia>,
}

/// One rule entry. `kind` and `severity` stay strings here so that unknown
/// values can be reported against the rule's name at load time.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RawRule {
    /// Unique name; a positional default is assigned when absent.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    /// Rule kind, e.g. `forbidden-link` or `no-circular`.
    pub kind: String,
    /// `error`, `warn`, `info` or `ignore` (default `warn`).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub severity: Option<String>,
    /// Rationale shown with every violation.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub comment: Option<String>,
    /// Module selector.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub from: Option<RawFrom>,
    /// Dependency/target selector.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub to: Option<RawTo>,
    /// Registered check name (custom rules only).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub check: Option<String>,
}

impl RawRule {
    /// Create a rule of the given kind with default severity.
    pub fn new(kind: impl Into<String>) -> Self {
        Self {
            kind: kind.into(),
            ..Default::default()
        }
    }

    /// Builder: set the name.
    pub fn named(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    /// Builder: set the severity.
    pub fn severity(mut self, severity: Severity) -> Self {
        self.severity = Some(severity.to_string());
        self
    }

    /// Builder: set the "from" path pattern.
    pub fn from_path(mut self, pattern: impl Into<String>) -> Self {
        self.from.get_or_insert_with(RawFrom::default).path = Some(pattern.into());
        self
    }

    /// Builder: set the "to" path pattern.
    pub fn to_path(mut self, pattern: impl Into<String>) -> Self {
        self.to.get_or_insert_with(RawTo::default).path = Some(pattern.into());
        self
    }

    /// Builder: replace the whole "to" selector.
    pub fn to(mut self, to: RawTo) -> Self {
        self.to = Some(to);
        self
    }
}

/// An ordered rule set.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RawRuleSet {
    /// Rules in evaluation order.
    #[serde(default)]
    pub rules: Vec<RawRule>,
}

impl RawRuleSet {
    /// Create a rule set from rules.
    pub fn new(rules: Vec<RawRule>) -> Self {
        Self { rules }
    }

    /// Parse a rule set from JSON.
    pub fn from_json(json: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(json)
    }
}
