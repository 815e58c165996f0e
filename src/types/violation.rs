//! Violations produced by the rule engine.

use serde::{Deserialize, Serialize};
use std::cmp::Ordering;

use super::Severity;

/// Reference to the rule a violation came from.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct RuleRef {
    /// Rule name (unique within the rule set).
    pub name: String,
    /// Rule severity.
    pub severity: Severity,
}

/// Where a violation is anchored in the result.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ViolationType {
    /// A single dependency edge.
    Dependency,
    /// A module as a whole.
    Module,
    /// A dependency edge that is part of a cycle.
    Cycle,
    /// A reachability relation between two modules.
    Reachability,
}

impl ViolationType {
    /// Whether the violation is reported on an edge rather than on a module.
    pub fn is_edge_level(self) -> bool {
        matches!(self, Self::Dependency | Self::Cycle)
    }
}

/// A single rule violation. Immutable once produced.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Violation {
    /// Violated rule.
    pub rule: RuleRef,
    /// Anchor kind.
    #[serde(rename = "type")]
    pub violation_type: ViolationType,
    /// Source module.
    pub from: String,
    /// Target module, when the violation concerns a pair.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub to: Option<String>,
    /// Cycle members, rotated to start at `from`.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub cycle: Vec<String>,
    /// Witness path for reachability violations, `from` to `to` inclusive.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub via: Vec<String>,
    /// Rule rationale.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub comment: Option<String>,
}

impl Violation {
    /// Create a violation without path context.
    pub fn new(
        rule: RuleRef,
        violation_type: ViolationType,
        from: impl Into<String>,
        to: Option<String>,
    ) -> Self {
        Self {
            rule,
            violation_type,
            from: from.into(),
            to,
            cycle: Vec::new(),
            via: Vec::new(),
            comment: None,
        }
    }

    /// Builder: attach cycle members.
    pub fn with_cycle(mut self, cycle: Vec<String>) -> Self {
        self.cycle = cycle;
        self
    }

    /// Builder: attach a witness path.
    pub fn with_via(mut self, via: Vec<String>) -> Self {
        self.via = via;
        self
    }

    /// Builder: attach the rule's rationale.
    pub fn with_comment(mut self, comment: Option<String>) -> Self {
        self.comment = comment;
        self
    }

    /// Deduplication and sort key: (rule name, from, to).
    pub fn key(&self) -> (&str, &str, Option<&str>) {
        (&self.rule.name, &self.from, self.to.as_deref())
    }

    /// Severity of the violated rule.
    pub fn severity(&self) -> Severity {
        self.rule.severity
    }
}

/// Canonical ordering by (rule name, from, to); `to: None` sorts first.
pub fn canonical_order(a: &Violation, b: &Violation) -> Ordering {
    a.key().cmp(&b.key())
}

/// Violation counts per severity.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SeverityCounts {
    /// Error count.
    pub error: usize,
    /// Warning count.
    pub warn: usize,
    /// Info count.
    pub info: usize,
}

impl SeverityCounts {
    /// Count the severities of a violation list.
    pub fn tally(violations: &[Violation]) -> Self {
        let mut counts = Self::default();
        for v in violations {
            match v.severity() {
                Severity::Error => counts.error += 1,
                Severity::Warn => counts.warn += 1,
                Severity::Info => counts.info += 1,
                Severity::Ignore => {}
            }
        }
        counts
    }

    /// Total number of counted violations.
    pub fn total(&self) -> usize {
        self.error + self.warn + self.info
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn rule(name: &str, severity: Severity) -> RuleRef {
        RuleRef {
            name: name.to_string(),
            severity,
        }
    }

    #[test]
    fn test_canonical_order() {
        let a = Violation::new(rule("a", Severity::Warn), ViolationType::Module, "x", None);
        let b = Violation::new(rule("a", Severity::Warn), ViolationType::Dependency, "x", Some("y".into()));
        let c = Violation::new(rule("b", Severity::Error), ViolationType::Module, "a", None);

        let mut list = vec![c.clone(), b.clone(), a.clone()];
        list.sort_by(canonical_order);
        assert_eq!(list, vec![a, b, c]);
    }

    #[test]
    fn test_tally() {
        let list = vec![
            Violation::new(rule("a", Severity::Error), ViolationType::Module, "x", None),
            Violation::new(rule("b", Severity::Warn), ViolationType::Module, "x", None),
            Violation::new(rule("c", Severity::Warn), ViolationType::Module, "y", None),
        ];
        let counts = SeverityCounts::tally(&list);
        assert_eq!(counts, SeverityCounts { error: 1, warn: 2, info: 0 });
        assert_eq!(counts.total(), 3);
    }

    #[test]
    fn test_optional_fields_are_omitted() {
        let v = Violation::new(rule("no-orphans", Severity::Info), ViolationType::Module, "lonely.js", None);
        let json = serde_json::to_string(&v).unwrap();
        assert_eq!(
            json,
            r#"{"rule":{"name":"no-orphans","severity":"info"},"type":"module","from":"lonely.js"}"#
        );
    }
}
