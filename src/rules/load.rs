//! Rule-set loading: name resolution, kind and severity parsing, pattern
//! compilation. Every error names the offending rule.

use std::collections::BTreeSet;
use thiserror::Error;

use super::custom::CustomRuleRegistry;
use super::{LinkTarget, Rule, RuleKind};
use crate::graph::ViaConstraint;
use crate::matcher::{PathMatcher, PathSelector};
use crate::types::{RawFrom, RawRule, RawRuleSet, RawTo, Severity};

/// Errors raised while loading a rule set.
#[derive(Debug, Error)]
pub enum LoadError {
    /// The document is not a rule set.
    #[error("rule set parse error: {0}")]
    Parse(#[from] serde_json::Error),

    /// A pattern does not compile.
    #[error("rule '{rule}': invalid pattern in {field} '{pattern}': {source}")]
    InvalidPattern {
        /// Rule name.
        rule: String,
        /// Field path, e.g. `to.pathNot`.
        field: &'static str,
        /// The pattern as written.
        pattern: String,
        /// Compiler error.
        source: regex_lite::Error,
    },

    /// Kind is not one of the known rule kinds.
    #[error("rule '{rule}': unknown kind '{kind}'")]
    UnknownKind {
        /// Rule name, or its position when unnamed.
        rule: String,
        /// The kind as written.
        kind: String,
    },

    /// Severity is not one of error, warn, info, ignore.
    #[error("rule '{rule}': unknown severity '{severity}'")]
    UnknownSeverity {
        /// Rule name.
        rule: String,
        /// The severity as written.
        severity: String,
    },

    /// A field the kind requires is absent.
    #[error("rule '{rule}': {kind} rule requires '{field}'")]
    MissingField {
        /// Rule name.
        rule: String,
        /// Canonical kind name.
        kind: &'static str,
        /// Missing field.
        field: &'static str,
    },

    /// A custom rule names a check nobody registered.
    #[error("rule '{rule}': no custom check registered as '{check}'")]
    UnregisteredCheck {
        /// Rule name.
        rule: String,
        /// Check name.
        check: String,
    },

    /// Two rules share a name.
    #[error("duplicate rule name '{0}'")]
    DuplicateName(String),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum KindTag {
    ForbiddenLink,
    AllowedLinkOnly,
    RequiredLink,
    NoCircular,
    NoOrphans,
    Reachability,
    Custom,
}

impl KindTag {
    fn parse(kind: &str) -> Option<Self> {
        match kind {
            "forbidden-link" | "forbidden" => Some(Self::ForbiddenLink),
            "allowed-link-only" | "allowed" => Some(Self::AllowedLinkOnly),
            "required-link" | "required" => Some(Self::RequiredLink),
            "no-circular" => Some(Self::NoCircular),
            "no-orphans" => Some(Self::NoOrphans),
            "reachability" | "reachable" => Some(Self::Reachability),
            "custom" => Some(Self::Custom),
            _ => None,
        }
    }

    fn label(self) -> &'static str {
        match self {
            Self::ForbiddenLink => "forbidden-link",
            Self::AllowedLinkOnly => "allowed-link-only",
            Self::RequiredLink => "required-link",
            Self::NoCircular => "no-circular",
            Self::NoOrphans => "no-orphans",
            Self::Reachability => "reachability",
            Self::Custom => "custom",
        }
    }
}

/// Compile every rule, in declaration order.
pub(crate) fn compile_rules(raw: &RawRuleSet, registry: &CustomRuleRegistry) -> Result<Vec<Rule>, LoadError> {
    let mut names = BTreeSet::new();
    let mut rules = Vec::with_capacity(raw.rules.len());

    for (position, raw_rule) in raw.rules.iter().enumerate() {
        let rule = compile_rule(position, raw_rule, registry)?;
        if !names.insert(rule.name.clone()) {
            return Err(LoadError::DuplicateName(rule.name));
        }
        rules.push(rule);
    }

    tracing::debug!(rules = rules.len(), "compiled rule set");
    Ok(rules)
}

fn compile_rule(position: usize, raw: &RawRule, registry: &CustomRuleRegistry) -> Result<Rule, LoadError> {
    let Some(tag) = KindTag::parse(&raw.kind) else {
        return Err(LoadError::UnknownKind {
            rule: raw.name.clone().unwrap_or_else(|| format!("#{position}")),
            kind: raw.kind.clone(),
        });
    };

    let name = raw
        .name
        .clone()
        .unwrap_or_else(|| format!("{}-{}", tag.label(), position));

    let severity = match raw.severity.as_deref() {
        None => Severity::default(),
        Some(s) => Severity::parse(s).ok_or_else(|| LoadError::UnknownSeverity {
            rule: name.clone(),
            severity: s.to_string(),
        })?,
    };

    let from = from_selector(&name, raw.from.as_ref())?;

    let kind = match tag {
        KindTag::ForbiddenLink => RuleKind::ForbiddenLink {
            from,
            to: link_target(&name, required_to(&name, tag, raw)?)?,
        },
        KindTag::AllowedLinkOnly => RuleKind::AllowedLinkOnly {
            from,
            to: link_target(&name, required_to(&name, tag, raw)?)?,
        },
        KindTag::RequiredLink => RuleKind::RequiredLink {
            from,
            to: link_target(&name, required_to(&name, tag, raw)?)?,
        },
        KindTag::NoCircular => RuleKind::NoCircular {
            from,
            to: match &raw.to {
                Some(to) => to_selector(&name, to)?,
                None => PathSelector::any(),
            },
        },
        KindTag::NoOrphans => RuleKind::NoOrphans { from },
        KindTag::Reachability => {
            let to = required_to(&name, tag, raw)?;
            let reachable = to.reachable.ok_or_else(|| LoadError::MissingField {
                rule: name.clone(),
                kind: tag.label(),
                field: "to.reachable",
            })?;
            let via = match &to.via {
                Some(via) => ViaConstraint::new(
                    patterns(&name, "to.via.include", &via.include)?,
                    patterns(&name, "to.via.exclude", &via.exclude)?,
                ),
                None => ViaConstraint::unconstrained(),
            };
            RuleKind::Reachability {
                from,
                to: to_selector(&name, to)?,
                reachable,
                via,
            }
        }
        KindTag::Custom => {
            let check = raw.check.as_deref().ok_or_else(|| LoadError::MissingField {
                rule: name.clone(),
                kind: tag.label(),
                field: "check",
            })?;
            let check = registry
                .get(check)
                .ok_or_else(|| LoadError::UnregisteredCheck {
                    rule: name.clone(),
                    check: check.to_string(),
                })?;
            RuleKind::Custom(check.clone())
        }
    };

    Ok(Rule {
        name,
        severity,
        comment: raw.comment.clone(),
        kind,
    })
}

fn required_to<'r>(name: &str, tag: KindTag, raw: &'r RawRule) -> Result<&'r RawTo, LoadError> {
    raw.to.as_ref().ok_or_else(|| LoadError::MissingField {
        rule: name.to_string(),
        kind: tag.label(),
        field: "to",
    })
}

fn from_selector(rule: &str, from: Option<&RawFrom>) -> Result<PathSelector, LoadError> {
    let Some(from) = from else {
        return Ok(PathSelector::any());
    };
    Ok(PathSelector::new(
        pattern(rule, "from.path", from.path.as_deref())?,
        pattern(rule, "from.pathNot", from.path_not.as_deref())?,
    ))
}

fn to_selector(rule: &str, to: &RawTo) -> Result<PathSelector, LoadError> {
    Ok(PathSelector::new(
        pattern(rule, "to.path", to.path.as_deref())?,
        pattern(rule, "to.pathNot", to.path_not.as_deref())?,
    ))
}

fn link_target(rule: &str, to: &RawTo) -> Result<LinkTarget, LoadError> {
    Ok(LinkTarget {
        path: to_selector(rule, to)?,
        could_not_resolve: to.could_not_resolve,
        core_module: to.core_module,
        dependency_types: to.dependency_types.clone(),
    })
}

fn pattern(rule: &str, field: &'static str, pattern: Option<&str>) -> Result<Option<PathMatcher>, LoadError> {
    pattern.map(|p| compile_pattern(rule, field, p)).transpose()
}

fn patterns(rule: &str, field: &'static str, sources: &[String]) -> Result<Vec<PathMatcher>, LoadError> {
    sources.iter().map(|p| compile_pattern(rule, field, p)).collect()
}

fn compile_pattern(rule: &str, field: &'static str, pattern: &str) -> Result<PathMatcher, LoadError> {
    PathMatcher::compile(pattern).map_err(|source| LoadError::InvalidPattern {
        rule: rule.to_string(),
        field,
        pattern: pattern.to_string(),
        source,
    })
}
