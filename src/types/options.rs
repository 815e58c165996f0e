//! Invocation options and the subset persisted with a result.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::PathBuf;

use super::RawRuleSet;

/// Per-reporter settings. Opaque to the validation core apart from the
/// collapse pattern, which granularity resolution falls back on.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReporterOptions {
    /// Renderer theme.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub theme: Option<serde_json::Value>,
    /// Pattern used to fold modules before rendering.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub collapse_pattern: Option<String>,
    /// Renderer-side filters.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub filters: Option<serde_json::Value>,
}

/// Options of one invocation.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct CruiseOptions {
    /// Path-selection arguments, space separated. Normalized with
    /// [`crate::cache::normalize_args`] when recorded.
    pub args: String,
    /// Cache folder; caching is off when absent.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cache: Option<PathBuf>,
    /// Collapse pattern applied to the result after validation.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub collapse: Option<String>,
    /// Skip the cache lookup (the result is still written).
    pub bust_the_cache: bool,
    /// Reporter options keyed by reporter name (`dot`, `ddot`, `archi`, `flat`).
    #[serde(skip_serializing_if = "BTreeMap::is_empty")]
    pub reporter_options: BTreeMap<String, ReporterOptions>,
    /// Rule set to validate against.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub rule_set: Option<RawRuleSet>,
}

impl CruiseOptions {
    /// Options for the given normalized arguments.
    pub fn new(args: impl Into<String>) -> Self {
        Self {
            args: args.into(),
            ..Default::default()
        }
    }

    /// Builder: enable caching in `folder`.
    pub fn with_cache(mut self, folder: impl Into<PathBuf>) -> Self {
        self.cache = Some(folder.into());
        self
    }

    /// Builder: set the rule set.
    pub fn with_rule_set(mut self, rule_set: RawRuleSet) -> Self {
        self.rule_set = Some(rule_set);
        self
    }

    /// Builder: set a collapse pattern.
    pub fn with_collapse(mut self, pattern: impl Into<String>) -> Self {
        self.collapse = Some(pattern.into());
        self
    }

    /// Builder: bypass the cache lookup.
    pub fn busting_cache(mut self) -> Self {
        self.bust_the_cache = true;
        self
    }

    /// The options that shape a result and therefore decide cache compatibility.
    pub fn options_used(&self) -> OptionsUsed {
        OptionsUsed {
            args: crate::cache::normalize_args(self.args.split_whitespace()),
            collapse: self.collapse.clone(),
            reporter_options: self.reporter_options.clone(),
        }
    }
}

/// Options persisted in `summary.optionsUsed`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct OptionsUsed {
    /// Normalized path-selection arguments.
    pub args: String,
    /// Collapse pattern, if one was applied.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub collapse: Option<String>,
    /// Reporter options.
    #[serde(skip_serializing_if = "BTreeMap::is_empty")]
    pub reporter_options: BTreeMap<String, ReporterOptions>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_options_used_excludes_invocation_only_fields() {
        let options = CruiseOptions::new("src test")
            .with_cache("node_modules/.cache")
            .busting_cache();
        let used = options.options_used();

        assert_eq!(used.args, "src test");
        assert_eq!(serde_json::to_string(&used).unwrap(), r#"{"args":"src test"}"#);
    }

    #[test]
    fn test_options_used_parses_minimal_document() {
        let used: OptionsUsed = serde_json::from_str(r#"{"args":"src test tools"}"#).unwrap();
        assert_eq!(used, CruiseOptions::new("src test tools").options_used());
    }

    #[test]
    fn test_options_used_normalizes_args() {
        assert_eq!(CruiseOptions::new("src\\ui/  test/").options_used().args, "src/ui test");
    }
}
