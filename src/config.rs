//! Engine configuration.
//!
//! ## Environment
//!
//! - `CRUISE_PARALLEL`: `0`, `false`, `no` or `off` evaluates rules on the
//!   calling thread (default: parallel)
//! - `CRUISE_REACH_MEMO_ENTRIES`: bound on memoized reachability trees per
//!   run; `0` disables memoization (default: 4096)

/// Bounds for the per-run reachability memo.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MemoConfig {
    /// Maximum number of memoized BFS trees.
    pub max_entries: usize,
    /// Whether to memoize at all.
    pub enabled: bool,
}

impl Default for MemoConfig {
    fn default() -> Self {
        Self {
            max_entries: 4096,
            enabled: true,
        }
    }
}

/// Validation engine configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidationConfig {
    /// Evaluate independent rules on the rayon pool.
    pub parallel: bool,
    /// Reachability memo bounds.
    pub reach_memo: MemoConfig,
}

impl Default for ValidationConfig {
    fn default() -> Self {
        Self {
            parallel: true,
            reach_memo: MemoConfig::default(),
        }
    }
}

impl ValidationConfig {
    /// Single-threaded evaluation with default memo bounds.
    pub fn sequential() -> Self {
        Self {
            parallel: false,
            ..Self::default()
        }
    }

    /// Read overrides from the process environment.
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let mut config = Self::default();

        if let Some(value) = lookup("CRUISE_PARALLEL") {
            config.parallel = !matches!(
                value.trim().to_ascii_lowercase().as_str(),
                "0" | "false" | "no" | "off"
            );
        }

        if let Some(value) = lookup("CRUISE_REACH_MEMO_ENTRIES") {
            match value.trim().parse::<usize>() {
                Ok(0) => config.reach_memo.enabled = false,
                Ok(n) => config.reach_memo.max_entries = n,
                Err(_) => tracing::warn!(
                    value = %value,
                    "ignoring non-numeric CRUISE_REACH_MEMO_ENTRIES"
                ),
            }
        }

        config
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup(vars: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn test_defaults_without_env() {
        assert_eq!(ValidationConfig::from_lookup(lookup(&[])), ValidationConfig::default());
    }

    #[test]
    fn test_env_overrides() {
        let config = ValidationConfig::from_lookup(lookup(&[
            ("CRUISE_PARALLEL", "off"),
            ("CRUISE_REACH_MEMO_ENTRIES", "16"),
        ]));
        assert!(!config.parallel);
        assert_eq!(config.reach_memo.max_entries, 16);
        assert!(config.reach_memo.enabled);
    }

    #[test]
    fn test_zero_memo_disables() {
        let config = ValidationConfig::from_lookup(lookup(&[("CRUISE_REACH_MEMO_ENTRIES", "0")]));
        assert!(!config.reach_memo.enabled);
    }

    #[test]
    fn test_bad_number_keeps_default() {
        let config = ValidationConfig::from_lookup(lookup(&[("CRUISE_REACH_MEMO_ENTRIES", "lots")]));
        assert_eq!(config.reach_memo, MemoConfig::default());
    }
}
