//! Reporter option resolution per graph granularity.
//!
//! Each granularity has its own entry in `optionsUsed.reporterOptions`;
//! missing settings fall back to the module-level (`dot`) entry. The custom
//! granularity also falls back to a default collapse pattern that folds
//! modules into their top-level package or source folder.

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::types::{OptionsUsed, ReporterOptions};

/// Collapse pattern used by [`Granularity::Custom`] when none is configured.
pub const DEFAULT_CUSTOM_COLLAPSE: &str = "^(node_modules|packages|src|lib|app|test|spec)/[^/]+";

/// Level of detail a graph is rendered at.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Granularity {
    /// One node per module.
    Module,
    /// One node per folder.
    Folder,
    /// Nodes folded by a collapse pattern.
    Custom,
    /// One level, no clustering.
    Flat,
}

impl Granularity {
    /// Key of this granularity in `reporterOptions`.
    pub fn reporter_key(self) -> &'static str {
        match self {
            Granularity::Module => "dot",
            Granularity::Folder => "ddot",
            Granularity::Custom => "archi",
            Granularity::Flat => "flat",
        }
    }

    /// Parse from the lowercase name.
    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "module" => Some(Self::Module),
            "folder" => Some(Self::Folder),
            "custom" => Some(Self::Custom),
            "flat" => Some(Self::Flat),
            _ => None,
        }
    }

    fn fallback_collapse(self) -> Option<&'static str> {
        match self {
            Granularity::Custom => Some(DEFAULT_CUSTOM_COLLAPSE),
            _ => None,
        }
    }
}

impl fmt::Display for Granularity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Granularity::Module => "module",
            Granularity::Folder => "folder",
            Granularity::Custom => "custom",
            Granularity::Flat => "flat",
        };
        f.write_str(name)
    }
}

/// Effective reporter options for `granularity`.
///
/// Settings given in `explicit` win. Otherwise each setting comes from the
/// granularity's entry in `used`, or the `dot` entry when that entry is
/// absent or lacks it. The collapse pattern never falls back to `dot`; it
/// falls back to the granularity default instead.
pub fn resolve_reporter_options(
    granularity: Granularity,
    explicit: Option<&ReporterOptions>,
    used: &OptionsUsed,
) -> ReporterOptions {
    let dot = used.reporter_options.get(Granularity::Module.reporter_key());
    let own = used
        .reporter_options
        .get(granularity.reporter_key())
        .or(dot);
    let explicit = explicit.cloned().unwrap_or_default();

    let pick = |field: fn(&ReporterOptions) -> Option<&serde_json::Value>| {
        field(&explicit)
            .or_else(|| own.and_then(field))
            .or_else(|| dot.and_then(field))
            .cloned()
    };

    ReporterOptions {
        theme: pick(|o| o.theme.as_ref()),
        filters: pick(|o| o.filters.as_ref()),
        collapse_pattern: explicit
            .collapse_pattern
            .clone()
            .or_else(|| own.and_then(|o| o.collapse_pattern.clone()))
            .or_else(|| granularity.fallback_collapse().map(str::to_string)),
    }
}
