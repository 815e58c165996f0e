//! Module records as delivered by the resolution collaborator.
//!
//! These are the raw, serde-facing shapes. The validation core never works
//! on them directly; they are indexed into a [`crate::graph::ModuleGraph`]
//! first.

use serde::{Deserialize, Serialize};
use std::fmt;

/// How a dependency was resolved.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum DependencyType {
    /// Relative or project-local import.
    Local,
    /// Production package dependency.
    Npm,
    /// Development-only package dependency.
    NpmDev,
    /// Peer package dependency.
    NpmPeer,
    /// Optional package dependency.
    NpmOptional,
    /// Runtime built-in module.
    Core,
    /// Import resolved through a path alias.
    Aliased,
    /// Anything the resolver could not classify.
    #[serde(other)]
    Unknown,
}

impl DependencyType {
    /// Parse a dependency type from its wire name.
    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "local" => Some(Self::Local),
            "npm" => Some(Self::Npm),
            "npm-dev" => Some(Self::NpmDev),
            "npm-peer" => Some(Self::NpmPeer),
            "npm-optional" => Some(Self::NpmOptional),
            "core" => Some(Self::Core),
            "aliased" => Some(Self::Aliased),
            "unknown" => Some(Self::Unknown),
            _ => None,
        }
    }
}

impl fmt::Display for DependencyType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Local => "local",
            Self::Npm => "npm",
            Self::NpmDev => "npm-dev",
            Self::NpmPeer => "npm-peer",
            Self::NpmOptional => "npm-optional",
            Self::Core => "core",
            Self::Aliased => "aliased",
            Self::Unknown => "unknown",
        };
        f.write_str(name)
    }
}

/// One outgoing reference of a [`RawModule`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RawDependency {
    /// Resolved target path, or the raw specifier when unresolved.
    pub resolved: String,
    /// Dependency type tags.
    #[serde(default)]
    pub dependency_types: Vec<DependencyType>,
    /// Set when the resolver gave up on this reference.
    #[serde(default)]
    pub could_not_resolve: bool,
}

impl RawDependency {
    /// A resolved local dependency.
    pub fn local(resolved: impl Into<String>) -> Self {
        Self {
            resolved: resolved.into(),
            dependency_types: vec![DependencyType::Local],
            could_not_resolve: false,
        }
    }

    /// A dependency the resolver could not resolve.
    pub fn unresolved(specifier: impl Into<String>) -> Self {
        Self {
            resolved: specifier.into(),
            dependency_types: vec![DependencyType::Unknown],
            could_not_resolve: true,
        }
    }
}

/// A module record: unique path plus its outgoing dependencies.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RawModule {
    /// Normalized, forward-slash path. Unique per graph.
    pub source: String,
    /// Outgoing dependencies.
    #[serde(default)]
    pub dependencies: Vec<RawDependency>,
    /// Runtime built-in (e.g. `fs`).
    #[serde(default)]
    pub core_module: bool,
    /// The module itself could not be resolved.
    #[serde(default)]
    pub could_not_resolve: bool,
}

impl RawModule {
    /// Create a module without dependencies.
    pub fn new(source: impl Into<String>) -> Self {
        Self {
            source: source.into(),
            dependencies: Vec::new(),
            core_module: false,
            could_not_resolve: false,
        }
    }

    /// Builder: add a resolved local dependency.
    pub fn depends_on(mut self, resolved: impl Into<String>) -> Self {
        self.dependencies.push(RawDependency::local(resolved));
        self
    }

    /// Builder: add an arbitrary dependency.
    pub fn with_dependency(mut self, dependency: RawDependency) -> Self {
        self.dependencies.push(dependency);
        self
    }

    /// Builder: mark as a core module.
    pub fn core(mut self) -> Self {
        self.core_module = true;
        self
    }
}
