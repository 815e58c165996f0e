//! Arena-indexed module graph.
//!
//! Modules get a [`ModuleId`] equal to their position in lexicographic path
//! order, so iterating ids is the canonical traversal order. Edges are
//! `(source, Target)` index pairs, grouped per source and sorted by target
//! path.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::ops::Range;

use crate::types::{DependencyType, RawModule};

/// Errors raised when the collaborator's module list is inconsistent.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum GraphError {
    /// Two records share a path.
    #[error("Duplicate module id: {0}")]
    DuplicateModule(String),
    /// An edge points at a path that is neither a module nor marked unresolved.
    #[error("Dependency {from} -> {to} references an undeclared module")]
    UndeclaredTarget {
        /// Source module.
        from: String,
        /// Undeclared target.
        to: String,
    },
}

/// Stable index of a module in a [`ModuleGraph`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct ModuleId(u32);

impl ModuleId {
    /// Position in the arena.
    pub fn index(self) -> usize {
        self.0 as usize
    }

    pub(crate) fn from_index(index: usize) -> Self {
        Self(index as u32)
    }
}

impl fmt::Display for ModuleId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// Target of a dependency edge.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Target {
    /// A declared module.
    Module(ModuleId),
    /// The unresolved sentinel, carrying the raw specifier.
    Unresolved(String),
}

impl Target {
    /// The module id, if resolved.
    pub fn module(&self) -> Option<ModuleId> {
        match self {
            Self::Module(id) => Some(*id),
            Self::Unresolved(_) => None,
        }
    }
}

/// A module node.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ModuleNode {
    /// Normalized path.
    pub path: String,
    /// Runtime built-in.
    pub core: bool,
    /// The module itself could not be resolved.
    pub could_not_resolve: bool,
}

impl ModuleNode {
    /// File extension including the dot, if any.
    pub fn extension(&self) -> Option<&str> {
        let file = self.path.rsplit('/').next().unwrap_or(&self.path);
        file.rfind('.').filter(|&i| i > 0).map(|i| &file[i..])
    }
}

/// A dependency edge.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DependencyEdge {
    /// Source module.
    pub source: ModuleId,
    /// Target module or the unresolved sentinel.
    pub target: Target,
    /// Union of the dependency types of all raw references merged into this edge.
    pub dependency_types: Vec<DependencyType>,
}

/// Immutable module graph snapshot.
#[derive(Debug, Clone, Default)]
pub struct ModuleGraph {
    modules: Vec<ModuleNode>,
    index: BTreeMap<String, ModuleId>,
    edges: Vec<DependencyEdge>,
    outgoing: Vec<Range<usize>>,
    successors: Vec<Vec<ModuleId>>,
    incoming: Vec<usize>,
}

impl ModuleGraph {
    /// Build the arena from the collaborator's module records.
    ///
    /// Fails fast on duplicate paths and on edges to undeclared modules;
    /// dropping such an edge would hide a real structural problem.
    pub fn from_raw(raw: Vec<RawModule>) -> Result<Self, GraphError> {
        let mut sorted = raw;
        sorted.sort_by(|a, b| a.source.cmp(&b.source));

        let mut index = BTreeMap::new();
        let mut modules = Vec::with_capacity(sorted.len());
        for (i, m) in sorted.iter().enumerate() {
            if index.insert(m.source.clone(), ModuleId::from_index(i)).is_some() {
                return Err(GraphError::DuplicateModule(m.source.clone()));
            }
            modules.push(ModuleNode {
                path: m.source.clone(),
                core: m.core_module,
                could_not_resolve: m.could_not_resolve,
            });
        }

        let mut edges = Vec::new();
        let mut outgoing = Vec::with_capacity(sorted.len());
        let mut successors = Vec::with_capacity(sorted.len());
        let mut incoming = vec![0usize; sorted.len()];

        for (i, m) in sorted.iter().enumerate() {
            let source = ModuleId::from_index(i);

            // Keyed by target path so edges come out in lexicographic order;
            // repeated references to the same target merge into one edge.
            let mut merged: BTreeMap<(&str, bool), (Target, Vec<DependencyType>)> = BTreeMap::new();
            for dep in &m.dependencies {
                let target = if dep.could_not_resolve {
                    Target::Unresolved(dep.resolved.clone())
                } else {
                    match index.get(&dep.resolved) {
                        Some(id) => Target::Module(*id),
                        None => {
                            return Err(GraphError::UndeclaredTarget {
                                from: m.source.clone(),
                                to: dep.resolved.clone(),
                            })
                        }
                    }
                };
                let entry = merged
                    .entry((dep.resolved.as_str(), dep.could_not_resolve))
                    .or_insert_with(|| (target, Vec::new()));
                entry.1.extend(dep.dependency_types.iter().copied());
            }

            let start = edges.len();
            let mut succ = Vec::new();
            for (_, (target, mut types)) in merged {
                types.sort();
                types.dedup();
                if let Target::Module(t) = target {
                    incoming[t.index()] += 1;
                    succ.push(t);
                }
                edges.push(DependencyEdge {
                    source,
                    target,
                    dependency_types: types,
                });
            }
            succ.sort();
            succ.dedup();

            outgoing.push(start..edges.len());
            successors.push(succ);
        }

        Ok(Self {
            modules,
            index,
            edges,
            outgoing,
            successors,
            incoming,
        })
    }

    /// Number of modules.
    pub fn len(&self) -> usize {
        self.modules.len()
    }

    /// True when the graph has no modules.
    pub fn is_empty(&self) -> bool {
        self.modules.is_empty()
    }

    /// All module ids in lexicographic path order.
    pub fn ids(&self) -> impl Iterator<Item = ModuleId> + '_ {
        (0..self.modules.len()).map(ModuleId::from_index)
    }

    /// Module node by id.
    pub fn module(&self, id: ModuleId) -> &ModuleNode {
        &self.modules[id.index()]
    }

    /// Module path by id.
    pub fn path(&self, id: ModuleId) -> &str {
        &self.modules[id.index()].path
    }

    /// Id of the module at `path`.
    pub fn id_of(&self, path: &str) -> Option<ModuleId> {
        self.index.get(path).copied()
    }

    /// All edges, grouped by source in id order.
    pub fn edges(&self) -> &[DependencyEdge] {
        &self.edges
    }

    /// Indices (into [`Self::edges`]) of the outgoing edges of `id`.
    pub fn outgoing_range(&self, id: ModuleId) -> Range<usize> {
        self.outgoing[id.index()].clone()
    }

    /// Outgoing edges of `id`, sorted by target path.
    pub fn outgoing(&self, id: ModuleId) -> &[DependencyEdge] {
        &self.edges[self.outgoing_range(id)]
    }

    /// Distinct resolved successors of `id`, in id order.
    pub fn successors(&self, id: ModuleId) -> &[ModuleId] {
        &self.successors[id.index()]
    }

    /// Number of resolved edges pointing at `id`.
    pub fn incoming_count(&self, id: ModuleId) -> usize {
        self.incoming[id.index()]
    }

    /// Path of an edge target: module path, or the raw specifier.
    pub fn target_path<'a>(&'a self, edge: &'a DependencyEdge) -> &'a str {
        match &edge.target {
            Target::Module(id) => self.path(*id),
            Target::Unresolved(specifier) => specifier,
        }
    }

    /// Whether an edge `from -> to` exists between two module paths.
    pub fn has_edge(&self, from: &str, to: &str) -> bool {
        self.id_of(from)
            .map(|id| self.outgoing(id).iter().any(|e| self.target_path(e) == to))
            .unwrap_or(false)
    }
}
