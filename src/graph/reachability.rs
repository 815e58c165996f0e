//! Reachability oracle with via constraints.
//!
//! A query explores the graph breadth-first from a source module, visiting
//! successors in id order, so the witness path to each reached module is a
//! shortest one and is stable across runs. Modules that fail the via filter
//! are dead ends: they are reached, but not expanded. A module never counts
//! as reaching itself.
//!
//! BFS trees depend only on (source, via constraint), not on the target
//! pattern, so they are memoized per run under that key.

use lru::LruCache;
use parking_lot::Mutex;
use std::collections::VecDeque;
use std::num::NonZeroUsize;
use std::sync::Arc;

use super::arena::{ModuleGraph, ModuleId};
use crate::canonical::canonical_hash;
use crate::config::MemoConfig;
use crate::matcher::PathMatcher;

const NO_PARENT: u32 = u32::MAX;

/// Include/exclude constraints on intermediate modules.
#[derive(Debug, Clone, Default)]
pub struct ViaConstraint {
    include: Vec<PathMatcher>,
    exclude: Vec<PathMatcher>,
    signature: u64,
}

impl ViaConstraint {
    /// Build a constraint. An empty include list admits every module.
    pub fn new(include: Vec<PathMatcher>, exclude: Vec<PathMatcher>) -> Self {
        let sources: (Vec<&str>, Vec<&str>) = (
            include.iter().map(PathMatcher::as_str).collect(),
            exclude.iter().map(PathMatcher::as_str).collect(),
        );
        let signature = canonical_hash(&sources);
        Self {
            include,
            exclude,
            signature,
        }
    }

    /// No constraints at all.
    pub fn unconstrained() -> Self {
        Self::new(Vec::new(), Vec::new())
    }

    /// Whether a reached module may be expanded further.
    pub fn admits(&self, path: &str) -> bool {
        if self.exclude.iter().any(|m| m.test(path, None)) {
            return false;
        }
        self.include.is_empty() || self.include.iter().any(|m| m.test(path, None))
    }

    /// Stable hash of the pattern sources, used as memo key.
    pub fn signature(&self) -> u64 {
        self.signature
    }
}

/// Breadth-first tree rooted at one source.
#[derive(Debug)]
struct ReachTree {
    source: ModuleId,
    parent: Vec<u32>,
    reached: Vec<ModuleId>,
}

impl ReachTree {
    fn is_reached(&self, id: ModuleId) -> bool {
        id != self.source && self.parent[id.index()] != NO_PARENT
    }

    fn path_to(&self, target: ModuleId) -> Vec<ModuleId> {
        let mut path = vec![target];
        let mut current = target;
        while current != self.source {
            current = ModuleId::from_index(self.parent[current.index()] as usize);
            path.push(current);
        }
        path.reverse();
        path
    }
}

/// A reached target together with its shortest witness path.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Witness {
    /// Reached module.
    pub target: ModuleId,
    /// Path from the source to `target`, both inclusive.
    pub path: Vec<ModuleId>,
}

/// Result of a reachability query.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ReachOutcome {
    /// Reached targets in id order.
    pub witnesses: Vec<Witness>,
}

impl ReachOutcome {
    /// Whether any target was reached.
    pub fn is_reachable(&self) -> bool {
        !self.witnesses.is_empty()
    }
}

/// Path-finding over one graph snapshot. Create one per validation run.
pub struct ReachabilityOracle<'g> {
    graph: &'g ModuleGraph,
    memo: Option<Mutex<LruCache<(ModuleId, u64), Arc<ReachTree>>>>,
}

impl<'g> ReachabilityOracle<'g> {
    /// Create an oracle; memoization follows `config`.
    pub fn new(graph: &'g ModuleGraph, config: &MemoConfig) -> Self {
        let memo = if config.enabled {
            NonZeroUsize::new(config.max_entries).map(|size| Mutex::new(LruCache::new(size)))
        } else {
            None
        };
        Self { graph, memo }
    }

    /// All modules reached from `source` under `via` for which `is_target`
    /// holds, each with a shortest witness path.
    pub fn query(
        &self,
        source: ModuleId,
        via: &ViaConstraint,
        is_target: impl Fn(ModuleId) -> bool,
    ) -> ReachOutcome {
        let tree = self.tree(source, via);
        let mut targets: Vec<ModuleId> = tree
            .reached
            .iter()
            .copied()
            .filter(|id| is_target(*id))
            .collect();
        targets.sort();

        ReachOutcome {
            witnesses: targets
                .into_iter()
                .map(|target| Witness {
                    target,
                    path: tree.path_to(target),
                })
                .collect(),
        }
    }

    /// Shortest witness path from `from` to `to`, if `to` is reachable.
    pub fn path_between(&self, from: ModuleId, to: ModuleId, via: &ViaConstraint) -> Option<Vec<ModuleId>> {
        let tree = self.tree(from, via);
        tree.is_reached(to).then(|| tree.path_to(to))
    }

    fn tree(&self, source: ModuleId, via: &ViaConstraint) -> Arc<ReachTree> {
        let key = (source, via.signature());
        if let Some(memo) = &self.memo {
            if let Some(tree) = memo.lock().get(&key) {
                return Arc::clone(tree);
            }
        }

        let tree = Arc::new(self.explore(source, via));
        if let Some(memo) = &self.memo {
            memo.lock().put(key, Arc::clone(&tree));
        }
        tree
    }

    fn explore(&self, source: ModuleId, via: &ViaConstraint) -> ReachTree {
        let n = self.graph.len();
        let mut parent = vec![NO_PARENT; n];
        let mut seen = vec![false; n];
        let mut reached = Vec::new();
        let mut queue = VecDeque::new();

        seen[source.index()] = true;
        queue.push_back(source);

        while let Some(u) = queue.pop_front() {
            for &w in self.graph.successors(u) {
                if seen[w.index()] {
                    continue;
                }
                seen[w.index()] = true;
                parent[w.index()] = u.index() as u32;
                reached.push(w);
                if via.admits(self.graph.path(w)) {
                    queue.push_back(w);
                }
            }
        }

        ReachTree {
            source,
            parent,
            reached,
        }
    }
}
