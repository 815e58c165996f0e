//! Module graph and the structural analyses run over it.
//!
//! ```text
//! Vec<RawModule> → ModuleGraph (arena) → GraphProperties (orphans, SCCs)
//!                                      ↘ ReachabilityOracle (BFS, memoized)
//! ```

pub mod arena;
pub mod properties;
pub mod reachability;

pub use arena::{DependencyEdge, GraphError, ModuleGraph, ModuleId, ModuleNode, Target};
pub use properties::GraphProperties;
pub use reachability::{ReachOutcome, ReachabilityOracle, ViaConstraint, Witness};
