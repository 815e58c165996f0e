//! Structural properties derived once per run: orphan status, strongly
//! connected components and circular edges.
//!
//! ## Determinism
//!
//! Tarjan's algorithm runs iteratively over module ids (lexicographic path
//! order) and visits successors in id order. Components are then numbered by
//! their smallest member, so SCC ids and membership do not depend on the
//! order in which the collaborator listed modules or edges. Cycle paths are
//! shortest paths back to an edge's source, found the same way.

use std::collections::{BTreeMap, VecDeque};

use super::arena::{ModuleGraph, ModuleId, Target};

const UNVISITED: usize = usize::MAX;

/// Derived per-module and per-edge flags.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct GraphProperties {
    orphan: Vec<bool>,
    scc_of: Vec<Option<usize>>,
    sccs: Vec<Vec<ModuleId>>,
    circular: Vec<bool>,
}

impl GraphProperties {
    /// Derive properties for `graph` in O(V + E).
    pub fn derive(graph: &ModuleGraph) -> Self {
        let orphan = graph
            .ids()
            .map(|id| graph.outgoing(id).is_empty() && graph.incoming_count(id) == 0)
            .collect();

        let mut sccs = strongly_connected(graph);
        sccs.retain(|c| c.len() > 1);
        for members in &mut sccs {
            members.sort();
        }
        sccs.sort_by_key(|members| members[0]);

        let mut scc_of = vec![None; graph.len()];
        for (scc, members) in sccs.iter().enumerate() {
            for m in members {
                scc_of[m.index()] = Some(scc);
            }
        }

        let circular = graph
            .edges()
            .iter()
            .map(|edge| match edge.target {
                Target::Module(t) => {
                    let s = scc_of[edge.source.index()];
                    s.is_some() && s == scc_of[t.index()]
                }
                Target::Unresolved(_) => false,
            })
            .collect();

        tracing::debug!(
            modules = graph.len(),
            edges = graph.edges().len(),
            cycles = sccs.len(),
            "derived graph properties"
        );

        Self {
            orphan,
            scc_of,
            sccs,
            circular,
        }
    }

    /// No incoming and no outgoing edges.
    pub fn is_orphan(&self, id: ModuleId) -> bool {
        self.orphan[id.index()]
    }

    /// SCC id of `id`, only for components with more than one member.
    pub fn scc(&self, id: ModuleId) -> Option<usize> {
        self.scc_of[id.index()]
    }

    /// All cycles, each sorted, numbered by smallest member.
    pub fn cycles(&self) -> &[Vec<ModuleId>] {
        &self.sccs
    }

    /// Whether edge `edge_index` (into [`ModuleGraph::edges`]) is circular.
    pub fn is_circular(&self, edge_index: usize) -> bool {
        self.circular[edge_index]
    }

    /// The cycle closed by the edge `source -> target`: `source`, then the
    /// shortest path from `target` back to `source` inside their SCC.
    ///
    /// BFS visits successors in id order, so the path is deterministic.
    /// Empty when the edge is not circular.
    pub fn cycle_path(&self, graph: &ModuleGraph, source: ModuleId, target: ModuleId) -> Vec<String> {
        let Some(scc) = self.scc(source) else {
            return Vec::new();
        };
        if self.scc(target) != Some(scc) {
            return Vec::new();
        }
        if source == target {
            return vec![graph.path(source).to_string()];
        }

        let mut parent: BTreeMap<ModuleId, ModuleId> = BTreeMap::new();
        parent.insert(target, target);
        let mut queue = VecDeque::from([target]);
        'search: while let Some(v) = queue.pop_front() {
            for &w in graph.successors(v) {
                if self.scc(w) != Some(scc) || parent.contains_key(&w) {
                    continue;
                }
                parent.insert(w, v);
                if w == source {
                    break 'search;
                }
                queue.push_back(w);
            }
        }

        let mut back = Vec::new();
        let mut current = source;
        while current != target {
            let Some(&previous) = parent.get(&current) else {
                return Vec::new();
            };
            back.push(previous);
            current = previous;
        }

        std::iter::once(source)
            .chain(back.into_iter().rev())
            .map(|m| graph.path(m).to_string())
            .collect()
    }
}

/// Iterative Tarjan. Returns every component, including singletons.
fn strongly_connected(graph: &ModuleGraph) -> Vec<Vec<ModuleId>> {
    let n = graph.len();
    let mut index = vec![UNVISITED; n];
    let mut lowlink = vec![0usize; n];
    let mut on_stack = vec![false; n];
    let mut stack: Vec<usize> = Vec::new();
    let mut next_index = 0usize;
    let mut components = Vec::new();

    // Explicit call stack of (node, position in its successor list).
    let mut call: Vec<(usize, usize)> = Vec::new();

    for root in 0..n {
        if index[root] != UNVISITED {
            continue;
        }
        index[root] = next_index;
        lowlink[root] = next_index;
        next_index += 1;
        stack.push(root);
        on_stack[root] = true;
        call.push((root, 0));

        while let Some(frame) = call.last_mut() {
            let v = frame.0;
            let succ = graph.successors(ModuleId::from_index(v));

            if frame.1 < succ.len() {
                let w = succ[frame.1].index();
                frame.1 += 1;

                if index[w] == UNVISITED {
                    index[w] = next_index;
                    lowlink[w] = next_index;
                    next_index += 1;
                    stack.push(w);
                    on_stack[w] = true;
                    call.push((w, 0));
                } else if on_stack[w] {
                    lowlink[v] = lowlink[v].min(index[w]);
                }
                continue;
            }

            call.pop();
            if let Some(&(parent, _)) = call.last() {
                lowlink[parent] = lowlink[parent].min(lowlink[v]);
            }

            if lowlink[v] == index[v] {
                let mut component = Vec::new();
                while let Some(w) = stack.pop() {
                    on_stack[w] = false;
                    component.push(ModuleId::from_index(w));
                    if w == v {
                        break;
                    }
                }
                components.push(component);
            }
        }
    }

    components
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{RawDependency, RawModule};

    fn graph(modules: Vec<RawModule>) -> ModuleGraph {
        ModuleGraph::from_raw(modules).unwrap()
    }

    #[test]
    fn test_orphans() {
        let g = graph(vec![
            RawModule::new("a.js").depends_on("b.js"),
            RawModule::new("b.js"),
            RawModule::new("lonely.js"),
            RawModule::new("dangling.js").with_dependency(RawDependency::unresolved("nope")),
        ]);
        let props = GraphProperties::derive(&g);

        let orphans: Vec<_> = g.ids().filter(|id| props.is_orphan(*id)).map(|id| g.path(id)).collect();
        assert_eq!(orphans, vec!["lonely.js"]);
    }

    #[test]
    fn test_cycle_detection_and_circular_edges() {
        // a -> b -> c -> a, c -> d, d has no way back
        let g = graph(vec![
            RawModule::new("a.js").depends_on("b.js"),
            RawModule::new("b.js").depends_on("c.js"),
            RawModule::new("c.js").depends_on("a.js").depends_on("d.js"),
            RawModule::new("d.js"),
        ]);
        let props = GraphProperties::derive(&g);

        assert_eq!(props.cycles().len(), 1);
        assert_eq!(props.cycles()[0].len(), 3);

        for (i, edge) in g.edges().iter().enumerate() {
            let to = g.target_path(edge);
            assert_eq!(props.is_circular(i), to != "d.js", "edge to {to}");
        }
        assert!(props.scc(g.id_of("d.js").unwrap()).is_none());
    }

    #[test]
    fn test_self_loop_is_not_a_cycle() {
        let g = graph(vec![RawModule::new("a.js").depends_on("a.js")]);
        let props = GraphProperties::derive(&g);

        assert!(props.cycles().is_empty());
        assert!(!props.is_circular(0));
        assert!(!props.is_orphan(g.id_of("a.js").unwrap()));
    }

    #[test]
    fn test_cycle_path_rotation() {
        let g = graph(vec![
            RawModule::new("a.js").depends_on("b.js"),
            RawModule::new("b.js").depends_on("c.js"),
            RawModule::new("c.js").depends_on("a.js"),
        ]);
        let props = GraphProperties::derive(&g);
        let id = |p: &str| g.id_of(p).unwrap();

        assert_eq!(props.cycle_path(&g, id("b.js"), id("c.js")), vec!["b.js", "c.js", "a.js"]);
        assert_eq!(props.cycle_path(&g, id("a.js"), id("b.js")), vec!["a.js", "b.js", "c.js"]);
    }

    #[test]
    fn test_cycle_path_follows_edges() {
        // a -> c -> b -> a: path order differs from edge order.
        let g = graph(vec![
            RawModule::new("a.js").depends_on("c.js"),
            RawModule::new("c.js").depends_on("b.js"),
            RawModule::new("b.js").depends_on("a.js"),
        ]);
        let props = GraphProperties::derive(&g);
        let id = |p: &str| g.id_of(p).unwrap();

        let cycle = props.cycle_path(&g, id("a.js"), id("c.js"));
        assert_eq!(cycle, vec!["a.js", "c.js", "b.js"]);
        for (i, from) in cycle.iter().enumerate() {
            let to = &cycle[(i + 1) % cycle.len()];
            assert!(g.successors(id(from)).contains(&id(to)), "{from} -> {to} is not an edge");
        }
    }

    #[test]
    fn test_cycle_path_takes_shortest_way_back() {
        // a -> b, b -> a, b -> c, c -> a: the edge a -> b closes a 2-cycle.
        let g = graph(vec![
            RawModule::new("a.js").depends_on("b.js"),
            RawModule::new("b.js").depends_on("c.js").depends_on("a.js"),
            RawModule::new("c.js").depends_on("a.js"),
        ]);
        let props = GraphProperties::derive(&g);
        let id = |p: &str| g.id_of(p).unwrap();

        assert_eq!(props.cycle_path(&g, id("a.js"), id("b.js")), vec!["a.js", "b.js"]);
        assert_eq!(props.cycle_path(&g, id("c.js"), id("a.js")), vec!["c.js", "a.js", "b.js"]);
        assert_eq!(props.cycle_path(&g, id("a.js"), id("a.js")), vec!["a.js"]);
    }

    #[test]
    fn test_scc_ids_independent_of_input_order() {
        let forward = vec![
            RawModule::new("x/1.js").depends_on("x/2.js"),
            RawModule::new("x/2.js").depends_on("x/1.js"),
            RawModule::new("a/1.js").depends_on("a/2.js"),
            RawModule::new("a/2.js").depends_on("a/1.js"),
        ];
        let mut reversed = forward.clone();
        reversed.reverse();

        let p1 = GraphProperties::derive(&graph(forward));
        let p2 = GraphProperties::derive(&graph(reversed));
        assert_eq!(p1, p2);
        // Component containing "a/1.js" is numbered first.
        assert_eq!(p1.scc(ModuleId::from_index(0)), Some(0));
    }

    #[test]
    fn test_long_chain_does_not_overflow() {
        let n = 50_000;
        let mut modules: Vec<_> = (0..n)
            .map(|i| RawModule::new(format!("m{i:06}.js")).depends_on(format!("m{:06}.js", (i + 1) % n)))
            .collect();
        modules.push(RawModule::new("z.js"));
        let g = graph(modules);
        let props = GraphProperties::derive(&g);

        assert_eq!(props.cycles().len(), 1);
        assert_eq!(props.cycles()[0].len(), n);
    }
}
