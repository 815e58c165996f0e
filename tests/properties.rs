//! Property tests over random module graphs.

use proptest::prelude::*;

use cruise_kernel::{
    validate, CompiledRuleSet, CustomRuleRegistry, GraphProperties, ModuleGraph, RawModule,
    RawRule, RawRuleSet, RawTo, Target, ValidationConfig,
};

/// Up to 10 modules with random edges between them.
fn arb_graph() -> impl Strategy<Value = (usize, Vec<(usize, usize)>)> {
    (1usize..10).prop_flat_map(|n| (Just(n), prop::collection::vec((0..n, 0..n), 0..30)))
}

fn name(i: usize) -> String {
    format!("src/m{i}.js")
}

fn raw_modules(n: usize, edges: &[(usize, usize)]) -> Vec<RawModule> {
    (0..n)
        .map(|i| {
            edges
                .iter()
                .filter(|(from, _)| *from == i)
                .fold(RawModule::new(name(i)), |m, (_, to)| m.depends_on(name(*to)))
        })
        .collect()
}

/// reach[a][b]: a path of length >= 1 leads from a to b.
fn closure(n: usize, edges: &[(usize, usize)]) -> Vec<Vec<bool>> {
    let mut reach = vec![vec![false; n]; n];
    for &(a, b) in edges {
        reach[a][b] = true;
    }
    for k in 0..n {
        for i in 0..n {
            if reach[i][k] {
                for j in 0..n {
                    if reach[k][j] {
                        reach[i][j] = true;
                    }
                }
            }
        }
    }
    reach
}

fn rule_set() -> CompiledRuleSet {
    CompiledRuleSet::compile(
        &RawRuleSet::new(vec![
            RawRule::new("no-circular").named("no-cycles"),
            RawRule::new("no-orphans").named("no-orphans"),
            RawRule::new("forbidden-link").named("no-m0").to_path("m0\\.js$"),
            RawRule::new("reachability")
                .named("m1-not-to-m2")
                .from_path("m1\\.js$")
                .to(RawTo {
                    path: Some("m2\\.js$".into()),
                    reachable: Some(false),
                    ..RawTo::default()
                }),
        ]),
        &CustomRuleRegistry::new(),
    )
    .unwrap()
}

proptest! {
    #[test]
    fn prop_violations_ignore_input_order((n, edges) in arb_graph()) {
        let rules = rule_set();
        let forward = ModuleGraph::from_raw(raw_modules(n, &edges)).unwrap();

        let mut shuffled = raw_modules(n, &edges);
        shuffled.reverse();
        for m in &mut shuffled {
            m.dependencies.reverse();
        }
        let backward = ModuleGraph::from_raw(shuffled).unwrap();

        let a = validate(&forward, &rules, &ValidationConfig::default());
        let b = validate(&backward, &rules, &ValidationConfig::sequential());
        prop_assert_eq!(a.violations, b.violations);
    }

    #[test]
    fn prop_circular_flags_match_closure((n, edges) in arb_graph()) {
        let graph = ModuleGraph::from_raw(raw_modules(n, &edges)).unwrap();
        let props = GraphProperties::derive(&graph);
        let reach = closure(n, &edges);
        let index_of = |path: &str| (0..n).find(|i| name(*i) == path).unwrap();

        for (i, edge) in graph.edges().iter().enumerate() {
            let Target::Module(target) = edge.target else { continue };
            let u = index_of(graph.path(edge.source));
            let v = index_of(graph.path(target));

            let in_cycle = (0..n).any(|w| w != u && reach[u][w] && reach[w][u]);
            let expected = if u == v { in_cycle } else { reach[v][u] };
            prop_assert_eq!(props.is_circular(i), expected, "edge {} -> {}", u, v);
        }
    }

    #[test]
    fn prop_cycle_paths_follow_edges((n, edges) in arb_graph()) {
        let graph = ModuleGraph::from_raw(raw_modules(n, &edges)).unwrap();
        let props = GraphProperties::derive(&graph);

        for (i, edge) in graph.edges().iter().enumerate() {
            let Target::Module(target) = edge.target else { continue };
            let cycle = props.cycle_path(&graph, edge.source, target);
            prop_assert_eq!(cycle.is_empty(), !props.is_circular(i));
            if cycle.is_empty() {
                continue;
            }

            prop_assert_eq!(cycle[0].as_str(), graph.path(edge.source));
            for (k, from) in cycle.iter().enumerate() {
                let to = &cycle[(k + 1) % cycle.len()];
                let from_id = graph.id_of(from).unwrap();
                let to_id = graph.id_of(to).unwrap();
                prop_assert!(graph.successors(from_id).contains(&to_id), "{} -> {} is not an edge", from, to);
            }
        }
    }

    #[test]
    fn prop_one_violation_per_orphan((n, edges) in arb_graph()) {
        let graph = ModuleGraph::from_raw(raw_modules(n, &edges)).unwrap();
        let report = validate(&graph, &rule_set(), &ValidationConfig::default());

        let orphans: Vec<String> = (0..n)
            .filter(|i| !edges.iter().any(|(a, b)| a == i || b == i))
            .map(name)
            .collect();
        let mut reported: Vec<String> = report
            .violations
            .iter()
            .filter(|v| v.rule.name == "no-orphans")
            .map(|v| v.from.clone())
            .collect();
        reported.sort();
        let mut expected = orphans;
        expected.sort();
        prop_assert_eq!(reported, expected);
    }
}
