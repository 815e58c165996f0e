//! Performance benchmarks for rule validation.
//!
//! Run with: `cargo bench --bench validation`
//!
//! ## Performance Targets
//!
//! | Operation | Target | Notes |
//! |-----------|--------|-------|
//! | Graph properties | Linear in V + E | Iterative Tarjan |
//! | Full rule set, 10k modules | <250ms | Parallel rule evaluation |
//! | Reachability rule | Memo hit after first source | Per-run LRU |

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion, Throughput};

use cruise_kernel::{
    validate, CompiledRuleSet, CustomRuleRegistry, GraphProperties, ModuleGraph, RawModule,
    RawRule, RawRuleSet, RawTo, ValidationConfig,
};

/// A layered tree of `n` modules: each module imports the next two in its
/// package and the first module of the following package, with a back edge
/// every 97 modules so that cycles exist.
fn make_graph(n: usize) -> ModuleGraph {
    let per_package = 50;
    let path = |i: usize| format!("packages/p{}/src/m{}.js", i / per_package, i);

    let modules = (0..n)
        .map(|i| {
            let mut m = RawModule::new(path(i));
            for j in [i + 1, i + 2] {
                if j < n && j / per_package == i / per_package {
                    m = m.depends_on(path(j));
                }
            }
            let next_package = (i / per_package + 1) * per_package;
            if i % per_package == 0 && next_package < n {
                m = m.depends_on(path(next_package));
            }
            if i % 97 == 96 {
                m = m.depends_on(path(i - 40));
            }
            m
        })
        .collect();

    ModuleGraph::from_raw(modules).unwrap()
}

fn make_rules() -> CompiledRuleSet {
    CompiledRuleSet::compile(
        &RawRuleSet::new(vec![
            RawRule::new("no-circular").named("no-cycles"),
            RawRule::new("no-orphans").named("no-orphans"),
            RawRule::new("forbidden-link")
                .named("no-cross-package-src")
                .from_path("^packages/([^/]+)/")
                .to(RawTo {
                    path: Some("^packages/".into()),
                    path_not: Some("^packages/$1/".into()),
                    ..RawTo::default()
                }),
            RawRule::new("reachability")
                .named("p0-stays-local")
                .from_path("^packages/p0/")
                .to(RawTo {
                    path: Some("^packages/p9/".into()),
                    reachable: Some(false),
                    ..RawTo::default()
                }),
        ]),
        &CustomRuleRegistry::new(),
    )
    .unwrap()
}

fn bench_graph_properties(c: &mut Criterion) {
    let mut group = c.benchmark_group("graph_properties");

    for size in [1_000usize, 10_000] {
        let graph = make_graph(size);
        group.throughput(Throughput::Elements(size as u64));
        group.bench_with_input(BenchmarkId::from_parameter(size), &graph, |b, graph| {
            b.iter(|| GraphProperties::derive(black_box(graph)));
        });
    }

    group.finish();
}

fn bench_validation(c: &mut Criterion) {
    let rules = make_rules();
    let mut group = c.benchmark_group("validation");

    for size in [1_000usize, 10_000] {
        let graph = make_graph(size);
        group.throughput(Throughput::Elements(size as u64));

        group.bench_with_input(BenchmarkId::new("parallel", size), &graph, |b, graph| {
            b.iter(|| validate(black_box(graph), &rules, &ValidationConfig::default()));
        });
        group.bench_with_input(BenchmarkId::new("sequential", size), &graph, |b, graph| {
            b.iter(|| validate(black_box(graph), &rules, &ValidationConfig::sequential()));
        });
    }

    group.finish();
}

criterion_group!(benches, bench_graph_properties, bench_validation);
criterion_main!(benches);
