//! Attach violations to the modules and dependencies they concern.
//!
//! Dependency and cycle violations land on the edge `from -> to` when that
//! edge exists; everything else lands on the `from` module. A location is
//! valid when nothing landed on it.

use std::collections::BTreeMap;

use super::engine::ValidationReport;
use crate::graph::{ModuleGraph, Target};
use crate::types::{DependencyResult, ModuleResult, RuleRef, Summary, ValidationResult};

/// Build the annotated result for `graph` from `report`.
pub fn annotate(graph: &ModuleGraph, report: &ValidationReport) -> ValidationResult {
    let mut on_modules: BTreeMap<&str, Vec<RuleRef>> = BTreeMap::new();
    let mut on_edges: BTreeMap<(&str, &str), Vec<RuleRef>> = BTreeMap::new();

    for violation in &report.violations {
        match violation.to.as_deref() {
            Some(to) if violation.violation_type.is_edge_level() && graph.has_edge(&violation.from, to) => {
                on_edges
                    .entry((violation.from.as_str(), to))
                    .or_default()
                    .push(violation.rule.clone());
            }
            _ => on_modules
                .entry(violation.from.as_str())
                .or_default()
                .push(violation.rule.clone()),
        }
    }

    let properties = &report.properties;
    let mut total_dependencies = 0;

    let modules = graph
        .ids()
        .map(|id| {
            let node = graph.module(id);
            let dependencies: Vec<DependencyResult> = graph
                .outgoing_range(id)
                .map(|index| {
                    let edge = &graph.edges()[index];
                    let resolved = graph.target_path(edge);
                    let rules = dedup(on_edges.remove(&(node.path.as_str(), resolved)));
                    let circular = properties.is_circular(index);
                    DependencyResult {
                        resolved: resolved.to_string(),
                        dependency_types: edge.dependency_types.clone(),
                        could_not_resolve: matches!(edge.target, Target::Unresolved(_)),
                        core_module: edge.target.module().map_or(false, |t| graph.module(t).core),
                        circular,
                        cycle: match edge.target.module() {
                            Some(target) if circular => properties.cycle_path(graph, id, target),
                            _ => Vec::new(),
                        },
                        valid: rules.is_empty(),
                        rules,
                    }
                })
                .collect();
            total_dependencies += dependencies.len();

            let rules = dedup(on_modules.remove(node.path.as_str()));
            ModuleResult {
                source: node.path.clone(),
                orphan: properties.is_orphan(id),
                core_module: node.core,
                could_not_resolve: node.could_not_resolve,
                consolidated: false,
                valid: rules.is_empty(),
                rules,
                dependencies,
            }
        })
        .collect();

    // Custom checks may name modules outside the graph.
    if !on_modules.is_empty() {
        tracing::debug!(
            unknown = on_modules.len(),
            "violations reference modules absent from the graph"
        );
    }

    ValidationResult {
        modules,
        summary: Summary {
            violations: report.violations.clone(),
            severity_counts: report.severity_counts,
            worst_severity: report.worst_severity,
            total_cruised: graph.len(),
            total_dependencies_cruised: total_dependencies,
            options_used: None,
            rule_set_used: None,
        },
    }
}

fn dedup(rules: Option<Vec<RuleRef>>) -> Vec<RuleRef> {
    let mut rules = rules.unwrap_or_default();
    rules.sort();
    rules.dedup();
    rules
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ValidationConfig;
    use crate::rules::{validate, CompiledRuleSet, CustomRuleRegistry};
    use crate::types::{RawModule, RawRule, RawRuleSet, RawTo, Severity};

    fn result(modules: Vec<RawModule>, rules: Vec<RawRule>) -> ValidationResult {
        let graph = ModuleGraph::from_raw(modules).unwrap();
        let set = CompiledRuleSet::compile(&RawRuleSet::new(rules), &CustomRuleRegistry::new()).unwrap();
        let report = validate(&graph, &set, &ValidationConfig::sequential());
        annotate(&graph, &report)
    }

    #[test]
    fn test_edge_and_module_annotations() {
        let res = result(
            vec![
                RawModule::new("a.js").depends_on("b.js"),
                RawModule::new("b.js"),
                RawModule::new("o.js"),
            ],
            vec![
                RawRule::new("forbidden-link").named("no-b").severity(Severity::Error).to_path("^b"),
                RawRule::new("no-orphans").named("no-orphans"),
            ],
        );

        let a = res.module("a.js").unwrap();
        assert!(a.valid);
        assert!(!a.dependencies[0].valid);
        assert_eq!(a.dependencies[0].rules[0].name, "no-b");

        let o = res.module("o.js").unwrap();
        assert!(o.orphan);
        assert!(!o.valid);
        assert_eq!(o.rules[0].name, "no-orphans");

        assert_eq!(res.summary.total_cruised, 3);
        assert_eq!(res.summary.total_dependencies_cruised, 1);
        assert!(!res.passes());
    }

    #[test]
    fn test_circular_dependencies_carry_cycle() {
        let res = result(
            vec![
                RawModule::new("a.js").depends_on("b.js"),
                RawModule::new("b.js").depends_on("a.js"),
            ],
            vec![],
        );
        let b = res.module("b.js").unwrap();
        assert!(b.dependencies[0].circular);
        assert_eq!(b.dependencies[0].cycle, vec!["b.js", "a.js"]);
        assert!(b.dependencies[0].valid);
        assert!(res.passes());
    }

    #[test]
    fn test_reachability_lands_on_module() {
        let res = result(
            vec![
                RawModule::new("a.js").depends_on("b.js"),
                RawModule::new("b.js").depends_on("c.js"),
                RawModule::new("c.js"),
            ],
            vec![RawRule::new("reachability").named("no-a-to-c").from_path("^a").to(RawTo {
                path: Some("^c".into()),
                reachable: Some(false),
                ..RawTo::default()
            })],
        );
        let a = res.module("a.js").unwrap();
        assert!(!a.valid);
        assert!(a.dependencies.iter().all(|d| d.valid));
    }
}
