//! Rule evaluation.
//!
//! Each active rule is one task; all `allowed-link-only` rules together
//! form a single task, since an edge violates only when no allowed rule
//! admits it. Tasks read the graph, its derived properties and a shared
//! reachability oracle, and never write shared state except the oracle's
//! memo. The merged violation list is sorted by (rule, from, to) and
//! deduplicated on that key.

use rayon::prelude::*;
use tracing::{debug, info};

use super::custom::GraphView;
use super::{CompiledRuleSet, LinkTarget, Rule, RuleKind};
use crate::config::ValidationConfig;
use crate::graph::{DependencyEdge, GraphProperties, ModuleGraph, ModuleId, ReachabilityOracle, ViaConstraint};
use crate::matcher::{CaptureContext, PathSelector};
use crate::types::{canonical_order, Severity, SeverityCounts, Violation, ViolationType};

/// Outcome of validating one graph against one rule set.
#[derive(Debug, Clone)]
pub struct ValidationReport {
    /// Orphan and cycle information the rules were evaluated against.
    pub properties: GraphProperties,
    /// Violations in canonical order, unique per (rule, from, to).
    pub violations: Vec<Violation>,
    /// Violation counts per severity.
    pub severity_counts: SeverityCounts,
    /// Highest severity among the violations.
    pub worst_severity: Option<Severity>,
}

impl ValidationReport {
    /// True when nothing at `error` severity was found.
    pub fn passes(&self) -> bool {
        self.severity_counts.error == 0
    }
}

/// Validate `graph` against `rules`.
pub fn validate(graph: &ModuleGraph, rules: &CompiledRuleSet, config: &ValidationConfig) -> ValidationReport {
    let properties = GraphProperties::derive(graph);
    let engine = RuleEngine {
        graph,
        properties: &properties,
        oracle: ReachabilityOracle::new(graph, &config.reach_memo),
    };

    let tasks = plan(rules);
    let batches: Vec<Vec<Violation>> = if config.parallel {
        tasks.par_iter().map(|task| engine.run(task)).collect()
    } else {
        tasks.iter().map(|task| engine.run(task)).collect()
    };

    let mut violations: Vec<Violation> = batches.into_iter().flatten().collect();
    violations.sort_by(canonical_order);
    violations.dedup_by(|later, earlier| later.key() == earlier.key());

    let severity_counts = SeverityCounts::tally(&violations);
    let worst_severity = violations.iter().map(Violation::severity).max();

    info!(
        modules = graph.len(),
        rules = rules.len(),
        violations = violations.len(),
        errors = severity_counts.error,
        warnings = severity_counts.warn,
        "validation complete"
    );

    ValidationReport {
        properties,
        violations,
        severity_counts,
        worst_severity,
    }
}

enum Task<'r> {
    Single(&'r Rule),
    Allowed(Vec<&'r Rule>),
}

/// One task per active rule, with the allowed rules folded into one task
/// at the position of the first of them.
fn plan(rules: &CompiledRuleSet) -> Vec<Task<'_>> {
    let mut tasks = Vec::new();
    let mut allowed_at = None;
    let mut allowed = Vec::new();

    for rule in rules.active() {
        if matches!(rule.kind, RuleKind::AllowedLinkOnly { .. }) {
            allowed_at.get_or_insert(tasks.len());
            allowed.push(rule);
        } else {
            tasks.push(Task::Single(rule));
        }
    }

    if let Some(at) = allowed_at {
        tasks.insert(at, Task::Allowed(allowed));
    }
    tasks
}

struct RuleEngine<'a> {
    graph: &'a ModuleGraph,
    properties: &'a GraphProperties,
    oracle: ReachabilityOracle<'a>,
}

impl RuleEngine<'_> {
    fn run(&self, task: &Task<'_>) -> Vec<Violation> {
        let (label, violations) = match task {
            Task::Allowed(rules) => ("allowed-link-only", self.allowed(rules)),
            Task::Single(rule) => {
                let violations = match &rule.kind {
                    RuleKind::ForbiddenLink { from, to } => self.forbidden(rule, from, to),
                    RuleKind::RequiredLink { from, to } => self.required(rule, from, to),
                    RuleKind::NoCircular { from, to } => self.no_circular(rule, from, to),
                    RuleKind::NoOrphans { from } => self.no_orphans(rule, from),
                    RuleKind::Reachability {
                        from,
                        to,
                        reachable,
                        via,
                    } => self.reachability(rule, from, to, *reachable, via),
                    RuleKind::Custom(check) => {
                        let view = GraphView::new(self.graph, self.properties);
                        check
                            .evaluate(&view)
                            .into_iter()
                            .map(|finding| {
                                let vtype = if finding.to.is_some() {
                                    ViolationType::Dependency
                                } else {
                                    ViolationType::Module
                                };
                                Violation::new(rule.rule_ref(), vtype, finding.from, finding.to)
                                    .with_comment(rule.comment.clone())
                            })
                            .collect()
                    }
                    RuleKind::AllowedLinkOnly { .. } => self.allowed(&[*rule]),
                };
                (rule.name.as_str(), violations)
            }
        };
        debug!(rule = label, violations = violations.len(), "evaluated rule");
        violations
    }

    /// Modules selected by `from`, with their captures.
    fn selected<'s>(&'s self, from: &'s PathSelector) -> impl Iterator<Item = (ModuleId, CaptureContext)> + 's {
        self.graph
            .ids()
            .filter_map(move |id| from.select(self.graph.path(id)).map(|ctx| (id, ctx)))
    }

    fn edge_violation(&self, rule: &Rule, source: ModuleId, edge: &DependencyEdge) -> Violation {
        Violation::new(
            rule.rule_ref(),
            ViolationType::Dependency,
            self.graph.path(source),
            Some(self.graph.target_path(edge).to_string()),
        )
        .with_comment(rule.comment.clone())
    }

    fn module_violation(&self, rule: &Rule, vtype: ViolationType, id: ModuleId, to: Option<String>) -> Violation {
        Violation::new(rule.rule_ref(), vtype, self.graph.path(id), to).with_comment(rule.comment.clone())
    }

    fn forbidden(&self, rule: &Rule, from: &PathSelector, to: &LinkTarget) -> Vec<Violation> {
        let mut out = Vec::new();
        for (id, ctx) in self.selected(from) {
            for edge in self.graph.outgoing(id) {
                if to.admits(self.graph, edge, &ctx) {
                    out.push(self.edge_violation(rule, id, edge));
                }
            }
        }
        out
    }

    /// An edge from a module selected by at least one allowed rule violates
    /// when none of the selecting rules admits it. It is reported against
    /// the first selecting rule in declaration order.
    fn allowed(&self, rules: &[&Rule]) -> Vec<Violation> {
        let mut out = Vec::new();
        for id in self.graph.ids() {
            let path = self.graph.path(id);
            let selecting: Vec<(&Rule, &LinkTarget, CaptureContext)> = rules
                .iter()
                .filter_map(|rule| match &rule.kind {
                    RuleKind::AllowedLinkOnly { from, to } => from.select(path).map(|ctx| (*rule, to, ctx)),
                    _ => None,
                })
                .collect();
            let Some((first, _, _)) = selecting.first() else {
                continue;
            };

            for edge in self.graph.outgoing(id) {
                if !selecting.iter().any(|(_, to, ctx)| to.admits(self.graph, edge, ctx)) {
                    out.push(self.edge_violation(first, id, edge));
                }
            }
        }
        out
    }

    fn required(&self, rule: &Rule, from: &PathSelector, to: &LinkTarget) -> Vec<Violation> {
        self.selected(from)
            .filter(|(id, ctx)| {
                !self
                    .graph
                    .outgoing(*id)
                    .iter()
                    .any(|edge| to.admits(self.graph, edge, ctx))
            })
            .map(|(id, _)| self.module_violation(rule, ViolationType::Module, id, None))
            .collect()
    }

    fn no_circular(&self, rule: &Rule, from: &PathSelector, to: &PathSelector) -> Vec<Violation> {
        let mut out = Vec::new();
        for (id, ctx) in self.selected(from) {
            for index in self.graph.outgoing_range(id) {
                if !self.properties.is_circular(index) {
                    continue;
                }
                let edge = &self.graph.edges()[index];
                let Some(target_id) = edge.target.module() else {
                    continue;
                };
                let target = self.graph.target_path(edge);
                if to.matches(target, Some(&ctx)) {
                    out.push(
                        Violation::new(rule.rule_ref(), ViolationType::Cycle, self.graph.path(id), Some(target.to_string()))
                            .with_cycle(self.properties.cycle_path(self.graph, id, target_id))
                            .with_comment(rule.comment.clone()),
                    );
                }
            }
        }
        out
    }

    fn no_orphans(&self, rule: &Rule, from: &PathSelector) -> Vec<Violation> {
        self.selected(from)
            .filter(|(id, _)| self.properties.is_orphan(*id))
            .map(|(id, _)| self.module_violation(rule, ViolationType::Module, id, None))
            .collect()
    }

    fn reachability(
        &self,
        rule: &Rule,
        from: &PathSelector,
        to: &PathSelector,
        reachable: bool,
        via: &ViaConstraint,
    ) -> Vec<Violation> {
        let mut out = Vec::new();
        for (id, ctx) in self.selected(from) {
            let outcome = self
                .oracle
                .query(id, via, |target| to.matches(self.graph.path(target), Some(&ctx)));

            if reachable {
                if !outcome.is_reachable() {
                    out.push(self.module_violation(rule, ViolationType::Reachability, id, None));
                }
                continue;
            }

            for witness in outcome.witnesses {
                let via_path = witness.path.iter().map(|m| self.graph.path(*m).to_string()).collect();
                out.push(
                    self.module_violation(
                        rule,
                        ViolationType::Reachability,
                        id,
                        Some(self.graph.path(witness.target).to_string()),
                    )
                    .with_via(via_path),
                );
            }
        }
        out
    }
}
