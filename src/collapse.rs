//! Fold modules into coarser nodes after validation.
//!
//! Every module whose path matches the collapse pattern is renamed to the
//! matched text (typically a folder prefix such as `src/billing`), and all
//! modules sharing a name become one node. Dependencies are retargeted the
//! same way; edges that end up inside one node are dropped and parallel
//! edges are merged. The summary is left as it was.

use std::collections::BTreeMap;

use crate::matcher::PathMatcher;
use crate::types::{DependencyResult, ModuleResult, RuleRef, ValidationResult};

/// Collapse `result` with `pattern`.
pub fn collapse(result: ValidationResult, pattern: &PathMatcher) -> ValidationResult {
    let name_of = |path: &str| -> String {
        pattern
            .captures(path)
            .and_then(|ctx| ctx.group(0).filter(|m| !m.is_empty()).map(str::to_string))
            .unwrap_or_else(|| path.to_string())
    };

    let before = result.modules.len();
    let mut folded: BTreeMap<String, Folded> = BTreeMap::new();

    for module in result.modules {
        let name = name_of(&module.source);
        let renamed = name != module.source;
        let node = folded.entry(name.clone()).or_insert_with(|| Folded::new(&name));
        node.absorb(module, renamed, &name, &name_of);
    }

    let modules: Vec<ModuleResult> = folded.into_values().map(Folded::finish).collect();
    tracing::debug!(before, after = modules.len(), pattern = pattern.as_str(), "collapsed modules");

    ValidationResult {
        modules,
        summary: result.summary,
    }
}

struct Folded {
    module: ModuleResult,
    members: usize,
    dependencies: BTreeMap<String, DependencyResult>,
}

impl Folded {
    fn new(name: &str) -> Self {
        Self {
            module: ModuleResult {
                source: name.to_string(),
                orphan: true,
                core_module: false,
                could_not_resolve: false,
                consolidated: false,
                valid: true,
                rules: Vec::new(),
                dependencies: Vec::new(),
            },
            members: 0,
            dependencies: BTreeMap::new(),
        }
    }

    fn absorb(&mut self, member: ModuleResult, renamed: bool, name: &str, name_of: &impl Fn(&str) -> String) {
        self.members += 1;
        let m = &mut self.module;
        m.orphan &= member.orphan;
        m.core_module |= member.core_module;
        m.could_not_resolve |= member.could_not_resolve;
        m.consolidated |= renamed || member.consolidated || self.members > 1;
        m.valid &= member.valid;
        m.rules.extend(member.rules);

        for dep in member.dependencies {
            let target = name_of(&dep.resolved);
            if target == name {
                continue;
            }
            let cycle = fold_cycle(&dep.cycle, name_of);
            match self.dependencies.get_mut(&target) {
                Some(merged) => {
                    merged.dependency_types.extend(dep.dependency_types);
                    merged.could_not_resolve &= dep.could_not_resolve;
                    merged.core_module |= dep.core_module;
                    merged.valid &= dep.valid;
                    merged.rules.extend(dep.rules);
                    if dep.circular && !merged.circular {
                        merged.circular = true;
                        merged.cycle = cycle;
                    }
                }
                None => {
                    self.dependencies.insert(
                        target.clone(),
                        DependencyResult {
                            resolved: target,
                            cycle,
                            ..dep
                        },
                    );
                }
            }
        }
    }

    fn finish(mut self) -> ModuleResult {
        sort_rules(&mut self.module.rules);
        self.module.dependencies = self
            .dependencies
            .into_values()
            .map(|mut dep| {
                dep.dependency_types.sort();
                dep.dependency_types.dedup();
                sort_rules(&mut dep.rules);
                dep
            })
            .collect();
        self.module
    }
}

/// Rename cycle members and drop consecutive repeats, including the
/// wrap-around from last to first.
fn fold_cycle(cycle: &[String], name_of: &impl Fn(&str) -> String) -> Vec<String> {
    let mut folded: Vec<String> = cycle.iter().map(|m| name_of(m)).collect();
    folded.dedup();
    while folded.len() > 1 && folded.first() == folded.last() {
        folded.pop();
    }
    folded
}

fn sort_rules(rules: &mut Vec<RuleRef>) {
    rules.sort();
    rules.dedup();
}
