//! Custom rules: checks supplied by the host program rather than by the
//! rule-set document. A rule set refers to them by name (`"check"`), and
//! the name must be registered before the rule set is loaded.

use std::collections::BTreeMap;
use std::fmt;
use std::sync::Arc;

use crate::graph::{GraphProperties, ModuleGraph, ModuleId};

/// Read-only view handed to custom checks.
#[derive(Clone, Copy)]
pub struct GraphView<'a> {
    graph: &'a ModuleGraph,
    properties: &'a GraphProperties,
}

impl<'a> GraphView<'a> {
    pub(crate) fn new(graph: &'a ModuleGraph, properties: &'a GraphProperties) -> Self {
        Self { graph, properties }
    }

    /// The module graph.
    pub fn graph(&self) -> &'a ModuleGraph {
        self.graph
    }

    /// Derived orphan and cycle information.
    pub fn properties(&self) -> &'a GraphProperties {
        self.properties
    }

    /// Module ids with their paths, in path order.
    pub fn modules(&self) -> impl Iterator<Item = (ModuleId, &'a str)> + 'a {
        let graph = self.graph;
        graph.ids().map(move |id| (id, graph.path(id)))
    }

    /// Target paths of the outgoing edges of `id`.
    pub fn dependencies(&self, id: ModuleId) -> Vec<&'a str> {
        let graph = self.graph;
        graph.outgoing(id).iter().map(|e| graph.target_path(e)).collect()
    }
}

/// One finding of a custom check.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Finding {
    /// Offending module.
    pub from: String,
    /// Offending dependency target, when the finding concerns an edge.
    pub to: Option<String>,
}

impl Finding {
    /// A module-level finding.
    pub fn module(from: impl Into<String>) -> Self {
        Self {
            from: from.into(),
            to: None,
        }
    }

    /// An edge-level finding.
    pub fn dependency(from: impl Into<String>, to: impl Into<String>) -> Self {
        Self {
            from: from.into(),
            to: Some(to.into()),
        }
    }
}

/// A host-supplied structural check. Must be pure over the view.
pub trait CustomRule: Send + Sync {
    /// Inspect the graph and report findings.
    fn evaluate(&self, view: &GraphView<'_>) -> Vec<Finding>;
}

impl<F> CustomRule for F
where
    F: Fn(&GraphView<'_>) -> Vec<Finding> + Send + Sync,
{
    fn evaluate(&self, view: &GraphView<'_>) -> Vec<Finding> {
        self(view)
    }
}

/// A registered check bound to its name.
#[derive(Clone)]
pub struct CustomCheck {
    name: String,
    rule: Arc<dyn CustomRule>,
}

impl CustomCheck {
    /// Registered name.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Run the check.
    pub fn evaluate(&self, view: &GraphView<'_>) -> Vec<Finding> {
        self.rule.evaluate(view)
    }
}

impl fmt::Debug for CustomCheck {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("CustomCheck").field(&self.name).finish()
    }
}

/// Checks available to `custom` rules, by name.
#[derive(Clone, Default)]
pub struct CustomRuleRegistry {
    checks: BTreeMap<String, CustomCheck>,
}

impl CustomRuleRegistry {
    /// An empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Register `rule` under `name`, replacing any previous registration.
    pub fn register(&mut self, name: impl Into<String>, rule: impl CustomRule + 'static) -> &mut Self {
        let name = name.into();
        self.checks.insert(
            name.clone(),
            CustomCheck {
                name,
                rule: Arc::new(rule),
            },
        );
        self
    }

    /// Look up a check.
    pub fn get(&self, name: &str) -> Option<&CustomCheck> {
        self.checks.get(name)
    }

    /// Registered names in order.
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.checks.keys().map(String::as_str)
    }
}

impl fmt::Debug for CustomRuleRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_list().entries(self.checks.keys()).finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::RawModule;

    #[test]
    fn test_closure_check() {
        let graph = ModuleGraph::from_raw(vec![
            RawModule::new("a.js").depends_on("b.js").depends_on("c.js"),
            RawModule::new("b.js"),
            RawModule::new("c.js"),
        ])
        .unwrap();
        let props = GraphProperties::derive(&graph);

        let mut registry = CustomRuleRegistry::new();
        registry.register("fan-out-max-1", |view: &GraphView<'_>| {
            view.modules()
                .filter(|(id, _)| view.dependencies(*id).len() > 1)
                .map(|(_, path)| Finding::module(path))
                .collect()
        });

        let check = registry.get("fan-out-max-1").unwrap();
        let findings = check.evaluate(&GraphView::new(&graph, &props));
        assert_eq!(findings, vec![Finding::module("a.js")]);
        assert_eq!(registry.names().collect::<Vec<_>>(), vec!["fan-out-max-1"]);
    }
}
