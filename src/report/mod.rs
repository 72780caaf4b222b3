// Decision reporting - serializable records plus the keep-explanation graph
#![allow(dead_code)]

use std::collections::BTreeMap;
use std::collections::HashMap;
use std::path::Path;

use miette::{IntoDiagnostic, Result};
use petgraph::graph::{DiGraph, NodeIndex};
use petgraph::visit::EdgeRef;
use serde::Serialize;

use crate::ast::{NodeId, Program};
use crate::mark::Decision;
use crate::reasons::{InclusionReason, ReasonTable};

/// One node's outcome, in a stable machine-readable shape
#[derive(Debug, Clone, Serialize)]
pub struct DecisionRecord {
    pub node: u32,
    pub kind: &'static str,
    pub name: Option<String>,
    /// Qualified signature for callables, qualified name for types
    pub qualified: Option<String>,
    pub file: String,
    pub line: usize,
    pub decision: Decision,
    pub reasons: Vec<String>,
}

#[derive(Debug, Serialize)]
pub struct DecisionReport {
    version: &'static str,
    kept: usize,
    dummied: usize,
    removed: usize,
    records: Vec<DecisionRecord>,
}

impl DecisionReport {
    pub fn build(
        program: &Program,
        decisions: &BTreeMap<NodeId, Decision>,
        reasons: &ReasonTable,
    ) -> Self {
        let mut kept = 0;
        let mut dummied = 0;
        let mut removed = 0;

        let records: Vec<DecisionRecord> = decisions
            .iter()
            .map(|(id, decision)| {
                match decision {
                    Decision::Keep => kept += 1,
                    Decision::Dummy => dummied += 1,
                    Decision::Remove => removed += 1,
                }
                let location = program.location(*id);
                DecisionRecord {
                    node: id.0,
                    kind: program.node(*id).kind_name(),
                    name: program.name_of(*id).map(str::to_string),
                    qualified: program.callable_signature(*id).or_else(|| {
                        program
                            .type_decl(*id)
                            .map(|t| t.qualified_name.clone())
                    }),
                    file: location.file.to_string_lossy().to_string(),
                    line: location.line,
                    decision: *decision,
                    reasons: reasons
                        .reasons(*id)
                        .iter()
                        .map(|r| r.describe(program))
                        .collect(),
                }
            })
            .collect();

        Self {
            version: "1.0",
            kept,
            dummied,
            removed,
            records,
        }
    }

    pub fn to_json(&self) -> Result<String> {
        serde_json::to_string_pretty(self).into_diagnostic()
    }

    pub fn write(&self, path: &Path) -> Result<()> {
        std::fs::write(path, self.to_json()?).into_diagnostic()
    }

    pub fn records(&self) -> &[DecisionRecord] {
        &self.records
    }
}

/// Directed graph of retention dependencies: an edge `a -> b` means `a` is
/// retained (in part) because of `b`. Roots are nodes carrying a terminal
/// reason of their own.
pub struct ExplanationGraph {
    inner: DiGraph<NodeId, String>,
    node_map: HashMap<NodeId, NodeIndex>,
    terminal: HashMap<NodeId, String>,
}

impl ExplanationGraph {
    pub fn build(program: &Program, reasons: &ReasonTable) -> Self {
        let mut inner = DiGraph::new();
        let mut node_map: HashMap<NodeId, NodeIndex> = HashMap::new();
        let mut terminal: HashMap<NodeId, String> = HashMap::new();

        let index_of = |graph: &mut DiGraph<NodeId, String>,
                        map: &mut HashMap<NodeId, NodeIndex>,
                        id: NodeId| {
            *map.entry(id).or_insert_with(|| graph.add_node(id))
        };

        for id in reasons.annotated_nodes() {
            let from = index_of(&mut inner, &mut node_map, id);
            for reason in reasons.reasons(id) {
                if reason.is_terminal()
                    || matches!(reason, InclusionReason::TransitiveLibraryCallTarget)
                {
                    terminal.entry(id).or_insert_with(|| reason.describe(program));
                    continue;
                }
                if let Some(dependee) = reason.dependee() {
                    let to = index_of(&mut inner, &mut node_map, dependee);
                    inner.add_edge(from, to, reason.describe(program));
                }
            }
        }

        Self {
            inner,
            node_map,
            terminal,
        }
    }

    /// Why was this node kept: a chain of reason descriptions from the node
    /// to a root. `None` when no path to a root exists (the node should
    /// have been removed, or was retained only by configuration).
    pub fn why_kept(&self, node: NodeId) -> Option<Vec<String>> {
        if let Some(root) = self.terminal.get(&node) {
            return Some(vec![root.clone()]);
        }
        let start = *self.node_map.get(&node)?;

        // BFS over dependees, remembering the edge that reached each node
        let mut queue = std::collections::VecDeque::new();
        let mut came_from: HashMap<NodeIndex, (NodeIndex, String)> = HashMap::new();
        queue.push_back(start);
        while let Some(current) = queue.pop_front() {
            let current_id = self.inner[current];
            if current != start {
                if let Some(root) = self.terminal.get(&current_id) {
                    let mut chain = vec![root.clone()];
                    let mut at = current;
                    while let Some((prev, label)) = came_from.get(&at) {
                        chain.push(label.clone());
                        at = *prev;
                    }
                    chain.reverse();
                    return Some(chain);
                }
            }
            for edge in self.inner.edges(current) {
                let next = edge.target();
                if next != start && !came_from.contains_key(&next) {
                    came_from.insert(next, (current, edge.weight().clone()));
                    queue.push_back(next);
                }
            }
        }
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ast::{ProgramBuilder, TypeRef};

    #[test]
    fn test_report_counts_and_records() {
        let mut b = ProgramBuilder::new();
        let unit = b.add_unit("A.java", Some("p"));
        let class = b.add_class(unit, None, "A");
        let m = b.add_method(class, "run", TypeRef::Void);
        let dead = b.add_method(class, "dead", TypeRef::Void);
        let program = b.finish();

        let reasons = ReasonTable::new();
        reasons.attach(class, InclusionReason::ByEntrypoint);
        reasons.attach(m, InclusionReason::ByEntrypoint);

        let mut decisions = BTreeMap::new();
        decisions.insert(class, Decision::Keep);
        decisions.insert(m, Decision::Keep);
        decisions.insert(dead, Decision::Remove);

        let report = DecisionReport::build(&program, &decisions, &reasons);
        assert_eq!(report.kept, 2);
        assert_eq!(report.removed, 1);
        let record = report
            .records()
            .iter()
            .find(|r| r.qualified.as_deref() == Some("p.A#run()"))
            .unwrap();
        assert_eq!(record.reasons, vec!["designated entrypoint".to_string()]);
        assert!(report.to_json().unwrap().contains("p.A#run()"));
    }

    #[test]
    fn test_why_kept_follows_chain() {
        let mut b = ProgramBuilder::new();
        let unit = b.add_unit("A.java", Some("p"));
        let class = b.add_class(unit, None, "A");
        let entry = b.add_method(class, "main", TypeRef::Void);
        let helper = b.add_method(class, "helper", TypeRef::Void);
        let program = b.finish();

        let reasons = ReasonTable::new();
        reasons.attach(entry, InclusionReason::ByEntrypoint);
        reasons.attach(helper, InclusionReason::TransitiveMethodCallTarget(entry));

        let graph = ExplanationGraph::build(&program, &reasons);
        let chain = graph.why_kept(helper).unwrap();
        assert_eq!(chain.len(), 2);
        assert!(chain[0].contains("call target"));
        assert_eq!(chain[1], "designated entrypoint");
        assert_eq!(
            graph.why_kept(entry),
            Some(vec!["designated entrypoint".to_string()])
        );
    }

    #[test]
    fn test_why_kept_without_root() {
        let mut b = ProgramBuilder::new();
        let unit = b.add_unit("A.java", Some("p"));
        let class = b.add_class(unit, None, "A");
        let a = b.add_method(class, "a", TypeRef::Void);
        let c = b.add_method(class, "b", TypeRef::Void);
        let program = b.finish();

        let reasons = ReasonTable::new();
        // mutual references with no root anywhere
        reasons.attach(a, InclusionReason::TransitiveMethodCallTarget(c));
        reasons.attach(c, InclusionReason::TransitiveMethodCallTarget(a));

        let graph = ExplanationGraph::build(&program, &reasons);
        assert_eq!(graph.why_kept(a), None);
    }
}
