// Mark phase - classifies every declaration node as Keep, Dummy, or Remove
#![allow(dead_code)]

use dashmap::DashMap;
use indexmap::IndexSet;
use serde::{Deserialize, Serialize};
use tracing::{debug, trace};

use crate::ast::{CallableKey, Node, NodeId, Program, Stmt};
use crate::coverage::CoverageView;
use crate::reasons::{InclusionReason, ReasonTable};
use crate::resolve::Resolver;

/// What the sweep should do with a node. Computed once, cached forever;
/// a pure function of the reason graph and transitively-referenced
/// decisions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Decision {
    /// Retain as written
    Keep,
    /// Retain the declaration, replace the body with a marker
    Dummy,
    /// Elide entirely
    Remove,
}

impl Decision {
    pub fn is_retained(&self) -> bool {
        !matches!(self, Decision::Remove)
    }
}

/// Cycle guard: the ordered set of nodes under evaluation in one top-level
/// classification query. Fresh per query, threaded through the recursion,
/// never shared across threads.
#[derive(Debug, Default)]
pub struct Backtrace {
    under_evaluation: IndexSet<NodeId>,
    /// Lowest stack index any cycle in this query re-entered; frames above
    /// it consumed a provisional answer and must not be cached
    taint_floor: Option<usize>,
}

impl Backtrace {
    pub fn new() -> Self {
        Self::default()
    }

    /// False when the node is already on the evaluation path, i.e. a cycle
    fn enter(&mut self, node: NodeId) -> bool {
        self.under_evaluation.insert(node)
    }

    fn exit(&mut self, node: NodeId) {
        self.under_evaluation.shift_remove(&node);
    }

    fn taint(&mut self, node: NodeId) {
        if let Some(index) = self.under_evaluation.get_index_of(&node) {
            self.taint_floor = Some(match self.taint_floor {
                Some(floor) => floor.min(index),
                None => index,
            });
        }
    }

    pub fn depth(&self) -> usize {
        self.under_evaluation.len()
    }
}

/// The classifier. Decisions are memoized in a sharded concurrent cache so
/// queries for unrelated units never contend; only completed
/// classifications are cached, never the conservative answer produced on
/// cycle re-entry.
pub struct Classifier<'p> {
    program: &'p Program,
    reasons: &'p ReasonTable,
    coverage: &'p CoverageView,
    resolver: Resolver<'p>,
    decisions: DashMap<NodeId, Decision>,
    concrete_impls: DashMap<CallableKey, usize>,
}

impl<'p> Classifier<'p> {
    pub fn new(
        program: &'p Program,
        reasons: &'p ReasonTable,
        coverage: &'p CoverageView,
    ) -> Self {
        Self {
            program,
            reasons,
            coverage,
            resolver: Resolver::new(program),
            decisions: DashMap::new(),
            concrete_impls: DashMap::new(),
        }
    }

    pub fn resolver(&self) -> &Resolver<'p> {
        &self.resolver
    }

    /// Classify one node, starting a fresh top-level query
    pub fn classify(&self, node: NodeId) -> Decision {
        let mut backtrace = Backtrace::new();
        self.classify_with(node, &mut backtrace)
    }

    /// Snapshot of every cached decision
    pub fn decisions(&self) -> std::collections::BTreeMap<NodeId, Decision> {
        self.decisions
            .iter()
            .map(|e| (*e.key(), *e.value()))
            .collect()
    }

    pub fn decision_of(&self, node: NodeId) -> Option<Decision> {
        self.decisions.get(&node).map(|d| *d)
    }

    fn classify_with(&self, node: NodeId, backtrace: &mut Backtrace) -> Decision {
        if let Some(cached) = self.decisions.get(&node) {
            return *cached;
        }
        if !backtrace.enter(node) {
            // re-entry: conservative answer, and the frames consuming it
            // are tainted so their results stay out of the cache
            trace!(%node, "cycle re-entry, provisional Remove");
            backtrace.taint(node);
            return Decision::Remove;
        }
        let index = backtrace.depth() - 1;
        let decision = self.compute(node, backtrace);
        backtrace.exit(node);
        match backtrace.taint_floor {
            // every cycle this frame took part in closed back on this very
            // frame, so the only provisional answer in play was its own;
            // the decision system is monotone, so the computed answer is
            // the fixpoint answer and safe to cache
            Some(floor) if floor >= index => {
                backtrace.taint_floor = None;
                self.decisions.insert(node, decision);
            }
            // consumed a provisional answer for a node still under
            // evaluation below us; a later top-level query re-derives this
            // node against the settled cache
            Some(_) => {}
            None => {
                self.decisions.insert(node, decision);
            }
        }
        debug!(%node, ?decision, "classified");
        decision
    }

    fn compute(&self, node: NodeId, backtrace: &mut Backtrace) -> Decision {
        // a member of a removed type goes with it; nested types carry
        // their own reasons instead
        if !matches!(self.program.node(node), Node::Type(_) | Node::Unit(_)) {
            if let Some(declaring) = self.program.declaring_type(node) {
                if self.classify_with(declaring, backtrace) == Decision::Remove {
                    return Decision::Remove;
                }
            }
        }

        match self.program.node(node) {
            Node::Type(_) => self.compute_type(node, backtrace),
            Node::Callable(_) => self.compute_callable(node, backtrace),
            Node::Initializer(_) => self.compute_initializer(node, backtrace),
            // params travel with their callable
            Node::Param(p) => self.classify_with(p.owner, backtrace),
            // everything else is kept or removed purely by its reasons
            _ => {
                if self.any_reason_alive(node, backtrace) {
                    Decision::Keep
                } else {
                    Decision::Remove
                }
            }
        }
    }

    fn compute_type(&self, node: NodeId, backtrace: &mut Backtrace) -> Decision {
        let Some(decl) = self.program.type_decl(node) else {
            return Decision::Remove;
        };
        if self.coverage.class_covered(&decl.qualified_name) == Some(true) {
            return Decision::Keep;
        }
        if self.any_reason_alive(node, backtrace) {
            return Decision::Keep;
        }
        Decision::Remove
    }

    fn compute_callable(&self, node: NodeId, backtrace: &mut Backtrace) -> Decision {
        let reasons = self.reasons.reasons(node);

        if reasons.iter().any(InclusionReason::is_terminal) {
            return Decision::Keep;
        }

        let mut alive = false;
        let mut delegation_only = true;
        for reason in &reasons {
            if !self.reason_alive(reason, backtrace) {
                continue;
            }
            alive = true;
            match reason {
                InclusionReason::TransitiveCtor { .. }
                | InclusionReason::TransitiveCallableHeader(_)
                | InclusionReason::TransitiveClassSupertype(_)
                | InclusionReason::TransitiveAnnotation(_)
                | InclusionReason::TransitiveLibraryCallTarget
                | InclusionReason::NestParent(_) => {}
                _ => delegation_only = false,
            }
        }

        // contract discovery: an override of a retained supertype method
        // must survive even without discovery-attached reasons
        let contract = if alive {
            None
        } else {
            self.contract_requirement(node, backtrace)
        };
        if !alive && contract.is_none() {
            return Decision::Remove;
        }

        match self.coverage.callable_covered(self.program, node) {
            Some(true) => Decision::Keep,
            Some(false) => Decision::Dummy,
            None => {
                if let Some(required) = contract {
                    required
                } else if delegation_only || self.body_never_completes(node) {
                    // needed only so subclasses can delegate or so headers
                    // stay well formed, never shown to execute; a body that
                    // unconditionally throws is already marker-equivalent
                    Decision::Dummy
                } else {
                    Decision::Keep
                }
            }
        }
    }

    /// Control-flow check: a straight-line body ending in a throw never
    /// completes normally, so without runtime evidence to the contrary the
    /// callable can be dummied without changing observable control flow
    fn body_never_completes(&self, node: NodeId) -> bool {
        let Some(c) = self.program.callable(node) else {
            return false;
        };
        let Some(body) = c.body else {
            return false;
        };
        let Some(Stmt::Block(stmts)) = self.program.stmt(body) else {
            return false;
        };
        let mut saw_throw = false;
        for id in stmts {
            if saw_throw {
                // anything after the throw is unreachable anyway
                return true;
            }
            match self.program.stmt(*id) {
                Some(Stmt::Throw(_)) => saw_throw = true,
                Some(
                    Stmt::Expr(_)
                    | Stmt::LocalVar { .. }
                    | Stmt::ExplicitCtorCall { .. }
                    | Stmt::Empty,
                ) => {}
                _ => return false,
            }
        }
        saw_throw
    }

    /// Keep/Dummy requirement imposed by overridden supertype methods.
    /// `None` when no retained supertype declaration requires this node.
    fn contract_requirement(
        &self,
        node: NodeId,
        backtrace: &mut Backtrace,
    ) -> Option<Decision> {
        if self.resolver.required_by_library_contract(node) {
            // sole concrete implementation of a library contract must be
            // callable for the program to link
            return Some(if self.sole_concrete_impl(node) {
                Decision::Keep
            } else {
                Decision::Dummy
            });
        }
        for target in self.resolver.override_targets(node) {
            let CallableKey::Source(target_id) = target else {
                continue;
            };
            let target_decision = self.classify_with(target_id, backtrace);
            if target_decision.is_retained() {
                let is_abstract = self
                    .program
                    .callable(target_id)
                    .map(|c| c.modifiers.is_abstract)
                    .unwrap_or(false);
                if is_abstract
                    && target_decision == Decision::Keep
                    && self.sole_concrete_impl(node)
                {
                    return Some(Decision::Keep);
                }
                return Some(Decision::Dummy);
            }
        }
        None
    }

    /// Whether `node` is the only concrete override of the methods it
    /// implements
    fn sole_concrete_impl(&self, node: NodeId) -> bool {
        let targets = self.resolver.override_targets(node);
        if targets.is_empty() {
            return false;
        }
        targets.into_iter().all(|target| {
            if let Some(count) = self.concrete_impls.get(&target) {
                return *count <= 1;
            }
            let count = self
                .program
                .decl_ids()
                .into_iter()
                .filter(|id| self.program.callable(*id).is_some())
                .filter(|id| self.resolver.override_targets(*id).contains(&target))
                .count();
            self.concrete_impls.insert(target, count);
            count <= 1
        })
    }

    fn compute_initializer(&self, node: NodeId, backtrace: &mut Backtrace) -> Decision {
        if !self.any_reason_alive(node, backtrace) {
            return Decision::Remove;
        }
        let location = self.program.location(node);
        let covered = if location.line > 0 {
            self.coverage.line_covered(&location.file, location.line as u32)
        } else {
            None
        };
        match covered {
            Some(false) => Decision::Dummy,
            _ => Decision::Keep,
        }
    }

    fn any_reason_alive(&self, node: NodeId, backtrace: &mut Backtrace) -> bool {
        self.reasons
            .reasons(node)
            .iter()
            .any(|reason| self.reason_alive(reason, backtrace))
    }

    /// Whether one reason still justifies retention: terminal reasons
    /// always do, dependee-carrying reasons only while their dependee is
    /// retained
    fn reason_alive(&self, reason: &InclusionReason, backtrace: &mut Backtrace) -> bool {
        if reason.is_terminal() {
            return true;
        }
        match reason.dependee() {
            Some(dependee) => self.classify_with(dependee, backtrace).is_retained(),
            // library contracts have no source dependee to collapse
            None => true,
        }
    }
}
