// Inclusion reasons - the annotation graph driving reachability
#![allow(dead_code)]

use dashmap::DashMap;
use serde::{Deserialize, Serialize};

use crate::ast::{NodeId, Program};

/// Why a declaration node might need to be retained. Attached by the
/// external discovery pass and by classification itself; a node with zero
/// reasons is provably unreachable.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum InclusionReason {
    /// Referenced from code already known to execute
    DirectlyReferenced,
    /// Referenced by a specific node whose own reachability decides ours
    DirectlyReferencedBy(NodeId),
    /// Designated reachability root
    ByEntrypoint,
    /// Runtime evidence (coverage) says it executed
    ByBaseline,
    /// Encloses a nested type that is used elsewhere
    NestParent(NodeId),
    /// A subclass constructor must delegate into this class; `ctor` names
    /// the delegating constructor when known
    TransitiveCtor {
        class: NodeId,
        ctor: Option<NodeId>,
    },
    /// Mentioned in a retained callable's header (parameter, return,
    /// throws)
    TransitiveCallableHeader(NodeId),
    /// Appears in a retained class's extends/implements clause
    TransitiveClassSupertype(NodeId),
    /// Target of a call from the given callable
    TransitiveMethodCallTarget(NodeId),
    /// Required by a library type's contract (abstract method, interface)
    TransitiveLibraryCallTarget,
    /// Used as an annotation on the given node
    TransitiveAnnotation(NodeId),
    /// Field whose declaring host must survive for the field to exist
    TransitiveFieldHost(NodeId),
}

impl InclusionReason {
    /// Reasons that force `Keep` on their own, regardless of anything else
    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            InclusionReason::DirectlyReferenced
                | InclusionReason::ByEntrypoint
                | InclusionReason::ByBaseline
        )
    }

    /// The node this reason's strength is conditional on, if any. Terminal
    /// and library-contract reasons depend on nothing.
    pub fn dependee(&self) -> Option<NodeId> {
        match self {
            InclusionReason::DirectlyReferencedBy(n)
            | InclusionReason::NestParent(n)
            | InclusionReason::TransitiveCallableHeader(n)
            | InclusionReason::TransitiveClassSupertype(n)
            | InclusionReason::TransitiveMethodCallTarget(n)
            | InclusionReason::TransitiveAnnotation(n)
            | InclusionReason::TransitiveFieldHost(n) => Some(*n),
            InclusionReason::TransitiveCtor { class, .. } => Some(*class),
            _ => None,
        }
    }

    pub fn describe(&self, program: &Program) -> String {
        let name = |id: NodeId| program.display(id);
        match self {
            InclusionReason::DirectlyReferenced => "directly referenced".to_string(),
            InclusionReason::DirectlyReferencedBy(n) => {
                format!("directly referenced by {}", name(*n))
            }
            InclusionReason::ByEntrypoint => "designated entrypoint".to_string(),
            InclusionReason::ByBaseline => "covered at runtime".to_string(),
            InclusionReason::NestParent(n) => {
                format!("nest parent of {}", name(*n))
            }
            InclusionReason::TransitiveCtor { class, ctor } => match ctor {
                Some(c) => format!(
                    "constructor delegation from {} via {}",
                    name(*class),
                    name(*c)
                ),
                None => format!("constructor delegation from {}", name(*class)),
            },
            InclusionReason::TransitiveCallableHeader(n) => {
                format!("mentioned in header of {}", name(*n))
            }
            InclusionReason::TransitiveClassSupertype(n) => {
                format!("supertype of {}", name(*n))
            }
            InclusionReason::TransitiveMethodCallTarget(n) => {
                format!("call target from {}", name(*n))
            }
            InclusionReason::TransitiveLibraryCallTarget => {
                "required by a library contract".to_string()
            }
            InclusionReason::TransitiveAnnotation(n) => {
                format!("annotation on {}", name(*n))
            }
            InclusionReason::TransitiveFieldHost(n) => {
                format!("hosts field {}", name(*n))
            }
        }
    }
}

/// Append-only index from declaration node to its inclusion reasons.
/// Sharded so concurrent mark queries over unrelated units never contend on
/// a global lock.
#[derive(Debug, Default)]
pub struct ReasonTable {
    entries: DashMap<NodeId, Vec<InclusionReason>>,
}

impl ReasonTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a reason, deduplicating repeats from re-discovery
    pub fn attach(&self, node: NodeId, reason: InclusionReason) {
        let mut list = self.entries.entry(node).or_default();
        if !list.contains(&reason) {
            list.push(reason);
        }
    }

    /// Snapshot of a node's reasons; empty when none were ever attached
    pub fn reasons(&self, node: NodeId) -> Vec<InclusionReason> {
        self.entries
            .get(&node)
            .map(|list| list.clone())
            .unwrap_or_default()
    }

    pub fn has_any(&self, node: NodeId) -> bool {
        self.entries
            .get(&node)
            .map(|list| !list.is_empty())
            .unwrap_or(false)
    }

    /// Nodes that carry at least one reason
    pub fn annotated_nodes(&self) -> Vec<NodeId> {
        self.entries.iter().map(|e| *e.key()).collect()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
