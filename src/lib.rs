//! javatrim - reachability-based program reduction for Java sources
//!
//! Shrinks a parsed Java-like program to the subset a set of entry points
//! (and runtime coverage evidence) can actually reach, while keeping the
//! result compilable.
//!
//! # Architecture
//!
//! One reduction round consists of:
//! 1. **Discovery** (external) - attach inclusion reasons to declaration nodes
//! 2. **Mark** - classify every node as Keep, Dummy, or Remove
//! 3. **Sweep** - clone the arena, eliding removals and synthesizing
//!    dummy bodies and structural repairs
//!
//! Rounds repeat until the retained-callable set stops changing. Symbol
//! resolution is best-effort: a baseline resolver's answers are trusted
//! unless they match a known defect, in which case the fallback layer in
//! [`resolve`] re-derives them.

pub mod ast;
pub mod config;
pub mod coverage;
pub mod mark;
pub mod passes;
pub mod reasons;
pub mod report;
pub mod resolve;
pub mod solver;
pub mod sweep;
pub mod types;

pub use ast::{Node, NodeId, Program, ProgramBuilder};
pub use config::ReducerConfig;
pub use coverage::CoverageView;
pub use mark::{Classifier, Decision};
pub use passes::{PassStats, Reducer, Reduction};
pub use reasons::{InclusionReason, ReasonTable};
pub use report::{DecisionReport, ExplanationGraph};
pub use resolve::{ResolveError, Resolver};
pub use sweep::{sweep, SweepError, SweepOptions};
