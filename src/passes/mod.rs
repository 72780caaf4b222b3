// Pass driver - repeated mark+sweep rounds until a fixed point
#![allow(dead_code)]

use std::collections::BTreeMap;

use miette::{IntoDiagnostic, Result};
use rayon::prelude::*;
use serde::Serialize;
use tracing::{debug, info, warn};

use crate::ast::{NodeId, Program};
use crate::config::ReducerConfig;
use crate::coverage::CoverageView;
use crate::mark::{Classifier, Decision};
use crate::reasons::{InclusionReason, ReasonTable};
use crate::sweep;

/// Per-round statistics
#[derive(Debug, Clone, Serialize)]
pub struct PassStats {
    pub round: usize,
    pub kept: usize,
    pub dummied: usize,
    pub removed: usize,
    /// Callable signatures surviving this round, the convergence key
    pub retained_callables: usize,
}

/// Outcome of a reduction run
pub struct Reduction {
    pub program: Program,
    /// Decisions from the final round, keyed by that round's input arena
    pub decisions: BTreeMap<NodeId, Decision>,
    pub stats: Vec<PassStats>,
}

impl Reduction {
    pub fn rounds(&self) -> usize {
        self.stats.len()
    }
}

/// Drives mark+sweep rounds. Discovery (reference extraction, entry-point
/// detection against the parsed sources) stays external because node ids
/// change between rounds; the driver calls it again on each round's arena.
pub struct Reducer {
    config: ReducerConfig,
}

impl Reducer {
    pub fn new(config: ReducerConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &ReducerConfig {
        &self.config
    }

    /// Run rounds until the retained-callable set stops changing or the
    /// pass budget is exhausted. `discover` attaches inclusion reasons for
    /// the given arena; configured entry points and retain patterns are
    /// attached on top of whatever it finds.
    pub fn run<D>(
        &self,
        mut program: Program,
        coverage: &CoverageView,
        mut discover: D,
    ) -> Result<Reduction>
    where
        D: FnMut(&Program, &ReasonTable),
    {
        let options = self.config.sweep_options();
        let mut stats: Vec<PassStats> = Vec::new();
        let mut previous_signatures = program.retained_signatures();
        let mut final_decisions: BTreeMap<NodeId, Decision> = BTreeMap::new();

        for round in 1..=self.config.max_passes.max(1) {
            let reasons = ReasonTable::new();
            discover(&program, &reasons);
            self.attach_configured_roots(&program, &reasons);

            let classifier = Classifier::new(&program, &reasons, coverage);
            self.mark(&program, &classifier);
            let decisions = classifier.decisions();

            let reduced = sweep::sweep(&program, &decisions, &reasons, &options)
                .into_diagnostic()?;

            let signatures = reduced.retained_signatures();
            let round_stats = PassStats {
                round,
                kept: decisions
                    .values()
                    .filter(|d| **d == Decision::Keep)
                    .count(),
                dummied: decisions
                    .values()
                    .filter(|d| **d == Decision::Dummy)
                    .count(),
                removed: decisions
                    .values()
                    .filter(|d| **d == Decision::Remove)
                    .count(),
                retained_callables: signatures.len(),
            };
            info!(
                round,
                kept = round_stats.kept,
                dummied = round_stats.dummied,
                removed = round_stats.removed,
                "pass complete"
            );
            stats.push(round_stats);
            final_decisions = decisions;

            let converged = signatures == previous_signatures;
            previous_signatures = signatures;
            program = reduced;
            if converged {
                debug!(round, "retained set stable, stopping");
                return Ok(Reduction {
                    program,
                    decisions: final_decisions,
                    stats,
                });
            }
        }

        warn!(
            max_passes = self.config.max_passes,
            "pass budget exhausted before convergence"
        );
        Ok(Reduction {
            program,
            decisions: final_decisions,
            stats,
        })
    }

    /// Classify every declaration; per-unit parallelism when configured.
    /// Cross-unit recursion is safe: the decision cache is shared and
    /// idempotent, the backtrace is per-query.
    fn mark(&self, program: &Program, classifier: &Classifier<'_>) {
        if self.config.parallel {
            program.units().par_iter().for_each(|unit| {
                for id in program.decl_ids_of_unit(*unit) {
                    classifier.classify(id);
                }
            });
        } else {
            for unit in program.units() {
                for id in program.decl_ids_of_unit(*unit) {
                    classifier.classify(id);
                }
            }
        }
    }

    fn attach_configured_roots(&self, program: &Program, reasons: &ReasonTable) {
        for id in program.decl_ids() {
            let signature = program.callable_signature(id);
            let type_name = program
                .type_decl(id)
                .map(|t| t.qualified_name.clone());

            if let Some(sig) = &signature {
                if self.config.is_entry_point(sig) {
                    debug!(signature = %sig, "entry point");
                    self.attach_with_hosts(program, reasons, id, InclusionReason::ByEntrypoint);
                }
                if self.config.should_retain(sig) {
                    self.attach_with_hosts(
                        program,
                        reasons,
                        id,
                        InclusionReason::DirectlyReferenced,
                    );
                }
            }
            if let Some(name) = &type_name {
                if self.config.is_entry_point(name) {
                    self.attach_with_hosts(program, reasons, id, InclusionReason::ByEntrypoint);
                }
                if self.config.should_retain(name) {
                    self.attach_with_hosts(
                        program,
                        reasons,
                        id,
                        InclusionReason::DirectlyReferenced,
                    );
                }
            }
        }
    }

    /// Attach a root reason to a node and to every enclosing type; a rooted
    /// member cannot survive inside a removed host
    fn attach_with_hosts(
        &self,
        program: &Program,
        reasons: &ReasonTable,
        id: NodeId,
        reason: InclusionReason,
    ) {
        reasons.attach(id, reason.clone());
        let mut enclosing = program.declaring_type(id);
        while let Some(ty) = enclosing {
            reasons.attach(ty, reason.clone());
            enclosing = program.declaring_type(ty);
        }
    }
}
