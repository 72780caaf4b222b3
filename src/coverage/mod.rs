// Coverage view - merged runtime evidence consumed as reachability seeds
#![allow(dead_code)]

use std::collections::{HashMap, HashSet};
use std::path::{Path, PathBuf};

use crate::ast::{NodeId, Program};

/// Coverage records for one source file
#[derive(Debug, Clone, Default)]
pub struct UnitCoverage {
    pub path: PathBuf,

    /// Lines executed at least once
    pub covered_lines: HashSet<u32>,

    /// Lines instrumented but never executed
    pub uncovered_lines: HashSet<u32>,
}

impl UnitCoverage {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            ..Default::default()
        }
    }

    /// `None` means the line was not instrumented (blank, comment)
    pub fn line_covered(&self, line: u32) -> Option<bool> {
        if self.covered_lines.contains(&line) {
            Some(true)
        } else if self.uncovered_lines.contains(&line) {
            Some(false)
        } else {
            None
        }
    }
}

/// Merged view over independently-sourced coverage records. The ingestion
/// layer that reads report files lives outside this crate; it hands over
/// already-extracted class/method/line facts. Merging unions covered sets:
/// covered in any run wins.
#[derive(Debug, Clone, Default)]
pub struct CoverageView {
    files: HashMap<PathBuf, UnitCoverage>,

    /// Fully qualified names of classes loaded/instantiated at runtime
    covered_classes: HashSet<String>,
    uncovered_classes: HashSet<String>,

    /// `pkg.Type#name(params)` signatures of executed callables
    covered_methods: HashSet<String>,
    uncovered_methods: HashSet<String>,
}

impl CoverageView {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record_class(&mut self, fqn: impl Into<String>, covered: bool) {
        let fqn = fqn.into();
        if covered {
            self.uncovered_classes.remove(&fqn);
            self.covered_classes.insert(fqn);
        } else if !self.covered_classes.contains(&fqn) {
            self.uncovered_classes.insert(fqn);
        }
    }

    pub fn record_method(&mut self, signature: impl Into<String>, covered: bool) {
        let signature = signature.into();
        if covered {
            self.uncovered_methods.remove(&signature);
            self.covered_methods.insert(signature);
        } else if !self.covered_methods.contains(&signature) {
            self.uncovered_methods.insert(signature);
        }
    }

    pub fn record_file(&mut self, coverage: UnitCoverage) {
        match self.files.get_mut(&coverage.path) {
            Some(existing) => {
                existing.covered_lines.extend(coverage.covered_lines);
                existing.uncovered_lines.extend(coverage.uncovered_lines);
                let covered: Vec<u32> = existing.covered_lines.iter().copied().collect();
                for line in covered {
                    existing.uncovered_lines.remove(&line);
                }
            }
            None => {
                self.files.insert(coverage.path.clone(), coverage);
            }
        }
    }

    /// Union another view in; covered in any run wins
    pub fn merge(&mut self, other: CoverageView) {
        for fqn in other.covered_classes {
            self.record_class(fqn, true);
        }
        for fqn in other.uncovered_classes {
            self.record_class(fqn, false);
        }
        for sig in other.covered_methods {
            self.record_method(sig, true);
        }
        for sig in other.uncovered_methods {
            self.record_method(sig, false);
        }
        for (_, coverage) in other.files {
            self.record_file(coverage);
        }
    }

    /// `None` when the class never appears in coverage data
    pub fn class_covered(&self, fqn: &str) -> Option<bool> {
        if self.covered_classes.contains(fqn) {
            Some(true)
        } else if self.uncovered_classes.contains(fqn) {
            Some(false)
        } else {
            None
        }
    }

    pub fn method_covered(&self, signature: &str) -> Option<bool> {
        if self.covered_methods.contains(signature) {
            Some(true)
        } else if self.uncovered_methods.contains(signature) {
            Some(false)
        } else {
            None
        }
    }

    pub fn line_covered(&self, file: &Path, line: u32) -> Option<bool> {
        if let Some(coverage) = self.files.get(file) {
            return coverage.line_covered(line);
        }
        // fall back to matching by filename, report paths rarely agree
        // with checkout paths
        let file_name = file.file_name()?;
        self.files
            .iter()
            .filter(|(path, _)| path.file_name() == Some(file_name))
            .find_map(|(_, coverage)| coverage.line_covered(line))
    }

    /// Coverage of a source callable, by signature then by declaration line
    pub fn callable_covered(&self, program: &Program, callable: NodeId) -> Option<bool> {
        if let Some(sig) = program.callable_signature(callable) {
            if let Some(hit) = self.method_covered(&sig) {
                return Some(hit);
            }
        }
        let location = program.location(callable);
        if location.line == 0 {
            return None;
        }
        self.line_covered(&location.file, location.line as u32)
    }

    pub fn is_empty(&self) -> bool {
        self.files.is_empty()
            && self.covered_classes.is_empty()
            && self.uncovered_classes.is_empty()
            && self.covered_methods.is_empty()
            && self.uncovered_methods.is_empty()
    }
}
