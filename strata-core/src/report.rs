//! Run summary for CI gating

use std::collections::BTreeMap;

use serde::Serialize;

use crate::violation::{Severity, Violation, ViolationKind};

/// Exit status of a clean run
pub const EXIT_OK: i32 = 0;
/// Exit status when error-severity violations were found
pub const EXIT_VIOLATIONS: i32 = 1;

/// Outcome of one validation run
#[derive(Debug, Clone, Serialize)]
pub struct Report {
    pub passed: bool,
    pub summary: Summary,
    pub violations: Vec<Violation>,
}

#[derive(Debug, Clone, Default, Serialize)]
pub struct Summary {
    pub modules: usize,
    pub edges: usize,
    pub errors: usize,
    pub warnings: usize,
    pub by_kind: BTreeMap<ViolationKind, usize>,
}

impl Report {
    /// Build a report from checker output and the size of the input
    pub fn new(violations: Vec<Violation>, modules: usize, edges: usize) -> Self {
        let mut summary = Summary {
            modules,
            edges,
            ..Default::default()
        };

        for v in &violations {
            match v.severity {
                Severity::Error => summary.errors += 1,
                Severity::Warning => summary.warnings += 1,
            }
            *summary.by_kind.entry(v.kind).or_insert(0) += 1;
        }

        Self {
            passed: summary.errors == 0,
            summary,
            violations,
        }
    }

    pub fn errors(&self) -> impl Iterator<Item = &Violation> {
        self.violations.iter().filter(|v| v.severity == Severity::Error)
    }

    pub fn warnings(&self) -> impl Iterator<Item = &Violation> {
        self.violations.iter().filter(|v| v.severity == Severity::Warning)
    }

    pub fn exit_code(&self) -> i32 {
        if self.passed { EXIT_OK } else { EXIT_VIOLATIONS }
    }

    pub fn to_json(&self) -> String {
        // Serialization of plain data cannot fail
        serde_json::to_string_pretty(self).unwrap_or_default()
    }
}
