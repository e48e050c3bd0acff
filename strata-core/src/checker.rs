//! Layer & visibility checker
//!
//! Each edge is checked independently (in parallel); the cycle check runs once
//! over the whole owner-collapsed graph. The output is sorted so that it does
//! not depend on execution order.
//!
//! Per-edge rule order:
//!
//! 1. resolve owners; edges between undeclared paths and self-edges are skipped
//! 2. visibility of the imported module, when it is declared
//! 3. deny-list (local and global) against the raw imported path; a hit ends
//!    the edge's checks
//! 4. allow-list, when both ends are declared and the importer declares
//!    `depends_on`; ends the edge's checks
//! 5. layer order, when both ends are declared

use rayon::prelude::*;

use crate::edges::{Edge, EdgeSet};
use crate::graph::DependencyGraph;
use crate::rules::{RuleSet, Visibility};
use crate::violation::Violation;

/// Validates an edge set against a rule set
#[derive(Debug, Clone, Copy)]
pub struct Checker<'a> {
    rules: &'a RuleSet,
    forbid_cycles: bool,
}

impl<'a> Checker<'a> {
    /// Checker using the rule set's own cycle policy
    pub fn new(rules: &'a RuleSet) -> Self {
        Self {
            rules,
            forbid_cycles: rules.forbids_cycles(),
        }
    }

    /// Override `forbid_circular_dependencies`
    pub fn forbid_cycles(mut self, forbid: bool) -> Self {
        self.forbid_cycles = forbid;
        self
    }

    /// Check every edge and, if enabled, the graph for cycles.
    ///
    /// Never stops early: all findings are returned, sorted by importer,
    /// imported path and kind.
    pub fn validate(&self, edges: &EdgeSet) -> Vec<Violation> {
        let mut violations: Vec<Violation> = edges
            .par_iter()
            .flat_map_iter(|edge| self.check_edge(edge))
            .collect();

        if self.forbid_cycles {
            let graph = DependencyGraph::from_edges(self.rules, edges);
            let cycles = graph.find_cycles();
            tracing::debug!(
                nodes = graph.node_count(),
                edges = graph.edge_count(),
                cycles = cycles.len(),
                "cycle check finished"
            );
            violations.extend(cycles.into_iter().map(Violation::circular));
        }

        violations.sort_by(Violation::report_order);
        violations.dedup();

        tracing::debug!(
            modules = self.rules.len(),
            edges = edges.len(),
            violations = violations.len(),
            "validation finished"
        );
        violations
    }

    /// Findings for a single edge (no cycle check)
    pub fn check_edge(&self, edge: &Edge) -> Vec<Violation> {
        let mut found = Vec::new();

        let from = self.rules.owner(&edge.importer);
        let to = self.rules.owner(&edge.imported);

        match (from, to) {
            (None, None) => {
                tracing::trace!(%edge, "skipping edge between undeclared paths");
                return found;
            }
            (Some(from), Some(to)) if from.path == to.path => return found,
            _ => {}
        }

        if let Some(to) = to {
            match &to.visibility {
                Visibility::Open => {}
                Visibility::Closed => {
                    found.push(Violation::visibility(
                        &edge.importer,
                        &edge.imported,
                        &to.path,
                        true,
                    ));
                }
                restricted @ Visibility::Restricted(_) => {
                    if !restricted.admits(&edge.importer) {
                        found.push(Violation::visibility(
                            &edge.importer,
                            &edge.imported,
                            &to.path,
                            false,
                        ));
                    }
                }
            }
        }

        if let Some(entry) = self.rules.denied_by(&edge.importer, from, &edge.imported) {
            let rule_owner = from.map_or(&edge.importer, |rule| &rule.path);
            found.push(Violation::forbidden(&edge.importer, &edge.imported, rule_owner, entry));
            return found;
        }

        // Allow-list and layer rules need both ends declared
        let (Some(from), Some(to)) = (from, to) else {
            tracing::trace!(%edge, "undeclared endpoint; allow-list and layers skipped");
            return found;
        };

        if from.depends_on.is_some() {
            match from.allowed_entry(&edge.imported) {
                Some(dep) if dep.deprecated => {
                    found.push(Violation::deprecated(&edge.importer, &edge.imported, &dep.path));
                }
                Some(_) => {}
                None if to.utility => {}
                None => {
                    found.push(Violation::undeclared(&edge.importer, &edge.imported, &from.path));
                }
            }
            return found;
        }

        if let (Some(from_layer), Some(to_layer)) = (from.layer, to.layer) {
            if !to.utility && !from_layer.may_depend_on(to_layer) {
                found.push(Violation::layer_order(
                    &edge.importer,
                    &edge.imported,
                    from_layer,
                    to_layer,
                ));
            }
        }

        found
    }
}

/// Validate `edges` against `rules` with the rule set's cycle policy
pub fn validate(rules: &RuleSet, edges: &EdgeSet) -> Vec<Violation> {
    Checker::new(rules).validate(edges)
}
