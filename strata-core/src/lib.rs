//! # Strata - layered module-dependency checker
//!
//! Strata enforces architectural rules on the import graph of a code base,
//! using the same declarative rule file format as `tach` (`tach.toml`).
//!
//! ## Rules
//!
//! - **Layers**: `core < auxiliary < tertiary < ui`; a module may only depend
//!   on its own layer or lower ones. Utility modules are exempt.
//! - **Visibility**: a module can restrict who depends on it, or close itself
//!   completely with `visibility = []`.
//! - **Deny-list**: `cannot_depend_on` always wins.
//! - **Allow-list**: `depends_on`, when present, is the complete list.
//! - **Cycles**: with `forbid_circular_dependencies`, the module graph must be
//!   acyclic.
//!
//! ## Example
//!
//! ```
//! use strata_core::{Config, Edge, EdgeSet, ViolationKind, validate};
//!
//! let config = Config::from_str(r#"
//! [[modules]]
//! path = "app"
//! layer = "core"
//!
//! [[modules]]
//! path = "web"
//! layer = "ui"
//! "#).unwrap();
//! let rules = config.to_rules().unwrap();
//!
//! let edges: EdgeSet = [Edge::parse("app.models", "web.views").unwrap()].into_iter().collect();
//! let violations = validate(&rules, &edges);
//! assert_eq!(violations[0].kind, ViolationKind::LayerOrder);
//! ```
//!
//! ## Pipeline
//!
//! ```text
//! strata.toml ──► Config ──► RuleSet ─┐
//!                                     ├─► Checker ──► Vec<Violation> ──► Report
//! sources ──► ImportExtractor ──► EdgeSet ─┘
//! ```

pub mod checker;
pub mod config;
pub mod edges;
pub mod error;
pub mod extract;
pub mod graph;
pub mod layer;
pub mod path;
pub mod report;
pub mod rules;
pub mod violation;

pub use checker::{validate, Checker};
pub use config::{create_config, Config, DependencyConfig, ModuleConfig};
pub use edges::{load_edges, Edge, EdgeSet};
pub use error::{ConfigError, ConfigErrors, Error, Result};
pub use extract::ImportExtractor;
pub use graph::DependencyGraph;
pub use layer::Layer;
pub use path::ModulePath;
pub use report::Report;
pub use rules::{Dependency, ModuleRule, RuleSet, Visibility};
pub use violation::{Severity, Violation, ViolationKind};

/// Load a rule file and an edge source, validate, and summarise.
///
/// `cycles` overrides the file's `forbid_circular_dependencies` when set.
pub fn check(config: &Config, edges: &EdgeSet, cycles: Option<bool>) -> Result<Report> {
    let rules = config.to_rules()?;
    let checker = match cycles {
        Some(forbid) => Checker::new(&rules).forbid_cycles(forbid),
        None => Checker::new(&rules),
    };
    let violations = checker.validate(edges);
    Ok(Report::new(violations, rules.len(), edges.len()))
}
