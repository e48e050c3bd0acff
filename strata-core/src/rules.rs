//! Module rules and the rule registry
//!
//! [`RuleSet`] is the immutable input of a validation run: every declared
//! module keyed by path, the process-wide deny list, and the cycle policy.

use std::collections::{BTreeMap, BTreeSet};

use crate::error::{ConfigError, ConfigErrors};
use crate::layer::Layer;
use crate::path::ModulePath;

/// Who may depend on a module
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum Visibility {
    /// No restriction (field absent)
    #[default]
    Open,
    /// Only importers under one of these paths
    Restricted(BTreeSet<ModulePath>),
    /// Nobody outside the module itself (`visibility = []`)
    Closed,
}

impl Visibility {
    /// Build from the raw config field: absent is open, empty is closed.
    pub fn from_list(list: Option<Vec<ModulePath>>) -> Self {
        match list {
            None => Visibility::Open,
            Some(entries) if entries.is_empty() => Visibility::Closed,
            Some(entries) => Visibility::Restricted(entries.into_iter().collect()),
        }
    }

    /// True if `importer` may depend on the module carrying this visibility
    pub fn admits(&self, importer: &ModulePath) -> bool {
        match self {
            Visibility::Open => true,
            Visibility::Closed => false,
            Visibility::Restricted(allowed) => allowed.iter().any(|a| a.is_prefix_of(importer)),
        }
    }
}

/// One `depends_on` entry
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Dependency {
    pub path: ModulePath,
    pub deprecated: bool,
}

impl Dependency {
    pub fn new(path: ModulePath) -> Self {
        Self { path, deprecated: false }
    }

    pub fn deprecated(path: ModulePath) -> Self {
        Self { path, deprecated: true }
    }
}

/// Dependency policy of a single declared module
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ModuleRule {
    pub path: ModulePath,

    /// `None` means untagged: exempt from layer ordering
    pub layer: Option<Layer>,

    /// Allow-list. `Some(vec![])` allows only utility modules.
    pub depends_on: Option<Vec<Dependency>>,

    /// Deny-list, matched by prefix against the imported path
    pub cannot_depend_on: Vec<ModulePath>,

    pub visibility: Visibility,

    /// Layer-exempt; any module may depend on it
    pub utility: bool,
}

impl ModuleRule {
    pub fn new(path: ModulePath) -> Self {
        Self {
            path,
            layer: None,
            depends_on: None,
            cannot_depend_on: Vec::new(),
            visibility: Visibility::Open,
            utility: false,
        }
    }

    pub fn with_layer(mut self, layer: Layer) -> Self {
        self.layer = Some(layer);
        self
    }

    pub fn with_depends_on(mut self, deps: impl IntoIterator<Item = Dependency>) -> Self {
        self.depends_on = Some(deps.into_iter().collect());
        self
    }

    pub fn with_cannot_depend_on(mut self, paths: impl IntoIterator<Item = ModulePath>) -> Self {
        self.cannot_depend_on = paths.into_iter().collect();
        self
    }

    pub fn with_visibility(mut self, visibility: Visibility) -> Self {
        self.visibility = visibility;
        self
    }

    pub fn as_utility(mut self) -> Self {
        self.utility = true;
        self
    }

    /// The first `depends_on` entry covering `imported`, if any
    pub fn allowed_entry(&self, imported: &ModulePath) -> Option<&Dependency> {
        self.depends_on
            .as_ref()?
            .iter()
            .find(|dep| dep.path.is_prefix_of(imported))
    }

    /// The first local deny entry covering `imported`, if any
    pub fn denied_entry(&self, imported: &ModulePath) -> Option<&ModulePath> {
        self.cannot_depend_on.iter().find(|deny| deny.is_prefix_of(imported))
    }
}

/// Immutable registry of module rules for one validation run
#[derive(Debug, Clone, Default)]
pub struct RuleSet {
    modules: BTreeMap<ModulePath, ModuleRule>,

    /// Deny entries that apply to every importer
    global_deny: Vec<ModulePath>,

    forbid_circular_dependencies: bool,
}

impl RuleSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a registry, collecting every duplicate path
    pub fn from_rules(rules: impl IntoIterator<Item = ModuleRule>) -> Result<Self, ConfigErrors> {
        let mut set = RuleSet::new();
        let mut errors = ConfigErrors::new();
        for rule in rules {
            if let Err(e) = set.insert(rule) {
                errors.push(e);
            }
        }
        errors.into_result(set)
    }

    /// Add a rule; a second rule for the same path is rejected
    pub fn insert(&mut self, rule: ModuleRule) -> Result<(), ConfigError> {
        if self.modules.contains_key(&rule.path) {
            return Err(ConfigError::DuplicateModule {
                path: rule.path.to_string(),
            });
        }
        self.modules.insert(rule.path.clone(), rule);
        Ok(())
    }

    pub fn with_global_deny(mut self, paths: impl IntoIterator<Item = ModulePath>) -> Self {
        self.global_deny = paths.into_iter().collect();
        self
    }

    pub fn with_forbid_circular_dependencies(mut self, forbid: bool) -> Self {
        self.forbid_circular_dependencies = forbid;
        self
    }

    pub fn forbids_cycles(&self) -> bool {
        self.forbid_circular_dependencies
    }

    pub fn global_deny(&self) -> &[ModulePath] {
        &self.global_deny
    }

    pub fn get(&self, path: &str) -> Option<&ModuleRule> {
        self.modules.get(path)
    }

    pub fn modules(&self) -> impl Iterator<Item = &ModuleRule> {
        self.modules.values()
    }

    pub fn len(&self) -> usize {
        self.modules.len()
    }

    pub fn is_empty(&self) -> bool {
        self.modules.is_empty()
    }

    /// Most specific declared module whose path is a prefix of `path`
    pub fn owner(&self, path: &ModulePath) -> Option<&ModuleRule> {
        path.ancestors().find_map(|candidate| self.modules.get(candidate))
    }

    /// Deny entry (local first, then global) that forbids `importer` -> `imported`.
    ///
    /// `rule` is the importer's owning module, if it has one. A global entry
    /// never applies to importers located inside the denied path itself.
    pub fn denied_by<'a>(
        &'a self,
        importer: &ModulePath,
        rule: Option<&'a ModuleRule>,
        imported: &ModulePath,
    ) -> Option<&'a ModulePath> {
        if let Some(local) = rule.and_then(|rule| rule.denied_entry(imported)) {
            return Some(local);
        }
        self.global_deny
            .iter()
            .find(|deny| deny.is_prefix_of(imported) && !deny.is_prefix_of(importer))
    }
}
