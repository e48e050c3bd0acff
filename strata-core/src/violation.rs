//! Rule violations reported by the checker

use std::cmp::Ordering;
use std::fmt;

use serde::Serialize;

use crate::layer::Layer;
use crate::path::ModulePath;

/// Kind of rule that was broken.
///
/// Declaration order is the tie-break order used when sorting findings.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ViolationKind {
    /// Target module is closed or not visible to the importer
    Visibility,
    /// Edge matches a `cannot_depend_on` entry
    ForbiddenDependency,
    /// Edge is outside the importer's `depends_on`
    UndeclaredDependency,
    /// Importer sits in a lower layer than the target
    LayerOrder,
    /// Module graph contains a cycle
    CircularDependency,
    /// Edge uses a `depends_on` entry marked deprecated
    DeprecatedDependency,
}

impl ViolationKind {
    pub fn code(self) -> &'static str {
        match self {
            ViolationKind::Visibility => "visibility",
            ViolationKind::ForbiddenDependency => "forbidden-dependency",
            ViolationKind::UndeclaredDependency => "undeclared-dependency",
            ViolationKind::LayerOrder => "layer-order",
            ViolationKind::CircularDependency => "circular-dependency",
            ViolationKind::DeprecatedDependency => "deprecated-dependency",
        }
    }

    pub fn severity(self) -> Severity {
        match self {
            ViolationKind::DeprecatedDependency => Severity::Warning,
            _ => Severity::Error,
        }
    }
}

impl fmt::Display for ViolationKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.code())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Severity {
    Error,
    Warning,
}

/// One detected policy breach
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
pub struct Violation {
    pub kind: ViolationKind,
    pub severity: Severity,
    pub importer: ModulePath,
    pub imported: ModulePath,
    pub message: String,

    /// Closed path `[X, Y, ..., X]`, cycles only
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cycle: Option<Vec<ModulePath>>,
}

impl Violation {
    fn new(
        kind: ViolationKind,
        importer: &ModulePath,
        imported: &ModulePath,
        message: String,
    ) -> Self {
        Self {
            kind,
            severity: kind.severity(),
            importer: importer.clone(),
            imported: imported.clone(),
            message,
            cycle: None,
        }
    }

    pub fn visibility(
        importer: &ModulePath,
        imported: &ModulePath,
        owner: &ModulePath,
        closed: bool,
    ) -> Self {
        let message = if closed {
            format!("'{}' is a closed module; '{}' may not depend on it", owner, importer)
        } else {
            format!("'{}' is not visible to '{}'", owner, importer)
        };
        Self::new(ViolationKind::Visibility, importer, imported, message)
    }

    pub fn forbidden(
        importer: &ModulePath,
        imported: &ModulePath,
        rule_owner: &ModulePath,
        entry: &ModulePath,
    ) -> Self {
        Self::new(
            ViolationKind::ForbiddenDependency,
            importer,
            imported,
            format!(
                "'{}' cannot depend on '{}' (denied for '{}')",
                rule_owner, entry, imported
            ),
        )
    }

    pub fn undeclared(
        importer: &ModulePath,
        imported: &ModulePath,
        rule_owner: &ModulePath,
    ) -> Self {
        Self::new(
            ViolationKind::UndeclaredDependency,
            importer,
            imported,
            format!("'{}' is not listed in depends_on of '{}'", imported, rule_owner),
        )
    }

    pub fn layer_order(
        importer: &ModulePath,
        imported: &ModulePath,
        from: Layer,
        to: Layer,
    ) -> Self {
        Self::new(
            ViolationKind::LayerOrder,
            importer,
            imported,
            format!(
                "'{}' (layer {}) cannot depend on '{}' (layer {})",
                importer, from, imported, to
            ),
        )
    }

    pub fn deprecated(importer: &ModulePath, imported: &ModulePath, entry: &ModulePath) -> Self {
        Self::new(
            ViolationKind::DeprecatedDependency,
            importer,
            imported,
            format!("dependency on '{}' is deprecated", entry),
        )
    }

    /// `cycle` must be closed (first == last) and hold at least two distinct nodes
    pub fn circular(cycle: Vec<ModulePath>) -> Self {
        let rendered = cycle
            .iter()
            .map(|p| p.as_str())
            .collect::<Vec<_>>()
            .join(" -> ");
        let mut violation = Self::new(
            ViolationKind::CircularDependency,
            &cycle[0],
            &cycle[1],
            format!("circular dependency: {}", rendered),
        );
        violation.cycle = Some(cycle);
        violation
    }

    pub fn is_error(&self) -> bool {
        self.severity == Severity::Error
    }

    /// Report order: importer, imported, kind, then message
    pub fn report_order(&self, other: &Self) -> Ordering {
        self.importer
            .cmp(&other.importer)
            .then_with(|| self.imported.cmp(&other.imported))
            .then_with(|| self.kind.cmp(&other.kind))
            .then_with(|| self.message.cmp(&other.message))
    }
}

impl fmt::Display for Violation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}] {} -> {}: {}", self.kind, self.importer, self.imported, self.message)
    }
}
