//! Checker behaviour tests
//!
//! These tests pin down the observable rules: closed modules, deny-list
//! precedence, allow-lists, layer monotonicity, cycle reporting and output
//! determinism.

use pretty_assertions::assert_eq;
use strata_core::{
    validate, Checker, Config, Dependency, Edge, EdgeSet, Layer, ModulePath, ModuleRule, RuleSet,
    Violation, ViolationKind, Visibility,
};

fn p(s: &str) -> ModulePath {
    ModulePath::new(s).unwrap()
}

fn edges(pairs: &[(&str, &str)]) -> EdgeSet {
    pairs.iter().map(|(a, b)| Edge::parse(a, b).unwrap()).collect()
}

fn summary(violations: &[Violation]) -> Vec<(ViolationKind, String, String)> {
    violations
        .iter()
        .map(|v| (v.kind, v.importer.to_string(), v.imported.to_string()))
        .collect()
}

fn rules_from(toml: &str) -> RuleSet {
    Config::from_str(toml).unwrap().to_rules().unwrap()
}

// ===== End-to-end examples =====

#[test]
fn test_closed_module_reports_visibility() {
    let rules = RuleSet::from_rules([
        ModuleRule::new(p("A")).with_layer(Layer::Ui),
        ModuleRule::new(p("B")).with_layer(Layer::Core).with_visibility(Visibility::Closed),
    ])
    .unwrap();

    let violations = validate(&rules, &edges(&[("A", "B")]));
    assert_eq!(
        summary(&violations),
        vec![(ViolationKind::Visibility, "A".to_string(), "B".to_string())]
    );
}

#[test]
fn test_core_importing_ui_reports_layer_order() {
    let rules = RuleSet::from_rules([
        ModuleRule::new(p("A")).with_layer(Layer::Core),
        ModuleRule::new(p("B")).with_layer(Layer::Ui),
    ])
    .unwrap();

    let violations = validate(&rules, &edges(&[("A", "B")]));
    assert_eq!(
        summary(&violations),
        vec![(ViolationKind::LayerOrder, "A".to_string(), "B".to_string())]
    );
}

#[test]
fn test_edge_outside_allow_list_reports_undeclared() {
    let rules = RuleSet::from_rules([
        ModuleRule::new(p("A")).with_depends_on([Dependency::new(p("C"))]),
        ModuleRule::new(p("B")),
    ])
    .unwrap();

    let violations = validate(&rules, &edges(&[("A", "B")]));
    assert_eq!(
        summary(&violations),
        vec![(ViolationKind::UndeclaredDependency, "A".to_string(), "B".to_string())]
    );
}

// ===== Visibility =====

#[test]
fn test_closed_module_rejects_every_other_importer() {
    let rules = rules_from(
        r#"
[[modules]]
path = "pkg.closed"
visibility = []

[[modules]]
path = "pkg.a"

[[modules]]
path = "pkg.b"
layer = "core"

[[modules]]
path = "pkg"
utility = true
"#,
    );

    let violations = validate(
        &rules,
        &edges(&[
            ("pkg.a", "pkg.closed"),
            ("pkg.b.deep", "pkg.closed.inner"),
            ("pkg", "pkg.closed"),
            ("pkg.closed.x", "pkg.closed"),
        ]),
    );

    assert_eq!(violations.len(), 3);
    assert!(violations.iter().all(|v| v.kind == ViolationKind::Visibility));
}

// ===== Deny-list =====

#[test]
fn test_deny_wins_over_allow() {
    let rules = rules_from(
        r#"
[[modules]]
path = "pennylane.ops"
depends_on = ["pennylane.ftqc"]
cannot_depend_on = ["pennylane.ftqc"]

[[modules]]
path = "pennylane.ftqc"
"#,
    );

    let violations = validate(&rules, &edges(&[("pennylane.ops", "pennylane.ftqc.x")]));
    assert_eq!(
        summary(&violations),
        vec![(
            ViolationKind::ForbiddenDependency,
            "pennylane.ops".to_string(),
            "pennylane.ftqc.x".to_string()
        )]
    );
}

#[test]
fn test_deny_prefix_respects_segments() {
    let rules = rules_from(
        r#"
[[modules]]
path = "pennylane.ops"
cannot_depend_on = ["pennylane.ftqc"]

[[modules]]
path = "pennylane.ftqcx"
"#,
    );

    assert!(validate(&rules, &edges(&[("pennylane.ops", "pennylane.ftqcx")])).is_empty());
}

#[test]
fn test_global_deny_applies_everywhere_but_inside() {
    let rules = rules_from(
        r#"
cannot_depend_on = ["pennylane.labs"]

[[modules]]
path = "pennylane.labs"

[[modules]]
path = "pennylane.labs.trotter"

[[modules]]
path = "pennylane.ops"

[[modules]]
path = "pennylane.templates"
"#,
    );

    let violations = validate(
        &rules,
        &edges(&[
            ("pennylane.ops", "pennylane.labs.trotter"),
            ("pennylane.templates", "pennylane.labs"),
            ("pennylane.labs.trotter", "pennylane.labs"),
        ]),
    );

    assert_eq!(
        summary(&violations),
        vec![
            (
                ViolationKind::ForbiddenDependency,
                "pennylane.ops".to_string(),
                "pennylane.labs.trotter".to_string()
            ),
            (
                ViolationKind::ForbiddenDependency,
                "pennylane.templates".to_string(),
                "pennylane.labs".to_string()
            ),
        ]
    );
}

// ===== Allow-list =====

#[test]
fn test_allow_list_admits_listed_and_utility_modules() {
    let rules = rules_from(
        r#"
[[modules]]
path = "app"
depends_on = ["lib"]

[[modules]]
path = "lib"

[[modules]]
path = "helpers"
utility = true

[[modules]]
path = "other"
"#,
    );

    let violations = validate(
        &rules,
        &edges(&[("app", "lib.sub"), ("app", "helpers"), ("app.x", "other.y")]),
    );
    assert_eq!(
        summary(&violations),
        vec![(ViolationKind::UndeclaredDependency, "app.x".to_string(), "other.y".to_string())]
    );
}

#[test]
fn test_empty_allow_list_only_admits_utilities() {
    let rules = rules_from(
        r#"
[[modules]]
path = "leaf"
depends_on = []

[[modules]]
path = "util"
utility = true

[[modules]]
path = "lib"
"#,
    );

    let violations = validate(&rules, &edges(&[("leaf", "util"), ("leaf", "lib")]));
    assert_eq!(
        summary(&violations),
        vec![(ViolationKind::UndeclaredDependency, "leaf".to_string(), "lib".to_string())]
    );
}

#[test]
fn test_deprecated_dependency_warns_without_failing() {
    let rules = rules_from(
        r#"
[[modules]]
path = "app"
depends_on = [{ path = "legacy", deprecated = true }]

[[modules]]
path = "legacy"
"#,
    );

    let report = strata_core::Report::new(validate(&rules, &edges(&[("app", "legacy.api")])), 2, 1);
    assert!(report.passed);
    assert_eq!(report.summary.warnings, 1);
    assert_eq!(report.violations[0].kind, ViolationKind::DeprecatedDependency);
}

// ===== Layers =====

#[test]
fn test_layer_monotonicity() {
    let rules = rules_from(
        r#"
layers = ["ui", "tertiary", "auxiliary", "core"]

[[modules]]
path = "t"
layer = "tertiary"

[[modules]]
path = "c"
layer = "core"
"#,
    );

    assert!(validate(&rules, &edges(&[("t", "c")])).is_empty());
    assert_eq!(
        summary(&validate(&rules, &edges(&[("c", "t")]))),
        vec![(ViolationKind::LayerOrder, "c".to_string(), "t".to_string())]
    );
}

#[test]
fn test_every_upward_layer_pair_is_violation() {
    for (i, low) in Layer::ALL.iter().enumerate() {
        for high in &Layer::ALL[i + 1..] {
            let rules = RuleSet::from_rules([
                ModuleRule::new(p("low")).with_layer(*low),
                ModuleRule::new(p("high")).with_layer(*high),
            ])
            .unwrap();
            assert_eq!(validate(&rules, &edges(&[("low", "high")])).len(), 1, "{low} -> {high}");
            assert!(validate(&rules, &edges(&[("high", "low")])).is_empty(), "{high} -> {low}");
        }
    }
}

#[test]
fn test_untagged_and_utility_modules_skip_layer_check() {
    let rules = rules_from(
        r#"
[[modules]]
path = "core_mod"
layer = "core"

[[modules]]
path = "untagged"

[[modules]]
path = "ui_util"
layer = "ui"
utility = true
"#,
    );

    let violations = validate(
        &rules,
        &edges(&[("core_mod", "untagged"), ("untagged", "core_mod"), ("core_mod", "ui_util")]),
    );
    assert!(violations.is_empty(), "{violations:?}");
}

// ===== Cycles =====

#[test]
fn test_three_module_cycle_reported_once() {
    let rules = rules_from(
        r#"
forbid_circular_dependencies = true

[[modules]]
path = "X"

[[modules]]
path = "Y"

[[modules]]
path = "Z"
"#,
    );

    let violations = validate(&rules, &edges(&[("X", "Y"), ("Y.inner", "Z"), ("Z", "X.sub")]));
    assert_eq!(violations.len(), 1);
    assert_eq!(violations[0].kind, ViolationKind::CircularDependency);
    assert_eq!(violations[0].cycle, Some(vec![p("X"), p("Y"), p("Z"), p("X")]));
}

#[test]
fn test_cycles_ignored_unless_forbidden() {
    let rules = rules_from(
        r#"
[[modules]]
path = "X"

[[modules]]
path = "Y"
"#,
    );
    let cyclic = edges(&[("X", "Y"), ("Y", "X")]);

    assert!(validate(&rules, &cyclic).is_empty());
    assert_eq!(Checker::new(&rules).forbid_cycles(true).validate(&cyclic).len(), 1);
}

// ===== Determinism =====

#[test]
fn test_validate_is_idempotent() {
    let rules = rules_from(
        r#"
forbid_circular_dependencies = true

[[modules]]
path = "a"
layer = "core"
visibility = []

[[modules]]
path = "b"
layer = "ui"
depends_on = ["c"]

[[modules]]
path = "c"
layer = "tertiary"
cannot_depend_on = ["b"]
"#,
    );
    let input = edges(&[("a", "b"), ("b", "a"), ("b", "c"), ("c", "b"), ("c", "a")]);

    let first = validate(&rules, &input);
    let second = validate(&rules, &input);
    assert!(!first.is_empty());
    assert_eq!(first, second);
}

#[test]
fn test_output_independent_of_input_order() {
    let rules = RuleSet::from_rules(
        (0..20).map(|i| {
            let layer = Layer::ALL[i % 4];
            ModuleRule::new(p(&format!("m{i}"))).with_layer(layer)
        }),
    )
    .unwrap()
    .with_forbid_circular_dependencies(true);

    let mut pairs: Vec<(String, String)> = Vec::new();
    for i in 0..20 {
        for j in (0..20).filter(|j| (i * 7 + j * 3) % 5 == 0) {
            pairs.push((format!("m{i}.x"), format!("m{j}.y")));
        }
    }

    let forward: EdgeSet = pairs
        .iter()
        .map(|(a, b)| Edge::parse(a, b).unwrap())
        .collect();
    let backward: EdgeSet = pairs
        .iter()
        .rev()
        .map(|(a, b)| Edge::parse(a, b).unwrap())
        .collect();

    let expected = validate(&rules, &forward);
    assert!(!expected.is_empty());
    assert_eq!(validate(&rules, &backward), expected);

    let mut sorted = expected.clone();
    sorted.sort_by(Violation::report_order);
    assert_eq!(sorted, expected);
}

#[test]
fn test_undeclared_paths_are_out_of_scope() {
    let rules = rules_from(
        r#"
[[modules]]
path = "pennylane.ops"
depends_on = []
layer = "core"
"#,
    );

    let violations = validate(
        &rules,
        &edges(&[("pennylane.ops", "numpy"), ("scripts.run", "pennylane.ops"), ("x", "y")]),
    );
    assert!(violations.is_empty());
}

#[test]
fn test_deny_entries_need_not_be_declared_modules() {
    let rules = rules_from(
        r#"
cannot_depend_on = ["pennylane.labs"]

[[modules]]
path = "pennylane.ops"
cannot_depend_on = ["pennylane.ftqc"]
"#,
    );

    let violations = validate(
        &rules,
        &edges(&[
            ("pennylane.ops", "pennylane.ftqc.x"),
            ("pennylane.ops", "pennylane.labs.trotter"),
            ("pennylane.ops", "numpy"),
        ]),
    );
    assert_eq!(
        summary(&violations),
        vec![
            (
                ViolationKind::ForbiddenDependency,
                "pennylane.ops".to_string(),
                "pennylane.ftqc.x".to_string()
            ),
            (
                ViolationKind::ForbiddenDependency,
                "pennylane.ops".to_string(),
                "pennylane.labs.trotter".to_string()
            ),
        ]
    );
}

#[test]
fn test_closed_module_rejects_undeclared_importers() {
    let rules = rules_from(
        r#"
[[modules]]
path = "pennylane.internal"
visibility = []

[[modules]]
path = "pennylane.ops"
depends_on = []
layer = "core"
"#,
    );

    let violations = validate(
        &rules,
        &edges(&[
            ("scripts.run", "pennylane.internal.cache"),
            ("pennylane.ops", "numpy"),
            ("tests.unit", "pennylane.ops"),
        ]),
    );
    assert_eq!(
        summary(&violations),
        vec![(
            ViolationKind::Visibility,
            "scripts.run".to_string(),
            "pennylane.internal.cache".to_string()
        )]
    );
}
