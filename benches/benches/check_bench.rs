//! # Checker Benchmarks
//!
//! Measures rule validation and cycle detection on synthetic layered graphs.
//!
//! Run: `cargo bench --bench check_bench`

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion, Throughput};
use strata_core::{
    Checker, Dependency, DependencyGraph, Edge, EdgeSet, Layer, ModulePath, ModuleRule, RuleSet,
};

fn path(s: &str) -> ModulePath {
    ModulePath::new(s).unwrap()
}

/// `modules` packages spread over all layers; every third one has an allow-list
fn rules(modules: usize) -> RuleSet {
    RuleSet::from_rules((0..modules).map(|i| {
        let mut rule = ModuleRule::new(path(&format!("pkg.m{i}"))).with_layer(Layer::ALL[i % 4]);
        if i % 3 == 0 {
            rule = rule.with_depends_on(
                (0..modules)
                    .step_by(5)
                    .map(|j| Dependency::new(path(&format!("pkg.m{j}")))),
            );
        }
        if i % 7 == 0 {
            rule = rule.with_cannot_depend_on([path(&format!("pkg.m{}", (i + 1) % modules))]);
        }
        rule
    }))
    .unwrap()
}

/// Roughly `fan_out` submodule-level imports per module, with back edges that form cycles
fn edges(modules: usize, fan_out: usize) -> EdgeSet {
    let mut edges = EdgeSet::new();
    for i in 0..modules {
        for k in 1..=fan_out {
            let j = (i * 31 + k * 17) % modules;
            edges.insert(Edge::new(
                path(&format!("pkg.m{i}.sub{k}")),
                path(&format!("pkg.m{j}.api")),
            ));
        }
    }
    edges
}

fn bench_validate(c: &mut Criterion) {
    let mut group = c.benchmark_group("validate");

    for modules in [50, 200, 1000] {
        let rules = rules(modules);
        let edges = edges(modules, 10);
        group.throughput(Throughput::Elements(edges.len() as u64));

        group.bench_with_input(BenchmarkId::new("edges_only", modules), &edges, |b, edges| {
            let checker = Checker::new(&rules).forbid_cycles(false);
            b.iter(|| black_box(checker.validate(edges)))
        });

        group.bench_with_input(BenchmarkId::new("with_cycles", modules), &edges, |b, edges| {
            let checker = Checker::new(&rules).forbid_cycles(true);
            b.iter(|| black_box(checker.validate(edges)))
        });
    }

    group.finish();
}

fn bench_owner_lookup(c: &mut Criterion) {
    let rules = rules(1000);
    let deep = path("pkg.m999.sub1.inner.leaf");
    let unknown = path("numpy.linalg.norm");

    c.bench_function("owner_lookup_deep", |b| b.iter(|| black_box(rules.owner(&deep))));
    c.bench_function("owner_lookup_miss", |b| b.iter(|| black_box(rules.owner(&unknown))));
}

fn bench_cycles(c: &mut Criterion) {
    let mut group = c.benchmark_group("find_cycles");

    for modules in [200, 1000] {
        let rules = rules(modules);
        let graph = DependencyGraph::from_edges(&rules, &edges(modules, 10));
        group.bench_with_input(BenchmarkId::from_parameter(modules), &graph, |b, graph| {
            b.iter(|| black_box(graph.find_cycles()))
        });
    }

    group.finish();
}

criterion_group!(benches, bench_validate, bench_owner_lookup, bench_cycles);
criterion_main!(benches);
