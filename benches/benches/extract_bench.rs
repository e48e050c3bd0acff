//! # Import Scanner Benchmarks
//!
//! Measures statement parsing of Python sources.
//!
//! Run: `cargo bench --bench extract_bench`

use criterion::{black_box, criterion_group, criterion_main, Criterion, Throughput};
use strata_core::extract::parse_imports;
use strata_core::ModulePath;

const HEADER: &str = r#""""Quantum operations.

import this_is_documentation
"""
from __future__ import annotations

import functools
import numpy as np
from typing import (
    Any,
    Sequence,
)

from pennylane.operation import Operator, Operation  # base classes
from . import measurements
from ..wires import Wires
from .utils import *
"#;

fn source(repeat: usize) -> String {
    let mut source = String::from(HEADER);
    for i in 0..repeat {
        source.push_str(&format!(
            "\n\ndef op_{i}(x):\n    \"\"\"Apply.\"\"\"\n    \
             from pennylane.math import cos as c{i}\n    return c{i}(x)\n"
        ));
    }
    source
}

fn bench_parse_imports(c: &mut Criterion) {
    let mut group = c.benchmark_group("parse_imports");
    let module = ModulePath::new("pennylane.ops.qubit").unwrap();

    for repeat in [0, 100] {
        let source = source(repeat);
        group.throughput(Throughput::Bytes(source.len() as u64));
        group.bench_function(format!("functions_{repeat}"), |b| {
            b.iter(|| black_box(parse_imports(black_box(&source), &module, false)))
        });
    }

    group.finish();
}

criterion_group!(benches, bench_parse_imports);
criterion_main!(benches);
