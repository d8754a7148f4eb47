//! Performance benchmarks for prin

use criterion::{Criterion, black_box, criterion_group, criterion_main};
use prin::emptiness::is_text_semantically_empty;
use prin::test_utils::TestTree;
use prin::tree::FileFilter;
use prin::{FileSystemSource, FilterConfig, OutputFormat, PrintConfig, Printer};

const PYTHON_INIT: &str = r#"#!/usr/bin/env python3
"""
Package docstring explaining the purpose of this package.

This is a longer description with more details.
"""

from __future__ import annotations

import os
from .core import (
    run,
    stop,
)

__all__ = ["run", "stop"]
"#;

const PYTHON_SOURCE: &str = r#""""Module docstring."""

import os

def main():
    print("Hello, world!")
"#;

const RUST_SOURCE: &str = r#"//! Module documentation
//! with multiple lines

use std::path::Path;

/// Main function documentation
fn main() {
    println!("Hello, world!");
}
"#;

const TS_INDEX: &str = r#"/**
 * Barrel file
 */
export * from "./a";
export { b } from "./b";
import type { C } from "./c";
"#;

fn bench_emptiness(c: &mut Criterion) {
    let mut group = c.benchmark_group("emptiness");

    group.bench_function("python_init", |b| {
        b.iter(|| is_text_semantically_empty(black_box("pkg/__init__.py"), black_box(PYTHON_INIT)))
    });

    group.bench_function("python_source", |b| {
        b.iter(|| is_text_semantically_empty(black_box("main.py"), black_box(PYTHON_SOURCE)))
    });

    group.bench_function("rust", |b| {
        b.iter(|| is_text_semantically_empty(black_box("main.rs"), black_box(RUST_SOURCE)))
    });

    group.bench_function("typescript_barrel", |b| {
        b.iter(|| is_text_semantically_empty(black_box("index.ts"), black_box(TS_INDEX)))
    });

    group.finish();
}

fn bench_filter(c: &mut Criterion) {
    let filter = FileFilter::new(&FilterConfig {
        extensions: vec!["py".into(), "rs".into(), "json*".into()],
        exclude: vec!["legacy".into(), "*_pb2.py".into()],
        ..Default::default()
    })
    .unwrap();

    let paths = [
        ("src/app/main.py", "main.py"),
        ("src/app/models_pb2.py", "models_pb2.py"),
        ("node_modules/x/index.js", "index.js"),
        ("legacy/old.rs", "old.rs"),
        ("config/settings.jsonc", "settings.jsonc"),
        ("tests/test_main.py", "test_main.py"),
    ];

    c.bench_function("filter_accepts_file", |b| {
        b.iter(|| {
            for (rel, name) in &paths {
                black_box(filter.accepts_file(black_box(rel), black_box(name)));
            }
        })
    });
}

fn bench_formatters(c: &mut Criterion) {
    let text = RUST_SOURCE.repeat(50);
    let mut group = c.benchmark_group("formatters");

    for format in [OutputFormat::Xml, OutputFormat::Md] {
        let formatter = format.formatter();
        group.bench_function(format!("{:?}", format), |b| {
            b.iter(|| formatter.body(black_box("src/deeply/nested/module.rs"), black_box(&text)))
        });
    }

    group.finish();
}

fn bench_local_walk(c: &mut Criterion) {
    let tree = TestTree::new();
    for i in 0..200 {
        tree.add_file(
            &format!("pkg{}/sub{}/mod{}.py", i % 10, i % 3, i),
            &format!("def f{}():\n    return {}\n", i, i),
        );
    }
    tree.add_file("node_modules/dep/index.js", "module.exports = 1;\n");

    let source = FileSystemSource::with_cwd(tree.path(), false);
    let mut group = c.benchmark_group("local_walk");

    for jobs in [1, 4] {
        let printer = Printer::new(
            OutputFormat::Xml.formatter(),
            &FilterConfig::default(),
            PrintConfig {
                jobs,
                ..Default::default()
            },
        )
        .unwrap();
        group.bench_function(format!("jobs_{}", jobs), |b| {
            b.iter(|| {
                let mut out = Vec::with_capacity(64 * 1024);
                printer.run(&source, &[], &mut out).unwrap();
                black_box(out.len())
            })
        });
    }

    group.finish();
}

criterion_group!(
    benches,
    bench_emptiness,
    bench_filter,
    bench_formatters,
    bench_local_walk
);
criterion_main!(benches);
