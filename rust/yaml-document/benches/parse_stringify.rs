// Copyright (c) 2026 Arista Networks, Inc.
// Use of this source code is governed by the Apache License 2.0
// that can be found in the LICENSE file.

use std::fmt::Write as _;

use criterion::{Criterion, criterion_group, criterion_main};
use yaml_document::{Options, parse_all_documents, parse_document};

fn sample_document(items: usize) -> String {
    let mut src = String::from("# generated\nitems:\n");
    for i in 0..items {
        let _ = write!(
            src,
            "  - name: item{i}\n    id: {i}\n    enabled: {}\n    tags: [a, b, \"c {i}\"]\n    note: |\n      line one\n      line two\n",
            i % 2 == 0
        );
    }
    src
}

pub fn benchmark_parse(c: &mut Criterion) {
    let src = sample_document(500);
    let options = Options::default();
    c.bench_function("parse_document", |b| b.iter(|| parse_document(&src, &options)));
    c.bench_function("parse_all_documents", |b| b.iter(|| parse_all_documents(&src, &options)));
}

pub fn benchmark_stringify(c: &mut Criterion) {
    let src = sample_document(500);
    let options = Options::default();
    let Ok(doc) = parse_document(&src, &options) else {
        return;
    };
    c.bench_function("stringify_document", |b| b.iter(|| doc.to_string()));
}

criterion_group!(benches, benchmark_parse, benchmark_stringify);
criterion_main!(benches);
