// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Criterion benchmarks for the request side of the pipeline: page range
// parsing, per-document expansion, and edit file parsing.

use criterion::{Criterion, black_box, criterion_group, criterion_main};

use stampwerk_core::geometry::parse_page_range;
use stampwerk_core::types::{EditSet, PageTarget, Point, TextEdit};
use stampwerk_pipeline::{expand, parse_edit_config};

/// A mixed range over a 500-page document.
fn bench_page_range(c: &mut Criterion) {
    c.bench_function("parse_page_range (500 pages)", |b| {
        b.iter(|| parse_page_range(black_box("1-50,75,100-200,300-,12,3-9"), black_box(500)));
    });
}

/// Expanding a watermark and a header onto a 200-page document.
fn bench_expand(c: &mut Criterion) {
    let edits = EditSet::new(
        vec![
            TextEdit {
                page: PageTarget::AllPages,
                rotation: Some(45.0),
                ..TextEdit::new("CONFIDENTIAL", Point { x: 145.0, y: 270.0 })
            },
            TextEdit {
                page: PageTarget::Range("1-100".into()),
                ..TextEdit::new("Draft", Point { x: 50.0, y: 800.0 })
            },
        ],
        Vec::new(),
        Vec::new(),
        Vec::new(),
    );

    c.bench_function("expand (200 pages)", |b| {
        b.iter(|| black_box(expand(black_box(&edits), 200)));
    });
}

fn bench_parse_edit_config(c: &mut Criterion) {
    let json = r##"{
        "text": [
            {"text": "APPROVED", "x": 450, "y": 50, "font_size": 24, "color": "#2e7d32"},
            {"text": "DRAFT", "x": 100, "y": 400, "all_pages": true, "rotation": 45}
        ],
        "signatures": [{"box": [400, 50, 550, 100], "text": "Jane Doe"}],
        "forms": {"name": "Jane Doe", "agree": true}
    }"##;

    c.bench_function("parse_edit_config", |b| {
        b.iter(|| parse_edit_config(black_box(json)));
    });
}

criterion_group!(benches, bench_page_range, bench_expand, bench_parse_edit_config);
criterion_main!(benches);
