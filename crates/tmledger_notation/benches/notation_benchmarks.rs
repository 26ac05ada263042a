//! Benchmarks for canonical parsing and emission.
//!
//! Run with: `cargo bench --package tmledger_notation`

use criterion::{BenchmarkId, Criterion, black_box, criterion_group, criterion_main};

use tmledger_foundation::Faction;
use tmledger_notation::{emit_items, parse_action_code, parse_canonical_log};

const CELLS: &[&str] = &[
    "E6",
    "UP-TH-E6.+E",
    "BURN3.C5PW:1P.+SHIP",
    "ACTS-B5.B5.C1PW:1C",
    "-F.-W.-E.TW8VP",
    "L3-ChaosMagicians",
];

fn synthetic_log(rounds: usize) -> String {
    let mut text = String::from("Game: Base\nStartingVPs: Cultists:20, Engineers:20\n");
    for round in 1..=rounds {
        text.push_str(&format!(
            "\nRound {round}\nTurnOrder: Cultists, Engineers\n\
             ------------------------------------------------------------\n\
             Cultists     | Engineers\n\
             ------------------------------------------------------------\n\
             UP-TH-E6.+E  | L-Cultists\n\
             BURN1.C1PW:1C.+SHIP | ACT3\n\
             PASS-BON-BB  | PASS-BON-SPD\n"
        ));
    }
    text
}

// =============================================================================
// Cell parsing
// =============================================================================

fn bench_parse_cells(c: &mut Criterion) {
    let mut group = c.benchmark_group("parse/cell");
    for cell in CELLS {
        group.bench_with_input(BenchmarkId::from_parameter(cell), cell, |b, cell| {
            b.iter(|| parse_action_code(Faction::Cultists, black_box(cell)));
        });
    }
    group.finish();
}

// =============================================================================
// Whole documents
// =============================================================================

fn bench_parse_document(c: &mut Criterion) {
    let mut group = c.benchmark_group("parse/document");
    for rounds in [1, 6, 24] {
        let text = synthetic_log(rounds);
        group.bench_with_input(BenchmarkId::from_parameter(rounds), &text, |b, text| {
            b.iter(|| parse_canonical_log(black_box(text)));
        });
    }
    group.finish();
}

fn bench_emit_document(c: &mut Criterion) {
    let items = parse_canonical_log(&synthetic_log(6)).unwrap_or_default();
    c.bench_function("emit/six_rounds", |b| {
        b.iter(|| emit_items(black_box(&items)).log.render());
    });
}

criterion_group!(
    benches,
    bench_parse_cells,
    bench_parse_document,
    bench_emit_document
);
criterion_main!(benches);
