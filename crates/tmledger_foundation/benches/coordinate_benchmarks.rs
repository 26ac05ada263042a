//! Benchmarks for coordinate and code-table lookups.
//!
//! Run with: `cargo bench --package tmledger_foundation`

use criterion::{Criterion, black_box, criterion_group, criterion_main};

use tmledger_foundation::{Resources, board, format_log_coord, parse_log_coord};

// =============================================================================
// Coordinates
// =============================================================================

fn bench_parse_log_coord(c: &mut Criterion) {
    let mut group = c.benchmark_group("coord/parse");

    group.bench_function("short_row", |b| b.iter(|| parse_log_coord(black_box("B3"))));
    group.bench_function("long_row", |b| b.iter(|| parse_log_coord(black_box("I12"))));

    group.finish();
}

fn bench_format_log_coord(c: &mut Criterion) {
    let hexes: Vec<_> = board::base_layout()
        .into_iter()
        .filter(|(_, t)| t.is_land())
        .map(|(h, _)| h)
        .collect();

    c.bench_function("coord/format_all_land", |b| {
        b.iter(|| {
            for hex in &hexes {
                let _ = black_box(format_log_coord(*hex));
            }
        });
    });
}

// =============================================================================
// Resources
// =============================================================================

fn bench_resource_parse(c: &mut Criterion) {
    c.bench_function("resources/parse", |b| {
        b.iter(|| Resources::parse(black_box("3PW2W1C")));
    });
}

criterion_group!(
    benches,
    bench_parse_log_coord,
    bench_format_log_coord,
    bench_resource_parse
);
criterion_main!(benches);
