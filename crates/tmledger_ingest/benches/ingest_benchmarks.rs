//! Benchmarks for the conversion pipeline.
//!
//! Run with: `cargo bench --package tmledger_ingest`

use criterion::{BenchmarkId, Criterion, Throughput, black_box, criterion_group, criterion_main};

use tmledger_ingest::{ConvertConfig, convert_to_string, lex_bga, read_ledger};

fn bga_log(rounds: usize) -> String {
    let mut text = String::from(
        "Game board: Base Game\n\
         Alice is playing the Witches Faction\n\
         Bob is playing the Nomads Faction\n\
         Alice places a Dwelling [E6]\n\
         Bob places a Dwelling [E7]\n",
    );
    for _ in 0..rounds {
        text.push_str(
            "~ Action phase ~\n\
             Alice upgrades a Dwelling to a Trading house for 2 workers 3 coins [E6]\n\
             Bob pays 1 VP and gets 2 power via Structures [E6]\n\
             Bob does some Conversions (spent: 1 Power ; collects: 1 Coins)\n\
             Alice takes a Favor tile\n\
             Alice gains 2 on the Cult of Water track (Favor tile)\n\
             Bob passes\n\
             Alice passes\n",
        );
    }
    text
}

fn ledger(rounds: usize) -> String {
    let mut text = String::from(
        "Default game options\n\
         option strict-leech\n\
         witches\tbuild E6\n\
         nomads\tbuild E7\n\
         witches\tpass BON1\n\
         nomads\tpass BON2\n",
    );
    for round in 1..=rounds {
        text.push_str(&format!(
            "Round {round} income\n\n\
             Round {round}, turn 1\n\
             witches\tupgrade E6 to TP\n\
             nomads\tLeech 1 from witches\n\
             nomads\tburn 1. convert 1PW to 1C\n\
             witches\tpass BON3\n\
             nomads\tpass BON4\n"
        ));
    }
    text
}

fn bench_lex_bga(c: &mut Criterion) {
    let mut group = c.benchmark_group("bga/lex");
    for rounds in [1, 6, 24] {
        let text = bga_log(rounds);
        group.throughput(Throughput::Bytes(text.len() as u64));
        group.bench_with_input(BenchmarkId::from_parameter(rounds), &text, |b, text| {
            b.iter(|| lex_bga(black_box(text)));
        });
    }
    group.finish();
}

fn bench_read_ledger(c: &mut Criterion) {
    let mut group = c.benchmark_group("ledger/read");
    for rounds in [1, 6, 24] {
        let text = ledger(rounds);
        group.throughput(Throughput::Bytes(text.len() as u64));
        group.bench_with_input(BenchmarkId::from_parameter(rounds), &text, |b, text| {
            b.iter(|| read_ledger(black_box(text)));
        });
    }
    group.finish();
}

fn bench_convert(c: &mut Criterion) {
    let mut group = c.benchmark_group("convert");
    let config = ConvertConfig::annotated();
    for rounds in [6, 24] {
        let text = ledger(rounds);
        group.bench_with_input(BenchmarkId::new("ledger", rounds), &text, |b, text| {
            b.iter(|| convert_to_string(black_box(text), &config));
        });
        let text = bga_log(rounds);
        group.bench_with_input(BenchmarkId::new("bga", rounds), &text, |b, text| {
            b.iter(|| convert_to_string(black_box(text), &config));
        });
    }
    group.finish();
}

criterion_group!(benches, bench_lex_bga, bench_read_ledger, bench_convert);
criterion_main!(benches);
