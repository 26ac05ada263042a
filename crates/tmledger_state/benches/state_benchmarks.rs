//! Benchmarks for the reference game state.
//!
//! Run with: `cargo bench --package tmledger_state`

use criterion::{Criterion, black_box, criterion_group, criterion_main};

use tmledger_foundation::{Building, Faction, board};
use tmledger_state::GameState;

fn populated() -> GameState {
    let mut state = GameState::new();
    for faction in [Faction::Cultists, Faction::Engineers, Faction::Witches, Faction::Nomads] {
        let _ = state.add_player(faction);
    }
    let owners = [Faction::Cultists, Faction::Engineers, Faction::Witches, Faction::Nomads];
    let land: Vec<_> = board::base_layout()
        .into_iter()
        .filter(|(_, t)| t.is_land())
        .map(|(h, _)| h)
        .take(40)
        .collect();
    for (i, hex) in land.into_iter().enumerate() {
        let _ = state.map.place_building(hex, owners[i % owners.len()], Building::Dwelling);
    }
    state
}

// =============================================================================
// Snapshots
// =============================================================================

fn bench_snapshot(c: &mut Criterion) {
    let state = populated();
    c.bench_function("state/snapshot_clone", |b| b.iter(|| black_box(state.clone())));
}

fn bench_snapshot_then_mutate(c: &mut Criterion) {
    let state = populated();
    c.bench_function("state/snapshot_then_mutate", |b| {
        b.iter(|| {
            let mut next = state.clone();
            if let Ok(player) = next.player_mut(Faction::Cultists) {
                player.coins += 1;
            }
            black_box(next)
        });
    });
}

// =============================================================================
// Rounds
// =============================================================================

fn bench_start_round(c: &mut Criterion) {
    let state = populated();
    let order = [Faction::Cultists, Faction::Engineers, Faction::Witches, Faction::Nomads];
    c.bench_function("state/start_round", |b| {
        b.iter(|| {
            let mut next = state.clone();
            let _ = next.start_round(1, &order);
            black_box(next)
        });
    });
}

criterion_group!(benches, bench_snapshot, bench_snapshot_then_mutate, bench_start_round);
criterion_main!(benches);
