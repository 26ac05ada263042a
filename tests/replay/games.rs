//! Integration tests that replay whole canonical logs

use tmledger_foundation::{Building, ErrorKind, Faction, parse_log_coord};
use tmledger_notation::parse_canonical_log;
use tmledger_replay::{ReplayConfig, Replayer};

const HEADER: &str = "Game: Base
StartingVPs: Dwarves:20, Nomads:20

Setup
TurnOrder: Dwarves, Nomads
------------------------------------------------------------
Dwarves      | Nomads
------------------------------------------------------------
S-E7         | S-E8
";

fn game(round_one: &str) -> Replayer {
    let text = format!(
        "{HEADER}
Round 1
TurnOrder: Dwarves, Nomads
------------------------------------------------------------
Dwarves      | Nomads
------------------------------------------------------------
{round_one}"
    );
    Replayer::new(parse_canonical_log(&text).unwrap())
}

/// Steps until the next item is the first round-1 action.
fn to_round_one(replayer: &mut Replayer) {
    while replayer.round() < 1 {
        replayer.step().unwrap();
    }
}

// =============================================================================
// Whole games
// =============================================================================

#[test]
fn upgrade_with_leech() {
    let mut replayer = game("UP-TH-E7     | L-Dwarves\nPASS         | PASS\n");
    to_round_one(&mut replayer);
    let dwarves = replayer.state().player(Faction::Dwarves).unwrap().clone();
    let nomads = replayer.state().player(Faction::Nomads).unwrap().clone();

    let report = replayer.run().unwrap();
    assert!(report.is_clean());
    let state = replayer.state();
    let e7 = parse_log_coord("E7").unwrap();
    assert_eq!(state.map.structure(e7).map(|s| s.building), Some(Building::TradingHouse));

    let after = state.player(Faction::Dwarves).unwrap();
    assert_eq!(dwarves.workers - after.workers, 2);
    assert_eq!(dwarves.coins - after.coins, 3);

    let leeched = state.player(Faction::Nomads).unwrap();
    assert_eq!(leeched.power.total(), nomads.power.total());
    assert_eq!(leeched.power.bowl2, nomads.power.bowl2 + 1);
    assert_eq!(leeched.vp, nomads.vp);
    assert!(state.all_passed());
}

#[test]
fn leech_without_offer_fails_strictly() {
    let mut replayer = game("PASS         | L-Dwarves\n");
    let err = replayer.run().unwrap_err();
    assert!(matches!(err.kind, ErrorKind::NoPendingOffer { .. }));
    assert!(!replayer.is_finished());
}

#[test]
fn lenient_replay_skips_bad_items() {
    let text = format!("{HEADER}\nRound 1\nTurnOrder: Dwarves, Nomads\nPASS         | L-Dwarves\n");
    let mut replayer = Replayer::with_config(parse_canonical_log(&text).unwrap(), ReplayConfig::lenient());
    let report = replayer.run().unwrap();
    assert_eq!(report.errors.len(), 1);
    assert!(replayer.is_finished());
    assert!(replayer.state().player(Faction::Dwarves).unwrap().passed);
}

#[test]
fn compound_cell_is_one_turn() {
    let mut replayer = game("BURN1.UP-TH-E7 | L-Dwarves\n");
    to_round_one(&mut replayer);
    let before = replayer.state().player(Faction::Dwarves).unwrap().power;
    replayer.run().unwrap();
    let state = replayer.state();
    let after = state.player(Faction::Dwarves).unwrap().power;
    assert_eq!(after.bowl3, before.bowl3 + 1);
    assert_eq!(after.total(), before.total() - 1);
    assert_eq!(state.current_player(), Some(Faction::Nomads));
}

#[test]
fn back_restores_snapshots() {
    let mut replayer = game("UP-TH-E7     | L-Dwarves\n");
    replayer.run().unwrap();
    let e7 = parse_log_coord("E7").unwrap();
    assert_eq!(replayer.back(2), 2);
    assert_eq!(
        replayer.state().map.structure(e7).map(|s| s.building),
        Some(Building::Dwelling)
    );
    assert!(replayer.state().pending.leech_offers(Faction::Nomads).is_empty());
    replayer.step().unwrap();
    assert!(!replayer.state().pending.leech_offers(Faction::Nomads).is_empty());
}
