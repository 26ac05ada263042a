//! Whole-pipeline tests: narrative log to canonical notation to replay

use tmledger_foundation::{Building, Faction, parse_log_coord};
use tmledger_ingest::{ConvertConfig, convert_to_string, load_items};
use tmledger_notation::parse_canonical_log;
use tmledger_replay::Replayer;

const BGA: &str = "Game board: Base Game
Alice is playing the Dwarves Faction
Bob is playing the Nomads Faction
Every player has chosen a Faction
Alice places a Dwelling [E7]
Bob places a Dwelling [E8]
~ Action phase ~
Alice upgrades a Dwelling to a Trading house for 2 workers 3 coins [E7]
Bob gets 1 power via Structures [E7]
Alice passes
Bob passes
";

fn replay(items: Vec<tmledger_notation::LogItem>) -> Replayer {
    let mut replayer = Replayer::new(items);
    let report = replayer.run().unwrap_or_else(|e| panic!("replay failed: {e} {:?}", e.context));
    assert!(report.is_clean());
    replayer
}

#[test]
fn narrative_log_replays() {
    let replayer = replay(load_items(BGA, &ConvertConfig::default()).unwrap());
    let state = replayer.state();
    let e7 = parse_log_coord("E7").unwrap();
    assert_eq!(state.map.structure(e7).map(|s| s.building), Some(Building::TradingHouse));
    assert!(state.all_passed());
    assert_eq!(replayer.round(), 1);
}

#[test]
fn canonical_text_replays_the_same() {
    let direct = replay(load_items(BGA, &ConvertConfig::default()).unwrap());
    let text = convert_to_string(BGA, &ConvertConfig::annotated()).unwrap();
    let via_text = replay(parse_canonical_log(&text).unwrap());
    for faction in [Faction::Dwarves, Faction::Nomads] {
        assert_eq!(
            direct.state().player(faction),
            via_text.state().player(faction),
            "{faction} differs"
        );
    }
}

#[test]
fn conversion_is_idempotent() {
    let config = ConvertConfig::default();
    let once = convert_to_string(BGA, &config).unwrap();
    let twice = convert_to_string(&once, &config).unwrap();
    assert_eq!(once, twice);
}
