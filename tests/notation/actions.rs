//! Integration tests for action codes

use tmledger_foundation::{Building, CultTrack, ErrorKind, Faction, PowerAction, parse_log_coord};
use tmledger_notation::{Action, SpecialAction, compound_has_main, parse_action_code};

fn parse(faction: Faction, code: &str) -> Action {
    parse_action_code(faction, code).unwrap_or_else(|e| panic!("{code}: {e}"))
}

// =============================================================================
// Single actions
// =============================================================================

#[test]
fn builds_and_upgrades() {
    let e6 = parse_log_coord("E6").unwrap();
    assert_eq!(parse(Faction::Witches, "E6"), Action::Build { player: Faction::Witches, hex: e6 });
    assert_eq!(
        parse(Faction::Witches, "S-E6"),
        Action::SetupDwelling {
            player: Faction::Witches,
            hex: e6
        }
    );
    assert_eq!(
        parse(Faction::Witches, "UP-TH-E6"),
        Action::Upgrade {
            player: Faction::Witches,
            hex: e6,
            to: Building::TradingHouse
        }
    );
}

#[test]
fn canonical_codes_print_back() {
    for code in ["S-E6", "E6", "UP-TH-E7", "PASS", "L-Engineers", "DL", "BURN3", "+SHIP", "ACT-BON-E"] {
        let action = parse(Faction::Cultists, code);
        let reparsed = parse(Faction::Cultists, &action.to_string());
        assert_eq!(action, reparsed, "{code}");
    }
}

#[test]
fn power_and_cult_actions() {
    assert!(matches!(
        parse(Faction::Auren, "ACT6"),
        Action::PowerAction {
            action: PowerAction::TwoSpades,
            ..
        }
    ));
    assert!(matches!(
        parse(Faction::Auren, "+W"),
        Action::CultAdvance {
            track: CultTrack::Water,
            ..
        }
    ));
    assert!(matches!(
        parse(Faction::Auren, "ACT-SH-A"),
        Action::Special {
            action: SpecialAction::AurenCult(CultTrack::Air),
            ..
        }
    ));
}

#[test]
fn unknown_codes_are_rejected() {
    for code in ["", "XYZ", "UP-XX-E6", "E99", "L-Orcs"] {
        assert!(parse_action_code(Faction::Witches, code).is_err(), "{code}");
    }
    let err = parse_action_code(Faction::Witches, "XYZ").unwrap_err();
    assert!(matches!(err.kind, ErrorKind::UnknownToken { .. }));
}

// =============================================================================
// Compounds and turn classification
// =============================================================================

#[test]
fn compounds_know_their_main_action() {
    let Action::Compound(parts) = parse(Faction::Witches, "BURN2.UP-TH-E6") else {
        panic!("expected compound");
    };
    assert!(compound_has_main(&parts));
    let Action::Compound(parts) = parse(Faction::Witches, "BURN2.C1PW:1C") else {
        panic!("expected compound");
    };
    assert!(!compound_has_main(&parts));
}

#[test]
fn reactions_are_auxiliary() {
    assert!(parse(Faction::Witches, "L").is_auxiliary());
    assert!(parse(Faction::Witches, "DL-Nomads").is_auxiliary());
    assert!(!parse(Faction::Witches, "PASS").is_auxiliary());
    assert!(parse(Faction::Witches, "UP-TE-E6").is_trigger_capable());
    assert!(!parse(Faction::Witches, "BURN1").is_trigger_capable());
}
