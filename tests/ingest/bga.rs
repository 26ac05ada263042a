//! Integration tests for the BGA narrative lexer

use tmledger_foundation::Faction;
use tmledger_ingest::{ConvertConfig, SourceFormat, bga_html_to_text, convert_to_string, detect_format, lex_bga};
use tmledger_notation::{LogItem, parse_canonical_log};

const LOG: &str = "Game board: Base Game
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

fn actions(items: &[LogItem]) -> Vec<String> {
    items
        .iter()
        .filter_map(LogItem::as_action)
        .map(ToString::to_string)
        .collect()
}

#[test]
fn narrative_becomes_actions() {
    let items = lex_bga(LOG).unwrap();
    assert_eq!(actions(&items), vec!["S-E7", "S-E8", "UP-TH-E7", "L1-Dwarves", "PASS", "PASS"]);
    let LogItem::GameSettings(settings) = &items[0] else {
        panic!("settings first");
    };
    assert_eq!(settings.factions(), vec![Faction::Dwarves, Faction::Nomads]);
}

#[test]
fn detected_and_converted() {
    assert_eq!(detect_format(LOG), SourceFormat::BgaText);
    let text = convert_to_string(LOG, &ConvertConfig::default()).unwrap();
    assert_eq!(detect_format(&text), SourceFormat::Canonical);
    let items = parse_canonical_log(&text).unwrap();
    assert_eq!(actions(&items).len(), 6);
}

#[test]
fn html_page_flattens_to_the_same_log() {
    let html = format!(
        "<html><body><div id=\"gamelogs\">{}</div></body></html>",
        LOG.lines()
            .map(|line| format!("<div class=\"gamelogreview\">{line}</div>"))
            .collect::<String>()
    );
    let flat = bga_html_to_text(&html);
    let items = lex_bga(&flat).unwrap();
    assert_eq!(actions(&items), actions(&lex_bga(LOG).unwrap()));
}

#[test]
fn conversion_between_reaction_and_pass_round_trips() {
    let log = LOG.replace(
        "Alice passes\n",
        "Alice does some Conversions (spent: 1 Power ; collects: 1 Coins)\nAlice passes\n",
    );
    let text = convert_to_string(&log, &ConvertConfig::default()).unwrap();
    assert!(text.contains("C1PW:1C.PASS"), "{text}");
    let items = parse_canonical_log(&text).unwrap();
    assert_eq!(actions(&items).len(), 6);
}
