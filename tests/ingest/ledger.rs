//! Integration tests for the Snellman ledger lexer and reconstruction

use tmledger_foundation::{ErrorKind, Faction};
use tmledger_ingest::{
    Cell, ConvertConfig, RoundGrid, SourceFormat, adjacency_holds, convert, convert_to_string, detect_format,
    load_items, read_ledger, reconstruct, snellman_html_to_text,
};
use tmledger_notation::LogItem;

const LEDGER: &str = "Default game options
option strict-leech
option variable-turn-order
Round 1 scoring: SCORE2, TOWN >> 5
Removing tile BON3
witches\t20 VP\t\t15 C\t3 W\t0 P\t5/7/0 PW\t0/0/0/0\tbuild E6
nomads\t20 VP\t\t15 C\t2 W\t0 P\t5/7/0 PW\t1/0/1/0\tbuild F4
witches\t20 VP\t\t15 C\t2 W\t0 P\t5/7/0 PW\t0/0/0/0\tbuild E7
nomads\t20 VP\t\t15 C\t1 W\t0 P\t5/7/0 PW\t1/0/1/0\tbuild F5
nomads\t20 VP\t\t15 C\t1 W\t0 P\t5/7/0 PW\t1/0/1/0\tpass BON1
witches\t20 VP\t\t15 C\t1 W\t0 P\t5/7/0 PW\t0/0/0/0\tpass BON7
Round 1 income
witches\t+3 C\tfor income
Round 1, turn 1
witches\t20 VP\t-2 C\t13 C\t1 W\t0 P\t5/7/0 PW\t0/0/0/0\tupgrade E6 to TP
nomads\t20 VP\t+1 PW\t\t\t\t4/8/0 PW\t1/0/1/0\tLeech 1 from witches
nomads\t20 VP\t\t\t\t\t\t1/0/1/0\tpass BON3
witches\t20 VP\t\t\t\t\t\t0/0/0/0\tpass BON1
";

// =============================================================================
// Ledger documents
// =============================================================================

#[test]
fn ledger_is_detected() {
    assert_eq!(detect_format(LEDGER), SourceFormat::LedgerText);
}

#[test]
fn header_and_setup() {
    let doc = read_ledger(LEDGER).unwrap();
    assert_eq!(doc.factions, vec![Faction::Witches, Faction::Nomads]);
    assert!(doc.variable_turn_order);
    assert_eq!(doc.rounds.len(), 1);
}

#[test]
fn leech_follows_its_source() {
    let log = convert(LEDGER, &ConvertConfig::annotated()).unwrap();
    let round = log.sections.iter().find(|s| s.round == 1).unwrap();
    let witches = round.turn_order.iter().position(|f| *f == Faction::Witches).unwrap();
    let nomads = round.turn_order.iter().position(|f| *f == Faction::Nomads).unwrap();
    let cell = |row: &Vec<String>, col: usize| row.get(col).cloned().unwrap_or_default();
    let upgrade = round.rows.iter().position(|row| cell(row, witches) == "UP-TH-E6").unwrap();
    let leech = round.rows.iter().position(|row| cell(row, nomads) == "L-Witches").unwrap();
    assert!(
        leech > upgrade || (leech == upgrade && nomads > witches),
        "leech at row {leech}, upgrade at row {upgrade}"
    );
}

#[test]
fn annotation_is_optional() {
    let raw = convert_to_string(LEDGER, &ConvertConfig::raw().with_annotations(true)).unwrap();
    assert!(raw.contains("UP-TH-E6"));
    let annotated = convert_to_string(LEDGER, &ConvertConfig::annotated()).unwrap();
    assert!(annotated.contains("L-Witches"));
    assert!(!convert_to_string(LEDGER, &ConvertConfig::default()).unwrap().contains("L-Witches"));
}

#[test]
fn ledger_items_parse_back() {
    let items = load_items(LEDGER, &ConvertConfig::default()).unwrap();
    assert!(matches!(items[0], LogItem::GameSettings(_)));
    let reactions = items
        .iter()
        .filter_map(LogItem::as_action)
        .filter(|a| a.is_auxiliary() && a.to_string().starts_with('L'))
        .count();
    assert_eq!(reactions, 1);
}

#[test]
fn conversion_before_a_pass_loads() {
    let ledger = LEDGER.replace(
        "witches\t20 VP\t\t\t\t\t\t0/0/0/0\tpass BON1\n",
        "Round 1, turn 2\n\
         witches\t20 VP\t\t\t\t\t\t0/0/0/0\tconvert 1PW to 1C\n\
         witches\t20 VP\t\t\t\t\t\t0/0/0/0\tpass BON1\n",
    );
    assert_ne!(ledger, LEDGER);
    let text = convert_to_string(&ledger, &ConvertConfig::default()).unwrap();
    assert!(text.contains("C1PW:1C.PASS-"), "{text}");
    let items = load_items(&ledger, &ConvertConfig::default()).unwrap();
    assert!(
        items
            .iter()
            .filter_map(LogItem::as_action)
            .any(|a| a.to_string().starts_with("C1PW:1C.PASS"))
    );
}

const TWO_LEECHES: &str = "Default game options
option strict-leech
Round 1 scoring: SCORE2, TOWN >> 5
cultists\t20 VP\t\t15 C\t3 W\t0 P\t5/7/0 PW\t1/0/1/0\tbuild E5
darklings\t20 VP\t\t15 C\t2 W\t1 P\t5/7/0 PW\t0/1/1/0\tbuild E4
witches\t20 VP\t\t15 C\t2 W\t0 P\t5/7/0 PW\t0/0/0/2\tbuild E6
cultists\t20 VP\t\t15 C\t3 W\t0 P\t5/7/0 PW\t1/0/1/0\tpass BON1
darklings\t20 VP\t\t15 C\t2 W\t1 P\t5/7/0 PW\t0/1/1/0\tpass BON2
witches\t20 VP\t\t15 C\t2 W\t0 P\t5/7/0 PW\t0/0/0/2\tpass BON4
Round 1 income
witches\t+3 C\tfor income
Round 1, turn 1
cultists\t20 VP\t-2 C\t13 C\t2 W\t0 P\t5/7/0 PW\t1/0/1/0\tbuild D5
darklings\t20 VP\t-2 C\t13 C\t1 W\t1 P\t5/7/0 PW\t0/1/1/0\tbuild G3
witches\t20 VP\t+1 PW\t\t\t\t4/8/0 PW\t0/0/0/2\tLeech 1 from cultists
witches\t20 VP\t+1 PW\t\t\t\t3/9/0 PW\t0/0/0/2\tLeech 1 from darklings
";

// Walks back row-major from a cell to the first non-reaction token.
fn previous_action(rows: &[Vec<String>], width: usize, row: usize, col: usize) -> Option<String> {
    let cells: Vec<&str> = rows
        .iter()
        .flat_map(|r| (0..width).map(move |c| r.get(c).map_or("", String::as_str)))
        .collect();
    cells[..row * width + col]
        .iter()
        .rev()
        .find(|cell| !cell.is_empty() && !cell.starts_with('L') && !cell.starts_with("DL"))
        .map(|cell| (*cell).to_string())
}

#[test]
fn two_leeches_bind_to_their_own_sources() {
    let log = convert(TWO_LEECHES, &ConvertConfig::annotated()).unwrap();
    let round = log.sections.iter().find(|s| s.round == 1).unwrap();
    let witches = round.turn_order.iter().position(|f| *f == Faction::Witches).unwrap();
    let find = |token: &str| {
        round
            .rows
            .iter()
            .position(|row| row.get(witches).is_some_and(|c| c == token))
            .unwrap_or_else(|| panic!("{token} missing from {:?}", round.rows))
    };
    let from_cultists = find("L-Cultists");
    let from_darklings = find("L-Darklings");
    assert_ne!(from_cultists, from_darklings);
    assert_eq!(previous_action(&round.rows, round.turn_order.len(), from_cultists, witches).as_deref(), Some("D5"));
    assert_eq!(previous_action(&round.rows, round.turn_order.len(), from_darklings, witches).as_deref(), Some("G3"));
}

#[test]
fn ledger_page_without_table_is_an_html_error() {
    let err = snellman_html_to_text("<html><body><p>nothing here</p></body></html>").unwrap_err();
    assert!(matches!(err.kind, ErrorKind::Html(_)));
}

// =============================================================================
// Reconstruction
// =============================================================================

#[test]
fn reconstruction_restores_adjacency() {
    let mut grid = RoundGrid::new(1, vec![Faction::Witches, Faction::Nomads]);
    grid.set(0, Faction::Witches, Cell::reaction("L", Faction::Nomads));
    grid.set(0, Faction::Nomads, Cell::new("F4"));
    assert!(!adjacency_holds(&grid));
    reconstruct(&mut grid).unwrap();
    assert!(adjacency_holds(&grid));
}
