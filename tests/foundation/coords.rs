//! Integration tests for log coordinates and the board

use proptest::prelude::*;
use tmledger_foundation::board::{bridgeable, terrain_at};
use tmledger_foundation::{ErrorKind, Hex, Terrain, format_log_coord, is_coord, parse_log_coord, parse_river_coord};

// =============================================================================
// Log coordinates
// =============================================================================

#[test]
fn row_e_skips_the_river() {
    let terrains: Vec<Terrain> = (1..=11)
        .map(|n| terrain_at(parse_log_coord(&format!("E{n}")).unwrap()).unwrap())
        .collect();
    assert_eq!(
        terrains,
        vec![
            Terrain::Swamp,
            Terrain::Plains,
            Terrain::Wasteland,
            Terrain::Lake,
            Terrain::Swamp,
            Terrain::Plains,
            Terrain::Mountain,
            Terrain::Desert,
            Terrain::Forest,
            Terrain::Swamp,
            Terrain::Lake,
        ]
    );
}

#[test]
fn coordinates_format_back() {
    for coord in ["A1", "A13", "C2", "D1", "E6", "E11", "I12"] {
        let hex = parse_log_coord(coord).unwrap();
        assert_eq!(format_log_coord(hex).unwrap(), coord);
    }
    assert!(parse_log_coord("I13").is_err());
    assert_eq!(parse_log_coord("e6").unwrap(), parse_log_coord("E6").unwrap());
}

#[test]
fn bad_coordinates() {
    for coord in ["", "E", "E0", "Z3", "E99", "E6x", "6E"] {
        let err = parse_log_coord(coord).unwrap_err();
        assert!(matches!(err.kind, ErrorKind::MalformedCoordinate(_)), "{coord}");
    }
}

#[test]
fn river_references_land_on_river() {
    let hex = parse_river_coord("R~D5").unwrap();
    assert_eq!(terrain_at(hex), Some(Terrain::River));
    assert!(format_log_coord(hex).is_err());
    assert!(parse_river_coord("D5").is_err());
}

#[test]
fn coordinate_shape() {
    assert!(is_coord("E6"));
    assert!(is_coord("i13"));
    assert!(!is_coord("E"));
    assert!(!is_coord("PASS"));
    assert!(!is_coord("E123"));
}

// =============================================================================
// Board geometry
// =============================================================================

#[test]
fn bridges_need_a_river_between() {
    let c1 = parse_log_coord("C1").unwrap();
    let c2 = parse_log_coord("C2").unwrap();
    assert!(bridgeable(c1, c2));
    assert!(bridgeable(c2, c1));
    let e8 = parse_log_coord("E8").unwrap();
    let e9 = parse_log_coord("E9").unwrap();
    // Two river hexes separate E8 from E9.
    assert_eq!(e8.distance(e9), 3);
    assert!(!bridgeable(e8, e9));
}

#[test]
fn hex_distance_is_symmetric() {
    let a = Hex::new(0, 0);
    let b = Hex::new(3, -1);
    assert_eq!(a.distance(b), b.distance(a));
    assert!(a.neighbors().iter().all(|n| a.is_adjacent(*n)));
}

proptest! {
    #[test]
    fn parsing_any_text_never_panics(text in "\\PC{0,6}") {
        let _ = parse_log_coord(&text);
        let _ = parse_river_coord(&text);
    }

    #[test]
    fn every_land_coordinate_round_trips(row in 0usize..9, n in 1usize..14) {
        let coord = format!("{}{n}", char::from(b'A' + u8::try_from(row).unwrap()));
        if let Ok(hex) = parse_log_coord(&coord) {
            prop_assert_eq!(format_log_coord(hex).unwrap(), coord);
        }
    }
}
