//! Log coordinates.
//!
//! Both ledger formats name hexes as a row letter followed by the index of
//! the hex among the row's land hexes: `D5` is the fifth non-river hex of
//! row D. River hexes are referenced through a land neighbour as `R~D5`.

use crate::board::{self, ROW_COUNT};
use crate::error::{Error, Result};
use crate::hex::Hex;
use crate::terrain::Terrain;

const ROW_LETTERS: &[u8; ROW_COUNT] = b"ABCDEFGHI";

/// Parses a log coordinate such as `D5` (case-insensitive).
///
/// # Errors
///
/// Returns [`MalformedCoordinate`](crate::ErrorKind::MalformedCoordinate) if
/// the row letter or number is invalid, or the row has fewer land hexes.
pub fn parse_log_coord(coord: &str) -> Result<Hex> {
    let trimmed = coord.trim();
    let upper = trimmed.to_ascii_uppercase();
    let mut chars = upper.chars();
    let letter = chars.next().ok_or_else(|| Error::malformed_coordinate(coord))?;
    let row = ROW_LETTERS
        .iter()
        .position(|l| char::from(*l) == letter)
        .ok_or_else(|| Error::malformed_coordinate(coord))?;
    let digits = chars.as_str();
    if digits.is_empty() || !digits.bytes().all(|b| b.is_ascii_digit()) {
        return Err(Error::malformed_coordinate(coord));
    }
    let n: usize = digits.parse().map_err(|_| Error::malformed_coordinate(coord))?;
    if n == 0 {
        return Err(Error::malformed_coordinate(coord));
    }
    board::row_hexes(row)
        .filter(|h| board::terrain_at(*h).is_some_and(Terrain::is_land))
        .nth(n - 1)
        .ok_or_else(|| Error::malformed_coordinate(coord))
}

/// Formats a land hex as a log coordinate.
///
/// # Errors
///
/// Returns [`MalformedCoordinate`](crate::ErrorKind::MalformedCoordinate) for
/// river hexes and hexes off the board.
pub fn format_log_coord(hex: Hex) -> Result<String> {
    let terrain = board::terrain_at(hex).ok_or_else(|| Error::malformed_coordinate(hex.to_string()))?;
    if !terrain.is_land() {
        return Err(Error::malformed_coordinate(hex.to_string()));
    }
    let row = usize::try_from(hex.r).map_err(|_| Error::malformed_coordinate(hex.to_string()))?;
    let index = board::row_hexes(row)
        .take_while(|h| *h != hex)
        .filter(|h| board::terrain_at(*h).is_some_and(Terrain::is_land))
        .count();
    Ok(format!("{}{}", char::from(ROW_LETTERS[row]), index + 1))
}

/// Parses a river reference `R~D5` into the first river neighbour of `D5`.
///
/// # Errors
///
/// Returns [`MalformedCoordinate`](crate::ErrorKind::MalformedCoordinate) if
/// the prefix is missing, the land coordinate is invalid, or no neighbour is
/// river.
pub fn parse_river_coord(coord: &str) -> Result<Hex> {
    let trimmed = coord.trim();
    let land = trimmed
        .strip_prefix("R~")
        .or_else(|| trimmed.strip_prefix("r~"))
        .ok_or_else(|| Error::malformed_coordinate(coord))?;
    let hex = parse_log_coord(land)?;
    hex.neighbors()
        .into_iter()
        .find(|n| board::terrain_at(*n) == Some(Terrain::River))
        .ok_or_else(|| Error::malformed_coordinate(coord))
}

/// Returns true if the text looks like a log coordinate: a row letter A-I
/// followed only by one or two digits.
#[must_use]
pub fn is_coord(text: &str) -> bool {
    let bytes = text.as_bytes();
    if !(2..=3).contains(&bytes.len()) {
        return false;
    }
    let letter = bytes[0].to_ascii_uppercase();
    ROW_LETTERS.contains(&letter) && bytes[1..].iter().all(u8::is_ascii_digit)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_known_coordinates() {
        assert_eq!(parse_log_coord("E6").unwrap(), Hex::new(3, 4));
        assert_eq!(parse_log_coord("e7").unwrap(), Hex::new(4, 4));
        assert_eq!(parse_log_coord("A1").unwrap(), Hex::new(0, 0));
        // C1 skips the two river hexes at the start of row C.
        assert_eq!(parse_log_coord("C1").unwrap(), Hex::new(1, 2));
    }

    #[test]
    fn rejects_malformed() {
        for bad in ["", "Z1", "A0", "A", "A14", "E6x", "C2PW:2C"] {
            assert!(parse_log_coord(bad).is_err(), "{bad}");
        }
    }

    #[test]
    fn format_inverts_parse() {
        for coord in ["A1", "B3", "C5", "E6", "I12"] {
            let hex = parse_log_coord(coord).unwrap();
            assert_eq!(format_log_coord(hex).unwrap(), coord);
        }
    }

    #[test]
    fn format_rejects_river_and_off_board() {
        assert!(format_log_coord(Hex::new(1, 1)).is_err());
        assert!(format_log_coord(Hex::new(40, 0)).is_err());
    }

    #[test]
    fn river_reference_finds_neighbour() {
        let river = parse_river_coord("R~D5").unwrap();
        assert_eq!(board::terrain_at(river), Some(Terrain::River));
        assert!(river.is_adjacent(parse_log_coord("D5").unwrap()));
        assert!(parse_river_coord("D5").is_err());
    }

    #[test]
    fn coord_shape() {
        assert!(is_coord("C2"));
        assert!(is_coord("i12"));
        assert!(!is_coord("C2PW:2C"));
        assert!(!is_coord("J2"));
        assert!(!is_coord("UP-TH-C2"));
    }
}
