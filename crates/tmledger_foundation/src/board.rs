//! The base-game board layout.
//!
//! Nine rows, A to I, alternating 13 and 12 hexes. River hexes are part of
//! the layout so that bridges and river-town references resolve.

use std::collections::HashMap;

use crate::hex::Hex;
use crate::terrain::Terrain;

/// Number of rows on the base board.
pub const ROW_COUNT: usize = 9;

/// Row terrain strings, one character per hex, starting at `q = -(r / 2)`.
///
/// `p` plains, `s` swamp, `l` lakes, `f` forest, `m` mountains,
/// `w` wasteland, `d` desert, `~` river.
pub const ROWS: [&str; ROW_COUNT] = [
    "pmfldwpswflws",
    "d~~ps~~ds~~d",
    "~~s~m~f~f~m~~",
    "fld~~wl~w~wp",
    "spwlspmd~~fsl",
    "mf~~df~~~pmp",
    "~~~m~w~f~dsld",
    "dlp~~~ls~mpm",
    "wsmlwfdpm~lfw",
];

const fn terrain_of(c: u8) -> Option<Terrain> {
    match c {
        b'p' => Some(Terrain::Plains),
        b's' => Some(Terrain::Swamp),
        b'l' => Some(Terrain::Lake),
        b'f' => Some(Terrain::Forest),
        b'm' => Some(Terrain::Mountain),
        b'w' => Some(Terrain::Wasteland),
        b'd' => Some(Terrain::Desert),
        b'~' => Some(Terrain::River),
        _ => None,
    }
}

/// Returns the first `q` of a row.
#[must_use]
#[allow(clippy::cast_possible_truncation, clippy::cast_possible_wrap)]
pub const fn row_start(row: usize) -> i32 {
    -((row / 2) as i32)
}

/// Returns the base terrain at a hex, or `None` if the hex is off the board.
#[must_use]
pub fn terrain_at(hex: Hex) -> Option<Terrain> {
    let row = usize::try_from(hex.r).ok()?;
    let line = ROWS.get(row)?.as_bytes();
    let offset = usize::try_from(hex.q - row_start(row)).ok()?;
    line.get(offset).copied().and_then(terrain_of)
}

/// Returns true if the hex is on the board.
#[must_use]
pub fn on_board(hex: Hex) -> bool {
    terrain_at(hex).is_some()
}

/// Iterates over every hex of one row, in order.
pub fn row_hexes(row: usize) -> impl Iterator<Item = Hex> {
    let len = ROWS.get(row).map_or(0, |line| line.len());
    let start = row_start(row);
    let r = i32::try_from(row).unwrap_or(i32::MAX);
    (0..len).filter_map(move |i| i32::try_from(i).ok().map(|i| Hex::new(start + i, r)))
}

/// Builds the full base layout as a map.
#[must_use]
pub fn base_layout() -> HashMap<Hex, Terrain> {
    (0..ROW_COUNT)
        .flat_map(row_hexes)
        .filter_map(|hex| terrain_at(hex).map(|t| (hex, t)))
        .collect()
}

/// Returns true if two land hexes may be joined by a bridge: they are two
/// steps apart and share a river neighbour.
#[must_use]
pub fn bridgeable(a: Hex, b: Hex) -> bool {
    if a.distance(b) != 2 {
        return false;
    }
    let land = |h: Hex| terrain_at(h).is_some_and(Terrain::is_land);
    if !land(a) || !land(b) {
        return false;
    }
    a.neighbors()
        .into_iter()
        .filter(|n| n.is_adjacent(b))
        .any(|n| terrain_at(n) == Some(Terrain::River))
}
