//! Axial hex coordinates.

use std::fmt;

/// The six axial neighbour offsets, clockwise from east.
pub const DIRECTIONS: [(i32, i32); 6] = [(1, 0), (1, -1), (0, -1), (-1, 0), (-1, 1), (0, 1)];

/// An axial hex coordinate.
///
/// `r` is the board row (0 = row A); `q` runs along the row and starts at
/// `-(r / 2)` on the base board.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Hex {
    /// Column axis.
    pub q: i32,
    /// Row axis.
    pub r: i32,
}

impl Hex {
    /// Creates a hex from axial components.
    #[must_use]
    pub const fn new(q: i32, r: i32) -> Self {
        Self { q, r }
    }

    /// Returns the neighbour in one of the six [`DIRECTIONS`].
    #[must_use]
    pub const fn neighbor(self, direction: usize) -> Self {
        let (dq, dr) = DIRECTIONS[direction % 6];
        Self::new(self.q + dq, self.r + dr)
    }

    /// Returns all six neighbours in direction order.
    #[must_use]
    pub fn neighbors(self) -> [Self; 6] {
        std::array::from_fn(|i| self.neighbor(i))
    }

    /// Returns the hex-grid distance between two hexes.
    #[must_use]
    pub const fn distance(self, other: Self) -> u32 {
        let dq = self.q - other.q;
        let dr = self.r - other.r;
        (dq.unsigned_abs() + dr.unsigned_abs() + (dq + dr).unsigned_abs()) / 2
    }

    /// Returns true if the two hexes share an edge.
    #[must_use]
    pub const fn is_adjacent(self, other: Self) -> bool {
        self.distance(other) == 1
    }
}

impl fmt::Display for Hex {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({}, {})", self.q, self.r)
    }
}
