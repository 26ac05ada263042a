//! The round grid.
//!
//! Rows live in an arena and are addressed two ways: by display position,
//! which shifts as rows are inserted, and by [`RowId`], which never does.
//! Placement keeps its per-faction bookkeeping in `RowId`s, so inserting a
//! row needs no re-keying. A reaction cell carries its anchor (the faction
//! whose action it answers), so moving the cell moves the anchor with it.

use std::collections::HashMap;

use tmledger_foundation::Faction;
use tmledger_notation::classify::{is_reaction_token, token_may_trigger, with_reaction_source};

/// Stable identity of a grid row.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct RowId(u32);

/// One grid cell.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Cell {
    /// Dot-joined canonical tokens.
    pub token: String,
    /// For a reaction, the faction whose action triggered it.
    pub anchor: Option<Faction>,
}

impl Cell {
    /// Creates an unanchored cell.
    #[must_use]
    pub fn new(token: impl Into<String>) -> Self {
        Self {
            token: token.into(),
            anchor: None,
        }
    }

    /// Creates a reaction cell anchored to `source`.
    #[must_use]
    pub fn reaction(token: impl Into<String>, source: Faction) -> Self {
        Self {
            token: token.into(),
            anchor: Some(source),
        }
    }

    /// Returns true for a leech accept or decline.
    #[must_use]
    pub fn is_reaction(&self) -> bool {
        is_reaction_token(&self.token)
    }

    /// Returns true if the cell could have made a leech offer.
    #[must_use]
    pub fn may_trigger(&self) -> bool {
        !self.is_reaction() && token_may_trigger(&self.token)
    }

    /// Renders the cell, optionally naming the reaction's source.
    #[must_use]
    pub fn render(&self, annotate: bool) -> String {
        match self.anchor {
            Some(source) if annotate && self.is_reaction() => with_reaction_source(&self.token, source),
            _ => self.token.clone(),
        }
    }
}

/// A position in the grid.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Pos {
    /// Display row.
    pub row: usize,
    /// Column index.
    pub col: usize,
}

/// A cell lifted out of the grid, remembering its column.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Event {
    /// Column index.
    pub col: usize,
    /// The cell.
    pub cell: Cell,
}

/// The rows of one round, one column per faction in turn order.
#[derive(Clone, Debug, Default)]
pub struct RoundGrid {
    /// Round number.
    pub round: u8,
    /// Column factions.
    pub columns: Vec<Faction>,
    /// Factions in the order they passed.
    pub pass_order: Vec<Faction>,
    arena: Vec<HashMap<Faction, Cell>>,
    order: Vec<RowId>,
}

impl RoundGrid {
    /// Creates an empty grid.
    #[must_use]
    pub fn new(round: u8, columns: Vec<Faction>) -> Self {
        Self {
            round,
            columns,
            ..Self::default()
        }
    }

    /// Number of rows.
    #[must_use]
    pub fn len(&self) -> usize {
        self.order.len()
    }

    /// Returns true if the grid has no rows.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.order.is_empty()
    }

    /// Column index of a faction.
    #[must_use]
    pub fn column_of(&self, faction: Faction) -> Option<usize> {
        self.columns.iter().position(|f| *f == faction)
    }

    /// Stable id of the row at `row`.
    #[must_use]
    pub fn id_at(&self, row: usize) -> Option<RowId> {
        self.order.get(row).copied()
    }

    /// Current display position of a row.
    #[must_use]
    pub fn position(&self, id: RowId) -> Option<usize> {
        self.order.iter().position(|r| *r == id)
    }

    fn slot(&self, row: usize) -> Option<&HashMap<Faction, Cell>> {
        let id = self.order.get(row)?;
        self.arena.get(id.0 as usize)
    }

    fn slot_mut(&mut self, row: usize) -> Option<&mut HashMap<Faction, Cell>> {
        let id = *self.order.get(row)?;
        self.arena.get_mut(id.0 as usize)
    }

    fn new_row(&mut self) -> RowId {
        let id = RowId(u32::try_from(self.arena.len()).unwrap_or(u32::MAX));
        self.arena.push(HashMap::new());
        id
    }

    /// Appends an empty row and returns its position.
    pub fn push_row(&mut self) -> usize {
        let id = self.new_row();
        self.order.push(id);
        self.order.len() - 1
    }

    /// Grows the grid until `row` exists.
    pub fn ensure_row(&mut self, row: usize) {
        while self.order.len() <= row {
            self.push_row();
        }
    }

    /// Inserts an empty row at `row` (clamped to the end).
    pub fn insert_row(&mut self, row: usize) {
        let at = row.min(self.order.len());
        let id = self.new_row();
        self.order.insert(at, id);
    }

    /// The cell a faction holds in a row.
    #[must_use]
    pub fn cell(&self, row: usize, faction: Faction) -> Option<&Cell> {
        self.slot(row)?.get(&faction).filter(|c| !c.token.trim().is_empty())
    }

    /// The cell at a position.
    #[must_use]
    pub fn cell_at(&self, pos: Pos) -> Option<&Cell> {
        self.cell(pos.row, *self.columns.get(pos.col)?)
    }

    /// The token a faction holds in a row, or `""`.
    #[must_use]
    pub fn token(&self, row: usize, faction: Faction) -> &str {
        self.cell(row, faction).map_or("", |c| c.token.trim())
    }

    /// Returns true if the faction's cell in `row` is empty.
    #[must_use]
    pub fn is_free(&self, row: usize, faction: Faction) -> bool {
        self.cell(row, faction).is_none()
    }

    /// Writes a cell, growing the grid if needed.
    pub fn set(&mut self, row: usize, faction: Faction, cell: Cell) {
        self.ensure_row(row);
        if let Some(slot) = self.slot_mut(row) {
            slot.insert(faction, cell);
        }
    }

    /// Removes and returns a cell.
    pub fn take(&mut self, row: usize, faction: Faction) -> Option<Cell> {
        self.slot_mut(row)?
            .remove(&faction)
            .filter(|c| !c.token.trim().is_empty())
    }

    /// Appends `.suffix` to a faction's cell. Returns false if the cell is
    /// empty.
    pub fn append(&mut self, row: usize, faction: Faction, suffix: &str) -> bool {
        match self.slot_mut(row).and_then(|slot| slot.get_mut(&faction)) {
            Some(cell) if !cell.token.is_empty() => {
                cell.token.push('.');
                cell.token.push_str(suffix);
                true
            }
            _ => false,
        }
    }

    /// Puts a cell in the first free slot for `faction` at or after `start`.
    pub fn place(&mut self, faction: Faction, cell: Cell, start: usize) -> usize {
        let mut row = start;
        loop {
            self.ensure_row(row);
            if self.is_free(row, faction) {
                self.set(row, faction, cell);
                return row;
            }
            row += 1;
        }
    }

    /// Returns true if some cell lies in a column right of `col`.
    #[must_use]
    pub fn has_cell_right_of(&self, row: usize, col: usize) -> bool {
        self.columns
            .iter()
            .enumerate()
            .skip(col + 1)
            .any(|(_, f)| self.cell(row, *f).is_some())
    }

    /// Returns true if some reaction lies in a column right of `col`.
    #[must_use]
    pub fn has_reaction_right_of(&self, row: usize, col: usize) -> bool {
        self.columns
            .iter()
            .skip(col + 1)
            .any(|f| self.cell(row, *f).is_some_and(Cell::is_reaction))
    }

    /// Returns true if every cell in the row is empty.
    #[must_use]
    pub fn row_is_blank(&self, row: usize) -> bool {
        self.columns.iter().all(|f| self.cell(row, *f).is_none())
    }

    /// Scans backward in row-major order from just before `pos` for the
    /// first non-reaction cell.
    #[must_use]
    pub fn previous_non_reaction(&self, pos: Pos) -> Option<(Pos, &Cell)> {
        if pos.row >= self.len() || pos.col >= self.columns.len() {
            return None;
        }
        self.previous_from(pos)
    }

    /// Like [`previous_non_reaction`](Self::previous_non_reaction), but
    /// `pos.row` may be one past the last row, meaning "a new row appended
    /// at the end".
    #[must_use]
    pub fn previous_non_reaction_at(&self, pos: Pos) -> Option<(Pos, &Cell)> {
        if pos.row == 0 || pos.col >= self.columns.len() {
            return None;
        }
        if pos.row >= self.len() {
            let last = self.len().checked_sub(1)?;
            return self.previous_from(Pos {
                row: last,
                col: self.columns.len(),
            });
        }
        self.previous_from(pos)
    }

    fn previous_from(&self, pos: Pos) -> Option<(Pos, &Cell)> {
        for row in (0..=pos.row).rev() {
            let end = if row == pos.row { pos.col } else { self.columns.len() };
            for col in (0..end).rev() {
                if let Some(cell) = self.cell(row, self.columns[col]) {
                    if !cell.is_reaction() {
                        return Some((Pos { row, col }, cell));
                    }
                }
            }
        }
        None
    }

    /// The latest trigger-capable cell of `faction` at or before `before`.
    #[must_use]
    pub fn latest_trigger_row(&self, faction: Faction, before: usize) -> Option<usize> {
        let last = self.len().checked_sub(1)?;
        (0..=before.min(last))
            .rev()
            .find(|row| self.cell(*row, faction).is_some_and(Cell::may_trigger))
    }

    /// Moves a cell to another row of the same column.
    ///
    /// Moving down skips occupied rows, growing the grid if `grow` is set;
    /// moving up skips occupied rows and fails at the top. Returns false if
    /// nothing moved.
    pub fn move_cell(&mut self, faction: Faction, from: usize, to: usize, grow: bool) -> bool {
        if from >= self.len() || to == from || self.is_free(from, faction) {
            return false;
        }
        let mut target = to;
        if target > from {
            self.ensure_row(target);
            while !self.is_free(target, faction) {
                if !grow {
                    return false;
                }
                target += 1;
                self.ensure_row(target);
            }
        } else {
            loop {
                if self.is_free(target, faction) {
                    break;
                }
                match target.checked_sub(1) {
                    Some(up) => target = up,
                    None => return false,
                }
            }
        }
        match self.take(from, faction) {
            Some(cell) => {
                self.set(target, faction, cell);
                true
            }
            None => false,
        }
    }

    /// Drops rows with no cells.
    pub fn strip_blank_rows(&mut self) {
        let keep: Vec<RowId> = (0..self.len())
            .filter(|row| !self.row_is_blank(*row))
            .filter_map(|row| self.id_at(row))
            .collect();
        self.order = keep;
    }

    /// Lifts every cell out in row-major order.
    #[must_use]
    pub fn events(&self) -> Vec<Event> {
        let mut out = Vec::new();
        for row in 0..self.len() {
            for (col, faction) in self.columns.iter().enumerate() {
                if let Some(cell) = self.cell(row, *faction) {
                    out.push(Event {
                        col,
                        cell: cell.clone(),
                    });
                }
            }
        }
        out
    }

    /// Rebuilds the grid from events, keeping each event's column and
    /// starting a new row whenever the next event's column is not to the
    /// right of the previous one.
    pub fn rebuild(&mut self, events: Vec<Event>) {
        self.arena.clear();
        self.order.clear();
        let width = self.columns.len();
        if width == 0 {
            return;
        }
        let mut flat: Option<usize> = None;
        for event in events {
            let mut next = flat.map_or(0, |p| p + 1);
            while next % width != event.col % width {
                next += 1;
            }
            flat = Some(next);
            let faction = self.columns[event.col % width];
            self.set(next / width, faction, event.cell);
        }
        self.strip_blank_rows();
    }

    /// Flattens to `rows × columns` cells (blank cells as `None`).
    #[must_use]
    pub fn flatten(&self) -> Vec<Option<Cell>> {
        let mut flat = Vec::with_capacity(self.len() * self.columns.len());
        for row in 0..self.len() {
            for faction in &self.columns {
                flat.push(self.cell(row, *faction).cloned());
            }
        }
        flat
    }

    /// Rebuilds from a flat cell list, chunking by the column count.
    pub fn unflatten(&mut self, flat: Vec<Option<Cell>>) {
        self.arena.clear();
        self.order.clear();
        let width = self.columns.len();
        if width == 0 {
            return;
        }
        for (index, cell) in flat.into_iter().enumerate() {
            let row = index / width;
            self.ensure_row(row);
            if let Some(cell) = cell {
                let faction = self.columns[index % width];
                self.set(row, faction, cell);
            }
        }
        self.strip_blank_rows();
    }

    /// Factions holding a cell somewhere in the grid but missing from the
    /// columns.
    #[must_use]
    pub fn stray_factions(&self) -> Vec<Faction> {
        let mut stray = Vec::new();
        for id in &self.order {
            if let Some(slot) = self.arena.get(id.0 as usize) {
                for faction in slot.keys() {
                    if !self.columns.contains(faction) && !stray.contains(faction) {
                        stray.push(*faction);
                    }
                }
            }
        }
        stray.sort_by_key(|f| Faction::ALL.iter().position(|a| a == f));
        stray
    }

    /// Renders rows of cell text in column order, skipping blank rows.
    #[must_use]
    pub fn rows(&self, annotate: bool) -> Vec<Vec<String>> {
        (0..self.len())
            .filter(|row| !self.row_is_blank(*row))
            .map(|row| {
                self.columns
                    .iter()
                    .map(|f| self.cell(row, *f).map(|c| c.render(annotate)).unwrap_or_default())
                    .collect()
            })
            .collect()
    }
}
