//! Placing converted ledger tokens onto a round grid.
//!
//! The ledger lists actions in the order they were entered, with each leech
//! response written after the action that caused it, sometimes much later.
//! [`RoundBuilder`] lays those tokens out so the grid reads chronologically:
//! a main action opens a new cell, same-turn follow-ups chain onto it, and a
//! leech response lands where the row-major previous action is its source.

use std::collections::{HashMap, HashSet};

use once_cell::sync::Lazy;
use regex::Regex;
use tmledger_foundation::{Error, Faction, Result};

use super::extract::leech_source;
use crate::grid::{Cell, Pos, RoundGrid, RowId};

static DELAYED_BUILD: Lazy<Regex> = Lazy::new(|| Regex::new(r"^[A-I][0-9]{1,2}$").expect("valid pattern"));

/// Per-round placement state.
#[derive(Clone, Debug)]
pub struct RoundBuilder {
    /// The grid being filled.
    pub grid: RoundGrid,
    last_main: HashMap<Faction, RowId>,
    last_leech_source: HashMap<Faction, RowId>,
    last_event: HashMap<Faction, RowId>,
    locked: HashSet<RowId>,
    added_this_turn: HashSet<Faction>,
    turn_action: Option<(RowId, Option<usize>)>,
    turn_base: usize,
    held: HashMap<Faction, String>,
}

impl RoundBuilder {
    /// Starts an empty round with the given columns.
    #[must_use]
    pub fn new(round: u8, columns: Vec<Faction>) -> Self {
        Self {
            grid: RoundGrid::new(round, columns),
            last_main: HashMap::new(),
            last_leech_source: HashMap::new(),
            last_event: HashMap::new(),
            locked: HashSet::new(),
            added_this_turn: HashSet::new(),
            turn_action: None,
            turn_base: 0,
            held: HashMap::new(),
        }
    }

    /// Resets the per-turn state at a `Round N, turn M` line.
    pub fn start_turn(&mut self) {
        self.added_this_turn.clear();
        self.turn_action = None;
        self.turn_base = self.grid.len();
    }

    /// Finishes the round. A conversion still waiting for an action joins
    /// the faction's last main action.
    #[must_use]
    pub fn into_grid(mut self) -> RoundGrid {
        let mut held: Vec<(Faction, String)> = self.held.drain().collect();
        held.sort_by_key(|(faction, _)| self.grid.column_of(*faction));
        for (faction, token) in held {
            let joined = self
                .row_of(&self.last_main, faction)
                .is_some_and(|row| self.grid.append(row, faction, &token));
            if !joined {
                self.place_main(faction, &token);
            }
        }
        self.grid
    }

    fn row_of(&self, map: &HashMap<Faction, RowId>, faction: Faction) -> Option<usize> {
        map.get(&faction).and_then(|id| self.grid.position(*id))
    }

    fn set_row(&mut self, which: Slot, faction: Faction, row: usize) {
        if let Some(id) = self.grid.id_at(row) {
            match which {
                Slot::Main => self.last_main.insert(faction, id),
                Slot::LeechSource => self.last_leech_source.insert(faction, id),
            };
        }
    }

    fn bump_event(&mut self, faction: Faction, row: usize) {
        let current = self.row_of(&self.last_event, faction);
        if current.is_none_or(|c| c < row) {
            if let Some(id) = self.grid.id_at(row) {
                self.last_event.insert(faction, id);
            }
        }
    }

    fn lock_if_delayed(&mut self, faction: Faction, row: usize) {
        if likely_delayed_source(faction, self.grid.token(row, faction)) {
            if let Some(id) = self.grid.id_at(row) {
                self.locked.insert(id);
            }
        }
    }

    fn set_turn_action(&mut self, faction: Faction, row: usize) {
        let col = self.grid.column_of(faction);
        self.turn_action = self.grid.id_at(row).map(|id| (id, col));
    }

    /// Appends `.suffix` to the faction's last main action. Does nothing if
    /// the faction has none this round.
    pub fn append_to_last_main(&mut self, faction: Faction, suffix: &str) {
        if let Some(row) = self.row_of(&self.last_main, faction) {
            self.grid.append(row, faction, suffix);
        }
    }

    /// Places one converted token.
    ///
    /// `command` is the ledger text the token came from; a reaction's
    /// source faction is read from it.
    ///
    /// # Errors
    ///
    /// Returns `MissingLeechSource` when a reaction does not name its source,
    /// and `UnresolvedReaction` when the source has no trigger-capable action
    /// this round.
    ///
    /// A conversion that would open a cell by itself is held and written in
    /// front of the faction's next non-reaction token instead.
    pub fn place(&mut self, faction: Faction, token: &str, command: &str) -> Result<()> {
        let is_reaction = token == "L" || token == "DL";
        let follows_up = self.added_this_turn.contains(&faction) && !token.starts_with("PASS");
        if !is_reaction && !follows_up && is_conversion_only(token) {
            tracing::trace!(faction = %faction, token, "holding conversion for the next action");
            let held = self.held.entry(faction).or_default();
            if !held.is_empty() {
                held.push('.');
            }
            held.push_str(token);
            return Ok(());
        }
        let token = match (is_reaction, self.held.remove(&faction)) {
            (false, Some(held)) => format!("{held}.{token}"),
            (true, Some(held)) => {
                self.held.insert(faction, held);
                token.to_string()
            }
            (_, None) => token.to_string(),
        };
        let token = token.as_str();

        if is_reaction {
            self.place_reaction(faction, token, command)?;
        } else if follows_up {
            self.place_follow_up(faction, token);
        } else {
            self.place_main(faction, token);
        }

        let passes = token.split('.').any(|part| part == "PASS") || token.contains("PASS-");
        if passes && !self.grid.pass_order.contains(&faction) {
            self.grid.pass_order.push(faction);
        }
        Ok(())
    }

    fn place_main(&mut self, faction: Faction, token: &str) {
        let mut start = self.turn_base;
        if let Some(prev) = self.row_of(&self.last_event, faction) {
            start = start.max(prev + 1);
        }
        let col = self.grid.column_of(faction);
        if let Some((id, turn_col)) = self.turn_action {
            if let Some(turn_row) = self.grid.position(id) {
                start = start.max(turn_row);
                let left_of_turn = matches!((col, turn_col), (Some(c), Some(t)) if c < t);
                if start == turn_row && left_of_turn {
                    start = turn_row + 1;
                }
            }
        }

        let row = self.place_main_cell(faction, Cell::new(token), start);
        tracing::trace!(faction = %faction, token, row, "placed main action");
        self.set_row(Slot::Main, faction, row);
        if self.grid.cell(row, faction).is_some_and(Cell::may_trigger) {
            self.set_row(Slot::LeechSource, faction, row);
        }
        self.bump_event(faction, row);
        self.added_this_turn.insert(faction);
        self.turn_action = self.grid.id_at(row).map(|id| (id, col));
        self.lock_if_delayed(faction, row);
    }

    fn place_follow_up(&mut self, faction: Faction, token: &str) {
        let chained = self
            .row_of(&self.last_main, faction)
            .filter(|row| self.grid.append(*row, faction, token));
        let row = match chained {
            Some(row) => row,
            None => {
                let end = self.grid.len();
                let row = self.grid.place(faction, Cell::new(token), end);
                self.set_row(Slot::Main, faction, row);
                if self.grid.cell(row, faction).is_some_and(Cell::may_trigger) {
                    self.set_row(Slot::LeechSource, faction, row);
                }
                row
            }
        };
        tracing::trace!(faction = %faction, token, row, "chained follow-up");
        self.bump_event(faction, row);
        self.set_turn_action(faction, row);
        self.lock_if_delayed(faction, row);
    }

    // First row at or after `start` that is unlocked, free for `faction`, and
    // has no reaction to the right of the faction's column.
    fn place_main_cell(&mut self, faction: Faction, cell: Cell, start: usize) -> usize {
        let col = self.grid.column_of(faction);
        let mut row = start;
        loop {
            self.grid.ensure_row(row);
            let locked = self.grid.id_at(row).is_some_and(|id| self.locked.contains(&id));
            let blocked = col.is_some_and(|c| self.grid.has_reaction_right_of(row, c));
            if !locked && !blocked && self.grid.is_free(row, faction) {
                self.grid.set(row, faction, cell);
                return row;
            }
            row += 1;
        }
    }

    fn previous_is(&self, row: usize, col: usize, source: Pos) -> bool {
        self.grid
            .previous_non_reaction(Pos { row, col })
            .is_some_and(|(pos, _)| pos == source)
    }

    fn place_reaction(&mut self, reactor: Faction, token: &str, command: &str) -> Result<usize> {
        let source = leech_source(command).ok_or_else(|| Error::missing_leech_source(command))?;
        let last = self.grid.len().saturating_sub(1);
        let mut source_row = self
            .grid
            .latest_trigger_row(source, last)
            .ok_or_else(|| {
                Error::unresolved(
                    reactor.title(),
                    source.title(),
                    format!("no action this round could have caused '{command}'"),
                )
            })?;

        let source_col = self.grid.column_of(source);
        let reactor_col = self.grid.column_of(reactor);
        let left = usize::from(matches!((source_col, reactor_col), (Some(s), Some(r)) if r < s));
        let mut target = source_row + left;

        self.relocate_interfering(source_row, source, reactor);
        if let Some(row) = self.row_of(&self.last_leech_source, source) {
            source_row = row;
            target = source_row + left;
        }

        let columns = source_col.zip(reactor_col);
        if let Some((sc, rc)) = columns {
            if !self.previous_is(target, rc, Pos { row: source_row, col: sc }) {
                self.grid.insert_row(source_row + 1);
                target = source_row + 1;
            }
        }

        if let Some(existing) = self.grid.cell(target, reactor) {
            let contested = existing.is_reaction() && existing.anchor.is_some_and(|a| a != source);
            if contested && target == source_row {
                source_row = self.move_source_and_anchored(source, source_row, target + 1);
                target = source_row + left;
            } else {
                target += 1;
            }
        }

        let mut row = self.grid.place(reactor, Cell::reaction(token, source), target);
        if let Some((sc, rc)) = columns {
            if !self.previous_is(row, rc, Pos { row: source_row, col: sc }) {
                self.grid.take(row, reactor);
                self.grid.insert_row(source_row + 1);
                row = source_row + 1;
                self.grid.set(row, reactor, Cell::reaction(token, source));
            }
        }
        tracing::trace!(reactor = %reactor, source = %source, row, "placed reaction");
        self.bump_event(reactor, row);
        Ok(row)
    }

    // Moves a faction's action in `from` down to the first acceptable row at
    // or after `start`, taking the reactions anchored to it along.
    fn move_source_and_anchored(&mut self, source: Faction, from: usize, start: usize) -> usize {
        let Some(cell) = self.grid.cell(from, source).cloned() else {
            return from;
        };
        let from_id = self.grid.id_at(from);
        let to = self.place_main_cell(source, cell, start.max(from + 1));
        self.grid.take(from, source);

        if let (Some(from_id), Some(to_id)) = (from_id, self.grid.id_at(to)) {
            for map in [&mut self.last_main, &mut self.last_leech_source] {
                if map.get(&source) == Some(&from_id) {
                    map.insert(source, to_id);
                }
            }
        }

        let anchored: Vec<Faction> = self
            .grid
            .columns
            .iter()
            .copied()
            .filter(|f| self.grid.cell(from, *f).is_some_and(|c| c.anchor == Some(source)))
            .collect();
        for reactor in anchored {
            if let Some(cell) = self.grid.take(from, reactor) {
                self.grid.place(reactor, cell, to);
            }
        }
        tracing::trace!(faction = %source, from, to, "moved source action");
        to
    }

    // Pushes actions that sit between a source and its reactor down a row so
    // they cannot be read as the reaction's trigger.
    fn relocate_interfering(&mut self, source_row: usize, source: Faction, reactor: Faction) {
        if source_row >= self.grid.len() {
            return;
        }
        let (Some(sc), Some(rc)) = (self.grid.column_of(source), self.grid.column_of(reactor)) else {
            return;
        };
        let range = match rc.cmp(&sc) {
            std::cmp::Ordering::Greater => sc + 1..rc,
            std::cmp::Ordering::Less => sc + 1..self.grid.columns.len(),
            std::cmp::Ordering::Equal => return,
        };
        for col in range {
            let faction = self.grid.columns[col];
            if faction == source || faction == reactor {
                continue;
            }
            let movable = self
                .grid
                .cell(source_row, faction)
                .is_some_and(|c| !c.is_reaction());
            if movable {
                self.move_source_and_anchored(faction, source_row, source_row + 1);
            }
        }
    }
}

// True for tokens made only of `C<cost>:<reward>` parts.
fn is_conversion_only(token: &str) -> bool {
    !token.is_empty() && token.split('.').all(|part| part.starts_with('C') && part.contains(':'))
}

#[derive(Clone, Copy)]
enum Slot {
    Main,
    LeechSource,
}

// Cultists builds and upgrades often have their cult bonus recorded on a later
// row; such a row is kept free of other main actions.
fn likely_delayed_source(faction: Faction, token: &str) -> bool {
    faction == Faction::Cultists
        && token
            .split('.')
            .map(str::trim)
            .any(|p| p.starts_with("UP-") || DELAYED_BUILD.is_match(p))
}
