//! Chronological reconstruction of a ledger round.
//!
//! Placement gets most reactions right, but a ledger can interleave turns in
//! ways a single forward pass cannot untangle. The passes here repair the grid
//! until every anchored reaction satisfies the adjacency invariant: scanning
//! backward in row-major order from the reaction, the first non-reaction cell
//! is a trigger-capable action of the anchor's faction.
//!
//! Each pass runs to a fixed point. A pass that has not settled after
//! `rows × columns × k + c` iterations fails with `IterationLimit`.

use std::collections::HashMap;

use tmledger_foundation::{Error, Faction, Result};
use tracing::{debug, warn};

use crate::grid::{Cell, Event, Pos, RoundGrid};

/// Runs every pass over one round, in order.
///
/// # Errors
///
/// Returns `UnresolvedReaction` if an anchored reaction's source has no
/// trigger-capable action in the round or some reaction still does not
/// follow its trigger after the last pass, and `IterationLimit` if a pass
/// does not settle.
pub fn reconstruct(grid: &mut RoundGrid) -> Result<()> {
    if grid.is_empty() || grid.columns.is_empty() {
        return Ok(());
    }
    debug!(round = grid.round, rows = grid.len(), "reconstructing round");

    enforce_source_order(grid)?;
    until_stable(grid, "stabilize_bindings", 8, 64, stabilize_bindings)?;
    until_stable(grid, "resolve_duplicate_bindings", 8, 64, resolve_duplicate_bindings)?;
    until_stable(grid, "resolve_anchored_duplicate_sources", 6, 32, resolve_anchored_duplicate_sources)?;
    until_stable(grid, "force_off_non_triggers", 6, 32, force_off_non_triggers)?;
    until_stable(grid, "break_remaining_duplicates", 6, 32, break_remaining_duplicates)?;
    compact_if_sound(grid);

    if let Some(pos) = adjacency_violations(grid).first() {
        let reactor = grid.columns[pos.col];
        let source = grid.cell_at(*pos).and_then(|c| c.anchor).map_or("?", Faction::title);
        warn!(round = grid.round, row = pos.row, reactor = %reactor, source, "reaction left without its trigger");
        return Err(Error::unresolved(
            reactor.title(),
            source,
            format!("no placement in round {} puts the reaction after its trigger", grid.round),
        ));
    }
    debug!(round = grid.round, rows = grid.len(), "round reconstructed");
    Ok(())
}

/// Every anchored reaction whose row-major previous action is missing, not
/// trigger-capable, or by another faction.
#[must_use]
pub fn adjacency_violations(grid: &RoundGrid) -> Vec<Pos> {
    let mut out = Vec::new();
    for row in 0..grid.len() {
        for (col, faction) in grid.columns.iter().enumerate() {
            let Some(anchor) = grid.cell(row, *faction).filter(|c| c.is_reaction()).and_then(|c| c.anchor) else {
                continue;
            };
            let pos = Pos { row, col };
            let bound = grid
                .previous_non_reaction(pos)
                .is_some_and(|(p, prev)| prev.may_trigger() && grid.columns[p.col] == anchor);
            if !bound {
                out.push(pos);
            }
        }
    }
    out
}

/// Returns true if every anchored reaction directly follows its trigger.
#[must_use]
pub fn adjacency_holds(grid: &RoundGrid) -> bool {
    adjacency_violations(grid).is_empty()
}

fn until_stable(
    grid: &mut RoundGrid,
    pass: &'static str,
    factor: usize,
    slack: usize,
    mut step: impl FnMut(&mut RoundGrid) -> bool,
) -> Result<()> {
    let limit = grid.len() * grid.columns.len() * factor + slack;
    for iteration in 0..limit {
        if !step(grid) {
            debug!(pass, iterations = iteration, rows = grid.len(), "pass settled");
            return Ok(());
        }
    }
    warn!(pass, limit, round = grid.round, "reconstruction pass did not settle");
    Err(Error::iteration_limit(pass, limit))
}

// =============================================================================
// Binding searches
// =============================================================================

// The reaction at (row, col) would follow a trigger of `source` (any faction
// when None) other than `avoid`.
fn binds(grid: &RoundGrid, row: usize, col: usize, source: Option<Faction>, avoid: Option<Pos>) -> bool {
    grid.previous_non_reaction(Pos { row, col }).is_some_and(|(p, prev)| {
        prev.may_trigger() && source.is_none_or(|s| grid.columns[p.col] == s) && avoid != Some(p)
    })
}

fn has_future_binding(grid: &RoundGrid, row: usize, col: usize, source: Option<Faction>, avoid: Option<Pos>) -> bool {
    (row + 1..=grid.len()).any(|r| binds(grid, r, col, source, avoid))
}

fn has_past_binding(grid: &RoundGrid, row: usize, col: usize, source: Option<Faction>, avoid: Option<Pos>) -> bool {
    let reactor = grid.columns[col];
    (0..row)
        .rev()
        .any(|r| grid.is_free(r, reactor) && binds(grid, r, col, source, avoid))
}

fn future_placement(
    grid: &RoundGrid,
    row: usize,
    col: usize,
    source: Option<Faction>,
    avoid: Option<Pos>,
) -> Option<usize> {
    let reactor = grid.columns[col];
    (row + 1..=grid.len())
        .find(|r| (*r >= grid.len() || grid.is_free(*r, reactor)) && binds(grid, *r, col, source, avoid))
}

fn past_placement(
    grid: &RoundGrid,
    row: usize,
    col: usize,
    source: Option<Faction>,
    avoid: Option<Pos>,
) -> Option<usize> {
    let reactor = grid.columns[col];
    (0..row)
        .rev()
        .find(|r| grid.is_free(*r, reactor) && binds(grid, *r, col, source, avoid))
}

// Of a past and a future candidate, the one nearer to `row`; the future one
// on a tie.
fn nearest(row: usize, past: Option<usize>, future: Option<usize>) -> Option<usize> {
    match (past, future) {
        (Some(p), Some(f)) if row.abs_diff(p) < row.abs_diff(f) => Some(p),
        (p, f) => f.or(p),
    }
}

// Nearest row (by distance from `current`, later wins ties) where a
// reaction in `col` would follow a trigger of `source`. One past the end
// counts as a fresh row.
fn source_binding_row(grid: &RoundGrid, source: Faction, current: usize, col: usize) -> Option<usize> {
    let reactor = grid.columns[col];
    let mut best: Option<usize> = None;
    for cand in 0..=grid.len() {
        if cand < grid.len() && !grid.is_free(cand, reactor) {
            continue;
        }
        let ok = grid
            .previous_non_reaction_at(Pos { row: cand, col })
            .is_some_and(|(p, prev)| prev.may_trigger() && grid.columns[p.col] == source);
        if ok && best.is_none_or(|b| cand.abs_diff(current) <= b.abs_diff(current)) {
            best = Some(cand);
        }
    }
    best
}

fn move_to(grid: &mut RoundGrid, reactor: Faction, from: usize, to: usize) -> bool {
    grid.move_cell(reactor, from, to, to > from)
}

// Splits a reaction onto a fresh row right below it.
fn split_below(grid: &mut RoundGrid, reactor: Faction, row: usize) -> bool {
    grid.insert_row(row + 1);
    grid.move_cell(reactor, row, row + 1, true)
}

fn reaction_at(grid: &RoundGrid, row: usize, faction: Faction) -> Option<&Cell> {
    grid.cell(row, faction).filter(|c| c.is_reaction())
}

// =============================================================================
// Passes
// =============================================================================

// Reorders the round as one event list so each anchored reaction directly
// follows a trigger of its source, using a different trigger occurrence when
// the reactor already answered the nearest one.
fn enforce_source_order(grid: &mut RoundGrid) -> Result<()> {
    let mut events = grid.events();
    let mut answered: HashMap<Faction, usize> = HashMap::new();
    let columns = grid.columns.clone();
    let triggers = |e: &Event, source: Faction| !e.cell.is_reaction() && columns[e.col] == source && e.cell.may_trigger();

    let mut moved = 0;
    let mut i = 0;
    while i < events.len() {
        let Some(source) = events[i].cell.anchor.filter(|_| events[i].cell.is_reaction()) else {
            i += 1;
            continue;
        };
        let reactor = columns[events[i].col];

        let nearest = (0..i)
            .rev()
            .find(|j| triggers(&events[*j], source))
            .or_else(|| (i + 1..events.len()).find(|j| triggers(&events[*j], source)));
        let Some(mut req) = nearest else {
            warn!(reactor = %reactor, source = %source, round = grid.round, "no trigger for reaction");
            return Err(Error::unresolved(
                reactor.title(),
                source.title(),
                format!("no trigger-capable action in round {}", grid.round),
            ));
        };
        if answered.get(&reactor) == Some(&req) {
            if let Some(next) = (req + 1..events.len()).find(|j| triggers(&events[*j], source)) {
                req = next;
            }
        }

        let prev = (0..i).rev().find(|j| !events[*j].cell.is_reaction());
        if prev == Some(req) {
            i += 1;
            continue;
        }

        let event = events.remove(i);
        let at = if i < req + 1 { req } else { req + 1 };
        events.insert(at, event);
        answered.insert(reactor, req);
        moved += 1;
        // After a forward move the next event already sits in slot i.
        if at < i {
            i += 1;
        }
    }

    if moved > 0 {
        debug!(round = grid.round, moved, "reordered reactions behind their sources");
        grid.rebuild(events);
    }
    Ok(())
}

fn stabilize_bindings(grid: &mut RoundGrid) -> bool {
    let mut last_prev: HashMap<Faction, Pos> = HashMap::new();
    for row in 0..grid.len() {
        for col in 0..grid.columns.len() {
            let reactor = grid.columns[col];
            let Some(anchor) = reaction_at(grid, row, reactor).map(|c| c.anchor) else {
                continue;
            };
            let Some((p, trigger)) = grid
                .previous_non_reaction(Pos { row, col })
                .map(|(p, prev)| (p, prev.may_trigger()))
            else {
                continue;
            };

            let wrong_source = anchor.is_some_and(|a| grid.columns[p.col] != a);
            let avoid = last_prev.get(&reactor).copied();
            let duplicate = avoid == Some(p);
            if trigger && !wrong_source && !duplicate {
                last_prev.insert(reactor, p);
                continue;
            }

            let search = if duplicate || !trigger { None } else { anchor };
            if has_future_binding(grid, row, col, search, avoid) {
                return grid.move_cell(reactor, row, row + 1, true);
            }
            if row > 0 && has_past_binding(grid, row, col, search, avoid) && grid.move_cell(reactor, row, row - 1, false) {
                return true;
            }
            last_prev.insert(reactor, p);
        }
    }
    false
}

fn resolve_duplicate_bindings(grid: &mut RoundGrid) -> bool {
    for col in 0..grid.columns.len() {
        let reactor = grid.columns[col];
        let mut last_prev: Option<Pos> = None;
        let mut last_leech: Option<(usize, Option<Faction>)> = None;

        for row in 0..grid.len() {
            let Some(cell) = reaction_at(grid, row, reactor) else {
                continue;
            };
            let source = cell.anchor;
            let token = cell.token.clone();
            let Some(p) = grid.previous_non_reaction(Pos { row, col }).map(|(p, _)| p) else {
                continue;
            };

            if last_prev != Some(p) {
                last_prev = Some(p);
                last_leech = Some((row, source));
                continue;
            }

            // Two reactions of this reactor follow the same action.
            if let Some((earlier, earlier_source)) = last_leech {
                if let Some(target) = past_placement(grid, earlier, col, earlier_source, Some(p)) {
                    if grid.move_cell(reactor, earlier, target, false) {
                        return true;
                    }
                }

                match (earlier_source, source) {
                    (Some(a), Some(b)) if a != b => {
                        let target = future_placement(grid, row, col, Some(b), Some(p))
                            .or_else(|| past_placement(grid, row, col, Some(b), Some(p)));
                        return match target {
                            Some(target) => move_to(grid, reactor, row, target),
                            None => split_below(grid, reactor, row),
                        };
                    }
                    (Some(a), Some(b)) if a == b && grid.token(earlier, reactor) == token.trim() => {
                        debug!(reactor = %reactor, row = earlier, "dropping repeated reaction");
                        return grid.take(earlier, reactor).is_some();
                    }
                    _ => {}
                }
            }

            let mut target = None;
            if source.is_some() && has_future_binding(grid, row, col, source, Some(p)) {
                target = future_placement(grid, row, col, source, Some(p));
            }
            if target.is_none() && has_future_binding(grid, row, col, None, Some(p)) {
                target = future_placement(grid, row, col, None, Some(p));
            }
            if target.is_none() {
                target = past_placement(grid, row, col, source, Some(p));
            }
            return match target {
                Some(target) => move_to(grid, reactor, row, target),
                None => split_below(grid, reactor, row),
            };
        }
    }
    false
}

fn resolve_anchored_duplicate_sources(grid: &mut RoundGrid) -> bool {
    for col in 0..grid.columns.len() {
        let reactor = grid.columns[col];
        let mut last: Option<(Option<Pos>, Option<Faction>)> = None;

        for row in 0..grid.len() {
            let Some(source) = reaction_at(grid, row, reactor).map(|c| c.anchor) else {
                continue;
            };
            let prev = grid
                .previous_non_reaction(Pos { row, col })
                .map(|(p, prev)| (p, prev.may_trigger()));
            let Some((p, true)) = prev else {
                last = Some((prev.map(|(p, _)| p), source));
                continue;
            };

            let conflict = matches!(
                (last, source),
                (Some((Some(lp), Some(ls))), Some(s)) if lp == p && ls != s
            );
            if let (true, Some(s)) = (conflict, source) {
                let target = source_binding_row(grid, s, row, col).filter(|t| *t != row);
                return match target {
                    Some(target) => move_to(grid, reactor, row, target),
                    None => split_below(grid, reactor, row),
                };
            }
            last = Some((Some(p), source));
        }
    }
    false
}

fn force_off_non_triggers(grid: &mut RoundGrid) -> bool {
    for row in 0..grid.len() {
        for col in 0..grid.columns.len() {
            let reactor = grid.columns[col];
            if reaction_at(grid, row, reactor).is_none() {
                continue;
            }
            let stuck = grid
                .previous_non_reaction(Pos { row, col })
                .is_some_and(|(_, prev)| !prev.may_trigger());
            if !stuck {
                continue;
            }

            let earlier_prev = (0..row)
                .rev()
                .find(|r| reaction_at(grid, *r, reactor).is_some())
                .and_then(|r| grid.previous_non_reaction(Pos { row: r, col }).map(|(p, _)| p));

            let target = (0..row).rev().find(|up| {
                grid.is_free(*up, reactor)
                    && grid
                        .previous_non_reaction(Pos { row: *up, col })
                        .is_some_and(|(p, prev)| prev.may_trigger() && Some(p) != earlier_prev)
            });
            if let Some(up) = target {
                if grid.move_cell(reactor, row, up, false) {
                    return true;
                }
            }
        }
    }
    false
}

fn break_remaining_duplicates(grid: &mut RoundGrid) -> bool {
    for col in 0..grid.columns.len() {
        let reactor = grid.columns[col];
        let mut last_prev: Option<Pos> = None;

        for row in 0..grid.len() {
            if reaction_at(grid, row, reactor).is_none() {
                continue;
            }
            let prev = grid
                .previous_non_reaction(Pos { row, col })
                .map(|(p, prev)| (p, prev.may_trigger()));
            let Some((p, true)) = prev else {
                last_prev = prev.map(|(p, _)| p);
                continue;
            };
            if last_prev == Some(p) {
                let target = nearest(
                    row,
                    past_placement(grid, row, col, None, Some(p)),
                    future_placement(grid, row, col, None, Some(p)),
                )
                .filter(|t| *t != row);
                return match target {
                    Some(target) => move_to(grid, reactor, row, target),
                    None => split_below(grid, reactor, row),
                };
            }
            last_prev = Some(p);
        }
    }
    false
}

// =============================================================================
// Compaction
// =============================================================================

// Drops blank rows, then shortens every blank run in the flattened grid to
// its length modulo the column count, so each cell keeps its column.
fn compact(grid: &mut RoundGrid) {
    grid.strip_blank_rows();
    let width = grid.columns.len();
    if grid.is_empty() || width == 0 {
        return;
    }

    let flat = grid.flatten();
    let mut out = Vec::with_capacity(flat.len());
    let mut blanks = 0;
    for cell in flat {
        match cell {
            None => blanks += 1,
            Some(cell) => {
                out.extend(std::iter::repeat_n(None, blanks % width));
                blanks = 0;
                out.push(Some(cell));
            }
        }
    }
    out.extend(std::iter::repeat_n(None, blanks % width));
    grid.unflatten(out);
}

fn compact_if_sound(grid: &mut RoundGrid) {
    let before = grid.clone();
    let held = adjacency_holds(grid);
    compact(grid);
    if held && !adjacency_holds(grid) {
        debug!(round = grid.round, "compaction broke a binding; keeping uncompacted rows");
        *grid = before;
        grid.strip_blank_rows();
    }
}
