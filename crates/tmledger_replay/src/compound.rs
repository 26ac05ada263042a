//! Compound actions and income wrappers.
//!
//! A compound runs its parts with turn advancing suppressed and advances the
//! turn once at the end if any part was a main action. Parts run on a
//! scratch copy of the state, so a failing compound changes nothing.
//!
//! Logs record burns and conversions wherever the player typed them, which
//! is not always before the action that needed them. When a part fails for
//! lack of a resource, the burns and the conversions yielding that resource
//! that come later in the same compound are run first, then the part is
//! retried once.

use tmledger_foundation::{CultTrack, Error, Result, TownTile};
use tmledger_notation::{Action, compound_has_main};
use tmledger_state::GameState;
use tracing::warn;

use crate::cult;
use crate::economy::covers;
use crate::execute::execute_action;

// =============================================================================
// Town selectors
// =============================================================================

/// Which parts are `-<T>` selectors for a cult town tile, and the tracks
/// each cult town tile is lowered on.
struct TownPlan {
    selector: Vec<bool>,
    lowered: Vec<Vec<CultTrack>>,
}

impl TownPlan {
    fn new(actions: &[Action]) -> Self {
        let mut selector = vec![false; actions.len()];
        let mut lowered = vec![Vec::new(); actions.len()];
        let mut open = Vec::new();
        for (index, action) in actions.iter().enumerate() {
            match action {
                Action::CultDecrease { track, .. } => open.push((index, *track)),
                Action::TownTile {
                    tile: TownTile::Vp8 | TownTile::Vp2,
                    ..
                } => {
                    for (at, track) in open.drain(..) {
                        selector[at] = true;
                        lowered[index].push(track);
                    }
                }
                _ => {}
            }
        }
        Self { selector, lowered }
    }
}

// =============================================================================
// Execution
// =============================================================================

/// Runs a compound action.
///
/// # Errors
///
/// Returns `IllegalAction` for an empty compound, otherwise the first
/// part's error that no later burn or conversion could fix.
pub fn execute_compound(actions: &[Action], state: &mut GameState, retry: bool) -> Result<()> {
    if actions.is_empty() {
        return Err(Error::illegal("empty compound action"));
    }
    let has_main = compound_has_main(actions);
    let previously = state.suppress_turn_advance;
    let mut next = state.clone();
    next.suppress_turn_advance = true;
    run_parts(actions, &mut next, retry)?;
    next.suppress_turn_advance = previously;
    *state = next;
    if has_main && !previously {
        state.next_turn();
    }
    Ok(())
}

/// Runs an action logged around income, never advancing the turn.
///
/// # Errors
///
/// Returns the wrapped action's error.
pub fn execute_wrapped(inner: &Action, state: &mut GameState, retry: bool) -> Result<()> {
    let previously = state.suppress_turn_advance;
    state.suppress_turn_advance = true;
    let result = execute_action(inner, state, retry);
    state.suppress_turn_advance = previously;
    result
}

fn run_parts(actions: &[Action], state: &mut GameState, retry: bool) -> Result<()> {
    let plan = TownPlan::new(actions);
    let mut done = vec![false; actions.len()];
    for index in 0..actions.len() {
        if done[index] || plan.selector[index] {
            continue;
        }
        let err = match run_part(actions, &plan, index, state, retry) {
            Ok(()) => {
                done[index] = true;
                continue;
            }
            Err(err) => err,
        };
        let shortfall = err.shortfall().filter(|_| retry);
        let Some((resource, missing)) = shortfall else {
            return Err(err.in_frame(actions[index].to_string()));
        };
        let rescues: Vec<usize> = (index + 1..actions.len())
            .filter(|j| !done[*j])
            .filter(|j| match &actions[*j] {
                Action::Burn { .. } => true,
                Action::Conversion { reward, .. } => covers(reward, resource),
                _ => false,
            })
            .collect();
        if rescues.is_empty() {
            return Err(err.in_frame(actions[index].to_string()));
        }
        warn!(
            action = %actions[index],
            %resource,
            missing,
            rescues = rescues.len(),
            "running later burns and conversions first"
        );
        for j in rescues {
            execute_action(&actions[j], state, false).map_err(|e| e.in_frame(actions[j].to_string()))?;
            done[j] = true;
        }
        run_part(actions, &plan, index, state, retry).map_err(|e| e.in_frame(actions[index].to_string()))?;
        done[index] = true;
    }
    Ok(())
}

fn run_part(actions: &[Action], plan: &TownPlan, index: usize, state: &mut GameState, retry: bool) -> Result<()> {
    match &actions[index] {
        Action::TownTile { player, tile } if !plan.lowered[index].is_empty() => {
            let mut next = state.clone();
            cult::town_tile(&mut next, *player, *tile, &plan.lowered[index])?;
            *state = next;
            Ok(())
        }
        action => execute_action(action, state, retry),
    }
}
