//! The execution contract and the dispatch over every action variant.

use tmledger_foundation::{Faction, Result};
use tmledger_notation::Action;
use tmledger_state::GameState;

use crate::{build, compound, cult, economy, special};

/// Something that can be replayed against a [`GameState`].
pub trait Execute {
    /// The acting faction, if any.
    fn actor(&self) -> Option<Faction>;

    /// Checks that the action would succeed, without changing `state`.
    ///
    /// # Errors
    ///
    /// Returns the error [`execute`](Execute::execute) would return.
    fn validate(&self, state: &GameState) -> Result<()>;

    /// Applies the action.
    ///
    /// # Errors
    ///
    /// Returns `InsufficientResources`, `IllegalAction`, `NoPendingOffer`,
    /// `PowerActionTaken` or `UnknownPlayer` when the action cannot be
    /// applied.
    fn execute(&self, state: &mut GameState) -> Result<()>;
}

impl Execute for Action {
    fn actor(&self) -> Option<Faction> {
        Self::actor(self)
    }

    fn validate(&self, state: &GameState) -> Result<()> {
        execute_action(self, &mut state.clone(), true)
    }

    fn execute(&self, state: &mut GameState) -> Result<()> {
        execute_action(self, state, true)
    }
}

/// Executes one action, with or without compound affordability retries.
///
/// A non-compound action is applied to a scratch copy of the state and only
/// committed on success, so a failure leaves `state` untouched. A main action
/// then advances the turn unless advancing is suppressed.
///
/// # Errors
///
/// See [`Execute::execute`].
pub fn execute_action(action: &Action, state: &mut GameState, retry: bool) -> Result<()> {
    match action {
        Action::Compound(actions) => compound::execute_compound(actions, state, retry),
        Action::PreIncome(inner) | Action::PostIncome(inner) => compound::execute_wrapped(inner, state, retry),
        single => {
            let mut next = state.clone();
            apply(single, &mut next)?;
            *state = next;
            if !single.is_auxiliary() && !state.suppress_turn_advance {
                state.next_turn();
            }
            Ok(())
        }
    }
}

// Exhaustive over every variant; wrappers are handled by `execute_action`.
fn apply(action: &Action, state: &mut GameState) -> Result<()> {
    match action {
        Action::SetupDwelling { player, hex } => build::setup_dwelling(state, *player, *hex),
        Action::Build { player, hex } => build::build(state, *player, *hex, None),
        Action::TransformBuild { player, hex, terrain } => build::build(state, *player, *hex, *terrain),
        Action::Transform { player, hex, terrain } => build::transform(state, *player, *hex, *terrain),
        Action::Dig { player, spades, hex } => build::dig(state, *player, *spades, *hex),
        Action::Upgrade { player, hex, to } => build::upgrade(state, *player, *hex, *to),
        Action::HalflingsSpade { player, transforms } => build::halflings_spades(state, *player, transforms),
        Action::PowerAction { player, action, bridge } => economy::power_action(state, *player, *action, *bridge),
        Action::AcceptLeech {
            player,
            from,
            amount,
            vp_cost,
        } => economy::accept_leech(state, *player, *from, *amount, *vp_cost),
        Action::DeclineLeech { player, from } => economy::decline_leech(state, *player, *from),
        Action::Burn { player, amount } => economy::burn(state, *player, *amount),
        Action::Conversion { player, cost, reward } => economy::convert(state, *player, cost, reward),
        Action::AdvanceShipping { player } => economy::advance_shipping(state, *player),
        Action::AdvanceDigging { player } => economy::advance_digging(state, *player),
        Action::SendPriest { player, track, spaces } => cult::send_priest(state, *player, *track, *spaces),
        Action::CultAdvance { player, track } => cult::step(state, *player, *track, 1),
        Action::CultDecrease { player, track } => cult::step(state, *player, *track, -1),
        Action::FavorTile { player, tile } => cult::favor_tile(state, *player, *tile),
        Action::TownTile { player, tile } => cult::town_tile(state, *player, *tile, &[]),
        Action::BonusCard { player, card } => state.take_bonus(*player, *card),
        Action::Pass { player, bonus } => state.pass(*player, *bonus),
        Action::Special { player, action } => special::apply(state, *player, *action),
        Action::Compound(actions) => compound::execute_compound(actions, state, true),
        Action::PreIncome(inner) | Action::PostIncome(inner) => compound::execute_wrapped(inner, state, true),
    }
}
