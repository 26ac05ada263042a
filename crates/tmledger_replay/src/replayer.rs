//! The replay driver.
//!
//! A [`Replayer`] walks a list of [`LogItem`]s against a [`GameState`],
//! keeping a bounded history of snapshots so a session can step backwards.
//! Snapshots are `im` clones and share structure with the live state.

use std::collections::VecDeque;

use tmledger_foundation::{Error, Faction, Result};
use tmledger_notation::{GameSettings, LogItem};
use tmledger_state::GameState;
use tracing::{debug, info, warn};

use crate::config::ReplayConfig;
use crate::execute::execute_action;

/// What a finished [`Replayer::run`] did.
#[derive(Debug, Default)]
pub struct ReplayReport {
    /// Items executed successfully.
    pub executed: usize,
    /// Items skipped after failing, with their errors. Only non-empty when
    /// [`ReplayConfig::stop_on_error`] is off.
    pub errors: Vec<(usize, Error)>,
}

impl ReplayReport {
    /// Returns true if every item executed.
    #[must_use]
    pub fn is_clean(&self) -> bool {
        self.errors.is_empty()
    }
}

/// Steps through log items against a game state.
#[derive(Clone, Debug)]
pub struct Replayer {
    items: Vec<LogItem>,
    state: GameState,
    config: ReplayConfig,
    cursor: usize,
    history: VecDeque<(usize, GameState)>,
}

impl Replayer {
    /// Creates a replayer with the default configuration.
    #[must_use]
    pub fn new(items: Vec<LogItem>) -> Self {
        Self::with_config(items, ReplayConfig::default())
    }

    /// Creates a replayer with a configuration.
    #[must_use]
    pub fn with_config(items: Vec<LogItem>, config: ReplayConfig) -> Self {
        Self {
            items,
            state: GameState::new(),
            config,
            cursor: 0,
            history: VecDeque::new(),
        }
    }

    // --- Accessors ---

    /// The current state.
    #[must_use]
    pub fn state(&self) -> &GameState {
        &self.state
    }

    /// Every item, executed or not.
    #[must_use]
    pub fn items(&self) -> &[LogItem] {
        &self.items
    }

    /// Index of the next item to execute.
    #[must_use]
    pub fn cursor(&self) -> usize {
        self.cursor
    }

    /// The round being replayed (0 during setup).
    #[must_use]
    pub fn round(&self) -> u32 {
        self.state.round
    }

    /// The configuration.
    #[must_use]
    pub fn config(&self) -> &ReplayConfig {
        &self.config
    }

    /// The next item to execute.
    #[must_use]
    pub fn peek(&self) -> Option<&LogItem> {
        self.items.get(self.cursor)
    }

    /// Returns true once every item has been consumed.
    #[must_use]
    pub fn is_finished(&self) -> bool {
        self.cursor >= self.items.len()
    }

    /// Steps that [`back`](Self::back) can undo.
    #[must_use]
    pub fn history_len(&self) -> usize {
        self.history.len()
    }

    // --- Stepping ---

    /// Executes the next item and returns it, or `None` at the end.
    ///
    /// On failure the state and cursor are left where they were.
    ///
    /// # Errors
    ///
    /// Returns the item's error, framed with its index and round.
    pub fn step(&mut self) -> Result<Option<&LogItem>> {
        let index = self.cursor;
        let Some(item) = self.items.get(index) else {
            return Ok(None);
        };
        let snapshot = self.state.clone();
        if let Err(err) = apply_item(item, &mut self.state, &self.config) {
            self.state = snapshot;
            return Err(err.in_frame(format!("item {index}, round {}", self.state.round)));
        }
        debug!(index, item = %item, "executed");
        self.remember(index, snapshot);
        self.cursor += 1;
        Ok(self.items.get(index))
    }

    /// Moves past the next item without executing it.
    ///
    /// Returns false at the end.
    pub fn skip(&mut self) -> bool {
        if self.is_finished() {
            return false;
        }
        self.remember(self.cursor, self.state.clone());
        self.cursor += 1;
        true
    }

    /// Undoes up to `n` steps and returns how many were undone.
    pub fn back(&mut self, n: usize) -> usize {
        let mut undone = 0;
        while undone < n {
            let Some((index, snapshot)) = self.history.pop_back() else {
                break;
            };
            self.state = snapshot;
            self.cursor = index;
            undone += 1;
        }
        undone
    }

    /// Executes every remaining item.
    ///
    /// # Errors
    ///
    /// With [`ReplayConfig::stop_on_error`] set, returns the first failing
    /// item's error and stops on that item.
    pub fn run(&mut self) -> Result<ReplayReport> {
        let mut report = ReplayReport::default();
        while !self.is_finished() {
            match self.step().map(|_| ()) {
                Ok(()) => report.executed += 1,
                Err(err) if self.config.stop_on_error => return Err(err),
                Err(err) => {
                    warn!(index = self.cursor, error = %err, "skipping failed item");
                    report.errors.push((self.cursor, err));
                    self.skip();
                }
            }
        }
        info!(executed = report.executed, failed = report.errors.len(), "replay finished");
        Ok(report)
    }

    fn remember(&mut self, index: usize, snapshot: GameState) {
        if self.config.history_limit == 0 {
            return;
        }
        if self.history.len() == self.config.history_limit {
            self.history.pop_front();
        }
        self.history.push_back((index, snapshot));
    }
}

// =============================================================================
// Items
// =============================================================================

fn apply_item(item: &LogItem, state: &mut GameState, config: &ReplayConfig) -> Result<()> {
    match item {
        LogItem::GameSettings(settings) => apply_settings(settings, state),
        LogItem::RoundStart { round, turn_order } => start_round(state, u32::from(*round), turn_order),
        LogItem::Action(action) => execute_action(action, state, config.retry_affordability),
    }
}

fn seat(state: &mut GameState, faction: Faction) -> Result<()> {
    if state.player(faction).is_none() {
        state.add_player(faction)?;
    }
    Ok(())
}

fn apply_settings(settings: &GameSettings, state: &mut GameState) -> Result<()> {
    for faction in settings.factions() {
        seat(state, faction)?;
    }
    for (faction, vp) in &settings.starting_vps {
        state.player_mut(*faction)?.vp = *vp;
    }
    if !settings.bonus_cards.is_empty() {
        let unused: Vec<_> = state
            .bonus_pool
            .iter()
            .filter(|card| !settings.bonus_cards.contains(card))
            .copied()
            .collect();
        for card in unused {
            state.remove_bonus(card);
        }
    }
    Ok(())
}

fn start_round(state: &mut GameState, round: u32, turn_order: &[Faction]) -> Result<()> {
    if round == 0 {
        for faction in turn_order {
            seat(state, *faction)?;
        }
        if !turn_order.is_empty() {
            state.turn_order = turn_order.iter().copied().collect();
        }
        state.current = 0;
        return Ok(());
    }
    info!(round, ?turn_order, "round start");
    state.start_round(round, turn_order)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tmledger_foundation::{BonusCard, ErrorKind, parse_log_coord};
    use tmledger_notation::Action;

    fn items() -> Vec<LogItem> {
        vec![
            LogItem::GameSettings(
                GameSettings::new()
                    .with_faction(Faction::Witches, 20)
                    .with_faction(Faction::Nomads, 22),
            ),
            LogItem::RoundStart {
                round: 0,
                turn_order: vec![Faction::Witches, Faction::Nomads],
            },
            LogItem::Action(Action::SetupDwelling {
                player: Faction::Witches,
                hex: parse_log_coord("E9").unwrap(),
            }),
            LogItem::Action(Action::SetupDwelling {
                player: Faction::Nomads,
                hex: parse_log_coord("E8").unwrap(),
            }),
            LogItem::RoundStart {
                round: 1,
                turn_order: vec![Faction::Nomads, Faction::Witches],
            },
            LogItem::Action(Action::Pass {
                player: Faction::Nomads,
                bonus: None,
            }),
        ]
    }

    #[test]
    fn run_replays_everything() {
        let mut replayer = Replayer::new(items());
        let report = replayer.run().unwrap();
        assert_eq!(report.executed, 6);
        assert!(report.is_clean());
        assert_eq!(replayer.round(), 1);
        assert_eq!(replayer.state().player(Faction::Nomads).unwrap().vp, 22);
        assert!(replayer.state().player(Faction::Nomads).unwrap().passed);
        assert_eq!(replayer.state().map.structures().count(), 2);
    }

    #[test]
    fn step_and_back() {
        let mut replayer = Replayer::new(items());
        assert!(matches!(replayer.step().unwrap(), Some(LogItem::GameSettings(_))));
        replayer.step().unwrap();
        replayer.step().unwrap();
        assert_eq!(replayer.state().map.structures().count(), 1);
        assert_eq!(replayer.back(2), 2);
        assert_eq!(replayer.cursor(), 1);
        assert_eq!(replayer.state().map.structures().count(), 0);
        assert_eq!(replayer.back(10), 1);
        assert_eq!(replayer.cursor(), 0);
    }

    #[test]
    fn failure_is_framed_and_leaves_state() {
        let mut bad = items();
        bad.insert(
            3,
            LogItem::Action(Action::SetupDwelling {
                player: Faction::Witches,
                hex: parse_log_coord("E9").unwrap(),
            }),
        );
        let mut replayer = Replayer::new(bad);
        let err = replayer.run().unwrap_err();
        assert!(matches!(err.kind, ErrorKind::IllegalAction(_)));
        let context = err.context.unwrap();
        assert_eq!(context.stack, vec!["item 3, round 0".to_string()]);
        assert_eq!(replayer.cursor(), 3);
        assert_eq!(replayer.state().map.structures().count(), 1);
    }

    #[test]
    fn lenient_runs_collect_errors() {
        let mut bad = items();
        bad.insert(
            2,
            LogItem::Action(Action::Pass {
                player: Faction::Halflings,
                bonus: None,
            }),
        );
        let mut replayer = Replayer::with_config(bad, ReplayConfig::lenient());
        let report = replayer.run().unwrap();
        assert_eq!(report.executed, 6);
        assert_eq!(report.errors.len(), 1);
        assert_eq!(report.errors[0].0, 2);
        assert!(replayer.is_finished());
    }

    #[test]
    fn settings_limit_the_bonus_cards() {
        let mut settings = GameSettings::new().with_faction(Faction::Witches, 20);
        settings.bonus_cards = vec![BonusCard::Spade, BonusCard::CultAction];
        let mut replayer = Replayer::new(vec![LogItem::GameSettings(settings)]);
        replayer.run().unwrap();
        assert_eq!(replayer.state().bonus_pool.len(), 2);
    }

    #[test]
    fn history_is_bounded() {
        let config = ReplayConfig::default().with_history_limit(2);
        let mut replayer = Replayer::with_config(items(), config);
        replayer.run().unwrap();
        assert_eq!(replayer.history_len(), 2);
        assert_eq!(replayer.back(5), 2);
        assert_eq!(replayer.cursor(), 4);
    }
}
