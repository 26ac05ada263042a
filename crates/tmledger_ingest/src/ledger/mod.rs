//! The Snellman ledger lexer.
//!
//! A ledger is a line-per-event export: header options, scoring and removed
//! bonus announcements, `Round N income` / `Round N, turn M` boundaries, and
//! tab-separated faction rows carrying resources and the command typed.
//!
//! [`read_ledger`] walks the lines once, converting each command and placing
//! it on the current round's grid. [`LedgerDocument::into_log`] then runs
//! reconstruction per round and produces the canonical document.

mod convert;
mod extract;
mod place;

pub use convert::convert_ledger_action;
pub use extract::{cult_delta, extract_ledger_action, leech_source, trailing_leech};
pub use place::RoundBuilder;

use once_cell::sync::Lazy;
use regex::Regex;
use tmledger_foundation::{BonusCard, CultTrack, ErrorContext, Faction, Result};
use tmledger_notation::{CanonicalLog, GameSettings, SETUP_ROUND, Section};
use tracing::{debug, info};

use crate::config::ConvertConfig;
use crate::grid::RoundGrid;
use crate::reconstruct::reconstruct;

static SCORING: Lazy<Regex> = Lazy::new(|| Regex::new(r"(?i)^round\s+\d+\s+scoring\b").expect("valid pattern"));
static SCORE_CODE: Lazy<Regex> = Lazy::new(|| Regex::new(r"(?i)\b(SCORE\d+)\b").expect("valid pattern"));
static REMOVED_BONUS: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)^removing\s+(?:tile|bonus\s+tile)\s+(BON\d+)\b").expect("valid pattern")
});
static ROUND_NUMBER: Lazy<Regex> = Lazy::new(|| Regex::new(r"Round (\d+)").expect("valid pattern"));
static CULT_PREFIX: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)^\+(EARTH|WATER|FIRE|AIR)\.?\s*(.*)$").expect("valid pattern"));
static CULT_LEECH: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^\+(EARTH|WATER|FIRE|AIR)\.\s*Leech").expect("valid pattern"));
static CULT_PASS: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)^\+(EARTH|WATER|FIRE|AIR)\.\s*(pass\s+.+)$").expect("valid pattern"));

/// Starting VP every faction is credited with in the header.
pub const STARTING_VP: i32 = 20;

/// Everything read from a ledger, before reconstruction.
#[derive(Clone, Debug, Default)]
pub struct LedgerDocument {
    /// Factions in order of first appearance.
    pub factions: Vec<Faction>,
    /// `option` names, in order.
    pub options: Vec<String>,
    /// Scoring tile codes, de-duplicated.
    pub scoring_tiles: Vec<String>,
    /// Bonus cards taken out of the game.
    pub removed_bonus_cards: Vec<BonusCard>,
    /// Setup tokens per faction, in entry order.
    pub setup: Vec<(Faction, Vec<String>)>,
    /// Order in which factions picked their setup bonus card.
    pub setup_pass_order: Vec<Faction>,
    /// Placed rounds.
    pub rounds: Vec<RoundGrid>,
    /// `option variable-turn-order` was set.
    pub variable_turn_order: bool,
    /// `option maintain-player-order` was set.
    pub maintain_player_order: bool,
}

impl LedgerDocument {
    fn note_faction(&mut self, faction: Faction) {
        if !self.factions.contains(&faction) {
            self.factions.push(faction);
        }
    }

    fn push_setup(&mut self, faction: Faction, token: String) {
        if token.starts_with("BON-") && !self.setup_pass_order.contains(&faction) {
            self.setup_pass_order.push(faction);
        }
        match self.setup.iter_mut().find(|(f, _)| *f == faction) {
            Some((_, tokens)) => tokens.push(token),
            None => self.setup.push((faction, vec![token])),
        }
    }

    /// Column order for the next round.
    ///
    /// The faction list, unless the previous round saw every faction pass:
    /// then the pass order itself under `variable-turn-order`, or the
    /// faction list rotated to start at the first passer.
    #[must_use]
    pub fn next_turn_order(&self) -> Vec<Faction> {
        let Some(prev) = self.rounds.last() else {
            return self.factions.clone();
        };
        if prev.pass_order.len() != self.factions.len() {
            return self.factions.clone();
        }
        if self.variable_turn_order {
            return prev.pass_order.clone();
        }
        match prev.pass_order.first().and_then(|first| self.factions.iter().position(|f| f == first)) {
            Some(at) => {
                let mut order = self.factions.clone();
                order.rotate_left(at);
                order
            }
            None => self.factions.clone(),
        }
    }

    /// Header settings for the canonical document.
    #[must_use]
    pub fn settings(&self) -> GameSettings {
        let mut settings = GameSettings::new().with_game("Base");
        settings.scoring_tiles.clone_from(&self.scoring_tiles);
        settings.bonus_cards = BonusCard::ALL
            .into_iter()
            .filter(|card| !self.removed_bonus_cards.contains(card))
            .collect();
        for faction in &self.factions {
            settings = settings.with_faction(*faction, STARTING_VP);
        }
        settings.options.clone_from(&self.options);
        settings
    }

    fn setup_section(&self) -> Section {
        let mut section = Section::new(SETUP_ROUND, self.factions.clone());
        let depth = self.setup.iter().map(|(_, tokens)| tokens.len()).max().unwrap_or(0);
        for i in 0..depth {
            let row = self
                .factions
                .iter()
                .map(|faction| {
                    self.setup
                        .iter()
                        .find(|(f, _)| f == faction)
                        .and_then(|(_, tokens)| tokens.get(i).cloned())
                        .unwrap_or_default()
                })
                .collect();
            section.rows.push(row);
        }
        section
    }

    /// Reconstructs every round and renders the canonical document.
    ///
    /// # Errors
    ///
    /// Returns the first reconstruction failure, framed with its round.
    pub fn into_log(self, config: &ConvertConfig) -> Result<CanonicalLog> {
        let mut log = CanonicalLog::new(self.settings());
        if !self.factions.is_empty() {
            log.sections.push(self.setup_section());
        }
        for mut grid in self.rounds {
            let stray = grid.stray_factions();
            grid.columns.extend(stray);
            if config.reconstruct {
                let round = grid.round;
                reconstruct(&mut grid).map_err(|e| e.in_frame(format!("round {round}")))?;
            }
            let mut section = Section::new(grid.round, grid.columns.clone());
            section.rows = grid.rows(config.annotate_leech_sources);
            log.sections.push(section);
        }
        Ok(log)
    }
}

fn track_suffix(word: &str) -> String {
    CultTrack::from_code(word).map_or_else(|| format!("+{word}"), |t| format!("+{}", t.code()))
}

fn round_number(line: &str) -> Option<u8> {
    ROUND_NUMBER.captures(line).and_then(|caps| caps[1].parse().ok())
}

struct Reader {
    doc: LedgerDocument,
    current: Option<RoundBuilder>,
    in_setup: bool,
}

impl Reader {
    fn new() -> Self {
        Self {
            doc: LedgerDocument::default(),
            current: None,
            in_setup: true,
        }
    }

    fn finish_round(&mut self) {
        if let Some(builder) = self.current.take() {
            self.doc.rounds.push(builder.into_grid());
        }
    }

    // Opens `round`, or starts a new turn if it is already open.
    fn enter_round(&mut self, round: u8, new_turn: bool) {
        self.in_setup = false;
        match &mut self.current {
            Some(builder) if builder.grid.round == round => {
                if new_turn {
                    builder.start_turn();
                }
            }
            _ => {
                self.finish_round();
                let order = self.doc.next_turn_order();
                debug!(round, turn_order = ?order, "opening round");
                self.current = Some(RoundBuilder::new(round, order));
            }
        }
    }

    fn option(&mut self, line: &str) {
        let name = line["option ".len()..].trim().to_string();
        let lower = name.to_lowercase();
        if lower.contains("maintain-player-order") {
            self.doc.maintain_player_order = true;
        }
        if lower.contains("variable-turn-order") {
            self.doc.variable_turn_order = true;
        }
        if !name.is_empty() && !self.doc.options.contains(&name) {
            self.doc.options.push(name);
        }
    }

    fn scoring(&mut self, line: &str) {
        for caps in SCORE_CODE.captures_iter(line) {
            let code = caps[1].to_uppercase();
            if !self.doc.scoring_tiles.contains(&code) {
                self.doc.scoring_tiles.push(code);
            }
        }
    }

    // Cultists get a cult step when a neighbour takes power. The ledger writes
    // it in front of some later command; it belongs to their last main action.
    fn strip_cult_bonus(&mut self, faction: Faction, action: String) -> Option<String> {
        if self.in_setup {
            return Some(action);
        }
        let Some(builder) = self.current.as_mut() else {
            return Some(action);
        };

        let mut action = action;
        if faction == Faction::Cultists {
            if let Some(caps) = CULT_PREFIX.captures(&action) {
                builder.append_to_last_main(faction, &track_suffix(&caps[1]));
                let remainder = caps[2].trim().to_string();
                if remainder.is_empty() {
                    return None;
                }
                action = remainder;
            }
        }
        if let Some(caps) = CULT_LEECH.captures(&action) {
            builder.append_to_last_main(faction, &track_suffix(&caps[1]));
            action = trailing_leech(&action);
        }
        if let Some(caps) = CULT_PASS.captures(&action) {
            builder.append_to_last_main(faction, &track_suffix(&caps[1]));
            action = caps[2].to_string();
        }
        Some(action)
    }

    fn faction_row(&mut self, line: &str, line_number: usize) -> Result<()> {
        let parts: Vec<&str> = line.split('\t').collect();
        if parts.len() < 2 {
            return Ok(());
        }
        let Some(faction) = Faction::from_name(parts[0].trim()) else {
            return Ok(());
        };
        self.doc.note_faction(faction);

        let Some(action) = extract_ledger_action(&parts) else {
            return Ok(());
        };
        let Some(action) = self.strip_cult_bonus(faction, action) else {
            return Ok(());
        };

        let token = convert_ledger_action(&action, faction, self.in_setup, cult_delta(&parts));
        if token.is_empty() {
            return Ok(());
        }

        if self.in_setup {
            self.doc.push_setup(faction, token);
            return Ok(());
        }
        let Some(builder) = self.current.as_mut() else {
            return Ok(());
        };
        builder.place(faction, &token, &action).map_err(|e| {
            e.with_context(
                ErrorContext::new()
                    .with_source(line.to_string())
                    .with_player(faction.title())
                    .with_position(line_number, 1),
            )
        })
    }
}

/// Reads a tab-delimited ledger.
///
/// # Errors
///
/// Returns `MissingLeechSource` or `UnresolvedReaction` when a leech row
/// cannot be placed, with the offending line attached.
pub fn read_ledger(text: &str) -> Result<LedgerDocument> {
    let mut reader = Reader::new();
    let lines: Vec<&str> = text.lines().collect();
    let mut i = 0;

    while i < lines.len() {
        let line = lines[i].trim();
        let line_number = i + 1;
        i += 1;
        if line.is_empty() {
            continue;
        }

        if line.to_lowercase().starts_with("option ") {
            reader.option(line);
            continue;
        }
        if SCORING.is_match(line) {
            reader.scoring(line);
            continue;
        }
        if let Some(caps) = REMOVED_BONUS.captures(line) {
            if let Some(card) = BonusCard::from_code(&caps[1]) {
                reader.doc.removed_bonus_cards.push(card);
            }
            continue;
        }

        if line.starts_with("Round ") && line.contains("income") {
            if let Some(round) = round_number(line) {
                reader.enter_round(round, false);
            }
            reader.in_setup = false;
            // Income rows are bookkeeping; replay recomputes income.
            while i < lines.len() {
                let next = lines[i].trim();
                if next.is_empty() || next.starts_with("Round ") || next.starts_with("Turn ") {
                    break;
                }
                i += 1;
            }
            continue;
        }
        if line.starts_with("Round ") && line.contains("turn") {
            if let Some(round) = round_number(line) {
                reader.enter_round(round, true);
            }
            reader.in_setup = false;
            continue;
        }

        reader.faction_row(line, line_number)?;
    }

    reader.finish_round();
    let doc = reader.doc;
    info!(
        factions = doc.factions.len(),
        rounds = doc.rounds.len(),
        "read ledger"
    );
    Ok(doc)
}

/// Reads a ledger and renders it as canonical notation.
///
/// # Errors
///
/// Returns placement and reconstruction failures.
pub fn ledger_to_log(text: &str, config: &ConvertConfig) -> Result<CanonicalLog> {
    read_ledger(text)?.into_log(config)
}

#[cfg(test)]
mod tests {
    use super::*;

    const LEDGER: &str = "Default game options\n\
        option strict-leech\n\
        option variable-turn-order\n\
        Round 1 scoring: SCORE2, TOWN >> 5\n\
        Round 2 scoring: SCORE5, DWELLING >> 2\n\
        Removing tile BON3\n\
        witches\t20 VP\t\t15 C\t3 W\t0 P\t5/7/0 PW\t0/0/0/0\tbuild E6\n\
        nomads\t20 VP\t\t15 C\t2 W\t0 P\t5/7/0 PW\t1/0/1/0\tbuild F4\n\
        witches\t20 VP\t\t15 C\t2 W\t0 P\t5/7/0 PW\t0/0/0/0\tbuild E7\n\
        nomads\t20 VP\t\t15 C\t1 W\t0 P\t5/7/0 PW\t1/0/1/0\tbuild F5\n\
        nomads\t20 VP\t\t15 C\t1 W\t0 P\t5/7/0 PW\t1/0/1/0\tbuild G5\n\
        nomads\t20 VP\t\t15 C\t1 W\t0 P\t5/7/0 PW\t1/0/1/0\tpass BON1\n\
        witches\t20 VP\t\t15 C\t1 W\t0 P\t5/7/0 PW\t0/0/0/0\tpass BON7\n\
        Round 1 income\n\
        witches\t+3 C\tfor income\n\
        nomads\t+2 W\tfor income\n\
        \n\
        Round 1, turn 1\n\
        witches\t20 VP\t-2 C\t13 C\t1 W\t0 P\t5/7/0 PW\t0/0/0/0\tupgrade E6 to TP\n\
        nomads\t20 VP\t+1 PW\t\t\t\t4/8/0 PW\t1/0/1/0\tLeech 1 from witches\n\
        nomads\t20 VP\t\t\t\t\t\t1/0/1/0\tpass BON3\n\
        Round 1, turn 2\n\
        witches\t20 VP\t\t\t\t\t\t0/0/0/0\tpass BON1\n\
        Round 2 income\n\
        witches\t+3 C\tfor income\n";

    #[test]
    fn header_lines_fill_settings() {
        let doc = read_ledger(LEDGER).unwrap();
        assert_eq!(doc.factions, vec![Faction::Witches, Faction::Nomads]);
        assert_eq!(doc.scoring_tiles, vec!["SCORE2", "SCORE5"]);
        assert_eq!(doc.removed_bonus_cards, vec![BonusCard::SixCoins]);
        assert!(doc.variable_turn_order);
        assert!(doc.options.contains(&"strict-leech".to_string()));
        let settings = doc.settings();
        assert_eq!(settings.bonus_cards.len(), 9);
        assert_eq!(settings.starting_vps, vec![(Faction::Witches, 20), (Faction::Nomads, 20)]);
    }

    #[test]
    fn setup_rows_are_collected_per_faction() {
        let doc = read_ledger(LEDGER).unwrap();
        assert_eq!(doc.setup_pass_order, vec![Faction::Nomads, Faction::Witches]);
        let section = doc.setup_section();
        assert_eq!(section.rows[0], vec!["S-E6".to_string(), "S-F4".to_string()]);
        assert_eq!(section.rows.len(), 4);
    }

    #[test]
    fn rounds_follow_the_pass_order() {
        let doc = read_ledger(LEDGER).unwrap();
        assert_eq!(doc.rounds.len(), 2);
        let first = &doc.rounds[0];
        assert_eq!(first.pass_order, vec![Faction::Nomads, Faction::Witches]);
        assert_eq!(doc.rounds[1].columns, vec![Faction::Nomads, Faction::Witches]);
    }

    #[test]
    fn leech_lands_after_its_source() {
        let log = ledger_to_log(LEDGER, &ConvertConfig::annotated()).unwrap();
        let round = &log.sections[1];
        assert_eq!(round.round, 1);
        assert_eq!(round.rows[0][0], "UP-TH-E6");
        assert_eq!(round.rows[0][1], "L-Witches");
        let text = log.render();
        assert!(text.starts_with("Game: Base\nScoringTiles: SCORE2, SCORE5\n"));
        assert!(text.contains("Round 1\nTurnOrder: Witches, Nomads\n"));
    }

    #[test]
    fn cultists_cult_bonus_joins_their_last_action() {
        let ledger = "cultists\t20 VP\tbuild E7\n\
            witches\t20 VP\tbuild E6\n\
            Round 1, turn 1\n\
            cultists\t20 VP\t\t\t\t\t\t0/0/0/0\tbuild E8\n\
            witches\t20 VP\t+1 PW\t\t\t\t\t0/0/0/0\tLeech 1 from cultists\n\
            cultists\t20 VP\t+1\t\t\t\t\t1/0/0/0\t+FIRE. pass BON1\n";
        let doc = read_ledger(ledger).unwrap();
        let grid = &doc.rounds[0];
        assert_eq!(grid.token(0, Faction::Cultists), "E8.+F");
        assert!(grid.pass_order.contains(&Faction::Cultists));
    }

    #[test]
    fn unplaceable_leech_reports_its_line() {
        let ledger = "witches\t20 VP\tbuild E6\n\
            nomads\t20 VP\tbuild F4\n\
            Round 1, turn 1\n\
            nomads\t20 VP\tLeech 1 from witches\n";
        let err = read_ledger(ledger).unwrap_err();
        let context = err.context.as_ref().unwrap();
        assert_eq!(context.line, Some(4));
        assert_eq!(context.player.as_deref(), Some("Nomads"));
    }
}
