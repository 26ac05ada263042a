//! Canonical log rendering.
//!
//! A [`CanonicalLog`] is a settings header followed by sections, one for
//! setup and one per round. Each section is a grid: one column per faction
//! in turn order, one row per step of play, cells holding dot-joined tokens.

use std::fmt;

use tmledger_foundation::Faction;

use crate::action::Action;
use crate::classify::is_reaction_token;
use crate::item::{GameSettings, LogItem, SETUP_ROUND};

/// Width every cell is padded to.
pub const CELL_WIDTH: usize = 12;

/// One `Setup` or `Round N` block.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Section {
    /// Round number; [`SETUP_ROUND`] for setup.
    pub round: u8,
    /// Column factions.
    pub turn_order: Vec<Faction>,
    /// Grid rows; each row has at most one cell per column.
    pub rows: Vec<Vec<String>>,
}

impl Section {
    /// Creates an empty section.
    #[must_use]
    pub const fn new(round: u8, turn_order: Vec<Faction>) -> Self {
        Self {
            round,
            turn_order,
            rows: Vec::new(),
        }
    }

    /// Returns the heading line.
    #[must_use]
    pub fn title(&self) -> String {
        if self.round == SETUP_ROUND {
            "Setup".to_string()
        } else {
            format!("Round {}", self.round)
        }
    }

    /// Returns the column of a faction, adding one if it is missing.
    pub fn column_of(&mut self, faction: Faction) -> usize {
        if let Some(col) = self.turn_order.iter().position(|f| *f == faction) {
            return col;
        }
        self.turn_order.push(faction);
        self.turn_order.len() - 1
    }

    fn separator(&self, cell_width: usize) -> String {
        let n = self.turn_order.len().max(1);
        "-".repeat(cell_width * n + 3 * (n - 1))
    }
}

/// Renders one grid row of `columns` cells, each padded to `cell_width`.
/// Returns `None` when every cell is blank.
#[must_use]
pub fn render_row(cells: &[String], columns: usize, cell_width: usize) -> Option<String> {
    if cells.iter().all(|c| c.trim().is_empty()) {
        return None;
    }
    let padded: Vec<String> = (0..columns.max(cells.len()))
        .map(|i| {
            let cell = cells.get(i).map_or("", String::as_str);
            format!("{cell:<cell_width$}")
        })
        .collect();
    Some(padded.join(" | ").trim_end().to_string())
}

/// A complete canonical document.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct CanonicalLog {
    /// Header fields.
    pub settings: GameSettings,
    /// Setup and round sections, in order.
    pub sections: Vec<Section>,
}

impl CanonicalLog {
    /// Creates an empty log.
    #[must_use]
    pub fn new(settings: GameSettings) -> Self {
        Self {
            settings,
            sections: Vec::new(),
        }
    }

    /// Renders the document as text.
    #[must_use]
    pub fn render(&self) -> String {
        self.to_string()
    }

    /// Renders the document with cells padded to `cell_width`.
    #[must_use]
    pub fn render_with_width(&self, cell_width: usize) -> String {
        let mut out = String::new();
        let header = self.header_lines();
        for line in &header {
            out.push_str(line);
            out.push('\n');
        }
        for (i, section) in self.sections.iter().enumerate() {
            if i > 0 || !header.is_empty() {
                out.push('\n');
            }
            let names: Vec<String> = section.turn_order.iter().map(|faction| faction.title().to_string()).collect();
            let columns = names.len();
            let separator = section.separator(cell_width);
            out.push_str(&section.title());
            out.push('\n');
            out.push_str(&format!("TurnOrder: {}\n", names.join(", ")));
            out.push_str(&separator);
            out.push('\n');
            if let Some(row) = render_row(&names, columns, cell_width) {
                out.push_str(&row);
                out.push('\n');
            }
            out.push_str(&separator);
            out.push('\n');
            for row in &section.rows {
                if let Some(line) = render_row(row, columns, cell_width) {
                    out.push_str(&line);
                    out.push('\n');
                }
            }
        }
        out
    }

    fn header_lines(&self) -> Vec<String> {
        let s = &self.settings;
        let mut lines = Vec::new();
        if let Some(game) = &s.game {
            lines.push(format!("Game: {game}"));
        }
        if !s.scoring_tiles.is_empty() {
            lines.push(format!("ScoringTiles: {}", s.scoring_tiles.join(", ")));
        }
        if !s.bonus_cards.is_empty() {
            let cards: Vec<&str> = s.bonus_cards.iter().map(|c| c.code()).collect();
            lines.push(format!("BonusCards: {}", cards.join(", ")));
        }
        if !s.starting_vps.is_empty() {
            let vps: Vec<String> = s
                .starting_vps
                .iter()
                .map(|(f, vp)| format!("{}:{vp}", f.title()))
                .collect();
            lines.push(format!("StartingVPs: {}", vps.join(", ")));
        }
        if !s.players.is_empty() {
            let players: Vec<String> = s
                .players
                .iter()
                .map(|(name, f)| format!("{name}:{}", f.title()))
                .collect();
            lines.push(format!("Players: {}", players.join(", ")));
        }
        if !s.options.is_empty() {
            lines.push(format!("Options: {}", s.options.join(", ")));
        }
        for (key, value) in &s.extras {
            lines.push(format!("{key}: {value}"));
        }
        lines
    }
}

impl fmt::Display for CanonicalLog {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.render_with_width(CELL_WIDTH))
    }
}

/// Where an emitted action landed.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct CellRef {
    /// Index into [`CanonicalLog::sections`].
    pub section: usize,
    /// Row within the section.
    pub row: usize,
    /// Column within the row.
    pub column: usize,
}

/// The result of [`emit_items`].
#[derive(Clone, Debug, Default)]
pub struct Emitted {
    /// The generated document.
    pub log: CanonicalLog,
    /// For each input item, the cell its action was written to.
    pub locations: Vec<Option<CellRef>>,
}

struct Cursor {
    row: Vec<String>,
    last_actor: Option<Faction>,
    last_reaction: bool,
    last_col: Option<usize>,
    /// Conversions with no cell to join yet, waiting for their actor's
    /// next action.
    held: Vec<(Faction, String)>,
}

impl Cursor {
    const fn new() -> Self {
        Self {
            row: Vec::new(),
            last_actor: None,
            last_reaction: false,
            last_col: None,
            held: Vec::new(),
        }
    }

    fn take_held(&mut self, actor: Faction) -> Vec<String> {
        let (mine, rest): (Vec<_>, Vec<_>) = self.held.drain(..).partition(|(f, _)| *f == actor);
        self.held = rest;
        mine.into_iter().map(|(_, code)| code).collect()
    }

    /// Places conversions still held at the end of a section onto their
    /// actor's latest non-reaction cell.
    fn settle(&mut self, section: &mut Section) {
        for (actor, code) in std::mem::take(&mut self.held) {
            let col = section.column_of(actor);
            if self.row.len() < section.turn_order.len() {
                self.row.resize(section.turn_order.len(), String::new());
            }
            let joinable = |cell: &String| !cell.is_empty() && !is_reaction_token(cell);
            let target = if joinable(&self.row[col]) {
                Some(&mut self.row[col])
            } else {
                section
                    .rows
                    .iter_mut()
                    .rev()
                    .filter_map(|row| row.get_mut(col))
                    .find(|cell| joinable(cell))
            };
            match target {
                Some(cell) => {
                    cell.push('.');
                    cell.push_str(&code);
                }
                None => {
                    self.flush(section);
                    self.row.resize(section.turn_order.len(), String::new());
                    self.row[col] = code;
                }
            }
        }
    }

    fn finish(&mut self, section: &mut Section) {
        self.settle(section);
        self.flush(section);
    }

    fn flush(&mut self, section: &mut Section) {
        if self.row.iter().any(|c| !c.is_empty()) {
            section.rows.push(std::mem::take(&mut self.row));
        }
        self.row.clear();
        self.last_col = None;
    }
}

/// Lays a flat item stream out as a canonical grid.
///
/// Consecutive actions by one actor chain into the same cell unless either
/// is a leech reaction. A new row starts when the target cell is taken or the
/// actor's column is at or left of the last written column. A conversion
/// that cannot join its actor's current cell is held and written in front
/// of that actor's next action, since a conversion never stands alone.
#[must_use]
pub fn emit_items(items: &[LogItem]) -> Emitted {
    let mut out = Emitted {
        log: CanonicalLog::default(),
        locations: Vec::with_capacity(items.len()),
    };
    let mut cursor = Cursor::new();

    for item in items {
        match item {
            LogItem::GameSettings(settings) => {
                out.log.settings = settings.clone();
                out.locations.push(None);
            }
            LogItem::RoundStart { round, turn_order } => {
                if let Some(section) = out.log.sections.last_mut() {
                    cursor.finish(section);
                }
                cursor = Cursor::new();
                out.log.sections.push(Section::new(*round, turn_order.clone()));
                out.locations.push(None);
            }
            LogItem::Action(action) => {
                let location = place_action(&mut out.log, &mut cursor, action, items);
                out.locations.push(location);
            }
        }
    }
    if let Some(section) = out.log.sections.last_mut() {
        cursor.finish(section);
    }
    out
}

fn place_action(
    log: &mut CanonicalLog,
    cursor: &mut Cursor,
    action: &Action,
    items: &[LogItem],
) -> Option<CellRef> {
    let actor = action.actor()?;
    if log.sections.is_empty() {
        let columns = setup_columns(&log.settings, items);
        log.sections.push(Section::new(SETUP_ROUND, columns));
    }
    let section_index = log.sections.len() - 1;
    let section = &mut log.sections[section_index];
    let col = section.column_of(actor);
    if cursor.row.len() < section.turn_order.len() {
        cursor.row.resize(section.turn_order.len(), String::new());
    }

    let mut code = action.to_string();
    let reaction = action.is_reaction();
    let chains = cursor.last_actor == Some(actor) && !cursor.last_reaction && !reaction;
    if matches!(action, Action::Conversion { .. }) && !(chains && !cursor.row[col].is_empty()) {
        cursor.held.push((actor, code));
        return None;
    }
    if !reaction {
        let mut held = cursor.take_held(actor);
        if !held.is_empty() {
            held.push(code);
            code = held.join(".");
        }
    }
    if chains && !cursor.row[col].is_empty() {
        cursor.row[col].push('.');
        cursor.row[col].push_str(&code);
    } else {
        let occupied = !cursor.row[col].is_empty();
        let backtrack = cursor.last_col.is_some_and(|last| col <= last);
        if !chains && (occupied || backtrack) {
            cursor.flush(section);
            cursor.row.resize(section.turn_order.len(), String::new());
        }
        cursor.row[col] = code;
    }
    cursor.last_actor = Some(actor);
    cursor.last_reaction = reaction;
    cursor.last_col = Some(col);

    Some(CellRef {
        section: section_index,
        row: section.rows.len(),
        column: col,
    })
}

// Setup columns: the header's seating, else first appearance in the stream.
fn setup_columns(settings: &GameSettings, items: &[LogItem]) -> Vec<Faction> {
    let seated = settings.factions();
    if !seated.is_empty() {
        return seated;
    }
    let mut columns = Vec::new();
    for item in items {
        let candidates: Vec<Faction> = match item {
            LogItem::Action(action) => action.actor().into_iter().collect(),
            LogItem::RoundStart { turn_order, .. } => turn_order.clone(),
            LogItem::GameSettings(_) => Vec::new(),
        };
        for faction in candidates {
            if !columns.contains(&faction) {
                columns.push(faction);
            }
        }
    }
    columns
}
