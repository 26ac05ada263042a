//! Strict reader for canonical logs.

use tmledger_foundation::{BonusCard, Error, ErrorContext, Faction, Result};

use crate::emitter::CELL_WIDTH;
use crate::item::{GameSettings, LogItem, SETUP_ROUND};
use crate::parser::parse_action_code;

/// Parses a canonical document into log items.
///
/// Items come out as: settings (if the header had any fields), then for each
/// section a `RoundStart` followed by its actions in row-major order.
///
/// # Errors
///
/// Fails on the first malformed header line, unknown faction or bad token.
/// Token errors carry the cell text, column faction, and 1-based line and
/// column in their context.
pub fn parse_canonical_log(text: &str) -> Result<Vec<LogItem>> {
    let mut items = Vec::new();
    let mut settings = GameSettings::new();
    let mut in_header = true;
    let mut round: Option<u8> = None;
    let mut columns: Option<Vec<Faction>> = None;

    for (index, raw) in text.lines().enumerate() {
        let line_no = index + 1;
        let line = raw.trim_end();
        let trimmed = line.trim();
        if trimmed.is_empty() || trimmed.starts_with("---") {
            continue;
        }

        if let Some(heading) = section_heading(trimmed) {
            if in_header {
                in_header = false;
                if !settings.is_empty() {
                    items.push(LogItem::GameSettings(std::mem::take(&mut settings)));
                }
            }
            round = Some(heading);
            columns = None;
            continue;
        }

        if in_header {
            let (key, value) = trimmed
                .split_once(':')
                .ok_or_else(|| at(Error::invalid_format("expected 'Key: value' header line"), line_no, 1))?;
            read_header_field(&mut settings, key.trim(), value.trim()).map_err(|e| at(e, line_no, 1))?;
            continue;
        }

        if let Some(order) = trimmed.strip_prefix("TurnOrder:") {
            let round = round.ok_or_else(|| at(Error::invalid_format("TurnOrder outside a section"), line_no, 1))?;
            let turn_order = parse_faction_list(order).map_err(|e| at(e, line_no, 1))?;
            items.push(LogItem::RoundStart {
                round,
                turn_order: turn_order.clone(),
            });
            columns = Some(turn_order);
            continue;
        }

        let Some(cols) = columns.as_ref() else {
            return Err(at(Error::invalid_format("grid row before TurnOrder"), line_no, 1));
        };
        let cells = split_cells(line);
        if is_header_row(&cells, cols) {
            continue;
        }
        if cells.iter().skip(cols.len()).any(|(_, cell)| !cell.is_empty()) {
            return Err(at(Error::invalid_format("more cells than columns"), line_no, 1));
        }
        for ((column, cell), player) in cells.iter().zip(cols) {
            if cell.is_empty() {
                continue;
            }
            let action = parse_action_code(*player, cell).map_err(|e| {
                e.with_context(
                    ErrorContext::new()
                        .with_source(*cell)
                        .with_player(player.title())
                        .with_position(line_no, *column),
                )
            })?;
            items.push(LogItem::Action(action));
        }
    }

    if in_header && !settings.is_empty() {
        items.push(LogItem::GameSettings(settings));
    }
    Ok(items)
}

/// Returns true if the text has the shape of a canonical document: a
/// section heading followed by a `TurnOrder:` line.
#[must_use]
pub fn looks_canonical(text: &str) -> bool {
    let mut lines = text.lines().map(str::trim).filter(|l| !l.is_empty());
    while let Some(line) = lines.next() {
        if section_heading(line).is_some() {
            return lines.next().is_some_and(|next| next.starts_with("TurnOrder:"));
        }
    }
    false
}

fn at(error: Error, line: usize, column: usize) -> Error {
    error.with_context(ErrorContext::new().with_position(line, column))
}

fn section_heading(line: &str) -> Option<u8> {
    if line == "Setup" {
        return Some(SETUP_ROUND);
    }
    line.strip_prefix("Round ")?.trim().parse().ok()
}

fn list(value: &str) -> impl Iterator<Item = &str> {
    value.split(',').map(str::trim).filter(|s| !s.is_empty())
}

fn parse_faction_list(value: &str) -> Result<Vec<Faction>> {
    list(value)
        .map(|name| Faction::from_name(name).ok_or_else(|| Error::unknown_faction(name)))
        .collect()
}

fn read_header_field(settings: &mut GameSettings, key: &str, value: &str) -> Result<()> {
    match key {
        "Game" => settings.game = Some(value.to_string()),
        "ScoringTiles" => settings.scoring_tiles = list(value).map(String::from).collect(),
        "BonusCards" => {
            settings.bonus_cards = list(value)
                .map(|code| {
                    BonusCard::from_code(code).ok_or_else(|| Error::unknown_token(code, "unknown bonus card"))
                })
                .collect::<Result<_>>()?;
        }
        "StartingVPs" => {
            for entry in list(value) {
                let (name, vp) = entry
                    .rsplit_once(':')
                    .ok_or_else(|| Error::invalid_format(format!("expected Faction:VP, got '{entry}'")))?;
                let faction = Faction::from_name(name).ok_or_else(|| Error::unknown_faction(name))?;
                let vp = vp
                    .trim()
                    .parse()
                    .map_err(|_| Error::invalid_format(format!("bad starting VP '{entry}'")))?;
                settings.starting_vps.push((faction, vp));
            }
        }
        "Players" => {
            for entry in list(value) {
                let (name, faction) = entry
                    .rsplit_once(':')
                    .ok_or_else(|| Error::invalid_format(format!("expected Player:Faction, got '{entry}'")))?;
                let faction = Faction::from_name(faction).ok_or_else(|| Error::unknown_faction(faction))?;
                settings.players.push((name.trim().to_string(), faction));
            }
        }
        "Options" => settings.options = list(value).map(String::from).collect(),
        _ => {
            settings.extras.insert(key.to_string(), value.to_string());
        }
    }
    Ok(())
}

// Cells with their 1-based starting column.
fn split_cells(line: &str) -> Vec<(usize, &str)> {
    let mut cells = Vec::with_capacity(line.len() / CELL_WIDTH + 1);
    let mut offset = 0;
    for piece in line.split('|') {
        let lead = piece.len() - piece.trim_start().len();
        cells.push((offset + lead + 1, piece.trim()));
        offset += piece.len() + 1;
    }
    cells
}

fn is_header_row(cells: &[(usize, &str)], columns: &[Faction]) -> bool {
    cells.len() == columns.len()
        && cells
            .iter()
            .zip(columns)
            .all(|((_, cell), faction)| Faction::from_name(cell) == Some(*faction))
}
