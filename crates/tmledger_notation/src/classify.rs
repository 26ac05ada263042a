//! Token-level classification.
//!
//! The reconstruction passes shuffle raw cell text around and need to ask
//! questions of it without building full [`Action`](crate::Action)s: is this
//! a leech reaction, which source does it name, could this cell have made a
//! leech offer.

use tmledger_foundation::{Faction, is_coord};

fn upper_parts(token: &str) -> Vec<String> {
    token
        .split('.')
        .map(|p| {
            let upper = p.trim().to_ascii_uppercase();
            let unwrapped = upper
                .strip_prefix("PRE-")
                .or_else(|| upper.strip_prefix("POST-"))
                .unwrap_or(&upper);
            unwrapped.to_string()
        })
        .filter(|p| !p.is_empty())
        .collect()
}

/// Returns true if any part of the cell places or upgrades a building.
#[must_use]
pub fn token_may_trigger(token: &str) -> bool {
    upper_parts(token).iter().any(|part| {
        is_coord(part)
            || ["UP-", "TB-", "ACT-SH-D-", "ACT-SH-TP-"]
                .iter()
                .any(|prefix| part.starts_with(prefix))
    })
}

/// Returns true for a leech accept or decline cell (`L`, `L3-Witches`, `DL`).
#[must_use]
pub fn is_reaction_token(token: &str) -> bool {
    split_reaction(token).is_some()
}

/// Returns true for a decline cell.
#[must_use]
pub fn is_decline_token(token: &str) -> bool {
    split_reaction(token).is_some_and(|(head, _)| head == "DL")
}

/// Returns the source faction a reaction cell names.
#[must_use]
pub fn reaction_source(token: &str) -> Option<Faction> {
    let (_, source) = split_reaction(token)?;
    Faction::from_name(source?)
}

/// Rewrites a reaction cell to name `source`, replacing any existing source.
///
/// Non-reaction tokens are returned unchanged.
#[must_use]
pub fn with_reaction_source(token: &str, source: Faction) -> String {
    match split_reaction(token) {
        Some((head, _)) => format!("{head}-{}", source.title().replace(' ', "")),
        None => token.to_string(),
    }
}

/// Strips the source annotation from a reaction cell.
#[must_use]
pub fn without_reaction_source(token: &str) -> String {
    match split_reaction(token) {
        Some((head, _)) => head,
        None => token.to_string(),
    }
}

// Splits `L3-Witches` into ("L3", Some("Witches")).
fn split_reaction(token: &str) -> Option<(String, Option<&str>)> {
    let trimmed = token.trim();
    if trimmed.contains('.') {
        return None;
    }
    let (head, source) = match trimmed.split_once('-') {
        Some((head, source)) => (head, Some(source)),
        None => (trimmed, None),
    };
    let upper = head.to_ascii_uppercase();
    let is_reaction = upper == "DL"
        || upper
            .strip_prefix('L')
            .is_some_and(|n| n.bytes().all(|b| b.is_ascii_digit()));
    is_reaction.then_some((upper, source))
}
