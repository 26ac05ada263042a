//! Pulling the action text out of a ledger row.
//!
//! A faction row is a run of tab-separated columns: the faction key, resource
//! totals and deltas, the cult column, and somewhere near the end the command
//! the player typed. Everything here works on those raw columns.

use once_cell::sync::Lazy;
use regex::Regex;
use tmledger_foundation::Faction;

static TRACK_FIELD: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^\+[A-Za-z0-9]+(\.|$)").expect("valid pattern"));
static FAVOR_ACTION: Lazy<Regex> = Lazy::new(|| Regex::new(r"(?i)^action\s+fav\d+").expect("valid pattern"));
static COMMAND: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)(action|pass|convert|build|upgrade|transform|burn|dig|send p to|advance|leech|decline).*")
        .expect("valid pattern")
});
static CULT_COLUMN: Lazy<Regex> = Lazy::new(|| Regex::new(r"^\d+/\d+/\d+/\d+$").expect("valid pattern"));
static SIGNED: Lazy<Regex> = Lazy::new(|| Regex::new(r"^[+-]\d+$").expect("valid pattern"));
static LEECH_SOURCE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)(?:Leech|Decline)\s+\d+\s+from\s+([a-z ]+)$").expect("valid pattern"));
static TRAILING_LEECH: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)(Leech\s+\d+\s+from\s+.+|Decline\s+\d+\s+from\s+.+)$").expect("valid pattern")
});

const BOOKKEEPING: [&str; 4] = ["for network", "for cult", "for resources", "for passing"];
const KEYWORDS: [&str; 12] = [
    "action",
    "pass",
    "convert",
    "build",
    "upgrade",
    "transform",
    "burn",
    "dig",
    "send p to",
    "advance",
    "leech",
    "decline",
];

/// Finds the command column of a faction row.
///
/// Scans from the last column back. Bookkeeping rows (`for network`,
/// `for cult`) yield nothing. A bare `+TRACK` column is kept whole, joined to
/// a preceding `action BON2` / `action FAVn` column when there is one.
/// Resource and delta columns are skipped. Returns `None` when no column
/// looks like a command.
#[must_use]
pub fn extract_ledger_action(parts: &[&str]) -> Option<String> {
    for (i, raw) in parts.iter().enumerate().rev() {
        let part = raw.trim();
        if part.is_empty() {
            continue;
        }
        let lower = part.to_lowercase();
        if BOOKKEEPING.iter().any(|b| lower.contains(b)) {
            continue;
        }

        if TRACK_FIELD.is_match(part) {
            let joined = i.checked_sub(1).map(|p| parts[p].trim()).and_then(|prev| {
                let prev_lower = prev.to_lowercase();
                (prev_lower.starts_with("action bon2") || FAVOR_ACTION.is_match(prev)).then(|| {
                    if prev.ends_with('.') {
                        format!("{prev} {part}")
                    } else {
                        format!("{prev}. {part}")
                    }
                })
            });
            return Some(joined.unwrap_or_else(|| part.to_string()));
        }

        if KEYWORDS.iter().any(|k| lower.contains(k)) {
            let command = COMMAND.find(part).map_or(part, |m| m.as_str());
            return Some(command.to_string());
        }

        let upper = part.to_uppercase();
        if upper.contains("VP") || upper.contains("PW") || part.contains('/') || matches!(part, "C" | "W" | "P") {
            continue;
        }
        if is_delta(part) {
            continue;
        }
        return Some(part.to_string());
    }
    None
}

fn is_delta(part: &str) -> bool {
    !part.is_empty() && part.chars().all(|c| c == '+' || c == '-' || c.is_ascii_digit())
}

/// The cult steps gained on this row: the absolute value of the signed delta
/// column just before the `f/w/e/a` cult column, or 0.
#[must_use]
pub fn cult_delta(parts: &[&str]) -> u8 {
    let Some(index) = parts.iter().position(|p| CULT_COLUMN.is_match(p.trim())) else {
        return 0;
    };
    index
        .checked_sub(1)
        .map(|prev| parts[prev].trim())
        .filter(|prev| SIGNED.is_match(prev))
        .and_then(|prev| prev.parse::<i32>().ok())
        .and_then(|delta| u8::try_from(delta.unsigned_abs()).ok())
        .unwrap_or(0)
}

/// The faction a `Leech N from X` / `Decline N from X` command names.
#[must_use]
pub fn leech_source(action: &str) -> Option<Faction> {
    LEECH_SOURCE
        .captures(action.trim())
        .and_then(|caps| Faction::from_name(&caps[1]))
}

/// Cuts a command down to its trailing leech clause, if it has one.
#[must_use]
pub fn trailing_leech(action: &str) -> String {
    let trimmed = action.trim();
    TRAILING_LEECH
        .captures(trimmed)
        .map_or_else(|| trimmed.to_string(), |caps| caps[1].trim().to_string())
}
