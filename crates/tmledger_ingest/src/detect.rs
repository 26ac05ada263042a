//! Input format sniffing.

use tmledger_foundation::Faction;
use tmledger_notation::looks_canonical;

use crate::config::SourceFormat;

/// Guesses the format of an input document.
///
/// HTML markers win over text heuristics; anything unrecognized is treated
/// as BGA narrative text, whose lexer skips lines it does not understand.
#[must_use]
pub fn detect_format(text: &str) -> SourceFormat {
    if text.contains("id=\"ledger\"") || text.contains("terra.snellman.net") {
        return SourceFormat::LedgerHtml;
    }
    if text.contains("gamelogreview") {
        return SourceFormat::BgaHtml;
    }
    if looks_canonical(text) {
        return SourceFormat::Canonical;
    }
    if is_ledger_text(text) {
        return SourceFormat::LedgerText;
    }
    SourceFormat::BgaText
}

/// Returns true for the tab-delimited ledger.
///
/// The document needs at least five lines, and within the first twenty either
/// a ledger header (`option strict-leech`, `Default game options`,
/// `Randomize setup`) or a faction row carrying a VP column.
#[must_use]
pub fn is_ledger_text(text: &str) -> bool {
    let lines: Vec<&str> = text.split('\n').collect();
    if lines.len() < 5 {
        return false;
    }
    lines.iter().take(20).any(|line| {
        let lower = line.to_lowercase();
        let header = ["option strict-leech", "default game options", "randomize setup"]
            .iter()
            .any(|marker| lower.contains(marker));
        header || (line.contains("VP") && faction_row(&lower))
    })
}

fn faction_row(lower: &str) -> bool {
    lower
        .split_once('\t')
        .is_some_and(|(first, _)| Faction::ALL.iter().any(|f| f.title().to_lowercase() == first.trim()))
}
