//! Integration tests for Error types
//!
//! Tests error construction, display, context, and error kinds.

use tmledger_foundation::{Error, ErrorContext, ErrorKind, Resource};

// =============================================================================
// Error Construction
// =============================================================================

#[test]
fn insufficient_resources_reports_the_shortfall() {
    let err = Error::insufficient(Resource::Coins, 6, 4);
    assert!(err.is_affordability());
    assert_eq!(err.shortfall(), Some((Resource::Coins, 2)));
    let msg = err.to_string();
    assert!(msg.contains("need 6"));
    assert!(msg.contains("have 4"));
}

#[test]
fn other_errors_have_no_shortfall() {
    for err in [
        Error::illegal("no"),
        Error::no_pending("Witches", "no leech offer"),
        Error::unknown_player("Orcs"),
        Error::malformed_coordinate("Z9"),
    ] {
        assert!(!err.is_affordability());
        assert_eq!(err.shortfall(), None);
    }
}

#[test]
fn error_kinds_match() {
    assert!(matches!(Error::unknown_token("XYZ", "bad").kind, ErrorKind::UnknownToken { .. }));
    assert!(matches!(Error::config("bad flag").kind, ErrorKind::Config(_)));
    assert!(matches!(Error::io("gone").kind, ErrorKind::Io(_)));
    assert!(matches!(Error::invalid_format("shape").kind, ErrorKind::InvalidFormat(_)));
}

// =============================================================================
// Error Context
// =============================================================================

#[test]
fn frames_accumulate_innermost_first() {
    let err = Error::illegal("occupied").in_frame("S-E6").in_frame("item 4, round 0");
    let context = err.context.unwrap();
    assert_eq!(context.stack, vec!["S-E6".to_string(), "item 4, round 0".to_string()]);
}

#[test]
fn context_display() {
    let context = ErrorContext::new()
        .with_source("BADTOKEN")
        .with_player("Cultists")
        .with_position(11, 1);
    let text = context.to_string();
    assert!(text.contains("BADTOKEN"));
    assert!(text.contains("line 11, column 1"));
    assert!(text.contains("Cultists"));
}
