//! Tests for the command-line layer over real files

use std::fs;
use std::path::PathBuf;

use tmledger_foundation::ErrorKind;
use tmledger_runtime::cli::{self, Command, check_file, convert_file, parse_args, replay_file};
use tmledger_runtime::Outcome;

const BGA: &str = "Game board: Base Game
Alice is playing the Dwarves Faction
Bob is playing the Nomads Faction
Every player has chosen a Faction
Alice places a Dwelling [E7]
Bob places a Dwelling [E8]
~ Action phase ~
Alice upgrades a Dwelling to a Trading house for 2 workers 3 coins [E7]
Bob gets 1 power via Structures [E7]
Alice passes
Bob passes
";

fn scratch(name: &str, text: &str) -> PathBuf {
    let dir = std::env::temp_dir().join(format!("tmledger-cli-{}", std::process::id()));
    fs::create_dir_all(&dir).unwrap();
    let path = dir.join(name);
    fs::write(&path, text).unwrap();
    path
}

#[test]
fn convert_then_check() {
    let input = scratch("convert.txt", BGA);
    let canonical = convert_file(&input, None, true, false).unwrap();
    assert!(canonical.contains("L-Dwarves") || canonical.contains("L1-Dwarves"));
    let output = scratch("converted.txt", &canonical);
    let report = check_file(&output).unwrap();
    assert!(report.contains(": ok, "), "{report}");
}

#[test]
fn check_reports_position() {
    let bad = scratch("bad.txt", "Round 1\nTurnOrder: Dwarves, Nomads\nPASS         | WHAT\n");
    let err = check_file(&bad).unwrap_err();
    assert!(matches!(err.kind, ErrorKind::UnknownToken { .. }));
    let text = cli::report(&err);
    assert!(text.contains("line 3"), "{text}");
}

#[test]
fn replay_prints_each_player() {
    let input = scratch("replay.txt", BGA);
    let summary = replay_file(&input, false).unwrap();
    let lines: Vec<&str> = summary.lines().collect();
    assert_eq!(lines.len(), 3);
    assert!(lines[0].ends_with("through round 1"));
    assert!(lines.iter().any(|l| l.starts_with("Dwarves")));
    assert!(lines.iter().any(|l| l.starts_with("Nomads") && l.contains("(passed)")));
}

#[test]
fn session_from_file() {
    let input = scratch("session.txt", BGA);
    let Command::Repl { file } = parse_args(["repl", input.to_str().unwrap()]).unwrap().command else {
        panic!("expected repl");
    };
    let mut session = cli::open_session(&file).unwrap();
    assert!(matches!(session.eval("run").unwrap(), Outcome::Output(_)));
    assert!(session.replayer().is_finished());
    session.eval("back 3").unwrap();
    assert!(!session.replayer().is_finished());
    assert_eq!(session.eval("quit").unwrap(), Outcome::Quit);
}
