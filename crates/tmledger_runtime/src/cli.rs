//! Command-line parsing and the non-interactive commands.

use std::fs;
use std::path::{Path, PathBuf};

use tmledger_foundation::{Error, Result};
use tmledger_ingest::{ConvertConfig, SourceFormat, convert_to_string, load_items};
use tmledger_notation::parse_canonical_log;
use tmledger_replay::{ReplayConfig, Replayer};
use tracing::info;

use crate::session::{Session, describe_player};

/// A parsed command line.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Cli {
    /// What to do.
    pub command: Command,
    /// Log at debug level.
    pub verbose: bool,
}

/// A top-level command.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Command {
    /// Print the canonical notation of a log.
    Convert {
        /// Forced input format.
        format: Option<SourceFormat>,
        /// Name leech sources in reaction cells.
        annotate: bool,
        /// Skip ledger reconstruction.
        no_reconstruct: bool,
        /// Write here instead of stdout.
        out: Option<PathBuf>,
        /// The input log.
        file: PathBuf,
    },
    /// Strictly parse a canonical log.
    Check {
        /// The canonical log.
        file: PathBuf,
    },
    /// Replay a log and print a summary.
    Replay {
        /// Fail on the first shortage instead of running later conversions.
        no_retry: bool,
        /// The input log.
        file: PathBuf,
    },
    /// Step through a log interactively.
    Repl {
        /// The input log.
        file: PathBuf,
    },
    /// Print usage.
    Help,
    /// Print the version.
    Version,
}

/// Parses arguments, program name excluded.
///
/// # Errors
///
/// Returns a `Config` error for unknown commands or options, missing
/// values, and a missing or repeated file argument.
pub fn parse_args<I, S>(args: I) -> Result<Cli>
where
    I: IntoIterator<Item = S>,
    S: Into<String>,
{
    let args: Vec<String> = args.into_iter().map(Into::into).collect();
    let mut verbose = false;
    let mut help = false;
    let mut version = false;
    let mut name = None;
    let mut format = None;
    let mut annotate = false;
    let mut no_reconstruct = false;
    let mut no_retry = false;
    let mut out = None;
    let mut file: Option<PathBuf> = None;

    let mut i = 0;
    while i < args.len() {
        match args[i].as_str() {
            "-h" | "--help" => help = true,
            "-V" | "--version" => version = true,
            "-v" | "--verbose" => verbose = true,
            "--annotate-leeches" => annotate = true,
            "--no-reconstruct" => no_reconstruct = true,
            "--no-retry" => no_retry = true,
            "--format" | "-f" => {
                i += 1;
                let value = args.get(i).ok_or_else(|| Error::config("--format requires a value"))?;
                format = Some(value.parse::<SourceFormat>()?);
            }
            "-o" | "--output" => {
                i += 1;
                let value = args.get(i).ok_or_else(|| Error::config("-o requires a path"))?;
                out = Some(PathBuf::from(value));
            }
            arg if arg.starts_with('-') && arg.len() > 1 => {
                return Err(Error::config(format!("unknown option: {arg}")));
            }
            arg if name.is_none() => name = Some(arg.to_string()),
            arg => {
                if file.is_some() {
                    return Err(Error::config(format!("unexpected argument: {arg}")));
                }
                file = Some(PathBuf::from(arg));
            }
        }
        i += 1;
    }

    if help {
        return Ok(Cli {
            command: Command::Help,
            verbose,
        });
    }
    if version {
        return Ok(Cli {
            command: Command::Version,
            verbose,
        });
    }
    let Some(name) = name else {
        return Ok(Cli {
            command: Command::Help,
            verbose,
        });
    };
    let require_file = || file.clone().ok_or_else(|| Error::config(format!("{name} requires a FILE")));
    let command = match name.as_str() {
        "convert" => Command::Convert {
            format,
            annotate,
            no_reconstruct,
            out,
            file: require_file()?,
        },
        "check" => Command::Check { file: require_file()? },
        "replay" => Command::Replay {
            no_retry,
            file: require_file()?,
        },
        "repl" => Command::Repl { file: require_file()? },
        "help" => Command::Help,
        other => return Err(Error::config(format!("unknown command: {other}"))),
    };
    Ok(Cli { command, verbose })
}

/// Renders an error with its context: the token, line and column, player,
/// and the frames it passed through.
#[must_use]
pub fn report(err: &Error) -> String {
    match &err.context {
        Some(context) => format!("{err} {context}").trim_end().to_string(),
        None => err.to_string(),
    }
}

/// Reads a whole file.
///
/// # Errors
///
/// Returns an `Io` error naming the path.
pub fn read_file(path: &Path) -> Result<String> {
    fs::read_to_string(path).map_err(|e| Error::io(format!("{}: {e}", path.display())))
}

/// Converts a file and returns the canonical text.
///
/// # Errors
///
/// Returns read and conversion errors.
pub fn convert_file(
    path: &Path,
    format: Option<SourceFormat>,
    annotate: bool,
    no_reconstruct: bool,
) -> Result<String> {
    let text = read_file(path)?;
    let mut config = ConvertConfig::default()
        .with_annotations(annotate)
        .with_reconstruct(!no_reconstruct);
    if let Some(format) = format {
        config = config.with_format(format);
    }
    convert_to_string(&text, &config)
}

/// Strictly parses a canonical file and returns a one-line report.
///
/// # Errors
///
/// Returns the first parse error, which carries its line and column.
pub fn check_file(path: &Path) -> Result<String> {
    let text = read_file(path)?;
    let items = parse_canonical_log(&text)?;
    Ok(format!("{}: ok, {} item(s)", path.display(), items.len()))
}

/// Loads a file in any format as replayable items.
///
/// # Errors
///
/// Returns read and conversion errors.
pub fn load_file(path: &Path) -> Result<Vec<tmledger_notation::LogItem>> {
    let text = read_file(path)?;
    load_items(&text, &ConvertConfig::default())
}

/// Replays a file and returns the final per-player summary.
///
/// # Errors
///
/// Returns the first item that fails to replay.
pub fn replay_file(path: &Path, no_retry: bool) -> Result<String> {
    let items = load_file(path)?;
    let config = if no_retry {
        ReplayConfig::strict()
    } else {
        ReplayConfig::default()
    };
    let mut replayer = Replayer::with_config(items, config);
    let report = replayer.run()?;
    info!(executed = report.executed, "replayed {}", path.display());
    let mut lines = vec![format!(
        "{} item(s) replayed through round {}",
        report.executed,
        replayer.round()
    )];
    lines.extend(replayer.state().players().map(describe_player));
    Ok(lines.join("\n"))
}

/// Loads a file into a step-through session.
///
/// # Errors
///
/// Returns read and conversion errors.
pub fn open_session(path: &Path) -> Result<Session> {
    Ok(Session::new(load_file(path)?, ReplayConfig::default()))
}

/// Writes output to a file or stdout.
///
/// # Errors
///
/// Returns an `Io` error naming the path.
pub fn write_output(out: Option<&Path>, text: &str) -> Result<()> {
    match out {
        Some(path) => fs::write(path, text).map_err(|e| Error::io(format!("{}: {e}", path.display()))),
        None => {
            print!("{text}");
            if !text.ends_with('\n') {
                println!();
            }
            Ok(())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tmledger_foundation::ErrorKind;

    #[test]
    fn convert_with_options() {
        let cli = parse_args(["convert", "--format", "bga", "--annotate-leeches", "-o", "out.txt", "game.txt"]).unwrap();
        assert_eq!(
            cli.command,
            Command::Convert {
                format: Some(SourceFormat::BgaText),
                annotate: true,
                no_reconstruct: false,
                out: Some(PathBuf::from("out.txt")),
                file: PathBuf::from("game.txt"),
            }
        );
        assert!(!cli.verbose);
    }

    #[test]
    fn flags_work_anywhere() {
        let cli = parse_args(["-v", "replay", "game.txt", "--no-retry"]).unwrap();
        assert!(cli.verbose);
        assert_eq!(
            cli.command,
            Command::Replay {
                no_retry: true,
                file: PathBuf::from("game.txt"),
            }
        );
        assert_eq!(parse_args(["check", "x", "--help"]).unwrap().command, Command::Help);
        assert_eq!(parse_args(["-V"]).unwrap().command, Command::Version);
        assert_eq!(parse_args(Vec::<String>::new()).unwrap().command, Command::Help);
    }

    #[test]
    fn bad_command_lines() {
        for args in [
            vec!["replay"],
            vec!["frobnicate", "x"],
            vec!["convert", "--format"],
            vec!["convert", "--format", "pdf", "x"],
            vec!["check", "a", "b"],
            vec!["check", "--fast", "a"],
        ] {
            let err = parse_args(args.clone()).unwrap_err();
            assert!(matches!(err.kind, ErrorKind::Config(_)), "{args:?}: {err}");
        }
    }

    #[test]
    fn report_includes_position() {
        let err = parse_canonical_log("Round 1\nTurnOrder: Witches\nNOPE").unwrap_err();
        let text = report(&err);
        assert!(text.contains("line 3"), "{text}");
        assert!(text.contains("NOPE"), "{text}");
    }

    #[test]
    fn missing_file_is_io() {
        let err = check_file(Path::new("/nonexistent/tmledger.txt")).unwrap_err();
        assert!(matches!(err.kind, ErrorKind::Io(_)));
    }
}
