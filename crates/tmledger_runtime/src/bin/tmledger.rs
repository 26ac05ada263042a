//! tmledger CLI entry point.

use std::env;
use std::process::ExitCode;

use tmledger_foundation::Result;
use tmledger_runtime::cli::{self, Command};
use tmledger_runtime::{Repl, logging, parse_args};

fn main() -> ExitCode {
    match run(env::args().skip(1)) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("\x1b[31mError: {}\x1b[0m", cli::report(&e));
            ExitCode::FAILURE
        }
    }
}

fn run(args: impl Iterator<Item = String>) -> Result<()> {
    let cli = parse_args(args)?;
    logging::init(cli.verbose);

    match cli.command {
        Command::Help => print_help(),
        Command::Version => println!("tmledger {}", env!("CARGO_PKG_VERSION")),
        Command::Convert {
            format,
            annotate,
            no_reconstruct,
            out,
            file,
        } => {
            let text = cli::convert_file(&file, format, annotate, no_reconstruct)?;
            cli::write_output(out.as_deref(), &text)?;
        }
        Command::Check { file } => println!("{}", cli::check_file(&file)?),
        Command::Replay { no_retry, file } => println!("{}", cli::replay_file(&file, no_retry)?),
        Command::Repl { file } => {
            let session = cli::open_session(&file)?;
            Repl::new(session)?.run()?;
        }
    }
    Ok(())
}

fn print_help() {
    println!(
        "\x1b[1mtmledger\x1b[0m - Terra Mystica game logs to canonical notation

\x1b[1mUSAGE:\x1b[0m
    tmledger <COMMAND> [OPTIONS] FILE

\x1b[1mCOMMANDS:\x1b[0m
    convert    Print the canonical notation of a BGA or Snellman log
    check      Parse a canonical log strictly and report the first error
    replay     Replay a log and print each player's final resources
    repl       Step through a log interactively

\x1b[1mOPTIONS:\x1b[0m
    -h, --help             Print help information
    -V, --version          Print version information
    -v, --verbose          Log at debug level (TMLEDGER_LOG or RUST_LOG override)

\x1b[1mCONVERT OPTIONS:\x1b[0m
    -f, --format F         Input format: bga, bga-html, snellman, snellman-html, canonical
    --annotate-leeches     Write L-<Faction> and DL-<Faction> reaction cells
    --no-reconstruct       Keep ledger rows in their original order
    -o, --output OUT       Write to OUT instead of stdout

\x1b[1mREPLAY OPTIONS:\x1b[0m
    --no-retry             Fail on a shortage instead of running later conversions first

\x1b[1mEXAMPLES:\x1b[0m
    tmledger convert game.html                 Convert a saved Snellman ledger page
    tmledger convert -f bga -o out.txt log.txt Convert a BGA text log into a file
    tmledger check out.txt                     Validate canonical notation
    tmledger replay -v out.txt                 Replay with debug logging
    tmledger repl out.txt                      Step through a game

\x1b[1mREPL COMMANDS:\x1b[0m
    step [n], back [n], run, state, player <faction>, items, where, help, quit"
    );
}
