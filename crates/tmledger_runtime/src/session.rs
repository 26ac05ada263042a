//! Step-through replay session state and commands.

use std::fmt::Write as _;

use tmledger_foundation::{Error, Faction, Result};
use tmledger_notation::LogItem;
use tmledger_replay::{ReplayConfig, Replayer};
use tmledger_state::{GameState, Player};

/// Every command name the session understands.
pub const COMMANDS: [&str; 9] = ["step", "back", "run", "state", "player", "items", "where", "help", "quit"];

/// How many items `items` shows on each side of the cursor.
const ITEMS_WINDOW: usize = 5;

/// A parsed session command.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Command {
    /// Execute the next `n` items.
    Step(usize),
    /// Undo the last `n` steps.
    Back(usize),
    /// Execute every remaining item.
    Run,
    /// Show the whole game state.
    State,
    /// Show one player.
    Player(Faction),
    /// List the items around the cursor.
    Items,
    /// Show the cursor position.
    Where,
    /// Show the command list.
    Help,
    /// Leave the session.
    Quit,
}

/// What executing a command produced.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Outcome {
    /// Text to print.
    Output(String),
    /// The session is over.
    Quit,
}

/// Parses one line of session input. Blank lines parse to `None`.
///
/// # Errors
///
/// Returns a `Config` error for an unknown command or a bad argument.
pub fn parse_command(line: &str) -> Result<Option<Command>> {
    let mut words = line.split_whitespace();
    let Some(name) = words.next() else {
        return Ok(None);
    };
    let arg = words.next();
    if let Some(extra) = words.next() {
        return Err(Error::config(format!("unexpected argument '{extra}'")));
    }
    let count = |arg: Option<&str>| -> Result<usize> {
        arg.map_or(Ok(1), |s| {
            s.parse().map_err(|_| Error::config(format!("expected a count, got '{s}'")))
        })
    };
    let command = match name.to_ascii_lowercase().as_str() {
        "step" | "s" => Command::Step(count(arg)?),
        "back" | "b" => Command::Back(count(arg)?),
        "player" | "p" => {
            let name = arg.ok_or_else(|| Error::config("player needs a faction"))?;
            Command::Player(Faction::from_name(name).ok_or_else(|| Error::unknown_faction(name))?)
        }
        other => {
            if let Some(arg) = arg {
                return Err(Error::config(format!("{other} takes no argument, got '{arg}'")));
            }
            match other {
                "run" | "r" => Command::Run,
                "state" => Command::State,
                "items" | "i" => Command::Items,
                "where" | "w" => Command::Where,
                "help" | "h" | "?" => Command::Help,
                "quit" | "q" | "exit" => Command::Quit,
                _ => return Err(Error::config(format!("unknown command '{other}'"))),
            }
        }
    };
    Ok(Some(command))
}

/// A replay that a person steps through.
#[derive(Clone, Debug)]
pub struct Session {
    replayer: Replayer,
}

impl Session {
    /// Creates a session over log items.
    #[must_use]
    pub fn new(items: Vec<LogItem>, config: ReplayConfig) -> Self {
        Self {
            replayer: Replayer::with_config(items, config),
        }
    }

    /// The underlying replayer.
    #[must_use]
    pub const fn replayer(&self) -> &Replayer {
        &self.replayer
    }

    /// A prompt naming the round and the next item.
    #[must_use]
    pub fn prompt(&self) -> String {
        format!("r{} #{}> ", self.replayer.round(), self.replayer.cursor())
    }

    /// Parses and executes a line. Blank lines produce empty output.
    ///
    /// # Errors
    ///
    /// Returns parse errors and replay errors.
    pub fn eval(&mut self, line: &str) -> Result<Outcome> {
        match parse_command(line)? {
            Some(command) => self.execute(&command),
            None => Ok(Outcome::Output(String::new())),
        }
    }

    /// Executes a command.
    ///
    /// # Errors
    ///
    /// Returns the error of the first item that fails to replay. Items
    /// executed before it stay executed.
    pub fn execute(&mut self, command: &Command) -> Result<Outcome> {
        let text = match command {
            Command::Step(n) => self.step(*n)?,
            Command::Back(n) => {
                let undone = self.replayer.back(*n);
                format!("undid {undone} step(s); {}", self.position())
            }
            Command::Run => {
                let report = self.replayer.run()?;
                let mut out = format!("executed {} item(s)", report.executed);
                for (index, err) in &report.errors {
                    let _ = write!(out, "\n  skipped #{index}: {err}");
                }
                out
            }
            Command::State => describe_state(self.replayer.state()),
            Command::Player(faction) => {
                let player = self.replayer.state().require(*faction)?;
                describe_player(player)
            }
            Command::Items => self.items(),
            Command::Where => self.position(),
            Command::Help => help_text().to_string(),
            Command::Quit => return Ok(Outcome::Quit),
        };
        Ok(Outcome::Output(text))
    }

    fn step(&mut self, n: usize) -> Result<String> {
        let mut out = String::new();
        for _ in 0..n {
            let index = self.replayer.cursor();
            match self.replayer.step()? {
                Some(item) => {
                    let _ = writeln!(out, "#{index} {item}");
                }
                None => {
                    out.push_str("end of log\n");
                    break;
                }
            }
        }
        Ok(out.trim_end().to_string())
    }

    fn position(&self) -> String {
        let next = self
            .replayer
            .peek()
            .map_or_else(|| "end of log".to_string(), |item| format!("next: {item}"));
        format!(
            "item {} of {}, round {}; {next}",
            self.replayer.cursor(),
            self.replayer.items().len(),
            self.replayer.round()
        )
    }

    fn items(&self) -> String {
        let cursor = self.replayer.cursor();
        let items = self.replayer.items();
        let start = cursor.saturating_sub(ITEMS_WINDOW);
        let end = (cursor + ITEMS_WINDOW + 1).min(items.len());
        let mut out = String::new();
        for (index, item) in items.iter().enumerate().take(end).skip(start) {
            let marker = if index == cursor { "=>" } else { "  " };
            let _ = writeln!(out, "{marker} #{index} {item}");
        }
        out.trim_end().to_string()
    }
}

/// One line per player plus round, turn and power action status.
#[must_use]
pub fn describe_state(state: &GameState) -> String {
    let mut out = format!("round {} ({:?})", state.round, state.phase);
    if let Some(current) = state.current_player() {
        let _ = write!(out, ", {current} to act");
    }
    let order: Vec<&str> = state.turn_order.iter().map(|f| f.title()).collect();
    let _ = write!(out, "\nturn order: {}", order.join(", "));
    if !state.pass_order.is_empty() {
        let passed: Vec<&str> = state.pass_order.iter().map(|f| f.title()).collect();
        let _ = write!(out, "\npassed: {}", passed.join(", "));
    }
    if !state.power_actions_used.is_empty() {
        let used: Vec<String> = state.power_actions_used.iter().map(ToString::to_string).collect();
        let _ = write!(out, "\npower actions taken: {}", used.join(" "));
    }
    for player in state.players() {
        let _ = write!(out, "\n{}", describe_player(player));
    }
    out
}

/// A one-line summary of a player's resources and tracks.
#[must_use]
pub fn describe_player(player: &Player) -> String {
    let [fire, water, earth, air] = player.cults;
    let mut out = format!(
        "{:<16} {:>3} VP  {:>2}C {:>2}W {:>2}P  power {}/{}/{}  cults {fire}/{water}/{earth}/{air}  ship {} dig {}",
        player.faction.title(),
        player.vp,
        player.coins,
        player.workers,
        player.priests,
        player.power.bowl1,
        player.power.bowl2,
        player.power.bowl3,
        player.shipping,
        player.digging,
    );
    if let Some(bonus) = player.bonus {
        let _ = write!(out, "  {bonus}");
    }
    for favor in &player.favors {
        let _ = write!(out, " {favor}");
    }
    for town in &player.towns {
        let _ = write!(out, " {town}");
    }
    if player.passed {
        out.push_str("  (passed)");
    }
    out
}

/// The command reference.
#[must_use]
pub const fn help_text() -> &'static str {
    "step [n]          execute the next n items (default 1)
back [n]          undo the last n steps (default 1)
run               execute every remaining item
state             show the game state
player <faction>  show one player
items             list the items around the cursor
where             show the cursor position
help              show this list
quit              leave the session"
}
