//! The interactive step-through loop.

use tmledger_foundation::{Error, Result};

use crate::cli::report;
use crate::editor::{LineEditor, ReadResult, RustylineEditor, default_keywords};
use crate::session::{Outcome, Session};

/// The interactive REPL over a replay session.
pub struct Repl<E: LineEditor = RustylineEditor> {
    /// The line editor for input.
    editor: E,

    /// The replay being stepped through.
    session: Session,

    /// Whether to show the welcome banner.
    show_banner: bool,
}

impl Repl<RustylineEditor> {
    /// Creates a REPL with the default rustyline editor.
    ///
    /// # Errors
    ///
    /// Returns an error if the editor fails to initialize.
    pub fn new(session: Session) -> Result<Self> {
        Ok(Self::with_editor(RustylineEditor::new()?, session))
    }
}

impl<E: LineEditor> Repl<E> {
    /// Creates a REPL with the given editor.
    pub fn with_editor(mut editor: E, session: Session) -> Self {
        editor.set_keywords(default_keywords());
        Self {
            editor,
            session,
            show_banner: true,
        }
    }

    /// Disables the welcome banner.
    #[must_use]
    pub fn without_banner(mut self) -> Self {
        self.show_banner = false;
        self
    }

    /// Returns the session.
    #[must_use]
    pub const fn session(&self) -> &Session {
        &self.session
    }

    /// Runs until `quit` or end of input.
    ///
    /// # Errors
    ///
    /// Returns an error if reading input fails. Command errors are printed
    /// and the loop continues.
    pub fn run(&mut self) -> Result<()> {
        if self.show_banner {
            println!(
                "tmledger {}: {} item(s) loaded. Type help for commands.",
                env!("CARGO_PKG_VERSION"),
                self.session.replayer().items().len()
            );
        }
        while self.read_eval_print()? {}
        Ok(())
    }

    /// Executes one read-eval-print iteration.
    ///
    /// Returns `Ok(true)` to continue, `Ok(false)` to exit.
    fn read_eval_print(&mut self) -> Result<bool> {
        let prompt = self.session.prompt();
        let line = match self.editor.read_line(&prompt)? {
            ReadResult::Line(line) => line,
            ReadResult::Interrupted => return Ok(true),
            ReadResult::Eof => return Ok(false),
        };
        if line.trim().is_empty() {
            return Ok(true);
        }
        self.editor.add_history(&line);
        match self.session.eval(&line) {
            Ok(Outcome::Output(text)) => {
                if !text.is_empty() {
                    println!("{text}");
                }
                Ok(true)
            }
            Ok(Outcome::Quit) => Ok(false),
            Err(e) => {
                print_error(&e);
                Ok(true)
            }
        }
    }
}

fn print_error(e: &Error) {
    eprintln!("\x1b[31mError: {}\x1b[0m", report(e));
}
