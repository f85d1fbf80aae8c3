//! Operator console
//!
//! Destructive operations ask the operator before changing anything. The
//! question goes through a [`ConfirmationSource`] so the same flow can run
//! against a terminal or against answers fixed up front.

use std::io::{self, BufRead, Write};

/// Which question is being asked
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum Prompt {
    /// Go ahead with the destructive change itself
    Proceed,
    /// Also remove rows in other tables that reference the target
    Cascade,
}

pub trait ConfirmationSource {
    /// Ask the operator and block until an answer is available
    fn confirm(&mut self, prompt: Prompt, message: &str) -> io::Result<bool>;
}

/// Only a literal `y` (any case, surrounding whitespace ignored) is affirmative.
pub fn is_affirmative(answer: &str) -> bool {
    answer.trim().eq_ignore_ascii_case("y")
}

/// Line-oriented prompt over a reader/writer pair, stdin/stdout in production
pub struct Interactive<R, W> {
    input: R,
    output: W,
}

impl Interactive<io::StdinLock<'static>, io::Stdout> {
    pub fn stdio() -> Self {
        Self::new(io::stdin().lock(), io::stdout())
    }
}

impl<R: BufRead, W: Write> Interactive<R, W> {
    pub fn new(input: R, output: W) -> Self {
        Self { input, output }
    }

    pub fn into_output(self) -> W {
        self.output
    }
}

impl<R: BufRead, W: Write> ConfirmationSource for Interactive<R, W> {
    fn confirm(&mut self, _prompt: Prompt, message: &str) -> io::Result<bool> {
        write!(self.output, "{message} (y/N): ")?;
        self.output.flush()?;

        let mut answer = String::new();
        // EOF reads zero bytes and leaves the answer empty, which is a "no"
        self.input.read_line(&mut answer)?;
        Ok(is_affirmative(&answer))
    }
}

/// Answers fixed in advance, per prompt kind
#[derive(Copy, Clone, Debug, Default)]
pub struct Preconfirmed {
    pub proceed: bool,
    pub cascade: bool,
}

impl Preconfirmed {
    pub fn proceed_only() -> Self {
        Self {
            proceed: true,
            cascade: false,
        }
    }

    pub fn with_cascade() -> Self {
        Self {
            proceed: true,
            cascade: true,
        }
    }

    pub fn declined() -> Self {
        Self::default()
    }
}

impl ConfirmationSource for Preconfirmed {
    fn confirm(&mut self, prompt: Prompt, _message: &str) -> io::Result<bool> {
        Ok(match prompt {
            Prompt::Proceed => self.proceed,
            Prompt::Cascade => self.cascade,
        })
    }
}
