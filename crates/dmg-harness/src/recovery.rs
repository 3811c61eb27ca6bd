//! Operator recovery policies
//!
//! After the fault handler prints a diagnostic it asks a [`RecoveryPolicy`]
//! whether to keep going. The console prompt reproduces the classic
//! "Press q to exit" behaviour; the other policies make the same decision
//! without blocking, for headless runs and tests.

use std::fmt;
use std::io::{self, BufRead, Stdin, Stdout, Write};
use std::str::FromStr;

use tracing::warn;

use crate::emu_core::Resolution;
use crate::fault::FaultReport;

/// Prompt shown before waiting on the operator
pub const PROMPT: &str = "Press q to exit, or any other key to continue.";

/// Decides whether a reported fault ends the session
pub trait RecoveryPolicy {
    fn decide(&mut self, report: &FaultReport) -> Resolution;
}

impl<P: RecoveryPolicy + ?Sized> RecoveryPolicy for Box<P> {
    fn decide(&mut self, report: &FaultReport) -> Resolution {
        (**self).decide(report)
    }
}

/// Always resume
#[derive(Debug, Clone, Copy, Default)]
pub struct AutoContinue;

impl RecoveryPolicy for AutoContinue {
    fn decide(&mut self, _report: &FaultReport) -> Resolution {
        Resolution::Continue
    }
}

/// Always terminate
#[derive(Debug, Clone, Copy, Default)]
pub struct AutoTerminate;

impl RecoveryPolicy for AutoTerminate {
    fn decide(&mut self, _report: &FaultReport) -> Resolution {
        Resolution::Terminate
    }
}

/// Policy backed by a closure
pub struct FromFn<F>(F);

/// Build a policy from a closure
pub fn from_fn<F>(f: F) -> FromFn<F>
where
    F: FnMut(&FaultReport) -> Resolution,
{
    FromFn(f)
}

impl<F> RecoveryPolicy for FromFn<F>
where
    F: FnMut(&FaultReport) -> Resolution,
{
    fn decide(&mut self, report: &FaultReport) -> Resolution {
        (self.0)(report)
    }
}

/// Blocking console prompt
///
/// Reads one line; a leading `q` terminates, anything else (including end
/// of input) continues.
#[derive(Debug)]
pub struct ConsolePrompt<R, W> {
    input: R,
    output: W,
}

impl ConsolePrompt<io::StdinLock<'static>, Stdout> {
    /// Prompt on the process's stdin/stdout
    pub fn stdio() -> Self {
        let stdin: Stdin = io::stdin();
        Self::new(stdin.lock(), io::stdout())
    }
}

impl<R: BufRead, W: Write> ConsolePrompt<R, W> {
    pub fn new(input: R, output: W) -> Self {
        Self { input, output }
    }

    pub fn into_parts(self) -> (R, W) {
        (self.input, self.output)
    }
}

impl<R: BufRead, W: Write> RecoveryPolicy for ConsolePrompt<R, W> {
    fn decide(&mut self, _report: &FaultReport) -> Resolution {
        if let Err(err) = writeln!(self.output, "{PROMPT}").and_then(|_| self.output.flush()) {
            warn!("failed to write recovery prompt: {err}");
        }

        let mut line = String::new();
        match self.input.read_line(&mut line) {
            Ok(_) => resolve_token(&line),
            Err(err) => {
                warn!("failed to read operator response, continuing: {err}");
                Resolution::Continue
            }
        }
    }
}

fn resolve_token(line: &str) -> Resolution {
    match line.trim_start().chars().next() {
        Some('q') => Resolution::Terminate,
        _ => Resolution::Continue,
    }
}

/// Recovery policy selectable from the command line
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum RecoveryMode {
    /// Ask the operator on the console
    #[default]
    Prompt,
    /// Resume after every fault
    Continue,
    /// Stop at the first reported fault
    Terminate,
}

impl RecoveryMode {
    pub fn into_policy(self) -> Box<dyn RecoveryPolicy> {
        match self {
            RecoveryMode::Prompt => Box::new(ConsolePrompt::stdio()),
            RecoveryMode::Continue => Box::new(AutoContinue),
            RecoveryMode::Terminate => Box::new(AutoTerminate),
        }
    }
}

impl FromStr for RecoveryMode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "prompt" => Ok(RecoveryMode::Prompt),
            "continue" => Ok(RecoveryMode::Continue),
            "terminate" => Ok(RecoveryMode::Terminate),
            other => Err(format!(
                "unknown fault policy '{other}' (expected prompt, continue or terminate)"
            )),
        }
    }
}

impl fmt::Display for RecoveryMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            RecoveryMode::Prompt => "prompt",
            RecoveryMode::Continue => "continue",
            RecoveryMode::Terminate => "terminate",
        };
        f.write_str(name)
    }
}
