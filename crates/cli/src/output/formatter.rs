//! Status lines and JSON documents around a session
//!
//! The runner writes the session transcript itself. Everything else the
//! binary prints goes through [`Formatter`]: marked status lines on the
//! terminal, or JSON documents when `--json` is set.

use console::style;
use serde::Serialize;
use ssd_core::{Outcome, RunReport, Step};

use super::OutputConfig;

/// Kind of status line
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Mark {
    Success,
    Warning,
    Error,
}

impl Mark {
    fn symbol(self) -> &'static str {
        match self {
            Mark::Success => "✓",
            Mark::Warning => "⚠",
            Mark::Error => "✗",
        }
    }

    fn colored(self) -> String {
        let symbol = style(self.symbol());
        let styled = match self {
            Mark::Success => symbol.green(),
            Mark::Warning => symbol.yellow(),
            Mark::Error => symbol.red(),
        };
        styled.to_string()
    }
}

#[derive(Debug, Clone)]
pub struct Formatter {
    config: OutputConfig,
}

impl Formatter {
    pub fn new(config: OutputConfig) -> Self {
        Self { config }
    }

    pub fn is_json(&self) -> bool {
        self.config.json
    }

    pub fn is_quiet(&self) -> bool {
        self.config.quiet
    }

    fn colors_enabled(&self) -> bool {
        !self.config.no_color && !self.config.json
    }

    fn line(&self, mark: Mark, message: &str) -> String {
        let symbol = if self.colors_enabled() {
            mark.colored()
        } else {
            mark.symbol().to_string()
        };
        format!("{symbol} {message}")
    }

    /// Stdout; silent in quiet and JSON mode
    pub fn success(&self, message: &str) {
        if !self.config.quiet && !self.config.json {
            println!("{}", self.line(Mark::Success, message));
        }
    }

    /// Stderr; silent in quiet and JSON mode
    pub fn warning(&self, message: &str) {
        if !self.config.quiet && !self.config.json {
            eprintln!("{}", self.line(Mark::Warning, message));
        }
    }

    /// Stderr, always. A `{"error": ...}` object in JSON mode.
    pub fn error(&self, message: &str) {
        if self.config.json {
            eprintln!("{}", serde_json::json!({ "error": message }));
        } else {
            eprintln!("{}", self.line(Mark::Error, message));
        }
    }

    pub fn json<T: Serialize>(&self, value: &T) {
        match serde_json::to_string_pretty(value) {
            Ok(json) => println!("{json}"),
            Err(e) => eprintln!("Error serializing output: {e}"),
        }
    }

    pub fn println(&self, message: &str) {
        if !self.config.quiet {
            println!("{message}");
        }
    }

    /// Close a session: the report itself in JSON mode, a note on stderr
    /// when the run stopped early
    pub fn run_report(&self, report: &RunReport) {
        if self.config.json {
            self.json(report);
        } else if let Some(note) = stop_note(report) {
            self.warning(&note);
        }
    }
}

fn stop_note(report: &RunReport) -> Option<String> {
    match &report.outcome {
        Outcome::Completed => None,
        Outcome::Aborted { step, .. } => Some(format!(
            "Session stopped at {step} after {} of {} steps; bucket {} may still exist",
            report.completed.len(),
            Step::SEQUENCE.len(),
            report.bucket
        )),
    }
}
