//! ui::output
//!
//! Output formatting and display.
//!
//! # Design
//!
//! Status messages respect the quiet flag. Command results are rendered in
//! one of three formats (`table`, `json`, `basic`) and always written, so
//! `--quiet` never hides the data a command was asked for.

use std::fmt::Display;
use std::io::{self, Write};
use std::str::FromStr;

use clap::ValueEnum;
use serde::Serialize;

/// Output verbosity level.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Verbosity {
    /// Quiet mode - minimal output
    Quiet,
    /// Normal mode - standard output
    #[default]
    Normal,
    /// Debug mode - verbose output
    Debug,
}

impl Verbosity {
    /// Create verbosity from flags.
    pub fn from_flags(quiet: bool, debug: bool) -> Self {
        if quiet {
            Verbosity::Quiet
        } else if debug {
            Verbosity::Debug
        } else {
            Verbosity::Normal
        }
    }
}

/// Format for command results.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, ValueEnum)]
pub enum OutputFormat {
    #[default]
    Table,
    Json,
    Basic,
}

impl FromStr for OutputFormat {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        <Self as ValueEnum>::from_str(s, true)
    }
}

/// Print an error message (always shown).
pub fn error(message: impl Display) {
    eprintln!("error: {}", message);
}

/// Print a warning message (respects quiet mode).
pub fn warn(message: impl Display, verbosity: Verbosity) {
    if verbosity != Verbosity::Quiet {
        eprintln!("warning: {}", message);
    }
}

/// Write a status line unless quiet.
pub fn status(out: &mut dyn Write, message: impl Display, verbosity: Verbosity) -> io::Result<()> {
    if verbosity != Verbosity::Quiet {
        writeln!(out, "{}", message)?;
    }
    Ok(())
}

/// Write a value as pretty JSON.
pub fn write_json<T: Serialize + ?Sized>(out: &mut dyn Write, value: &T) -> io::Result<()> {
    serde_json::to_writer_pretty(&mut *out, value)?;
    writeln!(out)
}

/// Plain-text table with left-aligned columns.
#[derive(Debug, Clone, Default)]
pub struct Table {
    headers: Vec<String>,
    rows: Vec<Vec<String>>,
}

impl Table {
    pub fn new<I, S>(headers: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            headers: headers.into_iter().map(Into::into).collect(),
            rows: Vec::new(),
        }
    }

    pub fn add_row<I, S>(&mut self, cells: I)
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.rows.push(cells.into_iter().map(Into::into).collect());
    }

    pub fn render(&self) -> String {
        let columns = self.headers.len();
        let mut widths: Vec<usize> = self.headers.iter().map(|h| h.chars().count()).collect();
        for row in &self.rows {
            for (i, cell) in row.iter().take(columns).enumerate() {
                widths[i] = widths[i].max(cell.chars().count());
            }
        }

        let mut rendered = String::new();
        for row in std::iter::once(&self.headers).chain(self.rows.iter()) {
            let mut line = String::new();
            for (i, width) in widths.iter().enumerate() {
                let cell = row.get(i).map(String::as_str).unwrap_or("");
                if i + 1 == columns {
                    line.push_str(cell);
                } else {
                    line.push_str(&format!("{:<width$}  ", cell, width = width));
                }
            }
            rendered.push_str(line.trim_end());
            rendered.push('\n');
        }
        rendered
    }
}

/// `Label: value` lines with the values aligned.
pub fn data_rows(rows: &[(&str, String)]) -> String {
    let width = rows
        .iter()
        .map(|(label, _)| label.chars().count() + 1)
        .max()
        .unwrap_or(0);
    rows.iter()
        .map(|(label, value)| format!("{:<width$} {}\n", format!("{}:", label), value, width = width))
        .collect()
}

/// Builds the non-interactive command line equivalent to an interactive
/// session.
///
/// Values are shell-quoted. Secret values are replaced by `***`.
#[derive(Debug, Clone)]
pub struct AutomationCommand {
    command: String,
    args: Vec<String>,
}

/// Placeholder for secret values.
pub const MASK: &str = "***";

impl AutomationCommand {
    /// `command` is the full command path, e.g. `octopus project variable create`.
    pub fn new(command: impl Into<String>) -> Self {
        Self {
            command: command.into(),
            args: Vec::new(),
        }
    }

    /// `--name value`, skipped when `value` is empty.
    pub fn flag(mut self, name: &str, value: &str) -> Self {
        if !value.is_empty() {
            self.args.push(format!("--{} {}", name, shell_words::quote(value)));
        }
        self
    }

    /// Like [`flag`](Self::flag), with the value masked.
    pub fn secret(mut self, name: &str, value: &str) -> Self {
        if !value.is_empty() {
            self.args.push(format!("--{} {}", name, shell_words::quote(MASK)));
        }
        self
    }

    /// One `--name value` per value.
    pub fn flags<S: AsRef<str>>(mut self, name: &str, values: &[S]) -> Self {
        for value in values {
            self = self.flag(name, value.as_ref());
        }
        self
    }

    /// `--name`, only when `on`.
    pub fn switch(mut self, name: &str, on: bool) -> Self {
        if on {
            self.args.push(format!("--{}", name));
        }
        self
    }

    pub fn render(&self) -> String {
        let mut rendered = format!("{} --no-prompt", self.command);
        for arg in &self.args {
            rendered.push(' ');
            rendered.push_str(arg);
        }
        rendered
    }
}

impl Display for AutomationCommand {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.render())
    }
}
