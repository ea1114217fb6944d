//! cli
//!
//! Command-line interface layer for the Octopus CLI.
//!
//! # Responsibilities
//!
//! - Parse command-line arguments and global flags
//! - Merge flags with configuration into a [`Context`]
//! - Delegate to command handlers
//!
//! # Architecture
//!
//! The CLI layer is thin. It parses arguments via clap and dispatches to
//! [`commands`]. Handlers take their collaborators (`&dyn OctopusApi`,
//! `&dyn Prompter`, an output writer) as parameters, so they run the same
//! way against the live server and in tests.

pub mod args;
pub mod commands;

pub use args::{Cli, Shell};

use std::io::IsTerminal;

use anyhow::{Context as _, Result};

use crate::core::config::Config;
use crate::ui::output::{OutputFormat, Verbosity};

/// Settings shared by every command.
#[derive(Debug, Clone, Default)]
pub struct Context {
    /// Merged configuration file and environment
    pub config: Config,
    /// Whether prompts may be shown
    pub interactive: bool,
    pub verbosity: Verbosity,
    pub output_format: OutputFormat,
    /// Space name or ID; `None` selects the server's default space
    pub space: Option<String>,
}

impl Context {
    /// Merge global flags with configuration.
    ///
    /// Prompts are enabled unless `--no-prompt` was given, the config or
    /// `CI` disables them, or stdin is not a terminal.
    pub fn new(cli: &Cli, config: Config) -> Self {
        let interactive = !cli.no_prompt && !config.no_prompt() && std::io::stdin().is_terminal();
        let output_format = cli
            .output_format
            .or_else(|| config.output_format().parse().ok())
            .unwrap_or_default();
        let space = cli
            .space
            .clone()
            .or_else(|| config.space().map(str::to_string));

        Self {
            interactive,
            verbosity: Verbosity::from_flags(cli.quiet, cli.debug),
            output_format,
            space,
            config,
        }
    }
}

/// Run the CLI application.
///
/// This is the main entry point called from `main.rs`.
pub fn run(cli: Cli) -> Result<()> {
    let config = Config::load().context("Failed to load configuration")?;
    let ctx = Context::new(&cli, config);

    commands::dispatch(cli.command, &ctx)
}
