//! cli::commands
//!
//! Command dispatch and handlers.
//!
//! # Architecture
//!
//! Each command handler:
//! 1. Validates command-specific arguments
//! 2. Prompts for what is missing, when interactive
//! 3. Calls the API and formats the result
//!
//! Handlers write results to the `&mut dyn Write` they are given and take
//! the API and prompter as trait objects.
//!
//! # Async Commands
//!
//! Project commands talk to the server, so their handlers are async. The
//! synchronous entry point builds a Tokio runtime and blocks on the whole
//! command, so one HTTP client serves every request of the invocation.

mod completion;
mod config_cmd;
mod login;
pub mod variable;

pub use completion::completion;
pub use config_cmd::{get as config_get, list as config_list, set as config_set};
pub use login::{login, logout, LoginArgs};

use std::io::Write;

use anyhow::{anyhow, Context as _, Result};
use tracing::debug;

use super::args::{Command, ConfigAction, ProjectCommand};
use super::Context;
use crate::api::OctopusClient;
use crate::secrets::{api_key_name, FileSecretStore, SecretStore};
use crate::ui::prompts::TerminalPrompter;

/// Dispatch a parsed command to its handler.
pub fn dispatch(command: Command, ctx: &Context) -> Result<()> {
    let stdout = std::io::stdout();
    let mut out = stdout.lock();

    match command {
        Command::Login {
            host,
            api_key,
            status,
        } => {
            let store = FileSecretStore::new().context("Failed to open secret store")?;
            let args = LoginArgs {
                host,
                api_key,
                status,
            };
            login(ctx, &store, &TerminalPrompter, args, &mut out)
        }
        Command::Logout { host } => {
            let store = FileSecretStore::new().context("Failed to open secret store")?;
            logout(ctx, &store, host.as_deref(), &mut out)
        }
        Command::Config { action } => match action {
            ConfigAction::Get { key } => config_get(ctx, &key, &mut out),
            ConfigAction::Set { key, value } => config_set(ctx, &key, &value, &mut out),
            ConfigAction::List => config_list(ctx, &mut out),
        },
        Command::Completion { shell } => completion(shell, &mut out),
        Command::Project { command } => match command {
            ProjectCommand::Variable { command } => {
                let rt = tokio::runtime::Runtime::new()?;
                rt.block_on(async {
                    let store = FileSecretStore::new().context("Failed to open secret store")?;
                    let api = connect(ctx, &store).await?;
                    variable::execute(command, ctx, &api, &TerminalPrompter, &mut out).await
                })
            }
        },
    }?;

    out.flush()?;
    Ok(())
}

/// Connect to the configured server.
///
/// The API key comes from `OCTOPUS_API_KEY`, else from `store`.
pub async fn connect(ctx: &Context, store: &dyn SecretStore) -> Result<OctopusClient> {
    let host = ctx.config.host().ok_or_else(|| {
        anyhow!("no Octopus server configured, run 'octopus login' or set OCTOPUS_URL")
    })?;

    let api_key = match ctx.config.env_api_key() {
        Some(key) => key.to_string(),
        None => store
            .get(&api_key_name(host))
            .context("Failed to read API key")?
            .ok_or_else(|| {
                anyhow!(
                    "no API key stored for {}, run 'octopus login' or set OCTOPUS_API_KEY",
                    host
                )
            })?,
    };

    debug!(host, space = ?ctx.space, "connecting");
    OctopusClient::connect(host, &api_key, ctx.space.as_deref())
        .await
        .with_context(|| format!("Failed to connect to {}", host))
}
