//! cli::commands::login
//!
//! Store the server URL and API key.
//!
//! # Design
//!
//! The login command:
//! - Writes the host to the config file and the API key to a SecretStore
//! - NEVER prints API keys to stdout/stderr
//! - Supports both interactive and non-interactive modes
//!
//! # Example
//!
//! ```bash
//! # Interactive (prompts for host and key)
//! octopus login
//!
//! # Non-interactive
//! octopus login --host https://octopus.example.com --api-key API-XXXX
//!
//! # Check status
//! octopus login --status
//!
//! # Remove stored key
//! octopus logout
//! ```

use crate::cli::Context;
use crate::core::config::validate_host;
use crate::secrets::{api_key_name, SecretStore};
use crate::ui::output::{self, Verbosity};
use crate::ui::prompts::Prompter;
use anyhow::{bail, Context as _, Result};
use std::io::Write;
use tracing::debug;

/// Options of the login command.
#[derive(Debug, Clone, Default)]
pub struct LoginArgs {
    pub host: Option<String>,
    pub api_key: Option<String>,
    pub status: bool,
}

/// Run the login command.
///
/// # Security
///
/// This function NEVER prints the API key. It only confirms success/failure.
pub fn login(
    ctx: &Context,
    store: &dyn SecretStore,
    prompter: &dyn Prompter,
    args: LoginArgs,
    out: &mut dyn Write,
) -> Result<()> {
    if args.status {
        return show_status(ctx, store, args.host.as_deref(), out);
    }

    let host = match args.host.or_else(|| ctx.config.file.host.clone()) {
        Some(host) => host,
        None if ctx.interactive => prompter.input("Octopus Server URL", None)?,
        None => bail!("Host required. Use --host <URL> or run interactively."),
    };
    let host = host.trim().trim_end_matches('/').to_string();
    validate_host(&host)?;

    let api_key = match args.api_key {
        Some(key) => key,
        None if ctx.interactive => read_api_key()?,
        None => bail!("API key required. Use --api-key <KEY> or run interactively."),
    };
    validate_api_key(&api_key)?;

    let mut config = ctx.config.clone();
    config.file.set("host", &host)?;
    let path = config.save().context("Failed to write config")?;
    debug!(path = %path.display(), "stored host");

    store
        .set(&api_key_name(&host), &api_key)
        .context("Failed to store API key")?;

    output::status(out, format!("Logged in to {}.", host), ctx.verbosity)?;
    Ok(())
}

/// Remove the stored API key.
pub fn logout(
    ctx: &Context,
    store: &dyn SecretStore,
    host: Option<&str>,
    out: &mut dyn Write,
) -> Result<()> {
    let host = host
        .or_else(|| ctx.config.host())
        .map(|h| h.trim_end_matches('/').to_string())
        .ok_or_else(|| anyhow::anyhow!("Not logged in."))?;

    store
        .delete(&api_key_name(&host))
        .context("Failed to remove stored API key")?;

    output::status(out, format!("Logged out from {}.", host), ctx.verbosity)?;
    Ok(())
}

/// Show login status.
fn show_status(
    ctx: &Context,
    store: &dyn SecretStore,
    host: Option<&str>,
    out: &mut dyn Write,
) -> Result<()> {
    let host = host.or_else(|| ctx.config.host());
    let from_env = ctx.config.env_api_key().is_some();
    let authenticated = match host {
        Some(host) => from_env || store.exists(&api_key_name(host))?,
        None => false,
    };

    if ctx.verbosity == Verbosity::Quiet {
        // Machine-readable output
        let state = if authenticated {
            "authenticated"
        } else {
            "not_authenticated"
        };
        writeln!(out, "{}", state)?;
        return Ok(());
    }

    match host {
        Some(host) if authenticated => {
            let source = if from_env {
                "OCTOPUS_API_KEY"
            } else {
                "secret store"
            };
            writeln!(out, "Logged in to {} (API key from {}).", host, source)?;
        }
        Some(host) => {
            writeln!(out, "Not logged in to {}.", host)?;
            writeln!(out, "Run 'octopus login' to log in.")?;
        }
        None => {
            writeln!(out, "No Octopus server configured.")?;
            writeln!(out, "Run 'octopus login' to log in.")?;
        }
    }

    Ok(())
}

/// Read the API key without echo.
fn read_api_key() -> Result<String> {
    let key = rpassword::prompt_password("API Key: ").context("Failed to read API key")?;
    Ok(key.trim().to_string())
}

/// Basic format checks. The key is not verified against the server here.
fn validate_api_key(key: &str) -> Result<()> {
    if key.is_empty() {
        bail!("API key cannot be empty.");
    }

    if key.chars().any(char::is_whitespace) {
        bail!("API key should not contain whitespace.");
    }

    Ok(())
}
