//! config command - Get, set, or list configuration values

use crate::cli::Context;
use crate::ui::output;
use anyhow::{Context as _, Result};
use std::io::Write;

/// Get a configuration value.
///
/// Prints nothing when the key is unset.
pub fn get(ctx: &Context, key: &str, out: &mut dyn Write) -> Result<()> {
    if let Some(value) = ctx.config.file.get(key)? {
        writeln!(out, "{}", value)?;
    }
    Ok(())
}

/// Set a configuration value. An empty value clears the key.
pub fn set(ctx: &Context, key: &str, value: &str, out: &mut dyn Write) -> Result<()> {
    let mut config = ctx.config.clone();
    config.file.set(key, value)?;
    let path = config.save().context("Failed to write config")?;

    let message = match config.file.get(key)? {
        Some(stored) => format!("Set {} = {} in {}", key, stored, path.display()),
        None => format!("Cleared {} in {}", key, path.display()),
    };
    output::status(out, message, ctx.verbosity)?;
    Ok(())
}

/// List all configuration values.
pub fn list(ctx: &Context, out: &mut dyn Write) -> Result<()> {
    match ctx.output_format {
        output::OutputFormat::Json => output::write_json(out, &ctx.config.file)?,
        _ => {
            for (key, value) in ctx.config.file.entries() {
                writeln!(out, "{} = {}", key, value.unwrap_or_default())?;
            }
            if let Some(path) = ctx.config.loaded_from() {
                output::status(out, format!("\n# {}", path.display()), ctx.verbosity)?;
            }
        }
    }
    Ok(())
}
