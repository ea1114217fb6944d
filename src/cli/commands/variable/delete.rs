//! cli::commands::variable::delete
//!
//! Remove one variable value from a project.

use std::io::Write;

use anyhow::{anyhow, bail, Context as _, Result};
use tracing::debug;

use super::{load_variables, prompt_git_ref, select_project};
use crate::api::OctopusApi;
use crate::cli::args::DeleteArgs;
use crate::cli::Context;
use crate::ui::prompts::Prompter;

/// Delete a variable.
///
/// Without `--confirm` the user must type the variable name. Non-interactive
/// runs must pass `--confirm`.
pub async fn delete(
    ctx: &Context,
    api: &dyn OctopusApi,
    prompter: &dyn Prompter,
    mut args: DeleteArgs,
    out: &mut dyn Write,
) -> Result<()> {
    let name = args
        .name
        .as_deref()
        .map(str::trim)
        .filter(|n| !n.is_empty())
        .ok_or_else(|| anyhow!("variable name is required but was not provided"))?
        .to_string();

    let project = select_project(ctx, api, prompter, args.project.as_deref()).await?;
    if ctx.interactive {
        prompt_git_ref(prompter, &project, &mut args.git_ref)?;
    }

    let mut set = load_variables(api, &project, args.git_ref.as_deref()).await?;
    let index = set.find_for_delete(&name, args.id.as_deref())?;
    let target = set.variables[index].clone();

    if !args.confirm {
        if !ctx.interactive {
            bail!("cannot confirm deletion without prompting, supply the 'confirm' flag");
        }
        let message = format!(
            "You are about to delete the variable \"{}\" ({}). This action cannot be reversed. \
             To confirm, type the variable name:",
            target.name, target.id
        );
        let entered = prompter.input(&message, None)?;
        if entered != target.name {
            bail!(
                "input value {} does not match expected value {}",
                entered,
                target.name
            );
        }
    }

    debug!(id = %target.id, "deleting variable");
    set.variables.remove(index);
    api.update_variables(&project, args.git_ref.as_deref(), &set)
        .await
        .context("Failed to delete variable")?;

    writeln!(
        out,
        "The variable, \"{}\" ({}) was deleted successfully.",
        target.name, target.id
    )?;
    Ok(())
}
