//! cli::commands::variable::update
//!
//! Change the value or scope of one variable value.

use std::io::Write;

use anyhow::{bail, Context as _, Result};
use tracing::debug;

use super::{
    load_variables, prompt_git_ref, prompt_value, scope_flags, select_index, select_project,
    COMMAND_PATH,
};
use crate::api::OctopusApi;
use crate::cli::args::UpdateArgs;
use crate::cli::Context;
use crate::core::scope::{prompt_scopes, resolve_outbound, ResolvedScope, ScopeInput, ScopeUpdate};
use crate::core::variables::{Variable, VariableSet};
use crate::ui::output::{AutomationCommand, MASK};
use crate::ui::prompts::Prompter;

/// Update a variable.
///
/// A non-empty resolved scope replaces the stored scope and `--unscoped`
/// clears it. Without either the stored scope is kept.
pub async fn update(
    ctx: &Context,
    api: &dyn OctopusApi,
    prompter: &dyn Prompter,
    mut args: UpdateArgs,
    out: &mut dyn Write,
) -> Result<()> {
    if args.unscoped && !args.scopes.is_empty() {
        bail!("cannot provide 'unscoped' and scope flags together");
    }

    let project = select_project(ctx, api, prompter, args.project.as_deref()).await?;
    args.project = Some(project.name.clone());
    if ctx.interactive {
        prompt_git_ref(prompter, &project, &mut args.git_ref)?;
    }

    let mut set = load_variables(api, &project, args.git_ref.as_deref()).await?;
    let mut input = args.scopes.to_input();

    let index = if ctx.interactive {
        let index = match set.find_for_update(args.id.as_deref(), args.name.as_deref()) {
            Ok(index) => index,
            Err(e) => {
                debug!(error = %e, "variable not identified, asking");
                select_variable(prompter, &set)?
            }
        };
        prompt_changes(api, prompter, &set, index, &mut args, &mut input).await?;
        index
    } else {
        set.find_for_update(args.id.as_deref(), args.name.as_deref())?
    };

    let scope = resolve_outbound(&input, &set.scope_values, &project.id)?;

    let variable = &mut set.variables[index];
    if let Some(value) = args.value.as_deref().filter(|v| !v.is_empty()) {
        variable.value = Some(value.to_string());
    }
    if args.unscoped {
        variable.scope = ResolvedScope::default();
    } else if !scope.is_empty() {
        variable.scope = scope;
    }
    args.id = Some(variable.id.clone());
    args.name = Some(variable.name.clone());
    let is_sensitive = variable.is_sensitive;

    debug!(id = ?args.id, "updating variable");
    api.update_variables(&project, args.git_ref.as_deref(), &set)
        .await
        .context("Failed to update variable")?;

    writeln!(
        out,
        "Successfully updated variable '{}' in project '{}'",
        args.name.as_deref().unwrap_or_default(),
        project.name
    )?;

    if ctx.interactive {
        let command = automation_command(&args, is_sensitive, &input);
        writeln!(out, "\nAutomation Command: {}", command)?;
    }

    Ok(())
}

fn select_variable(prompter: &dyn Prompter, set: &VariableSet) -> Result<usize> {
    if set.variables.is_empty() {
        bail!("project has no variables");
    }
    let options: Vec<String> = set.variables.iter().map(selection_label).collect();
    select_index(prompter, "Select the variable you wish to update", &options)
}

/// `Name (Id) = value`, with sensitive values masked.
fn selection_label(variable: &Variable) -> String {
    let mut value = variable.display_value(MASK);
    if value.is_empty() {
        value = "(no value)".to_string();
    }
    format!("{} ({}) = {}", variable.name, variable.id, value)
}

async fn prompt_changes(
    api: &dyn OctopusApi,
    prompter: &dyn Prompter,
    set: &VariableSet,
    index: usize,
    args: &mut UpdateArgs,
    input: &mut ScopeInput,
) -> Result<()> {
    let variable = &set.variables[index];

    if args.value.as_deref().map_or(true, str::is_empty)
        && prompter.confirm("Do you want to update the variable value?", false)?
    {
        args.value = Some(prompt_value(api, prompter, &variable.variable_type).await?);
    }

    if input.is_empty() && !args.unscoped {
        let labels: Vec<String> = ScopeUpdate::ALL.iter().map(|u| u.label().to_string()).collect();
        let choice = select_index(prompter, "Do you want to change the variable scoping?", &labels)?;
        match ScopeUpdate::ALL[choice] {
            ScopeUpdate::Leave => {}
            ScopeUpdate::Unscope => args.unscoped = true,
            ScopeUpdate::Replace => {
                prompt_scopes(prompter, &set.scope_values, input, variable.is_prompted())?;
            }
        }
    }

    Ok(())
}

fn automation_command(args: &UpdateArgs, is_sensitive: bool, input: &ScopeInput) -> AutomationCommand {
    let value = args.value.as_deref().unwrap_or_default();
    let mut command = AutomationCommand::new(format!("{} update", COMMAND_PATH))
        .flag("project", args.project.as_deref().unwrap_or_default())
        .flag("id", args.id.as_deref().unwrap_or_default())
        .flag("name", args.name.as_deref().unwrap_or_default());

    command = if is_sensitive {
        command.secret("value", value)
    } else {
        command.flag("value", value)
    };

    scope_flags(command, input)
        .switch("unscoped", args.unscoped)
        .flag("git-ref", args.git_ref.as_deref().unwrap_or_default())
}
