//! cli::commands::variable::create
//!
//! Add a variable to a project.

use std::io::Write;

use anyhow::{anyhow, Context as _, Result};
use tracing::debug;

use super::{
    load_variables, prompt_git_ref, prompt_value, scope_flags, select_index, select_project,
    COMMAND_PATH,
};
use crate::api::OctopusApi;
use crate::cli::args::CreateArgs;
use crate::cli::Context;
use crate::core::scope::{prompt_scopes, resolve_outbound, ScopeInput};
use crate::core::variables::{
    ControlType, SelectOption, Variable, VariableKind, VariablePrompt, VariableType,
};
use crate::ui::output::AutomationCommand;
use crate::ui::prompts::Prompter;

/// Create a variable.
///
/// Scope flags are resolved against the project's catalog. In interactive
/// mode an unscoped result leads to a prompt per scope category.
pub async fn create(
    ctx: &Context,
    api: &dyn OctopusApi,
    prompter: &dyn Prompter,
    mut args: CreateArgs,
    out: &mut dyn Write,
) -> Result<()> {
    let project = select_project(ctx, api, prompter, args.project.as_deref()).await?;
    args.project = Some(project.name.clone());

    if ctx.interactive {
        prompt_git_ref(prompter, &project, &mut args.git_ref)?;
        prompt_missing(api, prompter, &mut args).await?;
    }

    let name = args
        .name
        .as_deref()
        .map(str::trim)
        .filter(|n| !n.is_empty())
        .ok_or_else(|| anyhow!("variable name is required but was not provided"))?
        .to_string();

    let options = args
        .prompt_dropdown_option
        .iter()
        .map(|raw| SelectOption::parse(raw))
        .collect::<Result<Vec<_>, _>>()?;

    let mut set = load_variables(api, &project, args.git_ref.as_deref()).await?;

    let mut input = args.scopes.to_input();
    let mut scope = resolve_outbound(&input, &set.scope_values, &project.id)?;
    if ctx.interactive && scope.is_empty() {
        prompt_scopes(prompter, &set.scope_values, &mut input, args.prompted)?;
        scope = resolve_outbound(&input, &set.scope_values, &project.id)?;
    }

    let kind = args.kind.unwrap_or_default();
    let mut variable = Variable::new(name.clone());
    variable.set_type(kind.variable_type());
    variable.value = args.value.clone();
    variable.description = args.description.clone().filter(|d| !d.is_empty());
    variable.scope = scope;
    if args.prompted {
        variable.prompt = Some(VariablePrompt::new(
            args.prompt_label.clone().unwrap_or_default(),
            args.prompt_description.clone().unwrap_or_default(),
            args.prompt_required,
            args.prompt_type.unwrap_or_default(),
            &options,
        ));
    }

    debug!(name = %variable.name, kind = kind.name(), "creating variable");
    set.variables.push(variable);
    api.update_variables(&project, args.git_ref.as_deref(), &set)
        .await
        .context("Failed to create variable")?;

    writeln!(
        out,
        "Successfully created variable '{}' in project '{}'",
        name, project.name
    )?;

    if ctx.interactive {
        let command = automation_command(&args, kind, &input);
        writeln!(out, "\nAutomation Command: {}", command)?;
    }

    Ok(())
}

/// Ask for every value the flags left out, in the order the web portal
/// presents them.
async fn prompt_missing(
    api: &dyn OctopusApi,
    prompter: &dyn Prompter,
    args: &mut CreateArgs,
) -> Result<()> {
    if args.name.as_deref().map_or(true, |n| n.trim().is_empty()) {
        args.name = Some(prompter.input("Name", None)?);
    }

    if args.description.is_none() {
        args.description = Some(prompter.input("Description", None)?);
    }

    let kind = match args.kind {
        Some(kind) => kind,
        None => {
            let labels: Vec<String> = VariableKind::ALL.iter().map(|k| k.label().to_string()).collect();
            let index = select_index(prompter, "Select the type of the variable", &labels)?;
            VariableKind::ALL[index]
        }
    };
    args.kind = Some(kind);

    if !args.prompted {
        args.prompted = prompter.confirm("Is this a prompted variable?", false)?;
    }

    if args.prompted {
        prompt_prompt_settings(prompter, args)?;
    }

    if args.value.as_deref().map_or(true, str::is_empty) {
        let value = prompt_value(api, prompter, &kind.variable_type()).await?;
        args.value = Some(value);
    }

    Ok(())
}

fn prompt_prompt_settings(prompter: &dyn Prompter, args: &mut CreateArgs) -> Result<()> {
    if args.prompt_label.as_deref().map_or(true, str::is_empty) {
        args.prompt_label = Some(prompter.input("Prompt Label", None)?);
    }

    if args.prompt_description.is_none() {
        args.prompt_description = Some(prompter.input("Prompt Description", None)?);
    }

    let control = match args.prompt_type {
        Some(control) => control,
        None => {
            let labels: Vec<String> = ControlType::ALL.iter().map(|c| c.label().to_string()).collect();
            let index = select_index(
                prompter,
                "Select the control type of the prompted variable",
                &labels,
            )?;
            ControlType::ALL[index]
        }
    };
    args.prompt_type = Some(control);

    if control == ControlType::Select && args.prompt_dropdown_option.is_empty() {
        loop {
            let value = prompter.input("Enter a selection option value (enter blank to end)", None)?;
            if value.trim().is_empty() {
                break;
            }
            let description = prompter.input("Enter a selection option description", None)?;
            args.prompt_dropdown_option
                .push(format!("{}|{}", value, description));
        }
    }

    if !args.prompt_required {
        args.prompt_required = prompter.confirm(
            "Is the prompted variable required to have a value supplied?",
            false,
        )?;
    }

    Ok(())
}

fn automation_command(
    args: &CreateArgs,
    kind: VariableKind,
    input: &ScopeInput,
) -> AutomationCommand {
    let value = args.value.as_deref().unwrap_or_default();
    let mut command = AutomationCommand::new(format!("{} create", COMMAND_PATH))
        .flag("project", args.project.as_deref().unwrap_or_default())
        .flag("name", args.name.as_deref().unwrap_or_default());

    command = if kind.variable_type() == VariableType::Sensitive {
        command.secret("value", value)
    } else {
        command.flag("value", value)
    };

    command = command
        .flag("description", args.description.as_deref().unwrap_or_default())
        .flag("type", kind.name());
    command = scope_flags(command, input);

    if args.prompted {
        command = command
            .switch("prompted", true)
            .flag("prompt-label", args.prompt_label.as_deref().unwrap_or_default())
            .flag(
                "prompt-description",
                args.prompt_description.as_deref().unwrap_or_default(),
            )
            .flag("prompt-type", args.prompt_type.unwrap_or_default().name())
            .flags("prompt-dropdown-option", &args.prompt_dropdown_option)
            .switch("prompt-required", args.prompt_required);
    }

    command.flag("git-ref", args.git_ref.as_deref().unwrap_or_default())
}
