//! cli::commands::variable
//!
//! `project variable` subcommands.
//!
//! # Design
//!
//! Every subcommand works on the project's whole variable set: it is fetched
//! once, changed in memory and written back with a single
//! [`OctopusApi::update_variables`] call. The set's `ScopeValues` is the
//! catalog that scope flags and scope prompts resolve against.
//!
//! `include` and `exclude` edit the project document instead, adding or
//! removing library variable sets.
//!
//! Prompts are only shown when [`Context::interactive`] is set. After an
//! interactive create or update, the equivalent `--no-prompt` command line
//! is printed so the session can be scripted.

mod create;
mod delete;
mod library;
mod list;
mod update;
mod view;

pub use create::create;
pub use delete::delete;
pub use library::{exclude, include};
pub use list::list;
pub use update::update;
pub use view::view;

use std::io::Write;

use anyhow::{anyhow, bail, Context as _, Result};

use crate::api::OctopusApi;
use crate::cli::args::VariableCommand;
use crate::cli::Context;
use crate::core::scope::{ScopeCategory, ScopeInput};
use crate::core::variables::{NamedResource, Project, VariableSet, VariableType};
use crate::ui::output::AutomationCommand;
use crate::ui::prompts::Prompter;

/// Command path used in automation commands.
pub const COMMAND_PATH: &str = "octopus project variable";

/// Run a variable subcommand.
pub async fn execute(
    command: VariableCommand,
    ctx: &Context,
    api: &dyn OctopusApi,
    prompter: &dyn Prompter,
    out: &mut dyn Write,
) -> Result<()> {
    match command {
        VariableCommand::List(args) => list(ctx, api, args, out).await,
        VariableCommand::View(args) => view(ctx, api, args, out).await,
        VariableCommand::Create(args) => create(ctx, api, prompter, args, out).await,
        VariableCommand::Update(args) => update(ctx, api, prompter, args, out).await,
        VariableCommand::Delete(args) => delete(ctx, api, prompter, args, out).await,
        VariableCommand::Include(args) => include(ctx, api, prompter, args, out).await,
        VariableCommand::Exclude(args) => exclude(ctx, api, prompter, args, out).await,
    }
}

/// Find the project, or ask for one when interactive.
async fn select_project(
    ctx: &Context,
    api: &dyn OctopusApi,
    prompter: &dyn Prompter,
    identifier: Option<&str>,
) -> Result<Project> {
    if let Some(identifier) = identifier.filter(|p| !p.trim().is_empty()) {
        return Ok(api.get_project(identifier.trim()).await?);
    }
    if !ctx.interactive {
        bail!("project must be specified");
    }

    let projects = api.list_projects().await.context("Failed to list projects")?;
    if projects.is_empty() {
        bail!("no projects found in this space");
    }
    let names: Vec<String> = projects.iter().map(|p| p.name.clone()).collect();
    let index = select_index(
        prompter,
        "You have not specified a Project. Please select one:",
        &names,
    )?;
    Ok(projects[index].clone())
}

/// Ask for the git ref of a version-controlled project when none was given.
fn prompt_git_ref(
    prompter: &dyn Prompter,
    project: &Project,
    git_ref: &mut Option<String>,
) -> Result<()> {
    if !project.is_version_controlled || git_ref.as_deref().is_some_and(|r| !r.is_empty()) {
        return Ok(());
    }

    let answer = prompter.input("GitRef", None)?;
    let answer = answer.trim();
    if answer.is_empty() {
        bail!("a git ref is required for version-controlled project '{}'", project.name);
    }
    *git_ref = Some(answer.to_string());
    Ok(())
}

async fn load_variables(
    api: &dyn OctopusApi,
    project: &Project,
    git_ref: Option<&str>,
) -> Result<VariableSet> {
    api.get_variables(project, git_ref)
        .await
        .with_context(|| format!("Failed to load variables of project '{}'", project.name))
}

/// Ask for a value in the form its type needs.
///
/// Text is free input and sensitive values are masked. Accounts, worker
/// pools and certificates are picked from the space by name.
async fn prompt_value(
    api: &dyn OctopusApi,
    prompter: &dyn Prompter,
    variable_type: &VariableType,
) -> Result<String> {
    let resources = match variable_type {
        VariableType::Sensitive => return Ok(prompter.password("Value")?),
        VariableType::WorkerPool => api.list_worker_pools().await?,
        VariableType::Certificate => api.list_certificates().await?,
        other => match other.account_type() {
            Some(account_type) => api.list_accounts(account_type).await?,
            None => return Ok(prompter.input("Value", None)?),
        },
    };

    pick_resource(prompter, variable_type, &resources)
}

fn pick_resource(
    prompter: &dyn Prompter,
    variable_type: &VariableType,
    resources: &[NamedResource],
) -> Result<String> {
    if resources.is_empty() {
        bail!("no values of type '{}' found in this space", variable_type);
    }
    let names: Vec<String> = resources.iter().map(|r| r.name.clone()).collect();
    let index = select_index(prompter, "Value", &names)?;
    Ok(names[index].clone())
}

/// Single choice, checked against the option count.
fn select_index(prompter: &dyn Prompter, message: &str, options: &[String]) -> Result<usize> {
    let index = prompter.select(message, options)?;
    if index >= options.len() {
        return Err(anyhow!("invalid selection for '{}'", message));
    }
    Ok(index)
}

/// Add one flag per scope value.
fn scope_flags(mut command: AutomationCommand, input: &ScopeInput) -> AutomationCommand {
    for category in ScopeCategory::ALL {
        command = command.flags(category.flag_name(), input.get(category));
    }
    command
}
