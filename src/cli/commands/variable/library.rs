//! cli::commands::variable::library
//!
//! Include library variable sets in a project, or exclude them.
//!
//! Both commands edit the project's `IncludedLibraryVariableSetIds` and
//! write the project document back once, after every requested set was
//! found. A set that is already in the wanted state is reported and
//! skipped; when nothing changes the project is not written.

use std::io::Write;

use anyhow::{bail, Context as _, Result};
use tracing::debug;

use super::{select_project, COMMAND_PATH};
use crate::api::OctopusApi;
use crate::cli::args::LibrarySetArgs;
use crate::cli::Context;
use crate::core::scope::equal_fold;
use crate::core::variables::{LibraryVariableSet, Project};
use crate::ui::output::{self, AutomationCommand};
use crate::ui::prompts::Prompter;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Membership {
    Include,
    Exclude,
}

impl Membership {
    fn verb(self) -> &'static str {
        match self {
            Membership::Include => "include",
            Membership::Exclude => "exclude",
        }
    }

    /// Sets the command can act on.
    fn offers(self, project: &Project, set: &LibraryVariableSet) -> bool {
        match self {
            Membership::Include => !project.includes(&set.id),
            Membership::Exclude => project.includes(&set.id),
        }
    }

    fn prompt(self) -> &'static str {
        match self {
            Membership::Include => "Select the Library Variable Sets to include in the project",
            Membership::Exclude => "Select the Library Variable Sets to exclude from the project",
        }
    }

    /// Apply to `project`; false when it was already in the wanted state.
    fn apply(self, project: &mut Project, set: &LibraryVariableSet) -> bool {
        match self {
            Membership::Include => project.include(&set.id),
            Membership::Exclude => project.exclude(&set.id),
        }
    }

    fn changed(self, set: &LibraryVariableSet) -> String {
        match self {
            Membership::Include => format!("Including '{}' library variable set", set.name),
            Membership::Exclude => format!("Removing '{}' library variable set", set.name),
        }
    }

    fn skipped(self, set: &LibraryVariableSet) -> String {
        match self {
            Membership::Include => format!("'{}' is already included, skipping", set.name),
            Membership::Exclude => format!("'{}' is not currently included, skipping", set.name),
        }
    }

    fn success(self) -> &'static str {
        match self {
            Membership::Include => "Successfully updated included library variable sets",
            Membership::Exclude => "Successfully updated library variable sets",
        }
    }
}

/// Include library variable sets in a project.
pub async fn include(
    ctx: &Context,
    api: &dyn OctopusApi,
    prompter: &dyn Prompter,
    args: LibrarySetArgs,
    out: &mut dyn Write,
) -> Result<()> {
    change_membership(Membership::Include, ctx, api, prompter, args, out).await
}

/// Exclude library variable sets from a project.
pub async fn exclude(
    ctx: &Context,
    api: &dyn OctopusApi,
    prompter: &dyn Prompter,
    args: LibrarySetArgs,
    out: &mut dyn Write,
) -> Result<()> {
    change_membership(Membership::Exclude, ctx, api, prompter, args, out).await
}

async fn change_membership(
    membership: Membership,
    ctx: &Context,
    api: &dyn OctopusApi,
    prompter: &dyn Prompter,
    mut args: LibrarySetArgs,
    out: &mut dyn Write,
) -> Result<()> {
    let mut project = select_project(ctx, api, prompter, args.project.as_deref()).await?;
    args.project = Some(project.name.clone());

    let sets = api
        .list_library_variable_sets()
        .await
        .context("Failed to list library variable sets")?;

    let mut wanted: Vec<String> = args
        .variable_sets
        .iter()
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
        .collect();

    if wanted.is_empty() && ctx.interactive {
        let names: Vec<String> = sets
            .iter()
            .filter(|s| membership.offers(&project, s))
            .map(|s| s.name.clone())
            .collect();
        if names.is_empty() {
            bail!("no library variable sets available to {}", membership.verb());
        }
        wanted = prompter.multi_select(membership.prompt(), &names)?;
        if wanted.is_empty() {
            bail!("no library variable sets selected");
        }
    }
    if wanted.is_empty() {
        bail!("at least one variable set must be specified");
    }

    let mut modified = false;
    for name in &wanted {
        let target = find_set(&sets, name)?;
        if membership.apply(&mut project, target) {
            modified = true;
            output::status(out, membership.changed(target), ctx.verbosity)?;
        } else {
            output::status(out, membership.skipped(target), ctx.verbosity)?;
        }
    }

    if modified {
        debug!(
            project = %project.id,
            included = ?project.included_library_variable_sets,
            "updating project"
        );
        api.update_project(&project)
            .await
            .context("Failed to update project")?;
        writeln!(out, "{}", membership.success())?;
    }

    if ctx.interactive {
        let command = AutomationCommand::new(format!("{} {}", COMMAND_PATH, membership.verb()))
            .flag("project", args.project.as_deref().unwrap_or_default())
            .flags("variable-set", &wanted);
        writeln!(out, "\nAutomation Command: {}", command)?;
    }

    Ok(())
}

/// The one library variable set named `name`, ignoring case.
fn find_set<'a>(sets: &'a [LibraryVariableSet], name: &str) -> Result<&'a LibraryVariableSet> {
    let matches: Vec<&LibraryVariableSet> =
        sets.iter().filter(|s| equal_fold(&s.name, name)).collect();
    match matches.as_slice() {
        [] => bail!("cannot find library variable set '{}'", name),
        [one] => Ok(*one),
        _ => bail!("'{}' matched more than one library variable set", name),
    }
}
