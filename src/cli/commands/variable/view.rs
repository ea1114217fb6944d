//! cli::commands::variable::view
//!
//! Show every value of one variable with its scopes resolved to names.

use std::io::Write;

use anyhow::{anyhow, Context as _, Result};
use serde::Serialize;
use tracing::warn;

use super::load_variables;
use crate::api::OctopusApi;
use crate::cli::args::ViewArgs;
use crate::cli::Context;
use crate::core::scope::{equal_fold, resolve_inbound, ReferenceItem, ScopeValues};
use crate::core::variables::{Variable, VariablePrompt};
use crate::ui::output::{self, data_rows, OutputFormat, Table};

const SENSITIVE_VALUE: &str = "*** (sensitive)";
const NO_DESCRIPTION: &str = "No description provided";

/// JSON form of one variable value.
#[derive(Debug, Serialize)]
#[serde(rename_all = "PascalCase")]
struct ValueJson<'a> {
    id: &'a str,
    name: &'a str,
    value: &'a str,
    is_sensitive: bool,
    description: &'a str,
    scope: &'a ScopeValues,
    #[serde(skip_serializing_if = "Option::is_none")]
    prompt: Option<&'a VariablePrompt>,
    web_url: &'a str,
}

/// View a variable.
pub async fn view(
    ctx: &Context,
    api: &dyn OctopusApi,
    args: ViewArgs,
    out: &mut dyn Write,
) -> Result<()> {
    let name = args
        .name
        .as_deref()
        .map(str::trim)
        .filter(|n| !n.is_empty())
        .ok_or_else(|| anyhow!("variable name is required but was not provided"))?;
    let identifier = args
        .project
        .as_deref()
        .filter(|p| !p.trim().is_empty())
        .ok_or_else(|| anyhow!("project must be specified"))?;

    let project = api.get_project(identifier.trim()).await?;
    let set = load_variables(api, &project, None).await?;

    let id = args.id.as_deref().filter(|id| !id.is_empty());
    let values: Vec<(&Variable, ScopeValues)> = set
        .variables
        .iter()
        .filter(|v| equal_fold(&v.name, name))
        .filter(|v| id.map_or(true, |id| equal_fold(&v.id, id)))
        .map(|v| -> Result<_> { Ok((v, resolve_inbound(&v.scope, &set.scope_values)?)) })
        .collect::<Result<_>>()?;

    let Some((first, _)) = values.first() else {
        return Err(anyhow!("cannot find variable '{}'", name));
    };
    let variable_name = first.name.clone();
    let url = api.variables_web_url(&project);

    match ctx.output_format {
        OutputFormat::Json => {
            let items: Vec<ValueJson> = values
                .iter()
                .map(|(v, scope)| ValueJson {
                    id: &v.id,
                    name: &variable_name,
                    value: v.value.as_deref().unwrap_or_default(),
                    is_sensitive: v.is_sensitive,
                    description: v.description.as_deref().unwrap_or_default(),
                    scope,
                    prompt: v.prompt.as_ref(),
                    web_url: &url,
                })
                .collect();
            output::write_json(out, &items)?;
        }
        OutputFormat::Table => {
            let mut table = Table::new(["ID", "VALUE", "DESCRIPTION", "SCOPES"]);
            for (v, scope) in &values {
                table.add_row([
                    v.id.clone(),
                    v.display_value(SENSITIVE_VALUE),
                    description(v).to_string(),
                    scope_summary(scope),
                ]);
            }
            write!(out, "{}", table.render())?;
        }
        OutputFormat::Basic => {
            for (v, scope) in &values {
                write!(out, "{}", basic_block(&variable_name, v, scope))?;
                writeln!(out, "\nView this project's variables in Octopus Deploy: {}", url)?;
            }
        }
    }

    if args.web {
        if let Err(e) = open::that(&url).context("Failed to open browser") {
            warn!(error = %e, "could not open browser");
            output::warn(format!("{:#}", e), ctx.verbosity);
        }
    }

    Ok(())
}

fn description(variable: &Variable) -> &str {
    variable
        .description
        .as_deref()
        .filter(|d| !d.is_empty())
        .unwrap_or(NO_DESCRIPTION)
}

fn names(items: &[ReferenceItem]) -> String {
    items
        .iter()
        .map(|i| i.name.as_str())
        .collect::<Vec<_>>()
        .join(", ")
}

fn ids(items: &[ReferenceItem]) -> String {
    items
        .iter()
        .map(|i| i.id.as_str())
        .collect::<Vec<_>>()
        .join(", ")
}

fn process_names(scope: &ScopeValues) -> String {
    scope
        .processes
        .iter()
        .map(|p| p.name.as_str())
        .collect::<Vec<_>>()
        .join(", ")
}

/// Scope lines in display order. Tenant tags show their IDs.
fn scope_entries(scope: &ScopeValues) -> Vec<(&'static str, &'static str, String)> {
    let mut entries = Vec::new();
    let mut push = |short: &'static str, long: &'static str, value: String| {
        if !value.is_empty() {
            entries.push((short, long, value));
        }
    };
    push("Env", "Environment scope", names(&scope.environments));
    push("Role", "Role scope", names(&scope.roles));
    push("Channel", "Channel scope", names(&scope.channels));
    push("Machine", "Machine scope", names(&scope.machines));
    push("Tag", "Tenant tag scope", ids(&scope.tenant_tags));
    push("Step", "Step scope", names(&scope.actions));
    push("Process", "Process scope", process_names(scope));
    entries
}

/// `Env: Test, Production; Role: web`, or `No scopes`.
fn scope_summary(scope: &ScopeValues) -> String {
    let parts: Vec<String> = scope_entries(scope)
        .into_iter()
        .map(|(short, _, value)| format!("{}: {}", short, value))
        .collect();
    if parts.is_empty() {
        "No scopes".to_string()
    } else {
        parts.join("; ")
    }
}

fn basic_block(name: &str, variable: &Variable, scope: &ScopeValues) -> String {
    let mut rows: Vec<(&str, String)> = vec![
        ("Id", variable.id.clone()),
        ("Value", variable.display_value(SENSITIVE_VALUE)),
        ("Description", description(variable).to_string()),
    ];
    for (_, label, value) in scope_entries(scope) {
        rows.push((label, value));
    }
    if let Some(prompt) = &variable.prompt {
        rows.push(("Prompted", "true".to_string()));
        rows.push(("Prompt Label", prompt.label.clone()));
        rows.push(("Prompt Description", prompt.description.clone()));
        rows.push(("Prompt Required", prompt.required.to_string()));
    }

    format!("{}\n\n{}", name, data_rows(&rows))
}
