//! cli::commands::variable::list

use std::io::Write;

use anyhow::{anyhow, Result};

use super::load_variables;
use crate::api::OctopusApi;
use crate::cli::args::ListArgs;
use crate::cli::Context;
use crate::core::scope::resolve_inbound;
use crate::ui::output::{self, OutputFormat, Table, MASK};

/// List every variable of a project.
pub async fn list(
    ctx: &Context,
    api: &dyn OctopusApi,
    args: ListArgs,
    out: &mut dyn Write,
) -> Result<()> {
    let identifier = args
        .project
        .as_deref()
        .map(str::trim)
        .filter(|p| !p.is_empty())
        .ok_or_else(|| anyhow!("must supply project identifier"))?;

    let project = api.get_project(identifier).await?;
    let set = load_variables(api, &project, None).await?;

    match ctx.output_format {
        OutputFormat::Json => {
            let mut items = Vec::with_capacity(set.variables.len());
            for variable in &set.variables {
                let mut item = serde_json::to_value(variable)?;
                item["Scope"] = serde_json::to_value(resolve_inbound(&variable.scope, &set.scope_values)?)?;
                items.push(item);
            }
            output::write_json(out, &items)?;
        }
        OutputFormat::Basic => {
            for variable in &set.variables {
                writeln!(out, "{}", variable.name)?;
            }
        }
        OutputFormat::Table => {
            let mut table = Table::new(["NAME", "DESCRIPTION", "VALUE", "IS PROMPTED", "ID"]);
            for variable in &set.variables {
                table.add_row([
                    variable.name.clone(),
                    variable.description.clone().unwrap_or_default(),
                    variable.display_value(MASK),
                    variable.is_prompted().to_string(),
                    variable.id.clone(),
                ]);
            }
            write!(out, "{}", table.render())?;
        }
    }

    Ok(())
}
