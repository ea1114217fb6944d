//! Integration tests for the `project variable` commands.
//!
//! Arguments are parsed by the real CLI definition and executed against
//! `MockApi`, so flag handling and scope resolution are exercised together.

use clap::Parser;

use octopus_cli::api::mock::{FailOn, MockApi, MockOperation};
use octopus_cli::api::ApiError;
use octopus_cli::cli::args::{Command, ProjectCommand, VariableCommand};
use octopus_cli::cli::commands::variable;
use octopus_cli::cli::{Cli, Context};
use octopus_cli::core::scope::{ProcessReferenceItem, ReferenceItem, ScopeValues};
use octopus_cli::core::variables::{LibraryVariableSet, Project, Variable, VariableSet, VariableType};
use octopus_cli::ui::output::OutputFormat;
use octopus_cli::ui::prompts::{Answer, ScriptedPrompter};

// =============================================================================
// Test Fixtures
// =============================================================================

fn project() -> Project {
    Project {
        id: "Projects-1".into(),
        name: "Deploy Website".into(),
        slug: "deploy-website".into(),
        space_id: "Spaces-1".into(),
        variable_set_id: "variableset-Projects-1".into(),
        is_version_controlled: false,
        ..Default::default()
    }
}

fn catalog() -> ScopeValues {
    ScopeValues {
        environments: vec![
            ReferenceItem::new("Environments-1", "Test"),
            ReferenceItem::new("Environments-2", "Production"),
        ],
        roles: vec![ReferenceItem::new("web-server", "web-server")],
        processes: vec![
            ProcessReferenceItem::runbook("Runbooks-1", "Restart"),
            ProcessReferenceItem::runbook("Runbooks-2", "Run, book, run"),
        ],
        ..Default::default()
    }
}

fn variable(id: &str, name: &str, value: &str) -> Variable {
    let mut variable = Variable::new(name);
    variable.id = id.into();
    variable.value = Some(value.into());
    variable
}

fn api() -> MockApi {
    let mut port = variable("v-1", "Port", "8080");
    port.scope.environments = vec!["Environments-1".into()];
    let set = VariableSet {
        id: "variableset-Projects-1".into(),
        owner_id: "Projects-1".into(),
        variables: vec![
            port,
            variable("v-2", "ConnectionString", "Server=test"),
            variable("v-3", "ConnectionString", "Server=prod"),
        ],
        scope_values: catalog(),
        ..Default::default()
    };
    MockApi::new().with_project(project(), set)
}

fn parse(args: &[&str]) -> VariableCommand {
    let words = ["octopus", "project", "variable"].iter().chain(args.iter()).copied();
    command_of(Cli::try_parse_from(words).unwrap())
}

fn command_of(cli: Cli) -> VariableCommand {
    match cli.command {
        Command::Project {
            command: ProjectCommand::Variable { command },
        } => command,
        other => panic!("unexpected command {:?}", other),
    }
}

fn context(interactive: bool, output_format: OutputFormat) -> Context {
    Context {
        interactive,
        output_format,
        ..Default::default()
    }
}

async fn run(api: &MockApi, prompter: &ScriptedPrompter, ctx: &Context, args: &[&str]) -> anyhow::Result<String> {
    let mut out = Vec::new();
    variable::execute(parse(args), ctx, api, prompter, &mut out).await?;
    Ok(String::from_utf8(out).unwrap())
}

async fn run_quiet(api: &MockApi, args: &[&str]) -> anyhow::Result<String> {
    run(api, &ScriptedPrompter::default(), &context(false, OutputFormat::Table), args).await
}

fn stored(api: &MockApi, name: &str) -> Vec<Variable> {
    api.variables("Projects-1")
        .unwrap()
        .variables
        .into_iter()
        .filter(|v| v.name == name)
        .collect()
}

// =============================================================================
// Create
// =============================================================================

mod create_tests {
    use super::*;

    #[tokio::test]
    async fn scope_flags_resolve_by_name_and_id() {
        let api = api();

        let printed = run_quiet(
            &api,
            &[
                "create",
                "-p",
                "deploy-website",
                "-n",
                "ApiUrl",
                "--value",
                "https://api.test",
                "--environment-scope",
                "test",
                "--environment-scope",
                "ENVIRONMENTS-2",
                "--process-scope",
                "Deployment",
                "--process-scope",
                "restart",
                "--role-scope",
                "Web-Server",
            ],
        )
        .await
        .unwrap();

        assert_eq!(
            printed,
            "Successfully created variable 'ApiUrl' in project 'Deploy Website'\n"
        );
        let created = stored(&api, "ApiUrl");
        assert_eq!(created.len(), 1);
        assert_eq!(created[0].value.as_deref(), Some("https://api.test"));
        assert_eq!(created[0].scope.environments, ["Environments-1", "Environments-2"]);
        assert_eq!(created[0].scope.process_owners, ["Projects-1", "Runbooks-1"]);
        assert_eq!(created[0].scope.roles, ["web-server"]);
        assert!(!created[0].id.is_empty());
    }

    #[tokio::test]
    async fn unknown_scope_writes_nothing() {
        let api = api();

        let err = run_quiet(
            &api,
            &["create", "-p", "Deploy Website", "-n", "ApiUrl", "--value", "x", "--environment-scope", "Staging"],
        )
        .await
        .unwrap_err();

        assert_eq!(
            err.to_string(),
            "cannot find scope value 'Staging' (Environment scope)"
        );
        assert!(!api
            .operations()
            .iter()
            .any(|op| matches!(op, MockOperation::UpdateVariables { .. })));
    }

    #[tokio::test]
    async fn sensitive_type_and_prompt_settings() {
        let api = api();

        run_quiet(
            &api,
            &[
                "create",
                "-p",
                "Deploy Website",
                "-n",
                "Region",
                "-t",
                "sensitive",
                "--value",
                "secret",
                "--prompted",
                "--prompt-label",
                "Region",
                "--prompt-type",
                "dropdown",
                "--prompt-dropdown-option",
                "eu|Europe",
                "--prompt-dropdown-option",
                "us|United States",
            ],
        )
        .await
        .unwrap();

        let created = &stored(&api, "Region")[0];
        assert!(created.is_sensitive);
        assert_eq!(created.variable_type, VariableType::Sensitive);
        let prompt = created.prompt.as_ref().unwrap();
        assert_eq!(prompt.label, "Region");
        let options: Vec<String> = prompt.select_options().iter().map(|o| o.to_string()).collect();
        assert_eq!(options, ["eu|Europe", "us|United States"]);
    }

    #[tokio::test]
    async fn scope_name_with_commas_is_one_value() {
        let api = api();

        run_quiet(
            &api,
            &[
                "create",
                "-p",
                "deploy-website",
                "-n",
                "Batch",
                "--value",
                "v",
                "--process-scope",
                "Run, book, run",
            ],
        )
        .await
        .unwrap();

        assert_eq!(stored(&api, "Batch")[0].scope.process_owners, ["Runbooks-2"]);
    }

    #[tokio::test]
    async fn automation_command_runs_again() {
        let api = api();
        let prompter = ScriptedPrompter::new([
            Answer::Confirm(false),
            Answer::Selection(vec![]),
            Answer::Selection(vec!["Run, book, run".into()]),
            Answer::Selection(vec![]),
        ]);

        let printed = run(
            &api,
            &prompter,
            &context(true, OutputFormat::Table),
            &["create", "-p", "Deploy Website", "-n", "Batch", "--description", "", "-t", "text", "--value", "v"],
        )
        .await
        .unwrap();

        let line = printed
            .lines()
            .find_map(|l| l.strip_prefix("Automation Command: "))
            .expect("automation command");
        let words = shell_words::split(line).unwrap();
        let cli = Cli::try_parse_from(&words).unwrap();
        assert!(cli.no_prompt);

        let replay = super::api();
        let mut out = Vec::new();
        variable::execute(
            command_of(cli),
            &context(false, OutputFormat::Table),
            &replay,
            &ScriptedPrompter::default(),
            &mut out,
        )
        .await
        .unwrap();

        assert_eq!(stored(&replay, "Batch")[0].scope.process_owners, ["Runbooks-2"]);
        assert_eq!(stored(&replay, "Batch")[0].scope, stored(&api, "Batch")[0].scope);
    }

    #[tokio::test]
    async fn interactive_create_prompts_for_scopes() {
        let api = api();
        let prompter = ScriptedPrompter::new([
            Answer::Confirm(false),
            Answer::Selection(vec!["Production".into()]),
            Answer::Selection(vec![]),
            Answer::Selection(vec!["web-server".into()]),
        ]);

        let printed = run(
            &api,
            &prompter,
            &context(true, OutputFormat::Table),
            &["create", "-p", "Deploy Website", "-n", "Timeout", "--description", "", "-t", "text", "--value", "30"],
        )
        .await
        .unwrap();

        assert_eq!(
            prompter.asked(),
            [
                "Is this a prompted variable?",
                "Environment scope",
                "Process scope",
                "Role scope"
            ]
        );
        let created = &stored(&api, "Timeout")[0];
        assert_eq!(created.scope.environments, ["Environments-2"]);
        assert_eq!(created.scope.roles, ["web-server"]);
        assert!(printed.contains("\nAutomation Command: octopus project variable create --no-prompt"));
        assert!(printed.contains("--environment-scope Production"));
    }
}

// =============================================================================
// Update
// =============================================================================

mod update_tests {
    use super::*;

    #[tokio::test]
    async fn scope_flags_replace_stored_scope() {
        let api = api();

        run_quiet(
            &api,
            &["update", "-p", "Deploy Website", "-n", "port", "--environment-scope", "Production"],
        )
        .await
        .unwrap();

        let port = &stored(&api, "Port")[0];
        assert_eq!(port.value.as_deref(), Some("8080"));
        assert_eq!(port.scope.environments, ["Environments-2"]);
    }

    #[tokio::test]
    async fn unscoped_clears_scope_and_keeps_value() {
        let api = api();

        let printed = run_quiet(&api, &["update", "-p", "Deploy Website", "--id", "v-1", "--unscoped"])
            .await
            .unwrap();

        assert_eq!(
            printed,
            "Successfully updated variable 'Port' in project 'Deploy Website'\n"
        );
        let port = &stored(&api, "Port")[0];
        assert!(port.scope.environments.is_empty());
        assert_eq!(port.value.as_deref(), Some("8080"));
    }

    #[tokio::test]
    async fn unscoped_conflicts_with_scope_flags() {
        let err = run_quiet(
            &api(),
            &["update", "-p", "Deploy Website", "--id", "v-1", "--unscoped", "--role-scope", "web-server"],
        )
        .await
        .unwrap_err();

        assert_eq!(err.to_string(), "cannot provide 'unscoped' and scope flags together");
    }

    #[tokio::test]
    async fn shared_name_needs_id() {
        let api = api();

        let err = run_quiet(&api, &["update", "-p", "Deploy Website", "-n", "connectionstring", "--value", "x"])
            .await
            .unwrap_err();
        assert_eq!(
            err.to_string(),
            "'connectionstring' has multiple values, supply 'id' flag"
        );

        run_quiet(&api, &["update", "-p", "Deploy Website", "--id", "v-3", "--value", "Server=prod2"])
            .await
            .unwrap();
        let values: Vec<Option<String>> = stored(&api, "ConnectionString")
            .into_iter()
            .map(|v| v.value)
            .collect();
        assert_eq!(values, [Some("Server=test".into()), Some("Server=prod2".into())]);
    }

    #[tokio::test]
    async fn write_failure_surfaces() {
        let api = api().fail_on(FailOn::UpdateVariables(ApiError::Api {
            status: 409,
            message: "version conflict".into(),
        }));

        let err = run_quiet(&api, &["update", "-p", "Deploy Website", "--id", "v-1", "--value", "9090"])
            .await
            .unwrap_err();

        assert_eq!(format!("{:#}", err), "Failed to update variable: API error: 409 - version conflict");
    }
}

// =============================================================================
// List, view and delete
// =============================================================================

mod read_and_delete_tests {
    use super::*;

    #[tokio::test]
    async fn list_basic_prints_names() {
        let printed = run(
            &api(),
            &ScriptedPrompter::default(),
            &context(false, OutputFormat::Basic),
            &["list", "Deploy Website"],
        )
        .await
        .unwrap();

        assert_eq!(printed, "Port\nConnectionString\nConnectionString\n");
    }

    #[tokio::test]
    async fn view_json_resolves_scope_names() {
        let printed = run(
            &api(),
            &ScriptedPrompter::default(),
            &context(false, OutputFormat::Json),
            &["view", "PORT", "-p", "deploy-website"],
        )
        .await
        .unwrap();

        let items: serde_json::Value = serde_json::from_str(&printed).unwrap();
        assert_eq!(items[0]["Name"], "Port");
        assert_eq!(items[0]["Scope"]["Environments"][0]["Name"], "Test");
    }

    #[tokio::test]
    async fn delete_one_of_several_values() {
        let api = api();

        let err = run_quiet(&api, &["delete", "ConnectionString", "-p", "Deploy Website", "-y"])
            .await
            .unwrap_err();
        assert!(err.to_string().contains("supply 'id' flag"));

        let printed = run_quiet(
            &api,
            &["delete", "ConnectionString", "-p", "Deploy Website", "--id", "v-2", "--confirm"],
        )
        .await
        .unwrap();

        assert_eq!(
            printed,
            "The variable, \"ConnectionString\" (v-2) was deleted successfully.\n"
        );
        let remaining: Vec<String> = stored(&api, "ConnectionString").into_iter().map(|v| v.id).collect();
        assert_eq!(remaining, ["v-3"]);
    }
}

// =============================================================================
// Library variable sets
// =============================================================================

mod library_set_tests {
    use super::*;

    fn with_library_sets(api: MockApi) -> MockApi {
        api.with_library_variable_set(LibraryVariableSet {
            id: "LibraryVariableSets-1".into(),
            name: "Slack, Teams and Email".into(),
            content_type: "Variables".into(),
            ..Default::default()
        })
        .with_library_variable_set(LibraryVariableSet {
            id: "LibraryVariableSets-2".into(),
            name: "Azure".into(),
            content_type: "Variables".into(),
            ..Default::default()
        })
    }

    #[tokio::test]
    async fn include_then_exclude() {
        let api = with_library_sets(api());

        let printed = run_quiet(
            &api,
            &[
                "include",
                "-p",
                "deploy-website",
                "--variable-set",
                "slack, teams and email",
                "--variable-set",
                "Azure",
            ],
        )
        .await
        .unwrap();
        assert!(printed.ends_with("Successfully updated included library variable sets\n"));
        assert_eq!(
            api.project("Projects-1").unwrap().included_library_variable_sets,
            ["LibraryVariableSets-1", "LibraryVariableSets-2"]
        );

        run_quiet(&api, &["exclude", "-p", "Deploy Website", "--variable-set", "AZURE"])
            .await
            .unwrap();
        assert_eq!(
            api.project("Projects-1").unwrap().included_library_variable_sets,
            ["LibraryVariableSets-1"]
        );
        assert!(!api
            .operations()
            .iter()
            .any(|op| matches!(op, MockOperation::UpdateVariables { .. })));
    }
}
