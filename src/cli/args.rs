//! cli::args
//!
//! Command-line argument definitions using clap derive.
//!
//! # Global Flags
//!
//! These flags are available on all commands:
//! - `--help` / `-h`: Show help
//! - `--version`: Show version
//! - `--space` / `-s <name or id>`: Space to work in
//! - `--output-format` / `-f <table|json|basic>`: Result format
//! - `--no-prompt`: Never prompt; missing values are errors
//! - `--debug`: Enable debug logging
//! - `--quiet` / `-q`: Minimal output

use clap::{Args, Parser, Subcommand};

use crate::core::scope::{ScopeCategory, ScopeInput};
use crate::core::variables::{ControlType, VariableKind};
use crate::ui::output::OutputFormat;

/// Octopus - Manage Octopus Deploy from the command line
#[derive(Parser, Debug)]
#[command(name = "octopus")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Space name or ID (defaults to OCTOPUS_SPACE, the configured space, or the default space)
    #[arg(short, long, global = true)]
    pub space: Option<String>,

    /// Format of command results
    #[arg(short = 'f', long, global = true, value_enum)]
    pub output_format: Option<OutputFormat>,

    /// Disable interactive prompts
    #[arg(long, global = true)]
    pub no_prompt: bool,

    /// Enable debug logging
    #[arg(long, global = true)]
    pub debug: bool,

    /// Minimal output
    #[arg(short, long, global = true)]
    pub quiet: bool,

    #[command(subcommand)]
    pub command: Command,
}

impl Cli {
    /// Parse command-line arguments.
    pub fn parse_args() -> Self {
        Parser::parse()
    }
}

/// Available commands.
#[derive(Subcommand, Debug)]
pub enum Command {
    /// Store the server URL and API key
    #[command(
        name = "login",
        long_about = "Store the Octopus server URL and an API key.\n\n\
            The URL is written to the configuration file and the API key to the \
            secret store (~/.octopus/secrets.toml, readable only by you). Missing \
            values are prompted for; the API key is read without echo.\n\n\
            OCTOPUS_URL and OCTOPUS_API_KEY override the stored values, which is \
            the usual setup on build agents.",
        after_help = "\
WORKFLOW EXAMPLES:
    # Log in interactively
    octopus login

    # Log in from a script
    octopus login --host https://octopus.example.com --api-key API-XXXXXXXX

    # Check what is configured
    octopus login --status"
    )]
    Login {
        /// Server URL, e.g. https://octopus.example.com
        #[arg(long)]
        host: Option<String>,

        /// API key (prompted for when omitted)
        #[arg(long)]
        api_key: Option<String>,

        /// Show login state without changing it
        #[arg(long)]
        status: bool,
    },

    /// Remove the stored API key
    #[command(name = "logout")]
    Logout {
        /// Server URL (defaults to the configured host)
        #[arg(long)]
        host: Option<String>,
    },

    /// Get, set, or list configuration values
    #[command(
        name = "config",
        long_about = "Get, set, or list configuration values.\n\n\
            Keys: host, space, no-prompt, output-format. Setting an empty value \
            clears the key.",
        after_help = "\
WORKFLOW EXAMPLES:
    # Work in a named space by default
    octopus config set space Integrations

    # Never prompt on this machine
    octopus config set no-prompt true

    # Show everything
    octopus config list"
    )]
    Config {
        #[command(subcommand)]
        action: ConfigAction,
    },

    /// Generate shell completion scripts
    #[command(
        name = "completion",
        long_about = "Generate shell completion scripts for tab-completion.\n\n\
            Outputs a completion script for the specified shell. Add the output \
            to your shell's configuration to enable tab-completion for octopus commands.",
        after_help = "\
WORKFLOW EXAMPLES:
    # Bash (add to ~/.bashrc)
    octopus completion bash >> ~/.bashrc

    # Zsh (add to ~/.zshrc)
    octopus completion zsh >> ~/.zshrc

    # Fish
    octopus completion fish > ~/.config/fish/completions/octopus.fish

    # PowerShell
    octopus completion powershell >> $PROFILE"
    )]
    Completion {
        /// Shell to generate completions for
        #[arg(value_enum)]
        shell: Shell,
    },

    /// Work with projects
    #[command(name = "project")]
    Project {
        #[command(subcommand)]
        command: ProjectCommand,
    },
}

/// Project subcommands.
#[derive(Subcommand, Debug)]
pub enum ProjectCommand {
    /// Manage project variables
    #[command(name = "variable", visible_alias = "variables")]
    Variable {
        #[command(subcommand)]
        command: VariableCommand,
    },
}

/// Project variable subcommands.
#[derive(Subcommand, Debug)]
pub enum VariableCommand {
    /// List the variables of a project
    #[command(
        name = "list",
        visible_alias = "ls",
        after_help = "\
WORKFLOW EXAMPLES:
    octopus project variable list 'Deploy Website'
    octopus project variable list deploy-website -f json"
    )]
    List(ListArgs),

    /// View all values of a variable
    #[command(
        name = "view",
        long_about = "View all values of a variable with their scopes.\n\n\
            Scope IDs are resolved to names using the project's scope catalog. \
            Tenant tags are shown by ID.",
        after_help = "\
WORKFLOW EXAMPLES:
    octopus project variable view ConnectionString --project 'Deploy Website'
    octopus project variable view ConnectionString -p deploy-website --id 2f1c...
    octopus project variable view ConnectionString -p deploy-website --web"
    )]
    View(ViewArgs),

    /// Create a variable
    #[command(
        name = "create",
        visible_alias = "add",
        long_about = "Create a project variable.\n\n\
            Scope flags accept a name or ID and may be repeated; each occurrence \
            is one value, so names containing commas need no escaping. Every \
            value must match the project's scope catalog. In interactive mode \
            missing values are prompted for, and when no scope flag was given \
            you are offered each scope category in turn. After an interactive \
            session the equivalent --no-prompt command is printed.",
        after_help = "\
WORKFLOW EXAMPLES:
    # Interactive
    octopus project variable create

    # Scoped text variable
    octopus project variable create -p 'Deploy Website' -n Port --value 8080 \\
        --environment-scope Test --environment-scope Production --role-scope web-server

    # Sensitive variable
    octopus project variable create -p 'Deploy Website' -n DbPassword -t sensitive --value s3cret

    # Prompted drop-down
    octopus project variable create -p 'Deploy Website' -n Region --prompted \\
        --prompt-label Region --prompt-type dropdown \\
        --prompt-dropdown-option 'eu|Europe' --prompt-dropdown-option 'us|United States'"
    )]
    Create(CreateArgs),

    /// Update a variable
    #[command(
        name = "update",
        long_about = "Update the value or scope of a variable.\n\n\
            The variable is found by --id, or by --name when it has a single \
            value. Scope flags replace the stored scope; --unscoped clears it; \
            without either the scope is left alone.",
        after_help = "\
WORKFLOW EXAMPLES:
    octopus project variable update -p 'Deploy Website' -n Port --value 8081
    octopus project variable update -p 'Deploy Website' --id 2f1c... --environment-scope Production
    octopus project variable update -p 'Deploy Website' -n Port --unscoped"
    )]
    Update(UpdateArgs),

    /// Delete a variable
    #[command(
        name = "delete",
        visible_alias = "rm",
        after_help = "\
WORKFLOW EXAMPLES:
    octopus project variable delete Port --project 'Deploy Website'
    octopus project variable delete ConnectionString -p deploy-website --id 2f1c... --confirm"
    )]
    Delete(DeleteArgs),

    /// Include library variable sets in a project
    #[command(
        name = "include",
        long_about = "Include library variable sets in a project.\n\n\
            Variable sets are matched by name, ignoring case. Sets that are \
            already included are skipped. In interactive mode you pick from \
            the sets the project does not include yet.",
        after_help = "\
WORKFLOW EXAMPLES:
    octopus project variable include
    octopus project variable include -p 'Deploy Website' --variable-set 'Slack Variables'"
    )]
    Include(LibrarySetArgs),

    /// Exclude library variable sets from a project
    #[command(
        name = "exclude",
        long_about = "Exclude library variable sets from a project.\n\n\
            Variable sets are matched by name, ignoring case. Sets that are \
            not included are skipped. In interactive mode you pick from the \
            sets the project includes.",
        after_help = "\
WORKFLOW EXAMPLES:
    octopus project variable exclude
    octopus project variable exclude -p 'Deploy Website' --variable-set 'Slack Variables'"
    )]
    Exclude(LibrarySetArgs),
}

/// Scope flags shared by create and update.
///
/// Each occurrence of a flag carries exactly one value.
#[derive(Args, Debug, Clone, Default)]
pub struct ScopeArgs {
    /// Environments (names or IDs)
    #[arg(long = "environment-scope", value_name = "ENV")]
    pub environments: Vec<String>,

    /// Deployment process or runbooks (names or IDs)
    #[arg(long = "process-scope", value_name = "PROCESS")]
    pub processes: Vec<String>,

    /// Channels (names or IDs)
    #[arg(long = "channel-scope", value_name = "CHANNEL")]
    pub channels: Vec<String>,

    /// Deployment targets (names or IDs)
    #[arg(long = "target-scope", value_name = "TARGET")]
    pub targets: Vec<String>,

    /// Target roles
    #[arg(long = "role-scope", value_name = "ROLE")]
    pub roles: Vec<String>,

    /// Tenant tags (canonical names or IDs)
    #[arg(long = "tag-scope", value_name = "TAG")]
    pub tags: Vec<String>,

    /// Deployment steps (names or IDs)
    #[arg(long = "step-scope", value_name = "STEP")]
    pub steps: Vec<String>,
}

impl ScopeArgs {
    fn values(&self, category: ScopeCategory) -> &[String] {
        match category {
            ScopeCategory::Environment => &self.environments,
            ScopeCategory::Process => &self.processes,
            ScopeCategory::Channel => &self.channels,
            ScopeCategory::Target => &self.targets,
            ScopeCategory::Role => &self.roles,
            ScopeCategory::Tag => &self.tags,
            ScopeCategory::Step => &self.steps,
        }
    }

    /// Flag values as a [`ScopeInput`], trimmed, with blanks dropped.
    pub fn to_input(&self) -> ScopeInput {
        let mut input = ScopeInput::new();
        for category in ScopeCategory::ALL {
            let values = self
                .values(category)
                .iter()
                .map(|v| v.trim().to_string())
                .filter(|v| !v.is_empty())
                .collect();
            input.set(category, values);
        }
        input
    }

    /// True if no scope flag carries a value.
    pub fn is_empty(&self) -> bool {
        self.to_input().is_empty()
    }
}

/// Arguments for `project variable list`.
#[derive(Args, Debug, Clone, Default)]
pub struct ListArgs {
    /// Project name, slug or ID
    pub project: Option<String>,
}

/// Arguments for `project variable view`.
#[derive(Args, Debug, Clone, Default)]
pub struct ViewArgs {
    /// Variable name
    pub name: Option<String>,

    /// Project name, slug or ID
    #[arg(short, long)]
    pub project: Option<String>,

    /// Show only the value with this ID
    #[arg(long)]
    pub id: Option<String>,

    /// Open the project's variables page in a browser
    #[arg(short, long)]
    pub web: bool,
}

/// Arguments for `project variable create`.
#[derive(Args, Debug, Clone, Default)]
pub struct CreateArgs {
    /// Project name, slug or ID
    #[arg(short, long)]
    pub project: Option<String>,

    /// Variable name
    #[arg(short, long)]
    pub name: Option<String>,

    /// Variable value
    #[arg(long)]
    pub value: Option<String>,

    /// Variable type
    #[arg(short = 't', long = "type", value_enum)]
    pub kind: Option<VariableKind>,

    /// Variable description
    #[arg(long)]
    pub description: Option<String>,

    /// Branch or tag of a version-controlled project
    #[arg(long)]
    pub git_ref: Option<String>,

    #[command(flatten)]
    pub scopes: ScopeArgs,

    /// Make this a prompted variable
    #[arg(long)]
    pub prompted: bool,

    /// Label of the prompt
    #[arg(long)]
    pub prompt_label: Option<String>,

    /// Description of the prompt
    #[arg(long)]
    pub prompt_description: Option<String>,

    /// Control shown for the prompt
    #[arg(long, value_enum)]
    pub prompt_type: Option<ControlType>,

    /// Require a value to be supplied at deployment time
    #[arg(long)]
    pub prompt_required: bool,

    /// Drop-down option as 'value|description' (repeatable)
    #[arg(long, value_name = "VALUE|DESCRIPTION")]
    pub prompt_dropdown_option: Vec<String>,
}

/// Arguments for `project variable update`.
#[derive(Args, Debug, Clone, Default)]
pub struct UpdateArgs {
    /// Variable ID
    #[arg(long)]
    pub id: Option<String>,

    /// Project name, slug or ID
    #[arg(short, long)]
    pub project: Option<String>,

    /// Variable name
    #[arg(short, long)]
    pub name: Option<String>,

    /// New value
    #[arg(long)]
    pub value: Option<String>,

    /// Remove every scope from the variable
    #[arg(long)]
    pub unscoped: bool,

    /// Branch or tag of a version-controlled project
    #[arg(long)]
    pub git_ref: Option<String>,

    #[command(flatten)]
    pub scopes: ScopeArgs,
}

/// Arguments for `project variable delete`.
#[derive(Args, Debug, Clone, Default)]
pub struct DeleteArgs {
    /// Variable name
    pub name: Option<String>,

    /// Project name, slug or ID
    #[arg(short, long)]
    pub project: Option<String>,

    /// Variable ID, required when the name has several values
    #[arg(long)]
    pub id: Option<String>,

    /// Branch or tag of a version-controlled project
    #[arg(long)]
    pub git_ref: Option<String>,

    /// Skip the confirmation prompt
    #[arg(short = 'y', long)]
    pub confirm: bool,
}

/// Arguments for `project variable include` and `exclude`.
#[derive(Args, Debug, Clone, Default)]
pub struct LibrarySetArgs {
    /// Project name, slug or ID
    #[arg(short, long)]
    pub project: Option<String>,

    /// Library variable set name (repeatable)
    #[arg(long = "variable-set", value_name = "NAME")]
    pub variable_sets: Vec<String>,
}

/// Configuration subcommands.
#[derive(Subcommand, Debug)]
pub enum ConfigAction {
    /// Get a configuration value
    Get {
        /// Configuration key
        key: String,
    },
    /// Set a configuration value
    Set {
        /// Configuration key
        key: String,
        /// Value to set (empty to clear)
        value: String,
    },
    /// List all configuration values
    List,
}

/// Supported shells for completion
#[derive(clap::ValueEnum, Debug, Clone, Copy)]
#[allow(clippy::enum_variant_names)]
pub enum Shell {
    Bash,
    Zsh,
    Fish,
    PowerShell,
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn cli_definition_is_valid() {
        Cli::command().debug_assert();
    }

    #[test]
    fn scope_flag_values_are_taken_whole() {
        let cli = Cli::try_parse_from([
            "octopus",
            "project",
            "variable",
            "create",
            "--environment-scope",
            " Test ",
            "--environment-scope",
            "Staging",
            "--process-scope",
            "Run, book, run",
            "--role-scope",
            "web",
            "--tag-scope",
            " ",
        ])
        .unwrap();

        let Command::Project {
            command:
                ProjectCommand::Variable {
                    command: VariableCommand::Create(args),
                },
        } = cli.command
        else {
            panic!("expected create");
        };

        let input = args.scopes.to_input();
        assert_eq!(input.get(ScopeCategory::Environment), ["Test", "Staging"]);
        assert_eq!(input.get(ScopeCategory::Process), ["Run, book, run"]);
        assert_eq!(input.get(ScopeCategory::Role), ["web"]);
        assert!(input.get(ScopeCategory::Tag).is_empty());
        assert!(!args.scopes.is_empty());
    }

    #[test]
    fn global_flags_after_subcommand() {
        let cli = Cli::try_parse_from([
            "octopus",
            "project",
            "variables",
            "ls",
            "Website",
            "-f",
            "json",
            "--no-prompt",
            "--space",
            "Spaces-2",
        ])
        .unwrap();
        assert_eq!(cli.output_format, Some(OutputFormat::Json));
        assert!(cli.no_prompt);
        assert_eq!(cli.space.as_deref(), Some("Spaces-2"));
    }

    #[test]
    fn create_type_and_prompt_flags() {
        let cli = Cli::try_parse_from([
            "octopus",
            "project",
            "variable",
            "add",
            "-t",
            "awsaccount",
            "--prompt-type",
            "dropdown",
            "--prompt-dropdown-option",
            "a|Alpha, with comma",
        ])
        .unwrap();
        let Command::Project {
            command:
                ProjectCommand::Variable {
                    command: VariableCommand::Create(args),
                },
        } = cli.command
        else {
            panic!("expected create");
        };
        assert_eq!(args.kind, Some(VariableKind::AwsAccount));
        assert_eq!(args.prompt_type, Some(ControlType::Select));
        assert_eq!(args.prompt_dropdown_option, ["a|Alpha, with comma"]);
    }
}
