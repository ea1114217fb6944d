//! core::variables
//!
//! Project variables and the resources around them.
//!
//! # Design
//!
//! The API reads and writes a project's variables as one document, the
//! [`VariableSet`]. Mutating commands fetch the set, change it in memory
//! and send the whole set back, so every wire type here keeps unknown
//! fields in an `extra` map and writes them back untouched.

use std::collections::BTreeMap;
use std::fmt;

use clap::ValueEnum;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::core::scope::{equal_fold, null_as_default, ResolvedScope, ScopeValues};

/// Display setting key holding the prompt control type.
pub const CONTROL_TYPE_KEY: &str = "Octopus.ControlType";

/// Display setting key holding newline-separated `value|display` pairs.
pub const SELECT_OPTIONS_KEY: &str = "Octopus.SelectOptions";

/// Errors from variable lookup and prompt settings.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum VariableError {
    #[error("invalid dropdown option '{0}', expected 'value|description'")]
    InvalidSelectOption(String),

    #[error("cannot find variable with id '{0}'")]
    IdNotFound(String),

    #[error("'{0}' has matched multiple variables")]
    IdAmbiguous(String),

    #[error("cannot find variable with name '{0}'")]
    NameNotFound(String),

    #[error("'{0}' has multiple values, supply 'id' flag")]
    NameAmbiguous(String),

    #[error("cannot find variable '{0}'")]
    NotFound(String),

    #[error("variable requires a name or an id")]
    MissingIdentifier,
}

/// API type of a variable's value.
///
/// Unknown type strings from newer servers are kept as [`VariableType::Other`].
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum VariableType {
    #[default]
    String,
    Sensitive,
    Certificate,
    AmazonWebServicesAccount,
    AzureAccount,
    GoogleCloudAccount,
    WorkerPool,
    Other(String),
}

impl VariableType {
    pub fn api_name(&self) -> &str {
        match self {
            VariableType::String => "String",
            VariableType::Sensitive => "Sensitive",
            VariableType::Certificate => "Certificate",
            VariableType::AmazonWebServicesAccount => "AmazonWebServicesAccount",
            VariableType::AzureAccount => "AzureAccount",
            VariableType::GoogleCloudAccount => "GoogleCloudAccount",
            VariableType::WorkerPool => "WorkerPool",
            VariableType::Other(name) => name,
        }
    }

    /// The `AccountType` of accounts that can be a value of this type.
    pub fn account_type(&self) -> Option<&'static str> {
        match self {
            VariableType::AmazonWebServicesAccount => Some("AmazonWebServicesAccount"),
            VariableType::AzureAccount => Some("AzureServicePrincipal"),
            VariableType::GoogleCloudAccount => Some("GoogleCloudAccount"),
            _ => None,
        }
    }
}

impl From<String> for VariableType {
    fn from(name: String) -> Self {
        match name.as_str() {
            "String" => VariableType::String,
            "Sensitive" => VariableType::Sensitive,
            "Certificate" => VariableType::Certificate,
            "AmazonWebServicesAccount" => VariableType::AmazonWebServicesAccount,
            "AzureAccount" => VariableType::AzureAccount,
            "GoogleCloudAccount" => VariableType::GoogleCloudAccount,
            "WorkerPool" => VariableType::WorkerPool,
            _ => VariableType::Other(name),
        }
    }
}

impl From<VariableType> for String {
    fn from(variable_type: VariableType) -> Self {
        variable_type.api_name().to_string()
    }
}

impl fmt::Display for VariableType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.api_name())
    }
}

/// Variable type as named on the command line.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, ValueEnum)]
pub enum VariableKind {
    #[default]
    #[value(name = "text")]
    Text,
    #[value(name = "sensitive")]
    Sensitive,
    #[value(name = "certificate")]
    Certificate,
    #[value(name = "workerpool")]
    WorkerPool,
    #[value(name = "azureaccount")]
    AzureAccount,
    #[value(name = "awsaccount")]
    AwsAccount,
    #[value(name = "googleaccount")]
    GoogleAccount,
}

impl VariableKind {
    /// Kinds in the order they are offered interactively.
    pub const ALL: [VariableKind; 7] = [
        VariableKind::Text,
        VariableKind::Sensitive,
        VariableKind::Certificate,
        VariableKind::WorkerPool,
        VariableKind::AzureAccount,
        VariableKind::AwsAccount,
        VariableKind::GoogleAccount,
    ];

    /// Flag value.
    pub fn name(self) -> &'static str {
        match self {
            VariableKind::Text => "text",
            VariableKind::Sensitive => "sensitive",
            VariableKind::Certificate => "certificate",
            VariableKind::WorkerPool => "workerpool",
            VariableKind::AzureAccount => "azureaccount",
            VariableKind::AwsAccount => "awsaccount",
            VariableKind::GoogleAccount => "googleaccount",
        }
    }

    /// Label shown in the type prompt.
    pub fn label(self) -> &'static str {
        match self {
            VariableKind::Text => "Text",
            VariableKind::Sensitive => "Sensitive",
            VariableKind::Certificate => "Certificate",
            VariableKind::WorkerPool => "Worker Pool",
            VariableKind::AzureAccount => "Azure Account",
            VariableKind::AwsAccount => "Aws Account",
            VariableKind::GoogleAccount => "Google Account",
        }
    }

    pub fn variable_type(self) -> VariableType {
        match self {
            VariableKind::Text => VariableType::String,
            VariableKind::Sensitive => VariableType::Sensitive,
            VariableKind::Certificate => VariableType::Certificate,
            VariableKind::WorkerPool => VariableType::WorkerPool,
            VariableKind::AzureAccount => VariableType::AzureAccount,
            VariableKind::AwsAccount => VariableType::AmazonWebServicesAccount,
            VariableKind::GoogleAccount => VariableType::GoogleCloudAccount,
        }
    }
}

/// Input control for a prompted variable.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, ValueEnum)]
pub enum ControlType {
    #[default]
    #[value(name = "text")]
    SingleLineText,
    #[value(name = "multiline-text")]
    MultiLineText,
    #[value(name = "checkbox")]
    Checkbox,
    #[value(name = "dropdown")]
    Select,
}

impl ControlType {
    pub const ALL: [ControlType; 4] = [
        ControlType::SingleLineText,
        ControlType::MultiLineText,
        ControlType::Checkbox,
        ControlType::Select,
    ];

    /// Flag value.
    pub fn name(self) -> &'static str {
        match self {
            ControlType::SingleLineText => "text",
            ControlType::MultiLineText => "multiline-text",
            ControlType::Checkbox => "checkbox",
            ControlType::Select => "dropdown",
        }
    }

    /// Value stored under `Octopus.ControlType`.
    pub fn api_name(self) -> &'static str {
        match self {
            ControlType::SingleLineText => "SingleLineText",
            ControlType::MultiLineText => "MultiLineText",
            ControlType::Checkbox => "Checkbox",
            ControlType::Select => "Select",
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            ControlType::SingleLineText => "Single line text",
            ControlType::MultiLineText => "Multi line text",
            ControlType::Checkbox => "Checkbox",
            ControlType::Select => "Drop down",
        }
    }

    pub fn from_api_name(name: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|c| c.api_name() == name)
    }
}

/// One entry of a drop-down prompt.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SelectOption {
    pub value: String,
    pub display_name: String,
}

impl SelectOption {
    /// Parse `value|description`.
    ///
    /// Everything after the first `|` is the description.
    pub fn parse(raw: &str) -> Result<Self, VariableError> {
        let (value, display_name) = raw
            .split_once('|')
            .ok_or_else(|| VariableError::InvalidSelectOption(raw.to_string()))?;
        if value.trim().is_empty() {
            return Err(VariableError::InvalidSelectOption(raw.to_string()));
        }
        Ok(Self {
            value: value.to_string(),
            display_name: display_name.to_string(),
        })
    }
}

impl fmt::Display for SelectOption {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}|{}", self.value, self.display_name)
    }
}

/// Settings of a prompted variable.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct VariablePrompt {
    #[serde(default, deserialize_with = "null_as_default")]
    pub label: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub description: String,
    #[serde(default)]
    pub required: bool,
    #[serde(default, deserialize_with = "null_as_default")]
    pub display_settings: BTreeMap<String, String>,
}

impl VariablePrompt {
    pub fn new(
        label: impl Into<String>,
        description: impl Into<String>,
        required: bool,
        control: ControlType,
        options: &[SelectOption],
    ) -> Self {
        let mut display_settings = BTreeMap::new();
        display_settings.insert(CONTROL_TYPE_KEY.to_string(), control.api_name().to_string());
        if control == ControlType::Select {
            let joined = options
                .iter()
                .map(ToString::to_string)
                .collect::<Vec<_>>()
                .join("\n");
            display_settings.insert(SELECT_OPTIONS_KEY.to_string(), joined);
        }
        Self {
            label: label.into(),
            description: description.into(),
            required,
            display_settings,
        }
    }

    pub fn control_type(&self) -> Option<ControlType> {
        self.display_settings
            .get(CONTROL_TYPE_KEY)
            .and_then(|name| ControlType::from_api_name(name))
    }

    /// Drop-down options. Lines that do not parse are skipped.
    pub fn select_options(&self) -> Vec<SelectOption> {
        self.display_settings
            .get(SELECT_OPTIONS_KEY)
            .map(|raw| {
                raw.lines()
                    .filter_map(|line| SelectOption::parse(line).ok())
                    .collect()
            })
            .unwrap_or_default()
    }
}

/// A project variable.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct Variable {
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub id: String,
    pub name: String,
    /// `None` for sensitive values read back from the server.
    #[serde(default)]
    pub value: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub scope: ResolvedScope,
    #[serde(default = "default_editable")]
    pub is_editable: bool,
    #[serde(default)]
    pub is_sensitive: bool,
    #[serde(rename = "Type", default)]
    pub variable_type: VariableType,
    #[serde(default)]
    pub prompt: Option<VariablePrompt>,
    #[serde(flatten)]
    pub extra: serde_json::Map<String, serde_json::Value>,
}

fn default_editable() -> bool {
    true
}

impl Variable {
    /// A new, unscoped text variable.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            id: String::new(),
            name: name.into(),
            value: None,
            description: None,
            scope: ResolvedScope::default(),
            is_editable: true,
            is_sensitive: false,
            variable_type: VariableType::String,
            prompt: None,
            extra: serde_json::Map::new(),
        }
    }

    /// Set the type, keeping `is_sensitive` in step.
    pub fn set_type(&mut self, variable_type: VariableType) {
        self.is_sensitive = variable_type == VariableType::Sensitive;
        self.variable_type = variable_type;
    }

    pub fn is_prompted(&self) -> bool {
        self.prompt.is_some()
    }

    /// Value for display, with sensitive values replaced by `mask`.
    pub fn display_value(&self, mask: &str) -> String {
        if self.is_sensitive {
            mask.to_string()
        } else {
            self.value.clone().unwrap_or_default()
        }
    }
}

/// All variables of a project, with the catalog of valid scope values.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct VariableSet {
    #[serde(default)]
    pub id: String,
    #[serde(default)]
    pub owner_id: String,
    #[serde(default)]
    pub version: i64,
    #[serde(default, deserialize_with = "null_as_default")]
    pub variables: Vec<Variable>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub scope_values: ScopeValues,
    #[serde(flatten)]
    pub extra: serde_json::Map<String, serde_json::Value>,
}

impl VariableSet {
    /// Variables whose name matches, ignoring case, in set order.
    pub fn named(&self, name: &str) -> Vec<&Variable> {
        self.variables
            .iter()
            .filter(|v| equal_fold(&v.name, name))
            .collect()
    }

    /// Index of the single variable to update.
    ///
    /// Looks up by `id` when given, otherwise by `name`.
    pub fn find_for_update(
        &self,
        id: Option<&str>,
        name: Option<&str>,
    ) -> Result<usize, VariableError> {
        if let Some(id) = id.filter(|id| !id.is_empty()) {
            let matches = self.positions(|v| equal_fold(&v.id, id));
            return match matches.as_slice() {
                [] => Err(VariableError::IdNotFound(id.to_string())),
                [index] => Ok(*index),
                _ => Err(VariableError::IdAmbiguous(id.to_string())),
            };
        }

        let name = name
            .filter(|name| !name.is_empty())
            .ok_or(VariableError::MissingIdentifier)?;
        let matches = self.positions(|v| equal_fold(&v.name, name));
        match matches.as_slice() {
            [] => Err(VariableError::NameNotFound(name.to_string())),
            [index] => Ok(*index),
            _ => Err(VariableError::NameAmbiguous(name.to_string())),
        }
    }

    /// Index of the single variable to delete.
    ///
    /// The name must match; `id` picks one value when several share it.
    pub fn find_for_delete(&self, name: &str, id: Option<&str>) -> Result<usize, VariableError> {
        let matches = self.positions(|v| equal_fold(&v.name, name));
        if matches.is_empty() {
            return Err(VariableError::NotFound(name.to_string()));
        }

        match id.filter(|id| !id.is_empty()) {
            Some(id) => matches
                .into_iter()
                .find(|index| equal_fold(&self.variables[*index].id, id))
                .ok_or_else(|| VariableError::IdNotFound(id.to_string())),
            None if matches.len() > 1 => Err(VariableError::NameAmbiguous(name.to_string())),
            None => Ok(matches[0]),
        }
    }

    fn positions(&self, predicate: impl Fn(&Variable) -> bool) -> Vec<usize> {
        self.variables
            .iter()
            .enumerate()
            .filter(|(_, v)| predicate(v))
            .map(|(index, _)| index)
            .collect()
    }
}

/// A project.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct Project {
    pub id: String,
    pub name: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub slug: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub space_id: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub variable_set_id: String,
    #[serde(default)]
    pub is_version_controlled: bool,
    /// Library variable sets whose variables the project can use.
    #[serde(
        rename = "IncludedLibraryVariableSetIds",
        default,
        deserialize_with = "null_as_default"
    )]
    pub included_library_variable_sets: Vec<String>,
    #[serde(flatten)]
    pub extra: serde_json::Map<String, serde_json::Value>,
}

impl Project {
    pub fn includes(&self, library_set_id: &str) -> bool {
        self.included_library_variable_sets
            .iter()
            .any(|id| id == library_set_id)
    }

    /// Add a library variable set. Returns false if it was already included.
    pub fn include(&mut self, library_set_id: &str) -> bool {
        if self.includes(library_set_id) {
            return false;
        }
        self.included_library_variable_sets
            .push(library_set_id.to_string());
        true
    }

    /// Remove a library variable set. Returns false if it was not included.
    pub fn exclude(&mut self, library_set_id: &str) -> bool {
        let before = self.included_library_variable_sets.len();
        self.included_library_variable_sets
            .retain(|id| id != library_set_id);
        self.included_library_variable_sets.len() != before
    }
}

/// Content type of library variable sets that hold variables, as opposed
/// to script modules.
pub const LIBRARY_VARIABLES_CONTENT_TYPE: &str = "Variables";

/// A library variable set shared between projects.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct LibraryVariableSet {
    pub id: String,
    pub name: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub description: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub content_type: String,
}

/// A space.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct Space {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub is_default: bool,
}

/// An account, worker pool or certificate offered as a variable value.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct NamedResource {
    pub id: String,
    pub name: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn set() -> VariableSet {
        let mut first = Variable::new("ConnectionString");
        first.id = "v-1".into();
        let mut second = Variable::new("connectionstring");
        second.id = "v-2".into();
        let mut third = Variable::new("Port");
        third.id = "v-3".into();
        VariableSet {
            variables: vec![first, second, third],
            ..Default::default()
        }
    }

    #[test]
    fn variable_type_round_trips_unknown() {
        let parsed: VariableType = serde_json::from_str("\"Boolean\"").unwrap();
        assert_eq!(parsed, VariableType::Other("Boolean".into()));
        assert_eq!(serde_json::to_string(&parsed).unwrap(), "\"Boolean\"");
        assert_eq!(
            VariableType::from("AzureAccount".to_string()),
            VariableType::AzureAccount
        );
    }

    #[test]
    fn kinds_map_to_types() {
        assert_eq!(VariableKind::Text.variable_type(), VariableType::String);
        assert_eq!(
            VariableKind::AwsAccount.variable_type(),
            VariableType::AmazonWebServicesAccount
        );
        assert_eq!(
            VariableKind::GoogleAccount.variable_type(),
            VariableType::GoogleCloudAccount
        );
        assert_eq!(VariableKind::WorkerPool.name(), "workerpool");
    }

    #[test]
    fn select_option_parse() {
        let option = SelectOption::parse("eu|Europe").unwrap();
        assert_eq!(option.value, "eu");
        assert_eq!(option.display_name, "Europe");
        assert_eq!(option.to_string(), "eu|Europe");

        assert!(SelectOption::parse("no-separator").is_err());
        assert!(SelectOption::parse("|missing value").is_err());
    }

    #[test]
    fn prompt_display_settings() {
        let options = vec![
            SelectOption::parse("a|Alpha").unwrap(),
            SelectOption::parse("b|Beta").unwrap(),
        ];
        let prompt = VariablePrompt::new("Pick", "", true, ControlType::Select, &options);

        assert_eq!(prompt.display_settings[CONTROL_TYPE_KEY], "Select");
        assert_eq!(prompt.display_settings[SELECT_OPTIONS_KEY], "a|Alpha\nb|Beta");
        assert_eq!(prompt.control_type(), Some(ControlType::Select));
        assert_eq!(prompt.select_options(), options);

        let text = VariablePrompt::new("Name", "", false, ControlType::SingleLineText, &options);
        assert!(!text.display_settings.contains_key(SELECT_OPTIONS_KEY));
    }

    #[test]
    fn variable_preserves_unknown_fields() {
        let json = serde_json::json!({
            "Id": "v-1",
            "Name": "Port",
            "Value": "8080",
            "Description": null,
            "Scope": {"Environment": ["Environments-1"]},
            "IsEditable": true,
            "IsSensitive": false,
            "Type": "String",
            "Prompt": null,
            "SpaceId": "Spaces-1"
        });

        let variable: Variable = serde_json::from_value(json).unwrap();
        assert_eq!(variable.scope.environments, ["Environments-1"]);
        assert_eq!(variable.extra["SpaceId"], "Spaces-1");

        let back = serde_json::to_value(&variable).unwrap();
        assert_eq!(back["SpaceId"], "Spaces-1");
        assert_eq!(back["Type"], "String");
    }

    #[test]
    fn new_variable_omits_id() {
        let json = serde_json::to_value(Variable::new("Port")).unwrap();
        assert!(json.get("Id").is_none());
        assert_eq!(json["IsEditable"], true);
    }

    #[test]
    fn sensitive_display_is_masked() {
        let mut variable = Variable::new("Password");
        variable.set_type(VariableType::Sensitive);
        variable.value = Some("hunter2".into());
        assert!(variable.is_sensitive);
        assert_eq!(variable.display_value("***"), "***");
    }

    #[test]
    fn update_lookup_by_id_then_name() {
        let set = set();
        assert_eq!(set.find_for_update(Some("V-2"), None).unwrap(), 1);
        assert_eq!(set.find_for_update(None, Some("port")).unwrap(), 2);
        assert_eq!(
            set.find_for_update(Some("v-9"), Some("Port")),
            Err(VariableError::IdNotFound("v-9".into()))
        );
        assert_eq!(
            set.find_for_update(None, Some("ConnectionString")),
            Err(VariableError::NameAmbiguous("ConnectionString".into()))
        );
        assert_eq!(
            set.find_for_update(None, Some("Missing")).unwrap_err().to_string(),
            "cannot find variable with name 'Missing'"
        );
        assert_eq!(
            set.find_for_update(None, None),
            Err(VariableError::MissingIdentifier)
        );
    }

    #[test]
    fn delete_lookup_requires_id_when_ambiguous() {
        let set = set();
        assert_eq!(
            set.find_for_delete("ConnectionString", None)
                .unwrap_err()
                .to_string(),
            "'ConnectionString' has multiple values, supply 'id' flag"
        );
        assert_eq!(set.find_for_delete("ConnectionString", Some("v-2")).unwrap(), 1);
        assert_eq!(set.find_for_delete("Port", None).unwrap(), 2);
        assert_eq!(
            set.find_for_delete("Nope", None),
            Err(VariableError::NotFound("Nope".into()))
        );
    }

    #[test]
    fn variable_set_tolerates_nulls() {
        let json = r#"{"Id":"variableset-Projects-1","OwnerId":"Projects-1","Version":3,
            "Variables":null,"ScopeValues":{"Environments":null}}"#;
        let set: VariableSet = serde_json::from_str(json).unwrap();
        assert!(set.variables.is_empty());
        assert!(set.scope_values.is_empty());
        assert_eq!(set.version, 3);
    }

    #[test]
    fn project_library_sets_round_trip() {
        let json = r#"{"Id":"Projects-1","Name":"Deploy Website","Slug":"deploy-website",
            "IncludedLibraryVariableSetIds":["LibraryVariableSets-1"],
            "LifecycleId":"Lifecycles-1"}"#;
        let mut project: Project = serde_json::from_str(json).unwrap();
        assert!(project.includes("LibraryVariableSets-1"));

        assert!(!project.include("LibraryVariableSets-1"));
        assert!(project.include("LibraryVariableSets-2"));
        assert!(project.exclude("LibraryVariableSets-1"));
        assert!(!project.exclude("LibraryVariableSets-1"));

        let written = serde_json::to_value(&project).unwrap();
        assert_eq!(
            written["IncludedLibraryVariableSetIds"],
            serde_json::json!(["LibraryVariableSets-2"])
        );
        assert_eq!(written["LifecycleId"], "Lifecycles-1");

        let empty: Project =
            serde_json::from_str(r#"{"Id":"Projects-2","Name":"Other","IncludedLibraryVariableSetIds":null}"#)
                .unwrap();
        assert!(empty.included_library_variable_sets.is_empty());
    }
}
