//! core::scope
//!
//! Variable scope resolution.
//!
//! # Overview
//!
//! Users name scopes the way they see them in the Octopus UI ("Production",
//! "web-server", "Deploy Website"), while the API stores a variable's scope
//! as lists of opaque reference IDs per category. This module translates in
//! both directions:
//!
//! - [`resolve_outbound`] turns a [`ScopeInput`] (names or IDs typed by the
//!   user) into a [`ResolvedScope`] of IDs ready to submit.
//! - [`resolve_inbound`] turns a stored [`ResolvedScope`] back into the
//!   matching [`ReferenceItem`]s for display.
//! - [`prompt_scopes`] fills in categories the user left empty when running
//!   interactively.
//!
//! # Invariants
//!
//! - Every user-supplied value resolves to a catalog entry of the same
//!   category, or the whole resolution fails.
//! - Outbound resolution matches ID or Name, case-insensitively. Inbound
//!   resolution matches IDs only.
//! - The deployment process is addressable as `"deployment"`; it resolves
//!   to the owning project's ID.
//!
//! # Example
//!
//! ```
//! use octopus_cli::core::scope::{
//!     resolve_outbound, ReferenceItem, ScopeCategory, ScopeInput, ScopeValues,
//! };
//!
//! let catalog = ScopeValues {
//!     environments: vec![ReferenceItem::new("Environments-1", "Production")],
//!     ..Default::default()
//! };
//! let input = ScopeInput::new().with(ScopeCategory::Environment, ["production"]);
//!
//! let scope = resolve_outbound(&input, &catalog, "Projects-1").unwrap();
//! assert_eq!(scope.ids(ScopeCategory::Environment), ["Environments-1"]);
//! ```

use std::borrow::Cow;
use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Deserializer, Serialize};
use thiserror::Error;
use tracing::debug;

use crate::ui::prompts::{PromptError, Prompter};

/// Name under which the deployment process can be selected as a process scope.
pub const DEPLOYMENT_PROCESS_NAME: &str = "deployment";

/// Errors from scope resolution.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum ScopeError {
    /// A user-supplied value matched no catalog entry by ID or Name.
    #[error("cannot find scope value '{value}' ({category} scope)")]
    UnknownValue {
        category: ScopeCategory,
        value: String,
    },

    /// A stored scope ID is missing from the catalog snapshot.
    #[error("cannot find scope value for '{id}' ({category} scope)")]
    UnknownId { category: ScopeCategory, id: String },
}

/// A scope category.
///
/// The declaration order is the order categories are resolved and prompted in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum ScopeCategory {
    Environment,
    Process,
    Channel,
    Target,
    Role,
    Tag,
    Step,
}

impl ScopeCategory {
    /// Every category, in resolution and prompt order.
    pub const ALL: [ScopeCategory; 7] = [
        ScopeCategory::Environment,
        ScopeCategory::Process,
        ScopeCategory::Channel,
        ScopeCategory::Target,
        ScopeCategory::Role,
        ScopeCategory::Tag,
        ScopeCategory::Step,
    ];

    /// Long flag name used on the command line.
    pub fn flag_name(self) -> &'static str {
        match self {
            ScopeCategory::Environment => "environment-scope",
            ScopeCategory::Process => "process-scope",
            ScopeCategory::Channel => "channel-scope",
            ScopeCategory::Target => "target-scope",
            ScopeCategory::Role => "role-scope",
            ScopeCategory::Tag => "tag-scope",
            ScopeCategory::Step => "step-scope",
        }
    }

    /// Human-readable label, used in prompts and errors.
    pub fn label(self) -> &'static str {
        match self {
            ScopeCategory::Environment => "Environment",
            ScopeCategory::Process => "Process",
            ScopeCategory::Channel => "Channel",
            ScopeCategory::Target => "Target",
            ScopeCategory::Role => "Role",
            ScopeCategory::Tag => "Tag",
            ScopeCategory::Step => "Step",
        }
    }

    /// Whether a prompted variable may be scoped by this category.
    ///
    /// Prompted variables are answered before a deployment starts, so only
    /// categories known at that point are allowed.
    pub fn allowed_for_prompted_variable(self) -> bool {
        matches!(self, ScopeCategory::Environment | ScopeCategory::Process)
    }
}

impl fmt::Display for ScopeCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// User-supplied scope values, keyed by category.
///
/// Values are names or IDs exactly as typed; nothing is validated until
/// [`resolve_outbound`] runs.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ScopeInput {
    values: BTreeMap<ScopeCategory, Vec<String>>,
}

impl ScopeInput {
    /// Create an empty (unscoped) input.
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder-style setter.
    pub fn with<I, S>(mut self, category: ScopeCategory, values: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.set(category, values.into_iter().map(Into::into).collect());
        self
    }

    /// Values for a category, empty if none were supplied.
    pub fn get(&self, category: ScopeCategory) -> &[String] {
        self.values
            .get(&category)
            .map(Vec::as_slice)
            .unwrap_or_default()
    }

    /// Replace the values for a category.
    pub fn set(&mut self, category: ScopeCategory, values: Vec<String>) {
        if values.is_empty() {
            self.values.remove(&category);
        } else {
            self.values.insert(category, values);
        }
    }

    /// True if no category has any value.
    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// Non-empty categories in resolution order.
    pub fn iter(&self) -> impl Iterator<Item = (ScopeCategory, &[String])> {
        self.values
            .iter()
            .map(|(category, values)| (*category, values.as_slice()))
    }
}

/// A resolvable scope value known to the server.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct ReferenceItem {
    pub id: String,
    pub name: String,
}

impl ReferenceItem {
    pub fn new(id: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
        }
    }
}

/// A process owner: a runbook, or the deployment process itself.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct ProcessReferenceItem {
    #[serde(default)]
    pub process_type: String,
    pub id: String,
    pub name: String,
}

impl ProcessReferenceItem {
    pub fn runbook(id: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            process_type: "Runbook".to_string(),
            id: id.into(),
            name: name.into(),
        }
    }
}

impl From<&ProcessReferenceItem> for ReferenceItem {
    fn from(process: &ProcessReferenceItem) -> Self {
        ReferenceItem::new(process.id.clone(), process.name.clone())
    }
}

/// Reference items per category.
///
/// The API returns a project's full scope catalog in this shape, and
/// [`resolve_inbound`] produces a variable's resolved scope in the same
/// shape.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase", default)]
pub struct ScopeValues {
    #[serde(deserialize_with = "null_as_default")]
    pub environments: Vec<ReferenceItem>,
    #[serde(deserialize_with = "null_as_default")]
    pub channels: Vec<ReferenceItem>,
    #[serde(deserialize_with = "null_as_default")]
    pub machines: Vec<ReferenceItem>,
    #[serde(deserialize_with = "null_as_default")]
    pub actions: Vec<ReferenceItem>,
    #[serde(deserialize_with = "null_as_default")]
    pub roles: Vec<ReferenceItem>,
    #[serde(deserialize_with = "null_as_default")]
    pub tenant_tags: Vec<ReferenceItem>,
    #[serde(deserialize_with = "null_as_default")]
    pub processes: Vec<ProcessReferenceItem>,
}

impl ScopeValues {
    /// Reference items of one category.
    ///
    /// Process owners are converted to plain reference items.
    pub fn items(&self, category: ScopeCategory) -> Cow<'_, [ReferenceItem]> {
        match category {
            ScopeCategory::Process => {
                Cow::Owned(self.processes.iter().map(ReferenceItem::from).collect())
            }
            other => match self.reference_list(other) {
                Some(items) => Cow::Borrowed(items.as_slice()),
                None => Cow::Owned(Vec::new()),
            },
        }
    }

    /// True if every category is empty.
    pub fn is_empty(&self) -> bool {
        ScopeCategory::ALL
            .iter()
            .all(|category| self.items(*category).is_empty())
    }

    fn reference_list(&self, category: ScopeCategory) -> Option<&Vec<ReferenceItem>> {
        match category {
            ScopeCategory::Environment => Some(&self.environments),
            ScopeCategory::Channel => Some(&self.channels),
            ScopeCategory::Target => Some(&self.machines),
            ScopeCategory::Step => Some(&self.actions),
            ScopeCategory::Role => Some(&self.roles),
            ScopeCategory::Tag => Some(&self.tenant_tags),
            ScopeCategory::Process => None,
        }
    }

    fn reference_list_mut(&mut self, category: ScopeCategory) -> Option<&mut Vec<ReferenceItem>> {
        match category {
            ScopeCategory::Environment => Some(&mut self.environments),
            ScopeCategory::Channel => Some(&mut self.channels),
            ScopeCategory::Target => Some(&mut self.machines),
            ScopeCategory::Step => Some(&mut self.actions),
            ScopeCategory::Role => Some(&mut self.roles),
            ScopeCategory::Tag => Some(&mut self.tenant_tags),
            ScopeCategory::Process => None,
        }
    }
}

/// A variable's scope as the API stores it: reference IDs per category.
///
/// Empty categories are omitted on the wire. An all-empty scope means the
/// variable is unscoped.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ResolvedScope {
    #[serde(
        rename = "Environment",
        skip_serializing_if = "Vec::is_empty",
        deserialize_with = "null_as_default"
    )]
    pub environments: Vec<String>,
    #[serde(
        rename = "Channel",
        skip_serializing_if = "Vec::is_empty",
        deserialize_with = "null_as_default"
    )]
    pub channels: Vec<String>,
    #[serde(
        rename = "Machine",
        skip_serializing_if = "Vec::is_empty",
        deserialize_with = "null_as_default"
    )]
    pub machines: Vec<String>,
    #[serde(
        rename = "Action",
        skip_serializing_if = "Vec::is_empty",
        deserialize_with = "null_as_default"
    )]
    pub actions: Vec<String>,
    #[serde(
        rename = "Role",
        skip_serializing_if = "Vec::is_empty",
        deserialize_with = "null_as_default"
    )]
    pub roles: Vec<String>,
    #[serde(
        rename = "TenantTag",
        skip_serializing_if = "Vec::is_empty",
        deserialize_with = "null_as_default"
    )]
    pub tenant_tags: Vec<String>,
    #[serde(
        rename = "ProcessOwner",
        skip_serializing_if = "Vec::is_empty",
        deserialize_with = "null_as_default"
    )]
    pub process_owners: Vec<String>,
}

impl ResolvedScope {
    /// IDs for one category.
    pub fn ids(&self, category: ScopeCategory) -> &[String] {
        match category {
            ScopeCategory::Environment => &self.environments,
            ScopeCategory::Channel => &self.channels,
            ScopeCategory::Target => &self.machines,
            ScopeCategory::Step => &self.actions,
            ScopeCategory::Role => &self.roles,
            ScopeCategory::Tag => &self.tenant_tags,
            ScopeCategory::Process => &self.process_owners,
        }
    }

    /// Mutable IDs for one category.
    pub fn ids_mut(&mut self, category: ScopeCategory) -> &mut Vec<String> {
        match category {
            ScopeCategory::Environment => &mut self.environments,
            ScopeCategory::Channel => &mut self.channels,
            ScopeCategory::Target => &mut self.machines,
            ScopeCategory::Step => &mut self.actions,
            ScopeCategory::Role => &mut self.roles,
            ScopeCategory::Tag => &mut self.tenant_tags,
            ScopeCategory::Process => &mut self.process_owners,
        }
    }

    /// True if the scope has no IDs in any category.
    pub fn is_empty(&self) -> bool {
        ScopeCategory::ALL
            .iter()
            .all(|category| self.ids(*category).is_empty())
    }
}

/// How `project variable update` treats an existing scope when no scope
/// flags were given.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScopeUpdate {
    /// Keep the stored scope.
    Leave,
    /// Prompt for a new scope and replace the stored one.
    Replace,
    /// Remove every scope.
    Unscope,
}

impl ScopeUpdate {
    /// Choices in the order they are offered.
    pub const ALL: [ScopeUpdate; 3] = [ScopeUpdate::Leave, ScopeUpdate::Replace, ScopeUpdate::Unscope];

    pub fn label(self) -> &'static str {
        match self {
            ScopeUpdate::Leave => "Leave",
            ScopeUpdate::Replace => "Replace",
            ScopeUpdate::Unscope => "Unscope",
        }
    }
}

impl fmt::Display for ScopeUpdate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Resolve user-supplied scope values to reference IDs.
///
/// Each value must match the ID or Name of an entry in the same category,
/// ignoring case. Process values additionally match `"deployment"`, which
/// resolves to `project_id`. The first unmatched value aborts the whole
/// resolution.
pub fn resolve_outbound(
    input: &ScopeInput,
    catalog: &ScopeValues,
    project_id: &str,
) -> Result<ResolvedScope, ScopeError> {
    let mut scope = ResolvedScope::default();

    for (category, values) in input.iter() {
        let references = outbound_references(catalog, category, project_id);
        let ids = scope.ids_mut(category);
        for value in values {
            let item = find_reference(value, &references).ok_or_else(|| {
                ScopeError::UnknownValue {
                    category,
                    value: value.clone(),
                }
            })?;
            ids.push(item.id.clone());
        }
    }

    debug!(unscoped = scope.is_empty(), "resolved scope input");
    Ok(scope)
}

/// Look up the reference items behind a stored scope, for display.
///
/// IDs are matched against IDs only. An ID missing from the catalog is an
/// error.
pub fn resolve_inbound(
    stored: &ResolvedScope,
    catalog: &ScopeValues,
) -> Result<ScopeValues, ScopeError> {
    let mut values = ScopeValues::default();

    for category in ScopeCategory::ALL {
        let ids = stored.ids(category);
        if ids.is_empty() {
            continue;
        }

        if category == ScopeCategory::Process {
            for id in ids {
                let process = catalog
                    .processes
                    .iter()
                    .find(|p| equal_fold(id, &p.id))
                    .ok_or_else(|| ScopeError::UnknownId {
                        category,
                        id: id.clone(),
                    })?;
                values.processes.push(process.clone());
            }
            continue;
        }

        let items = catalog.items(category);
        if let Some(resolved) = values.reference_list_mut(category) {
            for id in ids {
                let item = items
                    .iter()
                    .find(|i| equal_fold(id, &i.id))
                    .ok_or_else(|| ScopeError::UnknownId {
                        category,
                        id: id.clone(),
                    })?;
                resolved.push(item.clone());
            }
        }
    }

    Ok(values)
}

/// Prompt for every category the user left empty.
///
/// A category is skipped when the input already has values for it, when the
/// catalog has nothing to offer, or when `is_prompted` is set and the
/// category is not allowed for prompted variables. Selected names are
/// written back into `input`.
pub fn prompt_scopes(
    prompter: &dyn Prompter,
    catalog: &ScopeValues,
    input: &mut ScopeInput,
    is_prompted: bool,
) -> Result<(), PromptError> {
    for category in ScopeCategory::ALL {
        if is_prompted && !category.allowed_for_prompted_variable() {
            continue;
        }
        if !input.get(category).is_empty() {
            continue;
        }

        let selected = prompt_scope(prompter, category, &catalog.items(category))?;
        input.set(category, selected);
    }
    Ok(())
}

/// Multi-select over the names of `items`. Returns nothing without asking if
/// `items` is empty.
pub fn prompt_scope(
    prompter: &dyn Prompter,
    category: ScopeCategory,
    items: &[ReferenceItem],
) -> Result<Vec<String>, PromptError> {
    if items.is_empty() {
        return Ok(Vec::new());
    }

    let options: Vec<String> = items.iter().map(|item| item.name.clone()).collect();
    prompter.multi_select(&format!("{} scope", category.label()), &options)
}

fn outbound_references<'a>(
    catalog: &'a ScopeValues,
    category: ScopeCategory,
    project_id: &str,
) -> Cow<'a, [ReferenceItem]> {
    if category != ScopeCategory::Process {
        return catalog.items(category);
    }

    let mut references: Vec<ReferenceItem> =
        catalog.processes.iter().map(ReferenceItem::from).collect();
    references.push(ReferenceItem::new(project_id, DEPLOYMENT_PROCESS_NAME));
    Cow::Owned(references)
}

fn find_reference<'a>(value: &str, items: &'a [ReferenceItem]) -> Option<&'a ReferenceItem> {
    items
        .iter()
        .find(|item| equal_fold(value, &item.id) || equal_fold(value, &item.name))
}

/// Case-insensitive comparison under simple (one character to one
/// character) case folding.
///
/// This is the matching rule for every name and ID lookup. Characters are
/// compared pairwise, so `ſ` matches `s` and the Kelvin sign matches `k`,
/// while `ß` never matches `ss`.
pub(crate) fn equal_fold(a: &str, b: &str) -> bool {
    if a == b {
        return true;
    }
    let mut left = a.chars();
    let mut right = b.chars();
    loop {
        match (left.next(), right.next()) {
            (None, None) => return true,
            (Some(x), Some(y)) if chars_fold(x, y) => {}
            _ => return false,
        }
    }
}

fn chars_fold(a: char, b: char) -> bool {
    a == b
        || single(a, a.to_lowercase()) == single(b, b.to_lowercase())
        || single(a, a.to_uppercase()) == single(b, b.to_uppercase())
}

/// The one-character case mapping, or `c` itself when the full mapping
/// expands to several characters.
fn single(c: char, mut mapped: impl Iterator<Item = char>) -> char {
    match (mapped.next(), mapped.next()) {
        (Some(m), None) => m,
        _ => c,
    }
}

/// Deserialize `null` as the type's default.
pub(crate) fn null_as_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Default + Deserialize<'de>,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}
