//! api::traits
//!
//! The `OctopusApi` trait and its error type.
//!
//! # Design
//!
//! The trait is async because every operation is a network round trip.
//! Variable sets are read and written whole: callers fetch a set, change
//! it, and pass it back to [`OctopusApi::update_variables`].

use async_trait::async_trait;
use thiserror::Error;

use crate::core::variables::{LibraryVariableSet, NamedResource, Project, Space, VariableSet};

/// Errors from API operations.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum ApiError {
    /// The API key was rejected or lacks permission.
    #[error("authentication failed: {0}")]
    AuthFailed(String),

    /// The requested resource does not exist.
    #[error("not found: {0}")]
    NotFound(String),

    /// No space matched the configured name or ID.
    #[error("cannot find space '{0}'")]
    SpaceNotFound(String),

    /// No project matched by ID, name or slug.
    #[error("cannot find project '{0}'")]
    ProjectNotFound(String),

    /// The server returned an error.
    #[error("API error: {status} - {message}")]
    Api {
        /// HTTP status code
        status: u16,
        /// `ErrorMessage` and `Errors` from the response body
        message: String,
    },

    /// The request never produced a response.
    #[error("network error: {0}")]
    Network(String),
}

/// Operations against one space of an Octopus server.
#[async_trait]
pub trait OctopusApi: Send + Sync {
    /// Server URL without a trailing slash.
    fn host(&self) -> &str;

    /// ID of the space this client is bound to.
    fn space_id(&self) -> &str;

    /// Every space on the server.
    async fn list_spaces(&self) -> Result<Vec<Space>, ApiError>;

    /// Every project in the space.
    async fn list_projects(&self) -> Result<Vec<Project>, ApiError>;

    /// A project by ID or slug, falling back to a case-insensitive match on
    /// name or slug.
    ///
    /// # Errors
    ///
    /// [`ApiError::ProjectNotFound`] if nothing matches.
    async fn get_project(&self, identifier: &str) -> Result<Project, ApiError>;

    /// Replace the project document. Returns the stored project.
    ///
    /// The project should come from [`get_project`](Self::get_project) so
    /// fields this client does not model are sent back unchanged.
    async fn update_project(&self, project: &Project) -> Result<Project, ApiError>;

    /// Library variable sets holding variables. Script modules are left out.
    async fn list_library_variable_sets(&self) -> Result<Vec<LibraryVariableSet>, ApiError>;

    /// The project's variable set.
    ///
    /// `git_ref` selects a branch or tag of a version-controlled project and
    /// is ignored for database-backed projects.
    async fn get_variables(
        &self,
        project: &Project,
        git_ref: Option<&str>,
    ) -> Result<VariableSet, ApiError>;

    /// Replace the project's variable set. Returns the stored set.
    async fn update_variables(
        &self,
        project: &Project,
        git_ref: Option<&str>,
        set: &VariableSet,
    ) -> Result<VariableSet, ApiError>;

    /// Accounts of the given `AccountType`.
    async fn list_accounts(&self, account_type: &str) -> Result<Vec<NamedResource>, ApiError>;

    async fn list_worker_pools(&self) -> Result<Vec<NamedResource>, ApiError>;

    async fn list_certificates(&self) -> Result<Vec<NamedResource>, ApiError>;

    /// Web page listing the project's variables.
    fn variables_web_url(&self, project: &Project) -> String {
        let slug = if project.slug.is_empty() {
            &project.id
        } else {
            &project.slug
        };
        format!(
            "{}/app#/{}/projects/{}/variables",
            self.host(),
            self.space_id(),
            slug
        )
    }
}
