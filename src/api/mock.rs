//! api::mock
//!
//! In-memory `OctopusApi` for deterministic testing.
//!
//! # Design
//!
//! Holds projects and their variable sets in memory, records every call,
//! and can be told to fail a given operation. Clones share state, so a test
//! can hand one clone to a command and inspect the other afterwards.
//!
//! # Example
//!
//! ```
//! use octopus_cli::api::mock::MockApi;
//! use octopus_cli::api::OctopusApi;
//! use octopus_cli::core::variables::{Project, VariableSet};
//!
//! # tokio_test::block_on(async {
//! let project = Project {
//!     id: "Projects-1".to_string(),
//!     name: "Deploy Website".to_string(),
//!     slug: "deploy-website".to_string(),
//!     variable_set_id: "variableset-Projects-1".to_string(),
//!     ..Default::default()
//! };
//! let api = MockApi::new().with_project(project, VariableSet::default());
//!
//! let found = api.get_project("deploy website").await.unwrap();
//! assert_eq!(found.id, "Projects-1");
//! # });
//! ```

use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use super::traits::{ApiError, OctopusApi};
use crate::core::scope::equal_fold;
use crate::core::variables::{
    LibraryVariableSet, NamedResource, Project, Space, VariableSet, LIBRARY_VARIABLES_CONTENT_TYPE,
};

/// Host reported by the mock.
pub const MOCK_HOST: &str = "https://octopus.test";

/// Space the mock is bound to.
pub const MOCK_SPACE_ID: &str = "Spaces-1";

/// Mock API for testing.
#[derive(Debug, Clone, Default)]
pub struct MockApi {
    inner: Arc<Mutex<MockApiInner>>,
}

#[derive(Debug, Default)]
struct MockApiInner {
    projects: Vec<Project>,
    /// Keyed by project ID and git ref (`None` for database-backed sets).
    variable_sets: HashMap<(String, Option<String>), VariableSet>,
    library_variable_sets: Vec<LibraryVariableSet>,
    accounts: Vec<(String, NamedResource)>,
    worker_pools: Vec<NamedResource>,
    certificates: Vec<NamedResource>,
    next_variable_id: u64,
    fail_on: Option<FailOn>,
    operations: Vec<MockOperation>,
}

/// Configuration for which operation should fail.
#[derive(Debug, Clone)]
pub enum FailOn {
    ListSpaces(ApiError),
    ListProjects(ApiError),
    GetProject(ApiError),
    UpdateProject(ApiError),
    ListLibraryVariableSets(ApiError),
    GetVariables(ApiError),
    UpdateVariables(ApiError),
    ListAccounts(ApiError),
    ListWorkerPools(ApiError),
    ListCertificates(ApiError),
}

/// Recorded operation for test verification.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MockOperation {
    ListSpaces,
    ListProjects,
    GetProject {
        identifier: String,
    },
    UpdateProject {
        project_id: String,
    },
    ListLibraryVariableSets,
    GetVariables {
        project_id: String,
        git_ref: Option<String>,
    },
    UpdateVariables {
        project_id: String,
        git_ref: Option<String>,
        count: usize,
    },
    ListAccounts {
        account_type: String,
    },
    ListWorkerPools,
    ListCertificates,
}

impl MockApi {
    /// Create an empty mock.
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a project and its database-backed variable set.
    pub fn with_project(self, project: Project, variables: VariableSet) -> Self {
        {
            let mut inner = self.inner.lock().unwrap();
            inner
                .variable_sets
                .insert((project.id.clone(), None), variables);
            inner.projects.push(project);
        }
        self
    }

    /// Add a variable set stored on a git ref of a version-controlled project.
    pub fn with_git_variables(self, project_id: &str, git_ref: &str, variables: VariableSet) -> Self {
        self.inner
            .lock()
            .unwrap()
            .variable_sets
            .insert((project_id.to_string(), Some(git_ref.to_string())), variables);
        self
    }

    /// Add a library variable set. Only sets with the `Variables` content
    /// type are listed.
    pub fn with_library_variable_set(self, set: LibraryVariableSet) -> Self {
        self.inner.lock().unwrap().library_variable_sets.push(set);
        self
    }

    pub fn with_account(self, account_type: &str, account: NamedResource) -> Self {
        self.inner
            .lock()
            .unwrap()
            .accounts
            .push((account_type.to_string(), account));
        self
    }

    pub fn with_worker_pool(self, pool: NamedResource) -> Self {
        self.inner.lock().unwrap().worker_pools.push(pool);
        self
    }

    pub fn with_certificate(self, certificate: NamedResource) -> Self {
        self.inner.lock().unwrap().certificates.push(certificate);
        self
    }

    /// Configure the mock to fail on a specific operation.
    pub fn fail_on(self, fail_on: FailOn) -> Self {
        self.inner.lock().unwrap().fail_on = Some(fail_on);
        self
    }

    /// Get all recorded operations.
    pub fn operations(&self) -> Vec<MockOperation> {
        self.inner.lock().unwrap().operations.clone()
    }

    /// Current state of a project.
    pub fn project(&self, project_id: &str) -> Option<Project> {
        self.inner
            .lock()
            .unwrap()
            .projects
            .iter()
            .find(|p| p.id == project_id)
            .cloned()
    }

    /// Current database-backed variable set of a project.
    pub fn variables(&self, project_id: &str) -> Option<VariableSet> {
        self.inner
            .lock()
            .unwrap()
            .variable_sets
            .get(&(project_id.to_string(), None))
            .cloned()
    }

    /// Current variable set of a project on a git ref.
    pub fn git_variables(&self, project_id: &str, git_ref: &str) -> Option<VariableSet> {
        self.inner
            .lock()
            .unwrap()
            .variable_sets
            .get(&(project_id.to_string(), Some(git_ref.to_string())))
            .cloned()
    }

    /// Record the call, then fail if configured to.
    fn record(&self, operation: MockOperation) -> Result<(), ApiError> {
        let mut inner = self.inner.lock().unwrap();
        let failure = match (&inner.fail_on, &operation) {
            (Some(FailOn::ListSpaces(e)), MockOperation::ListSpaces)
            | (Some(FailOn::ListProjects(e)), MockOperation::ListProjects)
            | (Some(FailOn::GetProject(e)), MockOperation::GetProject { .. })
            | (Some(FailOn::UpdateProject(e)), MockOperation::UpdateProject { .. })
            | (Some(FailOn::ListLibraryVariableSets(e)), MockOperation::ListLibraryVariableSets)
            | (Some(FailOn::GetVariables(e)), MockOperation::GetVariables { .. })
            | (Some(FailOn::UpdateVariables(e)), MockOperation::UpdateVariables { .. })
            | (Some(FailOn::ListAccounts(e)), MockOperation::ListAccounts { .. })
            | (Some(FailOn::ListWorkerPools(e)), MockOperation::ListWorkerPools)
            | (Some(FailOn::ListCertificates(e)), MockOperation::ListCertificates) => {
                Some(e.clone())
            }
            _ => None,
        };
        inner.operations.push(operation);
        match failure {
            Some(e) => Err(e),
            None => Ok(()),
        }
    }
}

fn set_key(project: &Project, git_ref: Option<&str>) -> (String, Option<String>) {
    let git_ref = git_ref
        .filter(|r| !r.is_empty() && project.is_version_controlled)
        .map(str::to_string);
    (project.id.clone(), git_ref)
}

#[async_trait]
impl OctopusApi for MockApi {
    fn host(&self) -> &str {
        MOCK_HOST
    }

    fn space_id(&self) -> &str {
        MOCK_SPACE_ID
    }

    async fn list_spaces(&self) -> Result<Vec<Space>, ApiError> {
        self.record(MockOperation::ListSpaces)?;
        Ok(vec![Space {
            id: MOCK_SPACE_ID.to_string(),
            name: "Default".to_string(),
            is_default: true,
        }])
    }

    async fn list_projects(&self) -> Result<Vec<Project>, ApiError> {
        self.record(MockOperation::ListProjects)?;
        Ok(self.inner.lock().unwrap().projects.clone())
    }

    async fn get_project(&self, identifier: &str) -> Result<Project, ApiError> {
        self.record(MockOperation::GetProject {
            identifier: identifier.to_string(),
        })?;
        let inner = self.inner.lock().unwrap();
        inner
            .projects
            .iter()
            .find(|p| {
                equal_fold(&p.id, identifier)
                    || equal_fold(&p.name, identifier)
                    || equal_fold(&p.slug, identifier)
            })
            .cloned()
            .ok_or_else(|| ApiError::ProjectNotFound(identifier.to_string()))
    }

    async fn update_project(&self, project: &Project) -> Result<Project, ApiError> {
        self.record(MockOperation::UpdateProject {
            project_id: project.id.clone(),
        })?;
        let mut inner = self.inner.lock().unwrap();
        let stored = inner
            .projects
            .iter_mut()
            .find(|p| p.id == project.id)
            .ok_or_else(|| ApiError::NotFound(format!("project {}", project.id)))?;
        *stored = project.clone();
        Ok(stored.clone())
    }

    async fn list_library_variable_sets(&self) -> Result<Vec<LibraryVariableSet>, ApiError> {
        self.record(MockOperation::ListLibraryVariableSets)?;
        Ok(self
            .inner
            .lock()
            .unwrap()
            .library_variable_sets
            .iter()
            .filter(|s| s.content_type == LIBRARY_VARIABLES_CONTENT_TYPE)
            .cloned()
            .collect())
    }

    async fn get_variables(
        &self,
        project: &Project,
        git_ref: Option<&str>,
    ) -> Result<VariableSet, ApiError> {
        let key = set_key(project, git_ref);
        self.record(MockOperation::GetVariables {
            project_id: key.0.clone(),
            git_ref: key.1.clone(),
        })?;
        self.inner
            .lock()
            .unwrap()
            .variable_sets
            .get(&key)
            .cloned()
            .ok_or_else(|| ApiError::NotFound(format!("variables of {}", project.id)))
    }

    async fn update_variables(
        &self,
        project: &Project,
        git_ref: Option<&str>,
        set: &VariableSet,
    ) -> Result<VariableSet, ApiError> {
        let key = set_key(project, git_ref);
        self.record(MockOperation::UpdateVariables {
            project_id: key.0.clone(),
            git_ref: key.1.clone(),
            count: set.variables.len(),
        })?;

        let mut inner = self.inner.lock().unwrap();
        let mut stored = set.clone();
        stored.version += 1;
        for variable in stored.variables.iter_mut().filter(|v| v.id.is_empty()) {
            inner.next_variable_id += 1;
            variable.id = format!("variable-{}", inner.next_variable_id);
        }
        inner.variable_sets.insert(key, stored.clone());
        Ok(stored)
    }

    async fn list_accounts(&self, account_type: &str) -> Result<Vec<NamedResource>, ApiError> {
        self.record(MockOperation::ListAccounts {
            account_type: account_type.to_string(),
        })?;
        Ok(self
            .inner
            .lock()
            .unwrap()
            .accounts
            .iter()
            .filter(|(t, _)| t == account_type)
            .map(|(_, a)| a.clone())
            .collect())
    }

    async fn list_worker_pools(&self) -> Result<Vec<NamedResource>, ApiError> {
        self.record(MockOperation::ListWorkerPools)?;
        Ok(self.inner.lock().unwrap().worker_pools.clone())
    }

    async fn list_certificates(&self) -> Result<Vec<NamedResource>, ApiError> {
        self.record(MockOperation::ListCertificates)?;
        Ok(self.inner.lock().unwrap().certificates.clone())
    }
}
