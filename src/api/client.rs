//! api::client
//!
//! `OctopusApi` over HTTP.
//!
//! # Authentication
//!
//! Every request carries the API key in the `X-Octopus-ApiKey` header. The
//! key never appears in logs or in `Debug` output.
//!
//! # Errors
//!
//! - 401/403 map to [`ApiError::AuthFailed`]
//! - 404 maps to [`ApiError::NotFound`]
//! - other failures map to [`ApiError::Api`] with the server's
//!   `ErrorMessage` and `Errors`
//! - transport failures map to [`ApiError::Network`]
//!
//! There is no retry; a failed request fails the command.

use async_trait::async_trait;
use reqwest::header::{HeaderMap, HeaderName, HeaderValue, ACCEPT, USER_AGENT};
use reqwest::{Client, RequestBuilder, Response, StatusCode};
use serde::de::DeserializeOwned;
use serde::Deserialize;
use tracing::debug;
use url::Url;

use super::traits::{ApiError, OctopusApi};
use crate::core::scope::equal_fold;
use crate::core::variables::{
    LibraryVariableSet, NamedResource, Project, Space, VariableSet, LIBRARY_VARIABLES_CONTENT_TYPE,
};

/// Header carrying the API key.
pub const API_KEY_HEADER: &str = "X-Octopus-ApiKey";

const USER_AGENT_VALUE: &str = concat!("octopus-cli/", env!("CARGO_PKG_VERSION"));

/// HTTP client bound to one server and space.
#[derive(Clone)]
pub struct OctopusClient {
    client: Client,
    base: Url,
    host: String,
    space_id: String,
}

// The API key lives in the client's default headers; keep it out of Debug.
impl std::fmt::Debug for OctopusClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("OctopusClient")
            .field("host", &self.host)
            .field("space_id", &self.space_id)
            .finish()
    }
}

/// Error body returned by the server.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "PascalCase")]
struct ErrorBody {
    #[serde(default)]
    error_message: Option<String>,
    #[serde(default)]
    errors: Option<Vec<String>>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "PascalCase")]
struct AccountResource {
    id: String,
    name: String,
    #[serde(default)]
    account_type: String,
}

impl OctopusClient {
    /// Client for a known space ID. Makes no request.
    pub fn new(host: &str, api_key: &str, space_id: impl Into<String>) -> Result<Self, ApiError> {
        let base = Url::parse(host)
            .map_err(|e| ApiError::Network(format!("invalid host '{}': {}", host, e)))?;

        let mut headers = HeaderMap::new();
        let mut key = HeaderValue::from_str(api_key)
            .map_err(|_| ApiError::AuthFailed("API key contains invalid characters".into()))?;
        key.set_sensitive(true);
        headers.insert(HeaderName::from_static("x-octopus-apikey"), key);
        headers.insert(ACCEPT, HeaderValue::from_static("application/json"));
        headers.insert(USER_AGENT, HeaderValue::from_static(USER_AGENT_VALUE));

        let client = Client::builder()
            .default_headers(headers)
            .build()
            .map_err(|e| ApiError::Network(e.to_string()))?;

        Ok(Self {
            client,
            base,
            host: host.trim_end_matches('/').to_string(),
            space_id: space_id.into(),
        })
    }

    /// Connect and resolve `space` (name or ID) to its ID.
    ///
    /// With no space, the server's default space is used.
    pub async fn connect(host: &str, api_key: &str, space: Option<&str>) -> Result<Self, ApiError> {
        let mut client = Self::new(host, api_key, String::new())?;
        let spaces = client.list_spaces().await?;

        let found = match space {
            Some(wanted) => spaces
                .into_iter()
                .find(|s| equal_fold(&s.id, wanted) || equal_fold(&s.name, wanted))
                .ok_or_else(|| ApiError::SpaceNotFound(wanted.to_string()))?,
            None => spaces
                .into_iter()
                .find(|s| s.is_default)
                .ok_or_else(|| ApiError::SpaceNotFound("default".to_string()))?,
        };

        debug!(space_id = %found.id, space = %found.name, "resolved space");
        client.space_id = found.id;
        Ok(client)
    }

    /// URL for `/api/<segments...>`. Segments are percent-encoded, so a git
    /// ref such as `refs/heads/main` stays one segment.
    fn endpoint(&self, segments: &[&str]) -> Result<Url, ApiError> {
        let mut url = self.base.clone();
        url.path_segments_mut()
            .map_err(|_| ApiError::Network(format!("invalid host '{}'", self.host)))?
            .pop_if_empty()
            .push("api")
            .extend(segments);
        Ok(url)
    }

    fn space_endpoint(&self, segments: &[&str]) -> Result<Url, ApiError> {
        let mut all = Vec::with_capacity(segments.len() + 1);
        all.push(self.space_id.as_str());
        all.extend_from_slice(segments);
        self.endpoint(&all)
    }

    fn variables_endpoint(&self, project: &Project, git_ref: Option<&str>) -> Result<Url, ApiError> {
        match git_ref.filter(|r| !r.is_empty() && project.is_version_controlled) {
            Some(git_ref) => {
                self.space_endpoint(&["projects", &project.id, git_ref, "variables"])
            }
            None => self.space_endpoint(&["variables", &project.variable_set_id]),
        }
    }

    async fn get<T: DeserializeOwned>(&self, url: Url) -> Result<T, ApiError> {
        debug!(method = "GET", url = %url, "octopus request");
        self.send(self.client.get(url)).await
    }

    async fn send<T: DeserializeOwned>(&self, request: RequestBuilder) -> Result<T, ApiError> {
        let response = request
            .send()
            .await
            .map_err(|e| ApiError::Network(e.to_string()))?;
        let status = response.status();
        debug!(status = status.as_u16(), "octopus response");

        if status.is_success() {
            response.json().await.map_err(|e| ApiError::Api {
                status: status.as_u16(),
                message: format!("failed to parse response: {}", e),
            })
        } else {
            Err(error_from_response(response, status).await)
        }
    }
}

async fn error_from_response(response: Response, status: StatusCode) -> ApiError {
    let path = response.url().path().to_string();
    let message = match response.json::<ErrorBody>().await {
        Ok(body) => {
            let mut message = body.error_message.unwrap_or_default();
            let details = body.errors.unwrap_or_default();
            if !details.is_empty() {
                if !message.is_empty() {
                    message.push_str(": ");
                }
                message.push_str(&details.join("; "));
            }
            message
        }
        Err(_) => String::new(),
    };

    match status {
        StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => ApiError::AuthFailed(if message.is_empty() {
            "invalid or missing API key".to_string()
        } else {
            message
        }),
        StatusCode::NOT_FOUND => ApiError::NotFound(if message.is_empty() { path } else { message }),
        _ => ApiError::Api {
            status: status.as_u16(),
            message: if message.is_empty() {
                status
                    .canonical_reason()
                    .unwrap_or("unknown error")
                    .to_string()
            } else {
                message
            },
        },
    }
}

#[async_trait]
impl OctopusApi for OctopusClient {
    fn host(&self) -> &str {
        &self.host
    }

    fn space_id(&self) -> &str {
        &self.space_id
    }

    async fn list_spaces(&self) -> Result<Vec<Space>, ApiError> {
        self.get(self.endpoint(&["spaces", "all"])?).await
    }

    async fn list_projects(&self) -> Result<Vec<Project>, ApiError> {
        self.get(self.space_endpoint(&["projects", "all"])?).await
    }

    async fn get_project(&self, identifier: &str) -> Result<Project, ApiError> {
        match self.get(self.space_endpoint(&["projects", identifier])?).await {
            Ok(project) => Ok(project),
            Err(ApiError::NotFound(_)) => {
                debug!(identifier, "project lookup by id failed, searching by name");
                self.list_projects()
                    .await?
                    .into_iter()
                    .find(|p| equal_fold(&p.name, identifier) || equal_fold(&p.slug, identifier))
                    .ok_or_else(|| ApiError::ProjectNotFound(identifier.to_string()))
            }
            Err(e) => Err(e),
        }
    }

    async fn update_project(&self, project: &Project) -> Result<Project, ApiError> {
        let url = self.space_endpoint(&["projects", &project.id])?;
        debug!(method = "PUT", url = %url, "octopus request");
        self.send(self.client.put(url).json(project)).await
    }

    async fn list_library_variable_sets(&self) -> Result<Vec<LibraryVariableSet>, ApiError> {
        let sets: Vec<LibraryVariableSet> = self
            .get(self.space_endpoint(&["libraryvariablesets", "all"])?)
            .await?;
        Ok(sets
            .into_iter()
            .filter(|s| s.content_type == LIBRARY_VARIABLES_CONTENT_TYPE)
            .collect())
    }

    async fn get_variables(
        &self,
        project: &Project,
        git_ref: Option<&str>,
    ) -> Result<VariableSet, ApiError> {
        self.get(self.variables_endpoint(project, git_ref)?).await
    }

    async fn update_variables(
        &self,
        project: &Project,
        git_ref: Option<&str>,
        set: &VariableSet,
    ) -> Result<VariableSet, ApiError> {
        let url = self.variables_endpoint(project, git_ref)?;
        debug!(method = "PUT", url = %url, count = set.variables.len(), "octopus request");
        self.send(self.client.put(url).json(set)).await
    }

    async fn list_accounts(&self, account_type: &str) -> Result<Vec<NamedResource>, ApiError> {
        let accounts: Vec<AccountResource> =
            self.get(self.space_endpoint(&["accounts", "all"])?).await?;
        Ok(accounts
            .into_iter()
            .filter(|a| a.account_type == account_type)
            .map(|a| NamedResource {
                id: a.id,
                name: a.name,
            })
            .collect())
    }

    async fn list_worker_pools(&self) -> Result<Vec<NamedResource>, ApiError> {
        self.get(self.space_endpoint(&["workerpools", "all"])?).await
    }

    async fn list_certificates(&self) -> Result<Vec<NamedResource>, ApiError> {
        self.get(self.space_endpoint(&["certificates", "all"])?).await
    }
}
