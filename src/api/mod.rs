//! api
//!
//! Client for the Octopus Deploy REST API.
//!
//! # Architecture
//!
//! Commands talk to the server through the [`OctopusApi`] trait and never
//! import a concrete client:
//!
//! - [`client`]: [`OctopusClient`], the `reqwest` implementation
//! - [`mock`]: [`MockApi`](mock::MockApi), an in-memory implementation for
//!   deterministic tests
//!
//! A client is bound to one server and one space for its lifetime; the
//! space is resolved once, when the client connects.
//!
//! # Example
//!
//! ```ignore
//! use octopus_cli::api::{OctopusApi, OctopusClient};
//!
//! let api = OctopusClient::connect("https://example.octopus.app", &api_key, Some("Default")).await?;
//! let project = api.get_project("Deploy Website").await?;
//! let set = api.get_variables(&project, None).await?;
//! println!("{} variables", set.variables.len());
//! ```

pub mod client;
pub mod mock;
mod traits;

pub use client::OctopusClient;
pub use traits::{ApiError, OctopusApi};
