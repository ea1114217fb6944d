//! Octopus CLI - a command-line client for Octopus Deploy project variables
//!
//! Lists, views, creates, updates and deletes the variables of an Octopus
//! Deploy project. Scopes are given by name on the command line and resolved
//! against the project's scope catalog before anything is sent to the server.
//!
//! # Architecture
//!
//! - [`cli`] - Argument parsing, global context and command handlers
//! - [`core`] - Variable and scope domain types, configuration
//! - [`api`] - Octopus REST API abstraction, HTTP client and mock
//! - [`secrets`] - API key storage
//! - [`ui`] - Prompts and output formatting

pub mod api;
pub mod cli;
pub mod core;
pub mod secrets;
pub mod ui;
