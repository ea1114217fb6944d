//! core
//!
//! Domain types for Octopus project variables.
//!
//! # Modules
//!
//! - [`variables`] - Variables, variable sets, prompts and projects
//! - [`scope`] - Scope categories and name/ID resolution against a catalog
//! - [`config`] - Configuration schema and loading

pub mod config;
pub mod scope;
pub mod variables;
