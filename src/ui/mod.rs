//! ui
//!
//! User interaction utilities.
//!
//! # Modules
//!
//! - [`prompts`] - Interactive prompts behind the [`prompts::Prompter`] trait
//! - [`output`] - Output formats, tables and automation commands
//!
//! All output and prompts go through this module so interactive and
//! non-interactive runs format the same way.

pub mod output;
pub mod prompts;
