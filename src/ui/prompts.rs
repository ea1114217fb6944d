//! ui::prompts
//!
//! Interactive prompts and confirmations.
//!
//! # Design
//!
//! Prompts are only shown in interactive mode. In non-interactive mode,
//! operations requiring user input must either have defaults or fail
//! with a clear error message.
//!
//! Commands never talk to the terminal directly; they receive a
//! `&dyn Prompter`. [`TerminalPrompter`] renders prompts with `inquire`,
//! [`ScriptedPrompter`] replays canned answers in tests.

use std::collections::VecDeque;
use std::sync::Mutex;

use inquire::{Confirm, InquireError, MultiSelect, Password, PasswordDisplayMode, Select, Text};
use thiserror::Error;

/// Errors from prompts.
#[derive(Debug, Error)]
pub enum PromptError {
    #[error("prompt cancelled by user")]
    Cancelled,

    #[error("not in interactive mode")]
    NotInteractive,

    #[error("IO error: {0}")]
    IoError(String),
}

impl From<InquireError> for PromptError {
    fn from(err: InquireError) -> Self {
        match err {
            InquireError::OperationCanceled | InquireError::OperationInterrupted => {
                PromptError::Cancelled
            }
            InquireError::NotTTY => PromptError::NotInteractive,
            other => PromptError::IoError(other.to_string()),
        }
    }
}

/// Source of interactive answers.
pub trait Prompter: Send + Sync {
    /// Select any number of `options`. Returns the selected option strings.
    fn multi_select(&self, message: &str, options: &[String]) -> Result<Vec<String>, PromptError>;

    /// Select exactly one of `options`. Returns its index.
    fn select(&self, message: &str, options: &[String]) -> Result<usize, PromptError>;

    /// Yes/no question.
    fn confirm(&self, message: &str, default: bool) -> Result<bool, PromptError>;

    /// Free text, with an optional default.
    fn input(&self, message: &str, default: Option<&str>) -> Result<String, PromptError>;

    /// Masked text.
    fn password(&self, message: &str) -> Result<String, PromptError>;
}

/// Prompts rendered on the terminal.
#[derive(Debug, Default, Clone, Copy)]
pub struct TerminalPrompter;

impl Prompter for TerminalPrompter {
    fn multi_select(&self, message: &str, options: &[String]) -> Result<Vec<String>, PromptError> {
        Ok(MultiSelect::new(message, options.to_vec()).prompt()?)
    }

    fn select(&self, message: &str, options: &[String]) -> Result<usize, PromptError> {
        let choice = Select::new(message, options.to_vec()).raw_prompt()?;
        Ok(choice.index)
    }

    fn confirm(&self, message: &str, default: bool) -> Result<bool, PromptError> {
        Ok(Confirm::new(message).with_default(default).prompt()?)
    }

    fn input(&self, message: &str, default: Option<&str>) -> Result<String, PromptError> {
        let mut text = Text::new(message);
        if let Some(default) = default {
            text = text.with_default(default);
        }
        Ok(text.prompt()?)
    }

    fn password(&self, message: &str) -> Result<String, PromptError> {
        Ok(Password::new(message)
            .without_confirmation()
            .with_display_mode(PasswordDisplayMode::Masked)
            .prompt()?)
    }
}

/// A canned answer for [`ScriptedPrompter`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Answer {
    /// Answer to `multi_select`.
    Selection(Vec<String>),
    /// Answer to `select`, by option text.
    Choice(String),
    /// Answer to `confirm`.
    Confirm(bool),
    /// Answer to `input` or `password`.
    Text(String),
}

/// Replays queued answers in order and records every prompt message.
///
/// Running out of answers, or receiving an answer of the wrong kind, is
/// reported as an IO error naming the prompt.
#[derive(Debug, Default)]
pub struct ScriptedPrompter {
    answers: Mutex<VecDeque<Answer>>,
    asked: Mutex<Vec<String>>,
}

impl ScriptedPrompter {
    pub fn new(answers: impl IntoIterator<Item = Answer>) -> Self {
        Self {
            answers: Mutex::new(answers.into_iter().collect()),
            asked: Mutex::new(Vec::new()),
        }
    }

    /// Messages asked so far, in order.
    pub fn asked(&self) -> Vec<String> {
        self.asked.lock().unwrap().clone()
    }

    /// Number of answers not yet consumed.
    pub fn remaining(&self) -> usize {
        self.answers.lock().unwrap().len()
    }

    fn next(&self, message: &str) -> Result<Answer, PromptError> {
        self.asked.lock().unwrap().push(message.to_string());
        self.answers
            .lock()
            .unwrap()
            .pop_front()
            .ok_or_else(|| PromptError::IoError(format!("no scripted answer for '{}'", message)))
    }
}

fn unexpected(message: &str, answer: &Answer) -> PromptError {
    PromptError::IoError(format!(
        "unexpected scripted answer {:?} for '{}'",
        answer, message
    ))
}

impl Prompter for ScriptedPrompter {
    fn multi_select(&self, message: &str, _options: &[String]) -> Result<Vec<String>, PromptError> {
        match self.next(message)? {
            Answer::Selection(selected) => Ok(selected),
            other => Err(unexpected(message, &other)),
        }
    }

    fn select(&self, message: &str, options: &[String]) -> Result<usize, PromptError> {
        match self.next(message)? {
            Answer::Choice(choice) => options
                .iter()
                .position(|option| *option == choice)
                .ok_or_else(|| {
                    PromptError::IoError(format!("'{}' is not an option for '{}'", choice, message))
                }),
            other => Err(unexpected(message, &other)),
        }
    }

    fn confirm(&self, message: &str, _default: bool) -> Result<bool, PromptError> {
        match self.next(message)? {
            Answer::Confirm(value) => Ok(value),
            other => Err(unexpected(message, &other)),
        }
    }

    fn input(&self, message: &str, _default: Option<&str>) -> Result<String, PromptError> {
        match self.next(message)? {
            Answer::Text(text) => Ok(text),
            other => Err(unexpected(message, &other)),
        }
    }

    fn password(&self, message: &str) -> Result<String, PromptError> {
        self.input(message, None)
    }
}
