//! Asking the operator questions before changing anything.

use dialoguer::{Confirm, Input};

use crate::utils::error::{SwapError, SwapResult};

/// Something that can answer questions, usually a person at a terminal.
pub trait Prompter {
    /// Asks a yes/no question.
    fn confirm(&self, prompt: &str, default: bool) -> SwapResult<bool>;

    /// Asks for a line of text.
    fn input(&self, prompt: &str) -> SwapResult<String>;
}

/// Asks on the terminal.
#[derive(Debug, Default)]
pub struct TerminalPrompter;

impl Prompter for TerminalPrompter {
    fn confirm(&self, prompt: &str, default: bool) -> SwapResult<bool> {
        Confirm::new()
            .with_prompt(prompt)
            .default(default)
            .interact()
            .map_err(|err| SwapError::Prompt(err.to_string().into()))
    }

    fn input(&self, prompt: &str) -> SwapResult<String> {
        Input::<String>::new()
            .with_prompt(prompt)
            .interact_text()
            .map_err(|err| SwapError::Prompt(err.to_string().into()))
    }
}

/// Answers every question with its default, for unattended runs.
#[derive(Debug, Default)]
pub struct AssumeYes;

impl Prompter for AssumeYes {
    fn confirm(&self, _prompt: &str, default: bool) -> SwapResult<bool> {
        Ok(default)
    }

    fn input(&self, prompt: &str) -> SwapResult<String> {
        Err(SwapError::Prompt(
            format!("'{prompt}' needs an answer, but nobody is there to give one").into(),
        ))
    }
}
