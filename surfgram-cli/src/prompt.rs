//! Interactive prompts (dialoguer). Failures, including an interrupted prompt, surface as
//! `io::Error` so callers can tell a cancellation from a real error.

use std::io;

use dialoguer::{Confirm, Input, Password};
use surfgram_config::ConfigSelector;

use crate::console::Console;

fn into_io(err: dialoguer::Error) -> io::Error {
    match err {
        dialoguer::Error::IO(e) => e,
        #[allow(unreachable_patterns)]
        other => io::Error::other(other.to_string()),
    }
}

/// Hidden input.
pub fn secret(prompt: &str) -> io::Result<String> {
    Password::new().with_prompt(prompt).interact().map_err(into_io)
}

pub fn confirm(prompt: &str, default: bool) -> io::Result<bool> {
    Confirm::new()
        .with_prompt(prompt)
        .default(default)
        .interact()
        .map_err(into_io)
}

/// Lists the candidates and reads a 1-based number from the terminal.
pub struct PromptSelector<'a> {
    console: &'a Console,
}

impl<'a> PromptSelector<'a> {
    pub fn new(console: &'a Console) -> Self {
        Self { console }
    }
}

impl ConfigSelector for PromptSelector<'_> {
    fn select(&mut self, module: &str, candidates: &[String]) -> io::Result<String> {
        self.console
            .notice(&format!("Multiple configs found in {}:", module));
        for (i, candidate) in candidates.iter().enumerate() {
            self.console.notice(&format!("{}. {}", i + 1, candidate));
        }
        Input::<String>::new()
            .with_prompt("Select config (number)")
            .interact_text()
            .map_err(into_io)
    }
}
