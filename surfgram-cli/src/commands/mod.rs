//! Command handlers and the single place their results are presented.

mod delete;
mod new;
mod run;

use std::io;
use std::process::ExitCode;

use tracing::error;

use crate::cli::Commands;
use crate::console::Console;
use crate::interrupt::{Interrupts, CANCELLED};

pub use delete::delete;
pub use new::new;
pub use run::run;

/// What a command reports when it does not fail.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Outcome {
    Success(String),
    Cancelled(String),
    /// Nothing to report, e.g. the bot exited on its own.
    Finished,
}

pub async fn execute(
    command: Commands,
    console: &Console,
    interrupts: &Interrupts,
) -> anyhow::Result<Outcome> {
    match command {
        Commands::New { bot_name, .. } => new(&bot_name, console),
        Commands::Delete { bot_name, .. } => delete(&bot_name, console),
        Commands::Run(args) => run(args, console, interrupts).await,
    }
}

/// True when the error comes from the operator interrupting a prompt or the bot.
pub fn is_interrupted(err: &anyhow::Error) -> bool {
    err.chain().any(|cause| {
        cause
            .downcast_ref::<io::Error>()
            .is_some_and(|e| e.kind() == io::ErrorKind::Interrupted)
    })
}

/// Prints the outcome and maps it to the process exit code.
pub fn present(
    console: &Console,
    operation: &str,
    full_trace: bool,
    result: anyhow::Result<Outcome>,
) -> ExitCode {
    if report(console, operation, full_trace, result) {
        ExitCode::SUCCESS
    } else {
        ExitCode::FAILURE
    }
}

/// Prints the outcome; `false` when the command failed.
fn report(
    console: &Console,
    operation: &str,
    full_trace: bool,
    result: anyhow::Result<Outcome>,
) -> bool {
    match result {
        Ok(Outcome::Success(message)) => {
            console.success(&message);
            true
        }
        Ok(Outcome::Cancelled(message)) => {
            console.cancel(&message);
            true
        }
        Ok(Outcome::Finished) => true,
        Err(err) if is_interrupted(&err) => {
            console.cancel(CANCELLED);
            true
        }
        Err(err) => {
            error!(operation, error = %format!("{:#}", err), "Command failed");
            console.error(operation, &err, full_trace);
            false
        }
    }
}
