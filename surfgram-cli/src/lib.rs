//! Surfgram CLI: `new` scaffolds a bot project, `delete` removes one and `run` discovers the
//! project's config, materializes it and runs the bot, optionally re-executing on file changes.

pub mod cli;
pub mod commands;
pub mod console;
pub mod interrupt;
pub mod prompt;
pub mod scaffold;

pub use cli::{Cli, Commands, RunArgs};
pub use commands::{execute, present, Outcome};
pub use console::Console;
pub use interrupt::Interrupts;

/// Environment variable naming a file that receives a copy of the tracing output.
pub const LOG_FILE_ENV: &str = "SURFGRAM_LOG_FILE";
