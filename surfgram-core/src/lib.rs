//! # surfgram-core
//!
//! Shared pieces of the Surfgram CLI: the [`ManagerError`] taxonomy used by config discovery,
//! tracing initialization, the operator-facing [`debug`] sink, and the [`Bot`] runtime contract
//! with its process-backed implementation.

pub mod bot;
pub mod debug;
pub mod error;
pub mod logger;

pub use bot::{Bot, ProcessBot, DEFAULT_BOT_COMMAND};
pub use debug::{Debugger, Level};
pub use error::{BotError, ManagerError, Result};
pub use logger::init_tracing;
