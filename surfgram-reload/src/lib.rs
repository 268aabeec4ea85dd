//! # surfgram-reload
//!
//! Auto-reload for `surfgram run --autoreload`. A [`WatchSession`] watches the bot directory
//! recursively; the first change shuts the bot down and re-executes the CLI with its original
//! arguments through a [`Restarter`]. Ctrl-C stops watching without a restart.

pub mod error;
pub mod restart;
pub mod session;

pub use error::WatchError;
pub use restart::{ProcessRestarter, Restarter};
pub use session::{supervise, Supervisor, WatchOutcome, WatchSession, WatchSignal, WatchState};
