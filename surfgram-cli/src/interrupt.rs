//! Ctrl-C routing.
//!
//! Until a command claims interrupts, Ctrl-C cancels the CLI: a cancellation notice is printed
//! and the process exits successfully. `run` claims them once the bot starts and handles
//! Ctrl-C itself.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use tracing::debug;

use crate::console::Console;

pub const CANCELLED: &str = "Operation canceled";

#[derive(Debug, Clone, Default)]
pub struct Interrupts {
    claimed: Arc<AtomicBool>,
}

impl Interrupts {
    /// Spawns the default handler. Must be called inside a tokio runtime.
    pub fn install(console: Console) -> Self {
        let interrupts = Self::default();
        let claimed = interrupts.claimed.clone();
        tokio::spawn(async move {
            while tokio::signal::ctrl_c().await.is_ok() {
                if claimed.load(Ordering::SeqCst) {
                    debug!("Interrupt left to the running command");
                    continue;
                }
                console.cancel(&format!("\n{}", CANCELLED));
                std::process::exit(0);
            }
        });
        interrupts
    }

    pub fn claim(&self) {
        self.claimed.store(true, Ordering::SeqCst);
    }

    pub fn is_claimed(&self) -> bool {
        self.claimed.load(Ordering::SeqCst)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_claim_is_shared_between_clones() {
        let interrupts = Interrupts::default();
        let clone = interrupts.clone();
        assert!(!clone.is_claimed());
        interrupts.claim();
        assert!(clone.is_claimed());
    }
}
