//! Bot runtime contract.
//!
//! [`Bot`] is what the CLI hands the resolved configuration to; [`ProcessBot`] implements it by
//! running the project's own bot binary as a child process with the configuration exported
//! through environment variables.

use std::path::{Path, PathBuf};
use std::process::Stdio;
use std::sync::{Condvar, Mutex, MutexGuard};
use std::time::Duration;

use async_trait::async_trait;
use tokio::process::Command;
use tokio::sync::watch;
use tracing::{info, instrument, warn};

use crate::error::BotError;

/// Command used when the package manifest has no `[bot] command`.
pub const DEFAULT_BOT_COMMAND: &str = "cargo run --quiet";

/// Upper bound on how long `shutdown` waits for the child to be reaped.
const SHUTDOWN_TIMEOUT: Duration = Duration::from_secs(10);

/// A long-running bot. `listen` blocks until the bot stops; `shutdown` may be called from any
/// thread and must leave no bot process behind when it returns.
#[async_trait]
pub trait Bot: Send + Sync {
    async fn listen(&self) -> Result<(), BotError>;
    fn shutdown(&self);
}

/// Runs `command` inside the bot directory and supervises the child.
///
/// `shutdown` is one-shot: once requested, later `listen` calls return immediately.
pub struct ProcessBot {
    program: String,
    args: Vec<String>,
    workdir: PathBuf,
    envs: Vec<(String, String)>,
    stop: watch::Sender<bool>,
    active: Mutex<bool>,
    reaped: Condvar,
}

impl ProcessBot {
    /// Splits `command` shell-style. `envs` are added on top of the inherited environment.
    pub fn new(
        workdir: impl Into<PathBuf>,
        command: &str,
        envs: Vec<(String, String)>,
    ) -> Result<Self, BotError> {
        let mut parts = shell_words::split(command).map_err(|e| BotError::Command {
            command: command.to_string(),
            message: e.to_string(),
        })?;
        if parts.is_empty() {
            return Err(BotError::Command {
                command: command.to_string(),
                message: "command is empty".to_string(),
            });
        }
        let program = parts.remove(0);
        let (stop, _) = watch::channel(false);
        Ok(Self {
            program,
            args: parts,
            workdir: workdir.into(),
            envs,
            stop,
            active: Mutex::new(false),
            reaped: Condvar::new(),
        })
    }

    pub fn program(&self) -> &str {
        &self.program
    }

    pub fn args(&self) -> &[String] {
        &self.args
    }

    pub fn workdir(&self) -> &Path {
        &self.workdir
    }

    fn command(&self) -> Command {
        let mut cmd = Command::new(&self.program);
        cmd.args(&self.args)
            .current_dir(&self.workdir)
            .envs(self.envs.iter().map(|(k, v)| (k.as_str(), v.as_str())))
            .stdin(Stdio::null())
            .kill_on_drop(true);
        cmd
    }

    fn lock_active(&self) -> MutexGuard<'_, bool> {
        self.active.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

/// Marks a `listen` call as owning a child until dropped, waking any waiting `shutdown`.
struct ActiveGuard<'a>(&'a ProcessBot);

impl<'a> ActiveGuard<'a> {
    fn enter(bot: &'a ProcessBot) -> Self {
        *bot.lock_active() = true;
        Self(bot)
    }
}

impl Drop for ActiveGuard<'_> {
    fn drop(&mut self) {
        *self.0.lock_active() = false;
        self.0.reaped.notify_all();
    }
}

#[async_trait]
impl Bot for ProcessBot {
    #[instrument(skip(self), fields(workdir = %self.workdir.display()))]
    async fn listen(&self) -> Result<(), BotError> {
        let _active = ActiveGuard::enter(self);
        let mut stop = self.stop.subscribe();
        if *stop.borrow_and_update() {
            return Ok(());
        }

        let mut child = self.command().spawn()?;
        let pid = child.id();
        info!(pid, program = %self.program, "Bot process started");

        tokio::select! {
            status = child.wait() => {
                let status = status?;
                info!(%status, "Bot process exited");
                if status.success() {
                    Ok(())
                } else {
                    Err(BotError::Exited(status))
                }
            }
            _ = stop.changed() => {
                if let Err(e) = child.kill().await {
                    warn!(pid, error = %e, "Failed to kill bot process");
                }
                info!(pid, "Bot process stopped");
                Ok(())
            }
        }
    }

    /// Requests the running `listen` to kill its child and blocks until it has been reaped.
    ///
    /// Must not be called from the thread driving `listen`. When the `listen` future has
    /// already been dropped, the child was killed on drop and this returns at once.
    fn shutdown(&self) {
        self.stop.send_replace(true);

        let active = self.lock_active();
        let (_active, wait) = self
            .reaped
            .wait_timeout_while(active, SHUTDOWN_TIMEOUT, |active| *active)
            .unwrap_or_else(|poisoned| poisoned.into_inner());
        if wait.timed_out() {
            warn!(program = %self.program, "Timed out waiting for bot process to stop");
        }
    }
}
