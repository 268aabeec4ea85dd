use std::env;
use std::path::Path;
use std::sync::Arc;

use anyhow::Context;
use surfgram_config::{materialize, resolve, ConfigReference, ResolverContext};
use surfgram_core::debug::{self, Level};
use surfgram_core::{Bot, ManagerError, ProcessBot, DEFAULT_BOT_COMMAND};
use surfgram_reload::{
    supervise, ProcessRestarter, Supervisor, WatchError, WatchOutcome, WatchSession,
};
use tracing::{error, info};

use super::Outcome;
use crate::cli::RunArgs;
use crate::console::{ConfigStatus, Console};
use crate::interrupt::{Interrupts, CANCELLED};
use crate::prompt::PromptSelector;

/// Directory under the bot that holds build output; never watched for reloads.
const BUILD_DIR: &str = "target";

/// `surfgram run`: resolve and materialize the config, then run the bot until it exits or
/// the operator interrupts it.
pub async fn run(
    args: RunArgs,
    console: &Console,
    interrupts: &Interrupts,
) -> anyhow::Result<Outcome> {
    console.operation_header("🚀 Bot Startup");
    debug::init_from_flag(args.debug);

    let bot_dir = match &args.bot {
        Some(dir) => dir.clone(),
        None => env::current_dir().context("Failed to read current directory")?,
    };
    if !bot_dir.exists() {
        return Err(ManagerError::NotFound { path: bot_dir }.into());
    }
    let bot_dir = bot_dir.canonicalize()?;

    let env_file = bot_dir.join(".env");
    if env_file.is_file() {
        dotenvy::from_path(&env_file)
            .with_context(|| format!("Failed to load {}", env_file.display()))?;
    }

    let mut ctx = ResolverContext::new();
    let reference = match args.config {
        Some(reference) => reference,
        None => resolve(&mut ctx, &bot_dir, &mut PromptSelector::new(console))?.to_string(),
    };
    ConfigReference::parse(&reference)?;

    console.config_status(&ConfigStatus {
        debug: args.debug,
        autoreload: args.autoreload,
        bot_dir: &bot_dir,
        config: &reference,
    });

    if let Some(parent) = bot_dir.parent() {
        ctx.mount(parent);
    }
    let instance = materialize(&mut ctx, &reference)?;
    debug::log(
        format!(
            "Config {} loaded with {} field(s)",
            instance.reference(),
            instance.fields().len()
        ),
        Level::Info,
    );

    let command = ctx
        .import(instance.reference().module())?
        .bot_command()
        .unwrap_or(DEFAULT_BOT_COMMAND)
        .to_string();
    let bot: Arc<dyn Bot> = Arc::new(ProcessBot::new(&bot_dir, &command, instance.env_vars())?);
    info!(config = %reference, command = %command, "Starting bot");

    let supervisor = if args.autoreload {
        start_reload(&bot_dir, bot.clone())
    } else {
        None
    };

    interrupts.claim();
    let outcome = tokio::select! {
        result = bot.listen() => result
            .map(|()| Outcome::Finished)
            .context("Bot stopped with an error"),
        _ = tokio::signal::ctrl_c() => {
            bot.shutdown();
            Ok(Outcome::Cancelled(CANCELLED.to_string()))
        }
    };

    match supervisor {
        Some(supervisor) => {
            supervisor.interrupt();
            match tokio::task::spawn_blocking(move || supervisor.join()).await {
                Ok(joined) => merge_reload(outcome, joined),
                Err(e) => {
                    error!(error = %e, "Reload supervisor panicked");
                    outcome
                }
            }
        }
        None => outcome,
    }
}

/// Combines the bot's result with how the reload supervisor ended.
///
/// A failed restart has already shut the bot down, so it overrides whatever `listen` reported.
fn merge_reload(
    outcome: anyhow::Result<Outcome>,
    joined: Result<WatchOutcome, WatchError>,
) -> anyhow::Result<Outcome> {
    match joined {
        Ok(_) => outcome,
        Err(e @ WatchError::Restart(_)) => {
            Err(anyhow::Error::new(e).context("Auto-reload failed to restart the bot"))
        }
        Err(e) => {
            error!(error = %e, "Reload supervisor failed");
            outcome
        }
    }
}

/// Starts the reload supervisor. Failure disables auto-reload but never stops the bot.
fn start_reload(bot_dir: &Path, bot: Arc<dyn Bot>) -> Option<Supervisor> {
    let session = WatchSession::new(bot_dir).ignoring(bot_dir.join(BUILD_DIR));
    let started = ProcessRestarter::current()
        .map_err(WatchError::Restart)
        .and_then(|restarter| supervise(session, bot, restarter));

    match started {
        Ok(supervisor) => {
            debug::log(
                format!("Watching {} for changes", bot_dir.display()),
                Level::Info,
            );
            Some(supervisor)
        }
        Err(e) => {
            error!(error = %e, "Auto-reload disabled");
            debug::log(format!("Auto-reload disabled: {}", e), Level::Error);
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io;
    use std::path::PathBuf;

    use surfgram_reload::{Restarter, WatchSignal};

    struct FailingRestarter;

    impl Restarter for FailingRestarter {
        fn restart(&mut self) -> io::Result<()> {
            Err(io::Error::new(io::ErrorKind::NotFound, "surfgram binary is gone"))
        }
    }

    struct StoppedBot;

    #[async_trait::async_trait]
    impl Bot for StoppedBot {
        async fn listen(&self) -> Result<(), surfgram_core::BotError> {
            Ok(())
        }

        fn shutdown(&self) {}
    }

    /// **Test: A restart that fails after a change is reported as a startup error.**
    ///
    /// **Setup:** Session fed one change, with a restarter whose re-exec fails.
    /// **Action:** Merge the session result with the bot's clean exit.
    /// **Expected:** An error carrying the restart failure, not a clean finish.
    #[test]
    fn test_failed_restart_overrides_clean_exit() {
        let (tx, rx) = std::sync::mpsc::channel();
        tx.send(WatchSignal::Changed(PathBuf::from("echo/main.rs"))).unwrap();
        let joined = WatchSession::new("echo").run(&rx, &StoppedBot, &mut FailingRestarter);

        let err = merge_reload(Ok(Outcome::Finished), joined).unwrap_err();

        assert_eq!(err.to_string(), "Auto-reload failed to restart the bot");
        let chain: Vec<String> = err.chain().map(|c| c.to_string()).collect();
        assert!(chain.iter().any(|c| c.contains("surfgram binary is gone")), "{chain:?}");
    }

    #[test]
    fn test_stopped_supervisor_keeps_bot_outcome() {
        let merged = merge_reload(
            Ok(Outcome::Cancelled(CANCELLED.to_string())),
            Ok(WatchOutcome::Stopped),
        )
        .unwrap();
        assert_eq!(merged, Outcome::Cancelled(CANCELLED.to_string()));
    }

    #[test]
    fn test_setup_errors_do_not_fail_the_run() {
        let merged = merge_reload(
            Ok(Outcome::Finished),
            Err(WatchError::MissingDirectory(PathBuf::from("echo"))),
        )
        .unwrap();
        assert_eq!(merged, Outcome::Finished);
    }
}
