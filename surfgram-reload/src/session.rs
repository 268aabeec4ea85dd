//! Watch session: the reload state machine and its background thread.

use std::path::{Path, PathBuf};
use std::sync::mpsc::{self, Receiver, RecvTimeoutError, Sender};
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use std::time::Duration;

use notify::event::EventKind;
use notify::{Event, RecommendedWatcher, RecursiveMode, Watcher};
use surfgram_core::debug::{self, Level};
use surfgram_core::Bot;
use tracing::{debug, info, warn};

use crate::error::WatchError;
use crate::restart::Restarter;

const THREAD_NAME: &str = "surfgram-reload";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WatchState {
    Idle,
    Watching,
    /// A change was seen and the process is being replaced.
    Reloading,
    Stopped,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum WatchSignal {
    Changed(PathBuf),
    Interrupted,
}

/// How a session ended without an error.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum WatchOutcome {
    /// The restarter returned after a change. Real restarters never return here.
    Replaced(PathBuf),
    Stopped,
}

#[derive(Debug)]
pub struct WatchSession {
    directory: PathBuf,
    ignored: Vec<PathBuf>,
    debounce: Option<Duration>,
    state: WatchState,
}

impl WatchSession {
    pub fn new(directory: impl Into<PathBuf>) -> Self {
        Self {
            directory: directory.into(),
            ignored: Vec::new(),
            debounce: None,
            state: WatchState::Idle,
        }
    }

    /// Collapse changes arriving within `window` of the previous one into a single reload.
    pub fn with_debounce(mut self, window: Duration) -> Self {
        self.debounce = Some(window);
        self
    }

    /// Never report changes under `path`, e.g. the bot's build output.
    pub fn ignoring(mut self, path: impl Into<PathBuf>) -> Self {
        self.ignored.push(path.into());
        self
    }

    pub fn directory(&self) -> &Path {
        &self.directory
    }

    pub fn state(&self) -> WatchState {
        self.state
    }

    /// Registers a recursive watcher on the directory that forwards creations, modifications
    /// and removals to `signals`. Events stop when the returned watcher is dropped.
    pub fn watch(&mut self, signals: Sender<WatchSignal>) -> Result<RecommendedWatcher, WatchError> {
        if !self.directory.is_dir() {
            return Err(WatchError::MissingDirectory(self.directory.clone()));
        }

        let ignored = self.ignored.clone();
        let mut watcher = notify::recommended_watcher(move |result: notify::Result<Event>| {
            match result {
                Ok(event) => {
                    if !matches!(
                        event.kind,
                        EventKind::Create(_) | EventKind::Modify(_) | EventKind::Remove(_)
                    ) {
                        return;
                    }
                    for path in event.paths {
                        if ignored.iter().any(|prefix| path.starts_with(prefix)) {
                            continue;
                        }
                        let _ = signals.send(WatchSignal::Changed(path));
                    }
                }
                Err(error) => warn!(%error, "File watcher reported an error"),
            }
        })?;
        watcher.watch(&self.directory, RecursiveMode::Recursive)?;

        self.state = WatchState::Watching;
        debug!(directory = %self.directory.display(), "Watching for changes");
        Ok(watcher)
    }

    /// Blocks on `signals` until a change or an interruption.
    ///
    /// On a change the bot is shut down and `restarter` replaces the process. An interruption
    /// or a closed channel stops the session without a restart.
    pub fn run(
        &mut self,
        signals: &Receiver<WatchSignal>,
        bot: &dyn Bot,
        restarter: &mut dyn Restarter,
    ) -> Result<WatchOutcome, WatchError> {
        self.state = WatchState::Watching;

        let changed = match signals.recv() {
            Ok(WatchSignal::Changed(path)) => match self.settle(signals, path) {
                Some(path) => path,
                None => return Ok(self.stop()),
            },
            Ok(WatchSignal::Interrupted) | Err(_) => return Ok(self.stop()),
        };

        self.state = WatchState::Reloading;
        let message = format!(
            "File '{}' has been modified. Reloading...",
            changed.display()
        );
        debug::log(&message, Level::Info);
        info!(path = %changed.display(), "{}", message);

        bot.shutdown();
        restarter.restart().map_err(WatchError::Restart)?;
        Ok(WatchOutcome::Replaced(changed))
    }

    /// Drains changes within the debounce window. `None` if interrupted meanwhile.
    fn settle(&self, signals: &Receiver<WatchSignal>, first: PathBuf) -> Option<PathBuf> {
        let Some(window) = self.debounce else {
            return Some(first);
        };
        loop {
            match signals.recv_timeout(window) {
                Ok(WatchSignal::Changed(path)) => {
                    debug!(path = %path.display(), "Change collapsed into pending reload")
                }
                Ok(WatchSignal::Interrupted) => return None,
                Err(RecvTimeoutError::Timeout) | Err(RecvTimeoutError::Disconnected) => {
                    return Some(first)
                }
            }
        }
    }

    fn stop(&mut self) -> WatchOutcome {
        self.state = WatchState::Stopped;
        debug::log("File monitoring stopped.", Level::Info);
        info!("File monitoring stopped");
        WatchOutcome::Stopped
    }
}

/// Handle on a running supervisor thread.
pub struct Supervisor {
    signals: Sender<WatchSignal>,
    handle: JoinHandle<Result<WatchOutcome, WatchError>>,
}

impl Supervisor {
    /// Stops watching. Has no effect once a reload has started.
    pub fn interrupt(&self) {
        let _ = self.signals.send(WatchSignal::Interrupted);
    }

    pub fn is_finished(&self) -> bool {
        self.handle.is_finished()
    }

    pub fn join(self) -> Result<WatchOutcome, WatchError> {
        match self.handle.join() {
            Ok(result) => result,
            Err(panic) => std::panic::resume_unwind(panic),
        }
    }
}

/// Starts watching `session`'s directory and runs the session on a background thread.
///
/// The watcher is registered before this returns, so a change made right after is seen.
pub fn supervise<R>(
    mut session: WatchSession,
    bot: Arc<dyn Bot>,
    mut restarter: R,
) -> Result<Supervisor, WatchError>
where
    R: Restarter + 'static,
{
    let (tx, rx) = mpsc::channel();
    let watcher = session.watch(tx.clone())?;

    let handle = thread::Builder::new()
        .name(THREAD_NAME.to_string())
        .spawn(move || {
            let _watcher = watcher;
            session.run(&rx, bot.as_ref(), &mut restarter)
        })
        .map_err(WatchError::Thread)?;

    Ok(Supervisor {
        signals: tx,
        handle,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use std::io;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Mutex;
    use surfgram_core::BotError;
    use tracing_subscriber::fmt::MakeWriter;

    #[derive(Default)]
    struct CountingBot {
        shutdowns: AtomicUsize,
    }

    #[async_trait]
    impl Bot for CountingBot {
        async fn listen(&self) -> Result<(), BotError> {
            Ok(())
        }

        fn shutdown(&self) {
            self.shutdowns.fetch_add(1, Ordering::SeqCst);
        }
    }

    #[derive(Default)]
    struct CountingRestarter {
        restarts: usize,
    }

    impl Restarter for CountingRestarter {
        fn restart(&mut self) -> io::Result<()> {
            self.restarts += 1;
            Ok(())
        }
    }

    struct FailingRestarter;

    impl Restarter for FailingRestarter {
        fn restart(&mut self) -> io::Result<()> {
            Err(io::Error::new(io::ErrorKind::NotFound, "gone"))
        }
    }

    /// Collects formatted tracing output.
    #[derive(Clone, Default)]
    struct Captured(Arc<Mutex<Vec<u8>>>);

    impl Captured {
        fn text(&self) -> String {
            String::from_utf8(self.0.lock().unwrap().clone()).unwrap()
        }
    }

    impl io::Write for Captured {
        fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
            self.0.lock().unwrap().extend_from_slice(buf);
            Ok(buf.len())
        }

        fn flush(&mut self) -> io::Result<()> {
            Ok(())
        }
    }

    impl<'a> MakeWriter<'a> for Captured {
        type Writer = Captured;

        fn make_writer(&'a self) -> Self::Writer {
            self.clone()
        }
    }

    /// **Test: One change means one shutdown, one restart and one reload notice.**
    ///
    /// **Setup:** A single `Changed` signal queued, tracing output captured.
    /// **Action:** Run the session.
    /// **Expected:** Exactly one `File '...' has been modified. Reloading...` line.
    #[test]
    fn test_change_shuts_down_and_restarts_once() {
        let (tx, rx) = mpsc::channel();
        tx.send(WatchSignal::Changed(PathBuf::from("echo/src/main.rs"))).unwrap();
        let bot = CountingBot::default();
        let mut restarter = CountingRestarter::default();
        let mut session = WatchSession::new("echo");
        let captured = Captured::default();
        let subscriber = tracing_subscriber::fmt()
            .with_writer(captured.clone())
            .with_ansi(false)
            .finish();

        let outcome = tracing::subscriber::with_default(subscriber, || {
            session.run(&rx, &bot, &mut restarter)
        })
        .unwrap();

        let notices: Vec<String> = captured
            .text()
            .lines()
            .filter(|line| line.contains("has been modified. Reloading..."))
            .map(str::to_string)
            .collect();
        assert_eq!(notices.len(), 1, "{notices:?}");
        assert!(notices[0].contains("File 'echo/src/main.rs' has been modified. Reloading..."));

        assert_eq!(outcome, WatchOutcome::Replaced(PathBuf::from("echo/src/main.rs")));
        assert_eq!(session.state(), WatchState::Reloading);
        assert_eq!(bot.shutdowns.load(Ordering::SeqCst), 1);
        assert_eq!(restarter.restarts, 1);
    }

    #[test]
    fn test_interrupt_stops_without_restart() {
        let (tx, rx) = mpsc::channel();
        tx.send(WatchSignal::Interrupted).unwrap();
        let bot = CountingBot::default();
        let mut restarter = CountingRestarter::default();
        let mut session = WatchSession::new("echo");

        assert_eq!(
            session.run(&rx, &bot, &mut restarter).unwrap(),
            WatchOutcome::Stopped
        );
        assert_eq!(session.state(), WatchState::Stopped);
        assert_eq!(bot.shutdowns.load(Ordering::SeqCst), 0);
        assert_eq!(restarter.restarts, 0);
    }

    #[test]
    fn test_closed_channel_stops() {
        let (tx, rx) = mpsc::channel::<WatchSignal>();
        drop(tx);
        let mut session = WatchSession::new("echo");

        let outcome = session
            .run(&rx, &CountingBot::default(), &mut CountingRestarter::default())
            .unwrap();
        assert_eq!(outcome, WatchOutcome::Stopped);
    }

    #[test]
    fn test_debounce_collapses_burst() {
        let (tx, rx) = mpsc::channel();
        for name in ["a.rs", "b.rs", "c.rs"] {
            tx.send(WatchSignal::Changed(PathBuf::from(name))).unwrap();
        }
        let mut restarter = CountingRestarter::default();
        let mut session = WatchSession::new("echo").with_debounce(Duration::from_millis(50));

        let outcome = session
            .run(&rx, &CountingBot::default(), &mut restarter)
            .unwrap();

        assert_eq!(outcome, WatchOutcome::Replaced(PathBuf::from("a.rs")));
        assert_eq!(restarter.restarts, 1);
    }

    #[test]
    fn test_interrupt_during_debounce_stops() {
        let (tx, rx) = mpsc::channel();
        tx.send(WatchSignal::Changed(PathBuf::from("a.rs"))).unwrap();
        tx.send(WatchSignal::Interrupted).unwrap();
        let mut restarter = CountingRestarter::default();
        let mut session = WatchSession::new("echo").with_debounce(Duration::from_millis(50));

        let outcome = session
            .run(&rx, &CountingBot::default(), &mut restarter)
            .unwrap();
        assert_eq!(outcome, WatchOutcome::Stopped);
        assert_eq!(restarter.restarts, 0);
    }

    #[test]
    fn test_restart_failure_is_reported() {
        let (tx, rx) = mpsc::channel();
        tx.send(WatchSignal::Changed(PathBuf::from("a.rs"))).unwrap();
        let mut session = WatchSession::new("echo");

        let err = session
            .run(&rx, &CountingBot::default(), &mut FailingRestarter)
            .unwrap_err();
        assert!(matches!(err, WatchError::Restart(_)));
    }

    #[test]
    fn test_watch_missing_directory() {
        let root = tempfile::tempdir().unwrap();
        let (tx, _rx) = mpsc::channel();
        let mut session = WatchSession::new(root.path().join("ghost"));

        assert!(matches!(
            session.watch(tx),
            Err(WatchError::MissingDirectory(_))
        ));
        assert_eq!(session.state(), WatchState::Idle);
    }
}
