//! Integration tests for [`surfgram_reload::supervise`] against a real directory.

use std::fs;
use std::io;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::mpsc::{self, Sender};
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use surfgram_core::{Bot, BotError};
use surfgram_reload::{supervise, Restarter, WatchError, WatchOutcome, WatchSession};

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

/// Reports each restart on a channel instead of replacing the test process.
struct ReportingRestarter(Sender<()>);

impl Restarter for ReportingRestarter {
    fn restart(&mut self) -> io::Result<()> {
        let _ = self.0.send(());
        Ok(())
    }
}

/// **Test: Writing a file in the watched directory triggers exactly one restart.**
///
/// **Setup:** Supervisor on a temp dir with a short debounce.
/// **Action:** Create a file inside it.
/// **Expected:** One restart, bot shut down first, outcome names a path under the directory.
#[test]
fn test_file_change_restarts_once() {
    let root = tempfile::tempdir().unwrap();
    let bot = Arc::new(CountingBot::default());
    let (tx, rx) = mpsc::channel();
    let session = WatchSession::new(root.path()).with_debounce(Duration::from_millis(200));

    let supervisor = supervise(session, bot.clone(), ReportingRestarter(tx)).unwrap();
    fs::write(root.path().join("handlers.rs"), "// changed").unwrap();

    rx.recv_timeout(Duration::from_secs(10))
        .expect("restart was not requested");
    match supervisor.join().unwrap() {
        WatchOutcome::Replaced(path) => {
            let root = root.path().canonicalize().unwrap();
            assert!(path.canonicalize().unwrap_or(path).starts_with(&root));
        }
        other => panic!("unexpected outcome: {other:?}"),
    }
    assert_eq!(bot.shutdowns.load(Ordering::SeqCst), 1);
    assert!(rx.try_recv().is_err());
}

/// **Test: Deleting a watched file triggers a restart.**
///
/// **Setup:** A source file exists before the supervisor starts.
/// **Action:** Remove it.
/// **Expected:** One restart, outcome under the directory.
#[test]
fn test_file_removal_restarts() {
    let root = tempfile::tempdir().unwrap();
    let dir = root.path().canonicalize().unwrap();
    fs::write(dir.join("handlers.rs"), "// handlers").unwrap();
    let (tx, rx) = mpsc::channel();
    let session = WatchSession::new(&dir).with_debounce(Duration::from_millis(200));

    let supervisor = supervise(session, Arc::new(CountingBot::default()), ReportingRestarter(tx)).unwrap();
    fs::remove_file(dir.join("handlers.rs")).unwrap();

    rx.recv_timeout(Duration::from_secs(10))
        .expect("deleting a watched file did not trigger a reload");
    match supervisor.join().unwrap() {
        WatchOutcome::Replaced(path) => assert!(path.starts_with(&dir)),
        other => panic!("unexpected outcome: {other:?}"),
    }
}

/// **Test: Interrupting an idle supervisor stops it without a restart.**
#[test]
fn test_interrupt_stops_supervisor() {
    let root = tempfile::tempdir().unwrap();
    let bot = Arc::new(CountingBot::default());
    let (tx, rx) = mpsc::channel();

    let supervisor = supervise(WatchSession::new(root.path()), bot.clone(), ReportingRestarter(tx)).unwrap();
    supervisor.interrupt();

    assert_eq!(supervisor.join().unwrap(), WatchOutcome::Stopped);
    assert_eq!(bot.shutdowns.load(Ordering::SeqCst), 0);
    assert!(rx.try_recv().is_err());
}

#[test]
fn test_missing_directory_fails_setup() {
    let root = tempfile::tempdir().unwrap();
    let (tx, _rx) = mpsc::channel();

    let result = supervise(
        WatchSession::new(root.path().join("ghost")),
        Arc::new(CountingBot::default()),
        ReportingRestarter(tx),
    );
    assert!(matches!(result, Err(WatchError::MissingDirectory(_))));
}

/// **Test: Changes under an ignored path never trigger a restart.**
///
/// **Setup:** Supervisor ignoring `<dir>/target`.
/// **Action:** Write into `target/`, then into the project root.
/// **Expected:** The reload names the root file, not the build output.
#[test]
fn test_ignored_paths_do_not_reload() {
    let root = tempfile::tempdir().unwrap();
    let dir = root.path().canonicalize().unwrap();
    let (tx, rx) = mpsc::channel();
    let session = WatchSession::new(&dir).ignoring(dir.join("target"));

    let supervisor = supervise(session, Arc::new(CountingBot::default()), ReportingRestarter(tx)).unwrap();
    fs::create_dir_all(dir.join("target/debug")).unwrap();
    fs::write(dir.join("target/debug/.cargo-lock"), "").unwrap();
    std::thread::sleep(Duration::from_millis(300));
    assert!(!supervisor.is_finished());

    fs::write(dir.join("main.rs"), "fn main() {}").unwrap();
    rx.recv_timeout(Duration::from_secs(10))
        .expect("restart was not requested");
    match supervisor.join().unwrap() {
        WatchOutcome::Replaced(path) => assert_eq!(path, dir.join("main.rs")),
        other => panic!("unexpected outcome: {other:?}"),
    }
}
