//! Process replacement.

use std::ffi::OsString;
use std::io;
use std::path::{Path, PathBuf};
use std::process::Command;

use tracing::debug;

/// Replaces the running process with a fresh copy of itself.
pub trait Restarter: Send {
    /// On success the process is gone; implementations that return `Ok` only exist in tests.
    fn restart(&mut self) -> io::Result<()>;
}

/// Re-executes the current executable with the argument vector it was started with.
///
/// Capture it once at startup: `args_os` and `current_exe` are read in [`ProcessRestarter::current`]
/// and never again.
#[derive(Debug, Clone)]
pub struct ProcessRestarter {
    program: PathBuf,
    argv: Vec<OsString>,
}

impl ProcessRestarter {
    pub fn new(program: impl Into<PathBuf>, argv: Vec<OsString>) -> Self {
        Self {
            program: program.into(),
            argv,
        }
    }

    pub fn current() -> io::Result<Self> {
        Ok(Self::new(std::env::current_exe()?, std::env::args_os().collect()))
    }

    pub fn program(&self) -> &Path {
        &self.program
    }

    /// Full argument vector, `argv[0]` included.
    pub fn argv(&self) -> &[OsString] {
        &self.argv
    }

    fn command(&self) -> Command {
        let mut cmd = Command::new(&self.program);
        if let Some((arg0, rest)) = self.argv.split_first() {
            #[cfg(unix)]
            {
                use std::os::unix::process::CommandExt;
                cmd.arg0(arg0);
            }
            #[cfg(not(unix))]
            let _ = arg0;
            cmd.args(rest);
        }
        cmd
    }
}

impl Restarter for ProcessRestarter {
    #[cfg(unix)]
    fn restart(&mut self) -> io::Result<()> {
        use std::os::unix::process::CommandExt;

        debug!(program = %self.program.display(), "Replacing process image");
        // exec only returns on failure
        Err(self.command().exec())
    }

    #[cfg(not(unix))]
    fn restart(&mut self) -> io::Result<()> {
        debug!(program = %self.program.display(), "Spawning replacement process");
        self.command().spawn()?;
        std::process::exit(0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_command_preserves_arguments() {
        let restarter = ProcessRestarter::new(
            "/usr/local/bin/surfgram",
            vec!["surfgram".into(), "run".into(), "--autoreload".into()],
        );
        let cmd = restarter.command();
        assert_eq!(cmd.get_program(), "/usr/local/bin/surfgram");
        let args: Vec<_> = cmd.get_args().collect();
        assert_eq!(args, ["run", "--autoreload"]);
    }

    #[test]
    fn test_current_captures_argv() {
        let restarter = ProcessRestarter::current().unwrap();
        assert!(!restarter.argv().is_empty());
        assert!(restarter.program().is_absolute());
    }

    #[cfg(unix)]
    #[test]
    fn test_exec_failure_is_returned() {
        let mut restarter =
            ProcessRestarter::new("/nonexistent/surfgram", vec!["surfgram".into()]);
        assert!(restarter.restart().is_err());
    }
}
