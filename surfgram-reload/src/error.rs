use std::io;
use std::path::PathBuf;

use thiserror::Error;

#[derive(Error, Debug)]
pub enum WatchError {
    #[error("Watched directory not found: {}", .0.display())]
    MissingDirectory(PathBuf),

    #[error("File watcher error: {0}")]
    Notify(#[from] notify::Error),

    #[error("Failed to restart process: {0}")]
    Restart(#[source] io::Error),

    #[error("Failed to start reload thread: {0}")]
    Thread(#[source] io::Error),
}
