//! Tracing initialization: fmt layer to stderr, optionally teed into a log file.

use std::fs::OpenOptions;
use std::io;
use std::path::Path;
use std::sync::Arc;

use tracing_subscriber::{
    fmt::format::FmtSpan, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter, Registry,
};

/// Initializes the global tracing subscriber.
///
/// The level is read from `RUST_LOG`; when unset, `default_level` applies (e.g. `warn`, or
/// `debug` under `--debug`). When `log_file` is given, the same formatted output is appended
/// to that file as well. Load `.env` before calling this, otherwise `RUST_LOG` from it is ignored.
pub fn init_tracing(default_level: &str, log_file: Option<&Path>) -> anyhow::Result<()> {
    let env_filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));

    let base = tracing_subscriber::fmt::layer()
        .with_span_events(FmtSpan::CLOSE)
        .with_target(true)
        .with_thread_names(true)
        .with_level(true)
        .with_file(false)
        .with_line_number(false);

    match log_file {
        Some(path) => {
            if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
                std::fs::create_dir_all(parent)?;
            }
            let file = Arc::new(OpenOptions::new().create(true).append(true).open(path)?);

            use tracing_subscriber::fmt::writer::MakeWriterExt;
            let writer = io::stderr.and(file);

            Registry::default()
                .with(env_filter)
                .with(base.with_writer(writer))
                .try_init()
        }
        None => Registry::default()
            .with(env_filter)
            .with(base.with_writer(io::stderr))
            .try_init(),
    }
    .map_err(|e| anyhow::anyhow!("Failed to set global subscriber: {}", e))?;

    Ok(())
}
