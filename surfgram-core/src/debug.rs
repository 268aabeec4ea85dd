//! Operator-facing debug output.
//!
//! A single process-wide [`Debugger`] is configured once at startup (from `--debug`) and is
//! not reconfigurable afterwards. Until it is configured, [`log`] is a no-op. This is separate
//! from `tracing`: it prints short colored lines for the operator, e.g. reload notices.

use std::fmt::Display;
use std::io::{IsTerminal, Write};
use std::sync::OnceLock;

use anstyle::{AnsiColor, Color, Style};

pub const DEFAULT_FORMAT: &str = "{prefix} {message}";

/// Debug levels. Values are fixed ordinals; a message is shown when its level is at least
/// the configured minimum.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Level {
    Info = 1,
    Error = 3,
    Api = 7,
}

impl Level {
    pub fn value(self) -> u8 {
        self as u8
    }

    pub fn color(self) -> AnsiColor {
        match self {
            Level::Info => AnsiColor::Green,
            Level::Error => AnsiColor::Red,
            Level::Api => AnsiColor::Magenta,
        }
    }

    pub fn prefix(self) -> &'static str {
        match self {
            Level::Info => "INFO",
            Level::Error => "ERROR",
            Level::Api => "API",
        }
    }
}

#[derive(Debug, Clone)]
pub struct Debugger {
    enabled: bool,
    level: Level,
    output_format: String,
    colored: bool,
}

impl Default for Debugger {
    fn default() -> Self {
        Self {
            enabled: false,
            level: Level::Info,
            output_format: DEFAULT_FORMAT.to_string(),
            colored: false,
        }
    }
}

impl Debugger {
    pub fn new(enabled: bool) -> Self {
        Self {
            enabled,
            ..Self::default()
        }
    }

    pub fn with_level(mut self, level: Level) -> Self {
        self.level = level;
        self
    }

    /// Output template; `{prefix}` and `{message}` are substituted.
    pub fn with_format(mut self, output_format: impl Into<String>) -> Self {
        self.output_format = output_format.into();
        self
    }

    pub fn with_color(mut self, colored: bool) -> Self {
        self.colored = colored;
        self
    }

    pub fn enabled(&self) -> bool {
        self.enabled
    }

    pub fn level(&self) -> Level {
        self.level
    }

    /// Returns the formatted line, or `None` when the message is suppressed.
    pub fn format(&self, message: &dyn Display, level: Level) -> Option<String> {
        if !self.enabled || level < self.level {
            return None;
        }

        let tag = format!("[{}]", level.prefix());
        let prefix = if self.colored {
            let style = Style::new().fg_color(Some(Color::Ansi(level.color())));
            format!("{}{}{}", style.render(), tag, style.render_reset())
        } else {
            tag
        };

        Some(
            self.output_format
                .replace("{prefix}", &prefix)
                .replace("{message}", &message.to_string()),
        )
    }

    pub fn log(&self, message: impl Display, level: Level) {
        if let Some(line) = self.format(&message, level) {
            let mut out = std::io::stdout().lock();
            let _ = writeln!(out, "{}", line);
        }
    }
}

static DEBUGGER: OnceLock<Debugger> = OnceLock::new();

/// Installs the process-wide debugger. Returns `false` if one was already installed; the
/// first configuration wins.
pub fn init(debugger: Debugger) -> bool {
    DEBUGGER.set(debugger).is_ok()
}

/// Installs the default debugger for the given `--debug` flag, coloring when stdout is a tty.
pub fn init_from_flag(enabled: bool) -> bool {
    init(Debugger::new(enabled).with_color(std::io::stdout().is_terminal()))
}

pub fn is_enabled() -> bool {
    DEBUGGER.get().is_some_and(Debugger::enabled)
}

pub fn log(message: impl Display, level: Level) {
    if let Some(debugger) = DEBUGGER.get() {
        debugger.log(message, level);
    }
}
