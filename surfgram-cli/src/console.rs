//! Operator-facing output: banner, panels and status lines.
//!
//! With graphics enabled, messages are boxed and colored with `anstyle`. With `--no-graphics`
//! the same text is printed plainly and the banner and headers are skipped. Errors always go
//! to stderr.

use std::fmt::Write as _;
use std::io::IsTerminal;
use std::path::Path;

use anstyle::{Color, RgbColor, Style};

const BANNER: &str = r"   _____             ____
  / ___/__  _______/ __/___ __________ _____ ___
  \__ \/ / / / ___/ /_/ __ `/ ___/ __ `/ __ `__ \
 ___/ / /_/ / /  / __/ /_/ / /  / /_/ / / / / / /
/____/\__,_/_/  /_/  \__, /_/   \__,_/_/ /_/ /_/
                    /____/";

const TAGLINE: &str = "🌊 Like a surfer on the waves";

const fn rgb(r: u8, g: u8, b: u8) -> Style {
    Style::new().fg_color(Some(Color::Rgb(RgbColor(r, g, b))))
}

const BANNER_STYLE: Style = rgb(255, 165, 0).bold();
const BORDER_STYLE: Style = rgb(255, 140, 0);
const TAGLINE_STYLE: Style = rgb(255, 127, 80).italic();
const ACCENT_STYLE: Style = rgb(70, 130, 180).bold();
const SUCCESS_STYLE: Style = rgb(46, 139, 87).bold();
const ERROR_STYLE: Style = rgb(178, 34, 34).bold();
const CANCEL_STYLE: Style = rgb(218, 165, 32);

#[derive(Debug, Clone, Copy)]
pub struct Console {
    graphics: bool,
    colored: bool,
}

impl Console {
    pub fn new(graphics: bool) -> Self {
        Self {
            graphics,
            colored: graphics && std::io::stdout().is_terminal(),
        }
    }

    pub fn graphics_enabled(&self) -> bool {
        self.graphics
    }

    pub fn print_banner(&self) {
        if !self.graphics {
            return;
        }
        println!("{}", self.paint(BORDER_STYLE, &"─".repeat(50)));
        println!("{}", self.paint(BANNER_STYLE, BANNER));
        println!("{}", self.paint(BORDER_STYLE, &"─".repeat(50)));
        println!("{}\n", self.paint(TAGLINE_STYLE, TAGLINE));
    }

    pub fn operation_header(&self, message: &str) {
        if self.graphics {
            println!("{}", self.paint(ACCENT_STYLE, &panel(None, message)));
        }
    }

    pub fn success(&self, message: &str) {
        if self.graphics {
            println!("{}", self.paint(SUCCESS_STYLE, &panel(Some("Success"), message)));
        } else {
            println!("{}", message);
        }
    }

    pub fn cancel(&self, message: &str) {
        println!("{}", self.paint(CANCEL_STYLE, message));
    }

    /// Plain informational line, e.g. the candidate list before a selection prompt.
    pub fn notice(&self, message: &str) {
        println!("{}", self.paint(CANCEL_STYLE, message));
    }

    pub fn error(&self, operation: &str, err: &anyhow::Error, full_trace: bool) {
        let text = error_text(operation, err, full_trace);
        if self.graphics {
            let boxed = panel(Some("Error"), &text);
            if std::io::stderr().is_terminal() {
                eprintln!("{}{}{}", ERROR_STYLE.render(), boxed, ERROR_STYLE.render_reset());
            } else {
                eprintln!("{}", boxed);
            }
        } else {
            eprintln!("{}", text);
        }
    }

    pub fn config_status(&self, status: &ConfigStatus<'_>) {
        let text = status.render();
        if self.graphics {
            println!("{}", self.paint(ACCENT_STYLE, &panel(Some("Configuration"), &text)));
        } else {
            println!("{}", text);
        }
    }

    fn paint(&self, style: Style, text: &str) -> String {
        if self.colored {
            format!("{}{}{}", style.render(), text, style.render_reset())
        } else {
            text.to_string()
        }
    }
}

/// What `run` is about to start with.
#[derive(Debug)]
pub struct ConfigStatus<'a> {
    pub debug: bool,
    pub autoreload: bool,
    pub bot_dir: &'a Path,
    pub config: &'a str,
}

impl ConfigStatus<'_> {
    pub fn render(&self) -> String {
        let mut text = String::new();
        if self.debug {
            text.push_str("🔧 Debug mode enabled\n");
        }
        if self.autoreload {
            text.push_str("🔄 Auto-reload enabled\n");
        }
        let _ = write!(text, "📂 Bot: {}\n⚙️ Config: {}", self.bot_dir.display(), self.config);
        text
    }
}

/// `❌ <operation>: <message>`, followed by the cause chain when `full_trace` is set.
pub fn error_text(operation: &str, err: &anyhow::Error, full_trace: bool) -> String {
    let mut text = format!("❌ {}: {}", operation, err);
    if full_trace {
        let causes: Vec<String> = err.chain().skip(1).map(|c| c.to_string()).collect();
        if !causes.is_empty() {
            text.push_str("\n\nCaused by:");
            for (i, cause) in causes.iter().enumerate() {
                let _ = write!(text, "\n    {}: {}", i, cause);
            }
        }
    }
    text
}

/// Draws `body` in a rounded box, with an optional title in the top border.
pub fn panel(title: Option<&str>, body: &str) -> String {
    let lines: Vec<&str> = body.lines().collect();
    let title_width = title.map_or(0, |t| t.chars().count() + 2);
    let inner = lines
        .iter()
        .map(|l| l.chars().count())
        .max()
        .unwrap_or(0)
        .max(title_width)
        + 2;

    let mut out = String::new();
    match title {
        Some(title) => {
            let rest = inner - title_width - 1;
            let _ = writeln!(out, "╭─ {} {}╮", title, "─".repeat(rest));
        }
        None => {
            let _ = writeln!(out, "╭{}╮", "─".repeat(inner));
        }
    }
    for line in &lines {
        let pad = inner - 2 - line.chars().count();
        let _ = writeln!(out, "│ {}{} │", line, " ".repeat(pad));
    }
    let _ = write!(out, "╰{}╯", "─".repeat(inner));
    out
}
