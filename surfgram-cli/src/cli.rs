//! CLI parser.

use std::path::PathBuf;

use clap::{ArgAction, Args, Parser, Subcommand};

#[derive(Parser, Debug)]
#[command(name = "surfgram")]
#[command(about = "Surfgram CLI - A modern Telegram bot framework", long_about = None)]
#[command(version, disable_version_flag = true)]
pub struct Cli {
    /// Disable ASCII banner display and all the graphics
    #[arg(long, global = true)]
    pub no_graphics: bool,

    /// Show version
    #[arg(short = 'v', long, action = ArgAction::Version)]
    version: Option<bool>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Create a new bot
    New {
        bot_name: String,
        /// Show full error trace
        #[arg(long)]
        full_trace: bool,
    },
    /// Delete the specified bot
    Delete {
        bot_name: String,
        /// Show full error trace
        #[arg(long)]
        full_trace: bool,
    },
    /// Run the bot
    Run(RunArgs),
}

#[derive(Args, Debug, Clone)]
pub struct RunArgs {
    /// Directory containing the bot. Defaults to current directory.
    #[arg(short, long)]
    pub bot: Option<PathBuf>,

    /// Config class in format 'module.ConfigClass'. Auto-detected if not specified.
    #[arg(short, long)]
    pub config: Option<String>,

    /// Enable debug mode with verbose logging.
    #[arg(long)]
    pub debug: bool,

    /// Automatically reload bot on source changes.
    #[arg(long)]
    pub autoreload: bool,

    /// Show complete error traces when enabled.
    #[arg(long)]
    pub full_trace: bool,
}

impl Commands {
    /// Operation name shown in error panels.
    pub fn operation(&self) -> &'static str {
        match self {
            Commands::New { .. } => "Bot creation",
            Commands::Delete { .. } => "Bot deletion",
            Commands::Run(_) => "Bot startup",
        }
    }

    pub fn full_trace(&self) -> bool {
        match self {
            Commands::New { full_trace, .. } | Commands::Delete { full_trace, .. } => *full_trace,
            Commands::Run(args) => args.full_trace,
        }
    }

    /// Default tracing level when `RUST_LOG` is unset.
    pub fn log_level(&self) -> &'static str {
        match self {
            Commands::Run(args) if args.debug => "debug",
            _ => "warn",
        }
    }
}
