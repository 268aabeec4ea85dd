//! surfgram: scaffold, configure and run Telegram bot projects.

use std::path::PathBuf;
use std::process::ExitCode;

use clap::Parser;
use surfgram_cli::{execute, present, Cli, Console, Interrupts, LOG_FILE_ENV};
use surfgram_core::init_tracing;

#[tokio::main]
async fn main() -> ExitCode {
    dotenvy::dotenv().ok();

    let cli = Cli::parse();

    let log_file = std::env::var_os(LOG_FILE_ENV).map(PathBuf::from);
    if let Err(e) = init_tracing(cli.command.log_level(), log_file.as_deref()) {
        eprintln!("Failed to initialize logging: {:#}", e);
    }

    let console = Console::new(!cli.no_graphics);
    console.print_banner();
    let interrupts = Interrupts::install(console);

    let operation = cli.command.operation();
    let full_trace = cli.command.full_trace();
    let result = execute(cli.command, &console, &interrupts).await;
    present(&console, operation, full_trace, result)
}
