//! `tasksync`: task list with remote sync and offline cache.
//!
//! Every invocation loads the collection (remote first, local cache as a
//! fallback), runs one command and prints the resulting view.
//!
//! ```bash
//! # Against the default remote (http://127.0.0.1:8080/api)
//! cargo run --bin tasksync -- add "Water plants" --due 2025-06-01 --tags home
//!
//! # Without a remote
//! cargo run --bin tasksync -- --offline list --sort due-date
//!
//! # Or via environment variables
//! TASKSYNC_REMOTE_URL=http://tasks.lan/api cargo run -- toggle 3
//! ```

use std::path::Path;
use std::process::ExitCode;

use clap::Parser;
use tracing_appender::non_blocking::WorkerGuard;

use tasksync::app;
use tasksync::config::{CliArgs, ClientConfig};

#[tokio::main(flavor = "current_thread")]
async fn main() -> ExitCode {
    let cli = CliArgs::parse();

    let config = match ClientConfig::load(&cli) {
        Ok(c) => c,
        Err(e) => {
            eprintln!("error: {e}");
            return ExitCode::FAILURE;
        }
    };

    // Logs go to a file so they never mix with command output.
    let _log_guard = init_logging(&config.log_level, config.log_file.as_deref());
    tracing::info!(remote = %config.remote_url, offline = config.offline, "tasksync starting");

    let command = cli.command.unwrap_or_default();
    match app::execute(&config, command).await {
        Ok(output) => {
            print!("{output}");
            ExitCode::SUCCESS
        }
        Err(e) => {
            tracing::error!(error = %e, "command failed");
            eprintln!("error: {e}");
            ExitCode::FAILURE
        }
    }
}

/// Initialize file-based logging.
///
/// Returns a [`WorkerGuard`] that must be held until shutdown to ensure all
/// buffered log entries are flushed.
fn init_logging(level: &str, file_path: Option<&Path>) -> Option<WorkerGuard> {
    let default_path = std::env::temp_dir().join("tasksync.log");
    let log_path = file_path.unwrap_or(&default_path);

    let log_dir = log_path.parent()?;
    let file_name = log_path.file_name()?.to_str()?;

    let file_appender = tracing_appender::rolling::never(log_dir, file_name);
    let (non_blocking, guard) = tracing_appender::non_blocking(file_appender);

    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(level));

    tracing_subscriber::fmt()
        .with_writer(non_blocking)
        .with_env_filter(env_filter)
        .with_ansi(false)
        .init();

    Some(guard)
}
