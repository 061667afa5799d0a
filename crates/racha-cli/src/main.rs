//! racha - command-line client for the racha shared-expense backend.
//!
//! Keeps the login session between runs and offers the read-mostly parts of
//! the app: listing groups, balances and joining by invite code.

mod app;

use std::io;

use anyhow::Result;
use tracing::info;
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use racha_core::Config;

use app::App;

// ============================================================================
// Constants
// ============================================================================

/// Log file name inside the data directory
const LOG_FILE_NAME: &str = "racha.log";

const USAGE: &str = "\
Usage: racha <command>

Commands:
  status            Show whether a session is active and when it expires
  login [email]     Sign in (prompts for the password)
  register          Create an account and sign in
  logout            End the session
  whoami            Show the signed-in user
  groups            List your groups
  group <id>        Show a group's balances
  join <code>       Join a group with an invite code
  check             Check that the backend is reachable";

/// Initialize the tracing subscriber for logging.
///
/// Logs go to a file in the data directory so command output stays clean.
/// Falls back to stderr when the directory cannot be used.
fn init_tracing(config: &Config) -> Option<WorkerGuard> {
    // Use RUST_LOG env var to control log level (e.g., RUST_LOG=debug)
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));

    let log_dir = config
        .data_dir()
        .ok()
        .filter(|dir| std::fs::create_dir_all(dir).is_ok());

    match log_dir {
        Some(dir) => {
            let appender = tracing_appender::rolling::never(dir, LOG_FILE_NAME);
            let (writer, guard) = tracing_appender::non_blocking(appender);
            tracing_subscriber::registry()
                .with(fmt::layer().with_writer(writer).with_ansi(false))
                .with(filter)
                .init();
            Some(guard)
        }
        None => {
            tracing_subscriber::registry()
                .with(fmt::layer().with_writer(io::stderr))
                .with(filter)
                .init();
            None
        }
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    // Load .env file if present (silently ignore if not found)
    let _ = dotenvy::dotenv();

    let args: Vec<String> = std::env::args().skip(1).collect();
    let Some(command) = args.first().map(String::as_str) else {
        eprintln!("{}", USAGE);
        std::process::exit(2);
    };
    if matches!(command, "help" | "-h" | "--help") {
        println!("{}", USAGE);
        return Ok(());
    }

    let config = Config::from_env();
    let log_guard = init_tracing(&config);
    info!(command, backend = %config.backend_url, "racha starting");

    let app = App::new(config).await?;
    let code = run(&app, command, args.get(1).map(String::as_str)).await;
    app.shutdown();
    info!(code, "racha shutting down");

    // Flush the log file before exiting
    drop(log_guard);
    std::process::exit(code);
}

/// Dispatch one command, returning the process exit code
async fn run(app: &App, command: &str, arg: Option<&str>) -> i32 {
    let result = match (command, arg) {
        ("status", _) => app.status().await,
        ("login", email) => app.login(email).await,
        ("register", _) => app.register().await,
        ("logout", _) => app.logout().await,
        ("whoami", _) => app.whoami().await,
        ("groups", _) => app.groups().await,
        ("group", Some(id)) => app.group(id).await,
        ("join", Some(code)) => app.join(code).await,
        ("check", _) => app.check().await,
        ("group", None) | ("join", None) => {
            eprintln!("Missing argument for '{}'\n\n{}", command, USAGE);
            return 2;
        }
        _ => {
            eprintln!("Unknown command '{}'\n\n{}", command, USAGE);
            return 2;
        }
    };

    match result {
        Ok(()) => 0,
        Err(e) => {
            eprintln!("Error: {:#}", e);
            1
        }
    }
}
