//! Tracing setup shared by the web service and the batch CLI.
//!
//! Events go to the terminal and are appended to a log file, which is where handler failures
//! hidden from HTTP callers can be read back. The file defaults to `logs/pdfchat.log`;
//! `PDFCHAT_LOG_FILE` points it elsewhere.
use std::path::PathBuf;
use std::sync::OnceLock;

use tracing_appender::non_blocking::{NonBlocking, WorkerGuard};
use tracing_subscriber::{EnvFilter, fmt, prelude::*};

const LOG_FILE_ENV: &str = "PDFCHAT_LOG_FILE";
const DEFAULT_LOG_FILE: &str = "logs/pdfchat.log";

// Dropping the guard would stop the background writer; keep it for the whole process.
static FILE_GUARD: OnceLock<WorkerGuard> = OnceLock::new();

/// Start tracing for the web service: `info` and above unless `RUST_LOG` says otherwise.
pub fn init_tracing() {
    init_tracing_with("info");
}

/// Start tracing with `default_directive` as the filter used when `RUST_LOG` is unset or invalid.
///
/// `.env` is read first so `RUST_LOG` and `PDFCHAT_LOG_FILE` declared there take effect. The
/// batch CLI passes `warn` to keep its console output readable.
pub fn init_tracing_with(default_directive: &str) {
    dotenvy::dotenv().ok();
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_directive));
    let console = fmt::layer().with_target(false).compact();
    let file = open_log_file().map(|writer| {
        fmt::layer()
            .with_writer(writer)
            .with_ansi(false)
            .compact()
    });

    tracing_subscriber::registry()
        .with(filter)
        .with(console)
        .with(file)
        .init();
}

/// Where the file layer writes: `PDFCHAT_LOG_FILE` when set and non-blank, else the default.
fn log_file_path() -> PathBuf {
    std::env::var(LOG_FILE_ENV)
        .ok()
        .filter(|value| !value.trim().is_empty())
        .map_or_else(|| PathBuf::from(DEFAULT_LOG_FILE), PathBuf::from)
}

/// Open the log file for appending, creating its directory if needed.
///
/// File logging is skipped (with a note on stderr) when the file cannot be opened; the console
/// layer still runs.
fn open_log_file() -> Option<NonBlocking> {
    let path = log_file_path();
    if let Some(parent) = path.parent().filter(|parent| !parent.as_os_str().is_empty()) {
        if let Err(err) = std::fs::create_dir_all(parent) {
            eprintln!("Log directory {} unavailable: {err}", parent.display());
            return None;
        }
    }
    let file = match std::fs::OpenOptions::new()
        .create(true)
        .append(true)
        .open(&path)
    {
        Ok(file) => file,
        Err(err) => {
            eprintln!("Log file {} unavailable: {err}", path.display());
            return None;
        }
    };
    let (writer, guard) = tracing_appender::non_blocking(file);
    let _ = FILE_GUARD.set(guard);
    Some(writer)
}
