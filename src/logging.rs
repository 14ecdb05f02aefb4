//! Logging configuration for NovAi.
//!
//! The interactive chat writes its answers to stdout, so logs go to a file
//! there; one-shot mode logs to stderr.

use std::fs::{self, File};
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

fn env_filter() -> EnvFilter {
    EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"))
}

/// Initializes logging for the interactive chat.
///
/// Location: `~/.local/state/novai/novai.log` on Linux (XDG state directory),
/// or the platform-appropriate state/config directory on other systems.
pub fn init_file_logging() {
    let log_path = get_log_path();

    if let Some(parent) = log_path.parent() {
        if let Err(e) = fs::create_dir_all(parent) {
            eprintln!("Warning: Could not create log directory: {e}");
            return;
        }
    }

    // Truncate on each run to avoid unbounded growth
    let log_file = match File::create(&log_path) {
        Ok(f) => f,
        Err(e) => {
            eprintln!("Warning: Could not create log file: {e}");
            return;
        }
    };

    tracing_subscriber::fmt()
        .with_env_filter(env_filter())
        .with_writer(log_file)
        .with_ansi(false)
        .init();
}

/// Initializes logging for one-shot mode.
pub fn init_stderr_logging() {
    tracing_subscriber::fmt()
        .with_env_filter(env_filter())
        .with_writer(std::io::stderr)
        .init();
}

/// Returns the path for the log file.
pub fn get_log_path() -> PathBuf {
    state_path("novai.log")
}

/// Returns the path for the interactive chat history.
pub fn get_history_path() -> PathBuf {
    state_path("history.txt")
}

fn state_path(file_name: &str) -> PathBuf {
    if let Some(state_dir) = dirs::state_dir() {
        return state_dir.join("novai").join(file_name);
    }

    if let Some(config_dir) = dirs::config_dir() {
        return config_dir.join("novai").join(file_name);
    }

    std::env::temp_dir().join("novai").join(file_name)
}
