//! Common utilities for binary tests.

use std::io::Write;
use std::path::{Path, PathBuf};
use std::process::{Command, Stdio};

/// Returns the path to the novai binary built for this test run.
fn binary_path() -> PathBuf {
    PathBuf::from(env!("CARGO_BIN_EXE_novai"))
}

/// Builds a command isolated from the user's config and log directories.
fn command(home: &Path, args: &[&str]) -> Command {
    let mut cmd = Command::new(binary_path());
    cmd.args(["--config"])
        .arg(home.join("config.toml"))
        .args(args)
        .env("HOME", home)
        .env("XDG_CONFIG_HOME", home.join("config"))
        .env("XDG_STATE_HOME", home.join("state"))
        .env_remove("SNOWFLAKE_ACCOUNT")
        .env_remove("SNOWFLAKE_TOKEN")
        .env_remove("RUST_LOG");
    cmd
}

/// Runs novai with the given arguments, returning (exit code, stdout, stderr).
pub fn run_novai(home: &Path, args: &[&str]) -> (i32, String, String) {
    run_novai_with_input(home, args, "")
}

/// Runs novai with `input` written to its stdin.
pub fn run_novai_with_input(home: &Path, args: &[&str], input: &str) -> (i32, String, String) {
    let mut child = command(home, args)
        .stdin(Stdio::piped())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .spawn()
        .expect("Failed to execute command");

    if let Some(mut stdin) = child.stdin.take() {
        stdin
            .write_all(input.as_bytes())
            .expect("Failed to write stdin");
    }

    let output = child.wait_with_output().expect("Failed to wait for command");
    let exit_code = output.status.code().unwrap_or(-1);
    let stdout = String::from_utf8_lossy(&output.stdout).to_string();
    let stderr = String::from_utf8_lossy(&output.stderr).to_string();

    (exit_code, stdout, stderr)
}
