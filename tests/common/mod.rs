#![allow(dead_code)]

use std::{
    path::{Path, PathBuf},
    sync::Mutex,
};

use assert_cmd::Command;
use once_cell::sync::Lazy;
use tempfile::TempDir;

/// Holds TempDir guards so temporary folders live for the duration of the test run.
static TEST_DIRS: Lazy<Mutex<Vec<TempDir>>> = Lazy::new(|| Mutex::new(Vec::new()));

/// Creates an isolated `TALLY_HOME` for one test.
pub fn temp_home() -> PathBuf {
    let temp = TempDir::new().expect("create temp dir");
    let base = temp.path().to_path_buf();
    TEST_DIRS.lock().expect("lock temp dir registry").push(temp);
    base
}

/// `tally` binary pointed at `home`, isolated from the caller's environment.
pub fn tally(home: &Path) -> Command {
    let mut cmd = Command::cargo_bin("tally").expect("tally binary");
    cmd.env("TALLY_HOME", home)
        .env_remove("TALLY_ADMIN_SECRET")
        .env_remove("RUST_LOG");
    cmd
}

/// Adds a daily rule through the CLI and returns its id.
pub fn add_daily_rule(home: &Path, user: &str, description: &str, start: &str) -> String {
    let output = tally(home)
        .args([
            "rules",
            "add",
            "--user",
            user,
            "--description",
            description,
            "--amount",
            "50",
            "--category",
            "Health",
            "--frequency",
            "daily",
            "--start",
            start,
        ])
        .output()
        .expect("run tally");
    assert!(output.status.success(), "rules add failed: {output:?}");
    let stdout = String::from_utf8(output.stdout).expect("utf8");
    stdout
        .lines()
        .find_map(|line| line.strip_prefix("Added rule "))
        .expect("rule id in output")
        .trim()
        .to_string()
}
