use assert_cmd::Command;
use std::path::PathBuf;
use tempfile::TempDir;
use uuid::Uuid;

/// Test harness for running CLI commands against a temporary database
pub struct CliTestHarness {
    temp_dir: TempDir,
    db_path: PathBuf,
    family_id: Uuid,
    env: Vec<(String, String)>,
}

impl CliTestHarness {
    /// Create a new test harness with a temporary database
    pub fn new() -> Self {
        let temp_dir = tempfile::tempdir().expect("Failed to create temp directory");
        let db_path = temp_dir.path().join("test.db");

        Self {
            temp_dir,
            db_path,
            family_id: Uuid::now_v7(),
            env: Vec::new(),
        }
    }

    /// Adds an environment override to every command this harness runs
    pub fn with_env(mut self, key: &str, value: &str) -> Self {
        self.env.push((key.to_string(), value.to_string()));
        self
    }

    /// Get a Command instance configured for testing
    pub fn command(&self) -> Command {
        let mut cmd = Command::cargo_bin("hearth").expect("Failed to find hearth binary");

        // Run inside the temp dir so no stray hearth.toml is picked up
        cmd.current_dir(self.temp_dir.path());
        cmd.env("HEARTH_DATABASE_PATH", &self.db_path);
        cmd.env_remove("HEARTH_DEFAULT_FAMILY");
        cmd.env_remove("HEARTH_LOG");
        for (key, value) in &self.env {
            cmd.env(key, value);
        }

        cmd
    }

    pub fn family(&self) -> String {
        self.family_id.to_string()
    }

    /// Helper to run a command and assert success
    pub fn run_success(&self, args: &[&str]) -> assert_cmd::assert::Assert {
        self.command().args(args).assert().success()
    }

    /// Helper to run a command and assert failure
    pub fn run_failure(&self, args: &[&str]) -> assert_cmd::assert::Assert {
        self.command().args(args).assert().failure()
    }

    /// Runs a command and returns its stdout
    pub fn stdout_of(&self, args: &[&str]) -> String {
        let output = self.run_success(args).get_output().stdout.clone();
        String::from_utf8(output).expect("stdout is not UTF-8")
    }

    /// Adds a pattern for this harness's family and returns its full ID
    pub fn add_pattern(&self, title: &str, extra: &[&str]) -> String {
        let family = self.family();
        let mut args = vec!["pattern", "add", title, "--family", family.as_str()];
        args.extend_from_slice(extra);
        let stdout = self.stdout_of(&args);
        pattern_id_in(&stdout).expect("pattern add did not print an ID")
    }
}

/// Pulls the full pattern ID out of `pattern add` output
pub fn pattern_id_in(output: &str) -> Option<String> {
    output
        .lines()
        .find(|line| line.contains("Pattern ID:"))
        .and_then(|line| line.split_whitespace().last())
        .map(str::to_string)
}

/// Short IDs (8 hex characters) shown in the ID column of a task table
pub fn short_ids_in(output: &str) -> Vec<String> {
    output
        .split(|c: char| !c.is_ascii_alphanumeric())
        .filter(|token| token.len() == 8 && token.chars().all(|c| c.is_ascii_hexdigit()))
        .map(str::to_string)
        .collect()
}

/// Utility functions for test assertions
pub mod assertions {
    use predicates::prelude::*;

    /// Predicate to check if output contains task table headers
    pub fn has_task_table_headers() -> impl Predicate<str> {
        predicate::str::contains("ID")
            .and(predicate::str::contains("Title"))
            .and(predicate::str::contains("Status"))
    }

    /// Predicate to check if output contains pattern table headers
    pub fn has_pattern_table_headers() -> impl Predicate<str> {
        predicate::str::contains("Schedule").and(predicate::str::contains("Active"))
    }

    /// Predicate to check for error messages
    pub fn has_error() -> impl Predicate<str> {
        predicate::str::contains("Error").or(predicate::str::contains("error"))
    }
}
