use assert_cmd::Command;
use std::path::{Path, PathBuf};
use tempfile::TempDir;

/// Runs the binary inside a scratch directory so no stray calbridge.toml is picked up
pub struct CliTestHarness {
    temp_dir: TempDir,
}

impl CliTestHarness {
    pub fn new() -> Self {
        let temp_dir = tempfile::tempdir().expect("Failed to create temp directory");
        Self { temp_dir }
    }

    /// Get a Command instance configured for testing
    pub fn command(&self) -> Command {
        let mut cmd = Command::cargo_bin("calbridge").expect("Failed to find calbridge binary");
        cmd.current_dir(self.temp_dir.path())
            .env_remove("CALBRIDGE_OUTPUT")
            .env_remove("CALBRIDGE_LOG_LEVEL")
            .env_remove("CALBRIDGE_PREVIEW_COUNT")
            .env("CALBRIDGE_DEFAULT_TIMEZONE", "UTC");
        cmd
    }

    pub fn dir(&self) -> &Path {
        self.temp_dir.path()
    }

    /// Write a file into the scratch directory and return its path
    pub fn write_file(&self, name: &str, contents: &str) -> PathBuf {
        let path = self.temp_dir.path().join(name);
        std::fs::write(&path, contents).expect("Failed to write fixture file");
        path
    }

    pub fn run_success(&self, args: &[&str]) -> assert_cmd::assert::Assert {
        self.command().args(args).assert().success()
    }

    pub fn run_failure(&self, args: &[&str]) -> assert_cmd::assert::Assert {
        self.command().args(args).assert().failure()
    }

    /// Run with `--json` and parse stdout
    pub fn run_json(&self, args: &[&str]) -> serde_json::Value {
        let output = self
            .command()
            .arg("--json")
            .args(args)
            .output()
            .expect("Failed to run calbridge");
        assert!(
            output.status.success(),
            "command failed: {}",
            String::from_utf8_lossy(&output.stderr)
        );
        serde_json::from_slice(&output.stdout).expect("stdout is not JSON")
    }
}

/// Common test fixtures
pub struct TestFixtures;

impl TestFixtures {
    pub fn weekly_event() -> &'static str {
        r#"{
            "title": "Standup",
            "startDate": "2025-06-02T09:00:00.000Z",
            "endDate": "2025-06-02T09:15:00.000Z",
            "timeZone": "UTC",
            "recurrenceRule": { "frequency": "weekly", "occurrence": 4 },
            "alarms": [{ "relativeOffset": -10 }]
        }"#
    }

    pub fn unbounded_event() -> &'static str {
        r#"{
            "title": "Daily sync",
            "startDate": "2025-06-01T08:00:00.000Z",
            "endDate": "2025-06-01T08:30:00.000Z",
            "recurrenceRule": { "frequency": "daily" }
        }"#
    }

    pub fn event_list() -> String {
        format!(
            r#"[{}, {{
                "title": "Dentist",
                "startDate": 1749027600000,
                "endDate": 1749031200000
            }}]"#,
            Self::weekly_event()
        )
    }
}

pub mod assertions {
    use predicates::prelude::*;

    pub fn has_rule_table_headers() -> impl Predicate<str> {
        predicate::str::contains("Field")
            .and(predicate::str::contains("Frequency"))
            .and(predicate::str::contains("Ends"))
    }

    pub fn is_error() -> impl Predicate<str> {
        predicate::str::contains("Error:")
    }
}
