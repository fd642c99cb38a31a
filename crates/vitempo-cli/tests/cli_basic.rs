//! Basic CLI E2E tests.
//!
//! Each test runs the built binary against its own data directory.

use std::io::Write;
use std::process::{Command, Stdio};

struct Cli {
    home: tempfile::TempDir,
}

impl Cli {
    fn new() -> Self {
        Self {
            home: tempfile::tempdir().expect("tempdir"),
        }
    }

    fn command(&self, args: &[&str]) -> Command {
        let mut cmd = Command::new(env!("CARGO_BIN_EXE_vitempo"));
        cmd.args(args).env("VITEMPO_HOME", self.home.path()).env_remove("VITEMPO_LOG");
        cmd
    }

    /// Run a CLI command and return (stdout, stderr, code).
    fn run(&self, args: &[&str]) -> (String, String, i32) {
        let output = self.command(args).output().expect("Failed to execute CLI command");
        (
            String::from_utf8_lossy(&output.stdout).to_string(),
            String::from_utf8_lossy(&output.stderr).to_string(),
            output.status.code().unwrap_or(-1),
        )
    }

    fn ok(&self, args: &[&str]) -> String {
        let (stdout, stderr, code) = self.run(args);
        assert_eq!(code, 0, "{args:?} failed: {stderr}");
        stdout
    }

    fn run_session(&self, args: &[&str], input: &str) -> Vec<serde_json::Value> {
        let mut child = self
            .command(args)
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .spawn()
            .expect("spawn");
        child
            .stdin
            .take()
            .unwrap()
            .write_all(input.as_bytes())
            .unwrap();
        let output = child.wait_with_output().unwrap();
        assert!(output.status.success(), "{}", String::from_utf8_lossy(&output.stderr));
        String::from_utf8_lossy(&output.stdout)
            .lines()
            .map(|l| serde_json::from_str(l).expect("json line"))
            .collect()
    }
}

fn types(events: &[serde_json::Value]) -> Vec<&str> {
    events.iter().filter_map(|e| e["type"].as_str()).collect()
}

#[test]
fn test_technique_list() {
    let cli = Cli::new();
    let out = cli.ok(&["technique", "list"]);
    for id in ["pomodoro", "52-17", "90-minute", "timebox", "10-minute", "flowtime"] {
        assert!(out.contains(id), "missing {id}");
    }
    assert!(out.lines().any(|l| l.starts_with('*') && l.contains("pomodoro")));
}

#[test]
fn test_technique_show_formats_durations() {
    let cli = Cli::new();
    let out = cli.ok(&["technique", "show", "pomodoro"]);
    assert!(out.contains("Work:        25 minutes"), "{out}");
    assert!(out.contains("Long break:  15 minutes every 4 cycles"), "{out}");

    cli.ok(&["settings", "set", "workDuration", "90", "--technique", "pomodoro"]);
    let out = cli.ok(&["technique", "show", "pomodoro"]);
    assert!(out.contains("Work:        1 hour 30 minutes"), "{out}");
}

#[test]
fn test_technique_use_updates_config() {
    let cli = Cli::new();
    cli.ok(&["technique", "use", "flowtime"]);
    assert_eq!(cli.ok(&["config", "get", "active_technique"]).trim(), "flowtime");
    let (_, stderr, code) = cli.run(&["technique", "use", "kanban"]);
    assert_ne!(code, 0);
    assert!(!stderr.is_empty());
}

#[test]
fn test_settings_set_and_reset() {
    let cli = Cli::new();
    cli.ok(&["settings", "set", "workDuration", "50"]);
    let shown: serde_json::Value = serde_json::from_str(&cli.ok(&["settings", "show"])).unwrap();
    assert_eq!(shown["workDuration"], 3_000_000);

    let (_, stderr, code) = cli.run(&["settings", "set", "work_duration", "500"]);
    assert_eq!(code, 1);
    assert!(stderr.contains("workDuration"));

    cli.ok(&["settings", "reset"]);
    let shown: serde_json::Value = serde_json::from_str(&cli.ok(&["settings", "show"])).unwrap();
    assert_eq!(shown["workDuration"], 1_500_000);
}

#[test]
fn test_task_lifecycle() {
    let cli = Cli::new();
    let created: serde_json::Value =
        serde_json::from_str(&cli.ok(&["task", "add", "Write report", "-e", "2"])).unwrap();
    let id = created["id"].as_str().unwrap().to_string();
    assert_eq!(created["estimatedCycles"], 2);

    cli.ok(&["task", "add", "Review"]);
    let list = cli.ok(&["task", "list"]);
    assert!(list.contains("Write report"));

    cli.ok(&["task", "toggle", &id]);
    let json: serde_json::Value =
        serde_json::from_str(&cli.ok(&["task", "list", "--json"])).unwrap();
    assert_eq!(json["tasks"][0]["completedCycles"], 2);

    let (_, stderr, code) = cli.run(&["task", "current", &id]);
    assert_eq!(code, 1);
    assert!(stderr.contains("already complete"));

    cli.ok(&["task", "move", &id, "--to", "1"]);
    let json: serde_json::Value =
        serde_json::from_str(&cli.ok(&["task", "list", "--json"])).unwrap();
    assert_eq!(json["tasks"][1]["id"], id.as_str());

    cli.ok(&["task", "delete", &id]);
    let (_, stderr, code) = cli.run(&["task", "delete", &id]);
    assert_eq!(code, 1);
    assert!(stderr.contains("Task not found"));
}

#[test]
fn test_task_add_rejects_blank_title() {
    let cli = Cli::new();
    let (_, stderr, code) = cli.run(&["task", "add", "   "]);
    assert_eq!(code, 1);
    assert!(stderr.contains("Task title is required"));
}

#[test]
fn test_config_get_set() {
    let cli = Cli::new();
    cli.ok(&["config", "set", "notifications.muted", "true"]);
    assert_eq!(cli.ok(&["config", "get", "notifications.muted"]).trim(), "true");
    assert!(cli.ok(&["config", "list"]).contains("tasks.per_technique = false"));

    let (_, _, code) = cli.run(&["config", "set", "notifications.volume", "3"]);
    assert_eq!(code, 1);

    cli.ok(&["config", "reset"]);
    assert_eq!(cli.ok(&["config", "get", "notifications.muted"]).trim(), "false");
}

#[test]
fn test_run_session_skip_credits_task() {
    let cli = Cli::new();
    cli.ok(&["settings", "set", "autoCheckTasksOnCompletion", "true"]);
    cli.ok(&["task", "add", "Focus block", "-e", "1"]);

    let events = cli.run_session(&["run", "--mute"], "start\nskip\nstatus\nquit\n");
    let kinds = types(&events);
    assert_eq!(kinds.first(), Some(&"state_snapshot"));
    assert!(kinds.contains(&"timer_started"));
    assert!(kinds.contains(&"work_cycle_completed"));
    assert!(kinds.contains(&"task_progressed"));

    // The snapshot requested by `status`, after the skip.
    let last = events
        .iter()
        .rev()
        .find(|e| e["type"] == "state_snapshot")
        .unwrap();
    assert_eq!(last["phase"], "short-break");
    assert_eq!(last["status"], "idle");

    let json: serde_json::Value =
        serde_json::from_str(&cli.ok(&["task", "list", "--json"])).unwrap();
    assert_eq!(json["tasks"][0]["completedCycles"], 1);
}

#[test]
fn test_completions() {
    let cli = Cli::new();
    let out = cli.ok(&["completions", "bash"]);
    assert!(out.contains("vitempo"));
}
