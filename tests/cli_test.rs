//! Binary smoke tests.

use assert_cmd::Command;
use predicates::prelude::*;
use tempfile::TempDir;

fn nexarion(temp: &TempDir) -> Command {
    let mut cmd = Command::cargo_bin("nexarion").unwrap();
    cmd.arg("--state-file")
        .arg(temp.path().join("emotional_state.json"))
        .arg("--config")
        .arg(temp.path().join("config.toml"))
        .arg("--seed")
        .arg("42");
    cmd
}

#[test]
fn test_status_on_fresh_state() {
    let temp = TempDir::new().unwrap();
    nexarion(&temp)
        .arg("status")
        .assert()
        .success()
        .stdout(predicate::str::contains("\"dominant_name\": \"curiosity\""))
        .stdout(predicate::str::contains("\"mood\": \"positive\""))
        .stdout(predicate::str::contains("\"energy\": \"medium\""));

    assert!(!temp.path().join("emotional_state.json").exists());
}

#[test]
fn test_tick_saves_state() {
    let temp = TempDir::new().unwrap();
    nexarion(&temp).args(["tick", "3"]).assert().success();

    let path = temp.path().join("emotional_state.json");
    let saved = std::fs::read_to_string(&path).unwrap();
    assert!(saved.contains("\"current_emotions\""));
    assert!(saved.contains("\"emotional_entropy\""));

    nexarion(&temp)
        .arg("status")
        .assert()
        .success()
        .stdout(predicate::str::contains("curiosity"));
}

#[test]
fn test_corrupt_state_file_is_not_fatal() {
    let temp = TempDir::new().unwrap();
    std::fs::write(temp.path().join("emotional_state.json"), "[1, 2, 3]").unwrap();

    nexarion(&temp)
        .arg("status")
        .assert()
        .success()
        .stdout(predicate::str::contains("anxiety"));
}

#[test]
fn test_invalid_config_fails() {
    let temp = TempDir::new().unwrap();
    std::fs::write(temp.path().join("config.toml"), "tick_interval_secs = \"soon\"").unwrap();

    nexarion(&temp)
        .arg("status")
        .assert()
        .failure()
        .stderr(predicate::str::contains("Failed to load configuration"));
}

#[test]
fn test_chat_session_commands() {
    let temp = TempDir::new().unwrap();
    nexarion(&temp)
        .arg("chat")
        .write_stdin("hello there\nemotions\nsave\nexit\n")
        .assert()
        .success()
        .stdout(predicate::str::contains("I'm contemplating 'hello there'"))
        .stdout(predicate::str::contains("\"impulse_count\""))
        .stdout(predicate::str::contains("Saved to"));

    assert!(temp.path().join("emotional_state.json").exists());
}

#[test]
fn test_unknown_variant_rejected() {
    let temp = TempDir::new().unwrap();
    nexarion(&temp)
        .args(["--variant", "nonsense", "status"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("unknown persona variant"));
}

#[test]
fn test_init_writes_config_once() {
    let temp = TempDir::new().unwrap();
    nexarion(&temp)
        .args(["--variant", "emotional", "init"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Wrote default configuration"));

    let written = std::fs::read_to_string(temp.path().join("config.toml")).unwrap();
    assert!(written.contains("variant = \"emotional\""));
    assert!(written.contains("tick_interval_secs = 2"));

    nexarion(&temp)
        .arg("init")
        .assert()
        .failure()
        .stderr(predicate::str::contains("already exists"));

    nexarion(&temp).arg("status").assert().success();
}

#[test]
fn test_chat_report_for_emotional_variant() {
    let temp = TempDir::new().unwrap();
    nexarion(&temp)
        .args(["--variant", "emotional", "chat"])
        .write_stdin("what do you think about learning?\nreport\nexit\n")
        .assert()
        .success()
        .stdout(predicate::str::contains("Opinions held: 1"));
}

#[test]
fn test_improved_variant_saves_progress() {
    let temp = TempDir::new().unwrap();
    nexarion(&temp)
        .args(["--variant", "unified-improved", "chat"])
        .write_stdin("hello\nreport\nexit\n")
        .assert()
        .success()
        .stdout(predicate::str::contains("Overall progress"));

    assert!(temp.path().join("improvement_progress.json").exists());
}
