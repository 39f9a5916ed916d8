use assert_cmd::Command;
use serde_json::Value;
use std::{fs, path::PathBuf};
use tempfile::tempdir;

fn data_dir() -> String {
    let manifest_dir = PathBuf::from(env!("CARGO_MANIFEST_DIR"));
    manifest_dir
        .parent()
        .unwrap()
        .parent()
        .unwrap()
        .join("test_data")
        .to_str()
        .unwrap()
        .to_string()
}

fn run_session(args: &[&str]) -> Value {
    let data = data_dir();
    let mut cmd = Command::cargo_bin("gaitlab").unwrap();
    cmd.args(["session", "--data-dir", &data]).args(args);
    let output = cmd.assert().success().get_output().stdout.clone();
    serde_json::from_slice(&output).unwrap()
}

const CONFIRM_ALL: &str =
    "start,touch:participantId,touch:trialType,touch:conditions,touch:materials,confirm";

#[test]
fn pending_trial_runs_to_review() {
    let events = format!("{CONFIRM_ALL},toggle,tick:3,toggle,tick:2,stop");
    let report = run_session(&["--animal", "1", "--trial", "12", "--events", &events]);
    let snapshot = &report["snapshot"];
    assert_eq!(snapshot["view"]["active_screen"], "TrialControl");
    assert_eq!(snapshot["view"]["selected_trial"]["id"], 12);
    assert_eq!(snapshot["session"]["step"], "Review");
    assert_eq!(snapshot["session"]["run_status"], "Completed");
    assert_eq!(snapshot["session"]["elapsed_secs"], 2.0);
    // tick while paused
    let refused = report["refused"].as_array().unwrap();
    assert_eq!(refused.len(), 1);
    assert!(refused[0]["reason"].as_str().unwrap().contains("NotRecording"));
}

#[test]
fn confirm_waits_for_every_field() {
    let report = run_session(&[
        "--animal",
        "1",
        "--trial",
        "12",
        "--events",
        "start,touch:participantId,touch:trialType,confirm",
    ]);
    let session = &report["snapshot"]["session"];
    assert_eq!(session["step"], "Confirmation");
    assert_eq!(session["touched"]["participantId"], true);
    assert_eq!(session["touched"]["materials"], false);
    assert!(report["refused"][0]["reason"]
        .as_str()
        .unwrap()
        .contains("remaining: 2"));
}

#[test]
fn back_is_refused_while_recording() {
    let events = format!("{CONFIRM_ALL},back");
    let report = run_session(&["--animal", "1", "--trial", "12", "--events", &events]);
    assert_eq!(report["snapshot"]["view"]["active_screen"], "TrialControl");
    assert_eq!(report["snapshot"]["session"]["step"], "Running");
    assert!(report["refused"][0]["reason"]
        .as_str()
        .unwrap()
        .contains("RunInProgress"));
}

#[test]
fn completed_trial_goes_straight_to_review() {
    let report = run_session(&[
        "--animal", "1", "--trial", "11", "--events", "start,review,back,back",
    ]);
    let snapshot = &report["snapshot"];
    // the first back completes the review, the second leaves trial control
    assert_eq!(snapshot["view"]["active_screen"], "AnimalDetail");
    assert!(snapshot["session"].is_null());
    assert!(snapshot["view"]["selected_trial"].is_null());
    let refused = report["refused"].as_array().unwrap();
    assert_eq!(refused.len(), 1);
    assert!(refused[0]["reason"]
        .as_str()
        .unwrap()
        .contains("TrialAlreadyCompleted"));
}

#[test]
fn strict_mode_fails_on_refusal() {
    let data = data_dir();
    Command::cargo_bin("gaitlab")
        .unwrap()
        .args([
            "session", "--data-dir", &data, "--animal", "3", "--trial", "31", "--events",
            "start", "--strict",
        ])
        .assert()
        .failure();
}

#[test]
fn oversized_tick_is_an_error() {
    let data = data_dir();
    let events = format!("{CONFIRM_ALL},tick:1e300");
    let assert = Command::cargo_bin("gaitlab")
        .unwrap()
        .args([
            "session", "--data-dir", &data, "--animal", "1", "--trial", "12", "--events", &events,
        ])
        .assert()
        .failure();
    let stderr = String::from_utf8(assert.get_output().stderr.clone()).unwrap();
    assert!(stderr.contains("out of range"));
}

#[test]
fn review_export_writes_report() {
    let temp = tempdir().unwrap();
    let out = temp.path().join("review.json");
    let data = data_dir();
    Command::cargo_bin("gaitlab")
        .unwrap()
        .args([
            "review-export",
            "--data-dir",
            &data,
            "--animal",
            "2",
            "--trial",
            "21",
            "--out",
            out.to_str().unwrap(),
        ])
        .assert()
        .success();
    let report: Value = serde_json::from_str(&fs::read_to_string(&out).unwrap()).unwrap();
    assert_eq!(report["animal"]["name"], "Ewe 0102");
    assert_eq!(report["trial"]["id"], 21);
    assert!(!report["samples"].as_array().unwrap().is_empty());
}

#[test]
fn checklist_lists_gate_fields() {
    let data = data_dir();
    let output = Command::cargo_bin("gaitlab")
        .unwrap()
        .args([
            "checklist", "--data-dir", &data, "--animal", "1", "--trial", "12",
        ])
        .assert()
        .success()
        .get_output()
        .stdout
        .clone();
    let items: Value = serde_json::from_slice(&output).unwrap();
    let keys: Vec<_> = items
        .as_array()
        .unwrap()
        .iter()
        .map(|item| item["key"].as_str().unwrap().to_string())
        .collect();
    assert_eq!(
        keys,
        ["participantId", "trialType", "conditions", "materials"]
    );
    assert_eq!(items[0]["value"], "Ewe 0101");
}
