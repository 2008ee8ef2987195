use assert_cmd::Command;
use assert_cmd::cargo::cargo_bin_cmd;
use assert_fs::prelude::*;
use predicates::prelude::*;
use serde_json::Value;

/// Run clair with given args, colors off.
fn clair() -> Command {
    let mut cmd = cargo_bin_cmd!("clair");
    cmd.env("NO_COLOR", "1")
        .env("CLICOLOR", "0")
        .env_remove("CLAIR_DIR")
        .env_remove("CLAIR_LOG");
    cmd
}

fn init(dir: &assert_fs::TempDir) {
    clair().current_dir(dir.path()).arg("init").assert().success();
}

/// Every line of the audit log, parsed.
fn stored_entries(dir: &assert_fs::TempDir) -> Vec<Value> {
    let content = std::fs::read_to_string(dir.path().join(".clair/audit.log")).unwrap();
    content
        .lines()
        .filter(|l| !l.trim().is_empty())
        .map(|l| serde_json::from_str(l).unwrap())
        .collect()
}

fn record_view(dir: &assert_fs::TempDir, entity_id: &str) {
    clair()
        .current_dir(dir.path())
        .args([
            "record",
            "--action",
            "view",
            "--entity",
            "patient",
            "--entity-id",
            entity_id,
            "--description",
            "opened resident file",
            "--module",
            "patients",
            "--role",
            "nurse",
            "--name",
            "Jean Dupont",
        ])
        .assert()
        .success();
}

fn log_json(dir: &assert_fs::TempDir, extra: &[&str]) -> Value {
    let out = clair()
        .current_dir(dir.path())
        .args(["log", "--json"])
        .args(extra)
        .assert()
        .success()
        .get_output()
        .stdout
        .clone();
    serde_json::from_slice(&out).unwrap()
}

// ─── Init ────────────────────────────────────────────────────────

#[test]
fn init_creates_config_and_log() {
    let dir = assert_fs::TempDir::new().unwrap();
    init(&dir);

    dir.child(".clair/config.toml")
        .assert(predicate::str::contains("[audit]"));
    dir.child(".clair/audit.log").assert(predicate::path::exists());
}

#[test]
fn init_twice_fails() {
    let dir = assert_fs::TempDir::new().unwrap();
    init(&dir);

    clair()
        .current_dir(dir.path())
        .arg("init")
        .assert()
        .failure()
        .stderr(predicate::str::contains("already initialized"));
}

#[test]
fn commands_require_init() {
    let dir = assert_fs::TempDir::new().unwrap();

    clair()
        .current_dir(dir.path())
        .arg("log")
        .assert()
        .failure()
        .stderr(predicate::str::contains("clair init"));
}

#[test]
fn custom_dir_flag_is_used() {
    let dir = assert_fs::TempDir::new().unwrap();

    clair()
        .current_dir(dir.path())
        .args(["--dir", "trail", "init"])
        .assert()
        .success();

    dir.child("trail/config.toml").assert(predicate::path::exists());
}

// ─── Record ──────────────────────────────────────────────────────

#[test]
fn record_defaults_to_low_severity_and_success() {
    let dir = assert_fs::TempDir::new().unwrap();
    init(&dir);
    record_view(&dir, "p-1");

    let entries = stored_entries(&dir);
    assert_eq!(entries.len(), 1);
    assert_eq!(entries[0]["severity"], "low");
    assert_eq!(entries[0]["success"], true);
    assert_eq!(entries[0]["userName"], "Jean Dupont");
    assert!(entries[0].get("ipAddress").is_none());
}

#[test]
fn record_update_tracks_changed_fields() {
    let dir = assert_fs::TempDir::new().unwrap();
    init(&dir);

    clair()
        .current_dir(dir.path())
        .args([
            "record",
            "--action",
            "update",
            "--entity",
            "resident",
            "--entity-id",
            "r-7",
            "--description",
            "deactivate resident",
            "--module",
            "admin",
            "--previous",
            r#"{"isActive": true, "room": "12B"}"#,
            "--new",
            r#"{"isActive": false, "room": "12B"}"#,
        ])
        .assert()
        .success()
        .stdout(predicate::str::contains("Changed fields: isActive"));

    let page = log_json(&dir, &["--entity", "resident"]);
    assert_eq!(page["total"], 1);
    assert_eq!(page["entries"][0]["changedFields"], serde_json::json!(["isActive"]));
}

#[test]
fn record_snapshot_from_file() {
    let dir = assert_fs::TempDir::new().unwrap();
    init(&dir);
    dir.child("before.json")
        .write_str(r#"{"dose": "5mg", "meta": {"a": 1, "b": 2}}"#)
        .unwrap();
    dir.child("after.json")
        .write_str(r#"{"meta": {"b": 2, "a": 1}, "dose": "10mg"}"#)
        .unwrap();

    clair()
        .current_dir(dir.path())
        .args([
            "record",
            "--action",
            "update",
            "--entity",
            "medication",
            "--description",
            "dose change",
            "--module",
            "observations",
            "--previous",
            "@before.json",
            "--new",
            "@after.json",
        ])
        .assert()
        .success();

    let entries = stored_entries(&dir);
    assert_eq!(entries[0]["changedFields"], serde_json::json!(["dose"]));
}

#[test]
fn record_uses_real_ip_when_no_forwarded_for() {
    let dir = assert_fs::TempDir::new().unwrap();
    init(&dir);

    clair()
        .current_dir(dir.path())
        .args([
            "record",
            "--action",
            "view",
            "--entity",
            "report",
            "--description",
            "read shift report",
            "--module",
            "reports",
            "--header",
            "X-Real-IP: 10.0.0.5",
            "--header",
            "User-Agent: Mozilla/5.0",
        ])
        .assert()
        .success();

    let entries = stored_entries(&dir);
    assert_eq!(entries[0]["ipAddress"], "10.0.0.5");
    assert_eq!(entries[0]["userAgent"], "Mozilla/5.0");
}

#[test]
fn record_without_ip_headers_stores_unknown() {
    let dir = assert_fs::TempDir::new().unwrap();
    init(&dir);

    clair()
        .current_dir(dir.path())
        .args([
            "record",
            "--action",
            "view",
            "--entity",
            "report",
            "--description",
            "read shift report",
            "--module",
            "reports",
            "--header",
            "accept: text/html",
        ])
        .assert()
        .success();

    assert_eq!(stored_entries(&dir)[0]["ipAddress"], "unknown");
}

#[test]
fn record_failure_with_metadata() {
    let dir = assert_fs::TempDir::new().unwrap();
    init(&dir);

    clair()
        .current_dir(dir.path())
        .args([
            "record",
            "--action",
            "send_communication",
            "--entity",
            "communication",
            "--description",
            "notify family",
            "--module",
            "communications",
            "--severity",
            "high",
            "--failed",
            "--error",
            "SMS gateway timeout",
            "--duration",
            "1250",
            "--meta",
            "channel=sms",
            "--meta",
            "attempts=3",
        ])
        .assert()
        .success();

    let entry = &stored_entries(&dir)[0];
    assert_eq!(entry["success"], false);
    assert_eq!(entry["severity"], "high");
    assert_eq!(entry["errorMessage"], "SMS gateway timeout");
    assert_eq!(entry["duration"], 1250);
    assert_eq!(entry["metadata"]["channel"], "sms");
    assert_eq!(entry["metadata"]["attempts"], 3);
}

#[test]
fn record_rejects_unknown_action() {
    let dir = assert_fs::TempDir::new().unwrap();
    init(&dir);

    clair()
        .current_dir(dir.path())
        .args([
            "record",
            "--action",
            "teleport",
            "--entity",
            "patient",
            "--description",
            "x",
            "--module",
            "patients",
        ])
        .assert()
        .failure()
        .stderr(predicate::str::contains("Unknown action 'teleport'"));

    assert!(stored_entries(&dir).is_empty());
}

#[test]
fn storage_failure_does_not_fail_the_command() {
    let dir = assert_fs::TempDir::new().unwrap();
    init(&dir);

    // A directory where the log file should be makes every append fail.
    std::fs::remove_file(dir.path().join(".clair/audit.log")).unwrap();
    std::fs::create_dir(dir.path().join(".clair/audit.log")).unwrap();

    clair()
        .current_dir(dir.path())
        .args([
            "record",
            "--action",
            "view",
            "--entity",
            "patient",
            "--description",
            "x",
            "--module",
            "patients",
        ])
        .assert()
        .success()
        .stdout(predicate::str::contains("could not be stored"))
        .stderr(predicate::str::contains("failed to write audit entry"));
}

#[test]
fn disabled_auditing_records_nothing() {
    let dir = assert_fs::TempDir::new().unwrap();
    init(&dir);
    dir.child(".clair/config.toml")
        .write_str("[clair]\nversion = \"0.1.0\"\n\n[audit]\nenabled = false\nlog_file = \"audit.log\"\n")
        .unwrap();

    clair()
        .current_dir(dir.path())
        .args([
            "record",
            "--action",
            "view",
            "--entity",
            "patient",
            "--description",
            "x",
            "--module",
            "patients",
        ])
        .assert()
        .success()
        .stdout(predicate::str::contains("disabled"));

    assert!(stored_entries(&dir).is_empty());
}

// ─── Auth / Bulk ─────────────────────────────────────────────────

#[test]
fn failed_login_attempt_is_medium_severity() {
    let dir = assert_fs::TempDir::new().unwrap();
    init(&dir);

    clair()
        .current_dir(dir.path())
        .args([
            "auth",
            "login_attempt",
            "--name",
            "Sam",
            "--role",
            "replacement",
            "--replacement",
            "--failed",
            "--error",
            "unknown user",
        ])
        .assert()
        .success()
        .stdout(predicate::str::contains("medium severity"));

    clair()
        .current_dir(dir.path())
        .args(["auth", "login", "--name", "Jean", "--role", "nurse"])
        .assert()
        .success();

    let entries = stored_entries(&dir);
    assert_eq!(entries[0]["severity"], "medium");
    assert_eq!(entries[0]["module"], "auth");
    assert_eq!(entries[0]["entity"], "auth");
    assert_eq!(entries[0]["isReplacement"], true);
    assert_eq!(entries[1]["severity"], "low");
    assert_eq!(entries[1]["description"], "login by Jean");
}

#[test]
fn auth_rejects_non_auth_action() {
    let dir = assert_fs::TempDir::new().unwrap();
    init(&dir);

    clair()
        .current_dir(dir.path())
        .args(["auth", "delete", "--name", "Jean"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("not an auth action"));
}

#[test]
fn bulk_records_ids_and_count() {
    let dir = assert_fs::TempDir::new().unwrap();
    init(&dir);

    clair()
        .current_dir(dir.path())
        .args([
            "bulk",
            "delete",
            "--entity",
            "observation",
            "--ids",
            "o1,o2,o3",
            "--description",
            "remove duplicates",
            "--module",
            "observations",
            "--name",
            "Claire",
            "--role",
            "admin",
        ])
        .assert()
        .success();

    let entry = &stored_entries(&dir)[0];
    assert_eq!(entry["action"], "bulk_delete");
    assert_eq!(entry["severity"], "medium");
    assert_eq!(entry["metadata"]["affectedIds"], serde_json::json!(["o1", "o2", "o3"]));
    assert_eq!(entry["metadata"]["count"], 3);
}

// ─── Log ─────────────────────────────────────────────────────────

#[test]
fn log_shows_entries() {
    let dir = assert_fs::TempDir::new().unwrap();
    init(&dir);
    record_view(&dir, "p-1");

    clair()
        .current_dir(dir.path())
        .arg("log")
        .assert()
        .success()
        .stdout(predicate::str::contains("patient:p-1"))
        .stdout(predicate::str::contains("opened resident file"));
}

#[test]
fn log_is_newest_first_and_paginated() {
    let dir = assert_fs::TempDir::new().unwrap();
    init(&dir);
    for i in 0..5 {
        record_view(&dir, &format!("p-{i}"));
    }

    let page = log_json(&dir, &["--limit", "2"]);
    assert_eq!(page["total"], 5);
    assert_eq!(page["entries"].as_array().unwrap().len(), 2);
    assert_eq!(page["entries"][0]["entityId"], "p-4");
    assert_eq!(page["hasMore"], true);

    let last = log_json(&dir, &["--limit", "2", "--skip", "4"]);
    assert_eq!(last["total"], 5);
    assert_eq!(last["entries"].as_array().unwrap().len(), 1);
    assert_eq!(last["entries"][0]["entityId"], "p-0");
    assert_eq!(last["hasMore"], false);

    let past_end = log_json(&dir, &["--skip", "10"]);
    assert_eq!(past_end["total"], 5);
    assert!(past_end["entries"].as_array().unwrap().is_empty());
}

#[test]
fn log_hints_at_next_page() {
    let dir = assert_fs::TempDir::new().unwrap();
    init(&dir);
    for i in 0..3 {
        record_view(&dir, &format!("p-{i}"));
    }

    clair()
        .current_dir(dir.path())
        .args(["log", "--limit", "2"])
        .assert()
        .success()
        .stdout(predicate::str::contains("--skip 2"));
}

#[test]
fn log_accepts_largest_limit() {
    let dir = assert_fs::TempDir::new().unwrap();
    init(&dir);
    for i in 0..3 {
        record_view(&dir, &format!("p-{i}"));
    }

    clair()
        .current_dir(dir.path())
        .args(["log", "--limit", "18446744073709551615", "--skip", "1"])
        .assert()
        .success()
        .stdout(predicate::str::contains("More entries available").not());

    let page = log_json(&dir, &["--limit", "18446744073709551615", "--skip", "1"]);
    assert_eq!(page["entries"].as_array().unwrap().len(), 2);
    assert_eq!(page["hasMore"], false);
}

#[test]
fn log_filter_no_match() {
    let dir = assert_fs::TempDir::new().unwrap();
    init(&dir);
    record_view(&dir, "p-1");

    clair()
        .current_dir(dir.path())
        .args(["log", "--entity", "bristol"])
        .assert()
        .success()
        .stdout(predicate::str::contains("No audit entries found"));
}

#[test]
fn log_filters_by_outcome_and_date() {
    let dir = assert_fs::TempDir::new().unwrap();
    init(&dir);
    record_view(&dir, "p-1");
    clair()
        .current_dir(dir.path())
        .args(["auth", "login_attempt", "--name", "Sam", "--failed"])
        .assert()
        .success();

    let failed = log_json(&dir, &["--failed"]);
    assert_eq!(failed["total"], 1);
    assert_eq!(failed["entries"][0]["action"], "login_attempt");

    let future = log_json(&dir, &["--since", "2999-01-01"]);
    assert_eq!(future["total"], 0);
}

#[test]
fn log_rejects_zero_limit() {
    let dir = assert_fs::TempDir::new().unwrap();
    init(&dir);

    clair()
        .current_dir(dir.path())
        .args(["log", "--limit", "0"])
        .assert()
        .failure();
}

#[test]
fn malformed_log_reads_as_empty() {
    let dir = assert_fs::TempDir::new().unwrap();
    init(&dir);
    dir.child(".clair/audit.log").write_str("{broken\n").unwrap();

    let page = log_json(&dir, &[]);
    assert_eq!(page["total"], 0);
}
