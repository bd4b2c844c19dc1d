//! End-to-end runs of the `admit` binary against throwaway databases.

use std::path::{Path, PathBuf};
use std::process::{Command, Output};
use std::time::{SystemTime, UNIX_EPOCH};

fn temp_dir(prefix: &str) -> PathBuf {
    let p = std::env::temp_dir().join(format!(
        "{}-{}-{}",
        prefix,
        std::process::id(),
        SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .expect("clock")
            .as_nanos()
    ));
    std::fs::create_dir_all(&p).expect("create temp dir");
    p
}

fn admit(dir: &Path, backend: &str, args: &[&str]) -> Output {
    let exe = env!("CARGO_BIN_EXE_admit");
    Command::new(exe)
        .arg("--config")
        .arg(dir.join("missing-config.toml"))
        .arg("-q")
        .args(args)
        .current_dir(dir)
        .env_remove("RUST_LOG")
        .env("ADMISSIONS_STORAGE__BACKEND", backend)
        .env("ADMISSIONS_STORAGE__DATABASE_PATH", dir.join("table.db"))
        .env("ADMISSIONS_STORAGE__LOCAL_STORE_PATH", dir.join("local.db"))
        .output()
        .expect("run admit")
}

fn stdout_ok(output: &Output) -> String {
    assert!(
        output.status.success(),
        "admit failed: {}",
        String::from_utf8_lossy(&output.stderr)
    );
    String::from_utf8(output.stdout.clone()).expect("utf8 stdout")
}

#[test]
fn add_list_and_report_on_both_backends() {
    for backend in ["table", "blob"] {
        let dir = temp_dir(&format!("admit-cli-{backend}"));

        stdout_ok(&admit(&dir, backend, &["add", "-n", "Rahim", "--father", "Karim"]));
        stdout_ok(&admit(
            &dir,
            backend,
            &["add", "-n", "Nusrat", "-g", "female", "--class", "Pre-Primary", "-a", "5+"],
        ));

        let listed = stdout_ok(&admit(&dir, backend, &["list", "-f", "json"]));
        let records: serde_json::Value = serde_json::from_str(&listed).expect("list json");
        let records = records.as_array().expect("array");
        assert_eq!(records.len(), 2, "{backend}");
        let mut serials: Vec<u64> = records
            .iter()
            .map(|r| r["serialNo"].as_u64().expect("serial"))
            .collect();
        serials.sort_unstable();
        assert_eq!(serials, vec![1, 2], "{backend}");

        let found = stdout_ok(&admit(&dir, backend, &["list", "-s", "karim", "-f", "json"]));
        let found: serde_json::Value = serde_json::from_str(&found).expect("search json");
        assert_eq!(found.as_array().map(Vec::len), Some(1), "{backend}");
        assert_eq!(found[0]["childName"], "Rahim", "{backend}");

        let csv = stdout_ok(&admit(&dir, backend, &["report", "-f", "csv"]));
        let lines: Vec<&str> = csv.lines().collect();
        assert_eq!(lines.len(), 14, "{backend}");
        assert!(lines.iter().all(|l| l.split(',').count() == 25), "{backend}");
        assert!(lines[13].starts_with("Grand Total,1,1,2,"), "{backend}");

        let _ = std::fs::remove_dir_all(dir);
    }
}

#[test]
fn show_update_and_delete() {
    let dir = temp_dir("admit-cli-lifecycle");

    stdout_ok(&admit(&dir, "table", &["add", "-n", "Rahim"]));
    let listed = stdout_ok(&admit(&dir, "table", &["list", "-f", "json"]));
    let records: serde_json::Value = serde_json::from_str(&listed).expect("list json");
    let id = records[0]["id"].as_str().expect("id").to_string();

    stdout_ok(&admit(&dir, "table", &["update", &id, "--class", "3", "--notes", "moved"]));
    let shown = stdout_ok(&admit(&dir, "table", &["show", &id, "--json"]));
    let shown: serde_json::Value = serde_json::from_str(&shown).expect("show json");
    assert_eq!(shown["class"], "3");
    assert_eq!(shown["notes"], "moved");
    assert_eq!(shown["serialNo"], 1);

    let deleted = stdout_ok(&admit(&dir, "table", &["delete", &id]));
    assert!(deleted.contains("Deleted Rahim"));
    let again = stdout_ok(&admit(&dir, "table", &["delete", &id]));
    assert!(again.contains("nothing deleted"));

    let missing = admit(&dir, "table", &["show", &id]);
    assert!(!missing.status.success());

    let _ = std::fs::remove_dir_all(dir);
}

#[test]
fn blank_name_is_rejected() {
    let dir = temp_dir("admit-cli-blank");

    let output = admit(&dir, "blob", &["add", "-n", " "]);
    assert!(!output.status.success());
    assert!(String::from_utf8_lossy(&output.stderr).contains("child_name"));

    let listed = stdout_ok(&admit(&dir, "blob", &["list", "-f", "json"]));
    assert_eq!(listed.trim(), "[]");

    let _ = std::fs::remove_dir_all(dir);
}

#[test]
fn report_save_uses_default_file_name() {
    let dir = temp_dir("admit-cli-save");

    let out = stdout_ok(&admit(&dir, "blob", &["report", "--save", "-f", "json"]));
    assert!(out.contains("Admission_Report_2025_"));

    let saved: Vec<String> = std::fs::read_dir(&dir)
        .expect("read dir")
        .filter_map(|e| e.ok())
        .map(|e| e.file_name().to_string_lossy().into_owned())
        .filter(|n| n.starts_with("Admission_Report_2025_") && n.ends_with(".json"))
        .collect();
    assert_eq!(saved.len(), 1);

    let _ = std::fs::remove_dir_all(dir);
}

#[test]
fn config_commands_leave_the_store_alone() {
    let dir = temp_dir("admit-cli-config");

    let shown = stdout_ok(&admit(&dir, "table", &["config", "show", "--json"]));
    let shown: serde_json::Value = serde_json::from_str(&shown).expect("config json");
    assert_eq!(shown["storage"]["backend"], "table");
    stdout_ok(&admit(&dir, "blob", &["config", "path"]));

    assert!(!dir.join("table.db").exists());
    assert!(!dir.join("local.db").exists());

    let _ = std::fs::remove_dir_all(dir);
}
