//! End-to-end runs of the `packcheck` binary against a temporary pack.

use std::path::Path;
use std::process::{Command, Output};

fn write(root: &Path, rel: &str, content: &str) {
    let path = root.join(rel);
    std::fs::create_dir_all(path.parent().unwrap()).unwrap();
    std::fs::write(path, content).unwrap();
}

/// A pack that passes every stage once its manifest is generated.
fn build_pack(root: &Path) {
    write(
        root,
        "schemas/report_result.schema.json",
        r#"{"type":"object","required":["status"],"properties":{"status":{"enum":["PASS","FAIL"]}}}"#,
    );
    write(
        root,
        "schemas/documents/T4_URS.schema.json",
        r#"{"type":"object","required":["client.name","date"]}"#,
    );
    write(root, "tests/expected_report_ok.json", r#"{"status":"PASS"}"#);
    write(root, "libraries/task_pool/tp.yaml", "task_pool_id: TP\nversion: 1.0.0\n");
    write(root, "libraries/profile_library/pr.yaml", "profile_id: PR\nversion: 2.0.0\n");
    write(root, "libraries/calendar/cal.yaml", "calendar_id: CAL\ncalendar_version: 3.0.0\n");
    write(
        root,
        "libraries/preset_library/p1.yaml",
        "preset_id: P1\nversion: 1.0.0\nbindings:\n  task_pool_ref: {task_pool_id: TP, task_pool_version: 1.0.0}\n  profile_ref: {profile_id: PR, profile_version: 2.0.0}\n  calendar_logic_ref: {calendar_id: CAL, calendar_version: 3.0.0}\n",
    );
    write(root, "inputs/full.json", r#"{"client":{"name":"A"},"date":"2025-01-01"}"#);
}

fn packcheck(root: &Path, args: &[&str]) -> Output {
    Command::new(env!("CARGO_BIN_EXE_packcheck"))
        .args(args)
        .arg("--pack-root")
        .arg(root)
        .env_remove("RUST_LOG")
        .env("SOURCE_DATE_EPOCH", "1736942400")
        .output()
        .unwrap()
}

fn stdout(output: &Output) -> String {
    String::from_utf8_lossy(&output.stdout).into_owned()
}

fn generate_manifest(root: &Path) {
    let out = packcheck(root, &["manifest", "generate", "--name", "Fixture"]);
    assert_eq!(out.status.code(), Some(0), "{}", stdout(&out));
}

#[test]
fn healthy_pack_passes_every_stage() {
    let dir = tempfile::tempdir().unwrap();
    build_pack(dir.path());
    generate_manifest(dir.path());

    let out = packcheck(dir.path(), &["check"]);
    let text = stdout(&out);
    assert_eq!(out.status.code(), Some(0), "{text}");
    for stage in ["manifest.verify", "schemas.load", "report.vectors", "presets.bindings"] {
        assert!(text.contains(&format!("- PASS  {stage}")), "{text}");
    }
    assert!(text.ends_with("Overall: PASS\n"));
}

#[test]
fn generated_manifest_uses_source_date_epoch() {
    let dir = tempfile::tempdir().unwrap();
    build_pack(dir.path());
    generate_manifest(dir.path());
    let manifest = std::fs::read_to_string(dir.path().join("manifest.yaml")).unwrap();
    assert!(manifest.contains("2025-01-15T12:00:00Z"), "{manifest}");
    assert!(manifest.contains("name: Fixture"));
}

#[test]
fn tampered_file_fails_with_exit_one() {
    let dir = tempfile::tempdir().unwrap();
    build_pack(dir.path());
    generate_manifest(dir.path());
    write(dir.path(), "libraries/task_pool/tp.yaml", "task_pool_id: TP\nversion: 1.0.1\n");

    let out = packcheck(dir.path(), &[]);
    let text = stdout(&out);
    assert_eq!(out.status.code(), Some(1), "{text}");
    assert!(text.contains("- FAIL  manifest.verify"));
    assert!(text.contains("- FAIL  presets.bindings"));
    assert!(text.contains("Mismatches (1): libraries/task_pool/tp.yaml"));
    assert!(text.ends_with("Overall: FAIL\n"));
}

#[test]
fn missing_manifest_is_misconfig_unless_skipped() {
    let dir = tempfile::tempdir().unwrap();
    build_pack(dir.path());

    let out = packcheck(dir.path(), &[]);
    assert_eq!(out.status.code(), Some(2));
    assert!(String::from_utf8_lossy(&out.stderr).contains("manifest.yaml not found at pack root"));

    let out = packcheck(dir.path(), &["--skip-manifest"]);
    assert_eq!(out.status.code(), Some(0), "{}", stdout(&out));
    assert!(!stdout(&out).contains("manifest.verify"));
}

#[test]
fn manifest_verify_and_check_report_drift() {
    let dir = tempfile::tempdir().unwrap();
    build_pack(dir.path());
    generate_manifest(dir.path());
    assert_eq!(packcheck(dir.path(), &["manifest", "verify"]).status.code(), Some(0));

    write(dir.path(), "new.yaml", "a: 1\n");
    let out = packcheck(dir.path(), &["manifest", "verify"]);
    assert_eq!(out.status.code(), Some(1));
    assert!(stdout(&out).contains("Extra (1):\n  - new.yaml\n"));

    let out = packcheck(dir.path(), &["manifest", "generate", "--check"]);
    assert_eq!(out.status.code(), Some(1));
}

#[test]
fn render_inputs_exit_codes() {
    let dir = tempfile::tempdir().unwrap();
    build_pack(dir.path());
    write(dir.path(), "inputs/partial.json", r#"{"client":{"name":"A"}}"#);

    let ok = packcheck(dir.path(), &["render-inputs", "--template", "T4_URS.md", "--data", "inputs/full.json"]);
    assert_eq!(ok.status.code(), Some(0));

    let missing = packcheck(
        dir.path(),
        &["render-inputs", "--template", "T4_URS.md", "--data", "inputs/partial.json"],
    );
    assert_eq!(missing.status.code(), Some(1));
    assert!(stdout(&missing).contains("- date"));

    let no_schema = packcheck(dir.path(), &["render-inputs", "--template", "T0.md", "--data", "inputs/full.json"]);
    assert_eq!(no_schema.status.code(), Some(2));

    let no_args = packcheck(dir.path(), &["render-inputs", "--data", "inputs/full.json"]);
    assert_eq!(no_args.status.code(), Some(2));
}

#[test]
fn bad_config_file_is_misconfig() {
    let dir = tempfile::tempdir().unwrap();
    build_pack(dir.path());
    let config = dir.path().join("layout.yaml");
    std::fs::write(&config, "unknown_field: 1\n").unwrap();
    let out = packcheck(dir.path(), &["--skip-manifest", "--config", config.to_str().unwrap()]);
    assert_eq!(out.status.code(), Some(2));
}

#[test]
fn json_report_is_machine_readable() {
    let dir = tempfile::tempdir().unwrap();
    build_pack(dir.path());
    let out = packcheck(dir.path(), &["check", "--skip-manifest", "--json"]);
    assert_eq!(out.status.code(), Some(0));
    let doc: serde_json::Value = serde_json::from_slice(&out.stdout).unwrap();
    assert_eq!(doc["overall"], "PASS");
    assert_eq!(doc["results"].as_array().unwrap().len(), 3);
}
