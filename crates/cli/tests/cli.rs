use assert_cmd::Command;
use predicates::prelude::*;
use serde_json::Value;
use std::fs;
use std::path::Path;
use tempfile::tempdir;

#[allow(deprecated)]
fn dirview() -> Command {
    let mut cmd = Command::cargo_bin("dirview").expect("binary");
    cmd.env_remove("RUST_LOG");
    cmd
}

fn run_json(args: &[&str]) -> Value {
    let output = dirview().args(args).output().expect("command run");
    assert!(
        output.status.success(),
        "stderr: {}",
        String::from_utf8_lossy(&output.stderr)
    );
    serde_json::from_slice(&output.stdout).expect("valid json")
}

fn setup_tree() -> tempfile::TempDir {
    let temp = tempdir().unwrap();
    let root = temp.path();
    fs::create_dir_all(root.join("apps/android/release")).unwrap();
    fs::write(root.join("apps/android/release/app.apk"), vec![0u8; 2048]).unwrap();
    fs::create_dir_all(root.join("docs")).unwrap();
    fs::write(root.join("docs/guide.md"), b"# guide").unwrap();
    fs::write(root.join("docs/draft.secret"), b"hush").unwrap();
    fs::write(
        root.join("docs/.dirview.toml"),
        "upload = true\n[[accessTables]]\nregex = '\\.secret$'\nallow = false\n",
    )
    .unwrap();
    temp
}

fn root_arg(root: &Path) -> &str {
    root.to_str().expect("utf-8 temp path")
}

#[test]
fn index_reports_file_count() {
    let temp = setup_tree();
    let body = run_json(&["index", root_arg(temp.path()), "--json"]);
    assert_eq!(body["generation"], 1);
    assert!(body["built_at_unix_ms"].as_u64().is_some_and(|ms| ms > 0));
    assert_eq!(body["stats"]["files"], 4);
    assert_eq!(body["stats"]["skipped_dirs"], 0);
}

#[test]
fn ls_collapses_and_sizes_directories() {
    let temp = setup_tree();
    let body = run_json(&["ls", root_arg(temp.path()), "--json"]);
    let entries = body["entries"].as_array().expect("entries");

    let names: Vec<&str> = entries.iter().filter_map(|e| e["name"].as_str()).collect();
    assert_eq!(names, vec!["apps/android/release", "docs"]);
    assert_eq!(entries[0]["type"], "dir");
    assert_eq!(entries[0]["size"], 2048);
}

#[test]
fn ls_hides_denied_names_and_reports_policy() {
    let temp = setup_tree();
    let body = run_json(&["ls", root_arg(temp.path()), "docs", "--json"]);
    let names: Vec<&str> = body["entries"]
        .as_array()
        .expect("entries")
        .iter()
        .filter_map(|e| e["name"].as_str())
        .collect();
    assert!(names.contains(&"guide.md"));
    assert!(!names.contains(&"draft.secret"));
    assert_eq!(body["policy"]["upload"], true);
    assert_eq!(body["policy"]["delete"], false);
}

#[test]
fn ls_search_returns_relative_names() {
    let temp = setup_tree();
    let body = run_json(&["ls", root_arg(temp.path()), "apps", "--search", "apk", "--json"]);
    let entries = body["entries"].as_array().expect("entries");
    assert_eq!(entries.len(), 1);
    assert_eq!(entries[0]["name"], "android/release/app.apk");
    assert_eq!(entries[0]["path"], "apps/android/release/app.apk");
}

#[test]
fn policy_uses_global_defaults_and_caller() {
    let temp = setup_tree();
    fs::write(
        temp.path().join(".dirview.toml"),
        "[[users]]\nemail = \"ops@example.com\"\nupload = false\ndelete = true\n",
    )
    .unwrap();

    let defaults = run_json(&["--upload", "policy", root_arg(temp.path())]);
    assert_eq!(defaults["upload"], true);
    assert_eq!(defaults["delete"], false);

    let ops = run_json(&[
        "policy",
        root_arg(temp.path()),
        "docs",
        "--email",
        "ops@example.com",
    ]);
    assert_eq!(ops["upload"], false);
    assert_eq!(ops["delete"], true);
    assert_eq!(ops["visibility"][0]["regex"], "\\.secret$");
}

#[test]
fn ls_rejects_paths_outside_root() {
    let temp = setup_tree();
    dirview()
        .args(["ls", root_arg(&temp.path().join("docs")), "../apps"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("escapes"));
}

#[test]
fn check_name_flags_forbidden_characters() {
    dirview()
        .args(["check-name", "report.pdf"])
        .assert()
        .success()
        .stdout(predicate::str::contains("ok"));

    dirview()
        .args(["check-name", "a:b"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("Rejected name"));
}
