//! Black-box tests of the installed binary.

use assert_cmd::Command;
use predicates::prelude::*;

fn pyaudit() -> Command {
    Command::cargo_bin("pyaudit").expect("binary must build")
}

fn project_with(files: &[(&str, &str)]) -> tempfile::TempDir {
    let dir = tempfile::tempdir().expect("tempdir");
    for (name, contents) in files {
        std::fs::write(dir.path().join(name), contents).expect("write fixture");
    }
    dir
}

#[test]
fn clean_project_exits_zero() {
    let dir = project_with(&[("ok.py", "def f():\n    return 1\n")]);
    pyaudit()
        .arg(dir.path())
        .args(["--no-lint", "--no-deps"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Files analyzed"));
}

#[test]
fn findings_exit_one() {
    let dir = project_with(&[("bad.py", "password = \"hunter2\"\n")]);
    pyaudit()
        .arg(dir.path())
        .args(["--no-lint", "--no-deps"])
        .assert()
        .code(1)
        .stdout(predicate::str::contains("bad.py:1"));
}

#[test]
fn json_output_is_machine_readable() {
    let dir = project_with(&[("bad.py", "cursor.execute(\"SELECT \" + x)\n")]);
    let output = pyaudit()
        .arg(dir.path())
        .args(["--no-lint", "--no-deps", "--json"])
        .output()
        .expect("run binary");

    let report: serde_json::Value =
        serde_json::from_slice(&output.stdout).expect("stdout must be JSON");
    assert_eq!(report["files_analyzed"], 1);
    assert_eq!(report["total_issues"], 1);
    assert_eq!(report["detailed_report"]["bad.py"][0]["kind"], "sql_injection");
    assert_eq!(report["detailed_report"]["bad.py"][0]["severity"], "critical");
}

#[test]
fn project_name_flag_overrides_directory_name() {
    let dir = project_with(&[("ok.py", "x = 1\n")]);
    pyaudit()
        .arg(dir.path())
        .args(["--no-lint", "--no-deps", "--project-name", "billing-service"])
        .assert()
        .success()
        .stdout(predicate::str::contains("billing-service"));
}

#[test]
fn missing_root_fails_with_message() {
    pyaudit()
        .arg("/definitely/not/a/real/path")
        .args(["--no-lint", "--no-deps"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("not a directory"));
}

#[test]
fn output_file_receives_the_report() {
    let dir = project_with(&[("ok.py", "x = 1\n")]);
    let target = dir.path().join("report.json");
    pyaudit()
        .arg(dir.path())
        .args(["--no-lint", "--no-deps", "--json", "--output"])
        .arg(&target)
        .assert()
        .success();

    let written: serde_json::Value =
        serde_json::from_str(&std::fs::read_to_string(&target).expect("report file"))
            .expect("valid JSON");
    // The report file itself is not a .py file, so it never taints a rescan
    assert_eq!(written["files_analyzed"], 1);
}

#[test]
fn help_documents_the_config_file() {
    pyaudit()
        .arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains(".pyaudit.toml"));
}
