//! End-to-end scans over temporary project trees, with fake bridges
//! standing in for the external tools.

use pyaudit::analyzer::SecurityAnalyzer;
use pyaudit::bridges::{BridgeError, DependencyAdvisory, DependencyAuditor, StyleLinter};
use pyaudit::config::Config;
use pyaudit::report::{IssueKind, IssueLine, Report};
use std::path::Path;
use tempfile::TempDir;

struct FixedLinter(usize);

impl StyleLinter for FixedLinter {
    fn violation_count(&self, _file: &Path) -> Result<usize, BridgeError> {
        Ok(self.0)
    }
}

struct FailingLinter;

impl StyleLinter for FailingLinter {
    fn violation_count(&self, file: &Path) -> Result<usize, BridgeError> {
        Err(BridgeError::Spawn {
            tool: "flake8".to_owned(),
            source: std::io::Error::new(std::io::ErrorKind::NotFound, file.display().to_string()),
        })
    }
}

struct FixedAuditor(Vec<DependencyAdvisory>);

impl DependencyAuditor for FixedAuditor {
    fn audit(&self, _project_root: &Path) -> Result<Vec<DependencyAdvisory>, BridgeError> {
        Ok(self.0.clone())
    }
}

fn advisory() -> DependencyAdvisory {
    DependencyAdvisory {
        package_name: "django".to_owned(),
        vulnerable_spec: "<2.2.18".to_owned(),
        advisory: "path traversal".to_owned(),
        analyzed_version: "2.2.10".to_owned(),
    }
}

fn scan(
    dir: &TempDir,
    linter: Option<Box<dyn StyleLinter>>,
    auditor: Option<Box<dyn DependencyAuditor>>,
) -> Report {
    SecurityAnalyzer::with_bridges(Config::default(), linter, auditor)
        .analyze_project(dir.path())
        .expect("scan must succeed")
}

#[test]
fn style_violations_accumulate_per_file() {
    let dir = tempfile::tempdir().unwrap();
    std::fs::write(dir.path().join("a.py"), "x = 1\n").unwrap();
    std::fs::write(dir.path().join("b.py"), "y = 2\n").unwrap();

    let report = scan(&dir, Some(Box::new(FixedLinter(3))), None);
    assert_eq!(report.summary_metrics.style_violations, 6);
}

#[test]
fn linter_failure_degrades_to_zero_with_warning() {
    let dir = tempfile::tempdir().unwrap();
    std::fs::write(dir.path().join("a.py"), "x = 1\n").unwrap();

    let analyzer =
        SecurityAnalyzer::with_bridges(Config::default(), Some(Box::new(FailingLinter)), None);
    let report = analyzer.analyze_project(dir.path()).unwrap();
    assert_eq!(report.summary_metrics.style_violations, 0);
    assert_eq!(report.total_issues, 0);
    assert!(!analyzer.warnings().is_empty());
}

#[test]
fn advisories_attach_only_to_files_with_issues() {
    let dir = tempfile::tempdir().unwrap();
    std::fs::write(dir.path().join("clean.py"), "x = 1\n").unwrap();
    std::fs::write(dir.path().join("dirty.py"), "password = \"x\"\n").unwrap();

    let report = scan(&dir, None, Some(Box::new(FixedAuditor(vec![advisory()]))));
    assert_eq!(report.summary_metrics.vulnerable_dependency_count, 1);

    assert!(report.detailed_report["clean.py"].is_empty());
    let dirty = &report.detailed_report["dirty.py"];
    assert_eq!(dirty.len(), 2);
    assert_eq!(dirty[1].kind, IssueKind::VulnerableDependency);
    assert_eq!(dirty[1].line, IssueLine::NotApplicable);
}

#[test]
fn advisories_without_file_issues_still_count() {
    let dir = tempfile::tempdir().unwrap();
    std::fs::write(dir.path().join("clean.py"), "x = 1\n").unwrap();

    let report = scan(&dir, None, Some(Box::new(FixedAuditor(vec![advisory()]))));
    assert_eq!(report.summary_metrics.vulnerable_dependency_count, 1);
    assert_eq!(report.total_issues, 0);
}

#[test]
fn inheritance_depth_spans_files() {
    let dir = tempfile::tempdir().unwrap();
    std::fs::write(dir.path().join("base.py"), "class Base: pass\n").unwrap();
    std::fs::write(
        dir.path().join("models.py"),
        "class Mid(Base): pass\nclass Leaf(Mid): pass\n",
    )
    .unwrap();

    let report = scan(&dir, None, None);
    assert_eq!(report.summary_metrics.max_inheritance_depth, 3);
    assert_eq!(report.summary_metrics.class_count, 3);
}

#[test]
fn unparseable_file_coexists_with_clean_files() {
    let dir = tempfile::tempdir().unwrap();
    std::fs::write(dir.path().join("good.py"), "def f():\n    return 1\n").unwrap();
    std::fs::write(dir.path().join("broken.py"), "def oops(:\n").unwrap();

    let report = scan(&dir, None, None);
    assert_eq!(report.files_analyzed, 2);
    assert_eq!(report.files_with_issues, 1);
    let broken = &report.detailed_report["broken.py"];
    assert_eq!(broken.len(), 1);
    assert_eq!(broken[0].kind, IssueKind::ParseError);
    // The parseable file still contributes metrics
    assert_eq!(report.summary_metrics.function_count, 1);
}

#[test]
fn averages_are_zero_without_functions() {
    let dir = tempfile::tempdir().unwrap();
    std::fs::write(dir.path().join("flat.py"), "x = 1\ny = 2\n").unwrap();

    let report = scan(&dir, None, None);
    assert_eq!(report.summary_metrics.avg_function_length, 0.0);
    assert_eq!(report.summary_metrics.avg_params_per_function, 0.0);
}

#[test]
fn report_json_shape_matches_consumers() {
    let dir = tempfile::tempdir().unwrap();
    std::fs::write(dir.path().join("app.py"), "token = \"abc\"\n").unwrap();

    let report = scan(&dir, None, None);
    let value = serde_json::to_value(&report).unwrap();
    assert!(value["summary_metrics"]["cyclomatic_complexity"].is_u64());
    assert!(value["detailed_report"]["app.py"].is_array());
    assert_eq!(value["detailed_report"]["app.py"][0]["line"], 1);
    assert!(value["summary_metrics"]["recommendations"].is_array());
    // Absent enrichment never serializes
    assert!(value.get("llm_recommendations").is_none());
}

#[test]
fn nested_folders_use_relative_display_paths() {
    let dir = tempfile::tempdir().unwrap();
    std::fs::create_dir(dir.path().join("pkg")).unwrap();
    std::fs::write(dir.path().join("pkg").join("views.py"), "secret = \"s\"\n").unwrap();

    let report = scan(&dir, None, None);
    assert!(report.detailed_report.contains_key("pkg/views.py"));
}
