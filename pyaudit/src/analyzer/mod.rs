//! Project scan orchestration.
//!
//! `SecurityAnalyzer` ties the pieces together: it walks the project,
//! fans out per-file analysis across a thread pool, merges the results
//! in deterministic path order, runs the project-level dependency
//! audit, and finalizes the metrics and recommendations.

mod single_file;
mod traversal;

pub use single_file::{scan_file, FileScan};
pub use traversal::collect_python_files;

use crate::bridges::{
    BridgeError, CommandAuditor, CommandLinter, DependencyAdvisory, DependencyAuditor, StyleLinter,
};
use crate::config::Config;
use crate::diagnostics::Diagnostics;
use crate::output::scan_progress;
use crate::recommendations::build_recommendations;
use crate::report::{Issue, IssueKind, IssueLine, Report, Severity};
use crate::utils::normalize_display_path;
use anyhow::{bail, Result};
use rayon::prelude::*;
use std::panic::{catch_unwind, AssertUnwindSafe};
use std::path::{Path, PathBuf};

/// The project scanner. One instance per scan configuration; each call
/// to [`analyze_project`](Self::analyze_project) is an independent scan.
pub struct SecurityAnalyzer {
    config: Config,
    linter: Option<Box<dyn StyleLinter>>,
    auditor: Option<Box<dyn DependencyAuditor>>,
    diagnostics: Diagnostics,
    show_progress: bool,
}

impl SecurityAnalyzer {
    /// Creates an analyzer with the subprocess bridges named in `config`.
    #[must_use]
    pub fn new(config: Config) -> Self {
        let linter: Option<Box<dyn StyleLinter>> = if config.linter.enabled {
            let args: Vec<&str> = config.linter.args.iter().map(String::as_str).collect();
            Some(Box::new(CommandLinter::new(&config.linter.program, &args)))
        } else {
            None
        };
        let auditor: Option<Box<dyn DependencyAuditor>> = if config.auditor.enabled {
            let args: Vec<&str> = config.auditor.args.iter().map(String::as_str).collect();
            Some(Box::new(CommandAuditor::new(
                &config.auditor.program,
                &args,
            )))
        } else {
            None
        };
        Self {
            config,
            linter,
            auditor,
            diagnostics: Diagnostics::new(),
            show_progress: false,
        }
    }

    /// Creates an analyzer with explicit bridge implementations.
    /// Tests use this to substitute fakes.
    #[must_use]
    pub fn with_bridges(
        config: Config,
        linter: Option<Box<dyn StyleLinter>>,
        auditor: Option<Box<dyn DependencyAuditor>>,
    ) -> Self {
        Self {
            config,
            linter,
            auditor,
            diagnostics: Diagnostics::new(),
            show_progress: false,
        }
    }

    /// Enables the terminal progress bar during the parallel phase.
    #[must_use]
    pub fn with_progress(mut self, show: bool) -> Self {
        self.show_progress = show;
        self
    }

    /// Warnings accumulated during the most recent scan.
    #[must_use]
    pub fn warnings(&self) -> Vec<String> {
        self.diagnostics.warnings()
    }

    /// Scans the project rooted at `root` and builds the full report.
    ///
    /// # Errors
    ///
    /// Returns an error only when `root` does not exist or is not a
    /// directory. Per-file failures degrade to `ParseError` issues.
    pub fn analyze_project(&self, root: &Path) -> Result<Report> {
        if !root.is_dir() {
            bail!("project root {} is not a directory", root.display());
        }

        let project_name = self.project_name(root);
        let files = collect_python_files(root, &self.config.effective_excludes());
        if files.is_empty() {
            return Ok(Report::empty(&project_name));
        }

        let progress = scan_progress(files.len() as u64, self.show_progress);
        let linter = self.linter.as_deref();
        let scans: Vec<FileScan> = files
            .par_iter()
            .map(|path| {
                let scan = catch_unwind(AssertUnwindSafe(|| {
                    scan_file(path, linter, &self.diagnostics)
                }))
                .unwrap_or_else(|_| internal_error_scan(path, &self.diagnostics));
                progress.inc(1);
                scan
            })
            .collect();
        progress.finish_and_clear();

        let mut report = self.merge(root, &project_name, &files, scans);
        self.attach_dependency_advisories(root, &mut report);
        finalize(&mut report);
        Ok(report)
    }

    fn project_name(&self, root: &Path) -> String {
        self.config.project_name.clone().unwrap_or_else(|| {
            root.file_name()
                .map_or_else(|| root.display().to_string(), |n| n.to_string_lossy().into_owned())
        })
    }

    /// Folds the per-file scans into one report, in path order.
    fn merge(
        &self,
        root: &Path,
        project_name: &str,
        files: &[PathBuf],
        scans: Vec<FileScan>,
    ) -> Report {
        let mut report = Report::empty(project_name);
        report.files_analyzed = files.len();
        let mut class_graph = crate::inheritance::ClassGraph::new();

        for (path, scan) in files.iter().zip(scans) {
            let metrics = &mut report.summary_metrics;
            metrics.cyclomatic_complexity += scan.complexity.cyclomatic;
            metrics.branch_count += scan.complexity.branches;
            metrics.class_count += scan.structure.class_count;
            metrics.function_count += scan.structure.function_count;
            metrics.type_annotations += scan.structure.type_annotations;
            metrics.decorator_count += scan.structure.decorator_count;
            metrics.http_endpoint_count += scan.structure.http_endpoint_count;
            metrics.effective_loc += scan.raw.effective_loc;
            metrics.comment_loc += scan.raw.comment_loc;
            metrics.style_violations += scan.style_violations;
            // Sums finalized into averages after the merge
            metrics.avg_function_length += scan.structure.function_lines_total as f64;
            metrics.avg_params_per_function += scan.structure.function_params_total as f64;

            for issue in &scan.issues {
                match issue.kind {
                    IssueKind::SensitiveVariable => metrics.sensitive_variable_count += 1,
                    IssueKind::SqlInjection => metrics.sql_injection_count += 1,
                    IssueKind::Xss => metrics.xss_count += 1,
                    IssueKind::MissingCsrf => metrics.csrf_gap_count += 1,
                    _ => {}
                }
            }

            class_graph.merge(scan.class_edges);

            let display = normalize_display_path(path.strip_prefix(root).unwrap_or(path));
            report.detailed_report.insert(display, scan.issues);
        }

        report.summary_metrics.max_inheritance_depth = class_graph.max_depth();
        report
    }

    /// Runs the dependency audit once and attaches each advisory to
    /// every file entry that already has issues. Projects whose only
    /// findings are advisories still surface them through the counter.
    fn attach_dependency_advisories(&self, root: &Path, report: &mut Report) {
        let Some(auditor) = self.auditor.as_deref() else {
            return;
        };
        let advisories = match auditor.audit(root) {
            Ok(advisories) => advisories,
            Err(e @ (BridgeError::Spawn { .. } | BridgeError::UnexpectedStatus { .. })) => {
                self.diagnostics.warn(format!("dependency audit skipped: {e}"));
                return;
            }
            Err(e) => {
                self.diagnostics.warn(format!("dependency audit unreadable: {e}"));
                return;
            }
        };
        report.summary_metrics.vulnerable_dependency_count = advisories.len();
        if advisories.is_empty() {
            return;
        }

        let issues: Vec<Issue> = advisories.iter().map(advisory_issue).collect();
        for file_issues in report.detailed_report.values_mut() {
            if !file_issues.is_empty() {
                file_issues.extend(issues.iter().cloned());
            }
        }
    }
}

/// Converts sums to averages and derives recommendations. Runs once,
/// after the last issue is recorded.
fn finalize(report: &mut Report) {
    let metrics = &mut report.summary_metrics;
    if metrics.function_count > 0 {
        #[allow(clippy::cast_precision_loss)]
        let functions = metrics.function_count as f64;
        metrics.avg_function_length /= functions;
        metrics.avg_params_per_function /= functions;
    } else {
        metrics.avg_function_length = 0.0;
        metrics.avg_params_per_function = 0.0;
    }
    metrics.recommendations = build_recommendations(metrics);
    report.refresh_totals();
}

fn advisory_issue(advisory: &DependencyAdvisory) -> Issue {
    Issue {
        line: IssueLine::NotApplicable,
        kind: IssueKind::VulnerableDependency,
        message: format!(
            "{} {} has a known vulnerability ({}): {}",
            advisory.package_name,
            advisory.analyzed_version,
            advisory.vulnerable_spec,
            advisory.advisory
        ),
        severity: Severity::High,
        recommendation: format!(
            "Upgrade {} to a version outside {}.",
            advisory.package_name, advisory.vulnerable_spec
        ),
        code_excerpt: None,
        subtype: None,
    }
}

fn internal_error_scan(path: &Path, diagnostics: &Diagnostics) -> FileScan {
    diagnostics.warn(format!("analysis panicked for {}", path.display()));
    FileScan {
        issues: vec![Issue {
            line: IssueLine::NotApplicable,
            kind: IssueKind::ParseError,
            message: "internal error while analyzing file".to_owned(),
            severity: Severity::High,
            recommendation: "Report this file as a scanner bug.".to_owned(),
            code_excerpt: None,
            subtype: None,
        }],
        ..FileScan::default()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn analyzer() -> SecurityAnalyzer {
        let config = Config {
            linter: crate::config::LinterConfig {
                enabled: false,
                ..Default::default()
            },
            auditor: crate::config::AuditorConfig {
                enabled: false,
                ..Default::default()
            },
            ..Default::default()
        };
        SecurityAnalyzer::new(config)
    }

    #[test]
    fn missing_root_is_an_error() {
        let err = analyzer().analyze_project(Path::new("/no/such/dir"));
        assert!(err.is_err());
    }

    #[test]
    fn empty_project_yields_empty_report() {
        let dir = tempfile::tempdir().unwrap();
        let report = analyzer().analyze_project(dir.path()).unwrap();
        assert_eq!(report.files_analyzed, 0);
        assert_eq!(report.total_issues, 0);
        assert!(report.detailed_report.is_empty());
    }

    #[test]
    fn totals_hold_across_mixed_files() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("clean.py"), "def f():\n    return 1\n").unwrap();
        std::fs::write(dir.path().join("bad.py"), "password = \"x\"\n").unwrap();
        std::fs::write(dir.path().join("broken.py"), "def oops(:\n").unwrap();

        let report = analyzer().analyze_project(dir.path()).unwrap();
        assert_eq!(report.files_analyzed, 3);
        assert_eq!(report.files_with_issues, 2);
        assert_eq!(report.total_issues, 2);
        assert_eq!(report.summary_metrics.sensitive_variable_count, 1);
        let total: usize = report.detailed_report.values().map(Vec::len).sum();
        assert_eq!(report.total_issues, total);
    }

    #[test]
    fn scan_is_idempotent() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(
            dir.path().join("app.py"),
            "class A: pass\nclass B(A): pass\ntoken = \"abc\"\n",
        )
        .unwrap();
        let analyzer = analyzer();
        let a = analyzer.analyze_project(dir.path()).unwrap();
        let b = analyzer.analyze_project(dir.path()).unwrap();
        assert_eq!(
            serde_json::to_string(&a).unwrap(),
            serde_json::to_string(&b).unwrap()
        );
        assert_eq!(a.summary_metrics.max_inheritance_depth, 2);
    }
}
