//! Per-file analysis pipeline.
//!
//! Each file is processed independently: read, parse, then a fixed
//! inspection sequence (structural counts, inheritance edges, pattern
//! detectors, complexity, raw line metrics, optional style lint). The
//! result is a self-contained `FileScan` the orchestrator merges in
//! path order.

use crate::bridges::StyleLinter;
use crate::complexity::{analyze_complexity, ComplexitySummary};
use crate::detectors::{run_detectors, FileContext};
use crate::diagnostics::Diagnostics;
use crate::inheritance::ClassGraph;
use crate::parsing::parse_python;
use crate::raw_metrics::{analyze_raw, RawMetrics};
use crate::report::{Issue, IssueKind, IssueLine, Severity};
use crate::structure::{analyze_structure, StructuralSummary};
use crate::utils::LineIndex;
use std::path::Path;

/// Everything one file contributes to the project report.
#[derive(Debug, Default)]
pub struct FileScan {
    /// Issues found in this file, in detector-invocation order.
    pub issues: Vec<Issue>,
    /// Structural totals; zeroed when the file did not parse.
    pub structure: StructuralSummary,
    /// Complexity totals; zeroed when the file did not parse.
    pub complexity: ComplexitySummary,
    /// Line metrics; computed even for unparseable files.
    pub raw: RawMetrics,
    /// Class inheritance edges contributed by this file.
    pub class_edges: ClassGraph,
    /// Style violations reported by the linter bridge.
    pub style_violations: usize,
}

/// Analyzes a single file.
///
/// Never fails: an unreadable or unparseable file degrades to a
/// `FileScan` carrying one `ParseError` issue, so one bad file cannot
/// abort a project scan.
pub fn scan_file(
    path: &Path,
    linter: Option<&dyn StyleLinter>,
    diagnostics: &Diagnostics,
) -> FileScan {
    let source = match std::fs::read_to_string(path) {
        Ok(source) => source,
        Err(e) => {
            return FileScan {
                issues: vec![parse_error_issue(
                    IssueLine::NotApplicable,
                    &format!("could not read file: {e}"),
                )],
                ..FileScan::default()
            };
        }
    };

    let mut scan = FileScan {
        raw: analyze_raw(&source),
        ..FileScan::default()
    };

    match parse_python(&source) {
        Ok(module) => {
            let line_index = LineIndex::new(&source);
            let source_lines: Vec<&str> = source.lines().collect();
            let ctx = FileContext {
                line_index: &line_index,
                source_lines: &source_lines,
            };
            scan.structure = analyze_structure(&module.body, &line_index);
            scan.class_edges.collect(&module.body);
            scan.issues = run_detectors(&module.body, &ctx);
            scan.complexity = analyze_complexity(&module.body);
        }
        Err(failure) => {
            scan.issues.push(parse_error_issue(
                IssueLine::Line(failure.line),
                &format!("syntax error: {}", failure.message),
            ));
        }
    }

    if let Some(linter) = linter {
        match linter.violation_count(path) {
            Ok(count) => scan.style_violations = count,
            Err(e) => diagnostics.warn(format!("style lint skipped for {}: {e}", path.display())),
        }
    }

    scan
}

fn parse_error_issue(line: IssueLine, message: &str) -> Issue {
    Issue {
        line,
        kind: IssueKind::ParseError,
        message: message.to_owned(),
        severity: Severity::High,
        recommendation: "Fix the file so it parses; unanalyzed code is unaudited code."
            .to_owned(),
        code_excerpt: None,
        subtype: None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn scan_source(source: &str) -> FileScan {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("m.py");
        std::fs::write(&path, source).unwrap();
        scan_file(&path, None, &Diagnostics::new())
    }

    #[test]
    fn clean_file_yields_no_issues() {
        let scan = scan_source("def add(a, b):\n    return a + b\n");
        assert!(scan.issues.is_empty());
        assert_eq!(scan.structure.function_count, 1);
        assert_eq!(scan.raw.effective_loc, 2);
    }

    #[test]
    fn unparseable_file_yields_one_parse_error() {
        let scan = scan_source("def broken(:\n");
        assert_eq!(scan.issues.len(), 1);
        assert_eq!(scan.issues[0].kind, IssueKind::ParseError);
        assert_eq!(scan.issues[0].severity, Severity::High);
        // Line metrics still computed from the raw text
        assert_eq!(scan.raw.effective_loc, 1);
        assert_eq!(scan.structure.function_count, 0);
    }

    #[test]
    fn detectors_run_over_parsed_file() {
        let scan = scan_source("password = \"hunter2\"\n");
        assert_eq!(scan.issues.len(), 1);
        assert_eq!(scan.issues[0].kind, IssueKind::SensitiveVariable);
    }
}
