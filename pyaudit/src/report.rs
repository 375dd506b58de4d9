//! Report data model.
//!
//! Everything in this module is immutable after the orchestrator returns
//! it and serializes to the JSON shape the report consumers read
//! (`detailed_report`, `summary_metrics`, `llm_recommendations`).

use serde::{Serialize, Serializer};
use std::collections::BTreeMap;

/// Line reference for an issue: a concrete 1-indexed line, or `"N/A"` for
/// project-scoped findings such as vulnerable dependencies.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IssueLine {
    /// A 1-indexed source line.
    Line(usize),
    /// No meaningful line (project-scoped or parse-level issue).
    NotApplicable,
}

impl Serialize for IssueLine {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            Self::Line(n) => serializer.serialize_u64(*n as u64),
            Self::NotApplicable => serializer.serialize_str("N/A"),
        }
    }
}

/// Category of a reported issue. Each variant is produced by exactly one
/// detector or bridge.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum IssueKind {
    /// Assignment target whose name suggests credentials.
    SensitiveVariable,
    /// SQL execution with a non-literal argument.
    SqlInjection,
    /// Render/response call with a bare variable argument.
    Xss,
    /// Hashing/encryption primitive usage (informational).
    EncryptionUsage,
    /// State-changing HTTP calls without CSRF protection.
    MissingCsrf,
    /// Request/user handling without an authorization check.
    MissingAuthorization,
    /// HTTP endpoint without input validation.
    MissingInputValidation,
    /// Dependency with a known advisory.
    VulnerableDependency,
    /// File could not be parsed or analyzed.
    ParseError,
}

/// Severity tier for issues and recommendations.
///
/// Issues use `info`/`medium`/`high`/`critical`; recommendations use
/// `low`/`medium`/`high`/`critical`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    /// Informational, no remediation required by itself.
    Info,
    /// Lowest actionable tier (recommendations only).
    Low,
    /// Worth addressing.
    Medium,
    /// Should be addressed before deployment.
    High,
    /// Exploitable or near-certainly a defect.
    Critical,
}

impl Severity {
    /// Lowercase wire name, also used by the text renderer.
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Info => "info",
            Self::Low => "low",
            Self::Medium => "medium",
            Self::High => "high",
            Self::Critical => "critical",
        }
    }
}

/// A single finding in one file. Never mutated after creation.
#[derive(Debug, Clone, Serialize)]
pub struct Issue {
    /// 1-indexed line, or `"N/A"`.
    pub line: IssueLine,
    /// Which detector or bridge produced this issue.
    pub kind: IssueKind,
    /// Description of the problem.
    pub message: String,
    /// Severity tier.
    pub severity: Severity,
    /// Canned remediation guidance.
    pub recommendation: String,
    /// The offending source line, trimmed.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub code_excerpt: Option<String>,
    /// Optional refinement tag (e.g. "API key exposure").
    #[serde(skip_serializing_if = "Option::is_none")]
    pub subtype: Option<String>,
}

/// Aggregated counters and ratios for one scan. Built incrementally by
/// accumulation, finalized once after all files are processed.
#[derive(Debug, Clone, Default, Serialize)]
pub struct Metrics {
    /// Sum of per-file module cyclomatic complexity.
    pub cyclomatic_complexity: usize,
    /// Count of branching statements across the project.
    pub branch_count: usize,
    /// Number of class definitions.
    pub class_count: usize,
    /// Number of function definitions.
    pub function_count: usize,
    /// Mean function line span. 0 when no functions were seen.
    pub avg_function_length: f64,
    /// Mean parameter count per function. 0 when no functions were seen.
    pub avg_params_per_function: f64,
    /// Non-blank, non-comment lines.
    pub effective_loc: usize,
    /// Full-line comments.
    pub comment_loc: usize,
    /// Violations reported by the external style linter.
    pub style_violations: usize,
    /// Parameter, return, and assignment type annotations.
    pub type_annotations: usize,
    /// Issues of kind `SensitiveVariable`.
    pub sensitive_variable_count: usize,
    /// Issues of kind `SqlInjection`.
    pub sql_injection_count: usize,
    /// Issues of kind `Xss`.
    pub xss_count: usize,
    /// Issues of kind `MissingCsrf`.
    pub csrf_gap_count: usize,
    /// Advisories reported by the dependency auditor.
    pub vulnerable_dependency_count: usize,
    /// Deepest resolved inheritance chain; 0 when no classes were seen.
    pub max_inheritance_depth: usize,
    /// Number of decorators attached to functions and classes.
    pub decorator_count: usize,
    /// Functions carrying an HTTP-method-like decorator.
    pub http_endpoint_count: usize,
    /// Threshold-derived guidance, in fixed metric order.
    pub recommendations: Vec<Recommendation>,
}

/// A single piece of threshold-derived guidance. Stateless and
/// regenerable from a `Metrics` snapshot at any time.
#[derive(Debug, Clone, Serialize)]
pub struct Recommendation {
    /// The metric this recommendation is derived from.
    pub metric: String,
    /// The metric's value at scan time.
    pub value: f64,
    /// Severity tier of the guidance.
    pub severity: Severity,
    /// Human-readable guidance.
    pub text: String,
}

/// The result of one project scan. Owned by the caller after the
/// orchestrator returns.
#[derive(Debug, Serialize)]
pub struct Report {
    /// Name of the scanned project.
    pub project_name: String,
    /// Number of source files processed (including unparseable ones).
    pub files_analyzed: usize,
    /// Number of files with at least one issue.
    pub files_with_issues: usize,
    /// Sum of issue counts across all files.
    pub total_issues: usize,
    /// Per-file issue lists; issue order is detector-invocation order.
    pub detailed_report: BTreeMap<String, Vec<Issue>>,
    /// Aggregated metrics and recommendations.
    pub summary_metrics: Metrics,
    /// Optional LLM-produced elaboration, filled by the enrichment stage.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub llm_recommendations: Option<String>,
}

impl Report {
    /// Creates an empty report for a project with no scannable files.
    #[must_use]
    pub fn empty(project_name: &str) -> Self {
        Self {
            project_name: project_name.to_owned(),
            files_analyzed: 0,
            files_with_issues: 0,
            total_issues: 0,
            detailed_report: BTreeMap::new(),
            summary_metrics: Metrics::default(),
            llm_recommendations: None,
        }
    }

    /// Recomputes the issue tallies from `detailed_report`.
    ///
    /// Called once by the orchestrator after the last issue is recorded,
    /// keeping the invariants `total_issues == sum(len(issues))` and
    /// `files_with_issues <= files_analyzed` true by construction.
    pub fn refresh_totals(&mut self) {
        self.total_issues = self.detailed_report.values().map(Vec::len).sum();
        self.files_with_issues = self
            .detailed_report
            .values()
            .filter(|v| !v.is_empty())
            .count();
    }

    /// Groups `(file, issue)` pairs by severity, most severe first.
    /// Mirrors the grouping the report view applies before rendering.
    #[must_use]
    pub fn issues_by_severity(&self) -> Vec<(Severity, Vec<(&str, &Issue)>)> {
        let mut groups: BTreeMap<Severity, Vec<(&str, &Issue)>> = BTreeMap::new();
        for (file, issues) in &self.detailed_report {
            for issue in issues {
                groups
                    .entry(issue.severity)
                    .or_default()
                    .push((file.as_str(), issue));
            }
        }
        groups.into_iter().rev().collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn issue(severity: Severity) -> Issue {
        Issue {
            line: IssueLine::Line(1),
            kind: IssueKind::SensitiveVariable,
            message: "m".to_owned(),
            severity,
            recommendation: "r".to_owned(),
            code_excerpt: None,
            subtype: None,
        }
    }

    #[test]
    fn issue_line_serializes_as_number_or_na() {
        let v = serde_json::to_value(IssueLine::Line(7)).unwrap();
        assert_eq!(v, serde_json::json!(7));
        let v = serde_json::to_value(IssueLine::NotApplicable).unwrap();
        assert_eq!(v, serde_json::json!("N/A"));
    }

    #[test]
    fn refresh_totals_counts_files_and_issues() {
        let mut report = Report::empty("p");
        report.files_analyzed = 3;
        report
            .detailed_report
            .insert("a.py".to_owned(), vec![issue(Severity::High)]);
        report.detailed_report.insert("b.py".to_owned(), Vec::new());
        report.detailed_report.insert(
            "c.py".to_owned(),
            vec![issue(Severity::Critical), issue(Severity::Info)],
        );
        report.refresh_totals();
        assert_eq!(report.total_issues, 3);
        assert_eq!(report.files_with_issues, 2);
    }

    #[test]
    fn severity_groups_are_most_severe_first() {
        let mut report = Report::empty("p");
        report
            .detailed_report
            .insert("a.py".to_owned(), vec![issue(Severity::Info)]);
        report
            .detailed_report
            .insert("b.py".to_owned(), vec![issue(Severity::Critical)]);
        let groups = report.issues_by_severity();
        assert_eq!(groups[0].0, Severity::Critical);
        assert_eq!(groups[1].0, Severity::Info);
    }
}
