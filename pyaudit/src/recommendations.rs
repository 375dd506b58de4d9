//! Threshold-based recommendation engine.
//!
//! A pure function over a finished `Metrics` snapshot. Recommendations
//! are emitted in a fixed metric order so two runs over the same tree
//! produce byte-identical output.

use crate::report::{Metrics, Recommendation, Severity};

/// Cyclomatic complexity above this is flagged as high severity.
pub const COMPLEXITY_HIGH: usize = 50;
/// Cyclomatic complexity above this (and at or below the high bound) is
/// flagged as medium severity.
pub const COMPLEXITY_MEDIUM: usize = 30;

/// Branch count above this is flagged as high severity.
pub const BRANCH_HIGH: usize = 40;
/// Branch count above this is flagged as medium severity.
pub const BRANCH_MEDIUM: usize = 20;

/// Inheritance depth above this is flagged as high severity.
pub const DEPTH_HIGH: usize = 4;
/// Inheritance depth above this is flagged as medium severity.
pub const DEPTH_MEDIUM: usize = 2;

/// Average function length above this is flagged as high severity.
pub const FUNCTION_LENGTH_HIGH: f64 = 30.0;
/// Average function length above this is flagged as medium severity.
pub const FUNCTION_LENGTH_MEDIUM: f64 = 20.0;

/// Style violation count above this is flagged as high severity.
pub const STYLE_HIGH: usize = 50;
/// Style violation count above this is flagged as medium severity.
pub const STYLE_MEDIUM: usize = 20;

/// Derives guidance from a metrics snapshot.
///
/// Emission order is fixed: cyclomatic complexity, branch count,
/// inheritance depth, average function length, style violations, then
/// the security counters (sensitive variables, SQL injection, XSS).
/// The first five always discuss their metric (low tier when healthy,
/// except function length and style which stay silent when healthy);
/// the security entries appear only when their counter is nonzero.
#[must_use]
#[allow(clippy::cast_precision_loss)]
pub fn build_recommendations(metrics: &Metrics) -> Vec<Recommendation> {
    let mut out = Vec::new();

    let complexity = metrics.cyclomatic_complexity;
    out.push(if complexity > COMPLEXITY_HIGH {
        entry(
            "cyclomatic_complexity",
            complexity as f64,
            Severity::High,
            format!(
                "Critical: total cyclomatic complexity is {complexity}. \
                 Break the most complex functions into smaller units before adding features."
            ),
        )
    } else if complexity > COMPLEXITY_MEDIUM {
        entry(
            "cyclomatic_complexity",
            complexity as f64,
            Severity::Medium,
            format!(
                "Total cyclomatic complexity is {complexity}. \
                 Consider simplifying the most branch-heavy functions."
            ),
        )
    } else {
        entry(
            "cyclomatic_complexity",
            complexity as f64,
            Severity::Low,
            "Cyclomatic complexity is within a healthy range.".to_owned(),
        )
    });

    let branches = metrics.branch_count;
    out.push(if branches > BRANCH_HIGH {
        entry(
            "branch_count",
            branches as f64,
            Severity::High,
            format!(
                "The project contains {branches} branching statements. \
                 Heavy branching usually hides missing abstractions."
            ),
        )
    } else if branches > BRANCH_MEDIUM {
        entry(
            "branch_count",
            branches as f64,
            Severity::Medium,
            format!("{branches} branching statements. Review dense conditional blocks."),
        )
    } else {
        entry(
            "branch_count",
            branches as f64,
            Severity::Low,
            "Branching is within a healthy range.".to_owned(),
        )
    });

    let depth = metrics.max_inheritance_depth;
    out.push(if depth > DEPTH_HIGH {
        entry(
            "max_inheritance_depth",
            depth as f64,
            Severity::High,
            format!(
                "The deepest inheritance chain is {depth} levels. \
                 Prefer composition over long class hierarchies."
            ),
        )
    } else if depth > DEPTH_MEDIUM {
        entry(
            "max_inheritance_depth",
            depth as f64,
            Severity::Medium,
            format!("Inheritance reaches {depth} levels. Watch for fragile base classes."),
        )
    } else {
        entry(
            "max_inheritance_depth",
            depth as f64,
            Severity::Low,
            "Inheritance depth is shallow.".to_owned(),
        )
    });

    let avg_len = metrics.avg_function_length;
    if avg_len > FUNCTION_LENGTH_HIGH {
        out.push(entry(
            "avg_function_length",
            avg_len,
            Severity::High,
            format!(
                "Functions average {avg_len:.1} lines. \
                 Long functions resist testing and review; extract helpers."
            ),
        ));
    } else if avg_len > FUNCTION_LENGTH_MEDIUM {
        out.push(entry(
            "avg_function_length",
            avg_len,
            Severity::Medium,
            format!("Functions average {avg_len:.1} lines. Consider extracting helpers."),
        ));
    }

    let style = metrics.style_violations;
    if style > STYLE_HIGH {
        out.push(entry(
            "style_violations",
            style as f64,
            Severity::High,
            format!(
                "{style} style violations. \
                 Run the style linter locally and enforce it in CI."
            ),
        ));
    } else if style > STYLE_MEDIUM {
        out.push(entry(
            "style_violations",
            style as f64,
            Severity::Medium,
            format!("{style} style violations. Schedule a cleanup pass."),
        ));
    }

    let sensitive = metrics.sensitive_variable_count;
    if sensitive > 0 {
        out.push(entry(
            "sensitive_variable_count",
            sensitive as f64,
            Severity::High,
            format!(
                "CRITICAL: {sensitive} hardcoded credential(s) detected. \
                 Move secrets to environment variables or a secret manager immediately."
            ),
        ));
    }

    let sqli = metrics.sql_injection_count;
    if sqli > 0 {
        out.push(entry(
            "sql_injection_count",
            sqli as f64,
            Severity::Critical,
            format!(
                "{sqli} potential SQL injection site(s). \
                 Use parameterized queries for every dynamic value."
            ),
        ));
    }

    let xss = metrics.xss_count;
    if xss > 0 {
        out.push(entry(
            "xss_count",
            xss as f64,
            Severity::High,
            format!(
                "{xss} potential XSS sink(s). \
                 Escape or sanitize user-controlled data before rendering."
            ),
        ));
    }

    out
}

fn entry(metric: &str, value: f64, severity: Severity, text: String) -> Recommendation {
    Recommendation {
        metric: metric.to_owned(),
        value,
        severity,
        text,
    }
}
