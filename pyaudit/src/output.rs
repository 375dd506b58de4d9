//! Terminal rendering of a finished report.
//!
//! All printers take a writer so tests can capture output. The JSON
//! rendering lives in the entry point (it is plain `serde_json`); this
//! module is only the human-readable view.

use crate::report::{Issue, IssueLine, Report, Severity};
use colored::Colorize;
use comfy_table::presets::UTF8_FULL;
use comfy_table::{Attribute, Cell, Color, ContentArrangement, Table};
use indicatif::{ProgressBar, ProgressDrawTarget, ProgressStyle};
use std::io::Write;
use std::time::Duration;

/// Creates the scan progress bar. Hidden when `show` is false and in
/// test builds, so captured output stays clean.
///
/// # Panics
///
/// Panics if the progress style template is invalid (never with the
/// hardcoded template).
#[must_use]
pub fn scan_progress(total_files: u64, show: bool) -> ProgressBar {
    if !show || cfg!(test) {
        return ProgressBar::hidden();
    }

    let pb =
        ProgressBar::with_draw_target(Some(total_files), ProgressDrawTarget::stderr_with_hz(20));
    pb.set_style(
        ProgressStyle::default_bar()
            .template("{spinner:.cyan} [{bar:40.cyan/blue}] {pos}/{len} files ({percent}%) {msg}")
            .unwrap_or_else(|_| ProgressStyle::default_bar())
            .progress_chars("█▓░"),
    );
    pb.set_message("scanning...");
    pb.enable_steady_tick(Duration::from_millis(100));
    pb
}

/// Prints the report header.
///
/// # Errors
///
/// Returns an error if writing to the output fails.
pub fn print_header(writer: &mut impl Write, project_name: &str) -> std::io::Result<()> {
    writeln!(writer)?;
    writeln!(writer, "{}", "Python Security Audit".cyan().bold())?;
    writeln!(writer, "{} {}", "Project:".bold(), project_name)?;
    writeln!(writer)?;
    Ok(())
}

/// Prints the scan overview counts, coloring issue totals.
///
/// # Errors
///
/// Returns an error if writing to the output fails.
pub fn print_overview(writer: &mut impl Write, report: &Report) -> std::io::Result<()> {
    fn count(label: &str, n: usize) -> String {
        if n == 0 {
            format!("{}: {}", label, n.to_string().green())
        } else {
            format!("{}: {}", label, n.to_string().red().bold())
        }
    }

    writeln!(
        writer,
        "Files analyzed: {}  {}  {}",
        report.files_analyzed.to_string().bold(),
        count("Files with issues", report.files_with_issues),
        count("Total issues", report.total_issues),
    )?;
    Ok(())
}

fn create_table(headers: Vec<&str>) -> Table {
    let mut table = Table::new();
    table
        .load_preset(UTF8_FULL)
        .set_content_arrangement(ContentArrangement::Dynamic)
        .set_header(headers);
    table
}

fn severity_color(severity: Severity) -> Color {
    match severity {
        Severity::Critical | Severity::High => Color::Red,
        Severity::Medium => Color::Yellow,
        Severity::Low => Color::Blue,
        Severity::Info => Color::White,
    }
}

fn location(file: &str, line: IssueLine) -> String {
    match line {
        IssueLine::Line(n) => format!("{file}:{n}"),
        IssueLine::NotApplicable => file.to_owned(),
    }
}

/// Prints every issue grouped by severity, most severe first.
///
/// # Errors
///
/// Returns an error if writing to the output fails.
pub fn print_issues(writer: &mut impl Write, report: &Report) -> std::io::Result<()> {
    for (severity, issues) in report.issues_by_severity() {
        writeln!(
            writer,
            "\n{}",
            format!("{} ({})", severity.as_str().to_uppercase(), issues.len())
                .bold()
                .underline()
        )?;

        let mut table = create_table(vec!["Location", "Issue", "Recommendation"]);
        for (file, issue) in issues {
            table.add_row(vec![
                Cell::new(location(file, issue.line)).add_attribute(Attribute::Dim),
                Cell::new(issue_summary(issue)).fg(severity_color(issue.severity)),
                Cell::new(&issue.recommendation),
            ]);
        }
        writeln!(writer, "{table}")?;
    }
    Ok(())
}

fn issue_summary(issue: &Issue) -> String {
    match (&issue.subtype, &issue.code_excerpt) {
        (Some(subtype), Some(excerpt)) => {
            format!("{} [{subtype}]\n    {excerpt}", issue.message)
        }
        (Some(subtype), None) => format!("{} [{subtype}]", issue.message),
        (None, Some(excerpt)) => format!("{}\n    {excerpt}", issue.message),
        (None, None) => issue.message.clone(),
    }
}

/// Prints the metrics summary table.
///
/// # Errors
///
/// Returns an error if writing to the output fails.
#[allow(clippy::too_many_lines)]
pub fn print_metrics(writer: &mut impl Write, report: &Report) -> std::io::Result<()> {
    let m = &report.summary_metrics;
    writeln!(writer, "\n{}", "Metrics".bold().underline())?;

    let mut table = create_table(vec!["Metric", "Value"]);
    let rows: Vec<(&str, String)> = vec![
        ("Cyclomatic complexity", m.cyclomatic_complexity.to_string()),
        ("Branch count", m.branch_count.to_string()),
        ("Classes", m.class_count.to_string()),
        ("Functions", m.function_count.to_string()),
        (
            "Avg function length",
            format!("{:.1}", m.avg_function_length),
        ),
        (
            "Avg params per function",
            format!("{:.1}", m.avg_params_per_function),
        ),
        ("Effective LOC", m.effective_loc.to_string()),
        ("Comment LOC", m.comment_loc.to_string()),
        ("Style violations", m.style_violations.to_string()),
        ("Type annotations", m.type_annotations.to_string()),
        (
            "Max inheritance depth",
            m.max_inheritance_depth.to_string(),
        ),
        ("Decorators", m.decorator_count.to_string()),
        ("HTTP endpoints", m.http_endpoint_count.to_string()),
        (
            "Vulnerable dependencies",
            m.vulnerable_dependency_count.to_string(),
        ),
    ];
    for (name, value) in rows {
        table.add_row(vec![Cell::new(name), Cell::new(value)]);
    }
    writeln!(writer, "{table}")?;
    Ok(())
}

/// Prints the threshold-derived recommendations.
///
/// # Errors
///
/// Returns an error if writing to the output fails.
pub fn print_recommendations(writer: &mut impl Write, report: &Report) -> std::io::Result<()> {
    let recommendations = &report.summary_metrics.recommendations;
    if recommendations.is_empty() {
        return Ok(());
    }
    writeln!(writer, "\n{}", "Recommendations".bold().underline())?;

    let mut table = create_table(vec!["Severity", "Metric", "Guidance"]);
    for rec in recommendations {
        table.add_row(vec![
            Cell::new(rec.severity.as_str().to_uppercase()).fg(severity_color(rec.severity)),
            Cell::new(&rec.metric).add_attribute(Attribute::Dim),
            Cell::new(&rec.text),
        ]);
    }
    writeln!(writer, "{table}")?;
    Ok(())
}

/// Prints the LLM elaboration section when present.
///
/// # Errors
///
/// Returns an error if writing to the output fails.
pub fn print_enrichment(writer: &mut impl Write, report: &Report) -> std::io::Result<()> {
    if let Some(text) = &report.llm_recommendations {
        writeln!(writer, "\n{}", "Assistant Review".bold().underline())?;
        writeln!(writer, "{text}")?;
    }
    Ok(())
}

/// Prints scan warnings (skipped bridges, panicked files).
///
/// # Errors
///
/// Returns an error if writing to the output fails.
pub fn print_warnings(writer: &mut impl Write, warnings: &[String]) -> std::io::Result<()> {
    if warnings.is_empty() {
        return Ok(());
    }
    writeln!(writer, "\n{}", "Warnings".yellow().bold())?;
    for warning in warnings {
        writeln!(writer, "  {} {}", "!".yellow(), warning)?;
    }
    Ok(())
}

/// Prints the complete human-readable report.
///
/// # Errors
///
/// Returns an error if writing to the output fails.
pub fn print_report(writer: &mut impl Write, report: &Report) -> std::io::Result<()> {
    print_header(writer, &report.project_name)?;
    print_overview(writer, report)?;
    print_issues(writer, report)?;
    print_metrics(writer, report)?;
    print_recommendations(writer, report)?;
    print_enrichment(writer, report)?;
    Ok(())
}

/// Prints only the overview and issue counts per severity, for quiet mode.
///
/// # Errors
///
/// Returns an error if writing to the output fails.
pub fn print_report_quiet(writer: &mut impl Write, report: &Report) -> std::io::Result<()> {
    print_overview(writer, report)?;
    for (severity, issues) in report.issues_by_severity() {
        writeln!(writer, "  {}: {}", severity.as_str(), issues.len())?;
    }
    Ok(())
}
