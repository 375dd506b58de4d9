//! Shared CLI entry point.
//!
//! `run_with_args` is the whole program behind a testable seam: it
//! parses arguments, loads configuration, runs the scan, optionally
//! enriches the report, and renders it. The process exit code is the
//! return value (0 clean, 1 when issues were found or usage was wrong),
//! so the binary itself stays a two-line shim.

use crate::analyzer::SecurityAnalyzer;
use crate::cli::Cli;
use crate::config::Config;
use crate::output;
use crate::report::Report;
use anyhow::{Context, Result};
use clap::Parser;
use std::io::Write;
use std::path::Path;

/// Runs the scanner with the given arguments (without the binary name),
/// writing to stdout.
///
/// # Errors
///
/// Returns an error for unrecoverable failures: unreadable
/// configuration, missing project root, or IO failures while writing
/// the report.
pub fn run_with_args(args: Vec<String>) -> Result<i32> {
    let mut stdout = std::io::stdout().lock();
    run_with_args_to(args, &mut stdout)
}

/// Like [`run_with_args`], but renders into the given writer. Tests use
/// this to capture output.
///
/// # Errors
///
/// Same conditions as [`run_with_args`].
pub fn run_with_args_to<W: Write>(args: Vec<String>, writer: &mut W) -> Result<i32> {
    let cli = match Cli::try_parse_from(std::iter::once("pyaudit".to_owned()).chain(args)) {
        Ok(cli) => cli,
        Err(e) => {
            // Covers --help and --version too; clap picks the code
            e.print()?;
            return Ok(e.exit_code());
        }
    };

    let config = load_config(&cli)?;
    #[cfg(feature = "enrichment")]
    let enrichment_settings = config.enrichment.clone();
    let show_progress =
        !cli.output_options.json && !cli.output_options.quiet && cli.output_options.output.is_none();
    let analyzer = SecurityAnalyzer::new(config).with_progress(show_progress);

    #[allow(unused_mut)]
    let mut report = analyzer.analyze_project(&cli.path)?;

    #[cfg(feature = "enrichment")]
    if cli.enrich {
        enrich(&mut report, &enrichment_settings)?;
    }

    render(&cli, &report, writer)?;
    if cli.output_options.verbose {
        output::print_warnings(writer, &analyzer.warnings())?;
    }

    Ok(i32::from(report.total_issues > 0))
}

fn load_config(cli: &Cli) -> Result<Config> {
    let mut config = Config::load(&cli.path)?;
    if cli.project_name.is_some() {
        config.project_name.clone_from(&cli.project_name);
    }
    config
        .exclude_folders
        .extend(cli.exclude_folders.iter().cloned());
    if cli.no_lint {
        config.linter.enabled = false;
    }
    if cli.no_deps {
        config.auditor.enabled = false;
    }
    Ok(config)
}

#[cfg(feature = "enrichment")]
fn enrich(report: &mut Report, settings: &crate::config::EnrichmentConfig) -> Result<()> {
    use crate::enrichment::{enrich_report, OpenAiProvider, RetryPolicy};
    use std::time::Duration;

    let provider = match OpenAiProvider::from_env(
        &settings.api_url,
        &settings.model,
        &settings.api_key_env,
    ) {
        Ok(provider) => provider,
        Err(e) => {
            tracing::warn!("enrichment skipped: {e}");
            return Ok(());
        }
    };
    let policy = RetryPolicy {
        max_attempts: settings.max_attempts,
        initial_backoff: Duration::from_millis(settings.initial_backoff_ms),
        max_backoff: Duration::from_millis(settings.max_backoff_ms),
    };

    let runtime = tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
        .context("failed to start async runtime for enrichment")?;
    runtime.block_on(enrich_report(report, &provider, policy));
    Ok(())
}

fn render<W: Write>(cli: &Cli, report: &Report, writer: &mut W) -> Result<()> {
    if cli.output_options.json {
        let json = serde_json::to_string_pretty(report)?;
        match &cli.output_options.output {
            Some(path) => write_report_file(path, &json)?,
            None => writeln!(writer, "{json}")?,
        }
        return Ok(());
    }

    let mut rendered = Vec::new();
    if cli.output_options.quiet {
        output::print_report_quiet(&mut rendered, report)?;
    } else {
        output::print_report(&mut rendered, report)?;
    }
    match &cli.output_options.output {
        Some(path) => {
            let text = String::from_utf8_lossy(&rendered);
            write_report_file(path, &text)?;
        }
        None => writer.write_all(&rendered)?,
    }
    Ok(())
}

fn write_report_file(path: &Path, contents: &str) -> Result<()> {
    std::fs::write(path, contents)
        .with_context(|| format!("failed to write report to {}", path.display()))?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn run(args: &[&str]) -> (i32, String) {
        let mut buf = Vec::new();
        let code = run_with_args_to(args.iter().map(|&s| s.to_owned()).collect(), &mut buf)
            .unwrap();
        (code, String::from_utf8(buf).unwrap())
    }

    #[test]
    fn clean_project_exits_zero() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("ok.py"), "def f():\n    return 1\n").unwrap();
        let (code, out) = run(&[
            dir.path().to_str().unwrap(),
            "--no-lint",
            "--no-deps",
            "--quiet",
        ]);
        assert_eq!(code, 0);
        assert!(out.contains("Files analyzed"));
    }

    #[test]
    fn findings_exit_one_and_appear_in_json() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("bad.py"), "password = \"x\"\n").unwrap();
        let (code, out) = run(&[
            dir.path().to_str().unwrap(),
            "--no-lint",
            "--no-deps",
            "--json",
        ]);
        assert_eq!(code, 1);
        let report: serde_json::Value = serde_json::from_str(&out).unwrap();
        assert_eq!(report["total_issues"], 1);
        assert_eq!(
            report["detailed_report"]["bad.py"][0]["kind"],
            "sensitive_variable"
        );
    }

    #[test]
    fn output_flag_writes_the_file() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("ok.py"), "x = 1\n").unwrap();
        let target = dir.path().join("report.json");
        let (code, out) = run(&[
            dir.path().to_str().unwrap(),
            "--no-lint",
            "--no-deps",
            "--json",
            "--output",
            target.to_str().unwrap(),
        ]);
        assert_eq!(code, 0);
        assert!(out.is_empty());
        let written: serde_json::Value =
            serde_json::from_str(&std::fs::read_to_string(target).unwrap()).unwrap();
        assert_eq!(written["files_analyzed"], 1);
    }
}
