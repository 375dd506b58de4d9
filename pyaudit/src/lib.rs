//! Core library for the pyaudit security and code-quality scanner.
//!
//! pyaudit scans a directory of Python source files and produces a
//! structured report of heuristic security findings, structural metrics,
//! and threshold-based recommendations. Parsing is built on the ruff
//! parser crates; external tools (style linter, dependency auditor,
//! language model) are isolated behind bridge traits so their failure
//! degrades the report instead of aborting the scan.

#![allow(
    clippy::type_complexity,
    clippy::too_many_arguments,
    clippy::similar_names,
    clippy::items_after_statements
)]
#![cfg_attr(test, allow(clippy::unwrap_used, clippy::expect_used))]

/// Module containing the orchestrator logic.
/// This includes the `SecurityAnalyzer` struct and the project scan pipeline.
pub mod analyzer;

/// Module wrapping the Python parser.
pub mod parsing;

/// Module defining the report data model.
/// This includes `Report`, `Issue`, `Metrics`, and `Recommendation`.
pub mod report;

/// Module containing the structural counter visitor.
pub mod structure;

/// Module computing project-wide class inheritance depths.
pub mod inheritance;

/// Module containing the pattern detectors and their driving walker.
pub mod detectors;

/// Module for calculating raw line metrics (effective LOC, comment LOC).
pub mod raw_metrics;

/// Module for calculating cyclomatic complexity.
pub mod complexity;

/// Module containing the external tool bridges (style linter, dependency auditor).
pub mod bridges;

/// Module containing the threshold-based recommendation engine.
pub mod recommendations;

/// Module containing the scan-scoped diagnostics sink.
pub mod diagnostics;

/// Module for the asynchronous LLM report-enrichment stage.
#[cfg(feature = "enrichment")]
pub mod enrichment;

/// Module for loading configuration.
pub mod config;

/// Module containing shared constants and pattern sets.
pub mod constants;

/// Module containing utility functions.
pub mod utils;

/// Module for rich CLI output formatting with colored text and tables.
pub mod output;

/// Module defining the command-line interface arguments.
pub mod cli;

/// Module defining the shared CLI entry point logic.
pub mod entry_point;
