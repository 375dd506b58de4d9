use clap::{Args, Parser};
use std::path::PathBuf;

/// Help text for configuration file options, shown at the bottom of --help.
const CONFIG_HELP: &str = "\
CONFIGURATION FILE (.pyaudit.toml):
  Create this file in the scanned project's root to set defaults.

  project_name = \"my-service\"
  exclude_folders = [\"migrations\", \"fixtures\"]
  use_default_excludes = true

  [linter]
  enabled = true
  program = \"flake8\"
  args = [\"--count\", \"-qq\"]

  [auditor]
  enabled = true
  program = \"safety\"
  args = [\"check\", \"--json\"]

  [enrichment]
  model = \"gpt-4o-mini\"
  api_key_env = \"PYAUDIT_LLM_API_KEY\"
  max_attempts = 3
";

/// Options for output formatting and verbosity.
#[derive(Args, Debug, Default, Clone)]
#[allow(clippy::struct_excessive_bools)] // CLI flags are legitimately booleans
pub struct OutputOptions {
    /// Output the report as pretty-printed JSON.
    #[arg(long)]
    pub json: bool,

    /// Write the report to a file instead of stdout.
    #[arg(short, long, value_name = "FILE")]
    pub output: Option<PathBuf>,

    /// Show scan warnings (skipped bridges, unanalyzable files).
    #[arg(short, long)]
    pub verbose: bool,

    /// Quiet mode: show only the overview and per-severity counts.
    #[arg(short, long, conflicts_with = "verbose")]
    pub quiet: bool,
}

/// Command-line arguments.
#[derive(Parser, Debug)]
#[command(
    name = "pyaudit",
    version,
    about = "Heuristic security and code-quality scanner for Python projects",
    after_help = CONFIG_HELP
)]
pub struct Cli {
    /// Path to the Python project to scan.
    pub path: PathBuf,

    /// Override the project name shown in the report.
    #[arg(long, value_name = "NAME")]
    pub project_name: Option<String>,

    /// Additional folder names to exclude from the scan (repeatable).
    #[arg(long = "exclude", value_name = "FOLDER")]
    pub exclude_folders: Vec<String>,

    /// Skip the external style linter.
    #[arg(long)]
    pub no_lint: bool,

    /// Skip the dependency vulnerability audit.
    #[arg(long)]
    pub no_deps: bool,

    /// Ask the configured language model to elaborate on the findings.
    #[cfg(feature = "enrichment")]
    #[arg(long)]
    pub enrich: bool,

    #[command(flatten)]
    pub output_options: OutputOptions,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_minimal_invocation() {
        let cli = Cli::try_parse_from(["pyaudit", "some/dir"]).unwrap();
        assert_eq!(cli.path, PathBuf::from("some/dir"));
        assert!(!cli.output_options.json);
        assert!(cli.exclude_folders.is_empty());
    }

    #[test]
    fn repeatable_excludes_accumulate() {
        let cli =
            Cli::try_parse_from(["pyaudit", ".", "--exclude", "a", "--exclude", "b"]).unwrap();
        assert_eq!(cli.exclude_folders, vec!["a", "b"]);
    }

    #[test]
    fn quiet_and_verbose_conflict() {
        assert!(Cli::try_parse_from(["pyaudit", ".", "--quiet", "--verbose"]).is_err());
    }
}
