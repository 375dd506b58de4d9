//! Bridges to external tools.
//!
//! The engine consumes two external collaborators: a general-purpose
//! style linter (an opaque violation count per file) and a dependency
//! vulnerability scanner (advisory records per project). Both run as
//! subprocesses behind traits so the orchestrator can degrade gracefully
//! when a tool is missing or misbehaves, and so tests can substitute
//! fakes.

use serde::{Deserialize, Serialize};
use std::path::Path;
use std::process::Command;
use thiserror::Error;

/// A failed interaction with an external tool.
#[derive(Debug, Error)]
pub enum BridgeError {
    /// The tool could not be spawned at all.
    #[error("failed to run {tool}: {source}")]
    Spawn {
        /// Program name.
        tool: String,
        /// Underlying IO error.
        #[source]
        source: std::io::Error,
    },
    /// The tool exited with an unexpected status.
    #[error("{tool} exited with unexpected status {status}")]
    UnexpectedStatus {
        /// Program name.
        tool: String,
        /// Raw exit code (-1 when terminated by signal).
        status: i32,
    },
    /// The tool's output could not be interpreted.
    #[error("unreadable output from {tool}: {detail}")]
    BadOutput {
        /// Program name.
        tool: String,
        /// What went wrong.
        detail: String,
    },
}

/// Per-file style violation counting.
pub trait StyleLinter: Send + Sync {
    /// Returns the number of style violations in `file`.
    fn violation_count(&self, file: &Path) -> Result<usize, BridgeError>;
}

/// Project-level dependency vulnerability lookup.
pub trait DependencyAuditor: Send + Sync {
    /// Returns known advisories for the project rooted at `project_root`.
    fn audit(&self, project_root: &Path) -> Result<Vec<DependencyAdvisory>, BridgeError>;
}

/// One known-vulnerable dependency record.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DependencyAdvisory {
    /// The affected package.
    pub package_name: String,
    /// Version specifier the advisory applies to.
    pub vulnerable_spec: String,
    /// Advisory text.
    pub advisory: String,
    /// The version found in the project.
    pub analyzed_version: String,
}

/// Invokes a flake8-style linter: exit code 0 means clean, exit code 1
/// means violations were found and `--count` prints the total as the
/// last stdout line. Any other exit status is an error the caller
/// downgrades to zero violations.
pub struct CommandLinter {
    program: String,
    args: Vec<String>,
}

impl Default for CommandLinter {
    fn default() -> Self {
        Self::new("flake8", &["--count", "-qq"])
    }
}

impl CommandLinter {
    /// Creates a linter bridge around an arbitrary command.
    #[must_use]
    pub fn new(program: &str, args: &[&str]) -> Self {
        Self {
            program: program.to_owned(),
            args: args.iter().map(|&s| s.to_owned()).collect(),
        }
    }
}

impl StyleLinter for CommandLinter {
    fn violation_count(&self, file: &Path) -> Result<usize, BridgeError> {
        let output = Command::new(&self.program)
            .args(&self.args)
            .arg(file)
            .output()
            .map_err(|source| BridgeError::Spawn {
                tool: self.program.clone(),
                source,
            })?;

        match output.status.code() {
            Some(0) => Ok(0),
            Some(1) => {
                let stdout = String::from_utf8_lossy(&output.stdout);
                let count = stdout
                    .lines()
                    .rev()
                    .find(|l| !l.trim().is_empty())
                    .and_then(|l| l.trim().parse::<usize>().ok());
                count.ok_or_else(|| BridgeError::BadOutput {
                    tool: self.program.clone(),
                    detail: "no trailing violation count in output".to_owned(),
                })
            }
            status => Err(BridgeError::UnexpectedStatus {
                tool: self.program.clone(),
                status: status.unwrap_or(-1),
            }),
        }
    }
}

/// Invokes a safety-style dependency scanner producing a JSON array of
/// `[package, vulnerable_spec, analyzed_version, advisory, id]` rows on
/// stdout. Exit code 0 means no advisories, exit code 255 (safety's
/// convention) or 1 means advisories were found.
pub struct CommandAuditor {
    program: String,
    args: Vec<String>,
}

impl Default for CommandAuditor {
    fn default() -> Self {
        Self::new("safety", &["check", "--json"])
    }
}

impl CommandAuditor {
    /// Creates an auditor bridge around an arbitrary command.
    #[must_use]
    pub fn new(program: &str, args: &[&str]) -> Self {
        Self {
            program: program.to_owned(),
            args: args.iter().map(|&s| s.to_owned()).collect(),
        }
    }
}

impl DependencyAuditor for CommandAuditor {
    fn audit(&self, project_root: &Path) -> Result<Vec<DependencyAdvisory>, BridgeError> {
        let output = Command::new(&self.program)
            .args(&self.args)
            .current_dir(project_root)
            .output()
            .map_err(|source| BridgeError::Spawn {
                tool: self.program.clone(),
                source,
            })?;

        match output.status.code() {
            Some(0) => Ok(Vec::new()),
            Some(1 | 255) => {
                let stdout = String::from_utf8_lossy(&output.stdout);
                parse_advisory_rows(&stdout).map_err(|detail| BridgeError::BadOutput {
                    tool: self.program.clone(),
                    detail,
                })
            }
            status => Err(BridgeError::UnexpectedStatus {
                tool: self.program.clone(),
                status: status.unwrap_or(-1),
            }),
        }
    }
}

/// Parses the legacy safety JSON shape: an array of 5-element rows.
fn parse_advisory_rows(stdout: &str) -> Result<Vec<DependencyAdvisory>, String> {
    let rows: Vec<Vec<serde_json::Value>> =
        serde_json::from_str(stdout).map_err(|e| e.to_string())?;
    let mut advisories = Vec::with_capacity(rows.len());
    for row in rows {
        let field = |i: usize| -> String {
            row.get(i)
                .and_then(serde_json::Value::as_str)
                .unwrap_or_default()
                .to_owned()
        };
        advisories.push(DependencyAdvisory {
            package_name: field(0),
            vulnerable_spec: field(1),
            analyzed_version: field(2),
            advisory: field(3),
        });
    }
    Ok(advisories)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_safety_rows() {
        let stdout = r#"[["django", "<2.2.18", "2.2.10", "CVE-2021-3281: path traversal", "39535"]]"#;
        let advisories = parse_advisory_rows(stdout).unwrap();
        assert_eq!(advisories.len(), 1);
        assert_eq!(advisories[0].package_name, "django");
        assert_eq!(advisories[0].analyzed_version, "2.2.10");
        assert!(advisories[0].advisory.contains("path traversal"));
    }

    #[test]
    fn rejects_non_json_output() {
        assert!(parse_advisory_rows("not json").is_err());
    }

    #[test]
    fn missing_linter_is_a_spawn_error() {
        let linter = CommandLinter::new("definitely-not-a-real-linter-binary", &[]);
        let err = linter.violation_count(Path::new("x.py")).unwrap_err();
        assert!(matches!(err, BridgeError::Spawn { .. }));
    }
}
