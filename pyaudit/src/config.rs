//! Configuration loading.
//!
//! Configuration is read from a `.pyaudit.toml` file in the scanned
//! project's root, when present. Every field has a default, so the
//! scanner runs unconfigured. CLI flags override file values; the
//! entry point applies those overrides after loading.

use crate::constants::{default_exclude_folders, CONFIG_FILENAME};
use serde::Deserialize;
use std::path::Path;

/// Scanner configuration.
#[derive(Debug, Clone, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct Config {
    /// Display name of the project; defaults to the root directory name.
    pub project_name: Option<String>,
    /// Folder names excluded from the walk, in addition to the built-in
    /// defaults when `use_default_excludes` is true.
    pub exclude_folders: Vec<String>,
    /// Whether the built-in exclude list (.git, venv, __pycache__, ...)
    /// applies.
    pub use_default_excludes: bool,
    /// External style linter settings.
    pub linter: LinterConfig,
    /// External dependency auditor settings.
    pub auditor: AuditorConfig,
    /// LLM enrichment settings.
    #[cfg(feature = "enrichment")]
    pub enrichment: EnrichmentConfig,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            project_name: None,
            exclude_folders: Vec::new(),
            use_default_excludes: true,
            linter: LinterConfig::default(),
            auditor: AuditorConfig::default(),
            #[cfg(feature = "enrichment")]
            enrichment: EnrichmentConfig::default(),
        }
    }
}

/// Style linter bridge settings.
#[derive(Debug, Clone, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct LinterConfig {
    /// Whether the linter bridge runs at all.
    pub enabled: bool,
    /// Program to invoke.
    pub program: String,
    /// Arguments placed before the file path.
    pub args: Vec<String>,
}

impl Default for LinterConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            program: "flake8".to_owned(),
            args: vec!["--count".to_owned(), "-qq".to_owned()],
        }
    }
}

/// Dependency auditor bridge settings.
#[derive(Debug, Clone, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct AuditorConfig {
    /// Whether the dependency audit runs at all.
    pub enabled: bool,
    /// Program to invoke.
    pub program: String,
    /// Arguments passed to the program.
    pub args: Vec<String>,
}

impl Default for AuditorConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            program: "safety".to_owned(),
            args: vec!["check".to_owned(), "--json".to_owned()],
        }
    }
}

/// LLM enrichment settings. The API key is never stored in the config
/// file; it is read from the named environment variable at call time.
#[cfg(feature = "enrichment")]
#[derive(Debug, Clone, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct EnrichmentConfig {
    /// Chat-completions endpoint URL.
    pub api_url: String,
    /// Model identifier sent with each request.
    pub model: String,
    /// Environment variable holding the API key.
    pub api_key_env: String,
    /// Upper bound on generation attempts per scan.
    pub max_attempts: u32,
    /// Initial backoff in milliseconds; doubles per retry.
    pub initial_backoff_ms: u64,
    /// Backoff ceiling in milliseconds.
    pub max_backoff_ms: u64,
}

#[cfg(feature = "enrichment")]
impl Default for EnrichmentConfig {
    fn default() -> Self {
        Self {
            api_url: "https://api.openai.com/v1/chat/completions".to_owned(),
            model: "gpt-4o-mini".to_owned(),
            api_key_env: "PYAUDIT_LLM_API_KEY".to_owned(),
            max_attempts: 3,
            initial_backoff_ms: 500,
            max_backoff_ms: 8_000,
        }
    }
}

impl Config {
    /// Loads `.pyaudit.toml` from `project_root` if present, otherwise
    /// returns defaults.
    ///
    /// # Errors
    ///
    /// Returns an error when the file exists but cannot be read or parsed.
    pub fn load(project_root: &Path) -> anyhow::Result<Self> {
        let path = project_root.join(CONFIG_FILENAME);
        if !path.is_file() {
            return Ok(Self::default());
        }
        let raw = std::fs::read_to_string(&path)?;
        let config: Self = toml::from_str(&raw)
            .map_err(|e| anyhow::anyhow!("invalid {}: {e}", path.display()))?;
        Ok(config)
    }

    /// The effective set of excluded folder names.
    #[must_use]
    pub fn effective_excludes(&self) -> Vec<String> {
        let mut excludes: Vec<String> = if self.use_default_excludes {
            default_exclude_folders()
                .iter()
                .map(|&s| s.to_owned())
                .collect()
        } else {
            Vec::new()
        };
        excludes.extend(self.exclude_folders.iter().cloned());
        excludes.sort();
        excludes.dedup();
        excludes
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_file_yields_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let config = Config::load(dir.path()).unwrap();
        assert!(config.linter.enabled);
        assert_eq!(config.linter.program, "flake8");
        assert!(config.use_default_excludes);
    }

    #[test]
    fn file_values_override_defaults() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(
            dir.path().join(CONFIG_FILENAME),
            r#"
project_name = "demo"
exclude_folders = ["migrations"]

[linter]
enabled = false
"#,
        )
        .unwrap();
        let config = Config::load(dir.path()).unwrap();
        assert_eq!(config.project_name.as_deref(), Some("demo"));
        assert!(!config.linter.enabled);
        assert!(config
            .effective_excludes()
            .contains(&"migrations".to_owned()));
        assert!(config.effective_excludes().contains(&".git".to_owned()));
    }

    #[test]
    fn unknown_keys_are_rejected() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join(CONFIG_FILENAME), "no_such_key = 1\n").unwrap();
        assert!(Config::load(dir.path()).is_err());
    }
}
