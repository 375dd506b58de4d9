//! Asynchronous LLM report enrichment.
//!
//! Runs strictly after the base report is finalized and only ever fills
//! `llm_recommendations`: cancelling or failing this stage leaves the
//! rest of the report untouched. Generation attempts are bounded by an
//! explicit state machine with exponential backoff between retries, and
//! both the prompt and the response are truncated to fixed character
//! budgets so one oversized report cannot blow the request.

use crate::report::Report;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use thiserror::Error;
use tracing::{debug, warn};

/// Upper bound on the prompt sent to the provider, in characters.
pub const PROMPT_CHAR_BUDGET: usize = 6_000;
/// Upper bound on the stored response, in characters.
pub const RESPONSE_CHAR_BUDGET: usize = 4_000;
/// At most this many issues per file are quoted in the prompt.
pub const ISSUES_PER_FILE: usize = 2;
/// At most this many issues overall are quoted in the prompt.
pub const ISSUES_TOTAL: usize = 5;

/// Text stored when every generation attempt failed.
pub const FALLBACK_TEXT: &str =
    "Automated review unavailable: the language model could not be reached. \
     The findings and recommendations above are complete without it.";

/// A failed interaction with the language model provider.
#[derive(Debug, Error)]
pub enum EnrichError {
    /// The request could not be sent or the response not received.
    #[error("transport error: {0}")]
    Transport(String),
    /// The provider answered with an error or an unusable body.
    #[error("provider error: {0}")]
    Provider(String),
    /// No API key was available in the configured environment variable.
    #[error("no API key in ${0}")]
    MissingKey(String),
}

/// Text generation behind a single-method seam, so the enrichment loop
/// is testable without a network.
#[async_trait]
pub trait LanguageModel: Send + Sync {
    /// Generates a completion for `prompt`.
    async fn generate(&self, prompt: &str) -> Result<String, EnrichError>;
}

/// Lifecycle of one enrichment run. Attempt numbers are 1-based.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AttemptState {
    /// No attempt made yet.
    Pending,
    /// Attempt `n` is in flight.
    Attempting(u32),
    /// Attempt `n` failed; waiting to retry.
    Retrying(u32),
    /// A generation attempt returned text.
    Succeeded,
    /// All attempts failed; the fallback text applies.
    Exhausted,
}

/// Retry bounds for the enrichment loop.
#[derive(Debug, Clone, Copy)]
pub struct RetryPolicy {
    /// Total generation attempts, including the first.
    pub max_attempts: u32,
    /// Backoff before the first retry; doubles per retry.
    pub initial_backoff: Duration,
    /// Backoff ceiling.
    pub max_backoff: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            initial_backoff: Duration::from_millis(500),
            max_backoff: Duration::from_secs(8),
        }
    }
}

impl RetryPolicy {
    fn backoff_for(self, retry: u32) -> Duration {
        let factor = 2_u32.saturating_pow(retry.saturating_sub(1));
        self.initial_backoff
            .saturating_mul(factor)
            .min(self.max_backoff)
    }
}

/// Builds the prompt for a report: the overview, the highest-value
/// issues (at most [`ISSUES_PER_FILE`] per file and [`ISSUES_TOTAL`]
/// overall), and the threshold recommendations, truncated to
/// [`PROMPT_CHAR_BUDGET`] characters.
#[must_use]
pub fn build_prompt(report: &Report) -> String {
    let mut prompt = format!(
        "You are reviewing a security scan of the Python project '{}'. \
         {} files were analyzed and {} issues found. \
         Give a short prioritized remediation plan.\n\nFindings:\n",
        report.project_name, report.files_analyzed, report.total_issues
    );

    let mut quoted = 0;
    'files: for (file, issues) in &report.detailed_report {
        for issue in issues.iter().take(ISSUES_PER_FILE) {
            if quoted == ISSUES_TOTAL {
                break 'files;
            }
            prompt.push_str(&format!(
                "- {} [{}]: {}\n",
                file,
                issue.severity.as_str(),
                issue.message
            ));
            quoted += 1;
        }
    }

    if !report.summary_metrics.recommendations.is_empty() {
        prompt.push_str("\nMetric guidance already issued:\n");
        for rec in &report.summary_metrics.recommendations {
            prompt.push_str(&format!("- {}\n", rec.text));
        }
    }

    truncate_chars(&prompt, PROMPT_CHAR_BUDGET)
}

/// Runs the bounded generation loop and fills `llm_recommendations`.
///
/// Returns the terminal [`AttemptState`] (`Succeeded` or `Exhausted`).
/// On exhaustion the report carries [`FALLBACK_TEXT`] so consumers
/// always see why the section is missing substance.
pub async fn enrich_report(
    report: &mut Report,
    model: &dyn LanguageModel,
    policy: RetryPolicy,
) -> AttemptState {
    let prompt = build_prompt(report);
    let last_attempt = policy.max_attempts.max(1);
    let mut state = AttemptState::Pending;

    loop {
        state = match state {
            AttemptState::Pending => AttemptState::Attempting(1),
            AttemptState::Retrying(attempt) => {
                tokio::time::sleep(policy.backoff_for(attempt)).await;
                AttemptState::Attempting(attempt + 1)
            }
            AttemptState::Attempting(attempt) => {
                debug!(attempt, "requesting report enrichment");
                match model.generate(&prompt).await {
                    Ok(text) => {
                        report.llm_recommendations =
                            Some(truncate_chars(&text, RESPONSE_CHAR_BUDGET));
                        AttemptState::Succeeded
                    }
                    Err(e) => {
                        warn!(attempt, error = %e, "enrichment attempt failed");
                        if attempt >= last_attempt {
                            AttemptState::Exhausted
                        } else {
                            AttemptState::Retrying(attempt)
                        }
                    }
                }
            }
            AttemptState::Succeeded => return AttemptState::Succeeded,
            AttemptState::Exhausted => {
                report.llm_recommendations = Some(FALLBACK_TEXT.to_owned());
                return AttemptState::Exhausted;
            }
        };
    }
}

fn truncate_chars(text: &str, budget: usize) -> String {
    if text.chars().count() <= budget {
        return text.to_owned();
    }
    text.chars().take(budget).collect()
}

// --- OpenAI-style chat-completions provider ---

/// Chat-completions HTTP provider. Works against OpenAI and compatible
/// endpoints; the API key is read from the environment once at
/// construction and never logged.
pub struct OpenAiProvider {
    client: reqwest::Client,
    api_url: String,
    model: String,
    api_key: String,
}

#[derive(Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: Vec<ChatMessage<'a>>,
    temperature: f32,
}

#[derive(Serialize)]
struct ChatMessage<'a> {
    role: &'a str,
    content: &'a str,
}

#[derive(Deserialize)]
struct ChatResponse {
    choices: Vec<ChatChoice>,
}

#[derive(Deserialize)]
struct ChatChoice {
    message: ChatResponseMessage,
}

#[derive(Deserialize)]
struct ChatResponseMessage {
    content: String,
}

impl OpenAiProvider {
    /// Creates a provider, reading the API key from `api_key_env`.
    ///
    /// # Errors
    ///
    /// Returns [`EnrichError::MissingKey`] when the variable is unset
    /// or empty.
    pub fn from_env(api_url: &str, model: &str, api_key_env: &str) -> Result<Self, EnrichError> {
        let api_key = std::env::var(api_key_env)
            .ok()
            .filter(|k| !k.is_empty())
            .ok_or_else(|| EnrichError::MissingKey(api_key_env.to_owned()))?;
        Ok(Self {
            client: reqwest::Client::new(),
            api_url: api_url.to_owned(),
            model: model.to_owned(),
            api_key,
        })
    }
}

#[async_trait]
impl LanguageModel for OpenAiProvider {
    async fn generate(&self, prompt: &str) -> Result<String, EnrichError> {
        let request = ChatRequest {
            model: &self.model,
            messages: vec![
                ChatMessage {
                    role: "system",
                    content: "You are a concise application security reviewer.",
                },
                ChatMessage {
                    role: "user",
                    content: prompt,
                },
            ],
            temperature: 0.2,
        };

        let response = self
            .client
            .post(&self.api_url)
            .bearer_auth(&self.api_key)
            .json(&request)
            .send()
            .await
            .map_err(|e| EnrichError::Transport(e.to_string()))?;

        if !response.status().is_success() {
            return Err(EnrichError::Provider(format!(
                "status {}",
                response.status()
            )));
        }

        let body: ChatResponse = response
            .json()
            .await
            .map_err(|e| EnrichError::Provider(e.to_string()))?;
        body.choices
            .into_iter()
            .next()
            .map(|c| c.message.content)
            .ok_or_else(|| EnrichError::Provider("empty choices array".to_owned()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::report::{Issue, IssueKind, IssueLine, Severity};
    use std::sync::atomic::{AtomicU32, Ordering};

    struct FlakyModel {
        failures_before_success: u32,
        calls: AtomicU32,
    }

    #[async_trait]
    impl LanguageModel for FlakyModel {
        async fn generate(&self, _prompt: &str) -> Result<String, EnrichError> {
            let call = self.calls.fetch_add(1, Ordering::SeqCst);
            if call < self.failures_before_success {
                Err(EnrichError::Transport("connection reset".to_owned()))
            } else {
                Ok("Rotate the leaked credentials first.".to_owned())
            }
        }
    }

    fn report_with_issues(count: usize) -> Report {
        let mut report = Report::empty("demo");
        report.files_analyzed = 1;
        report.detailed_report.insert(
            "app.py".to_owned(),
            (0..count)
                .map(|i| Issue {
                    line: IssueLine::Line(i + 1),
                    kind: IssueKind::SensitiveVariable,
                    message: format!("issue {i}"),
                    severity: Severity::High,
                    recommendation: "r".to_owned(),
                    code_excerpt: None,
                    subtype: None,
                })
                .collect(),
        );
        report.refresh_totals();
        report
    }

    #[tokio::test(start_paused = true)]
    async fn succeeds_after_transient_failures() {
        let model = FlakyModel {
            failures_before_success: 2,
            calls: AtomicU32::new(0),
        };
        let mut report = report_with_issues(1);
        let state = enrich_report(&mut report, &model, RetryPolicy::default()).await;
        assert_eq!(state, AttemptState::Succeeded);
        assert_eq!(model.calls.load(Ordering::SeqCst), 3);
        assert!(report
            .llm_recommendations
            .as_deref()
            .unwrap()
            .contains("Rotate"));
    }

    #[tokio::test(start_paused = true)]
    async fn exhaustion_installs_fallback_text() {
        let model = FlakyModel {
            failures_before_success: u32::MAX,
            calls: AtomicU32::new(0),
        };
        let mut report = report_with_issues(1);
        let state = enrich_report(&mut report, &model, RetryPolicy::default()).await;
        assert_eq!(state, AttemptState::Exhausted);
        assert_eq!(model.calls.load(Ordering::SeqCst), 3);
        assert_eq!(report.llm_recommendations.as_deref(), Some(FALLBACK_TEXT));
    }

    #[test]
    fn prompt_quotes_at_most_five_issues() {
        let report = report_with_issues(10);
        let prompt = build_prompt(&report);
        // Per-file cap binds first here
        assert!(prompt.contains("issue 0"));
        assert!(prompt.contains("issue 1"));
        assert!(!prompt.contains("issue 2"));
    }

    #[test]
    fn prompt_respects_char_budget() {
        let mut report = report_with_issues(5);
        report.project_name = "x".repeat(PROMPT_CHAR_BUDGET * 2);
        let prompt = build_prompt(&report);
        assert!(prompt.chars().count() <= PROMPT_CHAR_BUDGET);
    }

    #[test]
    fn backoff_doubles_and_caps() {
        let policy = RetryPolicy::default();
        assert_eq!(policy.backoff_for(1), Duration::from_millis(500));
        assert_eq!(policy.backoff_for(2), Duration::from_secs(1));
        assert_eq!(policy.backoff_for(10), Duration::from_secs(8));
    }
}
