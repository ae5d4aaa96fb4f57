//! Runtime configuration.
//!
//! Loaded from a TOML (or JSON, by extension) file, then adjusted by
//! `TASKWEAVE_*` environment variables.  Every section is optional; missing
//! keys take their defaults.

use std::path::Path;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use taskweave_kernel::{DEFAULT_BASE_DELAY, DEFAULT_MAX_ATTEMPTS, RetryPolicy};
use tracing::info;

use crate::error::{AgentError, Result};
use crate::orchestrator::{CriticalityPolicy, DEFAULT_NON_CRITICAL_INTENTS};

/// Prefix shared by all environment overrides.
pub const ENV_PREFIX: &str = "TASKWEAVE_";

/// Top-level configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TaskweaveConfig {
    /// Default log filter; `RUST_LOG` still wins in the CLI.
    pub log_level: String,
    pub retry: RetryConfig,
    pub orchestrator: OrchestratorConfig,
    pub http: HttpConfig,
    pub search: SearchConfig,
}

/// Resilient call executor settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RetryConfig {
    pub max_attempts: u32,
    pub base_delay_ms: u64,
    /// Per-attempt timeout; unset means attempts are not timed out.
    pub attempt_timeout_ms: Option<u64>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct OrchestratorConfig {
    /// Intents whose failure does not abort a run.
    pub non_critical_intents: Vec<String>,
}

/// Outbound HTTP settings shared by the adapters.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct HttpConfig {
    pub user_agent: String,
    pub request_timeout_secs: u64,
    /// Client-error statuses treated as transient on top of 5xx.
    pub retryable_statuses: Vec<u16>,
}

/// Web search skill settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SearchConfig {
    pub endpoint: String,
    /// Name of the environment variable holding the API key.
    pub api_key_env: String,
    pub max_results: u32,
}

impl Default for TaskweaveConfig {
    fn default() -> Self {
        Self {
            log_level: "info".into(),
            retry: RetryConfig::default(),
            orchestrator: OrchestratorConfig::default(),
            http: HttpConfig::default(),
            search: SearchConfig::default(),
        }
    }
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            max_attempts: DEFAULT_MAX_ATTEMPTS,
            base_delay_ms: DEFAULT_BASE_DELAY.as_millis() as u64,
            attempt_timeout_ms: Some(15_000),
        }
    }
}

impl Default for OrchestratorConfig {
    fn default() -> Self {
        Self {
            non_critical_intents: DEFAULT_NON_CRITICAL_INTENTS
                .iter()
                .map(|s| (*s).to_owned())
                .collect(),
        }
    }
}

impl Default for HttpConfig {
    fn default() -> Self {
        Self {
            user_agent: format!("taskweave/{}", env!("CARGO_PKG_VERSION")),
            request_timeout_secs: 15,
            retryable_statuses: vec![408, 429],
        }
    }
}

impl Default for SearchConfig {
    fn default() -> Self {
        Self {
            endpoint: "https://api.search.brave.com/res/v1/web/search".into(),
            api_key_env: "BRAVE_API_KEY".into(),
            max_results: 5,
        }
    }
}

impl TaskweaveConfig {
    /// Load configuration from `path`.
    ///
    /// A missing file yields the defaults and is left to the caller to
    /// report.  Files ending in `.json` are parsed as JSON, everything else
    /// as TOML.
    pub fn load(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Ok(Self::default());
        }

        let content = std::fs::read_to_string(path).map_err(|e| AgentError::Config {
            reason: format!("failed to read {}: {e}", path.display()),
        })?;

        let config = if path.extension().and_then(|s| s.to_str()) == Some("json") {
            serde_json::from_str(&content).map_err(|e| AgentError::Config {
                reason: format!("failed to parse JSON config: {e}"),
            })?
        } else {
            Self::from_toml_str(&content)?
        };

        info!(path = %path.display(), "configuration loaded");
        Ok(config)
    }

    pub fn from_toml_str(content: &str) -> Result<Self> {
        toml::from_str(content).map_err(|e| AgentError::Config {
            reason: format!("failed to parse TOML config: {e}"),
        })
    }

    /// Apply `TASKWEAVE_*` overrides from the process environment.
    pub fn apply_env_overrides(&mut self) -> Result<()> {
        self.apply_overrides(|key| std::env::var(key).ok())
    }

    /// Apply overrides from an arbitrary lookup.  `lookup` receives the full
    /// variable name, e.g. `TASKWEAVE_MAX_ATTEMPTS`.
    pub fn apply_overrides<F>(&mut self, lookup: F) -> Result<()>
    where
        F: Fn(&str) -> Option<String>,
    {
        let var = |name: &str| lookup(&format!("{ENV_PREFIX}{name}"));

        if let Some(level) = var("LOG_LEVEL") {
            self.log_level = level;
        }
        if let Some(raw) = var("MAX_ATTEMPTS") {
            self.retry.max_attempts = parse_number("MAX_ATTEMPTS", &raw)?;
        }
        if let Some(raw) = var("BASE_DELAY_MS") {
            self.retry.base_delay_ms = parse_number("BASE_DELAY_MS", &raw)?;
        }
        if let Some(raw) = var("NON_CRITICAL_INTENTS") {
            self.orchestrator.non_critical_intents = raw
                .split(',')
                .map(str::trim)
                .filter(|s| !s.is_empty())
                .map(str::to_owned)
                .collect();
        }
        Ok(())
    }

    /// Reject settings the engine cannot run with.
    pub fn validate(&self) -> Result<()> {
        if self.retry.max_attempts == 0 {
            return Err(AgentError::Config {
                reason: "retry.max_attempts must be at least 1".into(),
            });
        }
        if self.retry.attempt_timeout_ms == Some(0) {
            return Err(AgentError::Config {
                reason: "retry.attempt_timeout_ms must be positive when set".into(),
            });
        }
        if self.http.request_timeout_secs == 0 {
            return Err(AgentError::Config {
                reason: "http.request_timeout_secs must be positive".into(),
            });
        }
        Ok(())
    }

    /// Retry policy with the default classifier.
    pub fn retry_policy(&self) -> RetryPolicy {
        let policy = RetryPolicy::new(
            self.retry.max_attempts,
            Duration::from_millis(self.retry.base_delay_ms),
        );
        match self.retry.attempt_timeout_ms {
            Some(ms) => policy.with_attempt_timeout(Duration::from_millis(ms)),
            None => policy,
        }
    }

    pub fn criticality(&self) -> CriticalityPolicy {
        CriticalityPolicy::new(self.orchestrator.non_critical_intents.iter().cloned())
    }
}

fn parse_number<T: std::str::FromStr>(name: &str, raw: &str) -> Result<T> {
    raw.trim().parse().map_err(|_| AgentError::Config {
        reason: format!("{ENV_PREFIX}{name} must be a non-negative integer, got {raw:?}"),
    })
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;
    use std::io::Write;

    fn env(pairs: &[(&str, &str)]) -> HashMap<String, String> {
        pairs
            .iter()
            .map(|(k, v)| ((*k).to_owned(), (*v).to_owned()))
            .collect()
    }

    #[test]
    fn defaults() {
        let config = TaskweaveConfig::default();
        assert_eq!(config.retry.max_attempts, 3);
        assert_eq!(config.retry.base_delay_ms, 1000);
        assert_eq!(config.orchestrator.non_critical_intents, vec!["SearchWeb"]);
        assert_eq!(config.http.retryable_statuses, vec![408, 429]);
        assert_eq!(config.search.api_key_env, "BRAVE_API_KEY");
        config.validate().unwrap();
    }

    #[test]
    fn missing_file_uses_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let config = TaskweaveConfig::load(&dir.path().join("absent.toml")).unwrap();
        assert_eq!(config, TaskweaveConfig::default());
    }

    #[test]
    fn partial_toml_keeps_other_defaults() {
        let mut file = tempfile::Builder::new().suffix(".toml").tempfile().unwrap();
        writeln!(
            file,
            "log_level = \"debug\"\n\n[retry]\nmax_attempts = 5\n\n[orchestrator]\nnon_critical_intents = []"
        )
        .unwrap();

        let config = TaskweaveConfig::load(file.path()).unwrap();
        assert_eq!(config.log_level, "debug");
        assert_eq!(config.retry.max_attempts, 5);
        assert_eq!(config.retry.base_delay_ms, 1000);
        assert!(config.orchestrator.non_critical_intents.is_empty());
        assert!(config.criticality().is_critical("SearchWeb"));
    }

    #[test]
    fn json_chosen_by_extension() {
        let mut file = tempfile::Builder::new().suffix(".json").tempfile().unwrap();
        write!(file, r#"{{"retry": {{"base_delay_ms": 10}}}}"#).unwrap();

        let config = TaskweaveConfig::load(file.path()).unwrap();
        assert_eq!(config.retry.base_delay_ms, 10);
        assert_eq!(config.retry_policy().delay_for(2), Duration::from_millis(20));
    }

    #[test]
    fn malformed_toml_is_config_error() {
        let err = TaskweaveConfig::from_toml_str("retry = [").unwrap_err();
        assert!(matches!(err, AgentError::Config { .. }));
    }

    #[test]
    fn env_overrides_apply() {
        let vars = env(&[
            ("TASKWEAVE_LOG_LEVEL", "warn"),
            ("TASKWEAVE_MAX_ATTEMPTS", "4"),
            ("TASKWEAVE_BASE_DELAY_MS", "250"),
            ("TASKWEAVE_NON_CRITICAL_INTENTS", "SearchWeb, SendWebhook,"),
        ]);
        let mut config = TaskweaveConfig::default();
        config.apply_overrides(|k| vars.get(k).cloned()).unwrap();

        assert_eq!(config.log_level, "warn");
        assert_eq!(config.retry_policy().max_attempts(), 4);
        assert_eq!(config.retry_policy().base_delay(), Duration::from_millis(250));
        assert_eq!(
            config.criticality().non_critical_intents(),
            vec!["SearchWeb", "SendWebhook"]
        );
    }

    #[test]
    fn invalid_numeric_override_is_rejected() {
        let vars = env(&[("TASKWEAVE_MAX_ATTEMPTS", "three")]);
        let mut config = TaskweaveConfig::default();
        let err = config.apply_overrides(|k| vars.get(k).cloned()).unwrap_err();
        assert!(err.to_string().contains("TASKWEAVE_MAX_ATTEMPTS"));
    }

    #[test]
    fn zero_attempts_fails_validation() {
        let mut config = TaskweaveConfig::default();
        config.retry.max_attempts = 0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn attempt_timeout_flows_into_policy() {
        let mut config = TaskweaveConfig::default();
        assert_eq!(
            config.retry_policy().attempt_timeout(),
            Some(Duration::from_secs(15))
        );
        config.retry.attempt_timeout_ms = None;
        assert_eq!(config.retry_policy().attempt_timeout(), None);
    }
}
