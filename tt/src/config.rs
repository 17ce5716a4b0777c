//! TodoTracker configuration types and loading
//!
//! The file is optional; every field has a default. Credentials never live in
//! the file: it names the environment variables that hold them, and
//! [`Config::resolve`] reads those exactly once.

use eyre::{Context, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;
use thiserror::Error;

use crate::planning::DEFAULT_MAX_TASKS_PER_PHASE;

/// Environment variable that overrides the configured model
pub const DEFAULT_MODEL_ENV: &str = "DEFAULT_MODEL";

/// Errors raised before any external call is made
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("{var} is not set; export it or add it to .env ({purpose})")]
    MissingCredential { var: String, purpose: &'static str },

    #[error("invalid configuration: {field} {reason}")]
    Invalid { field: &'static str, reason: String },

    #[error("project description is empty")]
    EmptyDescription,

    #[error("failed to read description file {path}: {source}")]
    DescriptionFile {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

/// Main TodoTracker configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// AI completion service
    pub llm: LlmConfig,

    /// Issue tracker
    pub github: GitHubConfig,

    /// Plan size limits
    pub limits: LimitsConfig,

    /// Retry policy for both external services
    pub retry: RetryConfig,

    /// Log level used when no CLI flag is given
    #[serde(rename = "log-level")]
    pub log_level: Option<String>,
}

impl Config {
    /// Load configuration with fallback chain
    pub fn load(config_path: Option<&PathBuf>) -> Result<Self> {
        // If explicit config path provided, try to load it
        if let Some(path) = config_path {
            return Self::load_from_file(path).context(format!("Failed to load config from {}", path.display()));
        }

        // Try project-local config: .todotracker.yml
        let local_config = PathBuf::from(".todotracker.yml");
        if local_config.exists() {
            match Self::load_from_file(&local_config) {
                Ok(config) => return Ok(config),
                Err(e) => {
                    tracing::warn!("Failed to load config from {}: {}", local_config.display(), e);
                }
            }
        }

        // Try user config: ~/.config/todotracker/todotracker.yml
        if let Some(config_dir) = dirs::config_dir() {
            let user_config = config_dir.join("todotracker").join("todotracker.yml");
            if user_config.exists() {
                match Self::load_from_file(&user_config) {
                    Ok(config) => return Ok(config),
                    Err(e) => {
                        tracing::warn!("Failed to load config from {}: {}", user_config.display(), e);
                    }
                }
            }
        }

        tracing::info!("No config file found, using defaults");
        Ok(Self::default())
    }

    fn load_from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = fs::read_to_string(&path).context("Failed to read config file")?;

        let config: Self = serde_yaml::from_str(&content).context("Failed to parse config file")?;

        tracing::info!("Loaded config from: {}", path.as_ref().display());
        Ok(config)
    }

    /// Reject values that would make a run meaningless
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.limits.max_tasks == 0 {
            return Err(invalid("limits.max-tasks", "must be at least 1"));
        }
        if self.limits.max_tasks_per_phase == 0 {
            return Err(invalid("limits.max-tasks-per-phase", "must be at least 1"));
        }
        if !(0.0..=2.0).contains(&self.llm.temperature) {
            return Err(invalid(
                "llm.temperature",
                format!("must be between 0 and 2, got {}", self.llm.temperature),
            ));
        }
        if self.retry.max_attempts == 0 {
            return Err(invalid("retry.max-attempts", "must be at least 1"));
        }
        if self.llm.model.trim().is_empty() {
            return Err(invalid("llm.model", "must not be empty"));
        }
        Ok(())
    }

    /// Apply overrides, read credentials and produce the value a run is built from
    ///
    /// `lookup` stands in for the process environment.
    pub fn resolve<F>(&self, overrides: &Overrides, lookup: F) -> Result<ResolvedConfig, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        tracing::debug!(?overrides, "resolve: called");
        let mut config = self.clone();

        if let Some(model) = overrides.model.clone().or_else(|| non_empty(lookup(DEFAULT_MODEL_ENV))) {
            config.llm.model = model;
        }
        if let Some(max_tasks) = overrides.max_tasks {
            config.limits.max_tasks = max_tasks;
        }
        if let Some(per_phase) = overrides.max_tasks_per_phase {
            config.limits.max_tasks_per_phase = per_phase;
        }
        config.validate()?;

        let api_key = credential(&lookup, &config.llm.api_key_env, "OpenRouter API key")?;
        let token = credential(&lookup, &config.github.token_env, "GitHub token")?;

        Ok(ResolvedConfig {
            llm: ResolvedLlmConfig {
                model: config.llm.model,
                api_key,
                base_url: config.llm.base_url.trim_end_matches('/').to_string(),
                temperature: config.llm.temperature,
                max_tokens: config.llm.max_tokens,
                timeout: Duration::from_millis(config.llm.timeout_ms),
            },
            github: ResolvedGitHubConfig {
                token,
                base_url: config.github.base_url.trim_end_matches('/').to_string(),
                timeout: Duration::from_millis(config.github.timeout_ms),
            },
            limits: config.limits,
            retry: config.retry,
        })
    }
}

fn invalid(field: &'static str, reason: impl Into<String>) -> ConfigError {
    ConfigError::Invalid {
        field,
        reason: reason.into(),
    }
}

fn non_empty(value: Option<String>) -> Option<String> {
    value.map(|v| v.trim().to_string()).filter(|v| !v.is_empty())
}

fn credential<F>(lookup: &F, var: &str, purpose: &'static str) -> Result<String, ConfigError>
where
    F: Fn(&str) -> Option<String>,
{
    non_empty(lookup(var)).ok_or_else(|| ConfigError::MissingCredential {
        var: var.to_string(),
        purpose,
    })
}

/// Values given on the command line that beat the file and environment
#[derive(Debug, Clone, Default)]
pub struct Overrides {
    pub model: Option<String>,
    pub max_tasks: Option<u32>,
    pub max_tasks_per_phase: Option<usize>,
}

/// AI completion service configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LlmConfig {
    /// Model identifier
    pub model: String,

    /// Environment variable containing the API key
    #[serde(rename = "api-key-env")]
    pub api_key_env: String,

    /// API base URL
    #[serde(rename = "base-url")]
    pub base_url: String,

    pub temperature: f32,

    /// Maximum tokens per response
    #[serde(rename = "max-tokens")]
    pub max_tokens: u32,

    /// Request timeout in milliseconds
    #[serde(rename = "timeout-ms")]
    pub timeout_ms: u64,
}

impl Default for LlmConfig {
    fn default() -> Self {
        Self {
            model: "deepseek/deepseek-r1-distill-llama-70b".to_string(),
            api_key_env: "OPENROUTER_API_KEY".to_string(),
            base_url: "https://openrouter.ai/api".to_string(),
            temperature: 0.3,
            max_tokens: 8000,
            timeout_ms: 60_000,
        }
    }
}

/// Issue tracker configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct GitHubConfig {
    /// Environment variable containing the token
    #[serde(rename = "token-env")]
    pub token_env: String,

    #[serde(rename = "base-url")]
    pub base_url: String,

    #[serde(rename = "timeout-ms")]
    pub timeout_ms: u64,
}

impl Default for GitHubConfig {
    fn default() -> Self {
        Self {
            token_env: "GITHUB_TOKEN".to_string(),
            base_url: "https://api.github.com".to_string(),
            timeout_ms: 30_000,
        }
    }
}

/// Plan size limits
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct LimitsConfig {
    /// Task count requested from the AI
    #[serde(rename = "max-tasks")]
    pub max_tasks: u32,

    /// Tasks kept per phase after normalization
    #[serde(rename = "max-tasks-per-phase")]
    pub max_tasks_per_phase: usize,
}

impl Default for LimitsConfig {
    fn default() -> Self {
        Self {
            max_tasks: 20,
            max_tasks_per_phase: DEFAULT_MAX_TASKS_PER_PHASE,
        }
    }
}

/// Retry policy configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RetryConfig {
    /// Attempts per call, including the first
    #[serde(rename = "max-attempts")]
    pub max_attempts: u32,

    #[serde(rename = "initial-backoff-ms")]
    pub initial_backoff_ms: u64,

    #[serde(rename = "max-backoff-ms")]
    pub max_backoff_ms: u64,
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            initial_backoff_ms: 1000,
            max_backoff_ms: 30_000,
        }
    }
}

/// Configuration with overrides applied and credentials read
#[derive(Clone)]
pub struct ResolvedConfig {
    pub llm: ResolvedLlmConfig,
    pub github: ResolvedGitHubConfig,
    pub limits: LimitsConfig,
    pub retry: RetryConfig,
}

#[derive(Clone)]
pub struct ResolvedLlmConfig {
    pub model: String,
    pub api_key: String,
    pub base_url: String,
    pub temperature: f32,
    pub max_tokens: u32,
    pub timeout: Duration,
}

#[derive(Clone)]
pub struct ResolvedGitHubConfig {
    pub token: String,
    pub base_url: String,
    pub timeout: Duration,
}

// Credentials stay out of Debug output and therefore out of the logs
impl std::fmt::Debug for ResolvedConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ResolvedConfig")
            .field("llm", &self.llm)
            .field("github", &self.github)
            .field("limits", &self.limits)
            .field("retry", &self.retry)
            .finish()
    }
}

impl std::fmt::Debug for ResolvedLlmConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ResolvedLlmConfig")
            .field("model", &self.model)
            .field("api_key", &"<redacted>")
            .field("base_url", &self.base_url)
            .field("temperature", &self.temperature)
            .field("max_tokens", &self.max_tokens)
            .field("timeout", &self.timeout)
            .finish()
    }
}

impl std::fmt::Debug for ResolvedGitHubConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ResolvedGitHubConfig")
            .field("token", &"<redacted>")
            .field("base_url", &self.base_url)
            .field("timeout", &self.timeout)
            .finish()
    }
}


#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn env(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs.iter().map(|(k, v)| (k.to_string(), v.to_string())).collect();
        move |key| map.get(key).cloned()
    }

    fn full_env() -> impl Fn(&str) -> Option<String> {
        env(&[("OPENROUTER_API_KEY", "or-key"), ("GITHUB_TOKEN", "gh-token")])
    }

    #[test]
    fn test_default_config() {
        let config = Config::default();

        assert_eq!(config.llm.model, "deepseek/deepseek-r1-distill-llama-70b");
        assert_eq!(config.llm.api_key_env, "OPENROUTER_API_KEY");
        assert_eq!(config.github.token_env, "GITHUB_TOKEN");
        assert_eq!(config.limits.max_tasks, 20);
        assert_eq!(config.limits.max_tasks_per_phase, 10);
        assert_eq!(config.retry.max_attempts, 3);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_deserialize_config() {
        let yaml = r#"
llm:
  model: anthropic/claude-3.5-sonnet
  api-key-env: MY_KEY
  base-url: https://llm.example.com
  temperature: 0.7
  max-tokens: 4000
  timeout-ms: 90000

github:
  token-env: GH_PAT
  base-url: https://ghe.example.com/api/v3

limits:
  max-tasks: 30
  max-tasks-per-phase: 6

retry:
  max-attempts: 5

log-level: debug
"#;

        let config: Config = serde_yaml::from_str(yaml).unwrap();

        assert_eq!(config.llm.model, "anthropic/claude-3.5-sonnet");
        assert_eq!(config.llm.api_key_env, "MY_KEY");
        assert_eq!(config.llm.max_tokens, 4000);
        assert_eq!(config.github.token_env, "GH_PAT");
        assert_eq!(config.github.timeout_ms, 30_000);
        assert_eq!(config.limits.max_tasks_per_phase, 6);
        assert_eq!(config.retry.max_attempts, 5);
        assert_eq!(config.retry.initial_backoff_ms, 1000);
        assert_eq!(config.log_level.as_deref(), Some("debug"));
    }

    #[test]
    fn test_partial_config_uses_defaults() {
        let yaml = r#"
limits:
  max-tasks: 8
"#;

        let config: Config = serde_yaml::from_str(yaml).unwrap();

        assert_eq!(config.limits.max_tasks, 8);
        assert_eq!(config.limits.max_tasks_per_phase, 10);
        assert_eq!(config.llm.base_url, "https://openrouter.ai/api");
    }

    #[test]
    fn test_load_explicit_path() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("tt.yml");
        fs::write(&path, "llm:\n  model: custom/model\n").unwrap();

        let config = Config::load(Some(&path)).unwrap();
        assert_eq!(config.llm.model, "custom/model");
    }

    #[test]
    fn test_load_missing_explicit_path_fails() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("absent.yml");
        assert!(Config::load(Some(&path)).is_err());
    }

    #[test]
    fn test_validate_rejects_bad_values() {
        let mut config = Config::default();
        config.limits.max_tasks_per_phase = 0;
        assert!(matches!(
            config.validate(),
            Err(ConfigError::Invalid {
                field: "limits.max-tasks-per-phase",
                ..
            })
        ));

        let mut config = Config::default();
        config.llm.temperature = 2.5;
        assert!(config.validate().is_err());

        let mut config = Config::default();
        config.retry.max_attempts = 0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_resolve_reads_credentials() {
        let resolved = Config::default().resolve(&Overrides::default(), full_env()).unwrap();

        assert_eq!(resolved.llm.api_key, "or-key");
        assert_eq!(resolved.github.token, "gh-token");
        assert_eq!(resolved.llm.timeout, Duration::from_secs(60));
        assert_eq!(resolved.github.timeout, Duration::from_secs(30));
    }

    #[test]
    fn test_resolve_missing_credential() {
        let err = Config::default()
            .resolve(&Overrides::default(), env(&[("GITHUB_TOKEN", "gh")]))
            .unwrap_err();
        assert!(matches!(err, ConfigError::MissingCredential { ref var, .. } if var == "OPENROUTER_API_KEY"));

        let err = Config::default()
            .resolve(&Overrides::default(), env(&[("OPENROUTER_API_KEY", "k"), ("GITHUB_TOKEN", "  ")]))
            .unwrap_err();
        assert!(matches!(err, ConfigError::MissingCredential { ref var, .. } if var == "GITHUB_TOKEN"));
    }

    #[test]
    fn test_model_precedence() {
        let config = Config::default();
        let lookup = env(&[
            ("OPENROUTER_API_KEY", "k"),
            ("GITHUB_TOKEN", "t"),
            ("DEFAULT_MODEL", "env/model"),
        ]);

        let resolved = config.resolve(&Overrides::default(), &lookup).unwrap();
        assert_eq!(resolved.llm.model, "env/model");

        let overrides = Overrides {
            model: Some("cli/model".to_string()),
            ..Default::default()
        };
        let resolved = config.resolve(&overrides, &lookup).unwrap();
        assert_eq!(resolved.llm.model, "cli/model");

        let resolved = config.resolve(&Overrides::default(), full_env()).unwrap();
        assert_eq!(resolved.llm.model, "deepseek/deepseek-r1-distill-llama-70b");
    }

    #[test]
    fn test_overrides_validated() {
        let overrides = Overrides {
            max_tasks: Some(0),
            ..Default::default()
        };
        let err = Config::default().resolve(&overrides, full_env()).unwrap_err();
        assert!(matches!(err, ConfigError::Invalid { field: "limits.max-tasks", .. }));
    }

    #[test]
    fn test_debug_redacts_secrets() {
        let resolved = Config::default().resolve(&Overrides::default(), full_env()).unwrap();
        let rendered = format!("{resolved:?}");
        assert!(!rendered.contains("or-key"));
        assert!(!rendered.contains("gh-token"));
        assert!(rendered.contains("<redacted>"));
    }
}
