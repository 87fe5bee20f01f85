//! Configuration management for React Agent.
//!
//! Configuration can be set via environment variables:
//! - `OPENROUTER_API_KEY` - Required. API key for the model endpoint.
//! - `DEFAULT_MODEL` - Optional. The LLM model to use. Defaults to `anthropic/claude-sonnet-4.5`.
//! - `LLM_BASE_URL` - Optional. OpenAI-compatible base URL. Defaults to OpenRouter.
//! - `WORKSPACE_PATH` - Optional. Working directory for tools. Defaults to current directory.
//! - `HOST` - Optional. Server host. Defaults to `127.0.0.1`.
//! - `PORT` - Optional. Server port. Defaults to `3000`.
//! - `MAX_ITERATIONS` - Optional. Generation calls allowed per run. Defaults to `15`.
//! - `RUN_TIMEOUT_SECS` - Optional. Wall-clock limit for API runs. Defaults to `300`.
//! - `LLM_TIMEOUT_SECS` - Optional. Limit for a single generation request. Defaults to `300`.
//! - `ENABLE_SHELL_TOOL` - Optional. Register the `run_command` tool. Defaults to `false`.

use std::path::PathBuf;
use std::time::Duration;

use thiserror::Error;

use crate::llm::DEFAULT_BASE_URL;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("Missing required environment variable: {0}")]
    MissingEnvVar(String),

    #[error("Invalid value for {0}: {1}")]
    InvalidValue(String, String),
}

/// Agent configuration.
#[derive(Debug, Clone)]
pub struct Config {
    /// API key for the model endpoint
    pub api_key: String,

    /// LLM model identifier (OpenRouter format)
    pub default_model: String,

    /// OpenAI-compatible API base URL
    pub base_url: String,

    /// Sequences that end a model reply
    pub stop_sequences: Vec<String>,

    /// Workspace directory handed to tools
    pub workspace_path: PathBuf,

    /// Server host
    pub host: String,

    /// Server port
    pub port: u16,

    /// Maximum generation calls per run
    pub max_iterations: usize,

    /// Wall-clock limit for a run started through the API
    pub run_timeout: Duration,

    /// Limit for one chat completions request
    pub llm_timeout: Duration,

    /// Whether the shell tool is registered
    pub enable_shell_tool: bool,
}

impl Config {
    /// Load configuration from environment variables.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::MissingEnvVar` if `OPENROUTER_API_KEY` is not set.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Load configuration from an arbitrary key lookup.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let api_key = lookup("OPENROUTER_API_KEY")
            .filter(|v| !v.trim().is_empty())
            .ok_or_else(|| ConfigError::MissingEnvVar("OPENROUTER_API_KEY".to_string()))?;

        let default_model = lookup("DEFAULT_MODEL")
            .unwrap_or_else(|| "anthropic/claude-sonnet-4.5".to_string());

        let base_url = lookup("LLM_BASE_URL").unwrap_or_else(|| DEFAULT_BASE_URL.to_string());

        let workspace_path = lookup("WORKSPACE_PATH")
            .map(PathBuf::from)
            .unwrap_or_else(|| std::env::current_dir().unwrap_or_else(|_| PathBuf::from(".")));

        let host = lookup("HOST").unwrap_or_else(|| "127.0.0.1".to_string());

        let port = parse_var(&lookup, "PORT", 3000u16)?;

        let max_iterations = parse_var(&lookup, "MAX_ITERATIONS", 15usize)?;
        if max_iterations == 0 {
            return Err(ConfigError::InvalidValue(
                "MAX_ITERATIONS".to_string(),
                "must be at least 1".to_string(),
            ));
        }

        let run_timeout = Duration::from_secs(parse_var(&lookup, "RUN_TIMEOUT_SECS", 300u64)?);

        let llm_timeout_secs = parse_var(&lookup, "LLM_TIMEOUT_SECS", 300u64)?;
        if llm_timeout_secs == 0 {
            return Err(ConfigError::InvalidValue(
                "LLM_TIMEOUT_SECS".to_string(),
                "must be at least 1".to_string(),
            ));
        }
        let llm_timeout = Duration::from_secs(llm_timeout_secs);

        let enable_shell_tool = lookup("ENABLE_SHELL_TOOL")
            .map(|v| {
                parse_bool(&v).map_err(|e| ConfigError::InvalidValue("ENABLE_SHELL_TOOL".to_string(), e))
            })
            .transpose()?
            .unwrap_or(false);

        Ok(Self {
            api_key,
            default_model,
            base_url,
            stop_sequences: default_stop_sequences(),
            workspace_path,
            host,
            port,
            max_iterations,
            run_timeout,
            llm_timeout,
            enable_shell_tool,
        })
    }

    /// Create a config with custom values (useful for testing).
    pub fn new(api_key: String, default_model: String, workspace_path: PathBuf) -> Self {
        Self {
            api_key,
            default_model,
            base_url: DEFAULT_BASE_URL.to_string(),
            stop_sequences: default_stop_sequences(),
            workspace_path,
            host: "127.0.0.1".to_string(),
            port: 3000,
            max_iterations: 15,
            run_timeout: Duration::from_secs(300),
            llm_timeout: Duration::from_secs(300),
            enable_shell_tool: false,
        }
    }
}

/// Stop before the model writes its own observation.
fn default_stop_sequences() -> Vec<String> {
    vec!["\nObservation:".to_string()]
}

fn parse_var<F, T>(lookup: &F, key: &str, default: T) -> Result<T, ConfigError>
where
    F: Fn(&str) -> Option<String>,
    T: std::str::FromStr,
    T::Err: std::fmt::Display,
{
    match lookup(key) {
        Some(raw) => raw
            .trim()
            .parse()
            .map_err(|e: T::Err| ConfigError::InvalidValue(key.to_string(), e.to_string())),
        None => Ok(default),
    }
}

fn parse_bool(value: &str) -> Result<bool, String> {
    match value.trim().to_lowercase().as_str() {
        "1" | "true" | "t" | "yes" | "y" | "on" => Ok(true),
        "0" | "false" | "f" | "no" | "n" | "off" => Ok(false),
        other => Err(format!("expected boolean-like value, got: {}", other)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup_from(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key: &str| map.get(key).cloned()
    }

    #[test]
    fn api_key_is_required() {
        let err = Config::from_lookup(lookup_from(&[])).unwrap_err();
        assert_eq!(err, ConfigError::MissingEnvVar("OPENROUTER_API_KEY".to_string()));
    }

    #[test]
    fn defaults_apply() {
        let config = Config::from_lookup(lookup_from(&[("OPENROUTER_API_KEY", "sk-test")])).unwrap();
        assert_eq!(config.port, 3000);
        assert_eq!(config.max_iterations, 15);
        assert_eq!(config.run_timeout, Duration::from_secs(300));
        assert_eq!(config.llm_timeout, Duration::from_secs(300));
        assert!(!config.enable_shell_tool);
        assert_eq!(config.stop_sequences, vec!["\nObservation:".to_string()]);
    }

    #[test]
    fn overrides_are_parsed() {
        let config = Config::from_lookup(lookup_from(&[
            ("OPENROUTER_API_KEY", "sk-test"),
            ("MAX_ITERATIONS", " 4 "),
            ("PORT", "8080"),
            ("ENABLE_SHELL_TOOL", "yes"),
            ("WORKSPACE_PATH", "/tmp/ws"),
            ("LLM_TIMEOUT_SECS", "45"),
        ]))
        .unwrap();
        assert_eq!(config.max_iterations, 4);
        assert_eq!(config.llm_timeout, Duration::from_secs(45));
        assert_eq!(config.port, 8080);
        assert!(config.enable_shell_tool);
        assert_eq!(config.workspace_path, PathBuf::from("/tmp/ws"));
    }

    #[test]
    fn invalid_values_are_reported() {
        let err = Config::from_lookup(lookup_from(&[
            ("OPENROUTER_API_KEY", "sk-test"),
            ("MAX_ITERATIONS", "0"),
        ]))
        .unwrap_err();
        assert!(matches!(err, ConfigError::InvalidValue(ref k, _) if k == "MAX_ITERATIONS"));

        let err = Config::from_lookup(lookup_from(&[
            ("OPENROUTER_API_KEY", "sk-test"),
            ("ENABLE_SHELL_TOOL", "maybe"),
        ]))
        .unwrap_err();
        assert!(matches!(err, ConfigError::InvalidValue(ref k, _) if k == "ENABLE_SHELL_TOOL"));

        let err = Config::from_lookup(lookup_from(&[
            ("OPENROUTER_API_KEY", "sk-test"),
            ("LLM_TIMEOUT_SECS", "0"),
        ]))
        .unwrap_err();
        assert!(matches!(err, ConfigError::InvalidValue(ref k, _) if k == "LLM_TIMEOUT_SECS"));
    }
}
