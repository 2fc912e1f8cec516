//! Application configuration for docquery.
//!
//! User config lives at `~/.docquery/docquery.toml`.
//! CLI flags override config file values, which override defaults.
//! API keys are never stored in the file — only the env var names that
//! hold them, validated before any network activity.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::{DocQueryError, Result};

/// Default configuration file name.
const CONFIG_FILE_NAME: &str = "docquery.toml";

/// Default config directory name under the user's home.
const CONFIG_DIR_NAME: &str = ".docquery";

// ---------------------------------------------------------------------------
// Config structs (matching docquery.toml schema)
// ---------------------------------------------------------------------------

/// Top-level application config, deserialized from TOML.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AppConfig {
    /// Reasoning capability (chat completions) settings.
    #[serde(default)]
    pub reasoning: ReasoningConfig,

    /// Search provider settings.
    #[serde(default)]
    pub search: SearchConfig,

    /// Retrieval fan-out settings.
    #[serde(default)]
    pub retrieval: RetrievalConfig,

    /// Agent loop settings.
    #[serde(default)]
    pub agent: AgentConfig,
}

/// `[reasoning]` section.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReasoningConfig {
    /// OpenAI-compatible API base URL.
    #[serde(default = "default_reasoning_base_url")]
    pub base_url: String,

    /// Name of the env var holding the API key (never the key itself).
    #[serde(default = "default_reasoning_key_env")]
    pub api_key_env: String,

    /// Model identifier.
    #[serde(default = "default_model")]
    pub model: String,

    /// Sampling temperature.
    #[serde(default)]
    pub temperature: f32,
}

impl Default for ReasoningConfig {
    fn default() -> Self {
        Self {
            base_url: default_reasoning_base_url(),
            api_key_env: default_reasoning_key_env(),
            model: default_model(),
            temperature: 0.0,
        }
    }
}

fn default_reasoning_base_url() -> String {
    "https://api.openai.com/v1".into()
}
fn default_reasoning_key_env() -> String {
    "OPENAI_API_KEY".into()
}
fn default_model() -> String {
    "gpt-4o-mini".into()
}

/// `[search]` section.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SearchConfig {
    /// Search provider JSON endpoint.
    #[serde(default = "default_search_endpoint")]
    pub endpoint: String,

    /// Name of the env var holding the provider API key.
    #[serde(default = "default_search_key_env")]
    pub api_key_env: String,

    /// Content domain to restrict results to (via a `site:` qualifier).
    #[serde(default = "default_site")]
    pub site: String,

    /// Maximum number of results to request.
    #[serde(default = "default_max_results")]
    pub max_results: u32,

    /// URLs containing this marker are filtered out (API-reference pages).
    #[serde(default = "default_exclude_marker")]
    pub exclude_marker: String,

    /// Maximum retry attempts for transient provider failures.
    #[serde(default = "default_retry_max_attempts")]
    pub retry_max_attempts: u32,

    /// Base delay in seconds for exponential backoff between attempts.
    #[serde(default = "default_retry_base_delay")]
    pub retry_base_delay_secs: u64,
}

impl Default for SearchConfig {
    fn default() -> Self {
        Self {
            endpoint: default_search_endpoint(),
            api_key_env: default_search_key_env(),
            site: default_site(),
            max_results: default_max_results(),
            exclude_marker: default_exclude_marker(),
            retry_max_attempts: default_retry_max_attempts(),
            retry_base_delay_secs: default_retry_base_delay(),
        }
    }
}

fn default_search_endpoint() -> String {
    "https://api.search.brave.com/res/v1/web/search".into()
}
fn default_search_key_env() -> String {
    "SEARCH_API_KEY".into()
}
fn default_site() -> String {
    "python.langchain.com".into()
}
fn default_max_results() -> u32 {
    10
}
fn default_exclude_marker() -> String {
    "api".into()
}
fn default_retry_max_attempts() -> u32 {
    5
}
fn default_retry_base_delay() -> u64 {
    5
}

/// `[retrieval]` section.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RetrievalConfig {
    /// Maximum concurrent page fetches in one batch.
    #[serde(default = "default_concurrency")]
    pub concurrency: u32,

    /// Per-request timeout in seconds.
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
}

impl Default for RetrievalConfig {
    fn default() -> Self {
        Self {
            concurrency: default_concurrency(),
            timeout_secs: default_timeout_secs(),
        }
    }
}

fn default_concurrency() -> u32 {
    20
}
fn default_timeout_secs() -> u64 {
    10
}

/// `[agent]` section.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AgentConfig {
    /// Ceiling on reasoning steps before the loop is forced to end.
    #[serde(default = "default_max_iterations")]
    pub max_iterations: u32,
}

impl Default for AgentConfig {
    fn default() -> Self {
        Self {
            max_iterations: default_max_iterations(),
        }
    }
}

fn default_max_iterations() -> u32 {
    10
}

// ---------------------------------------------------------------------------
// Config loading
// ---------------------------------------------------------------------------

/// Get the path to the config directory (`~/.docquery/`).
pub fn config_dir() -> Result<PathBuf> {
    let home = dirs::home_dir()
        .ok_or_else(|| DocQueryError::config("could not determine home directory"))?;
    Ok(home.join(CONFIG_DIR_NAME))
}

/// Get the path to the config file (`~/.docquery/docquery.toml`).
pub fn config_file_path() -> Result<PathBuf> {
    Ok(config_dir()?.join(CONFIG_FILE_NAME))
}

/// Load the application config from disk. Returns defaults if the file does not exist.
pub fn load_config() -> Result<AppConfig> {
    let path = config_file_path()?;

    if !path.exists() {
        tracing::debug!(?path, "config file not found, using defaults");
        return Ok(AppConfig::default());
    }

    load_config_from(&path)
}

/// Load the application config from a specific file path.
pub fn load_config_from(path: &Path) -> Result<AppConfig> {
    let content = std::fs::read_to_string(path).map_err(|e| DocQueryError::io(path, e))?;

    toml::from_str(&content)
        .map_err(|e| DocQueryError::config(format!("failed to parse {}: {e}", path.display())))
}

/// Create the config directory and write a default config file.
/// Returns the path to the created file.
pub fn init_config() -> Result<PathBuf> {
    let dir = config_dir()?;
    std::fs::create_dir_all(&dir).map_err(|e| DocQueryError::io(&dir, e))?;

    let path = dir.join(CONFIG_FILE_NAME);
    let config = AppConfig::default();
    let content =
        toml::to_string_pretty(&config).map_err(|e| DocQueryError::config(e.to_string()))?;

    std::fs::write(&path, content).map_err(|e| DocQueryError::io(&path, e))?;
    tracing::info!(?path, "created default config file");

    Ok(path)
}

/// Read an API key from the env var a config section names.
///
/// Fails fast with a `Config` error before any network activity.
pub fn resolve_api_key(var_name: &str) -> Result<String> {
    match std::env::var(var_name) {
        Ok(val) if !val.is_empty() => Ok(val),
        _ => Err(DocQueryError::config(format!(
            "API key not found. Set the {var_name} environment variable."
        ))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_serializes() {
        let config = AppConfig::default();
        let toml_str = toml::to_string_pretty(&config).expect("serialize default config");
        assert!(toml_str.contains("base_url"));
        assert!(toml_str.contains("OPENAI_API_KEY"));
        assert!(toml_str.contains("SEARCH_API_KEY"));
    }

    #[test]
    fn config_roundtrip() {
        let config = AppConfig::default();
        let toml_str = toml::to_string_pretty(&config).expect("serialize");
        let parsed: AppConfig = toml::from_str(&toml_str).expect("deserialize");
        assert_eq!(parsed.retrieval.concurrency, 20);
        assert_eq!(parsed.retrieval.timeout_secs, 10);
        assert_eq!(parsed.agent.max_iterations, 10);
        assert_eq!(parsed.reasoning.model, "gpt-4o-mini");
    }

    #[test]
    fn partial_file_fills_defaults() {
        let toml_str = r#"
[search]
site = "docs.rs"
max_results = 5
"#;
        let config: AppConfig = toml::from_str(toml_str).expect("parse");
        assert_eq!(config.search.site, "docs.rs");
        assert_eq!(config.search.max_results, 5);
        // Untouched sections keep defaults
        assert_eq!(config.search.exclude_marker, "api");
        assert_eq!(config.search.retry_max_attempts, 5);
        assert_eq!(config.retrieval.concurrency, 20);
    }

    #[test]
    fn api_key_validation() {
        // Use a unique env var name to avoid interfering with other tests
        let result = resolve_api_key("DQ_TEST_NONEXISTENT_KEY_98765");
        assert!(result.is_err());
        assert!(result.unwrap_err().to_string().contains("API key not found"));
    }

    #[test]
    fn temperature_defaults_to_zero() {
        let config = AppConfig::default();
        assert_eq!(config.reasoning.temperature, 0.0);
    }
}
