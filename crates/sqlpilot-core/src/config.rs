//! Configuration types for the sqlpilot service.
//!
//! Configuration is loaded from a single YAML file with per-field defaults,
//! so a minimal file only needs the values that differ from the defaults.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::{env, fs};

/// Complete service configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AppConfig {
    #[serde(default)]
    pub server: ServerConfig,

    /// Static prompt inputs: metadata file, table name, business rules.
    #[serde(default)]
    pub prompt: PromptConfig,

    #[serde(default)]
    pub llm: LlmConfig,

    /// Upstream database connection. Optional: only the `introspect`
    /// command needs it, the query endpoint never touches the database.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub database: Option<DatabaseConfig>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    /// Bind address, e.g. "0.0.0.0:8080"
    #[serde(default = "default_bind")]
    pub bind: String,
}

fn default_bind() -> String {
    "0.0.0.0:8080".to_string()
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind: default_bind(),
        }
    }
}

/// Static inputs merged into every generation prompt.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PromptConfig {
    /// Path to the metadata JSON document describing table/column semantics.
    #[serde(default = "default_metadata_file")]
    pub metadata_file: PathBuf,

    /// Path to the schema JSON document used when the caller supplies none.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub fallback_schema_file: Option<PathBuf>,

    /// Table the generated queries run against. Must be non-empty.
    #[serde(default)]
    pub table_name: String,

    /// Natural-language constraints injected into every prompt.
    #[serde(default)]
    pub business_rules: Vec<String>,
}

fn default_metadata_file() -> PathBuf {
    PathBuf::from("metadata.json")
}

impl Default for PromptConfig {
    fn default() -> Self {
        Self {
            metadata_file: default_metadata_file(),
            fallback_schema_file: None,
            table_name: String::new(),
            business_rules: Vec::new(),
        }
    }
}

/// Hosted LLM provider settings (OpenAI-compatible chat completions).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LlmConfig {
    /// Base URL of the provider API.
    #[serde(default = "default_api_base")]
    pub api_base: String,

    /// Model identifier.
    #[serde(default = "default_model")]
    pub model: String,

    /// Environment variable holding the API key. The key itself never
    /// appears in the config file.
    #[serde(default = "default_api_key_env")]
    pub api_key_env: String,

    /// Sampling temperature. Zero keeps generation deterministic.
    #[serde(default)]
    pub temperature: f32,
}

fn default_api_base() -> String {
    "https://api.groq.com/openai/v1".to_string()
}

fn default_model() -> String {
    "llama-3.3-70b-versatile".to_string()
}

fn default_api_key_env() -> String {
    "GROQ_API_KEY".to_string()
}

impl Default for LlmConfig {
    fn default() -> Self {
        Self {
            api_base: default_api_base(),
            model: default_model(),
            api_key_env: default_api_key_env(),
            temperature: 0.0,
        }
    }
}

/// Authentication mode for the upstream database connection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AuthMode {
    /// OS-integrated authentication; no credentials in the connection string.
    Trusted,
    /// Username/password authentication.
    #[default]
    Credentials,
}

/// Upstream database connection parameters.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DatabaseConfig {
    #[serde(default = "default_host")]
    pub host: String,

    /// Port; the selected driver's default when unset.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub port: Option<u16>,

    #[serde(default = "default_database")]
    pub database: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub username: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub password: Option<String>,

    /// Environment variable containing the password. Takes precedence
    /// over `password`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub password_env: Option<String>,

    #[serde(default)]
    pub auth: AuthMode,

    /// Backend driver name. Auto-detected from the built-in driver table
    /// when unset.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub driver: Option<String>,
}

fn default_host() -> String {
    "localhost".to_string()
}

fn default_database() -> String {
    "postgres".to_string()
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: None,
            database: default_database(),
            username: None,
            password: None,
            password_env: None,
            auth: AuthMode::default(),
            driver: None,
        }
    }
}

impl DatabaseConfig {
    /// Get the password, checking `password_env` first.
    pub fn resolve_password(&self) -> Option<String> {
        if let Some(env_var) = &self.password_env
            && let Ok(password) = env::var(env_var)
        {
            return Some(password);
        }
        self.password.clone()
    }
}

/// Error type for configuration loading.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("YAML parse error: {0}")]
    Yaml(#[from] serde_yaml::Error),

    #[error("Configuration error: {0}")]
    Config(String),
}

impl AppConfig {
    /// Load configuration from a YAML file.
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let content = fs::read_to_string(path.as_ref())?;
        Self::from_yaml(&content)
    }

    /// Parse configuration from YAML content.
    pub fn from_yaml(content: &str) -> Result<Self, ConfigError> {
        serde_yaml::from_str(content).map_err(ConfigError::from)
    }
}
