use serde::Deserialize;
use std::fs;
use std::path::Path;
use thiserror::Error;

pub const DEFAULT_GITHUB_API: &str = "https://api.github.com";
pub const DEFAULT_LLM_API: &str = "https://generativelanguage.googleapis.com";
pub const DEFAULT_MODEL: &str = "gemini-2.5-flash";
pub const DEFAULT_LLM_TIMEOUT_SECS: u64 = 120;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config file: {0}")]
    FileRead(#[from] std::io::Error),

    #[error("Failed to parse config file: {0}")]
    Parse(#[from] toml::de::Error),
}

/// Top-level configuration loaded from .pr-reviewer.toml.
///
/// All fields are optional; the tool works with zero config as long as the
/// tokens are available from the environment.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub github: GitHubConfig,

    #[serde(default)]
    pub llm: LlmConfig,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct GitHubConfig {
    /// GitHub access token. If None, falls back to GITHUB_TOKEN env var.
    pub token: Option<String>,
    /// REST API root, overridable for GitHub Enterprise.
    pub api_base: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct LlmConfig {
    /// Gemini model name (defaults to gemini-2.5-flash)
    pub model: Option<String>,
    /// API key. Falls back to GOOGLE_GENERATIVE_AI_API_KEY, then GEMINI_API_KEY.
    pub api_key: Option<String>,
    pub api_base: Option<String>,
    /// Per-request timeout applied by the HTTP client
    pub timeout_secs: Option<u64>,
}

impl Config {
    /// Load configuration from .pr-reviewer.toml in the current directory.
    /// Returns default config if the file doesn't exist, then fills missing
    /// secrets from the environment.
    pub fn load() -> Result<Config, ConfigError> {
        let path = Path::new(".pr-reviewer.toml");
        let mut config = if path.exists() {
            Self::load_from(path)?
        } else {
            Config::default()
        };

        config.fill_from_env(|key| std::env::var(key).ok());
        Ok(config)
    }

    /// Fill secrets that are unset or blank from `env`. A blank value in the
    /// file counts as unset.
    fn fill_from_env(&mut self, env: impl Fn(&str) -> Option<String>) {
        let lookup = |key: &str| env(key).filter(|v| !v.trim().is_empty());

        if is_blank(&self.github.token) {
            self.github.token = lookup("GITHUB_TOKEN");
        }
        if is_blank(&self.llm.api_key) {
            self.llm.api_key =
                lookup("GOOGLE_GENERATIVE_AI_API_KEY").or_else(|| lookup("GEMINI_API_KEY"));
        }
    }

    /// Load from a specific path without consulting the environment.
    pub fn load_from(path: &Path) -> Result<Config, ConfigError> {
        let contents = fs::read_to_string(path)?;
        let config = toml::from_str(&contents)?;
        Ok(config)
    }

    pub fn github_api_base(&self) -> &str {
        self.github.api_base.as_deref().unwrap_or(DEFAULT_GITHUB_API)
    }

    pub fn llm_api_base(&self) -> &str {
        self.llm.api_base.as_deref().unwrap_or(DEFAULT_LLM_API)
    }

    pub fn model(&self) -> &str {
        self.llm.model.as_deref().unwrap_or(DEFAULT_MODEL)
    }

    pub fn llm_timeout_secs(&self) -> u64 {
        self.llm.timeout_secs.unwrap_or(DEFAULT_LLM_TIMEOUT_SECS)
    }
}

fn is_blank(value: &Option<String>) -> bool {
    value.as_deref().map_or(true, |v| v.trim().is_empty())
}
