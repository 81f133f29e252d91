//! Configuration system for quill.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::error::{QuillError, QuillResult};
use crate::traits::LlmConfig;

/// Environment variable pointing at a config file.
pub const CONFIG_PATH_ENV: &str = "QUILL_CONFIG";

/// LLM provider type.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum LlmProvider {
    #[default]
    Gemini,
}

/// Provider configuration with type.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LlmProviderConfig {
    /// Provider type.
    #[serde(default)]
    pub provider: LlmProvider,
    /// Provider-specific configuration.
    #[serde(flatten)]
    pub config: LlmConfig,
}

impl Default for LlmProviderConfig {
    fn default() -> Self {
        Self {
            provider: LlmProvider::Gemini,
            config: LlmConfig {
                model: "gemini-1.5-flash".to_string(),
                ..Default::default()
            },
        }
    }
}

/// HTTP listener configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    /// Browser origins allowed by CORS; empty allows any origin.
    pub cors_origins: Vec<String>,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 8000,
            cors_origins: vec![
                "http://localhost:3000".to_string(),
                "http://localhost:8080".to_string(),
            ],
        }
    }
}

/// Content database configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct DatabaseConfig {
    /// SQLite file path.
    pub path: PathBuf,
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            path: PathBuf::from("./content.db"),
        }
    }
}

impl DatabaseConfig {
    /// Interpret a `DATABASE_URL` style value (`sqlite:///./content.db`) or a plain path.
    pub fn from_url(url: &str) -> QuillResult<Self> {
        if let Some(rest) = url.strip_prefix("sqlite://") {
            // sqlite:///relative.db and sqlite:////absolute.db
            let path = rest.strip_prefix('/').unwrap_or(rest);
            return Ok(Self {
                path: PathBuf::from(path),
            });
        }
        if url.contains("://") {
            return Err(QuillError::Configuration(format!(
                "Unsupported database url '{}'. Only sqlite is supported",
                url
            )));
        }
        Ok(Self {
            path: PathBuf::from(url),
        })
    }
}

/// Trends upstream configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct TrendsConfig {
    /// Region code for the trending feed.
    pub geo: String,
    /// Number of topics returned.
    pub max_topics: usize,
    /// Upstream request timeout in seconds.
    pub timeout_secs: u64,
    /// Override for the feed URL.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub feed_url: Option<String>,
}

impl Default for TrendsConfig {
    fn default() -> Self {
        Self {
            geo: "US".to_string(),
            max_topics: 6,
            timeout_secs: 10,
            feed_url: None,
        }
    }
}

/// Main application configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct StudioConfig {
    pub server: ServerConfig,
    pub database: DatabaseConfig,
    pub llm: LlmProviderConfig,
    pub trends: TrendsConfig,
}

impl StudioConfig {
    /// Load configuration from a file (TOML, JSON, or YAML).
    pub fn from_file(path: impl AsRef<Path>) -> QuillResult<Self> {
        let content = std::fs::read_to_string(path.as_ref())?;
        let ext = path.as_ref().extension().and_then(|e| e.to_str());

        match ext {
            Some("toml") => {
                toml::from_str(&content).map_err(|e| QuillError::Configuration(e.to_string()))
            }
            Some("json") => serde_json::from_str(&content)
                .map_err(|e| QuillError::Configuration(e.to_string())),
            Some("yaml" | "yml") => serde_yaml::from_str(&content)
                .map_err(|e| QuillError::Configuration(e.to_string())),
            _ => Err(QuillError::Configuration(
                "Unsupported config file format. Use .toml, .json, or .yaml".to_string(),
            )),
        }
    }

    /// Load configuration from environment variables on top of defaults.
    pub fn from_env() -> QuillResult<Self> {
        let mut config = Self::default();
        config.apply_env()?;
        Ok(config)
    }

    /// Resolve the full configuration.
    ///
    /// Uses the file named by `QUILL_CONFIG`, else `<config dir>/quill/config.toml`
    /// when it exists, else defaults. Environment variables are applied last.
    pub fn load() -> QuillResult<Self> {
        let mut config = match Self::config_file() {
            Some(path) => Self::from_file(path)?,
            None => Self::default(),
        };
        config.apply_env()?;
        Ok(config)
    }

    fn config_file() -> Option<PathBuf> {
        if let Ok(path) = std::env::var(CONFIG_PATH_ENV) {
            return Some(PathBuf::from(path));
        }
        dirs::config_dir()
            .map(|dir| dir.join("quill").join("config.toml"))
            .filter(|path| path.exists())
    }

    /// Override fields from environment variables.
    ///
    /// Reads:
    /// - `QUILL_HOST`, `QUILL_PORT`, `QUILL_CORS_ORIGINS` (comma separated)
    /// - `DATABASE_URL` or `QUILL_DATABASE_PATH`
    /// - `GEMINI_API_KEY`, `QUILL_LLM_MODEL`
    /// - `QUILL_TRENDS_GEO`
    pub fn apply_env(&mut self) -> QuillResult<()> {
        self.apply_vars(|key| std::env::var(key).ok())
    }

    fn apply_vars<F>(&mut self, var: F) -> QuillResult<()>
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(host) = var("QUILL_HOST") {
            self.server.host = host;
        }
        if let Some(port) = var("QUILL_PORT") {
            self.server.port = port.parse().map_err(|_| {
                QuillError::Configuration(format!(
                    "QUILL_PORT must be a valid port number, got '{}'",
                    port
                ))
            })?;
        }
        if let Some(origins) = var("QUILL_CORS_ORIGINS") {
            self.server.cors_origins = origins
                .split(',')
                .map(str::trim)
                .filter(|o| !o.is_empty())
                .map(String::from)
                .collect();
        }

        if let Some(url) = var("DATABASE_URL") {
            self.database = DatabaseConfig::from_url(&url)?;
        }
        if let Some(path) = var("QUILL_DATABASE_PATH") {
            self.database.path = PathBuf::from(path);
        }

        if let Some(api_key) = var("GEMINI_API_KEY").filter(|k| !k.is_empty()) {
            self.llm.config.api_key = Some(api_key);
        }
        if let Some(model) = var("QUILL_LLM_MODEL") {
            self.llm.config.model = model;
        }

        if let Some(geo) = var("QUILL_TRENDS_GEO") {
            self.trends.geo = geo;
        }

        Ok(())
    }

    /// Build configuration using builder pattern.
    pub fn builder() -> StudioConfigBuilder {
        StudioConfigBuilder::default()
    }
}

/// Builder for StudioConfig.
#[derive(Default)]
pub struct StudioConfigBuilder {
    config: StudioConfig,
}

impl StudioConfigBuilder {
    /// Set listener configuration.
    pub fn server(mut self, config: ServerConfig) -> Self {
        self.config.server = config;
        self
    }

    /// Set database file path.
    pub fn database_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.config.database.path = path.into();
        self
    }

    /// Set LLM configuration.
    pub fn llm(mut self, config: LlmProviderConfig) -> Self {
        self.config.llm = config;
        self
    }

    /// Set the default generation API key.
    pub fn api_key(mut self, key: impl Into<String>) -> Self {
        self.config.llm.config.api_key = Some(key.into());
        self
    }

    /// Set trends configuration.
    pub fn trends(mut self, config: TrendsConfig) -> Self {
        self.config.trends = config;
        self
    }

    /// Build the configuration.
    pub fn build(self) -> StudioConfig {
        self.config
    }
}
