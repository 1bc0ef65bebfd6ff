//! Configuration module for WAF Console.
//!
//! Loads configuration from YAML files and environment variables.

use std::path::PathBuf;
use std::time::Duration;

use config::builder::DefaultState;
use config::{Config as ConfigLoader, ConfigBuilder, ConfigError, Environment, File};
use serde::Deserialize;

/// Root configuration structure.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub backend: BackendConfig,
    #[serde(default)]
    pub session: SessionConfig,
    #[serde(default)]
    pub console: ConsoleConfig,
}

/// Backend connection configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct BackendConfig {
    /// Scheme, host and port of the management backend.
    pub base_url: String,
    /// Path prefix every resource path is issued under.
    #[serde(default)]
    pub api_prefix: String,
    /// Upper bound on a single dispatch, in seconds.
    pub timeout_secs: u64,
}

/// Session storage configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct SessionConfig {
    /// File the session is persisted to between runs.
    pub path: PathBuf,
}

/// Presentation configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct ConsoleConfig {
    /// Appended to every page title.
    pub title_suffix: String,
}

impl Config {
    /// Load configuration from files and environment.
    ///
    /// Priority (highest to lowest):
    /// 1. Environment variables (WAF_CONSOLE__SECTION__KEY)
    /// 2. config/local.yaml (if exists)
    /// 3. config/default.yaml (if exists)
    /// 4. Built-in defaults
    pub fn load() -> Result<Self, ConfigError> {
        let builder = Self::defaults()?
            .add_source(File::with_name("config/default").required(false))
            .add_source(File::with_name("config/local").required(false))
            .add_source(
                Environment::with_prefix("WAF_CONSOLE")
                    .separator("__")
                    .try_parsing(true),
            );

        Self::build(builder)
    }

    fn defaults() -> Result<ConfigBuilder<DefaultState>, ConfigError> {
        ConfigLoader::builder()
            .set_default("backend.base_url", "http://127.0.0.1:8080")?
            .set_default("backend.api_prefix", "/api/v1")?
            .set_default("backend.timeout_secs", 10)?
            .set_default("session.path", ".waf-console/session.json")?
            .set_default("console.title_suffix", "WAF Admin")
    }

    fn build(builder: ConfigBuilder<DefaultState>) -> Result<Self, ConfigError> {
        let config: Config = builder.build()?.try_deserialize()?;
        config.validate()?;
        Ok(config)
    }

    fn validate(&self) -> Result<(), ConfigError> {
        if self.backend.base_url.trim().is_empty() {
            return Err(ConfigError::Message(
                "backend.base_url must not be empty".to_string(),
            ));
        }
        if self.backend.timeout_secs == 0 {
            return Err(ConfigError::Message(
                "backend.timeout_secs must be greater than zero".to_string(),
            ));
        }
        Ok(())
    }
}

impl BackendConfig {
    /// Root every relative resource path is joined onto.
    pub fn api_root(&self) -> String {
        let base = self.base_url.trim_end_matches('/');
        let prefix = self.api_prefix.trim_matches('/');
        if prefix.is_empty() {
            base.to_string()
        } else {
            format!("{}/{}", base, prefix)
        }
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}

impl Default for BackendConfig {
    fn default() -> Self {
        Self {
            base_url: "http://127.0.0.1:8080".to_string(),
            api_prefix: "/api/v1".to_string(),
            timeout_secs: 10,
        }
    }
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            path: PathBuf::from(".waf-console/session.json"),
        }
    }
}

impl Default for ConsoleConfig {
    fn default() -> Self {
        Self {
            title_suffix: "WAF Admin".to_string(),
        }
    }
}
