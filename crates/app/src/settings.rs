//! Application settings.
//!
//! Read from an optional `settings.toml` in the working directory, then
//! overridden by `CRM__`-prefixed environment variables, e.g.
//! `CRM__SERVER__PORT=8080` or `CRM__ENGINE__OPERATION_TIMEOUT_SECS=5`.
use std::time::Duration;

use config::{Config, ConfigError, Environment, File};
use engine::{EngineConfig, RetryPolicy};
use serde::Deserialize;

#[derive(Debug, Deserialize)]
pub struct App {
    #[serde(default = "default_level")]
    pub level: String,
}

fn default_level() -> String {
    "info".to_string()
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Database {
    Memory,
    Sqlite(String),
}

impl Default for Database {
    fn default() -> Self {
        Database::Sqlite("./order_desk.db".to_string())
    }
}

impl Database {
    pub fn url(&self) -> String {
        match self {
            Database::Memory => String::from("sqlite::memory:"),
            Database::Sqlite(path) => format!("sqlite:{path}?mode=rwc"),
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct Server {
    pub bind: Option<String>,
    pub port: u16,
}

impl Server {
    pub fn addr(&self) -> String {
        format!(
            "{}:{}",
            self.bind.as_deref().unwrap_or("127.0.0.1"),
            self.port
        )
    }
}

/// Engine tuning. Every field is optional and falls back to the engine
/// defaults.
#[derive(Debug, Default, Deserialize)]
pub struct Engine {
    pub max_conflict_retries: Option<u32>,
    pub retry_base_delay_ms: Option<u64>,
    pub retry_max_delay_ms: Option<u64>,
    pub operation_timeout_secs: Option<u64>,
    pub default_page_limit: Option<u64>,
    pub max_page_limit: Option<u64>,
}

impl Engine {
    pub fn to_config(&self) -> EngineConfig {
        let defaults = EngineConfig::default();
        let retry_defaults = RetryPolicy::default();

        EngineConfig {
            retry: RetryPolicy {
                max_retries: self
                    .max_conflict_retries
                    .unwrap_or(retry_defaults.max_retries),
                base_delay: self
                    .retry_base_delay_ms
                    .map_or(retry_defaults.base_delay, Duration::from_millis),
                max_delay: self
                    .retry_max_delay_ms
                    .map_or(retry_defaults.max_delay, Duration::from_millis),
            },
            operation_timeout: self
                .operation_timeout_secs
                .map_or(defaults.operation_timeout, Duration::from_secs),
            default_page_limit: self
                .default_page_limit
                .unwrap_or(defaults.default_page_limit),
            max_page_limit: self.max_page_limit.unwrap_or(defaults.max_page_limit),
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct Settings {
    pub app: App,
    #[serde(default)]
    pub database: Database,
    pub server: Server,
    #[serde(default)]
    pub engine: Engine,
}

impl Settings {
    pub fn new() -> Result<Self, ConfigError> {
        let settings = Config::builder()
            .set_default("app.level", "info")?
            .set_default("server.port", 3000)?
            .add_source(File::with_name("settings").required(false))
            .add_source(Environment::with_prefix("CRM").separator("__"))
            .build()?;

        settings.try_deserialize()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn engine_overrides_fall_back_to_defaults() {
        let engine = Engine {
            max_conflict_retries: Some(7),
            operation_timeout_secs: Some(2),
            ..Engine::default()
        };
        let config = engine.to_config();
        assert_eq!(config.retry.max_retries, 7);
        assert_eq!(config.operation_timeout, Duration::from_secs(2));
        assert_eq!(config.retry.base_delay, RetryPolicy::default().base_delay);
        assert_eq!(
            config.max_page_limit,
            EngineConfig::default().max_page_limit
        );
    }

    #[test]
    fn database_urls() {
        assert_eq!(Database::Memory.url(), "sqlite::memory:");
        assert_eq!(
            Database::Sqlite("/tmp/x.db".to_string()).url(),
            "sqlite:/tmp/x.db?mode=rwc"
        );
    }
}
