//! # rb-config
//!
//! Layered settings: built-in defaults, an optional TOML file, `.env`, then
//! `RB__SECTION__KEY` environment variables.

use config::builder::DefaultState;
use config::{Config, ConfigBuilder, Environment, File};
use secrecy::SecretString;
use serde::{Deserialize, Deserializer};
use std::path::Path;
use std::time::Duration;
use thiserror::Error;
use tracing::debug;

pub const DEFAULT_CONFIG_FILE: &str = "redboard.toml";
pub const CONFIG_PATH_VAR: &str = "RB_CONFIG";
const ENV_PREFIX: &str = "RB";

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to load settings: {0}")]
    Load(#[from] config::ConfigError),
    #[error("invalid setting {key}: {reason}")]
    Invalid { key: &'static str, reason: String },
}

#[derive(Copy, Clone, Eq, PartialEq, Debug, Default, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Backend {
    #[default]
    Memory,
    Mongo,
}

#[derive(Debug, Deserialize)]
pub struct StoreSettings {
    pub backend: Backend,
    #[serde(deserialize_with = "secret")]
    pub uri: SecretString,
    pub database: String,
    pub collection: String,
}

#[derive(Clone, Debug, Deserialize)]
pub struct EngineSettings {
    pub max_write_attempts: u32,
    pub request_timeout_ms: u64,
}

impl EngineSettings {
    pub fn request_timeout(&self) -> Duration {
        Duration::from_millis(self.request_timeout_ms)
    }
}

#[derive(Clone, Debug, Deserialize)]
pub struct LogSettings {
    pub filter: String,
    pub json: bool,
}

#[derive(Debug, Deserialize)]
pub struct Settings {
    pub store: StoreSettings,
    pub engine: EngineSettings,
    pub log: LogSettings,
}

fn secret<'de, D: Deserializer<'de>>(deserializer: D) -> Result<SecretString, D::Error> {
    String::deserialize(deserializer).map(SecretString::from)
}

impl Settings {
    /// Loads settings from the process environment and the config file.
    pub fn load() -> Result<Self, ConfigError> {
        if let Ok(path) = dotenvy::dotenv() {
            debug!(path = %path.display(), "loaded .env");
        }
        let file = std::env::var(CONFIG_PATH_VAR).unwrap_or_else(|_| DEFAULT_CONFIG_FILE.into());

        let config = Self::defaults()?
            .add_source(File::from(Path::new(&file)).required(false))
            .add_source(Self::environment())
            .build()?;
        Self::from_config(config)
    }

    /// A builder holding only the built-in defaults.
    pub fn defaults() -> Result<ConfigBuilder<DefaultState>, ConfigError> {
        Ok(Config::builder()
            .set_default("store.backend", "memory")?
            .set_default("store.uri", "mongodb://localhost:27017")?
            .set_default("store.database", "redboard")?
            .set_default("store.collection", "posts")?
            .set_default("engine.max_write_attempts", 5)?
            .set_default("engine.request_timeout_ms", 5000)?
            .set_default("log.filter", "info")?
            .set_default("log.json", false)?)
    }

    pub fn environment() -> Environment {
        Environment::with_prefix(ENV_PREFIX)
            .prefix_separator("__")
            .separator("__")
            .try_parsing(true)
    }

    pub fn from_config(config: Config) -> Result<Self, ConfigError> {
        let settings: Self = config.try_deserialize()?;
        settings.validate()?;
        Ok(settings)
    }

    fn validate(&self) -> Result<(), ConfigError> {
        if self.engine.max_write_attempts == 0 {
            return Err(ConfigError::Invalid {
                key: "engine.max_write_attempts",
                reason: "must be at least 1".into(),
            });
        }
        if self.store.backend == Backend::Mongo {
            if self.store.database.trim().is_empty() {
                return Err(ConfigError::Invalid {
                    key: "store.database",
                    reason: "must not be empty for the mongo backend".into(),
                });
            }
            if self.store.collection.trim().is_empty() {
                return Err(ConfigError::Invalid {
                    key: "store.collection",
                    reason: "must not be empty for the mongo backend".into(),
                });
            }
        }
        Ok(())
    }
}
