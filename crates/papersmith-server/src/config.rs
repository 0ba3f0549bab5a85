//! Server configuration management
//!
//! Settings are layered: built-in defaults, then an optional
//! `papersmith.{toml,yaml,json}` file in the working directory, then
//! environment variables. Environment keys are the configuration key path
//! upper-cased, prefixed with `PAPERSMITH_`, with `__` between segments:
//! `storage.minio.access_key` is `PAPERSMITH_STORAGE__MINIO__ACCESS_KEY`.

use config::{Config, Environment, File, Map};
use papersmith::WkHtmlToPdf;
use papersmith_registry::{CacheSettings, ObjectStoreSettings};
use serde::Deserialize;
use std::time::Duration;
use thiserror::Error;

pub const ENV_PREFIX: &str = "PAPERSMITH";
pub const CONFIG_FILE: &str = "papersmith";

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to load configuration: {0}")]
    Load(#[from] config::ConfigError),

    #[error("Invalid configuration: {0}")]
    Invalid(String),
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct Settings {
    pub server: ServerSettings,
    pub storage: StorageSettings,
    pub cache: CacheConfig,
    pub template: TemplateSettings,
    pub renderer: RendererSettings,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ServerSettings {
    pub host: String,
    pub port: u16,
    /// Largest accepted request body, templates included
    pub body_limit_bytes: usize,
}

impl Default for ServerSettings {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 8080,
            body_limit_bytes: 10 * 1024 * 1024,
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum StorageType {
    #[default]
    #[serde(alias = "memory")]
    InMemory,
    #[serde(alias = "minio")]
    ObjectStore,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct StorageSettings {
    #[serde(rename = "type")]
    pub kind: StorageType,
    pub minio: MinioSettings,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct MinioSettings {
    pub endpoint: String,
    pub access_key: String,
    pub secret_key: String,
    pub use_ssl: bool,
    pub bucket: String,
    pub path: String,
    /// Signing region; requests never wait on a region lookup
    pub region: String,
    pub timeout_seconds: u64,
    /// Create the bucket at startup if it is missing
    pub create_bucket: bool,
}

impl Default for MinioSettings {
    fn default() -> Self {
        Self {
            endpoint: String::new(),
            access_key: String::new(),
            secret_key: String::new(),
            use_ssl: false,
            bucket: "templates".to_string(),
            path: "templates".to_string(),
            region: ObjectStoreSettings::DEFAULT_REGION.to_string(),
            timeout_seconds: ObjectStoreSettings::DEFAULT_TIMEOUT.as_secs(),
            create_bucket: false,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct CacheConfig {
    pub max_capacity: u64,
    pub ttl_seconds: u64,
}

impl Default for CacheConfig {
    fn default() -> Self {
        let defaults = CacheSettings::default();
        Self {
            max_capacity: defaults.max_capacity,
            ttl_seconds: defaults.time_to_live.as_secs(),
        }
    }
}

impl From<&CacheConfig> for CacheSettings {
    fn from(config: &CacheConfig) -> Self {
        CacheSettings {
            max_capacity: config.max_capacity,
            time_to_live: Duration::from_secs(config.ttl_seconds),
        }
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct TemplateSettings {
    /// Compile every stored template into the cache at startup
    pub preload: bool,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct RendererSettings {
    pub binary: String,
    pub args: Vec<String>,
    pub timeout_seconds: u64,
}

impl Default for RendererSettings {
    fn default() -> Self {
        Self {
            binary: "wkhtmltopdf".to_string(),
            args: vec!["--quiet".to_string()],
            timeout_seconds: WkHtmlToPdf::DEFAULT_TIMEOUT.as_secs(),
        }
    }
}

impl Settings {
    /// Load settings from the config file and the process environment
    pub fn load() -> Result<Self, ConfigError> {
        Self::from_sources(Some(CONFIG_FILE), None)
    }

    /// Load settings from an optional config file and an explicit environment
    ///
    /// `env` replaces the process environment when given.
    pub fn from_sources(
        file: Option<&str>,
        env: Option<Map<String, String>>,
    ) -> Result<Self, ConfigError> {
        let mut builder = Config::builder();
        if let Some(file) = file {
            builder = builder.add_source(File::with_name(file).required(false));
        }

        let settings: Settings = builder
            .add_source(
                Environment::with_prefix(ENV_PREFIX)
                    .prefix_separator("_")
                    .separator("__")
                    .try_parsing(true)
                    .list_separator(",")
                    .with_list_parse_key("renderer.args")
                    .source(env),
            )
            .build()?
            .try_deserialize()?;

        settings.validate()?;
        Ok(settings)
    }

    fn validate(&self) -> Result<(), ConfigError> {
        if self.storage.kind == StorageType::ObjectStore {
            if self.storage.minio.endpoint.is_empty() {
                return Err(ConfigError::Invalid(
                    "storage.minio.endpoint is required for object-store storage".into(),
                ));
            }
            if self.storage.minio.region.is_empty() {
                return Err(ConfigError::Invalid(
                    "storage.minio.region must not be empty".into(),
                ));
            }
            if self.storage.minio.bucket.is_empty() {
                return Err(ConfigError::Invalid(
                    "storage.minio.bucket is required for object-store storage".into(),
                ));
            }
        }
        if self.cache.max_capacity == 0 {
            return Err(ConfigError::Invalid("cache.max_capacity must be positive".into()));
        }
        if self.cache.ttl_seconds == 0 {
            return Err(ConfigError::Invalid("cache.ttl_seconds must be positive".into()));
        }
        Ok(())
    }

    pub fn bind_address(&self) -> String {
        format!("{}:{}", self.server.host, self.server.port)
    }
}
