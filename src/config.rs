use anyhow::Result;
use serde::Deserialize;
use std::path::PathBuf;

/// Environment variables override file values, e.g. `TUMAMOC__STORE__API_KEY`
const ENV_PREFIX: &str = "TUMAMOC";

#[derive(Debug, Deserialize)]
pub struct Config {
    pub service: ServiceConfig,
    #[serde(default)]
    pub logging: LoggingConfig,
    #[serde(default)]
    pub store: StoreConfig,
}

#[derive(Debug, Deserialize)]
pub struct ServiceConfig {
    pub name: String,
    pub http: HttpConfig,
}

#[derive(Debug, Deserialize)]
pub struct HttpConfig {
    pub bind: String,
    pub port: u16,
}

#[derive(Debug, Deserialize)]
pub struct LoggingConfig {
    /// `tracing_subscriber::EnvFilter` directive; `RUST_LOG` wins if set
    pub filter: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            filter: "info".to_string(),
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StoreBackend {
    #[default]
    Memory,
    File,
    Rest,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct StoreConfig {
    pub backend: StoreBackend,
    /// JSON-lines file for the `file` backend
    pub path: PathBuf,
    /// Project URL for the `rest` backend
    pub url: Option<String>,
    pub api_key: Option<String>,
    pub table: String,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            backend: StoreBackend::Memory,
            path: PathBuf::from("data/hikes.jsonl"),
            url: None,
            api_key: None,
            table: "hikes".to_string(),
        }
    }
}

impl Config {
    /// Load `path` (any extension the `config` crate understands, optional)
    /// layered under `TUMAMOC__*` environment variables
    pub fn load(path: &str) -> Result<Self> {
        let settings = config::Config::builder()
            .set_default("service.name", "tumamoc-tracker")?
            .set_default("service.http.bind", "127.0.0.1")?
            .set_default("service.http.port", 8080_i64)?
            .add_source(config::File::with_name(path).required(false))
            .add_source(config::Environment::with_prefix(ENV_PREFIX).separator("__"))
            .build()?;

        Ok(settings.try_deserialize()?)
    }
}
