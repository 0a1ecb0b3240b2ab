use std::{fs, path::PathBuf, time::Duration};

use anyhow::{anyhow, Context};
use serde::Deserialize;

#[derive(Debug, Clone, Deserialize)]
pub struct ServerConfig {
    #[serde(default = "default_bind_addr")]
    pub bind_addr: String,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind_addr: default_bind_addr(),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct CacheConfig {
    #[serde(default = "default_ttl_secs")]
    pub ttl_secs: u64,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            ttl_secs: default_ttl_secs(),
        }
    }
}

impl CacheConfig {
    pub fn ttl(&self) -> Duration {
        Duration::from_secs(self.ttl_secs)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SourceKind {
    Rest,
    Pgwire,
    CsvFile,
}

/// PostgREST access. Only the *names* of the environment variables holding
/// the URL and key live in the file.
#[derive(Debug, Clone, Deserialize)]
pub struct RestSourceConfig {
    #[serde(default = "default_url_env")]
    pub url_env: String,
    #[serde(default = "default_key_env")]
    pub key_env: String,
    #[serde(default = "default_timeout_ms")]
    pub timeout_ms: u64,
    #[serde(default = "default_page_size")]
    pub page_size: usize,
}

impl Default for RestSourceConfig {
    fn default() -> Self {
        Self {
            url_env: default_url_env(),
            key_env: default_key_env(),
            timeout_ms: default_timeout_ms(),
            page_size: default_page_size(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RestCredentials {
    pub base_url: String,
    pub api_key: String,
}

impl RestSourceConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_millis(self.timeout_ms)
    }

    pub fn credentials(&self) -> anyhow::Result<RestCredentials> {
        self.credentials_from(|name| std::env::var(name).ok())
    }

    pub fn credentials_from<F>(&self, lookup: F) -> anyhow::Result<RestCredentials>
    where
        F: Fn(&str) -> Option<String>,
    {
        Ok(RestCredentials {
            base_url: required_var(&lookup, &self.url_env)?,
            api_key: required_var(&lookup, &self.key_env)?,
        })
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct PgwireSourceConfig {
    #[serde(default = "default_uri_env")]
    pub uri_env: String,
    #[serde(default = "default_max_connections")]
    pub max_connections: u32,
}

impl Default for PgwireSourceConfig {
    fn default() -> Self {
        Self {
            uri_env: default_uri_env(),
            max_connections: default_max_connections(),
        }
    }
}

impl PgwireSourceConfig {
    pub fn uri(&self) -> anyhow::Result<String> {
        self.uri_from(|name| std::env::var(name).ok())
    }

    pub fn uri_from<F>(&self, lookup: F) -> anyhow::Result<String>
    where
        F: Fn(&str) -> Option<String>,
    {
        required_var(&lookup, &self.uri_env)
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct CsvFileSourceConfig {
    pub path: PathBuf,
}

#[derive(Debug, Clone, Deserialize)]
pub struct SourceConfig {
    pub kind: SourceKind,
    #[serde(default = "default_table")]
    pub table: String,
    #[serde(default)]
    pub rest: RestSourceConfig,
    #[serde(default)]
    pub pgwire: PgwireSourceConfig,
    pub csv_file: Option<CsvFileSourceConfig>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct MetricsConfig {
    pub bind_addr: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct AppConfig {
    #[serde(default)]
    pub server: ServerConfig,
    #[serde(default)]
    pub cache: CacheConfig,
    pub source: SourceConfig,
    pub metrics: Option<MetricsConfig>,
}

impl AppConfig {
    pub fn load() -> anyhow::Result<Self> {
        use std::env;

        let path = env::var("DASHBOARD_CONFIG").unwrap_or_else(|_| "dashboard-config.toml".to_string());
        let contents = fs::read_to_string(&path).with_context(|| format!("reading config file {path}"))?;
        Self::from_toml_str(&contents).with_context(|| format!("parsing config file {path}"))
    }

    pub fn from_toml_str(contents: &str) -> anyhow::Result<Self> {
        let cfg: AppConfig = toml::from_str(contents)?;

        if cfg.source.kind == SourceKind::CsvFile && cfg.source.csv_file.is_none() {
            return Err(anyhow!("source.kind = \"csv_file\" requires a [source.csv_file] section"));
        }

        Ok(cfg)
    }
}

fn required_var<F>(lookup: &F, name: &str) -> anyhow::Result<String>
where
    F: Fn(&str) -> Option<String>,
{
    match lookup(name) {
        Some(v) if !v.trim().is_empty() => Ok(v),
        _ => Err(anyhow!("environment variable {name} is not set")),
    }
}

fn default_bind_addr() -> String {
    "0.0.0.0:8501".to_string()
}

fn default_ttl_secs() -> u64 {
    60
}

fn default_url_env() -> String {
    "SUPABASE_URL".to_string()
}

fn default_key_env() -> String {
    "SUPABASE_KEY".to_string()
}

fn default_timeout_ms() -> u64 {
    10_000
}

fn default_page_size() -> usize {
    pannes_client::rest::DEFAULT_PAGE_SIZE
}

fn default_uri_env() -> String {
    "DATABASE_URL".to_string()
}

fn default_max_connections() -> u32 {
    2
}

fn default_table() -> String {
    "pannes".to_string()
}
