//! Server configuration loading from file and environment variables.

use auditlog_types::PagingSettings;
use serde::Deserialize;
use std::net::{IpAddr, Ipv4Addr};
use thiserror::Error;

/// Top-level server configuration.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct Config {
    /// Server network settings.
    #[serde(default)]
    pub server: ServerConfig,

    /// Database settings.
    #[serde(default)]
    pub database: DatabaseConfig,

    /// Logging settings.
    #[serde(default)]
    pub logging: LoggingConfig,

    /// Page size bounds for the audit feeds.
    #[serde(default)]
    pub paging: PagingConfig,
}

/// Network configuration for the HTTP server.
#[derive(Debug, Clone, Deserialize)]
pub struct ServerConfig {
    /// Host address to bind to.
    #[serde(default = "default_host")]
    pub host: IpAddr,

    /// Port to listen on.
    #[serde(default = "default_port")]
    pub port: u16,

    /// Externally visible base URL, prefixed to next-page links.
    ///
    /// Empty means links are relative paths.
    #[serde(default)]
    pub public_url: String,
}

/// Database configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct DatabaseConfig {
    /// Path to the SQLite database file.
    #[serde(default = "default_db_path")]
    pub path: String,

    /// SQLite busy timeout, in milliseconds.
    #[serde(default = "default_busy_timeout_ms")]
    pub busy_timeout_ms: u64,

    /// Maximum number of pooled connections.
    #[serde(default = "default_pool_max_size")]
    pub pool_max_size: u32,
}

/// Logging configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct LoggingConfig {
    /// Log level filter (e.g., "info", "debug", "auditlog_server=debug,info").
    #[serde(default = "default_log_level")]
    pub level: String,

    /// Whether to output logs in JSON format.
    #[serde(default)]
    pub json: bool,
}

/// Pagination configuration.
#[derive(Debug, Clone, Copy, Deserialize)]
pub struct PagingConfig {
    /// Page size used when a request gives no `limit`.
    #[serde(default = "default_page_limit")]
    pub default_limit: u32,

    /// Largest page size a request may ask for.
    #[serde(default = "default_max_page_limit")]
    pub max_limit: u32,
}

impl PagingConfig {
    pub fn settings(&self) -> PagingSettings {
        PagingSettings {
            default_limit: self.default_limit,
            max_limit: self.max_limit,
        }
    }
}

fn default_host() -> IpAddr {
    IpAddr::V4(Ipv4Addr::new(127, 0, 0, 1))
}

fn default_port() -> u16 {
    3000
}

fn default_db_path() -> String {
    "auditlog.db".to_string()
}

fn default_busy_timeout_ms() -> u64 {
    auditlog_db::DbRuntimeSettings::default().busy_timeout_ms
}

fn default_pool_max_size() -> u32 {
    auditlog_db::DbRuntimeSettings::default().pool_max_size
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_page_limit() -> u32 {
    PagingSettings::default().default_limit
}

fn default_max_page_limit() -> u32 {
    PagingSettings::default().max_limit
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
            public_url: String::new(),
        }
    }
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            path: default_db_path(),
            busy_timeout_ms: default_busy_timeout_ms(),
            pool_max_size: default_pool_max_size(),
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            json: false,
        }
    }
}

impl Default for PagingConfig {
    fn default() -> Self {
        Self {
            default_limit: default_page_limit(),
            max_limit: default_max_page_limit(),
        }
    }
}

/// Errors that can occur when loading configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// Failed to read the configuration file.
    #[error("failed to read config file: {0}")]
    FileRead(#[from] std::io::Error),

    /// Failed to parse the configuration file.
    #[error("failed to parse config file: {0}")]
    Parse(#[from] toml::de::Error),

    /// The configuration parsed but is unusable.
    #[error("invalid configuration: {0}")]
    Invalid(String),
}

impl Config {
    /// Checks cross-field constraints that serde cannot express.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::Invalid` describing the first problem found.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.paging.default_limit == 0 {
            return Err(ConfigError::Invalid(
                "paging.default_limit must be positive".to_string(),
            ));
        }
        if self.paging.max_limit == 0 {
            return Err(ConfigError::Invalid(
                "paging.max_limit must be positive".to_string(),
            ));
        }
        if self.paging.default_limit > self.paging.max_limit {
            return Err(ConfigError::Invalid(format!(
                "paging.default_limit ({}) exceeds paging.max_limit ({})",
                self.paging.default_limit, self.paging.max_limit
            )));
        }
        if self.database.pool_max_size == 0 {
            return Err(ConfigError::Invalid(
                "database.pool_max_size must be positive".to_string(),
            ));
        }
        Ok(())
    }
}

/// Loads configuration from a TOML file, falling back to defaults.
///
/// Environment variable overrides:
/// - `AUDITLOG_HOST` overrides `server.host`
/// - `AUDITLOG_PORT` overrides `server.port`
/// - `AUDITLOG_PUBLIC_URL` overrides `server.public_url`
/// - `AUDITLOG_DB_PATH` overrides `database.path`
/// - `AUDITLOG_LOG_LEVEL` overrides `logging.level`
/// - `AUDITLOG_LOG_JSON` overrides `logging.json` (set to "true" to enable)
///
/// # Errors
///
/// Returns `ConfigError` if the file exists but cannot be read or parsed,
/// or if the result fails [`Config::validate`].
pub fn load_config(path: Option<&str>) -> Result<Config, ConfigError> {
    let mut config = match path {
        Some(p) => match std::fs::read_to_string(p) {
            Ok(contents) => toml::from_str(&contents)?,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                tracing::info!(path = p, "config file not found, using defaults");
                Config::default()
            }
            Err(e) => return Err(ConfigError::FileRead(e)),
        },
        None => Config::default(),
    };

    apply_env_overrides(&mut config, |key| std::env::var(key).ok());
    config.validate()?;

    Ok(config)
}

fn apply_env_overrides(config: &mut Config, var: impl Fn(&str) -> Option<String>) {
    if let Some(host) = var("AUDITLOG_HOST") {
        if let Ok(parsed) = host.parse() {
            config.server.host = parsed;
        }
    }
    if let Some(port) = var("AUDITLOG_PORT") {
        if let Ok(parsed) = port.parse() {
            config.server.port = parsed;
        }
    }
    if let Some(public_url) = var("AUDITLOG_PUBLIC_URL") {
        config.server.public_url = public_url;
    }
    if let Some(db_path) = var("AUDITLOG_DB_PATH") {
        config.database.path = db_path;
    }
    if let Some(level) = var("AUDITLOG_LOG_LEVEL") {
        config.logging.level = level;
    }
    if let Some(json) = var("AUDITLOG_LOG_JSON") {
        config.logging.json = json == "true" || json == "1";
    }
    config.server.public_url = config.server.public_url.trim_end_matches('/').to_string();
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    #[test]
    fn missing_file_yields_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("absent.toml");
        let config = load_config(path.to_str()).unwrap();

        assert_eq!(config.server.port, 3000);
        assert_eq!(config.database.path, "auditlog.db");
        assert_eq!(config.paging.default_limit, 100);
        assert_eq!(config.paging.max_limit, 1000);
    }

    #[test]
    fn file_values_are_read() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        std::fs::write(
            &path,
            r#"
[server]
port = 8080
public_url = "https://audit.example.com/"

[database]
path = "/var/lib/auditlog/events.db"
pool_max_size = 4

[paging]
default_limit = 20
max_limit = 200
"#,
        )
        .unwrap();

        let config = load_config(path.to_str()).unwrap();
        assert_eq!(config.server.port, 8080);
        assert_eq!(config.server.public_url, "https://audit.example.com");
        assert_eq!(config.database.path, "/var/lib/auditlog/events.db");
        assert_eq!(config.database.pool_max_size, 4);
        assert_eq!(config.database.busy_timeout_ms, 5_000);
        assert_eq!(
            config.paging.settings(),
            PagingSettings {
                default_limit: 20,
                max_limit: 200
            }
        );
    }

    #[test]
    fn malformed_file_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("bad.toml");
        std::fs::write(&path, "[server\nport = ").unwrap();

        assert!(matches!(load_config(path.to_str()), Err(ConfigError::Parse(_))));
    }

    #[test]
    fn default_above_max_is_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        std::fs::write(&path, "[paging]\ndefault_limit = 50\nmax_limit = 10\n").unwrap();

        assert!(matches!(load_config(path.to_str()), Err(ConfigError::Invalid(_))));
    }

    #[test]
    fn env_overrides_apply() {
        let vars: HashMap<&str, &str> = HashMap::from([
            ("AUDITLOG_PORT", "9000"),
            ("AUDITLOG_HOST", "0.0.0.0"),
            ("AUDITLOG_PUBLIC_URL", "http://localhost:9000/"),
            ("AUDITLOG_LOG_JSON", "1"),
            ("AUDITLOG_DB_PATH", ":memory:"),
        ]);
        let mut config = Config::default();
        apply_env_overrides(&mut config, |key| vars.get(key).map(|v| v.to_string()));

        assert_eq!(config.server.port, 9000);
        assert_eq!(config.server.host.to_string(), "0.0.0.0");
        assert_eq!(config.server.public_url, "http://localhost:9000");
        assert!(config.logging.json);
        assert_eq!(config.database.path, ":memory:");
    }

    #[test]
    fn unparseable_env_values_are_ignored() {
        let mut config = Config::default();
        apply_env_overrides(&mut config, |key| {
            (key == "AUDITLOG_PORT").then(|| "not-a-port".to_string())
        });
        assert_eq!(config.server.port, 3000);
    }
}
