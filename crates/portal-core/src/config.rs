//! Configuration management for the complaint portal

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Main configuration structure
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    /// Server configuration
    #[serde(default)]
    pub server: ServerConfig,

    /// Database configuration
    #[serde(default)]
    pub database: DatabaseConfig,

    /// Attachment storage configuration
    #[serde(default)]
    pub storage: StorageConfig,

    /// API configuration
    #[serde(default)]
    pub api: ApiConfig,

    /// Security configuration
    #[serde(default)]
    pub security: SecurityConfig,

    /// Logging configuration
    #[serde(default)]
    pub logging: LoggingConfig,
}

/// Server configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    /// Host to bind to
    #[serde(default = "default_host")]
    pub host: String,

    /// Port to listen on
    #[serde(default = "default_port")]
    pub port: u16,
}

/// Database configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DatabaseConfig {
    /// Database URL
    #[serde(default = "default_database_url")]
    pub url: String,

    /// Maximum number of connections
    #[serde(default = "default_max_connections")]
    pub max_connections: u32,

    /// Minimum number of connections
    #[serde(default = "default_min_connections")]
    pub min_connections: u32,

    /// Connection timeout in seconds
    #[serde(default = "default_connect_timeout")]
    pub connect_timeout: u64,

    /// Idle timeout in seconds
    #[serde(default = "default_idle_timeout")]
    pub idle_timeout: u64,
}

/// Storage configuration
///
/// Attachments land in `{base_dir}/{upload_dir}/{complaint_id}/`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StorageConfig {
    /// Base directory for file storage
    #[serde(default = "default_base_dir")]
    pub base_dir: PathBuf,

    /// Upload directory (relative to `base_dir`)
    #[serde(default = "default_upload_dir")]
    pub upload_dir: String,
}

/// API configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiConfig {
    /// Enable CORS
    #[serde(default = "default_enable_cors")]
    pub enable_cors: bool,

    /// CORS allowed origins
    #[serde(default = "default_cors_origins")]
    pub cors_origins: Vec<String>,

    /// Shared key required in `x-admin-key` for admin routes; open when unset
    #[serde(default)]
    pub admin_key: Option<String>,
}

/// Security configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SecurityConfig {
    /// Maximum request body size in bytes
    #[serde(default = "default_max_request_size")]
    pub max_request_size: usize,

    /// Request timeout in seconds
    #[serde(default = "default_request_timeout")]
    pub request_timeout: u64,
}

/// Logging configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// Log level
    #[serde(default = "default_log_level")]
    pub level: String,

    /// Log format (json or text)
    #[serde(default = "default_log_format")]
    pub format: String,
}

// Default value functions
fn default_host() -> String {
    "0.0.0.0".to_string()
}

const fn default_port() -> u16 {
    8080
}

fn default_database_url() -> String {
    std::env::var("DATABASE_URL").unwrap_or_else(|_| "postgresql://localhost/complaints".to_string())
}

const fn default_max_connections() -> u32 {
    20
}

const fn default_min_connections() -> u32 {
    2
}

const fn default_connect_timeout() -> u64 {
    30
}

const fn default_idle_timeout() -> u64 {
    600
}

fn default_base_dir() -> PathBuf {
    PathBuf::from("./data")
}

fn default_upload_dir() -> String {
    "uploads".to_string()
}

const fn default_enable_cors() -> bool {
    true
}

fn default_cors_origins() -> Vec<String> {
    vec!["*".to_string()]
}

const fn default_max_request_size() -> usize {
    256 * 1024 * 1024
}

const fn default_request_timeout() -> u64 {
    60
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_log_format() -> String {
    "json".to_string()
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
        }
    }
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            url: default_database_url(),
            max_connections: default_max_connections(),
            min_connections: default_min_connections(),
            connect_timeout: default_connect_timeout(),
            idle_timeout: default_idle_timeout(),
        }
    }
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            base_dir: default_base_dir(),
            upload_dir: default_upload_dir(),
        }
    }
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            enable_cors: default_enable_cors(),
            cors_origins: default_cors_origins(),
            admin_key: None,
        }
    }
}

impl Default for SecurityConfig {
    fn default() -> Self {
        Self {
            max_request_size: default_max_request_size(),
            request_timeout: default_request_timeout(),
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            format: default_log_format(),
        }
    }
}

impl StorageConfig {
    /// Root directory under which per-complaint attachment folders live
    #[must_use]
    pub fn upload_root(&self) -> PathBuf {
        self.base_dir.join(&self.upload_dir)
    }
}

impl Config {
    /// Load configuration from an optional `config` file and `PORTAL_*` environment variables
    ///
    /// Nested keys use a double underscore, e.g. `PORTAL_DATABASE__URL`.
    ///
    /// # Errors
    ///
    /// Returns an error if configuration cannot be loaded or parsed.
    pub fn load() -> crate::Result<Self> {
        Self::build(config::File::with_name("config").required(false))
    }

    /// Load configuration from a specific file, still honouring `PORTAL_*` overrides
    ///
    /// The format follows the file extension (`.toml`, `.yaml`, `.json`).
    ///
    /// # Errors
    ///
    /// Returns an error if the file is missing, unreadable or invalid.
    pub fn load_file(path: &Path) -> crate::Result<Self> {
        Self::build(config::File::from(path).required(true))
    }

    fn build<S>(file: S) -> crate::Result<Self>
    where
        S: config::Source + Send + Sync + 'static,
    {
        let config = config::Config::builder()
            .add_source(file)
            .add_source(
                config::Environment::with_prefix("PORTAL")
                    .prefix_separator("_")
                    .separator("__"),
            )
            .build()
            .map_err(|e| crate::Error::Configuration {
                message: e.to_string(),
            })?;

        config
            .try_deserialize()
            .map_err(|e| crate::Error::Configuration {
                message: e.to_string(),
            })
    }
}

#[cfg(test)]
#[allow(clippy::missing_panics_doc, clippy::field_reassign_with_default)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_config_default() {
        let config = Config::default();

        assert_eq!(config.server.host, "0.0.0.0");
        assert_eq!(config.server.port, 8080);

        assert!(config.database.url.starts_with("postgres"));
        assert_eq!(config.database.max_connections, 20);
        assert_eq!(config.database.min_connections, 2);

        assert_eq!(config.storage.base_dir, PathBuf::from("./data"));
        assert_eq!(config.storage.upload_dir, "uploads");

        assert!(config.api.enable_cors);
        assert_eq!(config.api.cors_origins, vec!["*"]);
        assert!(config.api.admin_key.is_none());

        assert_eq!(config.security.max_request_size, 256 * 1024 * 1024);
        assert_eq!(config.security.request_timeout, 60);

        assert_eq!(config.logging.level, "info");
        assert_eq!(config.logging.format, "json");
    }

    #[test]
    fn test_upload_root_joins_base_and_upload_dir() {
        let storage = StorageConfig {
            base_dir: PathBuf::from("/var/portal"),
            upload_dir: "attachments".to_string(),
        };

        assert_eq!(storage.upload_root(), PathBuf::from("/var/portal/attachments"));
    }

    #[test]
    fn test_partial_json_fills_defaults() {
        let json = r#"{
            "server": { "port": 9000 },
            "api": { "admin_key": "s3cret" }
        }"#;

        let config: Config = serde_json::from_str(json).expect("partial config should parse");

        assert_eq!(config.server.port, 9000);
        assert_eq!(config.server.host, "0.0.0.0");
        assert_eq!(config.api.admin_key.as_deref(), Some("s3cret"));
        assert!(config.api.enable_cors);
        assert_eq!(config.storage.upload_dir, "uploads");
        assert_eq!(config.logging.format, "json");
    }

    #[test]
    fn test_config_serialization_roundtrip() {
        let mut config = Config::default();
        config.logging.format = "text".to_string();
        config.storage.base_dir = PathBuf::from("/srv/complaints");

        let json = serde_json::to_string(&config).expect("serialize");
        let back: Config = serde_json::from_str(&json).expect("deserialize");

        assert_eq!(back.logging.format, "text");
        assert_eq!(back.storage.base_dir, PathBuf::from("/srv/complaints"));
        assert_eq!(back.database.url, config.database.url);
    }

    #[test]
    fn test_load_file_reads_toml() {
        let temp_dir = tempfile::TempDir::new().expect("temp dir");
        let path = temp_dir.path().join("portal.toml");
        std::fs::write(
            &path,
            r#"
[server]
port = 3000

[storage]
base_dir = "/srv/portal"

[logging]
format = "text"
"#,
        )
        .expect("write config");

        let config = Config::load_file(&path).expect("config should load");

        assert_eq!(config.server.port, 3000);
        assert_eq!(config.storage.upload_root(), PathBuf::from("/srv/portal/uploads"));
        assert_eq!(config.logging.format, "text");
        assert_eq!(config.database.max_connections, 20);
    }

    #[test]
    fn test_load_file_missing_is_configuration_error() {
        let temp_dir = tempfile::TempDir::new().expect("temp dir");
        let err = Config::load_file(&temp_dir.path().join("absent.toml")).unwrap_err();

        assert!(matches!(err, crate::Error::Configuration { .. }));
    }
}
