//! Application configuration loaded from environment variables.

use std::env;
use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;

use quill_core::domain::DEFAULT_MAX_UPLOAD_BYTES;
use quill_core::services::DEFAULT_CACHE_TTL;
use quill_infra::database::DatabaseConfig;
use quill_shared::dto::parse_flag;

/// Directory cover images are written to unless `UPLOAD_DIR` says otherwise.
pub const DEFAULT_UPLOAD_DIR: &str = "images/post_banner";

/// Application configuration.
#[derive(Debug, Clone)]
pub struct AppConfig {
    pub host: String,
    pub port: u16,
    /// `None` runs on the in-memory post store.
    pub database: Option<DatabaseConfig>,
    pub cache: CacheConfig,
    pub upload: UploadConfig,
    pub json_logs: bool,
}

/// Post cache settings.
#[derive(Debug, Clone)]
pub struct CacheConfig {
    /// `None` uses the in-memory cache.
    pub redis_url: Option<String>,
    pub connect_timeout: Duration,
    pub fallback_to_memory: bool,
    pub ttl: Duration,
    /// How often the in-memory cache drops expired entries.
    pub purge_interval: Duration,
}

/// Cover image storage settings.
#[derive(Debug, Clone)]
pub struct UploadConfig {
    pub dir: PathBuf,
    pub max_bytes: usize,
}

impl AppConfig {
    /// Load configuration from environment variables.
    pub fn from_env() -> Self {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Build the configuration from any key-value source.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let database = lookup("DATABASE_URL").map(|url| {
            let mut config = DatabaseConfig::new(url);
            config.max_connections = parsed(&lookup, "DB_MAX_CONNECTIONS", config.max_connections);
            config.min_connections = parsed(&lookup, "DB_MIN_CONNECTIONS", config.min_connections);
            config
        });

        let cache = CacheConfig {
            redis_url: lookup("REDIS_URL"),
            connect_timeout: Duration::from_secs(parsed(&lookup, "REDIS_CONNECT_TIMEOUT_SECS", 5)),
            fallback_to_memory: lookup("REDIS_FALLBACK_TO_MEMORY")
                .and_then(|v| parse_flag(&v))
                .unwrap_or(true),
            ttl: Duration::from_secs(parsed(
                &lookup,
                "POST_CACHE_TTL_SECS",
                DEFAULT_CACHE_TTL.as_secs(),
            )),
            purge_interval: Duration::from_secs(parsed(&lookup, "CACHE_PURGE_INTERVAL_SECS", 300)),
        };

        let upload = UploadConfig {
            dir: lookup("UPLOAD_DIR")
                .map(PathBuf::from)
                .unwrap_or_else(|| PathBuf::from(DEFAULT_UPLOAD_DIR)),
            max_bytes: parsed(&lookup, "UPLOAD_MAX_BYTES", DEFAULT_MAX_UPLOAD_BYTES),
        };

        Self {
            host: lookup("HOST").unwrap_or_else(|| "127.0.0.1".to_string()),
            port: parsed(&lookup, "PORT", 8080),
            database,
            cache,
            upload,
            json_logs: lookup("LOG_FORMAT").is_some_and(|v| v.eq_ignore_ascii_case("json")),
        }
    }
}

/// Parse a variable, falling back to `default` when it is unset or malformed.
fn parsed<T: FromStr>(lookup: &impl Fn(&str) -> Option<String>, key: &str, default: T) -> T {
    lookup(key)
        .and_then(|raw| raw.trim().parse().ok())
        .unwrap_or(default)
}
