/// Configuration management for Content Service
///
/// Loaded once at startup from environment variables (a `.env` file is read
/// first by `main`). Production refuses to start with development defaults.
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Main application configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// Application settings
    pub app: AppConfig,
    /// CORS configuration
    pub cors: CorsConfig,
    /// Content store configuration
    pub database: DatabaseConfig,
    /// Shared cache configuration
    pub cache: CacheConfig,
    /// Identity and profile collaborators
    pub upstream: UpstreamConfig,
    /// Viewer event channel
    pub realtime: RealtimeConfig,
    /// Feed assembly limits
    pub feed: FeedConfig,
}

/// Application settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    /// Application environment (development, staging, production)
    pub env: String,
    /// Server host to bind to
    pub host: String,
    /// Server port to bind to
    pub port: u16,
}

impl AppConfig {
    pub fn is_production(&self) -> bool {
        self.env.eq_ignore_ascii_case("production")
    }
}

/// CORS configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CorsConfig {
    /// Comma-separated list of allowed origins
    pub allowed_origins: String,
}

/// Content store configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DatabaseConfig {
    /// PostgreSQL URL; the in-memory store is used when absent
    pub url: Option<String>,
    /// Max connections in pool
    pub max_connections: u32,
}

/// Shared cache configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CacheConfig {
    /// Redis URL; caching is disabled when absent
    pub url: Option<String>,
    pub profile_ttl_secs: u64,
    pub feed_ttl_secs: u64,
    /// Upper bound for a single cache command
    pub op_timeout_ms: u64,
    /// Pub/sub channel carrying cross-service invalidations
    pub invalidation_channel: String,
}

impl CacheConfig {
    pub fn profile_ttl(&self) -> Duration {
        Duration::from_secs(self.profile_ttl_secs)
    }

    pub fn feed_ttl(&self) -> Duration {
        Duration::from_secs(self.feed_ttl_secs)
    }

    pub fn op_timeout(&self) -> Duration {
        Duration::from_millis(self.op_timeout_ms)
    }
}

/// Identity and profile collaborator endpoints
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UpstreamConfig {
    pub identity_service_url: String,
    pub profile_service_url: String,
    /// Timeout applied to every collaborator HTTP call
    pub request_timeout_ms: u64,
    /// Budget for one profile lookup during enrichment
    pub enrichment_timeout_ms: u64,
}

impl UpstreamConfig {
    pub fn request_timeout(&self) -> Duration {
        Duration::from_millis(self.request_timeout_ms)
    }

    pub fn enrichment_timeout(&self) -> Duration {
        Duration::from_millis(self.enrichment_timeout_ms)
    }
}

/// Viewer event channel settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RealtimeConfig {
    pub heartbeat_interval_secs: u64,
    pub client_timeout_secs: u64,
}

impl RealtimeConfig {
    pub fn heartbeat_interval(&self) -> Duration {
        Duration::from_secs(self.heartbeat_interval_secs)
    }

    pub fn client_timeout(&self) -> Duration {
        Duration::from_secs(self.client_timeout_secs)
    }
}

impl Default for RealtimeConfig {
    fn default() -> Self {
        Self {
            heartbeat_interval_secs: 5,
            client_timeout_secs: 10,
        }
    }
}

/// Feed assembly limits
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FeedConfig {
    /// Most items a single feed read returns
    pub max_items: i64,
}

impl Config {
    /// Load configuration from environment variables
    pub fn from_env() -> Result<Self, String> {
        let app_env = std::env::var("APP_ENV").unwrap_or_else(|_| "development".to_string());
        let production = app_env.eq_ignore_ascii_case("production");

        let config = Config {
            app: AppConfig {
                env: app_env.clone(),
                host: std::env::var("CONTENT_SERVICE_HOST")
                    .unwrap_or_else(|_| "0.0.0.0".to_string()),
                port: parse_env_or_default("CONTENT_SERVICE_PORT", 8081)?,
            },
            cors: {
                let allowed_origins = match std::env::var("CORS_ALLOWED_ORIGINS") {
                    Ok(value) => value,
                    Err(_) if production => {
                        return Err("CORS_ALLOWED_ORIGINS must be set in production".to_string())
                    }
                    Err(_) => "http://localhost:3000".to_string(),
                };

                if production && allowed_origins.trim() == "*" {
                    return Err("CORS_ALLOWED_ORIGINS cannot be '*' in production".to_string());
                }

                CorsConfig { allowed_origins }
            },
            database: {
                let url = non_empty_env("DATABASE_URL");
                if production && url.is_none() {
                    return Err("DATABASE_URL must be set in production".to_string());
                }

                DatabaseConfig {
                    url,
                    max_connections: parse_env_or_default("DATABASE_MAX_CONNECTIONS", 10)?,
                }
            },
            cache: CacheConfig {
                url: non_empty_env("REDIS_URL"),
                profile_ttl_secs: parse_env_or_default(
                    "CACHE_PROFILE_TTL_SECS",
                    shared_cache::ttl::PROFILE,
                )?,
                feed_ttl_secs: parse_env_or_default("CACHE_FEED_TTL_SECS", shared_cache::ttl::FEED)?,
                op_timeout_ms: parse_env_or_default("CACHE_OP_TIMEOUT_MS", 100)?,
                invalidation_channel: std::env::var("CACHE_INVALIDATION_CHANNEL").unwrap_or_else(
                    |_| shared_cache::invalidation::DEFAULT_CHANNEL.to_string(),
                ),
            },
            upstream: UpstreamConfig {
                identity_service_url: std::env::var("IDENTITY_SERVICE_URL")
                    .unwrap_or_else(|_| "http://localhost:8083".to_string()),
                profile_service_url: std::env::var("PROFILE_SERVICE_URL")
                    .unwrap_or_else(|_| "http://localhost:8082".to_string()),
                request_timeout_ms: parse_env_or_default("UPSTREAM_REQUEST_TIMEOUT_MS", 2_000)?,
                enrichment_timeout_ms: parse_env_or_default("ENRICHMENT_TIMEOUT_MS", 250)?,
            },
            realtime: RealtimeConfig {
                heartbeat_interval_secs: parse_env_or_default("WS_HEARTBEAT_INTERVAL_SECS", 5)?,
                client_timeout_secs: parse_env_or_default("WS_CLIENT_TIMEOUT_SECS", 10)?,
            },
            feed: FeedConfig {
                max_items: parse_env_or_default("FEED_MAX_ITEMS", 500)?,
            },
        };

        config.validate()?;
        Ok(config)
    }

    fn validate(&self) -> Result<(), String> {
        if self.cache.profile_ttl_secs == 0 || self.cache.feed_ttl_secs == 0 {
            return Err("cache TTLs must be greater than zero".to_string());
        }
        if self.realtime.heartbeat_interval_secs >= self.realtime.client_timeout_secs {
            return Err(
                "WS_HEARTBEAT_INTERVAL_SECS must be shorter than WS_CLIENT_TIMEOUT_SECS"
                    .to_string(),
            );
        }
        if self.feed.max_items <= 0 {
            return Err("FEED_MAX_ITEMS must be positive".to_string());
        }
        Ok(())
    }
}

fn non_empty_env(key: &str) -> Option<String> {
    std::env::var(key)
        .ok()
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

fn parse_env_or_default<T>(key: &str, default: T) -> Result<T, String>
where
    T: std::str::FromStr,
    T::Err: std::fmt::Display,
{
    match std::env::var(key) {
        Ok(val) => val
            .trim()
            .parse()
            .map_err(|e| format!("Failed to parse {}='{}': {}", key, val, e)),
        Err(_) => Ok(default),
    }
}
