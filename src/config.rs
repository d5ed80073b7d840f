//! Environment-driven configuration.
//!
//! | Variable | Default | Used by |
//! |----------|---------|---------|
//! | `IDENTITY_HEADER` | `Mattermost-User-ID` | identity gate |
//! | `READ_CACHE_ENABLED` | `true` | read cache |
//! | `READ_CACHE_MAX_ENTRIES` | `10000` | read cache |
//! | `HOST` | `0.0.0.0` | service binary |
//! | `PORT` | `8001` | service binary |
//! | `PLUGIN_MOUNT_PATH` | empty (serve at `/`) | service binary |
//! | `LOG_FORMAT` | `json` | service binary |

use crate::read_state::CacheConfig;
use crate::DEFAULT_IDENTITY_HEADER;

/// Settings consumed by the plugin core.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PluginConfig {
    /// Header the host sets to the authenticated user's id.
    pub identity_header: String,
    /// Positive read cache settings.
    pub cache: CacheConfig,
}

impl Default for PluginConfig {
    fn default() -> Self {
        Self {
            identity_header: DEFAULT_IDENTITY_HEADER.to_string(),
            cache: CacheConfig::default(),
        }
    }
}

impl PluginConfig {
    /// Load configuration from environment variables.
    pub fn from_env() -> Self {
        let defaults = CacheConfig::default();
        Self {
            identity_header: std::env::var("IDENTITY_HEADER")
                .ok()
                .filter(|s| !s.trim().is_empty())
                .unwrap_or_else(|| DEFAULT_IDENTITY_HEADER.to_string()),
            cache: CacheConfig {
                enabled: parse_env("READ_CACHE_ENABLED").unwrap_or(defaults.enabled),
                max_entries: parse_env("READ_CACHE_MAX_ENTRIES").unwrap_or(defaults.max_entries),
            },
        }
    }
}

/// Output format for the service's log lines.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LogFormat {
    /// Structured JSON, one object per line.
    #[default]
    Json,
    /// Human-readable output for local development.
    Pretty,
}

impl LogFormat {
    /// Parse a format name. Anything other than `pretty` means JSON.
    pub fn parse(s: &str) -> Self {
        if s.eq_ignore_ascii_case("pretty") {
            Self::Pretty
        } else {
            Self::Json
        }
    }
}

/// Settings for the standalone service binary.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServerConfig {
    /// Bind host.
    pub host: String,
    /// Bind port.
    pub port: u16,
    /// Path prefix the router is nested under; empty serves at the root.
    pub mount_path: String,
    /// Log output format.
    pub log_format: LogFormat,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 8001,
            mount_path: String::new(),
            log_format: LogFormat::Json,
        }
    }
}

impl ServerConfig {
    /// Load configuration from environment variables.
    pub fn from_env() -> Self {
        let defaults = Self::default();
        Self {
            host: std::env::var("HOST").unwrap_or(defaults.host),
            port: parse_env("PORT").unwrap_or(defaults.port),
            mount_path: std::env::var("PLUGIN_MOUNT_PATH")
                .map(|p| normalize_mount_path(&p))
                .unwrap_or(defaults.mount_path),
            log_format: std::env::var("LOG_FORMAT")
                .map(|s| LogFormat::parse(&s))
                .unwrap_or(defaults.log_format),
        }
    }

    /// `host:port` string for binding.
    pub fn bind_address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

/// Normalize a mount path to `/segment[/segment...]` or the empty string.
pub fn normalize_mount_path(path: &str) -> String {
    let trimmed = path.trim().trim_matches('/');
    if trimmed.is_empty() {
        String::new()
    } else {
        format!("/{}", trimmed)
    }
}

fn parse_env<T: std::str::FromStr>(name: &str) -> Option<T> {
    std::env::var(name).ok().and_then(|s| s.trim().parse().ok())
}
