//! Configuration schema definitions.
//!
//! This module defines the complete configuration structure for an
//! application. All types derive Serde traits for deserialization from
//! config files, and every field has a default.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Root configuration.
#[derive(Debug, Clone, Deserialize, Serialize, Default)]
#[serde(default)]
pub struct AppConfig {
    /// Listener and request limits.
    pub server: ServerConfig,

    /// Application behavior and directories.
    pub app: ApplicationConfig,

    /// Cookie names.
    pub cookies: CookieConfig,

    /// Session backend settings.
    pub session: SessionConfig,

    /// Observability settings.
    pub observability: ObservabilityConfig,
}

/// Listener configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ServerConfig {
    /// Bind address (e.g., "0.0.0.0:8080").
    pub bind_address: String,

    /// Whole-request timeout in seconds.
    pub request_timeout_secs: u64,

    /// Largest accepted request body in bytes.
    pub max_body_size: usize,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind_address: "0.0.0.0:8080".to_string(),
            request_timeout_secs: 30,
            max_body_size: 32 * 1024 * 1024,
        }
    }
}

/// Application settings.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ApplicationConfig {
    /// Show error details and stack frames on 500 pages.
    pub debug: bool,

    /// Directory that template and static paths are relative to.
    pub root: PathBuf,

    /// Template directory under `root`. `None` disables the default engine.
    pub template_dir: Option<String>,

    /// Static directory under `root`, also the URL prefix for assets.
    pub static_dir: String,

    /// Key material for secure cookies. Required.
    pub secret: String,
}

impl Default for ApplicationConfig {
    fn default() -> Self {
        Self {
            debug: false,
            root: PathBuf::from("."),
            template_dir: Some("templates".to_string()),
            static_dir: "static".to_string(),
            secret: String::new(),
        }
    }
}

/// Cookie names.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct CookieConfig {
    /// Encrypted session map (cookie backend).
    pub session: String,

    /// Opaque session ID (memory backend).
    pub session_id: String,

    /// Flash messages.
    pub flash: String,

    /// Xsrf token.
    pub xsrf: String,
}

impl Default for CookieConfig {
    fn default() -> Self {
        Self {
            session: "session".to_string(),
            session_id: "session_id".to_string(),
            flash: "msgs".to_string(),
            xsrf: "_xsrf".to_string(),
        }
    }
}

impl CookieConfig {
    pub fn names(&self) -> [(&'static str, &str); 4] {
        [
            ("session", self.session.as_str()),
            ("session_id", self.session_id.as_str()),
            ("flash", self.flash.as_str()),
            ("xsrf", self.xsrf.as_str()),
        ]
    }
}

/// Where session data lives.
#[derive(Debug, Clone, Copy, Deserialize, Serialize, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum SessionBackend {
    /// Whole map in an encrypted cookie.
    #[default]
    Cookie,
    /// In-process map keyed by an ID cookie.
    Memory,
}

/// Session settings.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct SessionConfig {
    pub backend: SessionBackend,

    /// Session cookie max-age in seconds; 0 lasts for the browser session.
    pub max_age_secs: i64,

    /// Memory backend: drop sessions idle for this long.
    pub idle_timeout_secs: u64,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            backend: SessionBackend::Cookie,
            max_age_secs: 0,
            idle_timeout_secs: 1800,
        }
    }
}

/// Observability settings.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ObservabilityConfig {
    /// Log level (trace, debug, info, warn, error).
    pub log_level: String,

    /// Enable metrics endpoint.
    pub metrics_enabled: bool,

    /// Metrics endpoint bind address.
    pub metrics_address: String,
}

impl Default for ObservabilityConfig {
    fn default() -> Self {
        Self {
            log_level: "info".to_string(),
            metrics_enabled: false,
            metrics_address: "0.0.0.0:9090".to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_minimal_config() {
        let config: AppConfig = toml::from_str(
            r#"
            [app]
            secret = "0123456789abcdef"
            "#,
        )
        .unwrap();
        assert_eq!(config.server.bind_address, "0.0.0.0:8080");
        assert_eq!(config.server.max_body_size, 32 * 1024 * 1024);
        assert_eq!(config.app.static_dir, "static");
        assert_eq!(config.app.template_dir.as_deref(), Some("templates"));
        assert_eq!(config.cookies.flash, "msgs");
        assert_eq!(config.session.backend, SessionBackend::Cookie);
    }

    #[test]
    fn test_full_config() {
        let config: AppConfig = toml::from_str(
            r#"
            [server]
            bind_address = "127.0.0.1:3000"
            request_timeout_secs = 5

            [app]
            debug = true
            root = "/srv/site"
            static_dir = "assets"
            secret = "0123456789abcdef"

            [cookies]
            session = "sid"

            [session]
            backend = "memory"
            max_age_secs = 86400
            idle_timeout_secs = 600

            [observability]
            log_level = "debug"
            metrics_enabled = true
            "#,
        )
        .unwrap();
        assert!(config.app.debug);
        assert_eq!(config.app.root, PathBuf::from("/srv/site"));
        assert_eq!(config.cookies.session, "sid");
        assert_eq!(config.cookies.xsrf, "_xsrf");
        assert_eq!(config.session.backend, SessionBackend::Memory);
        assert_eq!(config.session.max_age_secs, 86400);
        assert!(config.observability.metrics_enabled);
    }
}
