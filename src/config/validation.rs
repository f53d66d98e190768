//! Configuration validation.
//!
//! # Responsibilities
//! - Semantic validation (serde handles syntactic)
//! - Enforce the secret length needed by the cookie cipher
//! - Validate value ranges (timeouts > 0, body limit > 0)
//! - Detect empty or colliding cookie names
//!
//! # Design Decisions
//! - Returns all validation errors, not just first
//! - Validation is pure function: AppConfig → Result<(), Vec<ValidationError>>
//! - Runs before config is accepted into the system

use std::collections::HashMap;
use std::net::SocketAddr;
use thiserror::Error;

use crate::config::schema::AppConfig;
use crate::session::codec::MIN_SECRET_LEN;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("app.secret is required")]
    MissingSecret,

    #[error("app.secret must be at least {min} bytes, got {actual}")]
    SecretTooShort { min: usize, actual: usize },

    #[error("server.bind_address `{0}` is not a socket address")]
    InvalidBindAddress(String),

    #[error("server.request_timeout_secs must be greater than zero")]
    ZeroTimeout,

    #[error("server.max_body_size must be greater than zero")]
    ZeroBodyLimit,

    #[error("app.static_dir must not be empty")]
    EmptyStaticDir,

    #[error("cookies.{field} must not be empty")]
    EmptyCookieName { field: &'static str },

    #[error("cookies.{first} and cookies.{second} share the name `{name}`")]
    CookieNameCollision {
        first: &'static str,
        second: &'static str,
        name: String,
    },
}

pub fn validate_config(config: &AppConfig) -> Result<(), Vec<ValidationError>> {
    let mut errors = Vec::new();

    let secret = &config.app.secret;
    if secret.is_empty() {
        errors.push(ValidationError::MissingSecret);
    } else if secret.len() < MIN_SECRET_LEN {
        errors.push(ValidationError::SecretTooShort {
            min: MIN_SECRET_LEN,
            actual: secret.len(),
        });
    }

    if config.server.bind_address.parse::<SocketAddr>().is_err() {
        errors.push(ValidationError::InvalidBindAddress(
            config.server.bind_address.clone(),
        ));
    }
    if config.server.request_timeout_secs == 0 {
        errors.push(ValidationError::ZeroTimeout);
    }
    if config.server.max_body_size == 0 {
        errors.push(ValidationError::ZeroBodyLimit);
    }
    if config.app.static_dir.trim_matches('/').is_empty() {
        errors.push(ValidationError::EmptyStaticDir);
    }

    let mut seen: HashMap<&str, &'static str> = HashMap::new();
    for (field, name) in config.cookies.names() {
        if name.is_empty() {
            errors.push(ValidationError::EmptyCookieName { field });
            continue;
        }
        if let Some(first) = seen.insert(name, field) {
            errors.push(ValidationError::CookieNameCollision {
                first,
                second: field,
                name: name.to_string(),
            });
        }
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn valid() -> AppConfig {
        let mut config = AppConfig::default();
        config.app.secret = "0123456789abcdef".to_string();
        config
    }

    #[test]
    fn test_valid_config() {
        assert!(validate_config(&valid()).is_ok());
    }

    #[test]
    fn test_missing_secret() {
        let errors = validate_config(&AppConfig::default()).unwrap_err();
        assert_eq!(errors, vec![ValidationError::MissingSecret]);
    }

    #[test]
    fn test_reports_every_problem() {
        let mut config = valid();
        config.app.secret = "short".to_string();
        config.server.bind_address = "not-an-address".to_string();
        config.server.request_timeout_secs = 0;
        config.app.static_dir = "/".to_string();

        let errors = validate_config(&config).unwrap_err();
        assert_eq!(errors.len(), 4);
        assert!(errors.contains(&ValidationError::SecretTooShort { min: 16, actual: 5 }));
        assert!(errors.contains(&ValidationError::ZeroTimeout));
        assert!(errors.contains(&ValidationError::EmptyStaticDir));
    }

    #[test]
    fn test_cookie_names() {
        let mut config = valid();
        config.cookies.flash = config.cookies.session.clone();
        config.cookies.xsrf = String::new();

        let errors = validate_config(&config).unwrap_err();
        assert!(errors.contains(&ValidationError::EmptyCookieName { field: "xsrf" }));
        assert!(errors.contains(&ValidationError::CookieNameCollision {
            first: "session",
            second: "flash",
            name: "session".to_string(),
        }));
    }
}
