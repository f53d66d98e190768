//! Configuration loading from disk.

use std::fs;
use std::path::Path;
use thiserror::Error;

use crate::config::schema::AppConfig;
use crate::config::validation::{validate_config, ValidationError};
use crate::routing::RoutingError;
use crate::session::CodecError;
use crate::template::TemplateError;

/// Environment variable that overrides `app.secret`.
pub const SECRET_ENV: &str = "CINDER_SECRET";

/// Fatal startup errors.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Parse error: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("Validation failed: {}", join_errors(.0))]
    Validation(Vec<ValidationError>),

    #[error("Routing error: {0}")]
    Routing(#[from] RoutingError),

    #[error("Template error: {0}")]
    Templates(#[from] TemplateError),

    #[error("Secret error: {0}")]
    Secret(#[from] CodecError),
}

fn join_errors(errors: &[ValidationError]) -> String {
    errors
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join(", ")
}

/// Load and validate configuration from a TOML file.
pub fn load_config(path: &Path) -> Result<AppConfig, ConfigError> {
    let content = fs::read_to_string(path)?;
    let mut config: AppConfig = toml::from_str(&content)?;

    apply_env_overrides(&mut config);
    validate_config(&config).map_err(ConfigError::Validation)?;

    Ok(config)
}

/// Let the environment supply the secret so it stays out of config files.
pub fn apply_env_overrides(config: &mut AppConfig) {
    if let Ok(secret) = std::env::var(SECRET_ENV) {
        if !secret.is_empty() {
            config.app.secret = secret;
        }
    }
}
