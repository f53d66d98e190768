//! Template rendering.
//!
//! # Data Flow
//! ```text
//! RequestContext::render(name)
//!     → assigned data + flash + route + xsrf
//!     → TemplateEngine::render (engine.rs: Tera)
//!         → url(name=..., args=[...])   (reverse routing)
//!         → static_url(path=...)        (cache-busted asset URL)
//!     → HTML body
//! ```
//!
//! # Design Decisions
//! - Rendering sits behind a trait; Tera is the default engine
//! - Templates are loaded once at startup; a missing directory is fatal
//! - Reverse-routing mistakes render the error text in place of the URL

pub mod engine;

use serde_json::Value;
use std::path::PathBuf;
use thiserror::Error;

pub use engine::TeraTemplates;

#[derive(Debug, Error)]
pub enum TemplateError {
    #[error("no template engine is configured")]
    NotConfigured,

    #[error("template `{0}` not found")]
    NotFound(String),

    #[error("template directory `{}` does not exist", .0.display())]
    MissingDirectory(PathBuf),

    #[error("failed to load templates: {0}")]
    Load(String),

    #[error("failed to render `{name}`: {message}")]
    Render { name: String, message: String },
}

/// Renders a named template with a JSON data object.
pub trait TemplateEngine: Send + Sync {
    fn render(&self, name: &str, data: &Value) -> Result<String, TemplateError>;
}
