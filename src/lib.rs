//! Cinder: a small web application framework on Tokio and Axum.
//!
//! # Architecture Overview
//!
//! ```text
//!     Client Request
//!     ───────────────▶ http::server (request ID, trace, timeout, limits, panic catch)
//!                          │
//!                          ▼
//!                      dispatch::dispatcher
//!                          │  static path? ──▶ http::static_files
//!                          ▼
//!                      routing (groups, longest prefix first; top-level routes if no prefix matched)
//!                          │
//!                          ▼
//!                      RequestContext (form data + validation, cookies, session, flash, xsrf)
//!                          │
//!                          ▼
//!                      global before → group before → Handler → group after → global after
//!                          │
//!                          ▼
//!                      session + flash flush, Set-Cookie, buffered response
//!     ◀───────────────     │
//!     Client Response      └─ errors ──▶ recovery (custom handler or default page)
//! ```
//!
//! Cross-cutting: `config` (TOML + validation), `observability` (tracing,
//! Prometheus), `lifecycle` (signals, graceful shutdown), `template` (Tera).

// Core subsystems
pub mod application;
pub mod config;
pub mod dispatch;
pub mod http;
pub mod routing;

// Per-request state
pub mod form;
pub mod session;
pub mod template;

// Cross-cutting concerns
pub mod lifecycle;
pub mod observability;
pub mod recovery;

pub use application::{App, Application};
pub use config::{load_config, AppConfig, ConfigError};
pub use dispatch::{DispatchError, Filter, Handler, HandlerResult, RequestContext};
pub use form::{Field, Form};
pub use http::HttpServer;
pub use lifecycle::Shutdown;
pub use recovery::{ErrorInfo, Recovery};
pub use routing::{ParamValue, Params, RouteGroup};
pub use session::{Session, SessionStore};
pub use template::{TemplateEngine, TemplateError};
