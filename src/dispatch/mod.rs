//! Request dispatch subsystem.
//!
//! # Data Flow
//! ```text
//! axum fallback
//!     → dispatcher.rs
//!         static prefix? → http::static_files (disk)
//!         → routing::Router::match_path
//!         → http::request::decode (query + body)
//!         → context.rs (cookies, session, flash restored)
//!         → handler.rs initialize
//!         → filter.rs before (global, then group)
//!         → handler.rs get/post/...
//!         → filter.rs after (group, then global)
//!         → context.rs flush (session, flash, xsrf cookies)
//!         → handler.rs finish
//!     → Response
//!
//! Any Err(DispatchError) → recovery (404 / 500 page)
//! ```
//!
//! # Design Decisions
//! - Verbs are trait methods, not names looked up at runtime
//! - Failures are values, the recovery layer matches on their kind
//! - Handlers are built per request and never shared

pub mod context;
pub mod dispatcher;
pub mod error;
pub mod filter;
pub mod handler;

pub use context::RequestContext;
pub use dispatcher::dispatch;
pub use error::DispatchError;
pub use filter::{require_xsrf, Filter};
pub use handler::{Handler, HandlerResult};
