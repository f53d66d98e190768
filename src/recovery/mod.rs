//! Error recovery subsystem.
//!
//! # Data Flow
//! ```text
//! Err(DispatchError) from dispatch
//!     → mod.rs (status from error kind, log, count)
//!     → custom handler for that status, if registered
//!     → else pages.rs built-in page (failure-site trace only in debug)
//!
//! panic in handler or filter
//!     → trace.rs panic hook records the panicking stack
//!     → tower_http CatchPanicLayer
//!     → panic.rs (500 page, same debug gating)
//! ```
//!
//! # Design Decisions
//! - Errors are values matched by kind, panics are a last resort
//! - Traces are taken where the error is raised, never at recovery time
//! - Production 500 pages never include error details

pub mod pages;
pub mod panic;
pub mod trace;

use axum::http::{Method, StatusCode};
use axum::response::Response;
use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use crate::dispatch::DispatchError;
use crate::observability::metrics;

pub use panic::PanicResponder;

/// What an error handler gets to see.
#[derive(Debug)]
pub struct ErrorInfo<'a> {
    pub status: StatusCode,
    pub method: &'a Method,
    pub path: &'a str,
    pub error: &'a DispatchError,
    pub debug: bool,
}

/// Custom page for one status code.
pub type ErrorHandler = Arc<dyn Fn(&ErrorInfo<'_>) -> Response + Send + Sync>;

/// Turns dispatch errors into responses.
#[derive(Clone, Default)]
pub struct Recovery {
    debug: bool,
    handlers: HashMap<StatusCode, ErrorHandler>,
}

impl Recovery {
    /// Debug recovery turns on failure-site tracing for the process.
    pub fn new(debug: bool) -> Self {
        if debug {
            trace::enable_capture();
        }
        Self {
            debug,
            handlers: HashMap::new(),
        }
    }

    pub fn with_handler(mut self, status: StatusCode, handler: ErrorHandler) -> Self {
        self.handlers.insert(status, handler);
        self
    }

    pub fn is_debug(&self) -> bool {
        self.debug
    }

    pub fn recover(&self, error: &DispatchError, method: &Method, path: &str) -> Response {
        let status = error.status();
        if status.is_server_error() {
            tracing::error!(method = %method, path = %path, error = %error, kind = error.kind(), "Request failed");
        } else {
            tracing::warn!(method = %method, path = %path, error = %error, status = status.as_u16(), "Request rejected");
        }
        metrics::record_recovered(error.kind());

        match self.handlers.get(&status) {
            Some(handler) => {
                let info = ErrorInfo {
                    status,
                    method,
                    path,
                    error,
                    debug: self.debug,
                };
                let mut response = handler(&info);
                *response.status_mut() = status;
                response
            }
            None => pages::default_response(status, &error.to_string(), error.trace(), self.debug),
        }
    }
}

impl fmt::Debug for Recovery {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Recovery")
            .field("debug", &self.debug)
            .field("handlers", &self.handlers.keys().collect::<Vec<_>>())
            .finish()
    }
}
