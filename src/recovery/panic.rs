//! Panic fallback for `CatchPanicLayer`.

use axum::body::Body;
use axum::http::{Response, StatusCode};
use std::any::Any;
use tower_http::catch_panic::ResponseForPanic;

use crate::observability::metrics;
use crate::recovery::{pages, trace};

/// Renders a panic as the built-in 500 page.
#[derive(Debug, Clone, Copy)]
pub struct PanicResponder {
    debug: bool,
}

impl PanicResponder {
    /// A debug responder installs the panic hook that records traces.
    pub fn new(debug: bool) -> Self {
        if debug {
            trace::enable_capture();
        }
        Self { debug }
    }
}

impl ResponseForPanic for PanicResponder {
    type ResponseBody = Body;

    fn response_for_panic(&mut self, err: Box<dyn Any + Send + 'static>) -> Response<Self::ResponseBody> {
        let message = panic_message(err.as_ref());
        tracing::error!(panic = %message, "Handler panicked");
        metrics::record_recovered("panic");
        // Always drained so a stale trace never shows on a later panic.
        let trace = trace::take_panic_trace();
        pages::default_response(
            StatusCode::INTERNAL_SERVER_ERROR,
            &format!("panic: {message}"),
            Some(&trace),
            self.debug,
        )
    }
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        (*s).to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "unknown panic payload".to_string()
    }
}
