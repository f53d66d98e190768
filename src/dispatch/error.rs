//! Request-time failures.

use axum::http::{Method, StatusCode};
use thiserror::Error;

use crate::recovery::trace::Trace;
use crate::session::{CodecError, SessionError};
use crate::template::TemplateError;

/// Everything that can abort a request after the application is built.
///
/// Values propagate with `?` up to the recovery layer, which picks the
/// error page from [`DispatchError::status`]. Server-side failures carry
/// the [`Trace`] of the place they were raised.
#[derive(Debug, Error)]
pub enum DispatchError {
    #[error("not found")]
    NotFound,

    #[error("{method} method not implemented")]
    MethodNotImplemented { method: Method, trace: Trace },

    #[error("bad request: {0}")]
    BadRequest(String),

    #[error("forbidden: {0}")]
    Forbidden(String),

    #[error("{source}")]
    Template { source: TemplateError, trace: Trace },

    #[error("{source}")]
    Session { source: SessionError, trace: Trace },

    #[error("{source}")]
    Codec { source: CodecError, trace: Trace },

    #[error("{message}")]
    Internal { message: String, trace: Trace },

    #[error("{source}")]
    Handler {
        source: Box<dyn std::error::Error + Send + Sync>,
        trace: Trace,
    },
}

impl DispatchError {
    /// Wrap any error raised by application code.
    pub fn handler<E>(error: E) -> Self
    where
        E: std::error::Error + Send + Sync + 'static,
    {
        Self::from(Box::new(error) as Box<dyn std::error::Error + Send + Sync>)
    }

    pub fn internal(message: impl Into<String>) -> Self {
        Self::Internal {
            message: message.into(),
            trace: Trace::capture(),
        }
    }

    pub fn method_not_implemented(method: Method) -> Self {
        Self::MethodNotImplemented {
            method,
            trace: Trace::capture(),
        }
    }

    pub fn status(&self) -> StatusCode {
        match self {
            Self::NotFound => StatusCode::NOT_FOUND,
            Self::BadRequest(_) => StatusCode::BAD_REQUEST,
            Self::Forbidden(_) => StatusCode::FORBIDDEN,
            Self::MethodNotImplemented { .. }
            | Self::Template { .. }
            | Self::Session { .. }
            | Self::Codec { .. }
            | Self::Internal { .. }
            | Self::Handler { .. } => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Short label for logs and metrics.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::NotFound => "not_found",
            Self::MethodNotImplemented { .. } => "method_not_implemented",
            Self::BadRequest(_) => "bad_request",
            Self::Forbidden(_) => "forbidden",
            Self::Template { .. } => "template",
            Self::Session { .. } | Self::Codec { .. } => "session",
            Self::Internal { .. } => "internal",
            Self::Handler { .. } => "handler",
        }
    }

    /// Where the failure was raised; empty unless debug capturing is on.
    pub fn trace(&self) -> Option<&Trace> {
        match self {
            Self::NotFound | Self::BadRequest(_) | Self::Forbidden(_) => None,
            Self::MethodNotImplemented { trace, .. }
            | Self::Template { trace, .. }
            | Self::Session { trace, .. }
            | Self::Codec { trace, .. }
            | Self::Internal { trace, .. }
            | Self::Handler { trace, .. } => Some(trace),
        }
    }
}

impl From<TemplateError> for DispatchError {
    fn from(source: TemplateError) -> Self {
        Self::Template {
            source,
            trace: Trace::capture(),
        }
    }
}

impl From<SessionError> for DispatchError {
    fn from(source: SessionError) -> Self {
        Self::Session {
            source,
            trace: Trace::capture(),
        }
    }
}

impl From<CodecError> for DispatchError {
    fn from(source: CodecError) -> Self {
        Self::Codec {
            source,
            trace: Trace::capture(),
        }
    }
}

impl From<Box<dyn std::error::Error + Send + Sync>> for DispatchError {
    fn from(source: Box<dyn std::error::Error + Send + Sync>) -> Self {
        Self::Handler {
            source,
            trace: Trace::capture(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::recovery::trace;

    #[test]
    fn test_status_mapping() {
        assert_eq!(DispatchError::NotFound.status(), StatusCode::NOT_FOUND);
        assert_eq!(
            DispatchError::method_not_implemented(Method::POST).status(),
            StatusCode::INTERNAL_SERVER_ERROR
        );
        assert_eq!(DispatchError::Forbidden("x".into()).status(), StatusCode::FORBIDDEN);
        assert_eq!(
            DispatchError::from(TemplateError::NotConfigured).status(),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }

    #[test]
    fn test_method_message() {
        let err = DispatchError::method_not_implemented(Method::POST);
        assert_eq!(err.to_string(), "POST method not implemented");
    }

    #[test]
    fn test_wrap_handler_error() {
        let io = std::io::Error::new(std::io::ErrorKind::Other, "disk on fire");
        let err = DispatchError::handler(io);
        assert_eq!(err.kind(), "handler");
        assert_eq!(err.to_string(), "disk on fire");
    }

    fn raise_template_error() -> Result<(), DispatchError> {
        Err::<(), _>(TemplateError::NotConfigured)?;
        Ok(())
    }

    #[test]
    fn test_trace_points_at_raise_site() {
        trace::enable_capture();
        let err = raise_template_error().unwrap_err();
        let frames = err.trace().unwrap().frames();
        assert!(frames[0].contains("raise_template_error"));
        assert!(frames.iter().all(|f| !f.contains("DispatchError as")));
        assert!(DispatchError::NotFound.trace().is_none());
    }
}
