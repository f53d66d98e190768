//! Response assembly.
//!
//! # Responsibilities
//! - Hold status, headers and body while filters and handlers write to them
//! - Map short content kinds to `Content-Type` values
//! - Convert the accumulated state into an axum `Response`
//!
//! # Design Decisions
//! - Bodies are buffered; handlers render pages, not streams
//! - `finished` marks a response as complete so later stages can skip work
//! - Cookies are written last, by the context that owns the jar

use axum::body::Body;
use axum::http::header::{HeaderName, CONNECTION, CONTENT_TYPE, LOCATION};
use axum::http::{HeaderMap, HeaderValue, StatusCode};
use axum::response::Response;

/// Value of the `Server` header on every response.
pub const SERVER_NAME: &str = concat!("Cinder/", env!("CARGO_PKG_VERSION"));

/// `Content-Type` for a short kind such as `html`, `json` or `text`.
/// Anything else is treated as an `application/*` subtype.
pub fn content_type_for(kind: &str) -> String {
    match kind {
        "html" => "text/html; charset=utf-8".to_string(),
        "text" | "plain" => "text/plain; charset=utf-8".to_string(),
        "json" => "application/json; charset=utf-8".to_string(),
        other => format!("application/{other}; charset=utf-8"),
    }
}

/// Response under construction.
#[derive(Debug)]
pub struct ResponseState {
    status: StatusCode,
    headers: HeaderMap,
    body: Vec<u8>,
    finished: bool,
}

impl Default for ResponseState {
    fn default() -> Self {
        Self::new()
    }
}

impl ResponseState {
    pub fn new() -> Self {
        Self {
            status: StatusCode::OK,
            headers: HeaderMap::new(),
            body: Vec::new(),
            finished: false,
        }
    }

    pub fn status(&self) -> StatusCode {
        self.status
    }

    pub fn set_status(&mut self, status: StatusCode) {
        self.status = status;
    }

    pub fn headers(&self) -> &HeaderMap {
        &self.headers
    }

    pub fn headers_mut(&mut self) -> &mut HeaderMap {
        &mut self.headers
    }

    pub fn set_header(&mut self, name: HeaderName, value: HeaderValue) {
        self.headers.insert(name, value);
    }

    pub fn set_content_type(&mut self, kind: &str) {
        if let Ok(value) = HeaderValue::from_str(&content_type_for(kind)) {
            self.headers.insert(CONTENT_TYPE, value);
        }
    }

    /// Append to the body.
    pub fn write(&mut self, chunk: impl AsRef<[u8]>) {
        self.body.extend_from_slice(chunk.as_ref());
    }

    /// Replace the body.
    pub fn set_body(&mut self, body: impl AsRef<[u8]>) {
        self.body.clear();
        self.body.extend_from_slice(body.as_ref());
    }

    pub fn body(&self) -> &[u8] {
        &self.body
    }

    /// Point the client elsewhere: 301 when `permanent`, 302 otherwise.
    pub fn redirect(&mut self, location: &str, permanent: bool) -> Result<(), axum::http::header::InvalidHeaderValue> {
        let value = HeaderValue::from_str(location)?;
        self.status = if permanent {
            StatusCode::MOVED_PERMANENTLY
        } else {
            StatusCode::FOUND
        };
        self.headers.insert(LOCATION, value);
        self.body.clear();
        self.finished = true;
        Ok(())
    }

    pub fn close_connection(&mut self) {
        self.headers.insert(CONNECTION, HeaderValue::from_static("close"));
    }

    pub fn finish(&mut self) {
        self.finished = true;
    }

    pub fn is_finished(&self) -> bool {
        self.finished
    }

    pub fn into_response(self) -> Response {
        let mut response = Response::new(Body::from(self.body));
        *response.status_mut() = self.status;
        *response.headers_mut() = self.headers;
        response
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_content_types() {
        assert_eq!(content_type_for("html"), "text/html; charset=utf-8");
        assert_eq!(content_type_for("json"), "application/json; charset=utf-8");
        assert_eq!(content_type_for("text"), "text/plain; charset=utf-8");
        assert_eq!(content_type_for("xml"), "application/xml; charset=utf-8");
    }

    #[test]
    fn test_write_appends_set_body_replaces() {
        let mut state = ResponseState::new();
        state.write("a");
        state.write("b");
        assert_eq!(state.body(), b"ab");
        state.set_body("c");
        assert_eq!(state.body(), b"c");
    }

    #[test]
    fn test_redirect() {
        let mut state = ResponseState::new();
        state.write("ignored");
        state.redirect("/login", false).unwrap();
        assert!(state.is_finished());

        let response = state.into_response();
        assert_eq!(response.status(), StatusCode::FOUND);
        assert_eq!(response.headers()[LOCATION], "/login");

        let mut state = ResponseState::new();
        state.redirect("/new", true).unwrap();
        assert_eq!(state.status(), StatusCode::MOVED_PERMANENTLY);
    }
}
