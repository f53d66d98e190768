//! Request decoding.
//!
//! # Responsibilities
//! - Read the request ID assigned by the middleware stack
//! - Merge query string and form body into one argument map
//! - Collect multipart uploads
//!
//! # Design Decisions
//! - Decoding happens once, before the handler is constructed
//! - Query arguments come first, body arguments are appended after them
//! - Body reads are bounded by the configured limit
//! - Malformed encodings are client errors (400), never panics

use axum::body::{Body, Bytes};
use axum::extract::{FromRequest, Multipart};
use axum::http::header::CONTENT_TYPE;
use axum::http::request::Parts;
use axum::http::{HeaderMap, Request};
use std::collections::HashMap;

use crate::dispatch::DispatchError;

/// Header carrying the request correlation ID.
pub const X_REQUEST_ID: &str = "x-request-id";

/// Request ID set by `SetRequestIdLayer`, if any.
pub fn request_id(headers: &HeaderMap) -> Option<String> {
    headers
        .get(X_REQUEST_ID)
        .and_then(|v| v.to_str().ok())
        .map(str::to_string)
}

/// Decoded query and form arguments. Keys may repeat.
#[derive(Debug, Clone, Default)]
pub struct FormData {
    values: HashMap<String, Vec<String>>,
}

impl FormData {
    pub fn new() -> Self {
        Self::default()
    }

    /// First value for `name`.
    pub fn get(&self, name: &str) -> Option<&str> {
        self.values
            .get(name)
            .and_then(|v| v.first())
            .map(String::as_str)
    }

    /// Every value for `name`, in arrival order.
    pub fn get_all(&self, name: &str) -> &[String] {
        self.values.get(name).map(Vec::as_slice).unwrap_or(&[])
    }

    pub fn insert(&mut self, name: impl Into<String>, value: impl Into<String>) {
        self.values.entry(name.into()).or_default().push(value.into());
    }

    pub fn contains(&self, name: &str) -> bool {
        self.values.contains_key(name)
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &[String])> {
        self.values.iter().map(|(k, v)| (k.as_str(), v.as_slice()))
    }

    fn extend_pairs(&mut self, pairs: Vec<(String, String)>) {
        for (name, value) in pairs {
            self.insert(name, value);
        }
    }
}

/// A file part from a `multipart/form-data` body.
#[derive(Debug, Clone)]
pub struct UploadedFile {
    pub field: String,
    pub filename: String,
    pub content_type: Option<String>,
    pub bytes: Bytes,
}

/// Everything decoded from a request before dispatch.
#[derive(Debug, Default)]
pub struct DecodedRequest {
    pub form: FormData,
    pub files: Vec<UploadedFile>,
    /// Raw body for content types that are not form encoded.
    pub body: Bytes,
}

/// Decode query string and body.
pub async fn decode(parts: &Parts, body: Body, limit: usize) -> Result<DecodedRequest, DispatchError> {
    let mut decoded = DecodedRequest::default();

    if let Some(query) = parts.uri.query() {
        let pairs: Vec<(String, String)> = serde_urlencoded::from_str(query)
            .map_err(|e| DispatchError::BadRequest(format!("malformed query string: {e}")))?;
        decoded.form.extend_pairs(pairs);
    }

    let content_type = parts
        .headers
        .get(CONTENT_TYPE)
        .and_then(|v| v.to_str().ok())
        .unwrap_or("")
        .to_ascii_lowercase();

    if content_type.starts_with("multipart/form-data") {
        read_multipart(parts, body, &mut decoded).await?;
        return Ok(decoded);
    }

    let bytes = axum::body::to_bytes(body, limit)
        .await
        .map_err(|e| DispatchError::BadRequest(format!("failed to read request body: {e}")))?;

    if content_type.starts_with("application/x-www-form-urlencoded") {
        let pairs: Vec<(String, String)> = serde_urlencoded::from_bytes(&bytes)
            .map_err(|e| DispatchError::BadRequest(format!("malformed form body: {e}")))?;
        decoded.form.extend_pairs(pairs);
    } else {
        decoded.body = bytes;
    }
    Ok(decoded)
}

async fn read_multipart(
    parts: &Parts,
    body: Body,
    decoded: &mut DecodedRequest,
) -> Result<(), DispatchError> {
    // Multipart needs the boundary header and the body-limit extension.
    let mut request = Request::new(body);
    *request.headers_mut() = parts.headers.clone();
    *request.extensions_mut() = parts.extensions.clone();

    let mut multipart = Multipart::from_request(request, &())
        .await
        .map_err(|e| DispatchError::BadRequest(e.body_text()))?;

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| DispatchError::BadRequest(e.body_text()))?
    {
        let name = field.name().unwrap_or_default().to_string();
        match field.file_name().map(str::to_string) {
            Some(filename) => {
                let content_type = field.content_type().map(str::to_string);
                let bytes = field
                    .bytes()
                    .await
                    .map_err(|e| DispatchError::BadRequest(e.body_text()))?;
                decoded.files.push(UploadedFile {
                    field: name,
                    filename,
                    content_type,
                    bytes,
                });
            }
            None => {
                let text = field
                    .text()
                    .await
                    .map_err(|e| DispatchError::BadRequest(e.body_text()))?;
                decoded.form.insert(name, text);
            }
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::Method;

    fn parts(uri: &str, content_type: Option<&str>) -> Parts {
        let mut builder = Request::builder().method(Method::POST).uri(uri);
        if let Some(ct) = content_type {
            builder = builder.header(CONTENT_TYPE, ct);
        }
        builder.body(()).unwrap().into_parts().0
    }

    #[tokio::test]
    async fn test_query_and_form_merged() {
        let parts = parts(
            "/search?q=rust&tag=a",
            Some("application/x-www-form-urlencoded"),
        );
        let decoded = decode(&parts, Body::from("tag=b&page=2"), 1024).await.unwrap();

        assert_eq!(decoded.form.get("q"), Some("rust"));
        assert_eq!(decoded.form.get_all("tag"), &["a".to_string(), "b".to_string()]);
        assert_eq!(decoded.form.get("page"), Some("2"));
        assert!(decoded.body.is_empty());
    }

    #[tokio::test]
    async fn test_plain_body_kept_raw() {
        let parts = parts("/api", Some("application/json"));
        let decoded = decode(&parts, Body::from(r#"{"a":1}"#), 1024).await.unwrap();
        assert!(decoded.form.is_empty());
        assert_eq!(&decoded.body[..], br#"{"a":1}"#);
    }

    #[tokio::test]
    async fn test_body_over_limit_rejected() {
        let parts = parts("/api", Some("text/plain"));
        let err = decode(&parts, Body::from("x".repeat(64)), 16).await.unwrap_err();
        assert!(matches!(err, DispatchError::BadRequest(_)));
    }

    #[tokio::test]
    async fn test_multipart_fields_and_files() {
        let body = "--XYZ\r\n\
            Content-Disposition: form-data; name=\"title\"\r\n\r\n\
            hello\r\n\
            --XYZ\r\n\
            Content-Disposition: form-data; name=\"doc\"; filename=\"a.txt\"\r\n\
            Content-Type: text/plain\r\n\r\n\
            file body\r\n\
            --XYZ--\r\n";
        let parts = parts("/upload", Some("multipart/form-data; boundary=XYZ"));
        let decoded = decode(&parts, Body::from(body), 1024).await.unwrap();

        assert_eq!(decoded.form.get("title"), Some("hello"));
        assert_eq!(decoded.files.len(), 1);
        assert_eq!(decoded.files[0].field, "doc");
        assert_eq!(decoded.files[0].filename, "a.txt");
        assert_eq!(decoded.files[0].content_type.as_deref(), Some("text/plain"));
        assert_eq!(&decoded.files[0].bytes[..], b"file body");
    }
}
