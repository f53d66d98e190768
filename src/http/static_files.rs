//! Static asset serving.
//!
//! Paths under the static directory prefix, plus `/favicon.ico`, skip
//! routing and are served from disk relative to the application root.

use axum::body::Body;
use axum::http::Request;
use axum::response::{IntoResponse, Response};
use std::path::{Path, PathBuf};
use tower::ServiceExt;
use tower_http::services::ServeFile;

use crate::dispatch::DispatchError;
use crate::routing::matcher::{AnyMatcher, ExactMatcher, Matcher, PrefixMatcher};

pub const FAVICON_PATH: &str = "/favicon.ico";

/// Serves files for the static prefix and the favicon.
#[derive(Debug)]
pub struct StaticFiles {
    root: PathBuf,
    matcher: AnyMatcher,
}

impl StaticFiles {
    pub fn new(root: impl Into<PathBuf>, static_dir: &str) -> Self {
        let matcher = AnyMatcher::new(vec![
            Box::new(PrefixMatcher::new(format!("/{}", static_dir.trim_matches('/')))),
            Box::new(ExactMatcher::new(FAVICON_PATH)),
        ]);
        Self {
            root: root.into(),
            matcher,
        }
    }

    /// Whether `path` bypasses routing.
    pub fn matches(&self, path: &str) -> bool {
        self.matcher.matches(path)
    }

    /// Resolve a request path to a file under the root. Parent-directory
    /// segments never resolve.
    pub fn resolve(&self, path: &str) -> Option<PathBuf> {
        let relative = path.trim_start_matches('/');
        let escapes = relative
            .split(['/', '\\'])
            .any(|segment| segment == ".." || segment.contains(':'));
        if relative.is_empty() || escapes {
            return None;
        }
        Some(self.root.join(relative))
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Serve the file for `request`. A missing file is `NotFound`.
    pub async fn serve(&self, request: Request<Body>) -> Result<Response, DispatchError> {
        let file = self
            .resolve(request.uri().path())
            .ok_or(DispatchError::NotFound)?;

        match tokio::fs::metadata(&file).await {
            Ok(meta) if meta.is_file() => {}
            _ => {
                tracing::debug!(file = %file.display(), "Static file not found");
                return Err(DispatchError::NotFound);
            }
        }

        match ServeFile::new(&file).oneshot(request).await {
            Ok(response) => Ok(response.into_response()),
            Err(never) => match never {},
        }
    }
}
