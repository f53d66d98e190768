//! Before/after filters.
//!
//! Filters nest around the handler like brackets: global before, group
//! before, action, group after, global after. A before-filter that
//! finishes the response skips the remaining before-filters and the
//! action; after-filters always run.

use axum::http::Method;
use std::fmt;
use std::sync::Arc;

use crate::dispatch::{DispatchError, RequestContext};

type FilterFn = dyn Fn(&mut RequestContext) -> Result<(), DispatchError> + Send + Sync;

/// A shareable filter function.
#[derive(Clone)]
pub struct Filter(Arc<FilterFn>);

impl Filter {
    pub fn new<F>(filter: F) -> Self
    where
        F: Fn(&mut RequestContext) -> Result<(), DispatchError> + Send + Sync + 'static,
    {
        Self(Arc::new(filter))
    }

    pub fn apply(&self, ctx: &mut RequestContext) -> Result<(), DispatchError> {
        (self.0)(ctx)
    }
}

impl fmt::Debug for Filter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("Filter")
    }
}

pub(crate) fn run_before(global: &[Filter], group: &[Filter], ctx: &mut RequestContext) -> Result<(), DispatchError> {
    for filter in global.iter().chain(group) {
        if ctx.is_finished() {
            tracing::debug!(route = %ctx.route_name(), "Response finished by filter, skipping the rest");
            break;
        }
        filter.apply(ctx)?;
    }
    Ok(())
}

pub(crate) fn run_after(group: &[Filter], global: &[Filter], ctx: &mut RequestContext) -> Result<(), DispatchError> {
    for filter in group.iter().chain(global) {
        filter.apply(ctx)?;
    }
    Ok(())
}

/// Before-filter rejecting state-changing requests without a valid xsrf
/// token.
pub fn require_xsrf(ctx: &mut RequestContext) -> Result<(), DispatchError> {
    let unsafe_method = matches!(
        *ctx.method(),
        Method::POST | Method::PUT | Method::PATCH | Method::DELETE
    );
    if unsafe_method && !ctx.verify_xsrf() {
        tracing::warn!(path = %ctx.path(), method = %ctx.method(), "Rejected request with bad xsrf token");
        return Err(DispatchError::Forbidden("xsrf token missing or invalid".to_string()));
    }
    Ok(())
}
