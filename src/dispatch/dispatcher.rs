//! Per-request dispatch sequence.
//!
//! # Responsibilities
//! - Serve static paths directly from disk
//! - Match the route, decode the request, build the context
//! - Run the handler lifecycle around the filter chain
//! - Hand every failure to the recovery layer
//!
//! # Design Decisions
//! - Each step returns `Result`; the first error aborts the rest
//! - One handler instance per request, built from the route's factory
//! - Session and flash are flushed after the after-filters and before the
//!   handler's finish hook

use axum::body::Body;
use axum::http::Request;
use axum::response::Response;
use std::sync::Arc;
use std::time::Instant;

use crate::application::App;
use crate::dispatch::filter::{run_after, run_before};
use crate::dispatch::handler::invoke;
use crate::dispatch::{DispatchError, RequestContext};
use crate::http::request;
use crate::observability::metrics;
use crate::routing::RouteGroup;

/// Metrics label for requests that never reached a route.
const UNMATCHED: &str = "none";
const STATIC: &str = "static";

/// Entry point for every request that reaches the application.
pub async fn dispatch(app: Arc<App>, request: Request<Body>) -> Response {
    let started = Instant::now();
    let method = request.method().clone();
    let path = request.uri().path().to_string();
    let request_id = request::request_id(request.headers()).unwrap_or_else(|| "unknown".to_string());

    tracing::debug!(
        request_id = %request_id,
        method = %method,
        path = %path,
        "Dispatching request"
    );

    let mut route = UNMATCHED.to_string();
    let outcome = if app.statics().matches(&path) {
        route = STATIC.to_string();
        app.statics().serve(request).await
    } else {
        handle(&app, request, &mut route).await
    };

    let response = match outcome {
        Ok(response) => response,
        Err(error) => app.recovery().recover(&error, &method, &path),
    };

    let status = response.status().as_u16();
    metrics::record_request(method.as_str(), status, &route, started);
    tracing::debug!(
        request_id = %request_id,
        route = %route,
        status,
        elapsed_ms = started.elapsed().as_millis() as u64,
        "Request complete"
    );
    response
}

async fn handle(app: &Arc<App>, request: Request<Body>, label: &mut String) -> Result<Response, DispatchError> {
    let router = app.router();

    // 1. Match route and extract params
    let matched = router
        .match_path(request.uri().path())
        .ok_or(DispatchError::NotFound)?;
    *label = match matched.group_name {
        Some(group) => format!("{group}.{}", matched.route.name()),
        None => matched.route.name().to_string(),
    };

    // 2. Decode query and body
    let (parts, body) = request.into_parts();
    let decoded = request::decode(&parts, body, app.config().server.max_body_size).await?;

    // 3. Build context and handler
    let mut ctx = RequestContext::new(app.clone(), parts, decoded, &matched).await;
    let mut handler = matched.route.instantiate();
    handler.initialize(&mut ctx).await?;

    let group_before = matched.group.map(RouteGroup::before_filters).unwrap_or_default();
    let group_after = matched.group.map(RouteGroup::after_filters).unwrap_or_default();

    // 4. Before-filters, action, after-filters
    run_before(router.before_filters(), group_before, &mut ctx)?;
    if !ctx.is_finished() {
        invoke(handler.as_mut(), &mut ctx, &matched.params).await?;
    }
    run_after(group_after, router.after_filters(), &mut ctx)?;

    // 5. Persist state, then let the handler close out
    ctx.flush_state().await?;
    handler.finish(&mut ctx).await;

    Ok(ctx.into_response())
}
