//! HTTP server setup and configuration.
//!
//! # Responsibilities
//! - Create the axum router with a single fallback into the dispatcher
//! - Wire up middleware (request ID, tracing, timeout, limits, compression,
//!   panic recovery, Server header)
//! - Bind the server to a listener and shut down gracefully
//! - Sweep expired server-side sessions in the background

use axum::body::Body;
use axum::extract::{DefaultBodyLimit, State};
use axum::http::header::SERVER;
use axum::http::{HeaderValue, Request};
use axum::response::Response;
use std::sync::Arc;
use std::time::Duration;
use tokio::net::TcpListener;
use tokio::sync::broadcast;
use tower_http::catch_panic::CatchPanicLayer;
use tower_http::compression::CompressionLayer;
use tower_http::limit::RequestBodyLimitLayer;
use tower_http::request_id::{MakeRequestUuid, PropagateRequestIdLayer, SetRequestIdLayer};
use tower_http::set_header::SetResponseHeaderLayer;
use tower_http::timeout::TimeoutLayer;
use tower_http::trace::TraceLayer;

use crate::application::App;
use crate::dispatch;
use crate::http::response::SERVER_NAME;
use crate::recovery::PanicResponder;

/// How often expired sessions are swept.
const SWEEP_INTERVAL: Duration = Duration::from_secs(60);

/// HTTP server for an application.
pub struct HttpServer {
    router: axum::Router,
    app: Arc<App>,
}

impl HttpServer {
    pub fn new(app: App) -> Self {
        let app = Arc::new(app);
        let router = Self::build_router(app.clone());
        Self { router, app }
    }

    /// Build the axum router with all middleware layers.
    #[allow(deprecated)]
    fn build_router(app: Arc<App>) -> axum::Router {
        let server = &app.config().server;
        let body_limit = server.max_body_size;
        let timeout = Duration::from_secs(server.request_timeout_secs);
        let debug = app.config().app.debug;

        axum::Router::new()
            .fallback(dispatch_handler)
            .with_state(app)
            .layer(CatchPanicLayer::custom(PanicResponder::new(debug)))
            .layer(CompressionLayer::new())
            .layer(DefaultBodyLimit::max(body_limit))
            .layer(RequestBodyLimitLayer::new(body_limit))
            .layer(TimeoutLayer::new(timeout))
            .layer(PropagateRequestIdLayer::x_request_id())
            .layer(TraceLayer::new_for_http())
            .layer(SetRequestIdLayer::x_request_id(MakeRequestUuid))
            // Outermost, so responses made by the layers above carry it too.
            .layer(SetResponseHeaderLayer::overriding(
                SERVER,
                HeaderValue::from_static(SERVER_NAME),
            ))
    }

    /// The fully layered router, for in-process requests.
    pub fn router(&self) -> axum::Router {
        self.router.clone()
    }

    pub fn app(&self) -> &Arc<App> {
        &self.app
    }

    /// Run the server until `shutdown` fires.
    pub async fn run(self, listener: TcpListener, mut shutdown: broadcast::Receiver<()>) -> Result<(), std::io::Error> {
        let addr = listener.local_addr()?;
        tracing::info!(address = %addr, "HTTP server starting");

        let sweeper = tokio::spawn(sweep_sessions(self.app.clone(), shutdown.resubscribe()));

        axum::serve(listener, self.router.into_make_service())
            .with_graceful_shutdown(async move {
                let _ = shutdown.recv().await;
                tracing::info!("Shutdown signal received, draining connections");
            })
            .await?;

        sweeper.abort();
        tracing::info!("HTTP server stopped");
        Ok(())
    }
}

async fn dispatch_handler(State(app): State<Arc<App>>, request: Request<Body>) -> Response {
    dispatch::dispatch(app, request).await
}

async fn sweep_sessions(app: Arc<App>, mut shutdown: broadcast::Receiver<()>) {
    let mut interval = tokio::time::interval(SWEEP_INTERVAL);
    interval.tick().await;
    loop {
        tokio::select! {
            _ = interval.tick() => {
                app.sessions().sweep().await;
            }
            _ = shutdown.recv() => break,
        }
    }
}
