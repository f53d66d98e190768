//! Shared utilities for integration tests.

#![allow(dead_code)]

use axum::body::Body;
use axum::http::header::{COOKIE, SET_COOKIE};
use axum::http::{Request, Response};
use std::net::SocketAddr;
use std::time::Duration;
use tokio::net::TcpListener;
use tower::ServiceExt;

use cinder::config::AppConfig;
use cinder::{App, HttpServer, Shutdown};

pub const SECRET: &str = "integration-test-secret-0123456789";

/// Config with a valid secret and no template directory.
pub fn test_config() -> AppConfig {
    let mut config = AppConfig::default();
    config.app.secret = SECRET.to_string();
    config.app.template_dir = None;
    config.server.bind_address = "127.0.0.1:0".to_string();
    config
}

/// Send one request through the fully layered router.
pub async fn send(server: &HttpServer, request: Request<Body>) -> Response<Body> {
    server.router().oneshot(request).await.unwrap()
}

pub fn get(uri: &str) -> Request<Body> {
    Request::builder().uri(uri).body(Body::empty()).unwrap()
}

pub async fn body_string(response: Response<Body>) -> String {
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    String::from_utf8(bytes.to_vec()).unwrap()
}

/// `Cookie` header a browser would send after receiving `response`,
/// merged over `previous`. Deleted cookies are dropped.
pub fn carry_cookies<B>(previous: &str, response: &Response<B>) -> String {
    let mut jar: Vec<(String, String)> = previous
        .split("; ")
        .filter_map(|pair| pair.split_once('='))
        .map(|(k, v)| (k.to_string(), v.to_string()))
        .collect();

    for header in response.headers().get_all(SET_COOKIE) {
        let header = header.to_str().unwrap();
        let cookie = cookie::Cookie::parse(header.to_string()).unwrap();
        jar.retain(|(name, _)| name != cookie.name());
        let expired = cookie
            .max_age()
            .is_some_and(|age| age.is_negative() || age.is_zero());
        if !expired && !cookie.value().is_empty() {
            jar.push((cookie.name().to_string(), cookie.value().to_string()));
        }
    }

    jar.iter()
        .map(|(k, v)| format!("{k}={v}"))
        .collect::<Vec<_>>()
        .join("; ")
}

pub fn get_with_cookies(uri: &str, cookies: &str) -> Request<Body> {
    Request::builder()
        .uri(uri)
        .header(COOKIE, cookies)
        .body(Body::empty())
        .unwrap()
}

/// Serve `app` on an ephemeral port. Returns the bound address and the
/// shutdown coordinator.
pub async fn spawn(app: App) -> (SocketAddr, Shutdown) {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    let shutdown = Shutdown::new();
    let server = HttpServer::new(app);
    let rx = shutdown.subscribe();

    tokio::spawn(async move {
        let _ = server.run(listener, rx).await;
    });

    tokio::time::sleep(Duration::from_millis(50)).await;
    (addr, shutdown)
}

pub fn client() -> reqwest::Client {
    reqwest::Client::builder()
        .cookie_store(true)
        .no_proxy()
        .redirect(reqwest::redirect::Policy::none())
        .build()
        .unwrap()
}
