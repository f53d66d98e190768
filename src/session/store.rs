//! Session store backends.
//!
//! # Responsibilities
//! - Restore a [`Session`] from the request cookies
//! - Flush it back as response cookies (or server-side state)
//!
//! # Design Decisions
//! - Restore once at request start, flush once at the end
//! - Undecodable cookies reset to an empty session, never an error page
//! - The cookie store keeps the whole map client-side; the memory store
//!   (see `memory.rs`) keeps only an opaque ID in the cookie

use async_trait::async_trait;
use serde_json::{Map, Value};

use crate::http::cookies::CookieJar;
use crate::session::codec::SecureCookie;
use crate::session::state::{Session, SessionError};

/// Browsers drop cookies larger than this.
const MAX_COOKIE_BYTES: usize = 4096;

/// Storage for per-client session data.
#[async_trait]
pub trait SessionStore: Send + Sync {
    /// Restore the session for the client that sent `cookies`.
    async fn restore(&self, cookies: &CookieJar) -> Session;

    /// Persist `session`, queueing whatever cookies the client must keep.
    async fn flush(&self, session: &mut Session, cookies: &mut CookieJar) -> Result<(), SessionError>;

    /// Drop expired server-side state. Returns how many sessions were removed.
    async fn sweep(&self) -> usize {
        0
    }
}

/// Keeps the whole session map in one encrypted cookie.
#[derive(Debug, Clone)]
pub struct CookieSessionStore {
    codec: SecureCookie,
    cookie_name: String,
    max_age: i64,
}

impl CookieSessionStore {
    /// `max_age` 0 makes the cookie last for the browser session.
    pub fn new(codec: SecureCookie, cookie_name: impl Into<String>, max_age: i64) -> Self {
        Self {
            codec,
            cookie_name: cookie_name.into(),
            max_age,
        }
    }

    pub fn cookie_name(&self) -> &str {
        &self.cookie_name
    }
}

#[async_trait]
impl SessionStore for CookieSessionStore {
    async fn restore(&self, cookies: &CookieJar) -> Session {
        let Some(raw) = cookies.get(&self.cookie_name) else {
            return Session::new();
        };
        match self.codec.decode_json::<Map<String, Value>>(&self.cookie_name, raw) {
            Ok(data) => Session::restored(None, data),
            Err(error) => {
                tracing::debug!(cookie = %self.cookie_name, %error, "Resetting undecodable session");
                Session::new()
            }
        }
    }

    async fn flush(&self, session: &mut Session, cookies: &mut CookieJar) -> Result<(), SessionError> {
        let changed = !session.take_changes().is_empty();
        let purged = session.is_purged();
        session.clear_purge();

        if purged && !changed {
            cookies.remove(&self.cookie_name);
            return Ok(());
        }
        if !changed {
            return Ok(());
        }

        let json = serde_json::to_vec(session.data()).map_err(SessionError::Encode)?;
        let sealed = self.codec.seal(&self.cookie_name, &json)?;
        if sealed.len() > MAX_COOKIE_BYTES {
            tracing::warn!(
                cookie = %self.cookie_name,
                bytes = sealed.len(),
                "Session cookie exceeds browser size limit"
            );
        }
        cookies.set(&self.cookie_name, sealed, self.max_age);
        Ok(())
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use axum::http::header::{COOKIE, SET_COOKIE};
    use axum::http::{HeaderMap, HeaderValue};

    pub(crate) fn codec() -> SecureCookie {
        SecureCookie::new("test-secret-0123456789").unwrap()
    }

    /// Apply the response cookies to a new request, the way a browser would.
    pub(crate) fn next_request(jar: &CookieJar) -> CookieJar {
        let mut response = HeaderMap::new();
        jar.write_headers(&mut response);

        let pairs: Vec<String> = response
            .get_all(SET_COOKIE)
            .iter()
            .filter_map(|v| cookie::Cookie::parse(v.to_str().ok()?.to_string()).ok())
            .filter(|c| {
                let deleted = c.max_age().is_some_and(|age| age.is_negative());
                !deleted && !c.value().is_empty()
            })
            .map(|c| format!("{}={}", c.name(), c.value()))
            .collect();

        let mut request = HeaderMap::new();
        if !pairs.is_empty() {
            request.insert(COOKIE, HeaderValue::from_str(&pairs.join("; ")).unwrap());
        }
        CookieJar::from_headers(&request)
    }

    #[tokio::test]
    async fn test_round_trip_across_requests() {
        let store = CookieSessionStore::new(codec(), "session", 0);

        let mut jar = CookieJar::new();
        let mut session = store.restore(&jar).await;
        session.set("user", 7).unwrap();
        session.set("prefs", serde_json::json!({"theme": "dark"})).unwrap();
        store.flush(&mut session, &mut jar).await.unwrap();

        let jar = next_request(&jar);
        let session = store.restore(&jar).await;
        assert_eq!(session.get::<i64>("user"), Some(7));
        assert_eq!(session.get_value("prefs").unwrap()["theme"], "dark");
    }

    #[tokio::test]
    async fn test_unmodified_session_not_rewritten() {
        let store = CookieSessionStore::new(codec(), "session", 0);
        let mut jar = CookieJar::new();
        let mut session = store.restore(&jar).await;
        let _ = session.get::<i64>("user");
        store.flush(&mut session, &mut jar).await.unwrap();
        assert!(jar.pending("session").is_none());
    }

    #[tokio::test]
    async fn test_purge_deletes_cookie() {
        let store = CookieSessionStore::new(codec(), "session", 3600);
        let mut jar = CookieJar::new();
        let mut session = store.restore(&jar).await;
        session.set("user", 7).unwrap();
        store.flush(&mut session, &mut jar).await.unwrap();
        assert!(jar.pending("session").unwrap().to_string().contains("Max-Age=3600"));

        let mut jar = next_request(&jar);
        let mut session = store.restore(&jar).await;
        session.purge();
        store.flush(&mut session, &mut jar).await.unwrap();
        let pending = jar.pending("session").unwrap();
        assert_eq!(pending.value(), "");

        let jar = next_request(&jar);
        assert!(store.restore(&jar).await.is_empty());
    }

    #[tokio::test]
    async fn test_bad_cookie_resets() {
        let store = CookieSessionStore::new(codec(), "session", 0);
        let mut headers = HeaderMap::new();
        headers.insert(COOKIE, HeaderValue::from_static("session=garbage"));
        let session = store.restore(&CookieJar::from_headers(&headers)).await;
        assert!(session.is_empty());
    }
}
