//! Request cookies in, `Set-Cookie` headers out.

use axum::http::header::{COOKIE, SET_COOKIE};
use axum::http::{HeaderMap, HeaderValue};
use cookie::time::Duration;
use cookie::Cookie;
use std::collections::HashMap;

use crate::session::codec::{CodecError, SecureCookie};

/// Cookies sent by the client plus the cookies queued for the response.
///
/// Setting a cookie that is already queued replaces the queued one, so the
/// last write for a name wins.
#[derive(Debug, Clone, Default)]
pub struct CookieJar {
    incoming: HashMap<String, String>,
    outgoing: Vec<Cookie<'static>>,
}

impl CookieJar {
    pub fn new() -> Self {
        Self::default()
    }

    /// Parse every `Cookie` header. Malformed pairs are skipped.
    pub fn from_headers(headers: &HeaderMap) -> Self {
        let mut incoming = HashMap::new();
        for value in headers.get_all(COOKIE) {
            let Ok(raw) = value.to_str() else {
                continue;
            };
            for cookie in Cookie::split_parse(raw).flatten() {
                incoming.insert(cookie.name().to_string(), cookie.value().to_string());
            }
        }
        Self {
            incoming,
            outgoing: Vec::new(),
        }
    }

    /// Value sent by the client.
    pub fn get(&self, name: &str) -> Option<&str> {
        self.incoming.get(name).map(String::as_str)
    }

    /// Queue a cookie. `age` 0 leaves out `Max-Age` (browser-session
    /// cookie); a negative age tells the browser to delete it.
    pub fn set(&mut self, name: &str, value: impl Into<String>, age: i64) {
        let mut cookie = Cookie::build((name.to_string(), value.into()))
            .path("/")
            .http_only(true)
            .build();
        if age != 0 {
            cookie.set_max_age(Duration::seconds(age));
        }
        self.outgoing.retain(|queued| queued.name() != name);
        self.outgoing.push(cookie);
    }

    /// Queue a deletion: empty value, negative max-age.
    pub fn remove(&mut self, name: &str) {
        self.set(name, "", -1);
    }

    /// Decrypt a cookie sent by the client. Missing, tampered or stale
    /// values all read as `None`.
    pub fn get_secure(&self, codec: &SecureCookie, name: &str) -> Option<String> {
        let raw = self.get(name)?;
        match codec.open_str(name, raw) {
            Ok(value) => Some(value),
            Err(error) => {
                tracing::debug!(cookie = name, %error, "Discarding undecodable secure cookie");
                None
            }
        }
    }

    /// Encrypt and queue a cookie.
    pub fn set_secure(
        &mut self,
        codec: &SecureCookie,
        name: &str,
        value: &str,
        age: i64,
    ) -> Result<(), CodecError> {
        let sealed = codec.seal(name, value.as_bytes())?;
        self.set(name, sealed, age);
        Ok(())
    }

    /// A cookie queued for the response.
    pub fn pending(&self, name: &str) -> Option<&Cookie<'static>> {
        self.outgoing.iter().find(|c| c.name() == name)
    }

    pub fn pending_cookies(&self) -> impl Iterator<Item = &Cookie<'static>> {
        self.outgoing.iter()
    }

    /// Append one `Set-Cookie` header per queued cookie.
    pub fn write_headers(&self, headers: &mut HeaderMap) {
        for cookie in &self.outgoing {
            match HeaderValue::from_str(&cookie.to_string()) {
                Ok(value) => {
                    headers.append(SET_COOKIE, value);
                }
                Err(error) => {
                    tracing::warn!(cookie = cookie.name(), %error, "Dropping unrepresentable cookie");
                }
            }
        }
    }
}
