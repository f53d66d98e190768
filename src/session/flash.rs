//! Read-once flash messages.
//!
//! Messages queued during one request travel in a short-lived encrypted
//! cookie and surface on the next request only. The carrying cookie is
//! cleared as soon as it is read, so a reload never shows them twice.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use crate::http::cookies::CookieJar;
use crate::session::codec::SecureCookie;
use crate::session::state::SessionError;

/// Lifetime of the flash cookie, in seconds.
pub const FLASH_MAX_AGE: i64 = 2;

/// Messages grouped by kind (`error`, `success`, ...).
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct FlashMessages(BTreeMap<String, Vec<String>>);

impl FlashMessages {
    pub fn push(&mut self, kind: impl Into<String>, message: impl Into<String>) {
        self.0.entry(kind.into()).or_default().push(message.into());
    }

    pub fn get(&self, kind: &str) -> &[String] {
        self.0.get(kind).map(Vec::as_slice).unwrap_or(&[])
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &[String])> {
        self.0.iter().map(|(k, v)| (k.as_str(), v.as_slice()))
    }
}

/// Flash state for one request.
#[derive(Debug, Clone, Default)]
pub struct Flash {
    incoming: FlashMessages,
    outgoing: FlashMessages,
}

impl Flash {
    /// Read the flash cookie and queue its removal.
    pub fn restore(cookies: &mut CookieJar, codec: &SecureCookie, name: &str) -> Self {
        if cookies.get(name).is_none() {
            return Self::default();
        }
        let incoming = cookies
            .get_secure(codec, name)
            .and_then(|json| match serde_json::from_str(&json) {
                Ok(messages) => Some(messages),
                Err(error) => {
                    tracing::debug!(cookie = name, %error, "Discarding malformed flash cookie");
                    None
                }
            })
            .unwrap_or_default();
        cookies.remove(name);
        Self {
            incoming,
            outgoing: FlashMessages::default(),
        }
    }

    /// Queue a message for the next request.
    pub fn push(&mut self, kind: impl Into<String>, message: impl Into<String>) {
        self.outgoing.push(kind, message);
    }

    /// Messages carried in from the previous request.
    pub fn messages(&self, kind: &str) -> &[String] {
        self.incoming.get(kind)
    }

    pub fn incoming(&self) -> &FlashMessages {
        &self.incoming
    }

    pub fn pending(&self) -> &FlashMessages {
        &self.outgoing
    }

    pub fn has_messages(&self) -> bool {
        !self.incoming.is_empty()
    }

    /// Write queued messages, if any, into the short-lived cookie.
    pub fn flush(&mut self, cookies: &mut CookieJar, codec: &SecureCookie, name: &str) -> Result<(), SessionError> {
        if self.outgoing.is_empty() {
            return Ok(());
        }
        let json = serde_json::to_string(&self.outgoing).map_err(SessionError::Encode)?;
        cookies.set_secure(codec, name, &json, FLASH_MAX_AGE)?;
        self.outgoing = FlashMessages::default();
        Ok(())
    }
}
