//! In-process session store keyed by an opaque ID cookie.
//!
//! # Design Decisions
//! - One `DashMap` entry per session; mutations are applied under that
//!   entry's shard lock, so concurrent requests merge instead of overwriting
//! - Each request replays only its own set/delete operations
//! - Idle entries expire; `sweep` removes them in the background

use async_trait::async_trait;
use dashmap::DashMap;
use serde_json::{Map, Value};
use std::time::{Duration, Instant};
use uuid::Uuid;

use crate::http::cookies::CookieJar;
use crate::session::state::{Change, Session, SessionError};
use crate::session::store::SessionStore;

#[derive(Debug)]
struct Entry {
    data: Map<String, Value>,
    touched: Instant,
}

impl Entry {
    fn new() -> Self {
        Self {
            data: Map::new(),
            touched: Instant::now(),
        }
    }

    fn is_expired(&self, idle_timeout: Duration) -> bool {
        self.touched.elapsed() > idle_timeout
    }
}

/// Server-side session store.
#[derive(Debug)]
pub struct MemorySessionStore {
    entries: DashMap<String, Entry>,
    cookie_name: String,
    max_age: i64,
    idle_timeout: Duration,
}

impl MemorySessionStore {
    pub fn new(cookie_name: impl Into<String>, max_age: i64, idle_timeout: Duration) -> Self {
        Self {
            entries: DashMap::new(),
            cookie_name: cookie_name.into(),
            max_age,
            idle_timeout,
        }
    }

    /// Number of live entries, expired ones included until swept.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    fn apply(data: &mut Map<String, Value>, changes: Vec<Change>) {
        for change in changes {
            match change {
                Change::Set(key, value) => {
                    data.insert(key, value);
                }
                Change::Delete(key) => {
                    data.remove(&key);
                }
            }
        }
    }
}

#[async_trait]
impl SessionStore for MemorySessionStore {
    async fn restore(&self, cookies: &CookieJar) -> Session {
        let Some(id) = cookies.get(&self.cookie_name) else {
            return Session::new();
        };
        match self.entries.get(id) {
            Some(entry) if !entry.is_expired(self.idle_timeout) => {
                Session::restored(Some(id.to_string()), entry.data.clone())
            }
            _ => Session::new(),
        }
    }

    async fn flush(&self, session: &mut Session, cookies: &mut CookieJar) -> Result<(), SessionError> {
        let changes = session.take_changes();

        if session.is_purged() {
            session.clear_purge();
            if let Some(id) = session.id() {
                self.entries.remove(id);
            }
            session.set_id(None);
            if changes.is_empty() {
                cookies.remove(&self.cookie_name);
                return Ok(());
            }
        }

        if changes.is_empty() {
            if let Some(id) = session.id() {
                if let Some(mut entry) = self.entries.get_mut(id) {
                    entry.touched = Instant::now();
                }
            }
            return Ok(());
        }

        let (id, issued) = match session.id() {
            Some(id) => (id.to_string(), false),
            None => (Uuid::new_v4().to_string(), true),
        };

        {
            let mut entry = self.entries.entry(id.clone()).or_insert_with(Entry::new);
            Self::apply(&mut entry.data, changes);
            entry.touched = Instant::now();
        }

        if issued {
            cookies.set(&self.cookie_name, id.clone(), self.max_age);
            session.set_id(Some(id));
        }
        Ok(())
    }

    async fn sweep(&self) -> usize {
        let before = self.entries.len();
        let idle_timeout = self.idle_timeout;
        self.entries.retain(|_, entry| !entry.is_expired(idle_timeout));
        let removed = before.saturating_sub(self.entries.len());
        if removed > 0 {
            tracing::debug!(removed, "Expired sessions swept");
        }
        removed
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::session::store::tests::next_request;
    use std::sync::Arc;

    fn store() -> MemorySessionStore {
        MemorySessionStore::new("session_id", 0, Duration::from_secs(60))
    }

    #[tokio::test]
    async fn test_round_trip() {
        let store = store();
        let mut jar = CookieJar::new();
        let mut session = store.restore(&jar).await;
        session.set("user", 7).unwrap();
        store.flush(&mut session, &mut jar).await.unwrap();

        let id = jar.pending("session_id").unwrap().value().to_string();
        assert!(Uuid::parse_str(&id).is_ok());

        let jar = next_request(&jar);
        let session = store.restore(&jar).await;
        assert_eq!(session.id(), Some(id.as_str()));
        assert_eq!(session.get::<i64>("user"), Some(7));
    }

    #[tokio::test]
    async fn test_no_entry_until_written() {
        let store = store();
        let mut jar = CookieJar::new();
        let mut session = store.restore(&jar).await;
        store.flush(&mut session, &mut jar).await.unwrap();
        assert!(store.is_empty());
        assert!(jar.pending("session_id").is_none());
    }

    #[tokio::test]
    async fn test_concurrent_requests_merge() {
        let store = Arc::new(store());

        let mut jar = CookieJar::new();
        let mut session = store.restore(&jar).await;
        session.set("seed", true).unwrap();
        store.flush(&mut session, &mut jar).await.unwrap();
        let jar = next_request(&jar);

        // Both requests restore before either flushes.
        let mut first = store.restore(&jar).await;
        let mut second = store.restore(&jar).await;
        first.set("a", 1).unwrap();
        second.set("b", 2).unwrap();

        let (s1, s2) = (store.clone(), store.clone());
        let (mut j1, mut j2) = (jar.clone(), jar.clone());
        let t1 = tokio::spawn(async move { s1.flush(&mut first, &mut j1).await });
        let t2 = tokio::spawn(async move { s2.flush(&mut second, &mut j2).await });
        t1.await.unwrap().unwrap();
        t2.await.unwrap().unwrap();

        let session = store.restore(&jar).await;
        assert_eq!(session.get::<i64>("a"), Some(1));
        assert_eq!(session.get::<i64>("b"), Some(2));
        assert_eq!(session.get::<bool>("seed"), Some(true));
    }

    #[tokio::test]
    async fn test_purge_removes_entry() {
        let store = store();
        let mut jar = CookieJar::new();
        let mut session = store.restore(&jar).await;
        session.set("user", 7).unwrap();
        store.flush(&mut session, &mut jar).await.unwrap();

        let mut jar = next_request(&jar);
        let mut session = store.restore(&jar).await;
        session.purge();
        store.flush(&mut session, &mut jar).await.unwrap();
        assert!(store.is_empty());

        let jar = next_request(&jar);
        assert!(store.restore(&jar).await.is_empty());
    }

    #[tokio::test]
    async fn test_idle_sessions_expire() {
        let store = MemorySessionStore::new("session_id", 0, Duration::from_millis(10));
        let mut jar = CookieJar::new();
        let mut session = store.restore(&jar).await;
        session.set("user", 7).unwrap();
        store.flush(&mut session, &mut jar).await.unwrap();

        tokio::time::sleep(Duration::from_millis(30)).await;
        let next = next_request(&jar);
        assert!(store.restore(&next).await.is_empty());
        assert_eq!(store.sweep().await, 1);
        assert!(store.is_empty());
    }
}
