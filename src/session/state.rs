//! Per-request session view.

use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::{Map, Value};
use thiserror::Error;

use crate::session::codec::CodecError;

#[derive(Debug, Error)]
pub enum SessionError {
    #[error("failed to serialize session value `{key}`: {source}")]
    Serialize {
        key: String,
        #[source]
        source: serde_json::Error,
    },

    #[error("failed to encode session: {0}")]
    Encode(#[source] serde_json::Error),

    #[error(transparent)]
    Codec(#[from] CodecError),
}

/// A single recorded mutation, replayed by stores that merge on flush.
#[derive(Debug, Clone, PartialEq)]
pub enum Change {
    Set(String, Value),
    Delete(String),
}

/// Session data restored once at request start and flushed once after the
/// after-filters.
///
/// Reads see this request's own writes. Mutations are also recorded as
/// [`Change`]s so a store can apply them to shared state without clobbering
/// keys written concurrently by other requests.
#[derive(Debug, Clone, Default)]
pub struct Session {
    id: Option<String>,
    data: Map<String, Value>,
    changes: Vec<Change>,
    purged: bool,
}

impl Session {
    pub fn new() -> Self {
        Self::default()
    }

    /// Session restored from a store. `id` is `None` for stores that keep
    /// everything client-side, or when no server entry exists yet.
    pub fn restored(id: Option<String>, data: Map<String, Value>) -> Self {
        Self {
            id,
            data,
            changes: Vec::new(),
            purged: false,
        }
    }

    /// Server-side identifier, when the store issues one.
    pub fn id(&self) -> Option<&str> {
        self.id.as_deref()
    }

    pub(crate) fn set_id(&mut self, id: Option<String>) {
        self.id = id;
    }

    /// Typed read. A missing key or a value of another shape reads as `None`.
    pub fn get<T: DeserializeOwned>(&self, key: &str) -> Option<T> {
        self.data
            .get(key)
            .and_then(|v| serde_json::from_value(v.clone()).ok())
    }

    pub fn get_value(&self, key: &str) -> Option<&Value> {
        self.data.get(key)
    }

    pub fn contains(&self, key: &str) -> bool {
        self.data.contains_key(key)
    }

    pub fn set<T: Serialize>(&mut self, key: &str, value: T) -> Result<(), SessionError> {
        let value = serde_json::to_value(value).map_err(|source| SessionError::Serialize {
            key: key.to_string(),
            source,
        })?;
        self.data.insert(key.to_string(), value.clone());
        self.changes.push(Change::Set(key.to_string(), value));
        Ok(())
    }

    pub fn delete(&mut self, key: &str) -> Option<Value> {
        self.changes.push(Change::Delete(key.to_string()));
        self.data.remove(key)
    }

    /// Drop every key and ask the store to forget the session.
    pub fn purge(&mut self) {
        self.data.clear();
        self.changes.clear();
        self.purged = true;
    }

    pub fn is_modified(&self) -> bool {
        !self.changes.is_empty()
    }

    pub fn is_purged(&self) -> bool {
        self.purged
    }

    pub fn data(&self) -> &Map<String, Value> {
        &self.data
    }

    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.data.keys().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.data.len()
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    /// Take the recorded mutations, leaving the session clean.
    pub(crate) fn take_changes(&mut self) -> Vec<Change> {
        std::mem::take(&mut self.changes)
    }

    pub(crate) fn clear_purge(&mut self) {
        self.purged = false;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_reads_see_own_writes() {
        let mut session = Session::new();
        session.set("user", 42).unwrap();
        session.set("name", "frank").unwrap();
        assert_eq!(session.get::<i64>("user"), Some(42));
        assert_eq!(session.get::<String>("name").as_deref(), Some("frank"));
        assert_eq!(session.get::<i64>("name"), None);
        assert!(session.is_modified());
    }

    #[test]
    fn test_changes_recorded_in_order() {
        let mut session = Session::restored(None, Map::new());
        assert!(!session.is_modified());
        session.set("a", 1).unwrap();
        session.delete("a");
        assert_eq!(
            session.take_changes(),
            vec![Change::Set("a".into(), json!(1)), Change::Delete("a".into())]
        );
        assert!(!session.is_modified());
        assert!(session.is_empty());
    }

    #[test]
    fn test_purge() {
        let mut data = Map::new();
        data.insert("k".into(), json!("v"));
        let mut session = Session::restored(Some("id".into()), data);
        session.purge();
        assert!(session.is_purged());
        assert!(session.is_empty());
        assert!(!session.is_modified());
    }
}
