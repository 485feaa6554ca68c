//! Session store trait definition.

use crate::error::SessionResult;
use crate::key::SessionKey;
use async_trait::async_trait;
use std::collections::HashMap;

/// Session data: field name to arbitrary JSON value.
pub type SessionData = HashMap<String, serde_json::Value>;

/// Session store trait for different storage backends.
///
/// A store owns the durable key to data mapping. Callers check data out with
/// [`load`](SessionStore::load), mutate their own copy, and check it back in
/// with [`save`](SessionStore::save).
///
/// Absence is never an error: loading a key that has no record yields an
/// empty mapping.
///
/// # Examples
///
/// ```
/// use satchel_session::{MemorySessionStore, SessionKey, SessionStore};
///
/// # #[tokio::main(flavor = "current_thread")]
/// # async fn main() -> satchel_session::SessionResult<()> {
/// let store = MemorySessionStore::new();
/// let key = SessionKey::generate();
///
/// let mut data = store.load(&key).await?;
/// assert!(data.is_empty());
///
/// data.insert("user".to_string(), "joe".into());
/// store.save(&key, &data).await?;
///
/// assert_eq!(store.load(&key).await?, data);
/// # Ok(())
/// # }
/// ```
#[async_trait]
pub trait SessionStore: Send + Sync {
    /// Load the data stored under `key`.
    ///
    /// Backends establish a record for a key that has none: the memory
    /// backend inserts an empty entry, the file backend writes an empty file.
    async fn load(&self, key: &SessionKey) -> SessionResult<SessionData>;

    /// Store `data` under `key`, replacing any previous record.
    async fn save(&self, key: &SessionKey, data: &SessionData) -> SessionResult<()>;

    /// Remove the record for `key`. Removing a missing record is not an error.
    async fn purge(&self, key: &SessionKey) -> SessionResult<()>;

    /// Check whether a record exists for `key`.
    async fn exists(&self, key: &SessionKey) -> SessionResult<bool>;

    /// Number of stored records.
    async fn count(&self) -> SessionResult<usize>;
}
