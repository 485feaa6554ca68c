//! In-memory session storage implementation.

use crate::error::SessionResult;
use crate::key::SessionKey;
use crate::store::{SessionData, SessionStore};
use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::RwLock;

/// Process-wide in-memory session store.
///
/// Cloning the store yields another handle to the same map, so one store can
/// be shared by every request in the process. Data is lost on restart.
///
/// Each operation takes the map lock once, so the map structure is never
/// observed half-updated. Two requests saving the same key still race: the
/// last save wins.
#[derive(Clone, Default)]
pub struct MemorySessionStore {
    sessions: Arc<RwLock<HashMap<SessionKey, SessionData>>>,
}

impl MemorySessionStore {
    /// Create an empty store.
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl SessionStore for MemorySessionStore {
    async fn load(&self, key: &SessionKey) -> SessionResult<SessionData> {
        if let Some(data) = self.sessions.read().await.get(key) {
            return Ok(data.clone());
        }

        // Reserve the entry; it stays empty until the first save
        let mut sessions = self.sessions.write().await;
        let data = sessions.entry(key.clone()).or_default();
        Ok(data.clone())
    }

    async fn save(&self, key: &SessionKey, data: &SessionData) -> SessionResult<()> {
        self.sessions
            .write()
            .await
            .insert(key.clone(), data.clone());
        Ok(())
    }

    async fn purge(&self, key: &SessionKey) -> SessionResult<()> {
        self.sessions.write().await.remove(key);
        Ok(())
    }

    async fn exists(&self, key: &SessionKey) -> SessionResult<bool> {
        Ok(self.sessions.read().await.contains_key(key))
    }

    async fn count(&self) -> SessionResult<usize> {
        Ok(self.sessions.read().await.len())
    }
}
