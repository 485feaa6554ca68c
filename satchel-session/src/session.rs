//! Per-request session handle.

use crate::cookie::{CookieReader, CookieWriter};
use crate::error::{SessionError, SessionResult};
use crate::identity::IdentityResolver;
use crate::key::SessionKey;
use crate::store::{SessionData, SessionStore};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::error;

/// One request's view of a session.
///
/// A `Session` holds the working buffer: the data checked out of the store by
/// [`load`](Session::load), mutated by the handler, and checked back in by
/// [`save`](Session::save). Nothing is written back automatically.
///
/// Create one per request with [`SessionManager::session`](crate::SessionManager::session).
///
/// # Examples
///
/// ```
/// use satchel_session::{RequestCookies, ResponseCookies, SessionConfig, SessionManager};
///
/// # #[tokio::main(flavor = "current_thread")]
/// # async fn main() -> satchel_session::SessionResult<()> {
/// let manager = SessionManager::new(SessionConfig::new("s3cret")?)?;
/// let request = RequestCookies::parse("");
/// let mut response = ResponseCookies::new();
///
/// let mut session = manager.session();
/// session.load(&request, &mut response).await?;
/// session.set("user", "joe")?;
/// session.save(&request, &mut response).await;
///
/// assert_eq!(session.get::<String>("user").as_deref(), Some("joe"));
/// # Ok(())
/// # }
/// ```
pub struct Session {
    store: Arc<dyn SessionStore>,
    identity: IdentityResolver,
    data: SessionData,
}

impl Session {
    pub(crate) fn new(identity: IdentityResolver, store: Arc<dyn SessionStore>) -> Self {
        Self {
            store,
            identity,
            data: SessionData::new(),
        }
    }

    // ========== Lifecycle ==========

    /// The session key for this request, minting one if the request has none.
    pub async fn current_key<R, W>(
        &mut self,
        request: &R,
        response: &mut W,
    ) -> SessionResult<SessionKey>
    where
        R: CookieReader + ?Sized,
        W: CookieWriter + ?Sized,
    {
        let had_key = self.identity.key().is_some();
        let key = self.identity.current_key(request, response).await?;
        if !had_key && self.identity.is_minted() {
            self.data.clear();
        }
        Ok(key)
    }

    /// Start a new session: purge the current record, empty the working
    /// buffer and set a cookie carrying a fresh key.
    pub async fn renew<W>(&mut self, response: &mut W) -> SessionResult<SessionKey>
    where
        W: CookieWriter + ?Sized,
    {
        let key = self.identity.mint(response).await?;
        self.data.clear();
        Ok(key)
    }

    /// Check the session's data out of the store into the working buffer.
    ///
    /// With the file backend, loading a session that has no record **writes**
    /// an empty record, so every loaded session exists on disk afterwards.
    pub async fn load<R, W>(&mut self, request: &R, response: &mut W) -> SessionResult<()>
    where
        R: CookieReader + ?Sized,
        W: CookieWriter + ?Sized,
    {
        let key = self.current_key(request, response).await?;
        self.data = self.store.load(&key).await?;
        Ok(())
    }

    /// Alias for [`load`](Self::load).
    pub async fn connect<R, W>(&mut self, request: &R, response: &mut W) -> SessionResult<()>
    where
        R: CookieReader + ?Sized,
        W: CookieWriter + ?Sized,
    {
        self.load(request, response).await
    }

    /// Write the working buffer back under the current key, returning any
    /// failure.
    pub async fn try_save<R, W>(&mut self, request: &R, response: &mut W) -> SessionResult<()>
    where
        R: CookieReader + ?Sized,
        W: CookieWriter + ?Sized,
    {
        let key = self.current_key(request, response).await?;
        self.store.save(&key, &self.data).await
    }

    /// Write the working buffer back under the current key.
    ///
    /// Failures are logged and swallowed: the working buffer stays intact and
    /// remains the source of truth for the rest of the request, but the data
    /// is not durable.
    pub async fn save<R, W>(&mut self, request: &R, response: &mut W)
    where
        R: CookieReader + ?Sized,
        W: CookieWriter + ?Sized,
    {
        if let Err(e) = self.try_save(request, response).await {
            error!(
                key = ?self.identity.key().map(SessionKey::as_str),
                error = %e,
                "Session save failed"
            );
        }
    }

    /// Alias for [`save`](Self::save), meant for the end of a request.
    pub async fn commit<R, W>(&mut self, request: &R, response: &mut W)
    where
        R: CookieReader + ?Sized,
        W: CookieWriter + ?Sized,
    {
        self.save(request, response).await
    }

    /// Remove the stored record for the current key and empty the working
    /// buffer.
    ///
    /// Purging a session without a record is a no-op. Afterwards the session
    /// is unresolved: the next access mints a new key, even if the request
    /// cookie still carries the purged one.
    pub async fn purge<R>(&mut self, request: &R) -> SessionResult<()>
    where
        R: CookieReader + ?Sized,
    {
        if let Some(key) = self.identity.existing_key(request) {
            self.store.purge(&key).await?;
        }
        self.identity.revoke();
        self.data.clear();
        Ok(())
    }

    /// Alias for [`purge`](Self::purge).
    pub async fn clear<R>(&mut self, request: &R) -> SessionResult<()>
    where
        R: CookieReader + ?Sized,
    {
        self.purge(request).await
    }

    /// The key held by this session, if it has been resolved.
    pub fn key(&self) -> Option<&SessionKey> {
        self.identity.key()
    }

    /// Whether the key was minted during this request.
    pub fn is_new(&self) -> bool {
        self.identity.is_minted()
    }

    // ========== Working buffer ==========

    /// Get a value from the working buffer.
    pub fn get<T: for<'de> Deserialize<'de>>(&self, field: &str) -> Option<T> {
        self.data
            .get(field)
            .and_then(|v| serde_json::from_value(v.clone()).ok())
    }

    /// Set a value in the working buffer.
    pub fn set<T: Serialize>(&mut self, field: &str, value: T) -> SessionResult<()> {
        let json_value =
            serde_json::to_value(value).map_err(|e| SessionError::Serialization(e.to_string()))?;
        self.data.insert(field.to_string(), json_value);
        Ok(())
    }

    /// Remove a value from the working buffer.
    pub fn remove(&mut self, field: &str) -> Option<serde_json::Value> {
        self.data.remove(field)
    }

    /// Check if a field exists in the working buffer.
    pub fn contains(&self, field: &str) -> bool {
        self.data.contains_key(field)
    }

    /// Get all field names in the working buffer.
    pub fn keys(&self) -> Vec<&String> {
        self.data.keys().collect()
    }

    /// The working buffer.
    pub fn data(&self) -> &SessionData {
        &self.data
    }

    /// Mutable access to the working buffer.
    pub fn data_mut(&mut self) -> &mut SessionData {
        &mut self.data
    }
}
