//! Session manager: the long-lived half of the session system.

use crate::config::{SessionBackend, SessionConfig};
use crate::cookie::ResponseCookies;
use crate::error::SessionResult;
use crate::identity::IdentityResolver;
use crate::memory_session::MemorySessionStore;
use crate::session::Session;
use crate::store::SessionStore;
use std::sync::Arc;
use tracing::info;

/// Owns the configuration and the backend store, and hands out one
/// [`Session`] per request.
///
/// Build it once at startup and share it (it is cheap to clone).
#[derive(Clone)]
pub struct SessionManager {
    config: Arc<SessionConfig>,
    store: Arc<dyn SessionStore>,
}

impl SessionManager {
    /// Create a manager with the backend selected by `config.backend`.
    ///
    /// Performs no I/O: the file backend creates its directory on first use.
    pub fn new(config: SessionConfig) -> SessionResult<Self> {
        let store: Arc<dyn SessionStore> = match config.backend {
            SessionBackend::Memory => Arc::new(MemorySessionStore::new()),
            #[cfg(feature = "file")]
            SessionBackend::File => Arc::new(crate::file_session::FileSessionStore::new(
                config.storage_directory.clone(),
            )),
            #[cfg(not(feature = "file"))]
            SessionBackend::File => {
                return Err(crate::error::SessionError::Config(
                    "the file session backend requires the `file` feature".to_string(),
                ));
            }
        };

        info!(
            backend = %config.backend,
            cookie = %config.cookie_name,
            retention_days = config.retention_days,
            "Session manager ready"
        );

        Ok(Self {
            config: Arc::new(config),
            store,
        })
    }

    /// Create a manager around a custom store. `config.backend` is ignored.
    pub fn with_store<S>(config: SessionConfig, store: S) -> Self
    where
        S: SessionStore + 'static,
    {
        Self {
            config: Arc::new(config),
            store: Arc::new(store),
        }
    }

    /// The configuration.
    pub fn config(&self) -> &SessionConfig {
        &self.config
    }

    /// The backend store shared by all sessions.
    pub fn store(&self) -> Arc<dyn SessionStore> {
        self.store.clone()
    }

    /// A fresh, unresolved session for one request.
    pub fn session(&self) -> Session {
        let identity = IdentityResolver::new(self.config.clone(), self.store.clone());
        Session::new(identity, self.store.clone())
    }

    /// An empty response cookie set rendered with the configured attributes.
    pub fn response_cookies(&self) -> ResponseCookies {
        ResponseCookies::with_attributes(self.config.cookie_attributes())
    }
}
