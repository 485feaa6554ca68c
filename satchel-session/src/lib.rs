//! Server-side sessions identified by a signed cookie.
//!
//! Each visitor gets a random 32-character session key, sent to the browser
//! in an HMAC-signed cookie. The key names a mapping of field names to JSON
//! values kept either in process memory or in one file per session.
//!
//! # Lifecycle
//!
//! A [`SessionManager`] is built once at startup. For every request the
//! handler takes a fresh [`Session`] from it and drives it explicitly:
//!
//! 1. [`Session::load`] resolves the key from the request cookie (minting a
//!    new key and setting a cookie when there is none) and checks the
//!    session's data out into the working buffer;
//! 2. the handler reads and mutates the buffer;
//! 3. [`Session::save`] checks the buffer back in. Nothing is saved
//!    automatically.
//!
//! [`Session::purge`] deletes the stored record and leaves the session
//! unresolved, so the next access starts over with a new key.
//!
//! # Features
//!
//! - `file` - file-backed storage (enabled by default)
//!
//! # Examples
//!
//! ```
//! use satchel_session::*;
//!
//! #[tokio::main(flavor = "current_thread")]
//! async fn main() -> Result<(), SessionError> {
//!     let dir = tempfile::tempdir().unwrap();
//!     let config = SessionConfig::new("change-me")?
//!         .with_backend("file")?
//!         .with_storage_directory(dir.path());
//!     let manager = SessionManager::new(config)?;
//!
//!     // First request: no cookie yet
//!     let request = RequestCookies::parse("");
//!     let mut response = manager.response_cookies();
//!     let mut session = manager.session();
//!     session.load(&request, &mut response).await?;
//!     session.set("user", "joe")?;
//!     session.save(&request, &mut response).await;
//!
//!     // Second request: the browser sends the cookie back
//!     let request = RequestCookies::from_response(&response);
//!     let mut session = manager.session();
//!     session.load(&request, &mut manager.response_cookies()).await?;
//!     assert_eq!(session.get::<String>("user").as_deref(), Some("joe"));
//!
//!     Ok(())
//! }
//! ```
//!
//! # Concurrency
//!
//! Backends are shared between requests. The memory backend guards its map
//! with a lock and the file backend serializes operations per key, but two
//! requests saving the same session still follow last-save-wins. Nothing
//! coordinates across processes.

pub mod config;
pub mod cookie;
pub mod error;
pub mod identity;
pub mod key;
pub mod manager;
pub mod memory_session;
pub mod session;
pub mod store;

#[cfg(feature = "file")]
pub mod file_session;

pub use config::{SessionBackend, SessionConfig};
pub use cookie::{
    CookieAttributes, CookieReader, CookieWriter, RequestCookies, ResponseCookies, SameSite,
};
pub use error::{SessionError, SessionResult};
pub use identity::IdentityResolver;
pub use key::{SessionKey, generate_session_key};
pub use manager::SessionManager;
pub use memory_session::MemorySessionStore;
pub use session::Session;
pub use store::{SessionData, SessionStore};

#[cfg(feature = "file")]
pub use file_session::FileSessionStore;

/// Re-export commonly used types
pub mod prelude {
    pub use crate::config::{SessionBackend, SessionConfig};
    pub use crate::cookie::{CookieReader, CookieWriter, RequestCookies, ResponseCookies};
    pub use crate::error::{SessionError, SessionResult};
    pub use crate::key::SessionKey;
    pub use crate::manager::SessionManager;
    pub use crate::memory_session::MemorySessionStore;
    pub use crate::session::Session;
    pub use crate::store::{SessionData, SessionStore};

    #[cfg(feature = "file")]
    pub use crate::file_session::FileSessionStore;
}
