//! Session identity resolution.
//!
//! The resolver turns the signed session cookie of a request into a
//! [`SessionKey`], minting a new key (and setting a new cookie) when the
//! request carries no usable one.

use crate::config::SessionConfig;
use crate::cookie::{CookieReader, CookieWriter};
use crate::error::SessionResult;
use crate::key::SessionKey;
use crate::store::SessionStore;
use std::sync::Arc;
use tracing::debug;

/// Resolves and mints session keys for one request.
pub struct IdentityResolver {
    config: Arc<SessionConfig>,
    store: Arc<dyn SessionStore>,
    key: Option<SessionKey>,
    minted: bool,
    // Key purged during this request; the request cookie may still carry it
    revoked: Option<SessionKey>,
}

impl IdentityResolver {
    /// Create a resolver that holds no key yet.
    pub fn new(config: Arc<SessionConfig>, store: Arc<dyn SessionStore>) -> Self {
        Self {
            config,
            store,
            key: None,
            minted: false,
            revoked: None,
        }
    }

    /// The key currently held, if any.
    pub fn key(&self) -> Option<&SessionKey> {
        self.key.as_ref()
    }

    /// Whether the held key was minted during this request rather than read
    /// from the request cookie.
    pub fn is_minted(&self) -> bool {
        self.key.is_some() && self.minted
    }

    /// Return the session key for this request.
    ///
    /// A key already resolved during this request is returned as is.
    /// Otherwise the signed cookie is read and verified; a missing cookie, a
    /// bad signature, a malformed key or a key purged earlier in this request
    /// all lead to a freshly minted key.
    pub async fn current_key<R, W>(
        &mut self,
        request: &R,
        response: &mut W,
    ) -> SessionResult<SessionKey>
    where
        R: CookieReader + ?Sized,
        W: CookieWriter + ?Sized,
    {
        match self.existing_key(request) {
            Some(key) => Ok(key),
            None => self.mint(response).await,
        }
    }

    /// Return the held key, or adopt the one carried by the request cookie.
    /// Never mints.
    pub fn existing_key<R>(&mut self, request: &R) -> Option<SessionKey>
    where
        R: CookieReader + ?Sized,
    {
        if self.key.is_none() {
            self.key = self.key_from_cookie(request);
            self.minted = false;
        }
        self.key.clone()
    }

    fn key_from_cookie<R>(&self, request: &R) -> Option<SessionKey>
    where
        R: CookieReader + ?Sized,
    {
        let value = request.get_signed_cookie(&self.config.cookie_name, &self.config.secret)?;

        let key = match SessionKey::parse(&value) {
            Ok(key) => key,
            Err(e) => {
                debug!(error = %e, "Ignoring session cookie");
                return None;
            }
        };

        if self.revoked.as_ref() == Some(&key) {
            return None;
        }

        Some(key)
    }

    /// Start a new session.
    ///
    /// Purges the record of the key held so far (if any), generates a fresh
    /// key and sets the signed session cookie on the response.
    pub async fn mint<W>(&mut self, response: &mut W) -> SessionResult<SessionKey>
    where
        W: CookieWriter + ?Sized,
    {
        if let Some(old) = &self.key {
            self.store.purge(old).await?;
        }
        if let Some(old) = self.key.take() {
            self.revoked = Some(old);
        }

        let key = SessionKey::generate();
        response.set_signed_cookie(&self.config.cookie_name, key.as_str(), &self.config.secret);
        debug!(cookie = %self.config.cookie_name, "Minted session key");

        self.key = Some(key.clone());
        self.minted = true;
        Ok(key)
    }

    /// Forget the held key. A later [`current_key`](Self::current_key) will
    /// not adopt it again from the request cookie.
    pub fn revoke(&mut self) {
        if let Some(old) = self.key.take() {
            self.revoked = Some(old);
        }
        self.minted = false;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cookie::{RequestCookies, ResponseCookies, sign_value};
    use crate::memory_session::MemorySessionStore;

    fn resolver() -> (IdentityResolver, Arc<SessionConfig>, MemorySessionStore) {
        let config = Arc::new(SessionConfig::new("test_secret").unwrap());
        let store = MemorySessionStore::new();
        let resolver = IdentityResolver::new(config.clone(), Arc::new(store.clone()));
        (resolver, config, store)
    }

    #[tokio::test]
    async fn test_mints_without_cookie() {
        let (mut resolver, config, _) = resolver();
        let request = RequestCookies::new();
        let mut response = ResponseCookies::new();

        let key = resolver.current_key(&request, &mut response).await.unwrap();

        assert!(resolver.is_minted());
        let cookie = response.get(&config.cookie_name).unwrap();
        assert_eq!(cookie, sign_value(key.as_str(), &config.secret));
    }

    #[tokio::test]
    async fn test_adopts_valid_cookie() {
        let (mut resolver, config, _) = resolver();
        let key = SessionKey::generate();
        let mut request = RequestCookies::new();
        request.insert(&config.cookie_name, sign_value(key.as_str(), &config.secret));
        let mut response = ResponseCookies::new();

        assert_eq!(resolver.current_key(&request, &mut response).await.unwrap(), key);
        assert!(!resolver.is_minted());
        assert!(response.is_empty());
    }

    #[tokio::test]
    async fn test_resolution_is_stable_within_request() {
        let (mut resolver, _, _) = resolver();
        let request = RequestCookies::new();
        let mut response = ResponseCookies::new();

        let first = resolver.current_key(&request, &mut response).await.unwrap();
        let second = resolver.current_key(&request, &mut response).await.unwrap();
        assert_eq!(first, second);
    }

    #[tokio::test]
    async fn test_tampered_cookie_is_ignored() {
        let (mut resolver, config, _) = resolver();
        let key = SessionKey::generate();
        let signed = sign_value(key.as_str(), &config.secret);
        let mut request = RequestCookies::new();
        request.insert(&config.cookie_name, format!("{}x", signed));
        let mut response = ResponseCookies::new();

        let resolved = resolver.current_key(&request, &mut response).await.unwrap();
        assert_ne!(resolved, key);
        assert!(resolver.is_minted());
    }

    #[tokio::test]
    async fn test_malformed_key_is_ignored() {
        let (mut resolver, config, _) = resolver();
        let mut request = RequestCookies::new();
        request.insert(&config.cookie_name, sign_value("../../etc/passwd", &config.secret));
        let mut response = ResponseCookies::new();

        resolver.current_key(&request, &mut response).await.unwrap();
        assert!(resolver.is_minted());
    }

    #[tokio::test]
    async fn test_mint_purges_previous_record() {
        let (mut resolver, _, store) = resolver();
        let request = RequestCookies::new();
        let mut response = ResponseCookies::new();

        let old = resolver.current_key(&request, &mut response).await.unwrap();
        store.load(&old).await.unwrap();
        assert!(store.exists(&old).await.unwrap());

        let new = resolver.mint(&mut response).await.unwrap();
        assert_ne!(old, new);
        assert!(!store.exists(&old).await.unwrap());
    }

    #[tokio::test]
    async fn test_revoked_key_not_readopted() {
        let (mut resolver, config, _) = resolver();
        let key = SessionKey::generate();
        let mut request = RequestCookies::new();
        request.insert(&config.cookie_name, sign_value(key.as_str(), &config.secret));
        let mut response = ResponseCookies::new();

        assert_eq!(resolver.current_key(&request, &mut response).await.unwrap(), key);
        resolver.revoke();
        assert!(resolver.key().is_none());

        let next = resolver.current_key(&request, &mut response).await.unwrap();
        assert_ne!(next, key);
    }

    #[tokio::test]
    async fn test_existing_key_never_mints() {
        let (mut resolver, config, _) = resolver();
        assert!(resolver.existing_key(&RequestCookies::new()).is_none());
        assert!(resolver.key().is_none());

        let key = SessionKey::generate();
        let mut request = RequestCookies::new();
        request.insert(&config.cookie_name, sign_value(key.as_str(), &config.secret));
        assert_eq!(resolver.existing_key(&request), Some(key));
        assert!(!resolver.is_minted());
    }
}
