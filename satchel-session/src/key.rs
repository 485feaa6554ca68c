//! Session key generation and validation.

use crate::error::{SessionError, SessionResult};
use rand::Rng;
use std::fmt;

/// Characters a session key is drawn from.
pub const TOKEN_ALPHABET: &[u8] = b"ABCDEFGHIJKLMNOPQRSTUVWXYZ0123456789";

/// Length of a session key in characters.
pub const SESSION_KEY_LEN: usize = 32;

/// Opaque random token naming one session's data.
///
/// A key is always exactly [`SESSION_KEY_LEN`] characters of
/// [`TOKEN_ALPHABET`], so it is safe to use as a file name.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct SessionKey(String);

impl SessionKey {
    /// Generate a fresh random key.
    pub fn generate() -> Self {
        let mut rng = rand::rng();
        let token: String = (0..SESSION_KEY_LEN)
            .map(|_| TOKEN_ALPHABET[rng.random_range(0..TOKEN_ALPHABET.len())] as char)
            .collect();
        Self(token)
    }

    /// Parse a key received from a client.
    pub fn parse(value: &str) -> SessionResult<Self> {
        let well_formed = value.len() == SESSION_KEY_LEN
            && value.bytes().all(|b| TOKEN_ALPHABET.contains(&b));

        if !well_formed {
            return Err(SessionError::InvalidSessionKey(value.to_string()));
        }

        Ok(Self(value.to_string()))
    }

    /// The key as a string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for SessionKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl AsRef<str> for SessionKey {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

/// Generate a new session key string.
pub fn generate_session_key() -> String {
    SessionKey::generate().0
}
