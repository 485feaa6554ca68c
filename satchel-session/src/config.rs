//! Session configuration.

use crate::cookie::{CookieAttributes, SameSite};
use crate::error::{SessionError, SessionResult};
use std::path::PathBuf;
use std::str::FromStr;

/// Prefix for environment variables read by [`SessionConfig::from_env`].
pub const ENV_PREFIX: &str = "SATCHEL_SESSION";

/// Session backend type.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SessionBackend {
    /// Process-wide in-memory map
    #[default]
    Memory,
    /// One file per session in a storage directory
    File,
}

impl SessionBackend {
    /// Backend name as accepted by [`FromStr`].
    pub fn as_str(&self) -> &'static str {
        match self {
            SessionBackend::Memory => "memory",
            SessionBackend::File => "file",
        }
    }
}

impl FromStr for SessionBackend {
    type Err = SessionError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "memory" => Ok(SessionBackend::Memory),
            "file" => Ok(SessionBackend::File),
            other => Err(SessionError::Config(format!(
                "session backend must be 'file' or 'memory', got '{}'",
                other
            ))),
        }
    }
}

impl std::fmt::Display for SessionBackend {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Session configuration.
#[derive(Debug, Clone)]
pub struct SessionConfig {
    /// Secret used to sign the session cookie
    pub secret: Vec<u8>,
    /// Directory holding session files (file backend only)
    pub storage_directory: PathBuf,
    /// Name of the session cookie
    pub cookie_name: String,
    /// Backend type
    pub backend: SessionBackend,
    /// Retention period in days. Accepted for compatibility; nothing expires sessions.
    pub retention_days: u32,
    /// Cookie path
    pub cookie_path: String,
    /// Cookie secure flag (HTTPS only)
    pub cookie_secure: bool,
    /// Cookie HttpOnly flag
    pub cookie_http_only: bool,
    /// Cookie SameSite policy
    pub cookie_same_site: SameSite,
}

impl SessionConfig {
    /// Create a configuration with the given signing secret and defaults for
    /// everything else.
    ///
    /// # Examples
    ///
    /// ```
    /// use satchel_session::{SessionBackend, SessionConfig};
    ///
    /// let config = SessionConfig::new("s3cret").unwrap();
    /// assert_eq!(config.cookie_name, "bsession");
    /// assert_eq!(config.backend, SessionBackend::Memory);
    /// ```
    pub fn new(secret: impl Into<Vec<u8>>) -> SessionResult<Self> {
        let secret = secret.into();
        if secret.is_empty() {
            return Err(SessionError::Config(
                "session secret must not be empty".to_string(),
            ));
        }

        Ok(Self {
            secret,
            storage_directory: PathBuf::from("./sessions"),
            cookie_name: "bsession".to_string(),
            backend: SessionBackend::Memory,
            retention_days: 30,
            cookie_path: "/".to_string(),
            cookie_secure: false,
            cookie_http_only: true,
            cookie_same_site: SameSite::Lax,
        })
    }

    /// Load configuration from `SATCHEL_SESSION_*` environment variables,
    /// reading a `.env` file first if one is present.
    ///
    /// `SATCHEL_SESSION_SECRET` is required.
    pub fn from_env() -> SessionResult<Self> {
        // A missing .env file is fine
        let _ = dotenvy::dotenv();
        Self::from_lookup(|name| std::env::var(format!("{}_{}", ENV_PREFIX, name)).ok())
    }

    /// Build a configuration from a variable lookup. Names are passed without
    /// the `SATCHEL_SESSION_` prefix (`SECRET`, `DIR`, `COOKIE_NAME`,
    /// `BACKEND`, `RETENTION_DAYS`, `COOKIE_PATH`, `COOKIE_SECURE`).
    pub fn from_lookup<F>(lookup: F) -> SessionResult<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let secret = lookup("SECRET").ok_or_else(|| {
            SessionError::Config(format!("{}_SECRET is not set", ENV_PREFIX))
        })?;
        let mut config = Self::new(secret)?;

        if let Some(dir) = lookup("DIR") {
            config = config.with_storage_directory(dir);
        }
        if let Some(name) = lookup("COOKIE_NAME") {
            config = config.with_cookie_name(name);
        }
        if let Some(backend) = lookup("BACKEND") {
            config = config.with_backend(&backend)?;
        }
        if let Some(days) = lookup("RETENTION_DAYS") {
            let days = days.trim().parse::<u32>().map_err(|e| {
                SessionError::Config(format!("invalid {}_RETENTION_DAYS: {}", ENV_PREFIX, e))
            })?;
            config = config.with_retention_days(days);
        }
        if let Some(path) = lookup("COOKIE_PATH") {
            config = config.with_cookie_path(path);
        }
        if let Some(secure) = lookup("COOKIE_SECURE") {
            config = config.with_cookie_secure(parse_flag(&secure)?);
        }

        Ok(config)
    }

    /// Select the backend by name (`memory` or `file`).
    ///
    /// Any other name is a configuration error.
    pub fn with_backend(mut self, backend: &str) -> SessionResult<Self> {
        self.backend = backend.parse()?;
        Ok(self)
    }

    /// Set the storage directory for the file backend.
    pub fn with_storage_directory(mut self, dir: impl Into<PathBuf>) -> Self {
        self.storage_directory = dir.into();
        self
    }

    /// Set the cookie name.
    pub fn with_cookie_name(mut self, name: impl Into<String>) -> Self {
        self.cookie_name = name.into();
        self
    }

    /// Set the retention period in days.
    pub fn with_retention_days(mut self, days: u32) -> Self {
        self.retention_days = days;
        self
    }

    /// Set cookie path
    pub fn with_cookie_path(mut self, path: impl Into<String>) -> Self {
        self.cookie_path = path.into();
        self
    }

    /// Set cookie secure flag
    pub fn with_cookie_secure(mut self, secure: bool) -> Self {
        self.cookie_secure = secure;
        self
    }

    /// Set cookie HttpOnly flag
    pub fn with_cookie_http_only(mut self, http_only: bool) -> Self {
        self.cookie_http_only = http_only;
        self
    }

    /// Set cookie SameSite policy
    pub fn with_cookie_same_site(mut self, same_site: SameSite) -> Self {
        self.cookie_same_site = same_site;
        self
    }

    /// Cookie attributes to render alongside the session cookie.
    pub fn cookie_attributes(&self) -> CookieAttributes {
        CookieAttributes {
            path: self.cookie_path.clone(),
            secure: self.cookie_secure,
            http_only: self.cookie_http_only,
            same_site: self.cookie_same_site,
        }
    }
}

fn parse_flag(value: &str) -> SessionResult<bool> {
    match value.trim().to_lowercase().as_str() {
        "1" | "true" | "yes" => Ok(true),
        "0" | "false" | "no" => Ok(false),
        other => Err(SessionError::Config(format!(
            "expected a boolean flag, got '{}'",
            other
        ))),
    }
}
