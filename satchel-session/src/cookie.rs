//! Signed cookie primitives.
//!
//! The session core only needs two operations from the hosting HTTP layer:
//! reading a signed cookie from the request ([`CookieReader`]) and setting a
//! signed cookie on the response ([`CookieWriter`]). [`RequestCookies`] and
//! [`ResponseCookies`] are small concrete adapters over the raw `Cookie` and
//! `Set-Cookie` headers.
//!
//! Signed values have the form `{value}.{signature}`, where the signature is
//! the unpadded base64url HMAC-SHA256 of the value keyed by the secret.

use crate::error::{SessionError, SessionResult};
use base64::{Engine, engine::general_purpose::URL_SAFE_NO_PAD};
use hmac::{Hmac, Mac};
use sha2::Sha256;
use std::collections::HashMap;

type HmacSha256 = Hmac<Sha256>;

/// Read access to the incoming request's cookies.
pub trait CookieReader {
    /// Return the verified value of the named cookie, or `None` when the
    /// cookie is absent or its signature does not verify.
    fn get_signed_cookie(&self, name: &str, secret: &[u8]) -> Option<String>;
}

/// Write access to the outgoing response's cookies.
pub trait CookieWriter {
    /// Sign `value` with `secret` and set it as the named cookie.
    fn set_signed_cookie(&mut self, name: &str, value: &str, secret: &[u8]);
}

/// Sign a cookie value.
pub fn sign_value(value: &str, secret: &[u8]) -> String {
    format!("{}.{}", value, signature(value, secret))
}

/// Verify a signed cookie value and return the embedded value.
pub fn verify_value(signed: &str, secret: &[u8]) -> SessionResult<String> {
    let (value, sig) = signed
        .rsplit_once('.')
        .ok_or(SessionError::InvalidSignature)?;

    let sig = URL_SAFE_NO_PAD
        .decode(sig)
        .map_err(|_| SessionError::InvalidSignature)?;

    let mut mac = HmacSha256::new_from_slice(secret).expect("HMAC can take key of any size");
    mac.update(value.as_bytes());
    mac.verify_slice(&sig)
        .map_err(|_| SessionError::InvalidSignature)?;

    Ok(value.to_string())
}

fn signature(value: &str, secret: &[u8]) -> String {
    let mut mac = HmacSha256::new_from_slice(secret).expect("HMAC can take key of any size");
    mac.update(value.as_bytes());
    URL_SAFE_NO_PAD.encode(mac.finalize().into_bytes())
}

/// Cookie SameSite attribute
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SameSite {
    Strict,
    Lax,
    None,
}

impl SameSite {
    pub fn as_str(&self) -> &'static str {
        match self {
            SameSite::Strict => "Strict",
            SameSite::Lax => "Lax",
            SameSite::None => "None",
        }
    }
}

/// Attributes rendered after the name/value pair of a `Set-Cookie` header.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CookieAttributes {
    pub path: String,
    pub secure: bool,
    pub http_only: bool,
    pub same_site: SameSite,
}

impl Default for CookieAttributes {
    fn default() -> Self {
        Self {
            path: "/".to_string(),
            secure: false,
            http_only: true,
            same_site: SameSite::Lax,
        }
    }
}

/// Cookies sent by the client, parsed from a `Cookie` header.
#[derive(Debug, Clone, Default)]
pub struct RequestCookies {
    cookies: HashMap<String, String>,
}

impl RequestCookies {
    /// A request without cookies.
    pub fn new() -> Self {
        Self::default()
    }

    /// Parse a `Cookie` request header (`a=1; b=2`).
    pub fn parse(header: &str) -> Self {
        let mut cookies = HashMap::new();

        for cookie in header.split(';') {
            let cookie = cookie.trim();
            if cookie.is_empty() {
                continue;
            }

            if let Some((name, value)) = cookie.split_once('=') {
                cookies.insert(name.trim().to_string(), value.trim().to_string());
            }
        }

        Self { cookies }
    }

    /// Cookies a browser would send back after receiving `response`.
    pub fn from_response(response: &ResponseCookies) -> Self {
        let cookies = response
            .cookies
            .iter()
            .map(|(name, (value, _))| (name.clone(), value.clone()))
            .collect();
        Self { cookies }
    }

    /// Add a raw (already signed) cookie value.
    pub fn insert(&mut self, name: impl Into<String>, value: impl Into<String>) {
        self.cookies.insert(name.into(), value.into());
    }

    /// Raw cookie value, without verification.
    pub fn get(&self, name: &str) -> Option<&str> {
        self.cookies.get(name).map(String::as_str)
    }
}

impl CookieReader for RequestCookies {
    fn get_signed_cookie(&self, name: &str, secret: &[u8]) -> Option<String> {
        let raw = self.cookies.get(name)?;
        match verify_value(raw, secret) {
            Ok(value) => Some(value),
            Err(e) => {
                tracing::debug!(cookie = %name, error = %e, "Rejected signed cookie");
                None
            }
        }
    }
}

/// Cookies to send to the client, rendered as `Set-Cookie` header values.
#[derive(Debug, Clone, Default)]
pub struct ResponseCookies {
    attributes: CookieAttributes,
    // name -> (signed value, rendered header)
    cookies: HashMap<String, (String, String)>,
}

impl ResponseCookies {
    /// Response cookies with default attributes (`Path=/; HttpOnly; SameSite=Lax`).
    pub fn new() -> Self {
        Self::default()
    }

    /// Response cookies rendered with the given attributes.
    pub fn with_attributes(attributes: CookieAttributes) -> Self {
        Self {
            attributes,
            cookies: HashMap::new(),
        }
    }

    /// Raw (signed) value set for `name`, if any.
    pub fn get(&self, name: &str) -> Option<&str> {
        self.cookies.get(name).map(|(value, _)| value.as_str())
    }

    /// Rendered `Set-Cookie` header values.
    pub fn headers(&self) -> impl Iterator<Item = &str> {
        self.cookies.values().map(|(_, header)| header.as_str())
    }

    /// Whether any cookie has been set.
    pub fn is_empty(&self) -> bool {
        self.cookies.is_empty()
    }

    fn render(&self, name: &str, value: &str) -> String {
        let mut cookie = format!("{}={}; Path={}", name, value, self.attributes.path);

        if self.attributes.secure {
            cookie.push_str("; Secure");
        }

        if self.attributes.http_only {
            cookie.push_str("; HttpOnly");
        }

        cookie.push_str(&format!("; SameSite={}", self.attributes.same_site.as_str()));
        cookie
    }
}

impl CookieWriter for ResponseCookies {
    fn set_signed_cookie(&mut self, name: &str, value: &str, secret: &[u8]) {
        let signed = sign_value(value, secret);
        let header = self.render(name, &signed);
        self.cookies.insert(name.to_string(), (signed, header));
    }
}
