//! Request credentials and credential updates.

use axum::http::HeaderMap;
use axum_extra::headers::{Cookie, HeaderMapExt};

/// Cookie-borne credentials presented with a request.
#[derive(Debug, Clone, Default)]
pub struct Credentials {
    cookies: Option<Cookie>,
}

impl Credentials {
    /// Read credentials from the request's `Cookie` headers.
    pub fn from_headers(headers: &HeaderMap) -> Self {
        Self {
            cookies: headers.typed_get::<Cookie>(),
        }
    }

    /// Value of a named cookie; empty values count as absent.
    pub fn cookie(&self, name: &str) -> Option<&str> {
        self.cookies
            .as_ref()?
            .get(name)
            .filter(|value| !value.is_empty())
    }
}

/// A credential cookie set or cleared while resolving the session.
///
/// Updates are propagated to the caller on every response the gate produces.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CredentialUpdate {
    pub name: String,
    pub value: String,
    pub max_age_secs: i64,
    pub secure: bool,
}

impl CredentialUpdate {
    /// Set (or replace) a credential cookie.
    pub fn set(
        name: impl Into<String>,
        value: impl Into<String>,
        max_age_secs: i64,
        secure: bool,
    ) -> Self {
        Self {
            name: name.into(),
            value: value.into(),
            max_age_secs,
            secure,
        }
    }

    /// Clear a credential cookie with immediate expiry.
    pub fn clear(name: impl Into<String>, secure: bool) -> Self {
        Self::set(name, "", 0, secure)
    }

    pub fn is_removal(&self) -> bool {
        self.max_age_secs <= 0
    }

    /// Render as a `Set-Cookie` header value.
    pub fn to_set_cookie(&self) -> String {
        // In production, always include Secure flag
        let secure_flag = if self.secure { " Secure;" } else { "" };
        format!(
            "{}={}; Path=/; HttpOnly; SameSite=Lax;{} Max-Age={}",
            self.name,
            self.value,
            secure_flag,
            self.max_age_secs.max(0)
        )
    }
}

/// Rewrite a request `Cookie` header so downstream handlers see updated credentials.
///
/// Returns `None` when no cookies remain.
pub fn apply_to_cookie_header(existing: Option<&str>, updates: &[CredentialUpdate]) -> Option<String> {
    let mut pairs: Vec<(String, String)> = existing
        .unwrap_or_default()
        .split(';')
        .map(str::trim)
        .filter_map(|pair| {
            let (name, value) = pair.split_once('=')?;
            Some((name.trim().to_string(), value.trim().to_string()))
        })
        .collect();

    for update in updates {
        pairs.retain(|(name, _)| name != &update.name);
        if !update.is_removal() {
            pairs.push((update.name.clone(), update.value.clone()));
        }
    }

    if pairs.is_empty() {
        return None;
    }

    Some(
        pairs
            .iter()
            .map(|(name, value)| format!("{}={}", name, value))
            .collect::<Vec<_>>()
            .join("; "),
    )
}
