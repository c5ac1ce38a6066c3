//! Gate configuration.

use axum::http::StatusCode;
use serde::{Deserialize, Serialize};

use super::path::canonical_path;

/// Status code used for gate redirects.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RedirectStatus {
    /// 307 Temporary Redirect (method and body preserved).
    #[default]
    Temporary,
    /// 302 Found.
    Found,
}

impl RedirectStatus {
    pub fn status_code(self) -> StatusCode {
        match self {
            RedirectStatus::Temporary => StatusCode::TEMPORARY_REDIRECT,
            RedirectStatus::Found => StatusCode::FOUND,
        }
    }
}

/// Gate configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct GateConfig {
    /// Path prefixes served without gating (static assets).
    pub bypass_prefixes: Vec<String>,

    /// Status code for redirects.
    pub redirect_status: RedirectStatus,
}

impl Default for GateConfig {
    fn default() -> Self {
        Self {
            bypass_prefixes: vec![
                "/_next/static".to_string(),
                "/_next/image".to_string(),
                "/favicon.ico".to_string(),
                "/images".to_string(),
                "/static".to_string(),
            ],
            redirect_status: RedirectStatus::Temporary,
        }
    }
}

impl GateConfig {
    /// Whether a request path skips the gate entirely. Paths without a
    /// canonical form never do.
    pub fn is_bypassed(&self, path: &str) -> bool {
        let Some(path) = canonical_path(path) else {
            return false;
        };
        self.bypass_prefixes.iter().any(|prefix| {
            path.strip_prefix(prefix.as_str())
                .is_some_and(|rest| rest.is_empty() || rest.starts_with('/'))
        })
    }
}
