//! Session token claims.

use serde::{Deserialize, Serialize};

/// JWT claims carried by the session cookie.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Claims {
    /// Subject (user ID).
    pub sub: String,

    /// Issuer.
    #[serde(default)]
    pub iss: Option<String>,

    /// Expiration time (as Unix timestamp).
    pub exp: i64,

    /// Issued at (as Unix timestamp).
    #[serde(default)]
    pub iat: Option<i64>,

    /// User's email.
    #[serde(default)]
    pub email: Option<String>,
}

impl Claims {
    /// Seconds until the token expires, negative once expired.
    pub fn remaining_secs(&self, now: i64) -> i64 {
        self.exp - now
    }
}
