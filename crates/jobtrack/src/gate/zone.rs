//! Request path classification.

use serde::Serialize;

use super::path::canonical_path;
use crate::provisioning::{Stage, WIZARD_ROOT_PATH, WizardStep};

pub const LOGIN_PATH: &str = "/login";
pub const SIGNUP_PATH: &str = "/signup";
pub const HOME_PATH: &str = "/";
/// Covers `/auth/callback`, `/auth/signout` and friends.
pub const AUTH_PREFIX: &str = "/auth";

/// Classification bucket of a request path.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum PathZone {
    /// Login and signup pages.
    PublicAuthPage,
    /// Auth callback routes completing an external session exchange.
    AuthCallback,
    /// A page of the setup wizard.
    WizardPage(WizardStep),
    /// Everything else.
    ProtectedPage,
}

impl PathZone {
    /// Every zone, for exhaustive checks.
    pub const ALL: [PathZone; 8] = [
        PathZone::PublicAuthPage,
        PathZone::AuthCallback,
        PathZone::WizardPage(WizardStep::Root),
        PathZone::WizardPage(WizardStep::Stage(Stage::Backend)),
        PathZone::WizardPage(WizardStep::Stage(Stage::AiIntegration)),
        PathZone::WizardPage(WizardStep::Stage(Stage::Document)),
        PathZone::WizardPage(WizardStep::Stage(Stage::Providers)),
        PathZone::ProtectedPage,
    ];

    /// Whether deciding on this zone for an authenticated caller needs their
    /// provisioning state. Callbacks pass before any profile lookup.
    pub fn requires_provisioning(self) -> bool {
        !matches!(self, PathZone::AuthCallback)
    }
}

impl std::fmt::Display for PathZone {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            PathZone::PublicAuthPage => write!(f, "public-auth"),
            PathZone::AuthCallback => write!(f, "auth-callback"),
            PathZone::WizardPage(step) => write!(f, "wizard:{}", step),
            PathZone::ProtectedPage => write!(f, "protected"),
        }
    }
}

/// Classify a request path. Total: unknown paths are protected, and so are
/// paths without a canonical form.
///
/// Rules apply to the percent-decoded path in priority order, first match wins:
/// 1. `/login`, `/signup` exactly
/// 2. `/auth` and anything below it
/// 3. `/initial-setup` and its four stage pages exactly
/// 4. everything else
pub fn classify(path: &str) -> PathZone {
    let Some(decoded) = canonical_path(path) else {
        return PathZone::ProtectedPage;
    };
    let path = normalize(&decoded);

    if path == LOGIN_PATH || path == SIGNUP_PATH {
        return PathZone::PublicAuthPage;
    }

    if let Some(rest) = path.strip_prefix(AUTH_PREFIX)
        && (rest.is_empty() || rest.starts_with('/'))
    {
        return PathZone::AuthCallback;
    }

    if let Some(rest) = path.strip_prefix(WIZARD_ROOT_PATH) {
        if rest.is_empty() {
            return PathZone::WizardPage(WizardStep::Root);
        }
        if let Some(stage) = rest.strip_prefix('/').and_then(Stage::from_segment) {
            return PathZone::WizardPage(WizardStep::Stage(stage));
        }
    }

    PathZone::ProtectedPage
}

/// Drop a single trailing slash so `/initial-setup/` matches `/initial-setup`.
fn normalize(path: &str) -> &str {
    if path.len() > 1 {
        path.strip_suffix('/').unwrap_or(path)
    } else {
        path
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_public_auth_pages() {
        assert_eq!(classify("/login"), PathZone::PublicAuthPage);
        assert_eq!(classify("/signup"), PathZone::PublicAuthPage);
        assert_eq!(classify("/login/"), PathZone::PublicAuthPage);
        // Exact match only
        assert_eq!(classify("/login/help"), PathZone::ProtectedPage);
    }

    #[test]
    fn test_auth_callback_prefix() {
        assert_eq!(classify("/auth"), PathZone::AuthCallback);
        assert_eq!(classify("/auth/callback"), PathZone::AuthCallback);
        assert_eq!(classify("/auth/signout"), PathZone::AuthCallback);
        assert_eq!(classify("/authors"), PathZone::ProtectedPage);
    }

    #[test]
    fn test_wizard_pages() {
        assert_eq!(
            classify("/initial-setup"),
            PathZone::WizardPage(WizardStep::Root)
        );
        assert_eq!(
            classify("/initial-setup/"),
            PathZone::WizardPage(WizardStep::Root)
        );
        for stage in Stage::ALL {
            assert_eq!(
                classify(stage.path()),
                PathZone::WizardPage(WizardStep::Stage(stage))
            );
        }
        assert_eq!(classify("/initial-setup/unknown"), PathZone::ProtectedPage);
        assert_eq!(
            classify("/initial-setup/backend/extra"),
            PathZone::ProtectedPage
        );
        assert_eq!(classify("/initial-setupx"), PathZone::ProtectedPage);
    }

    #[test]
    fn test_everything_else_is_protected() {
        for path in ["/", "", "/jobs/top-matches", "/profile", "/api/jobs/1", "//"] {
            assert_eq!(classify(path), PathZone::ProtectedPage, "{path}");
        }
    }

    #[test]
    fn test_traversal_out_of_public_zones_is_protected() {
        for path in [
            "/auth/../jobs",
            "/auth/%2e%2e/jobs/top-matches",
            "/login/../profile",
            "/initial-setup/backend/../../jobs",
            "/_next/static/../../x",
        ] {
            assert_eq!(classify(path), PathZone::ProtectedPage, "{path}");
        }
    }

    #[test]
    fn test_encoded_paths_classify_decoded() {
        assert_eq!(classify("/%6cogin"), PathZone::PublicAuthPage);
        assert_eq!(classify("/%61uth/callback"), PathZone::AuthCallback);
    }

    #[test]
    fn test_redirect_paths_classify_to_their_zone() {
        for step in WizardStep::ALL {
            assert_eq!(classify(step.path()), PathZone::WizardPage(step));
        }
        assert_eq!(classify(HOME_PATH), PathZone::ProtectedPage);
    }
}
