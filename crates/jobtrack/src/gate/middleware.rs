//! Request gate middleware.

use axum::{
    body::Body,
    extract::{FromRequestParts, State},
    http::{Request, StatusCode, request::Parts},
    middleware::Next,
    response::{IntoResponse, Response},
};
use log::{debug, error, warn};
use std::sync::Arc;

use super::config::GateConfig;
use super::decision::{GateDecision, decide};
use super::finalize::{self, PROFILE_FETCH_FAILED};
use super::path::canonical_path;
use super::zone::{HOME_PATH, PathZone, classify};
use crate::auth::{AuthError, Credentials, IdentityProvider, Resolution, Session};
use crate::provisioning::{ProvisioningLoader, ProvisioningState};

/// State shared by every gated request. Holds no per-request data.
#[derive(Clone)]
pub struct GateState {
    identity: Arc<dyn IdentityProvider>,
    provisioning: ProvisioningLoader,
    config: Arc<GateConfig>,
}

impl GateState {
    pub fn new(
        identity: Arc<dyn IdentityProvider>,
        provisioning: ProvisioningLoader,
        config: GateConfig,
    ) -> Self {
        Self {
            identity,
            provisioning,
            config: Arc::new(config),
        }
    }

    pub fn config(&self) -> &GateConfig {
        &self.config
    }
}

/// Gate outcome attached to requests that were allowed through.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GateContext {
    pub session: Session,
    pub zone: PathZone,
}

impl GateContext {
    /// Get the user ID, if authenticated.
    pub fn user_id(&self) -> Option<&str> {
        self.session.user_id()
    }
}

/// Extract the gate outcome in downstream handlers.
impl<S> FromRequestParts<S> for GateContext
where
    S: Send + Sync,
{
    type Rejection = AuthError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        parts
            .extensions
            .get::<GateContext>()
            .cloned()
            .ok_or(AuthError::MissingSession)
    }
}

/// Gate middleware.
///
/// Requests whose path has dot segments or encoded separators are refused
/// with 400 before anything else. Then, outside the bypass prefixes:
/// 1. Resolve the session from cookies (failure evaluates as anonymous)
/// 2. Classify the path
/// 3. Load provisioning state for authenticated callers
/// 4. Decide
/// 5. Forward or redirect, propagating refreshed credentials either way
pub async fn gate_middleware(
    State(gate): State<GateState>,
    mut req: Request<Body>,
    next: Next,
) -> Response {
    let path = req.uri().path().to_string();
    if canonical_path(&path).is_none() {
        warn!("Gate: refusing non-canonical path {}", path);
        return (StatusCode::BAD_REQUEST, "invalid request path").into_response();
    }
    if gate.config.is_bypassed(&path) {
        return next.run(req).await;
    }

    let credentials = Credentials::from_headers(req.headers());
    let resolution = match gate.identity.resolve(&credentials).await {
        Ok(resolution) => resolution,
        Err(e) => {
            warn!(
                "Gate: session resolution failed, treating as anonymous. Path: {}: {}",
                path, e
            );
            Resolution::anonymous()
        }
    };

    let zone = classify(&path);

    let state = match resolution.session.user_id() {
        Some(user_id) if zone.requires_provisioning() => {
            match gate.provisioning.load(user_id).await {
                Ok(state) => state,
                Err(e) => {
                    error!(
                        "Gate: error fetching provisioning state for user {}: {}. Path: {}",
                        user_id, e, path
                    );
                    return provisioning_failure(&gate, &req, &resolution);
                }
            }
        }
        // Not consulted by the decision for these callers.
        _ => ProvisioningState::default(),
    };

    let decision = decide(&resolution.session, zone, &state);
    debug!("Gate: {} {} ({}) -> {}", resolution.session, path, zone, decision);

    match decision {
        GateDecision::Allow => {
            finalize::forward_credentials(&mut req, &resolution.updates);
            req.extensions_mut().insert(GateContext {
                session: resolution.session,
                zone,
            });

            let mut response = next.run(req).await;
            finalize::attach_credentials(&mut response, &resolution.updates);
            response
        }
        GateDecision::RedirectTo(target) => finalize::redirect(
            target.path(),
            gate.config.redirect_status,
            &resolution.updates,
        ),
    }
}

/// Fail closed when provisioning state is unavailable.
///
/// Sends the caller to the home page with a diagnostic marker. If the marked
/// home request fails as well, answer with the fallback page instead of
/// redirecting to itself.
fn provisioning_failure(
    gate: &GateState,
    req: &Request<Body>,
    resolution: &Resolution,
) -> Response {
    let already_marked = req.uri().path() == HOME_PATH
        && finalize::has_diagnostic(req.uri().query(), PROFILE_FETCH_FAILED);

    if already_marked {
        return finalize::fallback_page(PROFILE_FETCH_FAILED, &resolution.updates);
    }

    finalize::redirect(
        &finalize::diagnostic_home(PROFILE_FETCH_FAILED),
        gate.config.redirect_status,
        &resolution.updates,
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::CredentialUpdate;
    use crate::provisioning::{ProfileRecord, ProfileStore, ProviderConfigStore, StoreError};
    use async_trait::async_trait;
    use axum::{Router, http::header::LOCATION, middleware, routing::get};
    use tower::ServiceExt;

    /// Resolves every request the same way; `None` simulates an unreachable provider.
    struct FixedIdentity(Option<Resolution>);

    #[async_trait]
    impl IdentityProvider for FixedIdentity {
        async fn resolve(&self, _credentials: &Credentials) -> Result<Resolution, AuthError> {
            self.0
                .clone()
                .ok_or_else(|| AuthError::ResolutionFailed("idp down".to_string()))
        }
    }

    struct Profiles(Result<Option<ProfileRecord>, ()>);

    #[async_trait]
    impl ProfileStore for Profiles {
        async fn fetch(&self, _user_id: &str) -> Result<Option<ProfileRecord>, StoreError> {
            self.0
                .clone()
                .map_err(|_| StoreError::Backend("profiles unavailable".to_string()))
        }
    }

    struct NoProviders;

    #[async_trait]
    impl ProviderConfigStore for NoProviders {
        async fn provider_config_id(&self, _user_id: &str) -> Result<Option<String>, StoreError> {
            Ok(None)
        }
    }

    fn completed_profile() -> ProfileRecord {
        ProfileRecord {
            setup_completed: true,
            ..ProfileRecord::default()
        }
    }

    fn app(identity: Option<Resolution>, profile: Result<Option<ProfileRecord>, ()>) -> Router {
        let state = GateState::new(
            Arc::new(FixedIdentity(identity)),
            ProvisioningLoader::new(Arc::new(Profiles(profile)), Arc::new(NoProviders)),
            GateConfig::default(),
        );

        Router::new()
            .route("/", get(|| async { "home" }))
            .route("/jobs", get(|ctx: GateContext| async move { ctx.zone.to_string() }))
            .route("/login", get(|| async { "login" }))
            .route("/_next/static/app.js", get(|| async { "asset" }))
            .layer(middleware::from_fn_with_state(state, gate_middleware))
    }

    async fn send(app: Router, uri: &str) -> Response {
        app.oneshot(Request::builder().uri(uri).body(Body::empty()).unwrap())
            .await
            .unwrap()
    }

    fn location(response: &Response) -> &str {
        response.headers().get(LOCATION).unwrap().to_str().unwrap()
    }

    #[tokio::test]
    async fn test_anonymous_redirected_to_login() {
        let response = send(app(Some(Resolution::anonymous()), Ok(None)), "/jobs").await;
        assert_eq!(response.status(), StatusCode::TEMPORARY_REDIRECT);
        assert_eq!(location(&response), "/login");
    }

    #[tokio::test]
    async fn test_static_assets_bypass_gate() {
        let response = send(
            app(Some(Resolution::anonymous()), Ok(None)),
            "/_next/static/app.js",
        )
        .await;
        assert_eq!(response.status(), StatusCode::OK);
    }

    #[tokio::test]
    async fn test_dot_segments_refused_before_bypass_or_auth_zone() {
        for uri in [
            "/auth/../jobs",
            "/_next/static/../../jobs",
            "/_next/static/%2e%2e/%2e%2e/jobs",
        ] {
            let response = send(app(Some(Resolution::anonymous()), Ok(None)), uri).await;
            assert_eq!(response.status(), StatusCode::BAD_REQUEST, "{uri}");
        }
    }

    #[tokio::test]
    async fn test_resolution_failure_evaluates_as_anonymous() {
        let response = send(app(None, Ok(None)), "/jobs").await;
        assert_eq!(location(&response), "/login");

        let response = send(app(None, Ok(None)), "/login").await;
        assert_eq!(response.status(), StatusCode::OK);
    }

    #[tokio::test]
    async fn test_allowed_request_carries_context_and_cookies() {
        let resolution = Resolution::authenticated("usr_1")
            .with_update(CredentialUpdate::set("auth_token", "fresh", 3600, true));

        let response = send(app(Some(resolution), Ok(Some(completed_profile()))), "/jobs").await;
        assert_eq!(response.status(), StatusCode::OK);
        assert!(
            response
                .headers()
                .get(axum::http::header::SET_COOKIE)
                .unwrap()
                .to_str()
                .unwrap()
                .starts_with("auth_token=fresh;")
        );
    }

    #[tokio::test]
    async fn test_provisioning_failure_fails_closed_without_loop() {
        let identity = Some(Resolution::authenticated("usr_1"));

        let response = send(app(identity.clone(), Err(())), "/jobs").await;
        assert_eq!(response.status(), StatusCode::TEMPORARY_REDIRECT);
        assert_eq!(location(&response), "/?error=profile_fetch_failed");

        let response = send(app(identity, Err(())), "/?error=profile_fetch_failed").await;
        assert_eq!(response.status(), StatusCode::OK);
        assert!(response.headers().get(LOCATION).is_none());
    }
}
