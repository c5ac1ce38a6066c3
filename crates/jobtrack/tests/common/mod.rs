//! Test utilities and common setup.
#![allow(dead_code)]

use axum::{
    Json, Router,
    body::Body,
    http::{Request, header},
    response::Response,
    routing::get,
};
use chrono::Utc;
use jobtrack::api::{self, AppState, Upstream};
use jobtrack::auth::{AuthConfig, IdentityProvider, JwtIdentityProvider};
use jobtrack::db::Database;
use jobtrack::gate::{GateConfig, GateContext, GateState};
use jobtrack::provisioning::ProvisioningLoader;
use serde_json::{Value, json};
use std::sync::Arc;
use tower::ServiceExt;

pub const TEST_SECRET: &str = "test-secret-for-integration-tests-minimum-32-chars";

/// Create a test AuthConfig with a JWT secret for testing.
pub fn test_auth_config() -> AuthConfig {
    AuthConfig {
        jwt_secret: Some(TEST_SECRET.to_string()),
        insecure_cookies: true,
        ..AuthConfig::default()
    }
}

/// Gated application backed by an in-memory database.
pub struct TestApp {
    pub router: Router,
    pub db: Database,
    pub jwt: JwtIdentityProvider,
}

/// Page handler echoing what the gate forwarded.
async fn echo(req: Request<Body>) -> Json<Value> {
    let ctx = req.extensions().get::<GateContext>().cloned();
    let cookie = req
        .headers()
        .get(header::COOKIE)
        .and_then(|h| h.to_str().ok())
        .map(str::to_string);

    Json(json!({
        "path": req.uri().path(),
        "gated": ctx.is_some(),
        "user_id": ctx.as_ref().and_then(|c| c.user_id().map(str::to_string)),
        "zone": ctx.map(|c| c.zone.to_string()),
        "cookie": cookie,
    }))
}

fn echo_pages() -> Router<AppState> {
    Router::new()
        .route("/", get(echo))
        .route("/{*rest}", get(echo))
}

async fn build(
    identity: Option<Arc<dyn IdentityProvider>>,
    upstream: Option<Upstream>,
    pages: bool,
) -> TestApp {
    let db = Database::in_memory().await.expect("in-memory database");
    let jwt = JwtIdentityProvider::new(test_auth_config()).expect("jwt provider");
    let identity = identity.unwrap_or_else(|| Arc::new(jwt.clone()));

    let gate = GateState::new(
        identity,
        ProvisioningLoader::sqlite(db.pool().clone()),
        GateConfig::default(),
    );
    let state = AppState::new(gate, upstream);
    let router = if pages {
        api::create_router_with_pages(state, echo_pages())
    } else {
        api::create_router(state)
    };

    TestApp { router, db, jwt }
}

/// App whose pages echo the gate's view of each request.
pub async fn test_app() -> TestApp {
    build(None, None, true).await
}

/// Echoing app resolving sessions through `identity`.
pub async fn test_app_with_identity(identity: Arc<dyn IdentityProvider>) -> TestApp {
    build(Some(identity), None, true).await
}

/// App proxying every gated request to `upstream`.
pub async fn test_app_with_upstream(upstream: &str) -> TestApp {
    build(None, Some(Upstream::new(upstream)), false).await
}

impl TestApp {
    /// `Cookie` header value carrying a fresh session token.
    pub fn session_cookie(&self, user_id: &str) -> String {
        let token = self.jwt.issue_token(user_id, None).expect("issue token");
        format!("auth_token={}", token)
    }

    pub async fn get(&self, uri: &str, cookie: Option<&str>) -> Response {
        let mut builder = Request::builder().uri(uri);
        if let Some(cookie) = cookie {
            builder = builder.header(header::COOKIE, cookie);
        }
        self.router
            .clone()
            .oneshot(builder.body(Body::empty()).unwrap())
            .await
            .unwrap()
    }

    /// Send a GET with each cookie on its own header line.
    pub async fn get_with_cookie_lines(&self, uri: &str, cookies: &[&str]) -> Response {
        let mut builder = Request::builder().uri(uri);
        for cookie in cookies {
            builder = builder.header(header::COOKIE, *cookie);
        }
        self.router
            .clone()
            .oneshot(builder.body(Body::empty()).unwrap())
            .await
            .unwrap()
    }

    /// Insert or update a profile row.
    pub async fn upsert_profile(
        &self,
        user_id: &str,
        setup_completed: bool,
        backend_done: bool,
        ai_done: bool,
        document_id: Option<&str>,
    ) {
        sqlx::query(
            r#"
            INSERT INTO profiles (id, setup_completed, backend_stage_completed_at, ai_stage_completed_at, default_document_id)
            VALUES (?, ?, ?, ?, ?)
            ON CONFLICT(id) DO UPDATE SET
                setup_completed = excluded.setup_completed,
                backend_stage_completed_at = excluded.backend_stage_completed_at,
                ai_stage_completed_at = excluded.ai_stage_completed_at,
                default_document_id = excluded.default_document_id
            "#,
        )
        .bind(user_id)
        .bind(setup_completed)
        .bind(backend_done.then(Utc::now))
        .bind(ai_done.then(Utc::now))
        .bind(document_id)
        .execute(self.db.pool())
        .await
        .expect("upsert profile");
    }

    pub async fn add_provider_config(&self, user_id: &str, id: &str) {
        sqlx::query("INSERT INTO provider_configs (id, user_id, provider) VALUES (?, ?, ?)")
            .bind(id)
            .bind(user_id)
            .bind("linkedin")
            .execute(self.db.pool())
            .await
            .expect("insert provider config");
    }
}

pub fn location(response: &Response) -> Option<String> {
    response
        .headers()
        .get(header::LOCATION)
        .and_then(|h| h.to_str().ok())
        .map(str::to_string)
}

pub fn set_cookies(response: &Response) -> Vec<String> {
    response
        .headers()
        .get_all(header::SET_COOKIE)
        .iter()
        .filter_map(|h| h.to_str().ok())
        .map(str::to_string)
        .collect()
}

pub async fn body_json(response: Response) -> Value {
    let body = axum::body::to_bytes(response.into_body(), 1024 * 1024)
        .await
        .unwrap();
    serde_json::from_slice(&body).unwrap()
}
