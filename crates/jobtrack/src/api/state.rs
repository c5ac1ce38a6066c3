//! Application state shared across handlers.

use axum::body::Body;
use hyper_util::client::legacy::Client;
use hyper_util::client::legacy::connect::HttpConnector;
use hyper_util::rt::TokioExecutor;

use crate::gate::GateState;

/// Web application that gated requests are forwarded to.
#[derive(Clone, Debug)]
pub struct Upstream {
    /// Base URL, e.g. `http://127.0.0.1:3000`.
    pub base_url: String,
    pub client: Client<HttpConnector, Body>,
}

impl Upstream {
    pub fn new(base_url: impl Into<String>) -> Self {
        let client: Client<HttpConnector, Body> =
            Client::builder(TokioExecutor::new()).build_http();

        Self {
            base_url: base_url.into().trim_end_matches('/').to_string(),
            client,
        }
    }
}

/// Application state shared across handlers.
#[derive(Clone)]
pub struct AppState {
    /// Identity provider, provisioning loader, and gate configuration.
    pub gate: GateState,
    /// Upstream web application; `None` serves only locally routed pages.
    pub upstream: Option<Upstream>,
}

impl AppState {
    pub fn new(gate: GateState, upstream: Option<Upstream>) -> Self {
        Self { gate, upstream }
    }
}
