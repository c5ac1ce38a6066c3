//! Reverse proxy to the upstream web application.

use axum::{
    body::Body,
    extract::State,
    http::{HeaderValue, Request, Uri, header::HOST},
    response::Response,
};
use log::{debug, error};

use super::error::{ApiError, ApiResult};
use super::state::AppState;

/// Forward a request that passed the gate to the upstream application.
pub async fn forward_upstream(
    State(state): State<AppState>,
    mut req: Request<Body>,
) -> ApiResult<Response> {
    let Some(upstream) = state.upstream else {
        return Err(ApiError::not_found(req.uri().path().to_string()));
    };

    let path_and_query = req
        .uri()
        .path_and_query()
        .map(|pq| pq.as_str())
        .unwrap_or("/");
    let target_uri = format!("{}{}", upstream.base_url, path_and_query);

    debug!("Proxying request to {}", target_uri);

    let uri: Uri = target_uri.parse().map_err(|e| {
        error!("Invalid target URI {}: {:?}", target_uri, e);
        ApiError::internal(format!("invalid upstream URI {}", target_uri))
    })?;

    *req.uri_mut() = uri;

    // Host must match the upstream authority.
    if let Some(authority) = req.uri().authority() {
        let value = HeaderValue::from_str(authority.as_str()).map_err(|e| {
            error!("Invalid Host header value {}: {:?}", authority.as_str(), e);
            ApiError::internal("invalid upstream authority")
        })?;
        req.headers_mut().insert(HOST, value);
    }

    let response = upstream
        .client
        .request(req)
        .await
        .map_err(|e| ApiError::bad_gateway(format!("upstream request failed: {}", e)))?;

    let (parts, body) = response.into_parts();
    Ok(Response::from_parts(parts, Body::new(body)))
}
