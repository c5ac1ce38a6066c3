//! Applying gate decisions to the request/response pair.
//!
//! Credential updates from session resolution travel on every path out of
//! the gate: the forwarded request, the downstream response, redirects, and
//! the fallback page.

use axum::{
    body::Body,
    http::{
        HeaderValue, Request, StatusCode,
        header::{CACHE_CONTROL, CONTENT_TYPE, COOKIE, LOCATION, SET_COOKIE},
    },
    response::{IntoResponse, Response},
};
use log::warn;

use super::config::RedirectStatus;
use crate::auth::{CredentialUpdate, apply_to_cookie_header};

/// Query parameter marking a landing page reached after a backend failure.
pub const DIAGNOSTIC_PARAM: &str = "error";
/// Diagnostic value used when provisioning state could not be loaded.
pub const PROFILE_FETCH_FAILED: &str = "profile_fetch_failed";

/// Make updated credentials visible to downstream handlers.
///
/// Cookies split over several header lines (as HTTP/2 clients send them) are
/// merged into the single rewritten header.
pub fn forward_credentials(req: &mut Request<Body>, updates: &[CredentialUpdate]) {
    if updates.is_empty() {
        return;
    }

    let lines: Vec<&str> = req
        .headers()
        .get_all(COOKIE)
        .iter()
        .filter_map(|h| h.to_str().ok())
        .filter(|line| !line.trim().is_empty())
        .collect();
    let existing = (!lines.is_empty()).then(|| lines.join("; "));
    req.headers_mut().remove(COOKIE);

    if let Some(rewritten) = apply_to_cookie_header(existing.as_deref(), updates) {
        match HeaderValue::from_str(&rewritten) {
            Ok(value) => {
                req.headers_mut().insert(COOKIE, value);
            }
            Err(e) => warn!("Dropping unrepresentable Cookie header: {}", e),
        }
    }
}

/// Append `Set-Cookie` headers for every credential update.
pub fn attach_credentials(response: &mut Response, updates: &[CredentialUpdate]) {
    for update in updates {
        match HeaderValue::from_str(&update.to_set_cookie()) {
            Ok(value) => {
                response.headers_mut().append(SET_COOKIE, value);
            }
            Err(e) => warn!("Skipping unrepresentable cookie {}: {}", update.name, e),
        }
    }
}

/// Redirect response carrying the credential updates.
pub fn redirect(location: &str, status: RedirectStatus, updates: &[CredentialUpdate]) -> Response {
    let mut response = match HeaderValue::from_str(location) {
        Ok(location) => (status.status_code(), [(LOCATION, location)]).into_response(),
        Err(e) => {
            warn!("Invalid redirect location {}: {}", location, e);
            StatusCode::INTERNAL_SERVER_ERROR.into_response()
        }
    };
    attach_credentials(&mut response, updates);
    response
}

/// Home path carrying a diagnostic marker.
pub fn diagnostic_home(code: &str) -> String {
    format!("/?{}={}", DIAGNOSTIC_PARAM, urlencoding::encode(code))
}

/// Whether a query string carries the given diagnostic marker.
pub fn has_diagnostic(query: Option<&str>, code: &str) -> bool {
    query.is_some_and(|q| {
        q.split('&').any(|pair| {
            let mut parts = pair.splitn(2, '=');
            let key = parts.next().unwrap_or_default();
            let value = parts.next().unwrap_or_default();
            key == DIAGNOSTIC_PARAM
                && urlencoding::decode(value).is_ok_and(|decoded| decoded == code)
        })
    })
}

/// Minimal landing page served when the diagnostic redirect itself cannot be gated.
pub fn fallback_page(code: &str, updates: &[CredentialUpdate]) -> Response {
    let body = format!(
        "<!doctype html>\n<html><head><title>Job Tracker</title></head>\
         <body><main><h1>We couldn't load your account</h1>\
         <p>Please reload the page in a moment. If this keeps happening, contact support \
         and mention the code <code>{}</code>.</p></main></body></html>\n",
        code
    );

    let mut response = (
        StatusCode::OK,
        [
            (CONTENT_TYPE, HeaderValue::from_static("text/html; charset=utf-8")),
            (CACHE_CONTROL, HeaderValue::from_static("no-store")),
        ],
        body,
    )
        .into_response();
    attach_credentials(&mut response, updates);
    response
}

#[cfg(test)]
mod tests {
    use super::*;

    fn updates() -> Vec<CredentialUpdate> {
        vec![
            CredentialUpdate::set("auth_token", "fresh", 3600, true),
            CredentialUpdate::clear("refresh_token", true),
        ]
    }

    fn set_cookies(response: &Response) -> Vec<String> {
        response
            .headers()
            .get_all(SET_COOKIE)
            .iter()
            .map(|v| v.to_str().unwrap().to_string())
            .collect()
    }

    #[test]
    fn test_redirect_carries_credentials() {
        let response = redirect("/login", RedirectStatus::Temporary, &updates());

        assert_eq!(response.status(), StatusCode::TEMPORARY_REDIRECT);
        assert_eq!(response.headers().get(LOCATION).unwrap(), "/login");
        let cookies = set_cookies(&response);
        assert_eq!(cookies.len(), 2);
        assert!(cookies[0].starts_with("auth_token=fresh;"));
        assert!(cookies[1].starts_with("refresh_token=;"));
    }

    #[test]
    fn test_redirect_found_status() {
        let response = redirect("/", RedirectStatus::Found, &[]);
        assert_eq!(response.status(), StatusCode::FOUND);
        assert!(set_cookies(&response).is_empty());
    }

    #[test]
    fn test_forward_credentials_rewrites_cookie_header() {
        let mut req = Request::builder()
            .uri("/jobs")
            .header(COOKIE, "auth_token=stale; refresh_token=r1; theme=dark")
            .body(Body::empty())
            .unwrap();

        forward_credentials(&mut req, &updates());

        assert_eq!(
            req.headers().get(COOKIE).unwrap(),
            "theme=dark; auth_token=fresh"
        );
    }

    #[test]
    fn test_forward_credentials_merges_split_cookie_lines() {
        let mut req = Request::builder()
            .uri("/jobs")
            .header(COOKIE, "auth_token=stale")
            .header(COOKIE, "theme=dark")
            .header(COOKIE, "sb-project-ref=abc")
            .body(Body::empty())
            .unwrap();

        forward_credentials(&mut req, &updates());

        let forwarded: Vec<_> = req.headers().get_all(COOKIE).iter().collect();
        assert_eq!(forwarded.len(), 1);
        assert_eq!(forwarded[0], "theme=dark; sb-project-ref=abc; auth_token=fresh");
    }

    #[test]
    fn test_forward_credentials_without_updates_is_untouched() {
        let mut req = Request::builder()
            .uri("/jobs")
            .header(COOKIE, "auth_token=tok")
            .body(Body::empty())
            .unwrap();

        forward_credentials(&mut req, &[]);
        assert_eq!(req.headers().get(COOKIE).unwrap(), "auth_token=tok");
    }

    #[test]
    fn test_diagnostic_marker() {
        let location = diagnostic_home(PROFILE_FETCH_FAILED);
        assert_eq!(location, "/?error=profile_fetch_failed");

        assert!(has_diagnostic(
            Some("error=profile_fetch_failed"),
            PROFILE_FETCH_FAILED
        ));
        assert!(has_diagnostic(
            Some("page=2&error=profile_fetch_failed"),
            PROFILE_FETCH_FAILED
        ));
        assert!(!has_diagnostic(Some("error=other"), PROFILE_FETCH_FAILED));
        assert!(!has_diagnostic(None, PROFILE_FETCH_FAILED));
    }

    #[test]
    fn test_fallback_page_carries_credentials() {
        let response = fallback_page(PROFILE_FETCH_FAILED, &updates());
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(response.headers().get(CACHE_CONTROL).unwrap(), "no-store");
        assert_eq!(set_cookies(&response).len(), 2);
    }
}
