//! Request middleware: database selection and response security headers.

use crate::routing::{RequestDatabase, set_current_database};
use crate::server::AppState;
use axum::{
    body::Body,
    extract::State,
    http::{HeaderValue, Request, header},
    middleware::Next,
    response::Response,
};
use axum_extra::extract::cookie::SignedCookieJar;
use tracing::debug;

/// Session cookie carrying the selected database alias.
pub const SESSION_DATABASE_COOKIE: &str = "selected_database";

pub const CROSS_ORIGIN_OPENER_POLICY: &str = "cross-origin-opener-policy";

/// Resolve the session's database choice and make it current for the request.
///
/// The validated choice is stored in the calling thread's slot and inserted
/// into the request extensions as a `RequestDatabase`.
pub async fn database_selector(
    State(state): State<AppState>,
    mut request: Request<Body>,
    next: Next,
) -> Response {
    let jar = SignedCookieJar::from_headers(request.headers(), state.cookie_key.clone());
    let candidate = jar.get(SESSION_DATABASE_COOKIE);
    let selection = RequestDatabase::resolve(&state.catalog, candidate.as_ref().map(|c| c.value()));

    debug!(
        database = %selection.alias,
        requested = ?candidate.as_ref().map(|c| c.value()),
        "Selected database for request"
    );

    set_current_database(selection.alias.clone());
    request.extensions_mut().insert(selection);

    next.run(request).await
}

/// Default security headers for admin responses.
pub async fn security_headers(request: Request<Body>, next: Next) -> Response {
    let mut response = next.run(request).await;
    let headers = response.headers_mut();
    headers
        .entry(CROSS_ORIGIN_OPENER_POLICY)
        .or_insert(HeaderValue::from_static("same-origin"));
    headers
        .entry(header::X_CONTENT_TYPE_OPTIONS)
        .or_insert(HeaderValue::from_static("nosniff"));
    response
}

/// Drop `Cross-Origin-Opener-Policy` in debug mode or over plain HTTP.
pub async fn strip_coop(State(state): State<AppState>, request: Request<Body>, next: Next) -> Response {
    let plain_http = is_plain_http(&request);
    let mut response = next.run(request).await;
    if state.debug || plain_http {
        response.headers_mut().remove(CROSS_ORIGIN_OPENER_POLICY);
    }
    response
}

/// The scheme the client used, as reported by a TLS-terminating proxy.
fn is_plain_http(request: &Request<Body>) -> bool {
    request
        .headers()
        .get("x-forwarded-proto")
        .and_then(|v| v.to_str().ok())
        .map(|proto| !proto.trim().eq_ignore_ascii_case("https"))
        .unwrap_or(true)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn request_with_proto(proto: Option<&str>) -> Request<Body> {
        let mut builder = Request::builder().uri("/admin/");
        if let Some(proto) = proto {
            builder = builder.header("x-forwarded-proto", proto);
        }
        builder.body(Body::empty()).unwrap()
    }

    #[test]
    fn test_plain_http_detection() {
        assert!(is_plain_http(&request_with_proto(None)));
        assert!(is_plain_http(&request_with_proto(Some("http"))));
        assert!(!is_plain_http(&request_with_proto(Some("https"))));
        assert!(!is_plain_http(&request_with_proto(Some("HTTPS"))));
    }
}
