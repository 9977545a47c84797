use std::time::Instant;

use axum::{
    body::Body,
    extract::State,
    http::{HeaderMap, Method, Request, header},
    middleware::Next,
    response::{IntoResponse, Response},
};
use axum_extra::extract::cookie::CookieJar;
use metrics::histogram;
use tracing::{debug, error, warn};
use uuid::Uuid;

use crate::application::auth::SessionPrincipal;
use crate::application::error::ErrorReport;
use crate::infra::cache::should_store_response;

use super::AppState;
use super::error::ApiError;

pub const METRIC_HTTP_REQUEST_MS: &str = "crispr_http_request_ms";

#[derive(Clone)]
pub struct RequestContext {
    pub request_id: String,
}

pub async fn set_request_context(mut request: Request<Body>, next: Next) -> Response {
    let request_id = Uuid::new_v4().to_string();
    let ctx = RequestContext {
        request_id: request_id.clone(),
    };
    request.extensions_mut().insert(ctx.clone());

    let mut response = next.run(request).await;
    response.extensions_mut().insert(ctx);
    response
}

pub async fn log_responses(request: Request<Body>, next: Next) -> Response {
    let method = request.method().clone();
    let uri = request.uri().clone();
    let start = Instant::now();

    let request_id = request
        .extensions()
        .get::<RequestContext>()
        .map(|ctx| ctx.request_id.clone())
        .unwrap_or_default();

    let mut response = next.run(request).await;
    let status = response.status();
    let elapsed = start.elapsed();
    histogram!(
        METRIC_HTTP_REQUEST_MS,
        "method" => method.to_string(),
        "status" => status.as_u16().to_string()
    )
    .record(elapsed.as_secs_f64() * 1000.0);

    if status.is_client_error() || status.is_server_error() {
        let elapsed_ms = elapsed.as_millis();
        let user_id = response
            .extensions()
            .get::<SessionPrincipal>()
            .map(|principal| principal.user_id.to_string())
            .unwrap_or_default();
        let report = response.extensions_mut().remove::<ErrorReport>();
        let (source, messages) = match report {
            Some(report) => (report.source, report.messages),
            None => ("unknown", Vec::new()),
        };
        let detail = messages
            .first()
            .cloned()
            .unwrap_or_else(|| "no diagnostic available".to_string());

        if status.is_server_error() {
            error!(
                target = "crispr::http::response",
                status = status.as_u16(),
                method = %method,
                path = %uri.path(),
                query = uri.query().unwrap_or(""),
                elapsed_ms = elapsed_ms,
                source = source,
                detail = %detail,
                chain = ?messages,
                request_id = request_id,
                user_id = user_id,
                "request failed",
            );
        } else {
            warn!(
                target = "crispr::http::response",
                status = status.as_u16(),
                method = %method,
                path = %uri.path(),
                query = uri.query().unwrap_or(""),
                elapsed_ms = elapsed_ms,
                source = source,
                detail = %detail,
                chain = ?messages,
                request_id = request_id,
                user_id = user_id,
                "client request error",
            );
        }
    }

    response
}

/// Pull the session token from the cookie, falling back to a bearer header.
pub fn session_token(headers: &HeaderMap, cookie_name: &str) -> Option<String> {
    let jar = CookieJar::from_headers(headers);
    if let Some(cookie) = jar.get(cookie_name) {
        return Some(cookie.value().to_string());
    }

    headers
        .get(header::AUTHORIZATION)
        .and_then(|value| value.to_str().ok())
        .and_then(|value| value.strip_prefix("Bearer "))
        .map(|token| token.trim().to_string())
}

/// Reject requests without an admin session; the principal is passed on in
/// the request extensions.
pub async fn require_admin_session(
    State(state): State<AppState>,
    mut request: Request<Body>,
    next: Next,
) -> Response {
    let token = session_token(request.headers(), &state.session_cookie.name);

    let principal = match state
        .sessions
        .authenticate(token.as_deref())
        .await
        .and_then(SessionPrincipal::require_admin)
    {
        Ok(principal) => principal,
        Err(err) => return ApiError::from(err).into_response(),
    };

    request.extensions_mut().insert(principal.clone());
    let mut response = next.run(request).await;
    response.extensions_mut().insert(principal);
    response
}

/// Serve public GET responses from the response cache when fresh.
pub async fn cache_public_responses(
    State(state): State<AppState>,
    request: Request<Body>,
    next: Next,
) -> Response {
    if !state.cache.is_enabled() || request.method() != Method::GET {
        return next.run(request).await;
    }

    let key = request
        .uri()
        .path_and_query()
        .map(|pq| pq.as_str().to_string())
        .unwrap_or_else(|| request.uri().path().to_string());

    if let Some(cached) = state.cache.get(&key).await {
        debug!(target = "crispr::http::cache", key = %key, outcome = "hit", "serving cached response");
        return cached;
    }

    let epoch = state.cache.epoch();
    let response = next.run(request).await;
    if !should_store_response(&response) {
        return response;
    }

    match state.cache.store_response(&key, response, epoch).await {
        Ok(response) => response,
        Err((response, err)) => {
            warn!(target = "crispr::http::cache", key = %key, error = %err, "failed to cache response");
            response
        }
    }
}

/// Drop every cached public response after a successful editor write.
pub async fn invalidate_after_writes(
    State(state): State<AppState>,
    request: Request<Body>,
    next: Next,
) -> Response {
    let mutating = !matches!(*request.method(), Method::GET | Method::HEAD);
    let response = next.run(request).await;

    if mutating && response.status().is_success() {
        state.cache.invalidate_all().await;
        debug!(target = "crispr::http::cache", "response cache cleared after write");
    }

    response
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::HeaderValue;

    #[test]
    fn session_token_prefers_cookie_over_bearer() {
        let mut headers = HeaderMap::new();
        headers.insert(header::COOKIE, HeaderValue::from_static("crispr_session=from-cookie"));
        headers.insert(
            header::AUTHORIZATION,
            HeaderValue::from_static("Bearer from-header"),
        );

        assert_eq!(
            session_token(&headers, "crispr_session").as_deref(),
            Some("from-cookie")
        );
        assert_eq!(
            session_token(&headers, "other").as_deref(),
            Some("from-header")
        );
    }

    #[test]
    fn session_token_ignores_other_schemes() {
        let mut headers = HeaderMap::new();
        headers.insert(header::AUTHORIZATION, HeaderValue::from_static("Basic abc"));
        assert!(session_token(&headers, "crispr_session").is_none());
    }
}
