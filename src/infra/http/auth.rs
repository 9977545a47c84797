use axum::{
    Json,
    extract::{State, rejection::JsonRejection},
    http::{HeaderMap, StatusCode},
    response::{IntoResponse, Response},
};
use axum_extra::extract::cookie::{Cookie, CookieJar, SameSite};
use crispr_api_types::{LoginRequest, SessionView};

use crate::application::auth::SessionPrincipal;

use super::AppState;
use super::error::ApiError;
use super::middleware::session_token;

fn session_view(principal: &SessionPrincipal, token: Option<String>) -> SessionView {
    SessionView {
        user_id: principal.user_id,
        name: principal.name.clone(),
        role: principal.role.as_str().to_string(),
        expires_at: principal.expires_at,
        token,
    }
}

pub(super) async fn login(
    State(state): State<AppState>,
    jar: CookieJar,
    payload: Result<Json<LoginRequest>, JsonRejection>,
) -> Response {
    let Json(payload) = match payload {
        Ok(payload) => payload,
        Err(rejection) => return ApiError::bad_json(rejection).into_response(),
    };

    let issued = match state.sessions.login(&payload.email, &payload.password).await {
        Ok(issued) => issued,
        Err(err) => return ApiError::auth(err).into_response(),
    };

    let cookie = Cookie::build((state.session_cookie.name.clone(), issued.token.clone()))
        .path("/")
        .http_only(true)
        .same_site(SameSite::Lax)
        .secure(state.session_cookie.secure)
        .max_age(state.sessions.ttl());

    let view = session_view(&issued.principal, Some(issued.token));
    (jar.add(cookie), Json(view)).into_response()
}

pub(super) async fn logout(
    State(state): State<AppState>,
    jar: CookieJar,
    headers: HeaderMap,
) -> Response {
    let cookie_name = state.session_cookie.name.clone();
    if let Some(token) = session_token(&headers, &cookie_name)
        && let Err(err) = state.sessions.logout(&token).await
    {
        return ApiError::auth(err).into_response();
    }

    let removal = Cookie::build((cookie_name, "")).path("/");
    (jar.remove(removal), StatusCode::NO_CONTENT).into_response()
}

pub(super) async fn current_session(
    State(state): State<AppState>,
    headers: HeaderMap,
) -> Response {
    let token = session_token(&headers, &state.session_cookie.name);
    match state.sessions.authenticate(token.as_deref()).await {
        Ok(principal) => Json(session_view(&principal, None)).into_response(),
        Err(err) => ApiError::from(err).into_response(),
    }
}
