//! HTTP surface: public content API, session endpoints and the editor API.

mod admin;
mod auth;
pub mod error;
pub mod middleware;
mod public;

use std::sync::Arc;

use axum::{
    Router,
    http::StatusCode,
    middleware as axum_middleware,
    response::{IntoResponse, Response},
    routing::{get, post},
};
use time::Duration;

use crate::application::admin::posts::AdminPostService;
use crate::application::auth::SessionService;
use crate::application::content::ContentService;
use crate::application::error::ErrorReport;
use crate::application::repos::{
    PostsRepo, PostsWriteRepo, RepoError, SessionsRepo, StoreHealth, TagsRepo, TagsWriteRepo,
    UsersRepo,
};
use crate::infra::cache::ResponseCache;

use self::middleware::{
    cache_public_responses, invalidate_after_writes, log_responses, require_admin_session,
    set_request_context,
};

/// Every repository capability the router needs from one backing store.
pub trait Store:
    PostsRepo + PostsWriteRepo + TagsRepo + TagsWriteRepo + UsersRepo + SessionsRepo + StoreHealth
{
}

impl<T> Store for T where
    T: PostsRepo
        + PostsWriteRepo
        + TagsRepo
        + TagsWriteRepo
        + UsersRepo
        + SessionsRepo
        + StoreHealth
{
}

#[derive(Debug, Clone)]
pub struct SessionCookie {
    pub name: String,
    pub secure: bool,
}

#[derive(Clone)]
pub struct AppState {
    pub content: Arc<ContentService>,
    pub posts: Arc<AdminPostService>,
    pub sessions: Arc<SessionService>,
    pub health: Arc<dyn StoreHealth>,
    pub cache: ResponseCache,
    pub session_cookie: SessionCookie,
}

impl AppState {
    pub fn from_store<S>(
        store: Arc<S>,
        cache: ResponseCache,
        session_ttl: Duration,
        session_cookie: SessionCookie,
    ) -> Self
    where
        S: Store + 'static,
    {
        Self::from_parts(
            store.clone(),
            SessionService::new(store.clone(), store, session_ttl),
            cache,
            session_cookie,
        )
    }

    /// Like [`AppState::from_store`] with a caller-built session service.
    pub fn from_parts<S>(
        store: Arc<S>,
        sessions: SessionService,
        cache: ResponseCache,
        session_cookie: SessionCookie,
    ) -> Self
    where
        S: Store + 'static,
    {
        Self {
            content: Arc::new(ContentService::new(store.clone(), store.clone())),
            posts: Arc::new(AdminPostService::new(
                store.clone(),
                store.clone(),
                store.clone(),
                store.clone(),
            )),
            sessions: Arc::new(sessions),
            health: store,
            cache,
            session_cookie,
        }
    }
}

pub fn build_router(state: AppState) -> Router {
    let cached_routes = Router::new()
        .route("/api/posts", get(public::list_posts))
        .route("/api/posts/{slug}", get(public::get_post))
        .route("/api/posts/{slug}/related", get(public::related_posts))
        .route("/api/tags", get(public::list_tags))
        .route_layer(axum_middleware::from_fn_with_state(
            state.clone(),
            cache_public_responses,
        ));

    let session_routes = Router::new()
        .route("/api/auth/login", post(auth::login))
        .route("/api/auth/logout", post(auth::logout))
        .route("/api/auth/session", get(auth::current_session))
        .route("/_health/db", get(public::db_health));

    let admin_routes = Router::new()
        .route(
            "/api/admin/posts",
            get(admin::list_posts).post(admin::create_post),
        )
        .route("/api/admin/drafts", get(admin::list_drafts))
        .route(
            "/api/admin/posts/{id}",
            get(admin::get_post)
                .put(admin::update_post)
                .delete(admin::delete_post),
        )
        .route("/api/admin/posts/slug/{slug}", get(admin::get_post_by_slug))
        .route("/api/admin/users", get(admin::list_users))
        .route_layer(axum_middleware::from_fn_with_state(
            state.clone(),
            invalidate_after_writes,
        ))
        .route_layer(axum_middleware::from_fn_with_state(
            state.clone(),
            require_admin_session,
        ));

    cached_routes
        .merge(session_routes)
        .merge(admin_routes)
        .fallback(public::not_found)
        .with_state(state)
        .layer(axum_middleware::from_fn(log_responses))
        .layer(axum_middleware::from_fn(set_request_context))
}

fn db_health_response(result: Result<(), RepoError>) -> Response {
    match result {
        Ok(()) => StatusCode::NO_CONTENT.into_response(),
        Err(err) => {
            let mut response = StatusCode::SERVICE_UNAVAILABLE.into_response();
            ErrorReport::from_error(
                "infra::http::db_health",
                StatusCode::SERVICE_UNAVAILABLE,
                &err,
            )
            .attach(&mut response);
            response
        }
    }
}
