use axum::{
    Json,
    extract::{Path, Query, State, rejection::QueryRejection},
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde::Deserialize;

use super::error::ApiError;
use super::{AppState, db_health_response};

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub(super) struct PostsQuery {
    tag: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub(super) struct RelatedQuery {
    limit: Option<usize>,
}

pub(super) async fn list_posts(
    State(state): State<AppState>,
    query: Result<Query<PostsQuery>, QueryRejection>,
) -> Response {
    let Query(query) = match query {
        Ok(query) => query,
        Err(rejection) => return ApiError::bad_query(rejection).into_response(),
    };
    // An empty `?tag=` means no filter.
    let tag = query.tag.as_deref().filter(|tag| !tag.is_empty());

    match state.content.list_published(tag).await {
        Ok(posts) => Json(posts).into_response(),
        Err(err) => ApiError::content("Failed to fetch blog posts", err).into_response(),
    }
}

pub(super) async fn get_post(State(state): State<AppState>, Path(slug): Path<String>) -> Response {
    match state.content.get_published_by_slug(&slug).await {
        Ok(post) => Json(post).into_response(),
        Err(err) => ApiError::content("Failed to fetch blog post", err).into_response(),
    }
}

pub(super) async fn related_posts(
    State(state): State<AppState>,
    Path(slug): Path<String>,
    query: Result<Query<RelatedQuery>, QueryRejection>,
) -> Response {
    let Query(query) = match query {
        Ok(query) => query,
        Err(rejection) => return ApiError::bad_query(rejection).into_response(),
    };

    match state.content.related_posts(&slug, query.limit).await {
        Ok(posts) => Json(posts).into_response(),
        Err(err) => ApiError::content("Failed to fetch related posts", err).into_response(),
    }
}

pub(super) async fn list_tags(State(state): State<AppState>) -> Response {
    match state.content.list_tags_with_counts().await {
        Ok(tags) => Json(tags).into_response(),
        Err(err) => ApiError::content("Failed to fetch tags", err).into_response(),
    }
}

pub(super) async fn db_health(State(state): State<AppState>) -> Response {
    db_health_response(state.health.health_check().await)
}

pub(super) async fn not_found() -> Response {
    ApiError::new(
        "infra::http::fallback",
        StatusCode::NOT_FOUND,
        "Not found",
        "no route matched",
    )
    .into_response()
}
