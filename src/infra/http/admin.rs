use axum::{
    Json,
    extract::{
        Path, State,
        rejection::{JsonRejection, PathRejection},
    },
    http::StatusCode,
    response::{IntoResponse, Response},
};
use crispr_api_types::PostWriteRequest;
use uuid::Uuid;

use crate::application::admin::posts::WritePostCommand;

use super::AppState;
use super::error::ApiError;

type IdPath = Result<Path<Uuid>, PathRejection>;
type WriteBody = Result<Json<PostWriteRequest>, JsonRejection>;

pub(super) async fn list_posts(State(state): State<AppState>) -> Response {
    match state.posts.list_all(None).await {
        Ok(posts) => Json(posts).into_response(),
        Err(err) => ApiError::admin("Failed to fetch posts", err).into_response(),
    }
}

pub(super) async fn list_drafts(State(state): State<AppState>) -> Response {
    match state.posts.list_all(Some(false)).await {
        Ok(posts) => Json(posts).into_response(),
        Err(err) => ApiError::admin("Failed to fetch drafts", err).into_response(),
    }
}

pub(super) async fn get_post(State(state): State<AppState>, id: IdPath) -> Response {
    let Path(id) = match id {
        Ok(id) => id,
        Err(rejection) => return ApiError::bad_path(rejection).into_response(),
    };

    match state.posts.get_by_id(id).await {
        Ok(post) => Json(post).into_response(),
        Err(err) => ApiError::admin("Failed to fetch post", err).into_response(),
    }
}

pub(super) async fn get_post_by_slug(
    State(state): State<AppState>,
    Path(slug): Path<String>,
) -> Response {
    match state.posts.get_by_slug(&slug).await {
        Ok(post) => Json(post).into_response(),
        Err(err) => ApiError::admin("Failed to fetch post", err).into_response(),
    }
}

pub(super) async fn create_post(State(state): State<AppState>, body: WriteBody) -> Response {
    let Json(request) = match body {
        Ok(body) => body,
        Err(rejection) => return ApiError::bad_json(rejection).into_response(),
    };

    match state.posts.create(WritePostCommand::from(request)).await {
        Ok(post) => (StatusCode::CREATED, Json(post)).into_response(),
        Err(err) => ApiError::admin("Failed to create post", err).into_response(),
    }
}

pub(super) async fn update_post(
    State(state): State<AppState>,
    id: IdPath,
    body: WriteBody,
) -> Response {
    let Path(id) = match id {
        Ok(id) => id,
        Err(rejection) => return ApiError::bad_path(rejection).into_response(),
    };
    let Json(request) = match body {
        Ok(body) => body,
        Err(rejection) => return ApiError::bad_json(rejection).into_response(),
    };

    match state.posts.update(id, WritePostCommand::from(request)).await {
        Ok(post) => Json(post).into_response(),
        Err(err) => ApiError::admin("Failed to update post", err).into_response(),
    }
}

pub(super) async fn delete_post(State(state): State<AppState>, id: IdPath) -> Response {
    let Path(id) = match id {
        Ok(id) => id,
        Err(rejection) => return ApiError::bad_path(rejection).into_response(),
    };

    match state.posts.delete(id).await {
        Ok(()) => StatusCode::NO_CONTENT.into_response(),
        Err(err) => ApiError::admin("Failed to delete post", err).into_response(),
    }
}

pub(super) async fn list_users(State(state): State<AppState>) -> Response {
    match state.posts.list_authors().await {
        Ok(authors) => Json(authors).into_response(),
        Err(err) => ApiError::admin("Failed to fetch users", err).into_response(),
    }
}
