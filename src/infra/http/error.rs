use axum::Json;
use axum::extract::rejection::{JsonRejection, PathRejection, QueryRejection};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use crispr_api_types::ErrorBody;

use crate::application::admin::posts::AdminPostError;
use crate::application::auth::{AuthError, SessionAuthError};
use crate::application::content::ContentError;
use crate::application::error::ErrorReport;

pub const NOT_AUTHENTICATED: &str = "Not authenticated";
pub const AUTHENTICATION_FAILED: &str = "Failed to authenticate";
pub const POST_NOT_FOUND: &str = "Post not found";
pub const DUPLICATE_SLUG: &str = "A post with this slug already exists";

/// JSON error response carrying a public message and a private diagnostic.
#[derive(Debug)]
pub struct ApiError {
    status: StatusCode,
    message: String,
    report: ErrorReport,
}

impl ApiError {
    pub fn new(
        source: &'static str,
        status: StatusCode,
        message: impl Into<String>,
        detail: impl Into<String>,
    ) -> Self {
        Self {
            status,
            message: message.into(),
            report: ErrorReport::from_message(source, status, detail),
        }
    }

    pub fn from_error(
        source: &'static str,
        status: StatusCode,
        message: impl Into<String>,
        error: &dyn std::error::Error,
    ) -> Self {
        Self {
            status,
            message: message.into(),
            report: ErrorReport::from_error(source, status, error),
        }
    }

    pub fn status(&self) -> StatusCode {
        self.status
    }

    pub fn unauthenticated(err: &SessionAuthError) -> Self {
        Self::from_error(
            "infra::http::auth",
            StatusCode::UNAUTHORIZED,
            NOT_AUTHENTICATED,
            err,
        )
    }

    /// Map a content query failure; `failure` is the public message for store errors.
    pub fn content(failure: &'static str, err: ContentError) -> Self {
        const SOURCE: &str = "infra::http::public";
        match err {
            ContentError::NotFound => {
                Self::from_error(SOURCE, StatusCode::NOT_FOUND, POST_NOT_FOUND, &err)
            }
            ContentError::Repo(_) => {
                Self::from_error(SOURCE, StatusCode::INTERNAL_SERVER_ERROR, failure, &err)
            }
        }
    }

    /// Map an editor failure; `failure` is the public message for store errors.
    pub fn admin(failure: &'static str, err: AdminPostError) -> Self {
        const SOURCE: &str = "infra::http::admin";
        match &err {
            AdminPostError::DuplicateSlug(_) => {
                Self::from_error(SOURCE, StatusCode::BAD_REQUEST, DUPLICATE_SLUG, &err)
            }
            AdminPostError::ConstraintViolation(_) | AdminPostError::Validation(_) => {
                let message = match &err {
                    AdminPostError::Validation(inner) => inner.to_string(),
                    other => other.to_string(),
                };
                Self::from_error(SOURCE, StatusCode::BAD_REQUEST, public_text(&message), &err)
            }
            AdminPostError::UnknownAuthor(_) => {
                Self::from_error(SOURCE, StatusCode::BAD_REQUEST, "Unknown author", &err)
            }
            AdminPostError::NotFound => {
                Self::from_error(SOURCE, StatusCode::NOT_FOUND, POST_NOT_FOUND, &err)
            }
            AdminPostError::Repo(_) => {
                Self::from_error(SOURCE, StatusCode::INTERNAL_SERVER_ERROR, failure, &err)
            }
        }
    }

    pub fn auth(err: AuthError) -> Self {
        const SOURCE: &str = "infra::http::auth";
        match &err {
            AuthError::InvalidCredentials => Self::from_error(
                SOURCE,
                StatusCode::UNAUTHORIZED,
                "Invalid email or password",
                &err,
            ),
            AuthError::InvalidInput(message) => {
                Self::from_error(SOURCE, StatusCode::BAD_REQUEST, public_text(message), &err)
            }
            AuthError::Hash(_) | AuthError::Repo(_) => Self::from_error(
                SOURCE,
                StatusCode::INTERNAL_SERVER_ERROR,
                "Failed to sign in",
                &err,
            ),
        }
    }

    pub fn bad_json(rejection: JsonRejection) -> Self {
        Self::from_error(
            "infra::http::json",
            StatusCode::BAD_REQUEST,
            "Invalid request body",
            &rejection,
        )
    }

    pub fn bad_path(rejection: PathRejection) -> Self {
        Self::from_error(
            "infra::http::path",
            StatusCode::BAD_REQUEST,
            "Invalid path parameter",
            &rejection,
        )
    }

    pub fn bad_query(rejection: QueryRejection) -> Self {
        Self::from_error(
            "infra::http::query",
            StatusCode::BAD_REQUEST,
            "Invalid query string",
            &rejection,
        )
    }
}

/// Capitalise the first letter of an internal message for display.
fn public_text(message: &str) -> String {
    let message = message
        .strip_prefix("domain validation failed: ")
        .unwrap_or(message);
    let mut chars = message.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let body = ErrorBody {
            error: self.message,
        };
        let mut response = (self.status, Json(body)).into_response();
        self.report.attach(&mut response);
        response
    }
}

impl From<SessionAuthError> for ApiError {
    fn from(err: SessionAuthError) -> Self {
        match err {
            SessionAuthError::Store(_) => Self::from_error(
                "infra::http::auth",
                StatusCode::INTERNAL_SERVER_ERROR,
                AUTHENTICATION_FAILED,
                &err,
            ),
            other => ApiError::unauthenticated(&other),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::application::repos::RepoError;
    use crate::domain::error::DomainError;
    use uuid::Uuid;

    #[test]
    fn duplicate_slug_uses_public_message() {
        let err = ApiError::admin(
            "Failed to create post",
            AdminPostError::DuplicateSlug("hello".into()),
        );
        assert_eq!(err.status(), StatusCode::BAD_REQUEST);
        assert_eq!(err.message, DUPLICATE_SLUG);
    }

    #[test]
    fn store_failures_hide_details() {
        let err = ApiError::admin(
            "Failed to create post",
            AdminPostError::Repo(RepoError::from_persistence("connection refused")),
        );
        assert_eq!(err.status(), StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(err.message, "Failed to create post");
        assert!(
            err.report
                .messages
                .iter()
                .any(|m| m.contains("connection refused"))
        );
    }

    #[test]
    fn validation_messages_are_readable() {
        let err = ApiError::admin(
            "Failed to create post",
            AdminPostError::Validation(DomainError::validation("slug `A B` is invalid")),
        );
        assert_eq!(err.message, "Slug `A B` is invalid");

        let err = ApiError::admin(
            "Failed to create post",
            AdminPostError::ConstraintViolation("title"),
        );
        assert_eq!(err.message, "Title must not be empty");
    }

    #[test]
    fn unknown_author_is_a_client_error() {
        let err = ApiError::admin(
            "Failed to create post",
            AdminPostError::UnknownAuthor(Uuid::nil()),
        );
        assert_eq!(err.status(), StatusCode::BAD_REQUEST);
    }

    #[test]
    fn content_not_found_is_404() {
        let err = ApiError::content("Failed to fetch blog post", ContentError::NotFound);
        assert_eq!(err.status(), StatusCode::NOT_FOUND);
        assert_eq!(err.message, POST_NOT_FOUND);
    }

    #[test]
    fn session_store_failure_is_a_server_error() {
        let err = ApiError::from(SessionAuthError::Store(RepoError::Unconfigured));
        assert_eq!(err.status(), StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(err.message, AUTHENTICATION_FAILED);
        assert!(
            err.report
                .messages
                .iter()
                .any(|m| m.contains("not configured"))
        );

        let err = ApiError::from(SessionAuthError::Expired);
        assert_eq!(err.status(), StatusCode::UNAUTHORIZED);
        assert_eq!(err.message, NOT_AUTHENTICATED);
    }
}
