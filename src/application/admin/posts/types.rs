use crispr_api_types::PostWriteRequest;
use thiserror::Error;
use time::OffsetDateTime;
use uuid::Uuid;

use crate::{application::repos::RepoError, domain::error::DomainError};

/// Unique constraint guarding post slugs.
pub const SLUG_CONSTRAINT: &str = "posts_slug_key";
pub const AUTHOR_CONSTRAINT: &str = "posts_author_id_fkey";

#[derive(Debug, Error)]
pub enum AdminPostError {
    #[error("{0} must not be empty")]
    ConstraintViolation(&'static str),
    #[error(transparent)]
    Validation(#[from] DomainError),
    #[error("a post with slug `{0}` already exists")]
    DuplicateSlug(String),
    #[error("post not found")]
    NotFound,
    #[error("author `{0}` does not exist")]
    UnknownAuthor(Uuid),
    #[error(transparent)]
    Repo(#[from] RepoError),
}

impl AdminPostError {
    /// Translate store failures raised while writing `slug` for `author_id`.
    pub(crate) fn from_write(err: RepoError, slug: &str, author_id: Uuid) -> Self {
        match err {
            RepoError::Duplicate { constraint } if constraint == SLUG_CONSTRAINT => {
                Self::DuplicateSlug(slug.to_string())
            }
            RepoError::ForeignKey { constraint } if constraint == AUTHOR_CONSTRAINT => {
                Self::UnknownAuthor(author_id)
            }
            RepoError::NotFound => Self::NotFound,
            other => Self::Repo(other),
        }
    }
}

/// Editor input for both create and update.
#[derive(Debug, Clone)]
pub struct WritePostCommand {
    pub title: String,
    pub slug: String,
    pub summary: String,
    pub content: String,
    pub image: Option<String>,
    pub reading_time: Option<String>,
    pub tags: Vec<String>,
    pub published: bool,
    pub author_id: Uuid,
    pub date: Option<OffsetDateTime>,
}

impl From<PostWriteRequest> for WritePostCommand {
    fn from(request: PostWriteRequest) -> Self {
        Self {
            title: request.title,
            slug: request.slug,
            summary: request.summary,
            content: request.content,
            image: blank_to_none(request.image),
            reading_time: blank_to_none(request.reading_time),
            tags: request.tags,
            published: request.published,
            author_id: request.author_id,
            date: request.date,
        }
    }
}

fn blank_to_none(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

pub fn ensure_non_empty(value: &str, field: &'static str) -> Result<(), AdminPostError> {
    if value.trim().is_empty() {
        return Err(AdminPostError::ConstraintViolation(field));
    }
    Ok(())
}
