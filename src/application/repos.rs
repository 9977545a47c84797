//! Repository traits describing persistence adapters.

use async_trait::async_trait;
use thiserror::Error;
use time::OffsetDateTime;
use uuid::Uuid;

use crate::domain::entities::{
    AuthorRecord, PostWithRelations, SessionRecord, TagRecord, UserRecord,
};
use crate::domain::types::UserRole;

#[derive(Debug, Error)]
pub enum RepoError {
    #[error("persistence error: {0}")]
    Persistence(String),
    #[error("duplicate record violates unique constraint `{constraint}`")]
    Duplicate { constraint: String },
    #[error("resource not found")]
    NotFound,
    #[error("record violates foreign key `{constraint}`")]
    ForeignKey { constraint: String },
    #[error("invalid input: {message}")]
    InvalidInput { message: String },
    #[error("integrity error: {message}")]
    Integrity { message: String },
    #[error("database timeout")]
    Timeout,
    #[error("persistence store is not configured")]
    Unconfigured,
}

impl RepoError {
    pub fn from_persistence(err: impl std::fmt::Display) -> Self {
        Self::Persistence(err.to_string())
    }
}

/// Who is asking for posts. Public scope never sees drafts.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PostListScope {
    Public,
    Editor { published: Option<bool> },
}

impl PostListScope {
    pub fn admits(self, published: bool) -> bool {
        match self {
            PostListScope::Public => published,
            PostListScope::Editor { published: None } => true,
            PostListScope::Editor {
                published: Some(wanted),
            } => wanted == published,
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct PostQueryFilter {
    /// Exact, case-sensitive tag name.
    pub tag: Option<String>,
}

#[derive(Debug, Clone)]
pub struct CreatePostParams {
    pub slug: String,
    pub title: String,
    pub summary: String,
    pub content: String,
    pub date: OffsetDateTime,
    pub published: bool,
    pub image: Option<String>,
    pub reading_time: Option<String>,
    pub author_id: Uuid,
    pub tag_ids: Vec<Uuid>,
}

#[derive(Debug, Clone)]
pub struct UpdatePostParams {
    pub id: Uuid,
    pub slug: String,
    pub title: String,
    pub summary: String,
    pub content: String,
    pub date: Option<OffsetDateTime>,
    pub published: bool,
    pub image: Option<String>,
    pub reading_time: Option<String>,
    pub author_id: Uuid,
    pub tag_ids: Vec<Uuid>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TagWithCount {
    pub name: String,
    pub count: i64,
}

#[derive(Debug, Clone)]
pub struct UpsertUserParams {
    pub email: String,
    pub name: String,
    pub password_hash: String,
    pub role: UserRole,
}

#[derive(Debug, Clone)]
pub struct CreateSessionParams {
    pub user_id: Uuid,
    pub prefix: String,
    pub hashed_secret: Vec<u8>,
    pub expires_at: OffsetDateTime,
}

#[async_trait]
pub trait PostsRepo: Send + Sync {
    /// Posts admitted by `scope`, newest publication date first.
    async fn list_posts(
        &self,
        scope: PostListScope,
        filter: &PostQueryFilter,
    ) -> Result<Vec<PostWithRelations>, RepoError>;

    async fn find_by_slug(
        &self,
        scope: PostListScope,
        slug: &str,
    ) -> Result<Option<PostWithRelations>, RepoError>;

    async fn find_by_id(&self, id: Uuid) -> Result<Option<PostWithRelations>, RepoError>;
}

#[async_trait]
pub trait PostsWriteRepo: Send + Sync {
    async fn create_post(&self, params: CreatePostParams) -> Result<PostWithRelations, RepoError>;

    /// Replaces every mutable field and the full tag set.
    async fn update_post(&self, params: UpdatePostParams) -> Result<PostWithRelations, RepoError>;

    async fn delete_post(&self, id: Uuid) -> Result<(), RepoError>;
}

#[async_trait]
pub trait TagsRepo: Send + Sync {
    /// Every tag with its published post count, busiest first.
    async fn list_with_counts(&self) -> Result<Vec<TagWithCount>, RepoError>;
}

#[async_trait]
pub trait TagsWriteRepo: Send + Sync {
    /// Find or create one tag per name, returned in input order.
    async fn upsert_tags_by_name(&self, names: &[String]) -> Result<Vec<TagRecord>, RepoError>;
}

#[async_trait]
pub trait UsersRepo: Send + Sync {
    async fn find_by_email(&self, email: &str) -> Result<Option<UserRecord>, RepoError>;

    async fn find_by_id(&self, id: Uuid) -> Result<Option<UserRecord>, RepoError>;

    async fn list_authors(&self) -> Result<Vec<AuthorRecord>, RepoError>;

    async fn upsert_user(&self, params: UpsertUserParams) -> Result<UserRecord, RepoError>;
}

#[async_trait]
pub trait SessionsRepo: Send + Sync {
    async fn create_session(&self, params: CreateSessionParams)
    -> Result<SessionRecord, RepoError>;

    async fn find_by_prefix(&self, prefix: &str) -> Result<Option<SessionRecord>, RepoError>;

    async fn delete_by_prefix(&self, prefix: &str) -> Result<(), RepoError>;

    async fn delete_expired(&self, now: OffsetDateTime) -> Result<u64, RepoError>;
}

#[async_trait]
pub trait StoreHealth: Send + Sync {
    async fn health_check(&self) -> Result<(), RepoError>;
}
