//! Stand-in store used when no database URL is configured.
//!
//! Reads behave like an empty site; anything that would persist state or
//! authenticate a user fails with [`RepoError::Unconfigured`].

use async_trait::async_trait;
use time::OffsetDateTime;
use uuid::Uuid;

use crate::application::repos::{
    CreatePostParams, CreateSessionParams, PostListScope, PostQueryFilter, PostsRepo,
    PostsWriteRepo, RepoError, SessionsRepo, StoreHealth, TagWithCount, TagsRepo, TagsWriteRepo,
    UpdatePostParams, UpsertUserParams, UsersRepo,
};
use crate::domain::entities::{
    AuthorRecord, PostWithRelations, SessionRecord, TagRecord, UserRecord,
};

#[derive(Debug, Clone, Copy, Default)]
pub struct UnconfiguredRepositories;

#[async_trait]
impl PostsRepo for UnconfiguredRepositories {
    async fn list_posts(
        &self,
        _scope: PostListScope,
        _filter: &PostQueryFilter,
    ) -> Result<Vec<PostWithRelations>, RepoError> {
        Ok(Vec::new())
    }

    async fn find_by_slug(
        &self,
        _scope: PostListScope,
        _slug: &str,
    ) -> Result<Option<PostWithRelations>, RepoError> {
        Ok(None)
    }

    async fn find_by_id(&self, _id: Uuid) -> Result<Option<PostWithRelations>, RepoError> {
        Ok(None)
    }
}

#[async_trait]
impl PostsWriteRepo for UnconfiguredRepositories {
    async fn create_post(&self, _params: CreatePostParams) -> Result<PostWithRelations, RepoError> {
        Err(RepoError::Unconfigured)
    }

    async fn update_post(&self, _params: UpdatePostParams) -> Result<PostWithRelations, RepoError> {
        Err(RepoError::Unconfigured)
    }

    async fn delete_post(&self, _id: Uuid) -> Result<(), RepoError> {
        Err(RepoError::Unconfigured)
    }
}

#[async_trait]
impl TagsRepo for UnconfiguredRepositories {
    async fn list_with_counts(&self) -> Result<Vec<TagWithCount>, RepoError> {
        Ok(Vec::new())
    }
}

#[async_trait]
impl TagsWriteRepo for UnconfiguredRepositories {
    async fn upsert_tags_by_name(&self, _names: &[String]) -> Result<Vec<TagRecord>, RepoError> {
        Err(RepoError::Unconfigured)
    }
}

#[async_trait]
impl UsersRepo for UnconfiguredRepositories {
    async fn find_by_email(&self, _email: &str) -> Result<Option<UserRecord>, RepoError> {
        Err(RepoError::Unconfigured)
    }

    async fn find_by_id(&self, _id: Uuid) -> Result<Option<UserRecord>, RepoError> {
        Err(RepoError::Unconfigured)
    }

    async fn list_authors(&self) -> Result<Vec<AuthorRecord>, RepoError> {
        Ok(Vec::new())
    }

    async fn upsert_user(&self, _params: UpsertUserParams) -> Result<UserRecord, RepoError> {
        Err(RepoError::Unconfigured)
    }
}

#[async_trait]
impl SessionsRepo for UnconfiguredRepositories {
    async fn create_session(
        &self,
        _params: CreateSessionParams,
    ) -> Result<SessionRecord, RepoError> {
        Err(RepoError::Unconfigured)
    }

    async fn find_by_prefix(&self, _prefix: &str) -> Result<Option<SessionRecord>, RepoError> {
        Err(RepoError::Unconfigured)
    }

    async fn delete_by_prefix(&self, _prefix: &str) -> Result<(), RepoError> {
        Err(RepoError::Unconfigured)
    }

    async fn delete_expired(&self, _now: OffsetDateTime) -> Result<u64, RepoError> {
        Ok(0)
    }
}

#[async_trait]
impl StoreHealth for UnconfiguredRepositories {
    async fn health_check(&self) -> Result<(), RepoError> {
        Err(RepoError::Unconfigured)
    }
}
