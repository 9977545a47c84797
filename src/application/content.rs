//! Public content queries: published posts, tag listings, related posts.

use std::sync::Arc;

use crispr_api_types::{BlogPost, TagCount};
use thiserror::Error;
use tracing::debug;

use crate::application::repos::{PostListScope, PostQueryFilter, PostsRepo, RepoError, TagsRepo};
use crate::application::shaper::{shape_post, shape_posts, shape_tag_counts};
use crate::domain::posts::rank_related;

pub const DEFAULT_RELATED_LIMIT: usize = 3;
pub const MAX_RELATED_LIMIT: usize = 20;

#[derive(Debug, Error)]
pub enum ContentError {
    #[error("post not found")]
    NotFound,
    #[error(transparent)]
    Repo(#[from] RepoError),
}

#[derive(Clone)]
pub struct ContentService {
    posts: Arc<dyn PostsRepo>,
    tags: Arc<dyn TagsRepo>,
}

impl ContentService {
    pub fn new(posts: Arc<dyn PostsRepo>, tags: Arc<dyn TagsRepo>) -> Self {
        Self { posts, tags }
    }

    pub async fn list_published(&self, tag: Option<&str>) -> Result<Vec<BlogPost>, ContentError> {
        let filter = PostQueryFilter {
            tag: tag.map(str::to_string),
        };
        let records = self.posts.list_posts(PostListScope::Public, &filter).await?;

        debug!(
            target = "crispr::content",
            tag = tag.unwrap_or(""),
            count = records.len(),
            "listed published posts"
        );

        Ok(shape_posts(records))
    }

    /// Public lookup; drafts are reported as missing.
    pub async fn get_published_by_slug(&self, slug: &str) -> Result<BlogPost, ContentError> {
        self.posts
            .find_by_slug(PostListScope::Public, slug)
            .await?
            .map(shape_post)
            .ok_or(ContentError::NotFound)
    }

    pub async fn list_tags_with_counts(&self) -> Result<Vec<TagCount>, ContentError> {
        let rows = self.tags.list_with_counts().await?;
        Ok(shape_tag_counts(rows))
    }

    pub async fn related_posts(
        &self,
        slug: &str,
        limit: Option<usize>,
    ) -> Result<Vec<BlogPost>, ContentError> {
        let limit = limit
            .unwrap_or(DEFAULT_RELATED_LIMIT)
            .clamp(1, MAX_RELATED_LIMIT);

        let anchor = self
            .posts
            .find_by_slug(PostListScope::Public, slug)
            .await?
            .ok_or(ContentError::NotFound)?;

        if anchor.tags.is_empty() {
            return Ok(Vec::new());
        }

        let anchor_tags: Vec<String> = anchor.tags.iter().map(|tag| tag.name.clone()).collect();
        let candidates = self
            .posts
            .list_posts(PostListScope::Public, &PostQueryFilter::default())
            .await?;

        Ok(shape_posts(rank_related(
            anchor.post.id,
            &anchor_tags,
            candidates,
            limit,
        )))
    }
}
