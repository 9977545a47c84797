use crispr_api_types::{AuthorOption, BlogPost};
use uuid::Uuid;

use crate::application::repos::{PostListScope, PostQueryFilter};
use crate::application::shaper::{shape_author_options, shape_post, shape_posts};

use super::service::AdminPostService;
use super::types::AdminPostError;

impl AdminPostService {
    /// Every post regardless of state, or only one side when `published` is set.
    pub async fn list_all(&self, published: Option<bool>) -> Result<Vec<BlogPost>, AdminPostError> {
        let records = self
            .reader
            .list_posts(
                PostListScope::Editor { published },
                &PostQueryFilter::default(),
            )
            .await?;
        Ok(shape_posts(records))
    }

    pub async fn get_by_slug(&self, slug: &str) -> Result<BlogPost, AdminPostError> {
        self.reader
            .find_by_slug(PostListScope::Editor { published: None }, slug)
            .await?
            .map(shape_post)
            .ok_or(AdminPostError::NotFound)
    }

    pub async fn get_by_id(&self, id: Uuid) -> Result<BlogPost, AdminPostError> {
        self.reader
            .find_by_id(id)
            .await?
            .map(shape_post)
            .ok_or(AdminPostError::NotFound)
    }

    pub async fn list_authors(&self) -> Result<Vec<AuthorOption>, AdminPostError> {
        let authors = self.users.list_authors().await?;
        Ok(shape_author_options(authors))
    }
}
