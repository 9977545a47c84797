use std::collections::HashMap;

use async_trait::async_trait;
use sqlx::QueryBuilder;
use uuid::Uuid;

use crate::application::repos::{PostListScope, PostQueryFilter, PostsRepo, RepoError};
use crate::domain::entities::{PostWithRelations, TagRecord};

use super::PostgresRepositories;
use super::types::{POST_COLUMNS, POST_ORDER, PostRow, PostTagRow};
use crate::infra::db::map_sqlx_error;

impl PostgresRepositories {
    /// Attach tag rows to each post, preserving the order of `rows`.
    async fn with_relations(&self, rows: Vec<PostRow>) -> Result<Vec<PostWithRelations>, RepoError> {
        if rows.is_empty() {
            return Ok(Vec::new());
        }

        let ids: Vec<Uuid> = rows.iter().map(|row| row.id).collect();
        let tag_rows = sqlx::query_as::<_, PostTagRow>(
            r#"
            SELECT pt.post_id, t.id, t.name, t.created_at
            FROM post_tags pt
            INNER JOIN tags t ON t.id = pt.tag_id
            WHERE pt.post_id = ANY($1)
            ORDER BY t.name ASC
            "#,
        )
        .bind(&ids)
        .fetch_all(self.pool())
        .await
        .map_err(map_sqlx_error)?;

        let mut tags_by_post: HashMap<Uuid, Vec<TagRecord>> = HashMap::new();
        for row in tag_rows {
            tags_by_post
                .entry(row.post_id)
                .or_default()
                .push(TagRecord::from(row));
        }

        Ok(rows
            .into_iter()
            .map(|row| {
                let tags = tags_by_post.remove(&row.id).unwrap_or_default();
                let (post, author) = row.into_parts();
                PostWithRelations { post, author, tags }
            })
            .collect())
    }

    pub(crate) async fn load_post(&self, id: Uuid) -> Result<Option<PostWithRelations>, RepoError> {
        let mut qb = QueryBuilder::new(POST_COLUMNS);
        qb.push(" AND p.id = ");
        qb.push_bind(id);

        let row = qb
            .build_query_as::<PostRow>()
            .fetch_optional(self.pool())
            .await
            .map_err(map_sqlx_error)?;

        match row {
            Some(row) => Ok(self.with_relations(vec![row]).await?.pop()),
            None => Ok(None),
        }
    }
}

#[async_trait]
impl PostsRepo for PostgresRepositories {
    async fn list_posts(
        &self,
        scope: PostListScope,
        filter: &PostQueryFilter,
    ) -> Result<Vec<PostWithRelations>, RepoError> {
        let mut qb = QueryBuilder::new(POST_COLUMNS);
        Self::apply_scope_conditions(&mut qb, scope);
        Self::apply_post_filter(&mut qb, filter);
        qb.push(POST_ORDER);

        let rows = qb
            .build_query_as::<PostRow>()
            .fetch_all(self.pool())
            .await
            .map_err(map_sqlx_error)?;

        self.with_relations(rows).await
    }

    async fn find_by_slug(
        &self,
        scope: PostListScope,
        slug: &str,
    ) -> Result<Option<PostWithRelations>, RepoError> {
        let mut qb = QueryBuilder::new(POST_COLUMNS);
        Self::apply_scope_conditions(&mut qb, scope);
        qb.push(" AND p.slug = ");
        qb.push_bind(slug);

        let row = qb
            .build_query_as::<PostRow>()
            .fetch_optional(self.pool())
            .await
            .map_err(map_sqlx_error)?;

        match row {
            Some(row) => Ok(self.with_relations(vec![row]).await?.pop()),
            None => Ok(None),
        }
    }

    async fn find_by_id(&self, id: Uuid) -> Result<Option<PostWithRelations>, RepoError> {
        self.load_post(id).await
    }
}
