use async_trait::async_trait;
use sqlx::{Postgres, Transaction};
use time::OffsetDateTime;
use uuid::Uuid;

use crate::application::repos::{CreatePostParams, PostsWriteRepo, RepoError, UpdatePostParams};
use crate::domain::entities::PostWithRelations;

use super::PostgresRepositories;
use crate::infra::db::map_sqlx_error;

async fn link_tags(
    tx: &mut Transaction<'_, Postgres>,
    post_id: Uuid,
    tag_ids: &[Uuid],
) -> Result<(), RepoError> {
    if tag_ids.is_empty() {
        return Ok(());
    }

    sqlx::query(
        r#"
        INSERT INTO post_tags (post_id, tag_id)
        SELECT $1, id
        FROM UNNEST($2::uuid[]) AS id
        ON CONFLICT DO NOTHING
        "#,
    )
    .bind(post_id)
    .bind(tag_ids)
    .execute(&mut **tx)
    .await
    .map_err(map_sqlx_error)?;

    Ok(())
}

#[async_trait]
impl PostsWriteRepo for PostgresRepositories {
    async fn create_post(&self, params: CreatePostParams) -> Result<PostWithRelations, RepoError> {
        let CreatePostParams {
            slug,
            title,
            summary,
            content,
            date,
            published,
            image,
            reading_time,
            author_id,
            tag_ids,
        } = params;

        let id = Uuid::new_v4();
        let now = OffsetDateTime::now_utc();
        let mut tx = self.pool().begin().await.map_err(map_sqlx_error)?;

        sqlx::query(
            r#"
            INSERT INTO posts (
                id, slug, title, summary, content, date, published,
                image, reading_time, author_id, created_at, updated_at
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $11)
            "#,
        )
        .bind(id)
        .bind(slug)
        .bind(title)
        .bind(summary)
        .bind(content)
        .bind(date)
        .bind(published)
        .bind(image)
        .bind(reading_time)
        .bind(author_id)
        .bind(now)
        .execute(&mut *tx)
        .await
        .map_err(map_sqlx_error)?;

        link_tags(&mut tx, id, &tag_ids).await?;

        tx.commit().await.map_err(map_sqlx_error)?;

        self.load_post(id).await?.ok_or(RepoError::NotFound)
    }

    async fn update_post(&self, params: UpdatePostParams) -> Result<PostWithRelations, RepoError> {
        let UpdatePostParams {
            id,
            slug,
            title,
            summary,
            content,
            date,
            published,
            image,
            reading_time,
            author_id,
            tag_ids,
        } = params;

        let now = OffsetDateTime::now_utc();
        let mut tx = self.pool().begin().await.map_err(map_sqlx_error)?;

        let updated = sqlx::query(
            r#"
            UPDATE posts
            SET slug = $2,
                title = $3,
                summary = $4,
                content = $5,
                date = COALESCE($6, date),
                published = $7,
                image = $8,
                reading_time = $9,
                author_id = $10,
                updated_at = $11
            WHERE id = $1
            "#,
        )
        .bind(id)
        .bind(slug)
        .bind(title)
        .bind(summary)
        .bind(content)
        .bind(date)
        .bind(published)
        .bind(image)
        .bind(reading_time)
        .bind(author_id)
        .bind(now)
        .execute(&mut *tx)
        .await
        .map_err(map_sqlx_error)?;

        if updated.rows_affected() == 0 {
            return Err(RepoError::NotFound);
        }

        sqlx::query("DELETE FROM post_tags WHERE post_id = $1")
            .bind(id)
            .execute(&mut *tx)
            .await
            .map_err(map_sqlx_error)?;

        link_tags(&mut tx, id, &tag_ids).await?;

        tx.commit().await.map_err(map_sqlx_error)?;

        self.load_post(id).await?.ok_or(RepoError::NotFound)
    }

    async fn delete_post(&self, id: Uuid) -> Result<(), RepoError> {
        let result = sqlx::query("DELETE FROM posts WHERE id = $1")
            .bind(id)
            .execute(self.pool())
            .await
            .map_err(map_sqlx_error)?;

        if result.rows_affected() == 0 {
            return Err(RepoError::NotFound);
        }

        Ok(())
    }
}
