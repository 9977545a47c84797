use std::collections::HashMap;

use async_trait::async_trait;
use time::OffsetDateTime;
use uuid::Uuid;

use crate::application::repos::{RepoError, TagWithCount, TagsRepo, TagsWriteRepo};
use crate::domain::entities::TagRecord;

use super::{PostgresRepositories, map_sqlx_error};

#[derive(sqlx::FromRow)]
struct TagRow {
    id: Uuid,
    name: String,
    created_at: OffsetDateTime,
}

impl From<TagRow> for TagRecord {
    fn from(row: TagRow) -> Self {
        Self {
            id: row.id,
            name: row.name,
            created_at: row.created_at,
        }
    }
}

#[derive(sqlx::FromRow)]
struct TagCountRow {
    name: String,
    count: i64,
}

#[async_trait]
impl TagsRepo for PostgresRepositories {
    async fn list_with_counts(&self) -> Result<Vec<TagWithCount>, RepoError> {
        let rows = sqlx::query_as::<_, TagCountRow>(
            r#"
            SELECT t.name, COUNT(p.id)::bigint AS count
            FROM tags t
            LEFT JOIN post_tags pt ON pt.tag_id = t.id
            LEFT JOIN posts p ON p.id = pt.post_id AND p.published = TRUE
            GROUP BY t.id, t.name
            ORDER BY count DESC, t.name ASC
            "#,
        )
        .fetch_all(self.pool())
        .await
        .map_err(map_sqlx_error)?;

        Ok(rows
            .into_iter()
            .map(|row| TagWithCount {
                name: row.name,
                count: row.count,
            })
            .collect())
    }
}

#[async_trait]
impl TagsWriteRepo for PostgresRepositories {
    async fn upsert_tags_by_name(&self, names: &[String]) -> Result<Vec<TagRecord>, RepoError> {
        if names.is_empty() {
            return Ok(Vec::new());
        }

        let ids: Vec<Uuid> = names.iter().map(|_| Uuid::new_v4()).collect();

        sqlx::query(
            r#"
            INSERT INTO tags (id, name)
            SELECT * FROM UNNEST($1::uuid[], $2::text[])
            ON CONFLICT (name) DO NOTHING
            "#,
        )
        .bind(&ids)
        .bind(names)
        .execute(self.pool())
        .await
        .map_err(map_sqlx_error)?;

        let rows = sqlx::query_as::<_, TagRow>(
            r#"
            SELECT id, name, created_at
            FROM tags
            WHERE name = ANY($1)
            "#,
        )
        .bind(names)
        .fetch_all(self.pool())
        .await
        .map_err(map_sqlx_error)?;

        let mut by_name: HashMap<String, TagRecord> = rows
            .into_iter()
            .map(|row| (row.name.clone(), TagRecord::from(row)))
            .collect();

        names
            .iter()
            .map(|name| {
                by_name.remove(name).ok_or_else(|| RepoError::Integrity {
                    message: format!("tag `{name}` missing after upsert"),
                })
            })
            .collect()
    }
}
