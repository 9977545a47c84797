use async_trait::async_trait;
use time::OffsetDateTime;
use uuid::Uuid;

use crate::application::repos::{RepoError, UpsertUserParams, UsersRepo};
use crate::domain::entities::{AuthorRecord, UserRecord};
use crate::domain::types::UserRole;

use super::{PostgresRepositories, map_sqlx_error};

const USER_COLUMNS: &str = "id, email, name, password_hash, role, image, bio, created_at";

#[derive(sqlx::FromRow)]
struct UserRow {
    id: Uuid,
    email: String,
    name: String,
    password_hash: Option<String>,
    role: UserRole,
    image: Option<String>,
    bio: Option<String>,
    created_at: OffsetDateTime,
}

impl From<UserRow> for UserRecord {
    fn from(row: UserRow) -> Self {
        Self {
            id: row.id,
            email: row.email,
            name: row.name,
            password_hash: row.password_hash,
            role: row.role,
            image: row.image,
            bio: row.bio,
            created_at: row.created_at,
        }
    }
}

#[derive(sqlx::FromRow)]
struct AuthorRow {
    id: Uuid,
    name: String,
    image: Option<String>,
    bio: Option<String>,
}

#[async_trait]
impl UsersRepo for PostgresRepositories {
    async fn find_by_email(&self, email: &str) -> Result<Option<UserRecord>, RepoError> {
        let row = sqlx::query_as::<_, UserRow>(&format!(
            "SELECT {USER_COLUMNS} FROM users WHERE email = $1"
        ))
        .bind(email)
        .fetch_optional(self.pool())
        .await
        .map_err(map_sqlx_error)?;

        Ok(row.map(UserRecord::from))
    }

    async fn find_by_id(&self, id: Uuid) -> Result<Option<UserRecord>, RepoError> {
        let row = sqlx::query_as::<_, UserRow>(&format!(
            "SELECT {USER_COLUMNS} FROM users WHERE id = $1"
        ))
        .bind(id)
        .fetch_optional(self.pool())
        .await
        .map_err(map_sqlx_error)?;

        Ok(row.map(UserRecord::from))
    }

    async fn list_authors(&self) -> Result<Vec<AuthorRecord>, RepoError> {
        let rows = sqlx::query_as::<_, AuthorRow>(
            "SELECT id, name, image, bio FROM users ORDER BY name ASC, id ASC",
        )
        .fetch_all(self.pool())
        .await
        .map_err(map_sqlx_error)?;

        Ok(rows
            .into_iter()
            .map(|row| AuthorRecord {
                id: row.id,
                name: row.name,
                image: row.image,
                bio: row.bio,
            })
            .collect())
    }

    async fn upsert_user(&self, params: UpsertUserParams) -> Result<UserRecord, RepoError> {
        let UpsertUserParams {
            email,
            name,
            password_hash,
            role,
        } = params;

        let row = sqlx::query_as::<_, UserRow>(&format!(
            r#"
            INSERT INTO users (id, email, name, password_hash, role)
            VALUES ($1, $2, $3, $4, $5)
            ON CONFLICT (email) DO UPDATE
            SET name = EXCLUDED.name,
                password_hash = EXCLUDED.password_hash,
                role = EXCLUDED.role,
                updated_at = now()
            RETURNING {USER_COLUMNS}
            "#
        ))
        .bind(Uuid::new_v4())
        .bind(email)
        .bind(name)
        .bind(password_hash)
        .bind(role)
        .fetch_one(self.pool())
        .await
        .map_err(map_sqlx_error)?;

        Ok(UserRecord::from(row))
    }
}
