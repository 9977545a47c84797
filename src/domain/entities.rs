//! Domain entities mirrored from persistent storage.
//!
//! None of these derive `Serialize`: posts leave the process only through
//! the shaper in `application::shaper`.

use time::OffsetDateTime;
use uuid::Uuid;

use crate::domain::types::UserRole;

#[derive(Debug, Clone, PartialEq)]
pub struct PostRecord {
    pub id: Uuid,
    pub slug: String,
    pub title: String,
    pub summary: String,
    pub content: String,
    pub date: OffsetDateTime,
    pub published: bool,
    pub image: Option<String>,
    pub reading_time: Option<String>,
    pub author_id: Uuid,
    pub created_at: OffsetDateTime,
    pub updated_at: OffsetDateTime,
}

#[derive(Debug, Clone, PartialEq)]
pub struct AuthorRecord {
    pub id: Uuid,
    pub name: String,
    pub image: Option<String>,
    pub bio: Option<String>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct TagRecord {
    pub id: Uuid,
    pub name: String,
    pub created_at: OffsetDateTime,
}

/// A post joined with its author and tag rows, as returned by the store.
#[derive(Debug, Clone, PartialEq)]
pub struct PostWithRelations {
    pub post: PostRecord,
    pub author: AuthorRecord,
    pub tags: Vec<TagRecord>,
}

impl PostWithRelations {
    pub fn has_tag(&self, name: &str) -> bool {
        self.tags.iter().any(|tag| tag.name == name)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct UserRecord {
    pub id: Uuid,
    pub email: String,
    pub name: String,
    pub password_hash: Option<String>,
    pub role: UserRole,
    pub image: Option<String>,
    pub bio: Option<String>,
    pub created_at: OffsetDateTime,
}

#[derive(Debug, Clone, PartialEq)]
pub struct SessionRecord {
    pub id: Uuid,
    pub user_id: Uuid,
    pub prefix: String,
    pub hashed_secret: Vec<u8>,
    pub created_at: OffsetDateTime,
    pub expires_at: OffsetDateTime,
}
