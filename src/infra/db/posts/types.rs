use time::OffsetDateTime;
use uuid::Uuid;

use crate::domain::entities::{AuthorRecord, PostRecord, TagRecord};

/// Columns selected for every post query.
pub(crate) const POST_COLUMNS: &str = "SELECT p.id, p.slug, p.title, p.summary, p.content, p.date, \
     p.published, p.image, p.reading_time, p.author_id, p.created_at, p.updated_at, \
     u.name AS author_name, u.image AS author_image, u.bio AS author_bio \
     FROM posts p INNER JOIN users u ON u.id = p.author_id WHERE 1=1 ";

pub(crate) const POST_ORDER: &str = " ORDER BY p.date DESC, p.created_at DESC, p.id DESC";

#[derive(sqlx::FromRow)]
pub(crate) struct PostRow {
    pub(crate) id: Uuid,
    pub(crate) slug: String,
    pub(crate) title: String,
    pub(crate) summary: String,
    pub(crate) content: String,
    pub(crate) date: OffsetDateTime,
    pub(crate) published: bool,
    pub(crate) image: Option<String>,
    pub(crate) reading_time: Option<String>,
    pub(crate) author_id: Uuid,
    pub(crate) created_at: OffsetDateTime,
    pub(crate) updated_at: OffsetDateTime,
    pub(crate) author_name: String,
    pub(crate) author_image: Option<String>,
    pub(crate) author_bio: Option<String>,
}

impl PostRow {
    pub(crate) fn into_parts(self) -> (PostRecord, AuthorRecord) {
        let author = AuthorRecord {
            id: self.author_id,
            name: self.author_name,
            image: self.author_image,
            bio: self.author_bio,
        };
        let post = PostRecord {
            id: self.id,
            slug: self.slug,
            title: self.title,
            summary: self.summary,
            content: self.content,
            date: self.date,
            published: self.published,
            image: self.image,
            reading_time: self.reading_time,
            author_id: self.author_id,
            created_at: self.created_at,
            updated_at: self.updated_at,
        };
        (post, author)
    }
}

#[derive(sqlx::FromRow)]
pub(crate) struct PostTagRow {
    pub(crate) post_id: Uuid,
    pub(crate) id: Uuid,
    pub(crate) name: String,
    pub(crate) created_at: OffsetDateTime,
}

impl From<PostTagRow> for TagRecord {
    fn from(row: PostTagRow) -> Self {
        Self {
            id: row.id,
            name: row.name,
            created_at: row.created_at,
        }
    }
}
