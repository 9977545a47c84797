//! Wire types for the crispr-site content API.
//!
//! Every post leaving the server is a [`BlogPost`]: tags are plain names and
//! all timestamps travel as RFC 3339 strings. Server-rendered consumers and
//! JSON clients share these definitions so the contract cannot drift.

use serde::{Deserialize, Serialize};
use time::OffsetDateTime;
use uuid::Uuid;

/// Public author projection embedded in every post.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BlogAuthor {
    pub name: String,
    pub image: Option<String>,
    pub bio: Option<String>,
}

/// Shaped post as served by both the public and the editor API.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BlogPost {
    pub id: Uuid,
    pub slug: String,
    pub title: String,
    pub summary: String,
    pub content: String,
    #[serde(with = "time::serde::rfc3339")]
    pub date: OffsetDateTime,
    pub reading_time: Option<String>,
    pub image: Option<String>,
    pub published: bool,
    pub author_id: Uuid,
    pub author: BlogAuthor,
    pub tags: Vec<String>,
    #[serde(with = "time::serde::rfc3339")]
    pub created_at: OffsetDateTime,
    #[serde(with = "time::serde::rfc3339")]
    pub updated_at: OffsetDateTime,
}

/// Tag name with the number of published posts carrying it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TagCount {
    pub name: String,
    pub count: u64,
}

/// Entry of the author selector offered to editors.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuthorOption {
    pub id: Uuid,
    pub name: String,
}

/// Body accepted by the editor create and update endpoints.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PostWriteRequest {
    pub title: String,
    /// Left blank to derive the slug from the title.
    #[serde(default)]
    pub slug: String,
    #[serde(default)]
    pub summary: String,
    pub content: String,
    #[serde(default)]
    pub image: Option<String>,
    #[serde(default)]
    pub reading_time: Option<String>,
    #[serde(default)]
    pub tags: Vec<String>,
    #[serde(default)]
    pub published: bool,
    pub author_id: Uuid,
    #[serde(default, with = "time::serde::rfc3339::option")]
    pub date: Option<OffsetDateTime>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

/// Authenticated session as reported to the client.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionView {
    pub user_id: Uuid,
    pub name: String,
    pub role: String,
    #[serde(with = "time::serde::rfc3339")]
    pub expires_at: OffsetDateTime,
    /// Only present in the login response.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub token: Option<String>,
}

/// Error payload returned with every non-2xx JSON response.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ErrorBody {
    pub error: String,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::{Value, json};
    use time::macros::datetime;

    fn sample_post(tags: Vec<String>) -> BlogPost {
        BlogPost {
            id: Uuid::nil(),
            slug: "hello-world".into(),
            title: "Hello".into(),
            summary: "summary".into(),
            content: "<p>body</p>".into(),
            date: datetime!(2023-06-01 12:00 UTC),
            reading_time: None,
            image: Some("/images/dna.jpg".into()),
            published: true,
            author_id: Uuid::nil(),
            author: BlogAuthor {
                name: "Ada".into(),
                image: None,
                bio: None,
            },
            tags,
            created_at: datetime!(2023-05-30 08:30 UTC),
            updated_at: datetime!(2023-05-31 09:15:30 UTC),
        }
    }

    #[test]
    fn blog_post_serializes_dates_as_rfc3339_and_camel_case_keys() {
        let value = serde_json::to_value(sample_post(vec!["x".into()])).unwrap();

        assert_eq!(value["date"], json!("2023-06-01T12:00:00Z"));
        assert_eq!(value["createdAt"], json!("2023-05-30T08:30:00Z"));
        assert_eq!(value["updatedAt"], json!("2023-05-31T09:15:30Z"));
        assert_eq!(value["readingTime"], Value::Null);
        assert_eq!(value["authorId"], json!(Uuid::nil().to_string()));
    }

    #[test]
    fn blog_post_tags_are_plain_strings() {
        let value = serde_json::to_value(sample_post(vec!["x".into(), "y".into()])).unwrap();
        assert_eq!(value["tags"], json!(["x", "y"]));

        let empty = serde_json::to_value(sample_post(Vec::new())).unwrap();
        assert_eq!(empty["tags"], json!([]));
    }

    #[test]
    fn write_request_defaults_optional_fields() {
        let request: PostWriteRequest = serde_json::from_value(json!({
            "title": "Hello",
            "content": "<p>x</p>",
            "authorId": Uuid::nil(),
        }))
        .unwrap();

        assert!(request.slug.is_empty());
        assert!(request.tags.is_empty());
        assert!(!request.published);
        assert!(request.date.is_none());
    }

    #[test]
    fn session_view_omits_missing_token() {
        let view = SessionView {
            user_id: Uuid::nil(),
            name: "Admin".into(),
            role: "admin".into(),
            expires_at: datetime!(2030-01-01 0:00 UTC),
            token: None,
        };
        let value = serde_json::to_value(view).unwrap();
        assert!(value.get("token").is_none());
        assert_eq!(value["expiresAt"], json!("2030-01-01T00:00:00Z"));
    }
}
