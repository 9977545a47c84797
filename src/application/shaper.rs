//! Conversion from joined store rows to the public post contract.
//!
//! Every service method that hands posts to a caller goes through
//! [`shape_post`]; handlers never build a [`BlogPost`] themselves.

use crispr_api_types::{AuthorOption, BlogAuthor, BlogPost, TagCount};

use crate::application::repos::TagWithCount;
use crate::domain::entities::{AuthorRecord, PostWithRelations};

pub fn shape_post(record: PostWithRelations) -> BlogPost {
    let PostWithRelations { post, author, tags } = record;

    BlogPost {
        id: post.id,
        slug: post.slug,
        title: post.title,
        summary: post.summary,
        content: post.content,
        date: post.date,
        reading_time: post.reading_time,
        image: post.image,
        published: post.published,
        author_id: post.author_id,
        author: BlogAuthor {
            name: author.name,
            image: author.image,
            bio: author.bio,
        },
        tags: tags.into_iter().map(|tag| tag.name).collect(),
        created_at: post.created_at,
        updated_at: post.updated_at,
    }
}

pub fn shape_posts(records: Vec<PostWithRelations>) -> Vec<BlogPost> {
    records.into_iter().map(shape_post).collect()
}

pub fn shape_tag_counts(rows: Vec<TagWithCount>) -> Vec<TagCount> {
    rows.into_iter()
        .map(|row| TagCount {
            name: row.name,
            count: u64::try_from(row.count).unwrap_or(0),
        })
        .collect()
}

pub fn shape_author_options(authors: Vec<AuthorRecord>) -> Vec<AuthorOption> {
    authors
        .into_iter()
        .map(|author| AuthorOption {
            id: author.id,
            name: author.name,
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::entities::{PostRecord, TagRecord};
    use serde_json::{Value, json};
    use time::macros::datetime;
    use uuid::Uuid;

    fn record(tags: &[&str]) -> PostWithRelations {
        let author_id = Uuid::new_v4();
        PostWithRelations {
            post: PostRecord {
                id: Uuid::new_v4(),
                slug: "hello-world".into(),
                title: "Hello world".into(),
                summary: "A first post".into(),
                content: "<p>Hi</p>".into(),
                date: datetime!(2023-06-01 10:00 UTC),
                published: true,
                image: Some("/images/DNA.jpg".into()),
                reading_time: Some("4 min read".into()),
                author_id,
                created_at: datetime!(2023-05-31 10:00 UTC),
                updated_at: datetime!(2023-06-02 10:00 UTC),
            },
            author: AuthorRecord {
                id: author_id,
                name: "Rosalind".into(),
                image: None,
                bio: Some("Crystallographer".into()),
            },
            tags: tags
                .iter()
                .map(|name| TagRecord {
                    id: Uuid::new_v4(),
                    name: name.to_string(),
                    created_at: datetime!(2023-01-01 0:00 UTC),
                })
                .collect(),
        }
    }

    #[test]
    fn flattens_tags_to_names() {
        let shaped = shape_post(record(&["x", "y"]));
        assert_eq!(shaped.tags, vec!["x", "y"]);
    }

    #[test]
    fn serialized_tags_are_plain_strings_for_any_count() {
        for tags in [&[][..], &["only"][..], &["a", "b", "c", "d"][..]] {
            let value = serde_json::to_value(shape_post(record(tags))).unwrap();
            let items = value["tags"].as_array().expect("tags array");
            assert_eq!(items.len(), tags.len());
            assert!(items.iter().all(Value::is_string));
        }
    }

    #[test]
    fn passes_through_scalar_fields_and_formats_dates() {
        let source = record(&[]);
        let id = source.post.id;
        let value = serde_json::to_value(shape_post(source)).unwrap();

        assert_eq!(value["id"], json!(id.to_string()));
        assert_eq!(value["slug"], json!("hello-world"));
        assert_eq!(value["readingTime"], json!("4 min read"));
        assert_eq!(value["author"]["name"], json!("Rosalind"));
        assert_eq!(value["author"]["bio"], json!("Crystallographer"));
        assert_eq!(value["date"], json!("2023-06-01T10:00:00Z"));
        assert_eq!(value["createdAt"], json!("2023-05-31T10:00:00Z"));
        assert_eq!(value["updatedAt"], json!("2023-06-02T10:00:00Z"));
    }

    #[test]
    fn shaping_is_deterministic() {
        let source = record(&["x"]);
        assert_eq!(shape_post(source.clone()), shape_post(source));
    }

    #[test]
    fn tag_counts_never_go_negative() {
        let shaped = shape_tag_counts(vec![
            TagWithCount {
                name: "x".into(),
                count: 2,
            },
            TagWithCount {
                name: "broken".into(),
                count: -1,
            },
        ]);
        assert_eq!(shaped[0].count, 2);
        assert_eq!(shaped[1].count, 0);
    }
}
