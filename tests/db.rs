//! Postgres-backed repository tests. Run with `DATABASE_URL` set and `--ignored`.

use std::collections::HashSet;

use sqlx::PgPool;
use time::macros::datetime;
use uuid::Uuid;

use crispr_site::application::repos::{
    CreatePostParams, CreateSessionParams, PostListScope, PostQueryFilter, PostsRepo,
    PostsWriteRepo, RepoError, SessionsRepo, StoreHealth, TagsRepo, TagsWriteRepo,
    UpdatePostParams, UpsertUserParams, UsersRepo,
};
use crispr_site::domain::types::UserRole;
use crispr_site::infra::db::PostgresRepositories;

async fn author(repos: &PostgresRepositories) -> Uuid {
    repos
        .upsert_user(UpsertUserParams {
            email: "ada@example.org".into(),
            name: "Ada".into(),
            password_hash: "$2b$04$placeholder".into(),
            role: UserRole::Admin,
        })
        .await
        .expect("upsert author")
        .id
}

async fn create(
    repos: &PostgresRepositories,
    author_id: Uuid,
    slug: &str,
    published: bool,
    date: time::OffsetDateTime,
    tags: &[&str],
) -> Result<Uuid, RepoError> {
    let names: Vec<String> = tags.iter().map(|tag| tag.to_string()).collect();
    let tag_ids = repos
        .upsert_tags_by_name(&names)
        .await?
        .into_iter()
        .map(|tag| tag.id)
        .collect();
    let post = repos
        .create_post(CreatePostParams {
            slug: slug.into(),
            title: slug.into(),
            summary: String::new(),
            content: "<p>body</p>".into(),
            date,
            published,
            image: None,
            reading_time: None,
            author_id,
            tag_ids,
        })
        .await?;
    Ok(post.post.id)
}

#[sqlx::test(migrations = "./migrations")]
#[ignore = "requires DATABASE_URL"]
async fn public_listing_and_tag_counts_skip_drafts(pool: PgPool) {
    let repos = PostgresRepositories::new(pool);
    let author_id = author(&repos).await;
    create(&repos, author_id, "post-a", true, datetime!(2023-06-01 0:00 UTC), &["x", "y"])
        .await
        .expect("create a");
    create(&repos, author_id, "post-b", false, datetime!(2023-06-02 0:00 UTC), &["x"])
        .await
        .expect("create b");

    let public = repos
        .list_posts(PostListScope::Public, &PostQueryFilter::default())
        .await
        .expect("list");
    assert_eq!(public.len(), 1);
    assert_eq!(public[0].post.slug, "post-a");
    let tags: Vec<&str> = public[0].tags.iter().map(|tag| tag.name.as_str()).collect();
    assert_eq!(tags, vec!["x", "y"]);

    let filtered = repos
        .list_posts(
            PostListScope::Public,
            &PostQueryFilter {
                tag: Some("x".into()),
            },
        )
        .await
        .expect("filtered");
    assert_eq!(filtered.len(), 1);

    let editor = repos
        .list_posts(
            PostListScope::Editor { published: None },
            &PostQueryFilter::default(),
        )
        .await
        .expect("editor list");
    let slugs: Vec<&str> = editor.iter().map(|post| post.post.slug.as_str()).collect();
    assert_eq!(slugs, vec!["post-b", "post-a"]);

    let counts = repos.list_with_counts().await.expect("counts");
    let counts: Vec<(&str, i64)> = counts
        .iter()
        .map(|tag| (tag.name.as_str(), tag.count))
        .collect();
    assert_eq!(counts, vec![("x", 1), ("y", 1)]);

    assert!(
        repos
            .find_by_slug(PostListScope::Public, "post-b")
            .await
            .expect("lookup")
            .is_none()
    );
}

#[sqlx::test(migrations = "./migrations")]
#[ignore = "requires DATABASE_URL"]
async fn duplicate_slug_hits_the_unique_constraint(pool: PgPool) {
    let repos = PostgresRepositories::new(pool);
    let author_id = author(&repos).await;
    create(&repos, author_id, "hello-world", true, datetime!(2023-06-01 0:00 UTC), &[])
        .await
        .expect("first");

    let err = create(&repos, author_id, "hello-world", true, datetime!(2023-06-01 0:00 UTC), &[])
        .await
        .expect_err("duplicate");
    assert!(matches!(
        err,
        RepoError::Duplicate { ref constraint } if constraint == "posts_slug_key"
    ));
}

#[sqlx::test(migrations = "./migrations")]
#[ignore = "requires DATABASE_URL"]
async fn unknown_author_hits_the_author_foreign_key(pool: PgPool) {
    let repos = PostgresRepositories::new(pool);

    let err = create(&repos, Uuid::new_v4(), "orphan", true, datetime!(2023-06-01 0:00 UTC), &[])
        .await
        .expect_err("unknown author");
    assert!(matches!(
        err,
        RepoError::ForeignKey { ref constraint } if constraint == "posts_author_id_fkey"
    ));
}

#[sqlx::test(migrations = "./migrations")]
#[ignore = "requires DATABASE_URL"]
async fn update_replaces_tags_and_keeps_date(pool: PgPool) {
    let repos = PostgresRepositories::new(pool);
    let author_id = author(&repos).await;
    let date = datetime!(2023-06-01 0:00 UTC);
    let id = create(&repos, author_id, "post-a", true, date, &["x", "y"])
        .await
        .expect("create");

    let tag_ids = repos
        .upsert_tags_by_name(&["z".to_string()])
        .await
        .expect("tags")
        .into_iter()
        .map(|tag| tag.id)
        .collect();
    let updated = repos
        .update_post(UpdatePostParams {
            id,
            slug: "post-a".into(),
            title: "Renamed".into(),
            summary: String::new(),
            content: "<p>new</p>".into(),
            date: None,
            published: true,
            image: None,
            reading_time: None,
            author_id,
            tag_ids,
        })
        .await
        .expect("update");

    assert_eq!(updated.post.title, "Renamed");
    assert_eq!(updated.post.date, date);
    let tags: Vec<&str> = updated.tags.iter().map(|tag| tag.name.as_str()).collect();
    assert_eq!(tags, vec!["z"]);

    repos.delete_post(id).await.expect("delete");
    assert!(matches!(repos.delete_post(id).await, Err(RepoError::NotFound)));
}

#[sqlx::test(migrations = "./migrations")]
#[ignore = "requires DATABASE_URL"]
async fn sessions_round_through_prefix_lookup(pool: PgPool) {
    let repos = PostgresRepositories::new(pool);
    let user_id = author(&repos).await;

    repos
        .create_session(CreateSessionParams {
            user_id,
            prefix: "abcdef012345".into(),
            hashed_secret: vec![1, 2, 3],
            expires_at: datetime!(2000-01-01 0:00 UTC),
        })
        .await
        .expect("create session");

    let found = repos
        .find_by_prefix("abcdef012345")
        .await
        .expect("find")
        .expect("session exists");
    assert_eq!(found.user_id, user_id);

    let purged = repos
        .delete_expired(datetime!(2001-01-01 0:00 UTC))
        .await
        .expect("purge");
    assert_eq!(purged, 1);
    repos.health_check().await.expect("healthy");
}

#[sqlx::test(migrations = "./migrations")]
#[ignore = "requires DATABASE_URL"]
async fn listing_index_exists(pool: PgPool) {
    let rows: Vec<String> = sqlx::query_scalar(
        "SELECT indexname FROM pg_indexes WHERE schemaname = 'public' AND tablename = 'posts'",
    )
    .fetch_all(&pool)
    .await
    .expect("fetch post indexes");

    let indexes: HashSet<String> = rows.into_iter().collect();
    assert!(indexes.contains("posts_listing_idx"), "missing posts_listing_idx");
    assert!(indexes.contains("posts_slug_key"), "missing posts_slug_key");
}
