use crispr_api_types::BlogPost;
use time::OffsetDateTime;
use tracing::info;
use uuid::Uuid;

use crate::application::repos::{
    CreatePostParams, PostListScope, RepoError, UpdatePostParams,
};
use crate::application::shaper::shape_post;
use crate::domain::posts::{normalize_tag_names, resolve_slug};

use super::service::AdminPostService;
use super::types::{AdminPostError, WritePostCommand, ensure_non_empty};

struct PreparedPost {
    slug: String,
    content: String,
    tag_names: Vec<String>,
}

impl AdminPostService {
    pub async fn create(&self, command: WritePostCommand) -> Result<BlogPost, AdminPostError> {
        let prepared = prepare(&command)?;
        self.ensure_author(command.author_id).await?;

        if self
            .reader
            .find_by_slug(PostListScope::Editor { published: None }, &prepared.slug)
            .await?
            .is_some()
        {
            return Err(AdminPostError::DuplicateSlug(prepared.slug));
        }

        let tag_ids = self.resolve_tag_ids(&prepared.tag_names).await?;

        let params = CreatePostParams {
            slug: prepared.slug.clone(),
            title: command.title.trim().to_string(),
            summary: command.summary,
            content: prepared.content,
            date: command.date.unwrap_or_else(OffsetDateTime::now_utc),
            published: command.published,
            image: command.image,
            reading_time: command.reading_time,
            author_id: command.author_id,
            tag_ids,
        };

        let post = self
            .writer
            .create_post(params)
            .await
            .map_err(|err| AdminPostError::from_write(err, &prepared.slug, command.author_id))?;

        info!(
            target = "crispr::admin::posts",
            post_id = %post.post.id,
            slug = %post.post.slug,
            published = post.post.published,
            "post created"
        );

        Ok(shape_post(post))
    }

    /// Replace every mutable field of `id`, including its tag set.
    pub async fn update(
        &self,
        id: Uuid,
        command: WritePostCommand,
    ) -> Result<BlogPost, AdminPostError> {
        let existing = self
            .reader
            .find_by_id(id)
            .await?
            .ok_or(AdminPostError::NotFound)?;

        let prepared = prepare(&command)?;
        self.ensure_author(command.author_id).await?;

        if prepared.slug != existing.post.slug
            && let Some(other) = self
                .reader
                .find_by_slug(PostListScope::Editor { published: None }, &prepared.slug)
                .await?
            && other.post.id != id
        {
            return Err(AdminPostError::DuplicateSlug(prepared.slug));
        }

        let tag_ids = self.resolve_tag_ids(&prepared.tag_names).await?;

        let params = UpdatePostParams {
            id,
            slug: prepared.slug.clone(),
            title: command.title.trim().to_string(),
            summary: command.summary,
            content: prepared.content,
            date: command.date,
            published: command.published,
            image: command.image,
            reading_time: command.reading_time,
            author_id: command.author_id,
            tag_ids,
        };

        let post = self
            .writer
            .update_post(params)
            .await
            .map_err(|err| AdminPostError::from_write(err, &prepared.slug, command.author_id))?;

        info!(
            target = "crispr::admin::posts",
            post_id = %post.post.id,
            slug = %post.post.slug,
            published = post.post.published,
            "post updated"
        );

        Ok(shape_post(post))
    }

    pub async fn delete(&self, id: Uuid) -> Result<(), AdminPostError> {
        self.writer.delete_post(id).await.map_err(|err| match err {
            RepoError::NotFound => AdminPostError::NotFound,
            other => AdminPostError::Repo(other),
        })?;

        info!(target = "crispr::admin::posts", post_id = %id, "post deleted");
        Ok(())
    }

    async fn ensure_author(&self, author_id: Uuid) -> Result<(), AdminPostError> {
        match self.users.find_by_id(author_id).await? {
            Some(_) => Ok(()),
            None => Err(AdminPostError::UnknownAuthor(author_id)),
        }
    }

    async fn resolve_tag_ids(&self, names: &[String]) -> Result<Vec<Uuid>, AdminPostError> {
        if names.is_empty() {
            return Ok(Vec::new());
        }
        let tags = self.tags.upsert_tags_by_name(names).await?;
        Ok(tags.into_iter().map(|tag| tag.id).collect())
    }
}

fn prepare(command: &WritePostCommand) -> Result<PreparedPost, AdminPostError> {
    ensure_non_empty(&command.title, "title")?;
    ensure_non_empty(&command.content, "content")?;

    let slug = resolve_slug(&command.slug, &command.title)?;
    let content = ammonia::clean(&command.content);
    // Markup that sanitizes to nothing is as good as empty.
    ensure_non_empty(&content, "content")?;

    Ok(PreparedPost {
        slug,
        content,
        tag_names: normalize_tag_names(&command.tags),
    })
}

#[cfg(test)]
mod tests {
    use std::sync::{Arc, Mutex};

    use async_trait::async_trait;
    use time::macros::datetime;

    use super::*;
    use crate::application::repos::{
        PostQueryFilter, PostsRepo, PostsWriteRepo, TagsWriteRepo, UpsertUserParams, UsersRepo,
    };
    use crate::domain::entities::{
        AuthorRecord, PostRecord, PostWithRelations, TagRecord, UserRecord,
    };
    use crate::domain::types::UserRole;

    const AUTHOR: Uuid = Uuid::from_u128(7);

    #[derive(Default)]
    struct MemoryStore {
        posts: Mutex<Vec<PostWithRelations>>,
        tags: Mutex<Vec<TagRecord>>,
        upsert_calls: Mutex<usize>,
    }

    impl MemoryStore {
        fn author() -> AuthorRecord {
            AuthorRecord {
                id: AUTHOR,
                name: "Ada".into(),
                image: None,
                bio: None,
            }
        }

        fn tags_for(&self, ids: &[Uuid]) -> Vec<TagRecord> {
            let tags = self.tags.lock().unwrap();
            ids.iter()
                .filter_map(|id| tags.iter().find(|tag| tag.id == *id).cloned())
                .collect()
        }
    }

    #[async_trait]
    impl PostsRepo for MemoryStore {
        async fn list_posts(
            &self,
            scope: PostListScope,
            _filter: &PostQueryFilter,
        ) -> Result<Vec<PostWithRelations>, RepoError> {
            Ok(self
                .posts
                .lock()
                .unwrap()
                .iter()
                .filter(|p| scope.admits(p.post.published))
                .cloned()
                .collect())
        }

        async fn find_by_slug(
            &self,
            scope: PostListScope,
            slug: &str,
        ) -> Result<Option<PostWithRelations>, RepoError> {
            Ok(self
                .posts
                .lock()
                .unwrap()
                .iter()
                .find(|p| p.post.slug == slug && scope.admits(p.post.published))
                .cloned())
        }

        async fn find_by_id(&self, id: Uuid) -> Result<Option<PostWithRelations>, RepoError> {
            Ok(self
                .posts
                .lock()
                .unwrap()
                .iter()
                .find(|p| p.post.id == id)
                .cloned())
        }
    }

    #[async_trait]
    impl PostsWriteRepo for MemoryStore {
        async fn create_post(
            &self,
            params: CreatePostParams,
        ) -> Result<PostWithRelations, RepoError> {
            let now = OffsetDateTime::now_utc();
            let record = PostWithRelations {
                post: PostRecord {
                    id: Uuid::new_v4(),
                    slug: params.slug,
                    title: params.title,
                    summary: params.summary,
                    content: params.content,
                    date: params.date,
                    published: params.published,
                    image: params.image,
                    reading_time: params.reading_time,
                    author_id: params.author_id,
                    created_at: now,
                    updated_at: now,
                },
                author: Self::author(),
                tags: self.tags_for(&params.tag_ids),
            };
            self.posts.lock().unwrap().push(record.clone());
            Ok(record)
        }

        async fn update_post(
            &self,
            params: UpdatePostParams,
        ) -> Result<PostWithRelations, RepoError> {
            let tags = self.tags_for(&params.tag_ids);
            let mut posts = self.posts.lock().unwrap();
            let existing = posts
                .iter_mut()
                .find(|p| p.post.id == params.id)
                .ok_or(RepoError::NotFound)?;
            existing.post.slug = params.slug;
            existing.post.title = params.title;
            existing.post.content = params.content;
            existing.post.published = params.published;
            if let Some(date) = params.date {
                existing.post.date = date;
            }
            existing.tags = tags;
            Ok(existing.clone())
        }

        async fn delete_post(&self, id: Uuid) -> Result<(), RepoError> {
            let mut posts = self.posts.lock().unwrap();
            let before = posts.len();
            posts.retain(|p| p.post.id != id);
            if posts.len() == before {
                return Err(RepoError::NotFound);
            }
            Ok(())
        }
    }

    #[async_trait]
    impl TagsWriteRepo for MemoryStore {
        async fn upsert_tags_by_name(&self, names: &[String]) -> Result<Vec<TagRecord>, RepoError> {
            *self.upsert_calls.lock().unwrap() += 1;
            let mut tags = self.tags.lock().unwrap();
            let mut out = Vec::new();
            for name in names {
                let tag = match tags.iter().find(|tag| &tag.name == name) {
                    Some(tag) => tag.clone(),
                    None => {
                        let tag = TagRecord {
                            id: Uuid::new_v4(),
                            name: name.clone(),
                            created_at: OffsetDateTime::now_utc(),
                        };
                        tags.push(tag.clone());
                        tag
                    }
                };
                out.push(tag);
            }
            Ok(out)
        }
    }

    #[async_trait]
    impl UsersRepo for MemoryStore {
        async fn find_by_email(&self, _email: &str) -> Result<Option<UserRecord>, RepoError> {
            Ok(None)
        }

        async fn find_by_id(&self, id: Uuid) -> Result<Option<UserRecord>, RepoError> {
            Ok((id == AUTHOR).then(|| UserRecord {
                id: AUTHOR,
                email: "ada@example.org".into(),
                name: "Ada".into(),
                password_hash: None,
                role: UserRole::Admin,
                image: None,
                bio: None,
                created_at: OffsetDateTime::UNIX_EPOCH,
            }))
        }

        async fn list_authors(&self) -> Result<Vec<AuthorRecord>, RepoError> {
            Ok(vec![Self::author()])
        }

        async fn upsert_user(&self, _params: UpsertUserParams) -> Result<UserRecord, RepoError> {
            Err(RepoError::from_persistence("not supported"))
        }
    }

    fn service() -> (AdminPostService, Arc<MemoryStore>) {
        let store = Arc::new(MemoryStore::default());
        let service = AdminPostService::new(
            store.clone(),
            store.clone(),
            store.clone(),
            store.clone(),
        );
        (service, store)
    }

    fn command(title: &str, slug: &str, tags: &[&str]) -> WritePostCommand {
        WritePostCommand {
            title: title.into(),
            slug: slug.into(),
            summary: "summary".into(),
            content: "<p>Body</p>".into(),
            image: None,
            reading_time: Some("5 min read".into()),
            tags: tags.iter().map(|t| t.to_string()).collect(),
            published: true,
            author_id: AUTHOR,
            date: Some(datetime!(2023-06-01 0:00 UTC)),
        }
    }

    #[tokio::test]
    async fn create_derives_slug_and_links_normalized_tags() {
        let (service, _) = service();

        let post = service
            .create(command("Gene Drives Explained", "", &[" x ", "y", "x", ""]))
            .await
            .unwrap();

        assert_eq!(post.slug, "gene-drives-explained");
        assert_eq!(post.tags, vec!["x", "y"]);
        assert_eq!(post.date, datetime!(2023-06-01 0:00 UTC));
    }

    #[tokio::test]
    async fn create_duplicate_slug_mutates_nothing() {
        let (service, store) = service();
        let original = service
            .create(command("First", "shared", &["x"]))
            .await
            .unwrap();
        let upserts_before = *store.upsert_calls.lock().unwrap();

        let err = service
            .create(command("Second", "shared", &["new-tag"]))
            .await
            .unwrap_err();

        assert!(matches!(err, AdminPostError::DuplicateSlug(ref slug) if slug == "shared"));
        assert_eq!(*store.upsert_calls.lock().unwrap(), upserts_before);
        let posts = store.posts.lock().unwrap();
        assert_eq!(posts.len(), 1);
        assert_eq!(posts[0].post.title, original.title);
    }

    #[tokio::test]
    async fn create_rejects_unknown_author() {
        let (service, _) = service();
        let mut cmd = command("Hello", "", &[]);
        cmd.author_id = Uuid::from_u128(99);

        assert!(matches!(
            service.create(cmd).await,
            Err(AdminPostError::UnknownAuthor(_))
        ));
    }

    #[tokio::test]
    async fn create_rejects_non_canonical_slug_and_blank_title() {
        let (service, _) = service();

        assert!(matches!(
            service.create(command("Hello", "Not A Slug", &[])).await,
            Err(AdminPostError::Validation(_))
        ));
        assert!(matches!(
            service.create(command("  ", "hello", &[])).await,
            Err(AdminPostError::ConstraintViolation("title"))
        ));
    }

    #[tokio::test]
    async fn create_sanitizes_content() {
        let (service, _) = service();
        let mut cmd = command("Hello", "", &[]);
        cmd.content = "<p>ok</p><script>alert(1)</script>".into();

        let post = service.create(cmd).await.unwrap();

        assert_eq!(post.content, "<p>ok</p>");
    }

    #[tokio::test]
    async fn update_replaces_tags_and_keeps_date_when_omitted() {
        let (service, _) = service();
        let created = service
            .create(command("Hello", "hello", &["x", "y"]))
            .await
            .unwrap();

        let mut cmd = command("Hello again", "hello", &["z"]);
        cmd.date = None;
        let updated = service.update(created.id, cmd).await.unwrap();

        assert_eq!(updated.title, "Hello again");
        assert_eq!(updated.tags, vec!["z"]);
        assert_eq!(updated.date, created.date);
    }

    #[tokio::test]
    async fn update_rejects_slug_taken_by_another_post() {
        let (service, _) = service();
        service.create(command("One", "one", &[])).await.unwrap();
        let two = service.create(command("Two", "two", &[])).await.unwrap();

        assert!(matches!(
            service.update(two.id, command("Two", "one", &[])).await,
            Err(AdminPostError::DuplicateSlug(_))
        ));
    }

    #[tokio::test]
    async fn update_and_delete_missing_post_are_not_found() {
        let (service, _) = service();
        let missing = Uuid::new_v4();

        assert!(matches!(
            service.update(missing, command("x", "", &[])).await,
            Err(AdminPostError::NotFound)
        ));
        assert!(matches!(
            service.delete(missing).await,
            Err(AdminPostError::NotFound)
        ));
    }

    #[tokio::test]
    async fn editor_listing_includes_drafts() {
        let (service, _) = service();
        service.create(command("Live", "live", &[])).await.unwrap();
        let mut draft = command("Draft", "draft", &[]);
        draft.published = false;
        service.create(draft).await.unwrap();

        assert_eq!(service.list_all(None).await.unwrap().len(), 2);
        let drafts = service.list_all(Some(false)).await.unwrap();
        assert_eq!(drafts.len(), 1);
        assert_eq!(drafts[0].slug, "draft");
        assert_eq!(service.get_by_slug("draft").await.unwrap().slug, "draft");
    }

    #[test]
    fn duplicate_constraint_maps_to_duplicate_slug() {
        let err = AdminPostError::from_write(
            RepoError::Duplicate {
                constraint: "posts_slug_key".into(),
            },
            "hello",
            AUTHOR,
        );
        assert!(matches!(err, AdminPostError::DuplicateSlug(slug) if slug == "hello"));
    }
}
