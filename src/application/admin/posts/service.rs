use std::sync::Arc;

use crate::application::repos::{PostsRepo, PostsWriteRepo, TagsWriteRepo, UsersRepo};

/// Draft-aware post management for authenticated editors.
#[derive(Clone)]
pub struct AdminPostService {
    pub(crate) reader: Arc<dyn PostsRepo>,
    pub(crate) writer: Arc<dyn PostsWriteRepo>,
    pub(crate) tags: Arc<dyn TagsWriteRepo>,
    pub(crate) users: Arc<dyn UsersRepo>,
}

impl AdminPostService {
    pub fn new(
        reader: Arc<dyn PostsRepo>,
        writer: Arc<dyn PostsWriteRepo>,
        tags: Arc<dyn TagsWriteRepo>,
        users: Arc<dyn UsersRepo>,
    ) -> Self {
        Self {
            reader,
            writer,
            tags,
            users,
        }
    }
}
