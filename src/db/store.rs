//! Repository traits shared by the Postgres and in-memory backends.

use std::sync::Arc;

use async_trait::async_trait;

use super::models::{
    Blog, ContactMessage, NewBlog, NewContactMessage, NewSocialLink, Project, ProjectInput,
    SocialLink,
};
use crate::error::Result;

#[async_trait]
pub trait BlogStore: Send + Sync {
    /// Published posts, newest first
    async fn list_published(&self) -> Result<Vec<Blog>>;
    async fn find_by_slug(&self, slug: &str, published_only: bool) -> Result<Option<Blog>>;
    /// Published posts whose tag list contains `tag`, ignoring case
    async fn find_by_tag(&self, tag: &str) -> Result<Vec<Blog>>;
    async fn count(&self) -> Result<i64>;
    async fn insert(&self, blog: NewBlog) -> Result<Blog>;
    /// Full replacement; `None` when no row has this id
    async fn update(&self, id: i64, blog: NewBlog) -> Result<Option<Blog>>;
    async fn delete(&self, id: i64) -> Result<()>;
}

#[async_trait]
pub trait ProjectStore: Send + Sync {
    async fn list(&self) -> Result<Vec<Project>>;
    async fn find_by_id(&self, id: i64) -> Result<Option<Project>>;
    async fn insert(&self, project: ProjectInput) -> Result<Project>;
    /// Merge per [`Project::merge`]; `None` when no row has this id
    async fn update(&self, id: i64, project: ProjectInput) -> Result<Option<Project>>;
    async fn delete(&self, id: i64) -> Result<()>;
}

#[async_trait]
pub trait SocialLinkStore: Send + Sync {
    /// Active links by ascending display order
    async fn list_active(&self) -> Result<Vec<SocialLink>>;
    async fn insert(&self, link: NewSocialLink) -> Result<SocialLink>;
    async fn delete(&self, id: i64) -> Result<()>;
}

#[async_trait]
pub trait ContactStore: Send + Sync {
    async fn insert(&self, message: NewContactMessage) -> Result<ContactMessage>;
    /// All submissions, newest first
    async fn list_recent(&self) -> Result<Vec<ContactMessage>>;
    async fn find_by_id(&self, id: i64) -> Result<Option<ContactMessage>>;
}

/// One handle per entity table
#[derive(Clone)]
pub struct Stores {
    pub blogs: Arc<dyn BlogStore>,
    pub projects: Arc<dyn ProjectStore>,
    pub social_links: Arc<dyn SocialLinkStore>,
    pub contacts: Arc<dyn ContactStore>,
}

impl Stores {
    pub fn postgres(pool: sqlx::PgPool) -> Self {
        let store = Arc::new(super::postgres::PgStore::new(pool));
        Self {
            blogs: store.clone(),
            projects: store.clone(),
            social_links: store.clone(),
            contacts: store,
        }
    }

    pub fn in_memory() -> Self {
        let store = Arc::new(super::memory::MemoryStore::default());
        Self {
            blogs: store.clone(),
            projects: store.clone(),
            social_links: store.clone(),
            contacts: store,
        }
    }
}
