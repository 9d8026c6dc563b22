//! In-memory repositories, used when no DATABASE_URL is configured and in tests.

use std::collections::BTreeMap;

use async_trait::async_trait;
use chrono::Utc;
use tokio::sync::RwLock;

use super::models::{
    Blog, ContactMessage, NewBlog, NewContactMessage, NewSocialLink, Project, ProjectInput,
    SocialLink,
};
use super::store::{BlogStore, ContactStore, ProjectStore, SocialLinkStore};
use crate::error::{AppError, Result};

/// Rows keyed by a store-assigned id
struct Table<T> {
    next_id: i64,
    rows: BTreeMap<i64, T>,
}

impl<T> Default for Table<T> {
    fn default() -> Self {
        Self {
            next_id: 1,
            rows: BTreeMap::new(),
        }
    }
}

impl<T> Table<T> {
    fn allocate_id(&mut self) -> i64 {
        let id = self.next_id;
        self.next_id += 1;
        id
    }
}

#[derive(Default)]
pub struct MemoryStore {
    blogs: RwLock<Table<Blog>>,
    projects: RwLock<Table<Project>>,
    social_links: RwLock<Table<SocialLink>>,
    contacts: RwLock<Table<ContactMessage>>,
}

fn newest_first(posts: &mut [Blog]) {
    posts.sort_by(|a, b| {
        b.published_at
            .cmp(&a.published_at)
            .then_with(|| b.id.cmp(&a.id))
    });
}

fn slug_taken(table: &Table<Blog>, slug: &str, except: Option<i64>) -> bool {
    table
        .rows
        .values()
        .any(|post| post.slug == slug && Some(post.id) != except)
}

#[async_trait]
impl BlogStore for MemoryStore {
    async fn list_published(&self) -> Result<Vec<Blog>> {
        let table = self.blogs.read().await;
        let mut posts: Vec<Blog> = table.rows.values().filter(|p| p.published).cloned().collect();
        newest_first(&mut posts);
        Ok(posts)
    }

    async fn find_by_slug(&self, slug: &str, published_only: bool) -> Result<Option<Blog>> {
        let table = self.blogs.read().await;
        Ok(table
            .rows
            .values()
            .find(|p| p.slug == slug && (p.published || !published_only))
            .cloned())
    }

    async fn find_by_tag(&self, tag: &str) -> Result<Vec<Blog>> {
        let needle = tag.to_lowercase();
        let table = self.blogs.read().await;
        let mut posts: Vec<Blog> = table
            .rows
            .values()
            .filter(|p| p.published)
            .filter(|p| {
                p.tags
                    .as_deref()
                    .is_some_and(|tags| tags.to_lowercase().contains(&needle))
            })
            .cloned()
            .collect();
        newest_first(&mut posts);
        Ok(posts)
    }

    async fn count(&self) -> Result<i64> {
        Ok(self.blogs.read().await.rows.len() as i64)
    }

    async fn insert(&self, blog: NewBlog) -> Result<Blog> {
        let mut table = self.blogs.write().await;
        if slug_taken(&table, &blog.slug, None) {
            return Err(AppError::Conflict("Slug already exists".to_string()));
        }

        let now = Utc::now();
        let post = Blog {
            id: table.allocate_id(),
            title: blog.title,
            slug: blog.slug,
            summary: blog.summary,
            content: blog.content,
            cover_image_url: blog.cover_image_url,
            tags: blog.tags,
            published: blog.published,
            published_at: blog.published_at,
            created_at: now,
            updated_at: now,
        };
        table.rows.insert(post.id, post.clone());
        Ok(post)
    }

    async fn update(&self, id: i64, blog: NewBlog) -> Result<Option<Blog>> {
        let mut table = self.blogs.write().await;
        if !table.rows.contains_key(&id) {
            return Ok(None);
        }
        if slug_taken(&table, &blog.slug, Some(id)) {
            return Err(AppError::Conflict("Slug already exists".to_string()));
        }

        let Some(post) = table.rows.get_mut(&id) else {
            return Ok(None);
        };
        post.title = blog.title;
        post.slug = blog.slug;
        post.summary = blog.summary;
        post.content = blog.content;
        post.cover_image_url = blog.cover_image_url;
        post.tags = blog.tags;
        post.published = blog.published;
        post.published_at = blog.published_at;
        post.updated_at = Utc::now();
        Ok(Some(post.clone()))
    }

    async fn delete(&self, id: i64) -> Result<()> {
        self.blogs.write().await.rows.remove(&id);
        Ok(())
    }
}

#[async_trait]
impl ProjectStore for MemoryStore {
    async fn list(&self) -> Result<Vec<Project>> {
        Ok(self.projects.read().await.rows.values().cloned().collect())
    }

    async fn find_by_id(&self, id: i64) -> Result<Option<Project>> {
        Ok(self.projects.read().await.rows.get(&id).cloned())
    }

    async fn insert(&self, project: ProjectInput) -> Result<Project> {
        let mut table = self.projects.write().await;
        let now = Utc::now();
        let (image_data, image_content_type) = match project.image {
            Some(image) => (Some(image.bytes), Some(image.content_type)),
            None => (None, None),
        };
        let saved = Project {
            id: table.allocate_id(),
            title: project.title,
            description: project.description,
            project_url: project.project_url,
            tags: project.tags,
            image_data,
            image_content_type,
            created_at: now,
            updated_at: now,
        };
        table.rows.insert(saved.id, saved.clone());
        Ok(saved)
    }

    async fn update(&self, id: i64, project: ProjectInput) -> Result<Option<Project>> {
        let mut table = self.projects.write().await;
        Ok(table.rows.get_mut(&id).map(|existing| {
            existing.merge(project);
            existing.clone()
        }))
    }

    async fn delete(&self, id: i64) -> Result<()> {
        self.projects.write().await.rows.remove(&id);
        Ok(())
    }
}

#[async_trait]
impl SocialLinkStore for MemoryStore {
    async fn list_active(&self) -> Result<Vec<SocialLink>> {
        let table = self.social_links.read().await;
        let mut links: Vec<SocialLink> =
            table.rows.values().filter(|l| l.is_active).cloned().collect();
        links.sort_by_key(|l| (l.display_order, l.id));
        Ok(links)
    }

    async fn insert(&self, link: NewSocialLink) -> Result<SocialLink> {
        let mut table = self.social_links.write().await;
        let saved = SocialLink {
            id: table.allocate_id(),
            platform_name: link.platform_name,
            url: link.url,
            icon_name: link.icon_name,
            is_active: link.is_active,
            display_order: link.display_order,
        };
        table.rows.insert(saved.id, saved.clone());
        Ok(saved)
    }

    async fn delete(&self, id: i64) -> Result<()> {
        self.social_links.write().await.rows.remove(&id);
        Ok(())
    }
}

#[async_trait]
impl ContactStore for MemoryStore {
    async fn insert(&self, message: NewContactMessage) -> Result<ContactMessage> {
        let mut table = self.contacts.write().await;
        let (voice_memo_data, voice_memo_content_type) = match message.voice_memo {
            Some(memo) => (Some(memo.bytes), Some(memo.content_type)),
            None => (None, None),
        };
        let saved = ContactMessage {
            id: table.allocate_id(),
            sender_name: message.sender_name,
            sender_email: message.sender_email,
            phone: message.phone,
            message: message.message,
            voice_memo_data,
            voice_memo_content_type,
            submitted_at: Utc::now(),
            is_read: false,
        };
        table.rows.insert(saved.id, saved.clone());
        Ok(saved)
    }

    async fn list_recent(&self) -> Result<Vec<ContactMessage>> {
        let table = self.contacts.read().await;
        let mut messages: Vec<ContactMessage> = table.rows.values().cloned().collect();
        messages.sort_by(|a, b| {
            b.submitted_at
                .cmp(&a.submitted_at)
                .then_with(|| b.id.cmp(&a.id))
        });
        Ok(messages)
    }

    async fn find_by_id(&self, id: i64) -> Result<Option<ContactMessage>> {
        Ok(self.contacts.read().await.rows.get(&id).cloned())
    }
}
