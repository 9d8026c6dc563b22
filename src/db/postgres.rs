//! Postgres-backed repositories (sqlx)

use async_trait::async_trait;
use sqlx::PgPool;

use super::models::{
    Blog, ContactMessage, NewBlog, NewContactMessage, NewSocialLink, Project, ProjectInput,
    SocialLink,
};
use super::store::{BlogStore, ContactStore, ProjectStore, SocialLinkStore};
use crate::error::{conflict_on_unique, Result};

const BLOG_COLUMNS: &str = "id, title, slug, summary, content, cover_image_url, tags, published, \
                            published_at, created_at, updated_at";

const PROJECT_COLUMNS: &str = "id, title, description, project_url, tags, image_data, \
                               image_content_type, created_at, updated_at";

const SOCIAL_LINK_COLUMNS: &str = "id, platform_name, url, icon_name, is_active, display_order";

const CONTACT_COLUMNS: &str = "id, sender_name, sender_email, phone, message, voice_memo_data, \
                               voice_memo_content_type, submitted_at, is_read";

const DUPLICATE_SLUG: &str = "Slug already exists";

#[derive(Clone)]
pub struct PgStore {
    pool: PgPool,
}

impl PgStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

/// Escape `LIKE` wildcards so a tag is matched literally
pub(crate) fn escape_like(input: &str) -> String {
    let mut escaped = String::with_capacity(input.len());
    for c in input.chars() {
        if matches!(c, '%' | '_' | '\\') {
            escaped.push('\\');
        }
        escaped.push(c);
    }
    escaped
}

#[async_trait]
impl BlogStore for PgStore {
    async fn list_published(&self) -> Result<Vec<Blog>> {
        let posts = sqlx::query_as::<_, Blog>(&format!(
            "SELECT {BLOG_COLUMNS} FROM blogs WHERE published = true \
             ORDER BY published_at DESC NULLS LAST, id DESC"
        ))
        .fetch_all(&self.pool)
        .await?;
        Ok(posts)
    }

    async fn find_by_slug(&self, slug: &str, published_only: bool) -> Result<Option<Blog>> {
        let post = sqlx::query_as::<_, Blog>(&format!(
            "SELECT {BLOG_COLUMNS} FROM blogs WHERE slug = $1 AND (published = true OR $2 = false)"
        ))
        .bind(slug)
        .bind(published_only)
        .fetch_optional(&self.pool)
        .await?;
        Ok(post)
    }

    async fn find_by_tag(&self, tag: &str) -> Result<Vec<Blog>> {
        let pattern = format!("%{}%", escape_like(tag));
        let posts = sqlx::query_as::<_, Blog>(&format!(
            "SELECT {BLOG_COLUMNS} FROM blogs \
             WHERE published = true AND tags ILIKE $1 ESCAPE '\\' \
             ORDER BY published_at DESC NULLS LAST, id DESC"
        ))
        .bind(pattern)
        .fetch_all(&self.pool)
        .await?;
        Ok(posts)
    }

    async fn count(&self) -> Result<i64> {
        let (total,): (i64,) = sqlx::query_as("SELECT COUNT(*) FROM blogs")
            .fetch_one(&self.pool)
            .await?;
        Ok(total)
    }

    async fn insert(&self, blog: NewBlog) -> Result<Blog> {
        sqlx::query_as::<_, Blog>(&format!(
            "INSERT INTO blogs (title, slug, summary, content, cover_image_url, tags, published, published_at) \
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8) \
             RETURNING {BLOG_COLUMNS}"
        ))
        .bind(&blog.title)
        .bind(&blog.slug)
        .bind(&blog.summary)
        .bind(&blog.content)
        .bind(&blog.cover_image_url)
        .bind(&blog.tags)
        .bind(blog.published)
        .bind(blog.published_at)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| conflict_on_unique(e, DUPLICATE_SLUG))
    }

    async fn update(&self, id: i64, blog: NewBlog) -> Result<Option<Blog>> {
        sqlx::query_as::<_, Blog>(&format!(
            "UPDATE blogs \
             SET title = $1, slug = $2, summary = $3, content = $4, cover_image_url = $5, \
                 tags = $6, published = $7, published_at = $8, updated_at = now() \
             WHERE id = $9 \
             RETURNING {BLOG_COLUMNS}"
        ))
        .bind(&blog.title)
        .bind(&blog.slug)
        .bind(&blog.summary)
        .bind(&blog.content)
        .bind(&blog.cover_image_url)
        .bind(&blog.tags)
        .bind(blog.published)
        .bind(blog.published_at)
        .bind(id)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| conflict_on_unique(e, DUPLICATE_SLUG))
    }

    async fn delete(&self, id: i64) -> Result<()> {
        sqlx::query("DELETE FROM blogs WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;
        Ok(())
    }
}

#[async_trait]
impl ProjectStore for PgStore {
    async fn list(&self) -> Result<Vec<Project>> {
        let projects =
            sqlx::query_as::<_, Project>(&format!("SELECT {PROJECT_COLUMNS} FROM projects ORDER BY id"))
                .fetch_all(&self.pool)
                .await?;
        Ok(projects)
    }

    async fn find_by_id(&self, id: i64) -> Result<Option<Project>> {
        let project =
            sqlx::query_as::<_, Project>(&format!("SELECT {PROJECT_COLUMNS} FROM projects WHERE id = $1"))
                .bind(id)
                .fetch_optional(&self.pool)
                .await?;
        Ok(project)
    }

    async fn insert(&self, project: ProjectInput) -> Result<Project> {
        let (image_data, image_content_type) = match project.image {
            Some(image) => (Some(image.bytes), Some(image.content_type)),
            None => (None, None),
        };

        let project = sqlx::query_as::<_, Project>(&format!(
            "INSERT INTO projects (title, description, project_url, tags, image_data, image_content_type) \
             VALUES ($1, $2, $3, $4, $5, $6) \
             RETURNING {PROJECT_COLUMNS}"
        ))
        .bind(&project.title)
        .bind(&project.description)
        .bind(&project.project_url)
        .bind(&project.tags)
        .bind(image_data)
        .bind(image_content_type)
        .fetch_one(&self.pool)
        .await?;
        Ok(project)
    }

    async fn update(&self, id: i64, project: ProjectInput) -> Result<Option<Project>> {
        // Both image columns are written from the same optional upload, so a
        // NULL upload leaves the stored pair untouched.
        let (image_data, image_content_type) = match project.image {
            Some(image) => (Some(image.bytes), Some(image.content_type)),
            None => (None, None),
        };

        let updated = sqlx::query_as::<_, Project>(&format!(
            "UPDATE projects \
             SET title = $1, description = $2, project_url = $3, tags = $4, \
                 image_data = COALESCE($5, image_data), \
                 image_content_type = CASE WHEN $5 IS NULL THEN image_content_type ELSE $6 END, \
                 updated_at = now() \
             WHERE id = $7 \
             RETURNING {PROJECT_COLUMNS}"
        ))
        .bind(&project.title)
        .bind(&project.description)
        .bind(&project.project_url)
        .bind(&project.tags)
        .bind(image_data)
        .bind(image_content_type)
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;
        Ok(updated)
    }

    async fn delete(&self, id: i64) -> Result<()> {
        sqlx::query("DELETE FROM projects WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;
        Ok(())
    }
}

#[async_trait]
impl SocialLinkStore for PgStore {
    async fn list_active(&self) -> Result<Vec<SocialLink>> {
        let links = sqlx::query_as::<_, SocialLink>(&format!(
            "SELECT {SOCIAL_LINK_COLUMNS} FROM social_links \
             WHERE is_active = true ORDER BY display_order ASC, id ASC"
        ))
        .fetch_all(&self.pool)
        .await?;
        Ok(links)
    }

    async fn insert(&self, link: NewSocialLink) -> Result<SocialLink> {
        let link = sqlx::query_as::<_, SocialLink>(&format!(
            "INSERT INTO social_links (platform_name, url, icon_name, is_active, display_order) \
             VALUES ($1, $2, $3, $4, $5) \
             RETURNING {SOCIAL_LINK_COLUMNS}"
        ))
        .bind(&link.platform_name)
        .bind(&link.url)
        .bind(&link.icon_name)
        .bind(link.is_active)
        .bind(link.display_order)
        .fetch_one(&self.pool)
        .await?;
        Ok(link)
    }

    async fn delete(&self, id: i64) -> Result<()> {
        sqlx::query("DELETE FROM social_links WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;
        Ok(())
    }
}

#[async_trait]
impl ContactStore for PgStore {
    async fn insert(&self, message: NewContactMessage) -> Result<ContactMessage> {
        let (voice_memo_data, voice_memo_content_type) = match message.voice_memo {
            Some(memo) => (Some(memo.bytes), Some(memo.content_type)),
            None => (None, None),
        };

        let mut tx = self.pool.begin().await?;
        let saved = sqlx::query_as::<_, ContactMessage>(&format!(
            "INSERT INTO contact_messages \
                 (sender_name, sender_email, phone, message, voice_memo_data, voice_memo_content_type) \
             VALUES ($1, $2, $3, $4, $5, $6) \
             RETURNING {CONTACT_COLUMNS}"
        ))
        .bind(&message.sender_name)
        .bind(&message.sender_email)
        .bind(&message.phone)
        .bind(&message.message)
        .bind(voice_memo_data)
        .bind(voice_memo_content_type)
        .fetch_one(&mut *tx)
        .await?;
        tx.commit().await?;

        Ok(saved)
    }

    async fn list_recent(&self) -> Result<Vec<ContactMessage>> {
        let messages = sqlx::query_as::<_, ContactMessage>(&format!(
            "SELECT {CONTACT_COLUMNS} FROM contact_messages ORDER BY submitted_at DESC, id DESC"
        ))
        .fetch_all(&self.pool)
        .await?;
        Ok(messages)
    }

    async fn find_by_id(&self, id: i64) -> Result<Option<ContactMessage>> {
        let message = sqlx::query_as::<_, ContactMessage>(&format!(
            "SELECT {CONTACT_COLUMNS} FROM contact_messages WHERE id = $1"
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;
        Ok(message)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_escape_like_escapes_wildcards() {
        assert_eq!(escape_like("50%_off\\"), "50\\%\\_off\\\\");
        assert_eq!(escape_like("rust"), "rust");
    }
}
