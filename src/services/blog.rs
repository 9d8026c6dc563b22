//! Blog business rules: slug and excerpt derivation, HTML sanitizing.

use std::sync::Arc;

use chrono::Utc;
use lazy_static::lazy_static;
use regex::Regex;
use serde::{Deserialize, Serialize};

use crate::db::models::{Blog, NewBlog};
use crate::db::store::BlogStore;
use crate::error::{AppError, Result};

/// Plain-text length of a derived summary
const EXCERPT_LENGTH: usize = 200;

lazy_static! {
    static ref NON_SLUG_CHARS: Regex = Regex::new(r"[^a-z0-9\s-]").unwrap();
    static ref WHITESPACE_RUNS: Regex = Regex::new(r"\s+").unwrap();
    static ref HYPHEN_RUNS: Regex = Regex::new(r"-+").unwrap();
    static ref HTML_TAG: Regex = Regex::new(r"<[^>]*>").unwrap();
}

/// Blog fields as submitted by the admin UI (create and full update)
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BlogDraft {
    pub title: String,
    #[serde(default)]
    pub slug: Option<String>,
    #[serde(default)]
    pub summary: Option<String>,
    #[serde(default)]
    pub content: Option<String>,
    #[serde(default)]
    pub cover_image_url: Option<String>,
    #[serde(default)]
    pub tags: Option<String>,
    #[serde(default)]
    pub published: bool,
    #[serde(default)]
    pub published_at: Option<chrono::DateTime<Utc>>,
}

/// URL-safe slug: lowercase ASCII letters, digits and single hyphens.
pub fn generate_slug(title: &str) -> String {
    let lower = title.to_lowercase();
    let stripped = NON_SLUG_CHARS.replace_all(&lower, "");
    let hyphenated = WHITESPACE_RUNS.replace_all(&stripped, "-");
    let collapsed = HYPHEN_RUNS.replace_all(&hyphenated, "-");
    collapsed.trim_matches('-').to_string()
}

/// Plain-text summary of HTML content, cut at [`EXCERPT_LENGTH`] characters.
pub fn generate_excerpt(content: Option<&str>) -> String {
    let Some(content) = content.filter(|c| !c.is_empty()) else {
        return String::new();
    };

    let plain = HTML_TAG.replace_all(content, "");
    if plain.chars().count() <= EXCERPT_LENGTH {
        return plain.into_owned();
    }

    let mut excerpt: String = plain.chars().take(EXCERPT_LENGTH).collect();
    excerpt.push_str("...");
    excerpt
}

fn is_blank(value: Option<&str>) -> bool {
    value.map_or(true, |v| v.trim().is_empty())
}

#[derive(Clone)]
pub struct BlogService {
    store: Arc<dyn BlogStore>,
}

impl BlogService {
    pub fn new(store: Arc<dyn BlogStore>) -> Self {
        Self { store }
    }

    pub async fn list_published(&self) -> Result<Vec<Blog>> {
        self.store.list_published().await
    }

    pub async fn find_by_slug(&self, slug: &str, published_only: bool) -> Result<Blog> {
        self.store
            .find_by_slug(slug, published_only)
            .await?
            .ok_or(AppError::Missing("Blog post"))
    }

    pub async fn list_by_tag(&self, tag: &str) -> Result<Vec<Blog>> {
        self.store.find_by_tag(tag.trim()).await
    }

    pub async fn create(&self, draft: BlogDraft) -> Result<Blog> {
        let blog = prepare(draft, true)?;

        let created = self.store.insert(blog).await?;
        tracing::info!(blog_id = created.id, slug = %created.slug, "blog post created");
        Ok(created)
    }

    /// Full replacement of every field; the summary is stored as given.
    pub async fn update(&self, id: i64, draft: BlogDraft) -> Result<Blog> {
        let blog = prepare(draft, false)?;

        let updated = self
            .store
            .update(id, blog)
            .await?
            .ok_or(AppError::NotFound { entity: "Blog", id })?;
        tracing::info!(blog_id = id, "blog post updated");
        Ok(updated)
    }

    pub async fn delete(&self, id: i64) -> Result<()> {
        self.store.delete(id).await?;
        tracing::info!(blog_id = id, "blog post deleted");
        Ok(())
    }

    /// Insert a welcome post when the blog is empty
    pub async fn seed_sample_post(&self) -> Result<()> {
        if self.store.count().await? > 0 {
            return Ok(());
        }

        self.create(BlogDraft {
            title: "Welcome to My Portfolio".to_string(),
            slug: Some("welcome-to-my-portfolio".to_string()),
            summary: Some(
                "This is a sample blog post to demonstrate the blog functionality.".to_string(),
            ),
            content: Some(
                "<h2>Welcome!</h2><p>This is the first blog post on my new portfolio website. \
                 It was automatically generated to show how the blog section looks.</p>\
                 <p>I will be sharing my thoughts, projects, and tutorials here. Stay tuned!</p>"
                    .to_string(),
            ),
            cover_image_url: Some(
                "https://images.unsplash.com/photo-1499750310159-5b5f8ca473aa?q=80&w=2070&auto=format&fit=crop"
                    .to_string(),
            ),
            tags: Some("Welcome, Update".to_string()),
            published: true,
            published_at: None,
        })
        .await?;

        tracing::info!("Sample blog post created");
        Ok(())
    }
}

/// Resolve the slug, sanitize content and stamp publication time.
fn prepare(draft: BlogDraft, derive_summary: bool) -> Result<NewBlog> {
    let slug = match draft.slug.as_deref().map(str::trim) {
        Some(slug) if !slug.is_empty() => slug.to_string(),
        _ => generate_slug(&draft.title),
    };
    if slug.is_empty() {
        return Err(AppError::validation(
            "Slug could not be derived from the title",
        ));
    }

    let published_at = match draft.published_at {
        None if draft.published => Some(Utc::now()),
        other => other,
    };

    // Excerpt is taken before sanitizing, which escapes `&` and `<` into entities
    let summary = if derive_summary && is_blank(draft.summary.as_deref()) {
        Some(generate_excerpt(draft.content.as_deref()))
    } else {
        draft.summary
    };
    let content = draft.content.map(|html| ammonia::clean(&html));

    Ok(NewBlog {
        title: draft.title.trim().to_string(),
        slug,
        summary,
        content,
        cover_image_url: draft.cover_image_url,
        tags: draft.tags,
        published: draft.published,
        published_at,
    })
}
