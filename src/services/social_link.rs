use std::sync::Arc;

use super::cache::QueryCache;
use crate::db::models::{NewSocialLink, SocialLink};
use crate::db::store::SocialLinkStore;
use crate::error::Result;

const ACTIVE_LINKS_KEY: &str = "socialLinks";

#[derive(Clone)]
pub struct SocialLinkService {
    store: Arc<dyn SocialLinkStore>,
    cache: Arc<QueryCache<Arc<Vec<SocialLink>>>>,
}

impl SocialLinkService {
    pub fn new(store: Arc<dyn SocialLinkStore>) -> Self {
        Self {
            store,
            cache: Arc::new(QueryCache::default()),
        }
    }

    /// Active links by display order, served from cache after the first read
    pub async fn active_links(&self) -> Result<Arc<Vec<SocialLink>>> {
        self.cache
            .get_or_try_load(ACTIVE_LINKS_KEY, || async {
                tracing::debug!("social link cache miss");
                self.store.list_active().await.map(Arc::new)
            })
            .await
    }

    pub async fn create(&self, link: NewSocialLink) -> Result<SocialLink> {
        let created = self.store.insert(link).await?;
        self.cache.invalidate_all().await;
        tracing::info!(link_id = created.id, platform = %created.platform_name, "social link created");
        Ok(created)
    }

    pub async fn delete(&self, id: i64) -> Result<()> {
        self.store.delete(id).await?;
        self.cache.invalidate_all().await;
        tracing::info!(link_id = id, "social link deleted");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::memory::MemoryStore;

    fn link(name: &str, order: i32) -> NewSocialLink {
        NewSocialLink {
            platform_name: name.to_string(),
            url: format!("https://example.com/{name}"),
            icon_name: Some(name.to_lowercase()),
            is_active: true,
            display_order: order,
        }
    }

    fn names(links: &[SocialLink]) -> Vec<String> {
        links.iter().map(|l| l.platform_name.clone()).collect()
    }

    #[tokio::test]
    async fn test_create_is_visible_on_next_read() {
        let service = SocialLinkService::new(Arc::new(MemoryStore::default()));
        service.create(link("GitHub", 2)).await.unwrap();
        assert_eq!(names(&service.active_links().await.unwrap()), vec!["GitHub"]);

        service.create(link("LinkedIn", 1)).await.unwrap();
        assert_eq!(
            names(&service.active_links().await.unwrap()),
            vec!["LinkedIn", "GitHub"]
        );
    }

    #[tokio::test]
    async fn test_delete_is_visible_on_next_read() {
        let service = SocialLinkService::new(Arc::new(MemoryStore::default()));
        let github = service.create(link("GitHub", 0)).await.unwrap();
        assert_eq!(service.active_links().await.unwrap().len(), 1);

        service.delete(github.id).await.unwrap();
        assert!(service.active_links().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_reads_are_served_from_cache() {
        let store = Arc::new(MemoryStore::default());
        let service = SocialLinkService::new(store.clone());
        service.create(link("GitHub", 0)).await.unwrap();
        assert_eq!(service.active_links().await.unwrap().len(), 1);

        // Written behind the service's back, so the cached list stays as it was.
        SocialLinkStore::insert(store.as_ref(), link("Hidden", 1))
            .await
            .unwrap();
        assert_eq!(service.active_links().await.unwrap().len(), 1);
    }
}
