use std::sync::Arc;

use sqlx::PgPool;

use crate::config::AppConfig;
use crate::db::Stores;
use crate::mail::Notifier;
use crate::rate_limit::ContactRateLimiter;
use crate::services::{BlogService, ContactService, ProjectService, SocialLinkService};

/// Shared handles passed to every handler
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<AppConfig>,
    /// `None` when running on the in-memory store
    pub pool: Option<PgPool>,
    pub blogs: BlogService,
    pub projects: ProjectService,
    pub social_links: SocialLinkService,
    pub contact: ContactService,
    pub rate_limiter: Arc<ContactRateLimiter>,
}

impl AppState {
    pub fn new(config: AppConfig, pool: Option<PgPool>, stores: Stores, notifier: Notifier) -> Self {
        let rate_limiter = Arc::new(ContactRateLimiter::new(config.rate_limit));

        Self {
            config: Arc::new(config),
            pool,
            blogs: BlogService::new(stores.blogs),
            projects: ProjectService::new(stores.projects),
            social_links: SocialLinkService::new(stores.social_links),
            contact: ContactService::new(stores.contacts, notifier),
            rate_limiter,
        }
    }
}
