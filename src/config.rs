//! Process configuration loaded from environment variables.

use std::{str::FromStr, time::Duration};

use crate::db::DbConfig;

const DEFAULT_ORIGINS: &[&str] = &["http://localhost:5173", "http://localhost:3000"];

#[derive(Debug, Clone)]
pub struct AppConfig {
    pub host: String,
    pub port: u16,
    pub environment: String,
    pub database: Option<DbConfig>,
    pub allowed_origins: Vec<String>,
    pub admin_email: String,
    pub identity_secret: String,
    pub mail: MailConfig,
    pub rate_limit: RateLimitConfig,
    pub max_upload_bytes: usize,
    /// Take the client address from X-Forwarded-For when behind a reverse proxy
    pub trust_proxy: bool,
}

/// SMTP settings. An empty host puts the mailer in no-op mode.
#[derive(Debug, Clone)]
pub struct MailConfig {
    pub smtp_host: String,
    pub smtp_port: u16,
    pub smtp_username: Option<String>,
    pub smtp_password: Option<String>,
    pub use_starttls: bool,
    pub from: String,
    pub contact_email: String,
}

/// Token bucket parameters for contact submissions
#[derive(Debug, Clone, Copy)]
pub struct RateLimitConfig {
    /// Bucket size per client address
    pub capacity: u32,
    /// One token is restored per interval
    pub refill_interval: Duration,
    /// How often idle buckets are evicted
    pub sweep_interval: Duration,
}

impl Default for RateLimitConfig {
    fn default() -> Self {
        Self {
            capacity: 5,
            refill_interval: Duration::from_secs(60),
            sweep_interval: Duration::from_secs(300),
        }
    }
}

impl AppConfig {
    pub fn from_env() -> Self {
        let admin_email = env_string("ADMIN_EMAIL", "admin@example.com");

        let database = std::env::var("DATABASE_URL").ok().map(|_| DbConfig::default());

        let allowed_origins = std::env::var("ALLOWED_ORIGINS")
            .ok()
            .map(|s| parse_origins(&s))
            .filter(|origins| !origins.is_empty())
            .unwrap_or_else(|| DEFAULT_ORIGINS.iter().map(|s| s.to_string()).collect());

        let mail = MailConfig {
            smtp_host: env_string("SMTP_HOST", ""),
            smtp_port: env_or("SMTP_PORT", 587),
            smtp_username: std::env::var("SMTP_USERNAME").ok(),
            smtp_password: std::env::var("SMTP_PASSWORD").ok(),
            use_starttls: env_or("SMTP_STARTTLS", true),
            from: env_string("MAIL_FROM", "Portfolio <noreply@localhost>"),
            contact_email: env_string("CONTACT_EMAIL", &admin_email),
        };

        let defaults = RateLimitConfig::default();
        let rate_limit = RateLimitConfig {
            capacity: env_or("RATE_LIMIT_CAPACITY", defaults.capacity).max(1),
            refill_interval: Duration::from_secs(
                env_or("RATE_LIMIT_REFILL_SECS", defaults.refill_interval.as_secs()).max(1),
            ),
            sweep_interval: Duration::from_secs(
                env_or("RATE_LIMIT_SWEEP_SECS", defaults.sweep_interval.as_secs()).max(1),
            ),
        };

        Self {
            host: env_string("HOST", "127.0.0.1"),
            port: env_or("PORT", 8081),
            environment: env_string("ENVIRONMENT", "development"),
            database,
            allowed_origins,
            admin_email,
            identity_secret: env_string("IDENTITY_JWT_SECRET", ""),
            mail,
            rate_limit,
            max_upload_bytes: env_or("MAX_UPLOAD_BYTES", 10 * 1024 * 1024),
            trust_proxy: env_or("TRUST_PROXY", false),
        }
    }

    pub fn is_production(&self) -> bool {
        self.environment == "production"
    }

    /// Configuration for tests and local runs without any environment.
    pub fn for_tests() -> Self {
        Self {
            host: "127.0.0.1".to_string(),
            port: 0,
            environment: "test".to_string(),
            database: None,
            allowed_origins: DEFAULT_ORIGINS.iter().map(|s| s.to_string()).collect(),
            admin_email: "admin@example.com".to_string(),
            identity_secret: "test-identity-secret".to_string(),
            mail: MailConfig {
                smtp_host: String::new(),
                smtp_port: 587,
                smtp_username: None,
                smtp_password: None,
                use_starttls: true,
                from: "Portfolio <noreply@localhost>".to_string(),
                contact_email: "admin@example.com".to_string(),
            },
            rate_limit: RateLimitConfig::default(),
            max_upload_bytes: 10 * 1024 * 1024,
            trust_proxy: false,
        }
    }
}

fn parse_origins(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(str::trim)
        .filter(|origin| !origin.is_empty())
        .map(str::to_string)
        .collect()
}

fn env_string(key: &str, default: &str) -> String {
    std::env::var(key).unwrap_or_else(|_| default.to_string())
}

pub(crate) fn env_or<T: FromStr>(key: &str, default: T) -> T {
    match std::env::var(key) {
        Ok(raw) => raw.trim().parse().unwrap_or_else(|_| {
            tracing::warn!("Invalid value for {}, using default", key);
            default
        }),
        Err(_) => default,
    }
}
