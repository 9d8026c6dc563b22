//! Database Models - structs representing database tables (used by sqlx/serde).

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

/// Blog post model
#[derive(Debug, Clone, FromRow, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Blog {
    pub id: i64,
    pub title: String,
    pub slug: String,
    pub summary: Option<String>,
    pub content: Option<String>,
    pub cover_image_url: Option<String>,
    /// Comma-separated
    pub tags: Option<String>,
    pub published: bool,
    pub published_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Blog post ready for insertion or full replacement (slug and summary already resolved)
#[derive(Debug, Clone)]
pub struct NewBlog {
    pub title: String,
    pub slug: String,
    pub summary: Option<String>,
    pub content: Option<String>,
    pub cover_image_url: Option<String>,
    pub tags: Option<String>,
    pub published: bool,
    pub published_at: Option<DateTime<Utc>>,
}

/// Uploaded file bytes together with their declared content type
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Upload {
    pub bytes: Vec<u8>,
    pub content_type: String,
}

/// Project model
#[derive(Debug, Clone, FromRow, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Project {
    pub id: i64,
    pub title: String,
    pub description: String,
    pub project_url: String,
    pub tags: String,
    #[serde(with = "base64_bytes", default)]
    pub image_data: Option<Vec<u8>>,
    pub image_content_type: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Project {
    /// Overwrite the text fields; the image only changes when a new one is supplied.
    pub fn merge(&mut self, input: ProjectInput) {
        self.title = input.title;
        self.description = input.description;
        self.project_url = input.project_url;
        self.tags = input.tags;
        if let Some(image) = input.image {
            self.image_data = Some(image.bytes);
            self.image_content_type = Some(image.content_type);
        }
        self.updated_at = Utc::now();
    }
}

/// Project fields accepted on create and update
#[derive(Debug, Clone)]
pub struct ProjectInput {
    pub title: String,
    pub description: String,
    pub project_url: String,
    pub tags: String,
    pub image: Option<Upload>,
}

/// Social link model
#[derive(Debug, Clone, FromRow, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct SocialLink {
    pub id: i64,
    pub platform_name: String,
    pub url: String,
    pub icon_name: Option<String>,
    pub is_active: bool,
    pub display_order: i32,
}

/// New social link for insertion
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewSocialLink {
    pub platform_name: String,
    pub url: String,
    pub icon_name: Option<String>,
    #[serde(default = "default_active")]
    pub is_active: bool,
    #[serde(default)]
    pub display_order: i32,
}

fn default_active() -> bool {
    true
}

/// Contact form submission
#[derive(Debug, Clone, FromRow)]
pub struct ContactMessage {
    pub id: i64,
    pub sender_name: String,
    pub sender_email: String,
    pub phone: Option<String>,
    pub message: String,
    pub voice_memo_data: Option<Vec<u8>>,
    pub voice_memo_content_type: Option<String>,
    pub submitted_at: DateTime<Utc>,
    pub is_read: bool,
}

/// New contact submission for insertion
#[derive(Debug, Clone)]
pub struct NewContactMessage {
    pub sender_name: String,
    pub sender_email: String,
    pub phone: Option<String>,
    pub message: String,
    pub voice_memo: Option<Upload>,
}

/// Binary columns travel through JSON as standard base64
mod base64_bytes {
    use base64::{engine::general_purpose::STANDARD, Engine as _};
    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(value: &Option<Vec<u8>>, serializer: S) -> Result<S::Ok, S::Error> {
        match value {
            Some(bytes) => serializer.serialize_some(&STANDARD.encode(bytes)),
            None => serializer.serialize_none(),
        }
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Option<Vec<u8>>, D::Error> {
        Option::<String>::deserialize(deserializer)?
            .map(|s| STANDARD.decode(s).map_err(serde::de::Error::custom))
            .transpose()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn project_with_image() -> Project {
        let now = Utc::now();
        Project {
            id: 1,
            title: "Old".to_string(),
            description: "Old description".to_string(),
            project_url: "https://old.dev".to_string(),
            tags: "rust".to_string(),
            image_data: Some(vec![1, 2, 3]),
            image_content_type: Some("image/png".to_string()),
            created_at: now,
            updated_at: now,
        }
    }

    fn input(image: Option<Upload>) -> ProjectInput {
        ProjectInput {
            title: "New".to_string(),
            description: "New description".to_string(),
            project_url: "https://new.dev".to_string(),
            tags: "rust, axum".to_string(),
            image,
        }
    }

    #[test]
    fn test_merge_without_image_keeps_old_image() {
        let mut project = project_with_image();
        project.merge(input(None));
        assert_eq!(project.title, "New");
        assert_eq!(project.image_data, Some(vec![1, 2, 3]));
        assert_eq!(project.image_content_type.as_deref(), Some("image/png"));
    }

    #[test]
    fn test_merge_with_image_replaces_both_fields() {
        let mut project = project_with_image();
        project.merge(input(Some(Upload {
            bytes: vec![9, 9],
            content_type: "image/webp".to_string(),
        })));
        assert_eq!(project.image_data, Some(vec![9, 9]));
        assert_eq!(project.image_content_type.as_deref(), Some("image/webp"));
    }

    #[test]
    fn test_project_image_serializes_as_base64() {
        let json = serde_json::to_value(project_with_image()).unwrap();
        assert_eq!(json["imageData"], "AQID");
        assert_eq!(json["imageContentType"], "image/png");
        assert_eq!(json["projectUrl"], "https://old.dev");
    }

    #[test]
    fn test_new_social_link_defaults() {
        let link: NewSocialLink =
            serde_json::from_str(r#"{"platformName":"GitHub","url":"https://github.com/me"}"#)
                .unwrap();
        assert!(link.is_active);
        assert_eq!(link.display_order, 0);
        assert!(link.icon_name.is_none());
    }
}
