use std::sync::Arc;

use crate::db::models::{ContactMessage, NewContactMessage, Upload};
use crate::db::store::ContactStore;
use crate::error::{AppError, Result};
use crate::mail::{ContactNotification, Notifier};

#[derive(Clone)]
pub struct ContactService {
    store: Arc<dyn ContactStore>,
    notifier: Notifier,
}

impl ContactService {
    pub fn new(store: Arc<dyn ContactStore>, notifier: Notifier) -> Self {
        Self { store, notifier }
    }

    /// Persist the submission, then queue the owner notification.
    /// Returns once the row is stored; delivery happens on the worker.
    pub async fn submit(&self, message: NewContactMessage) -> Result<ContactMessage> {
        let notification = ContactNotification {
            sender_name: message.sender_name.clone(),
            sender_email: message.sender_email.clone(),
            message: message.message.clone(),
            voice_memo: message.voice_memo.clone(),
        };

        let saved = self.store.insert(message).await?;
        tracing::info!(
            contact_id = saved.id,
            has_voice_memo = saved.voice_memo_data.is_some(),
            "contact message stored"
        );

        self.notifier.notify(notification);
        Ok(saved)
    }

    pub async fn list_recent(&self) -> Result<Vec<ContactMessage>> {
        self.store.list_recent().await
    }

    pub async fn voice_memo(&self, id: i64) -> Result<Upload> {
        let message = self.store.find_by_id(id).await?.ok_or(AppError::NotFound {
            entity: "Contact message",
            id,
        })?;

        match message.voice_memo_data {
            Some(bytes) if !bytes.is_empty() => Ok(Upload {
                bytes,
                content_type: message
                    .voice_memo_content_type
                    .unwrap_or_else(|| "application/octet-stream".to_string()),
            }),
            _ => Err(AppError::Missing("Voice memo")),
        }
    }
}
