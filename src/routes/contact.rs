/**
 * Contact Routes
 * Rate-limited contact form with an optional voice memo, plus the admin inbox
 */
use std::net::SocketAddr;

use axum::{
    extract::{ConnectInfo, State},
    http::{header, HeaderMap, HeaderValue},
    response::{IntoResponse, Response},
    Json,
};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::db::models::{ContactMessage, NewContactMessage};
use crate::error::{AppError, Result};
use crate::rate_limit::client_ip;
use crate::routes::auth::AdminPrincipal;
use crate::routes::extract::{ValidMultipart, ValidPath};
use crate::routes::multipart::FormData;
use crate::state::AppState;

const VOICE_MEMO_FIELD: &str = "voiceMemo";

#[derive(Debug, Serialize, Deserialize)]
pub struct ContactResponse {
    pub success: bool,
    pub message: String,
}

/// Inbox entry; voice memo bytes are fetched separately
#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ContactSummary {
    pub id: i64,
    pub sender_name: String,
    pub sender_email: String,
    pub phone: Option<String>,
    pub message: String,
    pub submitted_at: DateTime<Utc>,
    pub is_read: bool,
    pub has_voice_memo: bool,
}

impl From<ContactMessage> for ContactSummary {
    fn from(m: ContactMessage) -> Self {
        Self {
            id: m.id,
            has_voice_memo: m.voice_memo_data.as_ref().is_some_and(|d| !d.is_empty()),
            sender_name: m.sender_name,
            sender_email: m.sender_email,
            phone: m.phone,
            message: m.message,
            submitted_at: m.submitted_at,
            is_read: m.is_read,
        }
    }
}

fn read_submission(mut form: FormData) -> Result<NewContactMessage> {
    let sender_name = form.required("name", "Name")?;
    let sender_email = form.required("email", "Email")?;
    if sender_email.parse::<lettre::Address>().is_err() {
        return Err(AppError::validation("Email address is invalid"));
    }
    let message = form.required("message", "Message")?;
    let phone = Some(form.optional("phone")).filter(|p| !p.is_empty());

    Ok(NewContactMessage {
        sender_name,
        sender_email,
        phone,
        message,
        voice_memo: form.take_file(VOICE_MEMO_FIELD),
    })
}

/// POST /api/contact (multipart)
pub async fn submit_contact(
    State(state): State<AppState>,
    ConnectInfo(peer): ConnectInfo<SocketAddr>,
    headers: HeaderMap,
    ValidMultipart(multipart): ValidMultipart,
) -> Result<Json<ContactResponse>> {
    let ip = client_ip(&headers, peer, state.config.trust_proxy);
    if !state.rate_limiter.try_acquire(ip) {
        return Err(AppError::RateLimited);
    }

    let form = FormData::read(multipart, &[VOICE_MEMO_FIELD]).await?;
    let submission = read_submission(form)?;
    state.contact.submit(submission).await?;

    Ok(Json(ContactResponse {
        success: true,
        message: "Message sent successfully".to_string(),
    }))
}

/// GET /api/contact
pub async fn list_messages(
    State(state): State<AppState>,
    AdminPrincipal(_admin): AdminPrincipal,
) -> Result<Json<Vec<ContactSummary>>> {
    let messages = state.contact.list_recent().await?;
    Ok(Json(messages.into_iter().map(ContactSummary::from).collect()))
}

/// GET /api/contact/{id}/voice-memo
pub async fn download_voice_memo(
    State(state): State<AppState>,
    AdminPrincipal(_admin): AdminPrincipal,
    ValidPath(id): ValidPath<i64>,
) -> Result<Response> {
    let memo = state.contact.voice_memo(id).await?;
    let content_type = HeaderValue::from_str(&memo.content_type)
        .unwrap_or_else(|_| HeaderValue::from_static("application/octet-stream"));

    Ok(([(header::CONTENT_TYPE, content_type)], memo.bytes).into_response())
}
