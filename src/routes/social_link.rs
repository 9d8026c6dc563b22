/**
 * Social Link Routes
 */
use std::sync::Arc;

use axum::{extract::State, http::StatusCode, Json};

use crate::db::models::{NewSocialLink, SocialLink};
use crate::error::{AppError, Result};
use crate::routes::auth::AdminPrincipal;
use crate::routes::extract::{ValidJson, ValidPath};
use crate::state::AppState;

fn validate_link(link: &NewSocialLink) -> Result<()> {
    if link.platform_name.trim().is_empty() {
        return Err(AppError::validation("Platform name is required"));
    }
    if link.url.trim().is_empty() {
        return Err(AppError::validation("URL is required"));
    }
    Ok(())
}

/// GET /api/social-links
pub async fn list_links(State(state): State<AppState>) -> Result<Json<Arc<Vec<SocialLink>>>> {
    Ok(Json(state.social_links.active_links().await?))
}

/// POST /api/social-links
pub async fn create_link(
    State(state): State<AppState>,
    AdminPrincipal(_admin): AdminPrincipal,
    ValidJson(link): ValidJson<NewSocialLink>,
) -> Result<Json<SocialLink>> {
    validate_link(&link)?;
    Ok(Json(state.social_links.create(link).await?))
}

/// DELETE /api/social-links/{id}
pub async fn delete_link(
    State(state): State<AppState>,
    AdminPrincipal(_admin): AdminPrincipal,
    ValidPath(id): ValidPath<i64>,
) -> Result<StatusCode> {
    state.social_links.delete(id).await?;
    Ok(StatusCode::NO_CONTENT)
}
