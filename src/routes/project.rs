/**
 * Project Routes
 * Portfolio projects with an optional uploaded image
 */
use axum::{
    extract::{Multipart, State},
    http::StatusCode,
    Json,
};

use crate::db::models::{Project, ProjectInput};
use crate::error::Result;
use crate::routes::auth::AdminPrincipal;
use crate::routes::extract::{ValidMultipart, ValidPath};
use crate::routes::multipart::FormData;
use crate::state::AppState;

const IMAGE_FIELD: &str = "image";

async fn read_project_form(multipart: Multipart) -> Result<ProjectInput> {
    let mut form = FormData::read(multipart, &[IMAGE_FIELD]).await?;

    Ok(ProjectInput {
        title: form.required("title", "Title")?,
        description: form.optional("description"),
        project_url: form.optional("url"),
        tags: form.optional("tags"),
        image: form.take_file(IMAGE_FIELD),
    })
}

/// GET /api/projects
pub async fn list_projects(State(state): State<AppState>) -> Result<Json<Vec<Project>>> {
    Ok(Json(state.projects.list().await?))
}

/// GET /api/projects/{id}
pub async fn get_project(
    State(state): State<AppState>,
    ValidPath(id): ValidPath<i64>,
) -> Result<Json<Project>> {
    Ok(Json(state.projects.get(id).await?))
}

/// POST /api/projects (multipart)
pub async fn create_project(
    State(state): State<AppState>,
    AdminPrincipal(_admin): AdminPrincipal,
    ValidMultipart(multipart): ValidMultipart,
) -> Result<Json<Project>> {
    let input = read_project_form(multipart).await?;
    Ok(Json(state.projects.create(input).await?))
}

/// PUT /api/projects/{id} (multipart)
///
/// Without an image part the stored image is kept.
pub async fn update_project(
    State(state): State<AppState>,
    AdminPrincipal(_admin): AdminPrincipal,
    ValidPath(id): ValidPath<i64>,
    ValidMultipart(multipart): ValidMultipart,
) -> Result<Json<Project>> {
    let input = read_project_form(multipart).await?;
    Ok(Json(state.projects.update(id, input).await?))
}

/// DELETE /api/projects/{id}
pub async fn delete_project(
    State(state): State<AppState>,
    AdminPrincipal(_admin): AdminPrincipal,
    ValidPath(id): ValidPath<i64>,
) -> Result<StatusCode> {
    state.projects.delete(id).await?;
    Ok(StatusCode::NO_CONTENT)
}
