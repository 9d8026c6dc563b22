use std::sync::Arc;

use crate::db::models::{Project, ProjectInput};
use crate::db::store::ProjectStore;
use crate::error::{AppError, Result};

#[derive(Clone)]
pub struct ProjectService {
    store: Arc<dyn ProjectStore>,
}

impl ProjectService {
    pub fn new(store: Arc<dyn ProjectStore>) -> Self {
        Self { store }
    }

    pub async fn list(&self) -> Result<Vec<Project>> {
        self.store.list().await
    }

    pub async fn get(&self, id: i64) -> Result<Project> {
        self.store
            .find_by_id(id)
            .await?
            .ok_or(AppError::NotFound {
                entity: "Project",
                id,
            })
    }

    pub async fn create(&self, project: ProjectInput) -> Result<Project> {
        let created = self.store.insert(project).await?;
        tracing::info!(
            project_id = created.id,
            has_image = created.image_data.is_some(),
            "project created"
        );
        Ok(created)
    }

    /// Text fields are replaced; a missing image keeps the stored one.
    pub async fn update(&self, id: i64, project: ProjectInput) -> Result<Project> {
        let updated = self
            .store
            .update(id, project)
            .await?
            .ok_or(AppError::NotFound {
                entity: "Project",
                id,
            })?;
        tracing::info!(project_id = id, "project updated");
        Ok(updated)
    }

    pub async fn delete(&self, id: i64) -> Result<()> {
        self.store.delete(id).await?;
        tracing::info!(project_id = id, "project deleted");
        Ok(())
    }
}
