//! Storage traits consumed by the orchestrator and the installer.

use crate::error::Result;
use async_trait::async_trait;
use moorage_core::{InstalledApp, NewInstalledApp, NewProject, Project, ProjectStatus};

/// Persistence for compose projects.
///
/// Every lifecycle operation re-reads the row it acts on, so implementations
/// must not cache projects.
#[async_trait]
pub trait ProjectStore: Send + Sync {
    /// Insert a project and return its store-assigned id.
    async fn insert_project(&self, project: &NewProject) -> Result<i64>;

    async fn get_project(&self, id: i64) -> Result<Project>;

    async fn find_project_by_name(&self, name: &str) -> Result<Option<Project>>;

    /// All projects, newest first.
    async fn list_projects(&self) -> Result<Vec<Project>>;

    /// Update the status and bump `updated_at`.
    async fn update_status(&self, id: i64, status: ProjectStatus) -> Result<()>;

    async fn delete_project(&self, id: i64) -> Result<()>;
}

/// Persistence for installed marketplace apps. Rows are immutable between
/// install and uninstall.
#[async_trait]
pub trait AppStore: Send + Sync {
    async fn insert_installed_app(&self, app: &NewInstalledApp) -> Result<i64>;

    async fn get_installed_app(&self, id: i64) -> Result<InstalledApp>;

    /// All installed apps, newest first.
    async fn list_installed_apps(&self) -> Result<Vec<InstalledApp>>;

    async fn delete_installed_app(&self, id: i64) -> Result<()>;
}
