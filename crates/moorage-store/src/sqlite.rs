//! SQLite-backed store implementation.

use std::collections::BTreeMap;
use std::path::Path;

use async_trait::async_trait;
use chrono::NaiveDateTime;
use moorage_core::{InstalledApp, NewInstalledApp, NewProject, Project, ProjectStatus};
use sqlx::SqlitePool;
use sqlx::sqlite::SqlitePoolOptions;

use crate::error::{Result, StoreError};
use crate::store::{AppStore, ProjectStore};

/// Embedded schema migrations.
pub static MIGRATOR: sqlx::migrate::Migrator = sqlx::migrate!("./migrations");

const PROJECT: &str = "project";
const INSTALLED_APP: &str = "installed app";

#[derive(Debug, sqlx::FromRow)]
struct ProjectRecord {
    id: i64,
    name: String,
    description: String,
    yaml_content: String,
    status: String,
    container_ids: String,
    network_ids: String,
    volume_names: String,
    created_at: NaiveDateTime,
    updated_at: NaiveDateTime,
}

impl TryFrom<ProjectRecord> for Project {
    type Error = StoreError;

    fn try_from(record: ProjectRecord) -> Result<Self> {
        let id = record.id;
        let corrupt = |field: &'static str, message: String| StoreError::Corrupt {
            kind: PROJECT,
            id,
            field,
            message,
        };

        Ok(Project {
            id,
            status: record
                .status
                .parse::<ProjectStatus>()
                .map_err(|e| corrupt("status", e))?,
            container_ids: decode_list(&record.container_ids)
                .map_err(|e| corrupt("container_ids", e.to_string()))?,
            network_ids: decode_list(&record.network_ids)
                .map_err(|e| corrupt("network_ids", e.to_string()))?,
            volume_names: decode_list(&record.volume_names)
                .map_err(|e| corrupt("volume_names", e.to_string()))?,
            name: record.name,
            description: record.description,
            yaml_content: record.yaml_content,
            created_at: record.created_at,
            updated_at: record.updated_at,
        })
    }
}

#[derive(Debug, sqlx::FromRow)]
struct InstalledAppRecord {
    id: i64,
    app_id: String,
    app_name: String,
    container_ids: String,
    config: String,
    installed_at: NaiveDateTime,
    status: String,
}

impl TryFrom<InstalledAppRecord> for InstalledApp {
    type Error = StoreError;

    fn try_from(record: InstalledAppRecord) -> Result<Self> {
        let id = record.id;
        let corrupt = |field: &'static str, message: String| StoreError::Corrupt {
            kind: INSTALLED_APP,
            id,
            field,
            message,
        };

        Ok(InstalledApp {
            id,
            container_ids: decode_list(&record.container_ids)
                .map_err(|e| corrupt("container_ids", e.to_string()))?,
            config: serde_json::from_str::<BTreeMap<String, String>>(&record.config)
                .map_err(|e| corrupt("config", e.to_string()))?,
            app_id: record.app_id,
            app_name: record.app_name,
            installed_at: record.installed_at,
            status: record.status,
        })
    }
}

fn decode_list(json: &str) -> std::result::Result<Vec<String>, serde_json::Error> {
    serde_json::from_str(json)
}

fn encode_list(items: &[String]) -> Result<String> {
    Ok(serde_json::to_string(items)?)
}

/// Map a unique-constraint violation to [`StoreError::Duplicate`].
fn map_insert_error(err: sqlx::Error, kind: &'static str, name: &str) -> StoreError {
    match &err {
        sqlx::Error::Database(db) if db.is_unique_violation() => StoreError::Duplicate {
            kind,
            name: name.to_string(),
        },
        _ => StoreError::Database(err),
    }
}

/// SQLite store for projects and installed apps.
#[derive(Debug, Clone)]
pub struct SqliteStore {
    pool: SqlitePool,
}

impl SqliteStore {
    /// Wrap an existing pool. Migrations are not run.
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    /// Open (creating if needed) the database file and run migrations.
    pub async fn from_path(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();

        if let Some(parent) = path.parent()
            && !parent.as_os_str().is_empty()
        {
            std::fs::create_dir_all(parent).map_err(|source| StoreError::Io {
                path: parent.to_path_buf(),
                source,
            })?;
        }

        let url = format!("sqlite:{}?mode=rwc", path.to_string_lossy());

        // Writes are serialised by SQLite itself; a small pool covers concurrent reads.
        let pool = SqlitePoolOptions::new()
            .max_connections(5)
            .connect(&url)
            .await?;

        MIGRATOR.run(&pool).await?;
        tracing::debug!(path = %path.display(), "opened sqlite store");

        Ok(Self { pool })
    }

    /// A migrated in-memory database.
    ///
    /// Each in-memory connection is its own database, so the pool holds exactly one.
    pub async fn in_memory() -> Result<Self> {
        let pool = SqlitePoolOptions::new()
            .max_connections(1)
            .connect("sqlite::memory:")
            .await?;

        MIGRATOR.run(&pool).await?;
        Ok(Self { pool })
    }

    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }
}

#[async_trait]
impl ProjectStore for SqliteStore {
    async fn insert_project(&self, project: &NewProject) -> Result<i64> {
        let result = sqlx::query(
            r#"
            INSERT INTO compose_projects
                (name, description, yaml_content, status, container_ids, network_ids, volume_names,
                 created_at, updated_at)
            VALUES (?, ?, ?, ?, ?, ?, ?, CURRENT_TIMESTAMP, CURRENT_TIMESTAMP)
            "#,
        )
        .bind(&project.name)
        .bind(&project.description)
        .bind(&project.yaml_content)
        .bind(project.status.as_str())
        .bind(encode_list(&project.container_ids)?)
        .bind(encode_list(&project.network_ids)?)
        .bind(encode_list(&project.volume_names)?)
        .execute(&self.pool)
        .await
        .map_err(|e| map_insert_error(e, PROJECT, &project.name))?;

        Ok(result.last_insert_rowid())
    }

    async fn get_project(&self, id: i64) -> Result<Project> {
        let record = sqlx::query_as::<_, ProjectRecord>(
            r#"
            SELECT id, name, description, yaml_content, status,
                   container_ids, network_ids, volume_names, created_at, updated_at
            FROM compose_projects
            WHERE id = ?
            "#,
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?
        .ok_or(StoreError::NotFound { kind: PROJECT, id })?;

        record.try_into()
    }

    async fn find_project_by_name(&self, name: &str) -> Result<Option<Project>> {
        let record = sqlx::query_as::<_, ProjectRecord>(
            r#"
            SELECT id, name, description, yaml_content, status,
                   container_ids, network_ids, volume_names, created_at, updated_at
            FROM compose_projects
            WHERE name = ?
            "#,
        )
        .bind(name)
        .fetch_optional(&self.pool)
        .await?;

        record.map(Project::try_from).transpose()
    }

    async fn list_projects(&self) -> Result<Vec<Project>> {
        let records = sqlx::query_as::<_, ProjectRecord>(
            r#"
            SELECT id, name, description, yaml_content, status,
                   container_ids, network_ids, volume_names, created_at, updated_at
            FROM compose_projects
            ORDER BY created_at DESC, id DESC
            "#,
        )
        .fetch_all(&self.pool)
        .await?;

        records.into_iter().map(Project::try_from).collect()
    }

    async fn update_status(&self, id: i64, status: ProjectStatus) -> Result<()> {
        let result = sqlx::query(
            r#"
            UPDATE compose_projects
            SET status = ?, updated_at = CURRENT_TIMESTAMP
            WHERE id = ?
            "#,
        )
        .bind(status.as_str())
        .bind(id)
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Err(StoreError::NotFound { kind: PROJECT, id });
        }
        Ok(())
    }

    async fn delete_project(&self, id: i64) -> Result<()> {
        let result = sqlx::query("DELETE FROM compose_projects WHERE id = ?")
            .bind(id)
            .execute(&self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(StoreError::NotFound { kind: PROJECT, id });
        }
        Ok(())
    }
}

#[async_trait]
impl AppStore for SqliteStore {
    async fn insert_installed_app(&self, app: &NewInstalledApp) -> Result<i64> {
        let result = sqlx::query(
            r#"
            INSERT INTO installed_apps (app_id, app_name, container_ids, config, installed_at, status)
            VALUES (?, ?, ?, ?, CURRENT_TIMESTAMP, ?)
            "#,
        )
        .bind(&app.app_id)
        .bind(&app.app_name)
        .bind(encode_list(&app.container_ids)?)
        .bind(serde_json::to_string(&app.config)?)
        .bind(&app.status)
        .execute(&self.pool)
        .await?;

        Ok(result.last_insert_rowid())
    }

    async fn get_installed_app(&self, id: i64) -> Result<InstalledApp> {
        let record = sqlx::query_as::<_, InstalledAppRecord>(
            r#"
            SELECT id, app_id, app_name, container_ids, config, installed_at, status
            FROM installed_apps
            WHERE id = ?
            "#,
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?
        .ok_or(StoreError::NotFound {
            kind: INSTALLED_APP,
            id,
        })?;

        record.try_into()
    }

    async fn list_installed_apps(&self) -> Result<Vec<InstalledApp>> {
        let records = sqlx::query_as::<_, InstalledAppRecord>(
            r#"
            SELECT id, app_id, app_name, container_ids, config, installed_at, status
            FROM installed_apps
            ORDER BY installed_at DESC, id DESC
            "#,
        )
        .fetch_all(&self.pool)
        .await?;

        records.into_iter().map(InstalledApp::try_from).collect()
    }

    async fn delete_installed_app(&self, id: i64) -> Result<()> {
        let result = sqlx::query("DELETE FROM installed_apps WHERE id = ?")
            .bind(id)
            .execute(&self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(StoreError::NotFound {
                kind: INSTALLED_APP,
                id,
            });
        }
        Ok(())
    }
}
