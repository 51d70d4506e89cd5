//! Compose project lifecycle: deploy, stop, start, restart, delete.
//!
//! Every operation re-reads the project row, acts on the engine, then writes
//! back. Operations on the same project are serialised by a per-project lock;
//! dropping an operation's future aborts it at the next engine or store call
//! without cleanup.

use std::sync::Arc;

use moorage_container::{ContainerEngine, container_name, network_name, service_blueprint};
use moorage_core::translate;
use moorage_core::{
    NewProject, Project, ProjectStatus, ServiceSpec, StackTemplate, TemplateStore, parse_manifest,
    resolve_order,
};
use moorage_store::ProjectStore;
use serde::Serialize;

use crate::error::{Result, ServiceError};
use crate::lock::KeyedLocks;
use crate::options::RuntimeOptions;

const NETWORK_DRIVER: &str = "bridge";

/// Result of a dry-run manifest check.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ValidationReport {
    pub valid: bool,
    pub service_names: Vec<String>,
    pub version: String,
}

/// Deploys manifests and drives project lifecycle.
pub struct ComposeService {
    engine: Arc<dyn ContainerEngine>,
    store: Arc<dyn ProjectStore>,
    templates: TemplateStore,
    options: RuntimeOptions,
    project_locks: KeyedLocks<i64>,
    name_locks: KeyedLocks<String>,
}

impl ComposeService {
    pub fn new(
        engine: Arc<dyn ContainerEngine>,
        store: Arc<dyn ProjectStore>,
        templates: TemplateStore,
        options: RuntimeOptions,
    ) -> Self {
        Self {
            engine,
            store,
            templates,
            options,
            project_locks: KeyedLocks::new(),
            name_locks: KeyedLocks::new(),
        }
    }

    /// Parse a manifest without touching the engine.
    pub fn validate(&self, manifest: &str) -> Result<ValidationReport> {
        validate_manifest(manifest)
    }

    /// Deploy a manifest as a new project.
    ///
    /// Structural errors (parse, unknown dependency, cycle) are reported before
    /// any engine call. Once the project network exists, any failure removes
    /// every container created so far (newest first) and the network, and no
    /// project row is written.
    pub async fn deploy(&self, name: &str, description: &str, manifest: &str) -> Result<Project> {
        validate_project_name(name)?;
        if manifest.trim().is_empty() {
            return Err(ServiceError::Validation("manifest is required".to_string()));
        }

        let _guard = self.name_locks.acquire_scoped(&name.to_string()).await;

        let spec = parse_manifest(manifest)?;
        let order = resolve_order(&spec.services)?;

        if self.store.find_project_by_name(name).await?.is_some() {
            return Err(ServiceError::Validation(format!(
                "project '{}' already exists",
                name
            )));
        }

        tracing::info!(project = name, services = ?order, "deploying project");

        let network = network_name(&self.options.network_prefix, name);
        let network_id = self
            .engine
            .create_network(&network, NETWORK_DRIVER, false)
            .await
            .map_err(|e| ServiceError::engine(format!("create network {}", network), e))?;

        let mut container_ids = Vec::with_capacity(order.len());
        let mut binds = Vec::new();

        for service_name in &order {
            let service = &spec.services[service_name];
            if let Err(e) = self
                .provision(
                    name,
                    service_name,
                    service,
                    &network_id,
                    &mut container_ids,
                    &mut binds,
                )
                .await
            {
                tracing::error!(project = name, service = %service_name, error = %e, "deploy failed, rolling back");
                self.rollback(&container_ids, &network_id).await;
                return Err(e);
            }
        }

        let new_project = NewProject {
            name: name.to_string(),
            description: description.to_string(),
            yaml_content: manifest.to_string(),
            status: ProjectStatus::Running,
            container_ids: container_ids.clone(),
            network_ids: vec![network_id.clone()],
            volume_names: translate::named_volumes(&binds),
        };

        let id = match self.store.insert_project(&new_project).await {
            Ok(id) => id,
            Err(e) => {
                tracing::error!(project = name, error = %e, "failed to persist project, rolling back");
                self.rollback(&container_ids, &network_id).await;
                return Err(e.into());
            }
        };

        let project = self.store.get_project(id).await?;
        tracing::info!(project = name, id, "project deployed");
        Ok(project)
    }

    /// Pull, create, attach and start one service container.
    ///
    /// The container id is recorded as soon as it exists so a later failure
    /// still rolls it back.
    async fn provision(
        &self,
        project: &str,
        service_name: &str,
        service: &ServiceSpec,
        network_id: &str,
        container_ids: &mut Vec<String>,
        binds: &mut Vec<String>,
    ) -> Result<()> {
        self.engine
            .pull_image(&service.image)
            .await
            .map_err(|e| ServiceError::engine(format!("pull image {}", service.image), e))?;

        let blueprint = service_blueprint(project, service_name, service);
        let name = container_name(project, service_name);

        let container_id = self
            .engine
            .create_container(&name, &blueprint)
            .await
            .map_err(|e| ServiceError::engine(format!("create container {}", name), e))?;
        container_ids.push(container_id.clone());
        binds.extend(blueprint.binds);

        self.engine
            .connect_network(network_id, &container_id, &[service_name.to_string()])
            .await
            .map_err(|e| ServiceError::engine(format!("attach {} to network", name), e))?;

        self.engine
            .start_container(&container_id)
            .await
            .map_err(|e| ServiceError::engine(format!("start container {}", name), e))?;

        tracing::debug!(container = %name, id = %container_id, "service started");
        Ok(())
    }

    /// Force-remove containers newest first, then the network. Failures are logged.
    async fn rollback(&self, container_ids: &[String], network_id: &str) {
        for id in container_ids.iter().rev() {
            if let Err(e) = self.engine.remove_container(id, true).await {
                tracing::warn!(container = %id, error = %e, "rollback: failed to remove container");
            }
        }
        if let Err(e) = self.engine.remove_network(network_id).await {
            tracing::warn!(network = %network_id, error = %e, "rollback: failed to remove network");
        }
    }

    pub async fn list_projects(&self) -> Result<Vec<Project>> {
        Ok(self.store.list_projects().await?)
    }

    pub async fn get_project(&self, id: i64) -> Result<Project> {
        Ok(self.store.get_project(id).await?)
    }

    /// Stop every container (failures ignored) and mark the project stopped.
    pub async fn stop(&self, id: i64) -> Result<Project> {
        let _guard = self.project_locks.acquire(&id).await;
        self.stop_locked(id).await?;
        Ok(self.store.get_project(id).await?)
    }

    /// Start every container in stored order. The first failure aborts and the
    /// status is left unchanged.
    pub async fn start(&self, id: i64) -> Result<Project> {
        let _guard = self.project_locks.acquire(&id).await;
        self.start_locked(id).await?;
        Ok(self.store.get_project(id).await?)
    }

    pub async fn restart(&self, id: i64) -> Result<Project> {
        let _guard = self.project_locks.acquire(&id).await;
        self.stop_locked(id).await?;
        tokio::time::sleep(self.options.restart_pause).await;
        self.start_locked(id).await?;
        Ok(self.store.get_project(id).await?)
    }

    /// Tear down containers and the network (best effort), then delete the row.
    pub async fn delete(&self, id: i64) -> Result<()> {
        let guard = self.project_locks.acquire(&id).await;
        let project = self.store.get_project(id).await?;

        for container_id in &project.container_ids {
            if let Err(e) = self
                .engine
                .stop_container(container_id, self.options.stop_timeout_secs)
                .await
            {
                tracing::warn!(project = %project.name, container = %container_id, error = %e, "failed to stop container");
            }
            if let Err(e) = self.engine.remove_container(container_id, true).await {
                tracing::warn!(project = %project.name, container = %container_id, error = %e, "failed to remove container");
            }
        }

        for network_id in &project.network_ids {
            if let Err(e) = self.engine.remove_network(network_id).await {
                tracing::warn!(project = %project.name, network = %network_id, error = %e, "failed to remove network");
            }
        }

        self.store.delete_project(id).await?;
        tracing::info!(project = %project.name, id, "project deleted");

        drop(guard);
        self.project_locks.forget(&id);
        Ok(())
    }

    async fn stop_locked(&self, id: i64) -> Result<()> {
        let project = self.store.get_project(id).await?;

        for container_id in &project.container_ids {
            if let Err(e) = self
                .engine
                .stop_container(container_id, self.options.stop_timeout_secs)
                .await
            {
                tracing::warn!(project = %project.name, container = %container_id, error = %e, "failed to stop container");
            }
        }

        self.store.update_status(id, ProjectStatus::Stopped).await?;
        tracing::info!(project = %project.name, id, "project stopped");
        Ok(())
    }

    async fn start_locked(&self, id: i64) -> Result<()> {
        let project = self.store.get_project(id).await?;

        for container_id in &project.container_ids {
            self.engine
                .start_container(container_id)
                .await
                .map_err(|e| ServiceError::engine(format!("start container {}", container_id), e))?;
        }

        self.store.update_status(id, ProjectStatus::Running).await?;
        tracing::info!(project = %project.name, id, "project started");
        Ok(())
    }

    pub fn list_templates(&self) -> Result<Vec<StackTemplate>> {
        Ok(self.templates.list()?)
    }

    pub fn get_template(&self, name: &str) -> Result<StackTemplate> {
        Ok(self.templates.get(name)?)
    }
}

/// Parse a manifest and report its services. No engine is needed.
pub fn validate_manifest(manifest: &str) -> Result<ValidationReport> {
    if manifest.trim().is_empty() {
        return Err(ServiceError::Validation("manifest is required".to_string()));
    }

    let spec = parse_manifest(manifest)?;
    Ok(ValidationReport {
        valid: true,
        service_names: spec.service_names(),
        version: spec.version,
    })
}

/// Project names become container and network name prefixes.
fn validate_project_name(name: &str) -> Result<()> {
    let mut chars = name.chars();
    let valid = match chars.next() {
        Some(first) => {
            first.is_ascii_alphanumeric()
                && chars.all(|c| c.is_ascii_alphanumeric() || matches!(c, '_' | '.' | '-'))
        }
        None => false,
    };

    if valid {
        Ok(())
    } else if name.is_empty() {
        Err(ServiceError::Validation("project name is required".to_string()))
    } else {
        Err(ServiceError::Validation(format!(
            "invalid project name '{}': use letters, digits, '_', '.' or '-'",
            name
        )))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use moorage_container::{ContainerBlueprint, ContainerError};
    use moorage_store::SqliteStore;

    /// 呼ばれたら失敗するエンジン
    struct UnreachableEngine;

    fn unreachable_call() -> ContainerError {
        ContainerError::DockerApiError("unexpected engine call".to_string())
    }

    #[async_trait]
    impl ContainerEngine for UnreachableEngine {
        async fn pull_image(&self, _: &str) -> moorage_container::Result<()> {
            Err(unreachable_call())
        }
        async fn create_container(
            &self,
            _: &str,
            _: &ContainerBlueprint,
        ) -> moorage_container::Result<String> {
            Err(unreachable_call())
        }
        async fn start_container(&self, _: &str) -> moorage_container::Result<()> {
            Err(unreachable_call())
        }
        async fn stop_container(&self, _: &str, _: i64) -> moorage_container::Result<()> {
            Err(unreachable_call())
        }
        async fn remove_container(&self, _: &str, _: bool) -> moorage_container::Result<()> {
            Err(unreachable_call())
        }
        async fn create_network(&self, _: &str, _: &str, _: bool) -> moorage_container::Result<String> {
            Err(unreachable_call())
        }
        async fn remove_network(&self, _: &str) -> moorage_container::Result<()> {
            Err(unreachable_call())
        }
        async fn connect_network(&self, _: &str, _: &str, _: &[String]) -> moorage_container::Result<()> {
            Err(unreachable_call())
        }
    }

    #[tokio::test]
    async fn test_deploy_releases_name_lock_entry() {
        let store = Arc::new(SqliteStore::in_memory().await.unwrap());
        let service = ComposeService::new(
            Arc::new(UnreachableEngine),
            store,
            TemplateStore::new(std::env::temp_dir().join("moorage-test-no-templates")),
            RuntimeOptions::default(),
        );

        for name in ["alpha", "beta", "gamma"] {
            let result = service.deploy(name, "", "services: {}").await;
            assert!(matches!(result, Err(ServiceError::Manifest(_))));
        }
        let result = service.deploy("delta", "", SINGLE_SERVICE).await;
        assert!(matches!(result, Err(ServiceError::Engine { .. })));

        assert!(service.name_locks.is_empty());
    }

    const SINGLE_SERVICE: &str = "services:\n  web:\n    image: nginx\n";

    #[test]
    fn test_validate_project_name() {
        assert!(validate_project_name("blog").is_ok());
        assert!(validate_project_name("my-app_2.0").is_ok());

        assert!(validate_project_name("").is_err());
        assert!(validate_project_name("-leading").is_err());
        assert!(validate_project_name("has space").is_err());
        assert!(validate_project_name("a/b").is_err());
    }
}
