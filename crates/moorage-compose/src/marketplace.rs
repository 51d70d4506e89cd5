//! Single-container installs from the app catalog.

use std::collections::BTreeMap;
use std::sync::Arc;

use moorage_container::{APP_LABEL, ContainerBlueprint, ContainerEngine};
use moorage_core::translate::{DEFAULT_HOST_IP, PortBinding, PortSpec};
use moorage_core::{App, Catalog, InstalledApp, NewInstalledApp};
use moorage_store::AppStore;

use crate::error::{Result, ServiceError};
use crate::options::RuntimeOptions;

const INSTALLED_STATUS: &str = "running";
const INSTALL_RESTART_POLICY: &str = "unless-stopped";

/// Caller-supplied install parameters.
///
/// Only the ports and volumes listed here are mapped; catalog entries the
/// caller leaves out are not defaulted in.
#[derive(Debug, Clone, Default)]
pub struct InstallRequest {
    /// Container name; `{app_id}-app` when empty.
    pub name: Option<String>,
    /// Environment in caller order. Empty values are not passed on.
    pub env: Vec<(String, String)>,
    /// Catalog port label -> host port.
    pub ports: BTreeMap<String, String>,
    /// Container path -> host path.
    pub volumes: BTreeMap<String, String>,
}

/// Marketplace installer.
pub struct Marketplace {
    engine: Arc<dyn ContainerEngine>,
    store: Arc<dyn AppStore>,
    catalog: Catalog,
    options: RuntimeOptions,
}

impl Marketplace {
    pub fn new(
        engine: Arc<dyn ContainerEngine>,
        store: Arc<dyn AppStore>,
        catalog: Catalog,
        options: RuntimeOptions,
    ) -> Self {
        Self {
            engine,
            store,
            catalog,
            options,
        }
    }

    pub fn list_apps(&self) -> &[App] {
        self.catalog.apps()
    }

    pub fn get_app(&self, app_id: &str) -> Result<&App> {
        self.catalog
            .get(app_id)
            .ok_or_else(|| ServiceError::NotFound(format!("app '{}'", app_id)))
    }

    /// Install one catalog app as a single container.
    ///
    /// Required environment is checked before any engine call. If the
    /// container fails to start it is removed again; the row is written only
    /// after a successful start.
    pub async fn install(&self, app_id: &str, request: &InstallRequest) -> Result<InstalledApp> {
        let app = self.get_app(app_id)?;
        check_required_env(app, &request.env)?;

        self.engine
            .pull_image(&app.image)
            .await
            .map_err(|e| ServiceError::engine(format!("pull image {}", app.image), e))?;

        let container_name = match request.name.as_deref() {
            Some(name) if !name.is_empty() => name.to_string(),
            _ => format!("{}-app", app.id),
        };
        let blueprint = app_blueprint(app, request);

        let container_id = self
            .engine
            .create_container(&container_name, &blueprint)
            .await
            .map_err(|e| ServiceError::engine(format!("create container {}", container_name), e))?;

        if let Err(e) = self.engine.start_container(&container_id).await {
            self.discard(&container_id).await;
            return Err(ServiceError::engine(
                format!("start container {}", container_name),
                e,
            ));
        }

        let mut config = BTreeMap::new();
        config.insert("containerName".to_string(), container_name.clone());

        let new_app = NewInstalledApp {
            app_id: app.id.clone(),
            app_name: app.name.clone(),
            container_ids: vec![container_id.clone()],
            config,
            status: INSTALLED_STATUS.to_string(),
        };

        let id = match self.store.insert_installed_app(&new_app).await {
            Ok(id) => id,
            Err(e) => {
                tracing::error!(app = %app.id, error = %e, "container started but could not be recorded");
                self.discard(&container_id).await;
                return Err(e.into());
            }
        };

        tracing::info!(app = %app.id, container = %container_name, id, "app installed");
        Ok(self.store.get_installed_app(id).await?)
    }

    async fn discard(&self, container_id: &str) {
        if let Err(e) = self.engine.remove_container(container_id, true).await {
            tracing::warn!(container = %container_id, error = %e, "failed to remove container");
        }
    }

    pub async fn list_installed(&self) -> Result<Vec<InstalledApp>> {
        Ok(self.store.list_installed_apps().await?)
    }

    pub async fn get_installed(&self, id: i64) -> Result<InstalledApp> {
        Ok(self.store.get_installed_app(id).await?)
    }

    /// Stop and remove the app's containers (best effort), then delete the row.
    pub async fn uninstall(&self, id: i64) -> Result<()> {
        let installed = self.store.get_installed_app(id).await?;

        for container_id in &installed.container_ids {
            if let Err(e) = self
                .engine
                .stop_container(container_id, self.options.stop_timeout_secs)
                .await
            {
                tracing::warn!(app = %installed.app_id, container = %container_id, error = %e, "failed to stop container");
            }
            if let Err(e) = self.engine.remove_container(container_id, true).await {
                tracing::warn!(app = %installed.app_id, container = %container_id, error = %e, "failed to remove container");
            }
        }

        self.store.delete_installed_app(id).await?;
        tracing::info!(app = %installed.app_id, id, "app uninstalled");
        Ok(())
    }
}

/// Fail on the first declared-required variable that is missing or empty.
fn check_required_env(app: &App, env: &[(String, String)]) -> Result<()> {
    for required in &app.env.required {
        let present = env
            .iter()
            .any(|(key, value)| key == required && !value.is_empty());
        if !present {
            return Err(ServiceError::Validation(format!(
                "missing required environment variable: {}",
                required
            )));
        }
    }
    Ok(())
}

fn app_blueprint(app: &App, request: &InstallRequest) -> ContainerBlueprint {
    let env = request
        .env
        .iter()
        .filter(|(_, value)| !value.is_empty())
        .map(|(key, value)| format!("{}={}", key, value))
        .collect();

    let mut ports = PortSpec::default();
    for (label, host_port) in &request.ports {
        let Some(container_port) = app.ports.get(label) else {
            tracing::debug!(app = %app.id, label = %label, "ignoring unknown port label");
            continue;
        };
        let exposed = format!("{}/tcp", container_port);
        ports.exposed.insert(exposed.clone());
        ports.bindings.entry(exposed).or_default().push(PortBinding {
            host_ip: DEFAULT_HOST_IP.to_string(),
            host_port: host_port.clone(),
        });
    }

    let binds = request
        .volumes
        .iter()
        .filter(|(_, host)| !host.is_empty())
        .map(|(container, host)| format!("{}:{}", host, container))
        .collect();

    let mut labels = BTreeMap::new();
    labels.insert(APP_LABEL.to_string(), app.id.clone());

    ContainerBlueprint {
        image: app.image.clone(),
        env,
        ports,
        binds,
        labels,
        command: Vec::new(),
        restart: Some(INSTALL_RESTART_POLICY.to_string()),
    }
}
