//! テスト用のコンテナエンジン（呼び出しを記録し、任意の呼び出しを失敗させる）

use std::collections::{BTreeMap, BTreeSet, HashMap};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use moorage_compose::{ComposeService, Marketplace, RuntimeOptions};
use moorage_container::{ContainerBlueprint, ContainerEngine, ContainerError};
use moorage_core::{Catalog, NewProject, Project, ProjectStatus, TemplateStore};
use moorage_store::{ProjectStore, SqliteStore, StoreError};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[allow(dead_code)]
pub enum Op {
    Pull,
    Create,
    Start,
    Stop,
    Remove,
    CreateNetwork,
    RemoveNetwork,
    Connect,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Call {
    Pull(String),
    Create { name: String, image: String },
    Start(String),
    Stop { id: String, timeout: i64 },
    Remove { id: String, force: bool },
    CreateNetwork { name: String, driver: String },
    RemoveNetwork(String),
    Connect {
        network: String,
        container: String,
        aliases: Vec<String>,
    },
}

#[derive(Default)]
struct EngineState {
    calls: Vec<Call>,
    counts: HashMap<Op, usize>,
    /// None は毎回失敗、Some(n) は n 回目（1始まり）だけ失敗
    failures: HashMap<Op, Option<usize>>,
    next_id: usize,
    containers: BTreeMap<String, ContainerBlueprint>,
    names: BTreeMap<String, String>,
    networks: BTreeSet<String>,
    pull_delay: Option<Duration>,
}

#[derive(Default)]
pub struct RecordingEngine {
    state: Mutex<EngineState>,
}

#[allow(dead_code)]
impl RecordingEngine {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    /// `op` の n 回目の呼び出しを失敗させる
    pub fn fail_nth(&self, op: Op, n: usize) {
        self.state.lock().unwrap().failures.insert(op, Some(n));
    }

    /// `op` の呼び出しをすべて失敗させる
    pub fn fail_always(&self, op: Op) {
        self.state.lock().unwrap().failures.insert(op, None);
    }

    pub fn clear_failures(&self) {
        self.state.lock().unwrap().failures.clear();
    }

    pub fn set_pull_delay(&self, delay: Duration) {
        self.state.lock().unwrap().pull_delay = Some(delay);
    }

    pub fn calls(&self) -> Vec<Call> {
        self.state.lock().unwrap().calls.clone()
    }

    pub fn clear_calls(&self) {
        self.state.lock().unwrap().calls.clear();
    }

    /// 現存するコンテナの名前（ID順）
    pub fn live_containers(&self) -> Vec<String> {
        let state = self.state.lock().unwrap();
        state
            .containers
            .keys()
            .map(|id| state.names[id].clone())
            .collect()
    }

    pub fn live_networks(&self) -> Vec<String> {
        self.state.lock().unwrap().networks.iter().cloned().collect()
    }

    pub fn blueprint(&self, container_name: &str) -> Option<ContainerBlueprint> {
        let state = self.state.lock().unwrap();
        state
            .names
            .iter()
            .find(|(_, name)| name.as_str() == container_name)
            .and_then(|(id, _)| state.containers.get(id).cloned())
    }

    fn record(&self, op: Op, call: Call) -> Result<(), ContainerError> {
        let mut state = self.state.lock().unwrap();
        state.calls.push(call);
        let count = state.counts.entry(op).or_insert(0);
        *count += 1;
        let count = *count;

        match state.failures.get(&op) {
            Some(None) => Err(ContainerError::DockerApiError(format!("{:?} failed", op))),
            Some(Some(n)) if *n == count => Err(ContainerError::DockerApiError(format!(
                "{:?} #{} failed",
                op, count
            ))),
            _ => Ok(()),
        }
    }
}

#[async_trait]
impl ContainerEngine for RecordingEngine {
    async fn pull_image(&self, image: &str) -> Result<(), ContainerError> {
        let delay = self.state.lock().unwrap().pull_delay;
        if let Some(delay) = delay {
            tokio::time::sleep(delay).await;
        }
        self.record(Op::Pull, Call::Pull(image.to_string()))
    }

    async fn create_container(
        &self,
        name: &str,
        blueprint: &ContainerBlueprint,
    ) -> Result<String, ContainerError> {
        self.record(
            Op::Create,
            Call::Create {
                name: name.to_string(),
                image: blueprint.image.clone(),
            },
        )?;
        let mut state = self.state.lock().unwrap();
        state.next_id += 1;
        let id = format!("c{:03}", state.next_id);
        state.containers.insert(id.clone(), blueprint.clone());
        state.names.insert(id.clone(), name.to_string());
        Ok(id)
    }

    async fn start_container(&self, id: &str) -> Result<(), ContainerError> {
        self.record(Op::Start, Call::Start(id.to_string()))
    }

    async fn stop_container(&self, id: &str, timeout_secs: i64) -> Result<(), ContainerError> {
        self.record(
            Op::Stop,
            Call::Stop {
                id: id.to_string(),
                timeout: timeout_secs,
            },
        )
    }

    async fn remove_container(&self, id: &str, force: bool) -> Result<(), ContainerError> {
        self.record(
            Op::Remove,
            Call::Remove {
                id: id.to_string(),
                force,
            },
        )?;
        let mut state = self.state.lock().unwrap();
        match state.containers.remove(id) {
            Some(_) => Ok(()),
            None => Err(ContainerError::NotFound(id.to_string())),
        }
    }

    async fn create_network(
        &self,
        name: &str,
        driver: &str,
        _internal: bool,
    ) -> Result<String, ContainerError> {
        self.record(
            Op::CreateNetwork,
            Call::CreateNetwork {
                name: name.to_string(),
                driver: driver.to_string(),
            },
        )?;
        let id = format!("net-{}", name);
        self.state.lock().unwrap().networks.insert(id.clone());
        Ok(id)
    }

    async fn remove_network(&self, id: &str) -> Result<(), ContainerError> {
        self.record(Op::RemoveNetwork, Call::RemoveNetwork(id.to_string()))?;
        let mut state = self.state.lock().unwrap();
        if state.networks.remove(id) {
            Ok(())
        } else {
            Err(ContainerError::NotFound(id.to_string()))
        }
    }

    async fn connect_network(
        &self,
        network_id: &str,
        container_id: &str,
        aliases: &[String],
    ) -> Result<(), ContainerError> {
        self.record(
            Op::Connect,
            Call::Connect {
                network: network_id.to_string(),
                container: container_id.to_string(),
                aliases: aliases.to_vec(),
            },
        )
    }
}

/// 書き込み（insert_project）だけが失敗するプロジェクトストア
#[allow(dead_code)]
pub struct FailingInsertStore {
    inner: SqliteStore,
}

#[allow(dead_code)]
impl FailingInsertStore {
    pub async fn new() -> Arc<Self> {
        Arc::new(Self {
            inner: SqliteStore::in_memory().await.unwrap(),
        })
    }
}

#[async_trait]
impl ProjectStore for FailingInsertStore {
    async fn insert_project(&self, _project: &NewProject) -> Result<i64, StoreError> {
        Err(StoreError::Io {
            path: "moorage.db".into(),
            source: std::io::Error::other("disk full"),
        })
    }

    async fn get_project(&self, id: i64) -> Result<Project, StoreError> {
        self.inner.get_project(id).await
    }

    async fn find_project_by_name(&self, name: &str) -> Result<Option<Project>, StoreError> {
        self.inner.find_project_by_name(name).await
    }

    async fn list_projects(&self) -> Result<Vec<Project>, StoreError> {
        self.inner.list_projects().await
    }

    async fn update_status(&self, id: i64, status: ProjectStatus) -> Result<(), StoreError> {
        self.inner.update_status(id, status).await
    }

    async fn delete_project(&self, id: i64) -> Result<(), StoreError> {
        self.inner.delete_project(id).await
    }
}

#[allow(dead_code)]
pub fn test_options() -> RuntimeOptions {
    RuntimeOptions {
        restart_pause: Duration::ZERO,
        ..RuntimeOptions::default()
    }
}

#[allow(dead_code)]
pub async fn compose_service(engine: Arc<RecordingEngine>) -> (ComposeService, Arc<SqliteStore>) {
    let store = Arc::new(SqliteStore::in_memory().await.unwrap());
    let templates = TemplateStore::new(std::env::temp_dir().join("moorage-test-no-templates"));
    let service = ComposeService::new(engine, store.clone(), templates, test_options());
    (service, store)
}

#[allow(dead_code)]
pub async fn marketplace(engine: Arc<RecordingEngine>) -> (Marketplace, Arc<SqliteStore>) {
    let store = Arc::new(SqliteStore::in_memory().await.unwrap());
    let marketplace = Marketplace::new(engine, store.clone(), Catalog::builtin(), test_options());
    (marketplace, store)
}

#[allow(dead_code)]
pub const WEB_DB: &str = r#"
version: "3.8"
services:
  web:
    image: nginx:alpine
    ports: ["8080:80"]
    depends_on: [db]
  db:
    image: postgres:16
    environment:
      POSTGRES_PASSWORD: secret
    volumes:
      - pgdata:/var/lib/postgresql/data
"#;
