//! コマンド実行時の共通コンテキスト
//!
//! Docker への接続はエンジンを使うコマンドでのみ行います。

use std::sync::Arc;

use moorage_compose::{ComposeService, Marketplace, RuntimeOptions, ServiceError};
use moorage_config::{Overrides, Settings};
use moorage_container::DockerEngine;
use moorage_core::{Catalog, TemplateStore};
use moorage_store::SqliteStore;

pub struct Context {
    settings: Settings,
}

impl Context {
    pub fn load(overrides: &Overrides) -> anyhow::Result<Self> {
        let settings = Settings::load(overrides)?;
        settings.ensure_dirs()?;
        tracing::debug!(data_dir = %settings.data_dir.display(), "settings loaded");
        Ok(Self { settings })
    }

    /// 組み込みテンプレートを書き出したうえでテンプレートストアを返す
    pub fn templates(&self) -> Result<TemplateStore, ServiceError> {
        let templates = TemplateStore::new(self.settings.templates_dir());
        templates.ensure_defaults()?;
        Ok(templates)
    }

    pub fn catalog(&self) -> Result<Catalog, ServiceError> {
        Ok(Catalog::load_or_init(&self.settings.catalog_path())?)
    }

    pub async fn compose(&self) -> Result<ComposeService, ServiceError> {
        let store = self.store().await?;
        let engine = connect_engine().await?;
        Ok(ComposeService::new(
            engine,
            store,
            self.templates()?,
            RuntimeOptions::from(&self.settings),
        ))
    }

    pub async fn marketplace(&self) -> Result<Marketplace, ServiceError> {
        let store = self.store().await?;
        let engine = connect_engine().await?;
        Ok(Marketplace::new(
            engine,
            store,
            self.catalog()?,
            RuntimeOptions::from(&self.settings),
        ))
    }

    async fn store(&self) -> Result<Arc<SqliteStore>, ServiceError> {
        let store = SqliteStore::from_path(self.settings.database_path()).await?;
        Ok(Arc::new(store))
    }
}

async fn connect_engine() -> Result<Arc<DockerEngine>, ServiceError> {
    let engine = DockerEngine::connect()
        .await
        .map_err(|e| ServiceError::engine("connect to Docker", e))?;
    Ok(Arc::new(engine))
}
