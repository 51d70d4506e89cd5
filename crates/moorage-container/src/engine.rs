use crate::converter::ContainerBlueprint;
use crate::error::Result;
use async_trait::async_trait;

/// コンテナエンジンの抽象化
///
/// オーケストレーターとインストーラーはこのトレイト経由でのみエンジンを操作します。
/// 実装は [`crate::DockerEngine`]、テストではモックに差し替えます。
#[async_trait]
pub trait ContainerEngine: Send + Sync {
    /// イメージをpull（ダウンロード完了まで待機）
    async fn pull_image(&self, image: &str) -> Result<()>;

    /// コンテナを作成してIDを返す
    async fn create_container(&self, name: &str, blueprint: &ContainerBlueprint)
    -> Result<String>;

    async fn start_container(&self, id: &str) -> Result<()>;

    /// コンテナを停止（`timeout_secs` 経過後は強制終了）
    async fn stop_container(&self, id: &str, timeout_secs: i64) -> Result<()>;

    async fn remove_container(&self, id: &str, force: bool) -> Result<()>;

    /// ネットワークを作成してIDを返す
    async fn create_network(&self, name: &str, driver: &str, internal: bool) -> Result<String>;

    async fn remove_network(&self, id: &str) -> Result<()>;

    /// コンテナをネットワークに接続（エイリアスでサービス名解決）
    async fn connect_network(
        &self,
        network_id: &str,
        container_id: &str,
        aliases: &[String],
    ) -> Result<()>;
}
