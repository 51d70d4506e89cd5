//! bollard による [`ContainerEngine`] 実装

use crate::converter::{ContainerBlueprint, to_container_config};
use crate::engine::ContainerEngine;
use crate::error::{ContainerError, Result};
use async_trait::async_trait;
use bollard::Docker;
use bollard::auth::DockerCredentials;
use bollard::models::{EndpointSettings, NetworkConnectRequest, NetworkCreateRequest};
use futures_util::stream::StreamExt;

/// Docker Engine API クライアント
#[derive(Debug, Clone)]
pub struct DockerEngine {
    docker: Docker,
}

impl DockerEngine {
    /// ローカルのDockerに接続して疎通を確認
    pub async fn connect() -> Result<Self> {
        let docker = Docker::connect_with_local_defaults()
            .map_err(|e| ContainerError::DockerConnectionFailed(e.to_string()))?;
        docker
            .ping()
            .await
            .map_err(|e| ContainerError::DockerConnectionFailed(e.to_string()))?;
        Ok(Self { docker })
    }

    pub fn from_client(docker: Docker) -> Self {
        Self { docker }
    }

    pub fn client(&self) -> &Docker {
        &self.docker
    }
}

#[async_trait]
impl ContainerEngine for DockerEngine {
    async fn pull_image(&self, image: &str) -> Result<()> {
        let (image_name, tag) = parse_image_tag(image);

        // レジストリから認証情報を取得（あれば）
        let credentials = extract_registry(image).and_then(get_docker_credentials);

        #[allow(deprecated)]
        let options = bollard::image::CreateImageOptions {
            from_image: image_name,
            tag,
            ..Default::default()
        };

        tracing::info!("イメージをダウンロード中: {}", image);

        #[allow(deprecated)]
        let mut stream = self.docker.create_image(Some(options), None, credentials);

        // ストリームを最後まで読み切るまでpullは完了しない
        while let Some(info) = stream.next().await {
            match info {
                Ok(bollard::models::CreateImageInfo {
                    status: Some(status),
                    progress: Some(progress),
                    ..
                }) => tracing::trace!("{}: {} {}", image, status, progress),
                Ok(bollard::models::CreateImageInfo {
                    error: Some(message),
                    ..
                }) => {
                    return Err(ContainerError::ImagePullFailed {
                        image: image.to_string(),
                        message,
                    });
                }
                Ok(_) => {}
                Err(e) => {
                    return Err(ContainerError::ImagePullFailed {
                        image: image.to_string(),
                        message: e.to_string(),
                    });
                }
            }
        }

        tracing::debug!("イメージのダウンロード完了: {}", image);
        Ok(())
    }

    async fn create_container(
        &self,
        name: &str,
        blueprint: &ContainerBlueprint,
    ) -> Result<String> {
        #[allow(deprecated)]
        let (config, options) = to_container_config(name, blueprint);
        #[allow(deprecated)]
        let response = self.docker.create_container(Some(options), config).await?;

        for warning in &response.warnings {
            tracing::warn!("コンテナ作成の警告 ({}): {}", name, warning);
        }
        Ok(response.id)
    }

    async fn start_container(&self, id: &str) -> Result<()> {
        match self
            .docker
            .start_container(id, None::<bollard::query_parameters::StartContainerOptions>)
            .await
        {
            Ok(_) => Ok(()),
            Err(bollard::errors::Error::DockerResponseServerError {
                status_code: 304, ..
            }) => {
                tracing::debug!("既に起動中: {}", id);
                Ok(())
            }
            Err(e) => Err(e.into()),
        }
    }

    async fn stop_container(&self, id: &str, timeout_secs: i64) -> Result<()> {
        let options = bollard::query_parameters::StopContainerOptions {
            t: Some(stop_timeout(timeout_secs)),
            ..Default::default()
        };

        match self.docker.stop_container(id, Some(options)).await {
            Ok(_) => Ok(()),
            Err(bollard::errors::Error::DockerResponseServerError {
                status_code: 304, ..
            }) => {
                tracing::debug!("既に停止中: {}", id);
                Ok(())
            }
            Err(e) => Err(e.into()),
        }
    }

    async fn remove_container(&self, id: &str, force: bool) -> Result<()> {
        self.docker
            .remove_container(
                id,
                Some(bollard::query_parameters::RemoveContainerOptions {
                    force,
                    ..Default::default()
                }),
            )
            .await?;
        Ok(())
    }

    async fn create_network(&self, name: &str, driver: &str, internal: bool) -> Result<String> {
        let network_config = NetworkCreateRequest {
            name: name.to_string(),
            driver: Some(driver.to_string()),
            internal: Some(internal),
            ..Default::default()
        };

        let response = self.docker.create_network(network_config).await?;
        Ok(response.id)
    }

    async fn remove_network(&self, id: &str) -> Result<()> {
        self.docker.remove_network(id).await?;
        Ok(())
    }

    async fn connect_network(
        &self,
        network_id: &str,
        container_id: &str,
        aliases: &[String],
    ) -> Result<()> {
        let request = NetworkConnectRequest {
            container: Some(container_id.to_string()),
            endpoint_config: Some(EndpointSettings {
                aliases: (!aliases.is_empty()).then(|| aliases.to_vec()),
                ..Default::default()
            }),
        };

        self.docker.connect_network(network_id, request).await?;
        Ok(())
    }
}

/// 停止猶予秒数を Docker API の範囲（0..=i32::MAX）に収める
fn stop_timeout(secs: i64) -> i32 {
    i32::try_from(secs.max(0)).unwrap_or(i32::MAX)
}

/// Docker config.json からレジストリの認証情報を取得
pub fn get_docker_credentials(registry: &str) -> Option<DockerCredentials> {
    // ~/.docker/config.json を読み込み
    let home = std::env::var("HOME").ok()?;
    let config_path = format!("{}/.docker/config.json", home);
    let config_content = std::fs::read_to_string(&config_path).ok()?;
    let config: serde_json::Value = serde_json::from_str(&config_content).ok()?;

    credentials_from_config(&config, registry)
}

/// config.json の `auths` セクションから認証情報を取り出す
pub fn credentials_from_config(
    config: &serde_json::Value,
    registry: &str,
) -> Option<DockerCredentials> {
    let auths = config.get("auths")?.as_object()?;
    let auth_entry = auths.get(registry)?;
    let auth_b64 = auth_entry.get("auth")?.as_str()?;

    // Base64 デコード (username:password 形式)
    use base64::Engine;
    let decoded = base64::engine::general_purpose::STANDARD
        .decode(auth_b64)
        .ok()?;
    let auth_str = String::from_utf8(decoded).ok()?;
    let (username, password) = auth_str.split_once(':')?;

    Some(DockerCredentials {
        username: Some(username.to_string()),
        password: Some(password.to_string()),
        serveraddress: Some(registry.to_string()),
        ..Default::default()
    })
}

/// イメージ名からレジストリを抽出
///
/// 最初の `/` より前が `.` か `:` を含む場合のみレジストリとみなします
/// （例: `ghcr.io`, `localhost:5000`）。
pub fn extract_registry(image: &str) -> Option<&str> {
    let (first, _) = image.split_once('/')?;
    if first.contains('.') || first.contains(':') {
        Some(first)
    } else {
        None
    }
}

/// イメージ名とタグを分離
/// 例: "redis:7-alpine" -> ("redis", "7-alpine")
///     "postgres" -> ("postgres", "latest")
///     "localhost:5000/app" -> ("localhost:5000/app", "latest")
pub fn parse_image_tag(image: &str) -> (&str, &str) {
    // ダイジェスト指定はそのまま渡す
    if image.contains('@') {
        return (image, "");
    }
    match image.rsplit_once(':') {
        Some((name, tag)) if !tag.contains('/') => (name, tag),
        _ => (image, "latest"),
    }
}
