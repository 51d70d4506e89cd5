//! マニフェストのサービス定義から Docker API パラメータへの変換

use bollard::container::{Config, CreateContainerOptions};
use bollard::models::{HostConfig, PortBinding, RestartPolicy, RestartPolicyNameEnum};
use moorage_core::ServiceSpec;
use moorage_core::translate::{self, PortSpec};
use std::collections::{BTreeMap, HashMap};

/// プロジェクト名ラベル
pub const PROJECT_LABEL: &str = "moorage.project";
/// サービス名ラベル
pub const SERVICE_LABEL: &str = "moorage.service";
/// マーケットプレイスアプリのラベル
pub const APP_LABEL: &str = "moorage.app";

/// ネットワーク名を生成
pub fn network_name(prefix: &str, project_name: &str) -> String {
    format!("{}-{}", prefix, project_name)
}

/// コンテナ名を生成
pub fn container_name(project_name: &str, service_name: &str) -> String {
    format!("{}-{}", project_name, service_name)
}

/// エンジンに依存しないコンテナ作成パラメータ
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ContainerBlueprint {
    pub image: String,
    pub env: Vec<String>,
    pub ports: PortSpec,
    pub binds: Vec<String>,
    pub labels: BTreeMap<String, String>,
    pub command: Vec<String>,
    pub restart: Option<String>,
}

/// サービス定義をコンテナ作成パラメータに変換
pub fn service_blueprint(
    project_name: &str,
    service_name: &str,
    service: &ServiceSpec,
) -> ContainerBlueprint {
    let mut labels = translate::labels(service.labels.as_ref());
    labels.insert(PROJECT_LABEL.to_string(), project_name.to_string());
    labels.insert(SERVICE_LABEL.to_string(), service_name.to_string());

    ContainerBlueprint {
        image: service.image.clone(),
        env: translate::environment(service.environment.as_ref()),
        ports: translate::ports(&service.ports, None),
        binds: translate::volumes(&service.volumes, project_name),
        labels,
        command: translate::command(service.command.as_ref()),
        restart: service.restart.clone(),
    }
}

/// リスタートポリシー名を Docker の値に変換
///
/// `on-failure:3` の形式で最大リトライ回数を指定できます。
/// 未知のポリシー名は `None` を返します。
pub fn restart_policy(policy: &str) -> Option<RestartPolicy> {
    let (name, retries) = match policy.split_once(':') {
        Some((name, retries)) => (name, retries.trim().parse::<i64>().ok()),
        None => (policy, None),
    };

    let name = match name.trim() {
        "no" | "" => RestartPolicyNameEnum::NO,
        "always" => RestartPolicyNameEnum::ALWAYS,
        "unless-stopped" => RestartPolicyNameEnum::UNLESS_STOPPED,
        "on-failure" => RestartPolicyNameEnum::ON_FAILURE,
        _ => return None,
    };

    Some(RestartPolicy {
        name: Some(name),
        maximum_retry_count: retries,
    })
}

/// コンテナ作成パラメータを Docker の設定に変換
#[allow(deprecated)]
pub fn to_container_config(
    name: &str,
    blueprint: &ContainerBlueprint,
) -> (Config<String>, CreateContainerOptions<String>) {
    // ポート公開設定
    let exposed_ports: HashMap<String, HashMap<(), ()>> = blueprint
        .ports
        .exposed
        .iter()
        .map(|port| (port.clone(), HashMap::new()))
        .collect();

    // ホストポートバインディング
    let port_bindings: HashMap<String, Option<Vec<PortBinding>>> = blueprint
        .ports
        .bindings
        .iter()
        .map(|(port, bindings)| {
            let bindings = bindings
                .iter()
                .map(|binding| PortBinding {
                    host_ip: Some(binding.host_ip.clone()),
                    host_port: Some(binding.host_port.clone()),
                })
                .collect();
            (port.clone(), Some(bindings))
        })
        .collect();

    let restart_policy = blueprint.restart.as_deref().and_then(|policy| {
        let converted = restart_policy(policy);
        if converted.is_none() {
            tracing::warn!("不明なリスタートポリシーを無視します: {}", policy);
        }
        converted
    });

    let host_config = Some(HostConfig {
        port_bindings: (!port_bindings.is_empty()).then_some(port_bindings),
        binds: (!blueprint.binds.is_empty()).then(|| blueprint.binds.clone()),
        restart_policy,
        ..Default::default()
    });

    let config = Config {
        image: Some(blueprint.image.clone()),
        env: (!blueprint.env.is_empty()).then(|| blueprint.env.clone()),
        exposed_ports: (!exposed_ports.is_empty()).then_some(exposed_ports),
        host_config,
        labels: Some(
            blueprint
                .labels
                .iter()
                .map(|(k, v)| (k.clone(), v.clone()))
                .collect(),
        ),
        cmd: (!blueprint.command.is_empty()).then(|| blueprint.command.clone()),
        ..Default::default()
    };

    let options = CreateContainerOptions {
        name: name.to_string(),
        platform: None,
    };

    (config, options)
}
