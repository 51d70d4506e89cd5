//! マニフェスト定義
//!
//! docker-compose 互換の YAML を表現します。複数の形を取りうるフィールド
//! （environment / labels / command / depends_on）は `serde_yaml::Value` のまま保持し、
//! 解釈は [`crate::translate`] に任せます。

use serde::{Deserialize, Deserializer, Serialize};
use serde_yaml::Value;
use std::collections::BTreeMap;

/// マニフェスト全体
///
/// ```yaml
/// version: "3.8"
/// services:
///   web:
///     image: nginx:alpine
///     ports: ["8080:80"]
///     depends_on: [db]
///   db:
///     image: postgres:16
/// ```
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ManifestSpec {
    /// フォーマットバージョン（参考情報のみ）
    #[serde(default)]
    pub version: String,
    /// サービス名 → サービス定義（名前順で保持）
    #[serde(default)]
    pub services: BTreeMap<String, ServiceSpec>,
    /// トップレベルのネットワーク宣言（存在のみ保持）
    #[serde(default)]
    pub networks: Option<Value>,
    /// トップレベルのボリューム宣言（存在のみ保持）
    #[serde(default)]
    pub volumes: Option<Value>,
}

impl ManifestSpec {
    /// サービス名の一覧（名前順）
    pub fn service_names(&self) -> Vec<String> {
        self.services.keys().cloned().collect()
    }
}

/// サービス定義
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ServiceSpec {
    pub image: String,
    /// "host:container" / "container" / "ip:host:container"
    #[serde(default, deserialize_with = "scalar_list")]
    pub ports: Vec<String>,
    /// `KEY=VALUE` のリスト、またはマップ
    #[serde(default)]
    pub environment: Option<Value>,
    /// "name" / "source:target[:mode]"
    #[serde(default)]
    pub volumes: Vec<String>,
    /// `KEY=VALUE` のリスト、またはマップ
    #[serde(default)]
    pub labels: Option<Value>,
    /// 文字列、またはトークンのリスト
    #[serde(default)]
    pub command: Option<Value>,
    /// 再起動ポリシー (no, always, on-failure, unless-stopped)
    #[serde(default)]
    pub restart: Option<String>,
    /// サービス名のリスト、またはサービス名をキーとするマップ
    #[serde(default)]
    pub depends_on: Option<Value>,
    #[serde(default)]
    pub networks: Option<Value>,
}

/// `ports: [8080, "9000:80"]` のように数値と文字列が混在するリストを文字列に揃える
fn scalar_list<'de, D>(deserializer: D) -> Result<Vec<String>, D::Error>
where
    D: Deserializer<'de>,
{
    let values: Option<Vec<Value>> = Option::deserialize(deserializer)?;
    Ok(values
        .unwrap_or_default()
        .iter()
        .filter_map(crate::translate::scalar_to_string)
        .collect())
}
