//! マーケットプレイスのアプリ定義とインストール済みアプリ

use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// カタログに載っている単一コンテナアプリ
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct App {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub category: String,
    /// 固定されたイメージ参照
    pub image: String,
    /// ポートラベル → コンテナポート
    #[serde(default)]
    pub ports: BTreeMap<String, u16>,
    /// マウント可能なコンテナ内パス
    #[serde(default)]
    pub volumes: Vec<String>,
    #[serde(default)]
    pub env: AppEnvVars,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AppEnvVars {
    #[serde(default)]
    pub required: Vec<String>,
    #[serde(default)]
    pub optional: Vec<String>,
}

/// インストール済みアプリ
///
/// インストールからアンインストールまで内容は変わりません。
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InstalledApp {
    pub id: i64,
    pub app_id: String,
    pub app_name: String,
    pub container_ids: Vec<String>,
    pub config: BTreeMap<String, String>,
    pub installed_at: NaiveDateTime,
    pub status: String,
}

/// インストール済みアプリの挿入内容
#[derive(Debug, Clone)]
pub struct NewInstalledApp {
    pub app_id: String,
    pub app_name: String,
    pub container_ids: Vec<String>,
    pub config: BTreeMap<String, String>,
    pub status: String,
}
