//! デプロイ済みプロジェクト

use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// プロジェクトのライフサイクル状態
///
/// 失敗したデプロイは永続化されないため、`failed` / `pending` は存在しません。
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ProjectStatus {
    Running,
    Stopped,
}

impl ProjectStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Running => "running",
            Self::Stopped => "stopped",
        }
    }
}

impl fmt::Display for ProjectStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ProjectStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "running" => Ok(Self::Running),
            "stopped" => Ok(Self::Stopped),
            other => Err(format!("unknown project status: {}", other)),
        }
    }
}

/// 永続化されたプロジェクト
///
/// `container_ids` / `network_ids` / `volume_names` はデプロイ時に確定し、
/// 以降は削除まで変更されません。
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Project {
    pub id: i64,
    pub name: String,
    pub description: String,
    /// デプロイに使ったマニフェスト（原文のまま）
    pub yaml_content: String,
    pub status: ProjectStatus,
    /// 起動順に並んだコンテナID
    pub container_ids: Vec<String>,
    pub network_ids: Vec<String>,
    pub volume_names: Vec<String>,
    pub created_at: NaiveDateTime,
    pub updated_at: NaiveDateTime,
}

/// 新規プロジェクトの挿入内容
#[derive(Debug, Clone)]
pub struct NewProject {
    pub name: String,
    pub description: String,
    pub yaml_content: String,
    pub status: ProjectStatus,
    pub container_ids: Vec<String>,
    pub network_ids: Vec<String>,
    pub volume_names: Vec<String>,
}
