use std::path::PathBuf;
use thiserror::Error;

/// マニフェストの構造エラー
///
/// いずれもエンジン呼び出し前に検出されるため、副作用はありません。
#[derive(Error, Debug)]
pub enum ManifestError {
    #[error("マニフェストのパースに失敗しました: {0}")]
    Parse(#[from] serde_yaml::Error),

    #[error("マニフェストにサービスが定義されていません")]
    NoServices,

    #[error("サービス '{service}' が未定義のサービス '{dependency}' に依存しています")]
    UnknownDependency { service: String, dependency: String },

    #[error("循環依存が検出されました: {}", services.join(", "))]
    CircularDependency { services: Vec<String> },
}

/// Composeテンプレートのエラー
#[derive(Error, Debug)]
pub enum TemplateError {
    #[error("無効なテンプレート名です: '{0}'")]
    InvalidName(String),

    #[error("テンプレートが見つかりません: {0}")]
    NotFound(String),

    #[error("テンプレートの読み書きに失敗しました: {path}\n理由: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

/// アプリカタログのエラー
#[derive(Error, Debug)]
pub enum CatalogError {
    #[error("カタログファイルの読み書きに失敗しました: {path}\n理由: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("カタログの JSON が不正です: {0}")]
    Json(#[from] serde_json::Error),
}

pub type Result<T> = std::result::Result<T, ManifestError>;
