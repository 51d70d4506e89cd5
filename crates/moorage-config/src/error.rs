use std::path::PathBuf;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("設定ファイルの読み込みに失敗しました: {path}\n原因: {source}")]
    InvalidSettingsFile {
        path: PathBuf,
        #[source]
        source: serde_yaml::Error,
    },

    #[error("設定値が不正です: {key}={value}")]
    InvalidValue { key: String, value: String },

    #[error("IO エラー: {0}")]
    Io(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, ConfigError>;
