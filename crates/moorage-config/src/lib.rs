pub mod error;

pub use error::*;

use serde::Deserialize;
use std::path::{Path, PathBuf};
use std::time::Duration;

/// データディレクトリを指定する環境変数
pub const ENV_DATA_DIR: &str = "MOORAGE_DATA_DIR";
/// ネットワーク名のプレフィックスを指定する環境変数
pub const ENV_NETWORK_PREFIX: &str = "MOORAGE_NETWORK_PREFIX";
/// 停止タイムアウト（秒）を指定する環境変数
pub const ENV_STOP_TIMEOUT: &str = "MOORAGE_STOP_TIMEOUT";

/// データディレクトリ内の設定ファイル名
pub const SETTINGS_FILE: &str = "settings.yaml";

const DEFAULT_NETWORK_PREFIX: &str = "moorage";
const DEFAULT_STOP_TIMEOUT_SECS: i64 = 10;
const DEFAULT_RESTART_PAUSE_MS: u64 = 1000;

/// コマンドラインで明示された値（最優先）
#[derive(Debug, Clone, Default)]
pub struct Overrides {
    pub data_dir: Option<PathBuf>,
    pub network_prefix: Option<String>,
    pub stop_timeout_secs: Option<i64>,
}

/// settings.yaml の内容（すべて省略可能）
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "snake_case")]
struct SettingsFile {
    network_prefix: Option<String>,
    stop_timeout_secs: Option<i64>,
    restart_pause_ms: Option<u64>,
}

/// 実行時設定
#[derive(Debug, Clone, PartialEq)]
pub struct Settings {
    pub data_dir: PathBuf,
    pub network_prefix: String,
    pub stop_timeout_secs: i64,
    pub restart_pause: Duration,
}

impl Settings {
    /// 設定を解決する
    ///
    /// 以下の優先順位で値を決定:
    /// 1. コマンドライン引数
    /// 2. 環境変数 (MOORAGE_DATA_DIR, MOORAGE_NETWORK_PREFIX, MOORAGE_STOP_TIMEOUT)
    /// 3. データディレクトリ内の settings.yaml
    /// 4. デフォルト値
    pub fn load(overrides: &Overrides) -> Result<Self> {
        let data_dir = overrides
            .data_dir
            .clone()
            .or_else(|| std::env::var_os(ENV_DATA_DIR).map(PathBuf::from))
            .unwrap_or_else(default_data_dir);

        let file = read_settings_file(&data_dir.join(SETTINGS_FILE))?;

        let network_prefix = match &overrides.network_prefix {
            Some(prefix) => prefix.clone(),
            None => std::env::var(ENV_NETWORK_PREFIX)
                .ok()
                .or(file.network_prefix)
                .unwrap_or_else(|| DEFAULT_NETWORK_PREFIX.to_string()),
        };

        let stop_timeout_secs = match overrides.stop_timeout_secs {
            Some(secs) => secs,
            None => match std::env::var(ENV_STOP_TIMEOUT) {
                Ok(value) => value
                    .trim()
                    .parse::<i64>()
                    .map_err(|_| ConfigError::InvalidValue {
                        key: ENV_STOP_TIMEOUT.to_string(),
                        value,
                    })?,
                Err(_) => file.stop_timeout_secs.unwrap_or(DEFAULT_STOP_TIMEOUT_SECS),
            },
        };

        if stop_timeout_secs < 0 {
            return Err(ConfigError::InvalidValue {
                key: "stop_timeout_secs".to_string(),
                value: stop_timeout_secs.to_string(),
            });
        }

        Ok(Self {
            data_dir,
            network_prefix,
            stop_timeout_secs,
            restart_pause: Duration::from_millis(
                file.restart_pause_ms.unwrap_or(DEFAULT_RESTART_PAUSE_MS),
            ),
        })
    }

    /// 指定ディレクトリをデータディレクトリとするデフォルト設定
    pub fn with_data_dir(data_dir: impl Into<PathBuf>) -> Self {
        Self {
            data_dir: data_dir.into(),
            network_prefix: DEFAULT_NETWORK_PREFIX.to_string(),
            stop_timeout_secs: DEFAULT_STOP_TIMEOUT_SECS,
            restart_pause: Duration::from_millis(DEFAULT_RESTART_PAUSE_MS),
        }
    }

    /// SQLiteデータベースファイル
    pub fn database_path(&self) -> PathBuf {
        self.data_dir.join("database").join("moorage.db")
    }

    /// マーケットプレイスのカタログファイル
    pub fn catalog_path(&self) -> PathBuf {
        self.apps_dir().join("apps.json")
    }

    /// Composeテンプレートのディレクトリ
    pub fn templates_dir(&self) -> PathBuf {
        self.apps_dir().join("compose-templates")
    }

    fn apps_dir(&self) -> PathBuf {
        self.data_dir.join("apps")
    }

    /// データディレクトリ配下の必要なディレクトリを作成
    pub fn ensure_dirs(&self) -> Result<()> {
        for dir in [
            self.data_dir.join("database"),
            self.apps_dir(),
            self.templates_dir(),
        ] {
            if !dir.exists() {
                std::fs::create_dir_all(&dir)?;
                tracing::debug!("ディレクトリを作成: {}", dir.display());
            }
        }
        Ok(())
    }
}

/// デフォルトのデータディレクトリ（取得できなければ ./data）
pub fn default_data_dir() -> PathBuf {
    dirs::data_dir()
        .map(|dir| dir.join("moorage"))
        .unwrap_or_else(|| PathBuf::from("data"))
}

fn read_settings_file(path: &Path) -> Result<SettingsFile> {
    let content = match std::fs::read_to_string(path) {
        Ok(content) => content,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(SettingsFile::default()),
        Err(e) => return Err(e.into()),
    };

    if content.trim().is_empty() {
        return Ok(SettingsFile::default());
    }

    tracing::debug!("設定ファイルを読み込み: {}", path.display());
    serde_yaml::from_str(&content).map_err(|source| ConfigError::InvalidSettingsFile {
        path: path.to_path_buf(),
        source,
    })
}
