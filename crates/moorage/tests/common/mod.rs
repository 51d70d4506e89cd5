//! CLI テスト用ヘルパー

use assert_cmd::Command;
use std::path::Path;

/// 一時データディレクトリを使う `moorage` コマンド
pub fn moorage(data_dir: &Path) -> Command {
    #[allow(deprecated)]
    let mut cmd = Command::cargo_bin("moorage").unwrap();
    cmd.env_remove("MOORAGE_DATA_DIR")
        .env_remove("MOORAGE_NETWORK_PREFIX")
        .env_remove("MOORAGE_STOP_TIMEOUT")
        .arg("--data-dir")
        .arg(data_dir);
    cmd
}
