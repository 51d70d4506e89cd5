//! マニフェストパーサー

use crate::error::{ManifestError, Result};
use crate::model::ManifestSpec;

/// マニフェスト文字列をパース
///
/// 構文エラーとサービス未定義のみを検出します。ポートや依存関係の妥当性は
/// 後段（変換・依存解決）で扱います。
pub fn parse_manifest(content: &str) -> Result<ManifestSpec> {
    let spec: ManifestSpec = serde_yaml::from_str(content)?;

    if spec.services.is_empty() {
        return Err(ManifestError::NoServices);
    }

    tracing::debug!(
        services = spec.services.len(),
        version = %spec.version,
        "マニフェストをパースしました"
    );
    Ok(spec)
}
