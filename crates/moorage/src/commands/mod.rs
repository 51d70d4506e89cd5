pub mod app;
pub mod project;
pub mod template;
pub mod validate;

use std::path::Path;

use moorage_compose::ServiceError;

/// `KEY=VALUE` を分割する（値は空でもよい）
pub fn parse_key_val(s: &str) -> Result<(String, String), String> {
    split_pair(s, "KEY=VALUE")
}

/// `LABEL=HOSTPORT` を分割する
pub fn parse_port_mapping(s: &str) -> Result<(String, String), String> {
    let (label, port) = split_pair(s, "LABEL=HOSTPORT")?;
    if port.parse::<u16>().is_err() {
        return Err(format!("ホストポートが数値ではありません: '{}'", port));
    }
    Ok((label, port))
}

/// `CONTAINER=HOST` を分割する
pub fn parse_volume_mapping(s: &str) -> Result<(String, String), String> {
    split_pair(s, "CONTAINER=HOST")
}

fn split_pair(s: &str, form: &str) -> Result<(String, String), String> {
    match s.split_once('=') {
        Some((key, value)) if !key.is_empty() => Ok((key.to_string(), value.to_string())),
        _ => Err(format!("'{}' の形式で指定してください: '{}'", form, s)),
    }
}

/// マニフェストファイルを読み込む
pub fn read_manifest(path: &Path) -> Result<String, ServiceError> {
    std::fs::read_to_string(path).map_err(|e| {
        ServiceError::Validation(format!(
            "cannot read manifest {}: {}",
            path.display(),
            e
        ))
    })
}
