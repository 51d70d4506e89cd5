//! マニフェストのフィールドをエンジン向けの形に正規化する変換関数
//!
//! どの関数も失敗しません。想定外の形は空（または省略）として扱います。

use serde_yaml::Value;
use std::collections::{BTreeMap, BTreeSet};

/// ポートのバインド先（デフォルト）
pub const DEFAULT_HOST_IP: &str = "0.0.0.0";

/// ホスト側のポートバインディング
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PortBinding {
    pub host_ip: String,
    pub host_port: String,
}

/// ポート定義の変換結果
///
/// キーはすべて `"{port}/{protocol}"` 形式のコンテナポートです。
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PortSpec {
    pub exposed: BTreeSet<String>,
    pub bindings: BTreeMap<String, Vec<PortBinding>>,
}

impl PortSpec {
    pub fn is_empty(&self) -> bool {
        self.exposed.is_empty()
    }
}

/// スカラー値を文字列に変換（コレクションは None）
pub fn scalar_to_string(value: &Value) -> Option<String> {
    match value {
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        Value::Bool(b) => Some(b.to_string()),
        Value::Null => Some(String::new()),
        Value::Tagged(tagged) => scalar_to_string(&tagged.value),
        Value::Sequence(_) | Value::Mapping(_) => None,
    }
}

/// 文字列要素のみを取り出す
fn string_items(items: &[Value]) -> Vec<String> {
    items
        .iter()
        .filter_map(|item| item.as_str().map(String::from))
        .collect()
}

/// マップの値を文字列に変換（ネストした値はコンパクトな JSON）
fn mapping_value_to_string(value: &Value) -> String {
    if let Some(s) = scalar_to_string(value) {
        return s;
    }
    serde_json::to_string(value).unwrap_or_else(|e| {
        tracing::debug!("値を文字列に変換できません: {}", e);
        String::new()
    })
}

/// マップを (キー, 値) の組に展開（順序は記述順）
///
/// キーがスカラーでない組は無視します。
fn mapping_pairs(mapping: &serde_yaml::Mapping) -> Vec<(String, String)> {
    mapping
        .iter()
        .filter_map(|(k, v)| {
            let Some(key) = scalar_to_string(k) else {
                tracing::debug!("スカラーでないキーを無視します: {:?}", k);
                return None;
            };
            Some((key, mapping_value_to_string(v)))
        })
        .collect()
}

/// environment を `KEY=VALUE` のリストに変換
pub fn environment(value: Option<&Value>) -> Vec<String> {
    match value {
        Some(Value::Sequence(items)) => string_items(items),
        Some(Value::Mapping(mapping)) => mapping_pairs(mapping)
            .into_iter()
            .map(|(k, v)| format!("{}={}", k, v))
            .collect(),
        _ => Vec::new(),
    }
}

/// labels をマップに変換
///
/// リスト形式で `=` を含まない要素は無視します。
pub fn labels(value: Option<&Value>) -> BTreeMap<String, String> {
    match value {
        Some(Value::Sequence(items)) => string_items(items)
            .iter()
            .filter_map(|item| {
                item.split_once('=')
                    .map(|(k, v)| (k.to_string(), v.to_string()))
            })
            .collect(),
        Some(Value::Mapping(mapping)) => mapping_pairs(mapping).into_iter().collect(),
        _ => BTreeMap::new(),
    }
}

/// command をトークン列に変換
///
/// 文字列は空白で分割します。空の結果はイメージのデフォルトコマンドを意味します。
pub fn command(value: Option<&Value>) -> Vec<String> {
    match value {
        Some(Value::String(s)) => s.split_whitespace().map(String::from).collect(),
        Some(Value::Sequence(items)) => string_items(items),
        _ => Vec::new(),
    }
}

/// depends_on を依存サービス名のリストに変換
///
/// マップ形式の値（condition 等）は無視します。
pub fn depends_on(value: Option<&Value>) -> Vec<String> {
    match value {
        Some(Value::Sequence(items)) => string_items(items),
        Some(Value::Mapping(mapping)) => mapping
            .keys()
            .filter_map(|k| k.as_str().map(String::from))
            .collect(),
        _ => Vec::new(),
    }
}

/// プロトコル省略時は tcp を付与
fn with_protocol(port: &str) -> String {
    if port.contains('/') {
        port.to_string()
    } else {
        format!("{}/tcp", port)
    }
}

/// ホスト側ポートからプロトコル指定を取り除く
fn strip_protocol(port: &str) -> &str {
    port.split_once('/').map(|(p, _)| p).unwrap_or(port)
}

/// ports を公開ポートとバインディングに変換
///
/// - `"8080"` → 8080/tcp をホストの 8080 に
/// - `"9000:80"` → 80/tcp をホストの 9000 に
/// - `"127.0.0.1:9000:80"` → 80/tcp を 127.0.0.1:9000 に
///
/// バインド先の指定がない場合は `host_ip`（None なら 0.0.0.0）を使用します。
pub fn ports(entries: &[String], host_ip: Option<&str>) -> PortSpec {
    let default_ip = host_ip.unwrap_or(DEFAULT_HOST_IP);
    let mut spec = PortSpec::default();

    for entry in entries {
        let entry = entry.trim();
        if entry.is_empty() {
            continue;
        }

        let Some((ip, host, container)) = split_port_entry(entry, default_ip) else {
            tracing::debug!("解釈できないポート定義を無視します: {}", entry);
            continue;
        };

        let container_port = with_protocol(container);
        spec.exposed.insert(container_port.clone());
        spec.bindings
            .entry(container_port)
            .or_default()
            .push(PortBinding {
                host_ip: ip.to_string(),
                host_port: strip_protocol(host).to_string(),
            });
    }

    spec
}

/// ポート定義を (バインド先IP, ホストポート, コンテナポート) に分割
///
/// IPv6 のバインド先は `[::1]:8080:80` のように角括弧で囲みます。
fn split_port_entry<'a>(
    entry: &'a str,
    default_ip: &'a str,
) -> Option<(&'a str, &'a str, &'a str)> {
    if let Some(rest) = entry.strip_prefix('[') {
        let (ip, ports) = rest.split_once("]:")?;
        let (host, container) = ports.split_once(':')?;
        if ip.is_empty() || host.is_empty() || container.is_empty() || container.contains(':') {
            return None;
        }
        return Some((ip, host, container));
    }

    let parts: Vec<&str> = entry.split(':').collect();
    let split = match parts.as_slice() {
        [ip, host, container] => (*ip, *host, *container),
        [host, container] => (default_ip, *host, *container),
        [container] => (default_ip, strip_protocol(container), *container),
        _ => return None,
    };
    if split.1.is_empty() || split.2.is_empty() {
        return None;
    }
    Some(split)
}

/// ソースがファイルシステムパス（バインドマウント）かどうか
fn is_bind_source(source: &str) -> bool {
    source.starts_with('/') || source.starts_with('.')
}

/// 名前付きボリュームにプロジェクト名のプレフィックスを付与
///
/// 別プロジェクトの同名ボリューム（"data" など）との衝突を避けます。
/// バインドマウントはそのまま残します。
pub fn volumes(entries: &[String], project: &str) -> Vec<String> {
    entries
        .iter()
        .map(|entry| match entry.split_once(':') {
            None => format!("{}-{}", project, entry),
            Some((source, rest)) if !is_bind_source(source) => {
                format!("{}-{}:{}", project, source, rest)
            }
            Some(_) => entry.clone(),
        })
        .collect()
}

/// 変換済みボリューム定義から名前付きボリューム名を抽出（重複除去・出現順）
pub fn named_volumes(translated: &[String]) -> Vec<String> {
    let mut names: Vec<String> = Vec::new();
    for entry in translated {
        let source = entry.split(':').next().unwrap_or(entry);
        if !is_bind_source(source) && !names.iter().any(|n| n == source) {
            names.push(source.to_string());
        }
    }
    names
}

#[cfg(test)]
mod tests {
    use super::*;

    fn yaml(s: &str) -> Value {
        serde_yaml::from_str(s).unwrap()
    }

    #[test]
    fn test_environment_list_passthrough() {
        let value = yaml("[\"A=1\", \"B=two\", 3]");
        assert_eq!(environment(Some(&value)), vec!["A=1", "B=two"]);
    }

    #[test]
    fn test_environment_map_formats_values() {
        let value = yaml("DEBUG: true\nPORT: 8080\nNAME: app\nEMPTY:\n");
        assert_eq!(
            environment(Some(&value)),
            vec!["DEBUG=true", "PORT=8080", "NAME=app", "EMPTY="]
        );
    }

    #[test]
    fn test_environment_unrecognized_shape() {
        assert!(environment(None).is_empty());
        assert!(environment(Some(&yaml("just-a-string"))).is_empty());
    }

    #[test]
    fn test_labels_both_shapes() {
        let list = yaml("[\"traefik.enable=true\", \"no-equals\", \"a=b=c\"]");
        let labels_from_list = labels(Some(&list));
        assert_eq!(labels_from_list.len(), 2);
        assert_eq!(labels_from_list["traefik.enable"], "true");
        assert_eq!(labels_from_list["a"], "b=c");

        let map = yaml("tier: backend\nreplicas: 2\n");
        let labels_from_map = labels(Some(&map));
        assert_eq!(labels_from_map["tier"], "backend");
        assert_eq!(labels_from_map["replicas"], "2");
    }

    #[test]
    fn test_nested_mapping_values_are_kept() {
        let value = yaml("A: 1\nB:\n  x: 1\nC: [1, 2]\n");

        assert_eq!(
            environment(Some(&value)),
            vec!["A=1", "B={\"x\":1}", "C=[1,2]"]
        );

        let label_map = labels(Some(&value));
        assert_eq!(label_map.len(), 3);
        assert_eq!(label_map["A"], "1");
        assert_eq!(label_map["B"], "{\"x\":1}");
        assert_eq!(label_map["C"], "[1,2]");
    }

    #[test]
    fn test_command_string_is_tokenized() {
        let value = yaml("\"redis-server  --appendonly yes\"");
        assert_eq!(
            command(Some(&value)),
            vec!["redis-server", "--appendonly", "yes"]
        );
    }

    #[test]
    fn test_command_list_keeps_strings_only() {
        let value = yaml("[\"--config.file=/etc/prom.yml\", 42, \"--web.enable-lifecycle\"]");
        assert_eq!(
            command(Some(&value)),
            vec!["--config.file=/etc/prom.yml", "--web.enable-lifecycle"]
        );
        assert!(command(None).is_empty());
    }

    #[test]
    fn test_depends_on_shapes() {
        assert_eq!(depends_on(Some(&yaml("[db, cache]"))), vec!["db", "cache"]);

        let map = yaml("db:\n  condition: service_healthy\ncache:\n  condition: service_started\n");
        assert_eq!(depends_on(Some(&map)), vec!["db", "cache"]);
        assert!(depends_on(Some(&yaml("42"))).is_empty());
    }

    #[test]
    fn test_ports_single_value() {
        let spec = ports(&["8080".to_string()], None);

        assert!(spec.exposed.contains("8080/tcp"));
        assert_eq!(
            spec.bindings["8080/tcp"],
            vec![PortBinding {
                host_ip: "0.0.0.0".to_string(),
                host_port: "8080".to_string(),
            }]
        );
    }

    #[test]
    fn test_ports_host_mapping() {
        let spec = ports(&["9000:80".to_string()], None);

        assert_eq!(spec.exposed.len(), 1);
        assert!(spec.exposed.contains("80/tcp"));
        assert_eq!(spec.bindings["80/tcp"][0].host_port, "9000");
        assert_eq!(spec.bindings["80/tcp"][0].host_ip, "0.0.0.0");
    }

    #[test]
    fn test_ports_protocol_and_ip() {
        let spec = ports(
            &["53:53/udp".to_string(), "127.0.0.1:5433:5432".to_string(), "514/udp".to_string()],
            None,
        );

        assert!(spec.exposed.contains("53/udp"));
        assert_eq!(spec.bindings["53/udp"][0].host_port, "53");
        assert_eq!(spec.bindings["5432/tcp"][0].host_ip, "127.0.0.1");
        assert_eq!(spec.bindings["5432/tcp"][0].host_port, "5433");
        assert_eq!(spec.bindings["514/udp"][0].host_port, "514");
    }

    #[test]
    fn test_ports_ipv6_bind_address() {
        let spec = ports(&["[::1]:8080:80".to_string()], None);

        assert_eq!(spec.exposed.iter().collect::<Vec<_>>(), vec!["80/tcp"]);
        assert_eq!(
            spec.bindings["80/tcp"],
            vec![PortBinding {
                host_ip: "::1".to_string(),
                host_port: "8080".to_string(),
            }]
        );
    }

    #[test]
    fn test_ports_unparseable_entries_skipped() {
        let spec = ports(
            &[
                "::1:8080:80".to_string(),
                "[::1]:80".to_string(),
                ":80".to_string(),
                "3000:3000".to_string(),
            ],
            None,
        );

        assert_eq!(spec.exposed.iter().collect::<Vec<_>>(), vec!["3000/tcp"]);
        assert_eq!(spec.bindings.len(), 1);
    }

    #[test]
    fn test_ports_caller_override_and_duplicates() {
        let spec = ports(&["8080:80".to_string(), "8081:80".to_string()], Some("127.0.0.1"));

        assert_eq!(spec.exposed.len(), 1);
        let bindings = &spec.bindings["80/tcp"];
        assert_eq!(bindings.len(), 2);
        assert!(bindings.iter().all(|b| b.host_ip == "127.0.0.1"));
    }

    #[test]
    fn test_volumes_project_scoping() {
        let entries = vec![
            "data".to_string(),
            "/host/path:/container/path".to_string(),
            "cache:/container/path".to_string(),
            "./conf:/etc/app:ro".to_string(),
            "logs:/var/log:ro".to_string(),
        ];

        assert_eq!(
            volumes(&entries, "myapp"),
            vec![
                "myapp-data",
                "/host/path:/container/path",
                "myapp-cache:/container/path",
                "./conf:/etc/app:ro",
                "myapp-logs:/var/log:ro",
            ]
        );
    }

    #[test]
    fn test_named_volumes_skip_binds_and_duplicates() {
        let translated = vec![
            "myapp-data:/data".to_string(),
            "/srv:/srv".to_string(),
            "myapp-data:/backup".to_string(),
            "myapp-cache".to_string(),
        ];

        assert_eq!(named_volumes(&translated), vec!["myapp-data", "myapp-cache"]);
    }
}
