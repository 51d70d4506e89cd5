//! マーケットプレイスのアプリカタログ
//!
//! `apps.json` を読み込むだけの静的な参照テーブルです。ファイルがなければ
//! 組み込みのカタログを書き出して使用します。

use crate::error::CatalogError;
use crate::model::{App, AppEnvVars};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::Path;

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Catalog {
    #[serde(default)]
    pub apps: Vec<App>,
}

impl Catalog {
    pub fn new(apps: Vec<App>) -> Self {
        Self { apps }
    }

    /// カタログファイルを読み込む（存在しなければ組み込みカタログを書き出す）
    pub fn load_or_init(path: &Path) -> Result<Self, CatalogError> {
        let io_err = |source| CatalogError::Io {
            path: path.to_path_buf(),
            source,
        };

        match std::fs::read_to_string(path) {
            Ok(content) => {
                let catalog: Catalog = serde_json::from_str(&content)?;
                tracing::debug!("カタログを読み込みました: {} 件", catalog.apps.len());
                Ok(catalog)
            }
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                let catalog = Self::builtin();
                if let Some(parent) = path.parent() {
                    std::fs::create_dir_all(parent).map_err(io_err)?;
                }
                std::fs::write(path, serde_json::to_string_pretty(&catalog)?).map_err(io_err)?;
                tracing::info!("組み込みカタログを作成: {}", path.display());
                Ok(catalog)
            }
            Err(e) => Err(io_err(e)),
        }
    }

    pub fn apps(&self) -> &[App] {
        &self.apps
    }

    pub fn get(&self, app_id: &str) -> Option<&App> {
        self.apps.iter().find(|app| app.id == app_id)
    }

    /// 組み込みカタログ
    pub fn builtin() -> Self {
        #[allow(clippy::too_many_arguments)]
        fn app(
            id: &str,
            name: &str,
            description: &str,
            category: &str,
            image: &str,
            ports: &[(&str, u16)],
            volumes: &[&str],
            required: &[&str],
            optional: &[&str],
        ) -> App {
            App {
                id: id.to_string(),
                name: name.to_string(),
                description: description.to_string(),
                category: category.to_string(),
                image: image.to_string(),
                ports: ports
                    .iter()
                    .map(|(label, port)| (label.to_string(), *port))
                    .collect::<BTreeMap<_, _>>(),
                volumes: volumes.iter().map(|v| v.to_string()).collect(),
                env: AppEnvVars {
                    required: required.iter().map(|v| v.to_string()).collect(),
                    optional: optional.iter().map(|v| v.to_string()).collect(),
                },
            }
        }

        Self::new(vec![
            app(
                "uptime-kuma",
                "Uptime Kuma",
                "Self-hosted monitoring tool",
                "monitoring",
                "louislam/uptime-kuma:1",
                &[("web", 3001)],
                &["/app/data"],
                &[],
                &[],
            ),
            app(
                "jellyfin",
                "Jellyfin",
                "Free media server",
                "media",
                "jellyfin/jellyfin:latest",
                &[("web", 8096)],
                &["/config", "/media"],
                &[],
                &["TZ"],
            ),
            app(
                "vaultwarden",
                "Vaultwarden",
                "Self-hosted password manager",
                "security",
                "vaultwarden/server:latest",
                &[("web", 80)],
                &["/data"],
                &[],
                &["ADMIN_TOKEN"],
            ),
            app(
                "nextcloud",
                "Nextcloud",
                "Self-hosted cloud storage and collaboration platform",
                "productivity",
                "nextcloud:latest",
                &[("web", 80)],
                &["/var/www/html"],
                &["NEXTCLOUD_ADMIN_USER", "NEXTCLOUD_ADMIN_PASSWORD"],
                &[],
            ),
            app(
                "gitea",
                "Gitea",
                "Lightweight self-hosted Git service",
                "development",
                "gitea/gitea:latest",
                &[("web", 3000), ("ssh", 22)],
                &["/data"],
                &[],
                &["USER_UID", "USER_GID"],
            ),
            app(
                "pihole",
                "Pi-hole",
                "Network-wide ad blocking DNS server",
                "networking",
                "pihole/pihole:latest",
                &[("web", 80), ("dns", 53)],
                &["/etc/pihole", "/etc/dnsmasq.d"],
                &[],
                &["WEBPASSWORD", "TZ"],
            ),
            app(
                "grafana",
                "Grafana",
                "Analytics and monitoring dashboard",
                "monitoring",
                "grafana/grafana:latest",
                &[("web", 3000)],
                &["/var/lib/grafana"],
                &[],
                &["GF_SECURITY_ADMIN_PASSWORD"],
            ),
        ])
    }
}
