//! Composeテンプレート
//!
//! テンプレートディレクトリ内の `*.yml` を読み出します。名前は外部入力なので、
//! パストラバーサルを防ぐためにディレクトリ外を指す名前は拒否します。

use crate::error::TemplateError;
use serde::{Deserialize, Serialize};
use std::path::{Component, Path, PathBuf};

const TEMPLATE_EXTENSION: &str = "yml";

/// 組み込みテンプレート（ファイル名, 内容）
const DEFAULT_TEMPLATES: &[(&str, &str)] = &[
    ("wordpress.yml", WORDPRESS),
    ("monitoring.yml", MONITORING),
    ("nextcloud-mariadb.yml", NEXTCLOUD_MARIADB),
];

/// テンプレート
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StackTemplate {
    pub name: String,
    pub description: String,
    pub yaml: String,
}

/// テンプレートディレクトリへのアクセス
#[derive(Debug, Clone)]
pub struct TemplateStore {
    dir: PathBuf,
}

impl TemplateStore {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// 組み込みテンプレートを書き出す（既存ファイルは上書きしない）
    pub fn ensure_defaults(&self) -> Result<(), TemplateError> {
        std::fs::create_dir_all(&self.dir).map_err(|source| TemplateError::Io {
            path: self.dir.clone(),
            source,
        })?;

        for (file_name, content) in DEFAULT_TEMPLATES {
            let path = self.dir.join(file_name);
            if path.exists() {
                continue;
            }
            std::fs::write(&path, content).map_err(|source| TemplateError::Io {
                path: path.clone(),
                source,
            })?;
            tracing::debug!("組み込みテンプレートを作成: {}", path.display());
        }

        Ok(())
    }

    /// テンプレート一覧（名前順）
    ///
    /// ディレクトリが存在しない場合は空を返します。
    pub fn list(&self) -> Result<Vec<StackTemplate>, TemplateError> {
        let entries = match std::fs::read_dir(&self.dir) {
            Ok(entries) => entries,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(Vec::new()),
            Err(source) => {
                return Err(TemplateError::Io {
                    path: self.dir.clone(),
                    source,
                });
            }
        };

        let mut names: Vec<String> = entries
            .filter_map(|entry| entry.ok())
            .map(|entry| entry.path())
            .filter(|path| {
                path.is_file()
                    && path.extension().and_then(|e| e.to_str()) == Some(TEMPLATE_EXTENSION)
            })
            .filter_map(|path| path.file_stem()?.to_str().map(String::from))
            .collect();
        names.sort();

        let mut templates = Vec::with_capacity(names.len());
        for name in names {
            match self.get(&name) {
                Ok(template) => templates.push(template),
                Err(e) => tracing::warn!("テンプレート '{}' をスキップ: {}", name, e),
            }
        }
        Ok(templates)
    }

    /// テンプレートを名前で取得
    pub fn get(&self, name: &str) -> Result<StackTemplate, TemplateError> {
        let path = self.template_path(name)?;

        let yaml = match std::fs::read_to_string(&path) {
            Ok(yaml) => yaml,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                return Err(TemplateError::NotFound(name.to_string()));
            }
            Err(source) => return Err(TemplateError::Io { path, source }),
        };

        Ok(StackTemplate {
            name: name.to_string(),
            description: format!("{} compose stack", capitalize(name)),
            yaml,
        })
    }

    /// 名前を検証してファイルパスに変換
    fn template_path(&self, name: &str) -> Result<PathBuf, TemplateError> {
        let invalid = || TemplateError::InvalidName(name.to_string());

        if name.is_empty() || name.contains("..") || name.contains('/') || name.contains('\\') {
            return Err(invalid());
        }

        let candidate = Path::new(name);
        let mut components = candidate.components();
        if !matches!(
            (components.next(), components.next()),
            (Some(Component::Normal(_)), None)
        ) {
            return Err(invalid());
        }

        let path = self
            .dir
            .join(format!("{}.{}", name, TEMPLATE_EXTENSION));
        if path.parent() != Some(self.dir.as_path()) {
            return Err(invalid());
        }
        Ok(path)
    }
}

/// 先頭の1文字を大文字にする
fn capitalize(name: &str) -> String {
    let mut chars = name.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}

const WORDPRESS: &str = r#"version: "3.8"
services:
  wordpress:
    image: wordpress:latest
    ports:
      - "8080:80"
    environment:
      WORDPRESS_DB_HOST: db:3306
      WORDPRESS_DB_USER: wordpress
      WORDPRESS_DB_PASSWORD: wordpress
      WORDPRESS_DB_NAME: wordpress
    volumes:
      - wordpress_data:/var/www/html
    depends_on:
      - db
    restart: unless-stopped

  db:
    image: mysql:8.0
    environment:
      MYSQL_DATABASE: wordpress
      MYSQL_USER: wordpress
      MYSQL_PASSWORD: wordpress
      MYSQL_ROOT_PASSWORD: rootpassword
    volumes:
      - db_data:/var/lib/mysql
    restart: unless-stopped

volumes:
  wordpress_data:
  db_data:
"#;

const MONITORING: &str = r#"version: "3.8"
services:
  prometheus:
    image: prom/prometheus:latest
    ports:
      - "9090:9090"
    volumes:
      - prometheus_data:/prometheus
    command:
      - "--config.file=/etc/prometheus/prometheus.yml"
      - "--storage.tsdb.path=/prometheus"
    restart: unless-stopped

  grafana:
    image: grafana/grafana:latest
    ports:
      - "3001:3000"
    environment:
      GF_SECURITY_ADMIN_PASSWORD: admin
    volumes:
      - grafana_data:/var/lib/grafana
    depends_on:
      - prometheus
    restart: unless-stopped

volumes:
  prometheus_data:
  grafana_data:
"#;

const NEXTCLOUD_MARIADB: &str = r#"version: "3.8"
services:
  nextcloud:
    image: nextcloud:latest
    ports:
      - "8081:80"
    environment:
      MYSQL_HOST: db
      MYSQL_DATABASE: nextcloud
      MYSQL_USER: nextcloud
      MYSQL_PASSWORD: nextcloud
      REDIS_HOST: redis
    volumes:
      - nextcloud_data:/var/www/html
    depends_on:
      - db
      - redis
    restart: unless-stopped

  db:
    image: mariadb:10.11
    environment:
      MYSQL_ROOT_PASSWORD: rootpassword
      MYSQL_DATABASE: nextcloud
      MYSQL_USER: nextcloud
      MYSQL_PASSWORD: nextcloud
    volumes:
      - db_data:/var/lib/mysql
    restart: unless-stopped

  redis:
    image: redis:alpine
    restart: unless-stopped

volumes:
  nextcloud_data:
  db_data:
"#;
