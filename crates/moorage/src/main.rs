mod commands;
mod context;

use std::path::PathBuf;
use std::process::ExitCode;

use clap::{Parser, Subcommand};
use colored::Colorize;
use moorage_compose::ServiceError;
use moorage_config::{ConfigError, Overrides};

use crate::commands::{parse_key_val, parse_port_mapping, parse_volume_mapping};
use crate::context::Context;

#[derive(Parser)]
#[command(name = "moorage")]
#[command(about = "Compose スタックとワンクリックアプリを1台のコンテナホストで管理", long_about = None)]
#[command(version)]
struct Cli {
    /// データディレクトリ（データベース・カタログ・テンプレートの置き場所）
    #[arg(long, global = true, value_name = "DIR")]
    data_dir: Option<PathBuf>,

    /// プロジェクトネットワーク名の接頭辞
    #[arg(long, global = true, value_name = "PREFIX")]
    network_prefix: Option<String>,

    /// コンテナ停止時の猶予（秒）
    #[arg(long, global = true, value_name = "SECS")]
    stop_timeout: Option<i64>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// マニフェストをプロジェクトとしてデプロイ
    Deploy {
        /// プロジェクト名
        name: String,
        /// docker-compose 互換のマニフェストファイル
        #[arg(short = 'f', long = "file")]
        file: PathBuf,
        /// プロジェクトの説明
        #[arg(short = 'd', long = "description", default_value = "")]
        description: String,
    },
    /// マニフェストを検証（コンテナは作成しない）
    Validate {
        #[arg(short = 'f', long = "file")]
        file: PathBuf,
    },
    /// プロジェクト一覧を表示
    Ls,
    /// プロジェクトの詳細を JSON で表示
    Show { id: i64 },
    /// プロジェクトのコンテナを起動
    Start { id: i64 },
    /// プロジェクトのコンテナを停止
    Stop { id: i64 },
    /// プロジェクトのコンテナを再起動
    Restart { id: i64 },
    /// プロジェクトを削除（コンテナとネットワークも削除）
    Rm { id: i64 },
    /// Compose テンプレートの一覧、または指定テンプレートの内容を表示
    Templates { name: Option<String> },
    /// マーケットプレイスのアプリ一覧を表示
    Apps,
    /// カタログのアプリをインストール
    Install {
        /// カタログのアプリID
        app_id: String,
        /// コンテナ名（省略時は `<app-id>-app`）
        #[arg(long)]
        name: Option<String>,
        /// 環境変数（KEY=VALUE）
        #[arg(short = 'e', long = "env", value_parser = parse_key_val)]
        env: Vec<(String, String)>,
        /// ポート（LABEL=HOSTPORT）
        #[arg(short = 'p', long = "port", value_parser = parse_port_mapping)]
        ports: Vec<(String, String)>,
        /// ボリューム（CONTAINER=HOST）
        #[arg(short = 'v', long = "volume", value_parser = parse_volume_mapping)]
        volumes: Vec<(String, String)>,
    },
    /// インストール済みアプリの一覧、または指定アプリの詳細を表示
    Installed { id: Option<i64> },
    /// インストール済みアプリを削除
    Uninstall { id: i64 },
}

#[tokio::main]
async fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    match run(cli).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("{} {:#}", "エラー:".red().bold(), e);
            ExitCode::from(exit_code(&e))
        }
    }
}

async fn run(cli: Cli) -> anyhow::Result<()> {
    let overrides = Overrides {
        data_dir: cli.data_dir,
        network_prefix: cli.network_prefix,
        stop_timeout_secs: cli.stop_timeout,
    };
    let ctx = Context::load(&overrides)?;

    match cli.command {
        Commands::Deploy {
            name,
            file,
            description,
        } => commands::project::deploy(&ctx, &name, &file, &description).await,
        Commands::Validate { file } => commands::validate::handle(&file),
        Commands::Ls => commands::project::list(&ctx).await,
        Commands::Show { id } => commands::project::show(&ctx, id).await,
        Commands::Start { id } => commands::project::start(&ctx, id).await,
        Commands::Stop { id } => commands::project::stop(&ctx, id).await,
        Commands::Restart { id } => commands::project::restart(&ctx, id).await,
        Commands::Rm { id } => commands::project::remove(&ctx, id).await,
        Commands::Templates { name } => commands::template::handle(&ctx, name.as_deref()),
        Commands::Apps => commands::app::catalog(&ctx),
        Commands::Install {
            app_id,
            name,
            env,
            ports,
            volumes,
        } => {
            let request = moorage_compose::InstallRequest {
                name,
                env,
                ports: ports.into_iter().collect(),
                volumes: volumes.into_iter().collect(),
            };
            commands::app::install(&ctx, &app_id, &request).await
        }
        Commands::Installed { id } => commands::app::installed(&ctx, id).await,
        Commands::Uninstall { id } => commands::app::uninstall(&ctx, id).await,
    }
}

/// 利用者側の誤りは 2、それ以外は 1
fn exit_code(err: &anyhow::Error) -> u8 {
    if let Some(e) = err.downcast_ref::<ServiceError>() {
        return if e.is_client_error() { 2 } else { 1 };
    }
    match err.downcast_ref::<ConfigError>() {
        Some(ConfigError::InvalidValue { .. } | ConfigError::InvalidSettingsFile { .. }) => 2,
        _ => 1,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_definition() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_parse_install() {
        let cli = Cli::try_parse_from([
            "moorage",
            "install",
            "gitea",
            "--name",
            "git",
            "-e",
            "USER_UID=1000",
            "-p",
            "web=3300",
            "-v",
            "/data=/srv/gitea",
        ])
        .unwrap();

        match cli.command {
            Commands::Install {
                app_id,
                name,
                env,
                ports,
                volumes,
            } => {
                assert_eq!(app_id, "gitea");
                assert_eq!(name.as_deref(), Some("git"));
                assert_eq!(env, vec![("USER_UID".to_string(), "1000".to_string())]);
                assert_eq!(ports, vec![("web".to_string(), "3300".to_string())]);
                assert_eq!(
                    volumes,
                    vec![("/data".to_string(), "/srv/gitea".to_string())]
                );
            }
            _ => panic!("Expected Install"),
        }
    }

    #[test]
    fn test_global_flags_after_subcommand() {
        let cli = Cli::try_parse_from(["moorage", "ls", "--data-dir", "/tmp/m"]).unwrap();
        assert_eq!(cli.data_dir, Some(PathBuf::from("/tmp/m")));
        assert!(matches!(cli.command, Commands::Ls));
    }

    #[test]
    fn test_exit_code() {
        let client: anyhow::Error = ServiceError::NotFound("project 1".to_string()).into();
        assert_eq!(exit_code(&client), 2);

        let server: anyhow::Error = ServiceError::engine(
            "pull image nginx",
            moorage_container::ContainerError::DockerApiError("boom".to_string()),
        )
        .into();
        assert_eq!(exit_code(&server), 1);

        let config: anyhow::Error = ConfigError::InvalidValue {
            key: "MOORAGE_STOP_TIMEOUT".to_string(),
            value: "soon".to_string(),
        }
        .into();
        assert_eq!(exit_code(&config), 2);

        assert_eq!(exit_code(&anyhow::anyhow!("boom")), 1);
    }
}
