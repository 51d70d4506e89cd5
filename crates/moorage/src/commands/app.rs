use colored::Colorize;
use moorage_compose::InstallRequest;

use crate::context::Context;

pub fn catalog(ctx: &Context) -> anyhow::Result<()> {
    let catalog = ctx.catalog()?;

    if catalog.apps().is_empty() {
        println!("{}", "カタログにアプリがありません".dimmed());
        return Ok(());
    }

    for app in catalog.apps() {
        println!(
            "  {} {} {}",
            format!("{:<16}", app.id).cyan(),
            format!("{:<14}", app.category).dimmed(),
            app.description
        );
        if !app.env.required.is_empty() {
            println!(
                "  {:<16} 必須の環境変数: {}",
                "",
                app.env.required.join(", ").yellow()
            );
        }
    }
    Ok(())
}

pub async fn install(ctx: &Context, app_id: &str, request: &InstallRequest) -> anyhow::Result<()> {
    let marketplace = ctx.marketplace().await?;

    println!("アプリ {} をインストール中...", app_id.cyan());
    let installed = marketplace.install(app_id, request).await?;

    println!("{}", "✓ インストールが完了しました".green().bold());
    println!("  ID: {}", installed.id);
    if let Some(container_name) = installed.config.get("containerName") {
        println!("  コンテナ: {}", container_name.cyan());
    }
    Ok(())
}

pub async fn installed(ctx: &Context, id: Option<i64>) -> anyhow::Result<()> {
    let marketplace = ctx.marketplace().await?;

    if let Some(id) = id {
        let app = marketplace.get_installed(id).await?;
        println!("{}", serde_json::to_string_pretty(&app)?);
        return Ok(());
    }

    let apps = marketplace.list_installed().await?;
    if apps.is_empty() {
        println!("{}", "インストール済みのアプリはありません".dimmed());
        return Ok(());
    }

    println!(
        "{}",
        format!("{:<6} {:<16} {:<24} {:<10} {}", "ID", "APP", "CONTAINER", "STATUS", "INSTALLED").bold()
    );
    for app in &apps {
        let container = app.config.get("containerName").map(String::as_str).unwrap_or("-");
        println!(
            "{:<6} {:<16} {:<24} {} {}",
            app.id,
            app.app_id,
            container,
            format!("{:<10}", app.status).green(),
            app.installed_at.format("%Y-%m-%d %H:%M:%S").to_string().dimmed()
        );
    }
    Ok(())
}

pub async fn uninstall(ctx: &Context, id: i64) -> anyhow::Result<()> {
    let marketplace = ctx.marketplace().await?;
    println!("{}", "アプリをアンインストール中...".blue());
    marketplace.uninstall(id).await?;
    println!("{} {}", "✓ アンインストールしました: ID".green().bold(), id);
    Ok(())
}
