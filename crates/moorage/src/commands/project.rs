use std::path::Path;

use colored::Colorize;
use moorage_core::{Project, ProjectStatus};

use super::read_manifest;
use crate::context::Context;

pub async fn deploy(ctx: &Context, name: &str, file: &Path, description: &str) -> anyhow::Result<()> {
    let manifest = read_manifest(file)?;
    let service = ctx.compose().await?;

    println!("プロジェクト {} をデプロイ中...", name.cyan());
    let project = service.deploy(name, description, &manifest).await?;

    println!("{}", "✓ デプロイが完了しました".green().bold());
    print_summary(&project);
    Ok(())
}

pub async fn list(ctx: &Context) -> anyhow::Result<()> {
    let service = ctx.compose().await?;
    let projects = service.list_projects().await?;

    if projects.is_empty() {
        println!("{}", "プロジェクトはありません".dimmed());
        return Ok(());
    }

    println!(
        "{}",
        format!(
            "{:<6} {:<24} {:<10} {:<10} {}",
            "ID", "NAME", "STATUS", "CONTAINERS", "CREATED"
        )
        .bold()
    );
    for project in &projects {
        println!(
            "{:<6} {:<24} {} {:<10} {}",
            project.id,
            project.name,
            status_cell(project.status),
            project.container_ids.len(),
            project.created_at.format("%Y-%m-%d %H:%M:%S").to_string().dimmed()
        );
    }
    Ok(())
}

pub async fn show(ctx: &Context, id: i64) -> anyhow::Result<()> {
    let service = ctx.compose().await?;
    let project = service.get_project(id).await?;
    println!("{}", serde_json::to_string_pretty(&project)?);
    Ok(())
}

pub async fn start(ctx: &Context, id: i64) -> anyhow::Result<()> {
    let service = ctx.compose().await?;
    println!("{}", "プロジェクトを起動中...".blue());
    let project = service.start(id).await?;
    println!("{} {}", "✓ 起動しました:".green().bold(), project.name.cyan());
    Ok(())
}

pub async fn stop(ctx: &Context, id: i64) -> anyhow::Result<()> {
    let service = ctx.compose().await?;
    println!("{}", "プロジェクトを停止中...".blue());
    let project = service.stop(id).await?;
    println!("{} {}", "✓ 停止しました:".green().bold(), project.name.cyan());
    Ok(())
}

pub async fn restart(ctx: &Context, id: i64) -> anyhow::Result<()> {
    let service = ctx.compose().await?;
    println!("{}", "プロジェクトを再起動中...".blue());
    let project = service.restart(id).await?;
    println!("{} {}", "✓ 再起動しました:".green().bold(), project.name.cyan());
    Ok(())
}

pub async fn remove(ctx: &Context, id: i64) -> anyhow::Result<()> {
    let service = ctx.compose().await?;
    println!("{}", "プロジェクトを削除中...".blue());
    service.delete(id).await?;
    println!("{} {}", "✓ 削除しました: ID".green().bold(), id);
    Ok(())
}

fn print_summary(project: &Project) {
    println!();
    println!("  ID: {}", project.id);
    println!("  名前: {}", project.name.cyan());
    println!("  状態: {}", status_cell(project.status));
    println!("  コンテナ: {}個", project.container_ids.len());
    if !project.volume_names.is_empty() {
        println!("  ボリューム: {}", project.volume_names.join(", "));
    }
}

fn status_cell(status: ProjectStatus) -> colored::ColoredString {
    let cell = format!("{:<10}", status.as_str());
    match status {
        ProjectStatus::Running => cell.green(),
        ProjectStatus::Stopped => cell.yellow(),
    }
}
