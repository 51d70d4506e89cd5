use std::path::Path;

use colored::Colorize;

use super::read_manifest;

pub fn handle(file: &Path) -> anyhow::Result<()> {
    println!("{}", "マニフェストを検証中...".blue());

    let manifest = read_manifest(file)?;
    let report = moorage_compose::validate_manifest(&manifest)?;

    println!("{}", "✓ マニフェストは正常です！".green().bold());
    println!();
    if !report.version.is_empty() {
        println!("  バージョン: {}", report.version.cyan());
    }
    println!("  サービス: {}個", report.service_names.len());
    for name in &report.service_names {
        println!("    - {}", name.cyan());
    }
    Ok(())
}
