use colored::Colorize;

use crate::context::Context;

pub fn handle(ctx: &Context, name: Option<&str>) -> anyhow::Result<()> {
    let templates = ctx.templates()?;

    match name {
        Some(name) => {
            let template = templates.get(name).map_err(moorage_compose::ServiceError::from)?;
            print!("{}", template.yaml);
            if !template.yaml.ends_with('\n') {
                println!();
            }
        }
        None => {
            let list = templates.list().map_err(moorage_compose::ServiceError::from)?;
            if list.is_empty() {
                println!("{}", "テンプレートはありません".dimmed());
                return Ok(());
            }
            for template in &list {
                println!(
                    "  {} {}",
                    format!("{:<24}", template.name).cyan(),
                    template.description.dimmed()
                );
            }
        }
    }
    Ok(())
}
