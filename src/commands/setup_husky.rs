use crate::git;
use crate::hook;
use anyhow::Result;
use colored::Colorize;

pub async fn handle_setup_husky() -> Result<()> {
    let project_root = git::get_toplevel().await?;
    let hooks_dir = hook::install_husky_hooks(&project_root).await?;
    println!("\nHusky 钩子目录: {}", hooks_dir.display());
    println!("{}", "🎉 Git 钩子设置完成！".green());
    Ok(())
}
