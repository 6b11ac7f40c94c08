use super::ensure_api_key;
use crate::config::Config;
use crate::db;
use crate::hook;
use anyhow::{Context, Result};
use colored::Colorize;
use dialoguer::{theme::ColorfulTheme, Confirm};
use std::path::Path;

/// 配置 API key → 初始化数据库 → 安装全局钩子
pub async fn handle_setup(config: &mut Config, config_path: &Path, config_dir: &Path) -> Result<()> {
    ensure_api_key(config, config_path).await?;

    let db_path = config.db_path(config_dir);
    let backup = db::create_database(&db_path, |path| {
        Ok(Confirm::with_theme(&ColorfulTheme::default())
            .with_prompt(format!(
                "数据库已存在于 {}，是否备份并重新创建？",
                path.display()
            ))
            .default(false)
            .interact()?)
    })
    .context("无法初始化数据库。")?;
    if let Some(backup) = backup {
        println!("📦 已将旧数据库备份到: {}", backup.display());
    }
    println!("✅ 数据库已创建: {}", db_path.display());

    let hooks_dir = hook::install_global_hooks(config)
        .await
        .context("无法安装全局 git 钩子。")?;
    config.save(config_path).await?;
    println!("\n全局钩子目录: {}", hooks_dir.display());

    if which::which("coas").is_err() {
        println!(
            "{}",
            "警告: 在 PATH 中找不到 coas，钩子将无法运行，请确认 coas 已安装到 PATH。".yellow()
        );
    }

    println!("{}", "🎉 设置完成！".green());
    Ok(())
}
