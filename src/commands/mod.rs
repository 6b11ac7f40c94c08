pub mod commit;
pub mod post_commit;
pub mod pre_commit;
pub mod setup;
pub mod setup_husky;
pub mod summary;

use crate::config::Config;
use crate::errors::AppError;
use anyhow::Result;
use colored::Colorize;
use dialoguer::{theme::ColorfulTheme, Input};
use indicatif::{ProgressBar, ProgressStyle};
use std::path::Path;
use std::time::Duration;

/// 配置和环境变量都没有 API key 时交互式询问并写回配置文件。
/// 只在交互命令里调用，hook 里绝不调用。
pub async fn ensure_api_key(config: &mut Config, config_path: &Path) -> Result<()> {
    if config.api_key().is_some() {
        return Ok(());
    }

    println!("\n{}", "Gemini API 设置".bold());
    println!("{}", "-".repeat(30));
    println!("使用本工具需要一个 Gemini API key。");
    println!("获取地址: https://aistudio.google.com/apikey\n");

    let api_key: String = Input::with_theme(&ColorfulTheme::default())
        .with_prompt("请输入您的 Gemini API key")
        .allow_empty(true)
        .interact_text()?;
    let api_key = api_key.trim();
    if api_key.is_empty() {
        return Err(AppError::EmptyApiKey.into());
    }

    config.set("gemini", "api_key", api_key);
    config.save(config_path).await?;
    println!("{}", "✅ Gemini API key 已保存。".green());
    Ok(())
}

pub(crate) fn spinner(message: &str) -> ProgressBar {
    let progress_bar = ProgressBar::new_spinner();
    if let Ok(style) = ProgressStyle::default_spinner().template("{spinner:.green} {msg}") {
        progress_bar.set_style(style);
    }
    progress_bar.set_message(message.to_string());
    progress_bar.enable_steady_tick(Duration::from_millis(100));
    progress_bar
}

/// 当前时间，epoch 秒
pub(crate) fn now_timestamp() -> i64 {
    chrono::Utc::now().timestamp()
}
