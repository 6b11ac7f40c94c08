use super::{ensure_api_key, spinner};
use crate::config::Config;
use crate::errors::AppError;
use crate::git;
use crate::llm::{generate_commit_message, GeminiClient, Generated};
use anyhow::{Context, Result};
use colored::Colorize;
use dialoguer::{theme::ColorfulTheme, Confirm, Select};
use std::path::Path;

fn print_message(message: &str) {
    println!("\n{}\n", "=".repeat(60));
    println!("{}", message.cyan());
    println!("{}\n", "=".repeat(60));
}

async fn run_commit(message: &str) -> Result<()> {
    git::run_git_command(&["commit", "-m", message])
        .await
        .context("无法执行 git commit。")?;
    println!("🚀 提交成功！");
    Ok(())
}

pub async fn handle_commit(config: &mut Config, config_path: &Path, all: bool) -> Result<()> {
    if !git::check_is_git_repo().await {
        return Err(AppError::NotAGitRepo.into());
    }

    // 处理 git add -u
    if all {
        git::run_git_command(&["add", "-u"])
            .await
            .context("无法暂存所有已跟踪的文件。")?;
        println!("{}", "已暂存所有已跟踪文件的变更。".green());
    }

    let diff = git::get_staged_diff()
        .await
        .context("无法获取暂存的git diff")?;
    if diff.trim().is_empty() {
        return Err(AppError::NoStagedChanges.into());
    }

    ensure_api_key(config, config_path).await?;
    let client = GeminiClient::from_config(config)?;

    let progress_bar = spinner("🤖 正在生成提交信息...");
    let generated = generate_commit_message(&client, &diff).await;
    progress_bar.finish_and_clear();

    let commit_message = match generated {
        Generated::Text(text) => text.replace('`', "'"),
        Generated::NothingToSummarize => {
            println!("{}", "没有发现暂存的修改.".yellow());
            return Ok(());
        }
        Generated::Failed(reason) => {
            eprintln!("{}", reason.red());
            println!("{}", "生成提交信息失败。".yellow());
            return Ok(());
        }
    };

    print_message(&commit_message);

    let options = &["✅ 直接提交", "📝 编辑后提交", "❌ 取消"];
    let selection = Select::with_theme(&ColorfulTheme::default())
        .with_prompt("您想如何处理这条提交信息？")
        .items(&options[..])
        .default(0)
        .interact()?;

    match selection {
        0 => run_commit(&commit_message).await?,
        1 => {
            let edited_message = edit::edit(&commit_message)?;
            let edited_message = edited_message.trim();
            if edited_message.is_empty() {
                println!("编辑后的消息为空，提交已中止。");
                return Ok(());
            }

            println!("\n📝 这是您编辑后的提交信息:");
            print_message(edited_message);

            if Confirm::with_theme(&ColorfulTheme::default())
                .with_prompt("确认要提交吗?")
                .default(true)
                .interact()?
            {
                run_commit(edited_message).await?;
            } else {
                println!("好的，提交已取消。");
            }
        }
        _ => println!("好的，提交已取消。"),
    }

    Ok(())
}
