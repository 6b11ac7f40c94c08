//! src/main.rs

use anyhow::{Context, Result};
use clap::Parser;
use colored::Colorize;

mod cli;
mod commands;
mod config;
mod db;
mod diff;
mod errors;
mod git;
mod history;
mod hook;
mod llm;
mod logging;
mod readme;

use cli::{Cli, Commands};
use config::Config;

async fn run(cli: Cli) -> Result<()> {
    let config_dir = config::get_config_dir().await?;
    let config_path = config::get_config_path().await?;
    let mut config = Config::load_or_create(&config_path)
        .await
        .context("无法加载配置文件。")?;
    logging::init_logging(&config)?;
    log::debug!("config loaded from {}", config_path.display());

    match cli.command {
        Commands::Setup => {
            commands::setup::handle_setup(&mut config, &config_path, &config_dir).await?;
        }
        Commands::Commit { all } => {
            commands::commit::handle_commit(&mut config, &config_path, all).await?;
        }
        Commands::PreCommit => {
            commands::pre_commit::handle_pre_commit(&config, &config_dir).await?;
        }
        Commands::PostCommit => {
            commands::post_commit::handle_post_commit(&config, &config_dir).await?;
        }
        Commands::SetupHusky => {
            commands::setup_husky::handle_setup_husky().await?;
        }
        Commands::Summary { since, until } => {
            commands::summary::handle_summary(&mut config, &config_path, &config_dir, since, until)
                .await?;
        }
    }

    Ok(())
}

#[tokio::main]
async fn main() {
    dotenvy::dotenv().ok();
    let cli = Cli::parse();

    if let Err(e) = run(cli).await {
        log::debug!("command failed: {e:?}");
        eprintln!("{} {e:#}", "错误:".red().bold());
        std::process::exit(1);
    }
}
