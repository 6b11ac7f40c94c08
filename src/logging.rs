//! src/logging.rs

use crate::config::Config;
use anyhow::{Context, Result};
use std::env;
use std::fs::OpenOptions;

/// RUST_LOG 优先，否则用配置里的 logging.level。配置了 logging.file 时写入文件。
pub fn init_logging(config: &Config) -> Result<()> {
    let mut builder = pretty_env_logger::formatted_timed_builder();
    match env::var("RUST_LOG") {
        Ok(filters) if !filters.is_empty() => builder.parse_filters(&filters),
        _ => builder.parse_filters(&config.get_or("logging", "level", "warn")),
    };

    if let Some(path) = config.log_file() {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).context("Could not create log directory")?;
        }
        let file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&path)
            .with_context(|| format!("Could not open log file {}", path.display()))?;
        builder.write_style(env_logger::WriteStyle::Never);
        builder.target(env_logger::Target::Pipe(Box::new(file)));
    }

    // 重复初始化（例如测试里）不算错误
    let _ = builder.try_init();
    Ok(())
}
