use super::now_timestamp;
use crate::config::Config;
use crate::db;
use crate::diff::summarize_diff;
use crate::git;
use crate::history::{self, NewCommit};
use crate::readme;
use anyhow::{Context, Result};
use std::path::{Path, PathBuf};
use tokio::fs;

/// pre-commit 写入、post-commit 读取的文件，记录本次插入的行 id。
pub const PENDING_RECORD_FILE: &str = "coas-pending-record";

pub fn pending_record_path(git_dir: &Path) -> PathBuf {
    git_dir.join(PENDING_RECORD_FILE)
}

/// 采集 diff、作者和仓库信息，保存 README 快照，然后插入一条提交记录。
pub async fn handle_pre_commit(config: &Config, config_dir: &Path) -> Result<()> {
    let git_dir = git::get_git_dir().await?;
    let db_path = config.db_path(config_dir);
    let conn = db::open_existing(&db_path)?;

    let metadata = git::collect_metadata().await?;
    let raw_diff = git::get_staged_diff()
        .await
        .context("无法获取暂存的git diff")?;
    let summary = summarize_diff(&raw_diff);
    if summary.truncated {
        log::info!("diff truncated to {} lines", crate::diff::MAX_DIFF_LINES);
    }

    let timestamp = now_timestamp();
    let work_dir = git::get_toplevel().await?;
    let readme_id = readme::save_readme(
        &conn,
        &work_dir,
        &metadata.repo_name,
        &metadata.branch_name,
        timestamp,
    )
    .await?;

    let code_diff = if summary.is_empty() {
        None
    } else {
        Some(summary.text.clone())
    };
    let record = NewCommit {
        timestamp,
        author_name: metadata.author_name,
        author_email: metadata.author_email,
        repo_url: metadata.repo_url,
        repo_name: metadata.repo_name,
        branch_name: metadata.branch_name,
        code_diff,
        added_lines: summary.added_lines,
        removed_lines: summary.removed_lines,
        readme_id,
    };
    let id = history::insert(&conn, &record)?;
    log::info!(
        "inserted commit record {id} (+{} -{})",
        record.added_lines,
        record.removed_lines
    );

    let pending = pending_record_path(&git_dir);
    fs::write(&pending, id.to_string())
        .await
        .with_context(|| format!("Failed to write {}", pending.display()))?;

    println!(
        "coas: 已记录 {}@{} (+{} -{})",
        record.repo_name, record.branch_name, record.added_lines, record.removed_lines
    );
    Ok(())
}
