//! src/readme.rs

use anyhow::{Context, Result};
use rusqlite::{params, Connection, OptionalExtension};
use std::path::{Path, PathBuf};
use tokio::fs;

/// 按顺序查找，第一个存在的文件胜出。
pub const README_CANDIDATES: &[&str] = &["README.md", "README.txt"];

/// Returns the first README candidate present in `dir`.
pub fn find_readme(dir: &Path) -> Option<PathBuf> {
    README_CANDIDATES
        .iter()
        .map(|name| dir.join(name))
        .find(|path| path.is_file())
}

/// 同一个 (repo, branch) 只保留一份快照：存在则原地覆盖，否则插入。
pub fn upsert_readme(
    conn: &Connection,
    repo_name: &str,
    branch_name: &str,
    content: &str,
    timestamp: i64,
) -> Result<i64> {
    let existing: Option<i64> = conn
        .query_row(
            "SELECT id FROM project_readme WHERE repo_name = ?1 AND branch_name = ?2
             ORDER BY id ASC LIMIT 1",
            params![repo_name, branch_name],
            |row| row.get(0),
        )
        .optional()
        .context("Failed to look up README snapshot")?;

    match existing {
        Some(id) => {
            conn.execute(
                "UPDATE project_readme SET readme_content = ?1, timestamp = ?2 WHERE id = ?3",
                params![content, timestamp, id],
            )
            .context("Failed to update README snapshot")?;
            log::debug!("updated README snapshot {id} for {repo_name}@{branch_name}");
            Ok(id)
        }
        None => {
            conn.execute(
                "INSERT INTO project_readme (repo_name, branch_name, readme_content, timestamp)
                 VALUES (?1, ?2, ?3, ?4)",
                params![repo_name, branch_name, content, timestamp],
            )
            .context("Failed to insert README snapshot")?;
            let id = conn.last_insert_rowid();
            log::debug!("inserted README snapshot {id} for {repo_name}@{branch_name}");
            Ok(id)
        }
    }
}

/// 工作目录里没有 README 时返回 `Ok(None)`，这不是错误。
pub async fn save_readme(
    conn: &Connection,
    work_dir: &Path,
    repo_name: &str,
    branch_name: &str,
    timestamp: i64,
) -> Result<Option<i64>> {
    let Some(path) = find_readme(work_dir) else {
        log::info!("no README found in {}", work_dir.display());
        return Ok(None);
    };

    let content = fs::read_to_string(&path)
        .await
        .with_context(|| format!("Failed to read {}", path.display()))?;
    let id = upsert_readme(conn, repo_name, branch_name, &content, timestamp)?;
    Ok(Some(id))
}
