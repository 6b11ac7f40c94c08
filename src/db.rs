//! src/db.rs
//! SQLite 连接与表结构。每个操作各自打开一个短连接，不做连接池。

use crate::errors::AppError;
use anyhow::{Context, Result};
use rusqlite::Connection;
use std::fs;
use std::path::{Path, PathBuf};

const SCHEMA: &str = r#"
CREATE TABLE IF NOT EXISTS project_readme (
    id             INTEGER PRIMARY KEY AUTOINCREMENT,
    repo_name      TEXT NOT NULL,
    branch_name    TEXT NOT NULL,
    readme_content TEXT NOT NULL,
    timestamp      INTEGER NOT NULL
);

CREATE TABLE IF NOT EXISTS commits (
    id             INTEGER PRIMARY KEY AUTOINCREMENT,
    timestamp      INTEGER NOT NULL,
    author_name    TEXT NOT NULL,
    author_email   TEXT NOT NULL,
    commit_message TEXT NOT NULL DEFAULT '',
    repo_url       TEXT NOT NULL,
    repo_name      TEXT NOT NULL,
    branch_name    TEXT NOT NULL,
    code_diff      TEXT,
    added_lines    INTEGER DEFAULT 0,
    removed_lines  INTEGER DEFAULT 0,
    readme_id      INTEGER REFERENCES project_readme(id) ON DELETE CASCADE
);

CREATE INDEX IF NOT EXISTS idx_commits_timestamp ON commits(timestamp);
"#;

pub fn init_schema(conn: &Connection) -> Result<()> {
    conn.execute_batch(SCHEMA)
        .context("Failed to create database tables")?;
    Ok(())
}

fn configure(conn: &Connection) -> Result<()> {
    conn.pragma_update(None, "foreign_keys", "ON")
        .context("Failed to enable foreign keys")?;
    Ok(())
}

/// 打开已经初始化过的数据库。hook 场景下不允许隐式创建。
pub fn open_existing(path: &Path) -> Result<Connection> {
    if !path.exists() {
        return Err(AppError::DatabaseNotFound(path.to_path_buf()).into());
    }
    let conn = Connection::open(path)
        .with_context(|| format!("Failed to open database {}", path.display()))?;
    configure(&conn)?;
    Ok(conn)
}

/// In-memory database with the full schema, for tests.
#[cfg(test)]
pub fn open_memory() -> Result<Connection> {
    let conn = Connection::open_in_memory()?;
    configure(&conn)?;
    init_schema(&conn)?;
    Ok(conn)
}

/// `commits.db` -> `commits_backup.db`
pub fn backup_path(path: &Path) -> PathBuf {
    let stem = path
        .file_stem()
        .map(|s| s.to_string_lossy().to_string())
        .unwrap_or_else(|| "commits".to_string());
    let file_name = match path.extension() {
        Some(ext) => format!("{stem}_backup.{}", ext.to_string_lossy()),
        None => format!("{stem}_backup"),
    };
    path.with_file_name(file_name)
}

/// Creates a fresh database at `path`.
///
/// An existing file is only replaced when `confirm_backup` agrees; it is then
/// renamed to its backup path. Returns the backup path if one was made.
pub fn create_database<F>(path: &Path, confirm_backup: F) -> Result<Option<PathBuf>>
where
    F: FnOnce(&Path) -> Result<bool>,
{
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            fs::create_dir_all(parent).context("Failed to create database directory")?;
        }
    }

    let mut backup = None;
    if path.exists() {
        if !confirm_backup(path)? {
            return Err(AppError::SetupCancelled.into());
        }
        let target = backup_path(path);
        fs::rename(path, &target).with_context(|| {
            format!("Failed to back up {} to {}", path.display(), target.display())
        })?;
        log::info!("backed up {} to {}", path.display(), target.display());
        backup = Some(target);
    }

    let conn = Connection::open(path)
        .with_context(|| format!("Failed to create database {}", path.display()))?;
    configure(&conn)?;
    init_schema(&conn)?;
    Ok(backup)
}
