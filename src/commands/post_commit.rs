use super::pre_commit::pending_record_path;
use crate::config::Config;
use crate::db;
use crate::errors::AppError;
use crate::git;
use crate::history;
use anyhow::{Context, Result};
use rusqlite::Connection;
use std::path::Path;
use tokio::fs;

const COMMIT_MSG_FILE: &str = "COMMIT_EDITMSG";

/// 去掉 git 的注释行和首尾空白。
pub fn clean_commit_message(raw: &str) -> String {
    raw.lines()
        .filter(|line| !line.starts_with('#'))
        .collect::<Vec<_>>()
        .join("\n")
        .trim()
        .to_string()
}

pub async fn read_commit_message(git_dir: &Path) -> Result<String> {
    let path = git_dir.join(COMMIT_MSG_FILE);
    if !path.exists() {
        return Err(AppError::CommitMessageNotFound(path).into());
    }
    let raw = fs::read_to_string(&path)
        .await
        .with_context(|| format!("Failed to read {}", path.display()))?;
    Ok(clean_commit_message(&raw))
}

/// pre-commit 留下的行 id；文件不存在或内容无效时返回 None。
async fn read_pending_record(git_dir: &Path) -> Option<i64> {
    let content = fs::read_to_string(pending_record_path(git_dir)).await.ok()?;
    content.trim().parse().ok()
}

/// 回填 pending id 对应的行，没有 pending id 或那一行已不存在时回填 id 最大的行。
/// 成功之后才删除 pending 文件。
async fn backfill_pending(conn: &Connection, git_dir: &Path, message: &str) -> Result<i64> {
    let pending = match read_pending_record(git_dir).await {
        Some(id) if history::get(conn, id)?.is_some() => Some(id),
        Some(id) => {
            log::warn!("pending commit record {id} no longer exists, backfilling the latest row");
            None
        }
        None => {
            log::info!("no pending record id, backfilling the latest row");
            None
        }
    };

    let id = match pending {
        Some(id) => {
            history::backfill_message_for(conn, id, message)?;
            id
        }
        None => history::backfill_message(conn, message)?,
    };

    let path = pending_record_path(git_dir);
    if path.exists() {
        if let Err(e) = fs::remove_file(&path).await {
            log::warn!("could not remove {}: {e}", path.display());
        }
    }
    Ok(id)
}

/// 把最终的提交信息写回 pre-commit 插入的那一行。
pub async fn handle_post_commit(config: &Config, config_dir: &Path) -> Result<()> {
    let git_dir = git::get_git_dir().await?;
    let db_path = config.db_path(config_dir);
    let conn = db::open_existing(&db_path)?;

    let message = read_commit_message(&git_dir).await?;
    let id = backfill_pending(&conn, &git_dir, &message).await?;

    log::info!("backfilled commit record {id}");
    let subject = message.lines().next().unwrap_or_default();
    match history::get(&conn, id)? {
        Some(record) => println!(
            "coas: 已保存提交信息 \"{subject}\" ({}@{})",
            record.repo_name, record.branch_name
        ),
        None => println!("coas: 已保存提交信息 \"{subject}\""),
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::history::NewCommit;
    use tempfile::tempdir;

    #[test]
    fn comment_lines_are_dropped() {
        let raw = "feat: add login\n\nbody line\n# Please enter the commit message\n#\n";
        assert_eq!(clean_commit_message(raw), "feat: add login\n\nbody line");
    }

    #[tokio::test]
    async fn missing_message_file_is_an_error() {
        let dir = tempdir().unwrap();
        let err = read_commit_message(dir.path()).await.unwrap_err();
        assert!(matches!(
            err.downcast_ref::<AppError>(),
            Some(AppError::CommitMessageNotFound(_))
        ));
    }

    fn sample() -> NewCommit {
        NewCommit {
            timestamp: 1_700_000_000,
            author_name: "Ada".into(),
            author_email: "ada@example.com".into(),
            repo_url: "git@github.com:org/repo.git".into(),
            repo_name: "org/repo".into(),
            branch_name: "main".into(),
            code_diff: None,
            added_lines: 0,
            removed_lines: 0,
            readme_id: None,
        }
    }

    fn message_of(conn: &Connection, id: i64) -> String {
        history::get(conn, id).unwrap().unwrap().commit_message
    }

    #[tokio::test]
    async fn pending_record_is_backfilled_then_removed() {
        let dir = tempdir().unwrap();
        let conn = db::open_memory().unwrap();
        let first = history::insert(&conn, &sample()).unwrap();
        let second = history::insert(&conn, &sample()).unwrap();
        std::fs::write(pending_record_path(dir.path()), format!("{first}\n")).unwrap();

        let id = backfill_pending(&conn, dir.path(), "feat: first").await.unwrap();

        assert_eq!(id, first);
        assert_eq!(message_of(&conn, first), "feat: first");
        assert_eq!(message_of(&conn, second), "");
        assert!(!pending_record_path(dir.path()).exists());
    }

    #[tokio::test]
    async fn missing_pending_file_falls_back_to_latest_row() {
        let dir = tempdir().unwrap();
        let conn = db::open_memory().unwrap();
        let first = history::insert(&conn, &sample()).unwrap();
        let second = history::insert(&conn, &sample()).unwrap();

        let id = backfill_pending(&conn, dir.path(), "fix: latest").await.unwrap();

        assert_eq!(id, second);
        assert_eq!(message_of(&conn, first), "");
        assert_eq!(message_of(&conn, second), "fix: latest");
    }

    #[tokio::test]
    async fn pending_id_without_row_falls_back_to_latest_row() {
        let dir = tempdir().unwrap();
        let conn = db::open_memory().unwrap();
        let latest = history::insert(&conn, &sample()).unwrap();
        std::fs::write(pending_record_path(dir.path()), "999").unwrap();

        let id = backfill_pending(&conn, dir.path(), "chore: bump").await.unwrap();

        assert_eq!(id, latest);
        assert_eq!(message_of(&conn, latest), "chore: bump");
        assert!(!pending_record_path(dir.path()).exists());
    }

    #[tokio::test]
    async fn failed_backfill_keeps_pending_file() {
        let dir = tempdir().unwrap();
        let conn = db::open_memory().unwrap();
        std::fs::write(pending_record_path(dir.path()), "5").unwrap();

        let err = backfill_pending(&conn, dir.path(), "feat: x").await.unwrap_err();

        assert!(matches!(err.downcast_ref::<AppError>(), Some(AppError::EmptyStore)));
        assert!(pending_record_path(dir.path()).exists());
    }
}
