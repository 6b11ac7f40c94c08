//! src/history.rs
//! commits 表的读写：pre-commit 插入，post-commit 回填，summary 按时间范围查询。

use crate::errors::AppError;
use anyhow::{Context, Result};
use chrono::{DateTime, Datelike, Duration, Local, NaiveTime, TimeZone};
use rusqlite::{params, Connection, OptionalExtension, Row};

/// A row of the `commits` table. Timestamps are epoch seconds (UTC).
#[derive(Debug, Clone, PartialEq)]
pub struct CommitRecord {
    pub id: i64,
    pub timestamp: i64,
    pub author_name: String,
    pub author_email: String,
    pub commit_message: String,
    pub repo_url: String,
    pub repo_name: String,
    pub branch_name: String,
    pub code_diff: Option<String>,
    pub added_lines: i64,
    pub removed_lines: i64,
    pub readme_id: Option<i64>,
}

impl CommitRecord {
    fn from_row(row: &Row) -> rusqlite::Result<Self> {
        Ok(Self {
            id: row.get("id")?,
            timestamp: row.get("timestamp")?,
            author_name: row.get("author_name")?,
            author_email: row.get("author_email")?,
            commit_message: row.get("commit_message")?,
            repo_url: row.get("repo_url")?,
            repo_name: row.get("repo_name")?,
            branch_name: row.get("branch_name")?,
            code_diff: row.get("code_diff")?,
            added_lines: row.get::<_, Option<i64>>("added_lines")?.unwrap_or(0),
            removed_lines: row.get::<_, Option<i64>>("removed_lines")?.unwrap_or(0),
            readme_id: row.get("readme_id")?,
        })
    }
}

/// 插入用的数据，commit_message 固定从空字符串开始。
#[derive(Debug, Clone)]
pub struct NewCommit {
    pub timestamp: i64,
    pub author_name: String,
    pub author_email: String,
    pub repo_url: String,
    pub repo_name: String,
    pub branch_name: String,
    pub code_diff: Option<String>,
    pub added_lines: i64,
    pub removed_lines: i64,
    pub readme_id: Option<i64>,
}

const SELECT_COLUMNS: &str = "SELECT id, timestamp, author_name, author_email, commit_message,
    repo_url, repo_name, branch_name, code_diff, added_lines, removed_lines, readme_id
    FROM commits";

pub fn insert(conn: &Connection, commit: &NewCommit) -> Result<i64> {
    conn.execute(
        r#"
        INSERT INTO commits (
            timestamp, author_name, author_email, commit_message,
            repo_url, repo_name, branch_name, code_diff,
            added_lines, removed_lines, readme_id
        ) VALUES (?1, ?2, ?3, '', ?4, ?5, ?6, ?7, ?8, ?9, ?10)
        "#,
        params![
            commit.timestamp,
            commit.author_name,
            commit.author_email,
            commit.repo_url,
            commit.repo_name,
            commit.branch_name,
            commit.code_diff,
            commit.added_lines,
            commit.removed_lines,
            commit.readme_id,
        ],
    )
    .context("Failed to insert commit record")?;
    Ok(conn.last_insert_rowid())
}

/// 回填 id 最大的那一行。假设没有并发提交。
pub fn backfill_message(conn: &Connection, message: &str) -> Result<i64> {
    let latest: Option<i64> = conn
        .query_row("SELECT MAX(id) FROM commits", [], |row| row.get(0))
        .context("Failed to find latest commit record")?;
    let id = latest.ok_or(AppError::EmptyStore)?;
    backfill_message_for(conn, id, message)?;
    Ok(id)
}

pub fn backfill_message_for(conn: &Connection, id: i64, message: &str) -> Result<()> {
    let updated = conn
        .execute(
            "UPDATE commits SET commit_message = ?1 WHERE id = ?2",
            params![message, id],
        )
        .context("Failed to update commit message")?;
    if updated == 0 {
        anyhow::bail!("commit record {id} does not exist");
    }
    Ok(())
}

pub fn get(conn: &Connection, id: i64) -> Result<Option<CommitRecord>> {
    conn.query_row(
        &format!("{SELECT_COLUMNS} WHERE id = ?1"),
        [id],
        CommitRecord::from_row,
    )
    .optional()
    .context("Failed to read commit record")
}

/// Rows with `start <= timestamp <= end`, oldest first.
pub fn query_range(conn: &Connection, start: i64, end: i64) -> Result<Vec<CommitRecord>> {
    let mut stmt = conn.prepare(&format!(
        "{SELECT_COLUMNS} WHERE timestamp >= ?1 AND timestamp <= ?2 ORDER BY timestamp ASC, id ASC"
    ))?;
    let rows = stmt.query_map(params![start, end], CommitRecord::from_row)?;

    let mut commits = Vec::new();
    for row in rows {
        commits.push(row?);
    }
    Ok(commits)
}

fn local_timestamp(dt: chrono::NaiveDateTime) -> i64 {
    // 夏令时切换导致的歧义时间取较早的那个
    match Local.from_local_datetime(&dt).earliest() {
        Some(local) => local.timestamp(),
        None => Local.from_utc_datetime(&dt).timestamp(),
    }
}

pub fn start_of_day(date: chrono::NaiveDate) -> i64 {
    local_timestamp(date.and_time(NaiveTime::MIN))
}

pub fn end_of_day(date: chrono::NaiveDate) -> i64 {
    let end = NaiveTime::from_hms_opt(23, 59, 59).unwrap_or(NaiveTime::MIN);
    local_timestamp(date.and_time(end))
}

/// 本周一 00:00:00 到 `now` 当天 23:59:59（本地时间）。
pub fn current_week_range(now: DateTime<Local>) -> (i64, i64) {
    let today = now.date_naive();
    let monday = today - Duration::days(i64::from(today.weekday().num_days_from_monday()));
    (start_of_day(monday), end_of_day(today))
}

/// 把提交记录整理成发给模型的摘要文本。没有记录时返回 None。
pub fn format_digest(commits: &[CommitRecord]) -> Option<String> {
    if commits.is_empty() {
        return None;
    }

    let mut lines = vec!["Commits for the current week:".to_string(), String::new()];
    for commit in commits {
        let when = Local
            .timestamp_opt(commit.timestamp, 0)
            .single()
            .map(|dt| dt.format("%Y-%m-%d %H:%M:%S").to_string())
            .unwrap_or_else(|| commit.timestamp.to_string());
        let repo = commit
            .repo_name
            .rsplit('/')
            .next()
            .unwrap_or(&commit.repo_name);
        lines.push(format!(
            "- [{when}] {repo}: {}, add lines: {}",
            commit.commit_message.trim(),
            commit.added_lines
        ));
    }
    Some(lines.join("\n"))
}
