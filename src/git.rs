//! src/git.rs

use crate::errors::AppError;
use anyhow::{anyhow, Context, Result};
use std::path::PathBuf;
use std::process::Stdio;
use tokio::process::Command;

// --- Data Structures ---

/// 一次提交需要记录的仓库与作者信息。
#[derive(Debug, Clone, PartialEq)]
pub struct CommitMetadata {
    pub author_name: String,
    pub author_email: String,
    pub repo_url: String,
    pub repo_name: String,
    pub branch_name: String,
}

// --- Public API ---

/// 运行 git，返回原始 stdout 字节。失败时错误里带上 stderr。
async fn git_output(args: &[&str]) -> Result<Vec<u8>> {
    let output = Command::new("git")
        .args(args)
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .output()
        .await
        .context("Failed to execute git command")?;

    if output.status.success() {
        Ok(output.stdout)
    } else {
        let stderr = String::from_utf8_lossy(&output.stderr);
        Err(anyhow!(
            "Git command `git {}` failed with status {}:\n{}",
            args.join(" "),
            output.status,
            stderr.trim()
        ))
    }
}

pub async fn run_git_command(args: &[&str]) -> Result<String> {
    let stdout = git_output(args).await?;
    String::from_utf8(stdout).context("Failed to parse git command output")
}

pub async fn check_is_git_repo() -> bool {
    run_git_command(&["rev-parse", "--is-inside-work-tree"])
        .await
        .map(|out| out.trim() == "true")
        .unwrap_or(false)
}

pub async fn get_git_dir() -> Result<PathBuf> {
    let output = run_git_command(&["rev-parse", "--absolute-git-dir"])
        .await
        .map_err(|_| AppError::NotAGitRepo)?;
    Ok(PathBuf::from(output.trim()))
}

pub async fn get_toplevel() -> Result<PathBuf> {
    let output = run_git_command(&["rev-parse", "--show-toplevel"])
        .await
        .map_err(|_| AppError::NotAGitRepo)?;
    Ok(PathBuf::from(output.trim()))
}

/// 暂存区的 diff。文件内容不一定是 UTF-8，无效字节替换成 U+FFFD。
pub async fn get_staged_diff() -> Result<String> {
    let stdout = git_output(&["diff", "--cached"]).await?;
    Ok(String::from_utf8_lossy(&stdout).into_owned())
}

pub async fn get_author() -> Result<(String, String)> {
    let name = run_git_command(&["config", "user.name"])
        .await
        .context("无法读取 git user.name")?;
    let email = run_git_command(&["config", "user.email"])
        .await
        .context("无法读取 git user.email")?;
    Ok((name.trim().to_string(), email.trim().to_string()))
}

pub async fn get_remote_url() -> Result<String> {
    let url = run_git_command(&["config", "--get", "remote.origin.url"])
        .await
        .context("无法读取 remote.origin.url，请确认仓库已配置 origin 远程地址")?;
    Ok(url.trim().to_string())
}

pub async fn get_current_branch() -> Result<String> {
    // `rev-parse --abbrev-ref HEAD` 在还没有任何提交的仓库里会失败
    let branch = run_git_command(&["symbolic-ref", "--short", "HEAD"])
        .await
        .context("无法读取当前分支")?;
    Ok(branch.trim().to_string())
}

/// 作者、远程地址和分支，任何一步失败都直接返回错误。
pub async fn collect_metadata() -> Result<CommitMetadata> {
    let (author_name, author_email) = get_author().await?;
    let repo_url = get_remote_url().await?;
    let branch_name = get_current_branch().await?;
    let repo_name = parse_repo_name(&repo_url);
    log::debug!("metadata: repo={repo_name} branch={branch_name} author={author_name}");

    Ok(CommitMetadata {
        author_name,
        author_email,
        repo_url,
        repo_name,
        branch_name,
    })
}

pub async fn get_global_hooks_path() -> Option<String> {
    run_git_command(&["config", "--global", "core.hooksPath"])
        .await
        .ok()
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
}

pub async fn set_global_hooks_path(path: &str) -> Result<()> {
    run_git_command(&["config", "--global", "core.hooksPath", path])
        .await
        .context("无法设置全局 core.hooksPath")?;
    Ok(())
}

/// Derives "owner/repo" (or the bare name) from a remote URL.
///
/// `git@github.com:org/repo.git` and `https://github.com/org/repo.git` both
/// give `org/repo`.
pub fn parse_repo_name(url: &str) -> String {
    let url = url.trim().trim_end_matches('/');
    let url = url.strip_suffix(".git").unwrap_or(url);

    let path = if let Some((_, rest)) = url.split_once("://") {
        // scheme://authority/path
        rest.split_once('/').map(|(_, p)| p).unwrap_or("")
    } else if let Some((_, rest)) = url.split_once(':') {
        // user@host:path
        rest
    } else {
        url
    };

    let segments: Vec<&str> = path.split('/').filter(|s| !s.is_empty()).collect();
    match segments.as_slice() {
        [] => String::new(),
        [only] => (*only).to_string(),
        [.., owner, repo] => format!("{owner}/{repo}"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn scp_style_url() {
        assert_eq!(parse_repo_name("git@github.com:org/repo.git"), "org/repo");
    }

    #[test]
    fn https_url() {
        assert_eq!(parse_repo_name("https://github.com/org/repo.git"), "org/repo");
        assert_eq!(parse_repo_name("https://github.com/org/repo"), "org/repo");
    }

    #[test]
    fn single_segment_is_kept() {
        assert_eq!(parse_repo_name("https://example.com/repo.git"), "repo");
        assert_eq!(parse_repo_name("git@host:repo.git"), "repo");
        assert_eq!(parse_repo_name("repo"), "repo");
    }

    #[test]
    fn deeper_paths_use_last_two_segments() {
        assert_eq!(
            parse_repo_name("https://gitlab.com/group/sub/project.git"),
            "sub/project"
        );
        assert_eq!(
            parse_repo_name("ssh://git@example.com:2222/team/tool.git"),
            "team/tool"
        );
    }

    #[test]
    fn trailing_slash_and_whitespace() {
        assert_eq!(parse_repo_name(" https://github.com/org/repo/ \n"), "org/repo");
    }

    #[test]
    fn local_paths() {
        assert_eq!(parse_repo_name("/srv/git/project.git"), "git/project");
    }
}
