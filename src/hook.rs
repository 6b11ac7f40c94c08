//! src/hook.rs

use crate::config::{expand_home, Config};
use crate::errors::AppError;
use crate::git;
use anyhow::{Context, Result};
use std::path::{Path, PathBuf};
use tokio::fs;

pub const HOOK_NAMES: [&str; 2] = ["pre-commit", "post-commit"];

const HUSKY_DIR: &str = ".husky";
const HUSKY_HOOKS_SUBDIR: &str = "_";

#[derive(Debug, PartialEq)]
pub enum HookStatus {
    NotInstalled,
    InstalledByUs,
    InstalledByOther,
}

fn begin_marker(hook: &str) -> String {
    format!("# >>> coas {hook} >>>")
}

/// 带起止标记的片段，重复安装时用标记判断是否已存在。
pub fn hook_fragment(hook: &str) -> String {
    format!(
        "{}\necho \"Running coas {hook} hook...\"\ncoas {hook}\n# <<< coas {hook} <<<\n",
        begin_marker(hook)
    )
}

pub fn is_installed(content: &str, hook: &str) -> bool {
    content.contains(&begin_marker(hook))
}

pub async fn check_hook_status(hook_path: &Path, hook: &str) -> Result<HookStatus> {
    if !hook_path.exists() {
        return Ok(HookStatus::NotInstalled);
    }

    let content = fs::read_to_string(hook_path).await?;
    if is_installed(&content, hook) {
        Ok(HookStatus::InstalledByUs)
    } else {
        Ok(HookStatus::InstalledByOther)
    }
}

/// 已有脚本末尾追加片段。
pub fn append_fragment(existing: &str, hook: &str) -> String {
    let mut new_content = existing.to_string();
    if !new_content.is_empty() && !new_content.ends_with('\n') {
        new_content.push('\n');
    }
    new_content.push('\n');
    new_content.push_str(&hook_fragment(hook));
    new_content
}

/// 保留第一行（husky 生成的头部），片段插在它后面，其余行原样接上。
pub fn insert_after_first_line(existing: &str, hook: &str) -> String {
    let mut lines = existing.lines();
    let first = lines.next().unwrap_or("#!/usr/bin/env sh");
    let rest: Vec<&str> = lines.collect();

    let mut new_content = format!("{first}\n{}", hook_fragment(hook));
    if !rest.is_empty() {
        new_content.push_str(&rest.join("\n"));
        new_content.push('\n');
    }
    new_content
}

async fn write_executable(path: &Path, content: &str) -> Result<()> {
    fs::write(path, content.replace("\r\n", "\n"))
        .await
        .with_context(|| format!("Failed to write hook {}", path.display()))?;

    #[cfg(unix)]
    {
        let mut perms = fs::metadata(path).await?.permissions();
        use std::os::unix::fs::PermissionsExt;
        perms.set_mode(0o755);
        fs::set_permissions(path, perms)
            .await
            .context("Failed to set hook permissions")?;
    }
    Ok(())
}

/// 安装到全局 hooks 目录，返回每个 hook 安装前的状态。
pub async fn install_global_hook(hooks_dir: &Path, hook: &str) -> Result<HookStatus> {
    if !hooks_dir.exists() {
        fs::create_dir_all(hooks_dir)
            .await
            .context("Failed to create hooks directory")?;
    }

    let hook_path = hooks_dir.join(hook);
    let status = check_hook_status(&hook_path, hook).await?;
    match status {
        HookStatus::InstalledByUs => {
            log::info!("{} already contains coas, skipping", hook_path.display());
        }
        HookStatus::InstalledByOther => {
            let existing = fs::read_to_string(&hook_path).await?;
            write_executable(&hook_path, &append_fragment(&existing, hook)).await?;
        }
        HookStatus::NotInstalled => {
            let script = format!("#!/bin/sh\n{}", hook_fragment(hook));
            write_executable(&hook_path, &script).await?;
        }
    }
    Ok(status)
}

/// config 中的 git.hooks_dir > 全局 core.hooksPath > ~/.git/hooks
pub async fn resolve_global_hooks_dir(config: &Config) -> Result<PathBuf> {
    if let Some(dir) = config.get("git", "hooks_dir") {
        return Ok(expand_home(&dir));
    }
    if let Some(dir) = git::get_global_hooks_path().await {
        return Ok(expand_home(&dir));
    }
    let home = dirs::home_dir().context("Could not get home directory")?;
    Ok(home.join(".git").join("hooks"))
}

pub async fn install_global_hooks(config: &mut Config) -> Result<PathBuf> {
    let hooks_dir = resolve_global_hooks_dir(config).await?;
    let hooks_dir_str = hooks_dir.to_string_lossy().to_string();

    git::set_global_hooks_path(&hooks_dir_str).await?;
    for hook in HOOK_NAMES {
        let status = install_global_hook(&hooks_dir, hook).await?;
        report(&hooks_dir.join(hook), &status);
    }

    config.set("git", "hooks_dir", &hooks_dir_str);
    Ok(hooks_dir)
}

/// `.husky/_` 必须已经存在。
pub fn husky_hooks_dir(project_root: &Path) -> Result<PathBuf> {
    let husky_dir = project_root.join(HUSKY_DIR);
    if !husky_dir.is_dir() {
        return Err(AppError::HuskyNotInstalled(
            "请先安装 husky: npx husky-init && npm install".to_string(),
        )
        .into());
    }
    let hooks_dir = husky_dir.join(HUSKY_HOOKS_SUBDIR);
    if !hooks_dir.is_dir() {
        return Err(AppError::HuskyNotInstalled(
            "缺少 .husky/_ 目录，请重新安装 husky: npx husky-init && npm install".to_string(),
        )
        .into());
    }
    Ok(hooks_dir)
}

pub async fn install_husky_hook(hooks_dir: &Path, hook: &str) -> Result<HookStatus> {
    let hook_path = hooks_dir.join(hook);
    let status = check_hook_status(&hook_path, hook).await?;
    match status {
        HookStatus::NotInstalled => {
            return Err(AppError::HookFileMissing(hook_path).into());
        }
        HookStatus::InstalledByUs => {
            log::info!("{} already contains coas, skipping", hook_path.display());
        }
        HookStatus::InstalledByOther => {
            let existing = fs::read_to_string(&hook_path).await?;
            write_executable(&hook_path, &insert_after_first_line(&existing, hook)).await?;
        }
    }
    Ok(status)
}

pub async fn install_husky_hooks(project_root: &Path) -> Result<PathBuf> {
    let hooks_dir = husky_hooks_dir(project_root)?;
    for hook in HOOK_NAMES {
        let status = install_husky_hook(&hooks_dir, hook).await?;
        report(&hooks_dir.join(hook), &status);
    }
    Ok(hooks_dir)
}

fn report(hook_path: &Path, status: &HookStatus) {
    match status {
        HookStatus::InstalledByUs => {
            println!("✅ {} 已包含 coas 命令，跳过。", hook_path.display())
        }
        HookStatus::InstalledByOther => {
            println!("✅ 已将 coas 命令添加到现有钩子: {}", hook_path.display())
        }
        HookStatus::NotInstalled => {
            println!("✅ 钩子安装成功，位置: {}", hook_path.display())
        }
    }
}
