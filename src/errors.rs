//! src/errors.rs

use std::path::PathBuf;
use thiserror::Error;

/// 需要让用户看到的已知错误。其余错误直接用 anyhow 向上传递。
#[derive(Debug, Error)]
pub enum AppError {
    #[error("当前目录不是一个有效的 Git 仓库。")]
    NotAGitRepo,

    #[error("没有发现暂存的修改，请先 git add。")]
    NoStagedChanges,

    #[error("Husky 未安装: {0}")]
    HuskyNotInstalled(String),

    #[error("找不到 hook 文件: {}", .0.display())]
    HookFileMissing(PathBuf),

    #[error("数据库不存在: {}，请先运行 `coas setup`。", .0.display())]
    DatabaseNotFound(PathBuf),

    #[error("找不到提交信息文件: {}", .0.display())]
    CommitMessageNotFound(PathBuf),

    #[error("API key 不能为空，设置已取消。")]
    EmptyApiKey,

    #[error("未配置 Gemini API key，请运行 `coas setup` 或设置 GEMINI_API_KEY。")]
    MissingApiKey,

    #[error("数据库初始化已被用户取消。")]
    SetupCancelled,

    #[error("commits 表中没有任何记录，无法回填提交信息。")]
    EmptyStore,
}
