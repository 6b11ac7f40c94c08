//! src/cli.rs
use clap::{Parser, Subcommand};

/// 记录每次 Git 提交，并用 AI 生成提交信息和周报的 CLI 工具
#[derive(Parser, Debug)]
#[command(name = "coas", author, version, about, long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// 初始化：配置 Gemini API key、创建数据库、安装全局 git 钩子
    Setup,

    /// AI生成暂存空间内的git commit 信息并commit
    #[command(alias = "c")]
    Commit {
        /// 自动暂存所有已跟踪的文件修改，等同于`git add -u`操作
        #[arg(short, long)]
        all: bool,
    },

    /// [Internal] 记录暂存区的 diff 和仓库信息，由 pre-commit 钩子调用
    #[command(hide = true)]
    PreCommit,

    /// [Internal] 回填最终的提交信息，由 post-commit 钩子调用
    #[command(hide = true)]
    PostCommit,

    /// 把 coas 命令写入项目的 husky 钩子
    SetupHusky,

    /// AI生成本周工作总结
    #[command(alias = "s")]
    Summary {
        /// 开始日期 (如 "2024-05-13")，默认本周一
        #[arg(long)]
        since: Option<String>,

        /// 结束日期，默认今天
        #[arg(long)]
        until: Option<String>,
    },
}
