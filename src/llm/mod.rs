//! src/llm/mod.rs

use anyhow::Result;
use async_trait::async_trait;

pub mod gemini;

pub use gemini::GeminiClient;

/// The `LLMClient` trait defines the interface for a Large Language Model client.
#[async_trait]
pub trait LLMClient: Send + Sync {
    /// Returns the name of the LLM client.
    fn name(&self) -> &str;
    /// Calls the LLM with a user prompt and returns the generated response.
    async fn call(&self, user_prompt: &str) -> Result<String>;
}

/// 生成结果。服务端失败不会作为 `Err` 向上传递。
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Generated {
    Text(String),
    /// 输入为空，没有调用模型。
    NothingToSummarize,
    Failed(String),
}

pub const NOTHING_TO_SUMMARIZE: &str = "No commits were made this week.";

async fn generate(client: &dyn LLMClient, input: &str, prompt: String, what: &str) -> Generated {
    if input.trim().is_empty() {
        return Generated::NothingToSummarize;
    }

    log::debug!("calling {} for {what} ({} bytes)", client.name(), prompt.len());
    match client.call(&prompt).await {
        Ok(text) if !text.trim().is_empty() => Generated::Text(text.trim().to_string()),
        Ok(_) => Generated::Failed(format!("{} 返回了空内容", client.name())),
        Err(e) => {
            log::warn!("{what} failed: {e:#}");
            Generated::Failed(format!("Error generating {what}: {e:#}"))
        }
    }
}

pub async fn generate_commit_message(client: &dyn LLMClient, diff: &str) -> Generated {
    let prompt = format!(
        r#"As a Git commit message generator, analyze the following code changes and create a clear,
concise commit message following these rules:
1. Start with a type prefix (feat, fix, docs, style, refactor, test, chore)
2. Keep the first line under 50 characters
3. Use the imperative mood ("add" not "added")
4. Focus on the "what" and "why", not the "how"
5. If needed, add detailed explanation after a blank line
6. Return plain text only, without markdown fences

Here are the code changes:

{diff}
"#
    );

    match generate(client, diff, prompt, "commit message").await {
        Generated::Text(text) => Generated::Text(strip_fences(&text)),
        other => other,
    }
}

pub async fn generate_weekly_summary(client: &dyn LLMClient, digest: &str) -> Generated {
    let prompt = format!(
        r#"Below is the list of Git commits made this week. Summarize the work done by repo during the week:
{digest}
Use Chinese and return markdown in the format below. The percentage is calculated from the number of added lines:
- repo_name: works [percentage]
- repo_name: works [percentage]
"#
    );

    generate(client, digest, prompt, "weekly summary").await
}

/// 模型偶尔会用 ``` 包住回复，去掉它。
fn strip_fences(text: &str) -> String {
    let trimmed = text.trim();
    if !trimmed.starts_with("```") {
        return trimmed.to_string();
    }
    trimmed
        .lines()
        .filter(|line| !line.trim_start().starts_with("```"))
        .collect::<Vec<_>>()
        .join("\n")
        .trim()
        .to_string()
}
