use super::{ensure_api_key, spinner};
use crate::config::Config;
use crate::db;
use crate::history;
use crate::llm::{generate_weekly_summary, GeminiClient, Generated, NOTHING_TO_SUMMARIZE};
use anyhow::{Context, Result};
use chrono::{Local, NaiveDate};
use colored::Colorize;
use std::path::Path;

fn parse_date(input: Option<&str>) -> Result<Option<NaiveDate>> {
    input
        .map(|s| {
            dateparser::parse(s)
                .map(|dt| dt.with_timezone(&Local).date_naive())
                .map_err(|e| anyhow::anyhow!("无法解析日期 `{s}`: {e}"))
        })
        .transpose()
}

/// 默认是本周一到今天；--since / --until 分别覆盖起止日期。
pub fn resolve_range(since: Option<&str>, until: Option<&str>) -> Result<(i64, i64)> {
    let (week_start, week_end) = history::current_week_range(Local::now());
    let start = parse_date(since)?.map_or(week_start, history::start_of_day);
    let end = parse_date(until)?.map_or(week_end, history::end_of_day);
    Ok((start, end))
}

fn format_local(ts: i64) -> String {
    chrono::TimeZone::timestamp_opt(&Local, ts, 0)
        .single()
        .map(|dt| dt.format("%Y-%m-%d %H:%M:%S").to_string())
        .unwrap_or_else(|| ts.to_string())
}

pub async fn handle_summary(
    config: &mut Config,
    config_path: &Path,
    config_dir: &Path,
    since: Option<String>,
    until: Option<String>,
) -> Result<()> {
    let (start, end) = resolve_range(since.as_deref(), until.as_deref())?;
    let db_path = config.db_path(config_dir);
    let conn = db::open_existing(&db_path)?;

    println!(
        "正在获取 {} 到 {} 之间的提交记录",
        format_local(start),
        format_local(end)
    );
    let commits =
        history::query_range(&conn, start, end).context("无法获取用于周报的提交记录。")?;

    let Some(digest) = history::format_digest(&commits) else {
        println!("{}", NOTHING_TO_SUMMARIZE.yellow());
        return Ok(());
    };
    println!("\n{}\n{digest}", "提交记录:".bold());

    ensure_api_key(config, config_path).await?;
    let client = GeminiClient::from_config(config)?;

    let progress_bar = spinner("🤖 正在生成周报...");
    let generated = generate_weekly_summary(&client, &digest).await;
    progress_bar.finish_and_clear();

    match generated {
        Generated::Text(summary) => {
            println!("\n{}\n", "=".repeat(60));
            println!("{}", "📝 本周工作总结:".green());
            println!("{}", "=".repeat(60));
            println!("{summary}");
        }
        Generated::NothingToSummarize => println!("{}", NOTHING_TO_SUMMARIZE.yellow()),
        Generated::Failed(reason) => {
            eprintln!("{}", reason.red());
            println!("{}", "生成周报失败。".yellow());
        }
    }
    Ok(())
}
