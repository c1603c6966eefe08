//! 汇总与输出
//!
//! 流程：获取 roster → 过滤 → 并发巡检（保持 roster 顺序） → 渲染。
//! 各 agent 相互独立，某个 agent 超时或失败不会影响其他结果。

use futures_util::stream::{self, StreamExt};

use crate::client::Channel;
use crate::config::{InspectConfig, OutputFormat};
use crate::error::{Error, Result};
use crate::inspector::inspect;
use crate::roster::fetch_roster;
use crate::summary::truncate_chars;
use crate::types::{AgentSummary, Endpoint, Outcome};

/// 表格预览的最大字符数
const PREVIEW_WIDTH: usize = 80;

/// 无文本时的占位
const NO_TEXT: &str = "(no text)";

/// 项目名列宽
const PROJECT_WIDTH: usize = 20;

/// 执行一次完整巡检并渲染输出
///
/// roster 为空时返回 [`Error::NoAgents`]，这是唯一的致命情况。
pub async fn run<C: Channel>(channel: &C, config: &InspectConfig) -> Result<String> {
    let url = config.hypivisor_url()?;
    let roster = fetch_roster(channel, url.as_str(), config.timeout).await;
    if roster.is_empty() {
        return Err(Error::NoAgents);
    }

    let endpoints = match config.filter_cwd.as_deref() {
        Some(prefix) => filter_by_cwd(roster, prefix),
        None => roster,
    };

    tracing::info!("🔍 巡检 {} 个 agent (concurrency={})", endpoints.len(), config.concurrency);
    let results = inspect_all(channel, &endpoints, config).await;

    match config.format {
        OutputFormat::Json => render_json(&results),
        OutputFormat::Table => Ok(render_table(&results)),
    }
}

/// 只保留 cwd 以 `prefix` 开头的端点（纯字符串前缀，不做路径规范化）
pub fn filter_by_cwd(endpoints: Vec<Endpoint>, prefix: &str) -> Vec<Endpoint> {
    endpoints
        .into_iter()
        .filter(|e| e.working_directory.starts_with(prefix))
        .collect()
}

/// 巡检所有端点
///
/// 最多同时进行 `config.concurrency` 个；结果顺序与 `endpoints` 一致。
pub async fn inspect_all<C: Channel>(
    channel: &C,
    endpoints: &[Endpoint],
    config: &InspectConfig,
) -> Vec<AgentSummary> {
    stream::iter(endpoints)
        .map(|endpoint| inspect(channel, endpoint, config))
        .buffered(config.concurrency.max(1))
        .collect()
        .await
}

/// JSON 输出：2 空格缩进的数组 + 换行
pub fn render_json(results: &[AgentSummary]) -> Result<String> {
    let mut out = serde_json::to_string_pretty(results)?;
    out.push('\n');
    Ok(out)
}

/// 表格输出：按端口升序，每个 agent 一行
pub fn render_table(results: &[AgentSummary]) -> String {
    let mut sorted: Vec<&AgentSummary> = results.iter().collect();
    sorted.sort_by_key(|r| r.port);

    let mut out = String::new();
    for r in sorted {
        out.push_str(&render_row(r));
        out.push('\n');
    }
    out
}

fn render_row(r: &AgentSummary) -> String {
    let project = truncate_chars(&r.project_name, PROJECT_WIDTH);
    match &r.outcome {
        Outcome::Failed { error } => {
            format!("  :{}  {:<width$}  ☠️  {}", r.port, project, error, width = PROJECT_WIDTH)
        }
        Outcome::Summarized(summary) => {
            let status = if summary.streaming { "STREAMING" } else { "idle" };
            let text = if !summary.last_user_text.is_empty() {
                summary.last_user_text.as_str()
            } else if !summary.last_assistant_text.is_empty() {
                summary.last_assistant_text.as_str()
            } else {
                NO_TEXT
            };
            format!(
                "  :{}  {:<width$}  [{:<9}] {:>3} msgs  {}",
                r.port,
                project,
                status,
                summary.total_messages,
                preview(text),
                width = PROJECT_WIDTH
            )
        }
    }
}

/// 截断到 80 字符，超出时以 "..." 结尾
fn preview(text: &str) -> String {
    if text.chars().count() > PREVIEW_WIDTH {
        format!("{}...", truncate_chars(text, PREVIEW_WIDTH - 3))
    } else {
        text.to_string()
    }
}
