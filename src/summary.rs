//! 会话摘要
//!
//! 从 pi-socket 的 init_state 中提取：
//! - 消息总数、用户/助手消息数
//! - 最后一条有实质内容的用户消息
//! - 最后一条助手消息的文本和工具调用
//! - 是否正在流式输出

use serde_json::Value;

use crate::error::DecodeFailure;
use crate::protocol::{AgentMessage, Content, ContentBlock, InitState, Role};
use crate::types::ConversationSummary;

/// 扫描消息时的文本提取上限
pub const SCAN_TEXT_LIMIT: usize = 300;

/// 摘要字段的文本上限
pub const PREVIEW_LIMIT: usize = 200;

/// 用户消息文本长度不超过此值视为无实质内容（"ok"、"yes"、空的 tool 回显）
pub const TRIVIAL_TEXT_LEN: usize = 5;

/// 工具调用缺少 name 时的占位
const UNKNOWN_TOOL: &str = "?";

/// 从已解码的载荷生成摘要
///
/// 解码已失败时直接返回失败，不做字段提取。
pub fn summarize(decoded: Result<Value, DecodeFailure>) -> Result<ConversationSummary, DecodeFailure> {
    let value = decoded?;
    let state: InitState = serde_json::from_value(value).map_err(|e| {
        tracing::debug!("init_state 结构不符合预期: {}", e);
        DecodeFailure::Unparseable
    })?;
    Ok(summarize_state(&state))
}

/// 从 init_state 生成摘要
pub fn summarize_state(state: &InitState) -> ConversationSummary {
    let messages = &state.messages;

    let user_message_count = messages.iter().filter(|m| m.role == Role::User).count();
    let assistant_message_count = messages.iter().filter(|m| m.role == Role::Assistant).count();

    let last_user_text = messages
        .iter()
        .rev()
        .filter(|m| m.role == Role::User)
        .map(|m| extract_text(&m.content, SCAN_TEXT_LIMIT))
        .find(|text| text.chars().count() > TRIVIAL_TEXT_LEN)
        .map(|text| truncate_chars(&text, PREVIEW_LIMIT))
        .unwrap_or_default();

    // 助手消息不做实质内容过滤：倒序找到的第一条即为结果
    let (last_assistant_text, last_tool_names) = messages
        .iter()
        .rev()
        .find(|m| m.role == Role::Assistant)
        .map(|m: &AgentMessage| {
            let text = extract_text(&m.content, SCAN_TEXT_LIMIT);
            (truncate_chars(&text, PREVIEW_LIMIT), extract_tool_names(&m.content))
        })
        .unwrap_or_default();

    ConversationSummary {
        total_messages: messages.len(),
        user_message_count,
        assistant_message_count,
        streaming: state.streaming,
        last_user_text,
        last_assistant_text,
        last_tool_names,
    }
}

/// 提取消息文本
///
/// 内容块：拼接所有 text 块（空格分隔）；其他内容直接转成字符串。
/// 然后把换行折叠为空格、去掉首尾空白、截断到 `max_len` 个字符。
pub fn extract_text(content: &Content, max_len: usize) -> String {
    let joined = match content {
        Content::Blocks(blocks) => blocks
            .iter()
            .filter_map(|block| match block {
                ContentBlock::Text { text } => Some(text.as_str()),
                _ => None,
            })
            .collect::<Vec<_>>()
            .join(" "),
        Content::Text(text) => text.clone(),
        Content::Other(Value::Null) => String::new(),
        Content::Other(value) => value.to_string(),
    };

    let collapsed = joined.replace(['\r', '\n'], " ");
    truncate_chars(collapsed.trim(), max_len)
}

/// 提取工具调用名（按出现顺序）
pub fn extract_tool_names(content: &Content) -> Vec<String> {
    match content {
        Content::Blocks(blocks) => blocks
            .iter()
            .filter_map(|block| match block {
                ContentBlock::ToolUse { name } => {
                    Some(name.clone().unwrap_or_else(|| UNKNOWN_TOOL.to_string()))
                }
                _ => None,
            })
            .collect(),
        _ => Vec::new(),
    }
}

/// 按字符截断，保留前缀
pub fn truncate_chars(text: &str, max_len: usize) -> String {
    match text.char_indices().nth(max_len) {
        Some((idx, _)) => text[..idx].to_string(),
        None => text.to_string(),
    }
}
