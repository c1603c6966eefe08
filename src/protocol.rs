//! 线上协议定义
//!
//! hypivisor 与 pi-socket 在连接建立后各自推送的第一条消息。
//! 两者都由外部定义、字段可能缺失，这里所有字段都带有明确的默认值：
//! 缺失字段与空值是两种不同情况，但都不是错误。

use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;

/// hypivisor 的 init 事件：`{"event": "init", "nodes": [...]}`
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RosterEvent {
    /// 事件名（通常为 "init"），不参与判断
    #[serde(default)]
    pub event: Option<String>,
    /// 已注册节点，缺失时视为空
    #[serde(default)]
    pub nodes: Vec<NodeInfo>,
}

/// hypivisor 注册的 pi agent 节点
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NodeInfo {
    #[serde(default)]
    pub id: String,
    /// 节点所在机器名
    #[serde(default)]
    pub machine: String,
    /// 工作目录
    #[serde(default)]
    pub cwd: String,
    /// pi-socket 端口（必填）
    pub port: u16,
    /// active / offline 等状态
    #[serde(default)]
    pub status: String,
}

/// pi-socket 的 init_state 事件
///
/// 只读取巡检需要的字段，其余（tools、truncated 等）忽略。
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct InitState {
    /// 按时间顺序的消息，缺失时视为空
    #[serde(default)]
    pub messages: Vec<AgentMessage>,
    /// 是否正在流式输出，缺失、null 或非布尔值时为 false
    #[serde(default, deserialize_with = "lenient_flag")]
    pub streaming: bool,
}

/// 单条会话消息
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AgentMessage {
    /// 非字符串（null、数字等）视为 `Other`
    #[serde(default, deserialize_with = "lenient_role")]
    pub role: Role,
    /// 缺失时等同于空文本
    #[serde(default)]
    pub content: Content,
}

/// 消息角色
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum Role {
    User,
    Assistant,
    /// toolResult 等其他角色，或缺失
    #[default]
    #[serde(other)]
    Other,
}

/// 消息内容：纯文本或内容块序列
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Content {
    Blocks(Vec<ContentBlock>),
    Text(String),
    /// 数字、对象、null 等非常规内容，提取文本时直接转成字符串
    Other(serde_json::Value),
}

/// 任意 JSON 值 → 角色：只认 "user" / "assistant"
fn lenient_role<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Role, D::Error> {
    let value = Option::<Value>::deserialize(deserializer)?;
    Ok(match value.as_ref().and_then(Value::as_str) {
        Some("user") => Role::User,
        Some("assistant") => Role::Assistant,
        _ => Role::Other,
    })
}

/// 任意 JSON 值 → 布尔：只有 `true` 为真
fn lenient_flag<'de, D: Deserializer<'de>>(deserializer: D) -> Result<bool, D::Error> {
    let value = Option::<Value>::deserialize(deserializer)?;
    Ok(matches!(value, Some(Value::Bool(true))))
}

impl Default for Content {
    fn default() -> Self {
        Content::Text(String::new())
    }
}

/// 内容块
///
/// 反序列化时接受任意 JSON 值，再收敛到这里的变体：
/// 非对象、缺少 `type`、未知 `type` 的块都归入 `Other`；
/// `text` / `name` 只取字符串值。单个异常块不会影响同一消息的其他块。
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "Value", into = "RawBlock")]
pub enum ContentBlock {
    Text { text: String },
    ToolUse { name: Option<String> },
    Other { kind: Option<String> },
}

#[derive(Debug, Clone, Default, Serialize)]
struct RawBlock {
    #[serde(rename = "type", skip_serializing_if = "Option::is_none")]
    kind: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    text: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    name: Option<String>,
}

impl From<Value> for ContentBlock {
    fn from(value: Value) -> Self {
        let field = |key: &str| value.get(key).and_then(Value::as_str).map(str::to_string);
        let kind = field("type");
        match kind.as_deref() {
            Some("text") => ContentBlock::Text {
                text: field("text").unwrap_or_default(),
            },
            Some("tool_use") => ContentBlock::ToolUse { name: field("name") },
            _ => ContentBlock::Other { kind },
        }
    }
}

impl From<ContentBlock> for RawBlock {
    fn from(block: ContentBlock) -> Self {
        match block {
            ContentBlock::Text { text } => RawBlock {
                kind: Some("text".to_string()),
                text: Some(text),
                name: None,
            },
            ContentBlock::ToolUse { name } => RawBlock {
                kind: Some("tool_use".to_string()),
                text: None,
                name,
            },
            ContentBlock::Other { kind } => RawBlock {
                kind,
                ..Default::default()
            },
        }
    }
}
