//! 数据类型定义

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::DecodeFailure;
use crate::protocol::NodeInfo;

/// Roster 中的一个 agent 端点
///
/// 从 hypivisor 拿到后不再修改，生命周期为一次巡检。
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Endpoint {
    pub id: String,
    pub machine: String,
    /// pi-socket 端口
    pub port: u16,
    pub working_directory: String,
    pub status_tag: String,
}

impl From<NodeInfo> for Endpoint {
    fn from(node: NodeInfo) -> Self {
        Self {
            id: node.id,
            machine: node.machine,
            port: node.port,
            working_directory: node.cwd,
            status_tag: node.status,
        }
    }
}

/// 巡检失败原因
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum FailureReason {
    /// 超时或连接失败
    #[serde(rename = "no response")]
    NoResponse,
    /// 载荷无法解码
    #[serde(rename = "unparseable")]
    Unparseable,
}

impl From<DecodeFailure> for FailureReason {
    fn from(failure: DecodeFailure) -> Self {
        match failure {
            DecodeFailure::Unparseable => FailureReason::Unparseable,
        }
    }
}

impl fmt::Display for FailureReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FailureReason::NoResponse => write!(f, "no response"),
            FailureReason::Unparseable => write!(f, "unparseable"),
        }
    }
}

/// 会话摘要（Summarizer 的产出）
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ConversationSummary {
    pub total_messages: usize,
    pub user_message_count: usize,
    pub assistant_message_count: usize,
    pub streaming: bool,
    /// 最后一条有实质内容的用户消息（≤200 字符）
    pub last_user_text: String,
    /// 最后一条助手消息的文本（≤200 字符，可能为空）
    pub last_assistant_text: String,
    /// 最后一条助手消息中的工具调用名
    pub last_tool_names: Vec<String>,
}

/// 巡检结果：要么是错误，要么是完整摘要，不会两者兼有
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Outcome {
    Failed { error: FailureReason },
    Summarized(ConversationSummary),
}

/// 单个 agent 的巡检记录
///
/// 身份字段无论是否可达都会填充。
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AgentSummary {
    pub id: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub machine: String,
    #[serde(rename = "address")]
    pub port: u16,
    pub working_directory: String,
    pub project_name: String,
    pub status_tag: String,
    #[serde(flatten)]
    pub outcome: Outcome,
}

impl AgentSummary {
    /// 失败原因（成功时为 None）
    pub fn error(&self) -> Option<FailureReason> {
        match self.outcome {
            Outcome::Failed { error } => Some(error),
            Outcome::Summarized(_) => None,
        }
    }

    /// 会话摘要（失败时为 None）
    pub fn summary(&self) -> Option<&ConversationSummary> {
        match &self.outcome {
            Outcome::Failed { .. } => None,
            Outcome::Summarized(summary) => Some(summary),
        }
    }
}
