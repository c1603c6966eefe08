//! hypi-agent-status - pi agent 巡检工具
//!
//! 向 hypivisor 获取已注册 agent 列表，再逐个连接各 agent 的 pi-socket，
//! 从 init_state 中提取会话摘要，输出表格或 JSON。
//!
//! # 核心功能
//!
//! - **Roster 获取**: hypivisor init 事件 → 端点列表
//! - **Agent 巡检**: 每个端点一次短连接，超时即记为无响应
//! - **会话摘要**: 消息计数、最后的用户/助手消息、工具调用、流式状态
//! - **容错汇总**: 单个 agent 失败只记录在自己的结果里，不影响其他
//!
//! # 架构
//!
//! ```text
//! report::run → roster::fetch_roster → [inspector::inspect × N] → render
//!                      ↓                        ↓
//!               client::Channel  →  sanitize::decode  →  summary::summarize
//! ```

pub mod client;
pub mod config;
pub mod error;
pub mod inspector;
pub mod protocol;
pub mod report;
pub mod roster;
pub mod sanitize;
pub mod summary;
pub mod types;

// Re-exports
pub use client::{Channel, ChannelConfig, WsChannel};
pub use config::{InspectConfig, OutputFormat};
pub use error::{DecodeFailure, Error, Result};
pub use inspector::inspect;
pub use report::{filter_by_cwd, inspect_all, render_json, render_table, run};
pub use roster::fetch_roster;
pub use types::*;
