//! Roster 获取
//!
//! 从 hypivisor 的 init 事件中取出已注册节点。
//! hypivisor 不可达、载荷无法解码都得到空 roster，是否致命由调用方决定。

use std::time::Duration;

use crate::client::Channel;
use crate::protocol::RosterEvent;
use crate::sanitize::decode;
use crate::types::Endpoint;

/// 获取 roster
pub async fn fetch_roster<C: Channel>(channel: &C, url: &str, timeout: Duration) -> Vec<Endpoint> {
    let Some(raw) = channel.receive_one(url, timeout).await else {
        tracing::warn!("⚠️ hypivisor 无响应: {}", url);
        return Vec::new();
    };

    parse_roster(&raw)
}

/// 解析 init 事件，`nodes` 缺失时为空
pub fn parse_roster(raw: &str) -> Vec<Endpoint> {
    let event = decode(raw)
        .ok()
        .and_then(|value| serde_json::from_value::<RosterEvent>(value).ok());

    match event {
        Some(event) => {
            tracing::debug!("hypivisor 返回 {} 个节点", event.nodes.len());
            event.nodes.into_iter().map(Endpoint::from).collect()
        }
        None => {
            tracing::warn!("⚠️ hypivisor 返回的 init 事件无法解析");
            Vec::new()
        }
    }
}
