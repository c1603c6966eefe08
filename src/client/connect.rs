//! 单次接收的连接逻辑
//!
//! 每次调用建立一个新连接：握手 → 等待第一条数据消息 → 关闭。
//! 不复用连接，不重试。

use std::future::Future;
use std::time::Duration;

use anyhow::{Context, Result};
use futures_util::StreamExt;
use tokio::time::timeout;
use tokio_tungstenite::tungstenite::protocol::WebSocketConfig;
use tokio_tungstenite::tungstenite::Message;
use tokio_tungstenite::connect_async_with_config;

use crate::config::{InspectConfig, DEFAULT_MAX_MESSAGE_SIZE};

/// 关闭握手的最长等待
const CLOSE_GRACE: Duration = Duration::from_millis(500);

/// 消息通道
///
/// 超时、连接失败、对端先关闭都归一为 `None`：对调用方而言这是
/// “不可达”这一正常结果，而不是错误。
pub trait Channel {
    /// 连接 `url`，在 `timeout` 内接收第一条消息
    fn receive_one(&self, url: &str, timeout: Duration) -> impl Future<Output = Option<String>>;
}

/// Channel 配置
#[derive(Debug, Clone)]
pub struct ChannelConfig {
    /// 单条消息上限（字节）
    pub max_message_size: usize,
}

impl Default for ChannelConfig {
    fn default() -> Self {
        Self {
            max_message_size: DEFAULT_MAX_MESSAGE_SIZE,
        }
    }
}

impl From<&InspectConfig> for ChannelConfig {
    fn from(config: &InspectConfig) -> Self {
        Self {
            max_message_size: config.max_message_size,
        }
    }
}

/// 基于 tokio-tungstenite 的 Channel
#[derive(Debug, Clone, Default)]
pub struct WsChannel {
    config: ChannelConfig,
}

impl WsChannel {
    /// 创建 Channel
    pub fn new(config: ChannelConfig) -> Self {
        Self { config }
    }

    fn ws_config(&self) -> WebSocketConfig {
        let mut ws_config = WebSocketConfig::default();
        ws_config.max_message_size = Some(self.config.max_message_size);
        ws_config.max_frame_size = Some(self.config.max_message_size);
        ws_config
    }

    /// 建立连接并读取第一条数据消息
    ///
    /// 只有连接和读取受 `wait` 约束；关闭握手在超时之外进行，
    /// 已经收到的消息不会因为关闭缓慢而丢失。
    async fn recv_first(&self, url: &str, wait: Duration) -> Result<Option<String>> {
        let (mut ws, payload) = timeout(wait, async {
            let (mut ws, _) = connect_async_with_config(url, Some(self.ws_config()), false)
                .await
                .with_context(|| format!("连接 {} 失败", url))?;

            let mut payload = None;
            while let Some(msg) = ws.next().await {
                match msg.context("读取消息失败")? {
                    Message::Text(text) => {
                        payload = Some(text.to_string());
                        break;
                    }
                    Message::Binary(bytes) => {
                        payload = Some(String::from_utf8_lossy(&bytes).into_owned());
                        break;
                    }
                    Message::Close(_) => break,
                    // ping/pong 由 tungstenite 自动处理，继续等待
                    _ => continue,
                }
            }

            anyhow::Ok((ws, payload))
        })
        .await
        .with_context(|| format!("等待 {} 超时 ({:?})", url, wait))??;

        if timeout(CLOSE_GRACE, ws.close(None)).await.is_err() {
            tracing::debug!("{} 关闭握手超时", url);
        }

        Ok(payload)
    }
}

impl Channel for WsChannel {
    async fn receive_one(&self, url: &str, timeout: Duration) -> Option<String> {
        match self.recv_first(url, timeout).await {
            Ok(Some(payload)) if !payload.is_empty() => {
                tracing::debug!("📨 {} 返回 {} 字节", url, payload.len());
                Some(payload)
            }
            Ok(_) => {
                tracing::debug!("{} 未返回数据即关闭", url);
                None
            }
            Err(e) => {
                tracing::debug!("{} 无响应: {:#}", url, e);
                None
            }
        }
    }
}
