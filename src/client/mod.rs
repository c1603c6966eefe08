//! Channel Client 模块
//!
//! 连接一个 WebSocket 地址，只接收第一条消息，然后断开

mod connect;

pub use connect::{Channel, ChannelConfig, WsChannel};
