//! 测试用的 WebSocket 服务端
//!
//! 在 127.0.0.1 的随机端口上模拟 hypivisor / pi-socket：
//! 每个连接握手后按预设行为回复，然后等待客户端关闭。

#![allow(dead_code)]

use std::time::Duration;

use futures_util::{SinkExt, StreamExt};
use tokio::net::TcpListener;
use tokio::sync::mpsc;
use tokio_tungstenite::tungstenite::handshake::server::{ErrorResponse, Request, Response};
use tokio_tungstenite::tungstenite::Message;

/// 服务端对每个连接的行为
#[derive(Debug, Clone)]
pub enum Reply {
    /// 发送一条文本消息
    Text(String),
    /// 发送一条二进制消息
    Binary(Vec<u8>),
    /// 不发送任何数据直接关闭
    Close,
    /// 保持连接但从不发送
    Silent,
    /// 发送一条文本消息后停止读写，不回应关闭握手
    TextThenStall(String),
}

/// 启动服务端，返回端口
pub async fn spawn_server(reply: Reply) -> u16 {
    spawn_recording_server(reply).await.0
}

/// 启动服务端，同时返回每次握手请求的 URI
pub async fn spawn_recording_server(reply: Reply) -> (u16, mpsc::UnboundedReceiver<String>) {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let port = listener.local_addr().unwrap().port();
    let (uri_tx, uri_rx) = mpsc::unbounded_channel();

    tokio::spawn(async move {
        while let Ok((stream, _)) = listener.accept().await {
            let reply = reply.clone();
            let uri_tx = uri_tx.clone();
            tokio::spawn(async move {
                let callback = move |req: &Request, resp: Response| -> Result<Response, ErrorResponse> {
                    let _ = uri_tx.send(req.uri().to_string());
                    Ok(resp)
                };
                let Ok(mut ws) = tokio_tungstenite::accept_hdr_async(stream, callback).await else {
                    return;
                };

                match reply {
                    Reply::Text(text) => {
                        let _ = ws.send(Message::text(text)).await;
                    }
                    Reply::Binary(bytes) => {
                        let _ = ws.send(Message::binary(bytes)).await;
                    }
                    Reply::Close => {
                        let _ = ws.close(None).await;
                    }
                    Reply::Silent => {
                        tokio::time::sleep(Duration::from_secs(30)).await;
                    }
                    Reply::TextThenStall(text) => {
                        let _ = ws.send(Message::text(text)).await;
                        tokio::time::sleep(Duration::from_secs(30)).await;
                    }
                }

                // 等待客户端断开
                while let Some(Ok(_)) = ws.next().await {}
            });
        }
    });

    (port, uri_rx)
}

/// 获取一个当前没有服务监听的端口
pub fn unused_port() -> u16 {
    let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
    listener.local_addr().unwrap().port()
}

/// 生成 hypivisor init 事件
pub fn roster_json(nodes: &[(&str, u16, &str)]) -> String {
    let nodes: Vec<serde_json::Value> = nodes
        .iter()
        .map(|(id, port, cwd)| {
            serde_json::json!({
                "id": id,
                "machine": "",
                "port": port,
                "cwd": cwd,
                "status": "active"
            })
        })
        .collect();
    serde_json::json!({ "event": "init", "nodes": nodes }).to_string()
}
