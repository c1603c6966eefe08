//! 巡检配置

use std::time::Duration;

use url::Url;

use crate::error::{Error, Result};

/// hypivisor 默认端口
pub const DEFAULT_HYPIVISOR_PORT: u16 = 31415;

/// 单次连接默认超时（秒）
pub const DEFAULT_TIMEOUT_SECS: u64 = 5;

/// 单条 WebSocket 消息上限：pi-socket 的 init_state 可能很大
pub const DEFAULT_MAX_MESSAGE_SIZE: usize = 2 * 1024 * 1024;

/// 默认并发巡检数
pub const DEFAULT_CONCURRENCY: usize = 8;

/// 输出格式
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum OutputFormat {
    /// 人类可读的表格
    #[default]
    Table,
    /// 2 空格缩进的 JSON 数组
    Json,
}

/// 巡检配置
#[derive(Debug, Clone)]
pub struct InspectConfig {
    /// hypivisor 与 agent 所在主机
    pub host: String,
    /// hypivisor 端口
    pub hypivisor_port: u16,
    /// 每次连接的超时
    pub timeout: Duration,
    /// 只保留 cwd 以此前缀开头的 agent（纯字符串前缀匹配）
    pub filter_cwd: Option<String>,
    /// hypivisor 鉴权 token（HYPI_TOKEN）
    pub token: Option<String>,
    /// 单条消息读取上限（字节）
    pub max_message_size: usize,
    /// 同时进行的 agent 巡检数，1 即逐个顺序巡检
    pub concurrency: usize,
    /// 输出格式
    pub format: OutputFormat,
}

impl Default for InspectConfig {
    fn default() -> Self {
        Self {
            host: "localhost".to_string(),
            hypivisor_port: DEFAULT_HYPIVISOR_PORT,
            timeout: Duration::from_secs(DEFAULT_TIMEOUT_SECS),
            filter_cwd: None,
            token: None,
            max_message_size: DEFAULT_MAX_MESSAGE_SIZE,
            concurrency: DEFAULT_CONCURRENCY,
            format: OutputFormat::Table,
        }
    }
}

impl InspectConfig {
    /// 从环境变量创建配置
    ///
    /// - `HYPIVISOR_PORT`: hypivisor 端口
    /// - `HYPI_TOKEN`: hypivisor 鉴权 token
    ///
    /// 无法解析的值会被忽略并保留默认值。
    pub fn from_env() -> Self {
        let mut config = Self::default();

        if let Ok(port) = std::env::var("HYPIVISOR_PORT") {
            match port.trim().parse::<u16>() {
                Ok(port) => config.hypivisor_port = port,
                Err(e) => tracing::warn!("忽略无效的 HYPIVISOR_PORT={:?}: {}", port, e),
            }
        }

        if let Ok(token) = std::env::var("HYPI_TOKEN") {
            if !token.is_empty() {
                config.token = Some(token);
            }
        }

        config
    }

    /// 设置 hypivisor 端口
    pub fn with_hypivisor_port(mut self, port: u16) -> Self {
        self.hypivisor_port = port;
        self
    }

    /// 设置超时
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// 设置 cwd 前缀过滤
    pub fn with_filter_cwd(mut self, prefix: impl Into<String>) -> Self {
        self.filter_cwd = Some(prefix.into());
        self
    }

    /// 设置 hypivisor token
    pub fn with_token(mut self, token: impl Into<String>) -> Self {
        self.token = Some(token.into());
        self
    }

    /// 设置并发数（至少为 1）
    pub fn with_concurrency(mut self, concurrency: usize) -> Self {
        self.concurrency = concurrency.max(1);
        self
    }

    /// 设置输出格式
    pub fn with_format(mut self, format: OutputFormat) -> Self {
        self.format = format;
        self
    }

    /// hypivisor WebSocket 地址：`ws://{host}:{port}/ws[?token=...]`
    pub fn hypivisor_url(&self) -> Result<Url> {
        let mut url = Url::parse(&format!("ws://{}:{}/ws", self.host, self.hypivisor_port))
            .map_err(|e| Error::Config(format!("无效的 hypivisor 地址: {}", e)))?;
        if let Some(token) = self.token.as_deref().filter(|t| !t.is_empty()) {
            url.query_pairs_mut().append_pair("token", token);
        }
        Ok(url)
    }

    /// agent（pi-socket）WebSocket 地址：`ws://{host}:{port}`
    pub fn agent_url(&self, port: u16) -> String {
        format!("ws://{}:{}", self.host, port)
    }
}
