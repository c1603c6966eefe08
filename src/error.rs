//! 错误类型定义

use thiserror::Error;

/// 库错误类型
#[derive(Error, Debug)]
pub enum Error {
    /// Roster 为空（hypivisor 不可达或没有注册节点）
    #[error("No agents found (is hypivisor running?)")]
    NoAgents,

    /// IO 错误（写出结果失败）
    #[error("IO 错误: {0}")]
    Io(#[from] std::io::Error),

    /// 序列化错误
    #[error("序列化错误: {0}")]
    Serialization(#[from] serde_json::Error),

    /// 配置错误
    #[error("配置错误: {0}")]
    Config(String),
}

/// Result 类型别名
pub type Result<T> = std::result::Result<T, Error>;

/// 载荷解码失败
///
/// 调用方只按变体分支，不依赖 serde_json 的具体错误类型。
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum DecodeFailure {
    /// 清洗控制字符后仍不是合法 JSON，或结构不符合预期
    #[error("unparseable")]
    Unparseable,
}
