//! 聊天消息 sink trait 定义

use anyhow::Result;
use serde::Serialize;
use std::future::Future;

use super::formatter::ChatMessage;

/// Sink 的 HTTP 响应
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SinkResponse {
    pub status: u16,
    pub body: String,
}

impl SinkResponse {
    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }
}

/// 发送结果
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "result", content = "detail", rename_all = "snake_case")]
pub enum SendResult {
    /// 发送成功
    Sent,
    /// 跳过（未配置 sink 或没有可发送的记录）
    Skipped(String),
    /// 发送失败
    Failed(String),
}

/// 聊天 sink trait
///
/// 一次调用对应一次 POST；非 2xx 响应不是 `Err`，由调用方根据
/// `SinkResponse` 判断。只有传输层错误才返回 `Err`。
pub trait ChatSink: Send + Sync {
    /// sink 名称（用于日志）
    fn name(&self) -> &str;

    /// 发送一条消息
    fn post(&self, message: &ChatMessage) -> impl Future<Output = Result<SinkResponse>> + Send;
}
