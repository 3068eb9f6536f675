//! 信封解码 - SQS record → SNS envelope → 领域事件 JSON
//!
//! 每条 SQS record 的 `body` 是 SNS 通知 envelope 的 JSON 文本，
//! envelope 的 `Message` 字段又是一段 JSON 文本（告警或流水线事件）。
//! 任何一层解析失败都会让整批处理失败，不做部分恢复。

use anyhow::{anyhow, Context, Result};
use aws_lambda_events::event::sqs::SqsEvent;
use serde::Deserialize;
use serde_json::Value;
use tracing::debug;

/// SNS 通知 envelope（只保留需要的字段）
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct SnsEnvelope {
    /// 领域事件 JSON 文本
    pub message: String,
    /// SNS 发布时间（ISO-8601）
    pub timestamp: String,
    /// 主题行，流水线通知没有
    #[serde(default)]
    pub subject: Option<String>,
    #[serde(default)]
    pub message_id: Option<String>,
}

/// 解码后的一条通知
#[derive(Debug, Clone, PartialEq)]
pub struct DecodedNotification {
    /// 领域事件原始 JSON
    pub message: Value,
    /// envelope 时间戳
    pub timestamp: String,
    /// envelope 主题（缺失时为空字符串）
    pub subject: String,
}

/// 解码一条 SQS record body
pub fn decode_body(body: &str) -> Result<DecodedNotification> {
    let envelope: SnsEnvelope =
        serde_json::from_str(body).context("record body is not a valid SNS envelope")?;

    let message: Value = serde_json::from_str(&envelope.message).with_context(|| {
        format!(
            "SNS message {} is not valid JSON",
            envelope.message_id.as_deref().unwrap_or("<unknown>")
        )
    })?;

    Ok(DecodedNotification {
        message,
        timestamp: envelope.timestamp,
        subject: envelope.subject.unwrap_or_default(),
    })
}

/// 解码整批 SQS 事件，按输入顺序返回
pub fn decode_batch(event: &SqsEvent) -> Result<Vec<DecodedNotification>> {
    event
        .records
        .iter()
        .enumerate()
        .map(|(index, record)| {
            let message_id = record.message_id.as_deref().unwrap_or("<unknown>");
            let body = record
                .body
                .as_deref()
                .ok_or_else(|| anyhow!("record {} ({}) has no body", index, message_id))?;

            debug!(index, message_id, "Decoding SQS record");
            decode_body(body).with_context(|| format!("record {} ({})", index, message_id))
        })
        .collect()
}
