//! 读取本地保存的 SQS 事件文件
//!
//! 支持两种格式：
//! 1. Lambda 收到的原始事件 `{"Records": [...]}`
//! 2. 日志里抓取的包装格式 `{"message": {"Records": [...]}}`

use anyhow::{Context, Result};
use aws_lambda_events::event::sqs::SqsEvent;
use serde_json::Value;
use std::fs;
use std::path::Path;

/// 从 JSON 值中取出 SQS 事件
pub fn sqs_event_from_value(value: Value) -> Result<SqsEvent> {
    let event = match value {
        Value::Object(mut map) if !map.contains_key("Records") && map.contains_key("message") => {
            map.remove("message").unwrap_or_default()
        }
        other => other,
    };
    serde_json::from_value(event).context("file does not contain an SQS event")
}

/// 读取 SQS 事件文件
pub fn load_sqs_event(path: &Path) -> Result<SqsEvent> {
    let content = fs::read_to_string(path)
        .with_context(|| format!("failed to read {}", path.display()))?;
    let value: Value = serde_json::from_str(&content)
        .with_context(|| format!("{} is not valid JSON", path.display()))?;
    sqs_event_from_value(value)
}
