//! 事件分类 - 判断解码后的消息属于哪种领域事件
//!
//! 按固定优先级依次尝试：
//! 1. 含 `AlarmName` → CloudWatch 告警
//! 2. `source == "aws.codepipeline"` → CodePipeline 执行状态变更
//! 3. 其他 → `Unrecognized`，由调用方按配置决定跳过还是失败

pub mod alarm;
pub mod pipeline;

pub use alarm::{AlarmEvent, AlarmState, AlarmTrigger};
pub use pipeline::{FailedAction, PipelineEvent, PipelineState};

use crate::envelope::DecodedNotification;

/// CodePipeline 事件的 `source` 值
pub const PIPELINE_EVENT_SOURCE: &str = "aws.codepipeline";

/// 分类结果
#[derive(Debug, Clone, PartialEq)]
pub enum ClassifiedEvent {
    Alarm(AlarmEvent),
    Pipeline(PipelineEvent),
    /// 无法识别，附带原因
    Unrecognized { reason: String },
}

impl ClassifiedEvent {
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Alarm(_) => "alarm",
            Self::Pipeline(_) => "pipeline",
            Self::Unrecognized { .. } => "unrecognized",
        }
    }
}

/// 对一条解码后的通知进行分类和字段映射
pub fn classify(notification: &DecodedNotification) -> ClassifiedEvent {
    let message = &notification.message;

    if message.get("AlarmName").is_some() {
        let alarm =
            AlarmEvent::from_message(message, &notification.timestamp, &notification.subject);
        return match alarm {
            Ok(alarm) => ClassifiedEvent::Alarm(alarm),
            Err(e) => ClassifiedEvent::Unrecognized {
                reason: format!("{:#}", e),
            },
        };
    }

    if message.get("source").and_then(|v| v.as_str()) == Some(PIPELINE_EVENT_SOURCE) {
        return match PipelineEvent::from_message(message, &notification.timestamp) {
            Ok(pipeline) => ClassifiedEvent::Pipeline(pipeline),
            Err(e) => ClassifiedEvent::Unrecognized {
                reason: format!("{:#}", e),
            },
        };
    }

    let reason = match message.get("source").and_then(|v| v.as_str()) {
        Some(source) => format!("unsupported event source '{}'", source),
        None if message.is_object() => "message has neither AlarmName nor source".to_string(),
        None => "message is not a JSON object".to_string(),
    };
    ClassifiedEvent::Unrecognized { reason }
}
