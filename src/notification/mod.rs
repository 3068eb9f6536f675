//! 通知层 - 构建 Slack 消息并发送到 webhook
//!
//! # 组成
//! 1. `formatter`：告警 / 流水线事件 → `ChatMessage`（颜色、emoji、字段、控制台链接）
//! 2. `channel`：`ChatSink` trait 与发送结果
//! 3. `webhook`：基于 reqwest 的 Slack incoming webhook sink
//! 4. `forwarder`：每批同类事件一次 POST；未配置 webhook 时不做任何网络调用
//!
//! # 使用示例
//! ```ignore
//! use notify_bridge::notification::Forwarder;
//!
//! let forwarder = Forwarder::from_config(&config)?;
//! let result = forwarder.forward_alarms(&alarms).await;
//! ```

pub mod channel;
pub mod formatter;
pub mod forwarder;
pub mod webhook;

pub use channel::{ChatSink, SendResult, SinkResponse};
pub use formatter::{alarm_message, pipeline_message, Attachment, AttachmentField, ChatMessage};
pub use forwarder::Forwarder;
pub use webhook::{WebhookConfig, WebhookSink};
