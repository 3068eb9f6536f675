//! Notify Bridge - 将 CloudWatch 告警和 CodePipeline 通知转发到 Slack
//!
//! SQS → SNS envelope → 告警 / 流水线事件 → Slack webhook

pub mod chart;
pub mod cli;
pub mod config;
pub mod envelope;
pub mod event;
pub mod handler;
pub mod notification;

pub use chart::{AlarmChartSource, ChartImage, MetricChartClient};
pub use config::{BridgeConfig, UnrecognizedPolicy};
pub use envelope::{decode_batch, decode_body, DecodedNotification};
pub use event::{
    classify, AlarmEvent, AlarmState, AlarmTrigger, ClassifiedEvent, FailedAction, PipelineEvent,
    PipelineState,
};
pub use handler::{prepare_batch, BatchReport, NotificationHandler, PreparedBatch};
pub use notification::{ChatMessage, ChatSink, Forwarder, SendResult, SinkResponse, WebhookSink};
