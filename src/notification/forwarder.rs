//! 通知转发 - 每批同类事件构建一条消息并发送到 sink
//!
//! 未配置 sink 时不发起任何网络请求，直接返回 `SendResult::Skipped`。
//! sink 失败只记录日志（状态码 + 响应体），不向调用方返回错误。

use anyhow::Result;
use tracing::{debug, info, warn};

use super::channel::{ChatSink, SendResult};
use super::formatter::{alarm_message, pipeline_message, ChatMessage};
use super::webhook::{WebhookConfig, WebhookSink};
use crate::config::BridgeConfig;
use crate::event::{AlarmEvent, PipelineEvent};

/// 通知转发器
pub struct Forwarder<S = WebhookSink> {
    sink: Option<S>,
}

impl Forwarder<WebhookSink> {
    /// 根据配置创建；未配置 webhook 时返回禁用的转发器
    pub fn from_config(config: &BridgeConfig) -> Result<Self> {
        match &config.webhook_url {
            Some(url) => {
                info!(timeout_secs = config.webhook_timeout_secs, "Slack webhook configured");
                let sink = WebhookSink::new(WebhookConfig::new(
                    url.clone(),
                    config.webhook_timeout_secs,
                ))?;
                Ok(Self::new(sink))
            }
            None => {
                info!("SLACK_WEBHOOK_URL not set, notifications will not be forwarded");
                Ok(Self::disabled())
            }
        }
    }
}

impl<S: ChatSink> Forwarder<S> {
    pub fn new(sink: S) -> Self {
        Self { sink: Some(sink) }
    }

    /// 不发送任何消息的转发器
    pub fn disabled() -> Self {
        Self { sink: None }
    }

    pub fn is_enabled(&self) -> bool {
        self.sink.is_some()
    }

    pub fn sink(&self) -> Option<&S> {
        self.sink.as_ref()
    }

    /// 转发一批告警（一次 POST）
    pub async fn forward_alarms(&self, alarms: &[AlarmEvent]) -> SendResult {
        if self.sink.is_none() {
            return SendResult::Skipped("no webhook configured".to_string());
        }
        match alarm_message(alarms) {
            Some(message) => self.deliver("alarm", &message).await,
            None => SendResult::Skipped("no alarms in batch".to_string()),
        }
    }

    /// 转发一批流水线事件（一次 POST）
    pub async fn forward_pipelines(&self, pipelines: &[PipelineEvent]) -> SendResult {
        if self.sink.is_none() {
            return SendResult::Skipped("no webhook configured".to_string());
        }
        match pipeline_message(pipelines) {
            Some(message) => self.deliver("pipeline", &message).await,
            None => SendResult::Skipped("no pipeline events in batch".to_string()),
        }
    }

    async fn deliver(&self, kind: &str, message: &ChatMessage) -> SendResult {
        let Some(sink) = &self.sink else {
            return SendResult::Skipped("no webhook configured".to_string());
        };

        info!(
            sink = sink.name(),
            kind,
            attachments = message.attachments.len(),
            "Sending message to Slack"
        );
        debug!(body = %serde_json::to_string(message).unwrap_or_default(), "Slack message body");

        match sink.post(message).await {
            Ok(response) if response.is_success() => {
                debug!(status = response.status, "Slack accepted message");
                SendResult::Sent
            }
            Ok(response) => {
                warn!(
                    sink = sink.name(),
                    status = response.status,
                    body = %response.body,
                    "Slack rejected message"
                );
                SendResult::Failed(format!("HTTP {}: {}", response.status, response.body))
            }
            Err(e) => {
                warn!(sink = sink.name(), error = %e, "Slack request failed");
                SendResult::Failed(format!("{:#}", e))
            }
        }
    }
}
