//! Slack Webhook 客户端模块
//!
//! 把 `ChatMessage` 以 JSON POST 到 incoming webhook。不做重试。

use anyhow::{anyhow, Context, Result};
use reqwest::Client;
use std::future::Future;
use std::time::Duration;

use super::channel::{ChatSink, SinkResponse};
use super::formatter::ChatMessage;

/// Webhook 客户端配置
#[derive(Debug, Clone)]
pub struct WebhookConfig {
    /// Webhook URL (如 https://hooks.slack.com/services/...)
    pub url: String,
    /// 超时时间 (秒)
    pub timeout_secs: u64,
}

impl WebhookConfig {
    pub fn new(url: impl Into<String>, timeout_secs: u64) -> Self {
        Self {
            url: url.into(),
            timeout_secs,
        }
    }
}

/// Slack incoming webhook sink
#[derive(Debug, Clone)]
pub struct WebhookSink {
    client: Client,
    config: WebhookConfig,
}

impl WebhookSink {
    /// 创建新的 Webhook 客户端
    pub fn new(config: WebhookConfig) -> Result<Self> {
        if config.url.trim().is_empty() {
            return Err(anyhow!("webhook url is required"));
        }

        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .context("Failed to create HTTP client")?;

        Ok(Self { client, config })
    }

    pub fn url(&self) -> &str {
        &self.config.url
    }
}

impl ChatSink for WebhookSink {
    fn name(&self) -> &str {
        "slack-webhook"
    }

    fn post(&self, message: &ChatMessage) -> impl Future<Output = Result<SinkResponse>> + Send {
        async move {
            let response = self
                .client
                .post(&self.config.url)
                .json(message)
                .send()
                .await
                .context("webhook request failed")?;

            let status = response.status().as_u16();
            let body = response.text().await.unwrap_or_default();

            Ok(SinkResponse { status, body })
        }
    }
}
