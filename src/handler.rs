//! 批处理入口 - 解码、分类、附加图表、转发
//!
//! 整批解码和分类完成后，告警和流水线事件各转发一次。

use anyhow::{bail, Result};
use aws_lambda_events::event::sqs::SqsEvent;
use serde::Serialize;
use tracing::{info, warn};

use crate::chart::{AlarmChartSource, MetricChartClient};
use crate::config::{BridgeConfig, UnrecognizedPolicy};
use crate::envelope::decode_batch;
use crate::event::{classify, AlarmEvent, ClassifiedEvent, PipelineEvent};
use crate::notification::{ChatSink, Forwarder, SendResult, WebhookSink};

/// 分类完成、尚未发送的一批事件
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PreparedBatch {
    pub records: usize,
    pub alarms: Vec<AlarmEvent>,
    pub pipelines: Vec<PipelineEvent>,
    pub unrecognized: usize,
}

/// 一批的处理结果
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BatchReport {
    pub records: usize,
    pub alarms: usize,
    pub pipelines: usize,
    pub unrecognized: usize,
    pub charts_attached: usize,
    pub alarm_delivery: SendResult,
    pub pipeline_delivery: SendResult,
}

/// 解码并分类整批事件，不做任何网络调用
pub fn prepare_batch(event: &SqsEvent, policy: UnrecognizedPolicy) -> Result<PreparedBatch> {
    let decoded = decode_batch(event)?;
    let mut batch = PreparedBatch {
        records: decoded.len(),
        ..Default::default()
    };

    for (index, notification) in decoded.iter().enumerate() {
        match classify(notification) {
            ClassifiedEvent::Alarm(alarm) => batch.alarms.push(alarm),
            ClassifiedEvent::Pipeline(pipeline) => batch.pipelines.push(pipeline),
            ClassifiedEvent::Unrecognized { reason } => match policy {
                UnrecognizedPolicy::Skip => {
                    warn!(index, reason = %reason, "Skipping unrecognized notification");
                    batch.unrecognized += 1;
                }
                UnrecognizedPolicy::Fail => {
                    bail!("record {} is not a recognized notification: {}", index, reason);
                }
            },
        }
    }

    Ok(batch)
}

/// 通知处理器
pub struct NotificationHandler<S = WebhookSink, C = MetricChartClient> {
    forwarder: Forwarder<S>,
    charts: Option<C>,
    policy: UnrecognizedPolicy,
}

impl NotificationHandler<WebhookSink, MetricChartClient> {
    /// 根据配置创建（配置了 bucket 时才加载 AWS 凭证）
    pub async fn from_config(config: &BridgeConfig) -> Result<Self> {
        let forwarder = Forwarder::from_config(config)?;
        let charts = match &config.alarm_image_bucket {
            Some(bucket) => Some(MetricChartClient::from_env(bucket.clone()).await),
            None => None,
        };

        Ok(Self::new(forwarder, charts, config.unrecognized_policy))
    }
}

impl<S: ChatSink, C: AlarmChartSource> NotificationHandler<S, C> {
    pub fn new(forwarder: Forwarder<S>, charts: Option<C>, policy: UnrecognizedPolicy) -> Self {
        Self {
            forwarder,
            charts,
            policy,
        }
    }

    pub fn forwarder(&self) -> &Forwarder<S> {
        &self.forwarder
    }

    /// 处理一批 SQS 事件
    pub async fn handle(&self, event: &SqsEvent) -> Result<BatchReport> {
        let batch = prepare_batch(event, self.policy)?;
        info!(
            records = batch.records,
            alarms = batch.alarms.len(),
            pipelines = batch.pipelines.len(),
            unrecognized = batch.unrecognized,
            "Classified notification batch"
        );

        let (alarms, charts_attached) = self.attach_charts(batch.alarms).await;

        let alarm_delivery = self.forwarder.forward_alarms(&alarms).await;
        let pipeline_delivery = self.forwarder.forward_pipelines(&batch.pipelines).await;

        Ok(BatchReport {
            records: batch.records,
            alarms: alarms.len(),
            pipelines: batch.pipelines.len(),
            unrecognized: batch.unrecognized,
            charts_attached,
            alarm_delivery,
            pipeline_delivery,
        })
    }

    /// 为告警附加图表；失败的告警保持无图片
    async fn attach_charts(&self, alarms: Vec<AlarmEvent>) -> (Vec<AlarmEvent>, usize) {
        let Some(charts) = &self.charts else {
            return (alarms, 0);
        };

        let mut attached = 0;
        let mut result = Vec::with_capacity(alarms.len());
        for alarm in alarms {
            match charts.render(&alarm).await {
                Ok(image) => {
                    info!(
                        alarm = %alarm.alarm_name,
                        expires_at = %image.expires_at,
                        "Attached alarm chart"
                    );
                    attached += 1;
                    result.push(alarm.with_image_url(image.url));
                }
                Err(e) => {
                    warn!(
                        alarm = %alarm.alarm_name,
                        error = %format!("{:#}", e),
                        "Failed to create alarm image"
                    );
                    result.push(alarm);
                }
            }
        }
        (result, attached)
    }
}
