//! 告警图表 - 渲染告警指标图并生成预签名 URL
//!
//! 流程：CloudWatch `GetMetricWidgetImage` 渲染 PNG → 上传 S3 →
//! 生成 7 天有效的 GET 预签名 URL。任何一步失败都返回 `Err`，
//! 由调用方记录日志后继续发送不带图片的消息。

use anyhow::{anyhow, Context, Result};
use aws_config::BehaviorVersion;
use aws_sdk_s3::presigning::PresigningConfig;
use aws_sdk_s3::primitives::ByteStream;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use std::future::Future;
use std::time::Duration;
use tracing::{debug, info};
use uuid::Uuid;

use crate::event::AlarmEvent;

/// 预签名 URL 有效期（S3 允许的最大值：7 天）
pub const IMAGE_URL_EXPIRATION: Duration = Duration::from_secs(7 * 24 * 60 * 60);

const CHART_WIDTH: u32 = 800;
const CHART_HEIGHT: u32 = 400;

/// 生成好的图表
#[derive(Debug, Clone, PartialEq)]
pub struct ChartImage {
    pub url: String,
    pub key: String,
    pub expires_at: DateTime<Utc>,
}

/// 告警图表来源
pub trait AlarmChartSource: Send + Sync {
    fn render(&self, alarm: &AlarmEvent) -> impl Future<Output = Result<ChartImage>> + Send;
}

/// `MAXIMUM` -> `Maximum`, `SAMPLE_COUNT` -> `SampleCount`
pub fn widget_statistic(raw: &str) -> String {
    raw.split('_')
        .filter(|part| !part.is_empty())
        .map(|part| {
            let mut chars = part.chars();
            match chars.next() {
                Some(first) => first
                    .to_uppercase()
                    .chain(chars.flat_map(|c| c.to_lowercase()))
                    .collect(),
                None => String::new(),
            }
        })
        .collect()
}

/// 指标维度
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MetricDimension {
    pub name: String,
    pub value: String,
}

/// 渲染图表需要的触发条件字段
#[derive(Debug, Deserialize)]
#[serde(rename_all = "PascalCase")]
struct ChartMetric {
    namespace: String,
    metric_name: String,
    statistic: String,
    period: u64,
    threshold: f64,
    dimensions: Vec<MetricDimension>,
}

/// 构建 metric widget 定义：最近 3 小时的时间序列，带阈值标注
///
/// 触发条件字段缺失或类型不符时返回 `Err`，告警照常发送，只是不带图片。
pub fn metric_widget(alarm: &AlarmEvent) -> Result<Value> {
    let metric = ChartMetric::deserialize(Value::Object(alarm.trigger.fields().clone()))
        .context("alarm trigger cannot be charted")?;
    let dimension = metric
        .dimensions
        .first()
        .ok_or_else(|| anyhow!("alarm trigger has no Dimensions"))?;

    Ok(json!({
        "region": alarm.region_id,
        "metrics": [
            [
                metric.namespace,
                metric.metric_name,
                dimension.name,
                dimension.value,
                {"stat": widget_statistic(&metric.statistic)}
            ]
        ],
        "view": "timeSeries",
        "stacked": false,
        "period": metric.period,
        "annotations": {
            "horizontal": [{
                "label": alarm.description.clone().unwrap_or_default(),
                "value": metric.threshold
            }]
        },
        "title": alarm.alarm_name,
        "width": CHART_WIDTH,
        "height": CHART_HEIGHT,
        "start": "-PT3H",
        "end": "P0D"
    }))
}

/// 图表对象的 S3 key
pub fn image_key(alarm: &AlarmEvent) -> String {
    format!(
        "{}/{}/{}.png",
        alarm.trigger.namespace().unwrap_or("unknown"),
        alarm.trigger.metric_name().unwrap_or("unknown"),
        Uuid::new_v4()
    )
}

/// 基于 CloudWatch + S3 的图表客户端
#[derive(Debug, Clone)]
pub struct MetricChartClient {
    cloudwatch: aws_sdk_cloudwatch::Client,
    s3: aws_sdk_s3::Client,
    bucket: String,
}

impl MetricChartClient {
    /// 使用默认凭证链创建
    pub async fn from_env(bucket: impl Into<String>) -> Self {
        let config = aws_config::defaults(BehaviorVersion::latest()).load().await;
        let bucket = bucket.into();
        info!(bucket = %bucket, "Alarm chart images enabled");

        Self {
            cloudwatch: aws_sdk_cloudwatch::Client::new(&config),
            s3: aws_sdk_s3::Client::new(&config),
            bucket,
        }
    }

    pub fn bucket(&self) -> &str {
        &self.bucket
    }

    async fn render_png(&self, widget: &Value) -> Result<Vec<u8>> {
        let output = self
            .cloudwatch
            .get_metric_widget_image()
            .metric_widget(widget.to_string())
            .output_format("png")
            .send()
            .await
            .context("GetMetricWidgetImage failed")?;

        output
            .metric_widget_image()
            .map(|blob| blob.as_ref().to_vec())
            .ok_or_else(|| anyhow!("GetMetricWidgetImage returned no image"))
    }

    async fn store(&self, key: &str, png: Vec<u8>) -> Result<String> {
        self.s3
            .put_object()
            .bucket(&self.bucket)
            .key(key)
            .body(ByteStream::from(png))
            .content_type("image/png")
            .send()
            .await
            .with_context(|| format!("failed to upload s3://{}/{}", self.bucket, key))?;

        let presigned = self
            .s3
            .get_object()
            .bucket(&self.bucket)
            .key(key)
            .presigned(PresigningConfig::expires_in(IMAGE_URL_EXPIRATION)?)
            .await
            .context("failed to presign chart url")?;

        Ok(presigned.uri().to_string())
    }
}

impl AlarmChartSource for MetricChartClient {
    fn render(&self, alarm: &AlarmEvent) -> impl Future<Output = Result<ChartImage>> + Send {
        async move {
            let widget = metric_widget(alarm)?;
            let png = self.render_png(&widget).await?;
            let key = image_key(alarm);
            debug!(
                alarm = %alarm.alarm_name,
                key = %key,
                bytes = png.len(),
                "Rendered alarm chart"
            );

            let url = self.store(&key, png).await?;
            let lifetime = chrono::Duration::from_std(IMAGE_URL_EXPIRATION)
                .unwrap_or_else(|_| chrono::Duration::days(7));
            let expires_at = Utc::now() + lifetime;

            Ok(ChartImage { url, key, expires_at })
        }
    }
}
