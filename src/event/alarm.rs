//! CloudWatch 告警状态变更事件

use anyhow::{anyhow, Context, Result};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// 告警状态
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AlarmState {
    Alarm,
    Ok,
    InsufficientData,
    /// 未知状态，保留原始字符串
    Unknown(String),
}

impl AlarmState {
    pub fn parse(raw: &str) -> Self {
        match raw {
            "ALARM" => Self::Alarm,
            "OK" => Self::Ok,
            "INSUFFICIENT_DATA" => Self::InsufficientData,
            other => Self::Unknown(other.to_string()),
        }
    }

    pub fn as_str(&self) -> &str {
        match self {
            Self::Alarm => "ALARM",
            Self::Ok => "OK",
            Self::InsufficientData => "INSUFFICIENT_DATA",
            Self::Unknown(raw) => raw,
        }
    }
}

impl std::fmt::Display for AlarmState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// 告警触发条件
///
/// 保持原始映射，不做整体类型校验。消息只宽松地读取 `MetricName` /
/// `Namespace`；图表所需字段在渲染时再解析。指标数学告警没有这两个字段。
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct AlarmTrigger(Map<String, Value>);

impl AlarmTrigger {
    pub fn new(fields: Map<String, Value>) -> Self {
        Self(fields)
    }

    pub fn fields(&self) -> &Map<String, Value> {
        &self.0
    }

    pub fn get(&self, key: &str) -> Option<&Value> {
        self.0.get(key)
    }

    pub fn metric_name(&self) -> Option<&str> {
        self.get("MetricName").and_then(Value::as_str)
    }

    pub fn namespace(&self) -> Option<&str> {
        self.get("Namespace").and_then(Value::as_str)
    }
}

impl From<Map<String, Value>> for AlarmTrigger {
    fn from(fields: Map<String, Value>) -> Self {
        Self(fields)
    }
}

/// 一次告警状态变更
#[derive(Debug, Clone, PartialEq)]
pub struct AlarmEvent {
    pub new_state: AlarmState,
    pub old_state: AlarmState,
    pub reason: String,
    /// SNS envelope 时间戳
    pub timestamp: String,
    /// SNS envelope 主题
    pub subject: String,
    pub alarm_name: String,
    pub description: Option<String>,
    pub account_id: String,
    /// 展示用区域：优先使用消息里的 `Region`，否则与 `region_id` 相同
    pub region: String,
    /// 区域代码，始终取自 `AlarmArn` 第 4 段（如 `eu-west-1`）
    pub region_id: String,
    pub trigger: AlarmTrigger,
    /// 告警图表的预签名 URL
    pub image_url: Option<String>,
}

/// SNS 里的告警消息
#[derive(Debug, Deserialize)]
#[serde(rename_all = "PascalCase")]
struct AlarmMessage {
    alarm_name: String,
    #[serde(default)]
    alarm_description: Option<String>,
    #[serde(rename = "AWSAccountId")]
    account_id: String,
    new_state_value: String,
    new_state_reason: String,
    old_state_value: String,
    alarm_arn: String,
    #[serde(default)]
    region: Option<String>,
    #[serde(default)]
    trigger: Option<Value>,
}

/// 从 ARN 中取区域代码（`:` 分隔的第 4 段）
pub fn region_from_arn(arn: &str) -> Option<&str> {
    arn.split(':').nth(3).filter(|s| !s.is_empty())
}

impl AlarmEvent {
    /// 从 SNS 告警消息构建
    pub fn from_message(message: &Value, timestamp: &str, subject: &str) -> Result<Self> {
        let raw: AlarmMessage =
            AlarmMessage::deserialize(message).context("invalid CloudWatch alarm payload")?;

        let region_id = region_from_arn(&raw.alarm_arn)
            .ok_or_else(|| anyhow!("AlarmArn '{}' has no region segment", raw.alarm_arn))?
            .to_string();
        let region = raw
            .region
            .filter(|r| !r.is_empty())
            .unwrap_or_else(|| region_id.clone());

        Ok(Self {
            new_state: AlarmState::parse(&raw.new_state_value),
            old_state: AlarmState::parse(&raw.old_state_value),
            reason: raw.new_state_reason,
            timestamp: timestamp.to_string(),
            subject: subject.to_string(),
            alarm_name: raw.alarm_name,
            description: raw.alarm_description,
            account_id: raw.account_id,
            region,
            region_id,
            trigger: match raw.trigger {
                Some(Value::Object(fields)) => AlarmTrigger::new(fields),
                _ => AlarmTrigger::default(),
            },
            image_url: None,
        })
    }

    /// 附加图表 URL，返回新的值
    pub fn with_image_url(self, url: impl Into<String>) -> Self {
        Self {
            image_url: Some(url.into()),
            ..self
        }
    }

    pub fn is_alarm(&self) -> bool {
        self.new_state == AlarmState::Alarm
    }
}
