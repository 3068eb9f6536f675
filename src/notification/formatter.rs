//! 消息格式化模块 - 将告警和流水线事件转换为 Slack 消息
//!
//! 消息格式（Slack legacy attachments）：
//! ```json
//! {
//!   "text": "ALARM: \"TheAlarm\" in US East (N. Virginia)",
//!   "attachments": [{
//!     "mrkdwn_in": ["text"],
//!     "color": "#a6364f",
//!     "pretext": "ALARM (was OK)",
//!     "title": "⚠️ ALARM TheAlarm",
//!     "title_link": "https://us-east-1.console.aws.amazon.com/...",
//!     "text": "Threshold Crossed: ...",
//!     "fields": [{"title": "Time", "value": "...", "short": true}]
//!   }]
//! }
//! ```
//!
//! 一批同类记录只生成一条消息，每条记录一个 attachment。

use serde::{Deserialize, Serialize};

use crate::event::{AlarmEvent, AlarmState, PipelineEvent, PipelineState};

pub const COLOR_WHITE: &str = "#eeeeee";
pub const COLOR_RED: &str = "#a6364f";
pub const COLOR_GREEN: &str = "#36a64f";

/// 流水线 attachment 的固定说明
const PIPELINE_CHANGED_TEXT: &str = "A CodePipeline execution has changed state";

/// Slack 消息
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChatMessage {
    pub text: String,
    pub attachments: Vec<Attachment>,
}

/// Slack attachment
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Attachment {
    pub mrkdwn_in: Vec<String>,
    pub color: String,
    pub pretext: String,
    pub title: String,
    pub title_link: String,
    pub text: String,
    pub fields: Vec<AttachmentField>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image_url: Option<String>,
}

/// attachment 中的字段
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AttachmentField {
    pub title: String,
    pub value: String,
    pub short: bool,
}

impl AttachmentField {
    fn short(title: &str, value: impl Into<String>) -> Self {
        Self {
            title: title.to_string(),
            value: value.into(),
            short: true,
        }
    }
}

pub fn alarm_color(state: &AlarmState) -> &'static str {
    match state {
        AlarmState::Alarm => COLOR_RED,
        AlarmState::Ok | AlarmState::InsufficientData | AlarmState::Unknown(_) => COLOR_GREEN,
    }
}

pub fn alarm_emoji(state: &AlarmState) -> &'static str {
    match state {
        AlarmState::Alarm => "⚠️",
        AlarmState::Ok | AlarmState::InsufficientData | AlarmState::Unknown(_) => "🆗",
    }
}

pub fn pipeline_color(state: &PipelineState) -> &'static str {
    match state {
        PipelineState::Failed => COLOR_RED,
        PipelineState::Succeeded => COLOR_GREEN,
        _ => COLOR_WHITE,
    }
}

pub fn pipeline_emoji(state: &PipelineState) -> &'static str {
    match state {
        PipelineState::Failed => "‼️",
        PipelineState::Started => "▶️",
        PipelineState::Canceled => "✋",
        PipelineState::Resumed => "⏯",
        PipelineState::Stopped => "⏹",
        PipelineState::Succeeded => "✅",
        PipelineState::Superseded | PipelineState::Other(_) => "❓",
    }
}

/// CloudWatch 告警控制台链接
pub fn alarm_console_url(alarm: &AlarmEvent) -> String {
    format!(
        "https://{region}.console.aws.amazon.com/cloudwatch/home?alarm.region={region}#alarmsV2:alarm/{name}",
        region = alarm.region_id,
        name = alarm.alarm_name
    )
}

/// CodePipeline 执行详情链接
pub fn pipeline_console_url(pipeline: &PipelineEvent) -> String {
    format!(
        "https://{region}.console.aws.amazon.com/codesuite/codepipeline/pipelines/{name}/executions/{execution}/visualization?region={region}",
        region = pipeline.region(),
        name = pipeline.pipeline_name,
        execution = pipeline.execution_id
    )
}

/// 告警字段：有 MetricName 时才包含 Metric / Namespace
pub fn alarm_fields(alarm: &AlarmEvent) -> Vec<AttachmentField> {
    let mut fields = Vec::with_capacity(6);

    if let Some(metric) = alarm.trigger.metric_name() {
        fields.push(AttachmentField::short("Metric", metric));
        fields.push(AttachmentField::short(
            "Namespace",
            alarm.trigger.namespace().unwrap_or_default(),
        ));
    }

    fields.push(AttachmentField::short("Time", alarm.timestamp.as_str()));
    fields.push(AttachmentField::short("Alarm", alarm.alarm_name.as_str()));
    fields.push(AttachmentField::short("Account", alarm.account_id.as_str()));
    fields.push(AttachmentField::short("Region", alarm.region.as_str()));
    fields
}

pub fn pipeline_fields(pipeline: &PipelineEvent) -> Vec<AttachmentField> {
    let mut fields = vec![
        AttachmentField::short("Pipeline", pipeline.pipeline_name.as_str()),
        AttachmentField::short("State", pipeline.state.as_str()),
        AttachmentField::short(
            "Region/Account",
            format!("{}/{}", pipeline.region(), pipeline.account_id()),
        ),
        AttachmentField::short("Execution", pipeline.execution_id.as_str()),
        AttachmentField::short("Time", pipeline.timestamp.as_str()),
    ];

    if let Some(stage) = &pipeline.failed_stage {
        fields.push(AttachmentField::short("Failed Stage", stage.as_str()));
    }
    fields
}

pub fn alarm_attachment(alarm: &AlarmEvent) -> Attachment {
    Attachment {
        mrkdwn_in: vec!["text".to_string()],
        color: alarm_color(&alarm.new_state).to_string(),
        pretext: format!("{} (was {})", alarm.new_state, alarm.old_state),
        title: format!(
            "{} {} {}",
            alarm_emoji(&alarm.new_state),
            alarm.new_state,
            alarm.alarm_name
        ),
        title_link: alarm_console_url(alarm),
        text: alarm.reason.clone(),
        fields: alarm_fields(alarm),
        image_url: alarm.image_url.clone(),
    }
}

fn pipeline_summary(pipeline: &PipelineEvent) -> String {
    format!("Pipeline {} is {}", pipeline.pipeline_name, pipeline.state)
}

fn pipeline_text(pipeline: &PipelineEvent) -> String {
    let mut text = PIPELINE_CHANGED_TEXT.to_string();

    if let Some(stage) = &pipeline.failed_stage {
        text.push_str(&format!("\nFailed stage: `{}`", stage));
    }
    for action in pipeline.failed_actions.iter().flatten() {
        if action.additional_information.is_empty() {
            text.push_str(&format!("\n• `{}`", action.action));
        } else {
            text.push_str(&format!(
                "\n• `{}`: {}",
                action.action, action.additional_information
            ));
        }
    }
    text
}

pub fn pipeline_attachment(pipeline: &PipelineEvent) -> Attachment {
    Attachment {
        mrkdwn_in: vec!["text".to_string()],
        color: pipeline_color(&pipeline.state).to_string(),
        pretext: pipeline_summary(pipeline),
        title: format!(
            "{} {} is {}",
            pipeline_emoji(&pipeline.state),
            pipeline.pipeline_name,
            pipeline.state
        ),
        title_link: pipeline_console_url(pipeline),
        text: pipeline_text(pipeline),
        fields: pipeline_fields(pipeline),
        image_url: None,
    }
}

/// 为一批告警构建一条消息；空输入返回 `None`
pub fn alarm_message(alarms: &[AlarmEvent]) -> Option<ChatMessage> {
    let text = match alarms {
        [] => return None,
        [only] => only.subject.clone(),
        many => format!("{} alarm notifications", many.len()),
    };

    Some(ChatMessage {
        text,
        attachments: alarms.iter().map(alarm_attachment).collect(),
    })
}

/// 为一批流水线事件构建一条消息；空输入返回 `None`
pub fn pipeline_message(pipelines: &[PipelineEvent]) -> Option<ChatMessage> {
    let text = match pipelines {
        [] => return None,
        [only] => pipeline_summary(only),
        many => format!("{} pipeline notifications", many.len()),
    };

    Some(ChatMessage {
        text,
        attachments: pipelines.iter().map(pipeline_attachment).collect(),
    })
}
