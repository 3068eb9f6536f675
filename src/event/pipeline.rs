//! CodePipeline 执行状态变更事件

use anyhow::{anyhow, Context, Result};
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// 流水线执行状态
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PipelineState {
    Started,
    Succeeded,
    Failed,
    Canceled,
    Resumed,
    Stopped,
    /// 被更新的执行取代
    Superseded,
    /// 其他状态（如 STOPPING），保留原始字符串
    Other(String),
}

impl PipelineState {
    pub fn parse(raw: &str) -> Self {
        match raw {
            "STARTED" => Self::Started,
            "SUCCEEDED" => Self::Succeeded,
            "FAILED" => Self::Failed,
            "CANCELED" => Self::Canceled,
            "RESUMED" => Self::Resumed,
            "STOPPED" => Self::Stopped,
            "SUPERSEDED" => Self::Superseded,
            other => Self::Other(other.to_string()),
        }
    }

    pub fn as_str(&self) -> &str {
        match self {
            Self::Started => "STARTED",
            Self::Succeeded => "SUCCEEDED",
            Self::Failed => "FAILED",
            Self::Canceled => "CANCELED",
            Self::Resumed => "RESUMED",
            Self::Stopped => "STOPPED",
            Self::Superseded => "SUPERSEDED",
            Self::Other(raw) => raw,
        }
    }
}

impl std::fmt::Display for PipelineState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// 失败的 action
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FailedAction {
    pub action: String,
    #[serde(rename = "additionalInformation", default)]
    pub additional_information: String,
}

/// 一次流水线执行状态变更
#[derive(Debug, Clone, PartialEq)]
pub struct PipelineEvent {
    /// 流水线 ARN，取自 `resources[0]`
    pub pipeline_arn: String,
    pub pipeline_name: String,
    pub state: PipelineState,
    pub execution_id: String,
    /// SNS envelope 时间戳
    pub timestamp: String,
    pub failed_actions: Option<Vec<FailedAction>>,
    pub failed_stage: Option<String>,
}

#[derive(Debug, Deserialize)]
struct PipelineMessage {
    #[serde(default)]
    resources: Vec<String>,
    detail: PipelineDetail,
    #[serde(rename = "additionalAttributes", default)]
    additional_attributes: Option<AdditionalAttributes>,
}

#[derive(Debug, Deserialize)]
struct PipelineDetail {
    pipeline: String,
    #[serde(rename = "execution-id")]
    execution_id: String,
    state: String,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct AdditionalAttributes {
    #[serde(default)]
    failed_stage: Option<String>,
    #[serde(default)]
    failed_actions: Option<Vec<FailedAction>>,
}

impl PipelineEvent {
    /// 从 SNS 流水线消息构建
    pub fn from_message(message: &Value, timestamp: &str) -> Result<Self> {
        let raw = PipelineMessage::deserialize(message)
            .context("invalid CodePipeline notification payload")?;

        let pipeline_arn = raw
            .resources
            .into_iter()
            .next()
            .ok_or_else(|| anyhow!("pipeline notification has no resources"))?;
        if pipeline_arn.split(':').count() < 5 {
            return Err(anyhow!(
                "pipeline ARN '{}' has no region/account segments",
                pipeline_arn
            ));
        }

        let attributes = raw.additional_attributes.unwrap_or_default();

        Ok(Self {
            pipeline_arn,
            pipeline_name: raw.detail.pipeline,
            state: PipelineState::parse(&raw.detail.state),
            execution_id: raw.detail.execution_id,
            timestamp: timestamp.to_string(),
            failed_actions: attributes.failed_actions,
            failed_stage: attributes.failed_stage,
        })
    }

    /// ARN 第 4 段：区域
    pub fn region(&self) -> &str {
        self.pipeline_arn.split(':').nth(3).unwrap_or_default()
    }

    /// ARN 第 5 段：账号
    pub fn account_id(&self) -> &str {
        self.pipeline_arn.split(':').nth(4).unwrap_or_default()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn pipeline_message(state: &str, additional: Value) -> Value {
        json!({
            "account": "1234567890123",
            "detailType": "CodePipeline Pipeline Execution State Change",
            "region": "eu-west-1",
            "source": "aws.codepipeline",
            "time": "2022-01-14T14:57:55Z",
            "detail": {
                "pipeline": "slic-starter-dev",
                "execution-id": "cb6b0959-47c4-4f0a-b72d-b67e7161e038",
                "state": state,
                "version": 8.0
            },
            "resources": ["arn:aws:codepipeline:eu-west-1:1234567890123:slic-starter-dev"],
            "additionalAttributes": additional
        })
    }

    #[test]
    fn test_succeeded_pipeline() {
        let event = PipelineEvent::from_message(
            &pipeline_message("SUCCEEDED", json!({})),
            "2020-01-01T00:00:00.000Z",
        )
        .unwrap();

        assert_eq!(event.pipeline_name, "slic-starter-dev");
        assert_eq!(
            event.pipeline_arn,
            "arn:aws:codepipeline:eu-west-1:1234567890123:slic-starter-dev"
        );
        assert_eq!(event.execution_id, "cb6b0959-47c4-4f0a-b72d-b67e7161e038");
        assert_eq!(event.state, PipelineState::Succeeded);
        assert_eq!(event.region(), "eu-west-1");
        assert_eq!(event.account_id(), "1234567890123");
        assert!(event.failed_stage.is_none());
        assert!(event.failed_actions.is_none());
    }

    #[test]
    fn test_failed_pipeline_reads_additional_attributes() {
        let additional = json!({
            "failedActionCount": 1,
            "failedActions": [{
                "action": "CdkSynth",
                "additionalInformation": "Build terminated with state: FAILED"
            }],
            "failedStage": "CdkSynth"
        });
        let event =
            PipelineEvent::from_message(&pipeline_message("FAILED", additional), "t").unwrap();

        assert_eq!(event.state, PipelineState::Failed);
        assert_eq!(event.failed_stage.as_deref(), Some("CdkSynth"));
        assert_eq!(
            event.failed_actions,
            Some(vec![FailedAction {
                action: "CdkSynth".to_string(),
                additional_information: "Build terminated with state: FAILED".to_string(),
            }])
        );
    }

    #[test]
    fn test_missing_additional_attributes() {
        let mut message = pipeline_message("STARTED", Value::Null);
        message.as_object_mut().unwrap().remove("additionalAttributes");

        let event = PipelineEvent::from_message(&message, "t").unwrap();
        assert!(event.failed_stage.is_none());
        assert!(event.failed_actions.is_none());
    }

    #[test]
    fn test_empty_resources_is_rejected() {
        let mut message = pipeline_message("STARTED", json!({}));
        message["resources"] = json!([]);
        assert!(PipelineEvent::from_message(&message, "t").is_err());
    }

    #[test]
    fn test_superseded_state() {
        let event =
            PipelineEvent::from_message(&pipeline_message("SUPERSEDED", json!({})), "t").unwrap();
        assert_eq!(event.state, PipelineState::Superseded);
        assert_eq!(event.state.to_string(), "SUPERSEDED");
    }

    #[test]
    fn test_unknown_state() {
        let event =
            PipelineEvent::from_message(&pipeline_message("STOPPING", json!({})), "t").unwrap();
        assert_eq!(event.state, PipelineState::Other("STOPPING".to_string()));
    }
}
