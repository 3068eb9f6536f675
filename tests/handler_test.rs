//! 批处理端到端测试
//!
//! 用记录型 sink 代替 Slack webhook，验证解码 → 分类 → 图表 → 转发的完整流程。

use anyhow::{anyhow, Result};
use aws_lambda_events::event::sqs::SqsEvent;
use chrono::Utc;
use notify_bridge::chart::metric_widget;
use notify_bridge::{
    AlarmChartSource, AlarmEvent, ChartImage, ChatMessage, ChatSink, Forwarder, NotificationHandler,
    SendResult, SinkResponse, UnrecognizedPolicy,
};
use serde_json::{json, Value};
use std::future::Future;
use std::sync::Mutex;

// ============================================================================
// 测试替身
// ============================================================================

/// 记录所有发送的消息
#[derive(Default)]
struct RecordingSink {
    messages: Mutex<Vec<ChatMessage>>,
}

impl RecordingSink {
    fn messages(&self) -> Vec<ChatMessage> {
        self.messages.lock().unwrap().clone()
    }
}

impl ChatSink for RecordingSink {
    fn name(&self) -> &str {
        "recording"
    }

    fn post(&self, message: &ChatMessage) -> impl Future<Output = Result<SinkResponse>> + Send {
        async move {
            self.messages.lock().unwrap().push(message.clone());
            Ok(SinkResponse {
                status: 200,
                body: "ok".to_string(),
            })
        }
    }
}

/// 先构建真实的 widget 定义，再固定返回成功或失败的图表来源
struct StubCharts {
    fail: bool,
}

impl AlarmChartSource for StubCharts {
    fn render(&self, alarm: &AlarmEvent) -> impl Future<Output = Result<ChartImage>> + Send {
        async move {
            if self.fail {
                return Err(anyhow!("AccessDenied"));
            }
            metric_widget(alarm)?;
            Ok(ChartImage {
                url: format!("https://alarm-images.s3.amazonaws.com/{}.png", alarm.alarm_name),
                key: format!("{}.png", alarm.alarm_name),
                expires_at: Utc::now(),
            })
        }
    }
}

fn handler(
    charts: Option<StubCharts>,
    policy: UnrecognizedPolicy,
) -> NotificationHandler<RecordingSink, StubCharts> {
    NotificationHandler::new(Forwarder::new(RecordingSink::default()), charts, policy)
}

fn sent(handler: &NotificationHandler<RecordingSink, StubCharts>) -> Vec<ChatMessage> {
    handler.forwarder().sink().unwrap().messages()
}

// ============================================================================
// 测试数据
// ============================================================================

fn alarm_message(name: &str, state: &str) -> Value {
    json!({
        "AlarmName": name,
        "AlarmDescription": "Errors above threshold",
        "AWSAccountId": "123456789012",
        "NewStateValue": state,
        "NewStateReason": "Threshold Crossed: 1 datapoint [3.0] was greater than the threshold (1.0).",
        "StateChangeTime": "2022-01-14T14:30:55.771+0000",
        "Region": "US East (N. Virginia)",
        "AlarmArn": format!("arn:aws:cloudwatch:us-east-1:123456789012:alarm:{}", name),
        "OldStateValue": "OK",
        "Trigger": {
            "MetricName": "Errors",
            "Namespace": "AWS/Lambda",
            "Statistic": "SUM",
            "Dimensions": [{"value": "checkout", "name": "FunctionName"}],
            "Period": 60,
            "Threshold": 1.0
        }
    })
}

fn pipeline_message(state: &str) -> Value {
    json!({
        "account": "1234567890123",
        "detailType": "CodePipeline Pipeline Execution State Change",
        "region": "eu-west-1",
        "source": "aws.codepipeline",
        "time": "2022-01-14T14:30:52Z",
        "detail": {
            "pipeline": "slic-starter-dev",
            "execution-id": "03d35bba-7d0d-44bb-9619-15686abb757e",
            "state": state,
            "version": 8.0
        },
        "resources": ["arn:aws:codepipeline:eu-west-1:1234567890123:slic-starter-dev"],
        "additionalAttributes": {}
    })
}

fn sqs_event(messages: &[(Value, Option<&str>)]) -> SqsEvent {
    let records: Vec<Value> = messages
        .iter()
        .enumerate()
        .map(|(i, (message, subject))| {
            let sns_body = json!({
                "Type": "Notification",
                "MessageId": format!("5c11fdcd-{}", i),
                "TopicArn": "arn:aws:sns:eu-west-1:1234567890123:devPipelineNotifications",
                "Message": message.to_string(),
                "Timestamp": "2022-01-14T14:30:55.771Z",
                "Subject": subject,
            });
            json!({
                "messageId": format!("6c06e2d9-{}", i),
                "body": sns_body.to_string(),
                "eventSource": "aws:sqs",
                "awsRegion": "eu-west-1"
            })
        })
        .collect();

    serde_json::from_value(json!({ "Records": records })).unwrap()
}

// ============================================================================
// 测试
// ============================================================================

#[tokio::test]
async fn test_alarm_scenario_end_to_end() {
    let handler = handler(None, UnrecognizedPolicy::Skip);
    let event = sqs_event(&[(alarm_message("TheAlarm", "ALARM"), Some("ALARM: \"TheAlarm\""))]);

    let report = handler.handle(&event).await.unwrap();
    assert_eq!(report.records, 1);
    assert_eq!(report.alarms, 1);
    assert_eq!(report.alarm_delivery, SendResult::Sent);
    assert!(matches!(report.pipeline_delivery, SendResult::Skipped(_)));

    let messages = sent(&handler);
    assert_eq!(messages.len(), 1);
    let attachment = &messages[0].attachments[0];
    assert_eq!(messages[0].text, "ALARM: \"TheAlarm\"");
    assert_eq!(attachment.color, "#a6364f");
    assert!(attachment.title.contains("⚠️"));
    assert!(attachment.title.contains("TheAlarm"));
    assert!(attachment.title_link.contains("us-east-1"));
    assert!(attachment.title_link.contains("TheAlarm"));
    assert!(attachment.image_url.is_none());
}

#[tokio::test]
async fn test_mixed_batch_posts_once_per_type() {
    let handler = handler(None, UnrecognizedPolicy::Skip);
    let event = sqs_event(&[
        (alarm_message("First", "ALARM"), Some("ALARM: First")),
        (pipeline_message("STARTED"), None),
        (alarm_message("Second", "OK"), Some("OK: Second")),
        (pipeline_message("SUCCEEDED"), None),
    ]);

    let report = handler.handle(&event).await.unwrap();
    assert_eq!(report.alarms, 2);
    assert_eq!(report.pipelines, 2);

    let messages = sent(&handler);
    assert_eq!(messages.len(), 2);
    assert_eq!(messages[0].attachments.len(), 2);
    assert_eq!(messages[0].attachments[0].title, "⚠️ ALARM First");
    assert_eq!(messages[0].attachments[1].title, "🆗 OK Second");
    assert_eq!(messages[1].attachments.len(), 2);
    assert_eq!(messages[1].attachments[1].title, "✅ slic-starter-dev is SUCCEEDED");
}

#[tokio::test]
async fn test_unrecognized_is_skipped_by_default() {
    let handler = handler(None, UnrecognizedPolicy::Skip);
    let event = sqs_event(&[
        (json!({"source": "aws.ec2", "detail": {}}), None),
        (pipeline_message("FAILED"), None),
    ]);

    let report = handler.handle(&event).await.unwrap();
    assert_eq!(report.unrecognized, 1);
    assert_eq!(report.pipelines, 1);
    assert_eq!(sent(&handler).len(), 1);
}

#[tokio::test]
async fn test_unrecognized_fails_batch_when_configured() {
    let handler = handler(None, UnrecognizedPolicy::Fail);
    let event = sqs_event(&[
        (pipeline_message("FAILED"), None),
        (json!({"source": "aws.ec2"}), None),
    ]);

    let err = handler.handle(&event).await.unwrap_err();
    assert!(err.to_string().contains("aws.ec2"));
    assert!(sent(&handler).is_empty());
}

#[tokio::test]
async fn test_malformed_record_is_fatal() {
    let handler = handler(None, UnrecognizedPolicy::Skip);
    let event: SqsEvent = serde_json::from_value(json!({
        "Records": [{"messageId": "1", "body": "not json"}]
    }))
    .unwrap();

    assert!(handler.handle(&event).await.is_err());
    assert!(sent(&handler).is_empty());
}

#[tokio::test]
async fn test_chart_url_is_attached() {
    let handler = handler(Some(StubCharts { fail: false }), UnrecognizedPolicy::Skip);
    let event = sqs_event(&[(alarm_message("TheAlarm", "ALARM"), Some("ALARM"))]);

    let report = handler.handle(&event).await.unwrap();
    assert_eq!(report.charts_attached, 1);

    let messages = sent(&handler);
    assert_eq!(
        messages[0].attachments[0].image_url.as_deref(),
        Some("https://alarm-images.s3.amazonaws.com/TheAlarm.png")
    );
}

#[tokio::test]
async fn test_chart_failure_degrades_to_no_image() {
    let handler = handler(Some(StubCharts { fail: true }), UnrecognizedPolicy::Skip);
    let event = sqs_event(&[(alarm_message("TheAlarm", "ALARM"), Some("ALARM"))]);

    let report = handler.handle(&event).await.unwrap();
    assert_eq!(report.charts_attached, 0);
    assert_eq!(report.alarm_delivery, SendResult::Sent);
    assert!(sent(&handler)[0].attachments[0].image_url.is_none());
}

#[tokio::test]
async fn test_malformed_trigger_is_forwarded_without_image() {
    let handler = handler(Some(StubCharts { fail: false }), UnrecognizedPolicy::Fail);
    let mut null_dimensions = alarm_message("NullDimensions", "ALARM");
    null_dimensions["Trigger"]["Dimensions"] = Value::Null;
    let mut string_period = alarm_message("StringPeriod", "ALARM");
    string_period["Trigger"]["Period"] = json!("60");
    let event = sqs_event(&[(null_dimensions, Some("ALARM")), (string_period, Some("ALARM"))]);

    let report = handler.handle(&event).await.unwrap();
    assert_eq!(report.alarms, 2);
    assert_eq!(report.unrecognized, 0);
    assert_eq!(report.charts_attached, 0);
    assert_eq!(report.alarm_delivery, SendResult::Sent);

    let messages = sent(&handler);
    assert_eq!(messages.len(), 1);
    assert_eq!(messages[0].attachments.len(), 2);
    assert!(messages[0].attachments.iter().all(|a| a.image_url.is_none()));
    assert_eq!(messages[0].attachments[0].fields[0].value, "Errors");
}

#[tokio::test]
async fn test_no_sink_configured_is_a_no_op() {
    let handler: NotificationHandler<RecordingSink, StubCharts> =
        NotificationHandler::new(Forwarder::disabled(), None, UnrecognizedPolicy::Skip);
    let event = sqs_event(&[
        (alarm_message("TheAlarm", "ALARM"), Some("ALARM")),
        (pipeline_message("FAILED"), None),
    ]);

    let report = handler.handle(&event).await.unwrap();
    assert!(matches!(report.alarm_delivery, SendResult::Skipped(_)));
    assert!(matches!(report.pipeline_delivery, SendResult::Skipped(_)));
    assert!(handler.forwarder().sink().is_none());
}
