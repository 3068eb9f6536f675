//! Preview 命令 - 只解码、分类并渲染消息，不发送

use anyhow::Result;
use aws_lambda_events::event::sqs::SqsEvent;
use clap::Args;
use serde::Serialize;
use std::path::PathBuf;

use super::input::load_sqs_event;
use super::output::format_output;
use crate::config::UnrecognizedPolicy;
use crate::handler::prepare_batch;
use crate::notification::{alarm_message, pipeline_message, ChatMessage};

/// Preview 命令参数
#[derive(Args)]
pub struct PreviewArgs {
    /// SQS 事件 JSON 文件
    pub file: PathBuf,
}

/// Preview 命令输出
#[derive(Debug, Serialize)]
pub struct PreviewOutput {
    pub records: usize,
    pub unrecognized: usize,
    pub messages: Vec<ChatMessage>,
}

/// 渲染一批事件将要发送的消息
pub fn render_preview(event: &SqsEvent, policy: UnrecognizedPolicy) -> Result<PreviewOutput> {
    let batch = prepare_batch(event, policy)?;
    let messages = alarm_message(&batch.alarms)
        .into_iter()
        .chain(pipeline_message(&batch.pipelines))
        .collect();

    Ok(PreviewOutput {
        records: batch.records,
        unrecognized: batch.unrecognized,
        messages,
    })
}

/// 处理 preview 命令
pub fn handle_preview(args: PreviewArgs, policy: UnrecognizedPolicy) -> Result<()> {
    let event = load_sqs_event(&args.file)?;
    let preview = render_preview(&event, policy)?;
    println!("{}", format_output(&preview));
    Ok(())
}
