//! Replay 命令 - 在本地用保存的 SQS 事件跑一遍完整处理流程
//!
//! 与 Lambda 使用同一个 `NotificationHandler`，会真实发送到配置的 webhook。

use anyhow::Result;
use clap::Args;
use std::path::PathBuf;
use tracing::info;

use super::input::load_sqs_event;
use super::output::format_output;
use crate::config::BridgeConfig;
use crate::handler::NotificationHandler;

/// Replay 命令参数
#[derive(Args)]
pub struct ReplayArgs {
    /// SQS 事件 JSON 文件
    pub file: PathBuf,
}

/// 处理 replay 命令
pub async fn handle_replay(args: ReplayArgs, config: &BridgeConfig) -> Result<()> {
    let event = load_sqs_event(&args.file)?;
    info!(file = %args.file.display(), records = event.records.len(), "Replaying SQS event");

    let handler = NotificationHandler::from_config(config).await?;
    let report = handler.handle(&event).await?;

    println!("{}", format_output(&report));
    Ok(())
}
