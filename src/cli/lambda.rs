//! Lambda 命令 - 在 Lambda runtime 中处理 SQS 批次

use std::sync::Arc;

use anyhow::{anyhow, Result};
use aws_lambda_events::event::sqs::SqsEvent;
use lambda_runtime::{service_fn, Error, LambdaEvent};
use tracing::info;

use crate::config::BridgeConfig;
use crate::handler::NotificationHandler;

/// 启动 Lambda runtime 循环
pub async fn run_lambda(config: &BridgeConfig) -> Result<()> {
    let handler = Arc::new(NotificationHandler::from_config(config).await?);
    info!("Starting Lambda runtime");

    lambda_runtime::run(service_fn(|event: LambdaEvent<SqsEvent>| {
        let handler = handler.clone();
        async move {
            info!(
                request_id = %event.context.request_id,
                records = event.payload.records.len(),
                "Handling SQS batch"
            );
            handler.handle(&event.payload).await.map_err(Error::from)
        }
    }))
    .await
    .map_err(|e| anyhow!("Lambda runtime exited: {}", e))
}
