//! Notify Bridge CLI
//!
//! 将 CloudWatch 告警和 CodePipeline 通知转发到 Slack

use anyhow::Result;
use clap::{Parser, Subcommand};
use notify_bridge::{
    cli::{handle_preview, handle_replay, run_lambda, PreviewArgs, ReplayArgs},
    BridgeConfig,
};
use tracing::info;
use tracing_subscriber::{fmt, EnvFilter};

#[derive(Parser)]
#[command(name = "notify-bridge")]
#[command(about = "Notify Bridge - 将 CloudWatch 告警和 CodePipeline 通知转发到 Slack")]
#[command(version)]
struct Cli {
    /// Slack incoming webhook URL
    #[arg(long, env = "SLACK_WEBHOOK_URL", global = true)]
    webhook_url: Option<String>,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// 在 Lambda runtime 中运行（默认）
    Lambda,
    /// 用本地保存的 SQS 事件跑一遍完整流程（会真实发送）
    Replay(ReplayArgs),
    /// 只渲染消息，不发送
    Preview(PreviewArgs),
}

#[tokio::main]
async fn main() -> Result<()> {
    // 初始化 tracing 日志系统
    // 通过 RUST_LOG 环境变量控制日志级别，默认为 info
    // 例如: RUST_LOG=debug notify-bridge replay event.json
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("notify_bridge=info"));

    fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(filter)
        .with_target(false)
        .with_thread_ids(false)
        .init();

    let cli = Cli::parse();

    let mut config = BridgeConfig::from_env()?;
    if let Some(url) = cli.webhook_url {
        config = config.with_webhook_url(url);
    }
    info!(
        webhook = config.webhook_url.is_some(),
        image_bucket = ?config.alarm_image_bucket,
        policy = ?config.unrecognized_policy,
        "Loaded configuration"
    );

    match cli.command.unwrap_or(Commands::Lambda) {
        Commands::Lambda => run_lambda(&config).await?,
        Commands::Replay(args) => handle_replay(args, &config).await?,
        Commands::Preview(args) => handle_preview(args, config.unrecognized_policy)?,
    }

    Ok(())
}
