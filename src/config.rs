//! 运行配置 - 启动时从环境变量读取一次
//!
//! 环境变量：
//! 1. `SLACK_WEBHOOK_URL` - Slack webhook 地址（未设置或为空时不发送任何消息）
//! 2. `ALARM_IMAGE_BUCKET_NAME` - 告警图表存放的 S3 bucket（未设置时不生成图表）
//! 3. `WEBHOOK_TIMEOUT_SECS` - webhook 请求超时（秒），默认 10
//! 4. `UNRECOGNIZED_EVENT_POLICY` - 无法识别的事件如何处理：`skip`（默认）或 `fail`

use anyhow::{anyhow, Context, Result};
use serde::Serialize;
use std::str::FromStr;

pub const ENV_WEBHOOK_URL: &str = "SLACK_WEBHOOK_URL";
pub const ENV_IMAGE_BUCKET: &str = "ALARM_IMAGE_BUCKET_NAME";
pub const ENV_WEBHOOK_TIMEOUT: &str = "WEBHOOK_TIMEOUT_SECS";
pub const ENV_UNRECOGNIZED_POLICY: &str = "UNRECOGNIZED_EVENT_POLICY";

/// 默认 webhook 超时（秒）
const DEFAULT_WEBHOOK_TIMEOUT_SECS: u64 = 10;

/// 无法识别的事件的处理策略
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum UnrecognizedPolicy {
    /// 记录 warn 日志后跳过
    #[default]
    Skip,
    /// 整批失败
    Fail,
}

impl FromStr for UnrecognizedPolicy {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_lowercase().as_str() {
            "skip" => Ok(Self::Skip),
            "fail" => Ok(Self::Fail),
            other => Err(anyhow!(
                "unknown unrecognized-event policy '{}', expected 'skip' or 'fail'",
                other
            )),
        }
    }
}

/// Bridge 配置
#[derive(Debug, Clone, PartialEq)]
pub struct BridgeConfig {
    /// Slack webhook 地址
    pub webhook_url: Option<String>,
    /// 告警图表 bucket
    pub alarm_image_bucket: Option<String>,
    /// webhook 请求超时（秒）
    pub webhook_timeout_secs: u64,
    /// 无法识别的事件的处理策略
    pub unrecognized_policy: UnrecognizedPolicy,
}

impl Default for BridgeConfig {
    fn default() -> Self {
        Self {
            webhook_url: None,
            alarm_image_bucket: None,
            webhook_timeout_secs: DEFAULT_WEBHOOK_TIMEOUT_SECS,
            unrecognized_policy: UnrecognizedPolicy::Skip,
        }
    }
}

impl BridgeConfig {
    /// 从进程环境变量读取配置
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// 通过任意 key 查找函数构建配置（测试时不必修改进程环境）
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let non_empty = |key: &str| {
            lookup(key)
                .map(|v| v.trim().to_string())
                .filter(|v| !v.is_empty())
        };

        let webhook_timeout_secs = match non_empty(ENV_WEBHOOK_TIMEOUT) {
            Some(raw) => raw.parse::<u64>().with_context(|| {
                format!("{} must be a whole number of seconds", ENV_WEBHOOK_TIMEOUT)
            })?,
            None => DEFAULT_WEBHOOK_TIMEOUT_SECS,
        };

        let unrecognized_policy = match non_empty(ENV_UNRECOGNIZED_POLICY) {
            Some(raw) => raw
                .parse::<UnrecognizedPolicy>()
                .context(ENV_UNRECOGNIZED_POLICY)?,
            None => UnrecognizedPolicy::default(),
        };

        Ok(Self {
            webhook_url: non_empty(ENV_WEBHOOK_URL),
            alarm_image_bucket: non_empty(ENV_IMAGE_BUCKET),
            webhook_timeout_secs,
            unrecognized_policy,
        })
    }

    /// 设置 webhook 地址
    pub fn with_webhook_url(mut self, url: impl Into<String>) -> Self {
        self.webhook_url = Some(url.into());
        self
    }

    /// 设置图表 bucket
    pub fn with_alarm_image_bucket(mut self, bucket: impl Into<String>) -> Self {
        self.alarm_image_bucket = Some(bucket.into());
        self
    }

    /// 设置无法识别事件的处理策略
    pub fn with_unrecognized_policy(mut self, policy: UnrecognizedPolicy) -> Self {
        self.unrecognized_policy = policy;
        self
    }
}
