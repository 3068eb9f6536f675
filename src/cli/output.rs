//! Output formatting for CLI commands

use serde::Serialize;

/// 以带缩进的 JSON 输出
pub fn format_output<T: Serialize>(data: &T) -> String {
    serde_json::to_string_pretty(data).unwrap_or_else(|_| "{}".to_string())
}
