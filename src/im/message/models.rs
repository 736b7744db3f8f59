//! 聊天消息模型

use serde::{Deserialize, Serialize};
use tracing::warn;

/// 单条聊天消息
///
/// 服务器字段不完全固定，缺失字段使用默认值，未识别字段保留在 `extra` 中。
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChatMessage {
    /// 消息 ID
    #[serde(default, deserialize_with = "string_or_number")]
    pub id: String,
    /// 发送者用户 ID
    #[serde(default, deserialize_with = "string_or_number")]
    pub sender_id: String,
    /// 接收者用户 ID
    #[serde(default, deserialize_with = "string_or_number")]
    pub receiver_id: String,
    /// 消息正文（null 视为空）
    #[serde(default, deserialize_with = "string_or_number")]
    pub content: String,
    /// 发送时间：RFC 3339 字符串原样保留，毫秒时间戳转成数字字符串
    #[serde(default, deserialize_with = "string_or_number")]
    pub timestamp: String,
    /// 是否已读（兼容 null、0/1 和 "true"/"false"）
    #[serde(default, deserialize_with = "lenient_bool")]
    pub read: bool,
    /// 其他字段
    #[serde(flatten)]
    pub extra: serde_json::Map<String, serde_json::Value>,
}

/// 把服务器返回的任意 JSON 规整为消息序列
///
/// 非数组（包括 null）视为空；数组中只跳过非对象元素，
/// 字段形状不符合预期的对象整体保留在 `extra` 中。
pub fn coerce_messages(value: serde_json::Value) -> Vec<ChatMessage> {
    let items = match value {
        serde_json::Value::Array(items) => items,
        serde_json::Value::Null => return Vec::new(),
        other => {
            warn!("[Message] ⚠️ 消息响应不是数组，按空列表处理: {}", other);
            return Vec::new();
        }
    };

    items
        .into_iter()
        .filter_map(|item| {
            let serde_json::Value::Object(fields) = item else {
                warn!("[Message] ⚠️ 跳过非对象消息: {}", item);
                return None;
            };
            match serde_json::from_value::<ChatMessage>(serde_json::Value::Object(fields.clone())) {
                Ok(msg) => Some(msg),
                Err(e) => {
                    warn!("[Message] ⚠️ 消息字段无法解析，保留原始数据: {}", e);
                    Some(ChatMessage {
                        extra: fields,
                        ..Default::default()
                    })
                }
            }
        })
        .collect()
}

/// 标量字段兼容字符串、数字、布尔和 null；对象和数组视为形状错误
fn string_or_number<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: serde::Deserializer<'de>,
{
    let value: Option<serde_json::Value> = Deserialize::deserialize(deserializer)?;
    match value {
        None | Some(serde_json::Value::Null) => Ok(String::new()),
        Some(serde_json::Value::String(s)) => Ok(s),
        Some(serde_json::Value::Number(n)) => Ok(n.to_string()),
        Some(serde_json::Value::Bool(b)) => Ok(b.to_string()),
        Some(other) => Err(serde::de::Error::custom(format!("期望标量，实际为: {}", other))),
    }
}

/// 已读标记兼容 null、布尔、数字和字符串
fn lenient_bool<'de, D>(deserializer: D) -> Result<bool, D::Error>
where
    D: serde::Deserializer<'de>,
{
    let value: Option<serde_json::Value> = Deserialize::deserialize(deserializer)?;
    Ok(match value {
        Some(serde_json::Value::Bool(b)) => b,
        Some(serde_json::Value::Number(n)) => n.as_f64().map(|f| f != 0.0).unwrap_or(false),
        Some(serde_json::Value::String(s)) => s.eq_ignore_ascii_case("true") || s == "1",
        _ => false,
    })
}
