//! 会话本地模型定义

use serde::{Deserialize, Serialize};

/// 当前登录用户（发送消息的前置条件）
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CurrentUser {
    /// 用户 ID
    #[serde(rename = "userID")]
    pub user_id: String,
    /// 用户名
    #[serde(default)]
    pub username: String,
}

/// 一次拉取的结果
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FetchOutcome {
    /// 已在拉取中，或该会话已同步过
    Skipped,
    /// 拉取并标记已读成功
    Fetched { count: usize },
    /// 拉取或标记已读失败（已通知监听器）
    Failed,
}

/// 一次发送的结果
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SendOutcome {
    /// 没有活跃会话或未登录
    Skipped,
    /// 推送通道已接受
    Pushed,
    /// 推送通道拒绝，HTTP 兜底发送成功
    SentViaHttp,
    /// HTTP 兜底发送失败（已通知监听器）
    Failed,
}

/// 会话列表中的一条会话预览
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ConversationSummary {
    /// 对方用户 ID
    pub other_user_id: String,
    /// 对方显示名
    #[serde(default)]
    pub other_username: String,
    /// 最新消息预览
    #[serde(default)]
    pub last_message: String,
    /// 最新消息时间（RFC 3339）
    #[serde(default)]
    pub last_message_at: String,
    /// 未读数
    #[serde(default)]
    pub unread_count: u32,
}
