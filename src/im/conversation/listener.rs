//! 聊天监听器回调接口

use crate::im::message::models::ChatMessage;
use async_trait::async_trait;

/// 聊天监听器回调接口
#[async_trait]
pub trait ChatListener: Send + Sync {
    /// 面向用户的错误提示（每次失败恰好一次）
    async fn on_error(&self, message: String);

    /// 消息发送完成，调用方据此更新会话列表排序和预览
    ///
    /// `timestamp` 为 RFC 3339 UTC 毫秒时间
    async fn on_conversation_updated(&self, conversation_id: String, content: String, timestamp: String);

    /// 推送通道收到新消息（已写入消息存储）
    async fn on_message_received(&self, conversation_id: String, message: ChatMessage);

    /// 推送通道连接状态变化
    async fn on_connection_status_changed(&self, connected: bool, message: String);
}

/// 空实现（默认监听器）
pub struct EmptyChatListener;

#[async_trait]
impl ChatListener for EmptyChatListener {
    async fn on_error(&self, _message: String) {}
    async fn on_conversation_updated(&self, _conversation_id: String, _content: String, _timestamp: String) {}
    async fn on_message_received(&self, _conversation_id: String, _message: ChatMessage) {}
    async fn on_connection_status_changed(&self, _connected: bool, _message: String) {}
}
