//! 内存消息存储
//!
//! 以会话 ID（对方用户 ID）为键保存有序消息列表，插入顺序即时间顺序。

use crate::im::message::models::ChatMessage;
use std::collections::HashMap;
use std::sync::{PoisonError, RwLock};
use tracing::debug;

/// 会话消息写入接口
///
/// 同步守卫只通过这个接口写入，且每次都是整键替换。
pub trait ConversationMessageSink: Send + Sync {
    /// 用 `messages` 整体替换 `conversation_id` 对应的消息列表
    fn set_conversation_messages(&self, conversation_id: &str, messages: Vec<ChatMessage>);

    /// 读取某个会话的消息（不存在时返回空列表）
    fn conversation_messages(&self, conversation_id: &str) -> Vec<ChatMessage>;
}

/// 会话消息存储
#[derive(Debug, Default)]
pub struct MessageStore {
    conversations: RwLock<HashMap<String, Vec<ChatMessage>>>,
}

impl MessageStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// 追加一条消息（推送通道收到的新消息走这里）
    pub fn append_message(&self, conversation_id: &str, message: ChatMessage) {
        let mut guard = self
            .conversations
            .write()
            .unwrap_or_else(PoisonError::into_inner);
        guard
            .entry(conversation_id.to_string())
            .or_default()
            .push(message);
    }
}

impl ConversationMessageSink for MessageStore {
    fn set_conversation_messages(&self, conversation_id: &str, messages: Vec<ChatMessage>) {
        debug!(
            "[MsgStore] 替换会话消息: conversation={}, count={}",
            conversation_id,
            messages.len()
        );
        self.conversations
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(conversation_id.to_string(), messages);
    }

    fn conversation_messages(&self, conversation_id: &str) -> Vec<ChatMessage> {
        self.conversations
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get(conversation_id)
            .cloned()
            .unwrap_or_default()
    }
}
