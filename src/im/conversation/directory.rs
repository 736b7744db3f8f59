//! 会话列表（预览 + 排序）

use crate::im::conversation::listener::ChatListener;
use crate::im::conversation::models::ConversationSummary;
use crate::im::message::models::ChatMessage;
use async_trait::async_trait;
use std::sync::{PoisonError, RwLock};
use tracing::debug;

/// 按最新消息时间倒序维护的会话列表
#[derive(Debug, Default)]
pub struct ConversationDirectory {
    conversations: RwLock<Vec<ConversationSummary>>,
}

impl ConversationDirectory {
    pub fn new() -> Self {
        Self::default()
    }

    /// 用服务器返回的会话列表整体替换
    pub fn replace_all(&self, mut conversations: Vec<ConversationSummary>) {
        sort_most_recent_first(&mut conversations);
        *self
            .conversations
            .write()
            .unwrap_or_else(PoisonError::into_inner) = conversations;
    }

    /// 更新某个会话的预览并移动到正确位置；不存在时新建
    pub fn touch(&self, other_user_id: &str, content: &str, timestamp: &str) {
        let mut guard = self
            .conversations
            .write()
            .unwrap_or_else(PoisonError::into_inner);
        match guard.iter_mut().find(|c| c.other_user_id == other_user_id) {
            Some(existing) => {
                existing.last_message = content.to_string();
                existing.last_message_at = timestamp.to_string();
            }
            None => guard.push(ConversationSummary {
                other_user_id: other_user_id.to_string(),
                other_username: String::new(),
                last_message: content.to_string(),
                last_message_at: timestamp.to_string(),
                unread_count: 0,
            }),
        }
        sort_most_recent_first(&mut guard);
        debug!("[ConvDir] 会话 {} 预览已更新", other_user_id);
    }

    /// 未读数加一（不是当前会话时收到新消息）
    pub fn bump_unread(&self, other_user_id: &str) {
        let mut guard = self
            .conversations
            .write()
            .unwrap_or_else(PoisonError::into_inner);
        if let Some(existing) = guard.iter_mut().find(|c| c.other_user_id == other_user_id) {
            existing.unread_count += 1;
        }
    }

    /// 清零未读数
    pub fn clear_unread(&self, other_user_id: &str) {
        let mut guard = self
            .conversations
            .write()
            .unwrap_or_else(PoisonError::into_inner);
        if let Some(existing) = guard.iter_mut().find(|c| c.other_user_id == other_user_id) {
            existing.unread_count = 0;
        }
    }

    /// 当前列表快照
    pub fn list(&self) -> Vec<ConversationSummary> {
        self.conversations
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }
}

/// 推送消息的时间：RFC 3339 原样保留，毫秒时间戳转换，其余按当前时间处理
pub fn normalize_timestamp(raw: &str) -> String {
    if chrono::DateTime::parse_from_rfc3339(raw).is_ok() {
        return raw.to_string();
    }
    let parsed = raw
        .parse::<i64>()
        .ok()
        .and_then(chrono::DateTime::from_timestamp_millis)
        .unwrap_or_else(chrono::Utc::now);
    parsed.to_rfc3339_opts(chrono::SecondsFormat::Millis, true)
}

/// 无法解析的时间排在最后
fn sort_most_recent_first(conversations: &mut [ConversationSummary]) {
    conversations.sort_by_key(|c| {
        std::cmp::Reverse(
            chrono::DateTime::parse_from_rfc3339(&c.last_message_at)
                .ok()
                .map(|t| t.with_timezone(&chrono::Utc)),
        )
    });
}

#[async_trait]
impl ChatListener for ConversationDirectory {
    async fn on_error(&self, _message: String) {}

    async fn on_conversation_updated(&self, conversation_id: String, content: String, timestamp: String) {
        self.touch(&conversation_id, &content, &timestamp);
    }

    async fn on_message_received(&self, conversation_id: String, message: ChatMessage) {
        let timestamp = normalize_timestamp(&message.timestamp);
        self.touch(&conversation_id, &message.content, &timestamp);
    }

    async fn on_connection_status_changed(&self, _connected: bool, _message: String) {}
}

#[cfg(test)]
mod tests {
    use super::{normalize_timestamp, ConversationDirectory};
    use crate::im::message::models::ChatMessage;
    use crate::im::conversation::listener::ChatListener;
    use crate::im::conversation::models::ConversationSummary;

    fn summary(id: &str, at: &str) -> ConversationSummary {
        ConversationSummary {
            other_user_id: id.to_string(),
            other_username: format!("user{}", id),
            last_message: String::new(),
            last_message_at: at.to_string(),
            unread_count: 0,
        }
    }

    fn order(dir: &ConversationDirectory) -> Vec<String> {
        dir.list().into_iter().map(|c| c.other_user_id).collect()
    }

    #[test]
    fn replace_all_sorts_most_recent_first() {
        let dir = ConversationDirectory::new();
        dir.replace_all(vec![
            summary("1", "2026-10-18T10:00:00.000Z"),
            summary("2", "2026-10-19T09:00:00.000-03:00"),
            summary("3", "2026-10-19T11:00:00.000Z"),
        ]);
        // 09:00-03:00 即 12:00Z，晚于 11:00Z
        assert_eq!(order(&dir), vec!["2", "3", "1"]);
    }

    #[tokio::test]
    async fn conversation_update_moves_entry_to_top() {
        let dir = ConversationDirectory::new();
        dir.replace_all(vec![
            summary("1", "2026-10-19T10:00:00.000Z"),
            summary("2", "2026-10-18T10:00:00.000Z"),
        ]);

        dir.on_conversation_updated(
            "2".to_string(),
            "fechado, 10h".to_string(),
            "2026-10-19T12:00:00.000Z".to_string(),
        )
        .await;

        let list = dir.list();
        assert_eq!(list[0].other_user_id, "2");
        assert_eq!(list[0].last_message, "fechado, 10h");
        assert_eq!(list[0].other_username, "user2");
    }

    #[test]
    fn touch_creates_unknown_conversation_and_unread_counts() {
        let dir = ConversationDirectory::new();
        dir.touch("9", "oi", "2026-10-19T12:00:00.000Z");
        dir.bump_unread("9");
        dir.bump_unread("9");
        dir.bump_unread("missing");
        assert_eq!(dir.list()[0].unread_count, 2);

        dir.clear_unread("9");
        assert_eq!(dir.list()[0].unread_count, 0);
        assert_eq!(dir.list().len(), 1);
    }

    #[test]
    fn timestamps_are_normalized() {
        assert_eq!(normalize_timestamp("2026-10-19T12:00:00Z"), "2026-10-19T12:00:00Z");
        assert_eq!(normalize_timestamp("1729339200000"), "2024-10-19T12:00:00.000Z");
        let now = chrono::Utc::now();
        let fallback = chrono::DateTime::parse_from_rfc3339(&normalize_timestamp("")).unwrap();
        assert!(fallback.with_timezone(&chrono::Utc) >= now - chrono::Duration::seconds(5));
    }

    #[tokio::test]
    async fn pushed_message_without_timestamp_goes_to_top() {
        let dir = ConversationDirectory::new();
        dir.replace_all(vec![
            summary("1", "2026-01-02T10:00:00.000Z"),
            summary("2", "2026-01-01T10:00:00.000Z"),
        ]);

        let message = ChatMessage {
            sender_id: "2".to_string(),
            content: "cheguei".to_string(),
            ..Default::default()
        };
        dir.on_message_received("2".to_string(), message).await;

        assert_eq!(order(&dir), vec!["2", "1"]);
        assert_eq!(dir.list()[0].last_message, "cheguei");
    }
}
