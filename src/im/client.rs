//! 聊天客户端
//!
//! 把配置、HTTP 客户端、推送通道、消息存储、会话列表和同步守卫组装在一起。

use crate::im::config::ClientConfig;
use crate::im::conversation::{
    ChatListener, ConversationDirectory, ConversationSyncGuard, CurrentUser, EmptyChatListener,
    FetchOutcome, SendOutcome,
};
use crate::im::message::{ChatApi, ChatMessage, MessageStore};
use crate::im::push::WsPushTransport;
use crate::im::team::{TeamApi, TeamInviteService, TeamListener};
use anyhow::Result;
use async_trait::async_trait;
use std::sync::{Arc, OnceLock, Weak};
use tracing::info;

/// 先更新会话列表，再转发给调用方的监听器
struct DirectoryForwarder {
    directory: Arc<ConversationDirectory>,
    inner: Arc<dyn ChatListener>,
    /// 守卫创建后回填，用于判断消息是否属于当前打开的会话
    guard: OnceLock<Weak<ConversationSyncGuard>>,
}

impl DirectoryForwarder {
    fn is_active(&self, conversation_id: &str) -> bool {
        self.guard
            .get()
            .and_then(Weak::upgrade)
            .and_then(|guard| guard.active_conversation())
            .is_some_and(|active| active == conversation_id)
    }
}

#[async_trait]
impl ChatListener for DirectoryForwarder {
    async fn on_error(&self, message: String) {
        self.inner.on_error(message).await;
    }

    async fn on_conversation_updated(&self, conversation_id: String, content: String, timestamp: String) {
        self.directory.touch(&conversation_id, &content, &timestamp);
        self.inner
            .on_conversation_updated(conversation_id, content, timestamp)
            .await;
    }

    async fn on_message_received(&self, conversation_id: String, message: ChatMessage) {
        self.directory
            .on_message_received(conversation_id.clone(), message.clone())
            .await;
        if !self.is_active(&conversation_id) {
            self.directory.bump_unread(&conversation_id);
        }
        self.inner.on_message_received(conversation_id, message).await;
    }

    async fn on_connection_status_changed(&self, connected: bool, message: String) {
        self.inner.on_connection_status_changed(connected, message).await;
    }
}

/// 聊天客户端
pub struct ChatClient {
    config: ClientConfig,
    http_client: reqwest::Client,
    store: Arc<MessageStore>,
    directory: Arc<ConversationDirectory>,
    push: Arc<WsPushTransport>,
    forwarder: Arc<DirectoryForwarder>,
    guard: Arc<ConversationSyncGuard>,
}

impl ChatClient {
    /// 创建新的客户端（使用默认空监听器）
    pub fn new(config: ClientConfig) -> Result<Self> {
        Self::with_listener(config, Arc::new(EmptyChatListener))
    }

    /// 创建新的客户端（带自定义监听器）
    pub fn with_listener(config: ClientConfig, listener: Arc<dyn ChatListener>) -> Result<Self> {
        let http_client = config.build_http_client()?;
        let store = Arc::new(MessageStore::new());
        let directory = Arc::new(ConversationDirectory::new());
        let forwarder = Arc::new(DirectoryForwarder {
            directory: directory.clone(),
            inner: listener,
            guard: OnceLock::new(),
        });

        let push = Arc::new(WsPushTransport::new(
            config.clone(),
            store.clone(),
            forwarder.clone(),
        ));
        let api = Arc::new(ChatApi::new(http_client.clone(), config.api_url()));
        let guard = Arc::new(ConversationSyncGuard::with_listener(
            api,
            push.clone(),
            store.clone(),
            forwarder.clone(),
        ));
        let _ = forwarder.guard.set(Arc::downgrade(&guard));
        guard.set_current_user(Some(CurrentUser {
            user_id: config.user_id.clone(),
            username: String::new(),
        }));

        Ok(Self {
            config,
            http_client,
            store,
            directory,
            push,
            forwarder,
            guard,
        })
    }

    /// 连接推送通道；失败时发送会自动走 HTTP 兜底
    pub async fn connect(&self) -> Result<()> {
        info!("[Client] 🚀 连接聊天服务 (user={})", self.config.user_id);
        self.push.connect().await
    }

    pub fn disconnect(&self) {
        self.push.disconnect();
    }

    pub fn is_connected(&self) -> bool {
        self.push.is_connected()
    }

    /// 打开会话：激活后拉取消息
    pub async fn open_conversation(&self, other_user_id: &str) -> FetchOutcome {
        self.guard.activate(other_user_id);
        let outcome = self.guard.fetch_messages(other_user_id).await;
        if matches!(outcome, FetchOutcome::Fetched { .. }) {
            self.directory.clear_unread(other_user_id);
        }
        outcome
    }

    pub fn close_conversation(&self) {
        self.guard.deactivate();
    }

    pub async fn send_message(&self, content: &str) -> SendOutcome {
        self.guard.send_message(content).await
    }

    pub fn active_messages(&self) -> Vec<ChatMessage> {
        self.guard.active_messages()
    }

    pub fn guard(&self) -> &ConversationSyncGuard {
        &self.guard
    }

    pub fn store(&self) -> &Arc<MessageStore> {
        &self.store
    }

    pub fn directory(&self) -> &Arc<ConversationDirectory> {
        &self.directory
    }

    /// 球队邀请服务（复用同一个带认证的 HTTP 客户端）
    pub fn team_invites(&self, listener: Arc<dyn TeamListener>) -> TeamInviteService {
        let api = Arc::new(TeamApi::new(self.http_client.clone(), self.config.api_url()));
        TeamInviteService::with_listener(api, listener)
    }

    pub fn team_api(&self) -> TeamApi {
        TeamApi::new(self.http_client.clone(), self.config.api_url())
    }
}

#[cfg(test)]
mod tests {
    use super::ChatClient;
    use crate::im::config::ClientConfig;
    use crate::im::conversation::{ChatListener, SendOutcome};
    use crate::im::message::ChatMessage;
    use std::time::Duration;

    fn unreachable_config() -> ClientConfig {
        let mut config = ClientConfig::new("7".to_string(), "token".to_string());
        // 保留端口，连接会立即被拒绝
        config.api_base_url = "http://127.0.0.1:9".to_string();
        config.request_timeout = Duration::from_secs(2);
        config
    }

    #[tokio::test]
    async fn unconnected_client_falls_back_to_http_and_reports_failure() {
        let client = ChatClient::new(unreachable_config()).unwrap();
        assert!(!client.is_connected());

        client.open_conversation("42").await;
        assert!(!client.guard().is_fetching());
        assert_eq!(client.guard().last_fetched_conversation(), None);

        assert_eq!(client.send_message("oi").await, SendOutcome::Failed);
        assert!(client.directory().list().is_empty());
        assert!(client.active_messages().is_empty());
    }

    #[tokio::test]
    async fn pushed_messages_count_unread_only_outside_active_conversation() {
        let client = ChatClient::new(unreachable_config()).unwrap();
        client.guard().activate("42");

        let pushed = [
            ("42", "tô vendo", "2026-10-19T12:00:00.000Z"),
            ("99", "bora?", "2026-10-19T12:01:00.000Z"),
            ("99", "responde", "2026-10-19T12:02:00.000Z"),
        ];
        for (peer, content, timestamp) in pushed {
            let message = ChatMessage {
                sender_id: peer.to_string(),
                receiver_id: "7".to_string(),
                content: content.to_string(),
                timestamp: timestamp.to_string(),
                ..Default::default()
            };
            client
                .forwarder
                .on_message_received(peer.to_string(), message)
                .await;
        }

        let list = client.directory().list();
        let unread = |id: &str| list.iter().find(|c| c.other_user_id == id).map(|c| c.unread_count);
        assert_eq!(unread("42"), Some(0));
        assert_eq!(unread("99"), Some(2));
        assert_eq!(list[0].other_user_id, "99");
        assert_eq!(list[0].last_message, "responde");
    }
}
