//! 会话同步守卫
//!
//! 每次激活会话最多拉取一次消息历史并标记已读；发送消息时优先走推送通道，
//! 推送通道拒绝后再走 HTTP 兜底。拉取入口的检查和置位在同一把锁内完成，
//! 并且在第一次 await 之前；复位由作用域守卫负责，任何退出路径（包括 future 被丢弃）都会执行。

use crate::im::conversation::listener::{ChatListener, EmptyChatListener};
use crate::im::conversation::models::{CurrentUser, FetchOutcome, SendOutcome};
use crate::im::message::api::ChatBackend;
use crate::im::message::models::{coerce_messages, ChatMessage};
use crate::im::message::store::ConversationMessageSink;
use crate::im::push::PushTransport;
use crate::im::types::notice;
use anyhow::Result;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use tracing::{debug, error, info};

/// 守卫内部状态
#[derive(Debug, Default)]
struct GuardState {
    /// 当前活跃会话（对方用户 ID）
    active_conversation: Option<String>,
    /// 当前登录用户
    current_user: Option<CurrentUser>,
    /// 最近一次成功拉取的会话
    last_fetched_conversation: Option<String>,
    /// 是否有拉取在进行中
    is_fetching: bool,
    /// 对调用方可见的加载状态
    loading_messages: bool,
}

/// 拉取许可：Drop 时复位 `is_fetching` 和 `loading_messages`
struct FetchPermit<'a> {
    state: &'a Mutex<GuardState>,
}

impl Drop for FetchPermit<'_> {
    fn drop(&mut self) {
        let mut state = self.state.lock().unwrap_or_else(PoisonError::into_inner);
        state.is_fetching = false;
        state.loading_messages = false;
    }
}

/// 发送标记：Drop 时复位 `sending`
struct SendingFlag<'a>(&'a AtomicBool);

impl Drop for SendingFlag<'_> {
    fn drop(&mut self) {
        self.0.store(false, Ordering::SeqCst);
    }
}

/// 会话同步守卫
pub struct ConversationSyncGuard {
    backend: Arc<dyn ChatBackend>,
    push: Arc<dyn PushTransport>,
    sink: Arc<dyn ConversationMessageSink>,
    listener: Arc<dyn ChatListener>,
    state: Mutex<GuardState>,
    sending: AtomicBool,
}

impl ConversationSyncGuard {
    /// 创建新的同步守卫（使用默认空监听器）
    pub fn new(
        backend: Arc<dyn ChatBackend>,
        push: Arc<dyn PushTransport>,
        sink: Arc<dyn ConversationMessageSink>,
    ) -> Self {
        Self::with_listener(backend, push, sink, Arc::new(EmptyChatListener))
    }

    /// 创建新的同步守卫（带自定义监听器）
    pub fn with_listener(
        backend: Arc<dyn ChatBackend>,
        push: Arc<dyn PushTransport>,
        sink: Arc<dyn ConversationMessageSink>,
        listener: Arc<dyn ChatListener>,
    ) -> Self {
        Self {
            backend,
            push,
            sink,
            listener,
            state: Mutex::new(GuardState::default()),
            sending: AtomicBool::new(false),
        }
    }

    fn state(&self) -> MutexGuard<'_, GuardState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// 设置或清除当前登录用户
    pub fn set_current_user(&self, user: Option<CurrentUser>) {
        self.state().current_user = user;
    }

    /// 激活会话
    ///
    /// 与最近拉取的会话不同则清空记录，让下一次拉取不被跳过。不会主动拉取。
    /// 空 ID 等同于没有活跃会话，拉取记录保持不变。
    pub fn activate(&self, conversation_id: &str) {
        let mut state = self.state();
        if conversation_id.is_empty() {
            state.active_conversation = None;
            return;
        }
        if state.last_fetched_conversation.as_deref() != Some(conversation_id) {
            debug!(
                "[ChatSync] 切换会话 {} ，重置拉取记录 (上次: {:?})",
                conversation_id, state.last_fetched_conversation
            );
            state.last_fetched_conversation = None;
        }
        state.active_conversation = Some(conversation_id.to_string());
    }

    /// 清除活跃会话，拉取记录保持不变
    pub fn deactivate(&self) {
        self.state().active_conversation = None;
    }

    pub fn active_conversation(&self) -> Option<String> {
        self.state().active_conversation.clone()
    }

    pub fn last_fetched_conversation(&self) -> Option<String> {
        self.state().last_fetched_conversation.clone()
    }

    pub fn is_fetching(&self) -> bool {
        self.state().is_fetching
    }

    pub fn is_loading_messages(&self) -> bool {
        self.state().loading_messages
    }

    pub fn is_sending(&self) -> bool {
        self.sending.load(Ordering::SeqCst)
    }

    /// 活跃会话的消息；没有活跃会话或没有缓存时返回空列表
    pub fn active_messages(&self) -> Vec<ChatMessage> {
        match self.active_conversation() {
            Some(id) => self.sink.conversation_messages(&id),
            None => Vec::new(),
        }
    }

    /// 尝试进入拉取状态；已在拉取中或已同步过该会话时返回 None
    fn try_begin_fetch(&self, conversation_id: &str) -> Option<FetchPermit<'_>> {
        let mut state = self.state();
        if state.is_fetching || state.last_fetched_conversation.as_deref() == Some(conversation_id) {
            return None;
        }
        state.is_fetching = true;
        state.loading_messages = true;
        Some(FetchPermit { state: &self.state })
    }

    /// 拉取会话消息并标记已读
    pub async fn fetch_messages(&self, conversation_id: &str) -> FetchOutcome {
        let Some(_permit) = self.try_begin_fetch(conversation_id) else {
            debug!("[ChatSync] 跳过重复拉取: {}", conversation_id);
            return FetchOutcome::Skipped;
        };

        info!("[ChatSync] 📥 拉取会话消息: {}", conversation_id);

        match self.fetch_and_mark_read(conversation_id).await {
            Ok(count) => {
                self.state().last_fetched_conversation = Some(conversation_id.to_string());
                info!(
                    "[ChatSync] ✅ 会话 {} 同步完成，消息数: {}",
                    conversation_id, count
                );
                FetchOutcome::Fetched { count }
            }
            Err(e) => {
                error!("[ChatSync] ❌ 拉取会话 {} 失败: {:#}", conversation_id, e);
                self.listener
                    .on_error(notice::FETCH_MESSAGES_FAILED.to_string())
                    .await;
                FetchOutcome::Failed
            }
        }
    }

    /// 存储写入发生在标记已读之前：只有标记已读失败时，消息保留但会话仍算未同步
    async fn fetch_and_mark_read(&self, conversation_id: &str) -> Result<usize> {
        let raw = self.backend.get_conversation(conversation_id).await?;
        let messages = coerce_messages(raw);
        let count = messages.len();
        self.sink.set_conversation_messages(conversation_id, messages);

        self.backend.mark_as_read(conversation_id).await?;
        Ok(count)
    }

    /// 发送消息到活跃会话
    ///
    /// 不做乐观插入：消息只会通过推送通道回显出现在存储里。
    pub async fn send_message(&self, content: &str) -> SendOutcome {
        let conversation_id = {
            let state = self.state();
            match (&state.active_conversation, &state.current_user) {
                (Some(id), Some(_)) if !id.is_empty() => id.clone(),
                _ => {
                    debug!("[ChatSync] 没有活跃会话或未登录，忽略发送");
                    return SendOutcome::Skipped;
                }
            }
        };

        self.sending.store(true, Ordering::SeqCst);
        let _sending = SendingFlag(&self.sending);

        let outcome = if self.push.send_message(&conversation_id, content) {
            info!("[ChatSync] 📤 已通过推送通道发送: {}", conversation_id);
            SendOutcome::Pushed
        } else {
            info!("[ChatSync] 🔁 推送通道不可用，HTTP 兜底发送: {}", conversation_id);
            match self.backend.send_message(&conversation_id, content).await {
                Ok(()) => SendOutcome::SentViaHttp,
                Err(e) => {
                    error!("[ChatSync] ❌ 发送消息失败: {:#}", e);
                    self.listener
                        .on_error(notice::SEND_MESSAGE_FAILED.to_string())
                        .await;
                    return SendOutcome::Failed;
                }
            }
        };

        let timestamp = chrono::Utc::now().to_rfc3339_opts(chrono::SecondsFormat::Millis, true);
        self.listener
            .on_conversation_updated(conversation_id, content.to_string(), timestamp)
            .await;
        outcome
    }
}
