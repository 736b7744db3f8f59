//! WebSocket 推送通道
//!
//! 低延迟的发送通道：只返回"是否已接受"，不等待服务器确认。
//! 同一条连接上收到的新消息写入消息存储，这是消息在界面上出现的唯一途径。

use crate::im::config::ClientConfig;
use crate::im::conversation::listener::ChatListener;
use crate::im::message::models::ChatMessage;
use crate::im::message::store::MessageStore;
use anyhow::{Context, Result};
use futures_util::stream::SplitStream;
use futures_util::{SinkExt, StreamExt};
use serde::{Deserialize, Serialize};
use std::sync::{Arc, Mutex, PoisonError};
use tokio::net::TcpStream;
use tokio::sync::mpsc;
use tokio::time::interval;
use tokio_tungstenite::{connect_async, tungstenite::Message as WsMessage};
use tokio_tungstenite::{MaybeTlsStream, WebSocketStream};
use tracing::{debug, error, info, warn};

/// WebSocket 读取端类型别名
pub type WsReader = SplitStream<WebSocketStream<MaybeTlsStream<TcpStream>>>;

type OutboundSlot = Arc<Mutex<Option<mpsc::UnboundedSender<WsMessage>>>>;

/// 推送通道接口
pub trait PushTransport: Send + Sync {
    /// 尝试发送；`true` 表示已接受投递，`false` 表示调用方需要走兜底通道
    fn send_message(&self, other_user_id: &str, content: &str) -> bool;
}

/// 发送帧
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct SendFrame<'a> {
    #[serde(rename = "type")]
    kind: &'static str,
    receiver_id: &'a str,
    content: &'a str,
}

/// 服务器推送帧
#[derive(Debug, Deserialize)]
#[serde(tag = "type")]
enum PushFrame {
    #[serde(rename = "chat.message")]
    ChatMessage { message: ChatMessage },
    #[serde(other)]
    Unknown,
}

/// 基于 tokio-tungstenite 的推送通道
pub struct WsPushTransport {
    config: ClientConfig,
    outbound: OutboundSlot,
    store: Arc<MessageStore>,
    listener: Arc<dyn ChatListener>,
}

impl WsPushTransport {
    pub fn new(config: ClientConfig, store: Arc<MessageStore>, listener: Arc<dyn ChatListener>) -> Self {
        Self {
            config,
            outbound: Arc::new(Mutex::new(None)),
            store,
            listener,
        }
    }

    /// 是否已连接（写入任务仍在运行）
    pub fn is_connected(&self) -> bool {
        self.outbound
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .as_ref()
            .map(|tx| !tx.is_closed())
            .unwrap_or(false)
    }

    /// 构建 WebSocket 连接 URL
    fn build_url(&self) -> Result<String> {
        let mut url = reqwest::Url::parse(&self.config.ws_url())
            .with_context(|| format!("无效的 WebSocket 地址: {}", self.config.ws_url()))?;
        url.query_pairs_mut()
            .append_pair("token", &self.config.token)
            .append_pair("userID", &self.config.user_id);
        Ok(url.into())
    }

    /// 连接到服务器并在内部启动读写任务和心跳
    pub async fn connect(&self) -> Result<()> {
        info!("[WsPush] 🔗 连接推送通道 (user={})", self.config.user_id);
        debug!("[WsPush]   URL: {}", self.config.ws_url());

        let (ws_stream, response) = connect_async(self.build_url()?)
            .await
            .context("WebSocket 连接失败")?;
        info!("[WsPush] ✅ WebSocket 连接成功, 状态: {}", response.status());

        let (mut write, read) = ws_stream.split();
        let (tx, mut rx) = mpsc::unbounded_channel::<WsMessage>();
        *self.outbound.lock().unwrap_or_else(PoisonError::into_inner) = Some(tx.clone());

        // 写入任务：串行发送所有出站帧
        tokio::spawn(async move {
            while let Some(msg) = rx.recv().await {
                let closing = matches!(msg, WsMessage::Close(_));
                if let Err(e) = write.send(msg).await {
                    error!("[WsPush] ❌ 写入失败: {}", e);
                    break;
                }
                if closing {
                    break;
                }
            }
            debug!("[WsPush] 写入任务结束");
        });

        // 心跳
        let heartbeat_tx = tx;
        let heartbeat_interval = self.config.heartbeat_interval;
        tokio::spawn(async move {
            let mut ticker = interval(heartbeat_interval);
            loop {
                ticker.tick().await;
                if heartbeat_tx.send(WsMessage::Ping(vec![])).is_err() {
                    break;
                }
            }
        });

        self.listener
            .on_connection_status_changed(true, "conectado".to_string())
            .await;

        // 读取任务
        let store = self.store.clone();
        let listener = self.listener.clone();
        let outbound = self.outbound.clone();
        let user_id = self.config.user_id.clone();
        tokio::spawn(async move {
            handle_messages(read, &store, listener.as_ref(), &user_id).await;
            outbound.lock().unwrap_or_else(PoisonError::into_inner).take();
            listener
                .on_connection_status_changed(false, "desconectado".to_string())
                .await;
        });

        Ok(())
    }

    /// 主动断开：发送 Close 帧并释放发送端
    pub fn disconnect(&self) {
        if let Some(tx) = self
            .outbound
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .take()
        {
            info!("[WsPush] 👋 主动断开推送通道");
            let _ = tx.send(WsMessage::Close(None));
        }
    }
}

impl PushTransport for WsPushTransport {
    fn send_message(&self, other_user_id: &str, content: &str) -> bool {
        let guard = self.outbound.lock().unwrap_or_else(PoisonError::into_inner);
        let Some(tx) = guard.as_ref() else {
            debug!("[WsPush] 未连接，无法推送");
            return false;
        };

        let frame = SendFrame {
            kind: "chat.send",
            receiver_id: other_user_id,
            content,
        };
        let text = match serde_json::to_string(&frame) {
            Ok(text) => text,
            Err(e) => {
                error!("[WsPush] ❌ 序列化发送帧失败: {}", e);
                return false;
            }
        };

        tx.send(WsMessage::Text(text)).is_ok()
    }
}

/// 处理接收消息（事件循环）
async fn handle_messages(mut read: WsReader, store: &MessageStore, listener: &dyn ChatListener, user_id: &str) {
    while let Some(msg_result) = read.next().await {
        match msg_result {
            Ok(WsMessage::Text(text)) => {
                handle_text_frame(&text, store, listener, user_id).await;
            }
            Ok(WsMessage::Ping(_)) | Ok(WsMessage::Pong(_)) => {}
            Ok(WsMessage::Close(frame)) => {
                warn!("[WsPush] 👋 连接关闭: {:?}", frame);
                break;
            }
            Err(e) => {
                error!("[WsPush] WebSocket 错误: {}", e);
                break;
            }
            _ => {}
        }
    }
}

/// 解析一条文本帧；新消息写入存储并通知监听器
async fn handle_text_frame(text: &str, store: &MessageStore, listener: &dyn ChatListener, user_id: &str) {
    let frame = match serde_json::from_str::<PushFrame>(text) {
        Ok(frame) => frame,
        Err(e) => {
            warn!("[WsPush] ⚠️ 无法解析推送帧: {}, 原始数据: {}", e, text);
            return;
        }
    };

    match frame {
        PushFrame::ChatMessage { message } => {
            let conversation_id = peer_of(&message, user_id).to_string();
            info!("[WsPush] 📨 收到新消息: conversation={}", conversation_id);
            store.append_message(&conversation_id, message.clone());
            listener.on_message_received(conversation_id, message).await;
        }
        PushFrame::Unknown => {
            debug!("[WsPush] 忽略未知推送帧: {}", text);
        }
    }
}

/// 消息所属会话：对方的用户 ID
fn peer_of<'a>(message: &'a ChatMessage, user_id: &str) -> &'a str {
    if message.sender_id == user_id {
        &message.receiver_id
    } else {
        &message.sender_id
    }
}
