//! 聊天 HTTP API 客户端
//!
//! 负责消息拉取、标记已读和 HTTP 兜底发送

use crate::im::types::handle_http_response;
use anyhow::{Context, Result};
use async_trait::async_trait;
use tracing::{debug, info};
use uuid::Uuid;

/// 聊天后端接口（请求/响应通道）
#[async_trait]
pub trait ChatBackend: Send + Sync {
    /// 获取与 `other_user_id` 的会话消息，返回原始 JSON（由调用方规整）
    async fn get_conversation(&self, other_user_id: &str) -> Result<serde_json::Value>;

    /// 把与 `other_user_id` 的会话标记为已读（幂等）
    async fn mark_as_read(&self, other_user_id: &str) -> Result<()>;

    /// 通过 HTTP 发送消息，服务器确认后返回
    async fn send_message(&self, other_user_id: &str, content: &str) -> Result<()>;
}

/// 聊天相关的 HTTP API 客户端
pub struct ChatApi {
    client: reqwest::Client,
    api_url: String,
}

impl ChatApi {
    /// 创建新的聊天 API 客户端
    ///
    /// `client` 应该已经在外部配置好认证拦截器，`api_url` 以 `/api` 结尾
    pub fn new(client: reqwest::Client, api_url: String) -> Self {
        Self { client, api_url }
    }

    fn conversation_url(&self, other_user_id: &str) -> String {
        format!("{}/chats/conversation/{}", self.api_url, other_user_id)
    }
}

#[async_trait]
impl ChatBackend for ChatApi {
    async fn get_conversation(&self, other_user_id: &str) -> Result<serde_json::Value> {
        let operation_id = Uuid::new_v4().to_string();
        let url = self.conversation_url(other_user_id);

        info!("[ChatAPI] 📡 请求会话消息: {}", other_user_id);
        debug!("[ChatAPI]   请求URL: {}, 操作ID: {}", url, operation_id);

        let response = self
            .client
            .get(&url)
            .header("operationID", &operation_id)
            .send()
            .await
            .context("请求失败")?;

        handle_http_response(response, "会话消息").await
    }

    async fn mark_as_read(&self, other_user_id: &str) -> Result<()> {
        let operation_id = Uuid::new_v4().to_string();
        let url = format!("{}/read", self.conversation_url(other_user_id));

        debug!("[ChatAPI] 📖 标记已读: {}, 操作ID: {}", url, operation_id);

        let response = self
            .client
            .put(&url)
            .header("operationID", &operation_id)
            .send()
            .await
            .context("请求失败")?;

        handle_http_response(response, "标记已读").await?;
        Ok(())
    }

    async fn send_message(&self, other_user_id: &str, content: &str) -> Result<()> {
        let operation_id = Uuid::new_v4().to_string();
        let url = format!("{}/chats/send", self.api_url);

        info!("[ChatAPI] 📤 HTTP 发送消息给: {}", other_user_id);
        debug!("[ChatAPI]   请求URL: {}, 操作ID: {}", url, operation_id);

        let response = self
            .client
            .post(&url)
            .header("Content-Type", "application/json")
            .header("operationID", &operation_id)
            .json(&serde_json::json!({
                "receiverId": other_user_id,
                "content": content,
            }))
            .send()
            .await
            .context("请求失败")?;

        handle_http_response(response, "发送消息").await?;
        Ok(())
    }
}
