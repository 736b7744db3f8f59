//! 球队邀请 HTTP API 客户端

use crate::im::team::listener::{EmptyTeamListener, TeamListener};
use crate::im::team::models::{InviteAction, TeamInvite};
use crate::im::types::{handle_http_response, notice};
use anyhow::{Context, Result};
use async_trait::async_trait;
use std::sync::Arc;
use tracing::{debug, error, info};
use uuid::Uuid;

/// 球队邀请后端接口
#[async_trait]
pub trait TeamBackend: Send + Sync {
    /// 接受或拒绝邀请
    async fn respond_invite(&self, invite_id: &str, action: InviteAction) -> Result<()>;
}

/// 球队相关的 HTTP API 客户端
pub struct TeamApi {
    client: reqwest::Client,
    api_url: String,
}

impl TeamApi {
    /// `client` 应该已经在外部配置好认证拦截器，`api_url` 以 `/api` 结尾
    pub fn new(client: reqwest::Client, api_url: String) -> Self {
        Self { client, api_url }
    }

    /// 获取当前用户收到的邀请
    pub async fn get_my_invites(&self) -> Result<Vec<TeamInvite>> {
        let operation_id = Uuid::new_v4().to_string();
        let url = format!("{}/teams/invites", self.api_url);

        info!("[TeamAPI] 📡 请求邀请列表");
        debug!("[TeamAPI]   请求URL: {}, 操作ID: {}", url, operation_id);

        let response = self
            .client
            .get(&url)
            .header("operationID", &operation_id)
            .send()
            .await
            .context("请求失败")?;

        let body = handle_http_response(response, "邀请列表").await?;
        if body.is_null() {
            return Ok(Vec::new());
        }
        serde_json::from_value(body).context("解析邀请列表失败")
    }
}

#[async_trait]
impl TeamBackend for TeamApi {
    async fn respond_invite(&self, invite_id: &str, action: InviteAction) -> Result<()> {
        let operation_id = Uuid::new_v4().to_string();
        let url = format!(
            "{}/teams/invites/{}/{}",
            self.api_url,
            invite_id,
            action.path_segment()
        );

        info!("[TeamAPI] 📨 {:?} 邀请 {}", action, invite_id);
        debug!("[TeamAPI]   请求URL: {}, 操作ID: {}", url, operation_id);

        let response = self
            .client
            .post(&url)
            .header("operationID", &operation_id)
            .send()
            .await
            .context("请求失败")?;

        handle_http_response(response, "处理邀请").await?;
        Ok(())
    }
}

/// 邀请处理：解析 ID、调用后端、通知球队变化
pub struct TeamInviteService {
    backend: Arc<dyn TeamBackend>,
    listener: Arc<dyn TeamListener>,
}

impl TeamInviteService {
    pub fn new(backend: Arc<dyn TeamBackend>) -> Self {
        Self::with_listener(backend, Arc::new(EmptyTeamListener))
    }

    pub fn with_listener(backend: Arc<dyn TeamBackend>, listener: Arc<dyn TeamListener>) -> Self {
        Self { backend, listener }
    }

    /// 处理邀请
    ///
    /// 错误信息为面向用户的文案：缺少 ID 时固定提示，后端失败时带上错误详情。
    pub async fn respond(&self, invite: &TeamInvite, action: InviteAction) -> Result<(), String> {
        let invite_id = invite
            .resolve_id()
            .ok_or_else(|| notice::INVITE_ID_MISSING.to_string())?;

        if let Err(e) = self.backend.respond_invite(&invite_id, action).await {
            error!("[TeamAPI] ❌ 处理邀请 {} 失败: {:#}", invite_id, e);
            let detail = e.to_string();
            return Err(if detail.is_empty() {
                action.failure_notice().to_string()
            } else {
                detail
            });
        }

        self.listener.on_teams_changed().await;
        Ok(())
    }
}
