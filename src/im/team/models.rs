//! 球队邀请模型

use serde::{Deserialize, Serialize};

/// 邀请状态
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum InviteStatus {
    Pending,
    Accepted,
    Rejected,
    /// 未识别的状态，原样保留
    #[serde(untagged)]
    Other(String),
}

impl InviteStatus {
    /// 界面显示文案
    pub fn label(&self) -> &str {
        match self {
            InviteStatus::Pending => "Pendente",
            InviteStatus::Accepted => "Aceito",
            InviteStatus::Rejected => "Rejeitado",
            InviteStatus::Other(raw) => raw,
        }
    }
}

/// 对邀请的操作
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InviteAction {
    Accept,
    Reject,
}

impl InviteAction {
    pub(crate) fn path_segment(self) -> &'static str {
        match self {
            InviteAction::Accept => "accept",
            InviteAction::Reject => "reject",
        }
    }

    /// 服务器没给出错误信息时的兜底提示
    pub fn failure_notice(self) -> &'static str {
        match self {
            InviteAction::Accept => "Falha ao aceitar convite.",
            InviteAction::Reject => "Falha ao rejeitar convite.",
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TeamRef {
    #[serde(default)]
    pub name_team: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct InviterRef {
    #[serde(default)]
    pub username: Option<String>,
}

/// 嵌套的邀请主体（部分接口把字段包在 `invite` 里）
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NestedInvite {
    #[serde(default)]
    pub id: Option<serde_json::Value>,
    #[serde(default)]
    pub created_at: Option<String>,
}

/// 球队邀请（服务器多个接口的字段形状不一致，全部可选）
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TeamInvite {
    #[serde(default)]
    pub id: Option<serde_json::Value>,
    #[serde(default)]
    pub invite_id: Option<serde_json::Value>,
    #[serde(default)]
    pub invite: Option<NestedInvite>,
    #[serde(default)]
    pub team: Option<TeamRef>,
    #[serde(default)]
    pub inviter: Option<InviterRef>,
    #[serde(default)]
    pub status: Option<InviteStatus>,
    #[serde(default)]
    pub invite_status: Option<InviteStatus>,
    #[serde(default)]
    pub created_at: Option<String>,
}

fn id_to_string(value: &serde_json::Value) -> Option<String> {
    match value {
        serde_json::Value::String(s) if !s.is_empty() => Some(s.clone()),
        serde_json::Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}

impl TeamInvite {
    /// 依次尝试 `id`、`inviteId`、`invite.id`
    pub fn resolve_id(&self) -> Option<String> {
        self.id
            .as_ref()
            .and_then(id_to_string)
            .or_else(|| self.invite_id.as_ref().and_then(id_to_string))
            .or_else(|| {
                self.invite
                    .as_ref()
                    .and_then(|inv| inv.id.as_ref())
                    .and_then(id_to_string)
            })
    }

    /// 状态缺失时视为待处理
    pub fn status(&self) -> InviteStatus {
        self.status
            .clone()
            .or_else(|| self.invite_status.clone())
            .unwrap_or(InviteStatus::Pending)
    }

    pub fn is_pending(&self) -> bool {
        self.status() == InviteStatus::Pending
    }

    pub fn team_name(&self) -> &str {
        self.team
            .as_ref()
            .and_then(|t| t.name_team.as_deref())
            .unwrap_or("(time)")
    }

    pub fn inviter_username(&self) -> &str {
        self.inviter
            .as_ref()
            .and_then(|i| i.username.as_deref())
            .unwrap_or("(remetente)")
    }

    pub fn created_at(&self) -> Option<&str> {
        self.created_at
            .as_deref()
            .or_else(|| self.invite.as_ref().and_then(|i| i.created_at.as_deref()))
    }
}
