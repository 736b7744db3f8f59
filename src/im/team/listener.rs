//! 球队监听器回调接口

use async_trait::async_trait;

#[async_trait]
pub trait TeamListener: Send + Sync {
    /// 球队成员关系发生变化（接受或拒绝邀请之后）
    async fn on_teams_changed(&self);
}

/// 默认空实现（无操作）
pub struct EmptyTeamListener;

#[async_trait]
impl TeamListener for EmptyTeamListener {
    async fn on_teams_changed(&self) {}
}
