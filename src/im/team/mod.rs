//! 球队邀请模块

pub mod api;
pub mod listener;
pub mod models;

pub use api::{TeamApi, TeamBackend, TeamInviteService};
pub use listener::{EmptyTeamListener, TeamListener};
pub use models::{InviteAction, InviteStatus, TeamInvite};
