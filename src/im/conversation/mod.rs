//! 会话模块
//!
//! 会话同步守卫、监听器和会话列表

pub mod directory;
pub mod listener;
pub mod models;
pub mod service;

// 重新导出主要类型和函数
pub use directory::ConversationDirectory;
pub use listener::{ChatListener, EmptyChatListener};
pub use models::{ConversationSummary, CurrentUser, FetchOutcome, SendOutcome};
pub use service::ConversationSyncGuard;
