//! 消息模块
//!
//! 消息模型、HTTP 接口和内存存储

pub mod api;
pub mod models;
pub mod store;

// 重新导出主要类型和函数
pub use api::{ChatApi, ChatBackend};
pub use models::{coerce_messages, ChatMessage};
pub use store::{ConversationMessageSink, MessageStore};
