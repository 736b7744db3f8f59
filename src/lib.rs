pub mod im;

// 重新导出常用类型，方便外部使用
pub use im::{
    client::ChatClient,
    config::ClientConfig,
    conversation::{ChatListener, ConversationSyncGuard, FetchOutcome, SendOutcome},
    message::{ChatBackend, ChatMessage, ConversationMessageSink, MessageStore},
    push::{PushTransport, WsPushTransport},
};
