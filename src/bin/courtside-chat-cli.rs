//! 聊天 CLI 客户端（测试版）
//!
//! 连接推送通道，打开一个会话并打印历史消息，可选发送一条消息，然后持续监听新消息

use anyhow::Result;
use clap::Parser;
use courtside_chat_core::im::conversation::ChatListener;
use courtside_chat_core::{ChatClient, ChatMessage, ClientConfig, FetchOutcome};
use std::sync::Arc;
use tokio::time::{sleep, Duration};
use tracing::{error, info, warn};

/// 聊天 CLI 客户端
#[derive(Parser, Debug)]
#[command(name = "courtside-chat-cli")]
#[command(about = "聊天 CLI 客户端 - 用于测试会话同步和消息发送", long_about = None)]
struct Args {
    /// 当前用户 ID
    #[arg(short, long)]
    user: String,

    /// 认证 token
    #[arg(short, long, default_value = "")]
    token: String,

    /// 对方用户 ID（要打开的会话）
    #[arg(short, long)]
    peer: String,

    /// 要发送的消息（可选）
    #[arg(short, long)]
    message: Option<String>,

    /// API 地址（默认读取 COURTSIDE_API_URL）
    #[arg(long)]
    api_url: Option<String>,

    /// 运行时长（秒），0 表示持续运行
    #[arg(short, long, default_value = "0")]
    duration: u64,

    /// 日志级别（默认: info,courtside_chat_core=debug）
    #[arg(long, default_value = "info,courtside_chat_core=debug")]
    log_level: String,
}

/// 初始化日志（同时输出到 stdout 和文件）
fn init_logger(log_level: &str) -> Result<()> {
    use std::fs::OpenOptions;
    use std::io;
    use tracing_subscriber::prelude::*;
    use tracing_subscriber::EnvFilter;

    // 优先使用环境变量 RUST_LOG（如果设置了），否则使用命令行参数
    let filter_layer =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(log_level));

    let log_file = OpenOptions::new()
        .create(true)
        .append(true)
        .open("debug.log")?;

    let stdout_layer = tracing_subscriber::fmt::layer()
        .with_writer(io::stdout)
        .with_file(true)
        .with_line_number(true)
        .with_target(false)
        .with_ansi(true);

    let file_layer = tracing_subscriber::fmt::layer()
        .with_writer(log_file)
        .with_file(true)
        .with_line_number(true)
        .with_target(false)
        .with_ansi(false);

    tracing_subscriber::registry()
        .with(filter_layer)
        .with(stdout_layer)
        .with(file_layer)
        .init();

    info!("[CLI] 📝 日志已同时输出到控制台和文件: debug.log");
    Ok(())
}

/// 输出所有接收到的事件
struct CliChatListener;

#[async_trait::async_trait]
impl ChatListener for CliChatListener {
    async fn on_error(&self, message: String) {
        error!("[CLI/Chat] ❌ {}", message);
    }

    async fn on_conversation_updated(&self, conversation_id: String, content: String, timestamp: String) {
        info!(
            "[CLI/Chat] 🔄 会话更新: {} | {} | {}",
            conversation_id, timestamp, content
        );
    }

    async fn on_message_received(&self, conversation_id: String, message: ChatMessage) {
        info!(
            "[CLI/Chat] 📨 新消息 [{}] {}: {}",
            conversation_id, message.sender_id, message.content
        );
    }

    async fn on_connection_status_changed(&self, connected: bool, message: String) {
        if connected {
            info!("[CLI/Chat] 🔗 已连接: {}", message);
        } else {
            warn!("[CLI/Chat] 🔗 断开连接: {}", message);
        }
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    init_logger(&args.log_level)?;

    let mut config = ClientConfig::from_env(args.user.clone(), args.token.clone());
    if let Some(url) = &args.api_url {
        config.api_base_url = url.clone();
    }

    info!("[CLI] 🚀 聊天 CLI 客户端（测试模式）");
    info!("[CLI] 👤 用户: {}, 会话: {}", args.user, args.peer);
    info!("[CLI] 🌐 API: {}, WS: {}", config.api_url(), config.ws_url());

    let client = ChatClient::with_listener(config, Arc::new(CliChatListener))?;

    if let Err(e) = client.connect().await {
        warn!("[CLI] ⚠️ 推送通道连接失败，发送将走 HTTP: {:#}", e);
    }

    match client.open_conversation(&args.peer).await {
        FetchOutcome::Fetched { count } => {
            info!("[CLI] 📋 历史消息（共 {} 条）:", count);
            for msg in client.active_messages() {
                info!("[CLI]   - [{}] {}: {}", msg.timestamp, msg.sender_id, msg.content);
            }
        }
        other => warn!("[CLI] ⚠️ 拉取历史消息未完成: {:?}", other),
    }

    if let Some(content) = &args.message {
        let outcome = client.send_message(content).await;
        info!("[CLI] 📤 发送结果: {:?}", outcome);
    }

    info!("[CLI] 📥 开始监听消息...");
    if args.duration > 0 {
        info!("[CLI] ⏰ {} 秒后自动退出", args.duration);
        sleep(Duration::from_secs(args.duration)).await;
    } else {
        info!("[CLI] ⏰ 持续运行中，按 Ctrl+C 退出");
        tokio::signal::ctrl_c().await?;
    }

    client.disconnect();
    info!("[CLI] 👋 程序退出");
    Ok(())
}
