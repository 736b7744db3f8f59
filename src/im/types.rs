use anyhow::Context;
use tracing::{debug, error};

/// 面向用户的通用错误提示（葡萄牙语，与前端文案保持一致）
pub mod notice {
    /// 拉取消息或标记已读失败
    pub const FETCH_MESSAGES_FAILED: &str = "Erro ao carregar mensagens.";
    /// HTTP 兜底发送失败
    pub const SEND_MESSAGE_FAILED: &str = "Erro ao enviar mensagem.";
    /// 邀请缺少 ID
    pub const INVITE_ID_MISSING: &str = "Invite id ausente na requisição.";
}

/// 通用 HTTP 响应处理函数：检查状态码并把 body 解析为 JSON
///
/// 空 body（例如 204）解析为 `Value::Null`，由调用方决定如何解释。
pub async fn handle_http_response(
    response: reqwest::Response,
    operation_name: &str,
) -> anyhow::Result<serde_json::Value> {
    let status = response.status();

    // 读取 body bytes（只能读取一次）
    let body_bytes = response.bytes().await.context("读取响应 body 失败")?;
    let body_str = String::from_utf8_lossy(&body_bytes);
    debug!("[HTTP] {}响应 Body: {}", operation_name, body_str);

    if !status.is_success() {
        error!(
            "[HTTP] {}请求失败，HTTP状态: {}, 响应: {}",
            operation_name, status, body_str
        );
        return Err(anyhow::anyhow!("HTTP 错误 {}: {}", status, body_str));
    }
    debug!("[HTTP] {}请求成功，HTTP状态: {}", operation_name, status);

    if body_bytes.iter().all(|b| b.is_ascii_whitespace()) {
        return Ok(serde_json::Value::Null);
    }

    serde_json::from_slice(&body_bytes).map_err(|e| {
        error!(
            "[HTTP] {}反序列化失败: {:?}\n原始响应: {}",
            operation_name, e, body_str
        );
        anyhow::anyhow!("反序列化响应失败: {:?}", e)
    })
}
