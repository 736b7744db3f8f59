//! 客户端配置
//!
//! API 地址规则：`api_url()` 总是以 `/api` 结尾，`base_url()` 总是不带 `/api`。

use anyhow::{Context, Result};
use std::time::Duration;

/// 读取 API 地址的环境变量
pub const API_URL_ENV: &str = "COURTSIDE_API_URL";

/// 未配置时的默认 API 地址
pub const DEFAULT_API_URL: &str = "http://localhost:8080";

/// 客户端配置
#[derive(Clone, Debug)]
pub struct ClientConfig {
    /// 当前登录用户 ID
    pub user_id: String,
    /// 认证 token（Bearer）
    pub token: String,
    /// 原始 API 地址，可带或不带 `/api` 后缀
    pub api_base_url: String,
    /// WebSocket 地址，为空时由 `base_url()` 推导
    pub ws_url: String,
    /// HTTP 请求超时
    pub request_timeout: Duration,
    /// WebSocket 心跳间隔
    pub heartbeat_interval: Duration,
}

impl ClientConfig {
    /// 创建默认配置
    pub fn new(user_id: String, token: String) -> Self {
        Self {
            user_id,
            token,
            api_base_url: DEFAULT_API_URL.to_string(),
            ws_url: String::new(),
            request_timeout: Duration::from_secs(15),
            heartbeat_interval: Duration::from_secs(25),
        }
    }

    /// 从环境变量读取 API 地址，其余字段使用默认值
    pub fn from_env(user_id: String, token: String) -> Self {
        let mut config = Self::new(user_id, token);
        if let Ok(url) = std::env::var(API_URL_ENV) {
            if !url.trim().is_empty() {
                config.api_base_url = url.trim().to_string();
            }
        }
        config
    }

    /// 带 `/api` 后缀的 API 地址
    pub fn api_url(&self) -> String {
        let base = self.api_base_url.trim_end_matches('/');
        if base.ends_with("/api") {
            base.to_string()
        } else {
            format!("{}/api", base)
        }
    }

    /// 不带 `/api` 后缀的基础地址（用于 WebSocket 等）
    pub fn base_url(&self) -> String {
        let base = self.api_base_url.trim_end_matches('/');
        base.strip_suffix("/api").unwrap_or(base).to_string()
    }

    /// WebSocket 地址：显式配置优先，否则 `http(s)` 换成 `ws(s)` 并追加 `/ws`
    pub fn ws_url(&self) -> String {
        if !self.ws_url.is_empty() {
            return self.ws_url.clone();
        }
        let base = self.base_url();
        let ws_base = if let Some(rest) = base.strip_prefix("https://") {
            format!("wss://{}", rest)
        } else if let Some(rest) = base.strip_prefix("http://") {
            format!("ws://{}", rest)
        } else {
            base
        };
        format!("{}/ws", ws_base)
    }

    /// 创建带认证拦截器的 HTTP 客户端（token 通过 default_headers 自动添加）
    pub fn build_http_client(&self) -> Result<reqwest::Client> {
        let mut headers = reqwest::header::HeaderMap::new();
        if !self.token.is_empty() {
            headers.insert(
                reqwest::header::AUTHORIZATION,
                reqwest::header::HeaderValue::from_str(&format!("Bearer {}", self.token))
                    .context("无效的 token")?,
            );
        }
        reqwest::ClientBuilder::new()
            .default_headers(headers)
            .timeout(self.request_timeout)
            .build()
            .context("创建 HTTP 客户端失败")
    }
}

#[cfg(test)]
mod tests {
    use super::ClientConfig;

    fn config_with(url: &str) -> ClientConfig {
        let mut config = ClientConfig::new("7".to_string(), "t".to_string());
        config.api_base_url = url.to_string();
        config
    }

    #[test]
    fn api_url_always_has_single_api_suffix() {
        assert_eq!(config_with("http://localhost:8080").api_url(), "http://localhost:8080/api");
        assert_eq!(config_with("http://localhost:8080/api").api_url(), "http://localhost:8080/api");
        assert_eq!(config_with("https://x.dev/api/").api_url(), "https://x.dev/api");
    }

    #[test]
    fn base_url_strips_api_suffix() {
        assert_eq!(config_with("http://localhost:8080/api").base_url(), "http://localhost:8080");
        assert_eq!(config_with("http://localhost:8080").base_url(), "http://localhost:8080");
    }

    #[test]
    fn ws_url_is_derived_from_base_url() {
        assert_eq!(config_with("http://localhost:8080/api").ws_url(), "ws://localhost:8080/ws");
        assert_eq!(config_with("https://quadra.app").ws_url(), "wss://quadra.app/ws");

        let mut explicit = config_with("http://localhost:8080");
        explicit.ws_url = "ws://push:9000/socket".to_string();
        assert_eq!(explicit.ws_url(), "ws://push:9000/socket");
    }

    #[test]
    fn http_client_builds_with_and_without_token() {
        assert!(config_with("http://localhost:8080").build_http_client().is_ok());
        let anonymous = ClientConfig::new("7".to_string(), String::new());
        assert!(anonymous.build_http_client().is_ok());
    }
}
