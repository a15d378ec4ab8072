//! TEE注册服务客户端
//!
//! 子域名的实际注册由外部TEE服务完成，本客户端只调用其文档化接口：
//! POST {TEE_URL}/api/register
//!
//! 注册是有副作用的操作，传输失败不自动重试（由调用方决定是否重试）

use std::time::{Duration, Instant};

use async_trait::async_trait;
use axum::http::StatusCode;
use serde::{Deserialize, Serialize};

use crate::config::TeeConfig;

#[derive(Debug, thiserror::Error)]
pub enum TeeError {
    #[error("tee request timed out")]
    Timeout,
    #[error("tee transport failure: {0}")]
    Transport(String),
    #[error("tee rejected registration (status {status})")]
    Rejected { status: u16 },
    #[error("tee returned an unreadable response: {0}")]
    Protocol(String),
}

/// 子域名注册服务抽象，测试中可替换为桩实现
#[async_trait]
pub trait RegistrationService: Send + Sync {
    /// 注册一个标签，返回注册成功的子域名标签
    async fn register_subdomain(
        &self,
        label: &str,
        intmax_address: &str,
    ) -> Result<String, TeeError>;
}

#[derive(Debug, Serialize)]
struct RegisterRequest<'a> {
    name: &'a str,
    address: &'a str,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct RegisterReply {
    new_subdomain: Option<String>,
}

#[derive(Clone)]
pub struct TeeClient {
    base_url: String,
    client: reqwest::Client,
}

impl TeeClient {
    pub fn new(config: &TeeConfig) -> Result<Self, anyhow::Error> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_millis(config.timeout_ms))
            .build()?;
        Ok(Self {
            base_url: config.url.trim_end_matches('/').to_string(),
            client,
        })
    }

    /// 原样转发任意JSON体到TEE服务，透传其状态码与响应体
    pub async fn forward(
        &self,
        body: &serde_json::Value,
    ) -> Result<(StatusCode, serde_json::Value), TeeError> {
        let url = format!("{}/api/register", self.base_url);
        let start = Instant::now();

        let resp = self.client.post(&url).json(body).send().await.map_err(|e| {
            crate::metrics::observe_upstream_latency_ms(start.elapsed().as_millis(), false);
            if e.is_timeout() {
                TeeError::Timeout
            } else {
                TeeError::Transport(e.to_string())
            }
        })?;

        let status =
            StatusCode::from_u16(resp.status().as_u16()).unwrap_or(StatusCode::BAD_GATEWAY);
        let value = resp
            .json::<serde_json::Value>()
            .await
            .unwrap_or(serde_json::Value::Null);
        crate::metrics::observe_upstream_latency_ms(
            start.elapsed().as_millis(),
            status.is_success(),
        );
        Ok((status, value))
    }
}

#[async_trait]
impl RegistrationService for TeeClient {
    async fn register_subdomain(
        &self,
        label: &str,
        intmax_address: &str,
    ) -> Result<String, TeeError> {
        let url = format!("{}/api/register", self.base_url);
        let req = RegisterRequest {
            name: label,
            address: intmax_address,
        };
        let start = Instant::now();

        let resp = self.client.post(&url).json(&req).send().await.map_err(|e| {
            crate::metrics::observe_upstream_latency_ms(start.elapsed().as_millis(), false);
            if e.is_timeout() {
                TeeError::Timeout
            } else {
                TeeError::Transport(e.to_string())
            }
        })?;

        let status = resp.status();
        crate::metrics::observe_upstream_latency_ms(
            start.elapsed().as_millis(),
            status.is_success(),
        );
        if !status.is_success() {
            return Err(TeeError::Rejected {
                status: status.as_u16(),
            });
        }

        let reply = resp
            .json::<RegisterReply>()
            .await
            .map_err(|e| TeeError::Protocol(e.to_string()))?;
        Ok(reply.new_subdomain.unwrap_or_else(|| label.to_string()))
    }
}
