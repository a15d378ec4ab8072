//! Intmax二级账户网关
//!
//! 应用只调用二级账户系统的文档化接口：建立会话、查询转账/充值列表。
//! 读接口幂等，带超时与有限重试（指数回退）；登录是交互性操作，不重试。

use std::time::{Duration, Instant};

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tokio::sync::RwLock;

use crate::{config::IntmaxConfig, service::transactions::RawTransaction};

#[derive(Debug, thiserror::Error)]
pub enum GatewayError {
    #[error("intmax request timed out")]
    Timeout,
    #[error("intmax transport failure: {0}")]
    Transport(String),
    #[error("intmax returned an unreadable response: {0}")]
    Protocol(String),
    #[error("no secondary account session")]
    NotLoggedIn,
}

/// 二级账户会话：登录后才有地址
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SecondarySession {
    pub address: String,
}

/// 二级账户系统抽象，测试中可替换为桩实现
#[async_trait]
pub trait SecondaryAccountGateway: Send + Sync {
    /// 返回已有会话；未登录时触发交互式登录
    async fn ensure_session(&self) -> Result<SecondarySession, GatewayError>;

    /// 当前已知的二级账户地址（未登录时为 None），不触发登录
    async fn session_address(&self) -> Option<String>;

    async fn fetch_transfers(&self, address: &str) -> Result<Vec<RawTransaction>, GatewayError>;

    async fn fetch_deposits(&self, address: &str) -> Result<Vec<RawTransaction>, GatewayError>;
}

pub struct IntmaxClient {
    base_url: String,
    client: reqwest::Client,
    retries: usize,
    session: RwLock<Option<SecondarySession>>,
}

impl IntmaxClient {
    pub fn new(config: &IntmaxConfig) -> Result<Self, anyhow::Error> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_millis(config.timeout_ms))
            .build()?;
        Ok(Self {
            base_url: config.url.trim_end_matches('/').to_string(),
            client,
            retries: config.retries,
            session: RwLock::new(None),
        })
    }

    /// 幂等GET，带有限重试与指数回退
    async fn get_json<T: for<'de> serde::Deserialize<'de>>(
        &self,
        url: &str,
    ) -> Result<T, GatewayError> {
        let mut attempt = 0usize;
        let mut last_err = GatewayError::Transport("request not attempted".into());
        loop {
            let start = Instant::now();
            match self.client.get(url).send().await {
                Ok(resp) if resp.status().is_success() => {
                    let v = resp
                        .json::<T>()
                        .await
                        .map_err(|e| GatewayError::Protocol(e.to_string()))?;
                    crate::metrics::observe_upstream_latency_ms(start.elapsed().as_millis(), true);
                    return Ok(v);
                }
                Ok(resp) => {
                    crate::metrics::observe_upstream_latency_ms(start.elapsed().as_millis(), false);
                    tracing::debug!(status = %resp.status(), url, "intmax request failed");
                    last_err =
                        GatewayError::Transport(format!("unexpected status {}", resp.status()));
                    attempt += 1;
                }
                Err(e) => {
                    crate::metrics::observe_upstream_latency_ms(start.elapsed().as_millis(), false);
                    last_err = if e.is_timeout() {
                        GatewayError::Timeout
                    } else {
                        GatewayError::Transport(e.to_string())
                    };
                    attempt += 1;
                }
            }
            if attempt > self.retries {
                return Err(last_err);
            }
            // 简单指数回退，最大 ~1600ms
            let backoff = 50u64 * (1 << attempt.min(5));
            tokio::time::sleep(Duration::from_millis(backoff)).await;
        }
    }
}

#[async_trait]
impl SecondaryAccountGateway for IntmaxClient {
    async fn ensure_session(&self) -> Result<SecondarySession, GatewayError> {
        if let Some(session) = self.session.read().await.clone() {
            return Ok(session);
        }

        // 交互式登录，单次尝试
        let url = format!("{}/v1/sessions", self.base_url);
        let start = Instant::now();
        let resp = self.client.post(&url).send().await.map_err(|e| {
            crate::metrics::observe_upstream_latency_ms(start.elapsed().as_millis(), false);
            if e.is_timeout() {
                GatewayError::Timeout
            } else {
                GatewayError::Transport(e.to_string())
            }
        })?;
        crate::metrics::observe_upstream_latency_ms(
            start.elapsed().as_millis(),
            resp.status().is_success(),
        );
        if !resp.status().is_success() {
            return Err(GatewayError::NotLoggedIn);
        }

        let session = resp
            .json::<SecondarySession>()
            .await
            .map_err(|e| GatewayError::Protocol(e.to_string()))?;
        *self.session.write().await = Some(session.clone());
        tracing::info!(address = %session.address, "intmax session established");
        Ok(session)
    }

    async fn session_address(&self) -> Option<String> {
        self.session.read().await.as_ref().map(|s| s.address.clone())
    }

    async fn fetch_transfers(&self, address: &str) -> Result<Vec<RawTransaction>, GatewayError> {
        let url = format!("{}/v1/accounts/{}/transfers", self.base_url, address);
        self.get_json(&url).await
    }

    async fn fetch_deposits(&self, address: &str) -> Result<Vec<RawTransaction>, GatewayError> {
        let url = format!("{}/v1/accounts/{}/deposits", self.base_url, address);
        self.get_json(&url).await
    }
}
