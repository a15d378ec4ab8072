//! 名称展示工作流：ENS（主网）与 Base-Name（Base L2）反向解析
//!
//! 两路解析互相独立，头像查询依赖ENS结果；展示偏好 ENS 优先于
//! Base-Name，全部失败时回退为截断的原始地址。解析失败一律吞掉，
//! 展示层永远有东西可显示。

use ethers::{
    providers::{Http, Middleware, Provider},
    types::{transaction::eip2718::TypedTransaction, Bytes, TransactionRequest, H160},
    utils::keccak256,
};
use serde::Serialize;
use utoipa::ToSchema;

use crate::{config::NamesConfig, error::AppError, utils::truncate_address};

/// Base 链（chain id 8453）在 reverse registrar 里的 coin type，
/// 即 0x80000000 | 8453 的十六进制表示
const BASE_REVERSE_COIN_TYPE: &str = "80002105";

#[derive(Debug, Clone, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ResolvedNames {
    pub address: String,
    pub ens: Option<String>,
    pub base_name: Option<String>,
    pub ens_avatar: Option<String>,
    /// ENS 优先，其次 Base-Name，最后截断地址
    pub preferred_name: String,
}

pub struct NameService {
    eth: Option<Provider<Http>>,
    base: Option<Provider<Http>>,
    basename_resolver: Option<H160>,
}

/// ENS namehash（EIP-137）
pub fn namehash(name: &str) -> [u8; 32] {
    let mut node = [0u8; 32];
    if name.is_empty() {
        return node;
    }
    for label in name.rsplit('.') {
        let label_hash = keccak256(label.as_bytes());
        let mut combined = [0u8; 64];
        combined[..32].copy_from_slice(&node);
        combined[32..].copy_from_slice(&label_hash);
        node = keccak256(combined);
    }
    node
}

/// Base-Name 反向解析节点：namehash("<addr>.<coin_type>.reverse")
pub fn base_reverse_node(address: H160) -> [u8; 32] {
    namehash(&format!("{:x}.{}.reverse", address, BASE_REVERSE_COIN_TYPE))
}

/// 展示偏好：ENS > Base-Name > 截断地址
pub fn preferred_name(ens: Option<&str>, base_name: Option<&str>, address: &str) -> String {
    ens.filter(|s| !s.is_empty())
        .or(base_name.filter(|s| !s.is_empty()))
        .map(str::to_string)
        .unwrap_or_else(|| truncate_address(address, 4))
}

impl NameService {
    pub fn from_config(config: &NamesConfig) -> Self {
        let eth = provider_from(&config.eth_rpc_url);
        let base = provider_from(&config.base_rpc_url);
        let basename_resolver = config.basename_l2_resolver.parse::<H160>().ok();
        if eth.is_none() {
            tracing::warn!("ETH_RPC_URL not configured, ENS resolution disabled");
        }
        if base.is_none() {
            tracing::warn!("BASE_RPC_URL not configured, Base-Name resolution disabled");
        }
        Self {
            eth,
            base,
            basename_resolver,
        }
    }

    pub async fn resolve(&self, address: &str) -> Result<ResolvedNames, AppError> {
        let parsed = address
            .parse::<H160>()
            .map_err(|_| AppError::invalid_address(format!("Not an EVM address: {address}")))?;

        let ens = self.resolve_ens(parsed).await;
        let ens_avatar = match &ens {
            Some(name) => self.resolve_avatar(name).await,
            None => None,
        };
        let base_name = self.resolve_base_name(parsed).await;

        let preferred = preferred_name(ens.as_deref(), base_name.as_deref(), address);
        Ok(ResolvedNames {
            address: address.to_string(),
            ens,
            base_name,
            ens_avatar,
            preferred_name: preferred,
        })
    }

    async fn resolve_ens(&self, address: H160) -> Option<String> {
        let provider = self.eth.as_ref()?;
        match provider.lookup_address(address).await {
            Ok(name) if !name.is_empty() => Some(name),
            Ok(_) => None,
            Err(e) => {
                tracing::debug!(%address, "ens lookup failed: {e}");
                None
            }
        }
    }

    async fn resolve_avatar(&self, ens_name: &str) -> Option<String> {
        let provider = self.eth.as_ref()?;
        match provider.resolve_field(ens_name, "avatar").await {
            Ok(avatar) if !avatar.is_empty() => Some(avatar),
            Ok(_) => None,
            Err(e) => {
                tracing::debug!(ens_name, "ens avatar lookup failed: {e}");
                None
            }
        }
    }

    /// Base-Name：直接 eth_call L2 反向解析器的 name(bytes32)
    async fn resolve_base_name(&self, address: H160) -> Option<String> {
        let provider = self.base.as_ref()?;
        let resolver = self.basename_resolver?;

        let node = base_reverse_node(address);
        let mut calldata = ethers::utils::id("name(bytes32)").to_vec();
        calldata.extend_from_slice(&node);

        let tx: TypedTransaction = TransactionRequest::new()
            .to(resolver)
            .data(Bytes::from(calldata))
            .into();

        let out = match provider.call(&tx, None).await {
            Ok(bytes) => bytes,
            Err(e) => {
                tracing::debug!(%address, "base name lookup failed: {e}");
                return None;
            }
        };

        let tokens = ethers::abi::decode(&[ethers::abi::ParamType::String], &out).ok()?;
        tokens
            .into_iter()
            .next()
            .and_then(|t| t.into_string())
            .filter(|s| !s.is_empty())
    }
}

fn provider_from(url: &str) -> Option<Provider<Http>> {
    if url.is_empty() {
        return None;
    }
    match Provider::<Http>::try_from(url) {
        Ok(p) => Some(p),
        Err(e) => {
            tracing::warn!(url, "invalid RPC url: {e}");
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn namehash_matches_eip137_vectors() {
        assert_eq!(namehash(""), [0u8; 32]);
        assert_eq!(
            hex::encode(namehash("eth")),
            "93cdeb708b7545dc668eb9280176169d1c33cfd8ed6f04690a0bcc88a93fc4ae"
        );
        assert_eq!(
            hex::encode(namehash("foo.eth")),
            "de9b09fd7c5f901e23a3f19fecc54828e9c848539801e86591bd9801b019f84f"
        );
    }

    #[test]
    fn preferred_name_prefers_ens_then_base_then_truncation() {
        let addr = "0x1234567890abcdef1234567890abcdef12345678";
        assert_eq!(
            preferred_name(Some("alice.eth"), Some("alice.base.eth"), addr),
            "alice.eth"
        );
        assert_eq!(
            preferred_name(None, Some("alice.base.eth"), addr),
            "alice.base.eth"
        );
        assert_eq!(preferred_name(None, None, addr), "0x1234...5678");
        assert_eq!(preferred_name(Some(""), None, addr), "0x1234...5678");
    }

    #[test]
    fn base_reverse_node_is_stable() {
        let addr: H160 = "0x1234567890abcdef1234567890abcdef12345678"
            .parse()
            .unwrap();
        let node = base_reverse_node(addr);
        assert_ne!(node, [0u8; 32]);
        // 同一地址总是得到同一节点
        assert_eq!(node, base_reverse_node(addr));
    }
}
