//! 配置管理模块
//! 支持从环境变量和配置文件加载配置

use std::path::Path;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

/// 应用配置结构体
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    pub database: DatabaseConfig,
    pub server: ServerConfig,
    pub logging: LoggingConfig,
    #[serde(default)]
    pub tee: TeeConfig,
    #[serde(default)]
    pub intmax: IntmaxConfig,
    #[serde(default)]
    pub names: NamesConfig,
}

/// 数据库配置
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DatabaseConfig {
    pub url: String,
    pub max_connections: u32,
    pub min_connections: u32,
    pub acquire_timeout_secs: u64,
    pub idle_timeout_secs: u64,
}

/// 服务器配置
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    pub bind_addr: String,
    pub allow_degraded_start: bool,
    /// 钱包连接组件的 project id，通过 /api/config/public 下发给前端
    #[serde(default)]
    pub wallet_connect_project_id: Option<String>,
}

/// 日志配置
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    pub level: String,
    pub format: String, // "json" or "text"
    pub enable_file_logging: bool,
    pub log_file_path: Option<String>,
}

/// TEE注册服务配置
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TeeConfig {
    pub url: String,
    /// 注册出的子域名挂在该父域名下，如 alice.substream.eth
    pub parent_domain: String,
    pub timeout_ms: u64,
}

/// Intmax二级账户网关配置
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IntmaxConfig {
    pub url: String,
    pub timeout_ms: u64,
    pub retries: usize,
}

/// 名称解析配置（ENS主网 + Base L2）
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NamesConfig {
    pub eth_rpc_url: String,
    pub base_rpc_url: String,
    /// Base Names L2 反向解析器合约地址
    pub basename_l2_resolver: String,
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            url: std::env::var("DATABASE_URL")
                .unwrap_or_else(|_| "postgres://postgres@localhost:5432/substream".to_string()),
            max_connections: env_u32("DB_MAX_CONNS", 16),
            min_connections: env_u32("DB_MIN_CONNS", 2),
            acquire_timeout_secs: env_u64("DB_ACQ_TIMEOUT_SECS", 5),
            idle_timeout_secs: env_u64("DB_IDLE_TIMEOUT_SECS", 300),
        }
    }
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind_addr: std::env::var("BIND_ADDR").unwrap_or_else(|_| "0.0.0.0:8080".to_string()),
            allow_degraded_start: std::env::var("ALLOW_DEGRADED_START")
                .map(|v| v == "1")
                .unwrap_or(false),
            wallet_connect_project_id: std::env::var("WALLET_CONNECT_PROJECT_ID").ok(),
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: std::env::var("LOG_LEVEL").unwrap_or_else(|_| "info".to_string()),
            format: std::env::var("LOG_FORMAT").unwrap_or_else(|_| "text".to_string()),
            enable_file_logging: std::env::var("LOG_TO_FILE").map(|v| v == "1").unwrap_or(false),
            log_file_path: std::env::var("LOG_FILE_PATH").ok(),
        }
    }
}

impl Default for TeeConfig {
    fn default() -> Self {
        Self {
            url: std::env::var("TEE_URL").unwrap_or_else(|_| "http://localhost:9000".to_string()),
            parent_domain: std::env::var("PARENT_DOMAIN")
                .unwrap_or_else(|_| "substream.eth".to_string()),
            timeout_ms: env_u64("TEE_TIMEOUT_MS", 10_000),
        }
    }
}

impl Default for IntmaxConfig {
    fn default() -> Self {
        Self {
            url: std::env::var("INTMAX_URL")
                .unwrap_or_else(|_| "http://localhost:9100".to_string()),
            timeout_ms: env_u64("INTMAX_TIMEOUT_MS", 10_000),
            retries: env_u64("INTMAX_RETRIES", 2) as usize,
        }
    }
}

impl Default for NamesConfig {
    fn default() -> Self {
        Self {
            eth_rpc_url: std::env::var("ETH_RPC_URL").unwrap_or_default(),
            base_rpc_url: std::env::var("BASE_RPC_URL").unwrap_or_default(),
            basename_l2_resolver: std::env::var("BASENAME_L2_RESOLVER")
                .unwrap_or_else(|_| "0xC6d566A56A1aFf6508b41f6c90ff131615583BCD".to_string()),
        }
    }
}

fn env_u32(key: &str, default: u32) -> u32 {
    std::env::var(key).ok().and_then(|s| s.parse().ok()).unwrap_or(default)
}

fn env_u64(key: &str, default: u64) -> u64 {
    std::env::var(key).ok().and_then(|s| s.parse().ok()).unwrap_or(default)
}

impl Config {
    /// 从环境变量加载配置
    pub fn from_env() -> Result<Self> {
        Ok(Self {
            database: DatabaseConfig::default(),
            server: ServerConfig::default(),
            logging: LoggingConfig::default(),
            tee: TeeConfig::default(),
            intmax: IntmaxConfig::default(),
            names: NamesConfig::default(),
        })
    }

    /// 从配置文件加载配置
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = std::fs::read_to_string(path.as_ref())
            .with_context(|| format!("Failed to read config file: {:?}", path.as_ref()))?;

        let config: Config =
            toml::from_str(&content).with_context(|| "Failed to parse config file as TOML")?;

        Ok(config)
    }

    /// 从环境变量和配置文件合并加载（配置文件优先级更高）
    pub fn from_env_and_file<P: AsRef<Path>>(path: Option<P>) -> Result<Self> {
        let mut config = Self::from_env()?;

        if let Some(path) = path {
            if path.as_ref().exists() {
                config = Self::from_file(path)?;
            }
        }

        Ok(config)
    }

    /// 验证配置有效性
    pub fn validate(&self) -> Result<()> {
        if !self.database.url.starts_with("postgres://")
            && !self.database.url.starts_with("postgresql://")
        {
            anyhow::bail!("DATABASE_URL must start with postgres:// or postgresql://");
        }

        let valid_levels = ["trace", "debug", "info", "warn", "error"];
        if !valid_levels.contains(&self.logging.level.to_lowercase().as_str()) {
            anyhow::bail!("LOG_LEVEL must be one of: {:?}", valid_levels);
        }

        if self.logging.format != "json" && self.logging.format != "text" {
            anyhow::bail!("LOG_FORMAT must be 'json' or 'text'");
        }

        if self.tee.url.is_empty() {
            anyhow::bail!("TEE_URL must not be empty");
        }

        if self.tee.parent_domain.is_empty() {
            anyhow::bail!("PARENT_DOMAIN must not be empty");
        }

        Ok(())
    }
}
