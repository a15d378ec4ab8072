//! SQLx Postgres 连接池初始化与健康检查
//!
//! 注意：users 表没有触发器，updated_at 在应用层刷新
//!
//! 用法：
//! let pool = init_pool(&env::var("DATABASE_URL")?).await?;
//! health_check(&pool).await?;

use std::time::Duration;

use anyhow::Result;

use crate::config::DatabaseConfig;

pub type PgPool = sqlx::Pool<sqlx::Postgres>;

/// 初始化Postgres连接池
pub async fn init_pool(config: &DatabaseConfig) -> Result<PgPool, sqlx::Error> {
    let pool = pool_options(config).connect(&config.url).await.map_err(|e| {
        tracing::error!("Failed to connect to Postgres: {}", e);
        e
    })?;

    // 验证连接
    health_check(&pool).await?;

    Ok(pool)
}

/// 当 allow_lazy=true 时，使用 lazy 连接（不在启动时触发实际连接），便于无依赖环境联调
pub async fn init_pool_maybe_lazy(
    config: &DatabaseConfig,
    allow_lazy: bool,
) -> Result<PgPool, sqlx::Error> {
    if allow_lazy {
        // lazy 不需要 await，会在首次使用时验证连接
        let pool = pool_options(config).connect_lazy(&config.url)?;
        Ok(pool)
    } else {
        init_pool(config).await
    }
}

fn pool_options(config: &DatabaseConfig) -> sqlx::postgres::PgPoolOptions {
    sqlx::postgres::PgPoolOptions::new()
        .max_connections(config.max_connections)
        .min_connections(config.min_connections)
        .acquire_timeout(Duration::from_secs(config.acquire_timeout_secs))
        .idle_timeout(Duration::from_secs(config.idle_timeout_secs))
        // 确保连接在使用前是有效的，避免使用已断开的连接
        .test_before_acquire(true)
}

/// 健康检查：简单查询验证连接和数据库响应
pub async fn health_check(pool: &PgPool) -> Result<(), sqlx::Error> {
    let _: (chrono::DateTime<chrono::Utc>,) = sqlx::query_as("SELECT CURRENT_TIMESTAMP")
        .fetch_one(pool)
        .await?;
    Ok(())
}
