//! 测试辅助模块

use std::sync::Arc;

use substream::{app_state::AppState, config::Config, infrastructure::db::PgPool};

/// 测试数据库URL
pub fn test_database_url() -> String {
    std::env::var("TEST_DATABASE_URL")
        .unwrap_or_else(|_| "postgres://postgres@localhost:5432/substream_test".into())
}

/// 创建测试数据库连接池并跑迁移
pub async fn create_test_pool() -> PgPool {
    let pool = sqlx::postgres::PgPoolOptions::new()
        .max_connections(5)
        .connect(&test_database_url())
        .await
        .expect("Failed to create test database pool");

    sqlx::migrate!("./migrations")
        .run(&pool)
        .await
        .expect("Failed to run migrations");

    pool
}

/// 创建测试应用状态（外部服务指向本地占位地址，相关用例不触网）
pub async fn create_test_state() -> Arc<AppState> {
    let pool = create_test_pool().await;
    let config = Arc::new(Config::from_env().expect("Failed to load config"));
    Arc::new(AppState::new(pool, config).expect("Failed to create AppState"))
}

/// 每个用例独立的伪地址，避免用例间互相污染
pub fn unique_address() -> String {
    format!("0xtest{}", uuid::Uuid::new_v4().simple())
}
