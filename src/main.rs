//! Substream 主入口
//! 子域名注册与转账历史展示后端

use std::sync::Arc;

use anyhow::Result;
use substream::{api, app_state::AppState, config::Config, infrastructure};

#[tokio::main]
async fn main() -> Result<()> {
    // 1. 加载环境变量
    dotenvy::dotenv().ok();

    // 2. 加载配置（CONFIG_PATH 指向的 TOML 覆盖环境变量）
    let config = Config::from_env_and_file(std::env::var("CONFIG_PATH").ok())?;
    config.validate()?;
    let config = Arc::new(config);

    // 3. 初始化日志
    infrastructure::logging::init_logging(&config.logging)
        .map_err(|e| anyhow::anyhow!("Failed to initialize logging: {e}"))?;

    tracing::info!("Starting Substream backend");

    // 4. 连接数据库
    let pool = infrastructure::db::init_pool_maybe_lazy(
        &config.database,
        config.server.allow_degraded_start,
    )
    .await?;
    tracing::info!("Database connected");

    // 5. 运行数据库迁移（生产环境建议单独运行）
    if std::env::var("SKIP_MIGRATIONS").is_err() {
        match sqlx::migrate!("./migrations").run(&pool).await {
            Ok(_) => tracing::info!("Database migrations completed"),
            Err(e) => {
                tracing::warn!("Database migrations failed (continuing): {}", e);
                tracing::info!("Tip: set SKIP_MIGRATIONS=1 to skip migrations on startup");
            }
        }
    } else {
        tracing::info!("Database migrations skipped (SKIP_MIGRATIONS=1)");
    }

    // 6. 初始化应用状态
    let state = Arc::new(AppState::new(pool, config.clone())?);

    // 7. 构建API路由并启动服务器
    let app = api::routes(state);

    let bind_addr = &config.server.bind_addr;
    let listener = tokio::net::TcpListener::bind(bind_addr).await?;

    tracing::info!("Server listening on http://{}", bind_addr);
    tracing::info!("Swagger UI: http://{}/docs", bind_addr);

    axum::serve(listener, app).await?;

    Ok(())
}
