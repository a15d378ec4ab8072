use std::sync::Arc;

use crate::{
    config::Config,
    infrastructure::db::PgPool,
    service::{
        intmax::{IntmaxClient, SecondaryAccountGateway},
        names::NameService,
        tee::TeeClient,
    },
};

/// 应用状态
/// 显式传递的类型化会话对象，取代环境式 context 查找
#[derive(Clone)]
pub struct AppState {
    pub pool: PgPool,
    pub tee: Arc<TeeClient>,
    pub intmax: Arc<dyn SecondaryAccountGateway>,
    pub names: Arc<NameService>,
    pub config: Arc<Config>,
}

impl AppState {
    pub fn new(pool: PgPool, config: Arc<Config>) -> anyhow::Result<Self> {
        let tee = Arc::new(TeeClient::new(&config.tee)?);
        let intmax: Arc<dyn SecondaryAccountGateway> =
            Arc::new(IntmaxClient::new(&config.intmax)?);
        let names = Arc::new(NameService::from_config(&config.names));

        Ok(Self {
            pool,
            tee,
            intmax,
            names,
            config,
        })
    }
}
