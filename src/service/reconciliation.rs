//! 用户记录对账工作流
//!
//! 三个可观测状态：未连接钱包 / 已连接无记录 / 已连接有记录。
//! 两个异步信号（钱包连接、二级账户会话就绪）可以以任意顺序到达：
//! - 钱包连接且无记录 → 懒创建（可选字段留空）
//! - 记录存在但缺二级账户地址，且地址已知 → 合并更新
//! - 任何创建/更新之后重新读取，调用方总是看到最新行
//!
//! 协作式、回调驱动，没有轮询循环。针对存储的 check-then-act
//! 竞争是已接受的限制（见 DESIGN.md）。

use tokio::sync::Mutex;

use crate::{
    error::AppError,
    infrastructure::db::PgPool,
    repository::users::UserRecord,
    service::users,
};

/// 钱包连接后确保对应记录存在
pub async fn ensure_user(pool: &PgPool, address: &str) -> Result<UserRecord, AppError> {
    users::get_or_create_user(pool, address).await
}

/// 二级账户地址就绪后补写进记录；已有值时不动（单调，只填空）
pub async fn sync_intmax_address(
    pool: &PgPool,
    address: &str,
    intmax_address: &str,
) -> Result<UserRecord, AppError> {
    let record = users::get_user(pool, address)
        .await?
        .ok_or_else(|| AppError::user_not_found("User not found"))?;

    if record.intmax_address.is_some() {
        return Ok(record);
    }

    users::update_user(pool, address, None, Some(intmax_address.to_string())).await
}

/// 单次对账：确保记录存在，已观测到二级账户地址时一并补写
pub async fn reconcile(
    pool: &PgPool,
    address: &str,
    observed_intmax: Option<&str>,
) -> Result<UserRecord, AppError> {
    let record = ensure_user(pool, address).await?;

    match observed_intmax {
        Some(intmax) if record.intmax_address.is_none() && !intmax.trim().is_empty() => {
            sync_intmax_address(pool, address, intmax.trim()).await
        }
        _ => Ok(record),
    }
}

#[derive(Debug, Default)]
struct ReconcilerState {
    wallet: Option<String>,
    /// 二级账户地址先于钱包连接到达时暂存于此
    pending_intmax: Option<String>,
}

/// 回调驱动的对账器：把两个独立信号折叠到用户记录上
pub struct Reconciler {
    pool: PgPool,
    state: Mutex<ReconcilerState>,
}

impl Reconciler {
    pub fn new(pool: PgPool) -> Self {
        Self {
            pool,
            state: Mutex::new(ReconcilerState::default()),
        }
    }

    /// 钱包连接状态变化。断开时清空内部状态并返回 None；
    /// 连接时确保记录存在，并套用暂存的二级账户地址
    pub async fn wallet_changed(
        &self,
        address: Option<&str>,
    ) -> Result<Option<UserRecord>, AppError> {
        let mut state = self.state.lock().await;

        let Some(address) = address else {
            state.wallet = None;
            state.pending_intmax = None;
            return Ok(None);
        };

        state.wallet = Some(address.to_string());
        let pending = state.pending_intmax.take();
        drop(state);

        let record = reconcile(&self.pool, address, pending.as_deref()).await?;
        Ok(Some(record))
    }

    /// 二级账户会话就绪。钱包未连接时暂存地址等待后续信号
    pub async fn secondary_ready(
        &self,
        intmax_address: &str,
    ) -> Result<Option<UserRecord>, AppError> {
        let mut state = self.state.lock().await;

        let Some(wallet) = state.wallet.clone() else {
            state.pending_intmax = Some(intmax_address.to_string());
            return Ok(None);
        };
        drop(state);

        let record = sync_intmax_address(&self.pool, &wallet, intmax_address).await?;
        Ok(Some(record))
    }
}
