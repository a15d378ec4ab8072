//! 对账与注册工作流测试（外部服务用桩实现替换）
//!
//! 需要 Postgres（TEST_DATABASE_URL）：
//! cargo test --test workflow_test -- --ignored

mod common;

use async_trait::async_trait;
use substream::{
    error::AppErrorCode,
    service::{
        intmax::{GatewayError, SecondaryAccountGateway, SecondarySession},
        reconciliation::Reconciler,
        registration,
        tee::{RegistrationService, TeeError},
        transactions::RawTransaction,
    },
};

struct StubTee {
    fail: bool,
}

#[async_trait]
impl RegistrationService for StubTee {
    async fn register_subdomain(
        &self,
        label: &str,
        _intmax_address: &str,
    ) -> Result<String, TeeError> {
        if self.fail {
            Err(TeeError::Rejected { status: 500 })
        } else {
            Ok(label.to_string())
        }
    }
}

struct StubGateway {
    address: Option<String>,
}

#[async_trait]
impl SecondaryAccountGateway for StubGateway {
    async fn ensure_session(&self) -> Result<SecondarySession, GatewayError> {
        match &self.address {
            Some(address) => Ok(SecondarySession {
                address: address.clone(),
            }),
            None => Err(GatewayError::NotLoggedIn),
        }
    }

    async fn session_address(&self) -> Option<String> {
        self.address.clone()
    }

    async fn fetch_transfers(&self, _address: &str) -> Result<Vec<RawTransaction>, GatewayError> {
        Ok(vec![])
    }

    async fn fetch_deposits(&self, _address: &str) -> Result<Vec<RawTransaction>, GatewayError> {
        Ok(vec![])
    }
}

/// 信号顺序：钱包先连接，二级账户地址后就绪
#[tokio::test]
#[ignore]
async fn reconciler_wallet_then_secondary() {
    let pool = common::create_test_pool().await;
    let address = common::unique_address();
    let reconciler = Reconciler::new(pool);

    let record = reconciler.wallet_changed(Some(&address)).await.unwrap().unwrap();
    assert!(record.intmax_address.is_none());

    let record = reconciler.secondary_ready("i100").await.unwrap().unwrap();
    assert_eq!(record.intmax_address.as_deref(), Some("i100"));
}

/// 信号顺序颠倒：二级账户地址先到达，暂存到钱包连接时套用
#[tokio::test]
#[ignore]
async fn reconciler_secondary_then_wallet() {
    let pool = common::create_test_pool().await;
    let address = common::unique_address();
    let reconciler = Reconciler::new(pool);

    assert!(reconciler.secondary_ready("i200").await.unwrap().is_none());

    let record = reconciler.wallet_changed(Some(&address)).await.unwrap().unwrap();
    assert_eq!(record.intmax_address.as_deref(), Some("i200"));
}

/// 断开钱包清空内部状态
#[tokio::test]
#[ignore]
async fn reconciler_disconnect_clears_state() {
    let pool = common::create_test_pool().await;
    let address = common::unique_address();
    let reconciler = Reconciler::new(pool);

    reconciler.wallet_changed(Some(&address)).await.unwrap();
    assert!(reconciler.wallet_changed(None).await.unwrap().is_none());

    // 断开后二级账户信号只会被暂存
    assert!(reconciler.secondary_ready("i300").await.unwrap().is_none());
}

/// 注册工作流成功路径：TEE返回标签，完整子域名与二级地址一并落库
#[tokio::test]
#[ignore]
async fn registration_persists_subdomain_and_intmax_address() {
    let pool = common::create_test_pool().await;
    let address = common::unique_address();
    let tee = StubTee { fail: false };
    let gateway = StubGateway {
        address: Some("i-intmax".into()),
    };

    let outcome = registration::register_subdomain(
        &pool,
        &tee,
        &gateway,
        "substream.eth",
        &address,
        "Alice",
    )
    .await
    .unwrap();

    assert_eq!(outcome.subdomain, "alice.substream.eth");
    assert_eq!(outcome.user.subdomain.as_deref(), Some("alice.substream.eth"));
    assert_eq!(outcome.user.intmax_address.as_deref(), Some("i-intmax"));
}

/// TEE拒绝时中止：不落任何本地字段
#[tokio::test]
#[ignore]
async fn registration_aborts_when_tee_rejects() {
    let pool = common::create_test_pool().await;
    let address = common::unique_address();
    let tee = StubTee { fail: true };
    let gateway = StubGateway {
        address: Some("i-intmax".into()),
    };

    let err = registration::register_subdomain(
        &pool,
        &tee,
        &gateway,
        "substream.eth",
        &address,
        "alice",
    )
    .await
    .unwrap_err();
    assert_eq!(err.code, AppErrorCode::ExternalServiceError);

    // 记录被预创建（无外部副作用的步骤），但没有任何子域名字段
    let record = substream::repository::users::get_by_address(&pool, &address)
        .await
        .unwrap()
        .unwrap();
    assert!(record.subdomain.is_none());
    assert!(record.intmax_address.is_none());
}

/// 未登录且登录失败时中止，TEE不会被调用
#[tokio::test]
#[ignore]
async fn registration_requires_secondary_session() {
    let pool = common::create_test_pool().await;
    let address = common::unique_address();
    let tee = StubTee { fail: false };
    let gateway = StubGateway { address: None };

    let err = registration::register_subdomain(
        &pool,
        &tee,
        &gateway,
        "substream.eth",
        &address,
        "alice",
    )
    .await
    .unwrap_err();
    assert_eq!(err.code, AppErrorCode::SecondaryAccountUnavailable);

    // 会话都没有，记录也不应被创建
    assert!(substream::repository::users::get_by_address(&pool, &address)
        .await
        .unwrap()
        .is_none());
}

/// 非法标签在触网之前被拒绝
#[tokio::test]
#[ignore]
async fn registration_rejects_invalid_label() {
    let pool = common::create_test_pool().await;
    let tee = StubTee { fail: false };
    let gateway = StubGateway {
        address: Some("i".into()),
    };

    let err = registration::register_subdomain(
        &pool,
        &tee,
        &gateway,
        "substream.eth",
        &common::unique_address(),
        "not valid!",
    )
    .await
    .unwrap_err();
    assert_eq!(err.code, AppErrorCode::InvalidLabel);
}
