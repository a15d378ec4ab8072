//! 用户记录存储与服务层属性测试
//!
//! 需要一个可用的Postgres实例（TEST_DATABASE_URL），默认跳过：
//! cargo test --test user_store_test -- --ignored

mod common;

use substream::{
    error::AppErrorCode,
    repository::users::{self, NewUser},
    service,
};

/// 无记录地址：get 返回 None，create 成功后能读回一致的字段
#[tokio::test]
#[ignore]
async fn get_absent_then_create_then_get_roundtrip() {
    let pool = common::create_test_pool().await;
    let address = common::unique_address();

    assert!(users::get_by_address(&pool, &address).await.unwrap().is_none());

    let created = users::create(
        &pool,
        NewUser {
            evm_address: address.clone(),
            subdomain: None,
            intmax_address: None,
        },
    )
    .await
    .unwrap();
    assert_eq!(created.evm_address, address);
    assert!(created.subdomain.is_none());
    assert!(created.intmax_address.is_none());

    let fetched = users::get_by_address(&pool, &address).await.unwrap().unwrap();
    assert_eq!(fetched.evm_address, created.evm_address);
    assert_eq!(fetched.created_at, created.created_at);
}

/// 严格创建：同一地址第二次创建报冲突
#[tokio::test]
#[ignore]
async fn strict_create_twice_conflicts() {
    let pool = common::create_test_pool().await;
    let address = common::unique_address();

    let new_user = || NewUser {
        evm_address: address.clone(),
        subdomain: None,
        intmax_address: None,
    };

    service::users::create_user_strict(&pool, new_user()).await.unwrap();

    let err = service::users::create_user_strict(&pool, new_user())
        .await
        .unwrap_err();
    assert_eq!(err.code, AppErrorCode::UserAlreadyExists);
}

/// get-or-create 变体：第二次调用原样返回现有记录
#[tokio::test]
#[ignore]
async fn get_or_create_is_idempotent() {
    let pool = common::create_test_pool().await;
    let address = common::unique_address();

    let first = service::users::get_or_create_user(&pool, &address).await.unwrap();
    service::users::update_user(&pool, &address, Some("alice.substream.eth".into()), None)
        .await
        .unwrap();

    let second = service::users::get_or_create_user(&pool, &address).await.unwrap();
    assert_eq!(second.evm_address, first.evm_address);
    // 已有字段不被重建动作清掉
    assert_eq!(second.subdomain.as_deref(), Some("alice.substream.eth"));
}

/// update 对不存在的地址总是 not-found，绝不顺带创建
#[tokio::test]
#[ignore]
async fn update_absent_user_is_not_found_and_creates_nothing() {
    let pool = common::create_test_pool().await;
    let address = common::unique_address();

    let err = service::users::update_user(&pool, &address, Some("x.substream.eth".into()), None)
        .await
        .unwrap_err();
    assert_eq!(err.code, AppErrorCode::UserNotFound);

    assert!(users::get_by_address(&pool, &address).await.unwrap().is_none());
}

/// 合并语义：缺省/空串字段不覆盖已有值
#[tokio::test]
#[ignore]
async fn update_merges_and_never_clears() {
    let pool = common::create_test_pool().await;
    let address = common::unique_address();

    service::users::get_or_create_user(&pool, &address).await.unwrap();
    service::users::update_user(&pool, &address, Some("alice.substream.eth".into()), None)
        .await
        .unwrap();

    // 只更新 intmax_address，subdomain 原样保留
    let updated = service::users::update_user(&pool, &address, None, Some("i1234".into()))
        .await
        .unwrap();
    assert_eq!(updated.subdomain.as_deref(), Some("alice.substream.eth"));
    assert_eq!(updated.intmax_address.as_deref(), Some("i1234"));

    // 空串同样不覆盖
    let updated = service::users::update_user(&pool, &address, Some("".into()), Some("  ".into()))
        .await
        .unwrap();
    assert_eq!(updated.subdomain.as_deref(), Some("alice.substream.eth"));
    assert_eq!(updated.intmax_address.as_deref(), Some("i1234"));
}

/// 二级索引查询
#[tokio::test]
#[ignore]
async fn lookup_by_subdomain_and_intmax_address() {
    let pool = common::create_test_pool().await;
    let address = common::unique_address();
    let subdomain = format!("{}.substream.eth", &address[2..10]);

    service::users::get_or_create_user(&pool, &address).await.unwrap();
    service::users::update_user(&pool, &address, Some(subdomain.clone()), Some(address.clone()))
        .await
        .unwrap();

    let by_sub = users::get_by_subdomain(&pool, &subdomain).await.unwrap().unwrap();
    assert_eq!(by_sub.evm_address, address);

    let by_intmax = users::get_by_intmax_address(&pool, &address).await.unwrap().unwrap();
    assert_eq!(by_intmax.evm_address, address);
}

/// updated_at 在更新时刷新，created_at 不变
#[tokio::test]
#[ignore]
async fn update_refreshes_updated_at() {
    let pool = common::create_test_pool().await;
    let address = common::unique_address();

    let created = service::users::get_or_create_user(&pool, &address).await.unwrap();
    let updated = service::users::update_user(&pool, &address, Some("a.substream.eth".into()), None)
        .await
        .unwrap();

    assert_eq!(updated.created_at, created.created_at);
    assert!(updated.updated_at >= created.updated_at);
}
