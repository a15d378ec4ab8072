//! 子域名注册工作流
//!
//! 步骤（任一步失败即中止，向调用方返回类型化错误）：
//! 1. 确保二级账户会话（未登录时触发交互式登录）
//! 2. 调用TEE注册服务（有副作用，单次尝试）
//! 3. 拼出完整子域名并合并写入用户记录
//!
//! TEE注册成功但本地落库失败会留下外部已注册、本地未更新的不一致，
//! 没有补偿任务（见 DESIGN.md）。为了不白白消耗外部注册，记录的
//! 存在性在调用TEE之前先行确保。

use crate::{
    error::AppError,
    infrastructure::db::PgPool,
    repository::users::UserRecord,
    service::{
        intmax::{GatewayError, SecondaryAccountGateway},
        reconciliation,
        tee::{RegistrationService, TeeError},
        users,
    },
};

#[derive(Debug)]
pub struct RegistrationOutcome {
    pub subdomain: String,
    pub user: UserRecord,
}

/// 标签约束：非空，小写字母/数字/连字符，不以连字符开头结尾
pub fn validate_label(label: &str) -> Result<(), AppError> {
    if label.is_empty() {
        return Err(AppError::invalid_label("Label must not be empty"));
    }
    if label.len() > 63 {
        return Err(AppError::invalid_label("Label too long (max 63)"));
    }
    if !label
        .chars()
        .all(|c| c.is_ascii_lowercase() || c.is_ascii_digit() || c == '-')
    {
        return Err(AppError::invalid_label(
            "Label may only contain lowercase letters, digits and hyphens",
        ));
    }
    if label.starts_with('-') || label.ends_with('-') {
        return Err(AppError::invalid_label(
            "Label must not start or end with a hyphen",
        ));
    }
    Ok(())
}

/// 拼出完整子域名；TEE可能直接返回完整名称
pub fn compose_subdomain(registered: &str, parent_domain: &str) -> String {
    if registered.contains('.') {
        registered.to_string()
    } else {
        format!("{}.{}", registered, parent_domain)
    }
}

pub async fn register_subdomain(
    pool: &PgPool,
    tee: &dyn RegistrationService,
    gateway: &dyn SecondaryAccountGateway,
    parent_domain: &str,
    evm_address: &str,
    label: &str,
) -> Result<RegistrationOutcome, AppError> {
    let label = label.trim().to_lowercase();
    validate_label(&label)?;

    // 1. 二级账户会话
    let session = gateway.ensure_session().await.map_err(map_gateway_err)?;

    // 先确保记录存在：此时TEE尚未被调用，没有外部副作用
    reconciliation::ensure_user(pool, evm_address).await?;

    // 2. 外部注册
    let registered = tee
        .register_subdomain(&label, &session.address)
        .await
        .map_err(map_tee_err)?;

    // 3. 本地落库（子域名 + 二级账户地址一并合并）
    let subdomain = compose_subdomain(&registered, parent_domain);
    let user = users::update_user(
        pool,
        evm_address,
        Some(subdomain.clone()),
        Some(session.address),
    )
    .await?;

    tracing::info!(evm_address, subdomain, "subdomain registered");
    Ok(RegistrationOutcome { subdomain, user })
}

fn map_gateway_err(e: GatewayError) -> AppError {
    match e {
        GatewayError::Timeout => AppError::timeout(e.to_string()),
        _ => AppError::secondary_account_unavailable(e.to_string()),
    }
}

fn map_tee_err(e: TeeError) -> AppError {
    match e {
        TeeError::Timeout => AppError::timeout(e.to_string()),
        _ => AppError::external_service_error(e.to_string()),
    }
}
