//! 用户记录服务
//!
//! 字段单调性约束在这一层收口：subdomain / intmax_address 一旦写入，
//! 只会被新的非空值覆盖，空串与缺省都不落库

use crate::{
    error::{AppError, AppErrorCode},
    infrastructure::db::PgPool,
    repository::users::{self, NewUser, UserRecord},
};

/// 空串视为缺省，两侧去空白
pub fn normalize_field(value: Option<String>) -> Option<String> {
    value.and_then(|s| {
        let trimmed = s.trim().to_string();
        if trimmed.is_empty() {
            None
        } else {
            Some(trimmed)
        }
    })
}

pub async fn get_user(pool: &PgPool, address: &str) -> Result<Option<UserRecord>, AppError> {
    let user = users::get_by_address(pool, address).await?;
    Ok(user)
}

/// 创建路由选定的幂等语义：已存在时原样返回现有记录
/// 底层 create 保持严格（唯一键冲突），两个浏览器标签并发创建时
/// 输掉的一方落到冲突分支重新读取
pub async fn get_or_create_user(pool: &PgPool, address: &str) -> Result<UserRecord, AppError> {
    if let Some(existing) = users::get_by_address(pool, address).await? {
        return Ok(existing);
    }

    let input = NewUser {
        evm_address: address.to_string(),
        subdomain: None,
        intmax_address: None,
    };
    match users::create(pool, input).await {
        Ok(created) => Ok(created),
        Err(e) => {
            let app_err: AppError = e.into();
            if app_err.code == AppErrorCode::UserAlreadyExists {
                users::get_by_address(pool, address)
                    .await?
                    .ok_or_else(|| AppError::user_not_found("User vanished after conflict"))
            } else {
                Err(app_err)
            }
        }
    }
}

/// 严格创建：记录已存在时报冲突
pub async fn create_user_strict(pool: &PgPool, input: NewUser) -> Result<UserRecord, AppError> {
    let user = users::create(pool, input).await?;
    Ok(user)
}

/// 合并更新：缺省/空串字段不覆盖已有值；记录不存在时报 not-found，
/// 绝不顺带创建
pub async fn update_user(
    pool: &PgPool,
    address: &str,
    subdomain: Option<String>,
    intmax_address: Option<String>,
) -> Result<UserRecord, AppError> {
    let subdomain = normalize_field(subdomain);
    let intmax_address = normalize_field(intmax_address);

    let updated = users::update(pool, address, subdomain, intmax_address).await?;
    updated.ok_or_else(|| AppError::user_not_found("User not found"))
}
