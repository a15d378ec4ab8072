use serde::{Deserialize, Serialize};
use sqlx::FromRow;

use crate::infrastructure::db::PgPool;

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct UserRecord {
    pub evm_address: String,
    pub subdomain: Option<String>,
    pub intmax_address: Option<String>,
    pub created_at: chrono::DateTime<chrono::Utc>,
    pub updated_at: chrono::DateTime<chrono::Utc>,
}

#[derive(Debug)]
pub struct NewUser {
    pub evm_address: String,
    pub subdomain: Option<String>,
    pub intmax_address: Option<String>,
}

/// 严格创建：地址已存在时返回唯一键冲突
pub async fn create(pool: &PgPool, input: NewUser) -> Result<UserRecord, sqlx::Error> {
    let rec = sqlx::query_as::<_, UserRecord>(
        r#"
        INSERT INTO users (evm_address, subdomain, intmax_address)
        VALUES ($1, $2, $3)
        RETURNING evm_address, subdomain, intmax_address, created_at, updated_at
        "#,
    )
    .bind(input.evm_address)
    .bind(input.subdomain)
    .bind(input.intmax_address)
    .fetch_one(pool)
    .await?;
    Ok(rec)
}

pub async fn get_by_address(
    pool: &PgPool,
    address: &str,
) -> Result<Option<UserRecord>, sqlx::Error> {
    let rec = sqlx::query_as::<_, UserRecord>(
        r#"
        SELECT evm_address, subdomain, intmax_address, created_at, updated_at
        FROM users
        WHERE evm_address = $1
        "#,
    )
    .bind(address)
    .fetch_optional(pool)
    .await?;
    Ok(rec)
}

pub async fn get_by_subdomain(
    pool: &PgPool,
    subdomain: &str,
) -> Result<Option<UserRecord>, sqlx::Error> {
    let rec = sqlx::query_as::<_, UserRecord>(
        r#"
        SELECT evm_address, subdomain, intmax_address, created_at, updated_at
        FROM users
        WHERE subdomain = $1
        "#,
    )
    .bind(subdomain)
    .fetch_optional(pool)
    .await?;
    Ok(rec)
}

pub async fn get_by_intmax_address(
    pool: &PgPool,
    intmax_address: &str,
) -> Result<Option<UserRecord>, sqlx::Error> {
    let rec = sqlx::query_as::<_, UserRecord>(
        r#"
        SELECT evm_address, subdomain, intmax_address, created_at, updated_at
        FROM users
        WHERE intmax_address = $1
        "#,
    )
    .bind(intmax_address)
    .fetch_optional(pool)
    .await?;
    Ok(rec)
}

/// 合并更新：None 字段不覆盖已有值；行不存在时返回 None，绝不顺带创建
pub async fn update(
    pool: &PgPool,
    address: &str,
    subdomain: Option<String>,
    intmax_address: Option<String>,
) -> Result<Option<UserRecord>, sqlx::Error> {
    // 所有字段都是None时直接返回当前记录
    if subdomain.is_none() && intmax_address.is_none() {
        return get_by_address(pool, address).await;
    }

    // 使用COALESCE处理可选字段，updated_at 在应用层刷新（无触发器）
    let rec = sqlx::query_as::<_, UserRecord>(
        r#"
        UPDATE users
        SET subdomain = COALESCE($2, subdomain),
            intmax_address = COALESCE($3, intmax_address),
            updated_at = now()
        WHERE evm_address = $1
        RETURNING evm_address, subdomain, intmax_address, created_at, updated_at
        "#,
    )
    .bind(address)
    .bind(subdomain)
    .bind(intmax_address)
    .fetch_optional(pool)
    .await?;
    Ok(rec)
}
