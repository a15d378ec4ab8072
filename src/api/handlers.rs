use std::sync::Arc;

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Json,
};
use serde::{Deserialize, Serialize};
use utoipa::{IntoParams, ToSchema};

use crate::{
    api::response::pagination::{PaginatedResponse, PaginationParams},
    app_state::AppState,
    error::AppError,
    repository::users::UserRecord,
    service::{
        self, intmax::GatewayError, names::ResolvedNames, transactions::TaggedTransaction,
    },
};

// ========== Users API ==========

#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct UserResp {
    pub evm_address: String,
    pub subdomain: Option<String>,
    pub intmax_address: Option<String>,
    pub created_at: String,
    pub updated_at: String,
}

impl From<UserRecord> for UserResp {
    fn from(u: UserRecord) -> Self {
        Self {
            evm_address: u.evm_address,
            subdomain: u.subdomain,
            intmax_address: u.intmax_address,
            created_at: u.created_at.to_rfc3339(),
            updated_at: u.updated_at.to_rfc3339(),
        }
    }
}

#[derive(Debug, Deserialize, IntoParams)]
pub struct GetUserQuery {
    pub address: Option<String>,
}

/// 查不到用户时返回 200 + null（与 update 的 404 不一致，
/// 维持现有线上行为，见 DESIGN.md）
#[utoipa::path(
    get,
    path = "/api/user",
    params(GetUserQuery),
    responses(
        (status = 200, description = "User record, or JSON null when absent", body = UserResp),
        (status = 400, description = "Missing address", body = crate::error_body::ErrorBodyDoc)
    )
)]
pub async fn get_user(
    State(st): State<Arc<AppState>>,
    Query(q): Query<GetUserQuery>,
) -> Result<Json<Option<UserResp>>, AppError> {
    let address = q.address.filter(|a| !a.trim().is_empty()).ok_or_else(|| {
        crate::metrics::count_err("GET /api/user");
        AppError::validation_failed("Missing address")
    })?;

    let user = service::users::get_user(&st.pool, address.trim())
        .await
        .inspect_err(|_| crate::metrics::count_err("GET /api/user"))?;
    crate::metrics::count_ok("GET /api/user");
    Ok(Json(user.map(UserResp::from)))
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct CreateUserReq {
    pub address: Option<String>,
}

/// 幂等 get-or-create：记录已存在时原样返回现有记录（决策见 DESIGN.md）
#[utoipa::path(
    post,
    path = "/api/user/create",
    request_body = CreateUserReq,
    responses(
        (status = 200, description = "Created or existing user", body = UserResp),
        (status = 400, description = "Missing required fields", body = crate::error_body::ErrorBodyDoc)
    )
)]
pub async fn create_user(
    State(st): State<Arc<AppState>>,
    Json(req): Json<CreateUserReq>,
) -> Result<Json<UserResp>, AppError> {
    let address = req.address.filter(|a| !a.trim().is_empty()).ok_or_else(|| {
        crate::metrics::count_err("POST /api/user/create");
        AppError::validation_failed("Missing required fields")
    })?;

    let user = service::users::get_or_create_user(&st.pool, address.trim())
        .await
        .inspect_err(|_| crate::metrics::count_err("POST /api/user/create"))?;
    crate::metrics::count_ok("POST /api/user/create");
    Ok(Json(user.into()))
}

#[derive(Debug, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct UpdateUserReq {
    pub evm_address: Option<String>,
    pub subdomain: Option<String>,
    pub intmax_address: Option<String>,
}

/// 合并更新：缺省/空串字段不覆盖已有值
#[utoipa::path(
    put,
    path = "/api/user/update",
    request_body = UpdateUserReq,
    responses(
        (status = 200, description = "Updated user", body = UserResp),
        (status = 400, description = "Missing required fields", body = crate::error_body::ErrorBodyDoc),
        (status = 404, description = "User not found", body = crate::error_body::ErrorBodyDoc)
    )
)]
pub async fn update_user(
    State(st): State<Arc<AppState>>,
    Json(req): Json<UpdateUserReq>,
) -> Result<Json<UserResp>, AppError> {
    let address = req.evm_address.filter(|a| !a.trim().is_empty()).ok_or_else(|| {
        crate::metrics::count_err("PUT /api/user/update");
        AppError::validation_failed("Missing required fields")
    })?;

    let user =
        service::users::update_user(&st.pool, address.trim(), req.subdomain, req.intmax_address)
            .await
            .inspect_err(|_| crate::metrics::count_err("PUT /api/user/update"))?;
    crate::metrics::count_ok("PUT /api/user/update");
    Ok(Json(user.into()))
}

#[derive(Debug, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ReconcileReq {
    pub address: Option<String>,
    pub intmax_address: Option<String>,
}

/// 对账工作流：确保记录存在，已知二级账户地址时一并补写，返回最新行
#[utoipa::path(
    post,
    path = "/api/user/reconcile",
    request_body = ReconcileReq,
    responses(
        (status = 200, description = "Reconciled user record", body = UserResp),
        (status = 400, description = "Missing required fields", body = crate::error_body::ErrorBodyDoc)
    )
)]
pub async fn reconcile_user(
    State(st): State<Arc<AppState>>,
    Json(req): Json<ReconcileReq>,
) -> Result<Json<UserResp>, AppError> {
    let address = req.address.filter(|a| !a.trim().is_empty()).ok_or_else(|| {
        crate::metrics::count_err("POST /api/user/reconcile");
        AppError::validation_failed("Missing required fields")
    })?;

    let user = service::reconciliation::reconcile(
        &st.pool,
        address.trim(),
        req.intmax_address.as_deref(),
    )
    .await
    .inspect_err(|_| crate::metrics::count_err("POST /api/user/reconcile"))?;
    crate::metrics::count_ok("POST /api/user/reconcile");
    Ok(Json(user.into()))
}

// ========== Registration API ==========

/// 原样转发到TEE注册服务，透传其状态码与响应体；传输失败返回500
#[utoipa::path(
    post,
    path = "/api/register",
    responses(
        (status = 200, description = "Upstream response relayed verbatim"),
        (status = 500, description = "Transport failure", body = crate::error_body::ErrorBodyDoc)
    )
)]
pub async fn register_proxy(
    State(st): State<Arc<AppState>>,
    Json(body): Json<serde_json::Value>,
) -> Result<(StatusCode, Json<serde_json::Value>), AppError> {
    match st.tee.forward(&body).await {
        Ok((status, value)) => {
            if status.is_success() {
                crate::metrics::count_ok("POST /api/register");
            } else {
                crate::metrics::count_err("POST /api/register");
            }
            Ok((status, Json(value)))
        }
        Err(e) => {
            crate::metrics::count_err("POST /api/register");
            tracing::warn!("tee forward failed: {e}");
            // 透传路由对所有传输失败（含超时）一律回 500，保持线上行为
            Err(AppError::internal("Failed to register subdomain"))
        }
    }
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct CreateSubdomainReq {
    pub address: Option<String>,
    pub label: Option<String>,
}

#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct SubdomainResp {
    pub new_subdomain: String,
    pub user: UserResp,
}

/// 完整注册工作流：二级账户登录 → TEE注册 → 本地落库
#[utoipa::path(
    post,
    path = "/api/subdomains",
    request_body = CreateSubdomainReq,
    responses(
        (status = 200, description = "Subdomain registered", body = SubdomainResp),
        (status = 400, description = "Invalid label or missing fields", body = crate::error_body::ErrorBodyDoc),
        (status = 502, description = "Upstream failure", body = crate::error_body::ErrorBodyDoc)
    )
)]
pub async fn create_subdomain(
    State(st): State<Arc<AppState>>,
    Json(req): Json<CreateSubdomainReq>,
) -> Result<Json<SubdomainResp>, AppError> {
    let address = req
        .address
        .filter(|a| !a.trim().is_empty())
        .ok_or_else(|| AppError::validation_failed("Missing required fields"))?;
    let label = req
        .label
        .filter(|l| !l.trim().is_empty())
        .ok_or_else(|| AppError::validation_failed("Missing required fields"))?;

    let outcome = service::registration::register_subdomain(
        &st.pool,
        st.tee.as_ref(),
        st.intmax.as_ref(),
        &st.config.tee.parent_domain,
        address.trim(),
        &label,
    )
    .await
    .inspect_err(|_| crate::metrics::count_err("POST /api/subdomains"))?;

    crate::metrics::count_ok("POST /api/subdomains");
    Ok(Json(SubdomainResp {
        new_subdomain: outcome.subdomain,
        user: outcome.user.into(),
    }))
}

// ========== Transactions API ==========

#[derive(Debug, Deserialize, IntoParams)]
#[serde(rename_all = "camelCase")]
pub struct TransactionsQuery {
    /// 二级账户地址；缺省时使用当前会话地址
    pub address: Option<String>,
    pub page: Option<u32>,
    pub page_size: Option<u32>,
}

/// 合并转账与充值，按时间倒序，固定页大小分页
#[utoipa::path(
    get,
    path = "/api/transactions",
    params(TransactionsQuery),
    responses(
        (status = 200, description = "Paginated transaction list"),
        (status = 400, description = "No address available", body = crate::error_body::ErrorBodyDoc),
        (status = 502, description = "Secondary account unavailable", body = crate::error_body::ErrorBodyDoc)
    )
)]
pub async fn list_transactions(
    State(st): State<Arc<AppState>>,
    Query(q): Query<TransactionsQuery>,
) -> Result<Json<PaginatedResponse<TaggedTransaction>>, AppError> {
    let address = match q.address.filter(|a| !a.trim().is_empty()) {
        Some(a) => a.trim().to_string(),
        None => st
            .intmax
            .session_address()
            .await
            .ok_or_else(|| AppError::validation_failed("Missing address"))?,
    };

    let items = service::transactions::load_transactions(st.intmax.as_ref(), &address)
        .await
        .map_err(|e| {
            crate::metrics::count_err("GET /api/transactions");
            match e {
                GatewayError::Timeout => AppError::timeout(e.to_string()),
                _ => AppError::secondary_account_unavailable(e.to_string()),
            }
        })?;

    crate::metrics::count_ok("GET /api/transactions");
    let params = PaginationParams::new(q.page, q.page_size);
    Ok(Json(service::transactions::paginate(items, params)))
}

// ========== Names API ==========

/// ENS + Base-Name 解析；解析失败回退为截断地址
#[utoipa::path(
    get,
    path = "/api/names/{address}",
    params(("address" = String, Path, description = "EVM address")),
    responses(
        (status = 200, description = "Resolved names", body = ResolvedNames),
        (status = 400, description = "Invalid address", body = crate::error_body::ErrorBodyDoc)
    )
)]
pub async fn resolve_names(
    State(st): State<Arc<AppState>>,
    Path(address): Path<String>,
) -> Result<Json<ResolvedNames>, AppError> {
    let resolved = st
        .names
        .resolve(address.trim())
        .await
        .inspect_err(|_| crate::metrics::count_err("GET /api/names/:address"))?;
    crate::metrics::count_ok("GET /api/names/:address");
    Ok(Json(resolved))
}

// ========== Config API ==========

#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct PublicConfigResp {
    pub wallet_connect_project_id: Option<String>,
    pub parent_domain: String,
}

/// 前端启动所需的公开配置
#[utoipa::path(
    get,
    path = "/api/config/public",
    responses(
        (status = 200, description = "Public configuration", body = PublicConfigResp)
    )
)]
pub async fn public_config(State(st): State<Arc<AppState>>) -> Json<PublicConfigResp> {
    Json(PublicConfigResp {
        wallet_connect_project_id: st.config.server.wallet_connect_project_id.clone(),
        parent_domain: st.config.tee.parent_domain.clone(),
    })
}

// ========== Health API ==========

#[derive(Debug, Serialize, ToSchema)]
pub struct HealthResponse {
    pub status: String,
    pub database: String,
}

#[utoipa::path(
    get,
    path = "/api/health",
    responses(
        (status = 200, description = "Service health", body = HealthResponse)
    )
)]
pub async fn api_health(State(st): State<Arc<AppState>>) -> Json<HealthResponse> {
    let database = match crate::infrastructure::db::health_check(&st.pool).await {
        Ok(()) => "ok".to_string(),
        Err(e) => {
            tracing::warn!("db health check failed: {e}");
            "unavailable".to_string()
        }
    };
    let status = if database == "ok" { "ok" } else { "degraded" };
    Json(HealthResponse {
        status: status.to_string(),
        database,
    })
}

#[derive(Debug, Serialize, ToSchema)]
pub struct Healthz {
    pub ok: bool,
}

#[utoipa::path(
    get,
    path = "/healthz",
    responses((status = 200, description = "Liveness", body = Healthz))
)]
pub async fn healthz() -> Json<Healthz> {
    Json(Healthz { ok: true })
}
