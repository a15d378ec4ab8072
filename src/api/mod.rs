use std::sync::Arc;

use axum::{
    middleware::from_fn,
    response::IntoResponse,
    routing::{get, post, put},
    Router,
};
use tower::ServiceBuilder;
use tower_http::{cors::CorsLayer, trace::TraceLayer};
use utoipa::OpenApi;

use crate::{
    api::{
        handlers::{
            api_health, create_subdomain, create_user, get_user, healthz, list_transactions,
            public_config, reconcile_user, register_proxy, resolve_names, update_user,
        },
        middleware::trace_id_middleware,
    },
    app_state::AppState,
};

pub mod handlers;
pub mod middleware;
pub mod response;

#[derive(OpenApi)]
#[openapi(
    paths(
        handlers::get_user,
        handlers::create_user,
        handlers::update_user,
        handlers::reconcile_user,
        handlers::register_proxy,
        handlers::create_subdomain,
        handlers::list_transactions,
        handlers::resolve_names,
        handlers::public_config,
        handlers::api_health,
        handlers::healthz,
    ),
    components(
        schemas(
            handlers::UserResp,
            handlers::CreateUserReq,
            handlers::UpdateUserReq,
            handlers::ReconcileReq,
            handlers::CreateSubdomainReq,
            handlers::SubdomainResp,
            handlers::PublicConfigResp,
            handlers::HealthResponse,
            handlers::Healthz,
            crate::service::names::ResolvedNames,
            crate::service::transactions::TaggedTransaction,
            crate::service::transactions::RawTransaction,
            crate::service::transactions::TransactionStatus,
            crate::service::transactions::TransactionOrigin,
            crate::error_body::ErrorBodyDoc,
        )
    ),
    tags(
        (name = "Substream API", description = "Subdomain registration and transfer history")
    )
)]
struct ApiDoc;

pub fn routes(state: Arc<AppState>) -> Router {
    Router::new()
        // 注册：TEE透传 + 完整工作流
        .route("/api/register", post(register_proxy))
        .route("/api/subdomains", post(create_subdomain))
        // 用户记录 CRUD + 对账
        .route("/api/user", get(get_user))
        .route("/api/user/create", post(create_user))
        .route("/api/user/update", put(update_user))
        .route("/api/user/reconcile", post(reconcile_user))
        // 展示
        .route("/api/transactions", get(list_transactions))
        .route("/api/names/:address", get(resolve_names))
        .route("/api/config/public", get(public_config))
        // 健康检查与指标
        .route("/health", get(api_health))
        .route("/api/health", get(api_health))
        .route("/healthz", get(healthz))
        .route(
            "/metrics",
            get(|| async { crate::metrics::render_prometheus().into_response() }),
        )
        .merge(
            utoipa_swagger_ui::SwaggerUi::new("/docs").url("/openapi.json", ApiDoc::openapi()),
        )
        .layer(
            ServiceBuilder::new()
                .layer(from_fn(trace_id_middleware))
                .layer(TraceLayer::new_for_http())
                .layer(CorsLayer::permissive()),
        )
        .with_state(state)
}
