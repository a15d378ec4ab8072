//! Trace ID 中间件
//! 为每个请求生成唯一的 trace_id，用于全链路追踪

use axum::{extract::Request, http::HeaderValue, middleware::Next, response::Response};
use uuid::Uuid;

const TRACE_HEADER: &str = "X-Trace-Id";

/// 从请求头中提取 trace_id，没有则生成新的
fn get_or_generate(req: &Request) -> String {
    if let Some(header) = req.headers().get(TRACE_HEADER) {
        if let Ok(trace_id) = header.to_str() {
            if !trace_id.is_empty() {
                return trace_id.to_string();
            }
        }
    }
    Uuid::new_v4().to_string()
}

/// 为每个请求生成或提取 trace_id，回写到响应头，供日志与客户端关联
pub async fn trace_id_middleware(req: Request, next: Next) -> Response {
    let trace_id = get_or_generate(&req);

    let mut response = next.run(req).await;

    if let Ok(header_value) = HeaderValue::from_str(&trace_id) {
        response.headers_mut().insert(TRACE_HEADER, header_value);
    }

    response
}
