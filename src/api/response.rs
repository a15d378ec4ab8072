//! API 响应辅助
//!
//! 用户路由按线格式原样返回记录（camelCase JSON），错误响应统一为
//! { code, message }（见 error.rs）

pub mod pagination;
