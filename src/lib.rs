//! Substream - 子域名注册与转账历史展示后端
//!
//! 业务核心：以钱包地址为主键的用户记录对账（reconciliation）、
//! TEE子域名注册工作流、ENS/Base-Name解析与交易列表分页展示

pub mod api;
pub mod app_state;
pub mod config;
pub mod error;
pub mod error_body;
pub mod infrastructure;
pub mod metrics;
pub mod repository;
pub mod service;
pub mod utils;

// 重新导出常用类型
pub use app_state::AppState;
pub use error::{AppError, AppErrorCode};

pub mod prelude {
    pub use crate::{
        app_state::AppState,
        error::{AppError, AppErrorCode},
        repository::users::UserRecord,
    };
}
