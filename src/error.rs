use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;

/// 封闭错误码枚举：传输错误、校验错误、不存在、冲突
/// 所有失败都显式传播到调用方，不做鸭子类型的 catch-all
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AppErrorCode {
    // HTTP 基础错误码
    BadRequest,
    NotFound,
    Timeout,
    Internal,

    // 业务错误码
    UserNotFound,
    UserAlreadyExists,
    InvalidAddress,
    InvalidLabel,
    ValidationFailed,
    DatabaseError,
    ExternalServiceError,
    SecondaryAccountUnavailable,
}

#[derive(Debug, Clone)]
pub struct AppError {
    pub code: AppErrorCode,
    pub message: String,
    pub status: StatusCode,
}

#[derive(Serialize)]
struct ErrorBody<'a> {
    code: &'a str,
    message: &'a str,
}

impl AppErrorCode {
    pub fn as_str(&self) -> &'static str {
        match self {
            AppErrorCode::BadRequest => "bad_request",
            AppErrorCode::NotFound => "not_found",
            AppErrorCode::Timeout => "timeout",
            AppErrorCode::Internal => "internal",
            AppErrorCode::UserNotFound => "user_not_found",
            AppErrorCode::UserAlreadyExists => "user_already_exists",
            AppErrorCode::InvalidAddress => "invalid_address",
            AppErrorCode::InvalidLabel => "invalid_label",
            AppErrorCode::ValidationFailed => "validation_failed",
            AppErrorCode::DatabaseError => "database_error",
            AppErrorCode::ExternalServiceError => "external_service_error",
            AppErrorCode::SecondaryAccountUnavailable => "secondary_account_unavailable",
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let body = ErrorBody {
            code: self.code.as_str(),
            message: &self.message,
        };
        (self.status, Json(body)).into_response()
    }
}

impl AppError {
    pub fn bad_request(msg: impl Into<String>) -> Self {
        Self {
            code: AppErrorCode::BadRequest,
            message: msg.into(),
            status: StatusCode::BAD_REQUEST,
        }
    }

    pub fn not_found(msg: impl Into<String>) -> Self {
        Self {
            code: AppErrorCode::NotFound,
            message: msg.into(),
            status: StatusCode::NOT_FOUND,
        }
    }

    pub fn internal(msg: impl Into<String>) -> Self {
        Self {
            code: AppErrorCode::Internal,
            message: msg.into(),
            status: StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    pub fn timeout(msg: impl Into<String>) -> Self {
        Self {
            code: AppErrorCode::Timeout,
            message: msg.into(),
            status: StatusCode::GATEWAY_TIMEOUT,
        }
    }

    // 业务错误辅助函数
    pub fn user_not_found(msg: impl Into<String>) -> Self {
        Self {
            code: AppErrorCode::UserNotFound,
            message: msg.into(),
            status: StatusCode::NOT_FOUND,
        }
    }

    pub fn user_already_exists(msg: impl Into<String>) -> Self {
        Self {
            code: AppErrorCode::UserAlreadyExists,
            message: msg.into(),
            status: StatusCode::CONFLICT,
        }
    }

    pub fn invalid_address(msg: impl Into<String>) -> Self {
        Self {
            code: AppErrorCode::InvalidAddress,
            message: msg.into(),
            status: StatusCode::BAD_REQUEST,
        }
    }

    pub fn invalid_label(msg: impl Into<String>) -> Self {
        Self {
            code: AppErrorCode::InvalidLabel,
            message: msg.into(),
            status: StatusCode::BAD_REQUEST,
        }
    }

    pub fn validation_failed(msg: impl Into<String>) -> Self {
        Self {
            code: AppErrorCode::ValidationFailed,
            message: msg.into(),
            status: StatusCode::BAD_REQUEST,
        }
    }

    pub fn database_error(msg: impl Into<String>) -> Self {
        Self {
            code: AppErrorCode::DatabaseError,
            message: msg.into(),
            status: StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    pub fn external_service_error(msg: impl Into<String>) -> Self {
        Self {
            code: AppErrorCode::ExternalServiceError,
            message: msg.into(),
            status: StatusCode::BAD_GATEWAY,
        }
    }

    pub fn secondary_account_unavailable(msg: impl Into<String>) -> Self {
        Self {
            code: AppErrorCode::SecondaryAccountUnavailable,
            message: msg.into(),
            status: StatusCode::BAD_GATEWAY,
        }
    }
}

impl From<sqlx::Error> for AppError {
    fn from(e: sqlx::Error) -> Self {
        match &e {
            sqlx::Error::RowNotFound => AppError::not_found("Record not found"),
            sqlx::Error::Database(db) if db.is_unique_violation() => {
                AppError::user_already_exists("Record already exists")
            }
            _ => AppError::database_error(e.to_string()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn error_codes_map_to_expected_status() {
        assert_eq!(AppError::bad_request("x").status, StatusCode::BAD_REQUEST);
        assert_eq!(AppError::user_not_found("x").status, StatusCode::NOT_FOUND);
        assert_eq!(
            AppError::user_already_exists("x").status,
            StatusCode::CONFLICT
        );
        assert_eq!(
            AppError::external_service_error("x").status,
            StatusCode::BAD_GATEWAY
        );
    }

    #[test]
    fn code_strings_are_stable() {
        assert_eq!(AppErrorCode::UserAlreadyExists.as_str(), "user_already_exists");
        assert_eq!(AppErrorCode::ValidationFailed.as_str(), "validation_failed");
    }
}
