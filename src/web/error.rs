//! Web 层错误处理

use crate::error::NormaError;
use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use rat_logger::{error, warn};
use serde::Serialize;

/// 存储未初始化时返回的提示
pub const NOT_INITIALIZED: &str = "Database not initialized";

/// 接口错误
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ApiError {
    /// 400
    BadRequest(String),
    /// 404
    NotFound(String),
    /// 500
    Internal(String),
}

/// 错误响应体
#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub detail: String,
}

impl ApiError {
    /// 创建类接口的错误映射：除存储未初始化外一律为 400
    pub fn from_create(err: NormaError) -> Self {
        match err {
            NormaError::NotConnected => ApiError::Internal(NOT_INITIALIZED.to_string()),
            other => ApiError::BadRequest(other.to_string()),
        }
    }

    pub fn status(&self) -> StatusCode {
        match self {
            ApiError::BadRequest(_) => StatusCode::BAD_REQUEST,
            ApiError::NotFound(_) => StatusCode::NOT_FOUND,
            ApiError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

/// 查询类接口的错误映射
impl From<NormaError> for ApiError {
    fn from(err: NormaError) -> Self {
        match err {
            NormaError::NotConnected => ApiError::Internal(NOT_INITIALIZED.to_string()),
            NormaError::ValidationError { .. } => ApiError::BadRequest(err.to_string()),
            other => ApiError::Internal(other.to_string()),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        let detail = match self {
            ApiError::BadRequest(msg) => {
                warn!("⚠️ 请求无效: {}", msg);
                msg
            }
            ApiError::NotFound(msg) => msg,
            ApiError::Internal(msg) => {
                error!("❌ 服务内部错误: {}", msg);
                msg
            }
        };
        (status, Json(ErrorResponse { detail })).into_response()
    }
}
