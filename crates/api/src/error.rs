//! # API 统一错误处理
//!
//! 将门面层的错误类型统一映射到 HTTP 状态码与 JSON 响应体。

use axum::Json;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use thiserror::Error;
use zixuan_core::favorite::error::FavoriteError;

use crate::types::ApiErrorResponse;

/// API 层统一错误枚举
#[derive(Error, Debug)]
pub enum ApiError {
    /// 资源未找到 (404)
    #[error("资源未找到: {0}")]
    NotFound(String),

    /// 请求参数错误 (400)
    #[error("请求参数错误: {0}")]
    BadRequest(String),

    /// 下层业务错误 (500)
    #[error("内部服务错误: {0}")]
    Internal(String),
}

impl ApiError {
    /// 缺少必填查询参数
    pub fn missing(param: &str) -> Self {
        ApiError::BadRequest(format!("缺少参数 '{}'", param))
    }

    /// # Summary
    /// 查询类接口的错误映射。
    ///
    /// # Logic
    /// `Validation` → 400，`NotFound` → 404，其余 → 500。
    pub fn from_query(err: FavoriteError) -> Self {
        match err {
            FavoriteError::Validation(msg) => ApiError::BadRequest(msg),
            FavoriteError::NotFound(msg) => ApiError::NotFound(msg),
            other => ApiError::Internal(other.to_string()),
        }
    }

    /// # Summary
    /// 变更类接口的错误映射。
    ///
    /// # Logic
    /// `Validation` → 400，其余任何门面失败 (含 `NotFound`、`Conflict`) → 500。
    pub fn from_mutation(err: FavoriteError) -> Self {
        match err {
            FavoriteError::Validation(msg) => ApiError::BadRequest(msg),
            other => ApiError::Internal(other.to_string()),
        }
    }
}

/// 将 `ApiError` 转换为 axum 的 HTTP 响应
impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, message) = match self {
            ApiError::NotFound(msg) => (StatusCode::NOT_FOUND, msg),
            ApiError::BadRequest(msg) => (StatusCode::BAD_REQUEST, msg),
            ApiError::Internal(msg) => {
                tracing::error!("请求处理失败: {}", msg);
                (StatusCode::INTERNAL_SERVER_ERROR, msg)
            }
        };

        (status, Json(ApiErrorResponse::from_msg(message))).into_response()
    }
}
