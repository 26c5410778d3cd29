//! 统一 API 响应格式
//!
//! 成功响应：{ success: true, data, pagination? }
//! 错误响应由 AppError 生成：{ success: false, error: { code, message, details? } }

use axum::{http::StatusCode, Json};
use serde::Serialize;
use utoipa::ToSchema;

use crate::error::AppError;

pub mod pagination;

pub use pagination::{Pagination, PaginationParams};

/// 统一成功响应格式
#[derive(Debug, Serialize, ToSchema)]
pub struct ApiResponse<T> {
    pub success: bool,
    pub data: T,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub pagination: Option<Pagination>,
}

impl<T> ApiResponse<T> {
    /// 创建成功响应
    pub fn success(data: T) -> Self {
        Self {
            success: true,
            data,
            pagination: None,
        }
    }

    /// 创建带分页信息的成功响应
    pub fn paginated(data: T, pagination: Pagination) -> Self {
        Self {
            success: true,
            data,
            pagination: Some(pagination),
        }
    }
}

/// 辅助函数：将数据包装为统一响应格式
pub fn success_response<T: Serialize>(data: T) -> Result<Json<ApiResponse<T>>, AppError> {
    Ok(Json(ApiResponse::success(data)))
}

/// 辅助函数：201 Created 响应
pub fn created_response<T: Serialize>(
    data: T,
) -> Result<(StatusCode, Json<ApiResponse<T>>), AppError> {
    Ok((StatusCode::CREATED, Json(ApiResponse::success(data))))
}

/// 辅助函数：带分页块的响应
pub fn paginated_response<T: Serialize>(
    data: Vec<T>,
    pagination: Pagination,
) -> Result<Json<ApiResponse<Vec<T>>>, AppError> {
    Ok(Json(ApiResponse::paginated(data, pagination)))
}

/// 仅携带提示消息的数据体（删除/取消等操作的响应）
#[derive(Debug, Serialize, ToSchema)]
pub struct MessageData {
    pub message: String,
}

pub fn message_response(
    message: impl Into<String>,
) -> Result<Json<ApiResponse<MessageData>>, AppError> {
    success_response(MessageData {
        message: message.into(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_success_envelope_shape() {
        let resp = ApiResponse::success(serde_json::json!({"id": 1}));
        let body = serde_json::to_value(&resp).unwrap();
        assert_eq!(body["success"], true);
        assert_eq!(body["data"]["id"], 1);
        assert!(body.get("pagination").is_none());
    }

    #[test]
    fn test_paginated_envelope_includes_block() {
        let resp = ApiResponse::paginated(vec![1, 2, 3], Pagination::new(1, 20, 3));
        let body = serde_json::to_value(&resp).unwrap();
        assert_eq!(body["pagination"]["total"], 3);
        assert_eq!(body["pagination"]["totalPages"], 1);
    }
}
