use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AppErrorCode {
    // HTTP 基础错误码
    ValidationError,
    AuthRequired,
    InvalidToken,
    Forbidden,
    NotFound,
    RateLimitExceeded,
    Internal,

    // 业务错误码
    AuthRateLimitExceeded,
    CsrfInvalid,
    InvalidCredentials,
    UserInactive,
    DuplicateResource,
    BusinessRuleViolation,
}

impl AppErrorCode {
    /// 错误码的字符串形式（与前端约定的大写下划线格式）
    pub fn as_str(&self) -> &'static str {
        match self {
            AppErrorCode::ValidationError => "VALIDATION_ERROR",
            AppErrorCode::AuthRequired => "AUTH_REQUIRED",
            AppErrorCode::InvalidToken => "INVALID_TOKEN",
            AppErrorCode::Forbidden => "FORBIDDEN",
            AppErrorCode::NotFound => "NOT_FOUND",
            AppErrorCode::RateLimitExceeded => "RATE_LIMIT_EXCEEDED",
            AppErrorCode::Internal => "INTERNAL_ERROR",
            AppErrorCode::AuthRateLimitExceeded => "AUTH_RATE_LIMIT_EXCEEDED",
            AppErrorCode::CsrfInvalid => "CSRF_INVALID",
            AppErrorCode::InvalidCredentials => "INVALID_CREDENTIALS",
            AppErrorCode::UserInactive => "USER_INACTIVE",
            AppErrorCode::DuplicateResource => "DUPLICATE_RESOURCE",
            AppErrorCode::BusinessRuleViolation => "BUSINESS_RULE_VIOLATION",
        }
    }
}

#[derive(Debug, Clone)]
pub struct AppError {
    pub code: AppErrorCode,
    pub message: String,
    pub status: StatusCode,
    pub details: Option<serde_json::Value>,
}

/// 错误响应体：{ success: false, error: { code, message, details? } }
#[derive(Serialize)]
struct ErrorEnvelope<'a> {
    success: bool,
    error: ErrorDetail<'a>,
}

#[derive(Serialize)]
struct ErrorDetail<'a> {
    code: &'a str,
    message: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    details: Option<&'a serde_json::Value>,
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let body = ErrorEnvelope {
            success: false,
            error: ErrorDetail {
                code: self.code.as_str(),
                message: &self.message,
                details: self.details.as_ref(),
            },
        };
        (self.status, Json(body)).into_response()
    }
}

impl AppError {
    pub fn bad_request(msg: impl Into<String>) -> Self {
        Self {
            code: AppErrorCode::ValidationError,
            message: Self::user_friendly_message(msg.into()),
            status: StatusCode::BAD_REQUEST,
            details: None,
        }
    }

    /// 将技术错误消息转换为用户友好的葡萄牙语提示
    fn user_friendly_message(msg: String) -> String {
        if msg.contains("database") || msg.contains("Database") {
            return "Sistema temporariamente indisponível. Tente novamente mais tarde.".to_string();
        }
        if msg.contains("timeout") || msg.contains("Timeout") {
            return "Tempo de requisição esgotado. Tente novamente.".to_string();
        }
        if msg.contains("network") || msg.contains("Network") {
            return "Erro de rede. Verifique sua conexão e tente novamente.".to_string();
        }
        // 已经是面向用户的消息，原样返回
        msg
    }

    pub fn unauthorized(msg: impl Into<String>) -> Self {
        Self {
            code: AppErrorCode::AuthRequired,
            message: msg.into(),
            status: StatusCode::UNAUTHORIZED,
            details: None,
        }
    }

    pub fn invalid_token(msg: impl Into<String>) -> Self {
        Self {
            code: AppErrorCode::InvalidToken,
            message: msg.into(),
            status: StatusCode::UNAUTHORIZED,
            details: None,
        }
    }

    pub fn invalid_credentials(msg: impl Into<String>) -> Self {
        Self {
            code: AppErrorCode::InvalidCredentials,
            message: msg.into(),
            status: StatusCode::UNAUTHORIZED,
            details: None,
        }
    }

    pub fn user_inactive(msg: impl Into<String>) -> Self {
        Self {
            code: AppErrorCode::UserInactive,
            message: msg.into(),
            status: StatusCode::UNAUTHORIZED,
            details: None,
        }
    }

    pub fn forbidden(msg: impl Into<String>) -> Self {
        Self {
            code: AppErrorCode::Forbidden,
            message: msg.into(),
            status: StatusCode::FORBIDDEN,
            details: None,
        }
    }

    /// 403响应并在details中携带所需角色与实际角色，便于前端诊断
    pub fn forbidden_with_roles(required: &[&str], actual: &str) -> Self {
        Self {
            code: AppErrorCode::Forbidden,
            message: "Acesso negado. Permissões insuficientes.".to_string(),
            status: StatusCode::FORBIDDEN,
            details: Some(serde_json::json!({
                "required": required,
                "actual": actual,
            })),
        }
    }

    pub fn csrf_invalid(msg: impl Into<String>) -> Self {
        Self {
            code: AppErrorCode::CsrfInvalid,
            message: msg.into(),
            status: StatusCode::FORBIDDEN,
            details: None,
        }
    }

    pub fn not_found(msg: impl Into<String>) -> Self {
        Self {
            code: AppErrorCode::NotFound,
            message: msg.into(),
            status: StatusCode::NOT_FOUND,
            details: None,
        }
    }

    pub fn conflict(msg: impl Into<String>) -> Self {
        Self {
            code: AppErrorCode::DuplicateResource,
            message: msg.into(),
            status: StatusCode::CONFLICT,
            details: None,
        }
    }

    /// 业务规则冲突（原接口以400返回，保持一致）
    pub fn business_rule(msg: impl Into<String>) -> Self {
        Self {
            code: AppErrorCode::BusinessRuleViolation,
            message: msg.into(),
            status: StatusCode::BAD_REQUEST,
            details: None,
        }
    }

    pub fn rate_limited(msg: impl Into<String>) -> Self {
        Self {
            code: AppErrorCode::RateLimitExceeded,
            message: msg.into(),
            status: StatusCode::TOO_MANY_REQUESTS,
            details: None,
        }
    }

    pub fn auth_rate_limited(msg: impl Into<String>) -> Self {
        Self {
            code: AppErrorCode::AuthRateLimitExceeded,
            message: msg.into(),
            status: StatusCode::TOO_MANY_REQUESTS,
            details: None,
        }
    }

    pub fn internal(msg: impl Into<String>) -> Self {
        // 内部细节只进服务端日志，客户端收到通用提示
        let detail = msg.into();
        tracing::error!(detail = %detail, "internal error");
        Self {
            code: AppErrorCode::Internal,
            message: "Erro interno do servidor".to_string(),
            status: StatusCode::INTERNAL_SERVER_ERROR,
            details: None,
        }
    }

    /// 附加details载荷
    pub fn with_details(mut self, details: serde_json::Value) -> Self {
        self.details = Some(details);
        self
    }
}

// 从 serde_json 错误转换
impl From<serde_json::Error> for AppError {
    fn from(err: serde_json::Error) -> Self {
        Self::bad_request(format!("JSON inválido: {}", err))
    }
}

// 从 SQLx 错误转换
impl From<sqlx::Error> for AppError {
    fn from(err: sqlx::Error) -> Self {
        match err {
            sqlx::Error::RowNotFound => Self::not_found("Recurso não encontrado"),
            sqlx::Error::Database(ref db_err) => {
                if let Some(code) = db_err.code() {
                    if code == "23505" {
                        // PostgreSQL unique_violation
                        return Self::conflict("Registro duplicado");
                    }
                    if code == "23503" {
                        // PostgreSQL foreign_key_violation
                        return Self::bad_request("Referência inválida entre registros");
                    }
                }
                Self::internal(format!("Database error: {}", db_err))
            }
            _ => Self::internal(format!("Database operation failed: {}", err)),
        }
    }
}

// 从 UUID 错误转换
impl From<uuid::Error> for AppError {
    fn from(err: uuid::Error) -> Self {
        Self::bad_request(format!("Identificador inválido: {}", err))
    }
}

// 从 anyhow 错误转换
impl From<anyhow::Error> for AppError {
    fn from(err: anyhow::Error) -> Self {
        Self::internal(format!("{}", err))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_codes_are_screaming_snake() {
        assert_eq!(
            AppErrorCode::AuthRateLimitExceeded.as_str(),
            "AUTH_RATE_LIMIT_EXCEEDED"
        );
        assert_eq!(AppErrorCode::ValidationError.as_str(), "VALIDATION_ERROR");
    }

    #[test]
    fn test_sqlx_row_not_found_maps_to_404() {
        // 不依赖数据库驱动就能构造的唯一变体
        let err: AppError = sqlx::Error::RowNotFound.into();
        assert_eq!(err.status, StatusCode::NOT_FOUND);
        assert_eq!(err.code, AppErrorCode::NotFound);
    }

    #[test]
    fn test_forbidden_with_roles_carries_details() {
        let err = AppError::forbidden_with_roles(&["ADMIN"], "BUYER");
        let details = err.details.expect("details should be present");
        assert_eq!(details["required"][0], "ADMIN");
        assert_eq!(details["actual"], "BUYER");
    }

    #[test]
    fn test_user_friendly_message_masks_database_detail() {
        let err = AppError::bad_request("Database connection refused");
        assert!(!err.message.contains("Database"));
    }
}
