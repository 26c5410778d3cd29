use axum::http::HeaderMap;

pub mod audit;
pub mod auth;
pub mod csrf;
pub mod rate_limit;
pub mod rbac;

// 别名
pub use audit::audit;
pub use auth::{auth_middleware, AuthUser, AuthUserExtractor};
pub use csrf::{csrf_middleware, issue_csrf_token};
pub use rate_limit::{rate_limit, RateLimitClass};
pub use rbac::{
    require_admin, require_admin_middleware, require_any_role, require_role,
    require_seller_or_admin,
};

/// 客户端IP：X-Forwarded-For第一跳 > X-Real-IP > "unknown"
pub fn client_ip(headers: &HeaderMap) -> String {
    headers
        .get("X-Forwarded-For")
        .and_then(|h| h.to_str().ok())
        .and_then(|s| s.split(',').next())
        .map(|s| s.trim())
        .filter(|s| !s.is_empty())
        .or_else(|| headers.get("X-Real-IP").and_then(|h| h.to_str().ok()))
        .unwrap_or("unknown")
        .to_string()
}
