//! 认证中间件
//! 解析 Bearer Token，把登录用户注入请求扩展

use std::sync::Arc;

use axum::{
    extract::{FromRequestParts, Request, State},
    http::{header::AUTHORIZATION, request::Parts, Method},
    middleware::Next,
    response::Response,
};
use uuid::Uuid;

use crate::{
    app_state::AppState,
    domain::Role,
    error::AppError,
    infrastructure::jwt,
    repository::users,
};

/// 已认证用户（从JWT claims解码）
#[derive(Debug, Clone)]
pub struct AuthUser {
    pub id: Uuid,
    pub email: String,
    pub role: Role,
}

/// 认证中间件
///
/// 验证通过后把 `AuthUser` 写入请求扩展，
/// 后续的RBAC中间件和handler直接读取，不再重复解码。
pub async fn auth_middleware(
    State(st): State<Arc<AppState>>,
    mut req: Request,
    next: Next,
) -> Result<Response, AppError> {
    // CORS预检请求不带Authorization头，直接放行
    if req.method() == Method::OPTIONS {
        return Ok(next.run(req).await);
    }

    let token = bearer_token(&req)
        .ok_or_else(|| AppError::unauthorized("Token de autenticação não fornecido"))?;

    let claims = jwt::verify_token(&token)
        .map_err(|_| AppError::invalid_token("Token inválido ou expirado"))?;
    let role = claims
        .role()
        .map_err(|_| AppError::invalid_token("Token inválido ou expirado"))?;

    // 可选的用户状态校验：多一次DB往返，换取封禁即时生效。默认关闭。
    if st.config.security.verify_user_status {
        let active = users::is_active(&st.pool, claims.user_id).await?;
        if active != Some(true) {
            return Err(AppError::user_inactive(
                "Usuário inativo ou não encontrado",
            ));
        }
    }

    let auth_user = AuthUser {
        id: claims.user_id,
        email: claims.email,
        role,
    };
    req.extensions_mut().insert(auth_user);

    Ok(next.run(req).await)
}

/// 提取 `Authorization: Bearer <token>` 中的token
fn bearer_token(req: &Request) -> Option<String> {
    let header = req.headers().get(AUTHORIZATION)?.to_str().ok()?;
    header
        .strip_prefix("Bearer ")
        .map(|t| t.trim().to_string())
        .filter(|t| !t.is_empty())
}

/// Handler侧提取器
///
/// ```rust,ignore
/// async fn profile(AuthUserExtractor(user): AuthUserExtractor) -> ... {}
/// ```
pub struct AuthUserExtractor(pub AuthUser);

#[axum::async_trait]
impl<S> FromRequestParts<S> for AuthUserExtractor
where
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        parts
            .extensions
            .get::<AuthUser>()
            .cloned()
            .map(AuthUserExtractor)
            .ok_or_else(|| AppError::unauthorized("Token de autenticação não fornecido"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::Body;

    fn request_with_auth(value: &str) -> Request {
        axum::http::Request::builder()
            .uri("/api/users/profile")
            .header(AUTHORIZATION, value)
            .body(Body::empty())
            .unwrap()
    }

    #[test]
    fn test_bearer_token_parsing() {
        let req = request_with_auth("Bearer abc.def.ghi");
        assert_eq!(bearer_token(&req).as_deref(), Some("abc.def.ghi"));

        // 缺少Bearer前缀
        let req = request_with_auth("abc.def.ghi");
        assert_eq!(bearer_token(&req), None);

        // 只有前缀没有token
        let req = request_with_auth("Bearer ");
        assert_eq!(bearer_token(&req), None);

        let req = axum::http::Request::builder()
            .uri("/api/users/profile")
            .body(Body::empty())
            .unwrap();
        assert_eq!(bearer_token(&req), None);
    }
}
