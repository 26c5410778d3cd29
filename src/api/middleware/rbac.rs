//! 基于角色的访问控制
//! 必须在 auth_middleware 之后使用（依赖请求扩展中的 AuthUser）

use std::sync::Arc;

use axum::{
    extract::{Request, State},
    middleware::Next,
    response::Response,
};

use crate::{app_state::AppState, domain::Role, error::AppError};

use super::auth::AuthUser;

/// 要求指定角色
pub fn require_role(user: &AuthUser, role: Role) -> Result<(), AppError> {
    if user.role == role {
        Ok(())
    } else {
        Err(AppError::forbidden_with_roles(
            &[role.as_str()],
            user.role.as_str(),
        ))
    }
}

/// 要求角色在允许列表内
pub fn require_any_role(user: &AuthUser, roles: &[Role]) -> Result<(), AppError> {
    if roles.contains(&user.role) {
        Ok(())
    } else {
        let required: Vec<&str> = roles.iter().map(|r| r.as_str()).collect();
        Err(AppError::forbidden_with_roles(
            &required,
            user.role.as_str(),
        ))
    }
}

/// 要求管理员
pub fn require_admin(user: &AuthUser) -> Result<(), AppError> {
    require_role(user, Role::Admin)
}

/// 要求卖家或管理员
pub fn require_seller_or_admin(user: &AuthUser) -> Result<(), AppError> {
    require_any_role(user, &[Role::Seller, Role::Admin])
}

/// 管理员路由守卫
///
/// 挂在 /api/admin 下，保证403发生在任何handler逻辑（尤其DB写）之前。
pub async fn require_admin_middleware(
    State(_st): State<Arc<AppState>>,
    req: Request,
    next: Next,
) -> Result<Response, AppError> {
    let user = req
        .extensions()
        .get::<AuthUser>()
        .ok_or_else(|| AppError::unauthorized("Token de autenticação não fornecido"))?;

    require_admin(user)?;

    Ok(next.run(req).await)
}

#[cfg(test)]
mod tests {
    use super::*;
    use uuid::Uuid;

    fn user_with(role: Role) -> AuthUser {
        AuthUser {
            id: Uuid::new_v4(),
            email: "x@example.com".to_string(),
            role,
        }
    }

    #[test]
    fn test_require_admin() {
        assert!(require_admin(&user_with(Role::Admin)).is_ok());

        let err = require_admin(&user_with(Role::Buyer)).unwrap_err();
        assert_eq!(err.status, axum::http::StatusCode::FORBIDDEN);
        let details = err.details.unwrap();
        assert_eq!(details["required"][0], "ADMIN");
        assert_eq!(details["actual"], "BUYER");
    }

    #[test]
    fn test_require_seller_or_admin() {
        assert!(require_seller_or_admin(&user_with(Role::Seller)).is_ok());
        assert!(require_seller_or_admin(&user_with(Role::Admin)).is_ok());
        assert!(require_seller_or_admin(&user_with(Role::Buyer)).is_err());
    }

    #[test]
    fn test_require_any_role_lists_all_required() {
        let err = require_any_role(&user_with(Role::Buyer), &[Role::Seller, Role::Admin])
            .unwrap_err();
        let details = err.details.unwrap();
        assert_eq!(details["required"], serde_json::json!(["SELLER", "ADMIN"]));
    }
}
