//! 认证 API：注册与登录
//!
//! 两个端点都是公开路由，但套用独立的 Auth 级限流窗口。

use std::sync::Arc;

use axum::{extract::State, http::StatusCode, middleware, routing::post, Json, Router};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::{
    api::{
        middleware::{rate_limit, RateLimitClass},
        response::{created_response, success_response, ApiResponse},
        schemas::UserPublic,
    },
    app_state::AppState,
    error::AppError,
    service,
};

#[derive(Debug, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct RegisterReq {
    pub name: String,
    pub email: String,
    pub password: String,
    /// "seller"开通卖家账户；缺省或其他取值一律按买家处理
    #[serde(default)]
    pub account_type: Option<String>,
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct LoginReq {
    pub email: String,
    pub password: String,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct AuthData {
    pub user: UserPublic,
    pub token: String,
}

#[utoipa::path(
    post,
    path = "/api/auth/register",
    tag = "auth",
    request_body = RegisterReq,
    responses(
        (status = 201, description = "Usuário criado", body = crate::api::response::ApiResponse<AuthData>),
        (status = 400, description = "Payload inválido"),
        (status = 409, description = "Email já cadastrado"),
        (status = 429, description = "Limite de tentativas excedido")
    )
)]
pub async fn register(
    State(st): State<Arc<AppState>>,
    Json(req): Json<RegisterReq>,
) -> Result<(StatusCode, Json<ApiResponse<AuthData>>), AppError> {
    let (user, token) = service::auth::register(
        &st.pool,
        req.name,
        req.email,
        req.password,
        req.account_type,
    )
    .await?;
    crate::metrics::count_ok("POST /api/auth/register");
    created_response(AuthData {
        user: user.into(),
        token,
    })
}

#[utoipa::path(
    post,
    path = "/api/auth/login",
    tag = "auth",
    request_body = LoginReq,
    responses(
        (status = 200, description = "Login realizado", body = crate::api::response::ApiResponse<AuthData>),
        (status = 401, description = "Credenciais inválidas"),
        (status = 429, description = "Limite de tentativas excedido")
    )
)]
pub async fn login(
    State(st): State<Arc<AppState>>,
    Json(req): Json<LoginReq>,
) -> Result<Json<ApiResponse<AuthData>>, AppError> {
    let (user, token) = service::auth::login(&st.pool, &req.email, req.password).await?;
    crate::metrics::count_ok("POST /api/auth/login");
    success_response(AuthData {
        user: user.into(),
        token,
    })
}

/// 认证路由（公开，Auth 级限流）
pub fn routes(state: Arc<AppState>) -> Router<Arc<AppState>> {
    Router::new()
        .route("/api/auth/register", post(register))
        .route("/api/auth/login", post(login))
        .route_layer(middleware::from_fn_with_state(
            state,
            rate_limit(RateLimitClass::Auth),
        ))
}
