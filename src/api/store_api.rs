//! 店铺 API：卖家自营店铺与公开店铺页

use std::sync::Arc;

use axum::{
    extract::{Path, State},
    http::StatusCode,
    routing::{get, post},
    Json, Router,
};
use serde::Deserialize;
use utoipa::ToSchema;

use crate::{
    api::{
        middleware::{require_role, AuthUserExtractor},
        response::{created_response, success_response, ApiResponse},
    },
    app_state::AppState,
    domain::Role,
    error::AppError,
    repository::stores::Store,
    service,
};

#[derive(Debug, Deserialize, ToSchema)]
pub struct CreateStoreReq {
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
}

#[utoipa::path(
    post,
    path = "/api/stores",
    tag = "stores",
    request_body = CreateStoreReq,
    responses(
        (status = 201, description = "Loja criada", body = crate::api::response::ApiResponse<Store>),
        (status = 400, description = "Assinatura ativa obrigatória"),
        (status = 403, description = "Apenas vendedores"),
        (status = 409, description = "Vendedor já possui loja")
    )
)]
pub async fn create_store(
    State(st): State<Arc<AppState>>,
    AuthUserExtractor(auth): AuthUserExtractor,
    Json(req): Json<CreateStoreReq>,
) -> Result<(StatusCode, Json<ApiResponse<Store>>), AppError> {
    require_role(&auth, Role::Seller)?;
    let store = service::stores::create_store(&st.pool, auth.id, req.name, req.description).await?;
    crate::metrics::count_ok("POST /api/stores");
    created_response(store)
}

#[utoipa::path(
    get,
    path = "/api/stores/mine",
    tag = "stores",
    responses(
        (status = 200, description = "Loja do vendedor", body = crate::api::response::ApiResponse<Store>),
        (status = 404, description = "Loja não encontrada")
    )
)]
pub async fn get_my_store(
    State(st): State<Arc<AppState>>,
    AuthUserExtractor(auth): AuthUserExtractor,
) -> Result<Json<ApiResponse<Store>>, AppError> {
    let store = service::stores::get_my_store(&st.pool, auth.id).await?;
    crate::metrics::count_ok("GET /api/stores/mine");
    success_response(store)
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct UpdateStoreReq {
    pub name: Option<String>,
    pub description: Option<String>,
}

#[utoipa::path(
    put,
    path = "/api/stores/mine",
    tag = "stores",
    request_body = UpdateStoreReq,
    responses(
        (status = 200, description = "Loja atualizada", body = crate::api::response::ApiResponse<Store>),
        (status = 404, description = "Loja não encontrada")
    )
)]
pub async fn update_my_store(
    State(st): State<Arc<AppState>>,
    AuthUserExtractor(auth): AuthUserExtractor,
    Json(req): Json<UpdateStoreReq>,
) -> Result<Json<ApiResponse<Store>>, AppError> {
    let store =
        service::stores::update_my_store(&st.pool, auth.id, req.name, req.description).await?;
    crate::metrics::count_ok("PUT /api/stores/mine");
    success_response(store)
}

#[utoipa::path(
    get,
    path = "/api/stores/{slug}",
    tag = "stores",
    params(("slug" = String, Path, description = "Slug da loja")),
    responses(
        (status = 200, description = "Página pública da loja", body = crate::api::response::ApiResponse<Store>),
        (status = 404, description = "Loja não encontrada")
    )
)]
pub async fn get_public_store(
    State(st): State<Arc<AppState>>,
    Path(slug): Path<String>,
) -> Result<Json<ApiResponse<Store>>, AppError> {
    let store = service::stores::get_public_store(&st.pool, &slug).await?;
    crate::metrics::count_ok("GET /api/stores/:slug");
    success_response(store)
}

/// 卖家店铺路由（受保护路由树）
pub fn routes() -> Router<Arc<AppState>> {
    Router::new()
        .route("/api/stores", post(create_store))
        .route(
            "/api/stores/mine",
            get(get_my_store).put(update_my_store),
        )
}
