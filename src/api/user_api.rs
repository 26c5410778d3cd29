//! 用户 API：资料、地址、心愿单与订单通知

use std::sync::Arc;

use axum::{
    extract::{Path, State},
    http::StatusCode,
    middleware,
    routing::{get, post, put},
    Json, Router,
};
use serde::Deserialize;
use utoipa::ToSchema;
use uuid::Uuid;

use crate::{
    api::{
        middleware::{rate_limit, AuthUserExtractor, RateLimitClass},
        response::{
            created_response, message_response, success_response, ApiResponse, MessageData,
        },
        schemas::UserPublic,
    },
    app_state::AppState,
    error::AppError,
    repository::{addresses::Address, wishlist::WishlistItem},
    service::{self, users::Notification},
};

// ============ 资料 ============

#[utoipa::path(
    get,
    path = "/api/users/profile",
    tag = "users",
    responses(
        (status = 200, description = "Perfil do usuário", body = crate::api::response::ApiResponse<UserPublic>),
        (status = 401, description = "Não autenticado")
    )
)]
pub async fn get_profile(
    State(st): State<Arc<AppState>>,
    AuthUserExtractor(auth): AuthUserExtractor,
) -> Result<Json<ApiResponse<UserPublic>>, AppError> {
    let user = service::users::get_profile(&st.pool, auth.id).await?;
    crate::metrics::count_ok("GET /api/users/profile");
    success_response(UserPublic::from(user))
}

#[derive(Debug, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct UpdateProfileReq {
    pub name: Option<String>,
    /// 修改密码时必填
    pub current_password: Option<String>,
    pub new_password: Option<String>,
}

#[utoipa::path(
    put,
    path = "/api/users/profile",
    tag = "users",
    request_body = UpdateProfileReq,
    responses(
        (status = 200, description = "Perfil atualizado", body = crate::api::response::ApiResponse<UserPublic>),
        (status = 400, description = "Senha atual incorreta")
    )
)]
pub async fn update_profile(
    State(st): State<Arc<AppState>>,
    AuthUserExtractor(auth): AuthUserExtractor,
    Json(req): Json<UpdateProfileReq>,
) -> Result<Json<ApiResponse<UserPublic>>, AppError> {
    let user = service::users::update_profile(
        &st.pool,
        auth.id,
        req.name,
        req.current_password,
        req.new_password,
    )
    .await?;
    crate::metrics::count_ok("PUT /api/users/profile");
    success_response(UserPublic::from(user))
}

// ============ 地址 ============

#[utoipa::path(
    get,
    path = "/api/users/addresses",
    tag = "users",
    responses((status = 200, description = "Endereços do usuário", body = crate::api::response::ApiResponse<Vec<Address>>))
)]
pub async fn list_addresses(
    State(st): State<Arc<AppState>>,
    AuthUserExtractor(auth): AuthUserExtractor,
) -> Result<Json<ApiResponse<Vec<Address>>>, AppError> {
    let items = service::users::list_addresses(&st.pool, auth.id).await?;
    crate::metrics::count_ok("GET /api/users/addresses");
    success_response(items)
}

#[derive(Debug, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CreateAddressReq {
    pub street: String,
    pub number: String,
    #[serde(default)]
    pub complement: Option<String>,
    pub city: String,
    pub state: String,
    pub zip_code: String,
    #[serde(default)]
    pub is_default: bool,
}

#[utoipa::path(
    post,
    path = "/api/users/addresses",
    tag = "users",
    request_body = CreateAddressReq,
    responses(
        (status = 201, description = "Endereço criado", body = crate::api::response::ApiResponse<Address>),
        (status = 400, description = "Campos obrigatórios ausentes")
    )
)]
pub async fn create_address(
    State(st): State<Arc<AppState>>,
    AuthUserExtractor(auth): AuthUserExtractor,
    Json(req): Json<CreateAddressReq>,
) -> Result<(StatusCode, Json<ApiResponse<Address>>), AppError> {
    let address = service::users::create_address(
        &st.pool,
        auth.id,
        service::users::AddressFields {
            street: req.street,
            number: req.number,
            complement: req.complement,
            city: req.city,
            state: req.state,
            zip_code: req.zip_code,
            is_default: req.is_default,
        },
    )
    .await?;
    crate::metrics::count_ok("POST /api/users/addresses");
    created_response(address)
}

#[derive(Debug, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct UpdateAddressReq {
    pub street: Option<String>,
    pub number: Option<String>,
    pub complement: Option<String>,
    pub city: Option<String>,
    pub state: Option<String>,
    pub zip_code: Option<String>,
    pub is_default: Option<bool>,
}

#[utoipa::path(
    put,
    path = "/api/users/addresses/{id}",
    tag = "users",
    params(("id" = Uuid, Path, description = "ID do endereço")),
    request_body = UpdateAddressReq,
    responses(
        (status = 200, description = "Endereço atualizado", body = crate::api::response::ApiResponse<Address>),
        (status = 404, description = "Endereço não encontrado")
    )
)]
pub async fn update_address(
    State(st): State<Arc<AppState>>,
    AuthUserExtractor(auth): AuthUserExtractor,
    Path(id): Path<Uuid>,
    Json(req): Json<UpdateAddressReq>,
) -> Result<Json<ApiResponse<Address>>, AppError> {
    let address = service::users::update_address(
        &st.pool,
        auth.id,
        id,
        req.street,
        req.number,
        req.complement,
        req.city,
        req.state,
        req.zip_code,
        req.is_default,
    )
    .await?;
    crate::metrics::count_ok("PUT /api/users/addresses/:id");
    success_response(address)
}

#[utoipa::path(
    delete,
    path = "/api/users/addresses/{id}",
    tag = "users",
    params(("id" = Uuid, Path, description = "ID do endereço")),
    responses(
        (status = 200, description = "Endereço removido", body = crate::api::response::ApiResponse<MessageData>),
        (status = 404, description = "Endereço não encontrado")
    )
)]
pub async fn delete_address(
    State(st): State<Arc<AppState>>,
    AuthUserExtractor(auth): AuthUserExtractor,
    Path(id): Path<Uuid>,
) -> Result<Json<ApiResponse<MessageData>>, AppError> {
    service::users::delete_address(&st.pool, auth.id, id).await?;
    crate::metrics::count_ok("DELETE /api/users/addresses/:id");
    message_response("Endereço removido com sucesso")
}

// ============ 心愿单 ============

#[utoipa::path(
    get,
    path = "/api/users/wishlist",
    tag = "users",
    responses((status = 200, description = "Lista de desejos", body = crate::api::response::ApiResponse<Vec<WishlistItem>>))
)]
pub async fn list_wishlist(
    State(st): State<Arc<AppState>>,
    AuthUserExtractor(auth): AuthUserExtractor,
) -> Result<Json<ApiResponse<Vec<WishlistItem>>>, AppError> {
    let items = service::users::list_wishlist(&st.pool, auth.id).await?;
    crate::metrics::count_ok("GET /api/users/wishlist");
    success_response(items)
}

#[utoipa::path(
    post,
    path = "/api/users/wishlist/{productId}",
    tag = "users",
    params(("productId" = Uuid, Path, description = "ID do produto")),
    responses(
        (status = 201, description = "Produto adicionado", body = crate::api::response::ApiResponse<MessageData>),
        (status = 404, description = "Produto não encontrado")
    )
)]
pub async fn add_to_wishlist(
    State(st): State<Arc<AppState>>,
    AuthUserExtractor(auth): AuthUserExtractor,
    Path(product_id): Path<Uuid>,
) -> Result<(StatusCode, Json<ApiResponse<MessageData>>), AppError> {
    service::users::add_to_wishlist(&st.pool, auth.id, product_id).await?;
    crate::metrics::count_ok("POST /api/users/wishlist/:productId");
    created_response(MessageData {
        message: "Produto adicionado à lista de desejos".into(),
    })
}

#[utoipa::path(
    delete,
    path = "/api/users/wishlist/{productId}",
    tag = "users",
    params(("productId" = Uuid, Path, description = "ID do produto")),
    responses(
        (status = 200, description = "Produto removido", body = crate::api::response::ApiResponse<MessageData>),
        (status = 404, description = "Item não está na lista")
    )
)]
pub async fn remove_from_wishlist(
    State(st): State<Arc<AppState>>,
    AuthUserExtractor(auth): AuthUserExtractor,
    Path(product_id): Path<Uuid>,
) -> Result<Json<ApiResponse<MessageData>>, AppError> {
    service::users::remove_from_wishlist(&st.pool, auth.id, product_id).await?;
    crate::metrics::count_ok("DELETE /api/users/wishlist/:productId");
    message_response("Produto removido da lista de desejos")
}

// ============ 通知 ============

#[utoipa::path(
    get,
    path = "/api/notifications",
    tag = "notifications",
    responses((status = 200, description = "Notificações de pedidos", body = crate::api::response::ApiResponse<Vec<Notification>>))
)]
pub async fn list_notifications(
    State(st): State<Arc<AppState>>,
    AuthUserExtractor(auth): AuthUserExtractor,
) -> Result<Json<ApiResponse<Vec<Notification>>>, AppError> {
    let items = service::users::list_notifications(&st.pool, auth.id).await?;
    crate::metrics::count_ok("GET /api/notifications");
    success_response(items)
}

/// 用户路由（资料/地址/心愿单，挂在受保护路由树下）
pub fn routes() -> Router<Arc<AppState>> {
    Router::new()
        .route("/api/users/profile", get(get_profile).put(update_profile))
        .route(
            "/api/users/addresses",
            get(list_addresses).post(create_address),
        )
        .route(
            "/api/users/addresses/:id",
            put(update_address).delete(delete_address),
        )
        .route("/api/users/wishlist", get(list_wishlist))
        .route(
            "/api/users/wishlist/:productId",
            post(add_to_wishlist).delete(remove_from_wishlist),
        )
}

/// 通知路由：在 Api 级限流之上叠加 Notifications 级窗口
pub fn notification_routes(state: Arc<AppState>) -> Router<Arc<AppState>> {
    Router::new()
        .route("/api/notifications", get(list_notifications))
        .route_layer(middleware::from_fn_with_state(
            state,
            rate_limit(RateLimitClass::Notifications),
        ))
}
