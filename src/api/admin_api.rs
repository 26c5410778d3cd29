//! 管理端 API：用户、店铺、商品、订单、套餐、订阅与横幅的完整管理面
//!
//! 整个路由树由 require_admin_middleware 把守，再叠加 Admin 级限流；
//! 每个变更端点单独包一层 audit(action, resource) 审计中间件。

use std::sync::Arc;

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    middleware,
    routing::{delete, get, patch, post, put},
    Json, Router,
};
use rust_decimal::Decimal;
use serde::Deserialize;
use utoipa::{IntoParams, ToSchema};
use uuid::Uuid;

use crate::{
    api::{
        audit_api,
        middleware::{
            audit, rate_limit, require_admin_middleware, AuthUserExtractor, RateLimitClass,
        },
        product_api::{ListProductsQuery, UpdateProductReq},
        response::{
            created_response, message_response, paginated_response, success_response, ApiResponse,
            MessageData, PaginationParams,
        },
        schemas::UserPublic,
    },
    app_state::AppState,
    error::AppError,
    repository::{
        banners::Banner, orders::Order, plans::Plan, products::Product, products::ProductFilter,
        stores::Store, subscriptions::Subscription,
    },
    service,
};

// ============ 用户管理 ============

#[derive(Debug, Deserialize, IntoParams)]
#[serde(rename_all = "camelCase")]
pub struct ListUsersQuery {
    pub page: Option<u32>,
    pub page_size: Option<u32>,
    /// BUYER | SELLER | ADMIN
    pub role: Option<String>,
    /// 按nome/email模糊搜索
    pub search: Option<String>,
}

#[utoipa::path(
    get,
    path = "/api/admin/users",
    tag = "admin",
    params(ListUsersQuery),
    responses(
        (status = 200, description = "Usuários da plataforma", body = crate::api::response::ApiResponse<Vec<UserPublic>>),
        (status = 403, description = "Apenas administradores")
    )
)]
pub async fn list_users(
    State(st): State<Arc<AppState>>,
    Query(q): Query<ListUsersQuery>,
) -> Result<Json<ApiResponse<Vec<UserPublic>>>, AppError> {
    let params = PaginationParams::new(q.page, q.page_size);
    let (items, total) = service::users::admin_list_users(
        &st.pool,
        q.role,
        q.search,
        params.limit(),
        params.offset(),
    )
    .await?;
    crate::metrics::count_ok("GET /api/admin/users");
    let users = items.into_iter().map(UserPublic::from).collect();
    paginated_response(users, params.to_block(total as u64))
}

#[utoipa::path(
    get,
    path = "/api/admin/users/{id}",
    tag = "admin",
    params(("id" = Uuid, Path, description = "ID do usuário")),
    responses(
        (status = 200, description = "Usuário", body = crate::api::response::ApiResponse<UserPublic>),
        (status = 404, description = "Usuário não encontrado")
    )
)]
pub async fn get_user(
    State(st): State<Arc<AppState>>,
    Path(id): Path<Uuid>,
) -> Result<Json<ApiResponse<UserPublic>>, AppError> {
    let user = service::users::admin_get_user(&st.pool, id).await?;
    crate::metrics::count_ok("GET /api/admin/users/:id");
    success_response(UserPublic::from(user))
}

#[derive(Debug, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct AdminUpdateUserReq {
    pub name: Option<String>,
    pub role: Option<String>,
    pub is_active: Option<bool>,
    pub is_verified: Option<bool>,
}

#[utoipa::path(
    put,
    path = "/api/admin/users/{id}",
    tag = "admin",
    params(("id" = Uuid, Path, description = "ID do usuário")),
    request_body = AdminUpdateUserReq,
    responses(
        (status = 200, description = "Usuário atualizado", body = crate::api::response::ApiResponse<UserPublic>),
        (status = 400, description = "Papel inválido"),
        (status = 404, description = "Usuário não encontrado")
    )
)]
pub async fn update_user(
    State(st): State<Arc<AppState>>,
    Path(id): Path<Uuid>,
    Json(req): Json<AdminUpdateUserReq>,
) -> Result<Json<ApiResponse<UserPublic>>, AppError> {
    let user = service::users::admin_update_user(
        &st.pool,
        id,
        req.name,
        req.role,
        req.is_active,
        req.is_verified,
    )
    .await?;
    crate::metrics::count_ok("PUT /api/admin/users/:id");
    success_response(UserPublic::from(user))
}

#[utoipa::path(
    delete,
    path = "/api/admin/users/{id}",
    tag = "admin",
    params(("id" = Uuid, Path, description = "ID do usuário")),
    responses(
        (status = 200, description = "Usuário excluído", body = crate::api::response::ApiResponse<MessageData>),
        (status = 400, description = "Usuário possui pedidos associados"),
        (status = 404, description = "Usuário não encontrado")
    )
)]
pub async fn delete_user(
    State(st): State<Arc<AppState>>,
    Path(id): Path<Uuid>,
) -> Result<Json<ApiResponse<MessageData>>, AppError> {
    service::users::admin_delete_user(&st.pool, id).await?;
    crate::metrics::count_ok("DELETE /api/admin/users/:id");
    message_response("Usuário excluído com sucesso")
}

// ============ 店铺管理 ============

#[derive(Debug, Deserialize, IntoParams)]
#[serde(rename_all = "camelCase")]
pub struct ListStoresQuery {
    pub page: Option<u32>,
    pub page_size: Option<u32>,
    pub search: Option<String>,
}

#[utoipa::path(
    get,
    path = "/api/admin/stores",
    tag = "admin",
    params(ListStoresQuery),
    responses((status = 200, description = "Lojas (inclui inativas)", body = crate::api::response::ApiResponse<Vec<Store>>))
)]
pub async fn list_stores(
    State(st): State<Arc<AppState>>,
    Query(q): Query<ListStoresQuery>,
) -> Result<Json<ApiResponse<Vec<Store>>>, AppError> {
    let params = PaginationParams::new(q.page, q.page_size);
    let (items, total) =
        service::stores::admin_list_stores(&st.pool, q.search, params.limit(), params.offset())
            .await?;
    crate::metrics::count_ok("GET /api/admin/stores");
    paginated_response(items, params.to_block(total as u64))
}

#[derive(Debug, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct AdminCreateStoreReq {
    /// 店主；和自助开店走同一校验（一人一店、订阅生效）
    pub owner_id: Uuid,
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
}

#[utoipa::path(
    post,
    path = "/api/admin/stores",
    tag = "admin",
    request_body = AdminCreateStoreReq,
    responses(
        (status = 201, description = "Loja criada", body = crate::api::response::ApiResponse<Store>),
        (status = 400, description = "Dono sem assinatura ativa"),
        (status = 409, description = "Vendedor já possui loja")
    )
)]
pub async fn create_store(
    State(st): State<Arc<AppState>>,
    Json(req): Json<AdminCreateStoreReq>,
) -> Result<(StatusCode, Json<ApiResponse<Store>>), AppError> {
    let store =
        service::stores::create_store(&st.pool, req.owner_id, req.name, req.description).await?;
    crate::metrics::count_ok("POST /api/admin/stores");
    created_response(store)
}

#[derive(Debug, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct AdminUpdateStoreReq {
    pub name: Option<String>,
    pub description: Option<String>,
    pub is_active: Option<bool>,
}

#[utoipa::path(
    put,
    path = "/api/admin/stores/{id}",
    tag = "admin",
    params(("id" = Uuid, Path, description = "ID da loja")),
    request_body = AdminUpdateStoreReq,
    responses(
        (status = 200, description = "Loja atualizada", body = crate::api::response::ApiResponse<Store>),
        (status = 404, description = "Loja não encontrada")
    )
)]
pub async fn update_store(
    State(st): State<Arc<AppState>>,
    Path(id): Path<Uuid>,
    Json(req): Json<AdminUpdateStoreReq>,
) -> Result<Json<ApiResponse<Store>>, AppError> {
    let store =
        service::stores::admin_update_store(&st.pool, id, req.name, req.description, req.is_active)
            .await?;
    crate::metrics::count_ok("PUT /api/admin/stores/:id");
    success_response(store)
}

#[utoipa::path(
    delete,
    path = "/api/admin/stores/{id}",
    tag = "admin",
    params(("id" = Uuid, Path, description = "ID da loja")),
    responses(
        (status = 200, description = "Loja excluída", body = crate::api::response::ApiResponse<MessageData>),
        (status = 400, description = "Loja possui pedidos associados"),
        (status = 404, description = "Loja não encontrada")
    )
)]
pub async fn delete_store(
    State(st): State<Arc<AppState>>,
    Path(id): Path<Uuid>,
) -> Result<Json<ApiResponse<MessageData>>, AppError> {
    service::stores::admin_delete_store(&st.pool, id).await?;
    crate::metrics::count_ok("DELETE /api/admin/stores/:id");
    message_response("Loja excluída com sucesso")
}

// ============ 商品管理 ============

#[utoipa::path(
    get,
    path = "/api/admin/products",
    tag = "admin",
    params(ListProductsQuery),
    responses((status = 200, description = "Produtos (inclui inativos)", body = crate::api::response::ApiResponse<Vec<Product>>))
)]
pub async fn list_products(
    State(st): State<Arc<AppState>>,
    Query(q): Query<ListProductsQuery>,
) -> Result<Json<ApiResponse<Vec<Product>>>, AppError> {
    let params = PaginationParams::new(q.page, q.page_size);
    let filter = ProductFilter {
        search: q.search,
        store_id: q.store_id,
        min_price: q.min_price,
        max_price: q.max_price,
    };
    let (items, total) =
        service::products::admin_list_products(&st.pool, filter, params.limit(), params.offset())
            .await?;
    crate::metrics::count_ok("GET /api/admin/products");
    paginated_response(items, params.to_block(total as u64))
}

#[derive(Debug, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct AdminCreateProductReq {
    pub store_id: Uuid,
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
    pub price: Decimal,
    #[serde(default)]
    pub stock: i32,
}

#[utoipa::path(
    post,
    path = "/api/admin/products",
    tag = "admin",
    request_body = AdminCreateProductReq,
    responses(
        (status = 201, description = "Produto criado", body = crate::api::response::ApiResponse<Product>),
        (status = 404, description = "Loja não encontrada")
    )
)]
pub async fn create_product(
    State(st): State<Arc<AppState>>,
    Json(req): Json<AdminCreateProductReq>,
) -> Result<(StatusCode, Json<ApiResponse<Product>>), AppError> {
    let product = service::products::admin_create_product(
        &st.pool,
        req.store_id,
        service::products::ProductFields {
            name: req.name,
            description: req.description,
            price: req.price,
            stock: req.stock,
        },
    )
    .await?;
    crate::metrics::count_ok("POST /api/admin/products");
    created_response(product)
}

#[utoipa::path(
    put,
    path = "/api/admin/products/{id}",
    tag = "admin",
    params(("id" = Uuid, Path, description = "ID do produto")),
    request_body = UpdateProductReq,
    responses(
        (status = 200, description = "Produto atualizado", body = crate::api::response::ApiResponse<Product>),
        (status = 404, description = "Produto não encontrado")
    )
)]
pub async fn update_product(
    State(st): State<Arc<AppState>>,
    AuthUserExtractor(auth): AuthUserExtractor,
    Path(id): Path<Uuid>,
    Json(req): Json<UpdateProductReq>,
) -> Result<Json<ApiResponse<Product>>, AppError> {
    let product = service::products::update_product(
        &st.pool,
        auth.id,
        auth.role,
        id,
        req.name,
        req.description,
        req.price,
        req.stock,
        req.is_active,
    )
    .await?;
    crate::metrics::count_ok("PUT /api/admin/products/:id");
    success_response(product)
}

#[utoipa::path(
    delete,
    path = "/api/admin/products/{id}",
    tag = "admin",
    params(("id" = Uuid, Path, description = "ID do produto")),
    responses(
        (status = 200, description = "Produto removido", body = crate::api::response::ApiResponse<MessageData>),
        (status = 404, description = "Produto não encontrado")
    )
)]
pub async fn delete_product(
    State(st): State<Arc<AppState>>,
    AuthUserExtractor(auth): AuthUserExtractor,
    Path(id): Path<Uuid>,
) -> Result<Json<ApiResponse<MessageData>>, AppError> {
    service::products::delete_product(&st.pool, auth.id, auth.role, id).await?;
    crate::metrics::count_ok("DELETE /api/admin/products/:id");
    message_response("Produto removido com sucesso")
}

// ============ 订单管理 ============

#[derive(Debug, Deserialize, IntoParams)]
#[serde(rename_all = "camelCase")]
pub struct ListOrdersQuery {
    pub page: Option<u32>,
    pub page_size: Option<u32>,
    /// PENDING | PAID | SHIPPED | DELIVERED | CANCELLED
    pub status: Option<String>,
}

#[utoipa::path(
    get,
    path = "/api/admin/orders",
    tag = "admin",
    params(ListOrdersQuery),
    responses((status = 200, description = "Todos os pedidos", body = crate::api::response::ApiResponse<Vec<Order>>))
)]
pub async fn list_orders(
    State(st): State<Arc<AppState>>,
    Query(q): Query<ListOrdersQuery>,
) -> Result<Json<ApiResponse<Vec<Order>>>, AppError> {
    let params = PaginationParams::new(q.page, q.page_size);
    let (items, total) =
        service::orders::admin_list_orders(&st.pool, q.status, params.limit(), params.offset())
            .await?;
    crate::metrics::count_ok("GET /api/admin/orders");
    paginated_response(items, params.to_block(total as u64))
}

#[derive(Debug, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct AdminUpdateOrderStatusReq {
    pub status: String,
    /// 确认支付（PAID）时携带的网关交易引用，后续退款依赖它
    #[serde(default)]
    pub payment_id: Option<String>,
}

#[utoipa::path(
    patch,
    path = "/api/admin/orders/{id}/status",
    tag = "admin",
    params(("id" = Uuid, Path, description = "ID do pedido")),
    request_body = AdminUpdateOrderStatusReq,
    responses(
        (status = 200, description = "Status atualizado", body = crate::api::response::ApiResponse<Order>),
        (status = 400, description = "Transição de status inválida")
    )
)]
pub async fn update_order_status(
    State(st): State<Arc<AppState>>,
    Path(id): Path<Uuid>,
    Json(req): Json<AdminUpdateOrderStatusReq>,
) -> Result<Json<ApiResponse<Order>>, AppError> {
    let order =
        service::orders::admin_update_status(&st.pool, id, &req.status, req.payment_id).await?;
    crate::metrics::count_ok("PATCH /api/admin/orders/:id/status");
    success_response(order)
}

#[utoipa::path(
    post,
    path = "/api/admin/orders/{id}/refund",
    tag = "admin",
    params(("id" = Uuid, Path, description = "ID do pedido")),
    responses(
        (status = 200, description = "Reembolso solicitado ao gateway", body = crate::api::response::ApiResponse<MessageData>),
        (status = 400, description = "Pedido não pago"),
        (status = 404, description = "Pedido não encontrado")
    )
)]
pub async fn refund_order(
    State(st): State<Arc<AppState>>,
    Path(id): Path<Uuid>,
) -> Result<Json<ApiResponse<MessageData>>, AppError> {
    service::orders::admin_refund_order(&st.pool, &st.asaas, id).await?;
    crate::metrics::count_ok("POST /api/admin/orders/:id/refund");
    message_response("Reembolso solicitado")
}

// ============ 套餐管理 ============

#[derive(Debug, Deserialize, IntoParams)]
#[serde(rename_all = "camelCase")]
pub struct ListPlansQuery {
    pub page: Option<u32>,
    pub page_size: Option<u32>,
}

#[utoipa::path(
    get,
    path = "/api/admin/plans",
    tag = "admin",
    params(ListPlansQuery),
    responses((status = 200, description = "Planos (inclui inativos)", body = crate::api::response::ApiResponse<Vec<Plan>>))
)]
pub async fn list_plans(
    State(st): State<Arc<AppState>>,
    Query(q): Query<ListPlansQuery>,
) -> Result<Json<ApiResponse<Vec<Plan>>>, AppError> {
    let params = PaginationParams::new(q.page, q.page_size);
    let (items, total) =
        service::plans::admin_list(&st.pool, params.limit(), params.offset()).await?;
    crate::metrics::count_ok("GET /api/admin/plans");
    paginated_response(items, params.to_block(total as u64))
}

#[derive(Debug, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CreatePlanReq {
    pub name: String,
    pub price: Decimal,
    pub max_products: i32,
    #[serde(default)]
    pub description: Option<String>,
}

#[utoipa::path(
    post,
    path = "/api/admin/plans",
    tag = "admin",
    request_body = CreatePlanReq,
    responses(
        (status = 201, description = "Plano criado", body = crate::api::response::ApiResponse<Plan>),
        (status = 400, description = "Preço ou limite inválido")
    )
)]
pub async fn create_plan(
    State(st): State<Arc<AppState>>,
    Json(req): Json<CreatePlanReq>,
) -> Result<(StatusCode, Json<ApiResponse<Plan>>), AppError> {
    let plan = service::plans::admin_create(
        &st.pool,
        req.name,
        req.price,
        req.max_products,
        req.description,
    )
    .await?;
    crate::metrics::count_ok("POST /api/admin/plans");
    created_response(plan)
}

#[derive(Debug, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct UpdatePlanReq {
    pub name: Option<String>,
    pub price: Option<Decimal>,
    pub max_products: Option<i32>,
    pub description: Option<String>,
    pub is_active: Option<bool>,
}

#[utoipa::path(
    put,
    path = "/api/admin/plans/{id}",
    tag = "admin",
    params(("id" = Uuid, Path, description = "ID do plano")),
    request_body = UpdatePlanReq,
    responses(
        (status = 200, description = "Plano atualizado", body = crate::api::response::ApiResponse<Plan>),
        (status = 404, description = "Plano não encontrado")
    )
)]
pub async fn update_plan(
    State(st): State<Arc<AppState>>,
    Path(id): Path<Uuid>,
    Json(req): Json<UpdatePlanReq>,
) -> Result<Json<ApiResponse<Plan>>, AppError> {
    let plan = service::plans::admin_update(
        &st.pool,
        id,
        req.name,
        req.price,
        req.max_products,
        req.description,
        req.is_active,
    )
    .await?;
    crate::metrics::count_ok("PUT /api/admin/plans/:id");
    success_response(plan)
}

#[utoipa::path(
    delete,
    path = "/api/admin/plans/{id}",
    tag = "admin",
    params(("id" = Uuid, Path, description = "ID do plano")),
    responses(
        (status = 200, description = "Plano excluído", body = crate::api::response::ApiResponse<MessageData>),
        (status = 400, description = "Plano possui assinaturas associadas")
    )
)]
pub async fn delete_plan(
    State(st): State<Arc<AppState>>,
    Path(id): Path<Uuid>,
) -> Result<Json<ApiResponse<MessageData>>, AppError> {
    service::plans::admin_delete(&st.pool, id).await?;
    crate::metrics::count_ok("DELETE /api/admin/plans/:id");
    message_response("Plano excluído com sucesso")
}

// ============ 订阅管理 ============

#[derive(Debug, Deserialize, IntoParams)]
#[serde(rename_all = "camelCase")]
pub struct ListSubscriptionsQuery {
    pub page: Option<u32>,
    pub page_size: Option<u32>,
    /// ACTIVE | CANCELLED | EXPIRED
    pub status: Option<String>,
}

#[utoipa::path(
    get,
    path = "/api/admin/subscriptions",
    tag = "admin",
    params(ListSubscriptionsQuery),
    responses((status = 200, description = "Assinaturas", body = crate::api::response::ApiResponse<Vec<Subscription>>))
)]
pub async fn list_subscriptions(
    State(st): State<Arc<AppState>>,
    Query(q): Query<ListSubscriptionsQuery>,
) -> Result<Json<ApiResponse<Vec<Subscription>>>, AppError> {
    let params = PaginationParams::new(q.page, q.page_size);
    let (items, total) =
        service::subscriptions::admin_list(&st.pool, q.status, params.limit(), params.offset())
            .await?;
    crate::metrics::count_ok("GET /api/admin/subscriptions");
    paginated_response(items, params.to_block(total as u64))
}

#[utoipa::path(
    post,
    path = "/api/admin/subscriptions/{id}/cancel",
    tag = "admin",
    params(("id" = Uuid, Path, description = "ID da assinatura")),
    responses(
        (status = 200, description = "Assinatura cancelada", body = crate::api::response::ApiResponse<Subscription>),
        (status = 400, description = "Assinatura já encerrada")
    )
)]
pub async fn cancel_subscription(
    State(st): State<Arc<AppState>>,
    AuthUserExtractor(auth): AuthUserExtractor,
    Path(id): Path<Uuid>,
) -> Result<Json<ApiResponse<Subscription>>, AppError> {
    let subscription =
        service::subscriptions::cancel(&st.pool, &st.asaas, auth.id, auth.role, id).await?;
    crate::metrics::count_ok("POST /api/admin/subscriptions/:id/cancel");
    success_response(subscription)
}

// ============ 横幅管理 ============

#[derive(Debug, Deserialize, IntoParams)]
#[serde(rename_all = "camelCase")]
pub struct ListBannersQuery {
    pub page: Option<u32>,
    pub page_size: Option<u32>,
}

#[utoipa::path(
    get,
    path = "/api/admin/banners",
    tag = "admin",
    params(ListBannersQuery),
    responses((status = 200, description = "Banners (inclui inativos)", body = crate::api::response::ApiResponse<Vec<Banner>>))
)]
pub async fn list_banners(
    State(st): State<Arc<AppState>>,
    Query(q): Query<ListBannersQuery>,
) -> Result<Json<ApiResponse<Vec<Banner>>>, AppError> {
    let params = PaginationParams::new(q.page, q.page_size);
    let (items, total) =
        service::banners::admin_list(&st.pool, params.limit(), params.offset()).await?;
    crate::metrics::count_ok("GET /api/admin/banners");
    paginated_response(items, params.to_block(total as u64))
}

#[derive(Debug, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CreateBannerReq {
    pub title: String,
    pub image_url: String,
    #[serde(default)]
    pub link_url: Option<String>,
    #[serde(default)]
    pub position: Option<i32>,
}

#[utoipa::path(
    post,
    path = "/api/admin/banners",
    tag = "admin",
    request_body = CreateBannerReq,
    responses(
        (status = 201, description = "Banner criado", body = crate::api::response::ApiResponse<Banner>),
        (status = 400, description = "URL de imagem inválida"),
        (status = 429, description = "Limite de uploads excedido")
    )
)]
pub async fn create_banner(
    State(st): State<Arc<AppState>>,
    Json(req): Json<CreateBannerReq>,
) -> Result<(StatusCode, Json<ApiResponse<Banner>>), AppError> {
    let banner = service::banners::admin_create(
        &st.pool,
        req.title,
        req.image_url,
        req.link_url,
        req.position,
    )
    .await?;
    crate::metrics::count_ok("POST /api/admin/banners");
    created_response(banner)
}

#[derive(Debug, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct UpdateBannerReq {
    pub title: Option<String>,
    pub image_url: Option<String>,
    pub link_url: Option<String>,
    pub position: Option<i32>,
    pub is_active: Option<bool>,
}

#[utoipa::path(
    put,
    path = "/api/admin/banners/{id}",
    tag = "admin",
    params(("id" = Uuid, Path, description = "ID do banner")),
    request_body = UpdateBannerReq,
    responses(
        (status = 200, description = "Banner atualizado", body = crate::api::response::ApiResponse<Banner>),
        (status = 404, description = "Banner não encontrado")
    )
)]
pub async fn update_banner(
    State(st): State<Arc<AppState>>,
    Path(id): Path<Uuid>,
    Json(req): Json<UpdateBannerReq>,
) -> Result<Json<ApiResponse<Banner>>, AppError> {
    let banner = service::banners::admin_update(
        &st.pool,
        id,
        req.title,
        req.image_url,
        req.link_url,
        req.position,
        req.is_active,
    )
    .await?;
    crate::metrics::count_ok("PUT /api/admin/banners/:id");
    success_response(banner)
}

#[utoipa::path(
    delete,
    path = "/api/admin/banners/{id}",
    tag = "admin",
    params(("id" = Uuid, Path, description = "ID do banner")),
    responses(
        (status = 200, description = "Banner excluído", body = crate::api::response::ApiResponse<MessageData>),
        (status = 404, description = "Banner não encontrado")
    )
)]
pub async fn delete_banner(
    State(st): State<Arc<AppState>>,
    Path(id): Path<Uuid>,
) -> Result<Json<ApiResponse<MessageData>>, AppError> {
    service::banners::admin_delete(&st.pool, id).await?;
    crate::metrics::count_ok("DELETE /api/admin/banners/:id");
    message_response("Banner excluído com sucesso")
}

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
// Routes
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

/// 管理端路由树
///
/// 层次（外到内）：require_admin_middleware → Admin级限流 → 审计 → handler。
/// 查询端点不包审计，只有变更端点逐个声明 audit(action, resource)。
pub fn routes(state: Arc<AppState>) -> Router<Arc<AppState>> {
    let audit_state = state.clone();
    let wrap = move |action: &'static str, resource: &'static str| {
        middleware::from_fn_with_state(audit_state.clone(), audit(action, resource))
    };

    Router::new()
        // 用户
        .route(
            "/api/admin/users",
            get(list_users),
        )
        .route(
            "/api/admin/users/:id",
            get(get_user)
                .merge(put(update_user).route_layer(wrap("update", "user")))
                .merge(delete(delete_user).route_layer(wrap("delete", "user"))),
        )
        // 店铺
        .route(
            "/api/admin/stores",
            get(list_stores).merge(post(create_store).route_layer(wrap("create", "store"))),
        )
        .route(
            "/api/admin/stores/:id",
            put(update_store)
                .route_layer(wrap("update", "store"))
                .merge(delete(delete_store).route_layer(wrap("delete", "store"))),
        )
        // 商品
        .route(
            "/api/admin/products",
            get(list_products).merge(post(create_product).route_layer(wrap("create", "product"))),
        )
        .route(
            "/api/admin/products/:id",
            put(update_product)
                .route_layer(wrap("update", "product"))
                .merge(delete(delete_product).route_layer(wrap("delete", "product"))),
        )
        // 订单
        .route("/api/admin/orders", get(list_orders))
        .route(
            "/api/admin/orders/:id/status",
            patch(update_order_status).route_layer(wrap("update_status", "order")),
        )
        .route(
            "/api/admin/orders/:id/refund",
            post(refund_order).route_layer(wrap("refund", "order")),
        )
        // 套餐
        .route(
            "/api/admin/plans",
            get(list_plans).merge(post(create_plan).route_layer(wrap("create", "plan"))),
        )
        .route(
            "/api/admin/plans/:id",
            put(update_plan)
                .route_layer(wrap("update", "plan"))
                .merge(delete(delete_plan).route_layer(wrap("delete", "plan"))),
        )
        // 订阅
        .route("/api/admin/subscriptions", get(list_subscriptions))
        .route(
            "/api/admin/subscriptions/:id/cancel",
            post(cancel_subscription).route_layer(wrap("cancel", "subscription")),
        )
        // 横幅（创建是带图片的端点，叠加 Upload 级限流）
        .route(
            "/api/admin/banners",
            get(list_banners).merge(
                post(create_banner)
                    .route_layer(wrap("create", "banner"))
                    .route_layer(middleware::from_fn_with_state(
                        state.clone(),
                        rate_limit(RateLimitClass::Upload),
                    )),
            ),
        )
        .route(
            "/api/admin/banners/:id",
            put(update_banner)
                .route_layer(wrap("update", "banner"))
                .merge(delete(delete_banner).route_layer(wrap("delete", "banner"))),
        )
        // 审计与统计
        .route("/api/admin/audit-logs", get(audit_api::list_audit_logs))
        .route("/api/admin/stats", get(audit_api::admin_stats))
        // 整树防护：admin 限流 + 管理员守卫（守卫在最外层先执行）
        .layer(middleware::from_fn_with_state(
            state.clone(),
            rate_limit(RateLimitClass::Admin),
        ))
        .layer(middleware::from_fn_with_state(
            state,
            require_admin_middleware,
        ))
}
