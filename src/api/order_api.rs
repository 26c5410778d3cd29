//! 订单 API：买家下单/取消，买卖双方查询，卖家推进状态

use std::sync::Arc;

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    routing::{get, patch, post},
    Json, Router,
};
use serde::Deserialize;
use utoipa::ToSchema;
use uuid::Uuid;

use crate::{
    api::{
        middleware::{require_role, AuthUserExtractor},
        response::{
            created_response, paginated_response, pagination::PaginationQuery, success_response,
            ApiResponse, PaginationParams,
        },
    },
    app_state::AppState,
    domain::Role,
    error::AppError,
    repository::orders::Order,
    service::{self, orders::OrderWithItems},
};

#[derive(Debug, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct OrderItemReq {
    pub product_id: Uuid,
    pub quantity: i32,
}

#[derive(Debug, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CreateOrderReq {
    pub address_id: Uuid,
    pub items: Vec<OrderItemReq>,
}

#[utoipa::path(
    post,
    path = "/api/orders",
    tag = "orders",
    request_body = CreateOrderReq,
    responses(
        (status = 201, description = "Pedido criado", body = crate::api::response::ApiResponse<OrderWithItems>),
        (status = 400, description = "Estoque insuficiente ou itens de lojas distintas"),
        (status = 403, description = "Apenas compradores")
    )
)]
pub async fn create_order(
    State(st): State<Arc<AppState>>,
    AuthUserExtractor(auth): AuthUserExtractor,
    Json(req): Json<CreateOrderReq>,
) -> Result<(StatusCode, Json<ApiResponse<OrderWithItems>>), AppError> {
    require_role(&auth, Role::Buyer)?;
    let items = req
        .items
        .into_iter()
        .map(|i| service::orders::OrderItemRequest {
            product_id: i.product_id,
            quantity: i.quantity,
        })
        .collect();
    let order = service::orders::create_order(&st.pool, auth.id, req.address_id, items).await?;
    crate::metrics::count_ok("POST /api/orders");
    created_response(order)
}

#[utoipa::path(
    get,
    path = "/api/orders",
    tag = "orders",
    params(PaginationQuery),
    responses((status = 200, description = "Pedidos do usuário (vendedor vê os da própria loja)", body = crate::api::response::ApiResponse<Vec<Order>>))
)]
pub async fn list_orders(
    State(st): State<Arc<AppState>>,
    AuthUserExtractor(auth): AuthUserExtractor,
    Query(q): Query<PaginationQuery>,
) -> Result<Json<ApiResponse<Vec<Order>>>, AppError> {
    let params = PaginationParams::from(q);
    let (items, total) =
        service::orders::list_orders(&st.pool, auth.id, auth.role, params.limit(), params.offset())
            .await?;
    crate::metrics::count_ok("GET /api/orders");
    paginated_response(items, params.to_block(total as u64))
}

#[utoipa::path(
    get,
    path = "/api/orders/{id}",
    tag = "orders",
    params(("id" = Uuid, Path, description = "ID do pedido")),
    responses(
        (status = 200, description = "Pedido com itens", body = crate::api::response::ApiResponse<OrderWithItems>),
        (status = 403, description = "Pedido de outro usuário"),
        (status = 404, description = "Pedido não encontrado")
    )
)]
pub async fn get_order(
    State(st): State<Arc<AppState>>,
    AuthUserExtractor(auth): AuthUserExtractor,
    Path(id): Path<Uuid>,
) -> Result<Json<ApiResponse<OrderWithItems>>, AppError> {
    let order = service::orders::get_order(&st.pool, auth.id, auth.role, id).await?;
    crate::metrics::count_ok("GET /api/orders/:id");
    success_response(order)
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct UpdateOrderStatusReq {
    /// PAID → SHIPPED → DELIVERED
    pub status: String,
}

#[utoipa::path(
    patch,
    path = "/api/orders/{id}/status",
    tag = "orders",
    params(("id" = Uuid, Path, description = "ID do pedido")),
    request_body = UpdateOrderStatusReq,
    responses(
        (status = 200, description = "Status atualizado", body = crate::api::response::ApiResponse<Order>),
        (status = 400, description = "Transição de status inválida"),
        (status = 403, description = "Pedido de outra loja")
    )
)]
pub async fn update_order_status(
    State(st): State<Arc<AppState>>,
    AuthUserExtractor(auth): AuthUserExtractor,
    Path(id): Path<Uuid>,
    Json(req): Json<UpdateOrderStatusReq>,
) -> Result<Json<ApiResponse<Order>>, AppError> {
    let order =
        service::orders::update_status(&st.pool, auth.id, auth.role, id, &req.status).await?;
    crate::metrics::count_ok("PATCH /api/orders/:id/status");
    success_response(order)
}

#[utoipa::path(
    post,
    path = "/api/orders/{id}/cancel",
    tag = "orders",
    params(("id" = Uuid, Path, description = "ID do pedido")),
    responses(
        (status = 200, description = "Pedido cancelado (reembolso automático quando pago)", body = crate::api::response::ApiResponse<Order>),
        (status = 400, description = "Pedido já enviado, não pode ser cancelado"),
        (status = 404, description = "Pedido não encontrado")
    )
)]
pub async fn cancel_order(
    State(st): State<Arc<AppState>>,
    AuthUserExtractor(auth): AuthUserExtractor,
    Path(id): Path<Uuid>,
) -> Result<Json<ApiResponse<Order>>, AppError> {
    let order = service::orders::cancel_order(&st.pool, &st.asaas, auth.id, id).await?;
    crate::metrics::count_ok("POST /api/orders/:id/cancel");
    success_response(order)
}

/// 订单路由（受保护路由树）
pub fn routes() -> Router<Arc<AppState>> {
    Router::new()
        .route("/api/orders", post(create_order).get(list_orders))
        .route("/api/orders/:id", get(get_order))
        .route("/api/orders/:id/status", patch(update_order_status))
        .route("/api/orders/:id/cancel", post(cancel_order))
}
