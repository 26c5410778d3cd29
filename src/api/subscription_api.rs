//! 订阅 API：卖家套餐签约、查询与取消

use std::sync::Arc;

use axum::{
    extract::{Path, State},
    http::StatusCode,
    routing::{get, post},
    Json, Router,
};
use serde::Deserialize;
use utoipa::ToSchema;
use uuid::Uuid;

use crate::{
    api::{
        middleware::AuthUserExtractor,
        response::{created_response, success_response, ApiResponse},
    },
    app_state::AppState,
    error::AppError,
    repository::subscriptions::Subscription,
    service,
};

#[derive(Debug, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct SubscribeReq {
    pub plan_id: Uuid,
}

#[utoipa::path(
    post,
    path = "/api/subscriptions",
    tag = "subscriptions",
    request_body = SubscribeReq,
    responses(
        (status = 201, description = "Assinatura criada (30 dias)", body = crate::api::response::ApiResponse<Subscription>),
        (status = 404, description = "Plano não encontrado"),
        (status = 409, description = "Assinatura ativa já existente")
    )
)]
pub async fn subscribe(
    State(st): State<Arc<AppState>>,
    AuthUserExtractor(auth): AuthUserExtractor,
    Json(req): Json<SubscribeReq>,
) -> Result<(StatusCode, Json<ApiResponse<Subscription>>), AppError> {
    let subscription = service::subscriptions::subscribe(&st.pool, auth.id, req.plan_id).await?;
    crate::metrics::count_ok("POST /api/subscriptions");
    created_response(subscription)
}

#[utoipa::path(
    get,
    path = "/api/subscriptions/mine",
    tag = "subscriptions",
    responses((status = 200, description = "Assinaturas do usuário", body = crate::api::response::ApiResponse<Vec<Subscription>>))
)]
pub async fn list_my_subscriptions(
    State(st): State<Arc<AppState>>,
    AuthUserExtractor(auth): AuthUserExtractor,
) -> Result<Json<ApiResponse<Vec<Subscription>>>, AppError> {
    let items = service::subscriptions::list_mine(&st.pool, auth.id).await?;
    crate::metrics::count_ok("GET /api/subscriptions/mine");
    success_response(items)
}

#[utoipa::path(
    post,
    path = "/api/subscriptions/{id}/cancel",
    tag = "subscriptions",
    params(("id" = Uuid, Path, description = "ID da assinatura")),
    responses(
        (status = 200, description = "Assinatura cancelada; reembolso solicitado ao gateway", body = crate::api::response::ApiResponse<Subscription>),
        (status = 400, description = "Assinatura já encerrada"),
        (status = 403, description = "Assinatura de outro usuário")
    )
)]
pub async fn cancel_subscription(
    State(st): State<Arc<AppState>>,
    AuthUserExtractor(auth): AuthUserExtractor,
    Path(id): Path<Uuid>,
) -> Result<Json<ApiResponse<Subscription>>, AppError> {
    let subscription =
        service::subscriptions::cancel(&st.pool, &st.asaas, auth.id, auth.role, id).await?;
    crate::metrics::count_ok("POST /api/subscriptions/:id/cancel");
    success_response(subscription)
}

/// 订阅路由（受保护路由树）
pub fn routes() -> Router<Arc<AppState>> {
    Router::new()
        .route("/api/subscriptions", post(subscribe))
        .route("/api/subscriptions/mine", get(list_my_subscriptions))
        .route("/api/subscriptions/:id/cancel", post(cancel_subscription))
}
