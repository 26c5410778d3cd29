//! 套餐 API：公开的计划目录（管理端 CRUD 见 admin_api）

use std::sync::Arc;

use axum::{extract::State, Json};

use crate::{
    api::response::{success_response, ApiResponse},
    app_state::AppState,
    error::AppError,
    repository::plans::Plan,
    service,
};

#[utoipa::path(
    get,
    path = "/api/plans",
    tag = "plans",
    responses((status = 200, description = "Planos ativos", body = crate::api::response::ApiResponse<Vec<Plan>>))
)]
pub async fn list_plans(
    State(st): State<Arc<AppState>>,
) -> Result<Json<ApiResponse<Vec<Plan>>>, AppError> {
    let items = service::plans::list_public(&st.pool).await?;
    crate::metrics::count_ok("GET /api/plans");
    success_response(items)
}
