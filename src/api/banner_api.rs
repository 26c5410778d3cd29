//! 横幅 API：公开的活动横幅（管理端 CRUD 见 admin_api）

use std::sync::Arc;

use axum::{extract::State, Json};

use crate::{
    api::response::{success_response, ApiResponse},
    app_state::AppState,
    error::AppError,
    repository::banners::Banner,
    service,
};

#[utoipa::path(
    get,
    path = "/api/banners",
    tag = "banners",
    responses((status = 200, description = "Banners ativos ordenados por posição", body = crate::api::response::ApiResponse<Vec<Banner>>))
)]
pub async fn list_banners(
    State(st): State<Arc<AppState>>,
) -> Result<Json<ApiResponse<Vec<Banner>>>, AppError> {
    let items = service::banners::list_public(&st.pool).await?;
    crate::metrics::count_ok("GET /api/banners");
    success_response(items)
}
