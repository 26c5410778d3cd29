//! 基础端点：健康检查与探活

use std::sync::Arc;

use axum::{extract::State, Json};
use serde::Serialize;
use utoipa::ToSchema;

use crate::{
    api::response::{success_response, ApiResponse},
    app_state::AppState,
    error::AppError,
};

#[derive(Debug, Serialize, ToSchema)]
pub struct HealthResponse {
    pub status: String,
}

#[utoipa::path(
    get,
    path = "/api/health",
    tag = "health",
    responses((status = 200, description = "OK", body = crate::api::response::ApiResponse<HealthResponse>))
)]
pub async fn api_health() -> Result<Json<ApiResponse<HealthResponse>>, AppError> {
    crate::metrics::count_ok("GET /api/health");
    success_response(HealthResponse {
        status: "ok".into(),
    })
}

#[derive(Debug, Serialize, ToSchema)]
pub struct Healthz {
    pub status: String,
    pub db_ok: bool,
    pub version: String,
}

/// 深探活：带数据库连通性，供编排探针使用
#[utoipa::path(
    get,
    path = "/healthz",
    tag = "health",
    responses((status = 200, description = "OK", body = crate::api::response::ApiResponse<Healthz>))
)]
pub async fn healthz(
    State(st): State<Arc<AppState>>,
) -> Result<Json<ApiResponse<Healthz>>, AppError> {
    let db_ok = crate::infrastructure::db::health_check(&st.pool)
        .await
        .is_ok();
    let status = if db_ok { "ok".into() } else { "degraded".into() };
    let version = format!(
        "{}+{}",
        env!("CARGO_PKG_VERSION"),
        option_env!("GIT_HASH").unwrap_or("dev")
    );
    success_response(Healthz {
        status,
        db_ok,
        version,
    })
}
