//! 审计日志 API：管理端查询与平台统计

use std::sync::Arc;

use axum::{
    extract::{Query, State},
    Json,
};
use serde::Deserialize;
use utoipa::IntoParams;
use uuid::Uuid;

use crate::{
    api::response::{paginated_response, success_response, ApiResponse, PaginationParams},
    app_state::AppState,
    error::AppError,
    repository::audit_logs::AuditLog,
    service::{self, audit::AdminStats},
};

/// 审计日志过滤参数
#[derive(Debug, Deserialize, IntoParams)]
#[serde(rename_all = "camelCase")]
pub struct AuditLogsQuery {
    pub page: Option<u32>,
    pub page_size: Option<u32>,
    /// 按操作者过滤
    pub admin_id: Option<Uuid>,
    /// 按资源类型过滤（user, store, product, ...）
    pub resource: Option<String>,
    /// 只看成功/失败的操作
    pub success: Option<bool>,
}

#[utoipa::path(
    get,
    path = "/api/admin/audit-logs",
    tag = "admin",
    params(AuditLogsQuery),
    responses(
        (status = 200, description = "Trilha de auditoria", body = crate::api::response::ApiResponse<Vec<AuditLog>>),
        (status = 403, description = "Apenas administradores")
    )
)]
pub async fn list_audit_logs(
    State(st): State<Arc<AppState>>,
    Query(q): Query<AuditLogsQuery>,
) -> Result<Json<ApiResponse<Vec<AuditLog>>>, AppError> {
    let params = PaginationParams::new(q.page, q.page_size);
    let (items, total) = service::audit::list_logs(
        &st.pool,
        q.admin_id,
        q.resource,
        q.success,
        params.limit(),
        params.offset(),
    )
    .await?;
    crate::metrics::count_ok("GET /api/admin/audit-logs");
    paginated_response(items, params.to_block(total as u64))
}

#[utoipa::path(
    get,
    path = "/api/admin/stats",
    tag = "admin",
    responses(
        (status = 200, description = "Contadores da plataforma", body = crate::api::response::ApiResponse<AdminStats>),
        (status = 403, description = "Apenas administradores")
    )
)]
pub async fn admin_stats(
    State(st): State<Arc<AppState>>,
) -> Result<Json<ApiResponse<AdminStats>>, AppError> {
    let stats = service::audit::admin_stats(&st.pool).await?;
    crate::metrics::count_ok("GET /api/admin/stats");
    success_response(stats)
}
