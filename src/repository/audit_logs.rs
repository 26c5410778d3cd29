// 审计日志数据访问：只追加，从不更新或删除

use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::ToSchema;
use uuid::Uuid;

use crate::infrastructure::db::PgPool;

#[derive(Debug, Clone, Serialize, Deserialize, FromRow, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct AuditLog {
    pub id: Uuid,
    pub admin_id: Uuid,
    pub admin_name: String,
    pub action: String,
    pub resource: String,
    pub resource_id: Option<String>,
    pub details: serde_json::Value,
    pub ip_address: Option<String>,
    pub user_agent: Option<String>,
    pub success: bool,
    pub error_message: Option<String>,
    pub created_at: chrono::DateTime<chrono::Utc>,
}

#[derive(Debug, Clone)]
pub struct NewAuditLog {
    pub admin_id: Uuid,
    pub admin_name: String,
    pub action: String,
    pub resource: String,
    pub resource_id: Option<String>,
    pub details: serde_json::Value,
    pub ip_address: Option<String>,
    pub user_agent: Option<String>,
    pub success: bool,
    pub error_message: Option<String>,
}

pub async fn insert(pool: &PgPool, entry: NewAuditLog) -> Result<(), sqlx::Error> {
    sqlx::query(
        r#"
        INSERT INTO audit_logs
            (admin_id, admin_name, action, resource, resource_id, details,
             ip_address, user_agent, success, error_message)
        VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10)
        "#,
    )
    .bind(entry.admin_id)
    .bind(entry.admin_name)
    .bind(entry.action)
    .bind(entry.resource)
    .bind(entry.resource_id)
    .bind(entry.details)
    .bind(entry.ip_address)
    .bind(entry.user_agent)
    .bind(entry.success)
    .bind(entry.error_message)
    .execute(pool)
    .await?;
    Ok(())
}

pub async fn list(
    pool: &PgPool,
    admin_id: Option<Uuid>,
    resource: Option<String>,
    success: Option<bool>,
    limit: i64,
    offset: i64,
) -> Result<Vec<AuditLog>, sqlx::Error> {
    let recs = sqlx::query_as::<_, AuditLog>(
        r#"
        SELECT id, admin_id, admin_name, action, resource, resource_id, details,
               ip_address, user_agent, success, error_message, created_at
        FROM audit_logs
        WHERE ($1::uuid IS NULL OR admin_id = $1)
          AND ($2::text IS NULL OR resource = $2)
          AND ($3::bool IS NULL OR success = $3)
        ORDER BY created_at DESC
        LIMIT $4 OFFSET $5
        "#,
    )
    .bind(admin_id)
    .bind(resource)
    .bind(success)
    .bind(limit)
    .bind(offset)
    .fetch_all(pool)
    .await?;
    Ok(recs)
}

pub async fn count(
    pool: &PgPool,
    admin_id: Option<Uuid>,
    resource: Option<String>,
    success: Option<bool>,
) -> Result<i64, sqlx::Error> {
    let count: (i64,) = sqlx::query_as(
        r#"
        SELECT COUNT(*) FROM audit_logs
        WHERE ($1::uuid IS NULL OR admin_id = $1)
          AND ($2::text IS NULL OR resource = $2)
          AND ($3::bool IS NULL OR success = $3)
        "#,
    )
    .bind(admin_id)
    .bind(resource)
    .bind(success)
    .fetch_one(pool)
    .await?;
    Ok(count.0)
}
