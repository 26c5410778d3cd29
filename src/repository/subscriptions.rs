// 订阅数据访问

use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::ToSchema;
use uuid::Uuid;

use crate::infrastructure::db::PgPool;

#[derive(Debug, Clone, Serialize, Deserialize, FromRow, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct Subscription {
    pub id: Uuid,
    pub user_id: Uuid,
    pub plan_id: Uuid,
    pub status: String,
    pub payment_id: Option<String>,
    pub started_at: chrono::DateTime<chrono::Utc>,
    pub expires_at: Option<chrono::DateTime<chrono::Utc>>,
    pub cancelled_at: Option<chrono::DateTime<chrono::Utc>>,
}

const SUBSCRIPTION_COLUMNS: &str =
    "id, user_id, plan_id, status, payment_id, started_at, expires_at, cancelled_at";

pub async fn create(
    pool: &PgPool,
    user_id: Uuid,
    plan_id: Uuid,
    expires_at: Option<chrono::DateTime<chrono::Utc>>,
) -> Result<Subscription, sqlx::Error> {
    let rec = sqlx::query_as::<_, Subscription>(&format!(
        r#"
        INSERT INTO subscriptions (user_id, plan_id, status, expires_at)
        VALUES ($1, $2, 'ACTIVE', $3)
        RETURNING {SUBSCRIPTION_COLUMNS}
        "#,
    ))
    .bind(user_id)
    .bind(plan_id)
    .bind(expires_at)
    .fetch_one(pool)
    .await?;
    Ok(rec)
}

pub async fn get_by_id(pool: &PgPool, id: Uuid) -> Result<Option<Subscription>, sqlx::Error> {
    let rec = sqlx::query_as::<_, Subscription>(&format!(
        r#"
        SELECT {SUBSCRIPTION_COLUMNS}
        FROM subscriptions
        WHERE id = $1
        "#,
    ))
    .bind(id)
    .fetch_optional(pool)
    .await?;
    Ok(rec)
}

/// 用户当前生效的订阅（未过期的ACTIVE）
pub async fn get_active_by_user(
    pool: &PgPool,
    user_id: Uuid,
) -> Result<Option<Subscription>, sqlx::Error> {
    let rec = sqlx::query_as::<_, Subscription>(&format!(
        r#"
        SELECT {SUBSCRIPTION_COLUMNS}
        FROM subscriptions
        WHERE user_id = $1
          AND status = 'ACTIVE'
          AND (expires_at IS NULL OR expires_at > CURRENT_TIMESTAMP)
        ORDER BY started_at DESC
        LIMIT 1
        "#,
    ))
    .bind(user_id)
    .fetch_optional(pool)
    .await?;
    Ok(rec)
}

pub async fn list_by_user(
    pool: &PgPool,
    user_id: Uuid,
) -> Result<Vec<Subscription>, sqlx::Error> {
    let recs = sqlx::query_as::<_, Subscription>(&format!(
        r#"
        SELECT {SUBSCRIPTION_COLUMNS}
        FROM subscriptions
        WHERE user_id = $1
        ORDER BY started_at DESC
        "#,
    ))
    .bind(user_id)
    .fetch_all(pool)
    .await?;
    Ok(recs)
}

pub async fn list_all(
    pool: &PgPool,
    status: Option<String>,
    limit: i64,
    offset: i64,
) -> Result<Vec<Subscription>, sqlx::Error> {
    let recs = sqlx::query_as::<_, Subscription>(&format!(
        r#"
        SELECT {SUBSCRIPTION_COLUMNS}
        FROM subscriptions
        WHERE ($1::text IS NULL OR status = $1)
        ORDER BY started_at DESC
        LIMIT $2 OFFSET $3
        "#,
    ))
    .bind(status)
    .bind(limit)
    .bind(offset)
    .fetch_all(pool)
    .await?;
    Ok(recs)
}

pub async fn count_all(pool: &PgPool, status: Option<String>) -> Result<i64, sqlx::Error> {
    let count: (i64,) = sqlx::query_as(
        "SELECT COUNT(*) FROM subscriptions WHERE ($1::text IS NULL OR status = $1)",
    )
    .bind(status)
    .fetch_one(pool)
    .await?;
    Ok(count.0)
}

pub async fn cancel(pool: &PgPool, id: Uuid) -> Result<Option<Subscription>, sqlx::Error> {
    let rec = sqlx::query_as::<_, Subscription>(&format!(
        r#"
        UPDATE subscriptions
        SET status = 'CANCELLED', cancelled_at = CURRENT_TIMESTAMP
        WHERE id = $1
        RETURNING {SUBSCRIPTION_COLUMNS}
        "#,
    ))
    .bind(id)
    .fetch_optional(pool)
    .await?;
    Ok(rec)
}
