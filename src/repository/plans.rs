// 套餐数据访问

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::ToSchema;
use uuid::Uuid;

use crate::infrastructure::db::PgPool;

#[derive(Debug, Clone, Serialize, Deserialize, FromRow, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct Plan {
    pub id: Uuid,
    pub name: String,
    pub slug: String,
    pub price: Decimal,
    pub max_products: i32,
    pub description: Option<String>,
    pub is_active: bool,
    pub created_at: chrono::DateTime<chrono::Utc>,
    pub updated_at: chrono::DateTime<chrono::Utc>,
}

#[derive(Debug)]
pub struct CreatePlanInput {
    pub name: String,
    pub slug: String,
    pub price: Decimal,
    pub max_products: i32,
    pub description: Option<String>,
}

const PLAN_COLUMNS: &str =
    "id, name, slug, price, max_products, description, is_active, created_at, updated_at";

pub async fn create(pool: &PgPool, input: CreatePlanInput) -> Result<Plan, sqlx::Error> {
    let rec = sqlx::query_as::<_, Plan>(&format!(
        r#"
        INSERT INTO plans (name, slug, price, max_products, description)
        VALUES ($1, $2, $3, $4, $5)
        RETURNING {PLAN_COLUMNS}
        "#,
    ))
    .bind(input.name)
    .bind(input.slug)
    .bind(input.price)
    .bind(input.max_products)
    .bind(input.description)
    .fetch_one(pool)
    .await?;
    Ok(rec)
}

pub async fn get_by_id(pool: &PgPool, id: Uuid) -> Result<Option<Plan>, sqlx::Error> {
    let rec = sqlx::query_as::<_, Plan>(&format!(
        r#"
        SELECT {PLAN_COLUMNS}
        FROM plans
        WHERE id = $1
        "#,
    ))
    .bind(id)
    .fetch_optional(pool)
    .await?;
    Ok(rec)
}

pub async fn get_active_by_id(pool: &PgPool, id: Uuid) -> Result<Option<Plan>, sqlx::Error> {
    let rec = sqlx::query_as::<_, Plan>(&format!(
        r#"
        SELECT {PLAN_COLUMNS}
        FROM plans
        WHERE id = $1 AND is_active = TRUE
        "#,
    ))
    .bind(id)
    .fetch_optional(pool)
    .await?;
    Ok(rec)
}

/// 公开套餐列表：活跃套餐按价格升序
pub async fn list_active(pool: &PgPool) -> Result<Vec<Plan>, sqlx::Error> {
    let recs = sqlx::query_as::<_, Plan>(&format!(
        r#"
        SELECT {PLAN_COLUMNS}
        FROM plans
        WHERE is_active = TRUE
        ORDER BY price ASC
        "#,
    ))
    .fetch_all(pool)
    .await?;
    Ok(recs)
}

pub async fn list_all(pool: &PgPool, limit: i64, offset: i64) -> Result<Vec<Plan>, sqlx::Error> {
    let recs = sqlx::query_as::<_, Plan>(&format!(
        r#"
        SELECT {PLAN_COLUMNS}
        FROM plans
        ORDER BY price ASC
        LIMIT $1 OFFSET $2
        "#,
    ))
    .bind(limit)
    .bind(offset)
    .fetch_all(pool)
    .await?;
    Ok(recs)
}

pub async fn count_all(pool: &PgPool) -> Result<i64, sqlx::Error> {
    let count: (i64,) = sqlx::query_as("SELECT COUNT(*) FROM plans")
        .fetch_one(pool)
        .await?;
    Ok(count.0)
}

pub async fn update(
    pool: &PgPool,
    id: Uuid,
    name: Option<String>,
    price: Option<Decimal>,
    max_products: Option<i32>,
    description: Option<String>,
    is_active: Option<bool>,
) -> Result<Option<Plan>, sqlx::Error> {
    if name.is_none()
        && price.is_none()
        && max_products.is_none()
        && description.is_none()
        && is_active.is_none()
    {
        return get_by_id(pool, id).await;
    }

    let rec = sqlx::query_as::<_, Plan>(&format!(
        r#"
        UPDATE plans
        SET name = COALESCE($2, name),
            price = COALESCE($3, price),
            max_products = COALESCE($4, max_products),
            description = COALESCE($5, description),
            is_active = COALESCE($6, is_active),
            updated_at = CURRENT_TIMESTAMP
        WHERE id = $1
        RETURNING {PLAN_COLUMNS}
        "#,
    ))
    .bind(id)
    .bind(name)
    .bind(price)
    .bind(max_products)
    .bind(description)
    .bind(is_active)
    .fetch_optional(pool)
    .await?;
    Ok(rec)
}

pub async fn delete(pool: &PgPool, id: Uuid) -> Result<bool, sqlx::Error> {
    let rows_affected = sqlx::query("DELETE FROM plans WHERE id = $1")
        .bind(id)
        .execute(pool)
        .await?
        .rows_affected();
    Ok(rows_affected > 0)
}
