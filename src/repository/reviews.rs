// 商品评价数据访问

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::ToSchema;
use uuid::Uuid;

use crate::infrastructure::db::PgPool;

/// 评价（含作者名，详情页展示用）
#[derive(Debug, Clone, Serialize, Deserialize, FromRow, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct Review {
    pub id: Uuid,
    pub product_id: Uuid,
    pub user_id: Uuid,
    pub user_name: String,
    pub rating: i32,
    pub comment: Option<String>,
    pub created_at: chrono::DateTime<chrono::Utc>,
}

pub async fn create(
    pool: &PgPool,
    product_id: Uuid,
    user_id: Uuid,
    rating: i32,
    comment: Option<String>,
) -> Result<Review, sqlx::Error> {
    let rec = sqlx::query_as::<_, Review>(
        r#"
        WITH inserted AS (
            INSERT INTO reviews (product_id, user_id, rating, comment)
            VALUES ($1, $2, $3, $4)
            RETURNING id, product_id, user_id, rating, comment, created_at
        )
        SELECT i.id, i.product_id, i.user_id, u.name AS user_name,
               i.rating, i.comment, i.created_at
        FROM inserted i
        JOIN users u ON u.id = i.user_id
        "#,
    )
    .bind(product_id)
    .bind(user_id)
    .bind(rating)
    .bind(comment)
    .fetch_one(pool)
    .await?;
    Ok(rec)
}

/// 商品详情页的最近评价
pub async fn list_recent_by_product(
    pool: &PgPool,
    product_id: Uuid,
    limit: i64,
) -> Result<Vec<Review>, sqlx::Error> {
    let recs = sqlx::query_as::<_, Review>(
        r#"
        SELECT r.id, r.product_id, r.user_id, u.name AS user_name,
               r.rating, r.comment, r.created_at
        FROM reviews r
        JOIN users u ON u.id = r.user_id
        WHERE r.product_id = $1
        ORDER BY r.created_at DESC
        LIMIT $2
        "#,
    )
    .bind(product_id)
    .bind(limit)
    .fetch_all(pool)
    .await?;
    Ok(recs)
}

pub async fn has_user_reviewed(
    pool: &PgPool,
    product_id: Uuid,
    user_id: Uuid,
) -> Result<bool, sqlx::Error> {
    let rec: (bool,) = sqlx::query_as(
        "SELECT EXISTS(SELECT 1 FROM reviews WHERE product_id = $1 AND user_id = $2)",
    )
    .bind(product_id)
    .bind(user_id)
    .fetch_one(pool)
    .await?;
    Ok(rec.0)
}

pub async fn average_rating(
    pool: &PgPool,
    product_id: Uuid,
) -> Result<Option<Decimal>, sqlx::Error> {
    let avg: (Option<Decimal>,) =
        sqlx::query_as("SELECT AVG(rating)::numeric(3,2) FROM reviews WHERE product_id = $1")
            .bind(product_id)
            .fetch_one(pool)
            .await?;
    Ok(avg.0)
}
