// 心愿单数据访问

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::ToSchema;
use uuid::Uuid;

use crate::infrastructure::db::PgPool;

/// 心愿单条目（含商品摘要，列表展示用）
#[derive(Debug, Clone, Serialize, Deserialize, FromRow, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct WishlistItem {
    pub id: Uuid,
    pub product_id: Uuid,
    pub product_name: String,
    pub product_slug: String,
    pub price: Decimal,
    pub is_active: bool,
    pub added_at: chrono::DateTime<chrono::Utc>,
}

/// 加入心愿单。重复加入是幂等的，返回是否新增
pub async fn add(pool: &PgPool, user_id: Uuid, product_id: Uuid) -> Result<bool, sqlx::Error> {
    let rows_affected = sqlx::query(
        r#"
        INSERT INTO wishlist_items (user_id, product_id)
        VALUES ($1, $2)
        ON CONFLICT (user_id, product_id) DO NOTHING
        "#,
    )
    .bind(user_id)
    .bind(product_id)
    .execute(pool)
    .await?
    .rows_affected();
    Ok(rows_affected > 0)
}

pub async fn remove(pool: &PgPool, user_id: Uuid, product_id: Uuid) -> Result<bool, sqlx::Error> {
    let rows_affected =
        sqlx::query("DELETE FROM wishlist_items WHERE user_id = $1 AND product_id = $2")
            .bind(user_id)
            .bind(product_id)
            .execute(pool)
            .await?
            .rows_affected();
    Ok(rows_affected > 0)
}

pub async fn list_by_user(pool: &PgPool, user_id: Uuid) -> Result<Vec<WishlistItem>, sqlx::Error> {
    let recs = sqlx::query_as::<_, WishlistItem>(
        r#"
        SELECT w.id, w.product_id, p.name AS product_name, p.slug AS product_slug,
               p.price, p.is_active, w.created_at AS added_at
        FROM wishlist_items w
        JOIN products p ON p.id = w.product_id
        WHERE w.user_id = $1
        ORDER BY w.created_at DESC
        "#,
    )
    .bind(user_id)
    .fetch_all(pool)
    .await?;
    Ok(recs)
}
