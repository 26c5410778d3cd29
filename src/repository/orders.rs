// 订单数据访问
// 下单走事务：创建订单 + 明细 + 条件扣减库存，任一失败整体回滚

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::ToSchema;
use uuid::Uuid;

use crate::infrastructure::db::PgPool;

#[derive(Debug, Clone, Serialize, Deserialize, FromRow, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct Order {
    pub id: Uuid,
    pub buyer_id: Uuid,
    pub store_id: Uuid,
    pub status: String,
    pub total: Decimal,
    pub payment_id: Option<String>,
    pub created_at: chrono::DateTime<chrono::Utc>,
    pub updated_at: chrono::DateTime<chrono::Utc>,
}

/// 订单明细（含商品名，列表展示用）
#[derive(Debug, Clone, Serialize, Deserialize, FromRow, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct OrderItem {
    pub id: Uuid,
    pub order_id: Uuid,
    pub product_id: Uuid,
    pub product_name: String,
    pub quantity: i32,
    pub unit_price: Decimal,
}

#[derive(Debug)]
pub struct NewOrderItem {
    pub product_id: Uuid,
    pub quantity: i32,
    pub unit_price: Decimal,
}

#[derive(Debug)]
pub struct CreateOrderInput {
    pub buyer_id: Uuid,
    pub store_id: Uuid,
    pub total: Decimal,
    pub items: Vec<NewOrderItem>,
}

const ORDER_COLUMNS: &str =
    "id, buyer_id, store_id, status, total, payment_id, created_at, updated_at";

/// 创建订单。库存不足（并发下单竞争失败）返回 Ok(None)，事务回滚
pub async fn create(pool: &PgPool, input: CreateOrderInput) -> Result<Option<Order>, sqlx::Error> {
    let mut tx = pool.begin().await?;

    let order = sqlx::query_as::<_, Order>(&format!(
        r#"
        INSERT INTO orders (buyer_id, store_id, status, total)
        VALUES ($1, $2, 'PENDING', $3)
        RETURNING {ORDER_COLUMNS}
        "#,
    ))
    .bind(input.buyer_id)
    .bind(input.store_id)
    .bind(input.total)
    .fetch_one(&mut *tx)
    .await?;

    for item in &input.items {
        // 条件扣减：stock >= quantity 才生效
        let affected = sqlx::query(
            r#"
            UPDATE products
            SET stock = stock - $2, updated_at = CURRENT_TIMESTAMP
            WHERE id = $1 AND stock >= $2 AND is_active = TRUE
            "#,
        )
        .bind(item.product_id)
        .bind(item.quantity)
        .execute(&mut *tx)
        .await?
        .rows_affected();

        if affected == 0 {
            tx.rollback().await?;
            return Ok(None);
        }

        sqlx::query(
            r#"
            INSERT INTO order_items (order_id, product_id, quantity, unit_price)
            VALUES ($1, $2, $3, $4)
            "#,
        )
        .bind(order.id)
        .bind(item.product_id)
        .bind(item.quantity)
        .bind(item.unit_price)
        .execute(&mut *tx)
        .await?;
    }

    tx.commit().await?;
    Ok(Some(order))
}

pub async fn get_by_id(pool: &PgPool, id: Uuid) -> Result<Option<Order>, sqlx::Error> {
    let rec = sqlx::query_as::<_, Order>(&format!(
        r#"
        SELECT {ORDER_COLUMNS}
        FROM orders
        WHERE id = $1
        "#,
    ))
    .bind(id)
    .fetch_optional(pool)
    .await?;
    Ok(rec)
}

pub async fn get_items(pool: &PgPool, order_id: Uuid) -> Result<Vec<OrderItem>, sqlx::Error> {
    let recs = sqlx::query_as::<_, OrderItem>(
        r#"
        SELECT oi.id, oi.order_id, oi.product_id, p.name AS product_name,
               oi.quantity, oi.unit_price
        FROM order_items oi
        JOIN products p ON p.id = oi.product_id
        WHERE oi.order_id = $1
        ORDER BY p.name
        "#,
    )
    .bind(order_id)
    .fetch_all(pool)
    .await?;
    Ok(recs)
}

pub async fn list_by_buyer(
    pool: &PgPool,
    buyer_id: Uuid,
    limit: i64,
    offset: i64,
) -> Result<Vec<Order>, sqlx::Error> {
    let recs = sqlx::query_as::<_, Order>(&format!(
        r#"
        SELECT {ORDER_COLUMNS}
        FROM orders
        WHERE buyer_id = $1
        ORDER BY created_at DESC
        LIMIT $2 OFFSET $3
        "#,
    ))
    .bind(buyer_id)
    .bind(limit)
    .bind(offset)
    .fetch_all(pool)
    .await?;
    Ok(recs)
}

pub async fn count_by_buyer(pool: &PgPool, buyer_id: Uuid) -> Result<i64, sqlx::Error> {
    let count: (i64,) = sqlx::query_as("SELECT COUNT(*) FROM orders WHERE buyer_id = $1")
        .bind(buyer_id)
        .fetch_one(pool)
        .await?;
    Ok(count.0)
}

pub async fn list_by_store(
    pool: &PgPool,
    store_id: Uuid,
    limit: i64,
    offset: i64,
) -> Result<Vec<Order>, sqlx::Error> {
    let recs = sqlx::query_as::<_, Order>(&format!(
        r#"
        SELECT {ORDER_COLUMNS}
        FROM orders
        WHERE store_id = $1
        ORDER BY created_at DESC
        LIMIT $2 OFFSET $3
        "#,
    ))
    .bind(store_id)
    .bind(limit)
    .bind(offset)
    .fetch_all(pool)
    .await?;
    Ok(recs)
}

pub async fn count_by_store(pool: &PgPool, store_id: Uuid) -> Result<i64, sqlx::Error> {
    let count: (i64,) = sqlx::query_as("SELECT COUNT(*) FROM orders WHERE store_id = $1")
        .bind(store_id)
        .fetch_one(pool)
        .await?;
    Ok(count.0)
}

pub async fn list_all(
    pool: &PgPool,
    status: Option<String>,
    limit: i64,
    offset: i64,
) -> Result<Vec<Order>, sqlx::Error> {
    let recs = sqlx::query_as::<_, Order>(&format!(
        r#"
        SELECT {ORDER_COLUMNS}
        FROM orders
        WHERE ($1::text IS NULL OR status = $1)
        ORDER BY created_at DESC
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
    let count: (i64,) =
        sqlx::query_as("SELECT COUNT(*) FROM orders WHERE ($1::text IS NULL OR status = $1)")
            .bind(status)
            .fetch_one(pool)
            .await?;
    Ok(count.0)
}

pub async fn update_status(
    pool: &PgPool,
    id: Uuid,
    status: &str,
) -> Result<Option<Order>, sqlx::Error> {
    let rec = sqlx::query_as::<_, Order>(&format!(
        r#"
        UPDATE orders
        SET status = $2, updated_at = CURRENT_TIMESTAMP
        WHERE id = $1
        RETURNING {ORDER_COLUMNS}
        "#,
    ))
    .bind(id)
    .bind(status)
    .fetch_optional(pool)
    .await?;
    Ok(rec)
}

pub async fn set_payment(
    pool: &PgPool,
    id: Uuid,
    payment_id: &str,
) -> Result<Option<Order>, sqlx::Error> {
    let rec = sqlx::query_as::<_, Order>(&format!(
        r#"
        UPDATE orders
        SET payment_id = $2, updated_at = CURRENT_TIMESTAMP
        WHERE id = $1
        RETURNING {ORDER_COLUMNS}
        "#,
    ))
    .bind(id)
    .bind(payment_id)
    .fetch_optional(pool)
    .await?;
    Ok(rec)
}

/// 取消订单：置为CANCELLED并回补明细库存，单个事务内完成
pub async fn cancel(pool: &PgPool, id: Uuid) -> Result<Option<Order>, sqlx::Error> {
    let mut tx = pool.begin().await?;

    let order = sqlx::query_as::<_, Order>(&format!(
        r#"
        UPDATE orders
        SET status = 'CANCELLED', updated_at = CURRENT_TIMESTAMP
        WHERE id = $1
        RETURNING {ORDER_COLUMNS}
        "#,
    ))
    .bind(id)
    .fetch_optional(&mut *tx)
    .await?;

    let Some(order) = order else {
        tx.rollback().await?;
        return Ok(None);
    };

    sqlx::query(
        r#"
        UPDATE products p
        SET stock = p.stock + oi.quantity, updated_at = CURRENT_TIMESTAMP
        FROM order_items oi
        WHERE oi.order_id = $1 AND p.id = oi.product_id
        "#,
    )
    .bind(id)
    .execute(&mut *tx)
    .await?;

    tx.commit().await?;
    Ok(Some(order))
}

/// 买家通知源：按更新时间倒序的最近订单
pub async fn list_recent_by_buyer(
    pool: &PgPool,
    buyer_id: Uuid,
    limit: i64,
) -> Result<Vec<Order>, sqlx::Error> {
    let recs = sqlx::query_as::<_, Order>(&format!(
        r#"
        SELECT {ORDER_COLUMNS}
        FROM orders
        WHERE buyer_id = $1
        ORDER BY updated_at DESC
        LIMIT $2
        "#,
    ))
    .bind(buyer_id)
    .bind(limit)
    .fetch_all(pool)
    .await?;
    Ok(recs)
}

pub async fn total_revenue(pool: &PgPool) -> Result<Decimal, sqlx::Error> {
    let sum: (Option<Decimal>,) =
        sqlx::query_as("SELECT SUM(total) FROM orders WHERE status <> 'CANCELLED'")
            .fetch_one(pool)
            .await?;
    Ok(sum.0.unwrap_or_default())
}
