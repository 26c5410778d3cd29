// 商品数据访问

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::ToSchema;
use uuid::Uuid;

use crate::infrastructure::db::PgPool;

#[derive(Debug, Clone, Serialize, Deserialize, FromRow, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct Product {
    pub id: Uuid,
    pub store_id: Uuid,
    pub name: String,
    pub slug: String,
    pub description: Option<String>,
    pub price: Decimal,
    pub stock: i32,
    pub is_active: bool,
    pub created_at: chrono::DateTime<chrono::Utc>,
    pub updated_at: chrono::DateTime<chrono::Utc>,
}

#[derive(Debug)]
pub struct CreateProductInput {
    pub store_id: Uuid,
    pub name: String,
    pub slug: String,
    pub description: Option<String>,
    pub price: Decimal,
    pub stock: i32,
}

/// 公开列表过滤条件
#[derive(Debug, Default)]
pub struct ProductFilter {
    pub search: Option<String>,
    pub store_id: Option<Uuid>,
    pub min_price: Option<Decimal>,
    pub max_price: Option<Decimal>,
}

const PRODUCT_COLUMNS: &str =
    "id, store_id, name, slug, description, price, stock, is_active, created_at, updated_at";

pub async fn create(pool: &PgPool, input: CreateProductInput) -> Result<Product, sqlx::Error> {
    let rec = sqlx::query_as::<_, Product>(&format!(
        r#"
        INSERT INTO products (store_id, name, slug, description, price, stock)
        VALUES ($1, $2, $3, $4, $5, $6)
        RETURNING {PRODUCT_COLUMNS}
        "#,
    ))
    .bind(input.store_id)
    .bind(input.name)
    .bind(input.slug)
    .bind(input.description)
    .bind(input.price)
    .bind(input.stock)
    .fetch_one(pool)
    .await?;
    Ok(rec)
}

pub async fn get_by_id(pool: &PgPool, id: Uuid) -> Result<Option<Product>, sqlx::Error> {
    let rec = sqlx::query_as::<_, Product>(&format!(
        r#"
        SELECT {PRODUCT_COLUMNS}
        FROM products
        WHERE id = $1
        "#,
    ))
    .bind(id)
    .fetch_optional(pool)
    .await?;
    Ok(rec)
}

/// 公开详情：商品和所属店铺都必须活跃
pub async fn get_public_by_id(pool: &PgPool, id: Uuid) -> Result<Option<Product>, sqlx::Error> {
    let rec = sqlx::query_as::<_, Product>(
        r#"
        SELECT p.id, p.store_id, p.name, p.slug, p.description, p.price, p.stock,
               p.is_active, p.created_at, p.updated_at
        FROM products p
        JOIN stores s ON s.id = p.store_id
        WHERE p.id = $1 AND p.is_active = TRUE AND s.is_active = TRUE
        "#,
    )
    .bind(id)
    .fetch_optional(pool)
    .await?;
    Ok(rec)
}

pub async fn list_public(
    pool: &PgPool,
    filter: &ProductFilter,
    limit: i64,
    offset: i64,
) -> Result<Vec<Product>, sqlx::Error> {
    let recs = sqlx::query_as::<_, Product>(
        r#"
        SELECT p.id, p.store_id, p.name, p.slug, p.description, p.price, p.stock,
               p.is_active, p.created_at, p.updated_at
        FROM products p
        JOIN stores s ON s.id = p.store_id
        WHERE p.is_active = TRUE AND s.is_active = TRUE
          AND ($1::text IS NULL OR p.name ILIKE '%' || $1 || '%'
               OR p.description ILIKE '%' || $1 || '%')
          AND ($2::uuid IS NULL OR p.store_id = $2)
          AND ($3::numeric IS NULL OR p.price >= $3)
          AND ($4::numeric IS NULL OR p.price <= $4)
        ORDER BY p.created_at DESC
        LIMIT $5 OFFSET $6
        "#,
    )
    .bind(filter.search.as_deref())
    .bind(filter.store_id)
    .bind(filter.min_price)
    .bind(filter.max_price)
    .bind(limit)
    .bind(offset)
    .fetch_all(pool)
    .await?;
    Ok(recs)
}

pub async fn count_public(pool: &PgPool, filter: &ProductFilter) -> Result<i64, sqlx::Error> {
    let count: (i64,) = sqlx::query_as(
        r#"
        SELECT COUNT(*)
        FROM products p
        JOIN stores s ON s.id = p.store_id
        WHERE p.is_active = TRUE AND s.is_active = TRUE
          AND ($1::text IS NULL OR p.name ILIKE '%' || $1 || '%'
               OR p.description ILIKE '%' || $1 || '%')
          AND ($2::uuid IS NULL OR p.store_id = $2)
          AND ($3::numeric IS NULL OR p.price >= $3)
          AND ($4::numeric IS NULL OR p.price <= $4)
        "#,
    )
    .bind(filter.search.as_deref())
    .bind(filter.store_id)
    .bind(filter.min_price)
    .bind(filter.max_price)
    .fetch_one(pool)
    .await?;
    Ok(count.0)
}

/// 管理端全量列表：不过滤活跃状态
pub async fn list_all(
    pool: &PgPool,
    filter: &ProductFilter,
    limit: i64,
    offset: i64,
) -> Result<Vec<Product>, sqlx::Error> {
    let recs = sqlx::query_as::<_, Product>(&format!(
        r#"
        SELECT {PRODUCT_COLUMNS}
        FROM products
        WHERE ($1::text IS NULL OR name ILIKE '%' || $1 || '%')
          AND ($2::uuid IS NULL OR store_id = $2)
        ORDER BY created_at DESC
        LIMIT $3 OFFSET $4
        "#,
    ))
    .bind(filter.search.as_deref())
    .bind(filter.store_id)
    .bind(limit)
    .bind(offset)
    .fetch_all(pool)
    .await?;
    Ok(recs)
}

pub async fn count_all_filtered(
    pool: &PgPool,
    filter: &ProductFilter,
) -> Result<i64, sqlx::Error> {
    let count: (i64,) = sqlx::query_as(
        r#"
        SELECT COUNT(*) FROM products
        WHERE ($1::text IS NULL OR name ILIKE '%' || $1 || '%')
          AND ($2::uuid IS NULL OR store_id = $2)
        "#,
    )
    .bind(filter.search.as_deref())
    .bind(filter.store_id)
    .fetch_one(pool)
    .await?;
    Ok(count.0)
}

pub async fn list_by_store(
    pool: &PgPool,
    store_id: Uuid,
    limit: i64,
    offset: i64,
) -> Result<Vec<Product>, sqlx::Error> {
    let recs = sqlx::query_as::<_, Product>(&format!(
        r#"
        SELECT {PRODUCT_COLUMNS}
        FROM products
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

pub async fn update(
    pool: &PgPool,
    id: Uuid,
    name: Option<String>,
    description: Option<String>,
    price: Option<Decimal>,
    stock: Option<i32>,
    is_active: Option<bool>,
) -> Result<Option<Product>, sqlx::Error> {
    if name.is_none()
        && description.is_none()
        && price.is_none()
        && stock.is_none()
        && is_active.is_none()
    {
        return get_by_id(pool, id).await;
    }

    let rec = sqlx::query_as::<_, Product>(&format!(
        r#"
        UPDATE products
        SET name = COALESCE($2, name),
            description = COALESCE($3, description),
            price = COALESCE($4, price),
            stock = COALESCE($5, stock),
            is_active = COALESCE($6, is_active),
            updated_at = CURRENT_TIMESTAMP
        WHERE id = $1
        RETURNING {PRODUCT_COLUMNS}
        "#,
    ))
    .bind(id)
    .bind(name)
    .bind(description)
    .bind(price)
    .bind(stock)
    .bind(is_active)
    .fetch_optional(pool)
    .await?;
    Ok(rec)
}

pub async fn delete(pool: &PgPool, id: Uuid) -> Result<bool, sqlx::Error> {
    let rows_affected = sqlx::query("DELETE FROM products WHERE id = $1")
        .bind(id)
        .execute(pool)
        .await?
        .rows_affected();
    Ok(rows_affected > 0)
}

/// 套餐商品数上限检查用
pub async fn count_by_store(pool: &PgPool, store_id: Uuid) -> Result<i64, sqlx::Error> {
    let count: (i64,) = sqlx::query_as("SELECT COUNT(*) FROM products WHERE store_id = $1")
        .bind(store_id)
        .fetch_one(pool)
        .await?;
    Ok(count.0)
}

pub async fn count_all(pool: &PgPool) -> Result<i64, sqlx::Error> {
    let count: (i64,) = sqlx::query_as("SELECT COUNT(*) FROM products")
        .fetch_one(pool)
        .await?;
    Ok(count.0)
}
