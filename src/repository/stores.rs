// 店铺数据访问

use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::ToSchema;
use uuid::Uuid;

use crate::infrastructure::db::PgPool;

#[derive(Debug, Clone, Serialize, Deserialize, FromRow, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct Store {
    pub id: Uuid,
    pub owner_id: Uuid,
    pub name: String,
    pub slug: String,
    pub description: Option<String>,
    pub is_active: bool,
    pub created_at: chrono::DateTime<chrono::Utc>,
    pub updated_at: chrono::DateTime<chrono::Utc>,
}

#[derive(Debug)]
pub struct CreateStoreInput {
    pub owner_id: Uuid,
    pub name: String,
    pub slug: String,
    pub description: Option<String>,
}

pub async fn create(pool: &PgPool, input: CreateStoreInput) -> Result<Store, sqlx::Error> {
    let rec = sqlx::query_as::<_, Store>(
        r#"
        INSERT INTO stores (owner_id, name, slug, description)
        VALUES ($1, $2, $3, $4)
        RETURNING id, owner_id, name, slug, description, is_active, created_at, updated_at
        "#,
    )
    .bind(input.owner_id)
    .bind(input.name)
    .bind(input.slug)
    .bind(input.description)
    .fetch_one(pool)
    .await?;
    Ok(rec)
}

pub async fn get_by_id(pool: &PgPool, id: Uuid) -> Result<Option<Store>, sqlx::Error> {
    let rec = sqlx::query_as::<_, Store>(
        r#"
        SELECT id, owner_id, name, slug, description, is_active, created_at, updated_at
        FROM stores
        WHERE id = $1
        "#,
    )
    .bind(id)
    .fetch_optional(pool)
    .await?;
    Ok(rec)
}

pub async fn get_by_owner(pool: &PgPool, owner_id: Uuid) -> Result<Option<Store>, sqlx::Error> {
    let rec = sqlx::query_as::<_, Store>(
        r#"
        SELECT id, owner_id, name, slug, description, is_active, created_at, updated_at
        FROM stores
        WHERE owner_id = $1
        "#,
    )
    .bind(owner_id)
    .fetch_optional(pool)
    .await?;
    Ok(rec)
}

/// 公开店铺页：仅活跃店铺
pub async fn get_active_by_slug(pool: &PgPool, slug: &str) -> Result<Option<Store>, sqlx::Error> {
    let rec = sqlx::query_as::<_, Store>(
        r#"
        SELECT id, owner_id, name, slug, description, is_active, created_at, updated_at
        FROM stores
        WHERE slug = $1 AND is_active = TRUE
        "#,
    )
    .bind(slug)
    .fetch_optional(pool)
    .await?;
    Ok(rec)
}

pub async fn update(
    pool: &PgPool,
    id: Uuid,
    name: Option<String>,
    description: Option<String>,
    is_active: Option<bool>,
) -> Result<Option<Store>, sqlx::Error> {
    if name.is_none() && description.is_none() && is_active.is_none() {
        return get_by_id(pool, id).await;
    }

    let rec = sqlx::query_as::<_, Store>(
        r#"
        UPDATE stores
        SET name = COALESCE($2, name),
            description = COALESCE($3, description),
            is_active = COALESCE($4, is_active),
            updated_at = CURRENT_TIMESTAMP
        WHERE id = $1
        RETURNING id, owner_id, name, slug, description, is_active, created_at, updated_at
        "#,
    )
    .bind(id)
    .bind(name)
    .bind(description)
    .bind(is_active)
    .fetch_optional(pool)
    .await?;
    Ok(rec)
}

pub async fn delete(pool: &PgPool, id: Uuid) -> Result<bool, sqlx::Error> {
    let rows_affected = sqlx::query("DELETE FROM stores WHERE id = $1")
        .bind(id)
        .execute(pool)
        .await?
        .rows_affected();
    Ok(rows_affected > 0)
}

pub async fn list(
    pool: &PgPool,
    search: Option<String>,
    limit: i64,
    offset: i64,
) -> Result<Vec<Store>, sqlx::Error> {
    let recs = sqlx::query_as::<_, Store>(
        r#"
        SELECT id, owner_id, name, slug, description, is_active, created_at, updated_at
        FROM stores
        WHERE ($1::text IS NULL OR name ILIKE '%' || $1 || '%' OR slug ILIKE '%' || $1 || '%')
        ORDER BY created_at DESC
        LIMIT $2 OFFSET $3
        "#,
    )
    .bind(search)
    .bind(limit)
    .bind(offset)
    .fetch_all(pool)
    .await?;
    Ok(recs)
}

pub async fn count(pool: &PgPool, search: Option<String>) -> Result<i64, sqlx::Error> {
    let count: (i64,) = sqlx::query_as(
        r#"
        SELECT COUNT(*) FROM stores
        WHERE ($1::text IS NULL OR name ILIKE '%' || $1 || '%' OR slug ILIKE '%' || $1 || '%')
        "#,
    )
    .bind(search)
    .fetch_one(pool)
    .await?;
    Ok(count.0)
}

pub async fn count_all(pool: &PgPool) -> Result<i64, sqlx::Error> {
    let count: (i64,) = sqlx::query_as("SELECT COUNT(*) FROM stores")
        .fetch_one(pool)
        .await?;
    Ok(count.0)
}
