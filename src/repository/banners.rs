// 首页横幅数据访问

use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::ToSchema;
use uuid::Uuid;

use crate::infrastructure::db::PgPool;

#[derive(Debug, Clone, Serialize, Deserialize, FromRow, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct Banner {
    pub id: Uuid,
    pub title: String,
    pub image_url: String,
    pub link_url: Option<String>,
    pub position: i32,
    pub is_active: bool,
    pub created_at: chrono::DateTime<chrono::Utc>,
    pub updated_at: chrono::DateTime<chrono::Utc>,
}

#[derive(Debug)]
pub struct CreateBannerInput {
    pub title: String,
    pub image_url: String,
    pub link_url: Option<String>,
    pub position: i32,
}

const BANNER_COLUMNS: &str =
    "id, title, image_url, link_url, position, is_active, created_at, updated_at";

pub async fn create(pool: &PgPool, input: CreateBannerInput) -> Result<Banner, sqlx::Error> {
    let rec = sqlx::query_as::<_, Banner>(&format!(
        r#"
        INSERT INTO banners (title, image_url, link_url, position)
        VALUES ($1, $2, $3, $4)
        RETURNING {BANNER_COLUMNS}
        "#,
    ))
    .bind(input.title)
    .bind(input.image_url)
    .bind(input.link_url)
    .bind(input.position)
    .fetch_one(pool)
    .await?;
    Ok(rec)
}

pub async fn get_by_id(pool: &PgPool, id: Uuid) -> Result<Option<Banner>, sqlx::Error> {
    let rec = sqlx::query_as::<_, Banner>(&format!(
        r#"
        SELECT {BANNER_COLUMNS}
        FROM banners
        WHERE id = $1
        "#,
    ))
    .bind(id)
    .fetch_optional(pool)
    .await?;
    Ok(rec)
}

/// 公开横幅：活跃的按position升序
pub async fn list_active(pool: &PgPool) -> Result<Vec<Banner>, sqlx::Error> {
    let recs = sqlx::query_as::<_, Banner>(&format!(
        r#"
        SELECT {BANNER_COLUMNS}
        FROM banners
        WHERE is_active = TRUE
        ORDER BY position ASC, created_at DESC
        "#,
    ))
    .fetch_all(pool)
    .await?;
    Ok(recs)
}

pub async fn list_all(pool: &PgPool, limit: i64, offset: i64) -> Result<Vec<Banner>, sqlx::Error> {
    let recs = sqlx::query_as::<_, Banner>(&format!(
        r#"
        SELECT {BANNER_COLUMNS}
        FROM banners
        ORDER BY position ASC, created_at DESC
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
    let count: (i64,) = sqlx::query_as("SELECT COUNT(*) FROM banners")
        .fetch_one(pool)
        .await?;
    Ok(count.0)
}

pub async fn update(
    pool: &PgPool,
    id: Uuid,
    title: Option<String>,
    image_url: Option<String>,
    link_url: Option<String>,
    position: Option<i32>,
    is_active: Option<bool>,
) -> Result<Option<Banner>, sqlx::Error> {
    if title.is_none()
        && image_url.is_none()
        && link_url.is_none()
        && position.is_none()
        && is_active.is_none()
    {
        return get_by_id(pool, id).await;
    }

    let rec = sqlx::query_as::<_, Banner>(&format!(
        r#"
        UPDATE banners
        SET title = COALESCE($2, title),
            image_url = COALESCE($3, image_url),
            link_url = COALESCE($4, link_url),
            position = COALESCE($5, position),
            is_active = COALESCE($6, is_active),
            updated_at = CURRENT_TIMESTAMP
        WHERE id = $1
        RETURNING {BANNER_COLUMNS}
        "#,
    ))
    .bind(id)
    .bind(title)
    .bind(image_url)
    .bind(link_url)
    .bind(position)
    .bind(is_active)
    .fetch_optional(pool)
    .await?;
    Ok(rec)
}

pub async fn delete(pool: &PgPool, id: Uuid) -> Result<bool, sqlx::Error> {
    let rows_affected = sqlx::query("DELETE FROM banners WHERE id = $1")
        .bind(id)
        .execute(pool)
        .await?
        .rows_affected();
    Ok(rows_affected > 0)
}
