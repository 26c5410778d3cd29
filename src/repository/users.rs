// 用户数据访问

use sqlx::FromRow;
use uuid::Uuid;

use crate::infrastructure::db::PgPool;

// 含password_hash，不直接序列化到响应；对外形态见 api::schemas::UserPublic
#[derive(Debug, Clone, FromRow)]
pub struct User {
    pub id: Uuid,
    pub name: String,
    pub email: String,
    pub password_hash: String,
    pub role: String,
    pub is_active: bool,
    pub is_verified: bool,
    pub created_at: chrono::DateTime<chrono::Utc>,
    pub updated_at: chrono::DateTime<chrono::Utc>,
}

#[derive(Debug)]
pub struct CreateUserInput {
    pub name: String,
    pub email: String,
    pub password_hash: String,
    pub role: String,
}

const USER_COLUMNS: &str =
    "id, name, email, password_hash, role, is_active, is_verified, created_at, updated_at";

pub async fn create(pool: &PgPool, input: CreateUserInput) -> Result<User, sqlx::Error> {
    let rec = sqlx::query_as::<_, User>(&format!(
        r#"
        INSERT INTO users (name, email, password_hash, role)
        VALUES ($1, $2, $3, $4)
        RETURNING {USER_COLUMNS}
        "#,
    ))
    .bind(input.name)
    .bind(input.email)
    .bind(input.password_hash)
    .bind(input.role)
    .fetch_one(pool)
    .await?;
    Ok(rec)
}

pub async fn get_by_id(pool: &PgPool, id: Uuid) -> Result<Option<User>, sqlx::Error> {
    let rec = sqlx::query_as::<_, User>(&format!(
        r#"
        SELECT {USER_COLUMNS}
        FROM users
        WHERE id = $1
        "#,
    ))
    .bind(id)
    .fetch_optional(pool)
    .await?;
    Ok(rec)
}

pub async fn get_by_email(pool: &PgPool, email: &str) -> Result<Option<User>, sqlx::Error> {
    let rec = sqlx::query_as::<_, User>(&format!(
        r#"
        SELECT {USER_COLUMNS}
        FROM users
        WHERE email = $1
        "#,
    ))
    .bind(email)
    .fetch_optional(pool)
    .await?;
    Ok(rec)
}

/// 认证中间件的状态复查：返回 is_active，不存在返回 None
pub async fn is_active(pool: &PgPool, id: Uuid) -> Result<Option<bool>, sqlx::Error> {
    let rec: Option<(bool,)> = sqlx::query_as("SELECT is_active FROM users WHERE id = $1")
        .bind(id)
        .fetch_optional(pool)
        .await?;
    Ok(rec.map(|r| r.0))
}

pub async fn update_profile(
    pool: &PgPool,
    id: Uuid,
    name: Option<String>,
    password_hash: Option<String>,
) -> Result<Option<User>, sqlx::Error> {
    if name.is_none() && password_hash.is_none() {
        return get_by_id(pool, id).await;
    }

    let rec = sqlx::query_as::<_, User>(&format!(
        r#"
        UPDATE users
        SET name = COALESCE($2, name),
            password_hash = COALESCE($3, password_hash),
            updated_at = CURRENT_TIMESTAMP
        WHERE id = $1
        RETURNING {USER_COLUMNS}
        "#,
    ))
    .bind(id)
    .bind(name)
    .bind(password_hash)
    .fetch_optional(pool)
    .await?;
    Ok(rec)
}

pub async fn admin_update(
    pool: &PgPool,
    id: Uuid,
    name: Option<String>,
    role: Option<String>,
    is_active: Option<bool>,
    is_verified: Option<bool>,
) -> Result<Option<User>, sqlx::Error> {
    if name.is_none() && role.is_none() && is_active.is_none() && is_verified.is_none() {
        return get_by_id(pool, id).await;
    }

    let rec = sqlx::query_as::<_, User>(&format!(
        r#"
        UPDATE users
        SET name = COALESCE($2, name),
            role = COALESCE($3, role),
            is_active = COALESCE($4, is_active),
            is_verified = COALESCE($5, is_verified),
            updated_at = CURRENT_TIMESTAMP
        WHERE id = $1
        RETURNING {USER_COLUMNS}
        "#,
    ))
    .bind(id)
    .bind(name)
    .bind(role)
    .bind(is_active)
    .bind(is_verified)
    .fetch_optional(pool)
    .await?;
    Ok(rec)
}

pub async fn delete(pool: &PgPool, id: Uuid) -> Result<bool, sqlx::Error> {
    let rows_affected = sqlx::query("DELETE FROM users WHERE id = $1")
        .bind(id)
        .execute(pool)
        .await?
        .rows_affected();
    Ok(rows_affected > 0)
}

pub async fn list(
    pool: &PgPool,
    role: Option<String>,
    search: Option<String>,
    limit: i64,
    offset: i64,
) -> Result<Vec<User>, sqlx::Error> {
    let recs = sqlx::query_as::<_, User>(&format!(
        r#"
        SELECT {USER_COLUMNS}
        FROM users
        WHERE ($1::text IS NULL OR role = $1)
          AND ($2::text IS NULL OR name ILIKE '%' || $2 || '%' OR email ILIKE '%' || $2 || '%')
        ORDER BY created_at DESC
        LIMIT $3 OFFSET $4
        "#,
    ))
    .bind(role)
    .bind(search)
    .bind(limit)
    .bind(offset)
    .fetch_all(pool)
    .await?;
    Ok(recs)
}

pub async fn count(
    pool: &PgPool,
    role: Option<String>,
    search: Option<String>,
) -> Result<i64, sqlx::Error> {
    let count: (i64,) = sqlx::query_as(
        r#"
        SELECT COUNT(*) FROM users
        WHERE ($1::text IS NULL OR role = $1)
          AND ($2::text IS NULL OR name ILIKE '%' || $2 || '%' OR email ILIKE '%' || $2 || '%')
        "#,
    )
    .bind(role)
    .bind(search)
    .fetch_one(pool)
    .await?;
    Ok(count.0)
}

pub async fn count_all(pool: &PgPool) -> Result<i64, sqlx::Error> {
    let count: (i64,) = sqlx::query_as("SELECT COUNT(*) FROM users")
        .fetch_one(pool)
        .await?;
    Ok(count.0)
}
