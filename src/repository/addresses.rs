// 收货地址数据访问：所有操作按user_id圈定

use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::ToSchema;
use uuid::Uuid;

use crate::infrastructure::db::PgPool;

#[derive(Debug, Clone, Serialize, Deserialize, FromRow, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct Address {
    pub id: Uuid,
    pub user_id: Uuid,
    pub street: String,
    pub number: String,
    pub complement: Option<String>,
    pub city: String,
    pub state: String,
    pub zip_code: String,
    pub is_default: bool,
    pub created_at: chrono::DateTime<chrono::Utc>,
    pub updated_at: chrono::DateTime<chrono::Utc>,
}

#[derive(Debug)]
pub struct CreateAddressInput {
    pub user_id: Uuid,
    pub street: String,
    pub number: String,
    pub complement: Option<String>,
    pub city: String,
    pub state: String,
    pub zip_code: String,
    pub is_default: bool,
}

const ADDRESS_COLUMNS: &str = "id, user_id, street, number, complement, city, state, zip_code, is_default, created_at, updated_at";

/// 创建地址。设为默认时先清掉该用户的其他默认标记，同一事务内
pub async fn create(pool: &PgPool, input: CreateAddressInput) -> Result<Address, sqlx::Error> {
    let mut tx = pool.begin().await?;

    if input.is_default {
        sqlx::query("UPDATE addresses SET is_default = FALSE WHERE user_id = $1")
            .bind(input.user_id)
            .execute(&mut *tx)
            .await?;
    }

    let rec = sqlx::query_as::<_, Address>(&format!(
        r#"
        INSERT INTO addresses (user_id, street, number, complement, city, state, zip_code, is_default)
        VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
        RETURNING {ADDRESS_COLUMNS}
        "#,
    ))
    .bind(input.user_id)
    .bind(input.street)
    .bind(input.number)
    .bind(input.complement)
    .bind(input.city)
    .bind(input.state)
    .bind(input.zip_code)
    .bind(input.is_default)
    .fetch_one(&mut *tx)
    .await?;

    tx.commit().await?;
    Ok(rec)
}

pub async fn list_by_user(pool: &PgPool, user_id: Uuid) -> Result<Vec<Address>, sqlx::Error> {
    let recs = sqlx::query_as::<_, Address>(&format!(
        r#"
        SELECT {ADDRESS_COLUMNS}
        FROM addresses
        WHERE user_id = $1
        ORDER BY is_default DESC, created_at DESC
        "#,
    ))
    .bind(user_id)
    .fetch_all(pool)
    .await?;
    Ok(recs)
}

pub async fn get_for_user(
    pool: &PgPool,
    id: Uuid,
    user_id: Uuid,
) -> Result<Option<Address>, sqlx::Error> {
    let rec = sqlx::query_as::<_, Address>(&format!(
        r#"
        SELECT {ADDRESS_COLUMNS}
        FROM addresses
        WHERE id = $1 AND user_id = $2
        "#,
    ))
    .bind(id)
    .bind(user_id)
    .fetch_optional(pool)
    .await?;
    Ok(rec)
}

#[allow(clippy::too_many_arguments)]
pub async fn update(
    pool: &PgPool,
    id: Uuid,
    user_id: Uuid,
    street: Option<String>,
    number: Option<String>,
    complement: Option<String>,
    city: Option<String>,
    state: Option<String>,
    zip_code: Option<String>,
    is_default: Option<bool>,
) -> Result<Option<Address>, sqlx::Error> {
    let mut tx = pool.begin().await?;

    if is_default == Some(true) {
        sqlx::query("UPDATE addresses SET is_default = FALSE WHERE user_id = $1")
            .bind(user_id)
            .execute(&mut *tx)
            .await?;
    }

    let rec = sqlx::query_as::<_, Address>(&format!(
        r#"
        UPDATE addresses
        SET street = COALESCE($3, street),
            number = COALESCE($4, number),
            complement = COALESCE($5, complement),
            city = COALESCE($6, city),
            state = COALESCE($7, state),
            zip_code = COALESCE($8, zip_code),
            is_default = COALESCE($9, is_default),
            updated_at = CURRENT_TIMESTAMP
        WHERE id = $1 AND user_id = $2
        RETURNING {ADDRESS_COLUMNS}
        "#,
    ))
    .bind(id)
    .bind(user_id)
    .bind(street)
    .bind(number)
    .bind(complement)
    .bind(city)
    .bind(state)
    .bind(zip_code)
    .bind(is_default)
    .fetch_optional(&mut *tx)
    .await?;

    tx.commit().await?;
    Ok(rec)
}

pub async fn delete(pool: &PgPool, id: Uuid, user_id: Uuid) -> Result<bool, sqlx::Error> {
    let rows_affected = sqlx::query("DELETE FROM addresses WHERE id = $1 AND user_id = $2")
        .bind(id)
        .bind(user_id)
        .execute(pool)
        .await?
        .rows_affected();
    Ok(rows_affected > 0)
}
