//! 用户服务层：个人资料、收货地址、心愿单、通知

use serde::Serialize;
use utoipa::ToSchema;
use uuid::Uuid;

use crate::{
    domain::{OrderStatus, Role},
    error::AppError,
    infrastructure::{
        db::PgPool,
        password::{hash_password, verify_password},
        validation::{validate_name, validate_password_strength},
    },
    repository::{
        addresses::{self, Address, CreateAddressInput},
        orders,
        products,
        users::{self, User},
        wishlist::{self, WishlistItem},
    },
};

pub async fn get_profile(pool: &PgPool, user_id: Uuid) -> Result<User, AppError> {
    users::get_by_id(pool, user_id)
        .await?
        .ok_or_else(|| AppError::not_found("Usuário não encontrado"))
}

/// 更新资料。改密码必须携带当前密码并通过校验
pub async fn update_profile(
    pool: &PgPool,
    user_id: Uuid,
    name: Option<String>,
    current_password: Option<String>,
    new_password: Option<String>,
) -> Result<User, AppError> {
    if let Some(ref n) = name {
        validate_name(n).map_err(|e| AppError::bad_request(e.to_string()))?;
    }

    let password_hash = match new_password {
        Some(new_pass) => {
            validate_password_strength(&new_pass)
                .map_err(|e| AppError::bad_request(e.to_string()))?;

            let current = current_password
                .ok_or_else(|| AppError::bad_request("Senha atual é obrigatória"))?;
            let user = get_profile(pool, user_id).await?;
            let valid = verify_password(&current, &user.password_hash).unwrap_or(false);
            if !valid {
                return Err(AppError::bad_request("Senha atual incorreta"));
            }

            Some(
                hash_password(&new_pass)
                    .map_err(|_| AppError::internal("falha ao gerar hash de senha"))?,
            )
        }
        None => None,
    };

    users::update_profile(pool, user_id, name, password_hash)
        .await?
        .ok_or_else(|| AppError::not_found("Usuário não encontrado"))
}

// ============ 收货地址 ============

pub async fn list_addresses(pool: &PgPool, user_id: Uuid) -> Result<Vec<Address>, AppError> {
    Ok(addresses::list_by_user(pool, user_id).await?)
}

pub struct AddressFields {
    pub street: String,
    pub number: String,
    pub complement: Option<String>,
    pub city: String,
    pub state: String,
    pub zip_code: String,
    pub is_default: bool,
}

pub async fn create_address(
    pool: &PgPool,
    user_id: Uuid,
    fields: AddressFields,
) -> Result<Address, AppError> {
    if fields.street.is_empty()
        || fields.number.is_empty()
        || fields.city.is_empty()
        || fields.state.is_empty()
        || fields.zip_code.is_empty()
    {
        return Err(AppError::bad_request(
            "Rua, número, cidade, estado e CEP são obrigatórios",
        ));
    }

    let address = addresses::create(
        pool,
        CreateAddressInput {
            user_id,
            street: fields.street,
            number: fields.number,
            complement: fields.complement,
            city: fields.city,
            state: fields.state,
            zip_code: fields.zip_code,
            is_default: fields.is_default,
        },
    )
    .await?;
    Ok(address)
}

#[allow(clippy::too_many_arguments)]
pub async fn update_address(
    pool: &PgPool,
    user_id: Uuid,
    address_id: Uuid,
    street: Option<String>,
    number: Option<String>,
    complement: Option<String>,
    city: Option<String>,
    state: Option<String>,
    zip_code: Option<String>,
    is_default: Option<bool>,
) -> Result<Address, AppError> {
    addresses::update(
        pool, address_id, user_id, street, number, complement, city, state, zip_code, is_default,
    )
    .await?
    .ok_or_else(|| AppError::not_found("Endereço não encontrado"))
}

pub async fn delete_address(
    pool: &PgPool,
    user_id: Uuid,
    address_id: Uuid,
) -> Result<(), AppError> {
    let deleted = addresses::delete(pool, address_id, user_id).await?;
    if !deleted {
        return Err(AppError::not_found("Endereço não encontrado"));
    }
    Ok(())
}

// ============ 心愿单 ============

pub async fn list_wishlist(pool: &PgPool, user_id: Uuid) -> Result<Vec<WishlistItem>, AppError> {
    Ok(wishlist::list_by_user(pool, user_id).await?)
}

pub async fn add_to_wishlist(
    pool: &PgPool,
    user_id: Uuid,
    product_id: Uuid,
) -> Result<(), AppError> {
    // 只允许收藏公开可见的商品
    products::get_public_by_id(pool, product_id)
        .await?
        .ok_or_else(|| AppError::not_found("Produto não encontrado"))?;

    wishlist::add(pool, user_id, product_id).await?;
    Ok(())
}

pub async fn remove_from_wishlist(
    pool: &PgPool,
    user_id: Uuid,
    product_id: Uuid,
) -> Result<(), AppError> {
    let removed = wishlist::remove(pool, user_id, product_id).await?;
    if !removed {
        return Err(AppError::not_found("Item não está na lista de desejos"));
    }
    Ok(())
}

// ============ 管理端 ============

pub async fn admin_list_users(
    pool: &PgPool,
    role: Option<String>,
    search: Option<String>,
    limit: i64,
    offset: i64,
) -> Result<(Vec<User>, i64), AppError> {
    let role = normalize_role(role)?;
    let items = users::list(pool, role.clone(), search.clone(), limit, offset).await?;
    let total = users::count(pool, role, search).await?;
    Ok((items, total))
}

pub async fn admin_get_user(pool: &PgPool, user_id: Uuid) -> Result<User, AppError> {
    get_profile(pool, user_id).await
}

pub async fn admin_update_user(
    pool: &PgPool,
    user_id: Uuid,
    name: Option<String>,
    role: Option<String>,
    is_active: Option<bool>,
    is_verified: Option<bool>,
) -> Result<User, AppError> {
    if let Some(ref n) = name {
        validate_name(n).map_err(|e| AppError::bad_request(e.to_string()))?;
    }
    let role = normalize_role(role)?;

    users::admin_update(pool, user_id, name, role, is_active, is_verified)
        .await?
        .ok_or_else(|| AppError::not_found("Usuário não encontrado"))
}

/// 删除用户。有关联订单时拒绝，不做任何删除
pub async fn admin_delete_user(pool: &PgPool, user_id: Uuid) -> Result<(), AppError> {
    let order_count = orders::count_by_buyer(pool, user_id).await?;
    if order_count > 0 {
        return Err(AppError::business_rule(
            "Não é possível excluir usuário com pedidos associados",
        )
        .with_details(serde_json::json!({ "orders": order_count })));
    }

    // 卖家的店铺/商品被订单引用时，级联删除会被外键拦下
    let deleted = users::delete(pool, user_id).await.map_err(|e| match &e {
        sqlx::Error::Database(db) if db.code().as_deref() == Some("23503") => {
            AppError::business_rule("Não é possível excluir usuário com pedidos associados")
        }
        _ => AppError::from(e),
    })?;
    if !deleted {
        return Err(AppError::not_found("Usuário não encontrado"));
    }
    Ok(())
}

/// 校验并规范化角色过滤/赋值（数据库存大写）
fn normalize_role(role: Option<String>) -> Result<Option<String>, AppError> {
    role.map(|r| {
        Role::from_str(&r)
            .map(|parsed| parsed.as_str().to_string())
            .ok_or_else(|| AppError::bad_request("Papel inválido"))
    })
    .transpose()
}

// ============ 通知 ============

/// 订单状态通知，由买家最近订单导出，无独立存储
#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct Notification {
    pub order_id: Uuid,
    pub status: String,
    pub message: String,
    pub updated_at: chrono::DateTime<chrono::Utc>,
}

pub async fn list_notifications(
    pool: &PgPool,
    user_id: Uuid,
) -> Result<Vec<Notification>, AppError> {
    let recent = orders::list_recent_by_buyer(pool, user_id, 20).await?;

    let notifications = recent
        .into_iter()
        .filter_map(|order| {
            let status = OrderStatus::from_str(&order.status)?;
            Some(Notification {
                order_id: order.id,
                status: order.status.clone(),
                message: format!("Pedido {}: {}", &order.id.to_string()[..8], status.description()),
                updated_at: order.updated_at,
            })
        })
        .collect();

    Ok(notifications)
}
