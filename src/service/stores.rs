//! 店铺服务层
//! 卖家开店前置条件：有生效订阅，且尚未拥有店铺

use uuid::Uuid;

use crate::{
    error::AppError,
    infrastructure::{
        db::PgPool,
        validation::{slugify, validate_name},
    },
    repository::{
        stores::{self, CreateStoreInput, Store},
        subscriptions,
    },
};

pub async fn create_store(
    pool: &PgPool,
    owner_id: Uuid,
    name: String,
    description: Option<String>,
) -> Result<Store, AppError> {
    validate_name(&name).map_err(|e| AppError::bad_request(e.to_string()))?;

    // 1. 一个卖家一家店
    if stores::get_by_owner(pool, owner_id).await?.is_some() {
        return Err(AppError::conflict("Você já possui uma loja"));
    }

    // 2. 开店需要生效订阅
    subscriptions::get_active_by_user(pool, owner_id)
        .await?
        .ok_or_else(|| {
            AppError::business_rule("Assinatura ativa é necessária para criar uma loja")
        })?;

    let slug = slugify(&name);
    if slug.is_empty() {
        return Err(AppError::bad_request("Nome da loja inválido"));
    }

    let store = stores::create(
        pool,
        CreateStoreInput {
            owner_id,
            name,
            slug,
            description,
        },
    )
    .await
    .map_err(|e| match &e {
        sqlx::Error::Database(db) if db.code().as_deref() == Some("23505") => {
            AppError::conflict("Já existe uma loja com esse nome")
        }
        _ => AppError::from(e),
    })?;

    tracing::info!(store_id = %store.id, owner_id = %owner_id, "loja criada");
    Ok(store)
}

pub async fn get_my_store(pool: &PgPool, owner_id: Uuid) -> Result<Store, AppError> {
    stores::get_by_owner(pool, owner_id)
        .await?
        .ok_or_else(|| AppError::not_found("Loja não encontrada"))
}

pub async fn update_my_store(
    pool: &PgPool,
    owner_id: Uuid,
    name: Option<String>,
    description: Option<String>,
) -> Result<Store, AppError> {
    if let Some(ref n) = name {
        validate_name(n).map_err(|e| AppError::bad_request(e.to_string()))?;
    }

    let store = get_my_store(pool, owner_id).await?;
    stores::update(pool, store.id, name, description, None)
        .await?
        .ok_or_else(|| AppError::not_found("Loja não encontrada"))
}

/// 公开店铺页
pub async fn get_public_store(pool: &PgPool, slug: &str) -> Result<Store, AppError> {
    stores::get_active_by_slug(pool, slug)
        .await?
        .ok_or_else(|| AppError::not_found("Loja não encontrada"))
}

// ============ 管理端 ============

pub async fn admin_list_stores(
    pool: &PgPool,
    search: Option<String>,
    limit: i64,
    offset: i64,
) -> Result<(Vec<Store>, i64), AppError> {
    let items = stores::list(pool, search.clone(), limit, offset).await?;
    let total = stores::count(pool, search).await?;
    Ok((items, total))
}

pub async fn admin_update_store(
    pool: &PgPool,
    store_id: Uuid,
    name: Option<String>,
    description: Option<String>,
    is_active: Option<bool>,
) -> Result<Store, AppError> {
    stores::update(pool, store_id, name, description, is_active)
        .await?
        .ok_or_else(|| AppError::not_found("Loja não encontrada"))
}

pub async fn admin_delete_store(pool: &PgPool, store_id: Uuid) -> Result<(), AppError> {
    let deleted = stores::delete(pool, store_id).await.map_err(|e| match &e {
        sqlx::Error::Database(db) if db.code().as_deref() == Some("23503") => {
            AppError::business_rule("Não é possível excluir loja com pedidos associados")
        }
        _ => AppError::from(e),
    })?;
    if !deleted {
        return Err(AppError::not_found("Loja não encontrada"));
    }
    Ok(())
}
