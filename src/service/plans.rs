//! 套餐服务层

use rust_decimal::Decimal;
use uuid::Uuid;

use crate::{
    error::AppError,
    infrastructure::{
        db::PgPool,
        validation::{slugify, validate_name, validate_price},
    },
    repository::plans::{self, CreatePlanInput, Plan},
};

pub async fn list_public(pool: &PgPool) -> Result<Vec<Plan>, AppError> {
    Ok(plans::list_active(pool).await?)
}

pub async fn admin_list(
    pool: &PgPool,
    limit: i64,
    offset: i64,
) -> Result<(Vec<Plan>, i64), AppError> {
    let items = plans::list_all(pool, limit, offset).await?;
    let total = plans::count_all(pool).await?;
    Ok((items, total))
}

pub async fn admin_create(
    pool: &PgPool,
    name: String,
    price: Decimal,
    max_products: i32,
    description: Option<String>,
) -> Result<Plan, AppError> {
    validate_name(&name).map_err(|e| AppError::bad_request(e.to_string()))?;
    validate_price(price).map_err(|e| AppError::bad_request(e.to_string()))?;
    if max_products <= 0 {
        return Err(AppError::bad_request(
            "Limite de produtos deve ser maior que zero",
        ));
    }

    let slug = slugify(&name);
    if slug.is_empty() {
        return Err(AppError::bad_request("Nome do plano inválido"));
    }

    let plan = plans::create(
        pool,
        CreatePlanInput {
            name,
            slug,
            price,
            max_products,
            description,
        },
    )
    .await
    .map_err(|e| match &e {
        sqlx::Error::Database(db) if db.code().as_deref() == Some("23505") => {
            AppError::conflict("Já existe um plano com esse nome")
        }
        _ => AppError::from(e),
    })?;

    Ok(plan)
}

pub async fn admin_update(
    pool: &PgPool,
    plan_id: Uuid,
    name: Option<String>,
    price: Option<Decimal>,
    max_products: Option<i32>,
    description: Option<String>,
    is_active: Option<bool>,
) -> Result<Plan, AppError> {
    if let Some(ref n) = name {
        validate_name(n).map_err(|e| AppError::bad_request(e.to_string()))?;
    }
    if let Some(p) = price {
        validate_price(p).map_err(|e| AppError::bad_request(e.to_string()))?;
    }
    if let Some(m) = max_products {
        if m <= 0 {
            return Err(AppError::bad_request(
                "Limite de produtos deve ser maior que zero",
            ));
        }
    }

    plans::update(pool, plan_id, name, price, max_products, description, is_active)
        .await?
        .ok_or_else(|| AppError::not_found("Plano não encontrado"))
}

pub async fn admin_delete(pool: &PgPool, plan_id: Uuid) -> Result<(), AppError> {
    let deleted = plans::delete(pool, plan_id).await.map_err(|e| match &e {
        sqlx::Error::Database(db) if db.code().as_deref() == Some("23503") => {
            AppError::business_rule("Não é possível excluir plano com assinaturas associadas")
        }
        _ => AppError::from(e),
    })?;
    if !deleted {
        return Err(AppError::not_found("Plano não encontrado"));
    }
    Ok(())
}
