//! 商品服务层
//! 卖家建品受套餐上限约束；公开读取只露出活跃店铺的活跃商品

use rust_decimal::Decimal;
use serde::Serialize;
use utoipa::ToSchema;
use uuid::Uuid;

use crate::{
    domain::Role,
    error::AppError,
    infrastructure::{
        db::PgPool,
        validation::{sanitize_string, slugify, validate_name, validate_price, validate_rating},
    },
    repository::{
        plans, products,
        products::{CreateProductInput, Product, ProductFilter},
        reviews,
        reviews::Review,
        stores, subscriptions,
    },
};

/// 公开商品详情：商品 + 最近评价 + 平均分
#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ProductDetail {
    pub product: Product,
    pub reviews: Vec<Review>,
    pub average_rating: Option<Decimal>,
}

pub async fn list_public(
    pool: &PgPool,
    filter: ProductFilter,
    limit: i64,
    offset: i64,
) -> Result<(Vec<Product>, i64), AppError> {
    let items = products::list_public(pool, &filter, limit, offset).await?;
    let total = products::count_public(pool, &filter).await?;
    Ok((items, total))
}

pub async fn get_public_detail(pool: &PgPool, product_id: Uuid) -> Result<ProductDetail, AppError> {
    let product = products::get_public_by_id(pool, product_id)
        .await?
        .ok_or_else(|| AppError::not_found("Produto não encontrado"))?;

    let reviews = reviews::list_recent_by_product(pool, product_id, 10).await?;
    let average_rating = reviews::average_rating(pool, product_id).await?;

    Ok(ProductDetail {
        product,
        reviews,
        average_rating,
    })
}

/// 卖家自视角列表：含停用商品
pub async fn list_my_products(
    pool: &PgPool,
    seller_id: Uuid,
    limit: i64,
    offset: i64,
) -> Result<(Vec<Product>, i64), AppError> {
    let store = stores::get_by_owner(pool, seller_id)
        .await?
        .ok_or_else(|| AppError::not_found("Loja não encontrada"))?;

    let items = products::list_by_store(pool, store.id, limit, offset).await?;
    let total = products::count_by_store(pool, store.id).await?;
    Ok((items, total))
}

pub struct ProductFields {
    pub name: String,
    pub description: Option<String>,
    pub price: Decimal,
    pub stock: i32,
}

/// 卖家建品：店铺必须存在且活跃，数量受套餐上限约束
pub async fn create_product(
    pool: &PgPool,
    seller_id: Uuid,
    fields: ProductFields,
) -> Result<Product, AppError> {
    validate_name(&fields.name).map_err(|e| AppError::bad_request(e.to_string()))?;
    validate_price(fields.price).map_err(|e| AppError::bad_request(e.to_string()))?;
    if fields.stock < 0 {
        return Err(AppError::bad_request("Estoque não pode ser negativo"));
    }

    let store = stores::get_by_owner(pool, seller_id)
        .await?
        .ok_or_else(|| AppError::business_rule("Crie uma loja antes de cadastrar produtos"))?;
    if !store.is_active {
        return Err(AppError::business_rule("Loja está inativa"));
    }

    // 套餐上限
    let subscription = subscriptions::get_active_by_user(pool, seller_id)
        .await?
        .ok_or_else(|| AppError::business_rule("Assinatura ativa é necessária"))?;
    let plan = plans::get_by_id(pool, subscription.plan_id)
        .await?
        .ok_or_else(|| AppError::internal("plano da assinatura não encontrado"))?;

    let current = products::count_by_store(pool, store.id).await?;
    if current >= plan.max_products as i64 {
        return Err(AppError::business_rule(format!(
            "Limite de produtos do plano atingido ({} de {})",
            current, plan.max_products
        )));
    }

    insert_product(pool, store.id, fields).await
}

/// 管理端建品：指定店铺，不检查套餐
pub async fn admin_create_product(
    pool: &PgPool,
    store_id: Uuid,
    fields: ProductFields,
) -> Result<Product, AppError> {
    validate_name(&fields.name).map_err(|e| AppError::bad_request(e.to_string()))?;
    validate_price(fields.price).map_err(|e| AppError::bad_request(e.to_string()))?;

    stores::get_by_id(pool, store_id)
        .await?
        .ok_or_else(|| AppError::not_found("Loja não encontrada"))?;

    insert_product(pool, store_id, fields).await
}

async fn insert_product(
    pool: &PgPool,
    store_id: Uuid,
    fields: ProductFields,
) -> Result<Product, AppError> {
    let slug = slugify(&fields.name);
    if slug.is_empty() {
        return Err(AppError::bad_request("Nome do produto inválido"));
    }

    let product = products::create(
        pool,
        CreateProductInput {
            store_id,
            name: fields.name,
            slug,
            description: fields.description,
            price: fields.price,
            stock: fields.stock,
        },
    )
    .await
    .map_err(|e| match &e {
        sqlx::Error::Database(db) if db.code().as_deref() == Some("23505") => {
            AppError::conflict("Já existe um produto com esse nome nesta loja")
        }
        _ => AppError::from(e),
    })?;

    Ok(product)
}

/// 卖家只能改自家商品；管理员不受限
pub async fn update_product(
    pool: &PgPool,
    actor_id: Uuid,
    actor_role: Role,
    product_id: Uuid,
    name: Option<String>,
    description: Option<String>,
    price: Option<Decimal>,
    stock: Option<i32>,
    is_active: Option<bool>,
) -> Result<Product, AppError> {
    if let Some(ref n) = name {
        validate_name(n).map_err(|e| AppError::bad_request(e.to_string()))?;
    }
    if let Some(p) = price {
        validate_price(p).map_err(|e| AppError::bad_request(e.to_string()))?;
    }
    if let Some(s) = stock {
        if s < 0 {
            return Err(AppError::bad_request("Estoque não pode ser negativo"));
        }
    }

    ensure_can_manage(pool, actor_id, actor_role, product_id).await?;

    products::update(pool, product_id, name, description, price, stock, is_active)
        .await?
        .ok_or_else(|| AppError::not_found("Produto não encontrado"))
}

pub async fn delete_product(
    pool: &PgPool,
    actor_id: Uuid,
    actor_role: Role,
    product_id: Uuid,
) -> Result<(), AppError> {
    ensure_can_manage(pool, actor_id, actor_role, product_id).await?;

    let deleted = products::delete(pool, product_id)
        .await
        .map_err(|e| match &e {
            sqlx::Error::Database(db) if db.code().as_deref() == Some("23503") => {
                AppError::business_rule("Não é possível excluir produto com pedidos associados")
            }
            _ => AppError::from(e),
        })?;
    if !deleted {
        return Err(AppError::not_found("Produto não encontrado"));
    }
    Ok(())
}

async fn ensure_can_manage(
    pool: &PgPool,
    actor_id: Uuid,
    actor_role: Role,
    product_id: Uuid,
) -> Result<(), AppError> {
    if actor_role == Role::Admin {
        return Ok(());
    }

    let product = products::get_by_id(pool, product_id)
        .await?
        .ok_or_else(|| AppError::not_found("Produto não encontrado"))?;
    let store = stores::get_by_id(pool, product.store_id)
        .await?
        .ok_or_else(|| AppError::not_found("Loja não encontrada"))?;

    if store.owner_id != actor_id {
        return Err(AppError::forbidden(
            "Acesso negado. Este produto não pertence à sua loja",
        ));
    }
    Ok(())
}

// ============ 评价 ============

pub async fn create_review(
    pool: &PgPool,
    user_id: Uuid,
    product_id: Uuid,
    rating: i32,
    comment: Option<String>,
) -> Result<Review, AppError> {
    validate_rating(rating).map_err(|e| AppError::bad_request(e.to_string()))?;

    // 自由文本：去掉控制字符并限制长度
    let comment = comment
        .map(|c| sanitize_string(&c, 2000))
        .transpose()
        .map_err(|e| AppError::bad_request(e.to_string()))?;

    products::get_public_by_id(pool, product_id)
        .await?
        .ok_or_else(|| AppError::not_found("Produto não encontrado"))?;

    if reviews::has_user_reviewed(pool, product_id, user_id).await? {
        return Err(AppError::conflict("Você já avaliou este produto"));
    }

    Ok(reviews::create(pool, product_id, user_id, rating, comment).await?)
}

// ============ 管理端列表 ============

pub async fn admin_list_products(
    pool: &PgPool,
    filter: ProductFilter,
    limit: i64,
    offset: i64,
) -> Result<(Vec<Product>, i64), AppError> {
    // 管理端看全量，含停用商品
    let items = products::list_all(pool, &filter, limit, offset).await?;
    let total = products::count_all_filtered(pool, &filter).await?;
    Ok((items, total))
}
