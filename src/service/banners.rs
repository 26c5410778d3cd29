//! 首页横幅服务层

use uuid::Uuid;

use crate::{
    error::AppError,
    infrastructure::{
        db::PgPool,
        validation::{validate_image_url, validate_name},
    },
    repository::banners::{self, Banner, CreateBannerInput},
};

pub async fn list_public(pool: &PgPool) -> Result<Vec<Banner>, AppError> {
    Ok(banners::list_active(pool).await?)
}

pub async fn admin_list(
    pool: &PgPool,
    limit: i64,
    offset: i64,
) -> Result<(Vec<Banner>, i64), AppError> {
    let items = banners::list_all(pool, limit, offset).await?;
    let total = banners::count_all(pool).await?;
    Ok((items, total))
}

pub async fn admin_create(
    pool: &PgPool,
    title: String,
    image_url: String,
    link_url: Option<String>,
    position: Option<i32>,
) -> Result<Banner, AppError> {
    validate_name(&title).map_err(|e| AppError::bad_request(e.to_string()))?;
    validate_image_url(&image_url).map_err(|e| AppError::bad_request(e.to_string()))?;
    if let Some(ref link) = link_url {
        validate_image_url(link).map_err(|_| AppError::bad_request("URL de destino inválida"))?;
    }

    let banner = banners::create(
        pool,
        CreateBannerInput {
            title,
            image_url,
            link_url,
            position: position.unwrap_or(0),
        },
    )
    .await?;
    Ok(banner)
}

pub async fn admin_update(
    pool: &PgPool,
    banner_id: Uuid,
    title: Option<String>,
    image_url: Option<String>,
    link_url: Option<String>,
    position: Option<i32>,
    is_active: Option<bool>,
) -> Result<Banner, AppError> {
    if let Some(ref t) = title {
        validate_name(t).map_err(|e| AppError::bad_request(e.to_string()))?;
    }
    if let Some(ref url) = image_url {
        validate_image_url(url).map_err(|e| AppError::bad_request(e.to_string()))?;
    }

    banners::update(pool, banner_id, title, image_url, link_url, position, is_active)
        .await?
        .ok_or_else(|| AppError::not_found("Banner não encontrado"))
}

pub async fn admin_delete(pool: &PgPool, banner_id: Uuid) -> Result<(), AppError> {
    let deleted = banners::delete(pool, banner_id).await?;
    if !deleted {
        return Err(AppError::not_found("Banner não encontrado"));
    }
    Ok(())
}
