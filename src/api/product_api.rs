//! 商品 API：公开目录、卖家管理与买家评价

use std::sync::Arc;

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    routing::{get, post, put},
    Json, Router,
};
use rust_decimal::Decimal;
use serde::Deserialize;
use utoipa::{IntoParams, ToSchema};
use uuid::Uuid;

use crate::{
    api::{
        middleware::{require_role, require_seller_or_admin, AuthUserExtractor},
        response::{
            created_response, message_response, paginated_response, pagination::PaginationParams,
            success_response, ApiResponse, MessageData,
        },
    },
    app_state::AppState,
    domain::Role,
    error::AppError,
    repository::products::{Product, ProductFilter},
    repository::reviews::Review,
    service::{self, products::ProductDetail},
};

/// 公开商品目录的查询参数
#[derive(Debug, Deserialize, IntoParams)]
#[serde(rename_all = "camelCase")]
pub struct ListProductsQuery {
    pub page: Option<u32>,
    pub page_size: Option<u32>,
    /// 按名称/描述模糊搜索
    pub search: Option<String>,
    pub store_id: Option<Uuid>,
    pub min_price: Option<Decimal>,
    pub max_price: Option<Decimal>,
}

#[utoipa::path(
    get,
    path = "/api/products",
    tag = "products",
    params(ListProductsQuery),
    responses((status = 200, description = "Catálogo público", body = crate::api::response::ApiResponse<Vec<Product>>))
)]
pub async fn list_products(
    State(st): State<Arc<AppState>>,
    Query(q): Query<ListProductsQuery>,
) -> Result<Json<ApiResponse<Vec<Product>>>, AppError> {
    let params = PaginationParams::new(q.page, q.page_size);
    let filter = ProductFilter {
        search: q.search,
        store_id: q.store_id,
        min_price: q.min_price,
        max_price: q.max_price,
    };
    let (items, total) =
        service::products::list_public(&st.pool, filter, params.limit(), params.offset()).await?;
    crate::metrics::count_ok("GET /api/products");
    paginated_response(items, params.to_block(total as u64))
}

#[utoipa::path(
    get,
    path = "/api/products/{id}",
    tag = "products",
    params(("id" = Uuid, Path, description = "ID do produto")),
    responses(
        (status = 200, description = "Detalhe com avaliações recentes", body = crate::api::response::ApiResponse<ProductDetail>),
        (status = 404, description = "Produto não encontrado")
    )
)]
pub async fn get_product(
    State(st): State<Arc<AppState>>,
    Path(id): Path<Uuid>,
) -> Result<Json<ApiResponse<ProductDetail>>, AppError> {
    let detail = service::products::get_public_detail(&st.pool, id).await?;
    crate::metrics::count_ok("GET /api/products/:id");
    success_response(detail)
}

#[utoipa::path(
    get,
    path = "/api/products/mine",
    tag = "products",
    params(crate::api::response::pagination::PaginationQuery),
    responses(
        (status = 200, description = "Produtos da loja do vendedor (inclui inativos)", body = crate::api::response::ApiResponse<Vec<Product>>),
        (status = 404, description = "Loja não encontrada")
    )
)]
pub async fn list_my_products(
    State(st): State<Arc<AppState>>,
    AuthUserExtractor(auth): AuthUserExtractor,
    Query(q): Query<crate::api::response::pagination::PaginationQuery>,
) -> Result<Json<ApiResponse<Vec<Product>>>, AppError> {
    require_seller_or_admin(&auth)?;
    let params = PaginationParams::from(q);
    let (items, total) =
        service::products::list_my_products(&st.pool, auth.id, params.limit(), params.offset())
            .await?;
    crate::metrics::count_ok("GET /api/products/mine");
    paginated_response(items, params.to_block(total as u64))
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct CreateProductReq {
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
    pub price: Decimal,
    #[serde(default)]
    pub stock: i32,
}

#[utoipa::path(
    post,
    path = "/api/products",
    tag = "products",
    request_body = CreateProductReq,
    responses(
        (status = 201, description = "Produto criado", body = crate::api::response::ApiResponse<Product>),
        (status = 400, description = "Limite de produtos do plano atingido"),
        (status = 403, description = "Apenas vendedores")
    )
)]
pub async fn create_product(
    State(st): State<Arc<AppState>>,
    AuthUserExtractor(auth): AuthUserExtractor,
    Json(req): Json<CreateProductReq>,
) -> Result<(StatusCode, Json<ApiResponse<Product>>), AppError> {
    require_role(&auth, Role::Seller)?;
    let product = service::products::create_product(
        &st.pool,
        auth.id,
        service::products::ProductFields {
            name: req.name,
            description: req.description,
            price: req.price,
            stock: req.stock,
        },
    )
    .await?;
    crate::metrics::count_ok("POST /api/products");
    created_response(product)
}

#[derive(Debug, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct UpdateProductReq {
    pub name: Option<String>,
    pub description: Option<String>,
    pub price: Option<Decimal>,
    pub stock: Option<i32>,
    pub is_active: Option<bool>,
}

#[utoipa::path(
    put,
    path = "/api/products/{id}",
    tag = "products",
    params(("id" = Uuid, Path, description = "ID do produto")),
    request_body = UpdateProductReq,
    responses(
        (status = 200, description = "Produto atualizado", body = crate::api::response::ApiResponse<Product>),
        (status = 403, description = "Produto de outra loja"),
        (status = 404, description = "Produto não encontrado")
    )
)]
pub async fn update_product(
    State(st): State<Arc<AppState>>,
    AuthUserExtractor(auth): AuthUserExtractor,
    Path(id): Path<Uuid>,
    Json(req): Json<UpdateProductReq>,
) -> Result<Json<ApiResponse<Product>>, AppError> {
    let product = service::products::update_product(
        &st.pool,
        auth.id,
        auth.role,
        id,
        req.name,
        req.description,
        req.price,
        req.stock,
        req.is_active,
    )
    .await?;
    crate::metrics::count_ok("PUT /api/products/:id");
    success_response(product)
}

#[utoipa::path(
    delete,
    path = "/api/products/{id}",
    tag = "products",
    params(("id" = Uuid, Path, description = "ID do produto")),
    responses(
        (status = 200, description = "Produto removido", body = crate::api::response::ApiResponse<MessageData>),
        (status = 404, description = "Produto não encontrado")
    )
)]
pub async fn delete_product(
    State(st): State<Arc<AppState>>,
    AuthUserExtractor(auth): AuthUserExtractor,
    Path(id): Path<Uuid>,
) -> Result<Json<ApiResponse<MessageData>>, AppError> {
    service::products::delete_product(&st.pool, auth.id, auth.role, id).await?;
    crate::metrics::count_ok("DELETE /api/products/:id");
    message_response("Produto removido com sucesso")
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct CreateReviewReq {
    /// 1 a 5
    pub rating: i32,
    #[serde(default)]
    pub comment: Option<String>,
}

#[utoipa::path(
    post,
    path = "/api/products/{id}/reviews",
    tag = "products",
    params(("id" = Uuid, Path, description = "ID do produto")),
    request_body = CreateReviewReq,
    responses(
        (status = 201, description = "Avaliação registrada", body = crate::api::response::ApiResponse<Review>),
        (status = 400, description = "Nota fora do intervalo 1-5"),
        (status = 403, description = "Apenas compradores")
    )
)]
pub async fn create_review(
    State(st): State<Arc<AppState>>,
    AuthUserExtractor(auth): AuthUserExtractor,
    Path(id): Path<Uuid>,
    Json(req): Json<CreateReviewReq>,
) -> Result<(StatusCode, Json<ApiResponse<Review>>), AppError> {
    require_role(&auth, Role::Buyer)?;
    let review =
        service::products::create_review(&st.pool, auth.id, id, req.rating, req.comment).await?;
    crate::metrics::count_ok("POST /api/products/:id/reviews");
    created_response(review)
}

/// 商品管理路由（受保护路由树）
pub fn routes() -> Router<Arc<AppState>> {
    Router::new()
        .route("/api/products", post(create_product))
        .route("/api/products/mine", get(list_my_products))
        .route(
            "/api/products/:id",
            put(update_product).delete(delete_product),
        )
        .route("/api/products/:id/reviews", post(create_review))
}
