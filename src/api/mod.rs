//! HTTP 层：路由组装、CORS/安全头、请求追踪与 OpenAPI 文档
//!
//! 路由分两棵树：公开树（健康检查、目录浏览、认证入口）和受保护树
//! （个人资料、下单、卖家与管理端）。受保护树从外到内依次经过
//! 认证 → API级限流 → CSRF 校验，管理端子树再叠加管理员守卫与审计。

use std::{sync::Arc, time::Instant};

use axum::{
    extract::Request,
    http::{
        header::{
            ACCESS_CONTROL_ALLOW_HEADERS, ACCESS_CONTROL_ALLOW_METHODS,
            ACCESS_CONTROL_ALLOW_ORIGIN, ACCESS_CONTROL_MAX_AGE, CACHE_CONTROL,
            CONTENT_SECURITY_POLICY, PRAGMA, REFERRER_POLICY, X_CONTENT_TYPE_OPTIONS,
            X_FRAME_OPTIONS,
        },
        HeaderValue, Method, StatusCode,
    },
    middleware::{from_fn, from_fn_with_state, Next},
    response::{IntoResponse, Response},
    routing::get,
    Router,
};
use tower::ServiceBuilder;
use tracing::Level;
use utoipa::OpenApi;
use uuid::Uuid;

use crate::{
    api::{
        handlers::{api_health, healthz},
        middleware::{auth_middleware, csrf_middleware, issue_csrf_token, rate_limit, RateLimitClass},
    },
    app_state::AppState,
    error::AppError,
};

pub mod admin_api;
pub mod audit_api;
pub mod auth_api; // ✅ 认证 API（注册、登录）
pub mod banner_api;
pub mod handlers;
pub mod middleware;
pub mod order_api;
pub mod plan_api;
pub mod product_api;
pub mod response; // 统一响应格式
pub mod schemas;
pub mod store_api;
pub mod subscription_api;
pub mod user_api;

#[derive(OpenApi)]
#[openapi(
    paths(
        handlers::api_health,
        handlers::healthz,
        auth_api::register,
        auth_api::login,
        middleware::csrf::issue_csrf_token,
        user_api::get_profile,
        user_api::update_profile,
        user_api::list_addresses,
        user_api::create_address,
        user_api::update_address,
        user_api::delete_address,
        user_api::list_wishlist,
        user_api::add_to_wishlist,
        user_api::remove_from_wishlist,
        user_api::list_notifications,
        store_api::create_store,
        store_api::get_my_store,
        store_api::update_my_store,
        store_api::get_public_store,
        product_api::list_products,
        product_api::get_product,
        product_api::list_my_products,
        product_api::create_product,
        product_api::update_product,
        product_api::delete_product,
        product_api::create_review,
        order_api::create_order,
        order_api::list_orders,
        order_api::get_order,
        order_api::update_order_status,
        order_api::cancel_order,
        plan_api::list_plans,
        banner_api::list_banners,
        subscription_api::subscribe,
        subscription_api::list_my_subscriptions,
        subscription_api::cancel_subscription,
        admin_api::list_users,
        admin_api::get_user,
        admin_api::update_user,
        admin_api::delete_user,
        admin_api::list_stores,
        admin_api::create_store,
        admin_api::update_store,
        admin_api::delete_store,
        admin_api::list_products,
        admin_api::create_product,
        admin_api::update_product,
        admin_api::delete_product,
        admin_api::list_orders,
        admin_api::update_order_status,
        admin_api::refund_order,
        admin_api::list_plans,
        admin_api::create_plan,
        admin_api::update_plan,
        admin_api::delete_plan,
        admin_api::list_subscriptions,
        admin_api::cancel_subscription,
        admin_api::list_banners,
        admin_api::create_banner,
        admin_api::update_banner,
        admin_api::delete_banner,
        audit_api::list_audit_logs,
        audit_api::admin_stats
    ),
    components(
        schemas(
            handlers::HealthResponse,
            handlers::Healthz,
            schemas::UserPublic,
            auth_api::RegisterReq,
            auth_api::LoginReq,
            auth_api::AuthData,
            middleware::csrf::CsrfTokenResponse,
            user_api::UpdateProfileReq,
            user_api::CreateAddressReq,
            user_api::UpdateAddressReq,
            store_api::CreateStoreReq,
            store_api::UpdateStoreReq,
            product_api::CreateProductReq,
            product_api::UpdateProductReq,
            product_api::CreateReviewReq,
            order_api::OrderItemReq,
            order_api::CreateOrderReq,
            order_api::UpdateOrderStatusReq,
            subscription_api::SubscribeReq,
            admin_api::AdminUpdateUserReq,
            admin_api::AdminCreateStoreReq,
            admin_api::AdminUpdateStoreReq,
            admin_api::AdminCreateProductReq,
            admin_api::AdminUpdateOrderStatusReq,
            admin_api::CreatePlanReq,
            admin_api::UpdatePlanReq,
            admin_api::CreateBannerReq,
            admin_api::UpdateBannerReq,
            crate::repository::stores::Store,
            crate::repository::products::Product,
            crate::repository::plans::Plan,
            crate::repository::banners::Banner,
            crate::repository::subscriptions::Subscription,
            crate::repository::orders::Order,
            crate::repository::orders::OrderItem,
            crate::repository::addresses::Address,
            crate::repository::wishlist::WishlistItem,
            crate::repository::reviews::Review,
            crate::repository::audit_logs::AuditLog,
            crate::service::products::ProductDetail,
            crate::service::orders::OrderWithItems,
            crate::service::users::Notification,
            crate::service::audit::AdminStats,
            crate::api::response::MessageData,
            crate::api::response::Pagination
        )
    ),
    tags(
        (name = "health", description = "Sondas de vida e prontidão"),
        (name = "auth", description = "Registro e login"),
        (name = "csrf", description = "Emissão de tokens CSRF de uso único"),
        (name = "users", description = "Perfil, endereços e lista de desejos"),
        (name = "notifications", description = "Notificações de status de pedidos"),
        (name = "stores", description = "Lojas dos vendedores"),
        (name = "products", description = "Catálogo público e gestão de produtos"),
        (name = "orders", description = "Pedidos e seu ciclo de vida"),
        (name = "plans", description = "Planos de assinatura"),
        (name = "subscriptions", description = "Assinaturas dos vendedores"),
        (name = "banners", description = "Banners da vitrine"),
        (name = "admin", description = "Operações administrativas (auditadas)")
    )
)]
struct ApiDoc;

pub fn routes(state: Arc<AppState>) -> Router {
    // 公开路由（不需要认证）
    let public_routes = Router::new()
        .route("/health", get(api_health)) // 简短别名，兼容探活脚本
        .route("/api/health", get(api_health))
        .route("/healthz", get(healthz))
        .route(
            "/metrics",
            get(|| async { crate::metrics::render_prometheus().into_response() }),
        )
        .merge(utoipa_swagger_ui::SwaggerUi::new("/docs").url("/openapi.json", ApiDoc::openapi()))
        .route("/api/csrf/token", get(issue_csrf_token))
        // 商城公开目录
        .route("/api/products", get(product_api::list_products))
        .route("/api/products/:id", get(product_api::get_product))
        .route("/api/stores/:slug", get(store_api::get_public_store))
        .route("/api/plans", get(plan_api::list_plans))
        .route("/api/banners", get(banner_api::list_banners))
        // 注册/登录（内部自带 Auth 级限流）
        .merge(auth_api::routes(state.clone()))
        .layer(
            ServiceBuilder::new()
                .layer(from_fn(cors_preflight))
                .layer(from_fn(set_request_id))
                .layer(from_fn(trace_log))
                .layer(from_fn(add_response_time_header))
                .layer(from_fn(add_security_headers))
                .layer(from_fn(add_cors_headers)),
        );

    // 需要认证的路由
    let protected_routes = Router::new()
        .merge(user_api::routes())
        .merge(user_api::notification_routes(state.clone()))
        .merge(store_api::routes())
        .merge(product_api::routes())
        .merge(order_api::routes())
        .merge(subscription_api::routes())
        // 管理端（内部叠加管理员守卫、Admin级限流与审计）
        .merge(admin_api::routes(state.clone()))
        // 变更请求的CSRF校验
        .layer(from_fn_with_state(state.clone(), csrf_middleware))
        // API级限流（按用户计数，因此在认证之后执行）
        .layer(from_fn_with_state(
            state.clone(),
            rate_limit(RateLimitClass::Api),
        ))
        // 认证中间件
        .layer(from_fn_with_state(state.clone(), auth_middleware))
        // 安全与观测中间件
        .layer(
            ServiceBuilder::new()
                .layer(from_fn(cors_preflight))
                .layer(from_fn(set_request_id))
                .layer(from_fn(trace_log))
                .layer(from_fn(add_response_time_header))
                .layer(from_fn(add_security_headers))
                .layer(from_fn(add_cors_headers)),
        );

    public_routes
        .merge(protected_routes)
        .fallback(not_found)
        .layer(tower_http::compression::CompressionLayer::new())
        .with_state(state)
}

async fn not_found() -> AppError {
    AppError::not_found("Rota não encontrada")
}

// ============ CORS ============

const DEFAULT_CORS_ORIGINS: &str = "http://localhost:3001,http://127.0.0.1:3001";

const DEFAULT_ALLOW_HEADERS: &str =
    "Content-Type, Authorization, X-CSRF-Token, X-Session-ID, X-Request-Id";

/// origin在允许列表（CORS_ALLOW_ORIGINS，逗号分隔）或FRONTEND_URL内则反射，
/// 否则不发CORS头（浏览器自行拦截）。"*"放行一切。
fn match_origin(origin: &str, allowlist: &str, frontend: Option<&str>) -> Option<String> {
    if allowlist.trim() == "*" {
        return Some("*".to_string());
    }
    if origin.is_empty() {
        return None;
    }
    if allowlist.split(',').any(|allowed| allowed.trim() == origin) {
        return Some(origin.to_string());
    }
    if let Some(frontend) = frontend {
        if frontend.trim_end_matches('/') == origin.trim_end_matches('/') {
            return Some(origin.to_string());
        }
    }
    None
}

fn resolve_origin(origin: &str) -> Option<String> {
    let allowlist =
        std::env::var("CORS_ALLOW_ORIGINS").unwrap_or_else(|_| DEFAULT_CORS_ORIGINS.into());
    let frontend = std::env::var("FRONTEND_URL").ok();
    match_origin(origin, &allowlist, frontend.as_deref())
}

/// OPTIONS预检直接应答，不进入认证/限流链
async fn cors_preflight(req: Request, next: Next) -> Response {
    if req.method() != Method::OPTIONS {
        return next.run(req).await;
    }

    let origin = req
        .headers()
        .get("origin")
        .and_then(|v| v.to_str().ok())
        .unwrap_or_default()
        .to_string();

    let requested_headers = req
        .headers()
        .get("access-control-request-headers")
        .and_then(|v| v.to_str().ok())
        .map(str::to_string);

    let mut resp = StatusCode::NO_CONTENT.into_response();
    let headers = resp.headers_mut();

    if let Some(allowed) = resolve_origin(&origin) {
        if let Ok(val) = HeaderValue::from_str(&allowed) {
            headers.insert(ACCESS_CONTROL_ALLOW_ORIGIN, val);
        }
    }
    headers.insert(
        ACCESS_CONTROL_ALLOW_METHODS,
        HeaderValue::from_static("GET,POST,PUT,PATCH,DELETE,OPTIONS"),
    );
    let allow_headers = requested_headers
        .and_then(|h| HeaderValue::from_str(&h).ok())
        .unwrap_or(HeaderValue::from_static(DEFAULT_ALLOW_HEADERS));
    headers.insert(ACCESS_CONTROL_ALLOW_HEADERS, allow_headers);
    headers.insert(ACCESS_CONTROL_MAX_AGE, HeaderValue::from_static("600"));
    resp
}

async fn add_cors_headers(req: Request, next: Next) -> Response {
    let origin = req
        .headers()
        .get("origin")
        .and_then(|v| v.to_str().ok())
        .unwrap_or_default()
        .to_string();

    let mut resp = next.run(req).await;

    if let Some(allowed) = resolve_origin(&origin) {
        if let Ok(val) = HeaderValue::from_str(&allowed) {
            resp.headers_mut().insert(ACCESS_CONTROL_ALLOW_ORIGIN, val);
        }
    }
    resp
}

// ============ 安全头与观测 ============

async fn add_security_headers(req: Request, next: Next) -> Response {
    let mut resp = next.run(req).await;
    let headers = resp.headers_mut();

    headers.insert(X_CONTENT_TYPE_OPTIONS, HeaderValue::from_static("nosniff"));
    headers.insert(X_FRAME_OPTIONS, HeaderValue::from_static("DENY"));
    headers.insert(REFERRER_POLICY, HeaderValue::from_static("no-referrer"));
    headers.insert(CACHE_CONTROL, HeaderValue::from_static("no-store"));
    headers.insert(PRAGMA, HeaderValue::from_static("no-cache"));
    headers.insert(
        CONTENT_SECURITY_POLICY,
        HeaderValue::from_static("default-src 'self'"),
    );
    // HSTS 仅在 HTTPS 部署时启用（HSTS_ENABLE=1）
    if std::env::var("HSTS_ENABLE")
        .ok()
        .map(|v| v == "1")
        .unwrap_or(false)
    {
        headers.insert(
            "strict-transport-security",
            HeaderValue::from_static("max-age=31536000"),
        );
    }
    resp
}

/// 请求ID：沿用调用方传入的x-request-id，否则生成UUID；请求与响应都带上
async fn set_request_id(mut req: Request, next: Next) -> Response {
    let req_id = req
        .headers()
        .get("x-request-id")
        .and_then(|h| h.to_str().ok())
        .filter(|v| !v.is_empty() && v.len() <= 64)
        .map(str::to_string)
        .unwrap_or_else(|| Uuid::new_v4().to_string());

    let header_val =
        HeaderValue::from_str(&req_id).unwrap_or(HeaderValue::from_static("gen-failed"));
    req.headers_mut().insert("x-request-id", header_val.clone());

    let mut resp = next.run(req).await;
    resp.headers_mut().insert("x-request-id", header_val);
    resp
}

async fn add_response_time_header(req: Request, next: Next) -> Response {
    let start = Instant::now();
    let mut resp = next.run(req).await;
    let elapsed_ms = start.elapsed().as_millis().to_string();
    resp.headers_mut().insert(
        "x-response-time",
        HeaderValue::from_str(&format!("{}ms", elapsed_ms))
            .unwrap_or(HeaderValue::from_static("0ms")),
    );
    resp
}

async fn trace_log(req: Request, next: Next) -> Response {
    let method = req.method().clone();
    let path = req.uri().path().to_string();
    let start = Instant::now();
    let req_id = req
        .headers()
        .get("x-request-id")
        .and_then(|h| h.to_str().ok())
        .unwrap_or("-")
        .to_string();
    let resp = next.run(req).await;
    let status = resp.status();
    let elapsed = start.elapsed().as_millis();
    tracing::event!(Level::INFO, request_id=%req_id, method=%method, path=%path, status=%status.as_u16(), elapsed_ms=%elapsed, "http_request");
    resp
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_match_origin_allowlist() {
        let allow = "http://localhost:3001,https://loja.example.com";
        assert_eq!(
            match_origin("https://loja.example.com", allow, None),
            Some("https://loja.example.com".to_string())
        );
        assert_eq!(match_origin("https://evil.example.com", allow, None), None);
        assert_eq!(match_origin("", allow, None), None);
    }

    #[test]
    fn test_match_origin_wildcard_and_frontend() {
        assert_eq!(
            match_origin("https://qualquer.com", "*", None),
            Some("*".to_string())
        );
        // FRONTEND_URL也算放行来源，末尾斜杠不影响匹配
        assert_eq!(
            match_origin(
                "https://app.example.com",
                "http://localhost:3001",
                Some("https://app.example.com/")
            ),
            Some("https://app.example.com".to_string())
        );
    }
}
