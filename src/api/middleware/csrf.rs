//! CSRF防护中间件
//! 单次使用令牌：签发端点 + 变更请求校验

use std::{sync::Arc, time::Duration};

use axum::{
    body::Body,
    extract::{Request, State},
    http::{header::AUTHORIZATION, HeaderMap, Method},
    middleware::Next,
    response::Response,
    Json,
};
use serde::Serialize;
use utoipa::ToSchema;

use crate::{
    app_state::AppState,
    error::AppError,
    infrastructure::{csrf_store::DEFAULT_TOKEN_TTL_SECS, jwt},
    metrics,
};

use super::{auth::AuthUser, client_ip};

/// 测试令牌白名单，仅在TEST_MODE下生效
const TEST_TOKENS: &[&str] = &["test-csrf-token", "test-csrf-bypass"];

/// 校验豁免的公开商品列表路径（只读流量）
const PUBLIC_LISTING_PATH: &str = "/api/products";

const CSRF_HEADER: &str = "X-CSRF-Token";
const SESSION_HEADER: &str = "X-Session-ID";

/// 请求体中携带令牌的字段名
const BODY_TOKEN_FIELD: &str = "_csrfToken";

#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CsrfTokenResponse {
    pub csrf_token: String,
    /// 有效期（秒）
    pub expires_in: u64,
}

/// GET /api/csrf/token
///
/// 公开端点；会话标识取已认证用户、X-Session-ID头或客户端IP。
#[utoipa::path(
    get,
    path = "/api/csrf/token",
    tag = "csrf",
    responses((status = 200, description = "Novo token CSRF", body = CsrfTokenResponse))
)]
pub async fn issue_csrf_token(
    State(st): State<Arc<AppState>>,
    headers: HeaderMap,
) -> Result<Json<CsrfTokenResponse>, AppError> {
    let session = session_id(&headers, None);
    let ttl = Duration::from_secs(DEFAULT_TOKEN_TTL_SECS);

    let token = st.csrf.issue(&session, ttl).await.map_err(|e| {
        tracing::error!(error = %e, "csrf: falha ao emitir token");
        AppError::internal("Erro ao gerar token CSRF")
    })?;

    Ok(Json(CsrfTokenResponse {
        csrf_token: token,
        expires_in: DEFAULT_TOKEN_TTL_SECS,
    }))
}

/// CSRF校验中间件（挂在需要认证的路由组上）
///
/// 豁免顺序：测试令牌（仅TEST_MODE）→ 公开商品列表GET → 安全方法。
/// 其余变更请求必须携带有效令牌，令牌命中即删除（单次使用）。
pub async fn csrf_middleware(
    State(st): State<Arc<AppState>>,
    req: Request,
    next: Next,
) -> Result<Response, AppError> {
    let header_token = req
        .headers()
        .get(CSRF_HEADER)
        .and_then(|h| h.to_str().ok())
        .map(|s| s.to_string());

    // 1. 测试令牌白名单（仅TEST_MODE）
    if st.config.security.test_mode {
        if let Some(ref token) = header_token {
            if TEST_TOKENS.contains(&token.as_str()) {
                return Ok(next.run(req).await);
            }
        }
    }

    // 2. 公开商品列表GET豁免
    if req.method() == Method::GET && req.uri().path().starts_with(PUBLIC_LISTING_PATH) {
        return Ok(next.run(req).await);
    }

    // 3. 安全方法豁免
    if matches!(
        *req.method(),
        Method::GET | Method::HEAD | Method::OPTIONS
    ) {
        return Ok(next.run(req).await);
    }

    let session = session_id(req.headers(), req.extensions().get::<AuthUser>());

    // 4. 取令牌：优先头部，其次JSON体的_csrfToken字段（需缓冲body）
    let (req, token) = match header_token {
        Some(token) => (req, Some(token)),
        None => body_token(req).await?,
    };

    let valid = match token {
        Some(ref token) => st.csrf.consume(&session, token).await.map_err(|e| {
            tracing::error!(error = %e, "csrf: falha ao validar token");
            AppError::internal("Erro ao validar token CSRF")
        })?,
        None => false,
    };

    if !valid {
        metrics::inc_csrf_rejected();
        tracing::warn!(
            method = %req.method(),
            path = %req.uri().path(),
            "csrf: token ausente, inválido ou já utilizado"
        );
        return Err(AppError::csrf_invalid("Token CSRF inválido ou expirado"));
    }

    Ok(next.run(req).await)
}

/// 会话标识：已认证用户 > Bearer可解码的用户 > X-Session-ID > 客户端IP
///
/// 签发端点挂在公开路由组（无auth中间件），因此直接解码Bearer，
/// 保证同一客户端在签发和校验两侧落到同一会话。
fn session_id(headers: &HeaderMap, auth: Option<&AuthUser>) -> String {
    if let Some(user) = auth {
        return format!("user:{}", user.id);
    }

    if let Some(claims) = headers
        .get(AUTHORIZATION)
        .and_then(|h| h.to_str().ok())
        .and_then(|h| h.strip_prefix("Bearer "))
        .and_then(|t| jwt::verify_token(t.trim()).ok())
    {
        return format!("user:{}", claims.user_id);
    }

    if let Some(sid) = headers.get(SESSION_HEADER).and_then(|h| h.to_str().ok()) {
        if !sid.is_empty() {
            return format!("sid:{}", sid);
        }
    }

    format!("ip:{}", client_ip(headers))
}

/// 缓冲JSON体并提取顶层_csrfToken；body原样重建回请求
async fn body_token(req: Request) -> Result<(Request, Option<String>), AppError> {
    let is_json = req
        .headers()
        .get(axum::http::header::CONTENT_TYPE)
        .and_then(|h| h.to_str().ok())
        .map(|ct| ct.starts_with("application/json"))
        .unwrap_or(false);

    if !is_json {
        return Ok((req, None));
    }

    let (parts, body) = req.into_parts();
    let bytes = axum::body::to_bytes(body, usize::MAX)
        .await
        .map_err(|_| AppError::bad_request("Corpo da requisição inválido"))?;

    let token = serde_json::from_slice::<serde_json::Value>(&bytes)
        .ok()
        .and_then(|v| {
            v.get(BODY_TOKEN_FIELD)
                .and_then(|t| t.as_str())
                .map(|t| t.to_string())
        });

    let req = Request::from_parts(parts, Body::from(bytes));
    Ok((req, token))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_session_id_prefers_session_header_over_ip() {
        let mut headers = HeaderMap::new();
        headers.insert(SESSION_HEADER, "sess-42".parse().unwrap());
        headers.insert("X-Forwarded-For", "10.0.0.9".parse().unwrap());
        assert_eq!(session_id(&headers, None), "sid:sess-42");
    }

    #[test]
    fn test_session_id_falls_back_to_ip() {
        let mut headers = HeaderMap::new();
        headers.insert("X-Forwarded-For", "10.0.0.9, 172.16.0.1".parse().unwrap());
        assert_eq!(session_id(&headers, None), "ip:10.0.0.9");

        assert_eq!(session_id(&HeaderMap::new(), None), "ip:unknown");
    }

    #[test]
    fn test_session_id_prefers_authenticated_user() {
        let user = AuthUser {
            id: uuid::Uuid::new_v4(),
            email: "a@b.c".to_string(),
            role: crate::domain::Role::Buyer,
        };
        let mut headers = HeaderMap::new();
        headers.insert(SESSION_HEADER, "sess-42".parse().unwrap());
        assert_eq!(
            session_id(&headers, Some(&user)),
            format!("user:{}", user.id)
        );
    }

    #[tokio::test]
    async fn test_body_token_extraction_preserves_body() {
        let req = axum::http::Request::builder()
            .method(Method::POST)
            .uri("/api/orders")
            .header(axum::http::header::CONTENT_TYPE, "application/json")
            .body(Body::from(r#"{"_csrfToken":"tok123","items":[]}"#))
            .unwrap();

        let (req, token) = body_token(req).await.unwrap();
        assert_eq!(token.as_deref(), Some("tok123"));

        let bytes = axum::body::to_bytes(req.into_body(), usize::MAX)
            .await
            .unwrap();
        assert_eq!(&bytes[..], br#"{"_csrfToken":"tok123","items":[]}"#);
    }
}
