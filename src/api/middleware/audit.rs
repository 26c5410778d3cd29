//! 管理操作审计中间件
//!
//! 工厂按 (action, resource) 生成路由级中间件，包装管理端的变更端点。
//! 每个被包装的请求恰好入队一条审计记录；入队永不阻塞请求，
//! 写入失败只计数和告警，客户端响应原样返回。

use std::{future::Future, pin::Pin, sync::Arc, time::Instant};

use axum::{
    body::{Body, Bytes},
    extract::{FromRequestParts, RawPathParams, Request, State},
    http::{header::USER_AGENT, Method},
    middleware::Next,
    response::Response,
};
use serde_json::{json, Value};

use crate::{
    app_state::AppState, error::AppError, repository::audit_logs::NewAuditLog,
};

use super::{auth::AuthUser, client_ip};

/// details里记录的请求体上限；超过则只记录占位说明
const MAX_RECORDED_BODY_BYTES: usize = 64 * 1024;

/// 失败响应载荷记录上限
const MAX_ERROR_PAYLOAD_BYTES: usize = 2 * 1024;

const REDACTED: &str = "[REDACTED]";

type AuditFuture = Pin<Box<dyn Future<Output = Result<Response, AppError>> + Send>>;

/// 审计中间件工厂
///
/// ```rust,ignore
/// .route("/users/:id", put(update_user)
///     .layer(middleware::from_fn_with_state(state, audit("update", "user"))))
/// ```
pub fn audit(
    action: &'static str,
    resource: &'static str,
) -> impl Fn(State<Arc<AppState>>, Request, Next) -> AuditFuture + Clone {
    move |State(st): State<Arc<AppState>>, req: Request, next: Next| {
        Box::pin(run_audited(st, action, resource, req, next))
    }
}

async fn run_audited(
    st: Arc<AppState>,
    action: &'static str,
    resource: &'static str,
    req: Request,
    next: Next,
) -> Result<Response, AppError> {
    let started = Instant::now();
    let method = req.method().clone();
    let path = req.uri().path().to_string();
    let query = query_object(req.uri().query());
    let ip = client_ip(req.headers());
    let user_agent = req
        .headers()
        .get(USER_AGENT)
        .and_then(|h| h.to_str().ok())
        .map(|ua| ua.to_string());

    // 管理员身份由前置的auth+rbac中间件保证；缺失说明栈装配错了，
    // 此时只放行请求并告警，不产生无主的审计记录
    let admin = match req.extensions().get::<AuthUser>().cloned() {
        Some(admin) => admin,
        None => {
            tracing::warn!(
                action,
                resource,
                path = %path,
                "auditoria: requisição sem usuário autenticado, registro ignorado"
            );
            return Ok(next.run(req).await);
        }
    };

    let (mut parts, body) = req.into_parts();
    let params = path_params(&mut parts).await;
    let resource_id = params
        .get("id")
        .and_then(|v| v.as_str())
        .map(|s| s.to_string());

    // GET不缓冲请求体
    let (body, recorded_body) = if method == Method::GET {
        (body, None)
    } else {
        let bytes = axum::body::to_bytes(body, usize::MAX)
            .await
            .map_err(|_| AppError::bad_request("Corpo da requisição inválido"))?;
        let recorded = record_body(&bytes);
        (Body::from(bytes), recorded)
    };
    let req = Request::from_parts(parts, body);

    let response = next.run(req).await;
    let elapsed_ms = started.elapsed().as_millis() as u64;

    let status = response.status();
    let success = status.is_success() || status.is_redirection();

    let (response, error_message) = if success {
        (response, None)
    } else {
        capture_error_payload(response).await
    };

    let mut details = json!({
        "method": method.as_str(),
        "path": path,
        "params": Value::Object(params),
        "query": query,
        "status": status.as_u16(),
        "elapsedMs": elapsed_ms,
    });
    if let Some(mut body) = recorded_body {
        redact_password(&mut body);
        details["body"] = body;
    }

    st.audit.record(NewAuditLog {
        admin_id: admin.id,
        admin_name: admin.email,
        action: action.to_string(),
        resource: resource.to_string(),
        resource_id,
        details,
        ip_address: Some(ip),
        user_agent,
        success,
        error_message,
    });

    Ok(response)
}

/// 路由捕获参数；没有捕获的路由返回空对象
async fn path_params(parts: &mut axum::http::request::Parts) -> serde_json::Map<String, Value> {
    match RawPathParams::from_request_parts(parts, &()).await {
        Ok(params) => params
            .iter()
            .map(|(k, v)| (k.to_string(), Value::String(v.to_string())))
            .collect(),
        Err(_) => serde_json::Map::new(),
    }
}

fn query_object(query: Option<&str>) -> Value {
    let mut map = serde_json::Map::new();
    if let Some(q) = query {
        for (k, v) in url::form_urlencoded::parse(q.as_bytes()) {
            map.insert(k.into_owned(), Value::String(v.into_owned()));
        }
    }
    Value::Object(map)
}

/// 请求体转成可记录的JSON；非JSON体按文本截断记录
fn record_body(bytes: &Bytes) -> Option<Value> {
    if bytes.is_empty() {
        return None;
    }
    if bytes.len() > MAX_RECORDED_BODY_BYTES {
        return Some(json!({
            "omitted": format!("corpo de {} bytes excede o limite de registro", bytes.len())
        }));
    }
    match serde_json::from_slice::<Value>(bytes) {
        Ok(v) => Some(v),
        Err(_) => Some(Value::String(
            String::from_utf8_lossy(bytes).into_owned(),
        )),
    }
}

/// 只遮蔽顶层password字段；嵌套对象内的字段原样通过
fn redact_password(body: &mut Value) {
    if let Some(obj) = body.as_object_mut() {
        if let Some(p) = obj.get_mut("password") {
            *p = Value::String(REDACTED.to_string());
        }
    }
}

/// 缓冲失败响应以提取错误载荷，然后原样重建响应
async fn capture_error_payload(response: Response) -> (Response, Option<String>) {
    let (parts, body) = response.into_parts();
    match axum::body::to_bytes(body, usize::MAX).await {
        Ok(bytes) => {
            let truncated = &bytes[..bytes.len().min(MAX_ERROR_PAYLOAD_BYTES)];
            let message = if truncated.is_empty() {
                None
            } else {
                Some(String::from_utf8_lossy(truncated).into_owned())
            };
            (Response::from_parts(parts, Body::from(bytes)), message)
        }
        Err(e) => {
            tracing::warn!(error = %e, "auditoria: falha ao ler payload de erro");
            let status = parts.status;
            (
                Response::from_parts(parts, Body::empty()),
                Some(format!("status {}", status)),
            )
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_redacts_top_level_password_only() {
        let mut body = json!({
            "email": "ana@example.com",
            "password": "s3nh4-secreta",
            "profile": { "password": "aninhada-passa-direto" }
        });
        redact_password(&mut body);

        assert_eq!(body["password"], REDACTED);
        assert_eq!(body["email"], "ana@example.com");
        // 嵌套字段不处理
        assert_eq!(body["profile"]["password"], "aninhada-passa-direto");
    }

    #[test]
    fn test_redact_ignores_non_object_bodies() {
        let mut body = Value::String("texto plano".to_string());
        redact_password(&mut body);
        assert_eq!(body, Value::String("texto plano".to_string()));
    }

    #[test]
    fn test_query_object_decodes_percent_encoding() {
        let q = query_object(Some("search=caf%C3%A9&page=2"));
        assert_eq!(q["search"], "café");
        assert_eq!(q["page"], "2");

        assert_eq!(query_object(None), json!({}));
    }

    #[test]
    fn test_record_body_caps_large_payloads() {
        let big = Bytes::from(vec![b'x'; MAX_RECORDED_BODY_BYTES + 1]);
        let recorded = record_body(&big).unwrap();
        assert!(recorded["omitted"].as_str().unwrap().contains("65537"));

        assert!(record_body(&Bytes::new()).is_none());

        let json_body = Bytes::from_static(br#"{"name":"Plano Pro"}"#);
        assert_eq!(record_body(&json_body).unwrap()["name"], "Plano Pro");
    }
}
