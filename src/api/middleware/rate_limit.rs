//! 分级速率限制中间件
//! 固定窗口计数，按路由组分级（认证、API、上传、管理、通知）

use std::{future::Future, pin::Pin, sync::Arc, time::Duration};

use axum::{
    extract::{Request, State},
    http::{header::USER_AGENT, HeaderValue},
    middleware::Next,
    response::Response,
};

use crate::{
    app_state::AppState,
    config::ClassLimit,
    domain::Role,
    error::AppError,
    metrics,
};

use super::{auth::AuthUser, client_ip};

/// 合成测试流量的User-Agent前缀，跳过限流
const TEST_UA_PREFIX: &str = "marketcore-test";

/// 路由组限流分级
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RateLimitClass {
    /// 登录/注册：窗口小、上限低，暴力破解防护
    Auth,
    /// 通用API
    Api,
    /// 上传类端点
    Upload,
    /// 管理后台
    Admin,
    /// 通知轮询
    Notifications,
}

impl RateLimitClass {
    pub fn key_prefix(&self) -> &'static str {
        match self {
            Self::Auth => "auth",
            Self::Api => "api",
            Self::Upload => "upload",
            Self::Admin => "admin",
            Self::Notifications => "notifications",
        }
    }

    /// 本级的窗口配置（config可覆盖默认值）
    fn limit(&self, st: &AppState) -> ClassLimit {
        let cfg = &st.config.rate_limit;
        match self {
            Self::Auth => cfg.auth,
            Self::Api => cfg.api,
            Self::Upload => cfg.upload,
            Self::Admin => cfg.admin,
            Self::Notifications => cfg.notifications,
        }
    }

    fn exceeded_error(&self) -> AppError {
        match self {
            Self::Auth => AppError::auth_rate_limited(
                "Muitas tentativas de autenticação. Tente novamente mais tarde.",
            ),
            _ => AppError::rate_limited("Muitas requisições. Tente novamente mais tarde."),
        }
    }
}

type RateLimitFuture = Pin<Box<dyn Future<Output = Result<Response, AppError>> + Send>>;

/// 按分级构造限流中间件
///
/// ```rust,ignore
/// .layer(middleware::from_fn_with_state(state, rate_limit(RateLimitClass::Auth)))
/// ```
pub fn rate_limit(
    class: RateLimitClass,
) -> impl Fn(State<Arc<AppState>>, Request, Next) -> RateLimitFuture + Clone {
    move |State(st): State<Arc<AppState>>, req: Request, next: Next| {
        Box::pin(enforce(class, st, req, next))
    }
}

async fn enforce(
    class: RateLimitClass,
    st: Arc<AppState>,
    req: Request,
    next: Next,
) -> Result<Response, AppError> {
    if skip_rate_limit(class, &st, &req) {
        return Ok(next.run(req).await);
    }

    let limit = class.limit(&st);
    let key = rate_limit_key(class, &req);

    // 存储不可用时放行：限流是保护手段，不能变成单点故障
    let counted = st
        .rate_limiter
        .incr(&key, Duration::from_secs(limit.window_secs))
        .await;

    let (count, remaining_secs) = match counted {
        Ok(pair) => pair,
        Err(e) => {
            tracing::error!(error = %e, key = %key, "rate limit: armazenamento indisponível");
            return Ok(next.run(req).await);
        }
    };

    if count > limit.max_requests {
        metrics::inc_rate_limited();
        tracing::warn!(
            key = %key,
            count,
            max = limit.max_requests,
            window_secs = limit.window_secs,
            "rate limit excedido"
        );
        return Err(class.exceeded_error());
    }

    let mut response = next.run(req).await;
    let headers = response.headers_mut();
    headers.insert("X-RateLimit-Limit", numeric_header(limit.max_requests));
    headers.insert(
        "X-RateLimit-Remaining",
        numeric_header(limit.max_requests.saturating_sub(count)),
    );
    headers.insert(
        "X-RateLimit-Reset",
        numeric_header((chrono::Utc::now().timestamp() as u64).saturating_add(remaining_secs)),
    );

    Ok(response)
}

fn numeric_header(v: u64) -> HeaderValue {
    v.to_string()
        .parse()
        .unwrap_or_else(|_| HeaderValue::from_static("0"))
}

/// 限流key：已认证用户按用户ID，匿名按客户端IP
fn rate_limit_key(class: RateLimitClass, req: &Request) -> String {
    if let Some(user) = req.extensions().get::<AuthUser>() {
        return format!("{}:user:{}", class.key_prefix(), user.id);
    }
    format!("{}:ip:{}", class.key_prefix(), client_ip(req.headers()))
}

/// 豁免判定：测试模式、合成测试UA、非生产环境下API级的管理员
fn skip_rate_limit(class: RateLimitClass, st: &AppState, req: &Request) -> bool {
    if st.config.security.test_mode {
        return true;
    }

    if req
        .headers()
        .get(USER_AGENT)
        .and_then(|h| h.to_str().ok())
        .map(|ua| ua.starts_with(TEST_UA_PREFIX))
        .unwrap_or(false)
    {
        return true;
    }

    if class == RateLimitClass::Api && !st.config.server.production {
        if let Some(user) = req.extensions().get::<AuthUser>() {
            if user.role == Role::Admin {
                return true;
            }
        }
    }

    false
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::Body;

    #[test]
    fn test_rate_limit_key_uses_ip_for_anonymous() {
        let req = axum::http::Request::builder()
            .uri("/api/auth/login")
            .header("X-Forwarded-For", "203.0.113.7")
            .body(Body::empty())
            .unwrap();
        assert_eq!(
            rate_limit_key(RateLimitClass::Auth, &req),
            "auth:ip:203.0.113.7"
        );
    }

    #[test]
    fn test_rate_limit_key_prefers_user_id() {
        let user = AuthUser {
            id: uuid::Uuid::new_v4(),
            email: "a@b.c".to_string(),
            role: Role::Buyer,
        };
        let mut req = axum::http::Request::builder()
            .uri("/api/orders")
            .header("X-Forwarded-For", "203.0.113.7")
            .body(Body::empty())
            .unwrap();
        req.extensions_mut().insert(user.clone());
        assert_eq!(
            rate_limit_key(RateLimitClass::Api, &req),
            format!("api:user:{}", user.id)
        );
    }

    #[test]
    fn test_class_key_prefixes_are_distinct() {
        let classes = [
            RateLimitClass::Auth,
            RateLimitClass::Api,
            RateLimitClass::Upload,
            RateLimitClass::Admin,
            RateLimitClass::Notifications,
        ];
        for (i, a) in classes.iter().enumerate() {
            for b in &classes[i + 1..] {
                assert_ne!(a.key_prefix(), b.key_prefix());
            }
        }
    }
}
