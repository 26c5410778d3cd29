//! 生产级集成测试套件
//!
//! 测试覆盖：
//! - ✅ 配置加载和验证
//! - ✅ 安全功能（密码哈希、JWT）
//! - ✅ 监控和指标
//! - ✅ HTTP中间件栈（认证、RBAC、CSRF、限流、CORS、观测头），离线运行，不依赖外部服务
//! - ✅ 端到端流程（注册、登录、地址、审计），需要数据库，标记 #[ignore]
//!
//! 运行方式：
//! ```bash
//! cargo test --test integration_test
//! TEST_DATABASE_URL=postgres://... cargo test --test integration_test -- --ignored
//! ```

mod common;

use axum::{
    body::Body,
    http::{header, Request, StatusCode},
};
use marketcore::domain::Role;
use serde_json::json;
use tower::ServiceExt as _; // for oneshot()

// ============ 配置管理测试 ============

/// Test 1.1: 配置加载
#[tokio::test]
async fn test_config_loading() {
    common::init_test_env();

    let config = marketcore::config::Config::from_env();
    assert!(config.is_ok(), "Config loading should succeed");

    let cfg = config.unwrap();
    assert!(
        cfg.jwt.secret.len() >= 32,
        "JWT secret should be at least 32 chars"
    );
    assert_eq!(cfg.security.csrf_store, "memory");
}

/// Test 1.2: 配置验证
#[tokio::test]
async fn test_config_validation() {
    let config = common::offline_config(false);
    assert!(
        config.validate().is_ok(),
        "Offline test config should be valid"
    );

    let mut invalid = common::offline_config(false);
    invalid.jwt.secret = "short".to_string();
    assert!(
        invalid.validate().is_err(),
        "Short JWT secret should fail validation"
    );

    let mut invalid = common::offline_config(false);
    invalid.rate_limit.api.max_requests = 0;
    assert!(
        invalid.validate().is_err(),
        "Zero rate limit quota should fail validation"
    );
}

// ============ 安全功能测试 ============

/// Test 2.1: 密码哈希（bcrypt）
#[tokio::test]
async fn test_password_hashing() {
    use marketcore::infrastructure::password;

    let password = "Senha123forte";
    let hash = password::hash_password(password).unwrap();

    assert!(hash.starts_with("$2"), "Should use bcrypt");
    assert!(
        password::verify_password(password, &hash).unwrap(),
        "Correct password should verify"
    );
    assert!(
        !password::verify_password("senha-errada", &hash).unwrap(),
        "Wrong password should fail"
    );

    let hash2 = password::hash_password(password).unwrap();
    assert_ne!(hash, hash2, "Each hash should have unique salt");
}

/// Test 2.2: JWT 生成和验证
#[tokio::test]
async fn test_jwt_token() {
    common::init_test_env();

    use marketcore::infrastructure::jwt;
    use uuid::Uuid;

    let user_id = Uuid::new_v4();
    let token = jwt::generate_token(user_id, "vendedor@example.com", Role::Seller).unwrap();
    assert_eq!(token.split('.').count(), 3, "JWT should have 3 parts");

    let claims = jwt::verify_token(&token).unwrap();
    assert_eq!(claims.user_id, user_id, "User ID should match");
    assert_eq!(claims.role().unwrap(), Role::Seller, "Role should match");
    assert!(
        claims.exp > chrono::Utc::now().timestamp(),
        "Token should not be expired"
    );
}

/// Test 2.3: 无效JWT拒绝
#[tokio::test]
async fn test_jwt_invalid_token() {
    common::init_test_env();

    use marketcore::infrastructure::jwt;

    assert!(
        jwt::verify_token("invalid.token.format").is_err(),
        "Invalid token should be rejected"
    );

    let valid = jwt::generate_token(uuid::Uuid::new_v4(), "c@example.com", Role::Buyer).unwrap();
    let tampered = valid.replace('a', "b");
    assert!(
        jwt::verify_token(&tampered).is_err(),
        "Tampered token should be rejected"
    );
}

// ============ 监控和指标测试 ============

/// Test 3.1: Prometheus 指标渲染
#[tokio::test]
async fn test_metrics_rendering() {
    use marketcore::metrics;

    metrics::count_ok("test_endpoint");
    metrics::count_err("test_endpoint");

    let output = metrics::render_prometheus();
    assert!(
        output.contains("marketcore_requests_total"),
        "Should contain request counter"
    );
    assert!(
        output.contains("marketcore_errors_total"),
        "Should contain error counter"
    );
    assert!(output.contains("# TYPE"), "Should have TYPE declarations");
    assert!(output.contains("# HELP"), "Should have HELP text");
}

/// Test 3.2: /metrics 端点公开可达
#[tokio::test]
async fn test_metrics_endpoint_over_http() {
    let app = common::offline_app(false).await;

    let resp = app
        .oneshot(
            Request::builder()
                .uri("/metrics")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(resp.status(), StatusCode::OK);
    let bytes = axum::body::to_bytes(resp.into_body(), usize::MAX)
        .await
        .unwrap();
    let text = String::from_utf8_lossy(&bytes);
    assert!(text.contains("marketcore_requests_total"));
}

// ============ HTTP栈：健康与路由 ============

/// Test 4.1: 公开健康检查返回统一信封
#[tokio::test]
async fn test_public_health_endpoint() {
    let app = common::offline_app(false).await;

    let resp = app
        .oneshot(
            Request::builder()
                .uri("/api/health")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(resp.status(), StatusCode::OK);
    assert!(
        resp.headers().contains_key("x-request-id"),
        "Observability stack should stamp a request id"
    );
    assert!(resp.headers().contains_key("x-response-time"));

    let body = common::body_json(resp).await;
    assert_eq!(body["success"], true);
    assert_eq!(body["data"]["status"], "ok");
}

/// Test 4.2: 深探活在数据库不可达时降级而不是失败
#[tokio::test]
async fn test_healthz_reports_degraded_without_database() {
    let app = common::offline_app(false).await;

    let resp = app
        .oneshot(
            Request::builder()
                .uri("/healthz")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(
        resp.status(),
        StatusCode::OK,
        "Liveness must never 500 on DB outage"
    );
    let body = common::body_json(resp).await;
    assert_eq!(body["data"]["db_ok"], false);
    assert_eq!(body["data"]["status"], "degraded");
}

/// Test 4.3: 未知路由返回统一错误信封
#[tokio::test]
async fn test_unknown_route_returns_error_envelope() {
    let app = common::offline_app(false).await;

    let resp = app
        .oneshot(
            Request::builder()
                .uri("/api/rota-inexistente")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(resp.status(), StatusCode::NOT_FOUND);
    let body = common::body_json(resp).await;
    assert_eq!(body["success"], false);
    assert_eq!(body["error"]["code"], "NOT_FOUND");
}

/// Test 4.4: 请求ID贯穿与安全响应头
#[tokio::test]
async fn test_request_id_and_security_headers() {
    let app = common::offline_app(false).await;

    // 调用方带的请求ID原样回传
    let resp = app
        .clone()
        .oneshot(
            Request::builder()
                .uri("/api/health")
                .header("x-request-id", "req-abc-123")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(
        resp.headers().get("x-request-id").unwrap(),
        "req-abc-123",
        "Incoming request id should be echoed"
    );

    assert_eq!(
        resp.headers().get("x-content-type-options").unwrap(),
        "nosniff"
    );
    assert_eq!(resp.headers().get("x-frame-options").unwrap(), "DENY");
    assert_eq!(resp.headers().get("cache-control").unwrap(), "no-store");

    // 没带则生成
    let resp = app
        .oneshot(
            Request::builder()
                .uri("/api/health")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert!(!resp
        .headers()
        .get("x-request-id")
        .unwrap()
        .to_str()
        .unwrap()
        .is_empty());
}

// ============ HTTP栈：认证与RBAC ============

/// Test 5.1: 受保护路由先于任何数据库访问拒绝匿名请求
#[tokio::test]
async fn test_protected_route_requires_token() {
    // 连接池指向未监听端口：若认证链触库，这里只会看到500
    let app = common::offline_app(false).await;

    let resp = app
        .clone()
        .oneshot(
            Request::builder()
                .uri("/api/users/profile")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);
    let body = common::body_json(resp).await;
    assert_eq!(body["error"]["code"], "AUTH_REQUIRED");

    let resp = app
        .oneshot(
            Request::builder()
                .uri("/api/users/profile")
                .header(header::AUTHORIZATION, "Bearer lixo.invalido.abc")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);
    let body = common::body_json(resp).await;
    assert_eq!(body["error"]["code"], "INVALID_TOKEN");
}

/// Test 5.2: 管理路由树对非管理员一律403
#[tokio::test]
async fn test_admin_tree_forbidden_for_buyer() {
    let app = common::offline_app(false).await;
    let (_, auth) = common::bearer(Role::Buyer);

    let resp = app
        .oneshot(
            Request::builder()
                .uri("/api/admin/users")
                .header(header::AUTHORIZATION, &auth)
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(resp.status(), StatusCode::FORBIDDEN);
    let body = common::body_json(resp).await;
    assert_eq!(body["error"]["code"], "FORBIDDEN");
    assert_eq!(body["error"]["details"]["required"][0], "ADMIN");
    assert_eq!(body["error"]["details"]["actual"], "BUYER");
}

/// Test 5.3: 店铺创建要求卖家角色（校验先于数据库）
#[tokio::test]
async fn test_store_creation_forbidden_for_buyer() {
    let app = common::offline_app(true).await;
    let (_, auth) = common::bearer(Role::Buyer);

    let resp = app
        .oneshot(
            Request::builder()
                .method("POST")
                .uri("/api/stores")
                .header(header::AUTHORIZATION, &auth)
                .header("X-CSRF-Token", "test-csrf-token")
                .header(header::CONTENT_TYPE, "application/json")
                .body(common::json_body(&json!({"name": "Loja do Comprador"})))
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(resp.status(), StatusCode::FORBIDDEN);
    let body = common::body_json(resp).await;
    assert_eq!(body["error"]["details"]["required"][0], "SELLER");
}

// ============ HTTP栈：CSRF ============

/// Test 6.1: 无令牌的变更请求被拒绝
#[tokio::test]
async fn test_csrf_blocks_mutations_without_token() {
    let app = common::offline_app(false).await;
    let (_, auth) = common::bearer(Role::Buyer);

    let resp = app
        .oneshot(
            Request::builder()
                .method("POST")
                .uri("/api/users/addresses")
                .header(header::AUTHORIZATION, &auth)
                .header(header::CONTENT_TYPE, "application/json")
                .body(common::json_body(&json!({})))
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(resp.status(), StatusCode::FORBIDDEN);
    let body = common::body_json(resp).await;
    assert_eq!(body["error"]["code"], "CSRF_INVALID");
}

/// Test 6.2: 令牌单次使用，签发后消费一次即失效
#[tokio::test]
async fn test_csrf_token_single_use() {
    let app = common::offline_app(false).await;
    let (_, auth) = common::bearer(Role::Buyer);

    // 签发端点是公开路由；Bearer保证签发与校验落在同一会话
    let resp = app
        .clone()
        .oneshot(
            Request::builder()
                .uri("/api/csrf/token")
                .header(header::AUTHORIZATION, &auth)
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::OK);
    let issued = common::body_json(resp).await;
    let token = issued["csrfToken"].as_str().unwrap().to_string();
    assert_eq!(issued["expiresIn"], 1800);

    let mutation = |token: &str| {
        Request::builder()
            .method("POST")
            .uri("/api/users/addresses")
            .header(header::AUTHORIZATION, &auth)
            .header("X-CSRF-Token", token)
            .header(header::CONTENT_TYPE, "application/json")
            .body(common::json_body(&json!({})))
            .unwrap()
    };

    // 第一次：CSRF通过，请求体缺字段在handler的反序列化处失败
    let resp = app.clone().oneshot(mutation(&token)).await.unwrap();
    assert_eq!(
        resp.status(),
        StatusCode::UNPROCESSABLE_ENTITY,
        "First use must pass CSRF and die at payload validation"
    );

    // 第二次：同一令牌已被消费
    let resp = app.oneshot(mutation(&token)).await.unwrap();
    assert_eq!(resp.status(), StatusCode::FORBIDDEN);
    let body = common::body_json(resp).await;
    assert_eq!(body["error"]["code"], "CSRF_INVALID");
}

/// Test 6.3: 测试令牌白名单只在测试模式生效
#[tokio::test]
async fn test_csrf_test_tokens_only_in_test_mode() {
    let (_, auth) = common::bearer(Role::Buyer);
    let request = || {
        Request::builder()
            .method("PUT")
            .uri("/api/users/profile")
            .header(header::AUTHORIZATION, &auth)
            .header("X-CSRF-Token", "test-csrf-token")
            .header(header::CONTENT_TYPE, "application/json")
            .body(common::json_body(&json!({"name": ""})))
            .unwrap()
    };

    // 测试模式：白名单令牌放行，请求死在业务校验（nome vazio）
    let app = common::offline_app(true).await;
    let resp = app.oneshot(request()).await.unwrap();
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
    let body = common::body_json(resp).await;
    assert_eq!(body["error"]["code"], "VALIDATION_ERROR");

    // 生产配置：同一令牌被当作普通令牌校验并拒绝
    let app = common::offline_app(false).await;
    let resp = app.oneshot(request()).await.unwrap();
    assert_eq!(resp.status(), StatusCode::FORBIDDEN);
    let body = common::body_json(resp).await;
    assert_eq!(body["error"]["code"], "CSRF_INVALID");
}

// ============ HTTP栈：限流 ============

/// Test 7.1: 认证窗口超额后返回专用错误码
#[tokio::test]
async fn test_auth_rate_limit_kicks_in() {
    // offline_config: auth 3 req / 60s；无content-type的请求在extractor处失败，不触库
    let app = common::offline_app(false).await;

    let attempt = || {
        Request::builder()
            .method("POST")
            .uri("/api/auth/login")
            .body(Body::empty())
            .unwrap()
    };

    for i in 1..=3 {
        let resp = app.clone().oneshot(attempt()).await.unwrap();
        assert_ne!(
            resp.status(),
            StatusCode::TOO_MANY_REQUESTS,
            "Request {i} is still within the window"
        );
        if i == 3 {
            assert_eq!(
                resp.headers().get("x-ratelimit-remaining").unwrap(),
                "0",
                "Window should be exhausted after request 3"
            );
        }
    }

    let resp = app.oneshot(attempt()).await.unwrap();
    assert_eq!(resp.status(), StatusCode::TOO_MANY_REQUESTS);
    let body = common::body_json(resp).await;
    assert_eq!(body["error"]["code"], "AUTH_RATE_LIMIT_EXCEEDED");
}

/// Test 7.2: 测试模式跳过限流
#[tokio::test]
async fn test_rate_limit_skipped_in_test_mode() {
    let app = common::offline_app(true).await;

    for _ in 0..6 {
        let resp = app
            .clone()
            .oneshot(
                Request::builder()
                    .method("POST")
                    .uri("/api/auth/login")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_ne!(resp.status(), StatusCode::TOO_MANY_REQUESTS);
    }
}

// ============ HTTP栈：CORS ============

/// Test 8.1: 预检在认证链之前应答
#[tokio::test]
async fn test_preflight_short_circuits_before_auth() {
    let app = common::offline_app(false).await;

    // /api/users/profile 是受保护路由；预检不带Authorization也必须成功
    let resp = app
        .oneshot(
            Request::builder()
                .method("OPTIONS")
                .uri("/api/users/profile")
                .header("Origin", "http://localhost:3001")
                .header("Access-Control-Request-Method", "PUT")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(resp.status(), StatusCode::NO_CONTENT);
    assert_eq!(
        resp.headers().get("access-control-allow-origin").unwrap(),
        "http://localhost:3001"
    );
    let methods = resp
        .headers()
        .get("access-control-allow-methods")
        .unwrap()
        .to_str()
        .unwrap();
    assert!(methods.contains("PUT"));
    assert!(resp.headers().contains_key("access-control-max-age"));
}

/// Test 8.2: 列表之外的origin不收到CORS头
#[tokio::test]
async fn test_preflight_denies_unknown_origin() {
    let app = common::offline_app(false).await;

    let resp = app
        .oneshot(
            Request::builder()
                .method("OPTIONS")
                .uri("/api/products")
                .header("Origin", "https://atacante.example.com")
                .header("Access-Control-Request-Method", "GET")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(resp.status(), StatusCode::NO_CONTENT);
    assert!(
        !resp.headers().contains_key("access-control-allow-origin"),
        "Unknown origins must not be reflected"
    );
}

// ============ 端到端测试（需要数据库） ============

/// Test 9.1: 注册→登录→资料→地址→心愿单
#[tokio::test]
#[ignore]
async fn test_e2e_buyer_registration_flow() {
    let state = common::e2e_state().await;
    let app = marketcore::api::routes(state);
    let email = common::unique_email("comprador");

    // 注册
    let resp = app
        .clone()
        .oneshot(
            Request::builder()
                .method("POST")
                .uri("/api/auth/register")
                .header(header::CONTENT_TYPE, "application/json")
                .body(common::json_body(&json!({
                    "name": "Comprador Teste",
                    "email": email.clone(),
                    "password": "Senha123forte",
                    "accountType": "BUYER"
                })))
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::CREATED);
    let body = common::body_json(resp).await;
    assert_eq!(body["data"]["user"]["email"], email);
    assert_eq!(body["data"]["user"]["role"], "BUYER");
    assert!(body["data"]["user"].get("passwordHash").is_none());
    let token = body["data"]["token"].as_str().unwrap().to_string();
    let auth = format!("Bearer {token}");

    // 登录
    let resp = app
        .clone()
        .oneshot(
            Request::builder()
                .method("POST")
                .uri("/api/auth/login")
                .header(header::CONTENT_TYPE, "application/json")
                .body(common::json_body(&json!({
                    "email": email.clone(),
                    "password": "Senha123forte"
                })))
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::OK);

    // 资料
    let resp = app
        .clone()
        .oneshot(
            Request::builder()
                .uri("/api/users/profile")
                .header(header::AUTHORIZATION, &auth)
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::OK);
    let body = common::body_json(resp).await;
    assert_eq!(body["data"]["email"], email);

    // 地址
    let resp = app
        .clone()
        .oneshot(
            Request::builder()
                .method("POST")
                .uri("/api/users/addresses")
                .header(header::AUTHORIZATION, &auth)
                .header("X-CSRF-Token", "test-csrf-token")
                .header(header::CONTENT_TYPE, "application/json")
                .body(common::json_body(&json!({
                    "street": "Rua das Flores",
                    "number": "123",
                    "city": "São Paulo",
                    "state": "SP",
                    "zipCode": "01310-100",
                    "isDefault": true
                })))
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::CREATED);
    let body = common::body_json(resp).await;
    assert_eq!(body["data"]["street"], "Rua das Flores");

    // 心愿单初始为空
    let resp = app
        .oneshot(
            Request::builder()
                .uri("/api/users/wishlist")
                .header(header::AUTHORIZATION, &auth)
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::OK);
    let body = common::body_json(resp).await;
    assert_eq!(body["data"], json!([]));
}

/// Test 9.2: 重复邮箱注册冲突
#[tokio::test]
#[ignore]
async fn test_e2e_duplicate_email_conflict() {
    let state = common::e2e_state().await;
    let app = marketcore::api::routes(state);
    let email = common::unique_email("duplicado");

    let register = || {
        Request::builder()
            .method("POST")
            .uri("/api/auth/register")
            .header(header::CONTENT_TYPE, "application/json")
            .body(common::json_body(&json!({
                "name": "Usuário Duplicado",
                "email": email.as_str(),
                "password": "Senha123forte"
            })))
            .unwrap()
    };

    let resp = app.clone().oneshot(register()).await.unwrap();
    assert_eq!(resp.status(), StatusCode::CREATED);

    let resp = app.oneshot(register()).await.unwrap();
    assert_eq!(resp.status(), StatusCode::CONFLICT);
    let body = common::body_json(resp).await;
    assert_eq!(body["error"]["code"], "DUPLICATE_RESOURCE");
}

/// Test 9.3: 没有有效订阅的卖家不能开店
#[tokio::test]
#[ignore]
async fn test_e2e_store_requires_active_subscription() {
    let state = common::e2e_state().await;
    let app = marketcore::api::routes(state);
    let email = common::unique_email("vendedor");

    let resp = app
        .clone()
        .oneshot(
            Request::builder()
                .method("POST")
                .uri("/api/auth/register")
                .header(header::CONTENT_TYPE, "application/json")
                .body(common::json_body(&json!({
                    "name": "Vendedor Sem Plano",
                    "email": email,
                    "password": "Senha123forte",
                    "accountType": "SELLER"
                })))
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::CREATED);
    let body = common::body_json(resp).await;
    let auth = format!("Bearer {}", body["data"]["token"].as_str().unwrap());

    let resp = app
        .oneshot(
            Request::builder()
                .method("POST")
                .uri("/api/stores")
                .header(header::AUTHORIZATION, &auth)
                .header("X-CSRF-Token", "test-csrf-token")
                .header(header::CONTENT_TYPE, "application/json")
                .body(common::json_body(&json!({"name": "Loja Sem Assinatura"})))
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
    let body = common::body_json(resp).await;
    assert_eq!(body["error"]["code"], "BUSINESS_RULE_VIOLATION");
    assert!(body["error"]["message"]
        .as_str()
        .unwrap()
        .contains("Assinatura"));
}

/// Test 9.4: 管理操作留审计痕迹，密码字段被遮蔽
#[tokio::test]
#[ignore]
async fn test_e2e_admin_audit_redacts_password() {
    let state = common::e2e_state().await;
    let app = marketcore::api::routes(state.clone());

    // 目标用户
    let target_email = common::unique_email("alvo");
    let resp = app
        .clone()
        .oneshot(
            Request::builder()
                .method("POST")
                .uri("/api/auth/register")
                .header(header::CONTENT_TYPE, "application/json")
                .body(common::json_body(&json!({
                    "name": "Usuário Alvo",
                    "email": target_email,
                    "password": "Senha123forte"
                })))
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::CREATED);
    let body = common::body_json(resp).await;
    let target_id = body["data"]["user"]["id"].as_str().unwrap().to_string();

    // 管理员：注册后直接提升角色，再登录拿带ADMIN的令牌
    let admin_email = common::unique_email("admin");
    let resp = app
        .clone()
        .oneshot(
            Request::builder()
                .method("POST")
                .uri("/api/auth/register")
                .header(header::CONTENT_TYPE, "application/json")
                .body(common::json_body(&json!({
                    "name": "Administrador",
                    "email": admin_email.clone(),
                    "password": "Senha123forte"
                })))
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::CREATED);
    let body = common::body_json(resp).await;
    let admin_id: uuid::Uuid = body["data"]["user"]["id"]
        .as_str()
        .unwrap()
        .parse()
        .unwrap();

    sqlx::query("UPDATE users SET role = 'ADMIN' WHERE id = $1")
        .bind(admin_id)
        .execute(&state.pool)
        .await
        .unwrap();

    let resp = app
        .clone()
        .oneshot(
            Request::builder()
                .method("POST")
                .uri("/api/auth/login")
                .header(header::CONTENT_TYPE, "application/json")
                .body(common::json_body(&json!({
                    "email": admin_email,
                    "password": "Senha123forte"
                })))
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::OK);
    let body = common::body_json(resp).await;
    let admin_auth = format!("Bearer {}", body["data"]["token"].as_str().unwrap());

    // 管理端更新用户；载荷里带多余的password字段，审计必须遮蔽
    let resp = app
        .oneshot(
            Request::builder()
                .method("PUT")
                .uri(format!("/api/admin/users/{target_id}"))
                .header(header::AUTHORIZATION, &admin_auth)
                .header("X-CSRF-Token", "test-csrf-token")
                .header(header::CONTENT_TYPE, "application/json")
                .body(common::json_body(&json!({
                    "name": "Nome Auditado",
                    "password": "senha-que-nao-pode-vazar"
                })))
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::OK);

    // 审计写入走异步队列
    tokio::time::sleep(std::time::Duration::from_secs(1)).await;

    let (details,): (serde_json::Value,) = sqlx::query_as(
        "SELECT details FROM audit_logs \
         WHERE admin_id = $1 AND action = 'update' AND resource = 'user' \
         ORDER BY created_at DESC LIMIT 1",
    )
    .bind(admin_id)
    .fetch_one(&state.pool)
    .await
    .expect("admin mutation must leave an audit trail");

    assert_eq!(details["body"]["password"], "[REDACTED]");
    assert_eq!(details["body"]["name"], "Nome Auditado");
    assert_eq!(details["status"], 200);
    assert_eq!(details["params"]["id"], target_id);
}

/// Test 9.5: 有订单的用户不能被管理员删除
#[tokio::test]
#[ignore]
async fn test_e2e_admin_cannot_delete_user_with_orders() {
    let state = common::e2e_state().await;
    let app = marketcore::api::routes(state.clone());

    // 目标买家
    let target_email = common::unique_email("comprador-pedido");
    let resp = app
        .clone()
        .oneshot(
            Request::builder()
                .method("POST")
                .uri("/api/auth/register")
                .header(header::CONTENT_TYPE, "application/json")
                .body(common::json_body(&json!({
                    "name": "Comprador Com Pedido",
                    "email": target_email,
                    "password": "Senha123forte"
                })))
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::CREATED);
    let body = common::body_json(resp).await;
    let target_id: uuid::Uuid = body["data"]["user"]["id"]
        .as_str()
        .unwrap()
        .parse()
        .unwrap();

    // 店铺和订单直接落库，绕开订阅/商品链路
    let seller_email = common::unique_email("vendedor-pedido");
    let resp = app
        .clone()
        .oneshot(
            Request::builder()
                .method("POST")
                .uri("/api/auth/register")
                .header(header::CONTENT_TYPE, "application/json")
                .body(common::json_body(&json!({
                    "name": "Vendedor Com Pedido",
                    "email": seller_email,
                    "password": "Senha123forte",
                    "accountType": "SELLER"
                })))
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::CREATED);
    let body = common::body_json(resp).await;
    let seller_id: uuid::Uuid = body["data"]["user"]["id"]
        .as_str()
        .unwrap()
        .parse()
        .unwrap();

    let store_id: uuid::Uuid = sqlx::query_scalar(
        "INSERT INTO stores (owner_id, name, slug) VALUES ($1, $2, $3) RETURNING id",
    )
    .bind(seller_id)
    .bind("Loja Com Pedido")
    .bind(format!("loja-com-pedido-{}", uuid::Uuid::new_v4().simple()))
    .fetch_one(&state.pool)
    .await
    .unwrap();

    sqlx::query("INSERT INTO orders (buyer_id, store_id, total) VALUES ($1, $2, 49.90)")
        .bind(target_id)
        .bind(store_id)
        .execute(&state.pool)
        .await
        .unwrap();

    // 管理员
    let admin_email = common::unique_email("admin-exclusao");
    let resp = app
        .clone()
        .oneshot(
            Request::builder()
                .method("POST")
                .uri("/api/auth/register")
                .header(header::CONTENT_TYPE, "application/json")
                .body(common::json_body(&json!({
                    "name": "Administrador Exclusão",
                    "email": admin_email.clone(),
                    "password": "Senha123forte"
                })))
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::CREATED);
    let body = common::body_json(resp).await;
    let admin_id: uuid::Uuid = body["data"]["user"]["id"]
        .as_str()
        .unwrap()
        .parse()
        .unwrap();

    sqlx::query("UPDATE users SET role = 'ADMIN' WHERE id = $1")
        .bind(admin_id)
        .execute(&state.pool)
        .await
        .unwrap();

    let resp = app
        .clone()
        .oneshot(
            Request::builder()
                .method("POST")
                .uri("/api/auth/login")
                .header(header::CONTENT_TYPE, "application/json")
                .body(common::json_body(&json!({
                    "email": admin_email,
                    "password": "Senha123forte"
                })))
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::OK);
    let body = common::body_json(resp).await;
    let admin_auth = format!("Bearer {}", body["data"]["token"].as_str().unwrap());

    // 删除被业务规则拒绝，响应带关联订单数
    let resp = app
        .oneshot(
            Request::builder()
                .method("DELETE")
                .uri(format!("/api/admin/users/{target_id}"))
                .header(header::AUTHORIZATION, &admin_auth)
                .header("X-CSRF-Token", "test-csrf-token")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
    let body = common::body_json(resp).await;
    assert_eq!(body["error"]["code"], "BUSINESS_RULE_VIOLATION");
    assert!(body["error"]["message"]
        .as_str()
        .unwrap()
        .contains("pedidos"));
    assert_eq!(body["error"]["details"]["orders"], 1);

    // 用户仍然存在
    let (count,): (i64,) = sqlx::query_as("SELECT COUNT(*) FROM users WHERE id = $1")
        .bind(target_id)
        .fetch_one(&state.pool)
        .await
        .unwrap();
    assert_eq!(count, 1);
}
