//! MarketCore 主入口
//! 多商户电商平台后端

use std::{sync::Arc, time::Duration};

use anyhow::Result;
use marketcore::{api, app_state::AppState, config::Config, infrastructure::db};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> Result<()> {
    // ✅ 1. 加载环境变量
    dotenvy::dotenv().ok();

    // ✅ 2. 初始化日志（结构化，级别由RUST_LOG覆盖）
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "marketcore=debug,tower_http=debug,sqlx=warn".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    tracing::info!("🚀 Starting MarketCore marketplace backend");

    // ✅ 3. 加载并校验配置（CONFIG_PATH指向TOML时，文件值覆盖环境变量）
    let config_path = std::env::var("CONFIG_PATH").ok();
    let config = Config::from_env_and_file(config_path.as_deref())?;
    config.validate()?;

    // JWT模块从环境变量取密钥与有效期，这里把配置桥接过去
    if std::env::var("JWT_SECRET").is_err() {
        std::env::set_var("JWT_SECRET", &config.jwt.secret);
    }
    if std::env::var("JWT_EXPIRY_SECS").is_err() {
        std::env::set_var("JWT_EXPIRY_SECS", config.jwt.expiry_secs.to_string());
    }
    if config.server.production && config.jwt.secret.starts_with("default-jwt-secret") {
        tracing::warn!("⚠️ JWT_SECRET de fábrica em produção, troque imediatamente");
    }
    tracing::info!("✅ Configuration loaded");

    // ✅ 4. 连接数据库（ALLOW_DEGRADED_START=1 时惰性连接，便于无依赖联调）
    let pool = db::init_pool_maybe_lazy(&config.database.url, config.server.allow_degraded_start)
        .await?;
    tracing::info!("✅ Database pool ready");

    // ✅ 5. 运行数据库迁移（生产环境建议改用 marketcore_migrate 单独执行）
    if std::env::var("SKIP_MIGRATIONS").is_err() {
        match sqlx::migrate!("./migrations").run(&pool).await {
            Ok(_) => tracing::info!("✅ Database migrations completed"),
            Err(e) => {
                tracing::warn!("⚠️ Database migrations failed (continuing): {}", e);
                tracing::info!("💡 Tip: Set SKIP_MIGRATIONS=1 to skip migrations on startup");
            }
        }
    } else {
        tracing::info!("⏭️ Database migrations skipped (SKIP_MIGRATIONS=1)");
    }

    // ✅ 6. 初始化应用状态（CSRF/限流存储按配置选 memory 或 redis）
    let config = Arc::new(config);
    let state = Arc::new(AppState::new(pool, config.clone())?);
    tracing::info!(
        csrf_store = %config.security.csrf_store,
        rate_limit_store = %config.security.rate_limit_store,
        "✅ Application state initialized"
    );

    // ✅ 7. 过期清扫后台任务（内存存储需要，Redis后端依赖TTL自动过期）
    {
        let st = state.clone();
        tokio::spawn(async move {
            let mut tick = tokio::time::interval(Duration::from_secs(60));
            loop {
                tick.tick().await;
                if let Err(e) = st.csrf.purge_expired().await {
                    tracing::warn!(error = %e, "falha ao limpar tokens CSRF expirados");
                }
                if let Err(e) = st.rate_limiter.purge_expired().await {
                    tracing::warn!(error = %e, "falha ao limpar janelas de limite expiradas");
                }
            }
        });
    }
    tracing::info!("✅ Expiry sweeper started");

    // ✅ 8. 构建API路由并启动服务器
    let app = api::routes(state);
    let listener = tokio::net::TcpListener::bind(&config.server.bind_addr).await?;

    tracing::info!("🎉 Server listening on http://{}", config.server.bind_addr);
    tracing::info!("📖 Swagger UI: http://{}/docs", config.server.bind_addr);

    axum::serve(listener, app).await?;

    Ok(())
}
