//! SQLx Postgres 连接池初始化与健康检查
//!
//! 用法：
//! let pool = init_pool(&env::var("DATABASE_URL")?).await?;
//! health_check(&pool).await?;

use std::{env, time::Duration};

use anyhow::Result;

pub type PgPool = sqlx::Pool<sqlx::Postgres>;

/// 初始化Postgres连接池
///
/// 连接池参数全部可由环境变量覆盖：
/// - DB_MAX_CONNS（默认16，上限200）
/// - DB_MIN_CONNS（默认2）
/// - DB_ACQ_TIMEOUT_SECS（默认5）
/// - DB_IDLE_TIMEOUT_SECS（默认300）
/// - DB_MAX_LIFETIME_SECS（默认1800）
pub async fn init_pool(database_url: &str) -> Result<PgPool, sqlx::Error> {
    let pool = pool_options().connect(database_url).await.map_err(|e| {
        tracing::error!("Failed to connect to Postgres: {}", e);
        e
    })?;

    // 验证连接
    health_check(&pool).await?;

    Ok(pool)
}

/// 当 allow_lazy=true 时，使用 lazy 连接（不在启动时触发实际连接），便于无依赖环境联调
pub async fn init_pool_maybe_lazy(
    database_url: &str,
    allow_lazy: bool,
) -> Result<PgPool, sqlx::Error> {
    let opts = pool_options();

    if allow_lazy {
        // lazy 不需要 await，首次使用时才验证连接
        let pool = opts.connect_lazy(database_url)?;
        Ok(pool)
    } else {
        let pool = opts.connect(database_url).await.map_err(|e| {
            tracing::error!("Failed to connect to Postgres: {}", e);
            e
        })?;
        health_check(&pool).await?;
        Ok(pool)
    }
}

fn pool_options() -> sqlx::postgres::PgPoolOptions {
    let max_conns = env::var("DB_MAX_CONNS")
        .ok()
        .and_then(|s| s.parse::<u32>().ok())
        .filter(|&n| n > 0 && n <= 200)
        .unwrap_or(16);
    let min_conns = env::var("DB_MIN_CONNS")
        .ok()
        .and_then(|s| s.parse::<u32>().ok())
        .filter(|&n| n > 0 && n <= max_conns)
        .unwrap_or(2);
    let acquire_secs = env::var("DB_ACQ_TIMEOUT_SECS")
        .ok()
        .and_then(|s| s.parse::<u64>().ok())
        .unwrap_or(5);
    let idle_secs = env::var("DB_IDLE_TIMEOUT_SECS")
        .ok()
        .and_then(|s| s.parse::<u64>().ok())
        .unwrap_or(300);
    let max_lifetime_secs = env::var("DB_MAX_LIFETIME_SECS")
        .ok()
        .and_then(|s| s.parse::<u64>().ok())
        .unwrap_or(1800);

    sqlx::postgres::PgPoolOptions::new()
        .max_connections(max_conns)
        .min_connections(min_conns)
        .acquire_timeout(Duration::from_secs(acquire_secs))
        .idle_timeout(Duration::from_secs(idle_secs))
        .max_lifetime(Duration::from_secs(max_lifetime_secs))
        .test_before_acquire(true)
}

/// 健康检查：验证连接和数据库响应
pub async fn health_check(pool: &PgPool) -> Result<(), sqlx::Error> {
    let _: (chrono::DateTime<chrono::Utc>,) = sqlx::query_as("SELECT CURRENT_TIMESTAMP")
        .fetch_one(pool)
        .await?;
    Ok(())
}
