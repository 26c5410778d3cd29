use std::sync::Arc;

use crate::{
    config::Config,
    infrastructure::{
        asaas::AsaasClient,
        csrf_store::{CsrfStore, MemoryCsrfStore, RedisCsrfStore},
        db::PgPool,
        rate_limit_store::{MemoryRateLimitStore, RateLimitStore, RedisRateLimitStore},
    },
    service::audit::AuditRecorder,
};

/// 应用状态
/// 包含所有共享资源
#[derive(Clone)]
pub struct AppState {
    pub pool: PgPool,
    pub csrf: Arc<dyn CsrfStore>,
    pub rate_limiter: Arc<dyn RateLimitStore>,
    pub audit: AuditRecorder,
    pub asaas: AsaasClient,
    pub config: Arc<Config>,
}

impl AppState {
    /// 创建新的应用状态
    /// CSRF与限流存储按配置选择后端（memory | redis）
    pub fn new(pool: PgPool, config: Arc<Config>) -> anyhow::Result<Self> {
        let csrf: Arc<dyn CsrfStore> = match config.security.csrf_store.as_str() {
            "redis" => Arc::new(RedisCsrfStore::new(&config.redis.url)?),
            _ => Arc::new(MemoryCsrfStore::new()),
        };

        let rate_limiter: Arc<dyn RateLimitStore> = match config.security.rate_limit_store.as_str()
        {
            "redis" => Arc::new(RedisRateLimitStore::new(&config.redis.url)?),
            _ => Arc::new(MemoryRateLimitStore::new()),
        };

        let audit = AuditRecorder::start(pool.clone());
        let asaas = AsaasClient::from_config(&config.asaas);

        Ok(Self {
            pool,
            csrf,
            rate_limiter,
            audit,
            asaas,
            config,
        })
    }
}
