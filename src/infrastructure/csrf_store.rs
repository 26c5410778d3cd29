//! CSRF令牌存储：会话绑定、单次使用、带TTL
//!
//! 默认内存实现（单实例假设）；多实例部署配置Redis后端共享令牌。
//! 存储通过AppState注入，后端由配置选择。

use std::{
    collections::HashMap,
    sync::Mutex,
    time::{Duration, Instant},
};

use anyhow::Result;
use async_trait::async_trait;
use rand::RngCore;
use sha2::{Digest, Sha256};

/// 默认TTL：30分钟
pub const DEFAULT_TOKEN_TTL_SECS: u64 = 30 * 60;

/// CSRF令牌存储接口
///
/// 状态机：签发（有效）→ 首次匹配消费（删除）或过期（删除）→ 无效
#[async_trait]
pub trait CsrfStore: Send + Sync {
    /// 为会话签发新令牌（同一会话重复签发会覆盖旧令牌）
    async fn issue(&self, session_id: &str, ttl: Duration) -> Result<String>;

    /// 消费令牌：命中即删除（单次使用）。返回令牌是否有效
    async fn consume(&self, session_id: &str, token: &str) -> Result<bool>;

    /// 清理过期令牌；返回清理数量（Redis后端依赖键TTL，返回0）
    async fn purge_expired(&self) -> Result<usize>;
}

fn random_token(session_id: &str) -> String {
    let mut nonce = [0u8; 32];
    rand::thread_rng().fill_bytes(&mut nonce);

    let mut hasher = Sha256::new();
    hasher.update(session_id.as_bytes());
    hasher.update(nonce);
    faster_hex::hex_string(&hasher.finalize())
}

struct TokenEntry {
    token: String,
    created_at: Instant,
    ttl: Duration,
}

impl TokenEntry {
    fn expired(&self) -> bool {
        self.created_at.elapsed() > self.ttl
    }
}

/// 内存实现：无界map + 定期清理
pub struct MemoryCsrfStore {
    tokens: Mutex<HashMap<String, TokenEntry>>,
}

impl MemoryCsrfStore {
    pub fn new() -> Self {
        Self {
            tokens: Mutex::new(HashMap::new()),
        }
    }
}

impl Default for MemoryCsrfStore {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl CsrfStore for MemoryCsrfStore {
    async fn issue(&self, session_id: &str, ttl: Duration) -> Result<String> {
        let token = random_token(session_id);

        let mut tokens = match self.tokens.lock() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        };
        tokens.insert(
            session_id.to_string(),
            TokenEntry {
                token: token.clone(),
                created_at: Instant::now(),
                ttl,
            },
        );

        Ok(token)
    }

    async fn consume(&self, session_id: &str, token: &str) -> Result<bool> {
        let mut tokens = match self.tokens.lock() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        };

        match tokens.get(session_id) {
            Some(entry) if entry.expired() => {
                tokens.remove(session_id);
                Ok(false)
            }
            Some(entry) if entry.token == token => {
                // 单次使用：命中即删除
                tokens.remove(session_id);
                Ok(true)
            }
            _ => Ok(false),
        }
    }

    async fn purge_expired(&self) -> Result<usize> {
        let mut tokens = match self.tokens.lock() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        };
        let before = tokens.len();
        tokens.retain(|_, entry| !entry.expired());
        Ok(before - tokens.len())
    }
}

/// Redis实现：键TTL负责过期，GETDEL保证单次使用
pub struct RedisCsrfStore {
    client: redis::Client,
}

impl RedisCsrfStore {
    pub fn new(redis_url: &str) -> Result<Self, redis::RedisError> {
        let client = redis::Client::open(redis_url)?;
        Ok(Self { client })
    }

    fn key(session_id: &str) -> String {
        format!("csrf:{}", session_id)
    }
}

#[async_trait]
impl CsrfStore for RedisCsrfStore {
    async fn issue(&self, session_id: &str, ttl: Duration) -> Result<String> {
        let token = random_token(session_id);

        let mut conn = self.client.get_multiplexed_async_connection().await?;
        redis::cmd("SET")
            .arg(Self::key(session_id))
            .arg(&token)
            .arg("EX")
            .arg(ttl.as_secs())
            .query_async::<_, ()>(&mut conn)
            .await?;

        Ok(token)
    }

    async fn consume(&self, session_id: &str, token: &str) -> Result<bool> {
        let mut conn = self.client.get_multiplexed_async_connection().await?;
        // GETDEL：读取并删除，保证同一令牌只能消费一次
        let stored: Option<String> = redis::cmd("GETDEL")
            .arg(Self::key(session_id))
            .query_async(&mut conn)
            .await?;

        Ok(stored.as_deref() == Some(token))
    }

    async fn purge_expired(&self) -> Result<usize> {
        Ok(0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_token_accepted_exactly_once() {
        let store = MemoryCsrfStore::new();
        let token = store
            .issue("sess-1", Duration::from_secs(60))
            .await
            .unwrap();

        assert!(store.consume("sess-1", &token).await.unwrap());
        // 同一令牌第二次使用必须被拒绝
        assert!(!store.consume("sess-1", &token).await.unwrap());
    }

    #[tokio::test]
    async fn test_token_bound_to_session() {
        let store = MemoryCsrfStore::new();
        let token = store
            .issue("sess-1", Duration::from_secs(60))
            .await
            .unwrap();

        assert!(!store.consume("sess-2", &token).await.unwrap());
        // 错误会话的尝试不消费原令牌
        assert!(store.consume("sess-1", &token).await.unwrap());
    }

    #[tokio::test]
    async fn test_expired_token_rejected_and_purged() {
        let store = MemoryCsrfStore::new();
        let token = store
            .issue("sess-1", Duration::from_millis(10))
            .await
            .unwrap();

        tokio::time::sleep(Duration::from_millis(30)).await;
        assert!(!store.consume("sess-1", &token).await.unwrap());

        let _ = store
            .issue("sess-2", Duration::from_millis(10))
            .await
            .unwrap();
        tokio::time::sleep(Duration::from_millis(30)).await;
        assert_eq!(store.purge_expired().await.unwrap(), 1);
    }

    #[tokio::test]
    async fn test_reissue_overwrites_previous_token() {
        let store = MemoryCsrfStore::new();
        let first = store
            .issue("sess-1", Duration::from_secs(60))
            .await
            .unwrap();
        let second = store
            .issue("sess-1", Duration::from_secs(60))
            .await
            .unwrap();

        assert_ne!(first, second);
        assert!(!store.consume("sess-1", &first).await.unwrap());
        assert!(store.consume("sess-1", &second).await.unwrap());
    }
}
