//! 限流计数存储：固定窗口计数器
//!
//! 内存实现适用于单实例；Redis实现供多实例共享计数。

use std::{
    collections::HashMap,
    sync::Mutex,
    time::{Duration, Instant},
};

use anyhow::Result;
use async_trait::async_trait;

/// 固定窗口计数存储接口
#[async_trait]
pub trait RateLimitStore: Send + Sync {
    /// 递增key在当前窗口内的计数
    ///
    /// 返回 `(递增后的计数, 窗口剩余秒数)`。窗口从首次计数起算，
    /// 到期后计数归零重新开始。
    async fn incr(&self, key: &str, window: Duration) -> Result<(u64, u64)>;

    /// 清理已过期的窗口；返回清理数量（Redis后端依赖键TTL，返回0）
    async fn purge_expired(&self) -> Result<usize>;
}

struct WindowEntry {
    count: u64,
    started_at: Instant,
    window: Duration,
}

impl WindowEntry {
    fn expired(&self) -> bool {
        self.started_at.elapsed() >= self.window
    }

    fn remaining_secs(&self) -> u64 {
        self.window
            .saturating_sub(self.started_at.elapsed())
            .as_secs()
    }
}

/// 内存固定窗口实现
pub struct MemoryRateLimitStore {
    windows: Mutex<HashMap<String, WindowEntry>>,
}

impl MemoryRateLimitStore {
    pub fn new() -> Self {
        Self {
            windows: Mutex::new(HashMap::new()),
        }
    }
}

impl Default for MemoryRateLimitStore {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl RateLimitStore for MemoryRateLimitStore {
    async fn incr(&self, key: &str, window: Duration) -> Result<(u64, u64)> {
        let mut windows = match self.windows.lock() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        };

        let entry = windows.entry(key.to_string()).or_insert_with(|| WindowEntry {
            count: 0,
            started_at: Instant::now(),
            window,
        });

        if entry.expired() {
            entry.count = 0;
            entry.started_at = Instant::now();
            entry.window = window;
        }

        entry.count += 1;
        Ok((entry.count, entry.remaining_secs()))
    }

    async fn purge_expired(&self) -> Result<usize> {
        let mut windows = match self.windows.lock() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        };
        let before = windows.len();
        windows.retain(|_, entry| !entry.expired());
        Ok(before - windows.len())
    }
}

/// Redis实现：INCR + 首次计数时EXPIRE，窗口由键TTL决定
pub struct RedisRateLimitStore {
    client: redis::Client,
}

impl RedisRateLimitStore {
    pub fn new(redis_url: &str) -> Result<Self, redis::RedisError> {
        let client = redis::Client::open(redis_url)?;
        Ok(Self { client })
    }

    fn key(key: &str) -> String {
        format!("ratelimit:{}", key)
    }
}

#[async_trait]
impl RateLimitStore for RedisRateLimitStore {
    async fn incr(&self, key: &str, window: Duration) -> Result<(u64, u64)> {
        let mut conn = self.client.get_multiplexed_async_connection().await?;
        let key = Self::key(key);

        let count: u64 = redis::cmd("INCR").arg(&key).query_async(&mut conn).await?;
        if count == 1 {
            redis::cmd("EXPIRE")
                .arg(&key)
                .arg(window.as_secs())
                .query_async::<_, ()>(&mut conn)
                .await?;
        }

        let ttl: i64 = redis::cmd("TTL").arg(&key).query_async(&mut conn).await?;
        Ok((count, ttl.max(0) as u64))
    }

    async fn purge_expired(&self) -> Result<usize> {
        Ok(0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_counts_within_window() {
        let store = MemoryRateLimitStore::new();
        let window = Duration::from_secs(60);

        let (first, _) = store.incr("ip:1.2.3.4", window).await.unwrap();
        let (second, remaining) = store.incr("ip:1.2.3.4", window).await.unwrap();

        assert_eq!(first, 1);
        assert_eq!(second, 2);
        assert!(remaining <= 60);
    }

    #[tokio::test]
    async fn test_keys_are_independent() {
        let store = MemoryRateLimitStore::new();
        let window = Duration::from_secs(60);

        store.incr("ip:1.1.1.1", window).await.unwrap();
        store.incr("ip:1.1.1.1", window).await.unwrap();
        let (other, _) = store.incr("ip:2.2.2.2", window).await.unwrap();

        assert_eq!(other, 1);
    }

    #[tokio::test]
    async fn test_window_resets_after_expiry() {
        let store = MemoryRateLimitStore::new();
        let window = Duration::from_millis(20);

        store.incr("user:abc", window).await.unwrap();
        store.incr("user:abc", window).await.unwrap();
        tokio::time::sleep(Duration::from_millis(40)).await;

        let (count, _) = store.incr("user:abc", window).await.unwrap();
        assert_eq!(count, 1);

        tokio::time::sleep(Duration::from_millis(40)).await;
        assert_eq!(store.purge_expired().await.unwrap(), 1);
    }
}
