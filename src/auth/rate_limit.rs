//! # 滑动窗口速率限制器
//!
//! 基于共享计数器存储的每密钥、每窗口请求计数。
//! 检查与自增是两次独立调用，刻意不保证原子性：同一密钥的高并发
//! 突发下可能短暂放行超过配额的请求，这是以简单性换取低延迟的
//! 既定取舍，不要用锁"修复"。

use std::sync::Arc;

use crate::auth::types::PartnerKey;
use crate::cache::{CacheKey, CacheManager, RateWindow};

/// 机器可读的限流拒绝原因
pub const REASON_RATE_LIMIT_EXCEEDED: &str = "rate_limit_exceeded";

/// 速率检查结果
#[derive(Debug, Clone)]
pub struct RateDecision {
    pub allowed: bool,
    pub minute_count: i64,
    pub day_count: i64,
}

/// 分布式速率限制器
pub struct RateLimiter {
    cache: Arc<CacheManager>,
}

impl RateLimiter {
    pub const fn new(cache: Arc<CacheManager>) -> Self {
        Self { cache }
    }

    /// 读取某窗口的当前计数
    ///
    /// 计数器存储不可达时降级为 0（fail-open）：可用性优先于严格性，
    /// 限流门禁失效好过全量拒绝流量。这是刻意选择，不是偶然行为。
    async fn window_count(&self, token: &str, window: RateWindow) -> i64 {
        let key = CacheKey::RateLimit {
            token: token.to_string(),
            window,
        }
        .build();

        match self.cache.get_int(&key).await {
            Ok(count) => count.unwrap_or(0),
            Err(e) => {
                tracing::warn!(
                    window = window.name(),
                    error = %e,
                    "计数器存储不可达，限流降级为放行"
                );
                0
            }
        }
    }

    /// 速率检查
    ///
    /// 计数器反映的是已完成的请求，因此判定是 `count < limit` 而非 `<=`；
    /// 两个窗口都未超限才放行。
    pub async fn admit(&self, key: &PartnerKey) -> RateDecision {
        let minute_count = self.window_count(&key.token, RateWindow::Minute).await;
        let day_count = self.window_count(&key.token, RateWindow::Day).await;

        RateDecision {
            allowed: minute_count < key.rate_limit_per_minute
                && day_count < key.rate_limit_per_day,
            minute_count,
            day_count,
        }
    }

    /// 计入一次已放行的请求
    ///
    /// 仅在计数器从不存在变为 1 时设置 TTL：首次自增确立窗口，
    /// 后续自增不得重置过期时间，否则窗口永远不会到期。
    pub async fn record(&self, token: &str) {
        for window in [RateWindow::Minute, RateWindow::Day] {
            let key = CacheKey::RateLimit {
                token: token.to_string(),
                window,
            }
            .build();

            match self.cache.incr(&key, 1).await {
                Ok(1) => {
                    if let Err(e) = self.cache.expire(&key, window.ttl()).await {
                        tracing::warn!(window = window.name(), error = %e, "设置计数器 TTL 失败");
                    }
                }
                Ok(_) => {}
                Err(e) => {
                    tracing::warn!(window = window.name(), error = %e, "计数器自增失败");
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::RateLimitConfig;

    fn key_with_limits(per_minute: i64, per_day: i64) -> PartnerKey {
        let mut key = PartnerKey::issue("Acme", "ops@acme.example", &RateLimitConfig::default());
        key.rate_limit_per_minute = per_minute;
        key.rate_limit_per_day = per_day;
        key
    }

    #[tokio::test]
    async fn sequential_calls_enforce_minute_limit() {
        let cache = Arc::new(CacheManager::memory_only());
        let limiter = RateLimiter::new(cache);
        let key = key_with_limits(3, 100);

        // 前 3 次放行，第 4 次拒绝
        for i in 1..=3 {
            let decision = limiter.admit(&key).await;
            assert!(decision.allowed, "第 {i} 次调用应放行");
            limiter.record(&key.token).await;
        }

        let decision = limiter.admit(&key).await;
        assert!(!decision.allowed);
        assert_eq!(decision.minute_count, 3);
    }

    #[tokio::test]
    async fn day_limit_rejects_independently_of_minute_limit() {
        let cache = Arc::new(CacheManager::memory_only());
        let limiter = RateLimiter::new(cache.clone());
        let key = key_with_limits(100, 2);

        limiter.record(&key.token).await;
        limiter.record(&key.token).await;

        let decision = limiter.admit(&key).await;
        assert!(!decision.allowed);
        assert_eq!(decision.day_count, 2);
        assert!(decision.minute_count < key.rate_limit_per_minute);
    }

    #[tokio::test]
    async fn window_expiry_readmits_exhausted_key() {
        let cache = Arc::new(CacheManager::memory_only());
        let limiter = RateLimiter::new(cache.clone());
        let key = key_with_limits(1, 100);

        limiter.record(&key.token).await;
        assert!(!limiter.admit(&key).await.allowed);

        // 模拟分钟窗口到期：计数器键消失等价于计数归零
        let minute_key = CacheKey::RateLimit {
            token: key.token.clone(),
            window: RateWindow::Minute,
        }
        .build();
        cache.delete(&minute_key).await.unwrap();

        assert!(limiter.admit(&key).await.allowed);
    }

    #[tokio::test]
    async fn record_sets_ttl_only_on_first_increment() {
        let cache = Arc::new(CacheManager::memory_only());
        let limiter = RateLimiter::new(cache.clone());
        let key = key_with_limits(100, 1000);

        limiter.record(&key.token).await;

        let minute_key = CacheKey::RateLimit {
            token: key.token.clone(),
            window: RateWindow::Minute,
        }
        .build();
        let ttl_first = cache.ttl(&minute_key).await.unwrap();
        assert!(ttl_first > 0 && ttl_first <= 60);

        limiter.record(&key.token).await;
        let ttl_second = cache.ttl(&minute_key).await.unwrap();
        assert!(ttl_second <= ttl_first, "后续自增不得延长窗口");

        assert_eq!(cache.get_int(&minute_key).await.unwrap(), Some(2));
    }

    #[tokio::test]
    async fn day_counter_gets_day_long_ttl() {
        let cache = Arc::new(CacheManager::memory_only());
        let limiter = RateLimiter::new(cache.clone());
        let key = key_with_limits(100, 1000);

        limiter.record(&key.token).await;

        let day_key = CacheKey::RateLimit {
            token: key.token.clone(),
            window: RateWindow::Day,
        }
        .build();
        let ttl = cache.ttl(&day_key).await.unwrap();
        assert!(ttl > 60, "日窗口 TTL 应远大于分钟窗口, 实际 {ttl}");
        assert!(ttl <= 86_400);
    }
}
