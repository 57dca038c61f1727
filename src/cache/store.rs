//! # 缓存抽象层
//!
//! 提供统一的缓存/计数器接口，支持内存实现和 Redis 实现。
//! 计数器语义：值以十进制字符串存储，`incr` 不重置既有 TTL。

use async_trait::async_trait;
use redis::{aio::ConnectionManager, AsyncCommands, Client};
use serde::{de::DeserializeOwned, Serialize};
use std::collections::HashMap;
use std::sync::{Arc, RwLock};
use std::time::{Duration, Instant};

use crate::error::{GatewayError, Result};

/// 缓存项
#[derive(Debug, Clone)]
struct CacheEntry {
    value: String,
    expires_at: Option<Instant>,
}

impl CacheEntry {
    fn new(value: String, ttl: Option<Duration>) -> Self {
        Self {
            value,
            expires_at: ttl.map(|t| Instant::now() + t),
        }
    }

    fn is_expired(&self) -> bool {
        self.expires_at.is_some_and(|at| Instant::now() > at)
    }
}

/// 缓存抽象trait
#[async_trait]
pub trait CacheProvider: Send + Sync {
    /// 设置缓存值（JSON 序列化后存储）
    async fn set_raw(&self, key: &str, value: String, ttl: Option<Duration>) -> Result<()>;

    /// 获取原始缓存值
    async fn get_raw(&self, key: &str) -> Result<Option<String>>;

    /// 获取整数计数值，键不存在视为 `None`
    async fn get_int(&self, key: &str) -> Result<Option<i64>>;

    /// 原子自增并返回新值
    async fn incr(&self, key: &str, delta: i64) -> Result<i64>;

    /// 设置过期时间，返回键是否存在
    async fn expire(&self, key: &str, ttl: Duration) -> Result<bool>;

    /// 获取剩余存活时间（秒）；-1 表示无过期，-2 表示键不存在
    async fn ttl(&self, key: &str) -> Result<i64>;

    /// 删除键，返回是否删除了内容
    async fn delete(&self, key: &str) -> Result<bool>;

    /// 检查键是否存在
    async fn exists(&self, key: &str) -> Result<bool>;

    /// 清空所有缓存
    async fn clear(&self) -> Result<()>;
}

/// 内存缓存实现
pub struct MemoryCache {
    data: Arc<RwLock<HashMap<String, CacheEntry>>>,
    max_entries: usize,
}

impl MemoryCache {
    #[must_use]
    pub fn new(max_entries: usize) -> Self {
        Self {
            data: Arc::new(RwLock::new(HashMap::new())),
            max_entries,
        }
    }

    fn cleanup_expired(&self) {
        let mut data = self.data.write().unwrap();
        data.retain(|_, entry| !entry.is_expired());
    }

    fn ensure_capacity(&self) {
        let mut data = self.data.write().unwrap();
        if data.len() >= self.max_entries {
            // 优先驱逐过期项，否则驱逐任意一项
            let to_remove = data
                .iter()
                .find(|(_, entry)| entry.is_expired())
                .map(|(key, _)| key.clone())
                .or_else(|| data.keys().next().cloned());

            if let Some(key) = to_remove {
                data.remove(&key);
            }
        }
    }
}

#[async_trait]
impl CacheProvider for MemoryCache {
    async fn set_raw(&self, key: &str, value: String, ttl: Option<Duration>) -> Result<()> {
        self.ensure_capacity();
        let mut data = self.data.write().unwrap();
        data.insert(key.to_string(), CacheEntry::new(value, ttl));
        Ok(())
    }

    async fn get_raw(&self, key: &str) -> Result<Option<String>> {
        let data = self.data.read().unwrap();
        Ok(data
            .get(key)
            .filter(|entry| !entry.is_expired())
            .map(|entry| entry.value.clone()))
    }

    async fn get_int(&self, key: &str) -> Result<Option<i64>> {
        Ok(self
            .get_raw(key)
            .await?
            .and_then(|raw| raw.trim().parse::<i64>().ok()))
    }

    async fn incr(&self, key: &str, delta: i64) -> Result<i64> {
        let mut data = self.data.write().unwrap();

        let (current, expires_at) = match data.get(key) {
            Some(entry) if !entry.is_expired() => {
                (entry.value.trim().parse::<i64>().unwrap_or(0), entry.expires_at)
            }
            _ => (0, None),
        };

        let new_value = current + delta;
        data.insert(
            key.to_string(),
            CacheEntry {
                value: new_value.to_string(),
                expires_at,
            },
        );
        Ok(new_value)
    }

    async fn expire(&self, key: &str, ttl: Duration) -> Result<bool> {
        let mut data = self.data.write().unwrap();
        match data.get_mut(key) {
            Some(entry) if !entry.is_expired() => {
                entry.expires_at = Some(Instant::now() + ttl);
                Ok(true)
            }
            _ => Ok(false),
        }
    }

    async fn ttl(&self, key: &str) -> Result<i64> {
        let data = self.data.read().unwrap();
        match data.get(key) {
            Some(entry) if !entry.is_expired() => match entry.expires_at {
                Some(at) => {
                    let remaining = at.saturating_duration_since(Instant::now());
                    #[allow(clippy::cast_possible_wrap)]
                    Ok(remaining.as_secs() as i64)
                }
                None => Ok(-1),
            },
            _ => Ok(-2),
        }
    }

    async fn delete(&self, key: &str) -> Result<bool> {
        let mut data = self.data.write().unwrap();
        Ok(data.remove(key).is_some())
    }

    async fn exists(&self, key: &str) -> Result<bool> {
        self.cleanup_expired();
        let data = self.data.read().unwrap();
        Ok(data.get(key).is_some_and(|entry| !entry.is_expired()))
    }

    async fn clear(&self) -> Result<()> {
        let mut data = self.data.write().unwrap();
        data.clear();
        Ok(())
    }
}

/// Redis缓存实现（异步连接管理器）
pub struct RedisCache {
    connection_manager: ConnectionManager,
}

impl RedisCache {
    /// 创建并连接 Redis 客户端
    pub async fn connect(redis_url: &str) -> Result<Self> {
        tracing::info!(url = %redis_url, "正在连接 Redis 服务器");

        let client = Client::open(redis_url)
            .map_err(|e| GatewayError::cache_with_source("创建 Redis 客户端失败", e))?;

        let connection_manager = ConnectionManager::new(client)
            .await
            .map_err(|e| GatewayError::cache_with_source("建立 Redis 连接失败", e))?;

        tracing::info!("Redis 连接建立成功");
        Ok(Self { connection_manager })
    }
}

#[async_trait]
impl CacheProvider for RedisCache {
    async fn set_raw(&self, key: &str, value: String, ttl: Option<Duration>) -> Result<()> {
        let mut conn = self.connection_manager.clone();
        match ttl {
            Some(ttl) => conn
                .set_ex::<_, _, ()>(key, value, ttl.as_secs())
                .await
                .map_err(|e| GatewayError::cache_with_source(format!("设置缓存失败: {key}"), e)),
            None => conn
                .set::<_, _, ()>(key, value)
                .await
                .map_err(|e| GatewayError::cache_with_source(format!("设置缓存失败: {key}"), e)),
        }
    }

    async fn get_raw(&self, key: &str) -> Result<Option<String>> {
        let mut conn = self.connection_manager.clone();
        conn.get(key)
            .await
            .map_err(|e| GatewayError::cache_with_source(format!("获取缓存失败: {key}"), e))
    }

    async fn get_int(&self, key: &str) -> Result<Option<i64>> {
        Ok(self
            .get_raw(key)
            .await?
            .and_then(|raw| raw.trim().parse::<i64>().ok()))
    }

    async fn incr(&self, key: &str, delta: i64) -> Result<i64> {
        let mut conn = self.connection_manager.clone();
        conn.incr(key, delta)
            .await
            .map_err(|e| GatewayError::cache_with_source(format!("计数自增失败: {key}"), e))
    }

    async fn expire(&self, key: &str, ttl: Duration) -> Result<bool> {
        let mut conn = self.connection_manager.clone();
        #[allow(clippy::cast_possible_wrap)]
        conn.expire(key, ttl.as_secs() as i64)
            .await
            .map_err(|e| GatewayError::cache_with_source(format!("设置过期时间失败: {key}"), e))
    }

    async fn ttl(&self, key: &str) -> Result<i64> {
        let mut conn = self.connection_manager.clone();
        conn.ttl(key)
            .await
            .map_err(|e| GatewayError::cache_with_source(format!("获取TTL失败: {key}"), e))
    }

    async fn delete(&self, key: &str) -> Result<bool> {
        let mut conn = self.connection_manager.clone();
        let deleted: i32 = conn
            .del(key)
            .await
            .map_err(|e| GatewayError::cache_with_source(format!("删除缓存失败: {key}"), e))?;
        Ok(deleted > 0)
    }

    async fn exists(&self, key: &str) -> Result<bool> {
        let mut conn = self.connection_manager.clone();
        conn.exists(key)
            .await
            .map_err(|e| GatewayError::cache_with_source(format!("检查缓存存在性失败: {key}"), e))
    }

    async fn clear(&self) -> Result<()> {
        let mut conn = self.connection_manager.clone();
        redis::cmd("FLUSHDB")
            .query_async::<()>(&mut conn)
            .await
            .map_err(|e| GatewayError::cache_with_source("清空缓存失败", e))
    }
}

/// 缓存提供者枚举 - 避免 trait object 兼容性问题
enum CacheBackend {
    Memory(MemoryCache),
    Redis(RedisCache),
}

/// 统一缓存管理器
///
/// 速率限制器和查询编排器共享同一个实例；两者对存储故障的
/// 处理策略不同（限流 fail-open，缓存 fail-closed），由调用方决定。
pub struct CacheManager {
    backend: CacheBackend,
}

impl CacheManager {
    /// 创建内存缓存管理器
    #[must_use]
    pub fn memory(max_entries: usize) -> Self {
        Self {
            backend: CacheBackend::Memory(MemoryCache::new(max_entries)),
        }
    }

    /// 创建默认容量的内存缓存管理器（测试用）
    #[must_use]
    pub fn memory_only() -> Self {
        Self::memory(10_000)
    }

    /// 创建 Redis 缓存管理器
    pub async fn redis(redis_url: &str) -> Result<Self> {
        Ok(Self {
            backend: CacheBackend::Redis(RedisCache::connect(redis_url).await?),
        })
    }

    fn provider(&self) -> &dyn CacheProvider {
        match &self.backend {
            CacheBackend::Memory(cache) => cache,
            CacheBackend::Redis(cache) => cache,
        }
    }

    /// 设置缓存值
    pub async fn set<T>(&self, key: &str, value: &T, ttl: Option<Duration>) -> Result<()>
    where
        T: Serialize + Sync,
    {
        let serialized = serde_json::to_string(value)
            .map_err(|e| GatewayError::cache_with_source("序列化缓存值失败", e))?;
        self.provider().set_raw(key, serialized, ttl).await
    }

    /// 获取缓存值
    pub async fn get<T>(&self, key: &str) -> Result<Option<T>>
    where
        T: DeserializeOwned,
    {
        match self.provider().get_raw(key).await? {
            Some(raw) => {
                let value = serde_json::from_str(&raw)
                    .map_err(|e| GatewayError::cache_with_source("反序列化缓存值失败", e))?;
                Ok(Some(value))
            }
            None => Ok(None),
        }
    }

    /// 获取整数计数值
    pub async fn get_int(&self, key: &str) -> Result<Option<i64>> {
        self.provider().get_int(key).await
    }

    /// 原子自增
    pub async fn incr(&self, key: &str, delta: i64) -> Result<i64> {
        self.provider().incr(key, delta).await
    }

    /// 设置过期时间
    pub async fn expire(&self, key: &str, ttl: Duration) -> Result<bool> {
        self.provider().expire(key, ttl).await
    }

    /// 获取剩余存活时间
    pub async fn ttl(&self, key: &str) -> Result<i64> {
        self.provider().ttl(key).await
    }

    /// 删除缓存
    pub async fn delete(&self, key: &str) -> Result<bool> {
        self.provider().delete(key).await
    }

    /// 检查键是否存在
    pub async fn exists(&self, key: &str) -> Result<bool> {
        self.provider().exists(key).await
    }

    /// 清空所有缓存
    pub async fn clear(&self) -> Result<()> {
        self.provider().clear().await
    }
}
