//! # 缓存与计数器存储
//!
//! 速率限制计数器与查询结果缓存共用的共享存储抽象

pub mod keys;
pub mod store;

pub use keys::{CacheKey, RateWindow};
pub use store::{CacheManager, MemoryCache, RedisCache};
