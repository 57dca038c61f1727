//! # 缓存键命名规范
//!
//! 定义统一的缓存键生成和管理策略

use serde::{Deserialize, Serialize};
use std::fmt;
use std::time::Duration;

/// 速率限制窗口
///
/// 计数器仅存在于共享存储中，TTL 等于窗口长度；键不存在等价于计数 0。
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RateWindow {
    /// 每分钟窗口
    Minute,
    /// 每日窗口
    Day,
}

impl RateWindow {
    /// 窗口名称
    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            Self::Minute => "minute",
            Self::Day => "day",
        }
    }

    /// 窗口长度，即计数器 TTL
    #[must_use]
    pub const fn ttl(self) -> Duration {
        match self {
            Self::Minute => Duration::from_secs(60),
            Self::Day => Duration::from_secs(86_400),
        }
    }
}

/// 缓存键类型
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum CacheKey {
    /// 速率限制计数器 - `ratelimit:{token}:{window}`
    RateLimit { token: String, window: RateWindow },

    /// 到期查询结果缓存 - `query:expirations:{digest}`
    Query { digest: String },

    /// 单专利缓存 - `patent:{patent_id}`
    Patent { patent_id: String },
}

impl CacheKey {
    /// 生成缓存键字符串
    #[must_use]
    pub fn build(&self) -> String {
        match self {
            Self::RateLimit { token, window } => {
                format!("ratelimit:{token}:{}", window.name())
            }
            Self::Query { digest } => {
                format!("query:expirations:{digest}")
            }
            Self::Patent { patent_id } => {
                format!("patent:{patent_id}")
            }
        }
    }

    /// 获取缓存键的模式（用于批量操作）
    #[must_use]
    pub fn pattern(&self) -> String {
        match self {
            Self::RateLimit { token, .. } => format!("ratelimit:{token}:*"),
            Self::Query { .. } => "query:expirations:*".to_string(),
            Self::Patent { .. } => "patent:*".to_string(),
        }
    }

    /// 获取缓存键的命名空间
    #[must_use]
    pub const fn namespace(&self) -> &'static str {
        match self {
            Self::RateLimit { .. } => "ratelimit",
            Self::Query { .. } => "query",
            Self::Patent { .. } => "patent",
        }
    }

    /// 判断是否是临时缓存（需要较短的 TTL）
    #[must_use]
    pub const fn is_temporary(&self) -> bool {
        matches!(self, Self::RateLimit { .. } | Self::Query { .. })
    }
}

impl fmt::Display for CacheKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.build())
    }
}
