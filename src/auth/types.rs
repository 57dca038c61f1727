//! # 合作方密钥模型

use base64::{engine::general_purpose::URL_SAFE_NO_PAD, Engine};
use chrono::{DateTime, Utc};
use rand::RngCore;
use serde::{Deserialize, Serialize};

use crate::config::RateLimitConfig;

/// 令牌前缀
const TOKEN_PREFIX: &str = "pat_";

/// 合作方密钥：计量与认证的主体
///
/// 令牌全局唯一且签发后不可变；吊销只翻转 `is_active` 标志，
/// 历史使用记录始终保留。
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PartnerKey {
    /// 稳定标识（与密钥令牌分离）
    pub id: String,
    /// 密钥令牌（唯一、不可变）
    pub token: String,
    /// 合作方名称
    pub partner_name: String,
    /// 合作方联系邮箱
    pub partner_email: String,
    /// 激活标志；吊销时置为 false
    pub is_active: bool,
    /// 每分钟配额
    pub rate_limit_per_minute: i64,
    /// 每日配额
    pub rate_limit_per_day: i64,
    /// 是否在响应中附带品牌标识
    pub branding_enabled: bool,
    /// 创建时间
    pub created_at: DateTime<Utc>,
    /// 更新时间
    pub updated_at: DateTime<Utc>,
    /// 可选过期时间
    pub expires_at: Option<DateTime<Utc>>,
}

impl PartnerKey {
    /// 签发新密钥，配额取自默认配置
    #[must_use]
    pub fn issue(partner_name: &str, partner_email: &str, limits: &RateLimitConfig) -> Self {
        let now = Utc::now();
        Self {
            id: uuid::Uuid::new_v4().to_string(),
            token: generate_token(),
            partner_name: partner_name.to_string(),
            partner_email: partner_email.to_string(),
            is_active: true,
            rate_limit_per_minute: limits.default_per_minute,
            rate_limit_per_day: limits.default_per_day,
            branding_enabled: true,
            created_at: now,
            updated_at: now,
            expires_at: None,
        }
    }

    /// 判断密钥在给定时刻是否已过期
    #[must_use]
    pub fn is_expired(&self, now: DateTime<Utc>) -> bool {
        self.expires_at.is_some_and(|at| at < now)
    }
}

/// 生成安全的合作方令牌：`pat_` + URL-safe base64 的 32 随机字节
#[must_use]
pub fn generate_token() -> String {
    let mut bytes = [0u8; 32];
    rand::thread_rng().fill_bytes(&mut bytes);
    format!("{TOKEN_PREFIX}{}", URL_SAFE_NO_PAD.encode(bytes))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn generated_tokens_are_prefixed_and_unique() {
        let a = generate_token();
        let b = generate_token();
        assert!(a.starts_with("pat_"));
        assert!(b.starts_with("pat_"));
        assert_ne!(a, b);
    }

    #[test]
    fn issued_key_takes_default_limits() {
        let limits = RateLimitConfig::default();
        let key = PartnerKey::issue("Acme", "ops@acme.example", &limits);
        assert!(key.is_active);
        assert_eq!(key.rate_limit_per_minute, 60);
        assert_eq!(key.rate_limit_per_day, 10_000);
        assert!(key.expires_at.is_none());
        assert!(!key.is_expired(Utc::now()));
    }

    #[test]
    fn expiry_is_checked_against_given_instant() {
        let limits = RateLimitConfig::default();
        let mut key = PartnerKey::issue("Acme", "ops@acme.example", &limits);
        key.expires_at = Some(Utc::now() - chrono::Duration::hours(1));
        assert!(key.is_expired(Utc::now()));
    }
}
