//! # 认证服务
//!
//! 由令牌解析合作方密钥并验证其状态。认证失败在任何计费工作之前拒绝，
//! 且不写入使用台账（没有可归属的密钥）。

use chrono::Utc;
use std::sync::Arc;

use crate::auth::types::PartnerKey;
use crate::error::{GatewayError, Result};
use crate::storage::KeyStore;

/// 机器可读的拒绝原因
pub mod reasons {
    pub const MISSING_API_KEY: &str = "missing_api_key";
    pub const INVALID_API_KEY: &str = "invalid_api_key";
    pub const INACTIVE_API_KEY: &str = "inactive_api_key";
    pub const EXPIRED_API_KEY: &str = "expired_api_key";
}

/// 认证服务
pub struct AuthService {
    keys: Arc<dyn KeyStore>,
}

impl AuthService {
    pub fn new(keys: Arc<dyn KeyStore>) -> Self {
        Self { keys }
    }

    /// 认证令牌并返回对应的合作方密钥
    ///
    /// 传输层头解析由外围胶水负责，这里只接收裸令牌。
    pub async fn authenticate(&self, token: Option<&str>) -> Result<PartnerKey> {
        let Some(token) = token.filter(|t| !t.is_empty()) else {
            return Err(GatewayError::auth(reasons::MISSING_API_KEY));
        };

        let Some(key) = self.keys.find_by_token(token).await? else {
            let token_prefix: String = token.chars().take(10).collect();
            tracing::warn!(token_prefix, "未知密钥的认证尝试");
            return Err(GatewayError::auth(reasons::INVALID_API_KEY));
        };

        if !key.is_active {
            return Err(GatewayError::auth(reasons::INACTIVE_API_KEY));
        }

        if key.is_expired(Utc::now()) {
            return Err(GatewayError::auth(reasons::EXPIRED_API_KEY));
        }

        Ok(key)
    }
}
