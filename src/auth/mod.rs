//! # 认证与速率限制
//!
//! 合作方密钥模型、令牌解析验证与滑动窗口速率限制

pub mod rate_limit;
pub mod service;
pub mod types;

pub use rate_limit::{RateDecision, RateLimiter};
pub use service::AuthService;
pub use types::PartnerKey;
