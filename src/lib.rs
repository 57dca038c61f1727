//! # Patent Gateway 核心库
//!
//! 面向专利数据的 B2B 计量/计费网关：合作方密钥认证、滑动窗口
//! 速率限制、到期查询代理与富化、使用计量、到期 webhook 投递。

pub mod app;
pub mod auth;
pub mod cache;
pub mod config;
pub mod enrich;
pub mod error;
pub mod gateway;
pub mod logging;
pub mod metering;
pub mod metrics;
pub mod patents;
pub mod storage;
pub mod webhook;

// Re-export commonly used types
pub use config::AppConfig;
pub use error::{GatewayError, Result};
