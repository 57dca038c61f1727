//! # 请求管道
//!
//! 合作方请求的核心流程：认证 → 速率检查 → 计入计数 →
//! 查询编排 → 富化 → 响应格式化，每次请求尝试写一条使用记录。

pub mod response;
pub mod service;

pub use response::{PatentView, QueryResponse};
pub use service::GatewayService;
