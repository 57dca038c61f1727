//! # 专利到期查询
//!
//! 专利记录模型、上游数据源客户端与查询编排器

pub mod keywords;
pub mod orchestrator;
pub mod source;
pub mod types;

pub use orchestrator::ExpirationQueryOrchestrator;
pub use source::{PatentSource, RawPatent};
pub use types::{DateRange, ExpirationQuery, PatentRecord};
