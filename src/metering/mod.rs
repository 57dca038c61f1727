//! # 使用计量
//!
//! 追加式使用台账与计费成本计算

pub mod ledger;
pub mod pricing;

pub use ledger::{UsageLedger, UsageRecord, UsageSummary};
