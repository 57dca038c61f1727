//! # 富化管道
//!
//! 摘要、技术领域分类与相关度评分。三个子步骤相互独立，
//! 任一失败不阻塞其余步骤；富化字段缺失是唯一可见影响。

pub mod classify;
pub mod pipeline;
pub mod relevance;
pub mod summarizer;

pub use pipeline::EnrichmentPipeline;
pub use summarizer::{HttpSummarizer, NullSummarizer, Summarizer};
