//! # 富化管道
//!
//! 对单条专利依次执行摘要、分类、评分；三步独立，互不阻塞。
//! 批量富化后按相关度降序稳定排序。

use std::sync::Arc;

use crate::config::EnrichmentConfig;
use crate::enrich::classify::classify_technology_area;
use crate::enrich::relevance::relevance_score;
use crate::enrich::summarizer::Summarizer;
use crate::patents::types::PatentRecord;

/// 富化管道
pub struct EnrichmentPipeline {
    summarizer: Arc<dyn Summarizer>,
    max_input_chars: usize,
    summary_max_len: usize,
    summary_min_len: usize,
}

impl EnrichmentPipeline {
    pub fn new(summarizer: Arc<dyn Summarizer>, config: &EnrichmentConfig) -> Self {
        Self {
            summarizer,
            max_input_chars: config.max_input_chars,
            summary_max_len: config.summary_max_len,
            summary_min_len: config.summary_min_len,
        }
    }

    /// 富化单条专利记录
    pub async fn enrich(&self, patent: &mut PatentRecord, keywords: &[String]) {
        // 摘要：超出预算的输入先截断再调用；None 表示无摘要可用
        if !patent.abstract_text.is_empty() {
            let input: String = patent
                .abstract_text
                .chars()
                .take(self.max_input_chars)
                .collect();
            patent.ai_summary = self
                .summarizer
                .summarize(&input, self.summary_max_len, self.summary_min_len)
                .await;
        }

        patent.technology_area =
            classify_technology_area(&patent.title, &patent.abstract_text).map(String::from);

        patent.relevance_score = Some(relevance_score(
            &patent.title,
            &patent.abstract_text,
            patent.technology_area.as_deref(),
            keywords,
        ));
    }

    /// 批量富化并按相关度降序排序（稳定：并列保持输入相对顺序）
    pub async fn enrich_batch(
        &self,
        mut patents: Vec<PatentRecord>,
        keywords: &[String],
    ) -> Vec<PatentRecord> {
        for patent in &mut patents {
            self.enrich(patent, keywords).await;
        }

        patents.sort_by(|a, b| {
            let score_a = a.relevance_score.unwrap_or(0.0);
            let score_b = b.relevance_score.unwrap_or(0.0);
            score_b
                .partial_cmp(&score_a)
                .unwrap_or(std::cmp::Ordering::Equal)
        });

        patents
    }
}
