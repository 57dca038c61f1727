//! # 专利缓存刷新任务
//!
//! 周期性拉取未来窗口内到期的专利，富化后 upsert 进专利存储，
//! 供到期扫描与查询路径使用。

use chrono::Utc;
use std::sync::Arc;

use crate::enrich::pipeline::EnrichmentPipeline;
use crate::error::Result;
use crate::patents::orchestrator::ExpirationQueryOrchestrator;
use crate::storage::PatentStore;

/// 专利缓存刷新任务
pub struct PatentCacheRefresh {
    orchestrator: ExpirationQueryOrchestrator,
    enrichment: EnrichmentPipeline,
    patents: Arc<dyn PatentStore>,
    window_days: i64,
    limit: u32,
}

impl PatentCacheRefresh {
    pub fn new(
        orchestrator: ExpirationQueryOrchestrator,
        enrichment: EnrichmentPipeline,
        patents: Arc<dyn PatentStore>,
        window_days: i64,
        limit: u32,
    ) -> Self {
        Self {
            orchestrator,
            enrichment,
            patents,
            window_days,
            limit,
        }
    }

    /// 执行一轮刷新，返回更新条数
    pub async fn run_once(&self) -> Result<usize> {
        let today = Utc::now().date_naive();
        let end = today + chrono::Duration::days(self.window_days);

        let raw = self.orchestrator.query(today, end, &[], self.limit, 0).await?;
        let enriched = self.enrichment.enrich_batch(raw, &[]).await;

        let mut updated = 0;
        for patent in enriched {
            let patent_id = patent.patent_id.clone();
            if let Err(e) = self.patents.upsert(patent).await {
                tracing::warn!(patent_id, error = %e, "专利缓存写入失败");
            } else {
                updated += 1;
            }
        }

        tracing::info!(updated, "专利缓存刷新完成");
        Ok(updated)
    }
}
