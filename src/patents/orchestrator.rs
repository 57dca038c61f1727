//! # 到期查询编排器
//!
//! 将验证后的查询转换为上游调用：缓存优先，主源失败回退批量数据源。
//! 缓存/计数器存储读取失败按缓存未命中处理（结果正确性优先）。

use chrono::{NaiveDate, Utc};
use sha2::{Digest, Sha256};
use std::sync::Arc;
use std::time::Duration;

use crate::cache::{CacheKey, CacheManager};
use crate::error::Result;
use crate::patents::source::{PatentSource, RawPatent};
use crate::patents::types::{expiration_from_grant, grant_window_for_expiration, PatentRecord};

/// 范围查询缓存 TTL（滑动到期窗口的成员变化较快）
const QUERY_CACHE_TTL: Duration = Duration::from_secs(3600);

/// 单专利缓存 TTL（单条专利的核心事实变化很少）
const PATENT_CACHE_TTL: Duration = Duration::from_secs(86_400);

/// 到期查询编排器
pub struct ExpirationQueryOrchestrator {
    source: Arc<dyn PatentSource>,
    fallback: Arc<dyn PatentSource>,
    cache: Arc<CacheManager>,
}

impl ExpirationQueryOrchestrator {
    pub fn new(
        source: Arc<dyn PatentSource>,
        fallback: Arc<dyn PatentSource>,
        cache: Arc<CacheManager>,
    ) -> Self {
        Self {
            source,
            fallback,
            cache,
        }
    }

    /// 规范化参数元组的稳定摘要，作为查询缓存键
    fn query_digest(
        start: NaiveDate,
        end: NaiveDate,
        keywords: &[String],
        limit: u32,
        offset: u32,
    ) -> String {
        let normalized = format!(
            "{start}|{end}|{}|{limit}|{offset}",
            keywords.join(",").to_lowercase()
        );
        hex::encode(Sha256::digest(normalized.as_bytes()))
    }

    /// 查询在 `[start, end]` 窗口（两端含）内到期的专利
    pub async fn query(
        &self,
        start: NaiveDate,
        end: NaiveDate,
        keywords: &[String],
        limit: u32,
        offset: u32,
    ) -> Result<Vec<PatentRecord>> {
        let cache_key = CacheKey::Query {
            digest: Self::query_digest(start, end, keywords, limit, offset),
        }
        .build();

        // 缓存读取失败视为未命中
        match self.cache.get::<Vec<PatentRecord>>(&cache_key).await {
            Ok(Some(cached)) => {
                tracing::debug!(key = %cache_key, "到期查询缓存命中");
                return Ok(cached);
            }
            Ok(None) => {}
            Err(e) => tracing::warn!(key = %cache_key, error = %e, "查询缓存读取失败，按未命中处理"),
        }

        let (grant_start, grant_end) = grant_window_for_expiration(start, end);

        let raw = match self
            .source
            .search(grant_start, grant_end, keywords, limit, offset)
            .await
        {
            Ok(raw) => raw,
            Err(primary_err) => {
                tracing::warn!(error = %primary_err, "主数据源查询失败，尝试批量数据回退");
                self.fallback
                    .search(grant_start, grant_end, keywords, limit, offset)
                    .await?
            }
        };

        let patents = Self::convert_raw(raw, Some((start, end)));

        if let Err(e) = self
            .cache
            .set(&cache_key, &patents, Some(QUERY_CACHE_TTL))
            .await
        {
            tracing::warn!(key = %cache_key, error = %e, "写入查询缓存失败");
        }

        Ok(patents)
    }

    /// 按专利号查询单条记录
    pub async fn get_by_id(&self, patent_id: &str) -> Result<Option<PatentRecord>> {
        let cache_key = CacheKey::Patent {
            patent_id: patent_id.to_string(),
        }
        .build();

        match self.cache.get::<PatentRecord>(&cache_key).await {
            Ok(Some(cached)) => return Ok(Some(cached)),
            Ok(None) => {}
            Err(e) => tracing::warn!(key = %cache_key, error = %e, "专利缓存读取失败，按未命中处理"),
        }

        let raw = match self.source.get(patent_id).await {
            Ok(raw) => raw,
            Err(primary_err) => {
                tracing::warn!(error = %primary_err, patent_id, "主数据源单条查询失败，尝试批量数据回退");
                self.fallback.get(patent_id).await?
            }
        };

        let Some(raw) = raw else {
            return Ok(None);
        };

        let Some(patent) = Self::convert_raw(vec![raw], None).pop() else {
            return Ok(None);
        };

        if let Err(e) = self
            .cache
            .set(&cache_key, &patent, Some(PATENT_CACHE_TTL))
            .await
        {
            tracing::warn!(key = %cache_key, error = %e, "写入专利缓存失败");
        }

        Ok(Some(patent))
    }

    /// 原始记录转换：解析授权日、推导到期日、按窗口过滤
    ///
    /// 缺失或无法解析授权日的记录跳过。
    fn convert_raw(
        raw: Vec<RawPatent>,
        window: Option<(NaiveDate, NaiveDate)>,
    ) -> Vec<PatentRecord> {
        let now = Utc::now();
        let mut records = Vec::with_capacity(raw.len());

        for patent in raw {
            let patent_id = match patent.patent_number {
                Some(ref id) if !id.is_empty() => id.clone(),
                _ => continue,
            };

            let Some(grant_date) = patent
                .patent_date
                .as_deref()
                .and_then(|s| NaiveDate::parse_from_str(s, "%Y-%m-%d").ok())
            else {
                tracing::warn!(patent_id, "授权日缺失或无法解析，跳过");
                continue;
            };

            let expiration_date = expiration_from_grant(grant_date);

            if let Some((start, end)) = window {
                if expiration_date < start || expiration_date > end {
                    continue;
                }
            }

            let inventor = if patent.inventors.is_empty() {
                None
            } else {
                Some(
                    patent
                        .inventors
                        .iter()
                        .take(3)
                        .map(|inv| {
                            format!(
                                "{}, {}",
                                inv.inventor_last_name.as_deref().unwrap_or(""),
                                inv.inventor_first_name.as_deref().unwrap_or("")
                            )
                        })
                        .collect::<Vec<_>>()
                        .join(", "),
                )
            };

            let assignee = patent
                .assignees
                .first()
                .and_then(|a| a.assignee_organization.clone());

            records.push(PatentRecord {
                patent_id,
                title: patent
                    .patent_title
                    .unwrap_or_else(|| "Untitled Patent".to_string()),
                abstract_text: patent.patent_abstract.unwrap_or_default(),
                grant_date,
                expiration_date,
                inventor,
                assignee,
                patent_type: "utility".to_string(),
                technology_area: None,
                ai_summary: None,
                relevance_score: None,
                cached_at: now,
            });
        }

        records
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::GatewayError;
    use crate::patents::source::{RawAssignee, RawInventor};
    use async_trait::async_trait;
    use std::sync::atomic::{AtomicU32, Ordering};

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn raw(id: &str, grant: &str) -> RawPatent {
        RawPatent {
            patent_number: Some(id.to_string()),
            patent_title: Some(format!("Patent {id}")),
            patent_abstract: Some("A pharmaceutical composition".to_string()),
            patent_date: Some(grant.to_string()),
            ..Default::default()
        }
    }

    /// 固定返回集的桩数据源，记录调用次数
    struct StubSource {
        patents: Vec<RawPatent>,
        calls: AtomicU32,
        fail: bool,
    }

    impl StubSource {
        fn ok(patents: Vec<RawPatent>) -> Self {
            Self {
                patents,
                calls: AtomicU32::new(0),
                fail: false,
            }
        }

        fn failing() -> Self {
            Self {
                patents: Vec::new(),
                calls: AtomicU32::new(0),
                fail: true,
            }
        }

        fn call_count(&self) -> u32 {
            self.calls.load(Ordering::SeqCst)
        }
    }

    #[async_trait]
    impl PatentSource for StubSource {
        async fn search(
            &self,
            _grant_start: NaiveDate,
            _grant_end: NaiveDate,
            _keywords: &[String],
            _limit: u32,
            _offset: u32,
        ) -> Result<Vec<RawPatent>> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            if self.fail {
                return Err(GatewayError::upstream("模拟上游失败"));
            }
            Ok(self.patents.clone())
        }

        async fn get(&self, patent_id: &str) -> Result<Option<RawPatent>> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            if self.fail {
                return Err(GatewayError::upstream("模拟上游失败"));
            }
            Ok(self
                .patents
                .iter()
                .find(|p| p.patent_number.as_deref() == Some(patent_id))
                .cloned())
        }
    }

    fn orchestrator(
        source: Arc<StubSource>,
        fallback: Arc<StubSource>,
    ) -> ExpirationQueryOrchestrator {
        ExpirationQueryOrchestrator::new(source, fallback, Arc::new(CacheManager::memory_only()))
    }

    #[tokio::test]
    async fn grant_date_2004_expires_on_exact_day_boundary() {
        let source = Arc::new(StubSource::ok(vec![raw("US100", "2004-01-01")]));
        let orch = orchestrator(source.clone(), Arc::new(StubSource::ok(vec![])));

        // 到期日 2024-01-01 落在单日窗口内
        let hit = orch
            .query(date(2024, 1, 1), date(2024, 1, 1), &[], 50, 0)
            .await
            .unwrap();
        assert_eq!(hit.len(), 1);
        assert_eq!(hit[0].expiration_date, date(2024, 1, 1));

        // 前一天的窗口不包含
        let miss = orch
            .query(date(2023, 12, 31), date(2023, 12, 31), &[], 50, 0)
            .await
            .unwrap();
        assert!(miss.is_empty());
    }

    #[tokio::test]
    async fn identical_query_shapes_hit_cache() {
        let source = Arc::new(StubSource::ok(vec![raw("US100", "2004-06-01")]));
        let orch = orchestrator(source.clone(), Arc::new(StubSource::ok(vec![])));

        let window = (date(2024, 1, 1), date(2024, 12, 31));
        let first = orch.query(window.0, window.1, &[], 50, 0).await.unwrap();
        let second = orch.query(window.0, window.1, &[], 50, 0).await.unwrap();

        assert_eq!(first, second);
        assert_eq!(source.call_count(), 1, "第二次查询应命中缓存");
    }

    #[tokio::test]
    async fn different_offsets_are_distinct_cache_shapes() {
        let source = Arc::new(StubSource::ok(vec![]));
        let orch = orchestrator(source.clone(), Arc::new(StubSource::ok(vec![])));

        let window = (date(2024, 1, 1), date(2024, 12, 31));
        orch.query(window.0, window.1, &[], 50, 0).await.unwrap();
        orch.query(window.0, window.1, &[], 50, 50).await.unwrap();

        assert_eq!(source.call_count(), 2);
    }

    #[tokio::test]
    async fn primary_failure_falls_back_to_bulk_source() {
        let fallback = Arc::new(StubSource::ok(vec![raw("US200", "2004-06-01")]));
        let orch = orchestrator(Arc::new(StubSource::failing()), fallback.clone());

        let result = orch
            .query(date(2024, 1, 1), date(2024, 12, 31), &[], 50, 0)
            .await
            .unwrap();
        assert_eq!(result.len(), 1);
        assert_eq!(fallback.call_count(), 1);
    }

    #[tokio::test]
    async fn both_sources_failing_surfaces_error() {
        let orch = orchestrator(Arc::new(StubSource::failing()), Arc::new(StubSource::failing()));

        let err = orch
            .query(date(2024, 1, 1), date(2024, 12, 31), &[], 50, 0)
            .await
            .unwrap_err();
        assert_eq!(err.to_response_parts().0, 500);
    }

    #[tokio::test]
    async fn get_by_id_caches_for_repeat_lookups() {
        let source = Arc::new(StubSource::ok(vec![raw("US300", "2010-03-15")]));
        let orch = orchestrator(source.clone(), Arc::new(StubSource::ok(vec![])));

        let first = orch.get_by_id("US300").await.unwrap().unwrap();
        let second = orch.get_by_id("US300").await.unwrap().unwrap();

        assert_eq!(first.patent_id, "US300");
        assert_eq!(first.expiration_date, date(2030, 3, 15));
        assert_eq!(first, second);
        assert_eq!(source.call_count(), 1);
    }

    #[tokio::test]
    async fn records_without_grant_date_are_skipped() {
        let mut bad = raw("US400", "2004-01-01");
        bad.patent_date = None;
        let source = Arc::new(StubSource::ok(vec![bad, raw("US401", "2004-06-01")]));
        let orch = orchestrator(source, Arc::new(StubSource::ok(vec![])));

        let result = orch
            .query(date(2024, 1, 1), date(2024, 12, 31), &[], 50, 0)
            .await
            .unwrap();
        assert_eq!(result.len(), 1);
        assert_eq!(result[0].patent_id, "US401");
    }

    #[tokio::test]
    async fn inventor_and_assignee_are_formatted() {
        let mut patent = raw("US500", "2004-06-01");
        patent.inventors = vec![
            RawInventor {
                inventor_first_name: Some("Ada".to_string()),
                inventor_last_name: Some("Lovelace".to_string()),
            },
            RawInventor {
                inventor_first_name: Some("Alan".to_string()),
                inventor_last_name: Some("Turing".to_string()),
            },
        ];
        patent.assignees = vec![RawAssignee {
            assignee_organization: Some("Acme Labs".to_string()),
        }];

        let records = ExpirationQueryOrchestrator::convert_raw(vec![patent], None);
        assert_eq!(
            records[0].inventor.as_deref(),
            Some("Lovelace, Ada, Turing, Alan")
        );
        assert_eq!(records[0].assignee.as_deref(), Some("Acme Labs"));
    }
}
