//! # 到期扫描
//!
//! 发现进入前瞻窗口（今天起 2 天内，远端按日含）的专利，
//! 对每个 (专利, 订阅) 对独立投递；单个端点的缓慢或不可达
//! 不影响其它投递。

use chrono::{NaiveDate, Utc};
use futures::stream::{self, StreamExt};
use std::sync::Arc;

use crate::error::Result;
use crate::metrics::MetricsCollector;
use crate::storage::{PatentStore, SubscriptionStore};
use crate::webhook::delivery::WebhookDeliverer;
use crate::webhook::types::EVENT_PATENT_EXPIRED;

/// 前瞻窗口天数
const LOOKAHEAD_DAYS: i64 = 2;

/// 单次扫描结果
#[derive(Debug, Clone, Default)]
pub struct SweepSummary {
    pub expiring_patents: usize,
    pub attempted: usize,
    pub delivered: usize,
}

/// 到期扫描器
pub struct ExpirationSweep {
    patents: Arc<dyn PatentStore>,
    subscriptions: Arc<dyn SubscriptionStore>,
    deliverer: Arc<WebhookDeliverer>,
    metrics: Arc<MetricsCollector>,
    concurrency: usize,
}

impl ExpirationSweep {
    pub fn new(
        patents: Arc<dyn PatentStore>,
        subscriptions: Arc<dyn SubscriptionStore>,
        deliverer: Arc<WebhookDeliverer>,
        metrics: Arc<MetricsCollector>,
        concurrency: usize,
    ) -> Self {
        Self {
            patents,
            subscriptions,
            deliverer,
            metrics,
            concurrency: concurrency.max(1),
        }
    }

    /// 执行一轮扫描
    pub async fn run_once(&self) -> Result<SweepSummary> {
        let today = Utc::now().date_naive();
        self.run_for_date(today).await
    }

    /// 以指定日期为"今天"执行扫描（测试入口）
    pub async fn run_for_date(&self, today: NaiveDate) -> Result<SweepSummary> {
        let end = today + chrono::Duration::days(LOOKAHEAD_DAYS);
        let expiring = self.patents.expiring_between(today, end).await?;

        if expiring.is_empty() {
            tracing::info!("前瞻窗口内没有到期专利");
            return Ok(SweepSummary::default());
        }

        let subscriptions = self.subscriptions.list_active().await?;
        if subscriptions.is_empty() {
            tracing::info!("没有激活的 webhook 订阅");
            return Ok(SweepSummary {
                expiring_patents: expiring.len(),
                ..SweepSummary::default()
            });
        }

        // 每个 (专利, 订阅) 对是一次独立投递
        let mut deliveries = Vec::new();
        for patent in &expiring {
            for subscription in &subscriptions {
                if subscription.accepts_event(EVENT_PATENT_EXPIRED) {
                    deliveries.push((patent.clone(), subscription.clone()));
                }
            }
        }

        let attempted = deliveries.len();
        let delivered = stream::iter(deliveries)
            .map(|(patent, subscription)| {
                let deliverer = Arc::clone(&self.deliverer);
                let metrics = Arc::clone(&self.metrics);
                async move {
                    let ok = deliverer
                        .deliver(
                            &subscription.url,
                            EVENT_PATENT_EXPIRED,
                            patent.to_event_data(),
                            subscription.secret.as_deref(),
                        )
                        .await;
                    metrics.record_webhook(ok);
                    if ok {
                        tracing::info!(
                            patent_id = %patent.patent_id,
                            url = %subscription.url,
                            "到期事件投递成功"
                        );
                    }
                    ok
                }
            })
            .buffer_unordered(self.concurrency)
            .filter(|ok| futures::future::ready(*ok))
            .count()
            .await;

        let summary = SweepSummary {
            expiring_patents: expiring.len(),
            attempted,
            delivered,
        };
        tracing::info!(
            patents = summary.expiring_patents,
            attempted = summary.attempted,
            delivered = summary.delivered,
            "到期扫描完成"
        );
        Ok(summary)
    }
}
