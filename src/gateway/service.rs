//! # 网关服务
//!
//! 请求级流程编排。认证失败在任何计费工作之前拒绝、不计量；
//! 认证通过后的每次请求尝试（含被限流与失败的）都写入使用台账。

use chrono::Utc;
use std::sync::Arc;
use std::time::Instant;

use crate::auth::rate_limit::{RateLimiter, REASON_RATE_LIMIT_EXCEEDED};
use crate::auth::service::AuthService;
use crate::auth::types::PartnerKey;
use crate::enrich::pipeline::EnrichmentPipeline;
use crate::error::{GatewayError, Result};
use crate::gateway::response::{PatentView, QueryResponse};
use crate::metering::ledger::{UsageLedger, UsageRecord};
use crate::metering::pricing::billing_cost;
use crate::metrics::MetricsCollector;
use crate::patents::keywords::industry_keywords;
use crate::patents::orchestrator::ExpirationQueryOrchestrator;
use crate::patents::types::ExpirationQuery;

/// 到期查询端点标识
const ENDPOINT_EXPIRATIONS: &str = "/api/v1/expirations";

/// 网关服务
pub struct GatewayService {
    auth: AuthService,
    limiter: RateLimiter,
    orchestrator: ExpirationQueryOrchestrator,
    enrichment: EnrichmentPipeline,
    ledger: UsageLedger,
    metrics: Arc<MetricsCollector>,
    unit_price: f64,
}

impl GatewayService {
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        auth: AuthService,
        limiter: RateLimiter,
        orchestrator: ExpirationQueryOrchestrator,
        enrichment: EnrichmentPipeline,
        ledger: UsageLedger,
        metrics: Arc<MetricsCollector>,
        unit_price: f64,
    ) -> Self {
        Self {
            auth,
            limiter,
            orchestrator,
            enrichment,
            ledger,
            metrics,
            unit_price,
        }
    }

    /// 到期查询
    pub async fn expirations(
        &self,
        token: Option<&str>,
        query: &ExpirationQuery,
    ) -> Result<QueryResponse> {
        let key = self.auth.authenticate(token).await?;

        let started = Instant::now();
        let outcome = self.run_expirations(&key, query).await;
        let elapsed_ms = elapsed_ms(started);

        let (status, item_count) = match &outcome {
            Ok(response) => (200, response.count as u32),
            Err(e) => (e.to_response_parts().0, 0),
        };
        let cost = if status == 200 {
            billing_cost(item_count, self.unit_price)
        } else {
            0.0
        };

        self.ledger
            .record(UsageRecord::new(
                &key.id,
                ENDPOINT_EXPIRATIONS,
                "GET",
                serde_json::to_string(query).ok(),
                status,
                elapsed_ms,
                item_count,
                cost,
            ))
            .await;
        self.metrics
            .record_request(ENDPOINT_EXPIRATIONS, status, elapsed_ms);

        outcome
    }

    async fn run_expirations(
        &self,
        key: &PartnerKey,
        query: &ExpirationQuery,
    ) -> Result<QueryResponse> {
        let decision = self.limiter.admit(key).await;
        if !decision.allowed {
            tracing::warn!(
                partner = %key.partner_name,
                minute_count = decision.minute_count,
                day_count = decision.day_count,
                "请求被速率限制拒绝"
            );
            return Err(GatewayError::rate_limited(REASON_RATE_LIMIT_EXCEEDED));
        }
        self.limiter.record(&key.token).await;

        query.validate()?;
        let (start, end) = query.resolve_window(Utc::now().date_naive())?;
        let keywords = industry_keywords(query.industry.as_deref());

        let patents = self
            .orchestrator
            .query(start, end, &keywords, query.limit, query.offset)
            .await?;
        let enriched = self.enrichment.enrich_batch(patents, &keywords).await;

        let branding = query.branding && key.branding_enabled;
        Ok(QueryResponse::new(&enriched, branding, query.limit, query.offset))
    }

    /// 按专利号查询
    pub async fn patent_by_id(
        &self,
        token: Option<&str>,
        patent_id: &str,
    ) -> Result<Option<PatentView>> {
        let key = self.auth.authenticate(token).await?;
        let endpoint = format!("{ENDPOINT_EXPIRATIONS}/{patent_id}");

        let started = Instant::now();
        let outcome = self.run_patent_by_id(&key, patent_id).await;
        let elapsed_ms = elapsed_ms(started);

        let (status, item_count) = match &outcome {
            Ok(Some(_)) => (200, 1),
            Ok(None) => (404, 0),
            Err(e) => (e.to_response_parts().0, 0),
        };
        let cost = if status == 200 {
            billing_cost(item_count, self.unit_price)
        } else {
            0.0
        };

        self.ledger
            .record(UsageRecord::new(
                &key.id, &endpoint, "GET", None, status, elapsed_ms, item_count, cost,
            ))
            .await;
        self.metrics.record_request(&endpoint, status, elapsed_ms);

        outcome
    }

    async fn run_patent_by_id(
        &self,
        key: &PartnerKey,
        patent_id: &str,
    ) -> Result<Option<PatentView>> {
        let decision = self.limiter.admit(key).await;
        if !decision.allowed {
            return Err(GatewayError::rate_limited(REASON_RATE_LIMIT_EXCEEDED));
        }
        self.limiter.record(&key.token).await;

        let Some(mut patent) = self.orchestrator.get_by_id(patent_id).await? else {
            return Ok(None);
        };

        self.enrichment.enrich(&mut patent, &[]).await;
        Ok(Some(PatentView::from_record(&patent, key.branding_enabled)))
    }
}

fn elapsed_ms(started: Instant) -> f64 {
    #[allow(clippy::cast_precision_loss)]
    let ms = started.elapsed().as_secs_f64() * 1000.0;
    ms
}
