//! # 应用装配
//!
//! 按配置装配各组件并管理后台任务

pub mod refresh;
pub mod scheduler;

use std::sync::Arc;

use crate::auth::rate_limit::RateLimiter;
use crate::auth::service::AuthService;
use crate::cache::CacheManager;
use crate::config::{AppConfig, CacheType};
use crate::enrich::pipeline::EnrichmentPipeline;
use crate::enrich::summarizer::{HttpSummarizer, NullSummarizer, Summarizer};
use crate::error::Result;
use crate::gateway::service::GatewayService;
use crate::metering::ledger::UsageLedger;
use crate::metrics::MetricsCollector;
use crate::patents::orchestrator::ExpirationQueryOrchestrator;
use crate::patents::source::{BulkDataSource, PatentsViewSource};
use crate::storage::{KeyStore, PatentStore, SubscriptionStore, UsageStore};
use crate::webhook::delivery::{HttpTransport, WebhookDeliverer};
use crate::webhook::sweep::ExpirationSweep;

/// 持久化协作方句柄集合
pub struct Stores {
    pub keys: Arc<dyn KeyStore>,
    pub usage: Arc<dyn UsageStore>,
    pub subscriptions: Arc<dyn SubscriptionStore>,
    pub patents: Arc<dyn PatentStore>,
}

/// 应用上下文：装配完成的组件集合
pub struct AppContext {
    pub config: AppConfig,
    pub cache: Arc<CacheManager>,
    pub metrics: Arc<MetricsCollector>,
    pub gateway: Arc<GatewayService>,
    pub sweep: Arc<ExpirationSweep>,
    pub refresh: Arc<refresh::PatentCacheRefresh>,
}

impl AppContext {
    /// 按配置装配应用
    pub async fn build(config: AppConfig, stores: Stores) -> Result<Self> {
        let cache = Arc::new(match config.cache.cache_type {
            CacheType::Memory => {
                tracing::info!(
                    max_entries = config.cache.memory_max_entries,
                    "使用内存缓存"
                );
                CacheManager::memory(config.cache.memory_max_entries)
            }
            CacheType::Redis => {
                tracing::info!(url = %config.cache.redis_url, "使用 Redis 缓存");
                CacheManager::redis(&config.cache.redis_url).await?
            }
        });

        // 摘要能力在启动时选定：不可用选空实现
        let summarizer: Arc<dyn Summarizer> = if config.enrichment.summarizer_enabled {
            tracing::info!(model = %config.enrichment.model_name, "摘要服务已启用");
            Arc::new(HttpSummarizer::new(&config.enrichment)?)
        } else {
            tracing::info!("摘要服务未启用，AI 摘要字段将为空");
            Arc::new(NullSummarizer)
        };

        let metrics = Arc::new(MetricsCollector::new());

        let orchestrator = ExpirationQueryOrchestrator::new(
            Arc::new(PatentsViewSource::new(&config.upstream)?),
            Arc::new(BulkDataSource::new(&config.upstream)?),
            Arc::clone(&cache),
        );
        let enrichment = EnrichmentPipeline::new(Arc::clone(&summarizer), &config.enrichment);

        let gateway = Arc::new(GatewayService::new(
            AuthService::new(Arc::clone(&stores.keys)),
            RateLimiter::new(Arc::clone(&cache)),
            orchestrator,
            enrichment,
            UsageLedger::new(Arc::clone(&stores.usage)),
            Arc::clone(&metrics),
            config.billing.unit_price,
        ));

        let deliverer = Arc::new(WebhookDeliverer::new(
            Arc::new(HttpTransport::new()?),
            &config.webhook,
        ));
        let sweep = Arc::new(ExpirationSweep::new(
            Arc::clone(&stores.patents),
            Arc::clone(&stores.subscriptions),
            deliverer,
            Arc::clone(&metrics),
            config.webhook.sweep_concurrency,
        ));

        // 刷新任务与查询路径使用同一套编排与富化逻辑
        let refresh = Arc::new(refresh::PatentCacheRefresh::new(
            ExpirationQueryOrchestrator::new(
                Arc::new(PatentsViewSource::new(&config.upstream)?),
                Arc::new(BulkDataSource::new(&config.upstream)?),
                Arc::clone(&cache),
            ),
            EnrichmentPipeline::new(summarizer, &config.enrichment),
            Arc::clone(&stores.patents),
            config.scheduler.refresh_window_days,
            config.scheduler.refresh_limit,
        ));

        Ok(Self {
            config,
            cache,
            metrics,
            gateway,
            sweep,
            refresh,
        })
    }
}
