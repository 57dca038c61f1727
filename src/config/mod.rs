//! # 应用配置结构定义
//!
//! 从 TOML 文件加载配置，敏感字段支持环境变量覆盖

use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;

use crate::error::{GatewayError, Result};

/// 应用主配置结构
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    /// 日志级别
    pub log_level: Option<String>,
    /// 缓存配置
    pub cache: CacheConfig,
    /// 上游专利数据源配置
    pub upstream: UpstreamConfig,
    /// 摘要/富化服务配置
    pub enrichment: EnrichmentConfig,
    /// Webhook 投递配置
    pub webhook: WebhookConfig,
    /// 后台调度配置
    pub scheduler: SchedulerConfig,
    /// 速率限制默认值
    pub rate_limit: RateLimitConfig,
    /// 计费配置
    pub billing: BillingConfig,
}

/// 缓存类型
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CacheType {
    /// 内存缓存
    #[default]
    Memory,
    /// Redis缓存
    Redis,
}

/// 缓存配置
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct CacheConfig {
    /// 缓存类型
    pub cache_type: CacheType,
    /// 内存缓存最大条目数
    pub memory_max_entries: usize,
    /// 默认过期时间（秒）
    pub default_ttl: u64,
    /// Redis连接URL（`REDIS_URL` 环境变量可覆盖）
    pub redis_url: String,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            cache_type: CacheType::Memory,
            memory_max_entries: 10_000,
            default_ttl: 86_400,
            redis_url: "redis://127.0.0.1:6379/0".to_string(),
        }
    }
}

/// 上游专利数据源配置
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct UpstreamConfig {
    /// PatentsView 风格查询端点
    pub patentsview_url: String,
    /// 批量数据回退端点
    pub bulk_data_url: String,
    /// 上游 API 密钥（`UPSTREAM_API_KEY` 环境变量可覆盖）
    pub api_key: String,
    /// 单次上游调用超时（秒）
    pub timeout_secs: u64,
}

impl Default for UpstreamConfig {
    fn default() -> Self {
        Self {
            patentsview_url: "https://api.patentsview.org/patents/query".to_string(),
            bulk_data_url: "https://bulkdata.uspto.gov/data/patent".to_string(),
            api_key: String::new(),
            timeout_secs: 30,
        }
    }
}

impl UpstreamConfig {
    /// 上游调用超时
    #[must_use]
    pub const fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}

/// 摘要/富化服务配置
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct EnrichmentConfig {
    /// 是否启用外部摘要服务；禁用时选择空实现
    pub summarizer_enabled: bool,
    /// 摘要推理端点
    pub inference_url: String,
    /// 摘要模型名称
    pub model_name: String,
    /// 推理服务 API 密钥（`HF_API_KEY` 环境变量可覆盖）
    pub api_key: String,
    /// 摘要输入截断长度（字符）
    pub max_input_chars: usize,
    /// 摘要最大长度
    pub summary_max_len: usize,
    /// 摘要最小长度
    pub summary_min_len: usize,
    /// 单次摘要调用超时（秒）
    pub timeout_secs: u64,
}

impl Default for EnrichmentConfig {
    fn default() -> Self {
        Self {
            summarizer_enabled: false,
            inference_url: "https://api-inference.huggingface.co/models".to_string(),
            model_name: "facebook/bart-large-cnn".to_string(),
            api_key: String::new(),
            max_input_chars: 1024,
            summary_max_len: 150,
            summary_min_len: 50,
            timeout_secs: 30,
        }
    }
}

/// Webhook 投递配置
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct WebhookConfig {
    /// 最大投递尝试次数
    pub retry_attempts: u32,
    /// 首次重试延迟（秒），之后按指数退避
    pub retry_delay_secs: u64,
    /// 单次投递超时（秒）
    pub timeout_secs: u64,
    /// 扫描期并发投递上限
    pub sweep_concurrency: usize,
}

impl Default for WebhookConfig {
    fn default() -> Self {
        Self {
            retry_attempts: 3,
            retry_delay_secs: 5,
            timeout_secs: 30,
            sweep_concurrency: 8,
        }
    }
}

impl WebhookConfig {
    /// 首次重试延迟
    #[must_use]
    pub const fn retry_delay(&self) -> Duration {
        Duration::from_secs(self.retry_delay_secs)
    }

    /// 单次投递超时
    #[must_use]
    pub const fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}

/// 后台调度配置
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SchedulerConfig {
    /// 到期扫描间隔（秒）
    pub sweep_interval_secs: u64,
    /// 专利缓存刷新间隔（秒）
    pub refresh_interval_secs: u64,
    /// 刷新窗口天数
    pub refresh_window_days: i64,
    /// 单次刷新最大拉取条数
    pub refresh_limit: u32,
}

impl Default for SchedulerConfig {
    fn default() -> Self {
        Self {
            sweep_interval_secs: 3600,
            refresh_interval_secs: 86_400,
            refresh_window_days: 90,
            refresh_limit: 1000,
        }
    }
}

/// 速率限制默认值（新密钥的缺省配额）
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RateLimitConfig {
    /// 每分钟默认配额
    pub default_per_minute: i64,
    /// 每日默认配额
    pub default_per_day: i64,
}

impl Default for RateLimitConfig {
    fn default() -> Self {
        Self {
            default_per_minute: 60,
            default_per_day: 10_000,
        }
    }
}

/// 计费配置
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct BillingConfig {
    /// 单条结果计费单价
    pub unit_price: f64,
}

impl Default for BillingConfig {
    fn default() -> Self {
        Self { unit_price: 0.50 }
    }
}

impl AppConfig {
    /// 从 TOML 文件加载配置并应用环境变量覆盖
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .map_err(|e| GatewayError::config_with_source(format!("读取配置文件失败: {}", path.display()), e))?;

        let mut config: Self = toml::from_str(&content)
            .map_err(|e| GatewayError::config_with_source("解析配置文件失败", e))?;

        config.apply_env_overrides();
        config.validate()?;
        Ok(config)
    }

    /// 应用环境变量覆盖（仅敏感字段）
    pub fn apply_env_overrides(&mut self) {
        if let Ok(url) = std::env::var("REDIS_URL") {
            self.cache.redis_url = url;
        }
        if let Ok(key) = std::env::var("UPSTREAM_API_KEY") {
            self.upstream.api_key = key;
        }
        if let Ok(key) = std::env::var("HF_API_KEY") {
            self.enrichment.api_key = key;
        }
    }

    /// 验证配置的有效性
    pub fn validate(&self) -> Result<()> {
        crate::ensure_valid!(
            !self.upstream.patentsview_url.is_empty(),
            "upstream.patentsview_url 不能为空"
        );
        crate::ensure_valid!(self.webhook.retry_attempts >= 1, "webhook.retry_attempts 至少为 1");
        crate::ensure_valid!(self.webhook.sweep_concurrency >= 1, "webhook.sweep_concurrency 至少为 1");
        crate::ensure_valid!(self.rate_limit.default_per_minute > 0, "rate_limit.default_per_minute 必须为正");
        crate::ensure_valid!(self.rate_limit.default_per_day > 0, "rate_limit.default_per_day 必须为正");
        crate::ensure_valid!(self.billing.unit_price >= 0.0, "billing.unit_price 不能为负");
        if matches!(self.cache.cache_type, CacheType::Redis) {
            crate::ensure_valid!(!self.cache.redis_url.is_empty(), "cache.redis_url 不能为空");
        }
        Ok(())
    }
}
