//! # 使用台账
//!
//! 每次请求（成功或失败）写入恰好一条不可变记录，供计费与分析使用。
//! 写入失败只记录日志，绝不向主请求路径抛出。

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::Arc;

use crate::metering::pricing::round2;
use crate::storage::UsageStore;

/// 一条使用记录
///
/// 写入后不可变；每次请求尝试恰好写入一次，不重试不去重。
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UsageRecord {
    /// 记录标识
    pub id: String,
    /// 所属密钥
    pub api_key_id: String,
    /// 端点标识
    pub endpoint: String,
    /// HTTP 方法
    pub method: String,
    /// 序列化后的查询参数
    pub query_params: Option<String>,
    /// 响应状态码
    pub response_status: u16,
    /// 响应延迟（毫秒）
    pub response_time_ms: f64,
    /// 返回结果条数
    pub item_count: u32,
    /// 计费成本
    pub cost: f64,
    /// 记录时间
    pub created_at: DateTime<Utc>,
}

impl UsageRecord {
    /// 构造一条新记录
    #[must_use]
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        api_key_id: &str,
        endpoint: &str,
        method: &str,
        query_params: Option<String>,
        response_status: u16,
        response_time_ms: f64,
        item_count: u32,
        cost: f64,
    ) -> Self {
        Self {
            id: uuid::Uuid::new_v4().to_string(),
            api_key_id: api_key_id.to_string(),
            endpoint: endpoint.to_string(),
            method: method.to_string(),
            query_params,
            response_status,
            response_time_ms,
            item_count,
            cost,
            created_at: Utc::now(),
        }
    }
}

/// 按密钥聚合的使用汇总（分析/计费查询用，线性扫描即可满足）
#[derive(Debug, Clone, Default, Serialize)]
pub struct UsageSummary {
    pub total_requests: u64,
    pub total_items: u64,
    pub total_cost: f64,
    pub avg_response_time_ms: f64,
    pub requests_by_endpoint: HashMap<String, u64>,
    pub requests_by_status: HashMap<u16, u64>,
}

/// 使用台账
pub struct UsageLedger {
    store: Arc<dyn UsageStore>,
}

impl UsageLedger {
    pub fn new(store: Arc<dyn UsageStore>) -> Self {
        Self { store }
    }

    /// 追加一条使用记录
    ///
    /// 存储失败只记录日志（log-and-continue），避免掩盖主请求路径。
    pub async fn record(&self, entry: UsageRecord) {
        if let Err(e) = self.store.insert(entry.clone()).await {
            tracing::warn!(
                api_key_id = %entry.api_key_id,
                endpoint = %entry.endpoint,
                error = %e,
                "使用记录写入失败"
            );
        }
    }

    /// 汇总某密钥在时间段内的使用情况
    pub async fn summarize(
        &self,
        api_key_id: &str,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
    ) -> crate::error::Result<UsageSummary> {
        let records = self.store.range(api_key_id, start, end).await?;

        let mut summary = UsageSummary::default();
        let mut total_time = 0.0;

        for record in &records {
            summary.total_requests += 1;
            summary.total_items += u64::from(record.item_count);
            summary.total_cost += record.cost;
            total_time += record.response_time_ms;
            *summary
                .requests_by_endpoint
                .entry(record.endpoint.clone())
                .or_insert(0) += 1;
            *summary
                .requests_by_status
                .entry(record.response_status)
                .or_insert(0) += 1;
        }

        summary.total_cost = round2(summary.total_cost);
        if summary.total_requests > 0 {
            #[allow(clippy::cast_precision_loss)]
            let avg = total_time / summary.total_requests as f64;
            summary.avg_response_time_ms = round2(avg);
        }

        Ok(summary)
    }
}
