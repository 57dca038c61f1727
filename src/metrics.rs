//! # 进程内监控指标
//!
//! 显式注入、显式持有的指标收集器实例——不是环境单例，
//! 测试可以为每次运行注入全新实例。计数不跨重启持久化。

use serde::Serialize;
use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Mutex;

/// 延迟滚动窗口容量
const LATENCY_WINDOW: usize = 1000;

/// 指标收集器
pub struct MetricsCollector {
    requests_total: AtomicU64,
    webhook_delivered: AtomicU64,
    webhook_failed: AtomicU64,
    requests_by_status: Mutex<HashMap<u16, u64>>,
    requests_by_endpoint: Mutex<HashMap<String, u64>>,
    response_times_ms: Mutex<Vec<f64>>,
}

/// 指标快照
#[derive(Debug, Clone, Serialize)]
pub struct MetricsSnapshot {
    pub requests_total: u64,
    pub requests_by_status: HashMap<u16, u64>,
    pub requests_by_endpoint: HashMap<String, u64>,
    pub average_response_time_ms: f64,
    pub p95_response_time_ms: f64,
    pub webhook_delivered: u64,
    pub webhook_failed: u64,
}

impl MetricsCollector {
    #[must_use]
    pub fn new() -> Self {
        Self {
            requests_total: AtomicU64::new(0),
            webhook_delivered: AtomicU64::new(0),
            webhook_failed: AtomicU64::new(0),
            requests_by_status: Mutex::new(HashMap::new()),
            requests_by_endpoint: Mutex::new(HashMap::new()),
            response_times_ms: Mutex::new(Vec::new()),
        }
    }

    /// 记录一次请求
    pub fn record_request(&self, endpoint: &str, status: u16, elapsed_ms: f64) {
        self.requests_total.fetch_add(1, Ordering::Relaxed);

        {
            let mut by_status = self.requests_by_status.lock().unwrap();
            *by_status.entry(status).or_insert(0) += 1;
        }
        {
            let mut by_endpoint = self.requests_by_endpoint.lock().unwrap();
            *by_endpoint.entry(endpoint.to_string()).or_insert(0) += 1;
        }
        {
            // 只保留最近 LATENCY_WINDOW 条延迟样本
            let mut times = self.response_times_ms.lock().unwrap();
            times.push(elapsed_ms);
            if times.len() > LATENCY_WINDOW {
                let excess = times.len() - LATENCY_WINDOW;
                times.drain(..excess);
            }
        }
    }

    /// 记录一次 webhook 投递结果
    pub fn record_webhook(&self, delivered: bool) {
        if delivered {
            self.webhook_delivered.fetch_add(1, Ordering::Relaxed);
        } else {
            self.webhook_failed.fetch_add(1, Ordering::Relaxed);
        }
    }

    /// 生成当前快照
    #[must_use]
    pub fn snapshot(&self) -> MetricsSnapshot {
        let times = self.response_times_ms.lock().unwrap().clone();

        let average = if times.is_empty() {
            0.0
        } else {
            #[allow(clippy::cast_precision_loss)]
            let avg = times.iter().sum::<f64>() / times.len() as f64;
            (avg * 100.0).round() / 100.0
        };

        let p95 = if times.is_empty() {
            0.0
        } else {
            let mut sorted = times;
            sorted.sort_by(|a, b| a.partial_cmp(b).unwrap_or(std::cmp::Ordering::Equal));
            #[allow(clippy::cast_precision_loss, clippy::cast_possible_truncation, clippy::cast_sign_loss)]
            let index = ((sorted.len() as f64 * 0.95) as usize).min(sorted.len() - 1);
            sorted[index]
        };

        MetricsSnapshot {
            requests_total: self.requests_total.load(Ordering::Relaxed),
            requests_by_status: self.requests_by_status.lock().unwrap().clone(),
            requests_by_endpoint: self.requests_by_endpoint.lock().unwrap().clone(),
            average_response_time_ms: average,
            p95_response_time_ms: p95,
            webhook_delivered: self.webhook_delivered.load(Ordering::Relaxed),
            webhook_failed: self.webhook_failed.load(Ordering::Relaxed),
        }
    }
}

impl Default for MetricsCollector {
    fn default() -> Self {
        Self::new()
    }
}
