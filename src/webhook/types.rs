//! # Webhook 数据模型

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// 专利到期事件名
pub const EVENT_PATENT_EXPIRED: &str = "patent.expired";

/// 合作方注册的投递目标
///
/// (所属密钥, 目标 URL) 组合唯一；显式注册创建、显式移除删除，无隐式过期。
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WebhookSubscription {
    /// 订阅标识
    pub id: String,
    /// 所属密钥
    pub api_key_id: String,
    /// 目标 URL
    pub url: String,
    /// 签名密钥；为空表示未签名投递（合作方自行选择）
    pub secret: Option<String>,
    /// 激活标志
    pub is_active: bool,
    /// 订阅的事件名集合；空集合表示订阅全部事件
    pub events: Vec<String>,
    /// 创建时间
    pub created_at: DateTime<Utc>,
    /// 更新时间
    pub updated_at: DateTime<Utc>,
}

impl WebhookSubscription {
    /// 注册新订阅
    #[must_use]
    pub fn register(
        api_key_id: &str,
        url: &str,
        secret: Option<String>,
        events: Vec<String>,
    ) -> Self {
        let now = Utc::now();
        Self {
            id: uuid::Uuid::new_v4().to_string(),
            api_key_id: api_key_id.to_string(),
            url: url.to_string(),
            secret,
            is_active: true,
            events,
            created_at: now,
            updated_at: now,
        }
    }

    /// 判断订阅是否接收指定事件（空集合 = 全部事件）
    #[must_use]
    pub fn accepts_event(&self, event: &str) -> bool {
        self.events.is_empty() || self.events.iter().any(|e| e == event)
    }
}

/// 事件负载信封
///
/// 整个投递过程只序列化一次；重试期间复用同一份字节，
/// 重新生成的时间戳会破坏接收端的签名校验。
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WebhookEnvelope {
    /// 事件名
    pub event: String,
    /// ISO-8601 UTC 时间戳
    pub timestamp: String,
    /// 事件数据
    pub data: serde_json::Value,
}

impl WebhookEnvelope {
    /// 以当前时刻构造信封
    #[must_use]
    pub fn new(event: &str, data: serde_json::Value) -> Self {
        Self {
            event: event.to_string(),
            timestamp: Utc::now().to_rfc3339(),
            data,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_event_set_accepts_everything() {
        let sub = WebhookSubscription::register("key-1", "https://example.com/hook", None, vec![]);
        assert!(sub.accepts_event(EVENT_PATENT_EXPIRED));
        assert!(sub.accepts_event("anything.else"));
    }

    #[test]
    fn named_event_set_filters() {
        let sub = WebhookSubscription::register(
            "key-1",
            "https://example.com/hook",
            None,
            vec![EVENT_PATENT_EXPIRED.to_string()],
        );
        assert!(sub.accepts_event(EVENT_PATENT_EXPIRED));
        assert!(!sub.accepts_event("other.event"));
    }

    #[test]
    fn envelope_serializes_expected_shape() {
        let envelope = WebhookEnvelope::new(EVENT_PATENT_EXPIRED, serde_json::json!({"id": 1}));
        let value = serde_json::to_value(&envelope).unwrap();
        assert_eq!(value["event"], "patent.expired");
        assert_eq!(value["data"]["id"], 1);
        assert!(value["timestamp"].is_string());
    }
}
