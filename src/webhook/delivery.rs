//! # Webhook 投递
//!
//! 至少一次投递：有界重试 + 指数退避。最终失败只记录日志，
//! 没有死信队列或持久化失败记录（这是设计的显式限制）。

use async_trait::async_trait;
use std::sync::Arc;
use std::time::Duration;

use crate::config::WebhookConfig;
use crate::error::{GatewayError, Result};
use crate::webhook::signature::{sign_payload, SIGNATURE_HEADER};
use crate::webhook::types::WebhookEnvelope;

/// 投递 User-Agent
const USER_AGENT: &str = "Patent-Gateway/0.1";

/// 通知传输协作方契约
#[async_trait]
pub trait NotificationTransport: Send + Sync {
    /// 发送一次 POST，返回响应状态码；超时与网络错误返回 Err
    async fn post(
        &self,
        url: &str,
        headers: &[(String, String)],
        body: &[u8],
        timeout: Duration,
    ) -> Result<u16>;
}

/// reqwest 实现
pub struct HttpTransport {
    client: reqwest::Client,
}

impl HttpTransport {
    pub fn new() -> Result<Self> {
        let client = reqwest::Client::builder()
            .connect_timeout(Duration::from_secs(10))
            .build()
            .map_err(|e| GatewayError::network_with_source("创建 HTTP 客户端失败", e))?;
        Ok(Self { client })
    }
}

#[async_trait]
impl NotificationTransport for HttpTransport {
    async fn post(
        &self,
        url: &str,
        headers: &[(String, String)],
        body: &[u8],
        timeout: Duration,
    ) -> Result<u16> {
        let mut request = self.client.post(url).timeout(timeout);
        for (name, value) in headers {
            request = request.header(name, value);
        }

        let response = request
            .body(body.to_vec())
            .send()
            .await
            .map_err(|e| GatewayError::network_with_source(format!("webhook 投递失败: {url}"), e))?;

        Ok(response.status().as_u16())
    }
}

/// Webhook 投递器
pub struct WebhookDeliverer {
    transport: Arc<dyn NotificationTransport>,
    retry_attempts: u32,
    retry_delay: Duration,
    timeout: Duration,
}

impl WebhookDeliverer {
    pub fn new(transport: Arc<dyn NotificationTransport>, config: &WebhookConfig) -> Self {
        Self {
            transport,
            retry_attempts: config.retry_attempts,
            retry_delay: config.retry_delay(),
            timeout: config.timeout(),
        }
    }

    /// 投递一个事件到目标端点
    ///
    /// 负载只序列化一次并在所有重试间复用；任意一次 2xx 即成功。
    /// 全部尝试耗尽后放弃并记录日志，返回 `false`。
    pub async fn deliver(
        &self,
        url: &str,
        event_type: &str,
        data: serde_json::Value,
        secret: Option<&str>,
    ) -> bool {
        let envelope = WebhookEnvelope::new(event_type, data);
        let payload = match serde_json::to_vec(&envelope) {
            Ok(payload) => payload,
            Err(e) => {
                tracing::error!(url, event_type, error = %e, "序列化 webhook 负载失败");
                return false;
            }
        };

        let mut headers = vec![
            ("Content-Type".to_string(), "application/json".to_string()),
            ("User-Agent".to_string(), USER_AGENT.to_string()),
        ];
        if let Some(secret) = secret {
            headers.push((SIGNATURE_HEADER.to_string(), sign_payload(secret, &payload)));
        }

        for attempt in 1..=self.retry_attempts {
            match self
                .transport
                .post(url, &headers, &payload, self.timeout)
                .await
            {
                Ok(status) if (200..300).contains(&status) => {
                    tracing::info!(url, event_type, attempt, "webhook 投递成功");
                    return true;
                }
                Ok(status) => {
                    tracing::warn!(url, event_type, attempt, status, "webhook 投递被拒绝");
                }
                Err(e) => {
                    tracing::warn!(url, event_type, attempt, error = %e, "webhook 投递出错");
                }
            }

            // 指数退避：delay = base * 2^(attempt-1)
            if attempt < self.retry_attempts {
                let delay = self.retry_delay * 2u32.pow(attempt - 1);
                tokio::time::sleep(delay).await;
            }
        }

        tracing::error!(
            url,
            event_type,
            attempts = self.retry_attempts,
            "webhook 投递在全部尝试耗尽后放弃"
        );
        false
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::webhook::signature::verify_signature;
    use std::sync::Mutex;
    use std::time::Instant;

    /// 记录每次调用并按脚本返回结果的桩传输
    struct ScriptedTransport {
        script: Mutex<Vec<Result<u16>>>,
        calls: Mutex<Vec<(String, Vec<(String, String)>, Vec<u8>, Instant)>>,
    }

    impl ScriptedTransport {
        fn new(script: Vec<Result<u16>>) -> Self {
            Self {
                script: Mutex::new(script),
                calls: Mutex::new(Vec::new()),
            }
        }
    }

    #[async_trait]
    impl NotificationTransport for ScriptedTransport {
        async fn post(
            &self,
            url: &str,
            headers: &[(String, String)],
            body: &[u8],
            _timeout: Duration,
        ) -> Result<u16> {
            self.calls.lock().unwrap().push((
                url.to_string(),
                headers.to_vec(),
                body.to_vec(),
                Instant::now(),
            ));
            let mut script = self.script.lock().unwrap();
            if script.is_empty() {
                Ok(200)
            } else {
                script.remove(0)
            }
        }
    }

    fn deliverer(transport: Arc<ScriptedTransport>, base_delay_ms: u64) -> WebhookDeliverer {
        WebhookDeliverer {
            transport,
            retry_attempts: 3,
            retry_delay: Duration::from_millis(base_delay_ms),
            timeout: Duration::from_secs(5),
        }
    }

    #[tokio::test]
    async fn first_attempt_success_stops_retrying() {
        let transport = Arc::new(ScriptedTransport::new(vec![Ok(200)]));
        let ok = deliverer(transport.clone(), 1)
            .deliver("https://example.com/hook", "patent.expired", serde_json::json!({}), None)
            .await;

        assert!(ok);
        assert_eq!(transport.calls.lock().unwrap().len(), 1);
    }

    #[tokio::test]
    async fn two_failures_then_success_uses_three_attempts() {
        let transport = Arc::new(ScriptedTransport::new(vec![Ok(500), Ok(500), Ok(200)]));
        let ok = deliverer(transport.clone(), 1)
            .deliver("https://example.com/hook", "patent.expired", serde_json::json!({}), None)
            .await;

        assert!(ok);
        assert_eq!(transport.calls.lock().unwrap().len(), 3);
    }

    #[tokio::test]
    async fn attempts_never_exceed_configured_maximum() {
        let transport = Arc::new(ScriptedTransport::new(vec![
            Err(GatewayError::network("连接被拒绝")),
            Ok(503),
            Ok(500),
            Ok(200),
        ]));
        let ok = deliverer(transport.clone(), 1)
            .deliver("https://example.com/hook", "patent.expired", serde_json::json!({}), None)
            .await;

        assert!(!ok);
        assert_eq!(transport.calls.lock().unwrap().len(), 3);
    }

    #[tokio::test]
    async fn payload_bytes_are_reused_across_attempts() {
        let transport = Arc::new(ScriptedTransport::new(vec![Ok(500), Ok(500), Ok(200)]));
        deliverer(transport.clone(), 1)
            .deliver(
                "https://example.com/hook",
                "patent.expired",
                serde_json::json!({"patent_id": "US100"}),
                Some("partner-secret"),
            )
            .await;

        let calls = transport.calls.lock().unwrap();
        assert_eq!(calls.len(), 3);

        let first_body = &calls[0].2;
        for (_, headers, body, _) in calls.iter() {
            assert_eq!(body, first_body, "重试必须复用同一份负载字节");
            let signature = headers
                .iter()
                .find(|(name, _)| name == SIGNATURE_HEADER)
                .map(|(_, value)| value.clone())
                .expect("有密钥时必须带签名头");
            assert!(verify_signature(&signature, "partner-secret", body));
        }
    }

    #[tokio::test]
    async fn unsigned_delivery_omits_signature_header() {
        let transport = Arc::new(ScriptedTransport::new(vec![Ok(200)]));
        deliverer(transport.clone(), 1)
            .deliver("https://example.com/hook", "patent.expired", serde_json::json!({}), None)
            .await;

        let calls = transport.calls.lock().unwrap();
        assert!(calls[0].1.iter().all(|(name, _)| name != SIGNATURE_HEADER));
    }

    #[tokio::test]
    async fn backoff_delays_grow_exponentially() {
        let transport = Arc::new(ScriptedTransport::new(vec![Ok(500), Ok(500), Ok(500)]));
        deliverer(transport.clone(), 40)
            .deliver("https://example.com/hook", "patent.expired", serde_json::json!({}), None)
            .await;

        let calls = transport.calls.lock().unwrap();
        assert_eq!(calls.len(), 3);

        // 尝试 1→2 间隔约 base，2→3 间隔约 2×base
        let gap1 = calls[1].3.duration_since(calls[0].3);
        let gap2 = calls[2].3.duration_since(calls[1].3);
        assert!(gap1 >= Duration::from_millis(35), "gap1 = {gap1:?}");
        assert!(gap2 >= Duration::from_millis(75), "gap2 = {gap2:?}");
        assert!(gap2 > gap1);
    }
}
