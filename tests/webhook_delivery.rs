//! Webhook 投递端到端测试（真实 HTTP 端点，wiremock）

use std::sync::Arc;
use std::time::Instant;

use wiremock::matchers::{header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

use patent_gateway::config::WebhookConfig;
use patent_gateway::webhook::delivery::{HttpTransport, WebhookDeliverer};
use patent_gateway::webhook::signature::verify_signature;

fn deliverer(retry_attempts: u32, retry_delay_secs: u64) -> WebhookDeliverer {
    let config = WebhookConfig {
        retry_attempts,
        retry_delay_secs,
        timeout_secs: 5,
        sweep_concurrency: 4,
    };
    WebhookDeliverer::new(Arc::new(HttpTransport::new().unwrap()), &config)
}

#[tokio::test]
async fn delivery_succeeds_on_first_2xx() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/hook"))
        .respond_with(ResponseTemplate::new(200))
        .expect(1)
        .mount(&server)
        .await;

    let ok = deliverer(3, 0)
        .deliver(
            &format!("{}/hook", server.uri()),
            "patent.expired",
            serde_json::json!({"patent_id": "US100"}),
            None,
        )
        .await;

    assert!(ok);
}

#[tokio::test]
async fn two_500s_then_200_succeeds_with_exactly_three_posts_and_growing_delays() {
    let server = MockServer::start().await;

    // 前两次 500，之后 200
    Mock::given(method("POST"))
        .and(path("/hook"))
        .respond_with(ResponseTemplate::new(500))
        .up_to_n_times(2)
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/hook"))
        .respond_with(ResponseTemplate::new(200))
        .mount(&server)
        .await;

    let started = Instant::now();
    let ok = deliverer(3, 1)
        .deliver(
            &format!("{}/hook", server.uri()),
            "patent.expired",
            serde_json::json!({"patent_id": "US100"}),
            None,
        )
        .await;
    let elapsed = started.elapsed();

    assert!(ok);

    let requests = server.received_requests().await.unwrap();
    assert_eq!(requests.len(), 3);

    // 退避间隔 base + 2×base = 3s（容差内）
    assert!(elapsed.as_secs_f64() >= 2.7, "elapsed = {elapsed:?}");
}

#[tokio::test]
async fn exhausted_retries_abandon_delivery() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/hook"))
        .respond_with(ResponseTemplate::new(503))
        .expect(3)
        .mount(&server)
        .await;

    let ok = deliverer(3, 0)
        .deliver(
            &format!("{}/hook", server.uri()),
            "patent.expired",
            serde_json::json!({}),
            None,
        )
        .await;

    assert!(!ok);
    assert_eq!(server.received_requests().await.unwrap().len(), 3);
}

#[tokio::test]
async fn signature_verifies_over_received_payload_bytes() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/hook"))
        .and(header("Content-Type", "application/json"))
        .respond_with(ResponseTemplate::new(500))
        .up_to_n_times(1)
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/hook"))
        .respond_with(ResponseTemplate::new(200))
        .mount(&server)
        .await;

    let ok = deliverer(2, 0)
        .deliver(
            &format!("{}/hook", server.uri()),
            "patent.expired",
            serde_json::json!({"patent_id": "US100", "title": "Drug patent"}),
            Some("partner-secret"),
        )
        .await;
    assert!(ok);

    let requests = server.received_requests().await.unwrap();
    assert_eq!(requests.len(), 2);

    let first_body = requests[0].body.clone();
    for request in &requests {
        // 负载字节在重试间完全一致（时间戳不因重试而再生）
        assert_eq!(request.body, first_body);

        let signature = request
            .headers
            .get("X-Webhook-Signature")
            .expect("签名头必须存在")
            .to_str()
            .unwrap();
        assert!(signature.starts_with("sha256="));
        assert!(verify_signature(signature, "partner-secret", &request.body));
        assert!(!verify_signature(signature, "wrong-secret", &request.body));
    }

    // 信封结构：event / timestamp / data
    let envelope: serde_json::Value = serde_json::from_slice(&first_body).unwrap();
    assert_eq!(envelope["event"], "patent.expired");
    assert_eq!(envelope["data"]["patent_id"], "US100");
    assert!(envelope["timestamp"].is_string());
}

#[tokio::test]
async fn unsigned_delivery_has_no_signature_header() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/hook"))
        .respond_with(ResponseTemplate::new(200))
        .mount(&server)
        .await;

    let ok = deliverer(1, 0)
        .deliver(
            &format!("{}/hook", server.uri()),
            "patent.expired",
            serde_json::json!({}),
            None,
        )
        .await;
    assert!(ok);

    let requests = server.received_requests().await.unwrap();
    assert!(requests[0].headers.get("X-Webhook-Signature").is_none());
}
