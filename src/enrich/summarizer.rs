//! # 摘要能力
//!
//! 外部文本摘要服务建模为启动时选定的能力接口：
//! 服务可用时选 HTTP 实现，不可用时选空实现。
//! 调用方必须把 `None` 当作"无摘要可用"，而非错误。

use async_trait::async_trait;
use serde::Deserialize;
use std::time::Duration;

use crate::config::EnrichmentConfig;
use crate::error::{GatewayError, Result};

/// 文本摘要协作方契约
#[async_trait]
pub trait Summarizer: Send + Sync {
    /// 生成摘要；服务缺失或出错返回 `None`
    async fn summarize(&self, text: &str, max_len: usize, min_len: usize) -> Option<String>;
}

/// 空实现：摘要服务不可用时选用
pub struct NullSummarizer;

#[async_trait]
impl Summarizer for NullSummarizer {
    async fn summarize(&self, _text: &str, _max_len: usize, _min_len: usize) -> Option<String> {
        None
    }
}

#[derive(Debug, Deserialize)]
struct InferenceOutput {
    #[serde(default)]
    summary_text: Option<String>,
}

/// HTTP 推理服务实现
pub struct HttpSummarizer {
    client: reqwest::Client,
    endpoint: String,
    api_key: String,
}

impl HttpSummarizer {
    pub fn new(config: &EnrichmentConfig) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .connect_timeout(Duration::from_secs(10))
            .build()
            .map_err(|e| GatewayError::network_with_source("创建 HTTP 客户端失败", e))?;

        Ok(Self {
            client,
            endpoint: format!(
                "{}/{}",
                config.inference_url.trim_end_matches('/'),
                config.model_name
            ),
            api_key: config.api_key.clone(),
        })
    }

    async fn call(&self, text: &str, max_len: usize, min_len: usize) -> Result<Option<String>> {
        let body = serde_json::json!({
            "inputs": text,
            "parameters": {
                "max_length": max_len,
                "min_length": min_len,
                "do_sample": false,
            },
        });

        let mut request = self.client.post(&self.endpoint).json(&body);
        if !self.api_key.is_empty() {
            request = request.bearer_auth(&self.api_key);
        }

        let response = request
            .send()
            .await
            .map_err(|e| GatewayError::network_with_source("摘要服务请求失败", e))?;

        if !response.status().is_success() {
            return Err(GatewayError::network(format!(
                "摘要服务返回错误状态: {}",
                response.status()
            )));
        }

        let outputs: Vec<InferenceOutput> = response
            .json()
            .await
            .map_err(|e| GatewayError::network_with_source("解析摘要响应失败", e))?;

        Ok(outputs.into_iter().next().and_then(|o| o.summary_text))
    }
}

#[async_trait]
impl Summarizer for HttpSummarizer {
    async fn summarize(&self, text: &str, max_len: usize, min_len: usize) -> Option<String> {
        if text.is_empty() {
            return None;
        }

        match self.call(text, max_len, min_len).await {
            Ok(summary) => summary,
            Err(e) => {
                tracing::warn!(error = %e, "摘要生成失败，按无摘要处理");
                None
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn null_summarizer_always_returns_none() {
        let summarizer = NullSummarizer;
        assert_eq!(summarizer.summarize("any text", 150, 50).await, None);
    }
}
