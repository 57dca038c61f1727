//! # 上游专利数据源客户端
//!
//! PatentsView 风格查询客户端与批量数据回退源。
//! 数据源只返回原始记录，日期换算与到期推导由编排器负责。

use async_trait::async_trait;
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::time::Duration;

use crate::config::UpstreamConfig;
use crate::error::{GatewayError, Result};

/// 原始发明人条目
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RawInventor {
    #[serde(default)]
    pub inventor_first_name: Option<String>,
    #[serde(default)]
    pub inventor_last_name: Option<String>,
}

/// 原始权利人条目
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RawAssignee {
    #[serde(default)]
    pub assignee_organization: Option<String>,
}

/// 上游返回的原始专利记录
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RawPatent {
    #[serde(default)]
    pub patent_number: Option<String>,
    #[serde(default)]
    pub patent_title: Option<String>,
    #[serde(default)]
    pub patent_abstract: Option<String>,
    /// 授权日，上游原生格式 `%Y-%m-%d`
    #[serde(default)]
    pub patent_date: Option<String>,
    #[serde(default)]
    pub inventors: Vec<RawInventor>,
    #[serde(default)]
    pub assignees: Vec<RawAssignee>,
}

/// 上游检索响应体
#[derive(Debug, Deserialize)]
struct SearchResponse {
    #[serde(default)]
    patents: Vec<RawPatent>,
}

/// 专利数据源协作方契约
#[async_trait]
pub trait PatentSource: Send + Sync {
    /// 按授权日窗口检索，`keywords` 以 OR 语义做全文过滤
    async fn search(
        &self,
        grant_start: NaiveDate,
        grant_end: NaiveDate,
        keywords: &[String],
        limit: u32,
        offset: u32,
    ) -> Result<Vec<RawPatent>>;

    /// 按专利号查询单条记录
    async fn get(&self, patent_id: &str) -> Result<Option<RawPatent>>;
}

/// 响应字段列表
const RESPONSE_FIELDS: &[&str] = &[
    "patent_number",
    "patent_title",
    "patent_abstract",
    "patent_date",
    "inventor_last_name",
    "assignee_organization",
];

/// PatentsView 风格查询客户端
pub struct PatentsViewSource {
    client: reqwest::Client,
    base_url: String,
    api_key: String,
}

impl PatentsViewSource {
    /// 根据上游配置创建客户端
    pub fn new(config: &UpstreamConfig) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(config.timeout())
            .connect_timeout(Duration::from_secs(10))
            .build()
            .map_err(|e| GatewayError::network_with_source("创建 HTTP 客户端失败", e))?;

        Ok(Self {
            client,
            base_url: config.patentsview_url.clone(),
            api_key: config.api_key.clone(),
        })
    }

    /// 构建授权日窗口 + 关键词过滤的查询条件
    fn build_query(
        grant_start: NaiveDate,
        grant_end: NaiveDate,
        keywords: &[String],
    ) -> serde_json::Value {
        let date_query = serde_json::json!({
            "_gte": { "patent_date": grant_start.format("%Y-%m-%d").to_string() },
            "_lte": { "patent_date": grant_end.format("%Y-%m-%d").to_string() },
        });

        if keywords.is_empty() {
            return date_query;
        }

        let keyword_query = serde_json::json!({
            "_or": keywords
                .iter()
                .map(|keyword| serde_json::json!({ "_text_any": { "patent_abstract": keyword } }))
                .collect::<Vec<_>>(),
        });

        serde_json::json!({ "_and": [date_query, keyword_query] })
    }

    async fn post_query(&self, request_body: serde_json::Value) -> Result<Vec<RawPatent>> {
        let mut request = self.client.post(&self.base_url).json(&request_body);
        if !self.api_key.is_empty() {
            request = request.header("X-API-Key", &self.api_key);
        }

        let response = request
            .send()
            .await
            .map_err(|e| GatewayError::upstream_with_source("上游请求失败", e))?;

        let status = response.status();
        if !status.is_success() {
            return Err(crate::upstream_error!("上游返回错误状态: {}", status));
        }

        let body: SearchResponse = response
            .json()
            .await
            .map_err(|e| GatewayError::upstream_with_source("解析上游响应失败", e))?;

        Ok(body.patents)
    }
}

#[async_trait]
impl PatentSource for PatentsViewSource {
    async fn search(
        &self,
        grant_start: NaiveDate,
        grant_end: NaiveDate,
        keywords: &[String],
        limit: u32,
        offset: u32,
    ) -> Result<Vec<RawPatent>> {
        let query = Self::build_query(grant_start, grant_end, keywords);
        let request_body = serde_json::json!({
            "q": query,
            "f": RESPONSE_FIELDS,
            "o": {
                "per_page": limit,
                "page": offset / limit.max(1) + 1,
            },
        });

        self.post_query(request_body).await
    }

    async fn get(&self, patent_id: &str) -> Result<Option<RawPatent>> {
        let request_body = serde_json::json!({
            "q": { "patent_number": patent_id },
            "f": RESPONSE_FIELDS,
        });

        let mut patents = self.post_query(request_body).await?;
        if patents.is_empty() {
            Ok(None)
        } else {
            Ok(Some(patents.swap_remove(0)))
        }
    }
}

/// 批量数据回退源
///
/// 降级路径：主源失败时保证可用性。完整的批量数据解析不在当前实现范围内，
/// 端点可达时返回空结果集（而非部分/不一致数据）；不可达时报错。
pub struct BulkDataSource {
    client: reqwest::Client,
    base_url: String,
}

impl BulkDataSource {
    pub fn new(config: &UpstreamConfig) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(config.timeout())
            .connect_timeout(Duration::from_secs(10))
            .build()
            .map_err(|e| GatewayError::network_with_source("创建 HTTP 客户端失败", e))?;

        Ok(Self {
            client,
            base_url: config.bulk_data_url.clone(),
        })
    }

    async fn probe(&self) -> Result<()> {
        let response = self
            .client
            .head(&self.base_url)
            .send()
            .await
            .map_err(|e| GatewayError::upstream_with_source("批量数据源不可达", e))?;

        if response.status().is_server_error() {
            return Err(crate::upstream_error!(
                "批量数据源返回错误状态: {}",
                response.status()
            ));
        }
        Ok(())
    }
}

#[async_trait]
impl PatentSource for BulkDataSource {
    async fn search(
        &self,
        _grant_start: NaiveDate,
        _grant_end: NaiveDate,
        _keywords: &[String],
        _limit: u32,
        _offset: u32,
    ) -> Result<Vec<RawPatent>> {
        self.probe().await?;
        tracing::warn!("使用批量数据回退查询（降级，返回空结果集）");
        Ok(Vec::new())
    }

    async fn get(&self, _patent_id: &str) -> Result<Option<RawPatent>> {
        self.probe().await?;
        Ok(None)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn query_without_keywords_is_plain_date_window() {
        let query = PatentsViewSource::build_query(date(2004, 1, 1), date(2004, 12, 31), &[]);
        assert_eq!(query["_gte"]["patent_date"], "2004-01-01");
        assert_eq!(query["_lte"]["patent_date"], "2004-12-31");
        assert!(query.get("_and").is_none());
    }

    #[test]
    fn keywords_become_or_matched_text_filters() {
        let keywords = vec!["drug".to_string(), "medicine".to_string()];
        let query = PatentsViewSource::build_query(date(2004, 1, 1), date(2004, 12, 31), &keywords);

        let branches = query["_and"][1]["_or"].as_array().unwrap();
        assert_eq!(branches.len(), 2);
        assert_eq!(branches[0]["_text_any"]["patent_abstract"], "drug");
        assert_eq!(branches[1]["_text_any"]["patent_abstract"], "medicine");
    }

    #[test]
    fn raw_patent_tolerates_missing_fields() {
        let raw: RawPatent = serde_json::from_str(r#"{"patent_number": "US123"}"#).unwrap();
        assert_eq!(raw.patent_number.as_deref(), Some("US123"));
        assert!(raw.patent_date.is_none());
        assert!(raw.inventors.is_empty());
    }
}
