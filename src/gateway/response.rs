//! # 响应格式化

use serde::{Deserialize, Serialize};

use crate::patents::types::PatentRecord;

/// 品牌标识文本
const BRANDING: &str = "Patent Gateway API";

/// 对外返回的专利视图
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PatentView {
    pub patent_id: String,
    pub title: String,
    #[serde(rename = "abstract")]
    pub abstract_text: String,
    pub expiration_date: chrono::NaiveDate,
    pub grant_date: chrono::NaiveDate,
    pub inventor: Option<String>,
    pub assignee: Option<String>,
    pub technology_area: Option<String>,
    pub summary: Option<String>,
    pub relevance_score: Option<f64>,
    /// 品牌标识；白标响应时省略
    #[serde(skip_serializing_if = "Option::is_none")]
    pub powered_by: Option<String>,
}

impl PatentView {
    /// 由专利记录构造响应视图
    #[must_use]
    pub fn from_record(record: &PatentRecord, branding: bool) -> Self {
        Self {
            patent_id: record.patent_id.clone(),
            title: record.title.clone(),
            abstract_text: record.abstract_text.clone(),
            expiration_date: record.expiration_date,
            grant_date: record.grant_date,
            inventor: record.inventor.clone(),
            assignee: record.assignee.clone(),
            technology_area: record.technology_area.clone(),
            summary: record.ai_summary.clone(),
            relevance_score: record.relevance_score,
            powered_by: branding.then(|| BRANDING.to_string()),
        }
    }
}

/// 到期查询响应
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct QueryResponse {
    pub data: Vec<PatentView>,
    pub count: usize,
    pub limit: u32,
    pub offset: u32,
    pub total_estimated: usize,
}

impl QueryResponse {
    #[must_use]
    pub fn new(patents: &[PatentRecord], branding: bool, limit: u32, offset: u32) -> Self {
        let data: Vec<_> = patents
            .iter()
            .map(|record| PatentView::from_record(record, branding))
            .collect();
        let count = data.len();
        Self {
            data,
            count,
            limit,
            offset,
            total_estimated: count,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{NaiveDate, Utc};

    fn record() -> PatentRecord {
        let grant = NaiveDate::from_ymd_opt(2004, 1, 1).unwrap();
        PatentRecord {
            patent_id: "US100".to_string(),
            title: "Title".to_string(),
            abstract_text: "Abstract".to_string(),
            grant_date: grant,
            expiration_date: crate::patents::types::expiration_from_grant(grant),
            inventor: None,
            assignee: None,
            patent_type: "utility".to_string(),
            technology_area: None,
            ai_summary: Some("summary".to_string()),
            relevance_score: Some(0.5),
            cached_at: Utc::now(),
        }
    }

    #[test]
    fn branding_flag_controls_powered_by_field() {
        let branded = PatentView::from_record(&record(), true);
        assert_eq!(branded.powered_by.as_deref(), Some("Patent Gateway API"));

        let white_label = PatentView::from_record(&record(), false);
        assert!(white_label.powered_by.is_none());

        let json = serde_json::to_value(&white_label).unwrap();
        assert!(json.get("powered_by").is_none(), "白标响应不应包含品牌字段");
    }

    #[test]
    fn ai_summary_is_exposed_as_summary() {
        let view = PatentView::from_record(&record(), true);
        assert_eq!(view.summary.as_deref(), Some("summary"));
    }
}
