//! # 专利数据模型
//!
//! 专利记录、日期范围与查询参数定义

use chrono::{Datelike, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

use crate::error::Result;

/// 法定专利期限（自授权日起的日历年数）
pub const PATENT_TERM_YEARS: i32 = 20;

/// 查询分页上限
pub const MAX_QUERY_LIMIT: u32 = 1000;

/// 对日期加减日历年
///
/// 2 月 29 日在目标年非闰年时钳制到 2 月 28 日。
#[must_use]
pub fn add_years(date: NaiveDate, years: i32) -> NaiveDate {
    let year = date.year() + years;
    NaiveDate::from_ymd_opt(year, date.month(), date.day())
        .unwrap_or_else(|| NaiveDate::from_ymd_opt(year, 2, 28).expect("2 月 28 日恒有效"))
}

/// 由授权日推导到期日（授权日 + 20 个日历年）
#[must_use]
pub fn expiration_from_grant(grant_date: NaiveDate) -> NaiveDate {
    add_years(grant_date, PATENT_TERM_YEARS)
}

/// 由到期窗口反推授权日窗口（回移 20 个日历年）
#[must_use]
pub fn grant_window_for_expiration(start: NaiveDate, end: NaiveDate) -> (NaiveDate, NaiveDate) {
    (add_years(start, -PATENT_TERM_YEARS), add_years(end, -PATENT_TERM_YEARS))
}

/// 缓存的专利富化视图
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PatentRecord {
    /// 专利号（唯一）
    pub patent_id: String,
    /// 标题
    pub title: String,
    /// 摘要
    #[serde(rename = "abstract")]
    pub abstract_text: String,
    /// 授权日
    pub grant_date: NaiveDate,
    /// 到期日，恒等于授权日 + 20 年
    pub expiration_date: NaiveDate,
    /// 发明人（最多前 3 位，"姓, 名" 逗号连接）
    pub inventor: Option<String>,
    /// 权利人（第一个组织）
    pub assignee: Option<String>,
    /// 专利类型
    pub patent_type: String,
    /// 技术领域分类（富化字段，服务不可用时为空）
    pub technology_area: Option<String>,
    /// AI 摘要（富化字段，服务不可用时为空）
    pub ai_summary: Option<String>,
    /// 相关度评分 [0.0, 1.0]（富化字段）
    pub relevance_score: Option<f64>,
    /// 最后刷新时间
    pub cached_at: chrono::DateTime<Utc>,
}

impl PatentRecord {
    /// 构造 webhook 事件数据
    #[must_use]
    pub fn to_event_data(&self) -> serde_json::Value {
        serde_json::json!({
            "patent_id": self.patent_id,
            "title": self.title,
            "abstract": self.abstract_text,
            "expiration_date": self.expiration_date,
            "grant_date": self.grant_date,
            "inventor": self.inventor,
            "assignee": self.assignee,
            "technology_area": self.technology_area,
            "ai_summary": self.ai_summary,
            "relevance_score": self.relevance_score,
        })
    }
}

/// 到期日期范围的线上取值
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum DateRange {
    #[serde(rename = "next_7_days")]
    Next7Days,
    #[default]
    #[serde(rename = "next_30_days")]
    Next30Days,
    #[serde(rename = "next_90_days")]
    Next90Days,
    #[serde(rename = "next_365_days")]
    Next365Days,
    /// 需要显式给出 `custom_start`/`custom_end`
    #[serde(rename = "custom")]
    Custom,
}

impl DateRange {
    /// 命名范围对应的天数
    const fn days(self) -> Option<i64> {
        match self {
            Self::Next7Days => Some(7),
            Self::Next30Days => Some(30),
            Self::Next90Days => Some(90),
            Self::Next365Days => Some(365),
            Self::Custom => None,
        }
    }
}

/// 到期查询参数
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExpirationQuery {
    /// 行业过滤（不透明字符串，经静态表解析为关键词）
    #[serde(default)]
    pub industry: Option<String>,
    /// 日期范围
    #[serde(default)]
    pub date_range: DateRange,
    /// `custom` 范围的显式起始日
    #[serde(default)]
    pub custom_start: Option<NaiveDate>,
    /// `custom` 范围的显式结束日
    #[serde(default)]
    pub custom_end: Option<NaiveDate>,
    /// 最大返回条数（1-1000）
    pub limit: u32,
    /// 分页偏移
    pub offset: u32,
    /// 是否在响应中附带品牌标识
    #[serde(default = "default_branding")]
    pub branding: bool,
}

const fn default_branding() -> bool {
    true
}

impl Default for ExpirationQuery {
    fn default() -> Self {
        Self {
            industry: None,
            date_range: DateRange::default(),
            custom_start: None,
            custom_end: None,
            limit: 50,
            offset: 0,
            branding: true,
        }
    }
}

impl ExpirationQuery {
    /// 验证查询参数
    pub fn validate(&self) -> Result<()> {
        crate::ensure_valid!(
            (1..=MAX_QUERY_LIMIT).contains(&self.limit),
            "limit 必须在 1 到 {} 之间",
            MAX_QUERY_LIMIT
        );
        if self.date_range == DateRange::Custom {
            crate::ensure_valid!(
                self.custom_start.is_some() && self.custom_end.is_some(),
                "custom 日期范围必须同时提供 custom_start 和 custom_end"
            );
        }
        Ok(())
    }

    /// 将日期范围解析为绝对到期窗口 `[start, end]`（两端含）
    pub fn resolve_window(&self, today: NaiveDate) -> Result<(NaiveDate, NaiveDate)> {
        match self.date_range.days() {
            Some(days) => Ok((today, today + chrono::Duration::days(days))),
            None => {
                let (Some(start), Some(end)) = (self.custom_start, self.custom_end) else {
                    return Err(crate::validation_error!(
                        "custom 日期范围必须同时提供 custom_start 和 custom_end"
                    ));
                };
                crate::ensure_valid!(start <= end, "custom_start 不能晚于 custom_end");
                Ok((start, end))
            }
        }
    }
}
