//! # 持久化协作方契约
//!
//! 核心只依赖这些窄接口；关系型存储实现位于系统边界之外。
//! 内存实现供二进制运行和测试使用。

pub mod memory;

use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, Utc};

use crate::auth::types::PartnerKey;
use crate::error::Result;
use crate::metering::ledger::UsageRecord;
use crate::patents::types::PatentRecord;
use crate::webhook::types::WebhookSubscription;

/// 合作方密钥存储
#[async_trait]
pub trait KeyStore: Send + Sync {
    /// 写入新密钥；令牌必须全局唯一
    async fn insert(&self, key: PartnerKey) -> Result<()>;

    /// 按令牌解析密钥
    async fn find_by_token(&self, token: &str) -> Result<Option<PartnerKey>>;

    /// 更新密钥（按 id 匹配）
    async fn update(&self, key: &PartnerKey) -> Result<bool>;

    /// 翻转激活标志；吊销永不删除历史
    async fn set_active(&self, token: &str, active: bool) -> Result<bool>;
}

/// 使用记录存储（追加式）
#[async_trait]
pub trait UsageStore: Send + Sync {
    /// 追加一条记录；记录写入后不可变
    async fn insert(&self, record: UsageRecord) -> Result<()>;

    /// 按 (密钥, 时间) 范围查询
    async fn range(
        &self,
        api_key_id: &str,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
    ) -> Result<Vec<UsageRecord>>;
}

/// Webhook 订阅存储
#[async_trait]
pub trait SubscriptionStore: Send + Sync {
    /// 注册订阅；(所属密钥, URL) 组合必须唯一
    async fn insert(&self, subscription: WebhookSubscription) -> Result<()>;

    /// 删除订阅，返回是否存在
    async fn delete(&self, api_key_id: &str, url: &str) -> Result<bool>;

    /// 列出某密钥的全部订阅
    async fn list_for_key(&self, api_key_id: &str) -> Result<Vec<WebhookSubscription>>;

    /// 列出全部激活订阅
    async fn list_active(&self) -> Result<Vec<WebhookSubscription>>;
}

/// 专利缓存存储
#[async_trait]
pub trait PatentStore: Send + Sync {
    /// 按专利号 upsert
    async fn upsert(&self, patent: PatentRecord) -> Result<()>;

    /// 按专利号查询
    async fn find_by_id(&self, patent_id: &str) -> Result<Option<PatentRecord>>;

    /// 查询在 `[start, end]`（两端含）内到期的专利
    async fn expiring_between(&self, start: NaiveDate, end: NaiveDate)
        -> Result<Vec<PatentRecord>>;
}
