//! # 内存存储实现
//!
//! 二进制运行与测试用；并发安全由读写锁保证，临界区保持短小。

use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, Utc};
use std::collections::HashMap;
use std::sync::RwLock;

use super::{KeyStore, PatentStore, SubscriptionStore, UsageStore};
use crate::auth::types::PartnerKey;
use crate::error::Result;
use crate::metering::ledger::UsageRecord;
use crate::patents::types::PatentRecord;
use crate::webhook::types::WebhookSubscription;

/// 内存密钥存储
#[derive(Default)]
pub struct MemoryKeyStore {
    keys: RwLock<HashMap<String, PartnerKey>>,
}

#[async_trait]
impl KeyStore for MemoryKeyStore {
    async fn insert(&self, key: PartnerKey) -> Result<()> {
        let mut keys = self.keys.write().unwrap();
        if keys.contains_key(&key.token) {
            return Err(crate::business_error!("密钥令牌已存在"));
        }
        keys.insert(key.token.clone(), key);
        Ok(())
    }

    async fn find_by_token(&self, token: &str) -> Result<Option<PartnerKey>> {
        let keys = self.keys.read().unwrap();
        Ok(keys.get(token).cloned())
    }

    async fn update(&self, key: &PartnerKey) -> Result<bool> {
        let mut keys = self.keys.write().unwrap();
        match keys.get_mut(&key.token) {
            Some(existing) if existing.id == key.id => {
                *existing = key.clone();
                existing.updated_at = Utc::now();
                Ok(true)
            }
            _ => Ok(false),
        }
    }

    async fn set_active(&self, token: &str, active: bool) -> Result<bool> {
        let mut keys = self.keys.write().unwrap();
        match keys.get_mut(token) {
            Some(key) => {
                key.is_active = active;
                key.updated_at = Utc::now();
                Ok(true)
            }
            None => Ok(false),
        }
    }
}

/// 内存使用记录存储
#[derive(Default)]
pub struct MemoryUsageStore {
    records: RwLock<Vec<UsageRecord>>,
}

impl MemoryUsageStore {
    /// 当前记录总数（测试用）
    #[must_use]
    pub fn len(&self) -> usize {
        self.records.read().unwrap().len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[async_trait]
impl UsageStore for MemoryUsageStore {
    async fn insert(&self, record: UsageRecord) -> Result<()> {
        let mut records = self.records.write().unwrap();
        records.push(record);
        Ok(())
    }

    async fn range(
        &self,
        api_key_id: &str,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
    ) -> Result<Vec<UsageRecord>> {
        let records = self.records.read().unwrap();
        Ok(records
            .iter()
            .filter(|r| {
                r.api_key_id == api_key_id && r.created_at >= start && r.created_at <= end
            })
            .cloned()
            .collect())
    }
}

/// 内存订阅存储
#[derive(Default)]
pub struct MemorySubscriptionStore {
    subscriptions: RwLock<Vec<WebhookSubscription>>,
}

#[async_trait]
impl SubscriptionStore for MemorySubscriptionStore {
    async fn insert(&self, subscription: WebhookSubscription) -> Result<()> {
        let mut subs = self.subscriptions.write().unwrap();
        if subs
            .iter()
            .any(|s| s.api_key_id == subscription.api_key_id && s.url == subscription.url)
        {
            return Err(crate::business_error!(
                "该密钥已注册相同的 webhook URL: {}",
                subscription.url
            ));
        }
        subs.push(subscription);
        Ok(())
    }

    async fn delete(&self, api_key_id: &str, url: &str) -> Result<bool> {
        let mut subs = self.subscriptions.write().unwrap();
        let before = subs.len();
        subs.retain(|s| !(s.api_key_id == api_key_id && s.url == url));
        Ok(subs.len() < before)
    }

    async fn list_for_key(&self, api_key_id: &str) -> Result<Vec<WebhookSubscription>> {
        let subs = self.subscriptions.read().unwrap();
        Ok(subs
            .iter()
            .filter(|s| s.api_key_id == api_key_id)
            .cloned()
            .collect())
    }

    async fn list_active(&self) -> Result<Vec<WebhookSubscription>> {
        let subs = self.subscriptions.read().unwrap();
        Ok(subs.iter().filter(|s| s.is_active).cloned().collect())
    }
}

/// 内存专利存储
#[derive(Default)]
pub struct MemoryPatentStore {
    patents: RwLock<HashMap<String, PatentRecord>>,
}

#[async_trait]
impl PatentStore for MemoryPatentStore {
    async fn upsert(&self, patent: PatentRecord) -> Result<()> {
        let mut patents = self.patents.write().unwrap();
        patents.insert(patent.patent_id.clone(), patent);
        Ok(())
    }

    async fn find_by_id(&self, patent_id: &str) -> Result<Option<PatentRecord>> {
        let patents = self.patents.read().unwrap();
        Ok(patents.get(patent_id).cloned())
    }

    async fn expiring_between(
        &self,
        start: NaiveDate,
        end: NaiveDate,
    ) -> Result<Vec<PatentRecord>> {
        let patents = self.patents.read().unwrap();
        let mut result: Vec<_> = patents
            .values()
            .filter(|p| p.expiration_date >= start && p.expiration_date <= end)
            .cloned()
            .collect();
        result.sort_by(|a, b| a.expiration_date.cmp(&b.expiration_date));
        Ok(result)
    }
}
