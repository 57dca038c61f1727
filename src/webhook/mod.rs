//! # Webhook 投递引擎
//!
//! 签名负载构造、带退避的至少一次投递与周期性到期扫描

pub mod delivery;
pub mod signature;
pub mod sweep;
pub mod types;

pub use delivery::{HttpTransport, NotificationTransport, WebhookDeliverer};
pub use sweep::ExpirationSweep;
pub use types::{WebhookSubscription, EVENT_PATENT_EXPIRED};
