//! # Webhook 负载签名
//!
//! 对精确的序列化负载字节计算 HMAC-SHA256，签名随 `X-Webhook-Signature`
//! 头投递，格式 `sha256=<hex>`。

use hmac::{Hmac, Mac};
use sha2::Sha256;

type HmacSha256 = Hmac<Sha256>;

/// 签名头名称
pub const SIGNATURE_HEADER: &str = "X-Webhook-Signature";

/// 计算负载签名
#[must_use]
pub fn sign_payload(secret: &str, payload: &[u8]) -> String {
    let mut mac = <HmacSha256 as Mac>::new_from_slice(secret.as_bytes())
        .expect("HMAC 接受任意长度密钥");
    mac.update(payload);
    format!("sha256={}", hex::encode(mac.finalize().into_bytes()))
}

/// 校验负载签名（接收端视角，测试用）
#[must_use]
pub fn verify_signature(signature: &str, secret: &str, payload: &[u8]) -> bool {
    sign_payload(secret, payload) == signature
}
