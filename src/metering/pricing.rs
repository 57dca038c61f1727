//! # 计费成本计算

/// 四舍五入到 2 位小数
#[must_use]
pub fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

/// 按结果条数计算计费成本
///
/// 成本 = 条数 × 单价，保留 2 位小数。
#[must_use]
pub fn billing_cost(item_count: u32, unit_price: f64) -> f64 {
    round2(f64::from(item_count) * unit_price)
}
