//! 发布管道指标
//!
//! 所有指标以 `catalog_publisher_` 为前缀，未安装 recorder 时为空操作。

use metrics::{counter, histogram};

/// 记录构建的事件信封数量
///
/// `kind`: `publish` / `unpublish`
pub fn record_envelopes_built(kind: &str, count: usize) {
    counter!(
        "catalog_publisher_envelopes_built_total",
        "kind" => kind.to_string()
    )
    .increment(count as u64);
}

/// 记录一次投递结果
///
/// `outcome`: `delivered` / `rejected` / `failed`
pub fn record_delivery(channel: &str, outcome: &str, latency_ms: f64) {
    counter!(
        "catalog_publisher_deliveries_total",
        "channel" => channel.to_string(),
        "outcome" => outcome.to_string()
    )
    .increment(1);

    histogram!(
        "catalog_publisher_delivery_latency_ms",
        "channel" => channel.to_string()
    )
    .record(latency_ms);
}

/// 记录单次投递的信封数量
pub fn record_batch_size(size: usize) {
    histogram!("catalog_publisher_batch_size").record(size as f64);
}

/// 记录租户配置读取失败
pub fn record_config_failure(tenant_id: i64) {
    counter!(
        "catalog_publisher_config_failures_total",
        "tenant_id" => tenant_id.to_string()
    )
    .increment(1);
}
