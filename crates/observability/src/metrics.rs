//! Fork / flow 指标模块
//!
//! 对 `metrics` 宏的薄封装，指标名称集中定义。
//! 未安装 recorder 时所有调用均为 no-op。

use metrics::{counter, histogram};

/// 记录 fork 启动的 participant
///
/// `kind` 为 `"callback"` 或 `"stage"`。
pub fn record_participant_started(fork: &str, kind: &'static str) {
    counter!(
        "forkline_participants_started_total",
        "fork" => fork.to_string(),
        "kind" => kind
    )
    .increment(1);
}

/// 记录交给 merge sink 的 batch
pub fn record_batch_flushed(fork: &str, size: usize) {
    counter!("forkline_batches_flushed_total", "fork" => fork.to_string()).increment(1);
    histogram!("forkline_batch_size", "fork" => fork.to_string()).record(size as f64);
}

/// 记录 attach 通知
///
/// 已有活跃 source 时 `accepted` 为 false。
pub fn record_attach(fork: &str, accepted: bool) {
    let status = if accepted { "accepted" } else { "ignored" };
    counter!(
        "forkline_attach_total",
        "fork" => fork.to_string(),
        "status" => status
    )
    .increment(1);
}

/// 记录 detach 通知
///
/// 过期通知时 `matched` 为 false。
pub fn record_detach(fork: &str, matched: bool) {
    let status = if matched { "matched" } else { "stale" };
    counter!(
        "forkline_detach_total",
        "fork" => fork.to_string(),
        "status" => status
    )
    .increment(1);
}

/// 记录 fan-out 转发的条目数
pub fn record_items_forwarded(fanout: &str, n: u64) {
    counter!("forkline_items_forwarded_total", "fanout" => fanout.to_string()).increment(n);
}

/// 记录因无下游而丢弃的条目数
pub fn record_items_dropped(fanout: &str, n: u64) {
    counter!("forkline_items_dropped_total", "fanout" => fanout.to_string()).increment(n);
}
