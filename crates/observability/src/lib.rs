//! # Observability
//!
//! 可观测性模块：Tracing + Prometheus 指标。
//!
//! ## 功能
//!
//! - Tracing 初始化 (JSON/Pretty/Compact 格式，输出到 stderr)
//! - Prometheus 指标导出
//! - fork / source / merge sink 指标记录
//!
//! ## 使用示例
//!
//! ```ignore
//! // 初始化
//! observability::init_with_config(ObservabilityConfig::from_verbosity(1, false))?;
//!
//! // 由 fork 自身记录
//! observability::record_batch_flushed("lines", 3);
//! ```

pub mod metrics;

use anyhow::{Context, Result};
use metrics_exporter_prometheus::PrometheusBuilder;
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter, Layer};

// Re-exports
pub use crate::metrics::{
    record_attach, record_batch_flushed, record_detach, record_items_dropped,
    record_items_forwarded, record_participant_started,
};

/// 可观测性配置
#[derive(Debug, Clone)]
pub struct ObservabilityConfig {
    /// 日志格式
    pub log_format: LogFormat,
    /// 默认日志级别 (`RUST_LOG` 未设置或被忽略时)
    pub log_level: String,
    /// 是否允许 `RUST_LOG` 覆盖 `log_level`
    pub respect_env: bool,
    /// Prometheus 端口 (None = 禁用)
    pub metrics_port: Option<u16>,
}

impl Default for ObservabilityConfig {
    fn default() -> Self {
        Self {
            log_format: LogFormat::Compact,
            log_level: "info".to_string(),
            respect_env: true,
            metrics_port: None,
        }
    }
}

impl ObservabilityConfig {
    /// 根据 `-v` 次数 / `-q` 选择日志级别
    ///
    /// quiet 固定为 `warn`，并忽略 `RUST_LOG`。
    pub fn from_verbosity(verbose: u8, quiet: bool) -> Self {
        let log_level = match (quiet, verbose) {
            (true, _) => "warn",
            (false, 0) => "info",
            (false, 1) => "debug",
            (false, _) => "trace",
        };
        Self {
            log_level: log_level.to_string(),
            respect_env: !quiet,
            ..Self::default()
        }
    }

    pub fn with_format(mut self, log_format: LogFormat) -> Self {
        self.log_format = log_format;
        self
    }

    fn filter(&self) -> EnvFilter {
        if self.respect_env {
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&self.log_level))
        } else {
            EnvFilter::new(&self.log_level)
        }
    }
}

/// 日志格式
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum LogFormat {
    /// JSON 结构化日志
    Json,
    /// 人类可读格式
    Pretty,
    /// 紧凑单行格式
    #[default]
    Compact,
}

/// 初始化 Tracing，并按配置启动 Prometheus 导出
///
/// 日志输出到 stderr，stdout 留给数据。
pub fn init_with_config(config: ObservabilityConfig) -> Result<()> {
    let fmt_layer = match config.log_format {
        LogFormat::Json => fmt::layer()
            .json()
            .with_writer(std::io::stderr)
            .with_target(true)
            .with_thread_ids(true)
            .with_thread_names(true)
            .with_file(true)
            .with_line_number(true)
            .boxed(),
        LogFormat::Pretty => fmt::layer().pretty().with_writer(std::io::stderr).boxed(),
        LogFormat::Compact => fmt::layer().compact().with_writer(std::io::stderr).boxed(),
    };

    tracing_subscriber::registry()
        .with(config.filter())
        .with(fmt_layer)
        .try_init()
        .context("Failed to initialize tracing subscriber")?;

    if let Some(port) = config.metrics_port {
        init_metrics_only(port)?;
    }

    tracing::debug!(
        log_format = ?config.log_format,
        log_level = %config.log_level,
        metrics_port = ?config.metrics_port,
        "Observability initialized"
    );

    Ok(())
}

/// 仅安装 Prometheus 导出器
pub fn init_metrics_only(port: u16) -> Result<()> {
    PrometheusBuilder::new()
        .with_http_listener(([0, 0, 0, 0], port))
        .install()
        .context("Failed to install Prometheus recorder")?;

    tracing::info!(port, "Prometheus metrics endpoint initialized");
    Ok(())
}
