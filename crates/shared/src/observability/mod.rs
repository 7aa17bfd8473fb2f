//! 统一可观测性模块
//!
//! 提供日志初始化与指标记录。所有入口通过单一函数配置日志，
//! 指标通过 `metrics` 门面记录，由嵌入方安装具体的 recorder。

pub mod metrics;
pub mod tracing;

pub use self::tracing::init;
