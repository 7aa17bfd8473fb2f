//! 配置管理模块
//!
//! 支持多格式配置文件加载，环境变量覆盖，以及类型安全的配置访问。

use config::{Config, ConfigError, Environment, File};
use serde::Deserialize;
use std::path::Path;

/// 环境变量前缀（RULE_ENGINE__MAX_RULE_LENGTH -> engine.max_rule_length）
pub const ENV_PREFIX: &str = "RULE";

/// 规则引擎配置
///
/// 引擎核心没有输入大小保护，接受外部规则文本时由这里的上限把关。
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    /// 单条规则文本的最大字符数
    pub max_rule_length: usize,
    /// 单次合并的最大规则数
    pub max_combine_rules: usize,
    /// 解析或合并结果的最大树深度
    pub max_tree_depth: usize,
    /// 是否记录评估追踪
    pub trace_enabled: bool,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            max_rule_length: 4096,
            max_combine_rules: 1024,
            max_tree_depth: 100,
            trace_enabled: false,
        }
    }
}

/// 可观测性配置
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ObservabilityConfig {
    pub log_level: String,
    /// 日志输出格式：json（结构化）或 pretty（人类可读）
    pub log_format: String,
}

impl Default for ObservabilityConfig {
    fn default() -> Self {
        Self {
            log_level: "info".to_string(),
            log_format: "pretty".to_string(),
        }
    }
}

impl ObservabilityConfig {
    pub fn json_logs(&self) -> bool {
        self.log_format.eq_ignore_ascii_case("json")
    }
}

/// 应用配置
#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
pub struct AppConfig {
    pub service_name: String,
    pub environment: String,
    pub engine: EngineConfig,
    pub observability: ObservabilityConfig,
}

impl AppConfig {
    /// 从配置文件和环境变量加载配置
    ///
    /// 加载顺序（后加载的会覆盖先加载的同名配置项）：
    /// 1. config/default.toml（默认配置）
    /// 2. config/{environment}.toml（环境特定配置）
    /// 3. config/{service_name}.toml（服务特定配置）
    /// 4. 环境变量（RULE_ 前缀，如 RULE_ENGINE__TRACE_ENABLED -> engine.trace_enabled）
    pub fn load(service_name: &str) -> Result<Self, ConfigError> {
        let env = std::env::var("RULE_ENV").unwrap_or_else(|_| "development".to_string());
        let config_dir = std::env::var("CONFIG_DIR").unwrap_or_else(|_| "config".to_string());

        Self::load_from(Path::new(&config_dir), service_name, &env, Self::env_source())
    }

    /// 从指定目录加载，环境变量来源由调用方提供
    pub fn load_from(
        config_dir: &Path,
        service_name: &str,
        environment: &str,
        env_source: Environment,
    ) -> Result<Self, ConfigError> {
        let builder = Config::builder()
            .set_default("service_name", service_name)?
            .set_default("environment", environment)?
            .add_source(File::from(config_dir.join("default.toml")).required(false))
            .add_source(
                File::from(config_dir.join(format!("{}.toml", environment))).required(false),
            )
            .add_source(
                File::from(config_dir.join(format!("{}.toml", service_name))).required(false),
            )
            .add_source(env_source);

        builder.build()?.try_deserialize()
    }

    /// 进程环境变量来源
    pub fn env_source() -> Environment {
        Environment::with_prefix(ENV_PREFIX)
            .prefix_separator("_")
            .separator("__")
            .try_parsing(true)
    }

    /// 是否为生产环境
    pub fn is_production(&self) -> bool {
        self.environment == "production"
    }
}
