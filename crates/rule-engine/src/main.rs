//! 规则表达式引擎命令行入口
//!
//! 加载配置、初始化日志，然后执行子命令并把结果以 JSON 输出到 stdout。

use anyhow::Result;
use clap::Parser;
use rule_engine::RuleEngine;
use rule_engine::cli::{Cli, CommandRunner};
use rule_shared::config::AppConfig;
use rule_shared::observability;
use tracing::info;

const SERVICE_NAME: &str = "rule-engine";

fn main() -> Result<()> {
    let cli = Cli::parse();

    // 统一加载配置：从 config/{service_name}.toml 加载，环境变量覆盖
    let mut config = AppConfig::load(SERVICE_NAME).unwrap_or_else(|e| {
        eprintln!("Failed to load config, using defaults: {}", e);
        AppConfig {
            service_name: SERVICE_NAME.to_string(),
            ..AppConfig::default()
        }
    });

    if let Some(level) = &cli.log_level {
        config.observability.log_level = level.clone();
    }

    observability::init(&config.observability, &config.service_name)?;
    observability::metrics::describe_metrics();

    info!(
        environment = %config.environment,
        max_rule_length = config.engine.max_rule_length,
        "Starting rule-engine command"
    );

    let runner = CommandRunner::new(RuleEngine::new(config.engine));
    let output = runner.run(&cli.command)?;

    println!("{}", serde_json::to_string_pretty(&output)?);
    Ok(())
}
