//! 命令行接口
//!
//! 使用 clap derive 宏定义命令结构，各子命令输出 JSON 到 stdout。

use crate::engine::RuleEngine;
use crate::models::{EvaluationContext, Node};
use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use serde_json::{Value as JsonValue, json};

/// 规则表达式引擎命令行工具
#[derive(Parser, Debug)]
#[command(name = "rule-engine")]
#[command(version, about = "规则文本解析、合并与评估")]
#[command(propagate_version = true)]
pub struct Cli {
    /// 日志级别 (trace, debug, info, warn, error)，覆盖配置文件
    #[arg(short, long)]
    pub log_level: Option<String>,

    #[command(subcommand)]
    pub command: Commands,
}

/// 子命令枚举
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// 解析规则文本，输出语法树
    Parse {
        /// 规则文本，如 "age > 30 AND status = 'active'"
        rule: String,
    },

    /// 合并多条规则为一棵平衡树
    Combine {
        /// 合并使用的操作符
        #[arg(short, long, default_value = "AND")]
        operator: String,

        /// 规则文本列表
        #[arg(required = true)]
        rules: Vec<String>,
    },

    /// 针对数据评估已存储的语法树
    Evaluate {
        /// 语法树 JSON
        #[arg(long)]
        ast: String,

        /// 数据 JSON 对象
        #[arg(long)]
        data: String,

        /// 输出逐节点评估追踪
        #[arg(long)]
        trace: bool,
    },

    /// 解析规则文本并立即评估
    Check {
        /// 规则文本
        #[arg(long)]
        rule: String,

        /// 数据 JSON 对象
        #[arg(long)]
        data: String,

        /// 输出逐节点评估追踪
        #[arg(long)]
        trace: bool,
    },
}

/// 命令执行器
pub struct CommandRunner {
    engine: RuleEngine,
}

impl CommandRunner {
    pub fn new(engine: RuleEngine) -> Self {
        Self { engine }
    }

    /// 执行子命令，返回要输出的 JSON
    pub fn run(&self, command: &Commands) -> Result<JsonValue> {
        match command {
            Commands::Parse { rule } => self.run_parse(rule),
            Commands::Combine { operator, rules } => self.run_combine(operator, rules),
            Commands::Evaluate { ast, data, trace } => self.run_evaluate(ast, data, *trace),
            Commands::Check { rule, data, trace } => self.run_check(rule, data, *trace),
        }
    }

    fn run_parse(&self, rule: &str) -> Result<JsonValue> {
        let rule = self.engine.create_rule(rule)?;
        Ok(serde_json::to_value(rule)?)
    }

    fn run_combine(&self, operator: &str, rules: &[String]) -> Result<JsonValue> {
        let ast = self.engine.combine_with_symbol(rules, operator)?;
        Ok(json!({ "combined_ast": ast }))
    }

    fn run_evaluate(&self, ast: &str, data: &str, trace: bool) -> Result<JsonValue> {
        let ast = Node::from_json_str(ast).context("语法树无效")?;
        let context = EvaluationContext::from_json_str(data).context("评估数据无效")?;

        let result = self.engine_with_trace(trace).evaluate(&ast, &context)?;
        Ok(serde_json::to_value(result)?)
    }

    fn run_check(&self, rule: &str, data: &str, trace: bool) -> Result<JsonValue> {
        let ast = self.engine.parse(rule)?;
        let context = EvaluationContext::from_json_str(data).context("评估数据无效")?;

        let result = self.engine_with_trace(trace).evaluate(&ast, &context)?;
        Ok(json!({ "ast": ast, "result": result }))
    }

    fn engine_with_trace(&self, trace: bool) -> RuleEngine {
        let mut config = self.engine.config().clone();
        config.trace_enabled |= trace;
        RuleEngine::new(config)
    }
}
