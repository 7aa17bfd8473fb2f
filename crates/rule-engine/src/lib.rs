//! 规则表达式引擎
//!
//! 提供文本规则的解析、合并与评估能力：
//! - 规则文本 → 语法树（`age > 30 AND status = 'active'`）
//! - 多条规则去重后合并为平衡树
//! - 语法树针对数据上下文求值
//! - 语法树的存储表示与校验式反序列化

pub mod cli;
pub mod combiner;
pub mod engine;
pub mod error;
pub mod evaluator;
pub mod executor;
pub mod models;
pub mod operators;
pub mod parser;
pub mod serialization;

pub use combiner::RuleCombiner;
pub use engine::RuleEngine;
pub use error::{Result, RuleError};
pub use evaluator::Evaluator;
pub use executor::RuleExecutor;
pub use models::{EvaluationContext, EvaluationResult, Node, Rule, Value};
pub use operators::Operator;
pub use parser::RuleParser;

/// 解析规则文本为语法树
pub fn parse(rule: &str) -> Result<Node> {
    RuleParser::parse(rule)
}

/// 去重、解析并以平衡树合并多条规则
pub fn combine<S: AsRef<str>>(rules: &[S], operator: Operator) -> Result<Node> {
    RuleCombiner::combine(rules, operator)
}

/// 针对数据上下文评估语法树
pub fn evaluate(ast: &Node, context: &EvaluationContext) -> Result<Value> {
    RuleExecutor::new().evaluate(ast, context)
}
