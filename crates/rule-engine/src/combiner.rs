//! 规则合并器
//!
//! 将多条规则文本去重、分别解析，再以给定操作符合并为一棵平衡树。

use crate::error::{Result, RuleError};
use crate::models::Node;
use crate::operators::Operator;
use crate::parser::RuleParser;
use std::collections::HashSet;
use tracing::warn;

/// 规则合并器
pub struct RuleCombiner;

impl RuleCombiner {
    /// 合并规则文本
    ///
    /// - 按首次出现的顺序精确去重
    /// - 解析失败的规则被丢弃，不会以占位节点出现在树中
    /// - 只剩一条规则时原样返回其语法树
    pub fn combine<S: AsRef<str>>(rules: &[S], operator: Operator) -> Result<Node> {
        let mut seen = HashSet::with_capacity(rules.len());
        let mut nodes = Vec::with_capacity(rules.len());

        for rule in rules.iter().map(AsRef::as_ref) {
            if !seen.insert(rule) {
                continue;
            }

            match RuleParser::parse(rule) {
                Ok(node) => nodes.push(node),
                Err(e) => warn!(rule = %rule, error = %e, "合并时跳过无法解析的规则"),
            }
        }

        Self::build_balanced(nodes, operator)
    }

    /// 以中点切分递归构建平衡树，深度为 ⌈log2 n⌉
    pub fn build_balanced(mut nodes: Vec<Node>, operator: Operator) -> Result<Node> {
        match nodes.len() {
            0 => Err(RuleError::CombineEmpty),
            1 => Ok(nodes.remove(0)),
            n => {
                let right = nodes.split_off(n / 2);
                Ok(Node::operator(
                    operator,
                    Self::build_balanced(nodes, operator)?,
                    Self::build_balanced(right, operator)?,
                ))
            }
        }
    }
}
