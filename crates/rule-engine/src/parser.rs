//! 规则文本解析器
//!
//! 将单行规则文本（如 `age > 30 AND status = 'active'`）转换为语法树。
//!
//! 解析不是基于优先级的文法，而是按文本切分：
//! 1. 存在 `" AND "` 时，在最右侧一次出现处切分，左右两侧递归解析；
//! 2. 否则对 `" OR "` 做同样处理；
//! 3. 否则匹配比较表达式 `标识符 操作符 字面量`。
//!
//! 因此 `AND` 总是先于 `OR` 成为根节点，与其在文本中的位置无关。
//! 已存储的语法树依赖这一切分方式，不能改成常规优先级。

use crate::error::{Result, RuleError};
use crate::models::Node;
use crate::operators::Operator;
use regex::Regex;
use std::sync::LazyLock;

static WHITESPACE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\s+").expect("whitespace pattern is valid"));

static COMPARISON: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"([a-zA-Z]+)\s*(<=|>=|!=|<|>|=)\s*('[^']+'|[0-9]+)")
        .expect("comparison pattern is valid")
});

const CONNECTIVES: [(&str, Operator); 2] = [(" AND ", Operator::And), (" OR ", Operator::Or)];

/// 规则解析器
pub struct RuleParser;

impl RuleParser {
    /// 解析规则文本
    ///
    /// 任一片段无法识别时整条规则解析失败，不会产生残缺的树。
    pub fn parse(rule: &str) -> Result<Node> {
        let normalized = Self::normalize(rule);
        Self::parse_normalized(&normalized)
    }

    /// 连续空白折叠为单个空格并去掉首尾空白
    pub fn normalize(rule: &str) -> String {
        WHITESPACE.replace_all(rule.trim(), " ").into_owned()
    }

    // 规范化后的字符串按连接词切开得到的片段仍是规范化的
    fn parse_normalized(rule: &str) -> Result<Node> {
        for (connective, operator) in CONNECTIVES {
            if let Some(index) = rule.rfind(connective) {
                let left = Self::parse_normalized(&rule[..index])?;
                let right = Self::parse_normalized(&rule[index + connective.len()..])?;
                return Ok(Node::operator(operator, left, right));
            }
        }

        Self::parse_comparison(rule)
    }

    fn parse_comparison(rule: &str) -> Result<Node> {
        let captures = COMPARISON
            .captures(rule)
            .ok_or_else(|| RuleError::ParseFailure(rule.to_string()))?;

        let operator: Operator = captures[2].parse()?;
        Ok(Node::operator(
            operator,
            Node::operand(&captures[1]),
            Node::operand(&captures[3]),
        ))
    }
}
