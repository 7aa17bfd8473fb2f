//! 操作数与操作符求值
//!
//! 单个节点上的语义：操作数解析为值，操作符作用于两个已求得的值。
//! 树的遍历见 [`crate::executor`]。

use crate::error::{Result, RuleError};
use crate::models::{EvaluationContext, Value};
use crate::operators::Operator;
use std::cmp::Ordering;

/// 节点求值器
pub struct Evaluator;

impl Evaluator {
    /// 解析操作数
    ///
    /// 顺序固定：单引号字符串 > 十进制数字 > 上下文字段。
    /// 字段不存在时返回 `UnresolvedOperand`。
    pub fn resolve_operand(literal: &str, context: &EvaluationContext) -> Result<Value> {
        if let Some(value) = Value::from_literal(literal) {
            return Ok(value);
        }

        context
            .get(literal)
            .cloned()
            .ok_or_else(|| RuleError::UnresolvedOperand(literal.to_string()))
    }

    /// 对两个已求值的操作数应用操作符
    pub fn apply(operator: Operator, left: &Value, right: &Value) -> Result<Value> {
        let result = match operator {
            Operator::And => left.is_truthy() && right.is_truthy(),
            Operator::Or => left.is_truthy() || right.is_truthy(),
            Operator::Eq => Self::eq(left, right),
            Operator::Neq => !Self::eq(left, right),
            Operator::Lt => Self::compare(operator, left, right)?.is_lt(),
            Operator::Lte => Self::compare(operator, left, right)?.is_le(),
            Operator::Gt => Self::compare(operator, left, right)?.is_gt(),
            Operator::Gte => Self::compare(operator, left, right)?.is_ge(),
        };

        Ok(Value::Bool(result))
    }

    /// 严格相等：类型不同一律不等
    fn eq(left: &Value, right: &Value) -> bool {
        match (left, right) {
            (Value::Number(a), Value::Number(b)) => a == b,
            (Value::String(a), Value::String(b)) => a == b,
            (Value::Bool(a), Value::Bool(b)) => a == b,
            _ => false,
        }
    }

    /// 数字按数值比较，字符串按字典序比较，其余组合报类型不匹配
    fn compare(operator: Operator, left: &Value, right: &Value) -> Result<Ordering> {
        let ordering = match (left, right) {
            (Value::Number(a), Value::Number(b)) => a.partial_cmp(b),
            (Value::String(a), Value::String(b)) => Some(a.cmp(b)),
            _ => None,
        };

        ordering.ok_or_else(|| RuleError::TypeMismatch {
            operator: operator.to_string(),
            left: left.type_name().to_string(),
            right: right.type_name().to_string(),
        })
    }
}
