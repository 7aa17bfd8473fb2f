//! 规则执行器
//!
//! 遍历语法树求值，可选记录每个节点的评估追踪。
//! 操作符节点总是先求值左右两侧，再应用操作符；AND/OR 不做短路，
//! 右侧的错误即使在左侧已能决定结果时也会返回给调用方。

use crate::error::Result;
use crate::evaluator::Evaluator;
use crate::models::{EvaluationContext, EvaluationResult, Node, Value};
use std::time::Instant;

/// 规则执行器
pub struct RuleExecutor {
    /// 是否记录详细评估追踪
    trace_enabled: bool,
}

impl RuleExecutor {
    pub fn new() -> Self {
        Self {
            trace_enabled: false,
        }
    }

    /// 启用评估追踪
    pub fn with_trace(mut self) -> Self {
        self.trace_enabled = true;
        self
    }

    /// 求值语法树，返回根节点的值
    pub fn evaluate(&self, node: &Node, context: &EvaluationContext) -> Result<Value> {
        let mut trace = Vec::new();
        self.evaluate_node(node, context, &mut trace, "root")
    }

    /// 执行规则评估，返回带匹配结果和追踪信息的评估结果
    pub fn execute(&self, node: &Node, context: &EvaluationContext) -> Result<EvaluationResult> {
        let start = Instant::now();

        let mut trace = Vec::new();
        let value = self.evaluate_node(node, context, &mut trace, "root")?;

        Ok(EvaluationResult {
            matched: value.is_truthy(),
            value,
            evaluation_trace: trace,
            evaluation_time_us: start.elapsed().as_micros() as u64,
        })
    }

    // 不记录追踪时路径不会被使用，避免逐节点分配
    fn child_path(&self, path: &str, side: &str) -> String {
        if self.trace_enabled {
            format!("{}.{}", path, side)
        } else {
            String::new()
        }
    }

    /// 递归评估节点
    fn evaluate_node(
        &self,
        node: &Node,
        context: &EvaluationContext,
        trace: &mut Vec<String>,
        path: &str,
    ) -> Result<Value> {
        match node {
            Node::Operand { literal } => {
                let value = Evaluator::resolve_operand(literal, context)?;
                if self.trace_enabled {
                    trace.push(format!("{}: {} => {}", path, literal, value));
                }
                Ok(value)
            }
            Node::Operator {
                operator,
                left,
                right,
            } => {
                let left_value =
                    self.evaluate_node(left, context, trace, &self.child_path(path, "left"))?;
                let right_value =
                    self.evaluate_node(right, context, trace, &self.child_path(path, "right"))?;

                let value = Evaluator::apply(*operator, &left_value, &right_value)?;
                if self.trace_enabled {
                    trace.push(format!(
                        "{}: {} {} {} => {}",
                        path, left_value, operator, right_value, value
                    ));
                }
                Ok(value)
            }
        }
    }
}

impl Default for RuleExecutor {
    fn default() -> Self {
        Self::new()
    }
}
