//! 规则引擎领域模型

use crate::error::{Result, RuleError};
use crate::operators::Operator;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeSet, HashMap};
use std::fmt;
use uuid::Uuid;

/// 规则语法树节点
///
/// 操作符节点恒为内部节点且左右子树齐全，操作数节点恒为叶子。
/// 序列化格式见 [`crate::serialization`]。
#[derive(Debug, Clone, PartialEq)]
pub enum Node {
    Operator {
        operator: Operator,
        left: Box<Node>,
        right: Box<Node>,
    },
    Operand {
        literal: String,
    },
}

impl Node {
    pub fn operator(operator: Operator, left: Node, right: Node) -> Self {
        Self::Operator {
            operator,
            left: Box::new(left),
            right: Box::new(right),
        }
    }

    pub fn operand(literal: impl Into<String>) -> Self {
        Self::Operand {
            literal: literal.into(),
        }
    }

    /// 根到最深叶子的边数，单个操作数为 0
    pub fn depth(&self) -> usize {
        match self {
            Self::Operand { .. } => 0,
            Self::Operator { left, right, .. } => 1 + left.depth().max(right.depth()),
        }
    }

    /// 树中引用的数据字段（既非引号字符串也非数字的操作数）
    pub fn identifiers(&self) -> BTreeSet<&str> {
        let mut fields = BTreeSet::new();
        self.collect_identifiers(&mut fields);
        fields
    }

    fn collect_identifiers<'a>(&'a self, fields: &mut BTreeSet<&'a str>) {
        match self {
            Self::Operand { literal } => {
                if Value::from_literal(literal).is_none() {
                    fields.insert(literal.as_str());
                }
            }
            Self::Operator { left, right, .. } => {
                left.collect_identifiers(fields);
                right.collect_identifiers(fields);
            }
        }
    }
}

/// 中缀形式，仅用于日志与追踪输出
impl fmt::Display for Node {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Operand { literal } => write!(f, "{}", literal),
            Self::Operator {
                operator,
                left,
                right,
            } if operator.is_logical() => write!(f, "({} {} {})", left, operator, right),
            Self::Operator {
                operator,
                left,
                right,
            } => write!(f, "{} {} {}", left, operator, right),
        }
    }
}

/// 评估过程中的值
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Value {
    Bool(bool),
    Number(f64),
    String(String),
}

impl Value {
    /// 将操作数文本解析为字面量
    ///
    /// 优先级：单引号字符串 > 十进制数字。都不是时返回 `None`，
    /// 由调用方按数据字段处理。
    pub fn from_literal(literal: &str) -> Option<Value> {
        if literal.starts_with('\'') && literal.ends_with('\'') {
            // 单独一个引号视为空字符串
            let inner = literal.get(1..literal.len() - 1).unwrap_or_default();
            return Some(Value::String(inner.to_string()));
        }

        Self::parse_number(literal).map(Value::Number)
    }

    // f64::from_str 会接受 "inf"/"nan"，这些必须留给字段查找
    fn parse_number(literal: &str) -> Option<f64> {
        let numeric_chars = literal
            .chars()
            .all(|c| c.is_ascii_digit() || matches!(c, '+' | '-' | '.' | 'e' | 'E'));
        if !numeric_chars || !literal.chars().any(|c| c.is_ascii_digit()) {
            return None;
        }

        literal.parse::<f64>().ok().filter(|n| n.is_finite())
    }

    /// 逻辑运算使用的真值
    pub fn is_truthy(&self) -> bool {
        match self {
            Value::Bool(b) => *b,
            Value::Number(n) => *n != 0.0,
            Value::String(s) => !s.is_empty(),
        }
    }

    pub fn type_name(&self) -> &'static str {
        match self {
            Value::Bool(_) => "boolean",
            Value::Number(_) => "number",
            Value::String(_) => "string",
        }
    }

    /// 从 JSON 值转换，只接受数字、字符串和布尔
    pub fn from_json(value: &serde_json::Value) -> Option<Value> {
        match value {
            serde_json::Value::Bool(b) => Some(Value::Bool(*b)),
            serde_json::Value::Number(n) => n.as_f64().map(Value::Number),
            serde_json::Value::String(s) => Some(Value::String(s.clone())),
            _ => None,
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Bool(b) => write!(f, "{}", b),
            Value::Number(n) => write!(f, "{}", n),
            Value::String(s) => write!(f, "'{}'", s),
        }
    }
}

impl From<bool> for Value {
    fn from(value: bool) -> Self {
        Value::Bool(value)
    }
}

impl From<f64> for Value {
    fn from(value: f64) -> Self {
        Value::Number(value)
    }
}

impl From<i64> for Value {
    fn from(value: i64) -> Self {
        Value::Number(value as f64)
    }
}

impl From<i32> for Value {
    fn from(value: i32) -> Self {
        Value::Number(f64::from(value))
    }
}

impl From<&str> for Value {
    fn from(value: &str) -> Self {
        Value::String(value.to_string())
    }
}

impl From<String> for Value {
    fn from(value: String) -> Self {
        Value::String(value)
    }
}

/// 评估上下文 - 标识符到值的映射
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct EvaluationContext {
    data: HashMap<String, Value>,
}

impl EvaluationContext {
    pub fn new() -> Self {
        Self::default()
    }

    /// 添加字段（构建器风格）
    pub fn with(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.insert(key, value);
        self
    }

    pub fn insert(&mut self, key: impl Into<String>, value: impl Into<Value>) {
        self.data.insert(key.into(), value.into());
    }

    /// 从 JSON 对象创建
    ///
    /// 顶层必须是对象，且每个字段的值必须是数字、字符串或布尔。
    pub fn from_json(json: &serde_json::Value) -> Result<Self> {
        let object = json.as_object().ok_or_else(|| {
            RuleError::InvalidContext("评估数据必须是 JSON 对象".to_string())
        })?;

        let mut data = HashMap::with_capacity(object.len());
        for (key, value) in object {
            let value = Value::from_json(value).ok_or_else(|| {
                RuleError::InvalidContext(format!(
                    "字段 '{}' 的值必须是数字、字符串或布尔: {}",
                    key, value
                ))
            })?;
            data.insert(key.clone(), value);
        }

        Ok(Self { data })
    }

    pub fn from_json_str(json: &str) -> Result<Self> {
        let value: serde_json::Value = serde_json::from_str(json)?;
        Self::from_json(&value)
    }

    pub fn get(&self, key: &str) -> Option<&Value> {
        self.data.get(key)
    }

    pub fn len(&self) -> usize {
        self.data.len()
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }
}

impl<K: Into<String>, V: Into<Value>> FromIterator<(K, V)> for EvaluationContext {
    fn from_iter<T: IntoIterator<Item = (K, V)>>(iter: T) -> Self {
        Self {
            data: iter
                .into_iter()
                .map(|(k, v)| (k.into(), v.into()))
                .collect(),
        }
    }
}

/// 规则记录：规则文本及其语法树
///
/// 由协作方持久化，之后可将 `ast` 原样交回评估。
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Rule {
    pub id: String,
    pub rule: String,
    pub ast: Node,
    #[serde(default = "Utc::now")]
    pub created_at: DateTime<Utc>,
}

impl Rule {
    pub fn new(rule: impl Into<String>, ast: Node) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            rule: rule.into(),
            ast,
            created_at: Utc::now(),
        }
    }
}

/// 评估结果
#[derive(Debug, Clone, Serialize)]
pub struct EvaluationResult {
    pub value: Value,
    pub matched: bool,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub evaluation_trace: Vec<String>,
    pub evaluation_time_us: u64,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn comparison(field: &str, op: Operator, literal: &str) -> Node {
        Node::operator(op, Node::operand(field), Node::operand(literal))
    }

    #[test]
    fn test_literal_priority() {
        assert_eq!(
            Value::from_literal("'active'"),
            Some(Value::String("active".to_string()))
        );
        // 引号优先于数字
        assert_eq!(
            Value::from_literal("'42'"),
            Some(Value::String("42".to_string()))
        );
        assert_eq!(Value::from_literal("42"), Some(Value::Number(42.0)));
        assert_eq!(Value::from_literal("-3.5"), Some(Value::Number(-3.5)));
        assert_eq!(Value::from_literal("age"), None);
        assert_eq!(Value::from_literal("''"), Some(Value::String(String::new())));
        assert_eq!(Value::from_literal("'"), Some(Value::String(String::new())));
    }

    #[test]
    fn test_special_float_names_are_identifiers() {
        assert_eq!(Value::from_literal("inf"), None);
        assert_eq!(Value::from_literal("NaN"), None);
        assert_eq!(Value::from_literal("infinity"), None);
        assert_eq!(Value::from_literal("e"), None);
    }

    #[test]
    fn test_truthiness() {
        assert!(Value::Bool(true).is_truthy());
        assert!(!Value::Bool(false).is_truthy());
        assert!(Value::Number(2.0).is_truthy());
        assert!(!Value::Number(0.0).is_truthy());
        assert!(Value::from("x").is_truthy());
        assert!(!Value::from("").is_truthy());
    }

    #[test]
    fn test_depth_and_identifiers() {
        let tree = Node::operator(
            Operator::And,
            comparison("age", Operator::Gt, "30"),
            comparison("status", Operator::Eq, "'active'"),
        );

        assert_eq!(tree.depth(), 2);
        assert_eq!(
            tree.identifiers().into_iter().collect::<Vec<_>>(),
            vec!["age", "status"]
        );
    }

    #[test]
    fn test_display() {
        let tree = Node::operator(
            Operator::Or,
            comparison("age", Operator::Gte, "18"),
            comparison("role", Operator::Neq, "'guest'"),
        );
        assert_eq!(tree.to_string(), "(age >= 18 OR role != 'guest')");
    }

    #[test]
    fn test_context_from_json() {
        let ctx = EvaluationContext::from_json(&json!({
            "age": 35,
            "status": "active",
            "vip": true
        }))
        .unwrap();

        assert_eq!(ctx.len(), 3);
        assert_eq!(ctx.get("age"), Some(&Value::Number(35.0)));
        assert_eq!(ctx.get("status"), Some(&Value::from("active")));
        assert_eq!(ctx.get("vip"), Some(&Value::Bool(true)));
        assert_eq!(ctx.get("missing"), None);
    }

    #[test]
    fn test_context_rejects_nested_values() {
        let result = EvaluationContext::from_json(&json!({"user": {"age": 3}}));
        assert!(matches!(result, Err(RuleError::InvalidContext(_))));

        let result = EvaluationContext::from_json(&json!({"x": null}));
        assert!(matches!(result, Err(RuleError::InvalidContext(_))));

        let result = EvaluationContext::from_json(&json!([1, 2]));
        assert!(matches!(result, Err(RuleError::InvalidContext(_))));
    }

    #[test]
    fn test_context_builder() {
        let ctx = EvaluationContext::new().with("a", 1).with("b", "x");
        assert_eq!(ctx.get("a"), Some(&Value::Number(1.0)));
        assert_eq!(ctx.get("b"), Some(&Value::from("x")));

        let ctx: EvaluationContext = [("c", true)].into_iter().collect();
        assert_eq!(ctx.get("c"), Some(&Value::Bool(true)));
    }
}
