//! 语法树的存储表示
//!
//! 与已存储的规则保持一致的带标签记录格式：
//!
//! ```json
//! {"type": "operator", "value": "AND", "left": {...}, "right": {...}}
//! {"type": "operand", "value": "age"}
//! ```
//!
//! 反序列化时校验结构，任何不满足节点约束的输入都不会成为 [`Node`]。

use crate::error::{Result, RuleError};
use crate::models::Node;
use crate::operators::Operator;
use serde::ser::SerializeStruct;
use serde::{Deserialize, Deserializer, Serialize, Serializer};

/// 能从 JSON 文本恢复的最大树深度
///
/// serde_json 默认最多嵌套 127 层对象，深度为 d 的树占 d + 1 层。
pub const MAX_STORED_DEPTH: usize = 126;

/// 未经校验的节点记录
#[derive(Debug, Deserialize)]
struct RawNode {
    #[serde(rename = "type")]
    kind: String,
    #[serde(default)]
    value: Option<String>,
    #[serde(default)]
    left: Option<Box<RawNode>>,
    #[serde(default)]
    right: Option<Box<RawNode>>,
}

impl TryFrom<RawNode> for Node {
    type Error = RuleError;

    fn try_from(raw: RawNode) -> Result<Self> {
        match raw.kind.as_str() {
            "operator" => {
                let symbol = raw
                    .value
                    .ok_or_else(|| RuleError::InvalidTree("操作符节点缺少 value".to_string()))?;
                let operator: Operator = symbol.parse()?;

                let (Some(left), Some(right)) = (raw.left, raw.right) else {
                    return Err(RuleError::InvalidTree(format!(
                        "操作符节点 '{}' 必须同时具有 left 和 right",
                        operator
                    )));
                };

                Ok(Node::operator(
                    operator,
                    Node::try_from(*left)?,
                    Node::try_from(*right)?,
                ))
            }
            "operand" => {
                if raw.left.is_some() || raw.right.is_some() {
                    return Err(RuleError::InvalidTree(
                        "操作数节点不能有子节点".to_string(),
                    ));
                }

                match raw.value {
                    Some(literal) if !literal.is_empty() => Ok(Node::operand(literal)),
                    _ => Err(RuleError::InvalidTree("操作数节点的 value 不能为空".to_string())),
                }
            }
            other => Err(RuleError::UnknownNodeKind(other.to_string())),
        }
    }
}

impl Serialize for Node {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        match self {
            Node::Operator {
                operator,
                left,
                right,
            } => {
                let mut state = serializer.serialize_struct("Node", 4)?;
                state.serialize_field("type", "operator")?;
                state.serialize_field("value", operator.symbol())?;
                state.serialize_field("left", left)?;
                state.serialize_field("right", right)?;
                state.end()
            }
            Node::Operand { literal } => {
                let mut state = serializer.serialize_struct("Node", 2)?;
                state.serialize_field("type", "operand")?;
                state.serialize_field("value", literal)?;
                state.end()
            }
        }
    }
}

impl<'de> Deserialize<'de> for Node {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> std::result::Result<Self, D::Error> {
        let raw = RawNode::deserialize(deserializer)?;
        Node::try_from(raw).map_err(serde::de::Error::custom)
    }
}

impl Node {
    /// 从存储的 JSON 值恢复语法树，保留具体的错误类型
    pub fn from_json(value: serde_json::Value) -> Result<Node> {
        let raw: RawNode = serde_json::from_value(value)?;
        Node::try_from(raw)
    }

    pub fn from_json_str(json: &str) -> Result<Node> {
        let raw: RawNode = serde_json::from_str(json)?;
        Node::try_from(raw)
    }

    pub fn to_json(&self) -> serde_json::Value {
        // Node 的序列化只产生字符串键和字符串值，不会失败
        serde_json::to_value(self).unwrap_or(serde_json::Value::Null)
    }
}
