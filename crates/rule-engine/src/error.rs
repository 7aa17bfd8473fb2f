//! 规则引擎错误类型

use thiserror::Error;

#[derive(Debug, Error)]
pub enum RuleError {
    #[error("规则解析失败: 无法识别 '{0}'")]
    ParseFailure(String),

    #[error("没有可合并的规则")]
    CombineEmpty,

    #[error("操作数无法解析: 数据中不存在 '{0}'")]
    UnresolvedOperand(String),

    #[error("未知操作符: {0}")]
    UnknownOperator(String),

    #[error("未知节点类型: {0}")]
    UnknownNodeKind(String),

    #[error("语法树结构无效: {0}")]
    InvalidTree(String),

    #[error("类型不匹配: {left} {operator} {right}")]
    TypeMismatch {
        operator: String,
        left: String,
        right: String,
    },

    #[error("评估数据无效: {0}")]
    InvalidContext(String),

    #[error("输入过大: {what} 为 {actual}, 上限 {max}")]
    InputTooLarge {
        what: &'static str,
        actual: usize,
        max: usize,
    },

    #[error("JSON 序列化错误: {0}")]
    JsonError(#[from] serde_json::Error),
}

pub type Result<T> = std::result::Result<T, RuleError>;
