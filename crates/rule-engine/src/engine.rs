//! 规则引擎门面
//!
//! 组合解析、合并与执行，并在入口处施加输入大小上限、记录日志和指标。
//! 配置通过 [`EngineConfig`] 显式传入，不依赖全局状态。

use crate::combiner::RuleCombiner;
use crate::error::{Result, RuleError};
use crate::executor::RuleExecutor;
use crate::models::{EvaluationContext, EvaluationResult, Node, Rule};
use crate::operators::Operator;
use crate::parser::RuleParser;
use crate::serialization::MAX_STORED_DEPTH;
use rule_shared::config::EngineConfig;
use rule_shared::observability::metrics;
use std::time::Instant;
use tracing::{debug, instrument, warn};

/// 规则引擎
#[derive(Debug, Clone, Default)]
pub struct RuleEngine {
    config: EngineConfig,
}

impl RuleEngine {
    pub fn new(config: EngineConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    /// 解析规则文本
    #[instrument(skip(self, rule), fields(rule_len = rule.len()))]
    pub fn parse(&self, rule: &str) -> Result<Node> {
        self.check_rule_length(rule)?;

        let parsed = RuleParser::parse(rule).and_then(|node| self.check_tree_depth(node));
        match parsed {
            Ok(node) => {
                metrics::record_rule_parse("success");
                debug!(ast = %node, "规则解析完成");
                Ok(node)
            }
            Err(e) => {
                metrics::record_rule_parse("failure");
                warn!(rule = %rule, error = %e, "规则解析失败");
                Err(e)
            }
        }
    }

    /// 解析规则文本并生成规则记录
    pub fn create_rule(&self, rule: &str) -> Result<Rule> {
        let ast = self.parse(rule)?;
        Ok(Rule::new(rule, ast))
    }

    /// 合并多条规则
    #[instrument(skip_all, fields(rule_count = rules.len(), operator = %operator))]
    pub fn combine<S: AsRef<str>>(&self, rules: &[S], operator: Operator) -> Result<Node> {
        if rules.len() > self.config.max_combine_rules {
            return Err(RuleError::InputTooLarge {
                what: "rule count",
                actual: rules.len(),
                max: self.config.max_combine_rules,
            });
        }
        for rule in rules {
            self.check_rule_length(rule.as_ref())?;
        }

        let combined =
            RuleCombiner::combine(rules, operator).and_then(|node| self.check_tree_depth(node));
        match combined {
            Ok(node) => {
                metrics::record_rule_combine("success", rules.len());
                debug!(depth = node.depth(), "规则合并完成");
                Ok(node)
            }
            Err(e) => {
                let status = match e {
                    RuleError::CombineEmpty => "empty",
                    _ => "too_deep",
                };
                metrics::record_rule_combine(status, rules.len());
                warn!(error = %e, "规则合并失败");
                Err(e)
            }
        }
    }

    /// 合并多条规则，操作符以文本给出
    pub fn combine_with_symbol<S: AsRef<str>>(&self, rules: &[S], operator: &str) -> Result<Node> {
        let operator: Operator = operator.parse()?;
        self.combine(rules, operator)
    }

    /// 评估语法树
    #[instrument(skip_all)]
    pub fn evaluate(&self, ast: &Node, context: &EvaluationContext) -> Result<EvaluationResult> {
        let start = Instant::now();
        let executor = if self.config.trace_enabled {
            RuleExecutor::new().with_trace()
        } else {
            RuleExecutor::new()
        };

        match executor.execute(ast, context) {
            Ok(result) => {
                metrics::record_rule_evaluation("success", start.elapsed().as_secs_f64());
                debug!(matched = result.matched, value = %result.value, "规则评估完成");
                Ok(result)
            }
            Err(e) => {
                metrics::record_rule_evaluation_error();
                warn!(error = %e, "规则评估失败");
                Err(e)
            }
        }
    }

    fn check_rule_length(&self, rule: &str) -> Result<()> {
        let length = rule.chars().count();
        if length > self.config.max_rule_length {
            return Err(RuleError::InputTooLarge {
                what: "rule length",
                actual: length,
                max: self.config.max_rule_length,
            });
        }
        Ok(())
    }

    /// 树深度上限，不会超过可从 JSON 恢复的深度
    pub fn max_tree_depth(&self) -> usize {
        self.config.max_tree_depth.min(MAX_STORED_DEPTH)
    }

    fn check_tree_depth(&self, node: Node) -> Result<Node> {
        let depth = node.depth();
        let max = self.max_tree_depth();
        if depth > max {
            return Err(RuleError::InputTooLarge {
                what: "tree depth",
                actual: depth,
                max,
            });
        }
        Ok(node)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::Value;
    use ::metrics::{
        Counter, Gauge, Histogram, HistogramFn, Key, KeyName, Metadata, Recorder, SharedString,
        Unit,
    };
    use std::sync::{Arc, Mutex};

    /// 只记录直方图写入的测试 recorder
    #[derive(Default)]
    struct HistogramRecorder {
        recorded: Arc<Mutex<Vec<String>>>,
    }

    impl HistogramRecorder {
        fn recorded(&self) -> Vec<String> {
            self.recorded.lock().unwrap().clone()
        }
    }

    struct NamedHistogram {
        name: String,
        recorded: Arc<Mutex<Vec<String>>>,
    }

    impl HistogramFn for NamedHistogram {
        fn record(&self, _value: f64) {
            self.recorded.lock().unwrap().push(self.name.clone());
        }
    }

    impl Recorder for HistogramRecorder {
        fn describe_counter(&self, _: KeyName, _: Option<Unit>, _: SharedString) {}
        fn describe_gauge(&self, _: KeyName, _: Option<Unit>, _: SharedString) {}
        fn describe_histogram(&self, _: KeyName, _: Option<Unit>, _: SharedString) {}

        fn register_counter(&self, _: &Key, _: &Metadata<'_>) -> Counter {
            Counter::noop()
        }

        fn register_gauge(&self, _: &Key, _: &Metadata<'_>) -> Gauge {
            Gauge::noop()
        }

        fn register_histogram(&self, key: &Key, _: &Metadata<'_>) -> Histogram {
            Histogram::from_arc(Arc::new(NamedHistogram {
                name: key.name().to_string(),
                recorded: Arc::clone(&self.recorded),
            }))
        }
    }

    fn engine() -> RuleEngine {
        RuleEngine::new(EngineConfig::default())
    }

    #[test]
    fn test_parse_and_evaluate() {
        let engine = engine();
        let ast = engine.parse("age > 30 AND status = 'active'").unwrap();

        let context = EvaluationContext::new()
            .with("age", 35)
            .with("status", "active");
        let result = engine.evaluate(&ast, &context).unwrap();

        assert!(result.matched);
        assert_eq!(result.value, Value::Bool(true));
        assert!(result.evaluation_trace.is_empty());
    }

    #[test]
    fn test_rule_length_limit() {
        let engine = RuleEngine::new(EngineConfig {
            max_rule_length: 8,
            ..Default::default()
        });

        assert!(engine.parse("age > 30").is_ok());
        assert!(matches!(
            engine.parse("age > 300"),
            Err(RuleError::InputTooLarge { actual: 9, max: 8, .. })
        ));
    }

    #[test]
    fn test_combine_count_limit() {
        let engine = RuleEngine::new(EngineConfig {
            max_combine_rules: 2,
            ..Default::default()
        });

        assert!(engine.combine(&["a=1", "b=2"], Operator::And).is_ok());
        assert!(matches!(
            engine.combine(&["a=1", "b=2", "c=3"], Operator::And),
            Err(RuleError::InputTooLarge { actual: 3, max: 2, .. })
        ));
    }

    #[test]
    fn test_tree_depth_limit() {
        let engine = RuleEngine::new(EngineConfig {
            max_tree_depth: 2,
            ..Default::default()
        });

        assert!(engine.parse("a=1 AND b=2").is_ok());
        assert!(matches!(
            engine.parse("a=1 AND b=2 AND c=3"),
            Err(RuleError::InputTooLarge { what: "tree depth", actual: 3, max: 2 })
        ));

        // 两条规则合并后深度为 2，四条为 3
        assert!(engine.combine(&["a=1", "b=2"], Operator::Or).is_ok());
        assert!(matches!(
            engine.combine(&["a=1", "b=2", "c=3", "d=4"], Operator::Or),
            Err(RuleError::InputTooLarge { what: "tree depth", actual: 3, max: 2 })
        ));
    }

    #[test]
    fn test_tree_depth_capped_at_storable_depth() {
        let engine = RuleEngine::new(EngineConfig {
            max_tree_depth: 10_000,
            ..Default::default()
        });
        assert_eq!(engine.max_tree_depth(), MAX_STORED_DEPTH);

        let too_deep = vec!["a=1"; MAX_STORED_DEPTH + 4].join(" AND ");
        assert!(matches!(
            engine.parse(&too_deep),
            Err(RuleError::InputTooLarge { what: "tree depth", .. })
        ));

        let deepest = vec!["a=1"; MAX_STORED_DEPTH].join(" AND ");
        let ast = engine.parse(&deepest).unwrap();
        assert_eq!(ast.depth(), MAX_STORED_DEPTH);

        let stored = serde_json::to_string(&ast).unwrap();
        let restored = Node::from_json_str(&stored).unwrap();
        assert_eq!(restored, ast);
        let result = engine
            .evaluate(&restored, &EvaluationContext::new().with("a", 1))
            .unwrap();
        assert!(result.matched);
    }

    #[test]
    fn test_failed_evaluation_records_no_duration() {
        let recorder = HistogramRecorder::default();
        let engine = engine();
        let ast = engine.parse("age > 30").unwrap();

        ::metrics::with_local_recorder(&recorder, || {
            assert!(engine.evaluate(&ast, &EvaluationContext::new()).is_err());
        });
        assert!(recorder.recorded().is_empty());

        ::metrics::with_local_recorder(&recorder, || {
            let context = EvaluationContext::new().with("age", 40);
            assert!(engine.evaluate(&ast, &context).is_ok());
        });
        assert_eq!(recorder.recorded(), vec!["rule_evaluation_duration_seconds"]);
    }

    #[test]
    fn test_combine_with_symbol() {
        let engine = engine();
        let ast = engine.combine_with_symbol(&["a=1", "b=2"], "OR").unwrap();
        assert!(matches!(
            ast,
            Node::Operator {
                operator: Operator::Or,
                ..
            }
        ));

        assert!(matches!(
            engine.combine_with_symbol(&["a=1"], "XOR"),
            Err(RuleError::UnknownOperator(_))
        ));
    }

    #[test]
    fn test_trace_enabled_by_config() {
        let engine = RuleEngine::new(EngineConfig {
            trace_enabled: true,
            ..Default::default()
        });
        let ast = engine.parse("x = 1").unwrap();
        let result = engine
            .evaluate(&ast, &EvaluationContext::new().with("x", 1))
            .unwrap();
        assert_eq!(result.evaluation_trace.len(), 3);
    }

    #[test]
    fn test_create_rule() {
        let rule = engine().create_rule("dept = 'Sales'").unwrap();
        assert_eq!(rule.rule, "dept = 'Sales'");
        assert!(!rule.id.is_empty());
        assert_eq!(rule.ast.identifiers().into_iter().collect::<Vec<_>>(), vec!["dept"]);

        assert!(matches!(
            engine().create_rule("not a rule"),
            Err(RuleError::ParseFailure(_))
        ));
    }
}
