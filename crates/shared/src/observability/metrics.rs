//! 规则引擎指标
//!
//! 基于 metrics crate 的门面宏记录。未安装 recorder 时这些调用为空操作。

/// 注册指标描述
pub fn describe_metrics() {
    metrics::describe_counter!("rule_parses_total", "Total number of rule text parses");
    metrics::describe_counter!("rule_combines_total", "Total number of rule combinations");
    metrics::describe_histogram!(
        "rule_combine_input_size",
        "Number of rule texts passed to a combination"
    );
    metrics::describe_counter!("rule_evaluations_total", "Total number of rule evaluations");
    metrics::describe_histogram!(
        "rule_evaluation_duration_seconds",
        "Rule evaluation duration in seconds"
    );
}

/// 记录规则解析
pub fn record_rule_parse(status: &str) {
    metrics::counter!("rule_parses_total", "status" => status.to_string()).increment(1);
}

/// 记录规则合并
pub fn record_rule_combine(status: &str, rule_count: usize) {
    metrics::counter!("rule_combines_total", "status" => status.to_string()).increment(1);
    metrics::histogram!("rule_combine_input_size").record(rule_count as f64);
}

/// 记录规则评估
pub fn record_rule_evaluation(status: &str, duration_secs: f64) {
    metrics::counter!("rule_evaluations_total", "status" => status.to_string()).increment(1);
    metrics::histogram!("rule_evaluation_duration_seconds").record(duration_secs);
}

/// 记录失败的规则评估，不计入耗时分布
pub fn record_rule_evaluation_error() {
    metrics::counter!("rule_evaluations_total", "status" => "error").increment(1);
}
