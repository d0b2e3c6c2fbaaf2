use super::{extract_json_object, parse_structured};
use crate::contracts::{Intent, PerceptionResult, ReasoningResult};
use crate::error::StructuredOutputError;

#[test]
fn extract_json_object_reads_fenced_block() {
    let text = "结果如下：\n```json\n{\"intent\": \"query\"}\n```\n以上。";
    assert_eq!(extract_json_object(text), Some("{\"intent\": \"query\"}"));
}

#[test]
fn extract_json_object_rejects_reversed_braces() {
    assert_eq!(extract_json_object("} nothing {"), None);
}

#[test]
fn parse_structured_accepts_prose_wrapped_reasoning() {
    let text = "分析完成 {\"intent\": \"query\", \"order_number\": \"order1234567890\", \"confidence\": 0.9} 请执行";
    let parsed: ReasoningResult = parse_structured(text).expect("reasoning should parse");
    assert_eq!(parsed.intent, Intent::Query);
    assert_eq!(parsed.order_number.as_deref(), Some("order1234567890"));
    assert!((parsed.confidence - 0.9).abs() < f64::EPSILON);
}

#[test]
fn parse_structured_normalizes_blank_and_numeric_fields() {
    let text = r#"{
        "intent": "modify",
        "modify_type": "modify_node",
        "order_id": 42,
        "tracking_id": " 7 ",
        "node_location": "",
        "operator": "null",
        "clarification_questions": null,
        "confidence": "1.7"
    }"#;
    let parsed: ReasoningResult = parse_structured(text).expect("reasoning should parse");
    assert_eq!(parsed.order_id.as_deref(), Some("42"));
    assert_eq!(parsed.tracking_id.as_deref(), Some("7"));
    assert_eq!(parsed.node_location, None);
    assert_eq!(parsed.operator, None);
    assert!(parsed.clarification_questions.is_empty());
    assert!((parsed.confidence - 1.0).abs() < f64::EPSILON);
}

#[test]
fn parse_structured_rejects_unknown_intent() {
    let result = parse_structured::<ReasoningResult>("{\"intent\": \"delete\"}");
    assert!(matches!(result, Err(StructuredOutputError::Schema(_))));
}

#[test]
fn parse_structured_rejects_missing_intent() {
    let result = parse_structured::<ReasoningResult>("{\"order_number\": \"order1234567890\"}");
    assert!(matches!(result, Err(StructuredOutputError::Schema(_))));
}

#[test]
fn parse_structured_reports_missing_json() {
    let result = parse_structured::<PerceptionResult>("我无法识别这张图片");
    assert_eq!(result, Err(StructuredOutputError::NoJson));
}

#[test]
fn perception_tolerates_partial_nulls() {
    let parsed: PerceptionResult = parse_structured(
        "{\"order_number\": null, \"company\": \"顺丰\", \"confidence\": -3}",
    )
    .expect("perception should parse");
    assert_eq!(parsed.order_number, None);
    assert_eq!(parsed.company.as_deref(), Some("顺丰"));
    assert!(parsed.confidence.abs() < f64::EPSILON);
}
