use serde_json::json;

use super::{action_trace, clarify_from_rejection, input_rejected, truncate_chars};
use crate::contracts::{
    ActionCommand, ActionFields, ActionKind, ActionResult, Intent, ReasoningResult,
};
use crate::error::{ActionError, ErrorKind, ValidationError};
use crate::session::MessageRole;

#[test]
fn truncate_counts_characters_not_bytes() {
    assert_eq!(truncate_chars("运输中", 2), "运输…");
    assert_eq!(truncate_chars("运输中", 3), "运输中");
    assert_eq!(truncate_chars("", 5), "");
}

#[test]
fn action_trace_is_a_named_stage_message() {
    let result = ActionResult::succeeded(
        ActionKind::Query,
        "订单 order1234567890 查询成功",
        json!({"id": "1001", "tracks": [{"id": "77"}]}),
    );
    let trace = action_trace(&result, 10_000);
    assert_eq!(trace.role, MessageRole::Stage);
    assert_eq!(trace.name.as_deref(), Some("action"));
    assert!(trace.text().contains("\"77\""));

    let short = action_trace(&result, 8);
    assert_eq!(short.text().chars().count(), 9);
}

#[test]
fn rejection_becomes_question_for_the_failing_field() {
    let fields = ActionFields {
        order_id: Some("1001".to_string()),
        status_description: Some("已到达".to_string()),
        occurred_at_str: Some("2024-01-13".to_string()),
        ..ActionFields::default()
    };
    let command = ActionCommand::new(ActionKind::Insert, "s1", fields);
    let error = ActionError::from(ValidationError::ParameterMissing {
        field: "node_location",
    });
    let result = ActionResult::failed("insert", "参数校验失败", &error);
    let reasoning = ReasoningResult::new(Intent::Insert);

    let clarify = clarify_from_rejection(&reasoning, &command, &result);
    assert_eq!(clarify.intent, Intent::Clarify);
    assert_eq!(clarify.clarification_questions.len(), 1);
    assert!(clarify.clarification_questions[0].contains("地点"));
}

#[test]
fn rejected_input_is_flagged_as_input_parse() {
    let envelope = input_rejected("");
    assert!(!envelope.success);
    assert_eq!(envelope.data.error, Some(ErrorKind::InputParse));
    assert!(!envelope.message.is_empty());
}
