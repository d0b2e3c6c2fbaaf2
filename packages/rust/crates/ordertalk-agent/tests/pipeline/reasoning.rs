use std::sync::Arc;

use super::{ReasoningStage, enforce_requirements, recent_turns};
use crate::contracts::{
    Intent, ModifyType, PerceptionResult, ReasoningResult, StageKind, UserInput,
};
use crate::error::ErrorKind;
use crate::llm::LlmContent;
use crate::session::Message;
use crate::test_support::ScriptedModel;

fn turn(user: &str, assistant: &str) -> Vec<Message> {
    vec![
        Message::user(&UserInput::from_text(user)),
        Message::assistant(assistant),
    ]
}

#[test]
fn recent_turns_starts_at_user_messages() {
    let mut history = turn("第一轮", "好的");
    history.extend(turn("第二轮", "好的"));
    history.push(Message::stage("action", "{\"order_id\":\"1001\"}"));
    history.extend(turn("第三轮", "好的"));

    let window = recent_turns(&history, 2);
    assert_eq!(window.len(), 5);
    assert_eq!(window[0].text(), "第二轮");
    assert_eq!(recent_turns(&history, 10).len(), history.len());
    assert!(recent_turns(&history, 0).is_empty());
}

#[test]
fn clarify_without_questions_gets_generic_question() {
    let result = enforce_requirements(
        ReasoningResult::new(Intent::Clarify),
        &PerceptionResult::empty(),
    );
    assert_eq!(result.intent, Intent::Clarify);
    assert_eq!(result.clarification_questions.len(), 1);
}

#[test]
fn query_borrows_order_number_from_perception() {
    let perception = PerceptionResult {
        order_number: Some("order1234567890".to_string()),
        ..PerceptionResult::empty()
    };
    let result = enforce_requirements(ReasoningResult::new(Intent::Query), &perception);
    assert_eq!(result.intent, Intent::Query);
    assert_eq!(result.order_number.as_deref(), Some("order1234567890"));
}

#[test]
fn modify_never_borrows_order_number_from_perception() {
    let perception = PerceptionResult {
        order_number: Some("13812345678".to_string()),
        ..PerceptionResult::empty()
    };
    let claimed = ReasoningResult {
        modify_type: Some(ModifyType::ModifyStatus),
        transport_status_name: Some("已送达".to_string()),
        ..ReasoningResult::new(Intent::Modify)
    };
    let result = enforce_requirements(claimed, &perception);
    assert_eq!(result.intent, Intent::Clarify);
    assert_eq!(result.order_number, None);
    assert_eq!(result.clarification_questions.len(), 1);
}

#[test]
fn modify_status_without_fields_becomes_clarify_with_two_questions() {
    let claimed = ReasoningResult {
        modify_type: Some(ModifyType::ModifyStatus),
        ..ReasoningResult::new(Intent::Modify)
    };
    let result = enforce_requirements(claimed, &PerceptionResult::empty());
    assert_eq!(result.intent, Intent::Clarify);
    assert_eq!(result.clarification_questions.len(), 2);
}

#[test]
fn invalid_status_label_forces_clarify() {
    let claimed = ReasoningResult {
        modify_type: Some(ModifyType::ModifyStatus),
        order_number: Some("order1234567890".to_string()),
        transport_status_name: Some("已签收".to_string()),
        ..ReasoningResult::new(Intent::Modify)
    };
    let result = enforce_requirements(claimed, &PerceptionResult::empty());
    assert_eq!(result.intent, Intent::Clarify);
    assert!(result.clarification_questions[0].contains("已签收"));
}

#[test]
fn node_fields_are_never_backfilled() {
    let perception = PerceptionResult {
        order_number: Some("order1234567890".to_string()),
        address: Some("北京市朝阳区".to_string()),
        ..PerceptionResult::empty()
    };
    let claimed = ReasoningResult {
        modify_type: Some(ModifyType::ModifyNode),
        order_id: Some("1001".to_string()),
        tracking_id: Some("77".to_string()),
        node_location: Some("上海".to_string()),
        ..ReasoningResult::new(Intent::Modify)
    };
    let result = enforce_requirements(claimed, &perception);
    assert_eq!(result.intent, Intent::Modify);
    let filled: Vec<_> = result
        .mutable_node_fields()
        .into_iter()
        .filter_map(|(name, value)| value.map(|_| name))
        .collect();
    assert_eq!(filled, vec!["node_location"]);
    assert_eq!(result.order_number, None);
}

#[tokio::test]
async fn model_failure_yields_unknown_intent() {
    let model = Arc::new(ScriptedModel::default().fail(StageKind::Reasoning, "timeout"));
    let stage = ReasoningStage::new(model, 3);
    let result = stage
        .reason("查一下 order1234567890", &PerceptionResult::empty(), &[])
        .await;
    assert_eq!(result.intent, Intent::Unknown);
    assert!(result.confidence.abs() < f64::EPSILON);
    assert!(!result.reasoning.is_empty());
    assert_eq!(result.failure, Some(ErrorKind::ModelInvocation));
}

#[tokio::test]
async fn unparsable_output_yields_unknown_intent() {
    let model = Arc::new(ScriptedModel::default().reply(StageKind::Reasoning, "我不确定"));
    let stage = ReasoningStage::new(model, 3);
    let result = stage.reason("你好", &PerceptionResult::empty(), &[]).await;
    assert_eq!(result.intent, Intent::Unknown);
    assert_eq!(result.failure, Some(ErrorKind::ModelInvocation));
}

#[tokio::test]
async fn genuine_unknown_intent_is_not_a_failure() {
    let model = Arc::new(
        ScriptedModel::default().reply(StageKind::Reasoning, r#"{"intent": "unknown"}"#),
    );
    let stage = ReasoningStage::new(model, 3);
    let result = stage.reason("今天天气怎么样", &PerceptionResult::empty(), &[]).await;
    assert_eq!(result.intent, Intent::Unknown);
    assert_eq!(result.failure, None);
}

#[tokio::test]
async fn prompt_embeds_only_the_history_window() {
    let model = Arc::new(
        ScriptedModel::default().reply(StageKind::Reasoning, r#"{"intent": "unknown"}"#),
    );
    let stage = ReasoningStage::new(model.clone(), 1);
    let mut history = turn("很早的问题", "很早的回答");
    history.extend(turn("上一轮问题", "上一轮回答"));
    let _ = stage
        .reason("继续", &PerceptionResult::empty(), &history)
        .await;

    let requests = model.requests(StageKind::Reasoning);
    let LlmContent::Text(ref prompt) = requests[0].messages[1].content else {
        panic!("reasoning prompt should be text");
    };
    assert!(prompt.contains("上一轮问题"));
    assert!(!prompt.contains("很早的问题"));
    assert!(prompt.contains("继续"));
}
