use std::sync::Arc;

use serde_json::json;

use super::{ResponseStage, is_unusable_reply, template_reply};
use crate::contracts::{ActionKind, ActionResult, Intent, ReasoningResult, StageKind};
use crate::error::{ActionError, BusinessApiError, ErrorKind};
use crate::test_support::ScriptedModel;

fn query_reasoning() -> ReasoningResult {
    ReasoningResult {
        order_number: Some("order1234567890".to_string()),
        ..ReasoningResult::new(Intent::Query)
    }
}

fn query_success() -> ActionResult {
    ActionResult::succeeded(
        ActionKind::Query,
        "订单 order1234567890 查询成功",
        json!({"status": "运输中"}),
    )
}

#[test]
fn bare_json_replies_are_unusable() {
    assert!(is_unusable_reply("   "));
    assert!(is_unusable_reply(r#"{"success": true}"#));
    assert!(is_unusable_reply("```json\n{\"success\": true}\n```"));
    assert!(is_unusable_reply("[1, 2]"));
    assert!(!is_unusable_reply("✅ 修改成功！"));
}

#[test]
fn clarification_template_numbers_questions() {
    let reasoning = ReasoningResult {
        clarification_questions: vec!["订单号是多少？".to_string(), "改成什么状态？".to_string()],
        ..ReasoningResult::new(Intent::Clarify)
    };
    let reply = template_reply(&reasoning, None);
    assert!(reply.starts_with("🤔"));
    assert!(reply.contains("1. 订单号是多少？"));
    assert!(reply.contains("2. 改成什么状态？"));
}

#[test]
fn failure_template_carries_retry_guidance() {
    let error = ActionError::from(BusinessApiError::Rejected("订单不存在".to_string()));
    let failed = ActionResult::failed("query", "查询订单失败，请稍后重试", &error);
    let reply = template_reply(&query_reasoning(), Some(&failed));
    assert!(reply.starts_with("❌ 操作失败"));
    assert!(reply.contains("稍后重试"));
}

#[test]
fn unknown_intent_template_is_not_empty() {
    let reply = template_reply(&ReasoningResult::unknown("无关问题"), None);
    assert!(!reply.trim().is_empty());
}

#[tokio::test]
async fn failed_reasoning_gets_service_error_reply_without_model_call() {
    let model = Arc::new(
        ScriptedModel::default().reply(StageKind::Response, "抱歉，我没有理解您的需求。"),
    );
    let stage = ResponseStage::new(model.clone());
    let reasoning =
        ReasoningResult::failed(ErrorKind::ModelInvocation, "推理过程发生错误: timeout");
    let reply = stage.render(&reasoning, None).await;
    assert!(reply.contains("处理您的请求时遇到了问题"));
    assert!(reply.contains("稍后重试"));
    assert!(reply.contains("timeout"));
    assert!(!reply.contains("没有理解"));
    assert_eq!(model.call_count(StageKind::Response), 0);
}

#[tokio::test]
async fn model_failure_falls_back_to_success_template() {
    let model = Arc::new(ScriptedModel::default().fail(StageKind::Response, "boom"));
    let stage = ResponseStage::new(model);
    let reply = stage.render(&query_reasoning(), Some(&query_success())).await;
    assert!(reply.contains("order1234567890"));
    assert!(reply.contains("✅"));
}

#[tokio::test]
async fn raw_execution_json_is_never_the_reply() {
    let execution = query_success();
    let raw = serde_json::to_string(&execution).expect("serialize result");
    let model = Arc::new(ScriptedModel::default().reply(StageKind::Response, raw));
    let stage = ResponseStage::new(model);
    let reply = stage.render(&query_reasoning(), Some(&execution)).await;
    assert!(!reply.trim_start().starts_with('{'));
    assert!(reply.contains("order1234567890"));
}

#[tokio::test]
async fn successful_reply_gains_missing_order_number() {
    let model = Arc::new(
        ScriptedModel::default().reply(StageKind::Response, "您的包裹正在运输中 🚚"),
    );
    let stage = ResponseStage::new(model.clone());
    let reply = stage.render(&query_reasoning(), Some(&query_success())).await;
    assert!(reply.starts_with("📦 订单号: order1234567890"));
    assert!(reply.contains("运输中"));

    let requests = model.requests(StageKind::Response);
    assert!(!requests[0].json_output);
}
