//! Response stage: user-facing text from reasoning and execution results.

use std::fmt::Write as _;
use std::sync::Arc;

use serde_json::Value;

use crate::contracts::{ActionResult, Intent, ReasoningResult, StageKind};
use crate::llm::{ChatModel, CompletionRequest, LlmMessage};
use crate::observability::PipelineEvent;

const RESPONSE_SYSTEM_PROMPT: &str = r"你是专业的物流客服助手，负责把系统处理结果转换成友好、简洁、结构化的中文回复。

要求：
- 查询结果：以“📦 订单号: xxx”开头，列出当前状态、位置和物流轨迹
- 修改或新增成功：以“✅”开头，说明改了什么
- 需要补充信息：以“🤔 为了帮您完成操作，还需要一些信息：”开头，逐条列出问题
- 操作失败：以“❌ 操作失败”开头，说明原因并给出建议（检查订单号、稍后重试或联系人工客服）
- 不要直接输出 JSON，不要使用技术术语
- 结尾给出下一步建议";

const UNKNOWN_INTENT_REPLY: &str = "抱歉，我没有理解您的需求。我可以帮您：\n• 查询订单物流（例如：查一下 order1234567890）\n• 修改订单运输状态（例如：把 order1234567890 改成已送达）\n• 修改或新增物流节点\n\n请告诉我您想做什么？";

fn build_response_input(reasoning: &ReasoningResult, execution: Option<&ActionResult>) -> String {
    let mut out = format!("## 用户意图: {}\n", reasoning.intent);
    if !reasoning.reasoning.is_empty() {
        let _ = writeln!(out, "\n## 推理过程:\n{}", reasoning.reasoning);
    }
    if reasoning.intent == Intent::Clarify && !reasoning.clarification_questions.is_empty() {
        out.push_str("\n## 需要向用户询问的问题:\n");
        for (index, question) in reasoning.clarification_questions.iter().enumerate() {
            let _ = writeln!(out, "{}. {question}", index + 1);
        }
    }
    if let Some(execution) = execution {
        let rendered = serde_json::to_string_pretty(execution).unwrap_or_default();
        let _ = writeln!(out, "\n## 执行结果:\n```json\n{rendered}\n```");
    }
    out.push_str("\n请根据以上信息，生成用户友好的回复。");
    out
}

/// True for empty replies and replies that are only a JSON object or array.
fn is_unusable_reply(reply: &str) -> bool {
    let trimmed = reply.trim();
    if trimmed.is_empty() {
        return true;
    }
    let unfenced = trimmed
        .strip_prefix("```json")
        .or_else(|| trimmed.strip_prefix("```"))
        .and_then(|rest| rest.strip_suffix("```"))
        .map_or(trimmed, str::trim);
    matches!(
        serde_json::from_str::<Value>(unfenced),
        Ok(Value::Object(_) | Value::Array(_))
    )
}

/// Order number the reply should mention, when one is known.
fn order_reference(reasoning: &ReasoningResult, execution: Option<&ActionResult>) -> Option<String> {
    reasoning
        .order_number
        .clone()
        .or_else(|| reasoning.order_id.clone())
        .or_else(|| {
            let data = &execution?.data;
            ["order_number", "orderNumber", "order_id", "orderId"]
                .iter()
                .find_map(|key| data.get(key).and_then(Value::as_str))
                .map(str::to_string)
        })
}

fn clarification_reply(questions: &[String]) -> String {
    let mut out = String::from("🤔 为了帮您完成操作，还需要一些信息：\n");
    for (index, question) in questions.iter().enumerate() {
        let _ = write!(out, "\n{}. {question}", index + 1);
    }
    out.push_str("\n\n请提供以上信息，我将立即为您处理。");
    out
}

fn success_reply(result: &ActionResult, order: Option<&str>) -> String {
    let mut out = String::new();
    if let Some(order) = order {
        let _ = writeln!(out, "📦 订单号: {order}\n");
    }
    let _ = write!(out, "✅ {}\n\n还需要其他帮助吗？", result.message);
    out
}

fn service_error_reply(reasoning: &ReasoningResult) -> String {
    let mut out = String::from("😔 抱歉，处理您的请求时遇到了问题，请稍后重试。");
    if !reasoning.reasoning.is_empty() {
        let _ = write!(out, "\n\n原因: {}", reasoning.reasoning);
    }
    out.push_str("\n\n如果问题持续存在，请联系人工客服。");
    out
}

fn failure_reply(result: &ActionResult) -> String {
    format!(
        "❌ 操作失败\n\n原因: {}\n\n建议:\n• 检查订单号是否正确\n• 稍后重试或联系人工客服\n\n需要其他帮助吗？",
        result.message
    )
}

/// Deterministic reply used whenever the model cannot be trusted to answer.
#[must_use]
pub fn template_reply(reasoning: &ReasoningResult, execution: Option<&ActionResult>) -> String {
    match execution {
        Some(result) if result.success => {
            success_reply(result, order_reference(reasoning, execution).as_deref())
        }
        Some(result) => failure_reply(result),
        None if reasoning.failure.is_some() => service_error_reply(reasoning),
        None if reasoning.intent == Intent::Clarify
            && !reasoning.clarification_questions.is_empty() =>
        {
            clarification_reply(&reasoning.clarification_questions)
        }
        None => UNKNOWN_INTENT_REPLY.to_string(),
    }
}

pub struct ResponseStage {
    model: Arc<dyn ChatModel>,
}

impl ResponseStage {
    #[must_use]
    pub fn new(model: Arc<dyn ChatModel>) -> Self {
        Self { model }
    }

    /// Never returns an empty string or a bare JSON payload.
    ///
    /// A failed reasoning call is answered with the service-error template without
    /// consulting the model again.
    pub async fn render(
        &self,
        reasoning: &ReasoningResult,
        execution: Option<&ActionResult>,
    ) -> String {
        if let Some(failure) = reasoning.failure {
            tracing::warn!(
                event = PipelineEvent::ResponseFallback.as_str(),
                reason = failure.as_str(),
                "reasoning failed; using service error template"
            );
            return template_reply(reasoning, execution);
        }
        let request = CompletionRequest {
            stage: StageKind::Response,
            messages: vec![
                LlmMessage::system(RESPONSE_SYSTEM_PROMPT),
                LlmMessage::user(build_response_input(reasoning, execution)),
            ],
            json_output: false,
        };
        let reply = match self.model.complete(request).await {
            Ok(reply) if !is_unusable_reply(&reply) => reply.trim().to_string(),
            Ok(_) => {
                tracing::warn!(
                    event = PipelineEvent::ResponseFallback.as_str(),
                    reason = "unusable_reply",
                    "model reply empty or raw JSON; using template"
                );
                return template_reply(reasoning, execution);
            }
            Err(error) => {
                tracing::warn!(
                    event = PipelineEvent::ResponseFallback.as_str(),
                    reason = "model_error",
                    error = %error,
                    "response model failed; using template"
                );
                return template_reply(reasoning, execution);
            }
        };
        let reply = match (execution, order_reference(reasoning, execution)) {
            (Some(result), Some(order)) if result.success && !reply.contains(&order) => {
                format!("📦 订单号: {order}\n\n{reply}")
            }
            _ => reply,
        };
        tracing::info!(
            event = PipelineEvent::ResponseRendered.as_str(),
            intent = reasoning.intent.as_str(),
            reply_chars = reply.chars().count(),
            "response rendered"
        );
        reply
    }
}

#[cfg(test)]
#[path = "../../tests/pipeline/response.rs"]
mod tests;
