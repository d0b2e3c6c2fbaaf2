//! Reasoning stage: intent, modify sub-type and action parameters.

use std::fmt::Write as _;
use std::sync::Arc;

use crate::contracts::{
    ActionFields, ActionKind, Intent, PerceptionResult, ReasoningResult, StageKind,
    TransportStatus,
};
use crate::error::{ErrorKind, ModelError};
use crate::llm::{ChatModel, CompletionRequest, LlmMessage, parse_structured};
use crate::observability::PipelineEvent;
use crate::session::{Message, MessageRole};

use super::validation::{clarification_question, violations};

const GENERIC_CLARIFY_QUESTION: &str = "请问您想查询还是修改哪个订单的什么信息？请提供订单号和具体要求。";

fn reasoning_system_prompt() -> String {
    format!(
        r#"你是物流业务推理助手，负责判断用户意图并抽取执行参数。

意图 intent 取值：
- query：查询订单物流，需要 order_number 或 order_id
- modify：修改信息，必须给出 modify_type
  - modify_status：修改订单整体运输状态，需要订单标识（order_id 或 order_number）和 transport_status_name
  - modify_node：修改某个已有物流节点，需要 order_id、tracking_id（从对话上下文中之前的查询结果获得）以及至少一个要修改的字段
- insert：新增物流节点，需要 order_id、status_description、node_location、occurred_at_str
- clarify：信息不足，clarification_questions 中每个缺失字段一个问题
- unknown：与物流业务无关或无法判断

规则：
- transport_status_name 只能是以下之一：{statuses}；其他取值必须改为 clarify
- occurred_at_str 必须是 yyyy-MM-dd 格式
- 用户没有明确提到的字段一律填 null，不要根据上下文猜测或补全节点字段
- 不确定时优先选择 clarify，避免错误操作

只输出一个 JSON 对象：
{{
  "intent": "query" | "modify" | "insert" | "clarify" | "unknown",
  "modify_type": "modify_status" | "modify_node" | null,
  "order_id": string | null,
  "order_number": string | null,
  "transport_status_name": string | null,
  "tracking_id": string | null,
  "node_location": string | null,
  "status_description": string | null,
  "operator": string | null,
  "vehicle_plate": string | null,
  "occurred_at_str": string | null,
  "remark": string | null,
  "content": string | null,
  "clarification_questions": [string],
  "confidence": number,
  "reasoning": string
}}"#,
        statuses = TransportStatus::allowed_labels()
    )
}

/// Messages of the last `turns` turns; a turn starts at a user message.
#[must_use]
pub fn recent_turns(history: &[Message], turns: usize) -> &[Message] {
    if turns == 0 {
        return &[];
    }
    let mut seen = 0;
    for (index, message) in history.iter().enumerate().rev() {
        if message.role == MessageRole::User {
            seen += 1;
            if seen == turns {
                return &history[index..];
            }
        }
    }
    history
}

fn build_reasoning_input(
    user_text: &str,
    perception: &PerceptionResult,
    history: &[Message],
) -> String {
    let mut out = String::new();
    if !perception.is_empty() {
        let rendered = serde_json::to_string_pretty(perception).unwrap_or_default();
        let _ = writeln!(out, "## 感知阶段提取的信息\n```json\n{rendered}\n```\n");
    }
    if !history.is_empty() {
        out.push_str("## 对话上下文\n");
        for message in history {
            let speaker = match (&message.role, &message.name) {
                (MessageRole::Stage, Some(name)) => format!("stage({name})"),
                (role, _) => role.as_str().to_string(),
            };
            let _ = writeln!(out, "- {speaker}: {}", message.text());
        }
        out.push('\n');
    }
    let _ = writeln!(out, "## 用户当前输入\n{user_text}\n");
    out.push_str("请根据以上信息判断用户意图并输出 JSON。");
    out
}

/// Re-check the model's claims with the validation gate.
///
/// Unmet requirements turn the result into `clarify`. Only a read-only query may borrow the
/// perceived order number; mutating commands keep exactly the identifiers the model gave.
pub(crate) fn enforce_requirements(
    mut result: ReasoningResult,
    perception: &PerceptionResult,
) -> ReasoningResult {
    if result.intent == Intent::Clarify {
        if result.clarification_questions.is_empty() {
            result
                .clarification_questions
                .push(GENERIC_CLARIFY_QUESTION.to_string());
        }
        return result;
    }
    let Some(kind) = ActionKind::for_reasoning(&result) else {
        return result;
    };
    if kind == ActionKind::Query
        && result.order_number.is_none()
        && result.order_id.is_none()
        && let Some(ref order_number) = perception.order_number
    {
        result.order_number = Some(order_number.clone());
    }
    let unmet = violations(kind, &ActionFields::from_reasoning(&result));
    if unmet.is_empty() {
        return result;
    }
    tracing::info!(
        event = PipelineEvent::ReasoningRequirementsUnmet.as_str(),
        claimed_intent = result.intent.as_str(),
        action = kind.as_str(),
        unmet = unmet.len(),
        "reasoning output incomplete; asking for clarification"
    );
    result.intent = Intent::Clarify;
    result.clarification_questions = unmet.iter().map(clarification_question).collect();
    result
}

pub struct ReasoningStage {
    model: Arc<dyn ChatModel>,
    history_turns: usize,
}

impl ReasoningStage {
    #[must_use]
    pub fn new(model: Arc<dyn ChatModel>, history_turns: usize) -> Self {
        Self {
            model,
            history_turns,
        }
    }

    /// Never fails: model or parse errors yield an `unknown` result with confidence 0 and
    /// `failure` set to [`ErrorKind::ModelInvocation`].
    pub async fn reason(
        &self,
        user_text: &str,
        perception: &PerceptionResult,
        history: &[Message],
    ) -> ReasoningResult {
        let window = recent_turns(history, self.history_turns);
        let request = CompletionRequest {
            stage: StageKind::Reasoning,
            messages: vec![
                LlmMessage::system(reasoning_system_prompt()),
                LlmMessage::user(build_reasoning_input(user_text, perception, window)),
            ],
            json_output: true,
        };
        let parsed = match self.model.complete(request).await {
            Ok(text) => parse_structured::<ReasoningResult>(&text).map_err(ModelError::from),
            Err(error) => Err(error),
        };
        match parsed {
            Ok(result) => {
                let result = enforce_requirements(result, perception);
                tracing::info!(
                    event = PipelineEvent::ReasoningCompleted.as_str(),
                    intent = result.intent.as_str(),
                    modify_type = result.modify_type.map(|t| t.as_str()),
                    confidence = result.confidence,
                    history_messages = window.len(),
                    "reasoning completed"
                );
                result
            }
            Err(error) => {
                tracing::warn!(
                    event = PipelineEvent::ReasoningFailed.as_str(),
                    error = %error,
                    "reasoning failed; routing to error reply"
                );
                ReasoningResult::failed(
                    ErrorKind::ModelInvocation,
                    format!("推理过程发生错误: {error}"),
                )
            }
        }
    }
}

#[cfg(test)]
#[path = "../../tests/pipeline/reasoning.rs"]
mod tests;
