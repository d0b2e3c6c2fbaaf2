//! Perception stage: entities from raw multimodal input.

use std::sync::{Arc, LazyLock};

use regex::Regex;

use crate::config::PerceptionMode;
use crate::contracts::{PerceptionResult, StageKind, UserInput};
use crate::error::ModelError;
use crate::llm::{ChatModel, CompletionRequest, LlmMessage, parse_structured};
use crate::observability::PipelineEvent;

const PERCEPTION_SYSTEM_PROMPT: &str = r#"你是物流信息感知助手，负责从用户输入（文字、物流面单或截图）中提取关键信息。

订单号常见格式：
- 以 order 开头后跟字母数字，如 order1234567890
- ORD 开头加年份和序号，如 ORD-2024-001
- 10 到 25 位纯数字

只输出一个 JSON 对象，字段如下（找不到的字段填 null，不要编造）：
{
  "order_number": string | null,
  "phone": string | null,
  "address": string | null,
  "company": string | null,
  "image_description": string | null,
  "confidence": number (0 到 1，信息模糊或图片不清晰时低于 0.5),
  "current_status": string | null
}"#;

/// Ordered from most to least specific; the token is capture group 1, bounded by
/// non-alphanumeric ASCII or the text edges.
static ORDER_NUMBER_PATTERNS: LazyLock<Vec<Regex>> = LazyLock::new(|| {
    [
        r"(?i)(?:^|[^a-z0-9])(order[a-z0-9]{8,20})(?:$|[^a-z0-9])",
        r"(?i)(?:^|[^a-z0-9])(ORD[-_]?[0-9]{4}[-_]?[0-9]{3,})(?:$|[^a-z0-9])",
        r"(?:^|[^0-9A-Za-z])([0-9]{10,25})(?:$|[^0-9A-Za-z])",
    ]
    .into_iter()
    .map(|pattern| {
        Regex::new(pattern)
            .unwrap_or_else(|err| panic!("invalid ORDER_NUMBER_PATTERNS regex: {err}"))
    })
    .collect()
});

/// First order-number-shaped token in `text`.
#[must_use]
pub fn extract_order_number(text: &str) -> Option<String> {
    extract_order_number_except(text, None)
}

/// Like [`extract_order_number`], skipping tokens that are the digits of `phone`.
fn extract_order_number_except(text: &str, phone: Option<&str>) -> Option<String> {
    let phone_digits: String = phone
        .unwrap_or_default()
        .chars()
        .filter(char::is_ascii_digit)
        .collect();
    let is_phone = |token: &str| !phone_digits.is_empty() && phone_digits.ends_with(token);
    ORDER_NUMBER_PATTERNS.iter().find_map(|pattern| {
        let mut start = 0;
        while let Some(found) = pattern.captures_at(text, start).and_then(|caps| caps.get(1)) {
            if !is_phone(found.as_str()) {
                return Some(found.as_str().to_string());
            }
            start = found.end();
        }
        None
    })
}

pub struct PerceptionStage {
    model: Arc<dyn ChatModel>,
    mode: PerceptionMode,
}

impl PerceptionStage {
    #[must_use]
    pub fn new(model: Arc<dyn ChatModel>, mode: PerceptionMode) -> Self {
        Self { model, mode }
    }

    /// Never fails: skipped or failed extraction yields the zero-confidence result.
    pub async fn perceive(&self, input: &UserInput) -> PerceptionResult {
        if self.mode == PerceptionMode::ImageOnly && !input.has_image() {
            tracing::debug!(
                event = PipelineEvent::PerceptionSkipped.as_str(),
                mode = self.mode.as_str(),
                "perception skipped for text-only input"
            );
            return PerceptionResult::empty();
        }

        let request = CompletionRequest {
            stage: StageKind::Perception,
            messages: vec![
                LlmMessage::system(PERCEPTION_SYSTEM_PROMPT),
                LlmMessage::user_parts(input.to_model_parts()),
            ],
            json_output: true,
        };
        let parsed = match self.model.complete(request).await {
            Ok(text) => parse_structured::<PerceptionResult>(&text).map_err(ModelError::from),
            Err(error) => Err(error),
        };
        let mut result = match parsed {
            Ok(result) => result,
            Err(error) => {
                tracing::warn!(
                    event = PipelineEvent::PerceptionFailed.as_str(),
                    error = %error,
                    "perception failed; continuing with empty result"
                );
                return PerceptionResult::empty();
            }
        };
        if result.order_number.is_none() {
            result.order_number =
                extract_order_number_except(&input.text(), result.phone.as_deref());
        }
        tracing::info!(
            event = PipelineEvent::PerceptionCompleted.as_str(),
            order_number = ?result.order_number,
            confidence = result.confidence,
            has_image = input.has_image(),
            "perception completed"
        );
        result
    }
}

#[cfg(test)]
#[path = "../../tests/pipeline/perception.rs"]
mod tests;
