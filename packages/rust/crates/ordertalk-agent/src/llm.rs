//! LLM client: OpenAI-compatible chat completions with multimodal parts and JSON mode.

use std::time::Duration;

use async_trait::async_trait;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};

use crate::contracts::{ModelContentPart, StageKind};
use crate::error::{ModelError, StructuredOutputError};

/// Message content: plain text, or ordered multimodal parts.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum LlmContent {
    Text(String),
    Parts(Vec<ModelContentPart>),
}

/// One message in OpenAI-compatible chat format.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LlmMessage {
    pub role: String,
    pub content: LlmContent,
}

impl LlmMessage {
    #[must_use]
    pub fn system(text: impl Into<String>) -> Self {
        Self {
            role: "system".to_string(),
            content: LlmContent::Text(text.into()),
        }
    }

    #[must_use]
    pub fn user(text: impl Into<String>) -> Self {
        Self {
            role: "user".to_string(),
            content: LlmContent::Text(text.into()),
        }
    }

    #[must_use]
    pub fn user_parts(parts: Vec<ModelContentPart>) -> Self {
        Self {
            role: "user".to_string(),
            content: LlmContent::Parts(parts),
        }
    }
}

/// One model invocation issued by a pipeline stage.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CompletionRequest {
    pub stage: StageKind,
    pub messages: Vec<LlmMessage>,
    /// Ask the endpoint for a JSON object response.
    pub json_output: bool,
}

/// Opaque "produce text given messages" capability shared by all stages.
#[async_trait]
pub trait ChatModel: Send + Sync {
    async fn complete(&self, request: CompletionRequest) -> Result<String, ModelError>;
}

#[derive(Debug, Serialize)]
struct ResponseFormat {
    #[serde(rename = "type")]
    typ: &'static str,
}

/// Request body for chat completions (OpenAI format).
#[derive(Debug, Serialize)]
struct ChatCompletionRequest<'a> {
    model: &'a str,
    messages: &'a [LlmMessage],
    #[serde(skip_serializing_if = "Option::is_none")]
    response_format: Option<ResponseFormat>,
}

/// Response: choices[0].message.
#[derive(Debug, Deserialize)]
struct ChatCompletionResponse {
    #[serde(default)]
    choices: Vec<Choice>,
}

#[derive(Debug, Deserialize)]
struct Choice {
    message: AssistantMessage,
}

#[derive(Debug, Deserialize)]
struct AssistantMessage {
    #[serde(default)]
    content: Option<String>,
}

/// HTTP client for chat completions.
pub struct LlmClient {
    client: reqwest::Client,
    inference_url: String,
    model: String,
    api_key: Option<String>,
}

impl LlmClient {
    /// Client whose every request is bounded by `timeout`.
    ///
    /// # Errors
    /// Fails when the underlying HTTP client cannot be built.
    pub fn new(
        inference_url: String,
        model: String,
        api_key: Option<String>,
        timeout: Duration,
    ) -> Result<Self, ModelError> {
        let client = reqwest::Client::builder().timeout(timeout).build()?;
        Ok(Self {
            client,
            inference_url,
            model,
            api_key,
        })
    }

    #[must_use]
    pub fn model(&self) -> &str {
        &self.model
    }
}

#[async_trait]
impl ChatModel for LlmClient {
    async fn complete(&self, request: CompletionRequest) -> Result<String, ModelError> {
        let body = ChatCompletionRequest {
            model: &self.model,
            messages: &request.messages,
            response_format: request
                .json_output
                .then_some(ResponseFormat { typ: "json_object" }),
        };
        let mut req = self
            .client
            .post(&self.inference_url)
            .json(&body)
            .header("Content-Type", "application/json");
        if let Some(ref key) = self.api_key {
            req = req.header("Authorization", format!("Bearer {key}"));
        }
        tracing::debug!(
            stage = request.stage.as_str(),
            model = %self.model,
            messages = request.messages.len(),
            json_output = request.json_output,
            "chat completion request"
        );
        let res = req.send().await?;
        let status = res.status();
        let text = res.text().await?;
        if !status.is_success() {
            return Err(ModelError::Status {
                status: status.as_u16(),
                body: text,
            });
        }
        let parsed: ChatCompletionResponse = serde_json::from_str(&text)
            .map_err(|e| ModelError::Decode(format!("{e}; body: {text}")))?;
        let choice = parsed
            .choices
            .into_iter()
            .next()
            .ok_or(ModelError::EmptyChoices)?;
        Ok(choice.message.content.unwrap_or_default())
    }
}

/// Slice from the first `{` to the last `}`; covers raw JSON, fenced blocks and prose.
fn extract_json_object(text: &str) -> Option<&str> {
    let start = text.find('{')?;
    let end = text.rfind('}')?;
    if end >= start {
        Some(&text[start..=end])
    } else {
        None
    }
}

/// Schema-validated decoding of a structured model reply.
///
/// # Errors
/// `NoJson` when the text holds no object, `Schema` when the object does not fit `T`.
pub fn parse_structured<T: DeserializeOwned>(text: &str) -> Result<T, StructuredOutputError> {
    let candidate = extract_json_object(text).ok_or(StructuredOutputError::NoJson)?;
    serde_json::from_str(candidate).map_err(|error| StructuredOutputError::Schema(error.to_string()))
}

#[cfg(test)]
#[path = "../tests/llm/parse_structured.rs"]
mod tests;
