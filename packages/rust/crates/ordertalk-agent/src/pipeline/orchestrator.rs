//! One conversational turn: Perceive -> Reason -> (Validate + Act)? -> Respond -> Persist.

use std::sync::Arc;
use std::time::{Duration, Instant};

use anyhow::{Context, Result};

use crate::business::{HttpLogisticsApi, LogisticsApi};
use crate::config::PipelineConfig;
use crate::contracts::{
    ActionCommand, ActionKind, ActionResult, ChatRequest, EnvelopeData, Intent, ReasoningResult,
    ResponseEnvelope,
};
use crate::error::{ErrorKind, PipelineError};
use crate::llm::{ChatModel, LlmClient};
use crate::observability::PipelineEvent;
use crate::session::{Message, SessionGate, SessionKey, SessionMemory, SessionStore};

use super::action::ActionStage;
use super::perception::PerceptionStage;
use super::reasoning::ReasoningStage;
use super::response::ResponseStage;
use super::validation::{clarification_question, validate};

const ACTION_TRACE_NAME: &str = "action";

/// Shared, immutable wiring; stages and session memory are built per turn.
pub struct Pipeline {
    config: Arc<PipelineConfig>,
    model: Arc<dyn ChatModel>,
    api: Arc<dyn LogisticsApi>,
    store: Arc<SessionStore>,
    gate: SessionGate,
}

struct TurnOutcome {
    reasoning: ReasoningResult,
    execution: Option<ActionResult>,
    reply: String,
}

impl Pipeline {
    #[must_use]
    pub fn new(
        config: PipelineConfig,
        model: Arc<dyn ChatModel>,
        api: Arc<dyn LogisticsApi>,
        store: Arc<SessionStore>,
    ) -> Self {
        Self {
            config: Arc::new(config),
            model,
            api,
            store,
            gate: SessionGate::new(),
        }
    }

    /// Build with the HTTP model and order-service clients described by `config`.
    ///
    /// # Errors
    /// Fails when either HTTP client cannot be built.
    pub fn from_config(config: PipelineConfig, store: Arc<SessionStore>) -> Result<Self> {
        let model = LlmClient::new(
            config.inference_url.clone(),
            config.model.clone(),
            config.resolve_api_key(),
            Duration::from_secs(config.llm_timeout_secs),
        )
        .context("failed to build model client")?;
        let api = HttpLogisticsApi::new(
            config.business_api_base_url.clone(),
            Duration::from_secs(config.business_api_timeout_secs),
        )
        .context("failed to build order service client")?;
        Ok(Self::new(config, Arc::new(model), Arc::new(api), store))
    }

    #[must_use]
    pub fn config(&self) -> &PipelineConfig {
        &self.config
    }

    #[must_use]
    pub fn store(&self) -> &Arc<SessionStore> {
        &self.store
    }

    #[must_use]
    pub fn gate(&self) -> &SessionGate {
        &self.gate
    }

    /// Run one turn. Always returns an envelope; faults become an apology reply.
    ///
    /// Turns of the same session run one at a time, in arrival order at the gate.
    pub async fn handle(&self, request: ChatRequest) -> ResponseEnvelope {
        if request.session_id.trim().is_empty() || request.content.is_empty() {
            return input_rejected(&request.session_id);
        }
        let key = SessionKey::new(request.user_id.as_str(), request.session_id.as_str());
        let _guard = self.gate.acquire(&key).await;
        let started = Instant::now();
        tracing::info!(
            event = PipelineEvent::TurnStarted.as_str(),
            session = %key,
            items = request.content.items.len(),
            has_image = request.content.has_image(),
            "turn started"
        );

        let memory = SessionMemory::new(Arc::clone(&self.store), key.clone());
        match self.run_turn(&request, &memory).await {
            Ok(envelope) => {
                tracing::info!(
                    event = PipelineEvent::TurnCompleted.as_str(),
                    session = %key,
                    intent = ?envelope.data.intent,
                    success = envelope.success,
                    elapsed_ms = u64::try_from(started.elapsed().as_millis()).unwrap_or(u64::MAX),
                    "turn completed"
                );
                envelope
            }
            Err(error) => {
                tracing::error!(
                    event = PipelineEvent::TurnFaulted.as_str(),
                    session = %key,
                    error = %error,
                    "turn aborted"
                );
                ResponseEnvelope::fault(
                    key.session_id.clone(),
                    format!("抱歉，处理您的请求时遇到了问题: {error}"),
                )
            }
        }
    }

    async fn run_turn(
        &self,
        request: &ChatRequest,
        memory: &SessionMemory,
    ) -> Result<ResponseEnvelope, PipelineError> {
        let history = memory
            .history()
            .await
            .map_err(|error| PipelineError::SessionMemory(format!("{error:#}")))?;

        let perception = PerceptionStage::new(Arc::clone(&self.model), self.config.perception_mode)
            .perceive(&request.content)
            .await;
        let reasoning = ReasoningStage::new(Arc::clone(&self.model), self.config.history_turns())
            .reason(&request.content.text(), &perception, &history)
            .await;

        let outcome = self.act_and_respond(reasoning, &memory.key().session_id).await;

        let trace = outcome
            .execution
            .as_ref()
            .map(|result| action_trace(result, self.config.trace_max_chars));
        if let Err(error) = memory
            .append_exchange(
                Message::user(&request.content),
                trace,
                Message::assistant(outcome.reply.as_str()),
            )
            .await
        {
            tracing::error!(
                event = PipelineEvent::SessionPersistFailed.as_str(),
                session = %memory.key(),
                error = %format!("{error:#}"),
                "failed to persist turn; reply still returned"
            );
        }

        let success = outcome
            .execution
            .as_ref()
            .map_or(outcome.reasoning.failure.is_none(), |result| result.success);
        let error = outcome
            .execution
            .as_ref()
            .and_then(|result| result.error_kind)
            .or(outcome.reasoning.failure);
        Ok(ResponseEnvelope {
            success,
            message: outcome.reply,
            data: EnvelopeData {
                session_id: memory.key().session_id.clone(),
                intent: Some(outcome.reasoning.intent),
                perception: Some(perception),
                execution: outcome.execution,
                error,
            },
        })
    }

    async fn act_and_respond(&self, reasoning: ReasoningResult, session_id: &str) -> TurnOutcome {
        let response = ResponseStage::new(Arc::clone(&self.model));
        // Gated by intent only; confidence plays no part.
        let Some(command) = ActionCommand::from_reasoning(&reasoning, session_id) else {
            let reply = response.render(&reasoning, None).await;
            return TurnOutcome {
                reasoning,
                execution: None,
                reply,
            };
        };

        let result = ActionStage::new(Arc::clone(&self.api)).act(&command).await;
        if result.is_validation_failure() {
            let clarify = clarify_from_rejection(&reasoning, &command, &result);
            let reply = response.render(&clarify, None).await;
            return TurnOutcome {
                reasoning: clarify,
                execution: Some(result),
                reply,
            };
        }
        let reply = response.render(&reasoning, Some(&result)).await;
        TurnOutcome {
            reasoning,
            execution: Some(result),
            reply,
        }
    }

    /// Ordered log of one session.
    ///
    /// # Errors
    /// Propagates store failures.
    pub async fn history(&self, user_id: &str, session_id: &str) -> Result<Vec<Message>> {
        let key = SessionKey::new(user_id, session_id);
        SessionMemory::new(Arc::clone(&self.store), key).history().await
    }

    /// Drop a session's log; waits for an in-flight turn of the same session.
    ///
    /// # Errors
    /// Propagates store failures.
    pub async fn clear(&self, user_id: &str, session_id: &str) -> Result<()> {
        let key = SessionKey::new(user_id, session_id);
        let _guard = self.gate.acquire(&key).await;
        SessionMemory::new(Arc::clone(&self.store), key).clear().await
    }
}

/// Re-derive the rejected field and ask for it, keeping the command's other fields.
fn clarify_from_rejection(
    reasoning: &ReasoningResult,
    command: &ActionCommand,
    result: &ActionResult,
) -> ReasoningResult {
    let question = ActionKind::parse(&command.action)
        .and_then(|kind| validate(kind, &command.session_id, &command.fields).err())
        .map_or_else(|| result.message.clone(), |error| clarification_question(&error));
    ReasoningResult {
        intent: Intent::Clarify,
        clarification_questions: vec![question],
        ..reasoning.clone()
    }
}

fn action_trace(result: &ActionResult, max_chars: usize) -> Message {
    let rendered = serde_json::to_string(result).unwrap_or_default();
    Message::stage(ACTION_TRACE_NAME, truncate_chars(&rendered, max_chars))
}

fn truncate_chars(text: &str, max_chars: usize) -> String {
    match text.char_indices().nth(max_chars) {
        Some((cut, _)) => format!("{}…", &text[..cut]),
        None => text.to_string(),
    }
}

fn input_rejected(session_id: &str) -> ResponseEnvelope {
    ResponseEnvelope {
        success: false,
        message: "请求缺少会话标识或消息内容，请检查后重试。".to_string(),
        data: EnvelopeData {
            session_id: session_id.to_string(),
            intent: None,
            perception: None,
            execution: None,
            error: Some(ErrorKind::InputParse),
        },
    }
}

#[cfg(test)]
#[path = "../../tests/pipeline/orchestrator.rs"]
mod tests;
