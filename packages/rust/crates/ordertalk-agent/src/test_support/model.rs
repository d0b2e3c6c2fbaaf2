use std::collections::{HashMap, VecDeque};
use std::sync::{Mutex, PoisonError};
use std::time::Duration;

use async_trait::async_trait;

use crate::contracts::StageKind;
use crate::error::ModelError;
use crate::llm::{ChatModel, CompletionRequest};

/// `ChatModel` that answers from per-stage queues and records every request.
///
/// An exhausted queue answers with an error, which the stages treat like any
/// other model failure.
#[derive(Default)]
pub struct ScriptedModel {
    replies: Mutex<HashMap<StageKind, VecDeque<Result<String, String>>>>,
    requests: Mutex<Vec<CompletionRequest>>,
    delay: Option<Duration>,
}

impl ScriptedModel {
    /// Queue a successful reply for `stage`.
    #[must_use]
    pub fn reply(self, stage: StageKind, text: impl Into<String>) -> Self {
        self.push(stage, Ok(text.into()))
    }

    /// Queue a failure for `stage`.
    #[must_use]
    pub fn fail(self, stage: StageKind, message: impl Into<String>) -> Self {
        self.push(stage, Err(message.into()))
    }

    /// Sleep before answering each request.
    #[must_use]
    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }

    fn push(self, stage: StageKind, reply: Result<String, String>) -> Self {
        self.replies
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .entry(stage)
            .or_default()
            .push_back(reply);
        self
    }

    #[must_use]
    pub fn call_count(&self, stage: StageKind) -> usize {
        self.requests(stage).len()
    }

    /// Requests seen for `stage`, oldest first.
    #[must_use]
    pub fn requests(&self, stage: StageKind) -> Vec<CompletionRequest> {
        self.requests
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .iter()
            .filter(|request| request.stage == stage)
            .cloned()
            .collect()
    }
}

#[async_trait]
impl ChatModel for ScriptedModel {
    async fn complete(&self, request: CompletionRequest) -> Result<String, ModelError> {
        let stage = request.stage;
        self.requests
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(request);
        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }
        let next = self
            .replies
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .get_mut(&stage)
            .and_then(VecDeque::pop_front);
        match next {
            Some(Ok(text)) => Ok(text),
            Some(Err(message)) => Err(ModelError::Status {
                status: 503,
                body: message,
            }),
            None => Err(ModelError::Decode(format!(
                "no scripted reply left for stage `{}`",
                stage.as_str()
            ))),
        }
    }
}
