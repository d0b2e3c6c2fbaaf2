use serde::{Deserialize, Serialize};

use crate::error::ErrorKind;

use super::action::ActionResult;
use super::input::UserInput;
use super::perception::PerceptionResult;
use super::reasoning::Intent;

pub const DEFAULT_USER_ID: &str = "default";

fn default_user_id() -> String {
    DEFAULT_USER_ID.to_string()
}

/// One inbound conversational turn.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChatRequest {
    pub session_id: String,
    #[serde(default = "default_user_id")]
    pub user_id: String,
    pub content: UserInput,
}

impl ChatRequest {
    #[must_use]
    pub fn new(session_id: impl Into<String>, user_id: impl Into<String>, content: UserInput) -> Self {
        Self {
            session_id: session_id.into(),
            user_id: user_id.into(),
            content,
        }
    }
}

/// Intermediate artifacts attached to the reply.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EnvelopeData {
    pub session_id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub intent: Option<Intent>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub perception: Option<PerceptionResult>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub execution: Option<ActionResult>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<ErrorKind>,
}

/// Final result of one turn.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ResponseEnvelope {
    pub success: bool,
    /// User-facing reply text.
    pub message: String,
    pub data: EnvelopeData,
}

impl ResponseEnvelope {
    /// Envelope for a turn aborted by an orchestrator fault.
    #[must_use]
    pub fn fault(session_id: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            success: false,
            message: message.into(),
            data: EnvelopeData {
                session_id: session_id.into(),
                intent: None,
                perception: None,
                execution: None,
                error: Some(ErrorKind::OrchestratorFault),
            },
        }
    }
}
