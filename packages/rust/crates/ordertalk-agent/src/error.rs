//! Typed error taxonomy shared by the pipeline stages.
//!
//! Library seams use `thiserror` enums; `anyhow` is reserved for startup and
//! storage plumbing where the caller only needs context.

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Coarse classification carried into `ActionResult` and logs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorKind {
    InputParse,
    ModelInvocation,
    ParameterMissing,
    InvalidEnumValue,
    InvalidDateFormat,
    UpstreamApi,
    UnknownAction,
    OrchestratorFault,
}

impl ErrorKind {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::InputParse => "input_parse",
            Self::ModelInvocation => "model_invocation",
            Self::ParameterMissing => "parameter_missing",
            Self::InvalidEnumValue => "invalid_enum_value",
            Self::InvalidDateFormat => "invalid_date_format",
            Self::UpstreamApi => "upstream_api",
            Self::UnknownAction => "unknown_action",
            Self::OrchestratorFault => "orchestrator_fault",
        }
    }

    /// Validation kinds are answered with a clarification instead of a failure notice.
    #[must_use]
    pub const fn is_validation(self) -> bool {
        matches!(
            self,
            Self::ParameterMissing | Self::InvalidEnumValue | Self::InvalidDateFormat
        )
    }
}

/// Rejection produced by the validation gate before any side-effecting call.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("missing required field `{field}`")]
    ParameterMissing { field: &'static str },

    #[error("invalid value `{value}` for `{field}`; allowed values: {allowed}")]
    InvalidEnumValue {
        field: &'static str,
        value: String,
        allowed: String,
    },

    #[error("invalid date format `{value}` for `{field}`; expected yyyy-MM-dd")]
    InvalidDateFormat { field: &'static str, value: String },

    #[error("modify_node requires at least one field to change")]
    NoMutableField,
}

impl ValidationError {
    #[must_use]
    pub const fn kind(&self) -> ErrorKind {
        match self {
            Self::ParameterMissing { .. } | Self::NoMutableField => ErrorKind::ParameterMissing,
            Self::InvalidEnumValue { .. } => ErrorKind::InvalidEnumValue,
            Self::InvalidDateFormat { .. } => ErrorKind::InvalidDateFormat,
        }
    }

    /// Field the user has to supply or correct; `None` for the "nothing to change" case.
    #[must_use]
    pub const fn field(&self) -> Option<&'static str> {
        match self {
            Self::ParameterMissing { field }
            | Self::InvalidEnumValue { field, .. }
            | Self::InvalidDateFormat { field, .. } => Some(field),
            Self::NoMutableField => None,
        }
    }
}

/// Structured output did not match the declared schema.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum StructuredOutputError {
    #[error("model output contained no JSON object")]
    NoJson,

    #[error("model output does not match schema: {0}")]
    Schema(String),
}

/// Failure of a language-model invocation.
#[derive(Debug, Error)]
pub enum ModelError {
    #[error("LLM transport error: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("LLM API error {status}: {body}")]
    Status { status: u16, body: String },

    #[error("LLM response parse error: {0}")]
    Decode(String),

    #[error("LLM response has no choices")]
    EmptyChoices,

    #[error(transparent)]
    StructuredOutput(#[from] StructuredOutputError),
}

/// Failure of a logistics business API call.
#[derive(Debug, Error)]
pub enum BusinessApiError {
    #[error("business API transport error: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("business API returned HTTP {status}: {body}")]
    Status { status: u16, body: String },

    #[error("business API response is not valid JSON: {0}")]
    Decode(String),

    #[error("business API rejected the request: {0}")]
    Rejected(String),
}

/// Failure of the Action stage, mapped into `ActionResult`.
#[derive(Debug, Error)]
pub enum ActionError {
    #[error(transparent)]
    Validation(#[from] ValidationError),

    #[error("unknown action `{0}`")]
    UnknownAction(String),

    #[error(transparent)]
    Upstream(#[from] BusinessApiError),
}

impl ActionError {
    #[must_use]
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::Validation(error) => error.kind(),
            Self::UnknownAction(_) => ErrorKind::UnknownAction,
            Self::Upstream(_) => ErrorKind::UpstreamApi,
        }
    }

    #[must_use]
    pub fn field(&self) -> Option<&'static str> {
        match self {
            Self::Validation(error) => error.field(),
            Self::UnknownAction(_) | Self::Upstream(_) => None,
        }
    }
}

/// Fault that aborts a turn; the orchestrator turns it into an apology envelope.
#[derive(Debug, Error)]
pub enum PipelineError {
    #[error("session memory unavailable: {0}")]
    SessionMemory(String),
}
